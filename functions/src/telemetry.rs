use tracing_subscriber::EnvFilter;

/// Lambda 向けのログ出力を初期化する
///
/// `RUST_LOG` が設定されていればそれに従い、なければ info レベルで出力する。
/// CloudWatch Logs に制御文字が残らないよう ANSI カラーは無効にする。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();
}
