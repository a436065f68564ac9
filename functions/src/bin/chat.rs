use agent::{ChatDispatcher, DispatcherConfig, config::load_sdk_config};
use functions::{handlers, telemetry};
use lambda_http::{Error, Request, run, service_fn};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    // 未知の IMPLEMENTATION_TYPE はここで失敗し、呼び出しはすべてエラーになる
    let config = DispatcherConfig::from_env()?;
    let sdk_config = load_sdk_config(config.region.clone()).await;
    let dispatcher = ChatDispatcher::from_config(&config, &sdk_config);

    info!(
        backend = dispatcher.backend_name(),
        require_auth = config.require_auth,
        "chat function starting"
    );

    run(service_fn(|event: Request| handlers::chat(&dispatcher, event))).await
}
