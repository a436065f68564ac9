mod api;
mod credentials;

use anyhow::{Context, Result};
use api::ApiClient;
use clap::{Parser, Subcommand};
use credentials::CredentialStore;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;
use std::time::Duration;
use ticket::TicketRequest;
use tokio::time::sleep;

// UI関連の設定
const USER_NAME: &str = "User";
const AGENT_NAME: &str = "Assistant";
const LOADING_ANIMATION_INTERVAL: u64 = 200;
const LOADING_ANIMATION_CHARACTER: &str = ".";
// ローディング中に表示される可能性のある最大文字数分のスペース
const CLEAR_LINE_SPACES: &str = "                                     ";

// CLIの引数構造体定義
#[derive(Parser)]
#[command(name = "itsm-cli")]
#[command(about = "Client for the ITSM ticketing and chat API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 認可コードをトークンに交換して保存します
    Login {
        /// OAuth 2.0 トークンエンドポイント
        #[arg(long)]
        token_endpoint: String,

        #[arg(long)]
        client_id: String,

        #[arg(long)]
        redirect_uri: String,

        /// ホストされた UI から受け取った認可コード
        #[arg(long)]
        code: String,
    },

    /// 保存されたトークンを削除します
    Logout,

    /// エージェントと対話します
    Chat {
        /// API Gateway のベース URL
        #[arg(long, env = "ITSM_API_URL")]
        api_url: String,
    },

    /// チケットを作成します
    Create {
        #[arg(long, env = "ITSM_API_URL")]
        api_url: String,

        /// INC / REQ / CHG
        #[arg(long, default_value = "INC")]
        ticket_type: String,

        #[arg(long)]
        description: String,

        /// High / Medium / Low
        #[arg(long, default_value = "Medium")]
        impact: String,

        /// High / Medium / Low
        #[arg(long, default_value = "Medium")]
        urgency: String,
    },

    /// チケットを照会します
    Lookup {
        #[arg(long, env = "ITSM_API_URL")]
        api_url: String,

        #[arg(long)]
        ticket_number: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 引数の解析
    let cli = Cli::parse();
    let store = CredentialStore::default_location();
    let http = reqwest::Client::new();

    match cli.command {
        Commands::Login {
            token_endpoint,
            client_id,
            redirect_uri,
            code,
        } => {
            let tokens =
                api::exchange_code(&http, &token_endpoint, &client_id, &redirect_uri, &code)
                    .await?;

            let mut credentials = store.load().unwrap_or_default();
            credentials.token = tokens.id_token;
            credentials.access_token = tokens.access_token;
            credentials.ensure_session_id();
            store.save(&credentials)?;

            println!("Logged in. Credentials saved to {}", store.path().display());
        }
        Commands::Logout => {
            if store.clear()? {
                println!("Logged out.");
            } else {
                println!("No stored credentials.");
            }
        }
        Commands::Chat { api_url } => {
            run_chat(&store, ApiClient::new(http, &api_url, store.load()?.token)).await?;
        }
        Commands::Create {
            api_url,
            ticket_type,
            description,
            impact,
            urgency,
        } => {
            let request = TicketRequest {
                tickettype: ticket_type,
                description,
                impact,
                urgency,
            };
            let (status, body) = ApiClient::new(http, &api_url, None)
                .create_ticket(&request)
                .await?;
            print_response(status, &body)?;
        }
        Commands::Lookup {
            api_url,
            ticket_number,
        } => {
            let (status, body) = ApiClient::new(http, &api_url, None)
                .lookup_ticket(&ticket_number)
                .await?;
            print_response(status, &body)?;
        }
    }

    Ok(())
}

fn print_response(status: reqwest::StatusCode, body: &serde_json::Value) -> Result<()> {
    println!("[{status}]");
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}

/// 対話モードを実行する
///
/// 入力の受け付けとローディング表示を担当し、各行を `/chat` に送信する。
/// セッション ID は保存された認証情報のものを使い、なければ発行して保存する。
async fn run_chat(store: &CredentialStore, client: ApiClient) -> Result<()> {
    let mut credentials = store.load()?;
    let minted = credentials.session_id.is_none();
    let session_id = credentials.ensure_session_id().to_string();
    if minted {
        store.save(&credentials)?;
    }

    // rustylineエディタの初期化
    let mut rl = DefaultEditor::new().context("Failed to initialize line editor")?;

    println!("Session: {session_id}");
    println!("+---------------------------------------------------------+");
    println!("| ITSM Assistant Started. Type 'exit' or 'quit' to stop. |");
    println!("+---------------------------------------------------------+");

    loop {
        let readline = rl.readline(&format!("{} > ", USER_NAME));
        match readline {
            Ok(line) => {
                let input = line.trim();

                if input.is_empty() {
                    continue;
                }

                if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                    break;
                }

                let _ = rl.add_history_entry(input);

                print!("{} > ", AGENT_NAME);
                std::io::stdout().flush()?;

                // ローディングアニメーション開始
                let loading_task = tokio::spawn(async {
                    loop {
                        sleep(Duration::from_millis(LOADING_ANIMATION_INTERVAL)).await;
                        print!("{}", LOADING_ANIMATION_CHARACTER);
                        if std::io::stdout().flush().is_err() {
                            break;
                        }
                    }
                });

                let result = client.chat(input, &session_id).await;
                loading_task.abort();
                clear_loading_animation();

                match result {
                    Ok(reply) => println!("{}", reply.response),
                    Err(e) => println!("\n[Error] {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

/// ローディングアニメーションをクリアしてカーソルを戻す
fn clear_loading_animation() {
    print!(
        "\r{} > {}\r{} > ",
        AGENT_NAME, CLEAR_LINE_SPACES, AGENT_NAME
    );
    let _ = std::io::stdout().flush();
}
