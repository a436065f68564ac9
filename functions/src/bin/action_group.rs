use functions::{action_group, telemetry};
use lambda_http::lambda_runtime::{self, LambdaEvent, service_fn};
use lambda_http::Error;
use serde_json::Value;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let service = functions::ticket_service_from_env().await?;
    info!("action-group function starting");

    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| {
        let service = &service;
        async move { Ok::<Value, Error>(action_group::handle(service, event.payload).await) }
    }))
    .await
}
