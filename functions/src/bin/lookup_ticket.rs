use functions::{handlers, telemetry};
use lambda_http::{Error, Request, run, service_fn};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let service = functions::ticket_service_from_env().await?;
    info!("lookup-ticket function starting");

    run(service_fn(|event: Request| handlers::lookup_ticket(&service, event))).await
}
