use anyhow::Result;
use herd_api::serve;
use herd_desk::DeskConfig;
use herd_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("herd_api");
    serve(&DeskConfig::from_env()).await
}
