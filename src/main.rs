use anyhow::Context;

use youtify_api::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    youtify_api::init_tracing();

    let config = ServerConfig::from_env().context("reading configuration")?;
    youtify_api::run(config).await
}
