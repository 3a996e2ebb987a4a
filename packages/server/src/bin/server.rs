use clap::Parser;
use pagesmith_server::server::{init_tracing, start_server};
use pagesmith_server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_tracing(config.log_format);
    start_server(config).await
}
