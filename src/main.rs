use routeline::{Config, Server, handlers};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let router = handlers::default_router();
    let server = Server::with_config(Config::default()).await?;
    server.run(router).await?;
    Ok(())
}
