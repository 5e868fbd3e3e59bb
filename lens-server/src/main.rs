use anyhow::Result;
use lens_core::LensConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = LensConfig::from_env(lens_server::ENV_PREFIX);
    let (ax, http) = lens_server::build(&config).await?;

    ax.listen(http.addr()).await?;

    Ok(())
}
