use geosnap::{config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;

    geosnap::start(config).await?;

    Ok(())
}
