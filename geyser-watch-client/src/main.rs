use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    geyser_watch_client::run().await?;
    Ok(())
}
