use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    steadyhand_cli::cli::run().await
}
