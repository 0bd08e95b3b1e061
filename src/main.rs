use anyhow::Result;
use stagehand::cli::App;

#[tokio::main]
async fn main() -> Result<()> {
    let mut app = App::from_args().await?;
    let args = stagehand::cli::Args::parse_args();

    app.run(args).await?;

    Ok(())
}
