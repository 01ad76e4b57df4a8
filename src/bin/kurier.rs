use anyhow::Result;
use kurier::cli::{actions::run, start};

#[tokio::main]
async fn main() -> Result<()> {
    let (globals, action) = start()?;

    run::handle(action, &globals).await?;

    Ok(())
}
