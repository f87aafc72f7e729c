//! Line-delimited bridge loop on stdin/stdout.

use anyhow::{Context, Result};
use devcal_core::bridge::Bridge;
use devcal_core::store::LocalStore;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

pub async fn run(bridge: Bridge<LocalStore>) -> Result<()> {
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    tracing::info!(root = %bridge.store().root().display(), "Bridge ready");

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        let response = bridge.handle_line(&line);

        let mut out = response.to_line();
        out.push('\n');
        stdout
            .write_all(out.as_bytes())
            .await
            .context("Failed to write response")?;
        stdout.flush().await.context("Failed to flush stdout")?;
    }

    tracing::info!("Input closed, stopping bridge");
    Ok(())
}
