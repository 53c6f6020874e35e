use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub const URL_PROMPT: &str = "Enter the website URL to record: ";

/// Ask for a URL on `output` and read one line from `input`.
///
/// Returns the trimmed line; EOF yields an empty string.
pub async fn prompt_for_url<R, W>(input: &mut R, output: &mut W) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(URL_PROMPT.as_bytes()).await?;
    output.flush().await?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .await
        .context("failed to read URL from terminal")?;
    Ok(line.trim().to_string())
}
