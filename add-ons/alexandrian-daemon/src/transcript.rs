//! Append-only session transcript wrapped around any line channel.

use alexandrian_core::LineChannel;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub const USER_PREFIX: &str = "User: ";
pub const REPLY_PREFIX: &str = "[>>>]: ";

/// Records every received line as `User: ...` and every sent line as `[>>>]: ...`.
/// Write failures are logged and never end the session.
pub struct Transcript<C> {
    inner: C,
    path: PathBuf,
}

impl<C: LineChannel> Transcript<C> {
    pub fn new(inner: C, path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            path: path.into(),
        }
    }
}

async fn append(path: &Path, prefix: &str, text: &str) {
    let entry = format!("{prefix}{}\n", text.replace(['\r', '\n'], " "));
    let written = async {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await
    }
    .await;
    if let Err(e) = written {
        tracing::warn!(
            target: "alexandrian::dialogue",
            path = %path.display(),
            error = %e,
            "transcript append failed"
        );
    }
}

#[async_trait::async_trait]
impl<C: LineChannel> LineChannel for Transcript<C> {
    async fn receive_line(&mut self) -> io::Result<Option<String>> {
        let line = self.inner.receive_line().await?;
        if let Some(text) = &line {
            if !text.trim().is_empty() {
                append(&self.path, USER_PREFIX, text).await;
            }
        }
        Ok(line)
    }

    async fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.inner.send_line(line).await?;
        append(&self.path, REPLY_PREFIX, line).await;
        Ok(())
    }
}
