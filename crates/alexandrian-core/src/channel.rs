//! Line-delimited duplex channel the dialogue loop talks through.

use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// One UTF-8 line in, one line out.
#[async_trait::async_trait]
pub trait LineChannel: Send {
    /// Next line without its terminator; `None` once the peer has closed.
    async fn receive_line(&mut self) -> io::Result<Option<String>>;

    async fn send_line(&mut self, line: &str) -> io::Result<()>;
}

/// [`LineChannel`] over any tokio reader/writer pair (TCP halves, stdin/stdout, duplex pipes).
pub struct LineStream<R, W> {
    reader: BufReader<R>,
    writer: W,
}

impl<R, W> LineStream<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }
}

#[async_trait::async_trait]
impl<R, W> LineChannel for LineStream<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn receive_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        if self.reader.read_line(&mut buf).await? == 0 {
            return Ok(None);
        }
        let trimmed = buf.trim_end_matches(['\r', '\n']).len();
        buf.truncate(trimmed);
        Ok(Some(buf))
    }

    async fn send_line(&mut self, line: &str) -> io::Result<()> {
        // Embedded newlines would split one reply across lines.
        let flat = line.replace(['\r', '\n'], " ");
        self.writer.write_all(flat.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}
