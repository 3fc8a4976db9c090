//! Session hosting: one `Dialogue` per TCP connection, or a single console session.

use crate::transcript::Transcript;
use alexandrian_core::{CoreConfig, Dialogue, LineChannel, LineStream, MemoStore, RetrievalCache, SourceRegistry};
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;

/// State shared by every session: the memo tables, the retrieval cache and the adapters.
#[derive(Clone)]
pub struct Shared {
    pub config: Arc<CoreConfig>,
    pub registry: SourceRegistry,
    pub cache: Arc<RetrievalCache>,
    pub memo: Arc<MemoStore>,
}

impl Shared {
    pub fn new(config: CoreConfig, registry: SourceRegistry) -> Self {
        let memo = MemoStore::open(config.inputs_table_path(), config.responses_table_path());
        Self {
            config: Arc::new(config),
            registry,
            cache: Arc::new(RetrievalCache::new()),
            memo: Arc::new(memo),
        }
    }

    /// A fresh session with its own history and recency windows.
    pub fn dialogue(&self) -> Dialogue {
        Dialogue::new(
            self.config.pipeline.clone(),
            self.registry.clone(),
            Arc::clone(&self.cache),
            Arc::clone(&self.memo),
        )
        .with_fetch_timeout(self.config.sources.timeout())
    }

    /// Runs one session over `channel`, recording it when a transcript path is configured.
    pub async fn serve<C: LineChannel>(&self, channel: C) -> io::Result<()> {
        let mut dialogue = self.dialogue();
        match &self.config.session_log {
            Some(path) => dialogue.run(&mut Transcript::new(channel, path.as_str())).await,
            None => {
                let mut channel = channel;
                dialogue.run(&mut channel).await
            }
        }
    }
}

pub async fn run_console(shared: Shared) -> io::Result<()> {
    tracing::info!(target: "alexandrian::dialogue", "console session started");
    shared
        .serve(LineStream::new(tokio::io::stdin(), tokio::io::stdout()))
        .await
}

/// Accepts connections until the listener fails; each gets its own task.
pub async fn accept_loop(listener: TcpListener, shared: Shared) -> io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let shared = shared.clone();
        tokio::spawn(async move {
            tracing::info!(target: "alexandrian::dialogue", %peer, "session opened");
            let (reader, writer) = stream.into_split();
            match shared.serve(LineStream::new(reader, writer)).await {
                Ok(()) => tracing::info!(target: "alexandrian::dialogue", %peer, "session closed"),
                Err(e) => tracing::warn!(target: "alexandrian::dialogue", %peer, error = %e, "session aborted"),
            }
        });
    }
}
