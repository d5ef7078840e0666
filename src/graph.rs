/*! Graphs contain blocks connected by streams, and run them.

The runner is deliberately simple and synchronous: blocks are called
round robin until a full round does no work. That is all an offline
decode or a test needs; on the live audio path the blocks are driven
directly by the audio callback instead (see
[`decoder::CwDecoder`](crate::decoder::CwDecoder)).
*/
use std::time::Instant;

use log::{debug, info};

use crate::Result;
use crate::block::{Block, BlockRet};

/// A graph of blocks talking to each other via streams.
///
/// # Example
///
/// ```
/// use rustcw::blocks::{KeyedToneSource, VectorSink};
/// use rustcw::graph::Graph;
/// let (src, audio) = KeyedToneSource::new("hi", 20.0, 700.0, 0.5, 8000.0);
/// let sink = VectorSink::new(audio);
/// let hook = sink.hook();
/// let mut g = Graph::new();
/// g.add(Box::new(src));
/// g.add(Box::new(sink));
/// g.run()?;
/// assert!(!hook.data().is_empty());
/// # Ok::<(), rustcw::Error>(())
/// ```
#[derive(Default)]
pub struct Graph {
    blocks: Vec<Box<dyn Block>>,
    cancel_token: CancellationToken,
}

impl Graph {
    /// Create a new flowgraph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block to the graph.
    pub fn add(&mut self, b: Box<dyn Block>) {
        self.blocks.push(b);
    }

    /// Run the graph until every block is starved or EOF, or until the
    /// graph is cancelled.
    pub fn run(&mut self) -> Result<()> {
        let st = Instant::now();
        let mut eof = vec![false; self.blocks.len()];
        loop {
            if self.cancel_token.is_canceled() {
                info!("graph cancelled");
                break;
            }
            let mut busy = false;
            for (n, b) in self.blocks.iter_mut().enumerate() {
                if eof[n] {
                    continue;
                }
                match b.work()? {
                    BlockRet::Again => busy = true,
                    BlockRet::Noop => {}
                    BlockRet::EOF => {
                        debug!("{} EOF", b.block_name());
                        eof[n] = true;
                    }
                }
            }
            if !busy {
                break;
            }
        }
        debug!("graph ran for {:?}", st.elapsed());
        Ok(())
    }

    /// Return a cancellation token, for asynchronously stopping the
    /// graph, for example if the user presses Ctrl-C.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

/// A handle to be able to stop the Graph. For example when the user
/// presses Ctrl-C.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl CancellationToken {
    /// Create new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the token cancelled.
    pub fn cancel(&self) {
        self.inner.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Check if the token is cancelled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.inner.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/* vim: textwidth=80
 */
