//! Sink values into a vector.
//!
//! This block is really only useful for unit tests.
use std::sync::{Arc, Mutex};

use crate::Result;
use crate::block::{Block, BlockRet};
use crate::stream::Streamp;

/// Collect whatever comes from the stream into a shared vector.
pub struct VectorSink<T> {
    src: Streamp<T>,
    storage: Arc<Mutex<Vec<T>>>,
}

/// Hook into the data written to a [`VectorSink`].
pub struct Hook<T> {
    inner: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone> Hook<T> {
    /// Snapshot of the collected samples so far.
    #[must_use]
    pub fn data(&self) -> Vec<T> {
        self.inner.lock().unwrap().clone()
    }
}

impl<T> VectorSink<T> {
    /// Create new VectorSink block.
    #[must_use]
    pub fn new(src: Streamp<T>) -> Self {
        Self {
            src,
            storage: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get a Hook into the data that will be written.
    #[must_use]
    pub fn hook(&self) -> Hook<T> {
        Hook {
            inner: self.storage.clone(),
        }
    }
}

impl<T> Block for VectorSink<T> {
    fn block_name(&self) -> &'static str {
        "VectorSink"
    }

    fn work(&mut self) -> Result<BlockRet> {
        let mut storage = self.storage.lock().unwrap();
        let mut n = 0;
        while let Some(v) = self.src.pop() {
            storage.push(v);
            n += 1;
        }
        if n > 0 {
            Ok(BlockRet::Again)
        } else if self.src.eof() {
            Ok(BlockRet::EOF)
        } else {
            Ok(BlockRet::Noop)
        }
    }
}

/* vim: textwidth=80
 */
