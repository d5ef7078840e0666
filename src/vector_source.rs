//! Generate values from a fixed vector.
use crate::Result;
use crate::block::{Block, BlockRet};
use crate::stream::{Streamp, new_streamp};

/// Generate values from a fixed vector, then EOF.
///
/// Mostly useful for tests and offline decoding.
pub struct VectorSource<T> {
    data: Vec<T>,
    dst: Streamp<T>,
    done: bool,
}

impl<T> VectorSource<T> {
    /// Create new Vector Source block.
    #[must_use]
    pub fn new(data: Vec<T>) -> (Self, Streamp<T>) {
        let dst = new_streamp();
        (
            Self {
                data,
                dst: dst.clone(),
                done: false,
            },
            dst,
        )
    }
}

impl<T> Block for VectorSource<T> {
    fn block_name(&self) -> &'static str {
        "VectorSource"
    }

    fn work(&mut self) -> Result<BlockRet> {
        if !self.done {
            self.dst.extend(std::mem::take(&mut self.data));
            self.done = true;
        }
        self.dst.set_eof();
        Ok(BlockRet::EOF)
    }
}

/* vim: textwidth=80
 */
