/*! Block trait.

Blocks are the main building blocks of a decoder chain. Each one does
one thing, and they are connected with streams to process the data.

Blocks own their streams: a constructor takes the read side of its
input and hands back the read side of its output, e.g.
`let (det, ticks) = ToneDetector::new(audio, 8000.0, 32)?`.
*/
use crate::Result;

/// Return type for all blocks.
///
/// This lets the caller know whether calling `work()` again right away
/// could do more, or whether the block is starved or done for good.
#[derive(Debug)]
pub enum BlockRet {
    /// The block consumed or produced something. Call again.
    Again,

    /// Nothing to do. More output only if more input shows up.
    Noop,

    /// The block will never produce anything again.
    ///
    /// Examples:
    /// * a vector source that handed out its last sample.
    /// * a block whose input stream hit EOF and is drained.
    EOF,
}

/// Block trait, that must be implemented for all blocks.
pub trait Block {
    /// Name of the block.
    ///
    /// Not the name of the *instance* of the block.
    fn block_name(&self) -> &'static str;

    /// Block work function.
    ///
    /// Consumes whatever input is available (or as much as fits), and
    /// produces into the output stream. Must be bounded-time: a block
    /// on the audio path is called per audio chunk and may not block
    /// or suspend.
    fn work(&mut self) -> Result<BlockRet>;
}
/* vim: textwidth=80
 */
