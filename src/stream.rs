/*! Streams connecting blocks.

Blocks are connected with streams. A block can have zero or more input
streams, and write to zero or more output streams.

A stream is a FIFO of messages plus an EOF marker. Sources set EOF when
they will never produce again; downstream blocks propagate it once they
have drained their input. Streams are `Arc`-shared between the producer
and any number of consumers, and internally locked, so a settings/UI
thread may peek at lengths without coordinating with the audio path.
The lock is only ever held for single push/pop operations, never across
a tick.
*/
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A stream between blocks.
#[derive(Debug, Default)]
pub struct Stream<T> {
    q: Mutex<VecDeque<T>>,
    eof: AtomicBool,
}

/// Convenience type for a "pointer to a stream".
pub type Streamp<T> = Arc<Stream<T>>;

/// Create a new Streamp.
#[must_use]
pub fn new_streamp<T>() -> Streamp<T> {
    Arc::new(Stream::new())
}

/// Create a new Streamp with contents.
#[must_use]
pub fn streamp_from_slice<T: Copy>(data: &[T]) -> Streamp<T> {
    let s = Stream::new();
    s.extend(data.iter().copied());
    Arc::new(s)
}

impl<T> Stream<T> {
    /// Create a new stream.
    #[must_use]
    pub fn new() -> Self {
        Self {
            q: Mutex::new(VecDeque::new()),
            eof: AtomicBool::new(false),
        }
    }

    /// Push one message, handing off ownership.
    pub fn push(&self, val: T) {
        self.q.lock().unwrap().push_back(val);
    }

    /// Push many messages.
    pub fn extend<I: IntoIterator<Item = T>>(&self, vals: I) {
        self.q.lock().unwrap().extend(vals);
    }

    /// Pop one message.
    pub fn pop(&self) -> Option<T> {
        self.q.lock().unwrap().pop_front()
    }

    /// Number of messages waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.q.lock().unwrap().len()
    }

    /// True if no messages are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.q.lock().unwrap().is_empty()
    }

    /// Remove everything, e.g. on decoder reset.
    pub fn clear(&self) {
        self.q.lock().unwrap().clear();
    }

    /// Mark that the producer will never push again.
    pub fn set_eof(&self) {
        self.eof.store(true, Ordering::SeqCst);
    }

    /// True if the producer is done. Data may still be waiting.
    #[must_use]
    pub fn eof(&self) -> bool {
        self.eof.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop() {
        let s = new_streamp::<u32>();
        assert!(s.is_empty());
        s.push(1);
        s.extend([2, 3]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.pop(), Some(1));
        assert_eq!(s.pop(), Some(2));
        assert_eq!(s.pop(), Some(3));
        assert_eq!(s.pop(), None);
    }

    #[test]
    fn eof_is_sticky_and_leaves_data() {
        let s = streamp_from_slice(&[1.0f32, 2.0]);
        assert!(!s.eof());
        s.set_eof();
        assert!(s.eof());
        assert_eq!(s.len(), 2);
        s.clear();
        assert!(s.is_empty());
        assert!(s.eof());
    }
}
/* vim: textwidth=80
 */
