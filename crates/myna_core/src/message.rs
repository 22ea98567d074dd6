//! Stream Event Types
//!
//! Events flow from the audio callbacks to the run loop over a crossbeam
//! channel. Callbacks only ever `try_send` - the real-time thread must never
//! block on a full channel.

/// Events sent from the audio callbacks to the stream's run loop
#[derive(Debug, Clone)]
pub enum Event {
    /// The device reported a stream error; the run loop ends the session
    Error { message: String },

    /// Output ran dry - the capture side is not keeping up (block of silence
    /// was emitted)
    BufferUnderrun,

    /// Capture overflowed the ring - the output side is not keeping up
    /// (captured samples were dropped)
    BufferOverrun,

    /// A processed block came out non-finite and was replaced with silence
    BlockDropped,
}

impl Event {
    /// Create an error event from any error type
    pub fn error<E: std::fmt::Display>(err: E) -> Self {
        Event::Error {
            message: err.to_string(),
        }
    }
}
