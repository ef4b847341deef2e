//! Construction-time configuration errors.
//!
//! The steady-state protocol has no error path: malformed frames are dropped
//! and backpressure is a normal condition. The only fatal conditions are bad
//! configurations, rejected here when a component is built.

use thiserror::Error;

/// Fatal configuration error, detected when a component is constructed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A word width parameter was zero.
    #[error("word width must be non-zero")]
    ZeroWidth,

    /// A word width exceeds what a byte-enable mask can describe.
    #[error("word width {0} exceeds the byte-enable mask capacity")]
    WidthTooLarge(usize),

    /// A converter's wide width is not an integer multiple of its narrow one.
    #[error("width {wide} is not a multiple of width {narrow}")]
    NotDivisible {
        /// The wider of the two words, in bytes.
        wide: usize,
        /// The narrower of the two words, in bytes.
        narrow: usize,
    },

    /// A queue or FIFO was configured with no capacity.
    #[error("depth must be non-zero")]
    ZeroDepth,

    /// A header type is too large for the fixed staging buffer.
    #[error("header length {0} exceeds the staging capacity")]
    HeaderTooLarge(usize),

    /// Two routes registered the same discriminant.
    #[error("duplicate route for discriminant {0:#06x}")]
    DuplicateRoute(u16),
}
