use thiserror::Error;

/// Returned when a read needs more bytes than the buffer has left.
///
/// No partial value is ever produced alongside this error. The buffer that
/// raised it should be dropped; reads are not resumable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("index out of bounds: needed {needed} byte(s) at offset {offset}, {available} available")]
pub struct BoundsError {
    pub offset:    usize,
    pub needed:    usize,
    pub available: usize,
}
