use super::Error;

/// Delivered to every operation still queued in a batch when the batch is
/// cleared.
#[derive(Debug)]
pub(super) struct BatchCleared;

impl std::error::Error for BatchCleared {}

impl core::fmt::Display for BatchCleared {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("Batch was cleared")
    }
}

impl Error {
    pub fn batch_cleared() -> Error {
        Error::from(super::ErrorKind::BatchCleared(BatchCleared))
    }

    pub fn is_batch_cleared(&self) -> bool {
        matches!(self.root().kind(), super::ErrorKind::BatchCleared(_))
    }
}
