use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;
use crate::search::SearchError;

/// Errors that can occur while optimizing one image.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The input could not be read. Nothing was searched.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Search(#[from] SearchError),

    /// The bypass re-encode failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
