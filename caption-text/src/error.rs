use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by tokenizers and vocabularies.
#[derive(Debug, Error)]
pub enum Error {
    /// An id without a token was looked up. It indicates a corrupted vocabulary.
    #[error("id {id} has no corresponding token in the vocabulary")]
    UnknownId { id: usize },

    /// The token/id mapping is not a bijection or misses reserved tokens.
    #[error("corrupted vocabulary: {reason}")]
    CorruptVocabulary { reason: String },

    /// The language segmenter failed to load its dictionary or to split a sentence.
    #[error("segmentation error: {reason}")]
    Segmentation { reason: String },

    /// Invalid or conflicting options.
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },
}
