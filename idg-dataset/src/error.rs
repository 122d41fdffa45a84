use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type of dataset preparation and access.
#[derive(Debug, Error)]
pub enum Error {
    /// A required file or directory is missing, or an image cannot be decoded.
    #[error("file {} is not found", path.display())]
    NotFound { path: PathBuf },

    /// The file extension does not name a supported serialization format.
    #[error("file {} can not be loaded, choose json or pickle format", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// The pickle holds a Python class instance instead of plain data.
    #[error("file {} holds a pickled {class}, which can not be loaded", path.display())]
    UnsupportedPickle { path: PathBuf, class: String },

    /// Missing or mutually exclusive construction options.
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    /// A record refers to an entity that does not exist.
    #[error("lookup error: {reason}")]
    Lookup { reason: String },

    /// A record is missing a required part.
    #[error("malformed record: {reason}")]
    MalformedRecord { reason: String },

    /// A caption index outside the dataset range.
    #[error("index {index} is out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Tokenizer or vocabulary errors, including unknown ids.
    #[error(transparent)]
    Text(#[from] caption_text::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Json5(#[from] json5::Error),

    #[error(transparent)]
    Pickle(#[from] serde_pickle::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    ReadNpz(#[from] ndarray_npy::ReadNpzError),

    #[error(transparent)]
    WriteNpz(#[from] ndarray_npy::WriteNpzError),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

impl Error {
    pub(crate) fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Check if it reports an id without a vocabulary entry.
    pub fn is_unknown_id(&self) -> bool {
        matches!(self, Self::Text(caption_text::Error::UnknownId { .. }))
    }
}
