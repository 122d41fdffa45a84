//! Records stored in formatted and preprocessed dataset files.

use crate::common::*;

/// The image entry of a formatted dataset, produced from MSCOCO captions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedRecord {
    /// The image path relative to the image root, e.g. `train2014/COCO_train2014_0001.jpg`.
    pub file_path: String,
    /// The MSCOCO image id.
    pub id: u64,
    pub captions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenized_captions: Option<Vec<String>>,
}

/// The caption body, either encoded ids or plain tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Caption {
    Ids(Vec<usize>),
    Tokens(Vec<String>),
}

impl Caption {
    pub fn len(&self) -> usize {
        match self {
            Self::Ids(ids) => ids.len(),
            Self::Tokens(tokens) => tokens.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count the `<UNK>` entries.
    pub fn num_unknown(&self) -> usize {
        match self {
            Self::Ids(ids) => ids.iter().filter(|&&id| id == UNK_ID).count(),
            Self::Tokens(tokens) => tokens.iter().filter(|token| *token == UNK).count(),
        }
    }

    /// Get the caption as ids, encoding tokens through the vocabulary.
    pub fn to_ids(&self, vocab: &Vocabulary) -> Vec<usize> {
        match self {
            Self::Ids(ids) => ids.clone(),
            Self::Tokens(tokens) => vocab.encode(tokens),
        }
    }

    /// Get the caption as tokens, decoding ids through the vocabulary.
    pub fn to_tokens(&self, vocab: &Vocabulary) -> Result<Vec<String>, caption_text::Error> {
        match self {
            Self::Ids(ids) => vocab.decode(ids.iter().copied()),
            Self::Tokens(tokens) => Ok(tokens.clone()),
        }
    }
}

/// A caption with references to its position and its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionRecord {
    pub caption_idx: usize,
    pub img_idx: usize,
    pub caption: Caption,
}

/// An image entry of a preprocessed dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// The image path relative to the image root.
    pub file_path: String,
    pub img_idx: usize,
}

/// The content of a preprocessed dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatasetFile {
    pub images: Vec<ImageRecord>,
    pub captions: Vec<CaptionRecord>,
}
