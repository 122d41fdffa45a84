//! Language-specific word segmenters.

use crate::{common::*, error::*};
use jieba_rs::Jieba;
use unicode_segmentation::UnicodeSegmentation as _;

/// Splits a normalized sentence into word pieces.
pub trait Segmenter
where
    Self: Send + Sync,
{
    fn segment(&self, sentence: &str) -> Result<Vec<String>>;
}

/// The languages that have a registered segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Jp,
    En,
    Ch,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Jp, Language::En, Language::Ch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jp => "jp",
            Self::En => "en",
            Self::Ch => "ch",
        }
    }

    /// Build the segmenter registered for this language.
    pub fn segmenter(&self) -> Result<Box<dyn Segmenter>> {
        let segmenter: Box<dyn Segmenter> = match self {
            Self::Jp => Box::new(JapaneseSegmenter::new()?),
            Self::En => Box::new(EnglishSegmenter),
            Self::Ch => Box::new(ChineseSegmenter::new()),
        };
        Ok(segmenter)
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let lang = match text {
            "jp" => Self::Jp,
            "en" => Self::En,
            "ch" => Self::Ch,
            _ => {
                return Err(Error::Configuration {
                    reason: format!(
                        "unsupported language '{}', expect one of {}",
                        text,
                        Self::ALL.iter().map(|lang| lang.as_str()).join(", ")
                    ),
                })
            }
        };
        Ok(lang)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// English segmentation on Unicode word boundaries.
///
/// Punctuation marks are kept as separate tokens and whitespace is dropped.
#[derive(Debug, Clone, Default)]
pub struct EnglishSegmenter;

impl Segmenter for EnglishSegmenter {
    fn segment(&self, sentence: &str) -> Result<Vec<String>> {
        let tokens = sentence
            .split_word_bounds()
            .filter(|piece| !piece.trim().is_empty())
            .map(|piece| piece.to_owned())
            .collect();
        Ok(tokens)
    }
}

/// Chinese segmentation backed by the jieba dictionary.
pub struct ChineseSegmenter {
    jieba: Jieba,
}

impl ChineseSegmenter {
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }
}

impl Default for ChineseSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ChineseSegmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChineseSegmenter").finish_non_exhaustive()
    }
}

impl Segmenter for ChineseSegmenter {
    fn segment(&self, sentence: &str) -> Result<Vec<String>> {
        let tokens = self
            .jieba
            .cut(sentence, false)
            .into_iter()
            .filter(|piece| !piece.trim().is_empty())
            .map(|piece| piece.to_owned())
            .collect();
        Ok(tokens)
    }
}

/// Japanese morphological segmentation backed by the IPADIC dictionary.
pub struct JapaneseSegmenter {
    tokenizer: lindera::tokenizer::Tokenizer,
}

impl JapaneseSegmenter {
    pub fn new() -> Result<Self> {
        let tokenizer =
            lindera::tokenizer::Tokenizer::new().map_err(|err| Error::Segmentation {
                reason: format!("failed to load the IPADIC dictionary: {}", err),
            })?;
        Ok(Self { tokenizer })
    }
}

impl Debug for JapaneseSegmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JapaneseSegmenter").finish_non_exhaustive()
    }
}

impl Segmenter for JapaneseSegmenter {
    fn segment(&self, sentence: &str) -> Result<Vec<String>> {
        let tokens = self
            .tokenizer
            .tokenize(sentence)
            .map_err(|err| Error::Segmentation {
                reason: format!("failed to segment '{}': {}", sentence, err),
            })?;

        let tokens = tokens
            .into_iter()
            .map(|token| token.text.to_string())
            .filter(|piece| !piece.trim().is_empty())
            .collect();
        Ok(tokens)
    }
}
