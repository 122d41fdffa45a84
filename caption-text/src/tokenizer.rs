//! Caption sentence normalization and tokenization.

use crate::{common::*, error::*, segmenter::*};
use regex::Regex;

static REMOVED_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[.,!?"';:。、]"#).unwrap());
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").unwrap());

/// Tokenizer options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// The language used to pick a segmenter.
    pub lang: Option<Language>,
    /// Segment sentences with the language segmenter. If unset, sentences
    /// are split by whitespace.
    pub tokenize: bool,
    /// Trim and lowercase sentences.
    pub to_lower: bool,
    /// Remove punctuation marks like `.,!?"';:。、`.
    pub remove_suffix: bool,
    /// Replace every digit with `0`.
    pub replace_digits: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lang: None,
            tokenize: false,
            to_lower: true,
            remove_suffix: true,
            replace_digits: true,
        }
    }
}

/// Splits caption sentences into normalized tokens.
pub struct Tokenizer {
    config: TokenizerConfig,
    segmenter: Option<Box<dyn Segmenter>>,
}

impl Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Result<Self> {
        let segmenter = if config.tokenize {
            let lang = config.lang.ok_or_else(|| Error::Configuration {
                reason: "lang has to be defined to tokenize sentences".into(),
            })?;
            debug!("use {} segmenter", lang);
            Some(lang.segmenter()?)
        } else {
            None
        };

        Ok(Self { config, segmenter })
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Normalize and split a sentence into tokens.
    ///
    /// The steps run in this order: trim and lowercase, punctuation removal,
    /// digit replacement, then segmentation.
    pub fn tokenize(&self, sentence: &str) -> Result<Vec<String>> {
        let TokenizerConfig {
            to_lower,
            remove_suffix,
            replace_digits,
            ..
        } = self.config;

        let mut sentence = sentence.to_owned();

        if to_lower {
            sentence = sentence.trim().to_lowercase();
        }

        if remove_suffix {
            sentence = REMOVED_CHARS.replace_all(&sentence, "").into_owned();
        }

        if replace_digits {
            sentence = DIGITS.replace_all(&sentence, "0").into_owned();
        }

        match &self.segmenter {
            Some(segmenter) => segmenter.segment(&sentence),
            None => Ok(sentence
                .split_whitespace()
                .map(|token| token.to_owned())
                .collect()),
        }
    }
}
