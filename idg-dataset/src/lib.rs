//! Image captioning dataset preparation and random access.

mod common;

pub mod captions;
pub mod config;
pub mod dataset;
pub mod error;
pub mod feature;
pub mod format;
pub mod image_proc;
pub mod mscoco;
pub mod record;

pub use captions::*;
pub use config::*;
pub use dataset::*;
pub use error::*;
pub use feature::*;
pub use format::*;
pub use image_proc::*;
pub use mscoco::*;
pub use record::*;

pub use caption_text::{
    build_vocabulary, Language, Tokenizer, TokenizerConfig, Vocabulary, WordCounter, EOS, SOS,
    UNK, UNK_ID,
};
