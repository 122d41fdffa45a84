//! Caption text processing: tokenization, word counting and vocabularies.

mod common;

pub mod counter;
pub use counter::*;

pub mod error;
pub use error::*;

pub mod segmenter;
pub use segmenter::*;

pub mod tokenizer;
pub use tokenizer::*;

pub mod vocab;
pub use vocab::*;
