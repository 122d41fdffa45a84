//! Token/id vocabulary and its builder.

use crate::{common::*, counter::WordCounter, error::*};

pub const UNK: &str = "<UNK>";
pub const SOS: &str = "<SOS>";
pub const EOS: &str = "<EOS>";
pub const UNK_ID: usize = 0;
pub const SOS_ID: usize = 1;
pub const EOS_ID: usize = 2;

/// The reserved tokens and their fixed ids.
pub const RESERVED_TOKENS: [(&str, usize); 3] = [(UNK, UNK_ID), (SOS, SOS_ID), (EOS, EOS_ID)];

/// The number of top frequent tokens reported when building a vocabulary.
const NUM_REPORTED_TOKENS: usize = 30;

/// A bijective mapping between tokens and ids.
///
/// It is serialized as the token to id map. Deserialization rebuilds the
/// inverse map and rejects mappings that are not bijective or miss a
/// reserved token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "IndexMap<String, usize>",
    into = "IndexMap<String, usize>"
)]
pub struct Vocabulary {
    word_ids: IndexMap<String, usize>,
    inv_word_ids: HashMap<usize, String>,
}

impl Vocabulary {
    /// Create a vocabulary containing only the reserved tokens.
    pub fn new() -> Self {
        let word_ids: IndexMap<_, _> = RESERVED_TOKENS
            .iter()
            .map(|&(token, id)| (token.to_owned(), id))
            .collect();
        let inv_word_ids = word_ids
            .iter()
            .map(|(token, &id)| (id, token.clone()))
            .collect();

        Self {
            word_ids,
            inv_word_ids,
        }
    }

    pub fn from_word_ids(word_ids: IndexMap<String, usize>) -> Result<Self> {
        for &(token, id) in &RESERVED_TOKENS {
            match word_ids.get(token) {
                Some(&found) if found == id => {}
                Some(&found) => {
                    return Err(Error::CorruptVocabulary {
                        reason: format!("reserved token {} has id {}, expect {}", token, found, id),
                    })
                }
                None => {
                    return Err(Error::CorruptVocabulary {
                        reason: format!("reserved token {} is missing", token),
                    })
                }
            }
        }

        let mut inv_word_ids = HashMap::with_capacity(word_ids.len());
        for (token, &id) in &word_ids {
            match inv_word_ids.entry(id) {
                hash_map::Entry::Vacant(entry) => {
                    entry.insert(token.clone());
                }
                hash_map::Entry::Occupied(entry) => {
                    return Err(Error::CorruptVocabulary {
                        reason: format!(
                            "id {} is shared by tokens '{}' and '{}'",
                            id,
                            entry.get(),
                            token
                        ),
                    });
                }
            }
        }

        Ok(Self {
            word_ids,
            inv_word_ids,
        })
    }

    /// The number of entries, reserved tokens included.
    pub fn len(&self) -> usize {
        self.word_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_ids.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.word_ids.contains_key(token)
    }

    pub fn word_ids(&self) -> &IndexMap<String, usize> {
        &self.word_ids
    }

    pub fn id_of(&self, token: &str) -> Option<usize> {
        self.word_ids.get(token).copied()
    }

    pub fn token_of(&self, id: usize) -> Option<&str> {
        self.inv_word_ids.get(&id).map(|token| token.as_str())
    }

    /// Iterate over (token, id) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.word_ids
            .iter()
            .map(|(token, &id)| (token.as_str(), id))
    }

    /// Map tokens to ids. Tokens out of vocabulary become the `<UNK>` id.
    pub fn encode<I, S>(&self, tokens: I) -> Vec<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens
            .into_iter()
            .map(|token| self.id_of(token.as_ref()).unwrap_or(UNK_ID))
            .collect()
    }

    /// Map ids back to tokens.
    pub fn decode<I>(&self, ids: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = usize>,
    {
        ids.into_iter()
            .map(|id| {
                self.token_of(id)
                    .map(|token| token.to_owned())
                    .ok_or(Error::UnknownId { id })
            })
            .collect()
    }

    /// Append a token with the next free id. Known tokens are left unchanged.
    fn push(&mut self, token: &str) {
        if self.word_ids.contains_key(token) {
            return;
        }
        let id = self.word_ids.len();
        self.word_ids.insert(token.to_owned(), id);
        self.inv_word_ids.insert(id, token.to_owned());
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<IndexMap<String, usize>> for Vocabulary {
    type Error = Error;

    fn try_from(word_ids: IndexMap<String, usize>) -> Result<Self, Self::Error> {
        Self::from_word_ids(word_ids)
    }
}

impl From<Vocabulary> for IndexMap<String, usize> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.word_ids
    }
}

/// Build a vocabulary from token frequencies.
///
/// Tokens counted less than `cutoff` times are discarded. The rest get ids in
/// descending frequency after the reserved tokens. With `vocab_size` set, the
/// vocabulary stops growing at `vocab_size` entries, reserved tokens
/// included.
pub fn build_vocabulary(
    counter: &WordCounter,
    cutoff: usize,
    vocab_size: Option<usize>,
) -> Result<Vocabulary> {
    if let Some(vocab_size) = vocab_size {
        if vocab_size < RESERVED_TOKENS.len() {
            return Err(Error::Configuration {
                reason: format!(
                    "vocab_size must be at least {}, but get {}",
                    RESERVED_TOKENS.len(),
                    vocab_size
                ),
            });
        }
    }

    let most_common = counter.most_common();

    info!("total distinct words: {}", counter.len());
    info!("top {} frequent words:", NUM_REPORTED_TOKENS);
    most_common
        .iter()
        .take(NUM_REPORTED_TOKENS)
        .for_each(|(token, count)| info!("{} - {}", token, count));

    let kept: Vec<&str> = most_common
        .into_iter()
        .take_while(|&(_, count)| count >= cutoff)
        .map(|(token, _)| token)
        .collect();

    let mut vocab = Vocabulary::new();
    let capacity = vocab_size.unwrap_or(usize::MAX);

    for token in &kept {
        if vocab.len() >= capacity {
            break;
        }
        vocab.push(token);
    }

    info!(
        "total distinct words more than {}: {}, vocabulary size: {}",
        cutoff,
        kept.len(),
        vocab.len()
    );

    Ok(vocab)
}
