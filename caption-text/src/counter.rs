use crate::common::*;

/// Token frequency accumulator.
///
/// Tokens keep their first-seen order, which breaks ties in
/// [most_common](WordCounter::most_common).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordCounter {
    counts: IndexMap<String, usize>,
}

impl WordCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, token: &str) {
        match self.counts.get_mut(token) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(token.to_owned(), 1);
            }
        }
    }

    pub fn update<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens.into_iter().for_each(|token| self.add(token.as_ref()));
    }

    pub fn get(&self, token: &str) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// The number of distinct tokens.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Tokens sorted by descending count. Equal counts keep first-seen order.
    pub fn most_common(&self) -> Vec<(&str, usize)> {
        self.counts
            .iter()
            .map(|(token, &count)| (token.as_str(), count))
            .sorted_by(|(_, lhs), (_, rhs)| rhs.cmp(lhs))
            .collect()
    }
}

impl<S> FromIterator<S> for WordCounter
where
    S: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut counter = Self::new();
        counter.update(iter);
        counter
    }
}
