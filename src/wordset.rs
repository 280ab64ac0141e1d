use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;

/// Ordered collection of words with uniform random sampling.
///
/// Equality is order-sensitive and element-wise, so two lists with the same
/// words in a different order are different word lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wordset {
    words: Vec<String>,
}

impl Wordset {
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    pub fn random_word<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.words.choose(rng).map(String::as_str)
    }

    /// Words in first-seen order with repeats removed.
    pub fn unique_words(&self) -> Vec<String> {
        self.words.iter().unique().cloned().collect()
    }

    pub fn into_words(self) -> Vec<String> {
        self.words
    }
}

impl From<Vec<String>> for Wordset {
    fn from(words: Vec<String>) -> Self {
        Self::new(words)
    }
}

impl From<&[&str]> for Wordset {
    fn from(words: &[&str]) -> Self {
        Self::new(words.iter().map(|w| w.to_string()).collect())
    }
}

impl<'a> IntoIterator for &'a Wordset {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.words.iter()
    }
}
