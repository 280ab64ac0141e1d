use crate::stats::WordStats;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;

/// Presentation orderings for a list of words, selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum Sorter {
    #[default]
    #[strum(serialize = "alphabetical-asc")]
    AlphabeticalAsc,
    #[strum(serialize = "alphabetical-desc")]
    AlphabeticalDesc,
    #[strum(serialize = "speed-asc")]
    SpeedAsc,
    #[strum(serialize = "speed-desc")]
    SpeedDesc,
    /// More-typed words first.
    #[strum(serialize = "typedCount")]
    TypedCount,
    /// More-missed words first.
    #[strum(serialize = "missedCount")]
    MissedCount,
    #[strum(serialize = "random")]
    Random,
}

impl Sorter {
    pub const ALL: [Sorter; 7] = [
        Sorter::AlphabeticalAsc,
        Sorter::AlphabeticalDesc,
        Sorter::SpeedAsc,
        Sorter::SpeedDesc,
        Sorter::TypedCount,
        Sorter::MissedCount,
        Sorter::Random,
    ];

    /// Unknown or empty names fall back to `alphabetical-asc`.
    pub fn from_name(name: &str) -> Sorter {
        Self::ALL
            .into_iter()
            .find(|sorter| sorter.to_string() == name)
            .unwrap_or_default()
    }

    /// Compare two words under this ordering.
    ///
    /// `Random` is a coin flip and not a total order; use [`Sorter::sort`]
    /// to shuffle instead of feeding it to a sort.
    pub fn compare<R: Rng + ?Sized>(
        &self,
        a: &str,
        b: &str,
        stats: &WordStats,
        rng: &mut R,
    ) -> Ordering {
        match self {
            Sorter::AlphabeticalAsc => a.to_lowercase().cmp(&b.to_lowercase()),
            Sorter::AlphabeticalDesc => b.to_lowercase().cmp(&a.to_lowercase()),
            Sorter::SpeedAsc => stats
                .median_speed(a)
                .partial_cmp(&stats.median_speed(b))
                .unwrap_or(Ordering::Equal),
            Sorter::SpeedDesc => stats
                .median_speed(b)
                .partial_cmp(&stats.median_speed(a))
                .unwrap_or(Ordering::Equal),
            Sorter::TypedCount => stats.typed_count(b).cmp(&stats.typed_count(a)),
            Sorter::MissedCount => stats.missed_count(b).cmp(&stats.missed_count(a)),
            Sorter::Random => {
                if rng.gen_bool(0.5) {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
        }
    }

    /// Order `words` in place. Ties keep their existing relative order.
    pub fn sort<R: Rng + ?Sized>(&self, words: &mut [String], stats: &WordStats, rng: &mut R) {
        match self {
            Sorter::Random => words.shuffle(rng),
            _ => words.sort_by(|a, b| self.compare(a, b, stats, rng)),
        }
    }
}
