use crate::wordset::Wordset;
use rand::seq::SliceRandom;
use rand::Rng;

/// Sizes for splitting `total` words into groups of about `desired` words.
///
/// Every size is either the maximum or one less, so there is never a tiny
/// trailing group: 200 words at a desired size of 18 become eight groups of
/// 17 and four of 16 rather than eleven of 18 and one of 2.
pub fn group_sizes(total: usize, desired: usize) -> Vec<usize> {
    if total == 0 {
        return Vec::new();
    }
    let desired = desired.max(1);

    let group_count = total.div_ceil(desired);
    let max_size = total.div_ceil(group_count);
    let reduced_size = max_size - 1;

    let mut sizes = Vec::with_capacity(group_count);
    let mut remaining = total;
    for _ in 0..group_count {
        let size = if remaining % max_size == 0 {
            max_size
        } else {
            reduced_size
        };
        sizes.push(size);
        remaining -= size;
    }
    debug_assert_eq!(remaining, 0);
    sizes
}

/// Shuffle `words` and split them into near-equal groups.
pub fn partition<R: Rng + ?Sized>(
    mut words: Vec<String>,
    desired: usize,
    rng: &mut R,
) -> Vec<Wordset> {
    words.shuffle(rng);

    let mut rest = words.into_iter();
    group_sizes(rest.len(), desired)
        .into_iter()
        .map(|size| Wordset::new(rest.by_ref().take(size).collect()))
        .collect()
}
