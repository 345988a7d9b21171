//! Seed arrangement for elimination brackets and entry shuffling.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// How the order of an entry list is randomized before a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedingMode {
    /// Keep the given order as-is.
    Single,
    /// Shuffle everything.
    Random,
    /// Keep the top two seeds fixed and shuffle within power-of-two
    /// tiers (3-4, 5-8, 9-16, ...).
    Tiered,
}

/// Shuffles the slice according to the seeding mode.
///
/// The shuffle is fully determined by `rng_seed` so a draw can be
/// reproduced.
pub fn seeded_shuffle<T>(slice: &mut [T], mode: SeedingMode, rng_seed: u64) {
    let mut rng = StdRng::seed_from_u64(rng_seed);
    match mode {
        SeedingMode::Single => {}
        SeedingMode::Random => slice.shuffle(&mut rng),
        SeedingMode::Tiered => tiered_shuffle(slice, &mut rng),
    }
}

fn tiered_shuffle<T>(slice: &mut [T], rng: &mut StdRng) {
    let len = slice.len();
    let mut start = 2;
    while start + 1 < len {
        let end = (2 * start).min(len - 1);
        slice[start..end].shuffle(rng);
        start *= 2;
    }
}

/// Arranges the seeds of the first round of an elimination bracket
/// with `num_rounds` rounds in total.
///
/// The arrangement ensures that the top 2 seeds can only meet in the
/// final, the top 4 only in the semi-finals, and so on. Each returned
/// pair is a first-round matchup of seed indices.
pub fn arrange_seeds(num_rounds: usize) -> Vec<(usize, usize)> {
    // Start with the final between the first two seeds and work down
    // the tree one round at a time.
    let mut matchups = vec![(0, 1)];
    let mut total_seeds = 2;

    for _ in 1..num_rounds {
        total_seeds *= 2;
        let mut next = Vec::with_capacity(total_seeds / 2);
        for (s1, s2) in matchups {
            next.push((s1, total_seeds - 1 - s1));
            next.push((s2, total_seeds - 1 - s2));
        }
        matchups = next;
    }

    matchups
}

/// The power of two that is immediately bigger than or equal to `n`.
pub(crate) fn next_power_of_two(n: usize) -> usize {
    let mut power = 1;
    while power < n {
        power *= 2;
    }
    power
}

/// The power of two that is immediately smaller than or equal to `n`.
pub(crate) fn prev_power_of_two(n: usize) -> usize {
    let mut power = 1;
    while power * 2 <= n {
        power *= 2;
    }
    power
}

/// The number of rounds of an elimination bracket over `num_slots`
/// starting slots.
pub(crate) fn num_rounds_for(num_slots: usize) -> usize {
    let mut slots = num_slots;
    let mut rounds = 0;
    while slots > 1 {
        slots >>= 1;
        rounds += 1;
    }
    rounds
}

/// The total number of matches of an elimination bracket with the
/// given number of rounds.
pub(crate) fn num_matches_for(num_rounds: usize) -> usize {
    (0..num_rounds).map(|i| 1 << i).sum()
}
