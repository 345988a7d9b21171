//! The result contracts that the engine consumes.
//!
//! Score legality is the provider's responsibility (see the
//! `cs_badminton` crate for a concrete validator). The engine only
//! reads points, asks for the winner and mirrors scores for walkover
//! bookkeeping.

use std::rc::Rc;

use thiserror::Error;

/// The winner of a score cannot be read off because both sides won the
/// same number of sets.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("the winner is undeterminable from the score")]
pub struct Undetermined;

/// The result of a match.
///
/// The points are per-set tallies of equal length so that competitions
/// with multi-set matches can be modeled.
pub trait Score {
    /// Points of the first opponent.
    fn points1(&self) -> &[i32];

    /// Points of the second opponent.
    fn points2(&self) -> &[i32];

    /// Returns 0 or 1 for whether the first or the second opponent
    /// won.
    fn winner(&self) -> Result<usize, Undetermined>;

    /// Returns a new score with the two sides flipped.
    fn invert(&self) -> Rc<dyn Score>;
}

/// A court or field that a match is played on.
pub trait Location {
    /// Returns an id that is unique among the locations of a
    /// tournament.
    fn id(&self) -> &str;
}
