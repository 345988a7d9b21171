//! Badminton score validation for the courtside engine.
//!
//! A [`BadmintonScore`] is only constructible from per-set point
//! tallies that are legal under the given [`ScoreSettings`]; the
//! courtside core can therefore trust any score it is handed and never
//! re-checks. The rules cover rally scoring with an optional two-point
//! winning margin and a point cap, as in BWF badminton (21 points, 2
//! winning sets, capped at 30).

use std::rc::Rc;

use courtside::{Score, Undetermined};
use thiserror::Error;

/// The settings are inconsistent.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("winning points are zero or less")]
    PointsZero,
    #[error("winning sets are zero or less")]
    SetsZero,
    #[error("max points are less than winning points")]
    MaxPoints,
}

/// The point tallies do not form a legal score.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ScoreError {
    #[error("empty score")]
    Empty,
    #[error("opponents have unequal number of sets")]
    UnequalSets,
    #[error("too few sets")]
    TooFewSets,
    #[error("too many sets")]
    TooManySets,
    #[error("score contains unneeded extra sets")]
    UnneededSets,
    #[error("a set has equal points")]
    UndeterminedSet,
    #[error("negative points")]
    NegativePoints,
    #[error("set winner points are less than the winning point setting")]
    TooFewPoints,
    #[error("points exceed the max points setting")]
    TooManyPoints,
    #[error("the winning point margin is invalid")]
    InvalidMargin,
    #[error("both opponents won an equal number of sets")]
    EqualSetWins,
}

/// The scoring rules a [`BadmintonScore`] is validated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreSettings {
    pub winning_points: i32,
    pub winning_sets: usize,
    pub max_points: i32,
    pub two_point_margin: bool,
}

impl ScoreSettings {
    /// Validates the settings. Without a two-point margin the point
    /// cap is meaningless and forced equal to the winning points.
    pub fn new(
        winning_points: i32,
        winning_sets: usize,
        max_points: i32,
        two_point_margin: bool,
    ) -> Result<ScoreSettings, SettingsError> {
        let max_points = if two_point_margin {
            max_points
        } else {
            winning_points
        };

        if winning_points <= 0 {
            return Err(SettingsError::PointsZero);
        }
        if winning_sets == 0 {
            return Err(SettingsError::SetsZero);
        }
        if max_points < winning_points {
            return Err(SettingsError::MaxPoints);
        }

        Ok(ScoreSettings {
            winning_points,
            winning_sets,
            max_points,
            two_point_margin,
        })
    }
}

/// A validated badminton score.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BadmintonScore {
    a: Vec<i32>,
    b: Vec<i32>,
}

impl BadmintonScore {
    /// Validates the per-set tallies against the settings.
    ///
    /// A set is valid iff the winner reaches exactly the winning
    /// points without a margin being needed, or lands strictly between
    /// winning and max points with exactly a two-point lead, or hits
    /// the cap with any lead.
    pub fn new(
        a: Vec<i32>,
        b: Vec<i32>,
        settings: ScoreSettings,
    ) -> Result<BadmintonScore, ScoreError> {
        if a.is_empty() || b.is_empty() {
            return Err(ScoreError::Empty);
        }
        if a.len() != b.len() {
            return Err(ScoreError::UnequalSets);
        }
        if a.len() < settings.winning_sets {
            return Err(ScoreError::TooFewSets);
        }
        if a.len() >= 2 * settings.winning_sets {
            return Err(ScoreError::TooManySets);
        }

        let winning_margin = if settings.two_point_margin { 2 } else { 1 };

        let mut set_wins_a = 0;
        let mut set_wins_b = 0;
        for i in 0..a.len() {
            let winner = a[i].max(b[i]);
            let loser = a[i].min(b[i]);

            if set_wins_a == settings.winning_sets || set_wins_b == settings.winning_sets {
                return Err(ScoreError::UnneededSets);
            }
            if winner == loser {
                return Err(ScoreError::UndeterminedSet);
            }
            if loser < 0 {
                return Err(ScoreError::NegativePoints);
            }
            if winner < settings.winning_points {
                return Err(ScoreError::TooFewPoints);
            }
            if winner > settings.max_points {
                return Err(ScoreError::TooManyPoints);
            }
            let past_winning = winner > settings.winning_points;
            if winner < settings.max_points && past_winning && winner - loser != winning_margin {
                return Err(ScoreError::InvalidMargin);
            }
            if winner == settings.max_points && past_winning && winner - loser > winning_margin {
                return Err(ScoreError::InvalidMargin);
            }

            if a[i] > b[i] {
                set_wins_a += 1;
            } else {
                set_wins_b += 1;
            }
        }

        if set_wins_a == set_wins_b {
            return Err(ScoreError::EqualSetWins);
        }

        Ok(BadmintonScore { a, b })
    }
}

impl Score for BadmintonScore {
    fn points1(&self) -> &[i32] {
        &self.a
    }

    fn points2(&self) -> &[i32] {
        &self.b
    }

    fn winner(&self) -> Result<usize, Undetermined> {
        let mut set_wins = 0;
        for i in 0..self.a.len() {
            if self.a[i] > self.b[i] {
                set_wins += 1;
            }
            if self.b[i] > self.a[i] {
                set_wins -= 1;
            }
        }

        match set_wins {
            1.. => Ok(0),
            ..=-1 => Ok(1),
            _ => Err(Undetermined),
        }
    }

    fn invert(&self) -> Rc<dyn Score> {
        Rc::new(BadmintonScore {
            a: self.b.clone(),
            b: self.a.clone(),
        })
    }
}

/// The canonical straight-sets winning score for the given settings,
/// handy as a walkover score.
pub fn max_score(settings: ScoreSettings) -> BadmintonScore {
    BadmintonScore {
        a: vec![settings.winning_points; settings.winning_sets],
        b: vec![0; settings.winning_sets],
    }
}
