//! Per-player aggregate statistics over a list of matches.

use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::matches::Match;
use crate::ranking::group_phase::Group;
use crate::ranking::Ranking;
use crate::score::Score;
use crate::slot::PlayerRef;

/// A player's performance over a set of matches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetrics {
    pub num_matches: i32,
    pub wins: i32,
    pub losses: i32,

    pub num_sets: i32,
    pub set_wins: i32,
    pub set_losses: i32,

    pub point_wins: i32,
    pub point_losses: i32,

    #[serde(skip)]
    pub set_difference: i32,
    #[serde(skip)]
    pub point_difference: i32,

    #[serde(skip)]
    pub withdrawn: bool,
}

impl MatchMetrics {
    pub fn update_differences(&mut self) {
        self.set_difference = self.set_wins - self.set_losses;
        self.point_difference = self.point_wins - self.point_losses;
    }

    /// Adds the other metrics to this one.
    pub fn add(&mut self, other: &MatchMetrics) {
        self.num_matches += other.num_matches;
        self.wins += other.wins;
        self.losses += other.losses;

        self.num_sets += other.num_sets;
        self.set_wins += other.set_wins;
        self.set_losses += other.set_losses;

        self.point_wins += other.point_wins;
        self.point_losses += other.point_losses;

        self.update_differences();
    }
}

/// Creates a [`MatchMetrics`] for each player in the matches.
///
/// When `players` is given, only matches where both opponents are in
/// the list are counted. That restriction powers the direct-encounter
/// tie breaks.
///
/// A match without a concrete score whose winner stands because the
/// opponent withdrew is counted with the configured walkover score
/// attributed to the winner, and the loser is flagged as withdrawn.
pub fn create_metrics(
    matches: &[Rc<Match>],
    players: Option<&[PlayerRef]>,
    walkover_score: &Rc<dyn Score>,
) -> HashMap<PlayerRef, MatchMetrics> {
    let mut metrics = HashMap::new();
    for m in matches {
        extract_match_metrics(m, players, &mut metrics, walkover_score);
    }
    for m in metrics.values_mut() {
        m.update_differences();
    }
    metrics
}

fn extract_match_metrics(
    m: &Rc<Match>,
    players: Option<&[PlayerRef]>,
    metrics: &mut HashMap<PlayerRef, MatchMetrics>,
    walkover_score: &Rc<dyn Score>,
) {
    let (Some(p1), Some(p2)) = (m.slot1().player(), m.slot2().player()) else {
        return;
    };

    if let Some(players) = players {
        if !players.contains(&p1) || !players.contains(&p2) {
            return;
        }
    }

    let Ok(winner_slot) = m.winner() else {
        return;
    };
    let winner_is_p1 = Rc::ptr_eq(&winner_slot, m.slot1());

    {
        let m1 = metrics.entry(p1.clone()).or_default();
        m1.num_matches += 1;
        if winner_is_p1 {
            m1.wins += 1;
        } else {
            m1.losses += 1;
        }
    }
    {
        let m2 = metrics.entry(p2.clone()).or_default();
        m2.num_matches += 1;
        if winner_is_p1 {
            m2.losses += 1;
        } else {
            m2.wins += 1;
        }
    }

    let score = match m.score() {
        Some(score) => score,
        None => {
            // Walkover: attribute the configured score to the winner.
            if winner_is_p1 {
                metrics.get_mut(&p2).unwrap().withdrawn = true;
                walkover_score.clone()
            } else {
                metrics.get_mut(&p1).unwrap().withdrawn = true;
                walkover_score.invert()
            }
        }
    };

    let points1 = score.points1().to_vec();
    let points2 = score.points2().to_vec();
    for i in 0..points1.len() {
        let (a, b) = (points1[i], points2[i]);

        let m1 = metrics.get_mut(&p1).unwrap();
        m1.num_sets += 1;
        m1.point_wins += a;
        m1.point_losses += b;
        if a > b {
            m1.set_wins += 1;
        } else if b > a {
            m1.set_losses += 1;
        }

        let m2 = metrics.get_mut(&p2).unwrap();
        m2.num_sets += 1;
        m2.point_wins += b;
        m2.point_losses += a;
        if b > a {
            m2.set_wins += 1;
        } else if a > b {
            m2.set_losses += 1;
        }
    }
}

/// Adds zeroed metrics for players that are in the list but not in the
/// map.
pub fn add_zero_metrics(metrics: &mut HashMap<PlayerRef, MatchMetrics>, players: &[PlayerRef]) {
    for p in players {
        metrics.entry(p.clone()).or_default();
    }
}

/// Match metrics that are comparable between the groups of a group
/// phase.
///
/// With equal group sizes the metrics are the plain ones. When the
/// entry count is not divisible by the group count the groups differ
/// in size and the raw tallies cover different match counts; they are
/// rebalanced as follows:
///
///  - each match involving the last-placed team of a larger group is
///    counted as a walkover win for that team's opponent
///  - the last-placed teams keep their unaltered metrics
///  - every team of a smaller group gets one additional walkover win
///    against a phantom opponent
///
/// Afterwards every team's tally covers the same number of matches.
/// The rebalancing only kicks in once every group is free of blocking
/// ties, since it needs the last places to be settled.
pub fn create_cross_group_metrics(
    groups: &[Group],
    matches: &[Rc<Match>],
    walkover_score: &Rc<dyn Score>,
) -> HashMap<PlayerRef, MatchMetrics> {
    let groups_finished = groups.iter().all(|g| {
        let ties = g.ranking.tie_core().expect("group ranking is tieable");
        ties.blocking_ties(ties.required_untied_ranks()).is_empty()
    });
    if !groups_finished {
        return create_metrics(matches, None, walkover_score);
    }

    // Group 0 is always the smallest when a size difference exists.
    let group_size = |g: &Group| g.entries.ranks().len();
    let min_size = group_size(&groups[0]);
    let max_size = groups.iter().map(group_size).max().unwrap_or(min_size);
    if min_size == max_size {
        return create_metrics(matches, None, walkover_score);
    }

    let walkover_points = walkover_score.points1();
    let walkover_metrics = MatchMetrics {
        num_matches: 1,
        wins: 1,
        num_sets: walkover_points.len() as i32,
        set_wins: walkover_points.len() as i32,
        point_wins: walkover_points.iter().sum(),
        ..MatchMetrics::default()
    };

    let mut metrics = HashMap::new();

    for group in groups {
        if group_size(group) == min_size {
            let mut group_metrics =
                create_metrics(&group.match_list.matches, None, walkover_score);
            for m in group_metrics.values_mut() {
                m.add(&walkover_metrics);
            }
            metrics.extend(group_metrics);
            continue;
        }

        let last_placed = group
            .ranking
            .ranks()
            .last()
            .and_then(|s| s.player())
            .expect("finished group has a last place");

        let (with_last, without_last): (Vec<_>, Vec<_>) = group
            .match_list
            .matches
            .iter()
            .cloned()
            .partition(|m| m.contains_player(&last_placed));

        let mut with_last_metrics = create_metrics(&with_last, None, walkover_score);
        with_last_metrics.retain(|p, _| *p == last_placed);

        let mut without_last_metrics = create_metrics(&without_last, None, walkover_score);
        for m in without_last_metrics.values_mut() {
            m.add(&walkover_metrics);
        }

        metrics.extend(with_last_metrics);
        metrics.extend(without_last_metrics);
    }

    metrics
}
