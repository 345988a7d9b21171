//! Metric-based standings with the recursive tie break.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::graph::RankingGraph;
use crate::matches::Match;
use crate::metrics::{
    add_zero_metrics, create_cross_group_metrics, create_metrics, MatchMetrics,
};
use crate::ranking::group_phase::Group;
use crate::ranking::{Ranking, RankingCore, RankingNode, TieableCore};
use crate::score::Score;
use crate::slot::{PlayerRef, Slot};

/// Where a metric ranking takes its tallies from.
enum MetricsSource {
    /// Straight aggregation over the ranking's matches.
    Plain,
    /// Aggregation rebalanced for unequal group sizes, making the
    /// tallies comparable across the groups of a group phase.
    CrossGroup(Vec<Group>),
}

/// Ranks the players who played a list of matches by their
/// performance.
///
/// Players are bucketed by wins; ties are resolved by the two-way and
/// multi-way break sequences over set and point differences, with
/// direct encounters consulted first in the two-way case.
pub struct MatchMetricRanking {
    tie: TieableCore,
    players: Vec<PlayerRef>,
    matches: Vec<Rc<Match>>,
    walkover_score: Rc<dyn Score>,
    source: MetricsSource,
    metrics: RefCell<HashMap<PlayerRef, MatchMetrics>>,
}

impl MatchMetricRanking {
    pub(crate) fn create(
        entries: &Rc<RankingNode>,
        matches: Vec<Rc<Match>>,
        graph: &RankingGraph,
        walkover_score: Rc<dyn Score>,
        required_untied_ranks: usize,
    ) -> Rc<RankingNode> {
        Self::build(
            entries,
            matches,
            graph,
            walkover_score,
            required_untied_ranks,
            MetricsSource::Plain,
        )
    }

    /// The cross-group flavor used to compare one rank across all
    /// groups of a group phase.
    pub(crate) fn create_cross_group(
        entries: &Rc<RankingNode>,
        matches: Vec<Rc<Match>>,
        graph: &RankingGraph,
        walkover_score: Rc<dyn Score>,
        required_untied_ranks: usize,
        groups: Vec<Group>,
    ) -> Rc<RankingNode> {
        Self::build(
            entries,
            matches,
            graph,
            walkover_score,
            required_untied_ranks,
            MetricsSource::CrossGroup(groups),
        )
    }

    fn build(
        entries: &Rc<RankingNode>,
        matches: Vec<Rc<Match>>,
        graph: &RankingGraph,
        walkover_score: Rc<dyn Score>,
        required_untied_ranks: usize,
        source: MetricsSource,
    ) -> Rc<RankingNode> {
        let players = entries
            .ranks()
            .iter()
            .filter_map(|s| s.player())
            .collect();

        let ranking = Rc::new(RankingNode::from(MatchMetricRanking {
            tie: TieableCore::new(required_untied_ranks),
            players,
            matches,
            walkover_score,
            source,
            metrics: RefCell::new(HashMap::new()),
        }));
        ranking.update_ranks();

        graph.add_vertex(&ranking);
        graph.add_edge(entries, &ranking);

        ranking
    }

    pub fn tie_core(&self) -> &TieableCore {
        &self.tie
    }

    /// Each player's metrics as of the last recompute.
    pub fn metrics(&self) -> HashMap<PlayerRef, MatchMetrics> {
        self.metrics.borrow().clone()
    }

    pub(crate) fn is_withdrawn(&self, player: &PlayerRef) -> bool {
        self.metrics
            .borrow()
            .get(player)
            .is_some_and(|m| m.withdrawn)
    }

    /// Attempts to break the tie between players with the same number
    /// of wins.
    ///
    /// Two-player ties go through [`Self::break_two_way_tie`]. Larger
    /// ties are sub-sorted by overall set difference and recursed; a
    /// tie that set difference cannot split is sub-sorted by overall
    /// point difference, after which two-player sub-ties get the
    /// two-way break and anything larger is emitted as irreducible.
    fn break_tie(
        &self,
        tie: Vec<PlayerRef>,
        metrics: &HashMap<PlayerRef, MatchMetrics>,
    ) -> Vec<Vec<PlayerRef>> {
        match tie.len() {
            0 | 1 => return vec![tie],
            2 => return self.break_two_way_tie(&tie[0], &tie[1], metrics),
            _ => {}
        }

        let by_sets = sort_by_metric(&tie, metrics, |m| m.set_difference);
        if by_sets.len() > 1 {
            let mut broken = Vec::new();
            for sub_tie in by_sets {
                broken.extend(self.break_tie(sub_tie, metrics));
            }
            return broken;
        }

        let by_points = sort_by_metric(&tie, metrics, |m| m.point_difference);
        let mut broken = Vec::new();
        for sub_tie in by_points {
            if sub_tie.len() == 2 {
                broken.extend(self.break_two_way_tie(&sub_tie[0], &sub_tie[1], metrics));
            } else {
                broken.push(sub_tie);
            }
        }
        broken
    }

    /// Attempts to break a two-way tie.
    ///
    /// The break consults, in order: direct-encounter wins, direct set
    /// difference, direct point difference, overall set difference,
    /// overall point difference. The first decisive metric wins; when
    /// none is, `[[p1, p2]]` is returned.
    fn break_two_way_tie(
        &self,
        p1: &PlayerRef,
        p2: &PlayerRef,
        metrics: &HashMap<PlayerRef, MatchMetrics>,
    ) -> Vec<Vec<PlayerRef>> {
        let tie = vec![p1.clone(), p2.clone()];
        let mut direct = create_metrics(&self.matches, Some(&tie), &self.walkover_score);
        add_zero_metrics(&mut direct, &tie);

        let attempts: [(&HashMap<PlayerRef, MatchMetrics>, fn(&MatchMetrics) -> i32); 5] = [
            (&direct, |m| m.wins),
            (&direct, |m| m.set_difference),
            (&direct, |m| m.point_difference),
            (metrics, |m| m.set_difference),
            (metrics, |m| m.point_difference),
        ];

        for (source, getter) in attempts {
            let sorted = sort_by_metric(&tie, source, getter);
            if sorted.len() == 2 {
                return sorted;
            }
        }

        vec![tie]
    }
}

impl Ranking for MatchMetricRanking {
    fn core(&self) -> &RankingCore {
        self.tie.core()
    }

    fn update_ranks(&self) {
        let mut metrics = match &self.source {
            MetricsSource::Plain => {
                create_metrics(&self.matches, None, &self.walkover_score)
            }
            MetricsSource::CrossGroup(groups) => {
                create_cross_group_metrics(groups, &self.matches, &self.walkover_score)
            }
        };
        add_zero_metrics(&mut metrics, &self.players);

        let by_wins = sort_by_metric(&self.players, &metrics, |m| m.wins);

        let mut tie_broken = Vec::with_capacity(by_wins.len());
        for tie in by_wins {
            tie_broken.extend(self.break_tie(tie, &metrics));
        }

        *self.metrics.borrow_mut() = metrics;

        let ranks = tie_broken
            .into_iter()
            .map(|tie| {
                tie.into_iter()
                    .map(|p| Slot::with_player(p))
                    .collect::<Vec<Rc<Slot>>>()
            })
            .collect();

        self.tie.process_update(ranks);
    }
}

/// Sorts the players into descending buckets of the metric returned by
/// the getter, preserving the input order within a bucket.
fn sort_by_metric(
    players: &[PlayerRef],
    metrics: &HashMap<PlayerRef, MatchMetrics>,
    getter: fn(&MatchMetrics) -> i32,
) -> Vec<Vec<PlayerRef>> {
    let mut buckets: BTreeMap<i32, Vec<PlayerRef>> = BTreeMap::new();
    let zero = MatchMetrics::default();

    for p in players {
        let value = getter(metrics.get(p).unwrap_or(&zero));
        buckets.entry(value).or_default().push(p.clone());
    }

    buckets.into_values().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::Player;

    struct Named(String);

    impl Player for Named {
        fn id(&self) -> &str {
            &self.0
        }
    }

    fn player(id: &str) -> PlayerRef {
        PlayerRef::new(Rc::new(Named(id.to_string())))
    }

    #[test]
    fn test_sort_by_metric_buckets_descending() {
        let (a, b, c) = (player("a"), player("b"), player("c"));
        let mut metrics = HashMap::new();
        metrics.insert(a.clone(), MatchMetrics { wins: 1, ..Default::default() });
        metrics.insert(b.clone(), MatchMetrics { wins: 3, ..Default::default() });
        metrics.insert(c.clone(), MatchMetrics { wins: 1, ..Default::default() });

        let sorted = sort_by_metric(&[a.clone(), b.clone(), c.clone()], &metrics, |m| m.wins);
        assert_eq!(sorted.len(), 2);
        assert_eq!(sorted[0], vec![b]);
        assert_eq!(sorted[1], vec![a, c]);
    }
}
