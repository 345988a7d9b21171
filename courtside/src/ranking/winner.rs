//! The two-element ranking behind every elimination match.

use std::collections::HashMap;
use std::rc::Rc;

use crate::graph::RankingGraph;
use crate::ids::NodeId;
use crate::matches::{Match, MatchError};
use crate::placement::Placement;
use crate::ranking::{Ranking, RankingCore, RankingNode};
use crate::slot::Slot;

/// The winner rankings of a bracket, keyed by match id.
///
/// Builders thread this map through so that later rounds (and loser
/// brackets, consolations and finals) can reference the rankings of
/// earlier matches.
pub(crate) type WinnerRankings = HashMap<NodeId, Rc<RankingNode>>;

/// Ranks the two participants of a match into `[winner, loser]`.
pub struct WinnerRanking {
    core: RankingCore,
    source_match: Rc<Match>,
}

impl WinnerRanking {
    pub(crate) fn create(source_match: &Rc<Match>) -> Rc<RankingNode> {
        Rc::new(RankingNode::from(WinnerRanking {
            core: RankingCore::new(),
            source_match: source_match.clone(),
        }))
    }

    pub fn source_match(&self) -> &Rc<Match> {
        &self.source_match
    }
}

impl Ranking for WinnerRanking {
    fn core(&self) -> &RankingCore {
        &self.core
    }

    fn update_ranks(&self) {
        let winner = match self.source_match.winner() {
            Ok(winner) => winner,
            Err(
                MatchError::BothBye | MatchError::BothWalkover | MatchError::ByeAndWalkover,
            ) => {
                // No one advances out of this match in either
                // direction.
                let bye = Slot::with_bye(false);
                self.core.set_ranks(vec![bye.clone(), bye]);
                return;
            }
            Err(_) => {
                self.core.set_ranks(Vec::new());
                return;
            }
        };

        let mut loser = self.source_match.other_slot(&winner);

        let drawn_bye_loser = loser.bye().is_some_and(|b| b.drawn);
        let withdrawn_loser = self
            .source_match
            .withdrawn_slots()
            .iter()
            .any(|s| Rc::ptr_eq(s, &loser));
        if drawn_bye_loser || withdrawn_loser {
            // Nobody actually proceeds on the loser path.
            loser = Slot::with_bye(false);
        }

        self.core.set_ranks(vec![winner, loser]);
    }
}

/// Adds the winner ranking as a dependant of the rankings that feed
/// its match's slots, but only when those are winner rankings of the
/// same bracket (present in `allowed`). Cross-bracket dependencies are
/// wired explicitly by the builders instead.
pub(crate) fn link_ranking_graph(
    ranking: &Rc<RankingNode>,
    graph: &RankingGraph,
    allowed: &WinnerRankings,
) {
    graph.add_vertex(ranking);

    let winner_ranking = ranking
        .as_winner()
        .expect("only winner rankings are linked through their match slots");
    let m = winner_ranking.source_match();

    let (Some(placement1), Some(placement2)) = (m.slot1().placement(), m.slot2().placement())
    else {
        return;
    };

    let ranking1 = placement1.ranking();
    let ranking2 = placement2.ranking();

    let (Some(winner1), Some(winner2)) = (ranking1.as_winner(), ranking2.as_winner()) else {
        return;
    };

    if allowed.contains_key(&winner1.source_match().id()) {
        graph.add_edge(ranking1, ranking);
    }

    if Rc::ptr_eq(ranking1, ranking2) {
        return;
    }

    if allowed.contains_key(&winner2.source_match().id()) {
        graph.add_edge(ranking2, ranking);
    }
}

/// Creates one placement slot per match, pointing at `target_rank` of
/// the match's winner ranking (0 = winner, 1 = loser). Missing winner
/// rankings are created and linked into the ranking graph.
pub(crate) fn create_winner_ranking_slots(
    matches: &[Rc<Match>],
    target_rank: usize,
    graph: &RankingGraph,
    winner_rankings: &mut WinnerRankings,
) -> Vec<Rc<Slot>> {
    let mut slots = Vec::with_capacity(matches.len());
    for m in matches {
        let ranking = winner_rankings
            .get(&m.id())
            .cloned()
            .unwrap_or_else(|| WinnerRanking::create(m));
        link_ranking_graph(&ranking, graph, winner_rankings);
        winner_rankings.insert(m.id(), ranking.clone());

        let placement = Placement::new(ranking, target_rank);
        slots.push(Slot::with_placement(placement));
    }
    slots
}
