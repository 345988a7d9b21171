//! Seeded single-elimination brackets and the editing/withdrawal
//! policies shared by all elimination modes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Deref;
use std::rc::Rc;

use crate::graph::{EliminationGraph, RankingGraph};
use crate::matches::{matches_started, Match, MatchList, Round};
use crate::ranking::elimination::EliminationRanking;
use crate::ranking::winner::{create_winner_ranking_slots, WinnerRankings};
use crate::ranking::{BalancedRanking, Ranking, RankingNode};
use crate::seeding::{arrange_seeds, num_matches_for, num_rounds_for};
use crate::slot::{PlayerRef, Slot};
use crate::tournament::{
    EditingPolicy, TournamentCore, TournamentError, WithdrawalPolicy,
};

/// A knockout bracket: every loss is final, the winner advances.
///
/// Entries are padded with drawn byes up to a power of two and seeded
/// so that the top seeds can only meet in the late rounds.
pub struct SingleElimination {
    core: TournamentCore,
    elimination_graph: Rc<EliminationGraph>,
    winner_rankings: Rc<RefCell<WinnerRankings>>,
}

impl SingleElimination {
    pub fn new(entries: Rc<RankingNode>) -> Result<SingleElimination, TournamentError> {
        Self::build(entries, true, None, None)
    }

    /// Builds the bracket and runs one propagation over it, so that
    /// embedding modes (double elimination, consolation, group
    /// knockout) immediately see resolved byes while they keep wiring.
    pub(crate) fn build(
        entries: Rc<RankingNode>,
        seeded: bool,
        ranking_graph: Option<Rc<RankingGraph>>,
        elimination_graph: Option<Rc<EliminationGraph>>,
    ) -> Result<SingleElimination, TournamentError> {
        if entries.ranks().len() < 2 {
            return Err(TournamentError::TooFewEntries);
        }

        let graph = match ranking_graph {
            Some(graph) => {
                graph.add_vertex(&entries);
                graph
            }
            None => RankingGraph::new(&entries),
        };

        let elimination_graph = elimination_graph.unwrap_or_else(EliminationGraph::new);
        let mut winner_rankings: WinnerRankings = HashMap::new();

        let balanced = BalancedRanking::create(&entries, &graph);
        let mut entry_slots = balanced.ranks();

        let num_rounds = num_rounds_for(entry_slots.len());

        let mut rounds: Vec<Round> = Vec::with_capacity(num_rounds);
        for i in 0..num_rounds {
            let matches = if i == 0 && seeded {
                create_seeded_matches(&entry_slots)
            } else {
                create_paired_matches(&entry_slots)
            };

            entry_slots =
                create_winner_ranking_slots(&matches, 0, &graph, &mut winner_rankings);

            if i == 0 {
                for slot in &entry_slots {
                    let winner_ranking = slot
                        .placement()
                        .expect("winner slots resolve through placements")
                        .ranking()
                        .clone();
                    graph.add_edge(&balanced, &winner_ranking);
                }
            } else {
                link_matches(&rounds[i - 1].matches, &matches, &elimination_graph);
            }

            rounds.push(Round::new(matches));
        }

        let mut matches = Vec::with_capacity(num_matches_for(num_rounds));
        for round in &rounds {
            matches.extend(round.matches.iter().cloned());
        }
        let match_list = MatchList::new(matches, rounds);

        let finals = match_list.matches.last().expect("a bracket has matches");
        let finals_ranking = winner_rankings[&finals.id()].clone();
        let final_ranking = EliminationRanking::create(
            match_list.clone(),
            entries.clone(),
            &[finals_ranking],
            &graph,
        );

        let winner_rankings = Rc::new(RefCell::new(winner_rankings));

        let editing_policy = Rc::new(EliminationEditingPolicy::new(
            match_list.clone(),
            elimination_graph.clone(),
        ));
        let withdrawal_policy = Rc::new(EliminationWithdrawalPolicy {
            match_list: match_list.clone(),
            elimination_graph: elimination_graph.clone(),
        });

        let core = TournamentCore::new(
            entries,
            final_ranking,
            match_list,
            graph,
            editing_policy,
            withdrawal_policy,
        );

        let tournament = SingleElimination {
            core,
            elimination_graph,
            winner_rankings,
        };
        tournament.update(None);
        Ok(tournament)
    }

    pub fn elimination_graph(&self) -> &Rc<EliminationGraph> {
        &self.elimination_graph
    }

    /// The winner ranking of the given match, if it belongs to this
    /// bracket.
    pub fn winner_ranking(&self, m: &Match) -> Option<Rc<RankingNode>> {
        self.winner_rankings.borrow().get(&m.id()).cloned()
    }

    pub(crate) fn winner_rankings(&self) -> &Rc<RefCell<WinnerRankings>> {
        &self.winner_rankings
    }
}

impl Deref for SingleElimination {
    type Target = TournamentCore;

    fn deref(&self) -> &TournamentCore {
        &self.core
    }
}

/// Creates matches with the slots taken pair-wise from the entry
/// slots.
pub(crate) fn create_paired_matches(entry_slots: &[Rc<Slot>]) -> Vec<Rc<Match>> {
    entry_slots
        .chunks_exact(2)
        .map(|pair| Match::new(pair[0].clone(), pair[1].clone()))
        .collect()
}

/// Creates the first-round matches with the slots arranged for a
/// seeded elimination round.
pub(crate) fn create_seeded_matches(entry_slots: &[Rc<Slot>]) -> Vec<Rc<Match>> {
    let num_rounds = num_rounds_for(entry_slots.len());
    arrange_seeds(num_rounds)
        .into_iter()
        .map(|(seed1, seed2)| Match::new(entry_slots[seed1].clone(), entry_slots[seed2].clone()))
        .collect()
}

/// Wires the elimination graph edges from each pair of matches to the
/// following-round match their winners meet in.
pub(crate) fn link_matches(
    round: &[Rc<Match>],
    following_round: &[Rc<Match>],
    elimination_graph: &EliminationGraph,
) {
    for (i, following) in following_round.iter().enumerate() {
        let match1 = &round[2 * i];
        let match2 = &round[2 * i + 1];

        elimination_graph.add_vertex(match1);
        elimination_graph.add_vertex(match2);
        elimination_graph.add_vertex(following);

        elimination_graph.add_edge(match1, following);
        elimination_graph.add_edge(match2, following);
    }
}

/// A completed, playable match is editable while no playable successor
/// match has started.
pub(crate) struct EliminationEditingPolicy {
    editable_matches: RefCell<Vec<Rc<Match>>>,
    match_list: Rc<MatchList>,
    elimination_graph: Rc<EliminationGraph>,
}

impl EliminationEditingPolicy {
    pub(crate) fn new(
        match_list: Rc<MatchList>,
        elimination_graph: Rc<EliminationGraph>,
    ) -> EliminationEditingPolicy {
        EliminationEditingPolicy {
            editable_matches: RefCell::new(Vec::new()),
            match_list,
            elimination_graph,
        }
    }

    fn is_editable(&self, m: &Rc<Match>) -> bool {
        if m.winner().is_err() || m.is_walkover() || m.has_bye() {
            return false;
        }

        let next_matches = self.elimination_graph.next_playable_matches(m);
        !matches_started(&next_matches)
    }
}

impl EditingPolicy for EliminationEditingPolicy {
    fn editable_matches(&self) -> Vec<Rc<Match>> {
        self.editable_matches.borrow().clone()
    }

    fn update_editable_matches(&self) {
        let editable = self
            .match_list
            .matches
            .iter()
            .filter(|m| self.is_editable(m))
            .cloned()
            .collect();
        *self.editable_matches.borrow_mut() = editable;
    }
}

/// Withdrawal scans the player's matches in schedule order and takes
/// effect in the first match where it still matters.
pub(crate) struct EliminationWithdrawalPolicy {
    pub(crate) match_list: Rc<MatchList>,
    pub(crate) elimination_graph: Rc<EliminationGraph>,
}

impl WithdrawalPolicy for EliminationWithdrawalPolicy {
    fn list_withdraw_matches(&self, player: &PlayerRef) -> Vec<Rc<Match>> {
        let player_matches = self.match_list.matches_of_player(player);

        for m in player_matches {
            if m.winner().is_err() {
                return vec![m];
            }

            // Completed by an actual result: the withdrawal belongs in
            // a later match.
            if m.has_drawn_bye() || !(m.has_bye() || m.is_walkover()) {
                continue;
            }

            let next_matches = self.elimination_graph.next_playable_matches(&m);
            let effective = next_matches.is_empty() || matches_started(&next_matches);
            if !effective {
                return vec![m];
            }
        }

        Vec::new()
    }

    fn list_reenter_matches(&self, player: &PlayerRef) -> Vec<Rc<Match>> {
        self.match_list
            .matches
            .iter()
            .filter(|m| {
                m.is_player_withdrawn(player)
                    && !matches_started(&self.elimination_graph.next_playable_matches(m))
            })
            .cloned()
            .collect()
    }
}

