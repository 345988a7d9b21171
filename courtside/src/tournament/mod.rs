//! Tournament modes and the machinery they share.
//!
//! Every tournament begins with an entries ranking and ends with a
//! final ranking; what sits in between depends on the mode. The shared
//! [`TournamentCore`] owns the match list, the ranking graph and the
//! editing/withdrawal policies, and drives result propagation.

use std::rc::Rc;

use log::{info, trace};
use thiserror::Error;

use crate::graph::RankingGraph;
use crate::ids::{next_id, NodeId};
use crate::matches::{Match, MatchList};
use crate::ranking::{Ranking, RankingNode};
use crate::slot::PlayerRef;

pub mod consolation;
pub mod double_elimination;
pub mod group_knockout;
pub mod group_phase;
pub mod round_robin;
pub mod single_elimination;

pub use consolation::{ConsolationBracket, SingleEliminationWithConsolation};
pub use double_elimination::DoubleElimination;
pub use group_knockout::{GroupKnockout, KnockoutMode, KnockoutPhase};
pub use group_phase::GroupPhase;
pub use round_robin::RoundRobin;
pub use single_elimination::SingleElimination;

/// A tournament cannot be built from the given entries and settings.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TournamentError {
    #[error("not enough entries for this tournament mode")]
    TooFewEntries,
    #[error("the number of groups has to be at least 1")]
    TooFewGroups,
    #[error("the number of groups is too large for the amount of entries")]
    TooManyGroups,
    #[error("the number of qualifications has to be at least 2")]
    TooFewQuals,
}

/// Decides which completed matches may still have their result edited.
pub trait EditingPolicy {
    /// The comprehensive list of matches that are editable.
    fn editable_matches(&self) -> Vec<Rc<Match>>;

    /// Recomputes the editable set from the current match state.
    fn update_editable_matches(&self);
}

/// Decides how a player can withdraw from a tournament and whether
/// they would be allowed to reenter.
///
/// The list methods are dry runs; [`TournamentCore::withdraw_player`]
/// and [`TournamentCore::reenter_player`] apply them.
pub trait WithdrawalPolicy {
    /// The matches the player would be withdrawn from. An empty list
    /// means withdrawal is not applicable.
    fn list_withdraw_matches(&self, player: &PlayerRef) -> Vec<Rc<Match>>;

    /// The matches the player would reenter into. An empty list means
    /// reentering is not applicable.
    fn list_reenter_matches(&self, player: &PlayerRef) -> Vec<Rc<Match>>;
}

/// The chain of matches and rankings every tournament mode is built
/// around.
pub struct TournamentCore {
    entries: Rc<RankingNode>,
    final_ranking: Rc<RankingNode>,
    match_list: Rc<MatchList>,
    ranking_graph: Rc<RankingGraph>,
    editing_policy: Rc<dyn EditingPolicy>,
    withdrawal_policy: Rc<dyn WithdrawalPolicy>,
    id: NodeId,
}

impl TournamentCore {
    pub(crate) fn new(
        entries: Rc<RankingNode>,
        final_ranking: Rc<RankingNode>,
        match_list: Rc<MatchList>,
        ranking_graph: Rc<RankingGraph>,
        editing_policy: Rc<dyn EditingPolicy>,
        withdrawal_policy: Rc<dyn WithdrawalPolicy>,
    ) -> TournamentCore {
        TournamentCore {
            entries,
            final_ranking,
            match_list,
            ranking_graph,
            editing_policy,
            withdrawal_policy,
            id: next_id(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The entries ranking holding the starting slots of all
    /// participants.
    pub fn entries(&self) -> &Rc<RankingNode> {
        &self.entries
    }

    /// The overall result of the tournament. Contains a slot for every
    /// player in the entries.
    pub fn final_ranking(&self) -> &Rc<RankingNode> {
        &self.final_ranking
    }

    pub fn match_list(&self) -> &Rc<MatchList> {
        &self.match_list
    }

    pub fn matches(&self) -> &[Rc<Match>] {
        &self.match_list.matches
    }

    pub fn rounds(&self) -> &[crate::matches::Round] {
        &self.match_list.rounds
    }

    pub fn ranking_graph(&self) -> &Rc<RankingGraph> {
        &self.ranking_graph
    }

    pub fn editable_matches(&self) -> Vec<Rc<Match>> {
        self.editing_policy.editable_matches()
    }

    pub(crate) fn editing_policy(&self) -> &Rc<dyn EditingPolicy> {
        &self.editing_policy
    }

    pub(crate) fn withdrawal_policy(&self) -> &Rc<dyn WithdrawalPolicy> {
        &self.withdrawal_policy
    }

    /// Propagates results through the ranking graph.
    ///
    /// Starting from the given ranking (or the entries when `None`),
    /// every reachable ranking recomputes in breadth-first order and
    /// its dependent slots refresh, so a ranking only ever reads
    /// ancestors that are already up to date. The editable set is
    /// recomputed at the end.
    pub fn update(&self, start: Option<&Rc<RankingNode>>) {
        let start = start.unwrap_or(&self.entries);
        trace!("propagating rankings from #{}", start.id());

        for (ranking, _depth) in self.ranking_graph.breadth_search(start) {
            ranking.update_ranks();
            for slot in ranking.dependent_slots() {
                slot.update();
            }
        }

        self.editing_policy.update_editable_matches();
    }

    /// Withdraws the player per the mode's withdrawal policy and
    /// returns the affected matches.
    pub fn withdraw_player(&self, player: &PlayerRef) -> Vec<Rc<Match>> {
        let matches = self.withdrawal_policy.list_withdraw_matches(player);
        for m in &matches {
            m.add_withdrawn_player(player);
        }
        if !matches.is_empty() {
            info!("{} withdrew from {} matches", player.id(), matches.len());
        }
        matches
    }

    /// Reenters the player where the withdrawal has not taken effect
    /// yet and returns the affected matches.
    pub fn reenter_player(&self, player: &PlayerRef) -> Vec<Rc<Match>> {
        let matches = self.withdrawal_policy.list_reenter_matches(player);
        for m in &matches {
            m.remove_withdrawn_player(player);
        }
        if !matches.is_empty() {
            info!("{} reentered {} matches", player.id(), matches.len());
        }
        matches
    }

    /// The player's matches in schedule order, drawn-bye matches
    /// excluded.
    pub fn matches_of_player(&self, player: &PlayerRef) -> Vec<Rc<Match>> {
        self.match_list.matches_of_player(player)
    }
}
