//! Rankings order slots; everything else in a tournament reads from
//! them.
//!
//! The variants form a closed set dispatched through [`RankingNode`]:
//! constant entry lists, padding adapters, per-match winner rankings,
//! metric standings, elimination placements and the group-phase
//! composites. Rankings that can contain ties additionally expose a
//! [`TieableCore`].

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use enum_dispatch::enum_dispatch;

use crate::ids::{next_id, NodeId};
use crate::slot::{PlayerRef, Slot};
use crate::tournament::group_knockout::GroupKnockoutRanking;

pub mod balanced;
pub mod constant;
pub mod elimination;
pub mod even;
pub mod group_phase;
pub mod group_qualification;
pub mod match_metric;
pub mod winner;

pub use balanced::BalancedRanking;
pub use constant::{ConstantRanking, SlotRanking};
pub use elimination::EliminationRanking;
pub use even::EvenRanking;
pub use group_phase::{Group, GroupPhaseRanking};
pub use group_qualification::GroupQualificationRanking;
pub use match_metric::MatchMetricRanking;
pub use winner::WinnerRanking;

/// A ranking orders a set of slots according to a variant-specific
/// metric.
#[enum_dispatch]
pub trait Ranking {
    /// The shared ranking state.
    fn core(&self) -> &RankingCore;

    /// Recomputes the ranks. Called whenever a result that influences
    /// the ranking becomes known.
    fn update_ranks(&self);

    fn id(&self) -> NodeId {
        self.core().id
    }

    /// The current ranks in order.
    fn ranks(&self) -> Vec<Rc<Slot>> {
        self.core().ranks.borrow().clone()
    }

    /// The occupant of the i-th place, or `None` when the place is
    /// unoccupied or out of bounds.
    fn at(&self, place: usize) -> Option<Rc<Slot>> {
        self.core().ranks.borrow().get(place).cloned()
    }

    /// Registers a slot that resolves its qualification from this
    /// ranking.
    fn add_dependent_slot(&self, slot: &Rc<Slot>) {
        self.core().dependents.borrow_mut().push(Rc::downgrade(slot));
    }

    /// The slots that must refresh after this ranking recomputed.
    fn dependent_slots(&self) -> Vec<Rc<Slot>> {
        self.core()
            .dependents
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

/// The closed set of ranking variants.
#[enum_dispatch(Ranking)]
pub enum RankingNode {
    Constant(ConstantRanking),
    Slots(SlotRanking),
    Even(EvenRanking),
    Balanced(BalancedRanking),
    Winner(WinnerRanking),
    Elimination(EliminationRanking),
    MatchMetric(MatchMetricRanking),
    GroupPhase(GroupPhaseRanking),
    GroupQualification(GroupQualificationRanking),
    GroupKnockout(GroupKnockoutRanking),
}

impl RankingNode {
    /// A ranking directly filled with one slot per player, keeping the
    /// order. The usual way to provide tournament entries and tie
    /// breakers.
    pub fn constant(players: &[PlayerRef]) -> Rc<RankingNode> {
        Rc::new(RankingNode::from(ConstantRanking::new(players)))
    }

    pub(crate) fn from_slots(slots: Vec<Rc<Slot>>) -> Rc<RankingNode> {
        Rc::new(RankingNode::from(SlotRanking::new(slots)))
    }

    /// The tie capability of this ranking, if it has one.
    pub fn tie_core(&self) -> Option<&TieableCore> {
        match self {
            RankingNode::Elimination(r) => Some(r.tie_core()),
            RankingNode::MatchMetric(r) => Some(r.tie_core()),
            RankingNode::GroupPhase(r) => Some(r.tie_core()),
            RankingNode::GroupKnockout(r) => Some(r.tie_core()),
            _ => None,
        }
    }

    /// The ranks as groups: tied ranks for tieable rankings, singleton
    /// groups otherwise.
    pub fn rank_groups(&self) -> Vec<Vec<Rc<Slot>>> {
        match self.tie_core() {
            Some(tie) => tie.tied_ranks(),
            None => self.ranks().into_iter().map(|s| vec![s]).collect(),
        }
    }

    pub fn as_winner(&self) -> Option<&WinnerRanking> {
        match self {
            RankingNode::Winner(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_match_metric(&self) -> Option<&MatchMetricRanking> {
        match self {
            RankingNode::MatchMetric(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_group_phase(&self) -> Option<&GroupPhaseRanking> {
        match self {
            RankingNode::GroupPhase(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for RankingNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in self.rank_groups() {
            for slot in group {
                match slot.player() {
                    Some(p) => writeln!(f, "{}", p.id())?,
                    None => writeln!(f, "Empty slot")?,
                }
            }
            writeln!(f, "---")?;
        }
        Ok(())
    }
}

/// The state every ranking variant shares: an id, the current ranks
/// and the dependent slots.
pub struct RankingCore {
    id: NodeId,
    ranks: RefCell<Vec<Rc<Slot>>>,
    dependents: RefCell<Vec<Weak<Slot>>>,
}

impl RankingCore {
    pub fn new() -> RankingCore {
        RankingCore {
            id: next_id(),
            ranks: RefCell::new(Vec::new()),
            dependents: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn set_ranks(&self, ranks: Vec<Rc<Slot>>) {
        *self.ranks.borrow_mut() = ranks;
    }
}

impl Default for RankingCore {
    fn default() -> Self {
        Self::new()
    }
}

/// The tie capability: tied rank groups in a raw and a tie-broken
/// view, registered external tie breakers, and the top-N prefix that
/// must be untied for the ranking to be considered resolved.
pub struct TieableCore {
    core: RankingCore,
    tied_ranks: RefCell<Vec<Vec<Rc<Slot>>>>,
    unbroken_tied_ranks: RefCell<Vec<Vec<Rc<Slot>>>>,
    tie_breakers: RefCell<HashMap<String, Rc<RankingNode>>>,
    required_untied_ranks: usize,
}

impl TieableCore {
    pub fn new(required_untied_ranks: usize) -> TieableCore {
        TieableCore {
            core: RankingCore::new(),
            tied_ranks: RefCell::new(Vec::new()),
            unbroken_tied_ranks: RefCell::new(Vec::new()),
            tie_breakers: RefCell::new(HashMap::new()),
            required_untied_ranks,
        }
    }

    pub fn core(&self) -> &RankingCore {
        &self.core
    }

    /// The ranks as groups; a group with multiple slots means the rank
    /// is tied between them.
    pub fn tied_ranks(&self) -> Vec<Vec<Rc<Slot>>> {
        self.tied_ranks.borrow().clone()
    }

    /// The same groups as [`TieableCore::tied_ranks`] but without the
    /// tie breakers applied.
    pub fn unbroken_tied_ranks(&self) -> Vec<Vec<Rc<Slot>>> {
        self.unbroken_tied_ranks.borrow().clone()
    }

    /// The number of top ranks that must be untied for this ranking to
    /// count as resolved.
    pub fn required_untied_ranks(&self) -> usize {
        self.required_untied_ranks
    }

    /// Registers a tie breaker. Every tie whose player set equals the
    /// tie breaker's player set is reordered to follow it.
    pub fn add_tie_breaker(&self, tie_breaker: Rc<RankingNode>) {
        let hash = tie_hash(&tie_breaker.ranks());
        self.tie_breakers.borrow_mut().insert(hash, tie_breaker);
    }

    pub fn remove_tie_breaker(&self, tie_breaker: &RankingNode) {
        let hash = tie_hash(&tie_breaker.ranks());
        self.tie_breakers.borrow_mut().remove(&hash);
    }

    /// The ties of size >= 2 that overlap the given top n of ranks.
    pub fn blocking_ties(&self, top_n: usize) -> Vec<Vec<Rc<Slot>>> {
        top_n_blocking_ties(&self.tied_ranks.borrow(), top_n)
    }

    /// The same ties as [`TieableCore::blocking_ties`] but without tie
    /// breakers applied.
    pub fn blocking_unbroken_ties(&self, top_n: usize) -> Vec<Vec<Rc<Slot>>> {
        top_n_blocking_ties(&self.unbroken_tied_ranks.borrow(), top_n)
    }

    /// Persists the result of a recompute: stores the raw groups,
    /// applies the registered tie breakers and flattens the broken
    /// groups into the plain ranks.
    pub(crate) fn process_update(&self, updated_tied_ranks: Vec<Vec<Rc<Slot>>>) {
        let broken = self.apply_tie_breakers(&updated_tied_ranks);
        self.core
            .set_ranks(broken.iter().flatten().cloned().collect());
        *self.unbroken_tied_ranks.borrow_mut() = updated_tied_ranks;
        *self.tied_ranks.borrow_mut() = broken;
    }

    fn apply_tie_breakers(&self, tied_ranks: &[Vec<Rc<Slot>>]) -> Vec<Vec<Rc<Slot>>> {
        if self.tie_breakers.borrow().is_empty() {
            return tied_ranks.to_vec();
        }

        let mut broken = Vec::with_capacity(tied_ranks.len());
        for tie in tied_ranks {
            broken.extend(self.try_tie_break(tie));
        }
        broken
    }

    /// Attempts to find a registered tie breaker for the given tie and
    /// applies it.
    ///
    /// On success the tie is returned as single-slot groups in the tie
    /// breaker's order, with slots that the tie breaker does not know
    /// placed after. Without an applicable tie breaker the tie is
    /// returned whole.
    pub(crate) fn try_tie_break(&self, tie: &[Rc<Slot>]) -> Vec<Vec<Rc<Slot>>> {
        if tie.len() == 1 {
            return vec![tie.to_vec()];
        }

        let hash = tie_hash(tie);
        let breakers = self.tie_breakers.borrow();
        let Some(breaker) = breakers.get(&hash) else {
            return vec![tie.to_vec()];
        };

        let breaker_ids: Vec<String> = breaker
            .ranks()
            .iter()
            .filter_map(|s| s.player().map(|p| p.id().to_string()))
            .collect();

        let mut sorted = tie.to_vec();
        sorted.sort_by_key(|slot| {
            slot.player()
                .and_then(|p| breaker_ids.iter().position(|id| id == p.id()))
                .unwrap_or(usize::MAX)
        });

        sorted.into_iter().map(|s| vec![s]).collect()
    }
}

fn top_n_blocking_ties(ties: &[Vec<Rc<Slot>>], top_n: usize) -> Vec<Vec<Rc<Slot>>> {
    let mut blocking = Vec::new();
    let mut rank_index = 0;

    for tie in ties {
        if rank_index >= top_n {
            break;
        }
        if tie.len() > 1 {
            blocking.push(tie.clone());
        }
        rank_index += tie.len();
    }

    blocking
}

/// Creates a hash of the given tie by sorting and concatenating the
/// player ids in the slots. Equal hashes mean the same players are in
/// the ties.
pub fn tie_hash(tie: &[Rc<Slot>]) -> String {
    let mut ids: Vec<String> = tie
        .iter()
        .map(|s| s.player().map_or_else(String::new, |p| p.id().to_string()))
        .collect();
    ids.sort_unstable();
    ids.join("\n")
}

/// Removes duplicate players across rank groups, keeping the first
/// appearance. Slots without an occupant count as one duplicate group.
pub(crate) fn remove_double_ranks(ranks: Vec<Vec<Rc<Slot>>>) -> Vec<Vec<Rc<Slot>>> {
    let mut seen: HashSet<Option<String>> = HashSet::new();
    let mut cleaned = Vec::with_capacity(ranks.len());

    for rank in ranks {
        let mut cleaned_rank = Vec::with_capacity(rank.len());
        for slot in rank {
            let key = slot.player().map(|p| p.id().to_string());
            if seen.insert(key) {
                cleaned_rank.push(slot);
            }
        }
        if !cleaned_rank.is_empty() {
            cleaned.push(cleaned_rank);
        }
    }
    cleaned
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

    fn slots(ids: &[&str]) -> Vec<Rc<Slot>> {
        ids.iter().map(|id| Slot::with_player(player(id))).collect()
    }

    #[test]
    fn test_tie_hash_is_order_independent() {
        let a = tie_hash(&slots(&["x", "y", "z"]));
        let b = tie_hash(&slots(&["z", "x", "y"]));
        assert_eq!(a, b);
        assert_eq!(a, "x\ny\nz");

        let c = tie_hash(&slots(&["x", "y"]));
        assert_ne!(a, c);
    }

    #[test]
    fn test_process_update_flattens_groups() {
        let tie = TieableCore::new(0);
        let group1 = slots(&["a", "b"]);
        let group2 = slots(&["c"]);
        tie.process_update(vec![group1.clone(), group2.clone()]);

        assert_eq!(tie.tied_ranks().len(), 2);
        let flat: Vec<String> = tie
            .core()
            .ranks
            .borrow()
            .iter()
            .map(|s| s.player().unwrap().id().to_string())
            .collect();
        assert_eq!(flat, ["a", "b", "c"]);
    }

    #[test]
    fn test_tie_breaker_reorders_matching_tie() {
        let tie = TieableCore::new(0);
        let breaker = RankingNode::constant(&[player("b"), player("a")]);
        tie.add_tie_breaker(breaker);

        tie.process_update(vec![slots(&["a", "b"])]);

        let ranks = tie.tied_ranks();
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks[0][0].player().unwrap().id(), "b");
        assert_eq!(ranks[1][0].player().unwrap().id(), "a");

        // The unbroken view keeps the tie.
        assert_eq!(tie.unbroken_tied_ranks().len(), 1);
    }

    #[test]
    fn test_tie_breaker_ignores_other_player_sets() {
        let tie = TieableCore::new(0);
        tie.add_tie_breaker(RankingNode::constant(&[player("x"), player("y")]));
        tie.process_update(vec![slots(&["a", "b"])]);
        assert_eq!(tie.tied_ranks().len(), 1);
    }

    #[test]
    fn test_blocking_ties_respect_top_n() {
        let tie = TieableCore::new(0);
        tie.process_update(vec![slots(&["a"]), slots(&["b", "c"]), slots(&["d", "e"])]);

        assert!(tie.blocking_ties(1).is_empty());
        assert_eq!(tie.blocking_ties(2).len(), 1);
        assert_eq!(tie.blocking_ties(4).len(), 2);
    }

    #[test]
    fn test_remove_double_ranks_keeps_first_appearance() {
        let a = Slot::with_player(player("a"));
        let a_again = Slot::with_player(player("a"));
        let b = Slot::with_player(player("b"));

        let cleaned = remove_double_ranks(vec![
            vec![a.clone()],
            vec![a_again, b.clone()],
        ]);
        assert_eq!(cleaned.len(), 2);
        assert!(Rc::ptr_eq(&cleaned[0][0], &a));
        assert_eq!(cleaned[1].len(), 1);
        assert!(Rc::ptr_eq(&cleaned[1][0], &b));
    }
}
