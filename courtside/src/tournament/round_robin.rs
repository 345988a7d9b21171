//! Round robins scheduled by the circle method.

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use crate::graph::RankingGraph;
use crate::matches::{Match, MatchList, Round};
use crate::ranking::match_metric::MatchMetricRanking;
use crate::ranking::{EvenRanking, Ranking, RankingNode};
use crate::score::Score;
use crate::slot::{PlayerRef, Slot};
use crate::tournament::{
    EditingPolicy, TournamentCore, TournamentError, WithdrawalPolicy,
};

/// Everyone plays everyone; the standings come from the match metrics.
pub struct RoundRobin {
    core: TournamentCore,
}

impl RoundRobin {
    /// Creates a round robin where all matchups are played through
    /// `passes` times. The walkover score is attributed whenever a
    /// match is decided by withdrawal.
    pub fn new(
        entries: Rc<RankingNode>,
        passes: usize,
        walkover_score: Rc<dyn Score>,
    ) -> Result<RoundRobin, TournamentError> {
        if entries.ranks().len() < 2 {
            return Err(TournamentError::TooFewEntries);
        }

        let graph = RankingGraph::new(&entries);
        let even_entries = EvenRanking::create(&entries, &graph);
        let entry_slots = even_entries.ranks();

        let rounds = create_rounds(&entry_slots, passes);
        let matches: Vec<Rc<Match>> = rounds
            .iter()
            .flat_map(|r| r.matches.iter().cloned())
            .collect();
        let match_list = MatchList::new(matches, rounds);

        let final_ranking = MatchMetricRanking::create(
            &even_entries,
            match_list.matches.clone(),
            &graph,
            walkover_score,
            0,
        );

        let editing_policy = Rc::new(RoundRobinEditingPolicy::new(match_list.clone()));
        let withdrawal_policy = Rc::new(RoundRobinWithdrawalPolicy {
            match_list: match_list.clone(),
        });

        let core = TournamentCore::new(
            entries,
            final_ranking,
            match_list,
            graph,
            editing_policy,
            withdrawal_policy,
        );

        let tournament = RoundRobin { core };
        tournament.update(None);
        Ok(tournament)
    }
}

impl Deref for RoundRobin {
    type Target = TournamentCore;

    fn deref(&self) -> &TournamentCore {
        &self.core
    }
}

/// The full schedule over the (even) entry slots: `passes` passes of
/// `len - 1` rounds each. Deterministic in the entry count and pass
/// count.
pub(crate) fn create_rounds(entry_slots: &[Rc<Slot>], passes: usize) -> Vec<Round> {
    let num_passes = passes.max(1);
    let num_rounds = entry_slots.len().saturating_sub(1);

    let mut rounds = Vec::with_capacity(num_passes * num_rounds);
    for pass in 0..num_passes {
        for round in 0..num_rounds {
            rounds.push(create_round(entry_slots, pass, round));
        }
    }
    rounds
}

fn create_round(entry_slots: &[Rc<Slot>], pass: usize, round: usize) -> Round {
    let num_matches = entry_slots.len() / 2;
    let matches = (0..num_matches)
        .map(|m| {
            let (slot1, slot2) = pick_opponents(entry_slots, pass, round, m);
            Match::new(slot1, slot2)
        })
        .collect();
    Round::new(matches)
}

/// Returns the opponents of the given match, balancing everyone's
/// share of first-named matches across rounds and passes.
fn pick_opponents(
    entry_slots: &[Rc<Slot>],
    pass: usize,
    round: usize,
    match_index: usize,
) -> (Rc<Slot>, Rc<Slot>) {
    let len = entry_slots.len();
    let i1 = circle_index(match_index, len, round);
    let i2 = circle_index(len - 1 - match_index, len, round);

    let mut slot1 = entry_slots[i1].clone();
    let mut slot2 = entry_slots[i2].clone();

    if match_index == 0 && round % 2 != 0 {
        std::mem::swap(&mut slot1, &mut slot2);
    }
    if pass % 2 != 0 {
        std::mem::swap(&mut slot1, &mut slot2);
    }

    (slot1, slot2)
}

/// Rotates the index for the given round: position 0 stays fixed while
/// positions 1..len-1 cycle (the circle method).
pub(crate) fn circle_index(index: usize, len: usize, round: usize) -> usize {
    if index == 0 {
        return 0;
    }
    let cycle = len - 1;
    (index - 1 + cycle - round % cycle) % cycle + 1
}

/// Every decided match without a bye or walkover is editable.
pub(crate) struct RoundRobinEditingPolicy {
    editable_matches: RefCell<Vec<Rc<Match>>>,
    match_list: Rc<MatchList>,
}

impl RoundRobinEditingPolicy {
    pub(crate) fn new(match_list: Rc<MatchList>) -> RoundRobinEditingPolicy {
        RoundRobinEditingPolicy {
            editable_matches: RefCell::new(Vec::new()),
            match_list,
        }
    }
}

impl EditingPolicy for RoundRobinEditingPolicy {
    fn editable_matches(&self) -> Vec<Rc<Match>> {
        self.editable_matches.borrow().clone()
    }

    fn update_editable_matches(&self) {
        let editable = self
            .match_list
            .matches
            .iter()
            .filter(|m| m.winner().is_ok() && !m.is_walkover() && !m.has_bye())
            .cloned()
            .collect();
        *self.editable_matches.borrow_mut() = editable;
    }
}

/// Withdrawal affects every match of the player that is not decided
/// yet; reentering undoes it wholesale.
pub(crate) struct RoundRobinWithdrawalPolicy {
    pub(crate) match_list: Rc<MatchList>,
}

impl WithdrawalPolicy for RoundRobinWithdrawalPolicy {
    fn list_withdraw_matches(&self, player: &PlayerRef) -> Vec<Rc<Match>> {
        self.match_list
            .matches_of_player(player)
            .into_iter()
            .filter(|m| m.winner().is_err())
            .collect()
    }

    fn list_reenter_matches(&self, player: &PlayerRef) -> Vec<Rc<Match>> {
        self.match_list
            .matches
            .iter()
            .filter(|m| m.withdrawn_players().contains(player))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_index_fixes_position_zero() {
        assert_eq!(circle_index(0, 14, 0), 0);
        assert_eq!(circle_index(0, 14, 7), 0);
    }

    #[test]
    fn test_circle_index_rotation() {
        let len = 14;
        assert_eq!(circle_index(1, len, 0), 1);
        assert_eq!(circle_index(5, len, 0), 5);
        assert_eq!(circle_index(1, len, 1), 13);
        assert_eq!(circle_index(2, len, 1), 1);
        assert_eq!(circle_index(1, len, len - 2), 2);
    }

    #[test]
    fn test_schedule_cycles_first_named_side() {
        // Three players: the three real matches form a cycle so that
        // nobody is first-named twice.
        let slots: Vec<_> = (0..4)
            .map(|i| {
                if i < 3 {
                    crate::slot::Slot::with_player(crate::slot::PlayerRef::new(
                        std::rc::Rc::new(Named(format!("p{i}"))),
                    ))
                } else {
                    crate::slot::Slot::with_bye(true)
                }
            })
            .collect();

        let rounds = create_rounds(&slots, 1);
        let real: Vec<(String, String)> = rounds
            .iter()
            .flat_map(|r| r.matches.iter())
            .filter(|m| !m.has_drawn_bye())
            .map(|m| {
                (
                    m.slot1().player().unwrap().id().to_string(),
                    m.slot2().player().unwrap().id().to_string(),
                )
            })
            .collect();

        assert_eq!(
            real,
            [
                ("p1".to_string(), "p2".to_string()),
                ("p2".to_string(), "p0".to_string()),
                ("p0".to_string(), "p1".to_string()),
            ]
        );
    }

    struct Named(String);

    impl crate::slot::Player for Named {
        fn id(&self) -> &str {
            &self.0
        }
    }
}
