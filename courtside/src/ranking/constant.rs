//! The rankings that are given rather than computed.

use std::rc::Rc;

use crate::ranking::{Ranking, RankingCore};
use crate::slot::{PlayerRef, Slot};

/// The simplest possible ranking: a list of directly player-filled
/// slots in the given order.
pub struct ConstantRanking {
    core: RankingCore,
}

impl ConstantRanking {
    pub fn new(players: &[PlayerRef]) -> ConstantRanking {
        let core = RankingCore::new();
        core.set_ranks(
            players
                .iter()
                .map(|p| Slot::with_player(p.clone()))
                .collect(),
        );
        ConstantRanking { core }
    }
}

impl Ranking for ConstantRanking {
    fn core(&self) -> &RankingCore {
        &self.core
    }

    fn update_ranks(&self) {}
}

/// A fixed ranking over existing slots.
///
/// Unlike [`ConstantRanking`] the slots are shared with whoever
/// created them; group entries and consolation entries use this to
/// rank slots that live elsewhere.
pub struct SlotRanking {
    core: RankingCore,
}

impl SlotRanking {
    pub fn new(slots: Vec<Rc<Slot>>) -> SlotRanking {
        let core = RankingCore::new();
        core.set_ranks(slots);
        SlotRanking { core }
    }
}

impl Ranking for SlotRanking {
    fn core(&self) -> &RankingCore {
        &self.core
    }

    fn update_ranks(&self) {}
}
