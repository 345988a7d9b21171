//! Padding adapter for elimination brackets.

use std::rc::Rc;

use crate::graph::RankingGraph;
use crate::ranking::{Ranking, RankingCore, RankingNode};
use crate::seeding::next_power_of_two;
use crate::slot::Slot;

/// Wraps another ranking and pads it with drawn-bye slots up to the
/// next power of two, facilitating a balanced elimination tree.
pub struct BalancedRanking {
    core: RankingCore,
    #[allow(dead_code)]
    source: Rc<RankingNode>,
}

impl BalancedRanking {
    /// The padding is computed once; entry lists do not change over a
    /// tournament's lifetime and the padded slots are shared with the
    /// matches built over them.
    pub fn create(source: &Rc<RankingNode>, graph: &RankingGraph) -> Rc<RankingNode> {
        let mut slots = source.ranks();
        let padded = next_power_of_two(slots.len());
        while slots.len() < padded {
            slots.push(Slot::with_bye(true));
        }

        let core = RankingCore::new();
        core.set_ranks(slots);
        let ranking = Rc::new(RankingNode::from(BalancedRanking {
            core,
            source: source.clone(),
        }));

        graph.add_vertex(&ranking);
        graph.add_edge(source, &ranking);

        ranking
    }
}

impl Ranking for BalancedRanking {
    fn core(&self) -> &RankingCore {
        &self.core
    }

    fn update_ranks(&self) {}
}
