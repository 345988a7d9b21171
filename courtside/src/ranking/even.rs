//! Padding adapter for round robins.

use std::rc::Rc;

use crate::graph::RankingGraph;
use crate::ranking::{Ranking, RankingCore, RankingNode};
use crate::slot::Slot;

/// Wraps another ranking and appends one drawn-bye slot when the
/// source has an uneven number of slots, guaranteeing an even count.
pub struct EvenRanking {
    core: RankingCore,
    #[allow(dead_code)]
    source: Rc<RankingNode>,
}

impl EvenRanking {
    /// The padding is computed once; entry lists do not change over a
    /// tournament's lifetime and the padded slots are shared with the
    /// matches built over them.
    pub fn create(source: &Rc<RankingNode>, graph: &RankingGraph) -> Rc<RankingNode> {
        let mut slots = source.ranks();
        if slots.len() % 2 != 0 {
            slots.push(Slot::with_bye(true));
        }

        let core = RankingCore::new();
        core.set_ranks(slots);
        let ranking = Rc::new(RankingNode::from(EvenRanking {
            core,
            source: source.clone(),
        }));

        graph.add_vertex(&ranking);
        graph.add_edge(source, &ranking);

        ranking
    }
}

impl Ranking for EvenRanking {
    fn core(&self) -> &RankingCore {
        &self.core
    }

    fn update_ranks(&self) {}
}
