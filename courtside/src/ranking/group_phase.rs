//! The composite final ranking of a group phase.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::graph::RankingGraph;
use crate::matches::MatchList;
use crate::ranking::match_metric::MatchMetricRanking;
use crate::ranking::{Ranking, RankingCore, RankingNode, TieableCore};
use crate::slot::Slot;

/// One group of a group phase: its entries, its round-robin matches
/// and its metric standings.
#[derive(Clone)]
pub struct Group {
    pub entries: Rc<RankingNode>,
    pub match_list: Rc<MatchList>,
    pub ranking: Rc<RankingNode>,
}

/// Orders the group phase's players by rank index across groups:
/// all group winners first, then all runners-up, and so on.
///
/// When the qualification count is not divisible by the group count,
/// one rank is contested across groups and delegated to the
/// cross-group ranking. Local group ties and cross-group ties both
/// block the qualification from completing.
pub struct GroupPhaseRanking {
    tie: TieableCore,
    groups: Vec<Group>,
    cross_group: Rc<RankingNode>,
    group_ties: RefCell<BTreeMap<usize, Vec<Vec<Rc<Slot>>>>>,
    qualification_complete: Cell<bool>,
}

impl GroupPhaseRanking {
    pub(crate) fn create(
        groups: Vec<Group>,
        num_qualifications: usize,
        cross_group: Rc<RankingNode>,
        graph: &RankingGraph,
    ) -> Rc<RankingNode> {
        let ranking = Rc::new(RankingNode::from(GroupPhaseRanking {
            tie: TieableCore::new(num_qualifications),
            groups,
            cross_group: cross_group.clone(),
            group_ties: RefCell::new(BTreeMap::new()),
            qualification_complete: Cell::new(false),
        }));

        graph.add_vertex(&cross_group);
        graph.add_vertex(&ranking);
        graph.add_edge(&cross_group, &ranking);

        ranking
    }

    pub fn tie_core(&self) -> &TieableCore {
        &self.tie
    }

    pub(crate) fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn cross_group_ranking(&self) -> &Rc<RankingNode> {
        &self.cross_group
    }

    /// True once all group matches are complete and no blocking tie is
    /// left, locally in a group or across groups.
    pub fn qualification_complete(&self) -> bool {
        self.qualification_complete.get()
    }

    /// The blocking ties within single groups, keyed by group index.
    pub fn group_ties(&self) -> BTreeMap<usize, Vec<Vec<Rc<Slot>>>> {
        self.group_ties.borrow().clone()
    }

    /// The ties between the occupants of one rank across different
    /// groups that contest a qualification. Empty while any group
    /// still has local blocking ties.
    pub fn cross_group_ties(&self) -> Vec<Vec<Rc<Slot>>> {
        self.tie.blocking_ties(self.tie.required_untied_ranks())
    }

    /// The same ties as [`Self::cross_group_ties`] without tie
    /// breakers applied.
    pub fn unbroken_cross_group_ties(&self) -> Vec<Vec<Rc<Slot>>> {
        self.tie
            .blocking_unbroken_ties(self.tie.required_untied_ranks())
    }

    /// When the qualification count is not divisible by the group
    /// count, returns the contested rank index and how many
    /// qualifications it spans.
    pub fn contested_rank(&self) -> Option<(usize, usize)> {
        let num_qualifications = self.tie.required_untied_ranks();
        let num_contested = num_qualifications % self.groups.len();
        if num_contested == 0 {
            return None;
        }
        Some((num_qualifications / self.groups.len(), num_contested))
    }

    fn collect_group_ties(&self, group_rankings: &[&MatchMetricRanking]) {
        let mut ties = BTreeMap::new();
        for (i, ranking) in group_rankings.iter().enumerate() {
            let blocking = ranking
                .tie_core()
                .blocking_ties(ranking.tie_core().required_untied_ranks());
            if !blocking.is_empty() {
                ties.insert(i, blocking);
            }
        }
        *self.group_ties.borrow_mut() = ties;
    }
}

impl Ranking for GroupPhaseRanking {
    fn core(&self) -> &RankingCore {
        self.tie.core()
    }

    fn update_ranks(&self) {
        let group_rankings: Vec<&MatchMetricRanking> = self
            .groups
            .iter()
            .map(|g| {
                g.ranking
                    .as_match_metric()
                    .expect("group rankings are metric rankings")
            })
            .collect();

        self.collect_group_ties(&group_rankings);
        let ties_present = !self.group_ties.borrow().is_empty();

        let contested = self.contested_rank();

        // Group 0 is the smallest; the last group has the most ranks.
        let max_num_ranks = self
            .groups
            .last()
            .map(|g| g.entries.ranks().len())
            .unwrap_or(0);

        let mut ranks = Vec::with_capacity(max_num_ranks * self.groups.len());
        for i in 0..max_num_ranks {
            match contested {
                Some((rank, num_contested)) if rank == i && !ties_present => {
                    ranks.extend(collect_contested_rank(
                        i,
                        num_contested,
                        &group_rankings,
                        &self.cross_group,
                    ));
                }
                _ => ranks.extend(collect_rank(i, &group_rankings)),
            }
        }

        self.tie.process_update(ranks);

        let matches_complete = self.groups.iter().all(|g| g.match_list.matches_complete());
        let cross_ties_present = !self
            .tie
            .blocking_ties(self.tie.required_untied_ranks())
            .is_empty();
        self.qualification_complete
            .set(matches_complete && !ties_present && !cross_ties_present);
    }
}

/// One rank position collected group by group. Withdrawn players are
/// masked with a bye so they do not qualify onwards.
fn collect_rank(rank: usize, group_rankings: &[&MatchMetricRanking]) -> Vec<Vec<Rc<Slot>>> {
    let mut ranks = Vec::with_capacity(group_rankings.len());
    for ranking in group_rankings {
        let Some(slot) = ranking.at(rank) else {
            continue;
        };
        let slot = mask_withdrawn(slot, ranking);
        ranks.push(vec![slot]);
    }
    ranks
}

/// The contested rank position, ordered by the cross-group ranking.
///
/// A tie that fits into the remaining contested qualifications is
/// emitted as singletons (everyone in it qualifies either way); a
/// larger tie stays a tied group and blocks.
fn collect_contested_rank(
    rank: usize,
    num_contested: usize,
    group_rankings: &[&MatchMetricRanking],
    cross_group: &Rc<RankingNode>,
) -> Vec<Vec<Rc<Slot>>> {
    let cross_ranks = cross_group
        .tie_core()
        .expect("the cross-group ranking is tieable")
        .tied_ranks();

    let mut contestants: BTreeMap<usize, Vec<Rc<Slot>>> = BTreeMap::new();

    for ranking in group_rankings {
        let Some(slot) = ranking.at(rank) else {
            continue;
        };
        let player = slot.player();
        let cross_rank = cross_ranks
            .iter()
            .position(|tie| {
                tie.iter()
                    .any(|s| s.player().as_ref() == player.as_ref() && player.is_some())
            })
            .unwrap_or_else(|| panic!("slot was not found in the cross-group ranking"));

        let slot = mask_withdrawn(slot, ranking);
        contestants.entry(cross_rank).or_default().push(slot);
    }

    let mut ranks = Vec::with_capacity(contestants.len());
    let mut remaining = num_contested as isize;
    for (_, tie) in contestants {
        let size = tie.len() as isize;
        if size <= remaining {
            for slot in tie {
                ranks.push(vec![slot]);
            }
        } else {
            ranks.push(tie);
        }
        remaining -= size;
    }
    ranks
}

fn mask_withdrawn(slot: Rc<Slot>, ranking: &MatchMetricRanking) -> Rc<Slot> {
    match slot.player() {
        Some(player) if ranking.is_withdrawn(&player) => Slot::with_bye(false),
        _ => slot,
    }
}
