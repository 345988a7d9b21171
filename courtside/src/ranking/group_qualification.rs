//! Seeds the group-phase qualifiers into a knockout.

use std::rc::Rc;

use log::debug;

use crate::graph::RankingGraph;
use crate::placement::Placement;
use crate::ranking::group_phase::GroupPhaseRanking;
use crate::ranking::{Ranking, RankingCore, RankingNode};
use crate::seeding::{arrange_seeds, num_rounds_for, prev_power_of_two};
use crate::slot::Slot;

/// One qualification spot, standing in for a slot of the group-phase
/// final ranking while the knockout seeding is worked out.
#[derive(Clone, Copy, Debug)]
struct GroupQualification {
    group: usize,
    place: usize,
}

/// A first-round matchup of the knockout: a directly qualified entrant
/// (`low == None`, the pre-round bye case) or a pre-round pairing.
struct Matchup {
    high: usize,
    low: Option<usize>,
}

impl Matchup {
    fn members<'a>(&'a self) -> impl Iterator<Item = usize> + 'a {
        [Some(self.high), self.low].into_iter().flatten()
    }
}

/// Provides one blocking placement slot per qualification.
///
/// While any per-group or cross-group tie is outstanding every slot
/// resolves to `None`, so the knockout sees all entrants as
/// undetermined. Once the group phase is tie-free the placements are
/// unblocked and pointed at the group-phase ranks in a seeding that
/// avoids same-group first-round matchups where possible.
pub struct GroupQualificationRanking {
    core: RankingCore,
    source: Rc<RankingNode>,
    placements: Vec<Rc<Placement>>,
}

impl GroupQualificationRanking {
    pub(crate) fn create(source: &Rc<RankingNode>, graph: &RankingGraph) -> Rc<RankingNode> {
        let num_qualifications = source
            .tie_core()
            .expect("the group phase ranking is tieable")
            .required_untied_ranks();

        let placements: Vec<Rc<Placement>> = (0..num_qualifications)
            .map(|_| Placement::new_blocking(source.clone(), 0, true))
            .collect();
        let slots: Vec<Rc<Slot>> = placements
            .iter()
            .map(|p| Slot::with_placement(p.clone()))
            .collect();

        let core = RankingCore::new();
        core.set_ranks(slots.clone());

        let ranking = Rc::new(RankingNode::from(GroupQualificationRanking {
            core,
            source: source.clone(),
            placements,
        }));
        // The slots read through their placements into the source, so
        // they must refresh after either ranking recomputes.
        for slot in &slots {
            ranking.add_dependent_slot(slot);
        }
        ranking.update_ranks();

        graph.add_vertex(&ranking);
        graph.add_edge(source, &ranking);

        ranking
    }

    fn group_phase(&self) -> &GroupPhaseRanking {
        self.source
            .as_group_phase()
            .expect("qualification source is the group phase ranking")
    }

    /// The placeholder qualifications in the order of the source
    /// ranking's places: all first places group by group, then all
    /// second places, and finally the contested places in their
    /// cross-group order.
    fn create_group_qualifications(&self) -> Vec<GroupQualification> {
        let group_phase = self.group_phase();
        let num_qualifications = self.placements.len();
        let num_groups = group_phase.groups().len();
        let num_uncontested = num_qualifications / num_groups;

        let mut qualifications = Vec::with_capacity(num_qualifications);
        for place in 0..num_uncontested {
            for group in 0..num_groups {
                qualifications.push(GroupQualification { group, place });
            }
        }

        let num_contested = num_qualifications % num_groups;
        let source_ranks = self.source.ranks();
        for i in 0..num_contested {
            let slot = source_ranks.get(qualifications.len() + i);
            let group = slot
                .and_then(|s| s.player())
                .and_then(|p| {
                    group_phase.groups().iter().position(|g| {
                        g.entries
                            .ranks()
                            .iter()
                            .any(|s| s.player().as_ref() == Some(&p))
                    })
                })
                .unwrap_or(i);
            qualifications.push(GroupQualification {
                group,
                place: num_uncontested,
            });
        }

        qualifications
    }

    /// Computes, for every qualification slot, the place of the source
    /// ranking it reads from, so that the knockout's seeded first
    /// round comes out as the intended matchups.
    fn arrange_knockout_places(&self) -> Vec<usize> {
        let qualifications = self.create_group_qualifications();
        let n = qualifications.len();
        if n < 2 {
            return (0..n).collect();
        }

        let first_round = prev_power_of_two(n);
        let pre = n - first_round;

        if pre == 0 {
            pair_directly(&qualifications)
        } else {
            arrange_with_pre_round(&qualifications, first_round)
        }
    }
}

impl Ranking for GroupQualificationRanking {
    fn core(&self) -> &RankingCore {
        &self.core
    }

    fn update_ranks(&self) {
        let complete = self.group_phase().qualification_complete();
        let places = self.arrange_knockout_places();
        debug_assert_eq!(places.len(), self.placements.len());

        if complete {
            debug!("group phase resolved, unblocking {} qualifications", places.len());
        }

        for (placement, place) in self.placements.iter().zip(places) {
            placement.set_blocking(!complete);
            placement.set_place(place);
        }
    }
}

/// The qualification count is a power of two: no pre-round. The upper
/// half of the qualifications keeps its order and each gets a
/// lower-half opponent from a different group where possible.
fn pair_directly(qualifications: &[GroupQualification]) -> Vec<usize> {
    let n = qualifications.len();
    let half = n / 2;

    let mut used = vec![false; half];
    let mut places = vec![0usize; n];

    for upper in 0..half {
        let group = qualifications[upper].group;
        let pick = (0..half)
            .find(|&l| !used[l] && qualifications[half + l].group != group)
            .or_else(|| (0..half).find(|&l| !used[l]))
            .expect("there is one lower-half opponent per upper-half qualification");
        used[pick] = true;

        places[upper] = upper;
        places[n - 1 - upper] = half + pick;
    }

    places
}

/// The general case: `pre` pre-round matchups feed a first round of
/// `first_round` matchups, the rest enter it on a pre-round bye.
fn arrange_with_pre_round(
    qualifications: &[GroupQualification],
    first_round: usize,
) -> Vec<usize> {
    let n = qualifications.len();
    let pre = n - first_round;
    let byes = n - 2 * pre;
    let padded = 2 * first_round;

    // Pre-round pairing: repeatedly the highest remaining
    // qualification against the lowest remaining one of a different
    // group, falling back to any group.
    let mut pool: Vec<usize> = (byes..n).collect();
    let mut matchups: Vec<Matchup> = (0..byes).map(|i| Matchup { high: i, low: None }).collect();
    while !pool.is_empty() {
        let high = pool.remove(0);
        let pick = pool
            .iter()
            .rposition(|&q| qualifications[q].group != qualifications[high].group)
            .unwrap_or(pool.len() - 1);
        let low = pool.remove(pick);
        matchups.push(Matchup {
            high,
            low: Some(low),
        });
    }

    // First-round matchups by the place of their best entrant; the
    // stable sort keeps the bye entrants in front of pre-round pairs
    // of the same place.
    matchups.sort_by_key(|m| qualifications[m.high].place);

    // The padded bracket's seed arrangement pairs bracket positions
    // (2j, 2j+1) into the next round's matches. The upper half of the
    // matchups takes the better seed rank of each pair in ascending
    // order; a lower-half matchup is assigned to an upper matchup
    // whose groups it does not overlap where possible.
    let seed_matchups = arrange_seeds(num_rounds_for(padded));
    let half = first_round / 2;
    let (upper, lower) = matchups.split_at(half);

    let mut pair_seed_ranks: Vec<(usize, usize)> = (0..half)
        .map(|j| {
            let a = seed_matchups[2 * j].0;
            let b = seed_matchups[2 * j + 1].0;
            (a.min(b), a.max(b))
        })
        .collect();
    pair_seed_ranks.sort_by_key(|&(upper_rank, _)| upper_rank);

    let overlaps = |a: &Matchup, b: &Matchup| {
        a.members()
            .any(|qa| b.members().any(|qb| qualifications[qa].group == qualifications[qb].group))
    };

    let mut places = vec![0usize; n];
    let mut assign = |m: &Matchup, seed_rank: usize, places: &mut Vec<usize>| {
        places[seed_rank] = m.high;
        if let Some(low) = m.low {
            places[padded - 1 - seed_rank] = low;
        }
    };

    let mut used = vec![false; lower.len()];
    for (i, &(upper_rank, lower_rank)) in pair_seed_ranks.iter().enumerate() {
        let upper_matchup = &upper[i];

        // A bye matchup's opponent position must fall into the drawn
        // bye padding of the bracket.
        let feasible =
            |m: &Matchup| m.low.is_some() || lower_rank < byes;
        let pick = (0..lower.len())
            .find(|&l| !used[l] && feasible(&lower[l]) && !overlaps(&lower[l], upper_matchup))
            .or_else(|| (0..lower.len()).find(|&l| !used[l] && feasible(&lower[l])))
            .or_else(|| (0..lower.len()).find(|&l| !used[l]))
            .expect("there is one lower-half matchup per pair");
        used[pick] = true;

        assign(upper_matchup, upper_rank, &mut places);
        assign(&lower[pick], lower_rank, &mut places);
    }

    places
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quals(pairs: &[(usize, usize)]) -> Vec<GroupQualification> {
        pairs
            .iter()
            .map(|&(group, place)| GroupQualification { group, place })
            .collect()
    }

    #[test]
    fn test_pair_directly_avoids_same_group() {
        // Two qualifications out of each of four groups.
        let qualifications = quals(&[
            (0, 0), (1, 0), (2, 0), (3, 0),
            (0, 1), (1, 1), (2, 1), (3, 1),
        ]);
        let places = pair_directly(&qualifications);
        assert_eq!(places, vec![0, 1, 2, 3, 6, 7, 4, 5]);

        // First-round pairs are (i, n-1-i); none repeats a group.
        for i in 0..4 {
            let a = qualifications[places[i]];
            let b = qualifications[places[7 - i]];
            assert_ne!(a.group, b.group);
        }
    }

    #[test]
    fn test_pre_round_pairing_prefers_other_groups() {
        // Six qualifications out of three groups: two pre-round
        // matchups behind two byes.
        let qualifications = quals(&[
            (0, 0), (1, 0), (2, 0),
            (0, 1), (1, 1), (2, 1),
        ]);
        let places = arrange_with_pre_round(&qualifications, 4);
        assert_eq!(places, vec![0, 1, 3, 2, 4, 5]);
    }

    #[test]
    fn test_pre_round_respects_bye_padding() {
        // Five qualifications: three byes, one pre-round matchup. The
        // bye singleton must not land where its opponent position
        // would be a real entrant.
        let qualifications = quals(&[
            (0, 0), (1, 0), (2, 0),
            (2, 1), (1, 1),
        ]);
        let places = arrange_with_pre_round(&qualifications, 4);
        assert_eq!(places, vec![0, 1, 2, 3, 4]);
    }
}
