//! The group phase: snake-seeded round-robin groups with a combined
//! final ranking.

use std::ops::Deref;
use std::rc::Rc;

use crate::graph::RankingGraph;
use crate::matches::{Match, MatchList, Round};
use crate::ranking::group_phase::{Group, GroupPhaseRanking};
use crate::ranking::match_metric::MatchMetricRanking;
use crate::ranking::{EvenRanking, Ranking, RankingNode};
use crate::score::Score;
use crate::slot::Slot;
use crate::tournament::round_robin::{
    create_rounds, RoundRobinEditingPolicy, RoundRobinWithdrawalPolicy,
};
use crate::tournament::{TournamentCore, TournamentError};

/// Splits the entries into round-robin groups and ranks everyone by
/// their group placement, with one contested rank compared across
/// groups when the qualification count does not divide evenly.
pub struct GroupPhase {
    core: TournamentCore,
    groups: Vec<Group>,
}

impl GroupPhase {
    pub fn new(
        entries: Rc<RankingNode>,
        num_groups: usize,
        num_qualifications: usize,
        walkover_score: Rc<dyn Score>,
    ) -> Result<GroupPhase, TournamentError> {
        validate_group_settings(&entries, num_groups, num_qualifications)?;
        let graph = RankingGraph::new(&entries);
        let tournament =
            Self::build(entries, num_groups, num_qualifications, walkover_score, graph);
        tournament.update(None);
        Ok(tournament)
    }

    /// Builds the phase on a shared ranking graph without propagating;
    /// settings must have been validated by the caller.
    pub(crate) fn build(
        entries: Rc<RankingNode>,
        num_groups: usize,
        num_qualifications: usize,
        walkover_score: Rc<dyn Score>,
        graph: Rc<RankingGraph>,
    ) -> GroupPhase {
        let quals_per_group = num_qualifications.div_ceil(num_groups);

        let entry_slots = entries.ranks();
        let slot_groups = group_slots(entry_slots, num_groups);

        let groups: Vec<Group> = slot_groups
            .into_iter()
            .map(|slots| {
                let group = create_group(
                    slots,
                    quals_per_group,
                    walkover_score.clone(),
                    &graph,
                );
                graph.add_edge(&entries, &group.entries);
                group
            })
            .collect();

        let match_list = create_match_list(&groups);

        let cross_group_ranking = MatchMetricRanking::create_cross_group(
            &entries,
            match_list.matches.clone(),
            &graph,
            walkover_score.clone(),
            num_qualifications,
            groups.clone(),
        );

        for group in &groups {
            graph.add_edge(&group.ranking, &cross_group_ranking);
        }

        let final_ranking = GroupPhaseRanking::create(
            groups.clone(),
            num_qualifications,
            cross_group_ranking,
            &graph,
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

        GroupPhase { core, groups }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }
}

impl Deref for GroupPhase {
    type Target = TournamentCore;

    fn deref(&self) -> &TournamentCore {
        &self.core
    }
}

pub(crate) fn validate_group_settings(
    entries: &Rc<RankingNode>,
    num_groups: usize,
    num_qualifications: usize,
) -> Result<(), TournamentError> {
    let num_entries = entries.ranks().len();
    if num_entries < 2 {
        return Err(TournamentError::TooFewEntries);
    }
    if num_groups < 1 {
        return Err(TournamentError::TooFewGroups);
    }
    if 2 * num_groups > num_entries {
        return Err(TournamentError::TooManyGroups);
    }
    if num_qualifications < 2 {
        return Err(TournamentError::TooFewQuals);
    }
    Ok(())
}

/// One group: a slot ranking over its entries, a single-pass round
/// robin schedule and metric standings that must be untied down to the
/// group's qualification spots.
fn create_group(
    slots: Vec<Rc<Slot>>,
    quals_per_group: usize,
    walkover_score: Rc<dyn Score>,
    graph: &Rc<RankingGraph>,
) -> Group {
    let entries = RankingNode::from_slots(slots);
    graph.add_vertex(&entries);

    let even_entries = EvenRanking::create(&entries, graph);
    let rounds = create_rounds(&even_entries.ranks(), 1);
    let matches: Vec<Rc<Match>> = rounds
        .iter()
        .flat_map(|r| r.matches.iter().cloned())
        .collect();
    let match_list = MatchList::new(matches, rounds);

    let ranking = MatchMetricRanking::create(
        &even_entries,
        match_list.matches.clone(),
        graph,
        walkover_score,
        quals_per_group,
    );

    Group {
        entries,
        match_list,
        ranking,
    }
}

/// Distributes the slots over the groups in a snaking order, going
/// back and forth for seeding purposes. When the slots do not divide
/// evenly, the higher-index groups take the remainder, so group 0 is
/// always the smallest.
fn group_slots(slots: Vec<Rc<Slot>>, num_groups: usize) -> Vec<Vec<Rc<Slot>>> {
    let mut groups: Vec<Vec<Rc<Slot>>> = vec![Vec::new(); num_groups];
    let mut remaining = slots.as_slice();

    while !remaining.is_empty() {
        let snake_forward = groups[0].len() % 2 == 0;
        let row_size = remaining.len().min(num_groups);
        let (row, rest) = remaining.split_at(row_size);
        remaining = rest;

        for (i, slot) in directional(row, snake_forward).enumerate() {
            // The higher-index groups take the short row.
            let group = i + (num_groups - row_size);
            groups[group].push(slot.clone());
        }
    }

    groups
}

fn directional<'a, T>(row: &'a [T], forward: bool) -> Box<dyn Iterator<Item = &'a T> + 'a> {
    if forward {
        Box::new(row.iter())
    } else {
        Box::new(row.iter().rev())
    }
}

/// Interleaves one round from each group at a time, so the groups play
/// in parallel. The per-group rounds stay visible as nested rounds.
fn create_match_list(groups: &[Group]) -> Rc<MatchList> {
    let max_num_rounds = groups
        .iter()
        .map(|g| g.match_list.rounds.len())
        .max()
        .unwrap_or(0);

    let mut rounds = Vec::with_capacity(max_num_rounds);
    let mut matches = Vec::new();
    for i in 0..max_num_rounds {
        let group_rounds: Vec<Round> = groups
            .iter()
            .filter_map(|g| g.match_list.rounds.get(i).cloned())
            .collect();
        let round_matches = intertwine_rounds(&group_rounds);
        matches.extend(round_matches.iter().cloned());
        rounds.push(Round {
            matches: round_matches,
            nested_rounds: group_rounds,
        });
    }

    MatchList::new(matches, rounds)
}

fn intertwine_rounds(rounds: &[Round]) -> Vec<Rc<Match>> {
    let max_matches = rounds.iter().map(|r| r.matches.len()).max().unwrap_or(0);
    let mut matches = Vec::with_capacity(rounds.len() * max_matches);
    for i in 0..max_matches {
        for round in rounds {
            if let Some(m) = round.matches.get(i) {
                matches.push(m.clone());
            }
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{Player, PlayerRef};

    struct Named(String);

    impl Player for Named {
        fn id(&self) -> &str {
            &self.0
        }
    }

    fn slots(n: usize) -> Vec<Rc<Slot>> {
        (0..n)
            .map(|i| Slot::with_player(PlayerRef::new(Rc::new(Named(format!("p{i}"))))))
            .collect()
    }

    fn ids(group: &[Rc<Slot>]) -> Vec<String> {
        group
            .iter()
            .map(|s| s.player().unwrap().id().to_string())
            .collect()
    }

    #[test]
    fn test_snake_seeding_even() {
        let groups = group_slots(slots(12), 4);
        assert_eq!(ids(&groups[0]), ["p0", "p7", "p8"]);
        assert_eq!(ids(&groups[1]), ["p1", "p6", "p9"]);
        assert_eq!(ids(&groups[2]), ["p2", "p5", "p10"]);
        assert_eq!(ids(&groups[3]), ["p3", "p4", "p11"]);
    }

    #[test]
    fn test_snake_seeding_remainder_goes_to_high_groups() {
        let groups = group_slots(slots(6), 4);
        assert_eq!(groups[0].len(), 1);
        assert_eq!(groups[1].len(), 1);
        assert_eq!(groups[2].len(), 2);
        assert_eq!(groups[3].len(), 2);
        // The short row is handed out in reverse order.
        assert_eq!(ids(&groups[2])[1], "p5");
        assert_eq!(ids(&groups[3])[1], "p4");
    }
}
