//! Group phase feeding a knockout through blocking qualification
//! placements.

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use crate::graph::RankingGraph;
use crate::matches::{Match, MatchList};
use crate::ranking::group_phase::Group;
use crate::ranking::group_qualification::GroupQualificationRanking;
use crate::ranking::{
    remove_double_ranks, Ranking, RankingCore, RankingNode, TieableCore,
};
use crate::score::Score;
use crate::slot::{PlayerRef, Slot};
use crate::tournament::group_phase::{validate_group_settings, GroupPhase};
use crate::tournament::{
    DoubleElimination, EditingPolicy, SingleElimination, SingleEliminationWithConsolation,
    TournamentCore, TournamentError, WithdrawalPolicy,
};

/// Which knockout follows the group phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KnockoutMode {
    SingleElimination,
    DoubleElimination,
    SingleEliminationWithConsolation {
        num_consolation_rounds: usize,
        places_to_play_out: usize,
    },
}

/// The knockout stage of a [`GroupKnockout`].
pub enum KnockoutPhase {
    SingleElimination(SingleElimination),
    DoubleElimination(DoubleElimination),
    Consolation(SingleEliminationWithConsolation),
}

impl KnockoutPhase {
    pub fn core(&self) -> &TournamentCore {
        match self {
            KnockoutPhase::SingleElimination(t) => t,
            KnockoutPhase::DoubleElimination(t) => t,
            KnockoutPhase::Consolation(t) => t,
        }
    }

    pub fn started(&self) -> bool {
        self.core().match_list().matches_started()
    }
}

/// Group phase first, knockout after: the group standings qualify a
/// fixed number of players into a seeded knockout whose slots stay
/// empty until every blocking tie in the groups is resolved.
pub struct GroupKnockout {
    core: TournamentCore,
    group_phase: GroupPhase,
    knockout: KnockoutPhase,
}

impl GroupKnockout {
    pub fn new(
        entries: Rc<RankingNode>,
        knockout_mode: KnockoutMode,
        num_groups: usize,
        num_qualifications: usize,
        walkover_score: Rc<dyn Score>,
    ) -> Result<GroupKnockout, TournamentError> {
        validate_group_settings(&entries, num_groups, num_qualifications)?;

        let graph = RankingGraph::new(&entries);
        let group_phase = GroupPhase::build(
            entries.clone(),
            num_groups,
            num_qualifications,
            walkover_score,
            graph.clone(),
        );

        let qualification_ranking =
            GroupQualificationRanking::create(group_phase.final_ranking(), &graph);

        let knockout = match knockout_mode {
            KnockoutMode::SingleElimination => KnockoutPhase::SingleElimination(
                SingleElimination::build(qualification_ranking, true, Some(graph.clone()), None)?,
            ),
            KnockoutMode::DoubleElimination => KnockoutPhase::DoubleElimination(
                DoubleElimination::build_on(qualification_ranking, Some(graph.clone()))?,
            ),
            KnockoutMode::SingleEliminationWithConsolation {
                num_consolation_rounds,
                places_to_play_out,
            } => KnockoutPhase::Consolation(SingleEliminationWithConsolation::build(
                qualification_ranking,
                num_consolation_rounds,
                places_to_play_out,
                Some(graph.clone()),
            )?),
        };

        let group_list = group_phase.match_list();
        let knockout_list = knockout.core().match_list();
        let matches: Vec<Rc<Match>> = group_list
            .matches
            .iter()
            .chain(&knockout_list.matches)
            .cloned()
            .collect();
        let rounds = group_list
            .rounds
            .iter()
            .chain(&knockout_list.rounds)
            .cloned()
            .collect();
        let match_list = MatchList::new(matches, rounds);

        let final_ranking = GroupKnockoutRanking::create(
            group_phase.groups().to_vec(),
            knockout.core().final_ranking().clone(),
            &graph,
        );

        let editing_policy = Rc::new(GroupKnockoutEditingPolicy {
            editable_matches: RefCell::new(Vec::new()),
            group_phase_policy: group_phase.editing_policy().clone(),
            knockout_policy: knockout.core().editing_policy().clone(),
            knockout_list: knockout_list.clone(),
        });
        let withdrawal_policy = Rc::new(GroupKnockoutWithdrawalPolicy {
            group_phase_policy: group_phase.withdrawal_policy().clone(),
            knockout_policy: knockout.core().withdrawal_policy().clone(),
            knockout_list: knockout_list.clone(),
        });

        let core = TournamentCore::new(
            entries,
            final_ranking,
            match_list,
            graph,
            editing_policy,
            withdrawal_policy,
        );

        let tournament = GroupKnockout {
            core,
            group_phase,
            knockout,
        };
        tournament.update(None);
        Ok(tournament)
    }

    pub fn group_phase(&self) -> &GroupPhase {
        &self.group_phase
    }

    pub fn knockout(&self) -> &KnockoutPhase {
        &self.knockout
    }
}

impl Deref for GroupKnockout {
    type Target = TournamentCore;

    fn deref(&self) -> &TournamentCore {
        &self.core
    }
}

/// Knockout results first, then the group standings rank by rank
/// across groups for everyone who did not qualify. Placeholder slots
/// without an occupant are dropped.
pub struct GroupKnockoutRanking {
    tie: TieableCore,
    groups: Vec<Group>,
    knockout_final: Rc<RankingNode>,
}

impl GroupKnockoutRanking {
    pub(crate) fn create(
        groups: Vec<Group>,
        knockout_final: Rc<RankingNode>,
        graph: &RankingGraph,
    ) -> Rc<RankingNode> {
        let ranking = Rc::new(RankingNode::from(GroupKnockoutRanking {
            tie: TieableCore::new(0),
            groups,
            knockout_final: knockout_final.clone(),
        }));
        ranking.update_ranks();

        graph.add_vertex(&ranking);
        graph.add_edge(&knockout_final, &ranking);

        ranking
    }

    pub fn tie_core(&self) -> &TieableCore {
        &self.tie
    }
}

impl Ranking for GroupKnockoutRanking {
    fn core(&self) -> &RankingCore {
        self.tie.core()
    }

    fn update_ranks(&self) {
        let group_ranks: Vec<Vec<Vec<Rc<Slot>>>> = self
            .groups
            .iter()
            .map(|g| {
                g.ranking
                    .tie_core()
                    .expect("group rankings are tieable")
                    .tied_ranks()
            })
            .collect();

        let mut ranks: Vec<Vec<Rc<Slot>>> = self
            .knockout_final
            .tie_core()
            .expect("the knockout final ranking is tieable")
            .tied_ranks();

        // Merge the same rank index of every group into one tied rank.
        let max_ranks = group_ranks.iter().map(Vec::len).max().unwrap_or(0);
        for i in 0..max_ranks {
            let merged: Vec<Rc<Slot>> = group_ranks
                .iter()
                .filter_map(|ranks| ranks.get(i))
                .flatten()
                .cloned()
                .collect();
            if !merged.is_empty() {
                ranks.push(merged);
            }
        }

        let ranks = remove_double_ranks(
            ranks
                .into_iter()
                .map(|rank| {
                    rank.into_iter()
                        .filter(|s| s.player().is_some())
                        .collect::<Vec<Rc<Slot>>>()
                })
                .collect(),
        );

        self.tie.process_update(ranks);
    }
}

/// Group-phase policy while the knockout is untouched, knockout policy
/// afterwards.
struct GroupKnockoutEditingPolicy {
    editable_matches: RefCell<Vec<Rc<Match>>>,
    group_phase_policy: Rc<dyn EditingPolicy>,
    knockout_policy: Rc<dyn EditingPolicy>,
    knockout_list: Rc<MatchList>,
}

impl EditingPolicy for GroupKnockoutEditingPolicy {
    fn editable_matches(&self) -> Vec<Rc<Match>> {
        self.editable_matches.borrow().clone()
    }

    fn update_editable_matches(&self) {
        let policy = if self.knockout_list.matches_started() {
            &self.knockout_policy
        } else {
            &self.group_phase_policy
        };
        policy.update_editable_matches();
        *self.editable_matches.borrow_mut() = policy.editable_matches();
    }
}

struct GroupKnockoutWithdrawalPolicy {
    group_phase_policy: Rc<dyn WithdrawalPolicy>,
    knockout_policy: Rc<dyn WithdrawalPolicy>,
    knockout_list: Rc<MatchList>,
}

impl GroupKnockoutWithdrawalPolicy {
    fn active(&self) -> &Rc<dyn WithdrawalPolicy> {
        if self.knockout_list.matches_started() {
            &self.knockout_policy
        } else {
            &self.group_phase_policy
        }
    }
}

impl WithdrawalPolicy for GroupKnockoutWithdrawalPolicy {
    fn list_withdraw_matches(&self, player: &PlayerRef) -> Vec<Rc<Match>> {
        self.active().list_withdraw_matches(player)
    }

    fn list_reenter_matches(&self, player: &PlayerRef) -> Vec<Rc<Match>> {
        self.active().list_reenter_matches(player)
    }
}
