//! Double elimination: a winner bracket with an interleaved loser
//! bracket and a grand final.

use std::ops::Deref;
use std::rc::Rc;

use crate::graph::EliminationGraph;
use crate::matches::{Match, MatchList, Round};
use crate::ranking::elimination::EliminationRanking;
use crate::ranking::winner::create_winner_ranking_slots;
use crate::ranking::{Ranking, RankingNode};
use crate::tournament::single_elimination::{
    create_paired_matches, link_matches, EliminationEditingPolicy, EliminationWithdrawalPolicy,
    SingleElimination,
};
use crate::tournament::{TournamentCore, TournamentError};

/// A knockout where every player may lose once: losers drop out of the
/// winner bracket into a loser bracket whose survivor meets the winner
/// bracket champion in the grand final.
///
/// For each winner round past the first, the loser bracket plays a
/// *minor* round among its survivors and then a *major* round that
/// pairs them with the freshly dropped winner-round losers. Every
/// second major round swaps the bracket halves so that rematches from
/// the winner bracket are postponed as far as possible.
pub struct DoubleElimination {
    core: TournamentCore,
    winner_bracket: SingleElimination,
    loser_rounds: Vec<Vec<Rc<Match>>>,
    final_match: Rc<Match>,
}

impl DoubleElimination {
    pub fn new(entries: Rc<RankingNode>) -> Result<DoubleElimination, TournamentError> {
        let tournament = Self::build(entries)?;
        tournament.update(None);
        Ok(tournament)
    }

    pub(crate) fn build(entries: Rc<RankingNode>) -> Result<DoubleElimination, TournamentError> {
        Self::build_on(entries, None)
    }

    pub(crate) fn build_on(
        entries: Rc<RankingNode>,
        ranking_graph: Option<Rc<crate::graph::RankingGraph>>,
    ) -> Result<DoubleElimination, TournamentError> {
        // With fewer than 3 entries there is no loser bracket to feed
        // the grand final.
        if entries.ranks().len() < 3 {
            return Err(TournamentError::TooFewEntries);
        }

        let winner_bracket = SingleElimination::build(entries.clone(), true, ranking_graph, None)?;
        let graph = winner_bracket.ranking_graph().clone();
        let elimination_graph = winner_bracket.elimination_graph().clone();

        let num_winner_rounds = winner_bracket.rounds().len();

        let mut loser_rounds: Vec<Vec<Rc<Match>>> = Vec::with_capacity(2 * (num_winner_rounds - 1));
        for _ in 0..num_winner_rounds - 1 {
            let minor = create_minor_loser_round(&winner_bracket, &loser_rounds);
            loser_rounds.push(minor);
            let major = create_major_loser_round(&winner_bracket, &loser_rounds);
            loser_rounds.push(major);
        }

        let final_match = create_final(&winner_bracket, &loser_rounds);
        let match_list = create_match_list(&winner_bracket, &loser_rounds, &final_match);

        let finals_ranking = winner_bracket
            .winner_ranking(&final_match)
            .expect("the grand final has a winner ranking");
        let final_ranking = EliminationRanking::create(
            match_list.clone(),
            entries.clone(),
            &[finals_ranking],
            &graph,
        );

        let editing_policy = Rc::new(EliminationEditingPolicy::new(
            match_list.clone(),
            elimination_graph.clone(),
        ));
        let withdrawal_policy = Rc::new(EliminationWithdrawalPolicy {
            match_list: match_list.clone(),
            elimination_graph,
        });

        let core = TournamentCore::new(
            entries,
            final_ranking,
            match_list,
            graph,
            editing_policy,
            withdrawal_policy,
        );

        Ok(DoubleElimination {
            core,
            winner_bracket,
            loser_rounds,
            final_match,
        })
    }

    pub fn winner_bracket(&self) -> &SingleElimination {
        &self.winner_bracket
    }

    pub fn elimination_graph(&self) -> &Rc<EliminationGraph> {
        self.winner_bracket.elimination_graph()
    }

    /// The loser-bracket rounds, alternating minor and major.
    pub fn loser_rounds(&self) -> &[Vec<Rc<Match>>] {
        &self.loser_rounds
    }

    pub fn final_match(&self) -> &Rc<Match> {
        &self.final_match
    }
}

impl Deref for DoubleElimination {
    type Target = TournamentCore;

    fn deref(&self) -> &TournamentCore {
        &self.core
    }
}

/// Pairs the survivors of the loser bracket; on the first iteration
/// those are the losers of winner round 0.
fn create_minor_loser_round(
    winner_bracket: &SingleElimination,
    loser_rounds: &[Vec<Rc<Match>>],
) -> Vec<Rc<Match>> {
    let (last_major, target_rank): (&[Rc<Match>], usize) = match loser_rounds.last() {
        None => (&winner_bracket.rounds()[0].matches, 1),
        Some(last) => (last, 0),
    };

    let graph = winner_bracket.ranking_graph();
    let mut winner_rankings = winner_bracket.winner_rankings().borrow_mut();
    let slots = create_winner_ranking_slots(last_major, target_rank, graph, &mut winner_rankings);
    let matches = create_paired_matches(&slots);

    link_matches(last_major, &matches, winner_bracket.elimination_graph());

    matches
}

/// Pairs the losers of the next winner round against the winners of
/// the preceding minor round.
fn create_major_loser_round(
    winner_bracket: &SingleElimination,
    loser_rounds: &[Vec<Rc<Match>>],
) -> Vec<Rc<Match>> {
    let major_index = loser_rounds.len() / 2;
    let mut winner_round: Vec<Rc<Match>> =
        winner_bracket.rounds()[major_index + 1].matches.clone();
    let last_minor = loser_rounds.last().expect("a minor round precedes each major");

    let graph = winner_bracket.ranking_graph();
    let elimination_graph = winner_bracket.elimination_graph().clone();
    let mut winner_rankings = winner_bracket.winner_rankings().borrow_mut();

    let mut loser_slots =
        create_winner_ranking_slots(&winner_round, 1, graph, &mut winner_rankings);
    let minor_slots = create_winner_ranking_slots(last_minor, 0, graph, &mut winner_rankings);

    if major_index % 2 == 0 {
        // Every second major round swaps the bracket halves to
        // postpone winner-bracket rematches.
        swap_halves(&mut loser_slots);
        swap_halves(&mut winner_round);
    }

    let mut matches = Vec::with_capacity(loser_slots.len());
    for (i, loser_slot) in loser_slots.into_iter().enumerate() {
        let m = Match::new(loser_slot, minor_slots[i].clone());

        elimination_graph.add_vertex(&m);
        elimination_graph.add_edge(&winner_round[i], &m);
        elimination_graph.add_edge(&last_minor[i], &m);

        matches.push(m);
    }
    matches
}

/// The grand final between the two bracket champions.
fn create_final(
    winner_bracket: &SingleElimination,
    loser_rounds: &[Vec<Rc<Match>>],
) -> Rc<Match> {
    let upper_final = winner_bracket
        .matches()
        .last()
        .expect("the winner bracket has a final")
        .clone();
    let lower_final = loser_rounds
        .last()
        .expect("the loser bracket has rounds")
        .last()
        .expect("the last loser round has a match")
        .clone();

    let graph = winner_bracket.ranking_graph();
    let elimination_graph = winner_bracket.elimination_graph();
    let mut winner_rankings = winner_bracket.winner_rankings().borrow_mut();

    let finalists = create_winner_ranking_slots(
        &[upper_final.clone(), lower_final.clone()],
        0,
        graph,
        &mut winner_rankings,
    );
    let [slot1, slot2]: [Rc<crate::slot::Slot>; 2] =
        finalists.try_into().expect("two finalists");
    let final_match = Match::new(slot1, slot2);

    create_winner_ranking_slots(
        std::slice::from_ref(&final_match),
        0,
        graph,
        &mut winner_rankings,
    );

    elimination_graph.add_vertex(&final_match);
    elimination_graph.add_edge(&upper_final, &final_match);
    elimination_graph.add_edge(&lower_final, &final_match);

    final_match
}

/// Interleaves each winner round with the concurrent minor loser round
/// into a combined super-round; major loser rounds and the grand final
/// stand alone.
fn create_match_list(
    winner_bracket: &SingleElimination,
    loser_rounds: &[Vec<Rc<Match>>],
    final_match: &Rc<Match>,
) -> Rc<MatchList> {
    let winner_rounds = winner_bracket.rounds();

    let mut rounds = Vec::with_capacity(2 * winner_rounds.len());
    let mut matches = Vec::with_capacity(4 * winner_rounds.len());

    for (i, winner_round) in winner_rounds.iter().enumerate() {
        if i == 0 {
            rounds.push(winner_round.clone());
            matches.extend(winner_round.matches.iter().cloned());
            continue;
        }

        let minor = &loser_rounds[2 * (i - 1)];
        let major = &loser_rounds[2 * (i - 1) + 1];

        let combined = combine_rounds(winner_round, minor);
        matches.extend(combined.matches.iter().cloned());
        rounds.push(combined);

        matches.extend(major.iter().cloned());
        rounds.push(Round::new(major.clone()));
    }

    rounds.push(Round::new(vec![final_match.clone()]));
    matches.push(final_match.clone());

    MatchList::new(matches, rounds)
}

fn combine_rounds(winner_round: &Round, minor_loser_matches: &[Rc<Match>]) -> Round {
    let minor_round = Round::new(minor_loser_matches.to_vec());

    let mut matches = winner_round.matches.clone();
    matches.extend(minor_loser_matches.iter().cloned());

    Round {
        matches,
        nested_rounds: vec![winner_round.clone(), minor_round],
    }
}

fn swap_halves<T>(slice: &mut [T]) {
    let half = slice.len() / 2;
    for i in 0..half {
        slice.swap(i, half + i);
    }
}
