//! Single elimination with consolation brackets.

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use crate::graph::{EliminationGraph, RankingGraph};
use crate::matches::{MatchList, Round};
use crate::placement::Placement;
use crate::ranking::elimination::EliminationRanking;
use crate::ranking::RankingNode;
use crate::slot::Slot;
use crate::tournament::single_elimination::{
    link_matches, EliminationEditingPolicy, EliminationWithdrawalPolicy, SingleElimination,
};
use crate::tournament::{TournamentCore, TournamentError};

/// One bracket of a consolation tournament: an elimination plus the
/// consolation brackets hanging off its rounds.
pub struct ConsolationBracket {
    elimination: SingleElimination,
    consolations: RefCell<Vec<Rc<ConsolationBracket>>>,
}

impl ConsolationBracket {
    fn new(elimination: SingleElimination) -> Rc<ConsolationBracket> {
        Rc::new(ConsolationBracket {
            elimination,
            consolations: RefCell::new(Vec::new()),
        })
    }

    /// The consolation brackets of this bracket, earliest-round one
    /// first.
    pub fn consolations(&self) -> Vec<Rc<ConsolationBracket>> {
        self.consolations.borrow().clone()
    }
}

impl Deref for ConsolationBracket {
    type Target = SingleElimination;

    fn deref(&self) -> &SingleElimination {
        &self.elimination
    }
}

/// A single elimination where losers drop into secondary brackets that
/// play out the places below the podium.
///
/// Brackets are created recursively: each round's losers can seed a
/// new (unseeded) elimination, down to the configured consolation
/// depth, and `places_to_play_out` forces enough brackets to decide
/// that many final placements.
pub struct SingleEliminationWithConsolation {
    core: TournamentCore,
    main_bracket: Rc<ConsolationBracket>,
    brackets: Vec<Rc<ConsolationBracket>>,
    elimination_graph: Rc<EliminationGraph>,
}

impl SingleEliminationWithConsolation {
    pub fn new(
        entries: Rc<RankingNode>,
        num_consolation_rounds: usize,
        places_to_play_out: usize,
    ) -> Result<SingleEliminationWithConsolation, TournamentError> {
        let tournament =
            Self::build(entries, num_consolation_rounds, places_to_play_out, None)?;
        tournament.update(None);
        Ok(tournament)
    }

    pub(crate) fn build(
        entries: Rc<RankingNode>,
        num_consolation_rounds: usize,
        places_to_play_out: usize,
        ranking_graph: Option<Rc<RankingGraph>>,
    ) -> Result<SingleEliminationWithConsolation, TournamentError> {
        let main_elimination = SingleElimination::build(entries.clone(), true, ranking_graph, None)?;
        let graph = main_elimination.ranking_graph().clone();
        let elimination_graph = main_elimination.elimination_graph().clone();

        let main_bracket = ConsolationBracket::new(main_elimination);

        let mut brackets: Vec<Rc<ConsolationBracket>> = Vec::new();
        create_consolation_brackets(
            &main_bracket,
            0,
            num_consolation_rounds,
            places_to_play_out,
            &graph,
            &elimination_graph,
            &mut brackets,
        );

        brackets.push(main_bracket.clone());
        brackets.reverse();

        let match_list = create_match_list(&main_bracket);

        let finals_rankings: Vec<Rc<RankingNode>> = brackets
            .iter()
            .map(|b| {
                let finals = b.matches().last().expect("a bracket has a final");
                b.winner_ranking(finals)
                    .expect("the final has a winner ranking")
            })
            .collect();

        let final_ranking = EliminationRanking::create(
            match_list.clone(),
            entries.clone(),
            &finals_rankings,
            &graph,
        );

        let editing_policy = Rc::new(EliminationEditingPolicy::new(
            match_list.clone(),
            elimination_graph.clone(),
        ));
        let withdrawal_policy = Rc::new(EliminationWithdrawalPolicy {
            match_list: match_list.clone(),
            elimination_graph: elimination_graph.clone(),
        });

        let core = TournamentCore::new(
            entries,
            final_ranking,
            match_list,
            graph,
            editing_policy,
            withdrawal_policy,
        );

        Ok(SingleEliminationWithConsolation {
            core,
            main_bracket,
            brackets,
            elimination_graph,
        })
    }

    pub fn main_bracket(&self) -> &Rc<ConsolationBracket> {
        &self.main_bracket
    }

    /// All brackets ordered by their highest achievable rank: main,
    /// then the bracket for 3rd, for 5th, and so on.
    pub fn brackets(&self) -> &[Rc<ConsolationBracket>] {
        &self.brackets
    }

    pub fn elimination_graph(&self) -> &Rc<EliminationGraph> {
        &self.elimination_graph
    }
}

impl Deref for SingleEliminationWithConsolation {
    type Target = TournamentCore;

    fn deref(&self) -> &TournamentCore {
        &self.core
    }
}

/// The number of consolation brackets (with incrementing round counts)
/// needed to produce at least the given number of finals.
pub(crate) fn finals_to_brackets(num_finals: usize) -> usize {
    // floor(log2(num_finals)) + 1: each extra bracket doubles the
    // finals of its smaller predecessor.
    let mut num_brackets = 0;
    while (1usize << num_brackets) <= num_finals {
        num_brackets += 1;
    }
    num_brackets
}

/// How many finals have to be played to get the given number of places
/// played out.
pub(crate) fn places_to_finals(num_places: usize) -> usize {
    num_places.div_ceil(2)
}

fn create_consolation_brackets(
    winner_bracket: &Rc<ConsolationBracket>,
    depth: usize,
    num_consolation_rounds: usize,
    places_to_play_out: usize,
    graph: &Rc<RankingGraph>,
    elimination_graph: &Rc<EliminationGraph>,
    brackets: &mut Vec<Rc<ConsolationBracket>>,
) {
    let consolation_depth = num_consolation_rounds as isize - depth as isize;

    let finals_in_bracket = brackets.len() + depth + 1;
    let play_out_depth = places_to_play_out as isize - 2 * finals_in_bracket as isize;

    if consolation_depth <= 0 && play_out_depth <= 0 {
        return;
    }

    let mut num_rounds_to_console = winner_bracket.rounds().len() - 1;
    if consolation_depth <= 0 {
        let num_finals_required = places_to_finals(play_out_depth as usize);
        num_rounds_to_console =
            num_rounds_to_console.min(finals_to_brackets(num_finals_required));
    }

    let start_index = winner_bracket.rounds().len() - num_rounds_to_console;
    let rounds_to_console: Vec<Round> = winner_bracket.rounds()[start_index..].to_vec();

    for round in rounds_to_console.iter().rev() {
        let Some(consolation) =
            create_bracket_from_round(round, winner_bracket, graph, elimination_graph)
        else {
            break;
        };

        create_consolation_brackets(
            &consolation,
            depth + 1,
            num_consolation_rounds,
            places_to_play_out,
            graph,
            elimination_graph,
            brackets,
        );

        winner_bracket
            .consolations
            .borrow_mut()
            .push(consolation.clone());
        brackets.push(consolation);
    }

    winner_bracket.consolations.borrow_mut().reverse();
}

/// Builds a consolation bracket over the losers feeding into the given
/// round, or `None` when all of them are effective byes.
fn create_bracket_from_round(
    winner_round: &Round,
    winner_bracket: &Rc<ConsolationBracket>,
    graph: &Rc<RankingGraph>,
    elimination_graph: &Rc<EliminationGraph>,
) -> Option<Rc<ConsolationBracket>> {
    let mut winner_rankings: Vec<Rc<RankingNode>> =
        Vec::with_capacity(2 * winner_round.matches.len());
    for m in &winner_round.matches {
        for slot in m.slots() {
            let ranking = slot
                .placement()
                .expect("bracket slots past round 0 resolve through placements")
                .ranking()
                .clone();
            winner_rankings.push(ranking);
        }
    }

    let losers: Vec<Rc<Slot>> = winner_rankings
        .iter()
        .map(|r| Slot::with_placement(Placement::new(r.clone(), 1)))
        .collect();

    if losers.iter().all(|s| s.is_bye()) {
        return None;
    }

    let consolation_entries = RankingNode::from_slots(losers);
    let consolation_elimination = SingleElimination::build(
        consolation_entries.clone(),
        false,
        Some(graph.clone()),
        Some(elimination_graph.clone()),
    )
    .expect("consolation entries hold at least one full round of losers");
    let consolation = ConsolationBracket::new(consolation_elimination);

    for ranking in &winner_rankings {
        graph.add_edge(ranking, &consolation_entries);
    }

    let round_index = winner_bracket
        .rounds()
        .iter()
        .position(|r| {
            r.matches.len() == winner_round.matches.len()
                && r.matches
                    .iter()
                    .zip(&winner_round.matches)
                    .all(|(a, b)| Rc::ptr_eq(a, b))
        })
        .expect("the consoled round belongs to the winner bracket");
    let prev_round = &winner_bracket.rounds()[round_index - 1];
    link_matches(
        &prev_round.matches,
        &consolation.rounds()[0].matches,
        elimination_graph,
    );

    Some(consolation)
}

/// Groups the finals of all brackets into one super round, all
/// semi-finals into the next, and so on, with the brackets ordered by
/// their highest achievable rank.
fn create_match_list(main_bracket: &Rc<ConsolationBracket>) -> Rc<MatchList> {
    let mut stack: Vec<Rc<ConsolationBracket>> = vec![main_bracket.clone()];
    let mut ordered: Vec<Rc<ConsolationBracket>> = Vec::new();
    while let Some(current) = stack.pop() {
        stack.extend(current.consolations());
        ordered.push(current);
    }

    let max_num_rounds = main_bracket.rounds().len();
    let mut grouped_rounds: Vec<Vec<Round>> = vec![Vec::new(); max_num_rounds];
    for bracket in &ordered {
        let num_rounds = bracket.rounds().len();
        for (i, round) in bracket.rounds().iter().enumerate() {
            grouped_rounds[i + (max_num_rounds - num_rounds)].push(round.clone());
        }
    }

    let mut rounds = Vec::with_capacity(grouped_rounds.len());
    let mut matches = Vec::new();
    for group in grouped_rounds {
        let mut super_round = Round {
            matches: Vec::new(),
            nested_rounds: group,
        };
        for nested in &super_round.nested_rounds {
            super_round.matches.extend(nested.matches.iter().cloned());
        }
        matches.extend(super_round.matches.iter().cloned());
        rounds.push(super_round);
    }

    MatchList::new(matches, rounds)
}
