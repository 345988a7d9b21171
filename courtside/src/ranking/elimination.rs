//! Final placement in a knockout.

use std::rc::Rc;

use crate::graph::RankingGraph;
use crate::matches::{Match, MatchList, Round};
use crate::ranking::{remove_double_ranks, Ranking, RankingCore, RankingNode, TieableCore};
use crate::slot::Slot;

/// Ranks the players of an elimination tournament by how far they
/// reached: deeper round means better rank, with the players who lost
/// out in the same round tied.
///
/// The entries are appended at the bottom so that players who never
/// played still appear; duplicates are removed by first appearance.
/// Consolation and double-elimination tournaments feed several finals
/// rankings in, interleaving the tiers below the main bracket.
pub struct EliminationRanking {
    tie: TieableCore,
    match_list: Rc<MatchList>,
    entries: Rc<RankingNode>,
}

impl EliminationRanking {
    pub(crate) fn create(
        match_list: Rc<MatchList>,
        entries: Rc<RankingNode>,
        finals_rankings: &[Rc<RankingNode>],
        graph: &RankingGraph,
    ) -> Rc<RankingNode> {
        let ranking = Rc::new(RankingNode::from(EliminationRanking {
            tie: TieableCore::new(0),
            match_list,
            entries,
        }));
        graph.add_vertex(&ranking);
        for finals in finals_rankings {
            graph.add_edge(finals, &ranking);
        }
        ranking
    }

    pub fn tie_core(&self) -> &TieableCore {
        &self.tie
    }
}

impl Ranking for EliminationRanking {
    fn core(&self) -> &RankingCore {
        self.tie.core()
    }

    fn update_ranks(&self) {
        // Combined rounds rank by their nested rounds, later ones
        // first: in a winner+minor-loser super round the minor losers
        // place below the winner round's losers.
        let mut rounds: Vec<&Round> = Vec::with_capacity(self.match_list.rounds.len());
        for round in &self.match_list.rounds {
            if round.nested_rounds.is_empty() {
                rounds.push(round);
            } else {
                rounds.extend(round.nested_rounds.iter().rev());
            }
        }

        let mut ranks: Vec<Vec<Rc<Slot>>> = Vec::with_capacity(2 * rounds.len());
        for round in rounds.iter().rev() {
            ranks.extend(rank_round(round));
        }

        ranks.push(self.entries.ranks());

        let ranks = remove_double_ranks(ranks);

        self.tie.process_update(ranks);
    }
}

fn rank_round(round: &Round) -> Vec<Vec<Rc<Slot>>> {
    let mut winners = Vec::with_capacity(round.matches.len());
    let mut losers = Vec::with_capacity(round.matches.len());

    for m in &round.matches {
        let (match_winner, match_losers) = rank_match(m);
        if let Some(winner) = match_winner {
            winners.push(winner);
        }
        losers.extend(match_losers);
    }

    let mut ranks = Vec::with_capacity(2);
    if !winners.is_empty() {
        ranks.push(winners);
    }
    if !losers.is_empty() {
        ranks.push(losers);
    }
    ranks
}

fn rank_match(m: &Rc<Match>) -> (Option<Rc<Slot>>, Vec<Rc<Slot>>) {
    match m.winner() {
        Ok(winner) => {
            let loser = m.other_slot(&winner);
            let losers = if loser.player().is_some() {
                vec![loser]
            } else {
                Vec::new()
            };
            (Some(winner), losers)
        }
        Err(_) => {
            // Undecided: both occupants share the round's loser tier
            // for now.
            let losers = m
                .slots()
                .into_iter()
                .filter(|s| s.player().is_some())
                .cloned()
                .collect();
            (None, losers)
        }
    }
}
