//! Tournament state as JSON maps.
//!
//! Every mode emits a map with the common fields (`type`, `entries`,
//! `finalRanking`, `rounds`, `editable`) plus its mode-specific ones.
//! Match ids are assigned by the caller through `get_match_id`, so the
//! emitted structure can reference externally persisted matches.

use std::rc::Rc;

use serde_json::{json, Map, Value};

use crate::matches::{Match, Round};
use crate::ranking::RankingNode;
use crate::slot::{Bye, Slot};
use crate::tournament::{
    ConsolationBracket, DoubleElimination, GroupKnockout, GroupPhase, KnockoutPhase, RoundRobin,
    SingleElimination, SingleEliminationWithConsolation, TournamentCore,
};

/// Assigns the externally visible id of a match.
pub type MatchIdFn<'a> = &'a dyn Fn(&Match) -> String;

fn effective_bye(slot: &Slot) -> Option<Bye> {
    if let Some(bye) = slot.bye() {
        return Some(bye);
    }
    let resolved = slot.placement()?.slot()?;
    effective_bye(&resolved)
}

fn slot_descriptor(slot: &Slot) -> Value {
    let occupant = match effective_bye(slot) {
        Some(Bye { drawn: true }) => "b".to_string(),
        Some(Bye { drawn: false }) => "db".to_string(),
        None => slot
            .player()
            .map(|p| p.id().to_string())
            .unwrap_or_default(),
    };
    json!({ "id": slot.id(), "occupant": occupant })
}

fn rank_groups(ranking: &RankingNode) -> Value {
    Value::Array(
        ranking
            .rank_groups()
            .iter()
            .map(|group| Value::Array(group.iter().map(|s| slot_descriptor(s)).collect()))
            .collect(),
    )
}

fn tie_groups(ties: &[Vec<Rc<Slot>>]) -> Value {
    Value::Array(
        ties.iter()
            .map(|tie| Value::Array(tie.iter().map(|s| slot_descriptor(s)).collect()))
            .collect(),
    )
}

fn match_entry(m: &Match, get_match_id: MatchIdFn) -> Value {
    let mut entry = Map::new();
    entry.insert("id".into(), Value::String(get_match_id(m)));
    entry.insert("slot1".into(), json!(m.slot1().id()));
    entry.insert("slot2".into(), json!(m.slot2().id()));
    entry.insert("walkover".into(), Value::Bool(m.is_walkover()));
    if let Ok(winner) = m.winner() {
        entry.insert("winner".into(), json!(winner.id()));
    }
    Value::Object(entry)
}

fn round_ids(rounds: &[Round], get_match_id: MatchIdFn) -> Value {
    Value::Array(
        rounds
            .iter()
            .map(|round| {
                Value::Array(
                    round
                        .matches
                        .iter()
                        .map(|m| Value::String(get_match_id(m)))
                        .collect(),
                )
            })
            .collect(),
    )
}

fn base_map(type_name: &str, core: &TournamentCore, get_match_id: MatchIdFn) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("type".into(), Value::String(type_name.to_string()));
    map.insert("entries".into(), rank_groups(core.entries()));
    map.insert("finalRanking".into(), rank_groups(core.final_ranking()));
    map.insert("rounds".into(), round_ids(core.rounds(), get_match_id));
    map.insert(
        "matches".into(),
        Value::Array(
            core.matches()
                .iter()
                .map(|m| match_entry(m, get_match_id))
                .collect(),
        ),
    );
    map.insert(
        "editable".into(),
        Value::Array(
            core.editable_matches()
                .iter()
                .map(|m| Value::String(get_match_id(m)))
                .collect(),
        ),
    );
    map
}

impl SingleElimination {
    pub fn to_map(&self, get_match_id: MatchIdFn) -> Value {
        Value::Object(base_map("SingleElimination", self, get_match_id))
    }
}

impl RoundRobin {
    pub fn to_map(&self, get_match_id: MatchIdFn) -> Value {
        let mut map = base_map("RoundRobin", self, get_match_id);

        let ranking = self
            .final_ranking()
            .as_match_metric()
            .expect("a round robin ends in a metric ranking");

        let mut metrics = Map::new();
        for (player, player_metrics) in ranking.metrics() {
            metrics.insert(
                player.id().to_string(),
                serde_json::to_value(player_metrics).expect("metrics serialize"),
            );
        }
        map.insert("metrics".into(), Value::Object(metrics));
        map.insert("ties".into(), tie_groups(&ranking.tie_core().tied_ranks()));
        map.insert(
            "unbrokenTies".into(),
            tie_groups(&ranking.tie_core().unbroken_tied_ranks()),
        );

        Value::Object(map)
    }
}

impl DoubleElimination {
    pub fn to_map(&self, get_match_id: MatchIdFn) -> Value {
        let mut map = base_map("DoubleElimination", self, get_match_id);

        map.insert(
            "winnerRounds".into(),
            round_ids(self.winner_bracket().rounds(), get_match_id),
        );
        let loser_rounds: Vec<Round> = self
            .loser_rounds()
            .iter()
            .map(|matches| Round::new(matches.clone()))
            .collect();
        map.insert("loserRounds".into(), round_ids(&loser_rounds, get_match_id));
        map.insert(
            "final".into(),
            Value::String(get_match_id(self.final_match())),
        );

        Value::Object(map)
    }
}

fn bracket_map(bracket: &ConsolationBracket, get_match_id: MatchIdFn) -> Value {
    json!({
        "rounds": round_ids(bracket.rounds(), get_match_id),
        "consolations": bracket
            .consolations()
            .iter()
            .map(|b| bracket_map(b, get_match_id))
            .collect::<Vec<Value>>(),
    })
}

impl SingleEliminationWithConsolation {
    pub fn to_map(&self, get_match_id: MatchIdFn) -> Value {
        let mut map = base_map("SingleEliminationWithConsolation", self, get_match_id);
        map.insert(
            "mainBracket".into(),
            bracket_map(self.main_bracket(), get_match_id),
        );
        Value::Object(map)
    }
}

impl GroupPhase {
    pub fn to_map(&self, get_match_id: MatchIdFn) -> Value {
        let mut map = base_map("GroupPhase", self, get_match_id);

        map.insert(
            "groupRounds".into(),
            Value::Array(
                self.groups()
                    .iter()
                    .map(|g| round_ids(&g.match_list.rounds, get_match_id))
                    .collect(),
            ),
        );

        let ranking = self
            .final_ranking()
            .as_group_phase()
            .expect("a group phase ends in a group phase ranking");
        map.insert(
            "crossGroupTies".into(),
            tie_groups(&ranking.cross_group_ties()),
        );
        map.insert(
            "unbrokenCrossGroupTies".into(),
            tie_groups(&ranking.unbroken_cross_group_ties()),
        );
        map.insert(
            "crossTiedRank".into(),
            match ranking.contested_rank() {
                Some((rank, _)) => json!(rank),
                None => json!(-1),
            },
        );

        Value::Object(map)
    }
}

impl GroupKnockout {
    pub fn to_map(&self, get_match_id: MatchIdFn) -> Value {
        let mut map = base_map("GroupKnockout", self, get_match_id);

        map.insert(
            "groupPhase".into(),
            self.group_phase().to_map(get_match_id),
        );

        let ko_phase = match self.knockout() {
            KnockoutPhase::SingleElimination(t) => t.to_map(get_match_id),
            KnockoutPhase::DoubleElimination(t) => t.to_map(get_match_id),
            KnockoutPhase::Consolation(t) => t.to_map(get_match_id),
        };
        map.insert("koPhase".into(), ko_phase);
        map.insert("koStarted".into(), Value::Bool(self.knockout().started()));

        Value::Object(map)
    }
}
