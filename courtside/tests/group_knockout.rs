//! Group knockout: qualification seeding, blocking placements and
//! delegated policies.

mod common;

use std::rc::Rc;

use common::{occupant, play, players, rank_ids, same_matches, score, TestClock};
use courtside::{
    GroupKnockout, KnockoutMode, Match, PlayerRef, Ranking, RankingNode,
};

/// Plays the match so that the player with the higher entry index
/// wins, with that index deciding the points.
fn play_by_index(m: &Rc<Match>, clock: &TestClock, players: &[PlayerRef]) {
    let index = |p: &PlayerRef| players.iter().position(|q| q == p).unwrap() as i32;
    let p1 = index(&m.slot1().player().unwrap());
    let p2 = index(&m.slot2().player().unwrap());
    if p1 > p2 {
        play(m, clock, p1 + 1, 0);
    } else {
        play(m, clock, 0, p2 + 1);
    }
}

#[test]
fn test_structure_and_live_ranking() {
    let players = players(12);
    let tournament = GroupKnockout::new(
        RankingNode::constant(&players),
        KnockoutMode::SingleElimination,
        4,
        8,
        score(42, 0),
    )
    .unwrap();
    let clock = TestClock::new();

    assert_eq!(tournament.knockout().core().rounds().len(), 3);

    // One decided group match already refines the composite ranking.
    let m = tournament.matches()[4].clone();
    play(&m, &clock, 1, 0);
    tournament.update(None);

    let ranks = rank_ids(tournament.final_ranking());
    assert_eq!(ranks.len(), 3);
    assert_eq!(ranks[1], ["0"]);
    assert_eq!(ranks[2], ["8"]);
}

#[test]
fn test_qualification_seeding() {
    let players = players(12);
    let tournament = GroupKnockout::new(
        RankingNode::constant(&players),
        KnockoutMode::SingleEliminationWithConsolation {
            num_consolation_rounds: 0,
            places_to_play_out: 3,
        },
        4,
        8,
        score(42, 0),
    )
    .unwrap();
    let clock = TestClock::new();

    for m in tournament.matches()[..24].to_vec() {
        if !m.has_bye() {
            play_by_index(&m, &clock, &players);
        }
    }
    tournament.update(None);

    let group_ranking = tournament
        .group_phase()
        .final_ranking()
        .as_group_phase()
        .unwrap();
    assert!(group_ranking.qualification_complete());

    // Same-group rematches are avoided in the first knockout round.
    let first_round = &tournament.knockout().core().rounds()[0].matches;
    let pairings: Vec<(String, String)> = first_round
        .iter()
        .map(|m| {
            (
                occupant(m.slot1()).unwrap(),
                occupant(m.slot2()).unwrap(),
            )
        })
        .collect();
    assert_eq!(
        pairings,
        [
            ("8".to_string(), "6".to_string()),
            ("b".to_string(), "5".to_string()),
            ("9".to_string(), "7".to_string()),
            ("a".to_string(), "4".to_string()),
        ]
    );
}

#[test]
fn test_qualification_with_pre_round() {
    let players = players(12);
    let tournament = GroupKnockout::new(
        RankingNode::constant(&players),
        KnockoutMode::SingleElimination,
        3,
        6,
        score(42, 0),
    )
    .unwrap();
    let clock = TestClock::new();

    for m in tournament.matches()[..18].to_vec() {
        play_by_index(&m, &clock, &players);
    }
    tournament.update(None);

    // The two group winners with the best records skip the pre-round.
    let ko = tournament.knockout().core();
    let m = &ko.matches()[0];
    assert_eq!(occupant(m.slot1()).unwrap(), "b");
    assert!(m.slot2().is_bye());
    let m = &ko.matches()[1];
    assert_eq!(occupant(m.slot1()).unwrap(), "9");
    assert_eq!(occupant(m.slot2()).unwrap(), "7");
    let m = &ko.matches()[2];
    assert_eq!(occupant(m.slot1()).unwrap(), "a");
    assert!(m.slot2().is_bye());
    let m = &ko.matches()[3];
    assert_eq!(occupant(m.slot1()).unwrap(), "6");
    assert_eq!(occupant(m.slot2()).unwrap(), "8");

    // The bye recipients wait in the semi-finals.
    let m = &ko.matches()[4];
    assert_eq!(occupant(m.slot1()).unwrap(), "b");
    assert_eq!(occupant(m.slot2()), None);
    let m = &ko.matches()[5];
    assert_eq!(occupant(m.slot1()).unwrap(), "a");
    assert_eq!(occupant(m.slot2()), None);
}

#[test]
fn test_contested_qualifications() {
    let players = players(12);
    let tournament = GroupKnockout::new(
        RankingNode::constant(&players),
        KnockoutMode::SingleElimination,
        3,
        5,
        score(42, 0),
    )
    .unwrap();
    let clock = TestClock::new();

    for m in tournament.matches()[..18].to_vec() {
        play_by_index(&m, &clock, &players);
    }
    tournament.update(None);

    // The two best runners-up by the cross-group metrics qualify.
    let ko_entries = tournament.knockout().core().entries();
    let ids: Vec<Option<String>> = ko_entries.ranks().iter().map(|s| occupant(s)).collect();
    assert_eq!(
        ids,
        [
            Some("b".to_string()),
            Some("a".to_string()),
            Some("9".to_string()),
            Some("8".to_string()),
            Some("7".to_string()),
        ]
    );
}

#[test]
fn test_knockout_blocked_until_groups_resolve() {
    let players = players(6);
    let tournament = GroupKnockout::new(
        RankingNode::constant(&players),
        KnockoutMode::SingleElimination,
        3,
        5,
        score(1, 0),
    )
    .unwrap();
    let clock = TestClock::new();

    // Identical results leave a cross-group tie: every knockout slot
    // stays empty.
    for m in tournament.matches()[..3].to_vec() {
        play(&m, &clock, 2, 0);
    }
    tournament.update(None);

    let ko_entries = tournament.knockout().core().entries();
    assert!(ko_entries.ranks().iter().all(|s| s.player().is_none()));

    // Breaking the tie reveals the seeding.
    tournament.matches()[1].set_score(Some(score(3, 0)));
    tournament.update(None);

    assert!(ko_entries.ranks().iter().all(|s| s.player().is_some()));
}

#[test]
fn test_editing_policy_delegation() {
    let players = players(8);
    let tournament = GroupKnockout::new(
        RankingNode::constant(&players),
        KnockoutMode::SingleElimination,
        2,
        4,
        score(42, 0),
    )
    .unwrap();
    let clock = TestClock::new();

    assert!(tournament.editable_matches().is_empty());

    let group_matches = tournament.group_phase().matches().to_vec();
    for (i, m) in group_matches.iter().enumerate() {
        play(m, &clock, (i as i32 + 1) * 2, 0);
    }
    tournament.update(None);

    assert!(same_matches(&tournament.editable_matches(), &group_matches));

    // As soon as the knockout starts, the group phase is frozen.
    let ko_match = tournament.knockout().core().matches()[0].clone();
    ko_match.start(&clock).unwrap();
    tournament.update(None);
    assert!(tournament.editable_matches().is_empty());

    ko_match.end(score(1, 0), &clock).unwrap();
    tournament.update(None);
    assert!(same_matches(&tournament.editable_matches(), &[ko_match]));
}

#[test]
fn test_withdrawal_policy_delegation() {
    let players = players(8);
    let tournament = GroupKnockout::new(
        RankingNode::constant(&players),
        KnockoutMode::SingleElimination,
        2,
        4,
        score(42, 0),
    )
    .unwrap();
    let clock = TestClock::new();

    let group_matches = tournament.group_phase().matches().to_vec();

    let withdrawn = tournament.withdraw_player(&players[0]);
    assert!(same_matches(
        &withdrawn,
        &[
            group_matches[0].clone(),
            group_matches[4].clone(),
            group_matches[8].clone(),
        ]
    ));
    tournament.update(None);

    for (i, m) in group_matches.iter().enumerate() {
        if !m.is_walkover() {
            play(m, &clock, (i as i32 + 1) * 2, 0);
        }
    }
    tournament.update(None);

    // Before the knockout starts the withdrawal can be reverted.
    let reentered = tournament.reenter_player(&players[0]);
    assert!(same_matches(&reentered, &withdrawn));
    tournament.update(None);

    tournament.withdraw_player(&players[0]);
    tournament.update(None);

    let ko_matches = tournament.knockout().core().matches().to_vec();
    ko_matches[0].start(&clock).unwrap();

    // The knockout has started: group-phase reentry is off the table.
    assert!(tournament.reenter_player(&players[0]).is_empty());

    // A player who did not qualify cannot withdraw any more.
    assert!(tournament.withdraw_player(&players[2]).is_empty());

    // A qualified player withdraws from their knockout match.
    let withdrawn = tournament.withdraw_player(&players[1]);
    assert!(same_matches(&withdrawn, &ko_matches[..1]));
}
