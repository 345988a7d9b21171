//! Single elimination: seeding, propagation, withdrawal and editing.

mod common;

use std::rc::Rc;

use common::{occupant, play, players, rank_ids, same_matches, TestClock};
use courtside::{RankingNode, SingleElimination, TournamentError};

#[test]
fn test_small_single_elimination() {
    let players = players(4);
    let entries = RankingNode::constant(&players);
    let tournament = SingleElimination::new(entries).unwrap();
    let clock = TestClock::new();

    let semi1 = tournament.matches()[0].clone();
    let semi2 = tournament.matches()[1].clone();

    // Highest vs lowest seed, second highest vs second lowest.
    assert_eq!(occupant(semi1.slot1()).unwrap(), "0");
    assert_eq!(occupant(semi1.slot2()).unwrap(), "3");
    assert_eq!(occupant(semi2.slot1()).unwrap(), "1");
    assert_eq!(occupant(semi2.slot2()).unwrap(), "2");

    // Before any result everyone shares one rank.
    let ranks = rank_ids(tournament.final_ranking());
    assert_eq!(ranks.len(), 1);
    assert_eq!(ranks[0].len(), 4);

    play(&semi1, &clock, 1, 0);
    let semi1_ranking = tournament.winner_ranking(&semi1).unwrap();
    tournament.update(Some(&semi1_ranking));

    let ranks = rank_ids(tournament.final_ranking());
    assert_eq!(ranks.len(), 2);
    assert_eq!(ranks[0][0], "0");

    let final_match = tournament.matches()[2].clone();
    assert_eq!(occupant(final_match.slot1()).unwrap(), "0");
    assert_eq!(occupant(final_match.slot2()), None);

    play(&semi2, &clock, 0, 1);
    let semi2_ranking = tournament.winner_ranking(&semi2).unwrap();
    tournament.update(Some(&semi2_ranking));

    assert_eq!(occupant(final_match.slot2()).unwrap(), "2");

    let ranks = rank_ids(tournament.final_ranking());
    assert_eq!(ranks[0], ["0", "2"]);
    assert_eq!(ranks[1], ["3", "1"]);

    play(&final_match, &clock, 1, 0);
    tournament.update(None);

    let ranks = rank_ids(tournament.final_ranking());
    assert_eq!(ranks, [vec!["0"], vec!["2"], vec!["3", "1"]]);
}

#[test]
fn test_final_ranking_covers_all_entries() {
    let players = players(4);
    let tournament = SingleElimination::new(RankingNode::constant(&players)).unwrap();
    let clock = TestClock::new();

    for m in tournament.matches().to_vec() {
        play(&m, &clock, 1, 0);
        tournament.update(None);
    }

    let total: usize = rank_ids(tournament.final_ranking())
        .iter()
        .map(Vec::len)
        .sum();
    assert_eq!(total, players.len());

    // The champion rank is a single player.
    assert_eq!(rank_ids(tournament.final_ranking())[0].len(), 1);
}

#[test]
fn test_unbalanced_entries_give_top_seeds_byes() {
    let players = players(6);
    let tournament = SingleElimination::new(RankingNode::constant(&players)).unwrap();

    let quarters = &tournament.rounds()[0].matches;
    assert!(quarters[0].has_drawn_bye());
    assert!(quarters[2].has_drawn_bye());
    assert!(!quarters[1].has_drawn_bye());
    assert!(!quarters[3].has_drawn_bye());

    // The byes advance the two top seeds right into the semis.
    let semis = &tournament.rounds()[1].matches;
    assert_eq!(occupant(semis[0].slot1()).unwrap(), "0");
    assert_eq!(occupant(semis[1].slot1()).unwrap(), "1");
    assert_eq!(occupant(semis[0].slot2()), None);
    assert_eq!(occupant(semis[1].slot2()), None);
}

#[test]
fn test_too_few_entries() {
    let players = players(1);
    let result = SingleElimination::new(RankingNode::constant(&players));
    assert!(matches!(result, Err(TournamentError::TooFewEntries)));
}

#[test]
fn test_withdrawal_policy() {
    let players = players(8);
    let tournament = SingleElimination::new(RankingNode::constant(&players)).unwrap();
    let clock = TestClock::new();

    let first_match = tournament.matches()[0].clone();

    let withdrawn = tournament.withdraw_player(&players[0]);
    assert!(same_matches(&withdrawn, &[first_match.clone()]));
    tournament.update(None);

    // The opponent advances on the walkover.
    let semi1 = tournament.rounds()[1].matches[0].clone();
    assert_eq!(occupant(semi1.slot1()).unwrap(), "7");

    let withdrawn = tournament.withdraw_player(&players[7]);
    assert!(same_matches(&withdrawn, &[first_match.clone()]));
    tournament.update(None);

    // Both opponents gone: the next round sees a bye.
    assert!(semi1.slot1().is_bye());

    let reentered = tournament.reenter_player(&players[7]);
    assert!(same_matches(&reentered, &[first_match.clone()]));
    tournament.update(None);
    assert_eq!(occupant(semi1.slot1()).unwrap(), "7");

    // Reentering twice is a no-op.
    assert!(tournament.reenter_player(&players[7]).is_empty());

    let reentered = tournament.reenter_player(&players[0]);
    assert!(same_matches(&reentered, &[first_match.clone()]));
    tournament.update(None);
    assert_eq!(occupant(semi1.slot1()), None);
    assert!(!semi1.has_bye());

    // After winning the first round the withdrawal moves to the next
    // match.
    play(&first_match, &clock, 1, 0);
    tournament.update(None);

    let withdrawn = tournament.withdraw_player(&players[0]);
    assert!(same_matches(&withdrawn, &[semi1.clone()]));
    tournament.update(None);

    let second_match = tournament.matches()[1].clone();
    play(&second_match, &clock, 0, 1);
    tournament.update(None);

    // The walkover in the semi forwards the quarter winner to the
    // final.
    let final_match = tournament.rounds()[2].matches[0].clone();
    assert_eq!(occupant(final_match.slot1()).unwrap(), "4");
}

#[test]
fn test_withdrawal_policy_unbalanced() {
    let players = players(7);
    let tournament = SingleElimination::new(RankingNode::constant(&players)).unwrap();
    let clock = TestClock::new();

    // The first seed has a drawn bye; the withdrawal lands in the
    // semi-final.
    let withdrawn = tournament.withdraw_player(&players[0]);
    let semi1 = tournament.rounds()[1].matches[0].clone();
    assert!(same_matches(&withdrawn, &[semi1.clone()]));
    tournament.update(None);

    // A double withdrawal in the quarter propagates a bye all the way
    // into the final slot.
    let quarter = tournament.matches()[1].clone();
    let withdrawn1 = tournament.withdraw_player(&players[3]);
    tournament.update(None);
    let withdrawn2 = tournament.withdraw_player(&players[4]);
    tournament.update(None);

    assert!(same_matches(&withdrawn1, &withdrawn2));
    assert!(same_matches(&withdrawn1, &[quarter]));
    assert!(tournament.rounds()[1].matches[0].slot2().is_bye());
    assert!(tournament.rounds()[2].matches[0].slot1().is_bye());

    // Play the tournament out on the other half of the draw.
    for index in [2, 3, 5, 6] {
        let m = tournament.matches()[index].clone();
        play(&m, &clock, 1, 0);
        tournament.update(None);
    }

    // The champion cannot withdraw from a completed tournament.
    assert!(tournament.withdraw_player(&players[1]).is_empty());
}

#[test]
fn test_editing_policy() {
    let players = players(8);
    let tournament = SingleElimination::new(RankingNode::constant(&players)).unwrap();
    let clock = TestClock::new();

    assert!(tournament.editable_matches().is_empty());

    let quarters = tournament.rounds()[0].matches.clone();
    play(&quarters[0], &clock, 1, 0);
    tournament.update(None);

    assert!(same_matches(
        &tournament.editable_matches(),
        &quarters[..1]
    ));

    for m in &quarters[1..] {
        play(m, &clock, 1, 0);
    }
    tournament.update(None);

    assert!(same_matches(&tournament.editable_matches(), &quarters));

    // Starting a semi locks its two feeder matches.
    tournament.rounds()[1].matches[0].start(&clock).unwrap();
    tournament.update(None);

    let editable = tournament.editable_matches();
    assert!(!editable.iter().any(|m| Rc::ptr_eq(m, &quarters[0])));
    assert!(!editable.iter().any(|m| Rc::ptr_eq(m, &quarters[1])));
    assert!(editable.iter().any(|m| Rc::ptr_eq(m, &quarters[2])));
}

#[test]
fn test_update_is_idempotent() {
    let players = players(8);
    let tournament = SingleElimination::new(RankingNode::constant(&players)).unwrap();
    let clock = TestClock::new();

    play(&tournament.matches()[0], &clock, 1, 0);
    play(&tournament.matches()[1], &clock, 0, 1);
    tournament.update(None);

    let first = rank_ids(tournament.final_ranking());
    let first_semis: Vec<_> = tournament.rounds()[1]
        .matches
        .iter()
        .map(|m| (occupant(m.slot1()), occupant(m.slot2())))
        .collect();

    tournament.update(None);

    assert_eq!(first, rank_ids(tournament.final_ranking()));
    let second_semis: Vec<_> = tournament.rounds()[1]
        .matches
        .iter()
        .map(|m| (occupant(m.slot1()), occupant(m.slot2())))
        .collect();
    assert_eq!(first_semis, second_semis);
}

#[test]
fn test_withdraw_reenter_restores_match_state() {
    let players = players(8);
    let tournament = SingleElimination::new(RankingNode::constant(&players)).unwrap();

    let first_match = tournament.matches()[0].clone();
    let before = (
        occupant(first_match.slot1()),
        occupant(first_match.slot2()),
        first_match.withdrawn_players().len(),
        first_match.score().is_some(),
    );

    tournament.withdraw_player(&players[0]);
    tournament.update(None);
    tournament.reenter_player(&players[0]);
    tournament.update(None);

    let after = (
        occupant(first_match.slot1()),
        occupant(first_match.slot2()),
        first_match.withdrawn_players().len(),
        first_match.score().is_some(),
    );
    assert_eq!(before, after);
}
