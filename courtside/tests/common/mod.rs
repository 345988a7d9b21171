//! Shared fixtures for the tournament integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, TimeZone, Utc};
use courtside::{
    Clock, Match, Player, PlayerRef, Ranking, RankingNode, Score, Undetermined,
};

pub struct TestPlayer {
    id: String,
}

impl Player for TestPlayer {
    fn id(&self) -> &str {
        &self.id
    }
}

const TEST_IDS: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// One single-character player per entry, in seeding order.
pub fn players(num: usize) -> Vec<PlayerRef> {
    assert!(num <= TEST_IDS.len(), "max number of test players exceeded");
    TEST_IDS
        .chars()
        .take(num)
        .map(|c| PlayerRef::new(Rc::new(TestPlayer { id: c.to_string() })))
        .collect()
}

/// A single-set score.
pub struct TestScore {
    p1: Vec<i32>,
    p2: Vec<i32>,
}

impl Score for TestScore {
    fn points1(&self) -> &[i32] {
        &self.p1
    }

    fn points2(&self) -> &[i32] {
        &self.p2
    }

    fn winner(&self) -> Result<usize, Undetermined> {
        match self.p1[0].cmp(&self.p2[0]) {
            std::cmp::Ordering::Greater => Ok(0),
            std::cmp::Ordering::Less => Ok(1),
            std::cmp::Ordering::Equal => Err(Undetermined),
        }
    }

    fn invert(&self) -> Rc<dyn Score> {
        Rc::new(TestScore {
            p1: self.p2.clone(),
            p2: self.p1.clone(),
        })
    }
}

pub fn score(a: i32, b: i32) -> Rc<dyn Score> {
    Rc::new(TestScore {
        p1: vec![a],
        p2: vec![b],
    })
}

/// A clock that ticks one second per reading.
pub struct TestClock {
    now: Cell<i64>,
}

impl TestClock {
    pub fn new() -> TestClock {
        TestClock { now: Cell::new(0) }
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        let now = self.now.get();
        self.now.set(now + 1);
        Utc.timestamp_opt(now, 0).unwrap()
    }
}

/// Starts and ends the match with the given single-set score.
pub fn play(m: &Match, clock: &TestClock, a: i32, b: i32) {
    m.start(clock).unwrap();
    m.end(score(a, b), clock).unwrap();
}

/// The rank groups of a ranking as player ids, empty slots as `"-"`.
pub fn rank_ids(ranking: &RankingNode) -> Vec<Vec<String>> {
    ranking
        .rank_groups()
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|slot| {
                    slot.player()
                        .map(|p| p.id().to_string())
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect()
        })
        .collect()
}

/// The player id currently occupying the slot, if any.
pub fn occupant(slot: &courtside::Slot) -> Option<String> {
    slot.player().map(|p| p.id().to_string())
}

pub fn same_matches(a: &[Rc<Match>], b: &[Rc<Match>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Rc::ptr_eq(x, y))
}

/// The flattened ranks of a ranking as player ids.
pub fn flat_ids(ranking: &RankingNode) -> Vec<String> {
    ranking
        .ranks()
        .iter()
        .map(|slot| {
            slot.player()
                .map(|p| p.id().to_string())
                .unwrap_or_else(|| "-".to_string())
        })
        .collect()
}
