//! Matches, rounds and match lists.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::clock::Clock;
use crate::ids::{next_id, NodeId};
use crate::score::{Location, Score};
use crate::slot::{PlayerRef, Slot};

/// Why a match cannot produce a result, or a lifecycle call was made
/// out of order.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    /// Both slots are byes.
    #[error("both bye")]
    BothBye,
    /// Both players withdrew.
    #[error("both walkover")]
    BothWalkover,
    /// One player withdrew and the opposing slot is a bye.
    #[error("bye and walkover")]
    ByeAndWalkover,
    /// The match has no score yet.
    #[error("no score")]
    NoScore,
    /// The score does not determine a winner.
    #[error("equal score")]
    EqualScore,
    #[error("match already started")]
    AlreadyStarted,
    #[error("match cannot end before it started")]
    NotStarted,
    #[error("match already ended")]
    AlreadyEnded,
}

/// A contest between the occupants of two slots.
///
/// Besides the opponents it carries the result and some metadata: an
/// optional location, start/end timestamps and the list of players who
/// withdrew from this match.
pub struct Match {
    id: NodeId,
    slot1: Rc<Slot>,
    slot2: Rc<Slot>,
    score: RefCell<Option<Rc<dyn Score>>>,
    location: RefCell<Option<Rc<dyn Location>>>,
    start_time: RefCell<Option<DateTime<Utc>>>,
    end_time: RefCell<Option<DateTime<Utc>>>,
    withdrawn_players: RefCell<Vec<PlayerRef>>,
}

impl Match {
    pub fn new(slot1: Rc<Slot>, slot2: Rc<Slot>) -> Rc<Match> {
        Rc::new(Match {
            id: next_id(),
            slot1,
            slot2,
            score: RefCell::new(None),
            location: RefCell::new(None),
            start_time: RefCell::new(None),
            end_time: RefCell::new(None),
            withdrawn_players: RefCell::new(Vec::new()),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn slot1(&self) -> &Rc<Slot> {
        &self.slot1
    }

    pub fn slot2(&self) -> &Rc<Slot> {
        &self.slot2
    }

    /// The two slots in order.
    pub fn slots(&self) -> [&Rc<Slot>; 2] {
        [&self.slot1, &self.slot2]
    }

    pub fn score(&self) -> Option<Rc<dyn Score>> {
        self.score.borrow().clone()
    }

    /// Overwrites the result. Used when an editable match is corrected.
    pub fn set_score(&self, score: Option<Rc<dyn Score>>) {
        *self.score.borrow_mut() = score;
    }

    pub fn location(&self) -> Option<Rc<dyn Location>> {
        self.location.borrow().clone()
    }

    pub fn set_location(&self, location: Option<Rc<dyn Location>>) {
        *self.location.borrow_mut() = location;
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        *self.start_time.borrow()
    }

    /// Overwrites the start timestamp. Used when an edit reverts a
    /// match into its unplayed state.
    pub fn set_start_time(&self, time: Option<DateTime<Utc>>) {
        *self.start_time.borrow_mut() = time;
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        *self.end_time.borrow()
    }

    pub fn has_started(&self) -> bool {
        self.start_time.borrow().is_some()
    }

    pub fn withdrawn_players(&self) -> Vec<PlayerRef> {
        self.withdrawn_players.borrow().clone()
    }

    pub(crate) fn add_withdrawn_player(&self, player: &PlayerRef) {
        self.withdrawn_players.borrow_mut().push(player.clone());
    }

    pub(crate) fn remove_withdrawn_player(&self, player: &PlayerRef) {
        self.withdrawn_players.borrow_mut().retain(|p| p != player);
    }

    /// Determines the winning slot.
    ///
    /// Byes and walkovers resolve without a score: a lone bye loses to
    /// the opposing side, a lone withdrawal loses to the opposing side
    /// unless that side is itself a bye. When neither applies the
    /// score decides.
    pub fn winner(&self) -> Result<Rc<Slot>, MatchError> {
        let bye1 = self.slot1.is_bye();
        let bye2 = self.slot2.is_bye();

        if bye1 && bye2 {
            return Err(MatchError::BothBye);
        }

        let withdrawn = self.withdrawn_slots();
        match withdrawn.len() {
            1 => {
                let not_withdrawn = self.other_slot(&withdrawn[0]);
                return if not_withdrawn.is_bye() {
                    Err(MatchError::ByeAndWalkover)
                } else {
                    Ok(not_withdrawn)
                };
            }
            2 => return Err(MatchError::BothWalkover),
            _ => {}
        }

        if !bye1 && bye2 {
            return Ok(self.slot1.clone());
        }
        if !bye2 && bye1 {
            return Ok(self.slot2.clone());
        }

        let score = self.score.borrow().clone().ok_or(MatchError::NoScore)?;
        match score.winner() {
            Ok(0) => Ok(self.slot1.clone()),
            Ok(1) => Ok(self.slot2.clone()),
            Ok(_) => unreachable!("score winner index out of range"),
            Err(_) => Err(MatchError::EqualScore),
        }
    }

    /// The slot opposite to the given one.
    ///
    /// Panics when the slot is not part of this match; that is a
    /// wiring mistake, not a runtime condition.
    pub fn other_slot(&self, slot: &Rc<Slot>) -> Rc<Slot> {
        if Rc::ptr_eq(slot, &self.slot1) {
            self.slot2.clone()
        } else if Rc::ptr_eq(slot, &self.slot2) {
            self.slot1.clone()
        } else {
            panic!("slot is not in the match")
        }
    }

    /// The slots that are occupied by withdrawn players.
    pub fn withdrawn_slots(&self) -> Vec<Rc<Slot>> {
        let withdrawn = self.withdrawn_players.borrow();
        if withdrawn.is_empty() {
            return Vec::new();
        }

        let mut slots = Vec::with_capacity(2);
        for slot in self.slots() {
            if let Some(player) = slot.player() {
                if withdrawn.contains(&player) {
                    slots.push(slot.clone());
                }
            }
        }
        slots
    }

    pub fn is_walkover(&self) -> bool {
        !self.withdrawn_slots().is_empty()
    }

    pub fn has_bye(&self) -> bool {
        self.slot1.is_bye() || self.slot2.is_bye()
    }

    pub fn has_drawn_bye(&self) -> bool {
        self.slots()
            .iter()
            .any(|s| s.bye().is_some_and(|b| b.drawn))
    }

    pub fn contains_player(&self, player: &PlayerRef) -> bool {
        self.slots()
            .iter()
            .any(|s| s.player().as_ref() == Some(player))
    }

    /// Returns true when the given player has withdrawn and is
    /// occupying one of the slots.
    pub fn is_player_withdrawn(&self, player: &PlayerRef) -> bool {
        self.withdrawn_slots()
            .iter()
            .any(|s| s.player().as_ref() == Some(player))
    }

    pub fn start(&self, clock: &dyn Clock) -> Result<(), MatchError> {
        if self.start_time.borrow().is_some() {
            return Err(MatchError::AlreadyStarted);
        }
        *self.start_time.borrow_mut() = Some(clock.now());
        Ok(())
    }

    pub fn end(&self, score: Rc<dyn Score>, clock: &dyn Clock) -> Result<(), MatchError> {
        if self.start_time.borrow().is_none() {
            return Err(MatchError::NotStarted);
        }
        if self.end_time.borrow().is_some() {
            return Err(MatchError::AlreadyEnded);
        }
        *self.score.borrow_mut() = Some(score);
        *self.end_time.borrow_mut() = Some(clock.now());
        Ok(())
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |slot: &Rc<Slot>| match slot.player() {
            Some(p) => p.id().to_string(),
            None => "[Empty]".to_string(),
        };
        write!(f, "{} vs. {}", name(&self.slot1), name(&self.slot2))?;

        if let Some(score) = self.score.borrow().as_ref() {
            let p1 = score.points1();
            let p2 = score.points2();
            write!(f, "\t")?;
            for i in 0..p1.len() {
                write!(f, "{} - {} ", p1[i], p2[i])?;
            }
        }
        Ok(())
    }
}

/// Returns true if one or more of the given matches have started.
pub fn matches_started<'a>(matches: impl IntoIterator<Item = &'a Rc<Match>>) -> bool {
    matches.into_iter().any(|m| m.has_started())
}

/// A list of matches that can be played in parallel.
///
/// The matches of a round depend on the completion of all previous
/// rounds. Combined rounds (group-phase rounds spanning all groups,
/// double-elimination winner+minor rounds, consolation super-rounds)
/// carry the rounds they are composed of in `nested_rounds`.
#[derive(Clone, Default)]
pub struct Round {
    pub matches: Vec<Rc<Match>>,
    pub nested_rounds: Vec<Round>,
}

impl Round {
    pub fn new(matches: Vec<Rc<Match>>) -> Round {
        Round {
            matches,
            nested_rounds: Vec::new(),
        }
    }
}

/// All matches of a tournament, flat and grouped into rounds.
pub struct MatchList {
    pub matches: Vec<Rc<Match>>,
    pub rounds: Vec<Round>,
}

impl MatchList {
    pub fn new(matches: Vec<Rc<Match>>, rounds: Vec<Round>) -> Rc<MatchList> {
        Rc::new(MatchList { matches, rounds })
    }

    /// The matches the player is part of, excluding drawn-bye matches.
    pub fn matches_of_player(&self, player: &PlayerRef) -> Vec<Rc<Match>> {
        self.matches
            .iter()
            .filter(|m| !m.has_drawn_bye() && m.contains_player(player))
            .cloned()
            .collect()
    }

    /// Returns true when every match is complete, where byes and
    /// walkovers count as complete.
    pub fn matches_complete(&self) -> bool {
        self.matches
            .iter()
            .all(|m| m.has_bye() || m.is_walkover() || m.score().is_some())
    }

    /// Returns true when any match has started.
    pub fn matches_started(&self) -> bool {
        matches_started(&self.matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::Player;
    use chrono::TimeZone;

    struct Named(&'static str);

    impl Player for Named {
        fn id(&self) -> &str {
            self.0
        }
    }

    fn player(id: &'static str) -> PlayerRef {
        PlayerRef::new(Rc::new(Named(id)))
    }

    struct OneSet(i32, i32);

    impl Score for OneSet {
        fn points1(&self) -> &[i32] {
            std::slice::from_ref(&self.0)
        }
        fn points2(&self) -> &[i32] {
            std::slice::from_ref(&self.1)
        }
        fn winner(&self) -> Result<usize, crate::score::Undetermined> {
            match self.0.cmp(&self.1) {
                std::cmp::Ordering::Greater => Ok(0),
                std::cmp::Ordering::Less => Ok(1),
                std::cmp::Ordering::Equal => Err(crate::score::Undetermined),
            }
        }
        fn invert(&self) -> Rc<dyn Score> {
            Rc::new(OneSet(self.1, self.0))
        }
    }

    struct TestClock;

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_opt(1_000, 0).unwrap()
        }
    }

    #[test]
    fn test_both_bye_errors() {
        let m = Match::new(Slot::with_bye(true), Slot::with_bye(true));
        assert_eq!(m.winner().unwrap_err(), MatchError::BothBye);
    }

    #[test]
    fn test_single_bye_gives_the_opponent_the_win() {
        let a = Slot::with_player(player("a"));
        let m = Match::new(a.clone(), Slot::with_bye(true));
        assert!(Rc::ptr_eq(&m.winner().unwrap(), &a));

        let b = Slot::with_player(player("b"));
        let m = Match::new(Slot::with_bye(false), b.clone());
        assert!(Rc::ptr_eq(&m.winner().unwrap(), &b));
    }

    #[test]
    fn test_walkover_resolution() {
        let m = Match::new(Slot::with_player(player("a")), Slot::with_player(player("b")));
        m.add_withdrawn_player(&player("a"));
        assert!(Rc::ptr_eq(&m.winner().unwrap(), m.slot2()));
        assert!(m.is_walkover());

        m.add_withdrawn_player(&player("b"));
        assert_eq!(m.winner().unwrap_err(), MatchError::BothWalkover);
    }

    #[test]
    fn test_walkover_against_bye_errors() {
        let m = Match::new(Slot::with_player(player("a")), Slot::with_bye(true));
        m.add_withdrawn_player(&player("a"));
        assert_eq!(m.winner().unwrap_err(), MatchError::ByeAndWalkover);
    }

    #[test]
    fn test_score_decides() {
        let m = Match::new(Slot::with_player(player("a")), Slot::with_player(player("b")));
        assert_eq!(m.winner().unwrap_err(), MatchError::NoScore);

        m.set_score(Some(Rc::new(OneSet(1, 1))));
        assert_eq!(m.winner().unwrap_err(), MatchError::EqualScore);

        m.set_score(Some(Rc::new(OneSet(0, 1))));
        assert!(Rc::ptr_eq(&m.winner().unwrap(), m.slot2()));
    }

    #[test]
    fn test_lifecycle_ordering() {
        let clock = TestClock;
        let m = Match::new(Slot::with_player(player("a")), Slot::with_player(player("b")));
        let score: Rc<dyn Score> = Rc::new(OneSet(1, 0));

        assert_eq!(m.end(score.clone(), &clock).unwrap_err(), MatchError::NotStarted);
        m.start(&clock).unwrap();
        assert_eq!(m.start(&clock).unwrap_err(), MatchError::AlreadyStarted);
        m.end(score.clone(), &clock).unwrap();
        assert_eq!(m.end(score, &clock).unwrap_err(), MatchError::AlreadyEnded);
        assert!(m.start_time().is_some() && m.end_time().is_some());
    }
}
