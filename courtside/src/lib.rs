//! # Courtside
//!
//! A tournament draw engine: given a set of entries and mode settings
//! it produces the complete schedule of rounds and matches, propagates
//! every reported result through the dependent contests (winners
//! advance, losers drop into loser brackets or consolation ladders)
//! and maintains live rankings, from entry seeding over per-group
//! standings up to the final placement.
//!
//! ## Architecture
//!
//! The engine is built around two directed acyclic graphs that are
//! wired once at construction:
//!
//! - the **ranking graph** connects every ranking to the rankings that
//!   read from it; reporting a result triggers a breadth-first update
//!   along its edges
//! - the **elimination graph** connects every match to the matches its
//!   winner and loser proceed to; it powers the editing and withdrawal
//!   policies
//!
//! Participants sit in [`slot::Slot`]s, which either hold a player
//! directly, resolve one through a [`placement::Placement`] into
//! another ranking, or stand for a free win (bye).
//!
//! ## Modes
//!
//! - [`tournament::SingleElimination`]
//! - [`tournament::DoubleElimination`]
//! - [`tournament::RoundRobin`]
//! - [`tournament::GroupPhase`]
//! - [`tournament::GroupKnockout`]
//! - [`tournament::SingleEliminationWithConsolation`]
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use courtside::{Player, PlayerRef, RankingNode, SingleElimination};
//!
//! struct Entrant(String);
//!
//! impl Player for Entrant {
//!     fn id(&self) -> &str {
//!         &self.0
//!     }
//! }
//!
//! let players: Vec<PlayerRef> = ["ana", "ben", "cho", "dee"]
//!     .iter()
//!     .map(|name| PlayerRef::new(Rc::new(Entrant(name.to_string()))))
//!     .collect();
//!
//! let entries = RankingNode::constant(&players);
//! let tournament = SingleElimination::new(entries).unwrap();
//!
//! // Seeded draw: the top seed opens against the lowest seed.
//! let first = &tournament.matches()[0];
//! assert_eq!(first.slot1().player().unwrap().id(), "ana");
//! assert_eq!(first.slot2().player().unwrap().id(), "dee");
//! ```
//!
//! Scores themselves are external: the engine only consumes the
//! [`score::Score`] contract. The `cs_badminton` crate provides a
//! badminton score validator implementing it.

pub mod clock;
pub mod graph;
pub mod ids;
pub mod matches;
pub mod metrics;
pub mod placement;
pub mod ranking;
pub mod score;
pub mod seeding;
pub mod serialize;
pub mod slot;
pub mod tournament;

pub use clock::{Clock, SystemClock};
pub use ids::NodeId;
pub use matches::{Match, MatchError, MatchList, Round};
pub use metrics::MatchMetrics;
pub use placement::Placement;
pub use ranking::{Ranking, RankingNode};
pub use score::{Location, Score, Undetermined};
pub use seeding::{arrange_seeds, seeded_shuffle, SeedingMode};
pub use slot::{Bye, Player, PlayerRef, Slot};
pub use tournament::{
    DoubleElimination, EditingPolicy, GroupKnockout, GroupPhase, KnockoutMode, KnockoutPhase,
    RoundRobin, SingleElimination, SingleEliminationWithConsolation, TournamentCore,
    TournamentError, WithdrawalPolicy,
};
