//! Slots are the seats that participants occupy.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::ids::{next_id, NodeId};
use crate::placement::Placement;
use crate::ranking::Ranking;

/// A person or team taking part in a tournament.
pub trait Player {
    /// Returns an id that is unique among the players of a tournament.
    fn id(&self) -> &str;
}

/// A shared handle to a player, compared and hashed by player id.
#[derive(Clone)]
pub struct PlayerRef(Rc<dyn Player>);

impl PlayerRef {
    pub fn new(player: Rc<dyn Player>) -> Self {
        Self(player)
    }

    pub fn id(&self) -> &str {
        self.0.id()
    }
}

impl PartialEq for PlayerRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id() == other.0.id()
    }
}

impl Eq for PlayerRef {}

impl Hash for PlayerRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id().hash(state);
    }
}

impl fmt::Debug for PlayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player({})", self.0.id())
    }
}

/// A free win for the opposing slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bye {
    /// True when the bye was inserted by the draw, false when it stands
    /// in for a withdrawn player.
    pub drawn: bool,
}

/// A Slot is either a spot in a ranking or one of the two places in a
/// match.
///
/// A slot represents one of three things:
///  - an actual player
///  - a not yet determined qualification, expressed as a [`Placement`]
///    into another ranking (e.g. the slots of a final hold the winners
///    of the semi-finals)
///  - a free win ([`Bye`]) for the opponent
///
/// What a slot currently stands for follows the state of the
/// tournament: when the semi-final results become known the final's
/// slots go from undetermined qualifications to actual players.
pub struct Slot {
    id: NodeId,
    kind: SlotKind,
}

enum SlotKind {
    Player(PlayerRef),
    Placement {
        placement: Rc<Placement>,
        current: RefCell<Option<PlayerRef>>,
    },
    Bye(Bye),
}

impl Slot {
    /// Creates a slot that is directly occupied by a player.
    pub fn with_player(player: PlayerRef) -> Rc<Slot> {
        Rc::new(Slot {
            id: next_id(),
            kind: SlotKind::Player(player),
        })
    }

    /// Creates a slot that resolves its occupant through a placement.
    ///
    /// The slot registers itself as a dependent of the placement's
    /// ranking so it is refreshed whenever that ranking recomputes.
    pub fn with_placement(placement: Rc<Placement>) -> Rc<Slot> {
        let slot = Rc::new(Slot {
            id: next_id(),
            kind: SlotKind::Placement {
                placement: placement.clone(),
                current: RefCell::new(None),
            },
        });
        placement.ranking().add_dependent_slot(&slot);
        slot
    }

    /// Creates a bye slot.
    pub fn with_bye(drawn: bool) -> Rc<Slot> {
        Rc::new(Slot {
            id: next_id(),
            kind: SlotKind::Bye(Bye { drawn }),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The player currently occupying this slot, if any.
    pub fn player(&self) -> Option<PlayerRef> {
        match &self.kind {
            SlotKind::Player(p) => Some(p.clone()),
            SlotKind::Placement { current, .. } => current.borrow().clone(),
            SlotKind::Bye(_) => None,
        }
    }

    pub fn placement(&self) -> Option<&Rc<Placement>> {
        match &self.kind {
            SlotKind::Placement { placement, .. } => Some(placement),
            _ => None,
        }
    }

    pub fn bye(&self) -> Option<Bye> {
        match &self.kind {
            SlotKind::Bye(bye) => Some(*bye),
            _ => None,
        }
    }

    /// Returns whether this slot is an effective bye.
    ///
    /// Effective means the check follows placements: a placement slot
    /// whose resolved slot is a bye is itself a bye.
    pub fn is_bye(&self) -> bool {
        match &self.kind {
            SlotKind::Bye(_) => true,
            SlotKind::Placement { placement, .. } => {
                placement.slot().is_some_and(|s| s.is_bye())
            }
            SlotKind::Player(_) => false,
        }
    }

    /// Refreshes the cached occupant from the placement.
    ///
    /// Called for each dependent slot of a ranking after that ranking
    /// recomputed. Player and bye slots do not change.
    pub fn update(&self) {
        if let SlotKind::Placement { placement, current } = &self.kind {
            *current.borrow_mut() = placement.slot().and_then(|s| s.player());
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SlotKind::Player(p) => write!(f, "Slot#{}({})", self.id, p.id()),
            SlotKind::Placement { current, .. } => match &*current.borrow() {
                Some(p) => write!(f, "Slot#{}({})", self.id, p.id()),
                None => write!(f, "Slot#{}(?)", self.id),
            },
            SlotKind::Bye(bye) => {
                write!(f, "Slot#{}({})", self.id, if bye.drawn { "bye" } else { "wo-bye" })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Player for Named {
        fn id(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_player_ref_compares_by_id() {
        let a = PlayerRef::new(Rc::new(Named("a")));
        let a2 = PlayerRef::new(Rc::new(Named("a")));
        let b = PlayerRef::new(Rc::new(Named("b")));
        assert_eq!(a, a2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_player_slot() {
        let p = PlayerRef::new(Rc::new(Named("a")));
        let slot = Slot::with_player(p.clone());
        assert_eq!(slot.player(), Some(p));
        assert!(!slot.is_bye());
        assert!(slot.bye().is_none());
    }

    #[test]
    fn test_bye_slot() {
        let drawn = Slot::with_bye(true);
        let withdrawn = Slot::with_bye(false);
        assert!(drawn.is_bye() && withdrawn.is_bye());
        assert!(drawn.bye().unwrap().drawn);
        assert!(!withdrawn.bye().unwrap().drawn);
        assert!(drawn.player().is_none());
    }
}
