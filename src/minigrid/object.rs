use std::fmt;

use super::constants::{Color, DoorState, ObjectKind};

/// An object occupying a grid cell
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorldObj {
    Wall(Color),
    Floor(Color),
    Door {
        color: Color,
        is_open: bool,
        is_locked: bool,
    },
    Key(Color),
    Ball(Color),
    Box {
        color: Color,
        contains: Option<std::boxed::Box<WorldObj>>,
    },
    Goal,
    Lava,
}

impl WorldObj {
    pub fn wall() -> Self {
        WorldObj::Wall(Color::Grey)
    }

    /// A closed door, optionally locked
    pub fn door(color: Color, locked: bool) -> Self {
        WorldObj::Door {
            color,
            is_open: false,
            is_locked: locked,
        }
    }

    pub fn empty_box(color: Color) -> Self {
        WorldObj::Box {
            color,
            contains: None,
        }
    }

    /// Build a pickable object of the given kind
    ///
    /// **Returns** `None` for kinds that are not keys, balls or boxes
    pub fn pickable(kind: ObjectKind, color: Color) -> Option<Self> {
        match kind {
            ObjectKind::Key => Some(WorldObj::Key(color)),
            ObjectKind::Ball => Some(WorldObj::Ball(color)),
            ObjectKind::Box => Some(WorldObj::empty_box(color)),
            _ => None,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            WorldObj::Wall(_) => ObjectKind::Wall,
            WorldObj::Floor(_) => ObjectKind::Floor,
            WorldObj::Door { .. } => ObjectKind::Door,
            WorldObj::Key(_) => ObjectKind::Key,
            WorldObj::Ball(_) => ObjectKind::Ball,
            WorldObj::Box { .. } => ObjectKind::Box,
            WorldObj::Goal => ObjectKind::Goal,
            WorldObj::Lava => ObjectKind::Lava,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            WorldObj::Wall(c) | WorldObj::Floor(c) | WorldObj::Key(c) | WorldObj::Ball(c) => *c,
            WorldObj::Door { color, .. } | WorldObj::Box { color, .. } => *color,
            WorldObj::Goal => Color::Green,
            WorldObj::Lava => Color::Red,
        }
    }

    /// Can the agent walk onto this cell
    pub fn can_overlap(&self) -> bool {
        match self {
            WorldObj::Floor(_) | WorldObj::Goal | WorldObj::Lava => true,
            WorldObj::Door { is_open, .. } => *is_open,
            _ => false,
        }
    }

    pub fn can_pickup(&self) -> bool {
        matches!(self, WorldObj::Key(_) | WorldObj::Ball(_) | WorldObj::Box { .. })
    }

    /// Does light pass through this object
    pub fn see_behind(&self) -> bool {
        match self {
            WorldObj::Wall(_) => false,
            WorldObj::Door { is_open, .. } => *is_open,
            _ => true,
        }
    }

    pub fn door_state(&self) -> Option<DoorState> {
        match self {
            WorldObj::Door {
                is_open, is_locked, ..
            } => Some(if *is_open {
                DoorState::Open
            } else if *is_locked {
                DoorState::Locked
            } else {
                DoorState::Closed
            }),
            _ => None,
        }
    }

    /// Encode as `(kind, color, state)`
    pub fn encode(&self) -> [u8; 3] {
        let state = self.door_state().map_or(0, |s| s as u8);
        [self.kind() as u8, self.color() as u8, state]
    }
}

impl fmt::Display for WorldObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color(), self.kind())
    }
}
