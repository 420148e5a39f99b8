use strum::{Display, EnumString, FromRepr, IntoStaticStr, VariantArray};

/// Object types as they appear in encoded observations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[derive(Display, EnumString, VariantArray, FromRepr, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum ObjectKind {
    Unseen = 0,
    Empty = 1,
    Wall = 2,
    Floor = 3,
    Door = 4,
    Key = 5,
    Ball = 6,
    Box = 7,
    Goal = 8,
    Lava = 9,
    Agent = 10,
}

impl ObjectKind {
    /// Single-letter code used by the textual map
    pub fn symbol(&self) -> char {
        match self {
            ObjectKind::Wall => 'W',
            ObjectKind::Floor => 'F',
            ObjectKind::Door => 'D',
            ObjectKind::Key => 'K',
            ObjectKind::Ball => 'A',
            ObjectKind::Box => 'B',
            ObjectKind::Goal => 'G',
            ObjectKind::Lava => 'V',
            ObjectKind::Unseen | ObjectKind::Empty | ObjectKind::Agent => ' ',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[derive(Display, EnumString, VariantArray, FromRepr, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    Red = 0,
    Green = 1,
    Blue = 2,
    Purple = 3,
    Yellow = 4,
    Grey = 5,
}

impl Color {
    /// Uppercase first letter, as used by the textual map
    pub fn initial(&self) -> char {
        let name: &'static str = self.into();
        name.chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or(' ')
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, FromRepr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum DoorState {
    Open = 0,
    Closed = 1,
    Locked = 2,
}

/// Direction the agent faces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, VariantArray, FromRepr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Direction {
    Right = 0,
    Down = 1,
    Left = 2,
    Up = 3,
}

impl Direction {
    /// Unit vector pointing in this direction, `y` growing downwards
    pub fn vec(&self) -> (isize, isize) {
        match self {
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
        }
    }

    pub fn turn_left(&self) -> Self {
        Self::from_repr((*self as u8 + 3) % 4).expect("direction index is in 0..4")
    }

    pub fn turn_right(&self) -> Self {
        Self::from_repr((*self as u8 + 1) % 4).expect("direction index is in 0..4")
    }

    /// Arrow used for the agent in the textual map
    pub fn symbol(&self) -> char {
        match self {
            Direction::Right => '>',
            Direction::Down => 'V',
            Direction::Left => '<',
            Direction::Up => '^',
        }
    }
}

/// Actions available to the agent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, VariantArray, FromRepr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Action {
    /// Turn left
    Left = 0,
    /// Turn right
    Right = 1,
    /// Move forward
    Forward = 2,
    /// Pick up an object
    Pickup = 3,
    /// Drop an object
    Drop = 4,
    /// Toggle/activate an object
    Toggle = 5,
    /// Done completing task
    Done = 6,
}
