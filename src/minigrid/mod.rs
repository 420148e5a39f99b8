pub mod constants;
pub mod describe;
pub mod env;
pub mod grid;
pub mod levels;
pub mod object;
pub mod wrappers;

pub use constants::{Action, Color, Direction, DoorState, ObjectKind};
pub use env::{Level, MiniGridConfig, MiniGridEnv, Observation, Unwrapped, World};
pub use grid::{Grid, Image, Pos};
pub use levels::{Empty, RoomGrid, Unlock, UnlockPickup};
pub use object::WorldObj;
pub use wrappers::ReseedWrapper;
