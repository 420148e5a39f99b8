use std::fmt;

use dyn_clone::DynClone;

use crate::minigrid::MiniGridEnv;

mod logic;
mod object;

pub use logic::{AndTask, InverseTask, OrTask};
pub use object::{
    AgentIsHoldingObjTask, AgentSeesObjTask, GoToObjectTask, OpenDoorTask, PickUpObjectTask,
};

/// A sub-goal the agent can accomplish in a grid world
///
/// The `Display` form is the natural-language description handed to the agent as its mission.
pub trait Task: fmt::Display + DynClone {
    /// Whether the environment's current state satisfies the task
    fn check_success(&self, env: &MiniGridEnv) -> bool;
}

dyn_clone::clone_trait_object!(Task);

impl fmt::Debug for dyn Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({self})")
    }
}
