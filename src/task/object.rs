use std::fmt;

use crate::minigrid::{
    describe::ObjectDescription, Color, DoorState, MiniGridEnv, ObjectKind, Pos,
};

use super::Task;

/// "the red key", "the key", "the object"
struct Noun<'a>(&'a ObjectDescription);

impl fmt::Display for Noun<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the ")?;
        if let Some(color) = self.0.color {
            write!(f, "{color} ")?;
        }
        match self.0.kind {
            Some(kind) => write!(f, "{kind}"),
            None => write!(f, "object"),
        }
    }
}

/// Stand directly in front of a matching object
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoToObjectTask {
    pub desc: ObjectDescription,
}

impl GoToObjectTask {
    pub fn new(desc: ObjectDescription) -> Self {
        Self { desc }
    }
}

impl fmt::Display for GoToObjectTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "go to {}", Noun(&self.desc))
    }
}

impl Task for GoToObjectTask {
    fn check_success(&self, env: &MiniGridEnv) -> bool {
        env.front_obj().is_some_and(|obj| self.desc.matches(obj))
    }
}

/// Carry a matching object
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickUpObjectTask {
    pub desc: ObjectDescription,
}

impl PickUpObjectTask {
    pub fn new(desc: ObjectDescription) -> Self {
        Self { desc }
    }
}

impl fmt::Display for PickUpObjectTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pick up {}", Noun(&self.desc))
    }
}

impl Task for PickUpObjectTask {
    fn check_success(&self, env: &MiniGridEnv) -> bool {
        env.carrying().is_some_and(|obj| self.desc.matches(obj))
    }
}

/// Any matching door on the grid is open
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenDoorTask {
    pub desc: ObjectDescription,
}

impl OpenDoorTask {
    pub fn new(desc: ObjectDescription) -> Self {
        Self { desc }
    }
}

impl fmt::Display for OpenDoorTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "open {}", Noun(&self.desc))
    }
}

impl Task for OpenDoorTask {
    fn check_success(&self, env: &MiniGridEnv) -> bool {
        env.grid()
            .objects()
            .any(|(_, obj)| obj.door_state() == Some(DoorState::Open) && self.desc.matches(obj))
    }
}

/// The agent holds an object of exactly this type and color
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentIsHoldingObjTask {
    pub kind: ObjectKind,
    pub color: Color,
}

impl AgentIsHoldingObjTask {
    pub fn new(kind: ObjectKind, color: Color) -> Self {
        Self { kind, color }
    }
}

impl fmt::Display for AgentIsHoldingObjTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent is holding {} {}", self.color, self.kind)
    }
}

impl Task for AgentIsHoldingObjTask {
    fn check_success(&self, env: &MiniGridEnv) -> bool {
        env.carrying()
            .is_some_and(|obj| obj.kind() == self.kind && obj.color() == self.color)
    }
}

/// At least `num` matching objects are in the agent's field of view
///
/// With a `position`, only an object at that grid position counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSeesObjTask {
    pub num: usize,
    pub kind: ObjectKind,
    pub color: Color,
    pub position: Option<Pos>,
}

impl AgentSeesObjTask {
    pub fn new(num: usize, kind: ObjectKind, color: Color) -> Self {
        Self {
            num,
            kind,
            color,
            position: None,
        }
    }

    pub fn at(mut self, position: Pos) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Display for AgentSeesObjTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent sees {} {} {}", self.num, self.color, self.kind)?;
        if let Some((x, y)) = self.position {
            write!(f, " at ({x}, {y})")?;
        }
        Ok(())
    }
}

impl Task for AgentSeesObjTask {
    fn check_success(&self, env: &MiniGridEnv) -> bool {
        let seen = env
            .visible_objects()
            .into_iter()
            .filter(|(pos, obj)| {
                obj.kind() == self.kind
                    && obj.color() == self.color
                    && self.position.map_or(true, |p| p == *pos)
            })
            .count();
        seen >= self.num
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        env::Environment,
        error::Result,
        minigrid::{Action, Direction, Level, MiniGridConfig, World, WorldObj},
    };

    use super::*;

    /// 6x6 room: agent at (1,1) facing right at a blue ball, a yellow door in the east wall
    struct Room;

    impl Level for Room {
        fn id(&self) -> &'static str {
            "Test-Room"
        }

        fn default_max_steps(&self) -> usize {
            50
        }

        fn generate(&mut self, world: &mut World) -> Result<String> {
            world.clear(6, 6);
            world.grid.wall_rect(0, 0, 6, 6);
            world.grid.set(2, 1, Some(WorldObj::Ball(Color::Blue)));
            world.grid.set(5, 3, Some(WorldObj::door(Color::Yellow, false)));
            world.agent_pos = (1, 1);
            world.agent_dir = Direction::Right;
            Ok(String::from("test"))
        }
    }

    fn room() -> MiniGridEnv {
        let mut env = MiniGridEnv::new(Room, MiniGridConfig::default());
        env.reset();
        env
    }

    #[test]
    fn go_to_and_pick_up() {
        let mut env = room();
        let ball = ObjectDescription::of_kind(ObjectKind::Ball);
        let go_to = GoToObjectTask::new(ball);
        let pick_up = PickUpObjectTask::new(ball);

        assert!(go_to.check_success(&env), "Ball is in front");
        assert!(!pick_up.check_success(&env));
        let red_ball = ObjectDescription::new(ObjectKind::Ball, Color::Red);
        assert!(!GoToObjectTask::new(red_ball).check_success(&env));

        env.step(Action::Pickup);
        assert!(pick_up.check_success(&env), "Ball is carried");
        assert!(!go_to.check_success(&env), "Nothing in front any more");
        assert!(AgentIsHoldingObjTask::new(ObjectKind::Ball, Color::Blue).check_success(&env));
    }

    #[test]
    fn open_door() {
        let mut env = room();
        let task = OpenDoorTask::new(ObjectDescription::of_kind(ObjectKind::Door));
        assert!(!task.check_success(&env));

        env.step(Action::Pickup);
        env.step(Action::Forward);
        env.step(Action::Forward);
        env.step(Action::Forward);
        env.step(Action::Right);
        env.step(Action::Forward);
        env.step(Action::Forward);
        env.step(Action::Left);
        assert_eq!(env.agent_pos(), (4, 3));
        env.step(Action::Toggle);
        assert!(task.check_success(&env), "Door opened");
    }

    #[test]
    fn sees_objects() {
        let env = room();
        let blue_ball = |num| AgentSeesObjTask::new(num, ObjectKind::Ball, Color::Blue);
        assert!(blue_ball(1).check_success(&env));
        assert!(blue_ball(1).at((2, 1)).check_success(&env));
        assert!(!blue_ball(1).at((3, 1)).check_success(&env));
        assert!(!blue_ball(2).check_success(&env));
    }

    #[test]
    fn descriptions() {
        let key = ObjectDescription::of_kind(ObjectKind::Key);
        assert_eq!(GoToObjectTask::new(key).to_string(), "go to the key");
        let purple_box = ObjectDescription::new(ObjectKind::Box, Color::Purple);
        assert_eq!(PickUpObjectTask::new(purple_box).to_string(), "pick up the purple box");
        assert_eq!(OpenDoorTask::new(ObjectDescription::default()).to_string(), "open the object");
        assert_eq!(
            AgentSeesObjTask::new(2, ObjectKind::Key, Color::Red).at((1, 4)).to_string(),
            "Agent sees 2 red key at (1, 4)"
        );
        assert_eq!(
            AgentIsHoldingObjTask::new(ObjectKind::Key, Color::Red).to_string(),
            "Agent is holding red key"
        );
    }
}
