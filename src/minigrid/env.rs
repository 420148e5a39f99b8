use std::{cell::RefCell, fmt};

use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use strum::VariantArray;

use crate::{
    env::{DiscreteActionSpace, Environment, Report},
    error::{Error, Result},
};

use super::{
    constants::{Action, Color, Direction, ObjectKind},
    grid::{Grid, Image, Pos},
    object::WorldObj,
};

/// Marks the agent as not yet placed while a level is being generated
const UNPLACED: Pos = (usize::MAX, usize::MAX);

/// Configuration for a [`MiniGridEnv`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiniGridConfig {
    /// Side length of the square agent view, must be odd and at least 3
    pub agent_view_size: usize,
    /// Step limit per episode, the level's default when `None`
    pub max_steps: Option<usize>,
    pub see_through_walls: bool,
    pub seed: Option<u64>,
}

impl Default for MiniGridConfig {
    fn default() -> Self {
        Self {
            agent_view_size: 7,
            max_steps: None,
            see_through_walls: false,
            seed: None,
        }
    }
}

/// Observation returned by every step
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Partially observable view, the agent at the bottom centre facing up
    pub image: Image,
    pub direction: Direction,
    pub mission: String,
}

/// Mutable simulation state levels generate into
pub struct World {
    pub grid: Grid,
    pub agent_pos: Pos,
    pub agent_dir: Direction,
    pub carrying: Option<WorldObj>,
    rng: StdRng,
}

impl World {
    fn new(rng: StdRng) -> Self {
        Self {
            grid: Grid::new(3, 3),
            agent_pos: UNPLACED,
            agent_dir: Direction::Right,
            carrying: None,
            rng,
        }
    }

    /// Start generation over on an empty grid
    pub fn clear(&mut self, width: usize, height: usize) {
        self.grid = Grid::new(width, height);
        self.agent_pos = UNPLACED;
        self.agent_dir = Direction::Right;
        self.carrying = None;
    }

    /// Random integer in `[low, high)`
    pub fn rand_int(&mut self, low: usize, high: usize) -> usize {
        self.rng.gen_range(low..high)
    }

    pub fn rand_color(&mut self) -> Color {
        *Color::VARIANTS
            .choose(&mut self.rng)
            .expect("color list is not empty")
    }

    pub fn rand_dir(&mut self) -> Direction {
        *Direction::VARIANTS
            .choose(&mut self.rng)
            .expect("direction list is not empty")
    }

    pub fn rand_elem<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        items.choose(&mut self.rng).copied()
    }

    /// Place `obj` on a random empty cell inside the rectangle at `top` of `size`
    ///
    /// With `obj = None` only a free position is chosen.
    pub fn place_obj(
        &mut self,
        obj: Option<WorldObj>,
        top: Pos,
        size: (usize, usize),
    ) -> Result<Pos> {
        let x_end = (top.0 + size.0).min(self.grid.width());
        let y_end = (top.1 + size.1).min(self.grid.height());
        let vacant = (top.1..y_end)
            .flat_map(|y| (top.0..x_end).map(move |x| (x, y)))
            .filter(|&(x, y)| self.grid.get(x, y).is_none() && (x, y) != self.agent_pos)
            .collect::<Vec<_>>();

        let label = obj.as_ref().map_or_else(|| String::from("agent"), |o| o.to_string());
        let pos = *vacant
            .choose(&mut self.rng)
            .ok_or(Error::Placement(label))?;

        if obj.is_some() {
            self.grid.set(pos.0, pos.1, obj);
        }
        Ok(pos)
    }

    /// Place the agent on a random empty cell inside the rectangle
    pub fn place_agent(&mut self, top: Pos, size: (usize, usize), rand_dir: bool) -> Result<Pos> {
        self.agent_pos = UNPLACED;
        let pos = self.place_obj(None, top, size)?;
        self.agent_pos = pos;
        if rand_dir {
            self.agent_dir = self.rand_dir();
        }
        Ok(pos)
    }

    /// Position of the cell directly in front of the agent, if it lies on the grid
    pub fn front_pos(&self) -> Option<Pos> {
        let (dx, dy) = self.agent_dir.vec();
        let x = self.agent_pos.0.checked_add_signed(dx)?;
        let y = self.agent_pos.1.checked_add_signed(dy)?;
        self.grid.in_bounds(x, y).then_some((x, y))
    }

    fn toggle(&mut self, pos: Pos) {
        let key_color = match &self.carrying {
            Some(WorldObj::Key(c)) => Some(*c),
            _ => None,
        };

        match self.grid.get(pos.0, pos.1).map(WorldObj::kind) {
            Some(ObjectKind::Door) => {
                if let Some(WorldObj::Door {
                    color,
                    is_open,
                    is_locked,
                }) = self.grid.get_mut(pos.0, pos.1)
                {
                    if *is_locked {
                        if key_color == Some(*color) {
                            *is_locked = false;
                            *is_open = true;
                        }
                    } else {
                        *is_open = !*is_open;
                    }
                }
            }
            Some(ObjectKind::Box) => {
                if let Some(WorldObj::Box { contains, .. }) = self.grid.take(pos.0, pos.1) {
                    self.grid.set(pos.0, pos.1, contains.map(|b| *b));
                }
            }
            _ => {}
        }
    }
}

/// A level lays out the grid and mission, and decides when the mission succeeds
pub trait Level {
    /// Registered environment id
    fn id(&self) -> &'static str;

    fn default_max_steps(&self) -> usize;

    /// Generate a fresh layout into `world`
    ///
    /// **Returns** the mission string
    fn generate(&mut self, world: &mut World) -> Result<String>;

    /// Whether the mission was accomplished by `action`, checked after the dynamics ran
    fn is_success(&self, _env: &MiniGridEnv, _action: Action) -> bool {
        false
    }
}

/// A minimalistic grid world in which an agent navigates rooms, doors, keys, balls and boxes
pub struct MiniGridEnv {
    world: World,
    level: Box<dyn Level>,
    mission: String,
    step_count: usize,
    max_steps: usize,
    agent_view_size: usize,
    see_through_walls: bool,
    action_rng: RefCell<StdRng>,
    pub report: Report,
}

impl MiniGridEnv {
    /// Create an environment for `level`
    ///
    /// The grid is empty until the first reset.
    ///
    /// **Panics** if the agent view size is even or smaller than 3
    pub fn new(level: impl Level + 'static, config: MiniGridConfig) -> Self {
        assert!(
            config.agent_view_size % 2 == 1 && config.agent_view_size >= 3,
            "agent view size must be odd and at least 3"
        );
        let make_rng = || match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let max_steps = config.max_steps.unwrap_or_else(|| level.default_max_steps());
        Self {
            world: World::new(make_rng()),
            level: Box::new(level),
            mission: String::new(),
            step_count: 0,
            max_steps,
            agent_view_size: config.agent_view_size,
            see_through_walls: config.see_through_walls,
            action_rng: RefCell::new(make_rng()),
            report: Report::new(vec!["reward", "steps"]),
        }
    }

    /// Reseed the layout generator; takes effect on the next reset
    pub fn seed(&mut self, seed: u64) {
        self.world.rng = StdRng::seed_from_u64(seed);
    }

    /// Generate a new layout and return the first observation
    pub fn try_reset(&mut self) -> Result<Observation> {
        self.mission = self.level.generate(&mut self.world)?;
        self.step_count = 0;
        debug!(
            "generated {} ({}x{}), mission: {}",
            self.level.id(),
            self.world.grid.width(),
            self.world.grid.height(),
            self.mission
        );
        Ok(self.gen_obs())
    }

    pub fn id(&self) -> &'static str {
        self.level.id()
    }

    pub fn grid(&self) -> &Grid {
        &self.world.grid
    }

    pub fn width(&self) -> usize {
        self.world.grid.width()
    }

    pub fn height(&self) -> usize {
        self.world.grid.height()
    }

    pub fn agent_pos(&self) -> Pos {
        self.world.agent_pos
    }

    pub fn agent_dir(&self) -> Direction {
        self.world.agent_dir
    }

    pub fn carrying(&self) -> Option<&WorldObj> {
        self.world.carrying.as_ref()
    }

    pub fn front_pos(&self) -> Option<Pos> {
        self.world.front_pos()
    }

    /// The object directly in front of the agent
    pub fn front_obj(&self) -> Option<&WorldObj> {
        self.front_pos()
            .and_then(|(x, y)| self.world.grid.get(x, y))
    }

    pub fn mission(&self) -> &str {
        &self.mission
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn agent_view_size(&self) -> usize {
        self.agent_view_size
    }

    /// Reward granted on success, shrinking with the number of steps taken
    pub fn success_reward(&self) -> f32 {
        1.0 - 0.9 * (self.step_count as f32 / self.max_steps as f32)
    }

    /// Top-left corner of the agent's view in grid coordinates
    fn view_exts(&self) -> (isize, isize) {
        let (ax, ay) = (self.world.agent_pos.0 as isize, self.world.agent_pos.1 as isize);
        let size = self.agent_view_size as isize;
        let half = size / 2;
        match self.world.agent_dir {
            Direction::Right => (ax, ay - half),
            Direction::Down => (ax - half, ay),
            Direction::Left => (ax - size + 1, ay - half),
            Direction::Up => (ax - half, ay - size + 1),
        }
    }

    /// Convert grid coordinates into the agent's view coordinates
    ///
    /// **Returns** `None` when the cell is outside the view square
    pub fn relative_coords(&self, x: usize, y: usize) -> Option<Pos> {
        let (ax, ay) = (self.world.agent_pos.0 as isize, self.world.agent_pos.1 as isize);
        let (dx, dy) = self.world.agent_dir.vec();
        let (rx, ry) = (-dy, dx);
        let size = self.agent_view_size as isize;
        let half = size / 2;

        let tx = ax + dx * (size - 1) - rx * half;
        let ty = ay + dy * (size - 1) - ry * half;
        let (lx, ly) = (x as isize - tx, y as isize - ty);

        let vx = rx * lx + ry * ly;
        let vy = -(dx * lx + dy * ly);

        ((0..size).contains(&vx) && (0..size).contains(&vy)).then_some((vx as usize, vy as usize))
    }

    /// The sub-grid the agent can see, rotated so the agent faces up, with its visibility mask
    pub fn gen_obs_grid(&self) -> (Grid, Vec<bool>) {
        let (top_x, top_y) = self.view_exts();
        let size = self.agent_view_size;
        let mut grid = self.world.grid.slice(top_x, top_y, size, size);

        for _ in 0..(self.world.agent_dir as u8 + 1) {
            grid = grid.rotate_left();
        }

        let agent_view_pos = (size / 2, size - 1);
        let vis_mask = if self.see_through_walls {
            vec![true; size * size]
        } else {
            grid.process_vis(agent_view_pos)
        };

        grid.set(agent_view_pos.0, agent_view_pos.1, self.world.carrying.clone());

        (grid, vis_mask)
    }

    pub fn gen_obs(&self) -> Observation {
        let (grid, vis_mask) = self.gen_obs_grid();
        Observation {
            image: grid.encode(Some(&vis_mask)),
            direction: self.world.agent_dir,
            mission: self.mission.clone(),
        }
    }

    /// Encode the whole grid, the agent cell marked with the agent's direction
    pub fn full_observation(&self) -> Image {
        let mut image = self.world.grid.encode(None);
        let (x, y) = self.world.agent_pos;
        image.set(x, y, [ObjectKind::Agent as u8, Color::Red as u8, self.world.agent_dir as u8]);
        image
    }

    /// Objects the agent can currently see, with their grid positions
    pub fn visible_objects(&self) -> Vec<(Pos, &WorldObj)> {
        let (obs_grid, vis_mask) = self.gen_obs_grid();
        let size = self.agent_view_size;
        self.world
            .grid
            .objects()
            .filter(|&((x, y), obj)| match self.relative_coords(x, y) {
                Some((vx, vy)) => {
                    vis_mask[vy * size + vx]
                        && obs_grid.get(vx, vy).is_some_and(|seen| seen.kind() == obj.kind())
                }
                None => false,
            })
            .collect()
    }
}

impl Environment for MiniGridEnv {
    type State = Observation;
    type Action = Action;

    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32) {
        self.step_count += 1;
        self.report.entry("steps").and_modify(|x| *x += 1.0);

        let mut reward = 0.0;
        let mut terminated = false;
        let front = self.world.front_pos();

        match action {
            Action::Left => self.world.agent_dir = self.world.agent_dir.turn_left(),
            Action::Right => self.world.agent_dir = self.world.agent_dir.turn_right(),
            Action::Forward => {
                if let Some((x, y)) = front {
                    let cell = self.world.grid.get(x, y);
                    let kind = cell.map(WorldObj::kind);
                    if cell.map_or(true, WorldObj::can_overlap) {
                        self.world.agent_pos = (x, y);
                    }
                    match kind {
                        Some(ObjectKind::Goal) => {
                            terminated = true;
                            reward = self.success_reward();
                        }
                        Some(ObjectKind::Lava) => terminated = true,
                        _ => {}
                    }
                }
            }
            Action::Pickup => {
                if let Some((x, y)) = front {
                    let pickable = self.world.grid.get(x, y).is_some_and(WorldObj::can_pickup);
                    if pickable && self.world.carrying.is_none() {
                        self.world.carrying = self.world.grid.take(x, y);
                    }
                }
            }
            Action::Drop => {
                if let Some((x, y)) = front {
                    if self.world.grid.get(x, y).is_none() && self.world.carrying.is_some() {
                        let carried = self.world.carrying.take();
                        self.world.grid.set(x, y, carried);
                    }
                }
            }
            Action::Toggle => {
                if let Some(pos) = front {
                    self.world.toggle(pos);
                }
            }
            Action::Done => {}
        }

        if !terminated && self.level.is_success(self, action) {
            terminated = true;
            reward = self.success_reward();
        }

        let truncated = self.step_count >= self.max_steps;
        self.report.entry("reward").and_modify(|x| *x += reward as f64);

        if terminated || truncated {
            (None, reward)
        } else {
            (Some(self.gen_obs()), reward)
        }
    }

    fn reset(&mut self) -> Self::State {
        self.try_reset()
            .expect("level layouts always leave room for their objects")
    }

    fn random_action(&self) -> Self::Action {
        *Action::VARIANTS
            .choose(&mut *self.action_rng.borrow_mut())
            .expect("action list is not empty")
    }
}

impl DiscreteActionSpace for MiniGridEnv {
    fn actions(&self) -> Vec<Self::Action> {
        Action::VARIANTS.to_vec()
    }
}

/// Two characters per cell: object code and color initial, the agent as a doubled arrow
impl fmt::Display for MiniGridEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = &self.world.grid;
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                if (x, y) == self.world.agent_pos {
                    let arrow = self.world.agent_dir.symbol();
                    write!(f, "{arrow}{arrow}")?;
                    continue;
                }

                match grid.get(x, y) {
                    None => write!(f, "  ")?,
                    Some(WorldObj::Door {
                        color,
                        is_open,
                        is_locked,
                    }) => {
                        if *is_open {
                            write!(f, "__")?
                        } else if *is_locked {
                            write!(f, "L{}", color.initial())?
                        } else {
                            write!(f, "D{}", color.initial())?
                        }
                    }
                    Some(obj) => write!(f, "{}{}", obj.kind().symbol(), obj.color().initial())?,
                }
            }
            if y < grid.height() - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Access to the innermost [`MiniGridEnv`] through any stack of wrappers
pub trait Unwrapped {
    fn unwrapped(&self) -> &MiniGridEnv;
    fn unwrapped_mut(&mut self) -> &mut MiniGridEnv;
}

impl Unwrapped for MiniGridEnv {
    fn unwrapped(&self) -> &MiniGridEnv {
        self
    }

    fn unwrapped_mut(&mut self) -> &mut MiniGridEnv {
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::minigrid::constants::DoorState;

    use super::*;

    /// Hand-built 5x5 room with a key, a locked door and a box
    struct Fixture;

    impl Level for Fixture {
        fn id(&self) -> &'static str {
            "Test-Fixture"
        }

        fn default_max_steps(&self) -> usize {
            10
        }

        fn generate(&mut self, world: &mut World) -> Result<String> {
            world.clear(5, 5);
            world.grid.wall_rect(0, 0, 5, 5);
            world.grid.set(3, 1, Some(WorldObj::Key(Color::Yellow)));
            world.grid.set(4, 2, Some(WorldObj::door(Color::Yellow, true)));
            world.grid.set(1, 3, Some(WorldObj::Box {
                color: Color::Red,
                contains: Some(Box::new(WorldObj::Ball(Color::Blue))),
            }));
            world.agent_pos = (2, 1);
            world.agent_dir = Direction::Right;
            Ok(String::from("test mission"))
        }
    }

    /// Two rooms split by a full wall, with lava right in front of the agent
    struct Divided;

    impl Level for Divided {
        fn id(&self) -> &'static str {
            "Test-Divided"
        }

        fn default_max_steps(&self) -> usize {
            10
        }

        fn generate(&mut self, world: &mut World) -> Result<String> {
            world.clear(7, 7);
            world.grid.wall_rect(0, 0, 7, 7);
            world.grid.vert_wall(3, 0, 7);
            world.grid.set(2, 3, Some(WorldObj::Lava));
            world.grid.set(4, 3, Some(WorldObj::Ball(Color::Green)));
            world.agent_pos = (1, 3);
            world.agent_dir = Direction::Right;
            Ok(String::from("avoid the lava"))
        }
    }

    fn divided(see_through_walls: bool) -> MiniGridEnv {
        let config = MiniGridConfig {
            see_through_walls,
            ..Default::default()
        };
        let mut env = MiniGridEnv::new(Divided, config);
        env.reset();
        env
    }

    fn fixture() -> MiniGridEnv {
        let mut env = MiniGridEnv::new(Fixture, MiniGridConfig::default());
        env.reset();
        env
    }

    #[test]
    fn pickup_and_unlock() {
        let mut env = fixture();
        assert_eq!(env.front_obj(), Some(&WorldObj::Key(Color::Yellow)));

        env.step(Action::Pickup);
        assert_eq!(env.carrying(), Some(&WorldObj::Key(Color::Yellow)), "Key picked up");
        assert!(env.front_obj().is_none(), "Key removed from grid");

        env.step(Action::Forward);
        env.step(Action::Right);
        assert_eq!(env.agent_pos(), (3, 1));
        assert_eq!(env.agent_dir(), Direction::Down);

        env.step(Action::Left);
        env.step(Action::Forward);
        assert_eq!(env.agent_pos(), (3, 1), "Wall blocks movement");
    }

    #[test]
    fn locked_door_needs_matching_key() {
        let mut env = fixture();
        env.world.agent_pos = (3, 2);
        env.world.agent_dir = Direction::Right;

        env.step(Action::Toggle);
        assert_eq!(env.front_obj().and_then(WorldObj::door_state), Some(DoorState::Locked));

        env.world.carrying = Some(WorldObj::Key(Color::Yellow));
        env.step(Action::Toggle);
        assert_eq!(env.front_obj().and_then(WorldObj::door_state), Some(DoorState::Open));

        env.step(Action::Forward);
        assert_eq!(env.agent_pos(), (4, 2), "Open door can be walked through");
    }

    #[test]
    fn toggling_box_reveals_contents() {
        let mut env = fixture();
        env.world.agent_pos = (1, 2);
        env.world.agent_dir = Direction::Down;
        env.step(Action::Toggle);
        assert_eq!(env.front_obj(), Some(&WorldObj::Ball(Color::Blue)));
    }

    #[test]
    fn drop_places_carried_object() {
        let mut env = fixture();
        env.step(Action::Pickup);
        env.step(Action::Left);
        env.step(Action::Drop);
        assert!(env.carrying().is_some(), "Cannot drop onto a wall");
        assert_eq!(env.grid().get(2, 0), Some(&WorldObj::wall()));

        let mut env = fixture();
        env.step(Action::Pickup);
        env.step(Action::Drop);
        assert_eq!(env.front_obj(), Some(&WorldObj::Key(Color::Yellow)), "Dropped in front");
    }

    #[test]
    fn truncates_at_max_steps() {
        let mut env = fixture();
        for _ in 0..9 {
            assert!(env.step(Action::Done).0.is_some());
        }
        assert!(env.step(Action::Done).0.is_none(), "Tenth step truncates");
        assert_eq!(env.report["steps"], 10.0);
    }

    #[test]
    fn textual_map() {
        let env = fixture();
        let text = env.to_string();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "WGWGWGWGWG");
        assert_eq!(lines[1], "WG  >>KYWG");
        assert_eq!(lines[2], "WG      LY");
    }

    #[test]
    fn agent_view_is_rotated_upright() {
        let env = fixture();
        let obs = env.gen_obs();
        assert_eq!(obs.image.width(), 7);
        assert_eq!(obs.image.get(3, 6), [1, 0, 0], "Agent cell is empty when not carrying");
        assert_eq!(obs.image.get(3, 5), [5, 4, 0], "Key directly ahead");
        assert_eq!(env.relative_coords(3, 1), Some((3, 5)));
        assert_eq!(env.relative_coords(2, 0), Some((2, 6)));
        assert_eq!(env.relative_coords(0, 0), None, "Behind the agent");
    }

    #[test]
    fn sees_objects_in_view() {
        let env = fixture();
        let visible = env.visible_objects();
        assert!(visible.iter().any(|(pos, obj)| *pos == (3, 1) && obj.kind() == ObjectKind::Key));
        assert!(
            !visible.iter().any(|(_, obj)| obj.kind() == ObjectKind::Box),
            "Box is behind the agent"
        );
    }

    #[test]
    fn lava_ends_the_episode_without_reward() {
        let mut env = divided(false);
        let (next, reward) = env.step(Action::Forward);
        assert!(next.is_none(), "Lava terminates");
        assert_eq!(reward, 0.0);
        assert_eq!(env.agent_pos(), (2, 3));
        assert_eq!(env.report["reward"], 0.0);
    }

    #[test]
    fn walls_hide_objects_unless_seen_through() {
        let is_ball = |(_, obj): &(Pos, &WorldObj)| obj.kind() == ObjectKind::Ball;

        let env = divided(false);
        assert!(!env.visible_objects().iter().any(is_ball), "Ball is behind the wall");
        assert_eq!(env.gen_obs().image.get(3, 3), [0, 0, 0], "Hidden cells are unseen");

        let env = divided(true);
        assert!(env.visible_objects().iter().any(is_ball));
        assert_eq!(env.gen_obs().image.get(3, 3), [6, 1, 0], "Green ball");
    }

    #[test]
    fn carried_object_shows_in_agent_cell() {
        let mut env = fixture();
        env.step(Action::Pickup);
        let obs = env.gen_obs();
        assert_eq!(obs.image.get(3, 6), [5, 4, 0], "Yellow key at the agent's position");
        assert_eq!(obs.image.get(3, 5), [1, 0, 0], "Cell ahead now empty");
    }

    #[test]
    fn seeded_random_actions_repeat() {
        let config = MiniGridConfig {
            seed: Some(9),
            ..Default::default()
        };
        let a = MiniGridEnv::new(Fixture, config.clone());
        let b = MiniGridEnv::new(Fixture, config);
        let actions = |env: &MiniGridEnv| (0..20).map(|_| env.random_action()).collect::<Vec<_>>();
        assert_eq!(actions(&a), actions(&b));
    }

    #[test]
    fn full_observation_marks_agent() {
        let env = fixture();
        let image = env.full_observation();
        assert_eq!(image.get(2, 1), [10, 0, 0]);
        assert_eq!(image.get(4, 2), [4, 4, 2]);
    }
}
