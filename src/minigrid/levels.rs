use crate::error::{Error, Result};

use super::{
    constants::{Action, Color, Direction, ObjectKind},
    env::{Level, MiniGridEnv, World},
    grid::Pos,
    object::WorldObj,
};

/// Empty room, the agent in the top-left corner and a goal square in the bottom-right one
pub struct Empty {
    size: usize,
}

impl Empty {
    /// **Panics** if `size` is not 5, 6, 8 or 16
    pub fn new(size: usize) -> Self {
        assert!(matches!(size, 5 | 6 | 8 | 16), "unsupported empty room size: {size}");
        Self { size }
    }
}

impl Level for Empty {
    fn id(&self) -> &'static str {
        match self.size {
            5 => "MiniGrid-Empty-5x5-v0",
            6 => "MiniGrid-Empty-6x6-v0",
            8 => "MiniGrid-Empty-8x8-v0",
            _ => "MiniGrid-Empty-16x16-v0",
        }
    }

    fn default_max_steps(&self) -> usize {
        4 * self.size * self.size
    }

    fn generate(&mut self, world: &mut World) -> Result<String> {
        let size = self.size;
        world.clear(size, size);
        world.grid.wall_rect(0, 0, size, size);
        world.grid.set(size - 2, size - 2, Some(WorldObj::Goal));
        world.agent_pos = (1, 1);
        world.agent_dir = Direction::Right;
        Ok(String::from("get to the green goal square"))
    }
}

#[derive(Clone, Debug)]
struct Room {
    top: Pos,
    size: (usize, usize),
    /// Candidate door positions: right, bottom, left, top
    door_pos: [Option<Pos>; 4],
}

/// A grid divided into equally sized rooms sharing their walls
#[derive(Clone, Debug)]
pub struct RoomGrid {
    room_size: usize,
    num_rows: usize,
    num_cols: usize,
    rooms: Vec<Room>,
}

impl RoomGrid {
    pub fn new(room_size: usize, num_rows: usize, num_cols: usize) -> Self {
        assert!(room_size >= 4, "rooms need room for a door");
        assert!(num_rows > 0 && num_cols > 0);
        Self {
            room_size,
            num_rows,
            num_cols,
            rooms: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        (self.room_size - 1) * self.num_cols + 1
    }

    pub fn height(&self) -> usize {
        (self.room_size - 1) * self.num_rows + 1
    }

    fn room(&self, i: usize, j: usize) -> &Room {
        &self.rooms[j * self.num_cols + i]
    }

    /// Lay out the walls of every room and choose their door positions
    pub fn build(&mut self, world: &mut World) {
        world.clear(self.width(), self.height());
        let size = self.room_size;
        self.rooms.clear();

        for j in 0..self.num_rows {
            for i in 0..self.num_cols {
                let top = (i * (size - 1), j * (size - 1));
                world.grid.wall_rect(top.0, top.1, size, size);

                let (x_l, y_t) = top;
                let (x_r, y_b) = (x_l + size - 1, y_t + size - 1);
                let mut door_pos = [None; 4];
                if i + 1 < self.num_cols {
                    door_pos[0] = Some((x_r, world.rand_int(y_t + 1, y_b - 1)));
                }
                if j + 1 < self.num_rows {
                    door_pos[1] = Some((world.rand_int(x_l + 1, x_r - 1), y_b));
                }
                self.rooms.push(Room {
                    top,
                    size: (size, size),
                    door_pos,
                });
            }
        }

        // Neighbours share the door in the wall between them
        for j in 0..self.num_rows {
            for i in 0..self.num_cols {
                let idx = j * self.num_cols + i;
                if i > 0 {
                    self.rooms[idx].door_pos[2] = self.rooms[idx - 1].door_pos[0];
                }
                if j > 0 {
                    self.rooms[idx].door_pos[3] = self.rooms[idx - self.num_cols].door_pos[1];
                }
            }
        }
    }

    /// Add a door to room `(i, j)` in the wall given by `door_idx`
    ///
    /// Walls are numbered 0 right, 1 bottom, 2 left, 3 top.
    ///
    /// A random color is chosen when `color` is `None`.
    pub fn add_door(
        &self,
        world: &mut World,
        i: usize,
        j: usize,
        door_idx: usize,
        color: Option<Color>,
        locked: bool,
    ) -> Result<(WorldObj, Pos)> {
        let pos = self.room(i, j).door_pos[door_idx]
            .ok_or_else(|| Error::Placement(format!("door {door_idx} of room ({i}, {j})")))?;
        let color = color.unwrap_or_else(|| world.rand_color());
        let door = WorldObj::door(color, locked);
        world.grid.set(pos.0, pos.1, Some(door.clone()));
        Ok((door, pos))
    }

    /// Add a key, ball or box to room `(i, j)`, with random kind and color where unspecified
    pub fn add_object(
        &self,
        world: &mut World,
        i: usize,
        j: usize,
        kind: Option<ObjectKind>,
        color: Option<Color>,
    ) -> Result<(WorldObj, Pos)> {
        let kind = match kind {
            Some(kind) => kind,
            None => world
                .rand_elem(&[ObjectKind::Key, ObjectKind::Ball, ObjectKind::Box])
                .expect("kind list is not empty"),
        };
        let color = color.unwrap_or_else(|| world.rand_color());
        let obj = WorldObj::pickable(kind, color)
            .ok_or_else(|| Error::Placement(kind.to_string()))?;

        let room = self.room(i, j);
        let pos = world.place_obj(Some(obj.clone()), room.top, room.size)?;
        Ok((obj, pos))
    }

    /// Place the agent in room `(i, j)` facing a random direction, never blocked by an object
    pub fn place_agent(&self, world: &mut World, i: usize, j: usize) -> Result<Pos> {
        let room = self.room(i, j).clone();
        loop {
            let pos = world.place_agent(room.top, room.size, true)?;
            let front_clear = world.front_pos().map_or(true, |(x, y)| {
                world.grid.get(x, y).map_or(true, |c| c.kind() == ObjectKind::Wall)
            });
            if front_clear {
                return Ok(pos);
            }
        }
    }
}

/// Two rooms; the agent must open the locked door between them
pub struct Unlock {
    rooms: RoomGrid,
    door_pos: Option<Pos>,
}

impl Unlock {
    pub fn new() -> Self {
        Self {
            rooms: RoomGrid::new(6, 1, 2),
            door_pos: None,
        }
    }
}

impl Default for Unlock {
    fn default() -> Self {
        Self::new()
    }
}

impl Level for Unlock {
    fn id(&self) -> &'static str {
        "MiniGrid-Unlock-v0"
    }

    fn default_max_steps(&self) -> usize {
        8 * self.rooms.room_size.pow(2)
    }

    fn generate(&mut self, world: &mut World) -> Result<String> {
        self.rooms.build(world);
        let (door, pos) = self.rooms.add_door(world, 0, 0, 0, None, true)?;
        self.door_pos = Some(pos);
        self.rooms.add_object(world, 0, 0, Some(ObjectKind::Key), Some(door.color()))?;
        self.rooms.place_agent(world, 0, 0)?;
        Ok(String::from("open the door"))
    }

    fn is_success(&self, env: &MiniGridEnv, action: Action) -> bool {
        action == Action::Toggle
            && self
                .door_pos
                .and_then(|(x, y)| env.grid().get(x, y))
                .is_some_and(|door| matches!(door, WorldObj::Door { is_open: true, .. }))
    }
}

/// Two rooms; the agent must unlock the door and pick up the box in the far room
///
/// The blocked variant puts a ball in front of the door on the agent's side.
pub struct UnlockPickup {
    rooms: RoomGrid,
    blocked: bool,
    target: Option<WorldObj>,
}

impl UnlockPickup {
    pub fn new() -> Self {
        Self {
            rooms: RoomGrid::new(6, 1, 2),
            blocked: false,
            target: None,
        }
    }

    pub fn blocked() -> Self {
        Self {
            blocked: true,
            ..Self::new()
        }
    }
}

impl Default for UnlockPickup {
    fn default() -> Self {
        Self::new()
    }
}

impl Level for UnlockPickup {
    fn id(&self) -> &'static str {
        if self.blocked {
            "MiniGrid-BlockedUnlockPickup-v0"
        } else {
            "MiniGrid-UnlockPickup-v0"
        }
    }

    fn default_max_steps(&self) -> usize {
        let factor = if self.blocked { 16 } else { 8 };
        factor * self.rooms.room_size.pow(2)
    }

    fn generate(&mut self, world: &mut World) -> Result<String> {
        self.rooms.build(world);
        let (target, _) = self.rooms.add_object(world, 1, 0, Some(ObjectKind::Box), None)?;
        let (door, door_pos) = self.rooms.add_door(world, 0, 0, 0, None, true)?;

        if self.blocked {
            let color = world.rand_color();
            world.grid.set(door_pos.0 - 1, door_pos.1, Some(WorldObj::Ball(color)));
        }

        self.rooms.add_object(world, 0, 0, Some(ObjectKind::Key), Some(door.color()))?;
        self.rooms.place_agent(world, 0, 0)?;

        let mission = format!("pick up the {} {}", target.color(), target.kind());
        self.target = Some(target);
        Ok(mission)
    }

    fn is_success(&self, env: &MiniGridEnv, action: Action) -> bool {
        action == Action::Pickup
            && env.carrying().is_some()
            && env.carrying() == self.target.as_ref()
    }
}
