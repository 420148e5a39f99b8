//! Natural-language descriptions of grid-world state

use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

use super::{
    constants::{Color, DoorState, ObjectKind},
    env::MiniGridEnv,
    grid::{Grid, Image, Pos},
    object::WorldObj,
};

const ANY: &str = "any";

/// Describes objects by type and color, either of which may be `any`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ObjectDescription {
    pub kind: Option<ObjectKind>,
    pub color: Option<Color>,
}

impl ObjectDescription {
    pub fn new(kind: ObjectKind, color: Color) -> Self {
        Self {
            kind: Some(kind),
            color: Some(color),
        }
    }

    /// Any object of the given kind, whatever its color
    pub fn of_kind(kind: ObjectKind) -> Self {
        Self {
            kind: Some(kind),
            color: None,
        }
    }

    pub fn matches(&self, obj: &WorldObj) -> bool {
        self.kind.map_or(true, |k| k == obj.kind()) && self.color.map_or(true, |c| c == obj.color())
    }

    /// Parse "{color} {type}", optionally followed by "at (x, y)"
    pub fn parse_located(s: &str) -> Result<(Self, Option<Pos>)> {
        let invalid = || Error::InvalidObjectDescription(s.to_string());
        let mut words = s.split_whitespace();
        let color = words.next().ok_or_else(invalid)?;
        let kind = words.next().ok_or_else(invalid)?;

        let color = match color {
            ANY => None,
            c => Some(Color::from_str(c).map_err(|_| invalid())?),
        };
        let kind = match kind {
            ANY => None,
            k => Some(ObjectKind::from_str(k).map_err(|_| invalid())?),
        };

        let rest = words.collect::<Vec<_>>().join(" ");
        let location = match rest.strip_prefix("at") {
            None if rest.is_empty() => None,
            None => return Err(invalid()),
            Some(coords) => {
                let coords = coords.trim().trim_start_matches('(').trim_end_matches(')');
                let (x, y) = coords.split_once(',').ok_or_else(invalid)?;
                let x = x.trim().parse().map_err(|_| invalid())?;
                let y = y.trim().parse().map_err(|_| invalid())?;
                Some((x, y))
            }
        };

        Ok((Self { kind, color }, location))
    }
}

impl FromStr for ObjectDescription {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_located(s).map(|(desc, _)| desc)
    }
}

impl fmt::Display for ObjectDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.color {
            Some(c) => write!(f, "{c} ")?,
            None => write!(f, "{ANY} ")?,
        }
        match self.kind {
            Some(k) => write!(f, "{k}"),
            None => write!(f, "{ANY}"),
        }
    }
}

/// Position `(x, y)` of the first object matching `desc`, scanning row by row
pub fn get_object_pos(grid: &Grid, desc: &ObjectDescription) -> Option<Pos> {
    grid.objects()
        .find(|(_, obj)| desc.matches(obj))
        .map(|(pos, _)| pos)
}

/// One line per object: "{door state }{color} {type} at (x, y)"
pub fn grid_to_str(grid: &Grid) -> String {
    grid.objects()
        .map(|((x, y), obj)| {
            let state = match obj.door_state() {
                Some(s) => format!("{s} "),
                None => String::new(),
            };
            format!("{state}{obj} at ({x}, {y})\n")
        })
        .collect()
}

/// Describe the layout, mission and agent pose in plain language
pub fn env_to_str(env: &MiniGridEnv) -> String {
    let objects: String = grid_to_str(env.grid())
        .lines()
        .map(|line| format!("--{line}\n"))
        .collect();
    let (x, y) = env.agent_pos();
    format!(
        "The environment consists of:\n{objects}\
         The overall mission is: {}\n\
         The agent is at: ({x}, {y})\n\
         The agent is facing: {}",
        env.mission(),
        env.agent_dir()
    )
}

/// Describe every cell of an encoded observation, column by column
///
/// Cells with indices outside the known encodings are skipped.
pub fn get_objects(image: &Image) -> Vec<String> {
    let mut objects = Vec::with_capacity(image.width() * image.height());
    for x in 0..image.width() {
        for y in 0..image.height() {
            let [kind_idx, color_idx, state_idx] = image.get(x, y);
            let (Some(kind), Some(color)) =
                (ObjectKind::from_repr(kind_idx), Color::from_repr(color_idx))
            else {
                continue;
            };

            let color = match kind {
                ObjectKind::Unseen => String::new(),
                _ => format!("{color} "),
            };
            let state = match (kind, DoorState::from_repr(state_idx)) {
                (ObjectKind::Door, Some(s)) => format!("{s} "),
                _ => String::new(),
            };
            objects.push(format!("{state}{color}{kind} at ({x}, {y})"));
        }
    }
    objects
}

/// What the agent is carrying, "nothing" when empty-handed
pub fn get_inventory(env: &MiniGridEnv) -> String {
    match env.carrying() {
        Some(obj) => obj.to_string(),
        None => String::from("nothing"),
    }
}
