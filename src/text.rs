//! Presenting a grid world to a language model as text, and reading its actions back

use std::{fmt, str::FromStr};

use strum::VariantArray;

use crate::{
    error::{Error, Result},
    gpt::Message,
    minigrid::{Action, Color, MiniGridEnv, ObjectKind, Observation},
};

pub use crate::util::remove_leading_whitespace;

/// A textual map split into two-character cells
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextGrid {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<Vec<String>>,
}

impl TextGrid {
    /// Parse a map with one line per row and two characters per cell
    pub fn from_string(s: &str) -> Result<Self> {
        let cells = s
            .lines()
            .enumerate()
            .map(|(y, line)| {
                let chars: Vec<char> = line.chars().collect();
                if chars.len() % 2 != 0 {
                    return Err(Error::InvalidTextGrid(format!(
                        "row {y} has an odd number of characters"
                    )));
                }
                Ok(chars.chunks(2).map(|c| c.iter().collect()).collect::<Vec<String>>())
            })
            .collect::<Result<Vec<_>>>()?;

        let cols = cells.first().map_or(0, Vec::len);
        if let Some(y) = cells.iter().position(|row| row.len() != cols) {
            return Err(Error::InvalidTextGrid(format!(
                "row {y} has {} cells, expected {cols}",
                cells[y].len()
            )));
        }

        Ok(Self {
            rows: cells.len(),
            cols,
            cells,
        })
    }
}

impl FromStr for TextGrid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_string(s)
    }
}

impl fmt::Display for TextGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<String> = self.cells.iter().map(|row| row.concat()).collect();
        write!(f, "{}", rows.join("\n"))
    }
}

/// Converts between an environment and chat messages
pub trait TextEnvWrapper {
    /// Describe the environment and observation as a message
    fn generate_message(&self, env: &MiniGridEnv, obs: &Observation) -> Message;

    /// Read an action out of a model reply
    fn generate_action(&self, env: &MiniGridEnv, message: &Message) -> Result<Action>;
}

/// Text interface to a [`MiniGridEnv`]; an empty prompt falls back to [`make_plan_prompt`]
#[derive(Clone, Debug, Default)]
pub struct MinigridTextEnvWrapper {
    pub prompt: String,
}

impl MinigridTextEnvWrapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into() }
    }

    pub fn make_message(&self, env: &MiniGridEnv, obs: &Observation) -> String {
        make_message(env, obs, &self.prompt)
    }
}

impl TextEnvWrapper for MinigridTextEnvWrapper {
    fn generate_message(&self, env: &MiniGridEnv, obs: &Observation) -> Message {
        Message::user(self.make_message(env, obs))
    }

    fn generate_action(&self, _env: &MiniGridEnv, message: &Message) -> Result<Action> {
        let name = message.content.trim().to_lowercase();
        Action::from_str(&name).map_err(|_| Error::UnknownAction(message.content.clone()))
    }
}

fn join_names<T: fmt::Display>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// What a grid world is: colors, objects and actions
pub fn make_minigrid_description() -> String {
    let text = format!(
        "
        You are an agent in a gridworld.
        The environment is a gridworld with a 2D view from above.
        It contains a single agent and a number of objects.

        The possible colors are:
        {}

        The possible objects are:
        {}

        The possible actions are:
        {}
        ",
        join_names(Color::VARIANTS),
        join_names(ObjectKind::VARIANTS),
        join_names(Action::VARIANTS),
    );
    remove_leading_whitespace(&text, Some(8))
}

/// Legend for the textual map, then the map itself and the mission
pub fn make_env_description(env: &MiniGridEnv, obs: &Observation) -> String {
    let legend = format!(
        "
        The environment state is represented by a grid of size {}x{}.
        Each grid cell is described by a 2-character string, the first one for
        the object and the second one for the color.
        An empty grid cell is represented by the string \"  \".
        An open door is represented by the string \"__\".

        Object codes:
        wall W, floor F, door D, locked door L, key K, ball A, box B, goal G, lava V

        Color codes:
        red R, green G, blue B, purple P, yellow Y, grey G

        The agent is drawn as a doubled arrow for its direction:
        right >, down V, left <, up ^
        ",
        2 * env.width(),
        env.height(),
    );
    let legend = remove_leading_whitespace(&legend, None);
    format!(
        "{legend}\nThe environment state is:\n{env}\n\nThe mission is:\n{}\n",
        obs.mission
    )
}

pub fn make_rules() -> String {
    remove_leading_whitespace(
        "
        The rules of the environment are:
        1. You can pick up an object if it is in front of you.
        2. You can drop an object if you are holding it.
        3. You can toggle an object if it is in front of you.
        4. You can move forward, turn left, or turn right.
        5. You can only pick up an object if you are not holding anything.
        6. When you drop an object, it will be placed on the grid cell in front of you.
        7. You cannot walk through walls. If you try, you will stay in the same place.
        8. You cannot walk through locked doors. If you try, you will stay in the same place.
        9. You can unlock a locked door with the correct key.
        10. You cannot walk over objects. If you try, you will stay in the same place.
        ",
        None,
    )
}

/// Default request: an overall plan for the mission
pub fn make_plan_prompt() -> String {
    remove_leading_whitespace(
        "
        Think about it carefully. What overall plan should you follow to complete the mission?
        The steps of the plan should be simple and easy to follow.
        You should not describe the plan in too much detail.
        ",
        None,
    )
}

/// The full message for `obs`, ending with `prompt` (or the plan prompt when empty)
pub fn make_message(env: &MiniGridEnv, obs: &Observation, prompt: &str) -> String {
    let prompt = match prompt {
        "" => make_plan_prompt(),
        p => p.to_string(),
    };
    format!(
        "{}\n{}\n{}\n{}",
        make_minigrid_description(),
        make_env_description(env, obs),
        make_rules(),
        prompt
    )
}
