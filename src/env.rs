use std::{
    collections::HashMap,
    ops::{Deref, DerefMut},
};

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Update the environment in response to an action taken by an agent, producing a new state and associated reward
    ///
    /// **Returns** `(next_state, reward)`, where `next_state` is `None` once the episode has ended
    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32);

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;

    /// Choose a random action
    fn random_action(&self) -> Self::Action;
}

/// An environment with a finite set of actions
pub trait DiscreteActionSpace: Environment {
    /// Get the available actions for the current state
    ///
    /// The returned vec should never be empty, instead specify an action that represents doing nothing if necessary.
    fn actions(&self) -> Vec<Self::Action>;
}

/// Named accumulators an environment updates while an episode runs
#[derive(Debug, Clone, Default)]
pub struct Report {
    keys: Vec<&'static str>,
    data: HashMap<&'static str, f64>,
}

impl Report {
    /// Create a report tracking the given keys, all starting at zero
    pub fn new(keys: Vec<&'static str>) -> Self {
        let data = keys.iter().map(|&k| (k, 0.0)).collect();
        Self { keys, data }
    }

    /// The tracked keys in the order they were declared
    pub fn keys(&self) -> &[&'static str] {
        &self.keys
    }

    /// Take the accumulated values, resetting every key to zero
    pub fn take(&mut self) -> HashMap<&'static str, f64> {
        let fresh = self.keys.iter().map(|&k| (k, 0.0)).collect();
        std::mem::replace(&mut self.data, fresh)
    }
}

impl Deref for Report {
    type Target = HashMap<&'static str, f64>;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl DerefMut for Report {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accumulates_and_resets() {
        let mut report = Report::new(vec!["steps", "reward"]);
        report.entry("steps").and_modify(|x| *x += 1.0);
        report.entry("steps").and_modify(|x| *x += 1.0);
        report.entry("reward").and_modify(|x| *x += 0.5);

        assert_eq!(report["steps"], 2.0, "Steps accumulate");

        let taken = report.take();
        assert_eq!(taken["reward"], 0.5, "Taken values are preserved");
        assert_eq!(report["steps"], 0.0, "Report is zeroed after take");
        assert_eq!(report.keys(), &["steps", "reward"]);
    }

    #[test]
    fn report_ignores_undeclared_keys() {
        let mut report = Report::new(vec!["steps"]);
        report.entry("other").and_modify(|x| *x += 1.0);
        assert!(report.get("other").is_none(), "and_modify does not insert");
    }
}
