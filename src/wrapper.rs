use log::{debug, info};

use crate::{
    env::{DiscreteActionSpace, Environment, Report},
    minigrid::{Action, MiniGridEnv, Observation, Unwrapped},
    task::Task,
};

/// Builds the task sequence for a freshly reset environment
pub type MakeTasksFn = Box<dyn FnMut(&MiniGridEnv) -> Vec<Box<dyn Task>>>;

/// Wrap a grid-world environment with a sequence of sub-tasks
///
/// - The observation's mission is replaced with the current sub-task's description
/// - The reward is replaced with the sub-task reward: `1` on the step a sub-task
///   is completed, `0` otherwise
/// - The episode ends once the last sub-task is completed
///
/// With an empty task list the wrapper is transparent.
pub struct TaskEnvWrapper<E> {
    env: E,
    make_tasks: MakeTasksFn,
    tasks: Vec<Box<dyn Task>>,
    current_task_idx: usize,
    overall_mission: String,
    pub report: Report,
}

impl<E> TaskEnvWrapper<E>
where
    E: Environment<State = Observation, Action = Action> + Unwrapped,
{
    pub fn new(env: E, make_tasks: MakeTasksFn) -> Self {
        Self {
            env,
            make_tasks,
            tasks: Vec::new(),
            current_task_idx: 0,
            overall_mission: String::new(),
            report: Report::new(vec!["reward", "steps", "tasks_completed"]),
        }
    }

    /// Wrap `env` with the same tasks on every reset
    pub fn with_fixed_tasks(env: E, tasks: Vec<Box<dyn Task>>) -> Self {
        Self::new(env, Box::new(move |_: &MiniGridEnv| tasks.clone()))
    }

    /// The sub-task the agent is working on
    ///
    /// **Returns** `None` before the first reset or when there are no tasks
    pub fn current_task(&self) -> Option<&dyn Task> {
        self.tasks.get(self.current_task_idx).map(|t| t.as_ref())
    }

    pub fn current_task_idx(&self) -> usize {
        self.current_task_idx
    }

    pub fn tasks(&self) -> &[Box<dyn Task>] {
        &self.tasks
    }

    pub fn has_tasks_remaining(&self) -> bool {
        self.current_task_idx < self.tasks.len()
    }

    /// The mission of the wrapped environment
    pub fn overall_mission(&self) -> &str {
        &self.overall_mission
    }

    pub fn inner(&self) -> &E {
        &self.env
    }

    fn relabel(&mut self, mut obs: Observation) -> Observation {
        self.overall_mission = std::mem::take(&mut obs.mission);
        obs.mission = match self.current_task() {
            Some(task) => task.to_string(),
            None => self.overall_mission.clone(),
        };
        obs
    }
}

impl<E> Environment for TaskEnvWrapper<E>
where
    E: Environment<State = Observation, Action = Action> + Unwrapped,
{
    type State = Observation;
    type Action = Action;

    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32) {
        let (next, reward) = self.env.step(action);
        self.report.entry("steps").and_modify(|x| *x += 1.0);

        if !self.has_tasks_remaining() {
            self.report.entry("reward").and_modify(|x| *x += reward as f64);
            return (next, reward);
        }

        let idx = self.current_task_idx;
        let success = self.tasks[idx].check_success(self.env.unwrapped());
        let mut terminated = false;
        let reward = if success {
            debug!("completed sub-task {}/{}: {}", idx + 1, self.tasks.len(), self.tasks[idx]);
            self.report.entry("tasks_completed").and_modify(|x| *x += 1.0);
            if idx + 1 < self.tasks.len() {
                self.current_task_idx += 1;
            } else {
                terminated = true;
            }
            1.0
        } else {
            0.0
        };

        self.report.entry("reward").and_modify(|x| *x += reward as f64);

        if terminated {
            info!("all {} sub-tasks completed", self.tasks.len());
            return (None, reward);
        }

        (next.map(|obs| self.relabel(obs)), reward)
    }

    fn reset(&mut self) -> Self::State {
        let obs = self.env.reset();
        self.tasks = (self.make_tasks)(self.env.unwrapped());
        self.current_task_idx = 0;
        debug!("reset with {} sub-tasks: {:?}", self.tasks.len(), self.tasks);
        self.relabel(obs)
    }

    fn random_action(&self) -> Self::Action {
        self.env.random_action()
    }
}

impl<E> DiscreteActionSpace for TaskEnvWrapper<E>
where
    E: DiscreteActionSpace<State = Observation, Action = Action> + Unwrapped,
{
    fn actions(&self) -> Vec<Self::Action> {
        self.env.actions()
    }
}

impl<E: Unwrapped> Unwrapped for TaskEnvWrapper<E> {
    fn unwrapped(&self) -> &MiniGridEnv {
        self.env.unwrapped()
    }

    fn unwrapped_mut(&mut self) -> &mut MiniGridEnv {
        self.env.unwrapped_mut()
    }
}
