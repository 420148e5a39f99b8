//! Logical compositions of tasks

use std::fmt;

use crate::minigrid::MiniGridEnv;

use super::Task;

fn join(tasks: &[Box<dyn Task>]) -> String {
    tasks
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Succeeds while the inner task does not
#[derive(Clone, Debug)]
pub struct InverseTask {
    task: Box<dyn Task>,
}

impl InverseTask {
    pub fn new(task: impl Task + 'static) -> Self {
        Self { task: Box::new(task) }
    }
}

impl fmt::Display for InverseTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NOT({})", self.task)
    }
}

impl Task for InverseTask {
    fn check_success(&self, env: &MiniGridEnv) -> bool {
        !self.task.check_success(env)
    }
}

/// Succeeds when every inner task does
#[derive(Clone, Debug)]
pub struct AndTask {
    tasks: Vec<Box<dyn Task>>,
}

impl AndTask {
    pub fn new(tasks: Vec<Box<dyn Task>>) -> Self {
        Self { tasks }
    }
}

impl fmt::Display for AndTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AND({})", join(&self.tasks))
    }
}

impl Task for AndTask {
    fn check_success(&self, env: &MiniGridEnv) -> bool {
        self.tasks.iter().all(|t| t.check_success(env))
    }
}

/// Succeeds when any inner task does
#[derive(Clone, Debug)]
pub struct OrTask {
    tasks: Vec<Box<dyn Task>>,
}

impl OrTask {
    pub fn new(tasks: Vec<Box<dyn Task>>) -> Self {
        Self { tasks }
    }
}

impl fmt::Display for OrTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OR({})", join(&self.tasks))
    }
}

impl Task for OrTask {
    fn check_success(&self, env: &MiniGridEnv) -> bool {
        self.tasks.iter().any(|t| t.check_success(env))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        env::Environment,
        minigrid::{describe::ObjectDescription, Empty, MiniGridConfig, ObjectKind},
        task::{GoToObjectTask, PickUpObjectTask},
    };

    use super::*;

    fn env() -> MiniGridEnv {
        let mut env = MiniGridEnv::new(Empty::new(5), MiniGridConfig::default());
        env.reset();
        env
    }

    #[derive(Clone)]
    struct Always(bool);

    impl fmt::Display for Always {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl Task for Always {
        fn check_success(&self, _env: &MiniGridEnv) -> bool {
            self.0
        }
    }

    #[test]
    fn compositions_evaluate() {
        let env = env();
        let yes = || Box::new(Always(true)) as Box<dyn Task>;
        let no = || Box::new(Always(false)) as Box<dyn Task>;

        assert!(InverseTask::new(Always(false)).check_success(&env));
        assert!(AndTask::new(vec![yes(), yes()]).check_success(&env));
        assert!(!AndTask::new(vec![yes(), no()]).check_success(&env));
        assert!(OrTask::new(vec![no(), yes()]).check_success(&env));
        assert!(!OrTask::new(vec![]).check_success(&env), "Empty OR never succeeds");
        assert!(AndTask::new(vec![]).check_success(&env), "Empty AND always succeeds");
    }

    #[test]
    fn compositions_describe() {
        let key = ObjectDescription::of_kind(ObjectKind::Key);
        let task = AndTask::new(vec![
            Box::new(GoToObjectTask::new(key)),
            Box::new(InverseTask::new(PickUpObjectTask::new(key))),
        ]);
        assert_eq!(task.to_string(), "AND(go to the key, NOT(pick up the key))");

        let cloned: Box<dyn Task> = Box::new(task.clone());
        assert_eq!(cloned.to_string(), task.to_string(), "Boxed tasks clone");
    }
}
