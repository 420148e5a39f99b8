/// Experiment configuration
pub mod config;

/// Language-model task decomposition
pub mod decompose;

/// Environment
pub mod env;

pub mod error;

/// Chat completion client
pub mod gpt;

/// Grid-world simulation
pub mod minigrid;

/// Environments by id
pub mod registry;

/// Sub-task predicates
pub mod task;

/// Text interface for language models
pub mod text;

/// Sub-task tracking environment wrapper
pub mod wrapper;

mod util;
