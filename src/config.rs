//! Experiment configuration loaded from TOML

use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    error::{Error, Result},
    gpt::ChatCompleterConfig,
    minigrid::MiniGridConfig,
};

/// How the mission of the environment is split into sub-tasks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DecompositionMode {
    /// The plain environment
    #[default]
    None,
    /// Hand-written key, door and box sub-tasks
    Scripted,
    /// Sub-tasks proposed by a language model
    Automated,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvSection {
    pub id: String,
    pub mode: DecompositionMode,
    pub max_steps: Option<usize>,
    pub agent_view_size: usize,
    pub see_through_walls: bool,
}

impl Default for EnvSection {
    fn default() -> Self {
        Self {
            id: String::from("MiniGrid-UnlockPickup-v0"),
            mode: DecompositionMode::None,
            max_steps: None,
            agent_view_size: 7,
            see_through_walls: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSection {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub n: u32,
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            model: String::from("gpt-4"),
            temperature: 0.0,
            max_tokens: None,
            n: 1,
            base_url: String::from("https://api.openai.com/v1"),
            api_key_env: String::from("OPENAI_API_KEY"),
        }
    }
}

/// Everything needed to run a rollout experiment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub name: String,
    pub seed: Option<u64>,
    pub episodes: usize,
    pub output_dir: PathBuf,
    pub env: EnvSection,
    pub chat: ChatSection,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: String::from("experiment"),
            seed: None,
            episodes: 10,
            output_dir: PathBuf::from("runs"),
            env: EnvSection::default(),
            chat: ChatSection::default(),
        }
    }
}

impl ExperimentConfig {
    /// Load and validate a TOML config
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the environment or the completer would panic on
    pub fn validate(&self) -> Result<()> {
        let view = self.env.agent_view_size;
        if view % 2 == 0 || view < 3 {
            return Err(Error::InvalidConfig(format!(
                "env.agent_view_size must be odd and at least 3, got {view}"
            )));
        }
        let temperature = self.chat.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(Error::InvalidConfig(format!(
                "chat.temperature must lie in [0, 2], got {temperature}"
            )));
        }
        if self.chat.n == 0 {
            return Err(Error::InvalidConfig(String::from("chat.n must be positive")));
        }
        Ok(())
    }

    pub fn minigrid_config(&self) -> MiniGridConfig {
        MiniGridConfig {
            agent_view_size: self.env.agent_view_size,
            max_steps: self.env.max_steps,
            see_through_walls: self.env.see_through_walls,
            seed: self.seed,
        }
    }

    pub fn completer_config(&self) -> ChatCompleterConfig {
        ChatCompleterConfig {
            model: self.chat.model.clone(),
            temperature: self.chat.temperature,
            max_tokens: self.chat.max_tokens,
            n: self.chat.n,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: ExperimentConfig = toml::from_str("").unwrap();
        assert_eq!(config, ExperimentConfig::default());
        assert_eq!(config.chat.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.completer_config(), ChatCompleterConfig::default());
        assert_eq!(config.minigrid_config(), MiniGridConfig::default());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
name = "unlock-automated"
seed = 42
episodes = 3

[env]
id = "MiniGrid-Unlock-v0"
mode = "automated"
max_steps = 100

[chat]
model = "gpt-3.5-turbo"
temperature = 0.7
max_tokens = 512
"#
        )
        .unwrap();

        let config = ExperimentConfig::from_file(file.path()).unwrap();
        assert_eq!(config.name, "unlock-automated");
        assert_eq!(config.episodes, 3);
        assert_eq!(config.env.mode, DecompositionMode::Automated);
        assert_eq!(config.env.agent_view_size, 7, "Unset fields keep their defaults");
        assert_eq!(config.minigrid_config().seed, Some(42));
        assert_eq!(config.minigrid_config().max_steps, Some(100));

        let chat = config.completer_config();
        assert_eq!(chat.model, "gpt-3.5-turbo");
        assert_eq!(chat.max_tokens, Some(512));
        assert_eq!(chat.n, 1);
    }

    #[test]
    fn reports_bad_files() {
        assert!(matches!(
            ExperimentConfig::from_file("/nonexistent/experiment.toml"),
            Err(Error::Io(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[env]\nmode = \"sometimes\"\n").unwrap();
        assert!(matches!(ExperimentConfig::from_file(file.path()), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_out_of_range_values() {
        for body in [
            "[chat]\ntemperature = 5.0\n",
            "[chat]\ntemperature = -0.1\n",
            "[chat]\nn = 0\n",
            "[env]\nagent_view_size = 6\n",
        ] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(file, "{body}").unwrap();
            assert!(
                matches!(ExperimentConfig::from_file(file.path()), Err(Error::InvalidConfig(_))),
                "{body}"
            );
        }
        assert!(ExperimentConfig::default().validate().is_ok());
    }
}
