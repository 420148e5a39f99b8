use std::{error::Error, fs, path::PathBuf};

use clap::{Parser, Subcommand};
use log::info;

use gpt_text_gym::{
    config::{DecompositionMode, ExperimentConfig},
    decompose::{
        format_decomposition_tree, make_automated_env, make_prompt, make_wrapped_pickup_unlock_env,
        parse_decomposition_tree,
    },
    env::Environment,
    gpt::ChatCompleter,
    minigrid::{
        describe::{env_to_str, get_inventory},
        MiniGridConfig, MiniGridEnv, Unwrapped,
    },
    registry,
    text::{MinigridTextEnvWrapper, TextEnvWrapper},
    wrapper::TaskEnvWrapper,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a natural-language description and the map of a freshly generated environment
    Describe {
        #[arg(long, default_value = "MiniGrid-UnlockPickup-v0")]
        env: String,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the prompt sent to the language model
    Prompt {
        #[arg(long, default_value = "MiniGrid-UnlockPickup-v0")]
        env: String,
        #[arg(long)]
        seed: Option<u64>,
        /// Print the text-interface message instead of the decomposition prompt
        #[arg(long)]
        text: bool,
    },
    /// Ask the language model for a decomposition and print the resulting sub-tasks
    Decompose {
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overrides the environment id of the config
        #[arg(long)]
        env: Option<String>,
        /// Print a saved XML decomposition instead of asking the model
        #[arg(long, conflicts_with_all = ["config", "env"])]
        xml: Option<PathBuf>,
    },
    /// Play random-action episodes and write per-episode statistics to CSV
    Rollout {
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overrides the episode count of the config
        #[arg(long)]
        episodes: Option<usize>,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<ExperimentConfig, Box<dyn Error>> {
    match path {
        Some(path) => Ok(ExperimentConfig::from_file(path)?),
        None => Ok(ExperimentConfig::default()),
    }
}

#[cfg(feature = "openai")]
fn make_completer(config: &ExperimentConfig) -> Result<ChatCompleter, Box<dyn Error>> {
    use gpt_text_gym::gpt::OpenAiBackend;

    let backend = OpenAiBackend::from_env(&config.chat.api_key_env, config.chat.base_url.clone())?;
    Ok(ChatCompleter::new(backend, config.completer_config()))
}

#[cfg(not(feature = "openai"))]
fn make_completer(config: &ExperimentConfig) -> Result<ChatCompleter, Box<dyn Error>> {
    Err(gpt_text_gym::error::Error::CompleterRequired(config.env.id.clone()).into())
}

/// The environment described by `config`, always behind a task wrapper
///
/// Without decomposition the wrapper has no tasks and passes everything through.
fn make_env(config: &ExperimentConfig) -> Result<TaskEnvWrapper<MiniGridEnv>, Box<dyn Error>> {
    let id = config.env.id.as_str();
    if registry::is_decomposed(id) {
        let mut completer = match id {
            "MiniGrid-UnlockPickupDecomposed-v0" => None,
            _ => Some(make_completer(config)?),
        };
        return Ok(registry::make_decomposed(id, config.minigrid_config(), completer.as_mut())?);
    }

    let env = registry::make(id, config.minigrid_config())?;
    let env = match config.env.mode {
        DecompositionMode::None => TaskEnvWrapper::with_fixed_tasks(env, Vec::new()),
        DecompositionMode::Scripted => make_wrapped_pickup_unlock_env(env),
        DecompositionMode::Automated => make_automated_env(env, &mut make_completer(config)?)?,
    };
    Ok(env)
}

fn describe(id: &str, seed: Option<u64>) -> Result<(), Box<dyn Error>> {
    let mut env = registry::make(id, MiniGridConfig { seed, ..Default::default() })?;
    env.try_reset()?;
    println!("{}\n", env_to_str(&env));
    println!("{env}\n");
    println!("The agent is carrying: {}", get_inventory(&env));
    Ok(())
}

fn prompt(id: &str, seed: Option<u64>, text: bool) -> Result<(), Box<dyn Error>> {
    let mut env = registry::make(id, MiniGridConfig { seed, ..Default::default() })?;
    let obs = env.try_reset()?;
    if text {
        let message = MinigridTextEnvWrapper::new().generate_message(&env, &obs);
        println!("{}", message.content);
    } else {
        println!("{}", make_prompt(&env));
    }
    Ok(())
}

fn print_xml_decomposition(path: PathBuf) -> Result<(), Box<dyn Error>> {
    let tree = parse_decomposition_tree(&fs::read_to_string(path)?)?;
    println!("{}", format_decomposition_tree(&tree));
    Ok(())
}

fn decompose(mut config: ExperimentConfig, id: Option<String>) -> Result<(), Box<dyn Error>> {
    if let Some(id) = id {
        config.env.id = id;
    }
    let env = registry::make(&config.env.id, config.minigrid_config())?;
    let mut completer = make_completer(&config)?;
    let mut env = make_automated_env(env, &mut completer)?;

    for message in completer.chat_history() {
        println!("{message}\n");
    }
    env.reset();
    println!("Overall mission: {}", env.overall_mission());
    for (i, task) in env.tasks().iter().enumerate() {
        println!("{}. {task}", i + 1);
    }
    Ok(())
}

fn rollout(mut config: ExperimentConfig, episodes: Option<usize>) -> Result<(), Box<dyn Error>> {
    if let Some(episodes) = episodes {
        config.episodes = episodes;
    }
    let mut env = make_env(&config)?;

    fs::create_dir_all(&config.output_dir)?;
    let path = config.output_dir.join(format!("{}.csv", config.name));
    let mut wtr = csv::Writer::from_path(&path)?;
    wtr.write_record(["episode", "steps", "reward", "tasks_completed", "env_reward"])?;

    for episode in 0..config.episodes {
        env.reset();
        loop {
            let action = env.random_action();
            if env.step(action).0.is_none() {
                break;
            }
        }

        let report = env.report.take();
        let env_report = env.unwrapped_mut().report.take();
        info!(
            "episode {episode}: {} steps, {}/{} sub-tasks",
            report["steps"],
            report["tasks_completed"],
            env.tasks().len()
        );
        wtr.write_record(&[
            episode.to_string(),
            report["steps"].to_string(),
            report["reward"].to_string(),
            report["tasks_completed"].to_string(),
            env_report["reward"].to_string(),
        ])?;
    }

    wtr.flush()?;
    info!("wrote {}", path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Describe { env, seed } => describe(&env, seed),
        Commands::Prompt { env, seed, text } => prompt(&env, seed, text),
        Commands::Decompose { xml: Some(path), .. } => print_xml_decomposition(path),
        Commands::Decompose { config, env, .. } => decompose(load_config(config)?, env),
        Commands::Rollout { config, episodes } => rollout(load_config(config)?, episodes),
    }
}
