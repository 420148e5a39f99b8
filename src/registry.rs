//! Environments by id

use log::info;

use crate::{
    decompose::{make_automated_env, make_wrapped_pickup_unlock_env},
    error::{Error, Result},
    gpt::ChatCompleter,
    minigrid::{Empty, MiniGridConfig, MiniGridEnv, Unlock, UnlockPickup},
    wrapper::TaskEnvWrapper,
};

/// Ids accepted by [`make`]
pub const ENV_IDS: [&str; 7] = [
    "MiniGrid-Empty-5x5-v0",
    "MiniGrid-Empty-6x6-v0",
    "MiniGrid-Empty-8x8-v0",
    "MiniGrid-Empty-16x16-v0",
    "MiniGrid-Unlock-v0",
    "MiniGrid-UnlockPickup-v0",
    "MiniGrid-BlockedUnlockPickup-v0",
];

/// Ids accepted by [`make_decomposed`]
pub const DECOMPOSED_ENV_IDS: [&str; 4] = [
    "MiniGrid-UnlockPickupDecomposed-v0",
    "MiniGrid-UnlockPickupDecomposedAutomated-v0",
    "MiniGrid-BlockedUnlockPickupDecomposedAutomated-v1",
    "MiniGrid-UnlockDecomposedAutomated-v1",
];

/// Build a plain grid-world environment
pub fn make(id: &str, config: MiniGridConfig) -> Result<MiniGridEnv> {
    let env = match id {
        "MiniGrid-Empty-5x5-v0" => MiniGridEnv::new(Empty::new(5), config),
        "MiniGrid-Empty-6x6-v0" => MiniGridEnv::new(Empty::new(6), config),
        "MiniGrid-Empty-8x8-v0" => MiniGridEnv::new(Empty::new(8), config),
        "MiniGrid-Empty-16x16-v0" => MiniGridEnv::new(Empty::new(16), config),
        "MiniGrid-Unlock-v0" => MiniGridEnv::new(Unlock::new(), config),
        "MiniGrid-UnlockPickup-v0" => MiniGridEnv::new(UnlockPickup::new(), config),
        "MiniGrid-BlockedUnlockPickup-v0" => MiniGridEnv::new(UnlockPickup::blocked(), config),
        _ => return Err(Error::UnknownEnv(id.to_string())),
    };
    Ok(env)
}

/// Build a grid-world environment wrapped with a sub-task decomposition
///
/// The automated ids ask the model behind `completer` for the decomposition, once.
pub fn make_decomposed(
    id: &str,
    config: MiniGridConfig,
    completer: Option<&mut ChatCompleter>,
) -> Result<TaskEnvWrapper<MiniGridEnv>> {
    let base = match id {
        "MiniGrid-UnlockPickupDecomposed-v0" => {
            return Ok(make_wrapped_pickup_unlock_env(make(
                "MiniGrid-UnlockPickup-v0",
                config,
            )?));
        }
        "MiniGrid-UnlockPickupDecomposedAutomated-v0" => "MiniGrid-UnlockPickup-v0",
        "MiniGrid-BlockedUnlockPickupDecomposedAutomated-v1" => "MiniGrid-BlockedUnlockPickup-v0",
        "MiniGrid-UnlockDecomposedAutomated-v1" => "MiniGrid-Unlock-v0",
        _ => return Err(Error::UnknownEnv(id.to_string())),
    };

    let completer = completer.ok_or_else(|| Error::CompleterRequired(id.to_string()))?;
    info!("decomposing {base} with {}", completer.model());
    make_automated_env(make(base, config)?, completer)
}

/// Whether `id` names a decomposed environment
pub fn is_decomposed(id: &str) -> bool {
    DECOMPOSED_ENV_IDS.contains(&id)
}
