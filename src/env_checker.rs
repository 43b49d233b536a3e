//! Structural conformance check for [`Environment`] implementations.
//!
//! Runs one full episode with random actions and verifies that spaces, observations,
//! rewards and the termination contract are consistent. The environment is left reset.

use crate::environment::{Environment, YieldInfo};
use crate::error::{Error, Result};
use crate::spaces::BoxSpace;

use rand::Rng;

fn fail(msg: impl Into<String>) -> Error {
    Error::EnvCheck(msg.into())
}

fn check_space(name: &str, space: &BoxSpace) -> Result<()> {
    if space.low.len() != space.high.len() {
        return Err(fail(format!(
            "{name} space bounds differ in length ({} vs {})",
            space.low.len(),
            space.high.len()
        )));
    }
    if !space.is_well_formed() {
        return Err(fail(format!("{name} space is empty, unordered or not finite: {space:?}")));
    }
    Ok(())
}

fn check_observation(obs: &[f32], space: &BoxSpace, context: &str) -> Result<()> {
    if obs.len() != space.dim() {
        return Err(fail(format!(
            "{context}: observation has {} components, space has {}",
            obs.len(),
            space.dim()
        )));
    }
    if !space.contains(obs) {
        return Err(fail(format!("{context}: observation {obs:?} outside {space:?}")));
    }
    Ok(())
}

pub fn check_env<E: Environment, R: Rng>(env: &mut E, rng: &mut R) -> Result<()> {
    let obs_space = env.observation_space();
    let action_space = env.action_space();
    check_space("observation", &obs_space)?;
    check_space("action", &action_space)?;

    let max_steps = env.max_episode_steps();
    if max_steps == 0 {
        return Err(fail("max_episode_steps must be positive"));
    }

    let first = env.reset();
    check_observation(first.as_ref(), &obs_space, "reset")?;
    if first.as_ref() != env.current_state().as_ref() {
        return Err(fail("current_state disagrees with the observation returned by reset"));
    }

    let mut steps = 0;
    loop {
        let raw = action_space.sample(rng);
        if !action_space.contains(&raw) {
            return Err(fail(format!("sampled action {raw:?} outside {action_space:?}")));
        }
        let action = E::Action::try_from(raw)
            .map_err(|_| fail("action type does not match the action space dimension"))?;
        if action.as_ref().len() != action_space.dim() {
            return Err(fail("action type does not match the action space dimension"));
        }

        let result = env.step(&action)?;
        steps += 1;
        let context = format!("step {steps}");
        check_observation(result.next_state.as_ref(), &obs_space, &context)?;
        if result.next_state.as_ref() != env.current_state().as_ref() {
            return Err(fail(format!("{context}: current_state disagrees with step result")));
        }
        if !result.reward.is_finite() {
            return Err(fail(format!("{context}: reward {} is not finite", result.reward)));
        }
        let collected = result.info.collection_amount();
        if !collected.is_finite() || collected < 0.0 {
            return Err(fail(format!("{context}: collection amount {collected} is invalid")));
        }

        if result.done || result.truncated {
            break;
        }
        if steps >= max_steps {
            return Err(fail(format!("episode did not end within {max_steps} steps")));
        }
    }

    // 终止后继续 step 必须报错
    let action = E::Action::try_from(action_space.sample(rng))
        .map_err(|_| fail("action type does not match the action space dimension"))?;
    match env.step(&action) {
        Err(Error::EpisodeFinished { .. }) => {}
        Err(e) => return Err(e),
        Ok(_) => return Err(fail("step after episode end was accepted")),
    }

    env.reset();
    Ok(())
}
