use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::agent::Agent;
use crate::algorithms::sac::SacAgent;
use crate::config::{ExperimentConfig, SacConfig, Scenario};
use crate::env_checker::check_env;
use crate::environment::{Environment, YieldInfo};
use crate::environments::{ActuatorSetting, NoduleMining};
use crate::error::Result;
use crate::policies::FixedPolicy;
use crate::policy::Policy;
use crate::utils::{mean, population_variance};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    /// kg
    pub total_yield: f64,
    pub total_reward: f64,
    pub steps: usize,
}

/// Mean and population variance of total yield over repeated episodes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    pub mean: f64,
    pub variance: f64,
}

impl RunStats {
    pub fn from_totals(totals: &[f64]) -> Self {
        Self {
            mean: mean(totals),
            variance: population_variance(totals),
        }
    }
}

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentResult {
    pub scenario: String,
    pub sac_mean: f64,
    pub sac_var: f64,
    pub fixed_mean: f64,
    pub fixed_var: f64,
}

impl ExperimentResult {
    pub fn new(scenario: impl Into<String>, agent: RunStats, fixed: RunStats) -> Self {
        Self {
            scenario: scenario.into(),
            sac_mean: agent.mean,
            sac_var: agent.variance,
            fixed_mean: fixed.mean,
            fixed_var: fixed.variance,
        }
    }
}

/// Reset `env` and follow `policy` until the episode ends or `max_episode_steps` is hit.
pub fn run_episode<E, P>(env: &mut E, policy: &P) -> Result<EpisodeSummary>
where
    E: Environment,
    P: Policy<E::State, E::Action> + ?Sized,
{
    let mut state = env.reset();
    let mut summary = EpisodeSummary {
        total_yield: 0.0,
        total_reward: 0.0,
        steps: 0,
    };

    for _ in 0..env.max_episode_steps() {
        let action = policy.select_action(&state)?;
        let result = env.step(&action)?;
        summary.total_yield += result.info.collection_amount() as f64;
        summary.total_reward += result.reward as f64;
        summary.steps += 1;

        if result.done || result.truncated {
            break;
        }
        state = result.next_state;
    }

    Ok(summary)
}

/// Total yield of one episode holding `setting` constant.
pub fn run_fixed_strategy<R: rand::Rng>(
    env: &mut NoduleMining<R>,
    setting: ActuatorSetting,
) -> Result<f64> {
    let summary = run_episode(env, &FixedPolicy::new(setting))?;
    Ok(summary.total_yield)
}

fn repeated_totals<E, P>(env: &mut E, policy: &P, episodes: usize) -> Result<Vec<f64>>
where
    E: Environment,
    P: Policy<E::State, E::Action> + ?Sized,
{
    (0..episodes)
        .map(|_| run_episode(env, policy).map(|s| s.total_yield))
        .collect()
}

/// Per-scenario seed so scenarios do not share random streams.
pub fn scenario_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add((index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Action stream for the conformance check, disjoint from the environment's own.
fn checker_seed(env_seed: u64) -> u64 {
    env_seed ^ 0xD1B5_4A32_D192_ED03
}

/// Train an agent on `scenario` and compare it with the fixed baseline.
///
/// `make_agent` receives the checked environment, the scenario and a per-scenario
/// agent seed derived from `config.sac.seed`, so callers can substitute any [`Agent`].
/// Errors from validation, the check, training or evaluation abort the experiment.
pub fn run_experiment<A, F>(
    scenario: &Scenario,
    index: usize,
    config: &ExperimentConfig,
    make_agent: F,
) -> Result<ExperimentResult>
where
    A: Agent<NoduleMining>,
    F: FnOnce(&NoduleMining, &Scenario, u64) -> Result<A>,
{
    config.validate()?;
    let seed = scenario_seed(config.seed, index);
    let mut env = NoduleMining::with_seed(scenario.terrain_std, seed)?;
    check_env(&mut env, &mut StdRng::seed_from_u64(checker_seed(seed)))?;

    let agent_seed = scenario_seed(config.sac.seed, index);
    let mut agent = make_agent(&env, scenario, agent_seed)?;
    tracing::info!(
        "[{}] training agent for {} steps (terrain_std = {})",
        scenario.name,
        config.sac.total_steps,
        env.terrain_std()
    );
    let stats = agent.learn(&mut env, config.sac.total_steps)?;
    tracing::info!(
        "[{}] training finished: {} steps, {} episodes",
        scenario.name,
        stats.steps,
        stats.episodes
    );

    let fixed = FixedPolicy::new(config.baseline);
    let episodes = 1 + config.repeats;
    let agent_totals = repeated_totals(&mut env, &agent, episodes)?;
    let fixed_totals = repeated_totals(&mut env, &fixed, episodes)?;
    tracing::debug!("[{}] agent totals: {:?}", scenario.name, agent_totals);
    tracing::debug!("[{}] fixed totals: {:?}", scenario.name, fixed_totals);

    let result = ExperimentResult::new(
        scenario.name.clone(),
        RunStats::from_totals(&agent_totals),
        RunStats::from_totals(&fixed_totals),
    );
    tracing::info!(
        "[{}] agent mean = {:.2} (var {:.2}), fixed mean = {:.2} (var {:.2})",
        result.scenario,
        result.sac_mean,
        result.sac_var,
        result.fixed_mean,
        result.fixed_var
    );
    Ok(result)
}

/// Build the SAC agent for one scenario from `config`, seeded with `seed`.
pub fn sac_agent(
    env: &NoduleMining,
    scenario: &Scenario,
    seed: u64,
    config: &SacConfig,
) -> Result<SacAgent<NoduleMining>> {
    let seeded = SacConfig {
        seed,
        ..config.clone()
    };
    let mut agent = SacAgent::new(env, seeded)?;
    if config.plot_training {
        agent.set_plot_path(format!("sac_training_{}.png", scenario.name));
    }
    Ok(agent)
}

/// Run the canonical scenarios in order; the first failure aborts the run.
pub fn run_all<A, F>(
    config: &ExperimentConfig,
    mut make_agent: F,
) -> Result<Vec<ExperimentResult>>
where
    A: Agent<NoduleMining>,
    F: FnMut(&NoduleMining, &Scenario, u64) -> Result<A>,
{
    Scenario::canonical()
        .iter()
        .enumerate()
        .map(|(index, scenario)| run_experiment(scenario, index, config, &mut make_agent))
        .collect()
}
