use seabed::agent::{Agent, TrainingStats};
use seabed::config::{ExperimentConfig, SacConfig, Scenario};
use seabed::environment::Environment;
use seabed::environments::nodule_mining::{Action, MAX_CYCLES};
use seabed::environments::{ActuatorSetting, NoduleMining, Observation};
use seabed::harness::{run_all, run_experiment, run_fixed_strategy, sac_agent};
use seabed::policies::FixedPolicy;
use seabed::policy::Policy;
use seabed::{Error, Result};

/// Agent stand-in that always plays one action and never trains.
struct ScriptedAgent {
    action: Action,
}

impl Policy<Observation, Action> for ScriptedAgent {
    fn select_action(&self, _state: &Observation) -> Result<Action> {
        Ok(self.action)
    }
}

impl Agent<NoduleMining> for ScriptedAgent {
    fn learn(&mut self, _env: &mut NoduleMining, total_steps: usize) -> Result<TrainingStats> {
        Ok(TrainingStats {
            steps: total_steps,
            ..TrainingStats::default()
        })
    }

    fn predict(&self, state: &Observation, _deterministic: bool) -> Result<Action> {
        self.select_action(state)
    }
}

fn quick_config() -> ExperimentConfig {
    ExperimentConfig {
        sac: SacConfig {
            total_steps: 0,
            device: "cpu".into(),
            ..SacConfig::default()
        },
        ..ExperimentConfig::default()
    }
}

#[test]
fn fixed_strategy_cycles_stay_in_band() {
    let mut env = NoduleMining::with_seed(10.0, 7).unwrap();
    let policy = FixedPolicy::new(ActuatorSetting::NOMINAL);
    let mut state = env.reset();
    let mut total = 0.0;
    for step in 1..=MAX_CYCLES {
        let result = env.step(&policy.select_action(&state).unwrap()).unwrap();
        let amount = result.info.collection_amount;
        // pressure 5 -> pressure_factor exactly 1
        assert_eq!(result.info.pressure_factor, 1.0);
        assert!(amount > 0.0 && amount <= 15.0 * 1.1 + 1e-4, "{amount}");
        assert!(!result.truncated);
        assert_eq!(result.done, step == MAX_CYCLES);
        total += amount as f64;
        state = result.next_state;
    }
    assert!(total > 0.0);
    assert!(matches!(
        env.step(&policy.action()),
        Err(Error::EpisodeFinished { .. })
    ));
}

#[test]
fn run_fixed_strategy_accepts_any_baseline() {
    let mut env = NoduleMining::with_seed(5.0, 8).unwrap();
    let low = run_fixed_strategy(
        &mut env,
        ActuatorSetting {
            height: 0.1,
            pressure: 0.0,
        },
    )
    .unwrap();
    assert_eq!(low, 0.0);
    let nominal = run_fixed_strategy(&mut env, ActuatorSetting::NOMINAL).unwrap();
    assert!(nominal > 0.0);
}

#[test]
fn every_canonical_scenario_yields_finite_non_negative_stats() {
    let config = quick_config();
    let results = run_all(&config, |_env, _scenario, _seed| {
        Ok(ScriptedAgent {
            action: ActuatorSetting {
                height: 0.2,
                pressure: 10.0,
            }
            .to_action(),
        })
    })
    .unwrap();

    let names: Vec<_> = results.iter().map(|r| r.scenario.as_str()).collect();
    assert_eq!(names, ["flat", "moderate", "complex"]);
    for r in &results {
        for value in [r.sac_mean, r.sac_var, r.fixed_mean, r.fixed_var] {
            assert!(value.is_finite() && value >= 0.0, "{r:?}");
        }
        // pressure 10 beats pressure 5 on yield
        assert!(r.sac_mean > r.fixed_mean, "{r:?}");
    }
}

#[test]
fn single_evaluation_episode_has_zero_variance() {
    let config = ExperimentConfig {
        repeats: 0,
        ..quick_config()
    };
    let scenario = Scenario::new("flat", 2.0);
    let result = run_experiment(&scenario, 0, &config, |_env, _scenario, _seed| {
        Ok(ScriptedAgent { action: [0.0, 0.0] })
    })
    .unwrap();
    assert_eq!(result.sac_var, 0.0);
    assert_eq!(result.fixed_var, 0.0);
    assert!(result.fixed_mean > 0.0);
}

#[test]
fn invalid_scenario_is_rejected_before_training() {
    let config = quick_config();
    let scenario = Scenario::new("broken", -1.0);
    let mut built = false;
    let err = run_experiment(&scenario, 0, &config, |_env, _scenario, _seed| {
        built = true;
        Ok(ScriptedAgent { action: [0.0, 0.0] })
    })
    .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter { name: "terrain_std", .. }));
    assert!(!built);
}

#[test]
fn failing_scenario_aborts_the_run() {
    let config = quick_config();
    let mut built = Vec::new();
    let err = run_all(&config, |_env, scenario, _seed| {
        built.push(scenario.name.clone());
        if scenario.name == "moderate" {
            return Err(Error::UnknownDevice("tpu".into()));
        }
        Ok(ScriptedAgent { action: [0.0, 0.0] })
    })
    .unwrap_err();
    assert!(matches!(err, Error::UnknownDevice(_)));
    assert_eq!(built, ["flat", "moderate"]);
}

#[test]
fn run_all_covers_the_canonical_scenarios() {
    let mut seen = Vec::new();
    run_all(&quick_config(), |env, scenario, seed| {
        seen.push((scenario.clone(), env.terrain_std(), seed));
        Ok(ScriptedAgent { action: [0.0, 0.0] })
    })
    .unwrap();
    let scenarios: Vec<_> = seen.iter().map(|(s, _, _)| s.clone()).collect();
    assert_eq!(scenarios, Scenario::canonical());
    for (scenario, terrain_std, _) in &seen {
        assert_eq!(*terrain_std, scenario.terrain_std);
    }
    // each scenario's agent gets its own seed
    assert_ne!(seen[0].2, seen[1].2);
    assert_ne!(seen[1].2, seen[2].2);
    assert_ne!(seen[0].2, seen[2].2);
}

#[test]
fn out_of_range_baseline_aborts_the_experiment() {
    let config = ExperimentConfig {
        baseline: ActuatorSetting {
            height: 0.5,
            pressure: 12.0,
        },
        ..quick_config()
    };
    let err = run_all(&config, |_env, _scenario, _seed| {
        Ok(ScriptedAgent { action: [0.0, 0.0] })
    })
    .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter { name: "baseline.pressure", .. }));
}

#[test]
fn agent_factory_errors_propagate() {
    let config = quick_config();
    let err = run_all(&config, |_env, _scenario, _seed| -> Result<ScriptedAgent> {
        Err(Error::UnknownDevice("tpu".into()))
    })
    .unwrap_err();
    assert!(matches!(err, Error::UnknownDevice(_)));
}

#[test]
fn sac_experiment_smoke() {
    let config = ExperimentConfig {
        repeats: 1,
        sac: SacConfig {
            total_steps: 300,
            warmup_steps: 100,
            batch_size: 32,
            hidden_sizes: vec![32, 32],
            device: "cpu".into(),
            ..SacConfig::default()
        },
        ..ExperimentConfig::default()
    };
    let scenario = Scenario::new("moderate", 5.0);
    let result = run_experiment(&scenario, 1, &config, |env, scenario, seed| {
        sac_agent(env, scenario, seed, &config.sac)
    })
    .unwrap();
    assert_eq!(result.scenario, "moderate");
    for value in [result.sac_mean, result.sac_var, result.fixed_mean, result.fixed_var] {
        assert!(value.is_finite() && value >= 0.0, "{result:?}");
    }
}

#[test]
fn environment_exposes_documented_spaces() {
    let env = NoduleMining::with_seed(2.0, 0).unwrap();
    let obs = env.observation_space();
    assert_eq!(obs.low, vec![-10.0, 0.4, 0.0, 0.1]);
    assert_eq!(obs.high, vec![10.0, 1.0, 10.0, 1.0]);
    assert_eq!(env.action_space().dim(), 2);
    assert_eq!(env.max_episode_steps(), 200);
}
