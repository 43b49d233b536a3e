use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::agent::{Agent, TrainingStats};
use crate::config::SacConfig;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::networks::mlp::MLP;
use crate::policy::Policy;
use crate::replay_buffer::{ReplayBuffer, Transition};
use crate::spaces::BoxSpace;
use crate::utils::ToTensor;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tch::nn::{Module, OptimizerConfig};
use tch::{Device, Kind, Tensor, nn};

const LOG_STD_MIN: f64 = -20.0;
const LOG_STD_MAX: f64 = 2.0;
const LOG_PROB_EPS: f64 = 1e-6;
const LOG_EVERY_EPISODES: usize = 10;

/// Soft Actor-Critic：tanh 压缩的高斯策略 + 双 Q 网络 + 自动熵调节
pub struct SacAgent<E: Environment> {
    actor: MLP,
    q1: MLP,
    q2: MLP,
    q1_target: MLP,
    q2_target: MLP,
    actor_opt: nn::Optimizer,
    q1_opt: nn::Optimizer,
    q2_opt: nn::Optimizer,
    log_alpha: Tensor,
    alpha_opt: nn::Optimizer,
    _alpha_vs: nn::VarStore,
    target_entropy: f64,
    buffer: ReplayBuffer,
    obs_center: Tensor,
    obs_half_range: Tensor,
    action_space: BoxSpace,
    obs_dim: usize,
    action_dim: usize,
    total_steps: usize,
    plot_path: Option<PathBuf>,
    config: SacConfig,
    device: Device,
    rng: StdRng,
    _marker: std::marker::PhantomData<E>,
}

impl<E: Environment> SacAgent<E>
where
    E::State: ToTensor,
{
    pub fn new(env: &E, config: SacConfig) -> Result<Self> {
        let device = config.device()?;

        let obs_space = env.observation_space();
        let action_space = env.action_space();
        let obs_dim = obs_space.dim();
        let action_dim = action_space.dim();
        let hidden = &config.hidden_sizes;

        // actor 输出 [mean, log_std]
        let actor = MLP::new(nn::VarStore::new(device), obs_dim, hidden, 2 * action_dim);
        let q1 = MLP::new(nn::VarStore::new(device), obs_dim + action_dim, hidden, 1);
        let q2 = MLP::new(nn::VarStore::new(device), obs_dim + action_dim, hidden, 1);
        let mut q1_target = MLP::new(nn::VarStore::new(device), obs_dim + action_dim, hidden, 1);
        let mut q2_target = MLP::new(nn::VarStore::new(device), obs_dim + action_dim, hidden, 1);
        q1_target.var_store.copy(q1.var_store())?;
        q2_target.var_store.copy(q2.var_store())?;
        q1_target.var_store.freeze();
        q2_target.var_store.freeze();

        let lr = config.learning_rate;
        let actor_opt = nn::Adam::default().build(actor.var_store(), lr)?;
        let q1_opt = nn::Adam::default().build(q1.var_store(), lr)?;
        let q2_opt = nn::Adam::default().build(q2.var_store(), lr)?;

        let alpha_vs = nn::VarStore::new(device);
        let log_alpha = alpha_vs.root().var("log_alpha", &[1], nn::Init::Const(0.0));
        let alpha_opt = nn::Adam::default().build(&alpha_vs, lr)?;

        let center: Vec<f32> = obs_space
            .low
            .iter()
            .zip(&obs_space.high)
            .map(|(lo, hi)| (lo + hi) / 2.0)
            .collect();
        let half_range: Vec<f32> = obs_space
            .low
            .iter()
            .zip(&obs_space.high)
            .map(|(lo, hi)| ((hi - lo) / 2.0).max(f32::EPSILON))
            .collect();

        Ok(SacAgent {
            actor,
            q1,
            q2,
            q1_target,
            q2_target,
            actor_opt,
            q1_opt,
            q2_opt,
            log_alpha,
            alpha_opt,
            _alpha_vs: alpha_vs,
            target_entropy: config.target_entropy.resolve(action_dim),
            buffer: ReplayBuffer::new(config.buffer_capacity),
            obs_center: Tensor::from_slice(&center).unsqueeze(0).to_device(device),
            obs_half_range: Tensor::from_slice(&half_range).unsqueeze(0).to_device(device),
            action_space,
            obs_dim,
            action_dim,
            total_steps: 0,
            plot_path: None,
            rng: StdRng::seed_from_u64(config.seed),
            config,
            device,
            _marker: std::marker::PhantomData,
        })
    }

    /// Save the episode-reward curve here after each `learn` call.
    pub fn set_plot_path(&mut self, path: impl Into<PathBuf>) {
        self.plot_path = Some(path.into());
    }

    pub fn alpha(&self) -> f64 {
        self.log_alpha.exp().double_value(&[0])
    }

    pub fn target_entropy(&self) -> f64 {
        self.target_entropy
    }

    fn normalize(&self, obs: Tensor) -> Tensor {
        (obs.to_device(self.device) - &self.obs_center) / &self.obs_half_range
    }

    /// 重参数化采样，返回 (tanh 动作, log π)
    fn sample(&self, obs: &Tensor) -> (Tensor, Tensor) {
        let out = self.actor.model.forward(obs);
        let chunks = out.chunk(2, -1);
        let mean = &chunks[0];
        let log_std = chunks[1].clamp(LOG_STD_MIN, LOG_STD_MAX);
        let std = log_std.exp();

        let noise = mean.randn_like();
        let action = (mean + &std * &noise).tanh();

        let gaussian =
            -0.5 * noise.pow_tensor_scalar(2) - &log_std - 0.5 * (2.0 * std::f64::consts::PI).ln();
        let squash = (1.0 - action.pow_tensor_scalar(2) + LOG_PROB_EPS).log();
        let log_prob = (gaussian - squash).sum_dim_intlist(-1, true, Kind::Float);
        (action, log_prob)
    }

    fn q_input(states: &Tensor, actions: &Tensor) -> Tensor {
        Tensor::cat(&[states, actions], 1)
    }

    /// [-1, 1] -> action space bounds
    fn scale_action(&self, unit: &[f32]) -> Vec<f32> {
        unit.iter()
            .zip(self.action_space.low.iter().zip(&self.action_space.high))
            .map(|(a, (lo, hi))| lo + (a + 1.0) * 0.5 * (hi - lo))
            .collect()
    }

    fn unscale_action(&self, action: &[f32]) -> Vec<f32> {
        action
            .iter()
            .zip(self.action_space.low.iter().zip(&self.action_space.high))
            .map(|(a, (lo, hi))| {
                if hi > lo {
                    (2.0 * (a - lo) / (hi - lo) - 1.0).clamp(-1.0, 1.0)
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn act_raw(&self, state: &E::State, deterministic: bool) -> Vec<f32> {
        let unit = tch::no_grad(|| {
            let obs = self.normalize(state.to_tensor());
            let action = if deterministic {
                self.actor.model.forward(&obs).chunk(2, -1)[0].tanh()
            } else {
                self.sample(&obs).0
            };
            (0..self.action_dim as i64)
                .map(|i| action.double_value(&[0, i]) as f32)
                .collect::<Vec<_>>()
        });
        self.scale_action(&unit)
    }

    fn to_action(&self, raw: Vec<f32>) -> Result<E::Action> {
        let got = raw.len();
        E::Action::try_from(raw).map_err(|_| Error::ActionShape {
            expected: self.action_dim,
            got,
        })
    }

    fn update(&mut self) {
        let batch = self.buffer.sample(self.config.batch_size, &mut self.rng);
        let n = batch.len as i64;
        let obs_dim = self.obs_dim as i64;
        let action_dim = self.action_dim as i64;

        let states = self.normalize(Tensor::from_slice(&batch.states).view([n, obs_dim]));
        let next_states = self.normalize(Tensor::from_slice(&batch.next_states).view([n, obs_dim]));
        let actions = Tensor::from_slice(&batch.actions)
            .view([n, action_dim])
            .to_device(self.device);
        let rewards = Tensor::from_slice(&batch.rewards)
            .view([n, 1])
            .to_device(self.device);
        let not_dones = Tensor::from_slice(&batch.not_dones)
            .view([n, 1])
            .to_device(self.device);

        let alpha = self.log_alpha.exp().detach();

        // soft Bellman target
        let target_q = tch::no_grad(|| {
            let (next_actions, next_log_prob) = self.sample(&next_states);
            let input = Self::q_input(&next_states, &next_actions);
            let q1_t = self.q1_target.model.forward(&input);
            let q2_t = self.q2_target.model.forward(&input);
            let soft_q = q1_t.min_other(&q2_t) - &alpha * next_log_prob;
            &rewards + self.config.gamma * (not_dones * soft_q)
        });

        let input = Self::q_input(&states, &actions);
        let q1_loss = (self.q1.model.forward(&input) - &target_q)
            .pow_tensor_scalar(2)
            .mean(Kind::Float);
        self.q1_opt.backward_step(&q1_loss);
        let q2_loss = (self.q2.model.forward(&input) - &target_q)
            .pow_tensor_scalar(2)
            .mean(Kind::Float);
        self.q2_opt.backward_step(&q2_loss);

        let (new_actions, log_prob) = self.sample(&states);
        let input = Self::q_input(&states, &new_actions);
        let q_new = self
            .q1
            .model
            .forward(&input)
            .min_other(&self.q2.model.forward(&input));
        let actor_loss = (&alpha * &log_prob - q_new).mean(Kind::Float);
        self.actor_opt.backward_step(&actor_loss);

        let alpha_loss =
            -(&self.log_alpha * (log_prob.detach() + self.target_entropy)).mean(Kind::Float);
        self.alpha_opt.backward_step(&alpha_loss);

        soft_update(&self.q1_target, &self.q1, self.config.tau);
        soft_update(&self.q2_target, &self.q2, self.config.tau);
    }
}

/// Polyak averaging: target <- tau * source + (1 - tau) * target
fn soft_update(target: &MLP, source: &MLP, tau: f64) {
    tch::no_grad(|| {
        let source_vars = source.var_store.variables();
        for (name, mut dest) in target.var_store.variables() {
            if let Some(src) = source_vars.get(&name) {
                let mixed = src * tau + &dest * (1.0 - tau);
                dest.copy_(&mixed);
            }
        }
    });
}

impl<E: Environment> Policy<E::State, E::Action> for SacAgent<E>
where
    E::State: ToTensor,
{
    fn select_action(&self, state: &E::State) -> Result<E::Action> {
        self.predict(state, true)
    }
}

impl<E: Environment> Agent<E> for SacAgent<E>
where
    E::State: ToTensor,
{
    fn learn(&mut self, env: &mut E, total_steps: usize) -> Result<TrainingStats> {
        let started = Instant::now();
        let limit = self.config.max_train_secs.map(Duration::from_secs);
        let mut stats = TrainingStats::default();
        let mut episode_reward = 0.0;
        let mut state = env.reset();

        for _ in 0..total_steps {
            if let Some(limit) = limit {
                if started.elapsed() >= limit {
                    tracing::warn!(
                        "Training stopped after {} of {} steps: time limit of {:?} reached",
                        stats.steps,
                        total_steps,
                        limit
                    );
                    stats.timed_out = true;
                    break;
                }
            }

            let raw = if self.total_steps < self.config.warmup_steps {
                self.action_space.sample(&mut self.rng)
            } else {
                self.act_raw(&state, false)
            };
            let unit = self.unscale_action(&raw);
            let action = self.to_action(raw)?;

            let result = env.step(&action)?;
            episode_reward += result.reward;
            self.buffer.push(Transition {
                state: state.as_ref().to_vec(),
                action: unit,
                reward: result.reward,
                next_state: result.next_state.as_ref().to_vec(),
                done: result.done,
            });
            self.total_steps += 1;
            stats.steps += 1;

            if self.total_steps >= self.config.warmup_steps
                && self.buffer.len() >= self.config.batch_size
            {
                self.update();
            }

            if result.done || result.truncated {
                stats.episodes += 1;
                stats.episode_rewards.push(episode_reward);
                tracing::debug!(
                    "Episode {}: total reward = {}",
                    stats.episodes,
                    episode_reward
                );
                if stats.episodes % LOG_EVERY_EPISODES == 0 {
                    let recent = &stats.episode_rewards[stats.episodes - LOG_EVERY_EPISODES..];
                    tracing::info!(
                        "SAC step {}: mean reward over last {} episodes = {:.2}, alpha = {:.4}",
                        self.total_steps,
                        LOG_EVERY_EPISODES,
                        recent.iter().sum::<f32>() / LOG_EVERY_EPISODES as f32,
                        self.alpha()
                    );
                }
                episode_reward = 0.0;
                state = env.reset();
            } else {
                state = result.next_state;
            }
        }

        if let Some(path) = &self.plot_path {
            crate::utils::plot_rewards(
                &stats.episode_rewards,
                &path.to_string_lossy(),
                "SAC Training Reward",
            )?;
        }
        Ok(stats)
    }

    fn predict(&self, state: &E::State, deterministic: bool) -> Result<E::Action> {
        self.to_action(self.act_raw(state, deterministic))
    }
}
