use crate::environment::Environment;
use crate::error::Result;
use crate::policy::Policy;

/// Summary of one call to [`Agent::learn`].
#[derive(Debug, Clone, Default)]
pub struct TrainingStats {
    pub steps: usize,
    pub episodes: usize,
    pub episode_rewards: Vec<f32>,
    /// 因超时提前结束
    pub timed_out: bool,
}

pub trait Agent<E: Environment>: Policy<E::State, E::Action> {
    // 与环境交互 total_steps 步，边采样边更新
    fn learn(&mut self, env: &mut E, total_steps: usize) -> Result<TrainingStats>;

    // deterministic = true 时不加探索噪声
    fn predict(&self, state: &E::State, deterministic: bool) -> Result<E::Action>;
}
