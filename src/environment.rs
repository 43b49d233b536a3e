// environment trait
use crate::error::Result;
use crate::spaces::BoxSpace;

pub struct StepResult<S, I> {
    pub next_state: S,
    pub reward: f32,
    pub done: bool,
    pub truncated: bool,
    pub info: I,
}

/// Per-step side channel that carries the yield of one cycle.
pub trait YieldInfo {
    fn collection_amount(&self) -> f32;
}

pub trait Environment {
    type State: Clone + AsRef<[f32]>;
    type Action: Clone + AsRef<[f32]> + TryFrom<Vec<f32>>;
    type Info: YieldInfo;

    fn reset(&mut self) -> Self::State;

    /// 终止后再调用返回 `Error::EpisodeFinished`
    fn step(&mut self, action: &Self::Action) -> Result<StepResult<Self::State, Self::Info>>;

    /// 获取当前状态
    fn current_state(&self) -> Self::State;

    fn observation_space(&self) -> BoxSpace;

    fn action_space(&self) -> BoxSpace;

    /// 每个 episode 的最大步数
    fn max_episode_steps(&self) -> usize;
}
