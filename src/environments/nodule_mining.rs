use crate::environment::{Environment, StepResult, YieldInfo};
use crate::error::{Error, Result};
use crate::spaces::BoxSpace;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

pub const MAX_CYCLES: usize = 200;
/// kg/min
pub const MAX_COLLECTION_RATE: f32 = 15.0;

pub const ANGLE_BOUNDS: (f32, f32) = (-10.0, 10.0);
pub const SHEAR_BOUNDS: (f32, f32) = (0.4, 1.0);
pub const PRESSURE_BOUNDS: (f32, f32) = (0.0, 10.0);
pub const TOOL_HEIGHT_BOUNDS: (f32, f32) = (0.1, 1.0);

/// angle, shear strength, pressure, tool height
const OBSERVATION_BOUNDS: [(f32, f32); 4] = [
    ANGLE_BOUNDS,
    SHEAR_BOUNDS,
    PRESSURE_BOUNDS,
    TOOL_HEIGHT_BOUNDS,
];

const SHEAR_DRIFT_STD: f32 = 0.03;
const YIELD_NOISE: (f32, f32) = (0.9, 1.1);
const PRESSURE_COST: f32 = 0.003;
const HEIGHT_COST: f32 = 0.1;
const HEIGHT_TARGET: f32 = 0.2;

/// 归一化动作 [height, pressure]，每一维在 [-1, 1]
pub type Action = [f32; 2];

/// 观测向量 [angle, shear_strength, pressure, tool_height]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation([f32; 4]);

impl Observation {
    pub fn new(angle: f32, shear_strength: f32, pressure: f32, tool_height: f32) -> Self {
        Self([
            angle.clamp(ANGLE_BOUNDS.0, ANGLE_BOUNDS.1),
            shear_strength.clamp(SHEAR_BOUNDS.0, SHEAR_BOUNDS.1),
            pressure.clamp(PRESSURE_BOUNDS.0, PRESSURE_BOUNDS.1),
            tool_height.clamp(TOOL_HEIGHT_BOUNDS.0, TOOL_HEIGHT_BOUNDS.1),
        ])
    }

    /// Terrain slope proxy.
    pub fn angle(&self) -> f32 {
        self.0[0]
    }

    pub fn shear_strength(&self) -> f32 {
        self.0[1]
    }

    pub fn pressure(&self) -> f32 {
        self.0[2]
    }

    pub fn tool_height(&self) -> f32 {
        self.0[3]
    }
}

impl AsRef<[f32]> for Observation {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Physical actuator controls: tool height in metres, hydraulic pressure.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActuatorSetting {
    pub height: f32,
    pub pressure: f32,
}

impl ActuatorSetting {
    pub const NOMINAL: ActuatorSetting = ActuatorSetting {
        height: 0.5,
        pressure: 5.0,
    };

    /// height ∈ [0.1, 1.0], pressure ∈ [0, 10]
    pub fn from_action(action: &Action) -> Self {
        Self {
            height: 0.45 * (action[0] + 1.0) + 0.1,
            pressure: 5.0 * (action[1] + 1.0),
        }
    }

    pub fn to_action(&self) -> Action {
        [(self.height - 0.1) / 0.45 - 1.0, self.pressure / 5.0 - 1.0]
    }
}

impl Default for ActuatorSetting {
    fn default() -> Self {
        Self::NOMINAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiningInfo {
    /// kg collected during this cycle
    pub collection_amount: f32,
    pub terrain_factor: f32,
    pub pressure_factor: f32,
    pub step: usize,
}

impl YieldInfo for MiningInfo {
    fn collection_amount(&self) -> f32 {
        self.collection_amount
    }
}

/// Yield multiplier from slope, floored at 0.5.
pub fn terrain_factor(angle: f32) -> f32 {
    (1.0 - (angle.abs() / 10.0) * 0.3).max(0.5)
}

/// Yield multiplier from pressure, capped at 1.5.
pub fn pressure_factor(pressure: f32) -> f32 {
    (pressure / 5.0).min(1.5)
}

/// 深海结核采集过程：每一步模拟一分钟的采集循环
pub struct NoduleMining<R: Rng = StdRng> {
    state: Observation,
    step_count: usize,
    terrain_std: f32,
    angle_drift: Normal<f32>,
    shear_drift: Normal<f32>,
    rng: R,
}

impl NoduleMining<StdRng> {
    pub fn with_seed(terrain_std: f32, seed: u64) -> Result<Self> {
        Self::with_rng(terrain_std, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> NoduleMining<R> {
    /// The returned environment is already reset.
    pub fn with_rng(terrain_std: f32, rng: R) -> Result<Self> {
        let invalid = Error::InvalidParameter {
            name: "terrain_std",
            value: terrain_std as f64,
        };
        if !terrain_std.is_finite() || terrain_std < 0.0 {
            return Err(invalid);
        }
        let angle_drift = Normal::new(0.0, terrain_std).map_err(|_| invalid)?;
        let shear_drift =
            Normal::new(0.0, SHEAR_DRIFT_STD).map_err(|_| Error::InvalidParameter {
                name: "shear_drift_std",
                value: SHEAR_DRIFT_STD as f64,
            })?;

        let mut env = Self {
            state: Observation::new(0.0, SHEAR_BOUNDS.0, PRESSURE_BOUNDS.0, TOOL_HEIGHT_BOUNDS.0),
            step_count: 0,
            terrain_std,
            angle_drift,
            shear_drift,
            rng,
        };
        env.reset();
        Ok(env)
    }

    pub fn terrain_std(&self) -> f32 {
        self.terrain_std
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn is_done(&self) -> bool {
        self.step_count >= MAX_CYCLES
    }
}

impl<R: Rng> Environment for NoduleMining<R> {
    type State = Observation;
    type Action = Action;
    type Info = MiningInfo;

    fn reset(&mut self) -> Self::State {
        self.state = Observation::new(
            self.rng.random_range(ANGLE_BOUNDS.0..ANGLE_BOUNDS.1),
            self.rng.random_range(SHEAR_BOUNDS.0..SHEAR_BOUNDS.1),
            self.rng.random_range(PRESSURE_BOUNDS.0..PRESSURE_BOUNDS.1),
            self.rng.random_range(TOOL_HEIGHT_BOUNDS.0..TOOL_HEIGHT_BOUNDS.1),
        );
        self.step_count = 0;
        self.state
    }

    fn step(&mut self, action: &Self::Action) -> Result<StepResult<Self::State, Self::Info>> {
        if self.is_done() {
            return Err(Error::EpisodeFinished {
                steps: self.step_count,
            });
        }

        let ActuatorSetting { height, pressure } = ActuatorSetting::from_action(action);

        // 外生动力学：坡度随机游走，底质强度缓慢漂移
        let angle = (self.state.angle() + self.angle_drift.sample(&mut self.rng))
            .clamp(ANGLE_BOUNDS.0, ANGLE_BOUNDS.1);
        let shear_strength = (self.state.shear_strength() + self.shear_drift.sample(&mut self.rng))
            .clamp(SHEAR_BOUNDS.0, SHEAR_BOUNDS.1);

        let terrain = terrain_factor(angle);
        let press = pressure_factor(pressure);
        let base_collection = MAX_COLLECTION_RATE * shear_strength * terrain * press;
        let collection_amount =
            base_collection * self.rng.random_range(YIELD_NOISE.0..YIELD_NOISE.1);

        let reward = collection_amount
            - PRESSURE_COST * pressure.powi(2)
            - HEIGHT_COST * (height - HEIGHT_TARGET).powi(2);

        // no actuator inertia: pressure and height are the decoded action
        self.state = Observation::new(angle, shear_strength, pressure, height);
        self.step_count += 1;

        Ok(StepResult {
            next_state: self.state,
            reward,
            done: self.is_done(),
            truncated: false,
            info: MiningInfo {
                collection_amount,
                terrain_factor: terrain,
                pressure_factor: press,
                step: self.step_count,
            },
        })
    }

    fn current_state(&self) -> Self::State {
        self.state
    }

    fn observation_space(&self) -> BoxSpace {
        let (low, high) = OBSERVATION_BOUNDS.into_iter().unzip();
        BoxSpace::new(low, high)
    }

    fn action_space(&self) -> BoxSpace {
        BoxSpace::uniform(2, -1.0, 1.0)
    }

    fn max_episode_steps(&self) -> usize {
        MAX_CYCLES
    }
}
