use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tch::Device;

use crate::environments::ActuatorSetting;
use crate::environments::nodule_mining::{PRESSURE_BOUNDS, TOOL_HEIGHT_BOUNDS};
use crate::error::{Error, Result};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "SEABED_CONFIG";

/// A named terrain-volatility configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub terrain_std: f32,
}

impl Scenario {
    pub fn new(name: impl Into<String>, terrain_std: f32) -> Self {
        Self {
            name: name.into(),
            terrain_std,
        }
    }

    /// flat / moderate / complex, the fixed evaluation set
    pub fn canonical() -> Vec<Scenario> {
        vec![
            Scenario::new("flat", 2.0),
            Scenario::new("moderate", 5.0),
            Scenario::new("complex", 10.0),
        ]
    }
}

/// 熵目标：`Auto` 取 -action_dim
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetEntropy {
    #[default]
    Auto,
    Value(f64),
}

impl TargetEntropy {
    pub fn resolve(&self, action_dim: usize) -> f64 {
        match *self {
            TargetEntropy::Auto => -(action_dim as f64),
            TargetEntropy::Value(v) => v,
        }
    }
}

/// SAC 超参数，对环境与评估逻辑不透明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SacConfig {
    pub gamma: f64,
    pub learning_rate: f64,
    pub target_entropy: TargetEntropy,
    pub tau: f64,
    pub batch_size: usize,
    pub buffer_capacity: usize,
    /// Uniform random actions before the first update.
    pub warmup_steps: usize,
    pub hidden_sizes: Vec<usize>,
    /// "auto", "cpu" or "cuda"
    pub device: String,
    /// Base seed; each scenario's agent gets its own seed derived from it.
    pub seed: u64,
    pub total_steps: usize,
    pub max_train_secs: Option<u64>,
    pub plot_training: bool,
}

impl Default for SacConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            learning_rate: 3e-4,
            target_entropy: TargetEntropy::Auto,
            tau: 0.005,
            batch_size: 64,
            buffer_capacity: 100_000,
            warmup_steps: 200,
            hidden_sizes: vec![64, 64],
            device: "auto".to_string(),
            seed: 42,
            total_steps: 5_000,
            max_train_secs: None,
            plot_training: false,
        }
    }
}

impl SacConfig {
    pub fn device(&self) -> Result<Device> {
        match self.device.as_str() {
            "auto" => Ok(Device::cuda_if_available()),
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda(0)),
            other => Err(Error::UnknownDevice(other.to_string())),
        }
    }
}

/// Scenarios are not part of the config: every run covers [`Scenario::canonical`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub seed: u64,
    /// Evaluation episodes per strategy after the first one.
    pub repeats: usize,
    pub baseline: ActuatorSetting,
    pub sac: SacConfig,
    pub output_csv: PathBuf,
    pub output_chart: Option<PathBuf>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            repeats: 5,
            baseline: ActuatorSetting::NOMINAL,
            sac: SacConfig::default(),
            output_csv: PathBuf::from("experiment_results.csv"),
            output_chart: None,
        }
    }
}

impl ExperimentConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// The fixed baseline must decode from an action inside [-1, 1]^2.
    pub fn validate(&self) -> Result<()> {
        let ActuatorSetting { height, pressure } = self.baseline;
        if !(TOOL_HEIGHT_BOUNDS.0..=TOOL_HEIGHT_BOUNDS.1).contains(&height) {
            return Err(Error::InvalidParameter {
                name: "baseline.height",
                value: height as f64,
            });
        }
        if !(PRESSURE_BOUNDS.0..=PRESSURE_BOUNDS.1).contains(&pressure) {
            return Err(Error::InvalidParameter {
                name: "baseline.pressure",
                value: pressure as f64,
            });
        }
        Ok(())
    }

    /// `SEABED_CONFIG` if set, defaults otherwise.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                tracing::info!("Loading config from {}", Path::new(&path).display());
                Self::from_path(path)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_experiment() {
        let config = ExperimentConfig::default();
        let names: Vec<_> = Scenario::canonical().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["flat", "moderate", "complex"]);
        assert_eq!(config.sac.target_entropy, TargetEntropy::Auto);
        assert_eq!(config.repeats, 5);
        assert_eq!(config.baseline, ActuatorSetting { height: 0.5, pressure: 5.0 });
        assert_eq!(config.output_csv, PathBuf::from("experiment_results.csv"));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{ "repeats": 2, "sac": { "total_steps": 100, "device": "cpu" } }"#;
        let config: ExperimentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.repeats, 2);
        assert_eq!(config.sac.total_steps, 100);
        assert_eq!(config.sac.batch_size, 64);
        assert_eq!(config.sac.device().unwrap(), Device::Cpu);
    }

    #[test]
    fn unknown_device_is_rejected() {
        let sac = SacConfig {
            device: "tpu".into(),
            ..SacConfig::default()
        };
        assert!(matches!(sac.device(), Err(Error::UnknownDevice(_))));
    }

    #[test]
    fn scenario_list_cannot_be_overridden() {
        let json = r#"{ "scenarios": [{ "name": "x", "terrain_std": 1.0 }] }"#;
        assert!(serde_json::from_str::<ExperimentConfig>(json).is_err());
    }

    #[test]
    fn target_entropy_accepts_auto_or_value() {
        let auto = r#"{ "target_entropy": "auto" }"#;
        let sac: SacConfig = serde_json::from_str(auto).unwrap();
        assert_eq!(sac.target_entropy.resolve(2), -2.0);
        let fixed = r#"{ "target_entropy": { "value": -0.5 } }"#;
        let sac: SacConfig = serde_json::from_str(fixed).unwrap();
        assert_eq!(sac.target_entropy, TargetEntropy::Value(-0.5));
        assert_eq!(sac.target_entropy.resolve(2), -0.5);
    }

    #[test]
    fn out_of_range_baseline_is_rejected() {
        let mut config = ExperimentConfig::default();
        config.baseline.pressure = 12.0;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidParameter { name: "baseline.pressure", .. })
        ));
        config.baseline = ActuatorSetting { height: 0.05, pressure: 5.0 };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidParameter { name: "baseline.height", .. })
        ));
        config.baseline = ActuatorSetting { height: 1.0, pressure: 10.0 };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_path_validates_baseline() {
        let name = format!("seabed-config-{}.json", std::process::id());
        let path = std::env::temp_dir().join(name);
        let json = r#"{ "baseline": { "height": 0.5, "pressure": 11.0 } }"#;
        std::fs::write(&path, json).unwrap();
        let result = ExperimentConfig::from_path(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }
}
