pub mod nodule_mining;

pub use nodule_mining::{ActuatorSetting, MiningInfo, NoduleMining, Observation};
