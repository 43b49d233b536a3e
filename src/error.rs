use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("episode finished after {steps} steps; reset before stepping again")]
    EpisodeFinished { steps: usize },
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("environment check failed: {0}")]
    EnvCheck(String),
    #[error("action has {got} components, expected {expected}")]
    ActionShape { expected: usize, got: usize },
    #[error("unknown device `{0}` (expected auto, cpu or cuda)")]
    UnknownDevice(String),
    #[error("plot failed: {0}")]
    Plot(String),
    #[error(transparent)]
    Torch(#[from] tch::TchError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
