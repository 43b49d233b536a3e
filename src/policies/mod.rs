pub mod fixed;

pub use fixed::FixedPolicy;
