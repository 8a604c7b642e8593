mod config;
mod policy;

pub use config::{DecisionConfig, DecisionConfigError};
pub use policy::{DecisionError, DecisionMode, DecisionPolicy};
