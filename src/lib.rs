//! Exact stochastic simulation of reaction networks with Gillespie's direct
//! method.

pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod expression;
pub mod influence;
pub mod network;
pub mod propensity;
pub mod sink;

pub use cancel::CancellationToken;
pub use config::{NetworkConfig, Scenario};
pub use engine::{
    Model, RunSummary, Simulation, SimulationOptions, StepOutcome, Termination, derive_seed,
    simulate,
};
pub use error::{Result, SimError, SinkError};
pub use network::{Network, NetworkBuilder, Reaction, ReactionDefinition, State};
pub use propensity::PropensityTable;
pub use sink::{ChannelSink, CsvSink, Observation, Trajectory, TrajectorySink};
