//! YAML network descriptions.
//!
//! ```yaml
//! reactions:
//!   - name: replication
//!     rate: "1.0*A"
//!     input: ["A"]
//!     output: ["2*A"]
//! states:
//!   - name: A
//!     value: 10
//! run:
//!   until: 5.0
//! ```

use crate::engine::{DEFAULT_SEED, Model, SimulationOptions};
use crate::error::{Result, SimError};
use crate::network::{NetworkBuilder, ReactionDefinition, State};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReactionConfig {
    pub name: String,
    pub rate: String,
    #[serde(default)]
    pub input: Vec<String>,
    #[serde(default)]
    pub output: Vec<String>,
}

impl From<ReactionConfig> for ReactionDefinition {
    fn from(c: ReactionConfig) -> Self {
        Self {
            name: c.name,
            rate: c.rate,
            inputs: c.input,
            outputs: c.output,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    pub name: String,
    pub value: i64,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub until: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    pub reactions: Vec<ReactionConfig>,
    #[serde(default)]
    pub states: Vec<StateConfig>,
    pub run: RunConfig,
}

/// Everything needed to start a simulation.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub model: Model,
    pub initial_state: State,
    pub options: SimulationOptions,
}

impl NetworkConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading network description from {}", path.display());
        let source = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&source)
    }

    pub fn build(self) -> Result<Scenario> {
        let mut builder = NetworkBuilder::new();
        for state in &self.states {
            builder.add_species(&state.name, state.value)?;
        }
        for reaction in self.reactions {
            builder.add_reaction(reaction.into())?;
        }
        let (network, initial_state) = builder.build();
        let options =
            SimulationOptions::new(self.run.until).with_seed(self.run.seed.unwrap_or(DEFAULT_SEED));
        if !options.max_time.is_finite() || options.max_time <= 0.0 {
            return Err(SimError::InvalidArgument(
                "run.until must be positive and finite".into(),
            ));
        }
        Ok(Scenario {
            model: Model::new(network),
            initial_state,
            options,
        })
    }
}
