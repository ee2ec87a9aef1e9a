use crate::cancel::CancellationToken;
use crate::error::{Result, SimError};
use crate::influence::InfluenceGraph;
use crate::network::{Network, State};
use crate::propensity::PropensityTable;
use crate::sink::TrajectorySink;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace, warn};

pub const DEFAULT_SEED: u64 = 0xDEADBEEFCAFEBABE;

/// Network plus its influence graph. Immutable, so one model can back any
/// number of simulations, including on other threads.
#[derive(Clone, Debug)]
pub struct Model {
    network: Network,
    influence: InfluenceGraph,
}

impl Model {
    pub fn new(network: Network) -> Self {
        let influence = InfluenceGraph::build(&network);
        debug!(
            species = network.n_species(),
            reactions = network.n_reactions(),
            influence_edges = influence.edge_count(),
            "built reaction model"
        );
        Self { network, influence }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn influence(&self) -> &InfluenceGraph {
        &self.influence
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationOptions {
    pub max_time: f64,
    pub start_time: f64,
    pub seed: u64,
}

impl SimulationOptions {
    pub fn new(max_time: f64) -> Self {
        Self {
            max_time,
            start_time: 0.0,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.max_time.is_finite() || self.max_time <= 0.0 {
            return Err(SimError::InvalidArgument(
                "max_time must be positive and finite".into(),
            ));
        }
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(SimError::InvalidArgument(
                "start_time must be non-negative and finite".into(),
            ));
        }
        if self.start_time > self.max_time {
            return Err(SimError::InvalidArgument(
                "start_time cannot exceed max_time".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    TimeExceeded,
    NoReactionsPossible,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    Fired { reaction: usize, time: f64 },
    Terminated(Termination),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub termination: Termination,
    pub final_time: f64,
    pub steps: u64,
    pub state: State,
}

/// One direct-method trajectory. Owns its state, propensities, and generator.
pub struct Simulation<'m> {
    model: &'m Model,
    state: State,
    propensities: PropensityTable,
    rng: ChaCha8Rng,
    time: f64,
    max_time: f64,
    steps: u64,
    terminated: Option<Termination>,
}

impl<'m> Simulation<'m> {
    pub fn new(model: &'m Model, initial_state: State, options: SimulationOptions) -> Result<Self> {
        options.validate()?;
        let network = model.network();
        if initial_state.counts().len() != network.n_species() {
            return Err(SimError::InvalidArgument(format!(
                "initial state length {} does not match number of species {}",
                initial_state.counts().len(),
                network.n_species()
            )));
        }
        if let Some((idx, &count)) = initial_state
            .counts()
            .iter()
            .enumerate()
            .find(|(_, count)| **count < 0)
        {
            return Err(SimError::NegativeCount {
                species: network.species()[idx].clone(),
                count,
            });
        }
        let propensities = PropensityTable::from_state(network, &initial_state);
        if !propensities.total().is_finite() {
            return Err(SimError::NonFinitePropensity {
                time: options.start_time,
            });
        }
        Ok(Self {
            model,
            state: initial_state,
            propensities,
            rng: ChaCha8Rng::seed_from_u64(options.seed),
            time: options.start_time,
            max_time: options.max_time,
            steps: 0,
            terminated: None,
        })
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn propensities(&self) -> &PropensityTable {
        &self.propensities
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn termination(&self) -> Option<Termination> {
        self.terminated
    }

    fn terminate(&mut self, reason: Termination) -> StepOutcome {
        self.terminated = Some(reason);
        StepOutcome::Terminated(reason)
    }

    /// Advances the chain by one event.
    ///
    /// An event whose time would land past `max_time` is discarded: the
    /// reaction is never drawn, the state is left as it was, and the clock
    /// stays at the last committed event. Once terminated, every further call
    /// returns the same termination.
    ///
    /// Errors leave the state and clock untouched: a total propensity that has
    /// overflowed to infinity, or a firing that would overflow a count.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if let Some(reason) = self.terminated {
            return Ok(StepOutcome::Terminated(reason));
        }
        let total = self.propensities.total();
        if !total.is_finite() {
            return Err(SimError::NonFinitePropensity { time: self.time });
        }
        if total <= 0.0 {
            return Ok(self.terminate(Termination::NoReactionsPossible));
        }

        let tentative = self.time + self.propensities.sample_waiting_time(&mut self.rng);
        if tentative > self.max_time {
            return Ok(self.terminate(Termination::TimeExceeded));
        }

        let chosen = self.propensities.draw_reaction(&mut self.rng);
        let model = self.model;
        let network = model.network();
        let reaction = network.reaction(chosen);
        reaction
            .apply(self.state.counts_mut())
            .map_err(|species| SimError::CountOverflow {
                reaction: reaction.name().to_string(),
                species: network.species()[species].clone(),
            })?;
        self.time = tentative;
        for &dep in model.influence().influenced_by(chosen) {
            let value = network.reaction(dep).propensity(self.state.counts());
            self.propensities.insert(dep, value);
        }
        self.steps += 1;
        trace!(reaction = reaction.name(), time = self.time, "fired");
        Ok(StepOutcome::Fired {
            reaction: chosen,
            time: self.time,
        })
    }

    /// Runs to termination, emitting the starting state and then one record per
    /// committed event to `sink`. Sink and overflow errors abort the run.
    pub fn run<S>(&mut self, sink: &mut S, cancel: Option<&CancellationToken>) -> Result<RunSummary>
    where
        S: TrajectorySink + ?Sized,
    {
        if self.steps == 0 && self.terminated.is_none() {
            self.emit(sink, self.time)?;
        }
        let reason = loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                self.terminated = Some(Termination::Cancelled);
                break Termination::Cancelled;
            }
            match self.step()? {
                StepOutcome::Fired { time, .. } => self.emit(sink, time)?,
                StepOutcome::Terminated(reason) => break reason,
            }
        };
        sink.finish().inspect_err(|err| warn!(%err, "failed to finish trajectory sink"))?;
        debug!(
            termination = ?reason,
            steps = self.steps,
            time = self.time,
            "simulation finished"
        );
        Ok(self.summary(reason))
    }

    fn emit<S>(&self, sink: &mut S, time: f64) -> Result<()>
    where
        S: TrajectorySink + ?Sized,
    {
        sink.record(time, self.state.counts()).map_err(|err| {
            warn!(%err, time, "trajectory sink rejected observation");
            SimError::from(err)
        })
    }

    fn summary(&self, termination: Termination) -> RunSummary {
        RunSummary {
            termination,
            final_time: self.time,
            steps: self.steps,
            state: self.state.clone(),
        }
    }

    pub fn into_state(self) -> State {
        self.state
    }
}

/// Runs one trajectory from `initial_state` without cancellation.
pub fn simulate<S>(
    model: &Model,
    initial_state: State,
    options: SimulationOptions,
    sink: &mut S,
) -> Result<RunSummary>
where
    S: TrajectorySink + ?Sized,
{
    Simulation::new(model, initial_state, options)?.run(sink, None)
}

/// Decorrelated seed for instance `instance` of a family sharing `base`
/// (SplitMix64 finaliser).
pub fn derive_seed(base: u64, instance: u64) -> u64 {
    const GOLDEN_GAMMA: u64 = 0x9E3779B97F4A7C15;
    let mut z = base ^ instance.wrapping_mul(GOLDEN_GAMMA);
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
