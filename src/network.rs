use crate::error::{Result, SimError};
use crate::expression::{self, Factor};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A reaction as written by the caller, before its expressions are parsed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReactionDefinition {
    pub name: String,
    pub rate: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl ReactionDefinition {
    pub fn new(name: impl Into<String>, rate: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rate: rate.into(),
            ..Self::default()
        }
    }

    pub fn input(mut self, expression: impl Into<String>) -> Self {
        self.inputs.push(expression.into());
        self
    }

    pub fn output(mut self, expression: impl Into<String>) -> Self {
        self.outputs.push(expression.into());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reactant {
    pub species: usize,
    pub count: i64,
}

#[derive(Clone, Debug)]
pub struct Reaction {
    name: String,
    rate_constant: f64,
    rate_species: Vec<usize>,
    inputs: Vec<Reactant>,
    outputs: Vec<Reactant>,
}

impl Reaction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rate_constant(&self) -> f64 {
        self.rate_constant
    }

    pub fn rate_species(&self) -> &[usize] {
        &self.rate_species
    }

    pub fn inputs(&self) -> &[Reactant] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Reactant] {
        &self.outputs
    }

    /// Rate constant times the count of every rate species, repeats included.
    /// Zero whenever an input is short of what the reaction consumes, so counts
    /// never fall below zero.
    #[inline]
    pub fn propensity(&self, state: &[i64]) -> f64 {
        if self
            .inputs
            .iter()
            .any(|input| state[input.species] < input.count)
        {
            return 0.0;
        }
        let mut propensity = self.rate_constant;
        for &species in &self.rate_species {
            // An overflowed partial product times zero would be NaN.
            if state[species] == 0 {
                return 0.0;
            }
            propensity *= state[species] as f64;
        }
        propensity
    }

    /// Consumes the inputs and adds the outputs. If any count would overflow,
    /// `state` is restored and the offending species id is returned.
    pub fn apply(&self, state: &mut [i64]) -> Result<(), usize> {
        let deltas = self
            .inputs
            .iter()
            .map(|input| (input.species, -input.count))
            .chain(self.outputs.iter().map(|output| (output.species, output.count)));
        for (applied, (species, delta)) in deltas.clone().enumerate() {
            match state[species].checked_add(delta) {
                Some(count) => state[species] = count,
                None => {
                    for (species, delta) in deltas.take(applied) {
                        state[species] -= delta;
                    }
                    return Err(species);
                }
            }
        }
        Ok(())
    }

    /// Species whose counts change when this reaction fires.
    pub fn changed_species(&self) -> impl Iterator<Item = usize> + '_ {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .map(|reactant| reactant.species)
    }

    /// Species that the propensity formula or the availability guard reads.
    pub fn read_species(&self) -> impl Iterator<Item = usize> + '_ {
        self.rate_species
            .iter()
            .copied()
            .chain(self.inputs.iter().map(|reactant| reactant.species))
    }
}

/// Immutable set of reactions, ordered by name, over an indexed species table.
#[derive(Clone, Debug)]
pub struct Network {
    species: Vec<String>,
    species_index: HashMap<String, usize>,
    reactions: Vec<Reaction>,
}

impl Network {
    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    pub fn species_id(&self, name: &str) -> Option<usize> {
        self.species_index.get(name).copied()
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn n_reactions(&self) -> usize {
        self.reactions.len()
    }

    pub fn reaction(&self, idx: usize) -> &Reaction {
        &self.reactions[idx]
    }

    pub fn reaction_id(&self, name: &str) -> Option<usize> {
        self.reactions
            .binary_search_by(|reaction| reaction.name.as_str().cmp(name))
            .ok()
    }
}

/// Species counts indexed by the owning network's species ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
    counts: Vec<i64>,
}

impl State {
    pub fn zeros(n_species: usize) -> Self {
        Self {
            counts: vec![0; n_species],
        }
    }

    pub fn from_counts(counts: Vec<i64>) -> Self {
        Self { counts }
    }

    pub fn counts(&self) -> &[i64] {
        &self.counts
    }

    pub(crate) fn counts_mut(&mut self) -> &mut [i64] {
        &mut self.counts
    }

    pub fn get(&self, species: usize) -> i64 {
        self.counts[species]
    }

    pub fn count_of(&self, network: &Network, name: &str) -> Option<i64> {
        network.species_id(name).map(|idx| self.counts[idx])
    }

    pub fn set(&mut self, network: &Network, name: &str, count: i64) -> Result<()> {
        let idx = network
            .species_id(name)
            .ok_or_else(|| SimError::UnknownSpecies(name.to_string()))?;
        if count < 0 {
            return Err(SimError::NegativeCount {
                species: name.to_string(),
                count,
            });
        }
        self.counts[idx] = count;
        Ok(())
    }

    pub fn to_named(&self, network: &Network) -> BTreeMap<String, i64> {
        network
            .species()
            .iter()
            .cloned()
            .zip(self.counts.iter().copied())
            .collect()
    }
}

/// Collects species assignments and reaction definitions into a [`Network`]
/// and its initial [`State`].
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    species: Vec<String>,
    species_index: HashMap<String, usize>,
    counts: Vec<i64>,
    assigned: HashSet<usize>,
    reactions: BTreeMap<String, Reaction>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.species_index.get(name) {
            return idx;
        }
        let idx = self.species.len();
        self.species.push(name.to_string());
        self.species_index.insert(name.to_string(), idx);
        self.counts.push(0);
        idx
    }

    pub fn add_species(&mut self, name: &str, count: i64) -> Result<()> {
        let name = match expression::tokenize(name)?.as_slice() {
            [Factor::Identifier(species)] => *species,
            _ => {
                return Err(SimError::InvalidArgument(format!(
                    "'{}' is not a species name",
                    name
                )));
            }
        };
        if count < 0 {
            return Err(SimError::NegativeCount {
                species: name.to_string(),
                count,
            });
        }
        let idx = self.intern(name);
        if !self.assigned.insert(idx) {
            return Err(SimError::DuplicateSpecies(name.to_string()));
        }
        self.counts[idx] = count;
        Ok(())
    }

    pub fn add_reaction(&mut self, definition: ReactionDefinition) -> Result<()> {
        let ReactionDefinition {
            name,
            rate,
            inputs,
            outputs,
        } = definition;
        if self.reactions.contains_key(&name) {
            return Err(SimError::DuplicateReaction(name));
        }

        let rate = expression::parse(&rate)?;
        if !rate.coefficient.is_finite() || rate.coefficient < 0.0 {
            return Err(SimError::InvalidRate {
                reaction: name,
                rate: rate.coefficient,
            });
        }
        let rate_species = rate
            .species
            .iter()
            .map(|species| self.intern(species))
            .collect();
        let inputs = self.stoichiometry(&name, &inputs)?;
        let outputs = self.stoichiometry(&name, &outputs)?;

        let reaction = Reaction {
            name: name.clone(),
            rate_constant: rate.coefficient,
            rate_species,
            inputs,
            outputs,
        };
        self.reactions.insert(name, reaction);
        Ok(())
    }

    fn stoichiometry(&mut self, reaction: &str, expressions: &[String]) -> Result<Vec<Reactant>> {
        let mut merged: Vec<Reactant> = Vec::new();
        for expression in expressions {
            let product = expression::parse(expression)?;
            if product.species.is_empty() {
                return Err(SimError::InvalidArgument(format!(
                    "reaction '{}' has a stoichiometry term without species: '{}'",
                    reaction, expression
                )));
            }
            let coefficient = product.coefficient;
            let invalid = || SimError::InvalidCoefficient {
                reaction: reaction.to_string(),
                species: product.species.join("*"),
                coefficient,
            };
            // 2^63 itself does not fit, hence `>=`.
            if coefficient < 0.0 || coefficient.fract() != 0.0 || coefficient >= i64::MAX as f64 {
                return Err(invalid());
            }
            let count = coefficient as i64;
            for species in &product.species {
                let idx = self.intern(species);
                match merged.iter_mut().find(|entry| entry.species == idx) {
                    Some(entry) => {
                        entry.count = entry.count.checked_add(count).ok_or_else(invalid)?;
                    }
                    None => merged.push(Reactant {
                        species: idx,
                        count,
                    }),
                }
            }
        }
        merged.retain(|entry| entry.count != 0);
        Ok(merged)
    }

    pub fn build(self) -> (Network, State) {
        let network = Network {
            species: self.species,
            species_index: self.species_index,
            reactions: self.reactions.into_values().collect(),
        };
        (network, State::from_counts(self.counts))
    }
}
