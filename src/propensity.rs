use crate::network::{Network, State};
use rand::Rng;

/// Current propensity of every reaction, in the network's fixed reaction order,
/// plus their running total.
///
/// The total is maintained incrementally. When no entry is positive it is
/// pinned to exactly zero so accumulated rounding cannot keep a dead network
/// alive.
#[derive(Clone, Debug)]
pub struct PropensityTable {
    values: Vec<f64>,
    total: f64,
    active: usize,
}

impl PropensityTable {
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
            total: 0.0,
            active: 0,
        }
    }

    pub fn from_state(network: &Network, state: &State) -> Self {
        let mut table = Self::new(network.n_reactions());
        for (idx, reaction) in network.reactions().iter().enumerate() {
            table.insert(idx, reaction.propensity(state.counts()));
        }
        table
    }

    #[inline]
    pub fn insert(&mut self, idx: usize, value: f64) {
        debug_assert!(value >= 0.0);
        let previous = std::mem::replace(&mut self.values[idx], value);
        match (previous > 0.0, value > 0.0) {
            (false, true) => self.active += 1,
            (true, false) => self.active -= 1,
            _ => {}
        }
        if self.active == 0 {
            self.total = 0.0;
        } else {
            self.total += value - previous;
        }
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn get(&self, idx: usize) -> f64 {
        self.values[idx]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all entries computed from scratch.
    pub fn recomputed_total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Exponential waiting time with rate `total`. Callers must check that the
    /// total is positive first.
    pub fn sample_waiting_time<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        debug_assert!(self.total > 0.0);
        // 1 - [0, 1) keeps the logarithm finite.
        let u: f64 = 1.0 - rng.r#gen::<f64>();
        -u.ln() / self.total
    }

    /// Picks a reaction with probability proportional to its propensity by
    /// walking the entries in index order. Requires a positive total.
    pub fn draw_reaction<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let u: f64 = rng.r#gen();
        self.select(u * self.total)
    }

    pub fn select(&self, mut target: f64) -> usize {
        debug_assert!(self.active > 0);
        let mut fallback = 0;
        for (idx, &value) in self.values.iter().enumerate() {
            if value <= 0.0 {
                continue;
            }
            target -= value;
            if target < 0.0 {
                return idx;
            }
            fallback = idx;
        }
        fallback
    }
}
