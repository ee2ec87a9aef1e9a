use crate::network::Network;

/// For each reaction, the reactions whose propensity may change when it fires.
///
/// Built once from the static network. A reaction appears in `influenced_by(r)`
/// when it reads (through its rate species or its inputs) any species that `r`
/// consumes or produces. Each set is sorted by reaction index.
#[derive(Clone, Debug)]
pub struct InfluenceGraph {
    sets: Vec<Vec<usize>>,
}

impl InfluenceGraph {
    pub fn build(network: &Network) -> Self {
        let mut readers: Vec<Vec<usize>> = vec![Vec::new(); network.n_species()];
        for (idx, reaction) in network.reactions().iter().enumerate() {
            for species in reaction.read_species() {
                if readers[species].last() != Some(&idx) {
                    readers[species].push(idx);
                }
            }
        }

        let n_reactions = network.n_reactions();
        let mut sets = vec![Vec::new(); n_reactions];
        let mut visit_markers = vec![0usize; n_reactions];
        for (r, set) in sets.iter_mut().enumerate() {
            let mark = r + 1;
            for species in network.reaction(r).changed_species() {
                for &dep in &readers[species] {
                    if visit_markers[dep] != mark {
                        visit_markers[dep] = mark;
                        set.push(dep);
                    }
                }
            }
            set.sort_unstable();
        }
        Self { sets }
    }

    pub fn influenced_by(&self, reaction: usize) -> &[usize] {
        &self.sets[reaction]
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Total number of edges, i.e. propensity refreshes summed over all reactions.
    pub fn edge_count(&self) -> usize {
        self.sets.iter().map(Vec::len).sum()
    }
}
