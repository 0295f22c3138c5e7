// species nodes and the arena that owns them
//
// Edges are stored on both endpoints: the weight lives in the receiver's
// incoming map, the sender only keeps a back-reference. Every mutation that
// touches one side goes through `SpeciesArena` so both sides stay in sync.

use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use hashbrown::HashMap;
use thiserror::Error;

use crate::dg_interface::{DgTime, SpeciesId, Weight};

/// Relative tolerance when comparing an incrementally maintained fitness
/// against the sum of its incoming weights
const FITNESS_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// Identifier does not refer to a live species
    #[error("species {0} is not alive")]
    UnknownSpecies(SpeciesId),

    /// Edge or fitness bookkeeping disagrees between two species
    #[error("species {species}: {reason}")]
    Inconsistent { species: SpeciesId, reason: String },
}

pub struct Species {
    immigration_time: DgTime,
    fitness: f64,
    incoming: BTreeMap<SpeciesId, Weight>,
    outgoing: BTreeSet<SpeciesId>,
    // sorted ids of `outgoing`, reset whenever `outgoing` changes
    outgoing_ids: OnceCell<Vec<SpeciesId>>,
}

impl Species {
    pub fn new(immigration_time: DgTime) -> Self {
        Self {
            immigration_time,
            fitness: 0.0,
            incoming: BTreeMap::new(),
            outgoing: BTreeSet::new(),
            outgoing_ids: OnceCell::new(),
        }
    }

    pub fn id(&self) -> SpeciesId {
        self.immigration_time
    }

    pub fn immigration_time(&self) -> DgTime {
        self.immigration_time
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn in_degree(&self) -> usize {
        self.incoming.len()
    }

    pub fn out_degree(&self) -> usize {
        self.outgoing.len()
    }

    /// (source, weight) of every edge pointing into this species
    pub fn incoming(&self) -> impl Iterator<Item = (SpeciesId, Weight)> + '_ {
        self.incoming.iter().map(|(s, w)| (*s, *w))
    }

    /// Destinations of every edge leaving this species
    pub fn outgoing(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        self.outgoing.iter().copied()
    }

    pub fn incoming_weight(&self, source: SpeciesId) -> Option<Weight> {
        self.incoming.get(&source).copied()
    }

    pub fn has_outgoing(&self, target: SpeciesId) -> bool {
        self.outgoing.contains(&target)
    }

    /// Negative fitness with at least one incoming interaction
    pub fn is_extinction_eligible(&self) -> bool {
        self.fitness < 0.0 && !self.incoming.is_empty()
    }

    /// Sorted outgoing ids, rebuilt lazily after the outgoing set changed
    pub fn outgoing_ids(&self) -> &[SpeciesId] {
        self.outgoing_ids
            .get_or_init(|| self.outgoing.iter().copied().collect())
    }

    /// Sorted union of incoming sources and outgoing destinations
    pub fn neighbors(&self) -> Vec<SpeciesId> {
        let mut ids: Vec<SpeciesId> = self
            .incoming
            .keys()
            .chain(self.outgoing.iter())
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    fn insert_incoming(&mut self, source: SpeciesId, weight: Weight) -> Option<Weight> {
        let previous = self.incoming.insert(source, weight);
        // an overwrite replaces the old contribution instead of stacking on it
        self.fitness += weight - previous.unwrap_or(0.0);
        previous
    }

    fn remove_incoming(&mut self, source: SpeciesId) -> Option<Weight> {
        let removed = self.incoming.remove(&source);
        if let Some(weight) = removed {
            self.fitness -= weight;
        }
        removed
    }

    fn insert_outgoing(&mut self, target: SpeciesId) {
        if self.outgoing.insert(target) {
            self.outgoing_ids.take();
        }
    }

    fn remove_outgoing(&mut self, target: SpeciesId) -> bool {
        let removed = self.outgoing.remove(&target);
        if removed {
            self.outgoing_ids.take();
        }
        removed
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "immigrationTime: {}", self.immigration_time)?;
        writeln!(f, "fitness: {}", self.fitness)?;
        writeln!(f, "incoming:")?;
        for (source, weight) in &self.incoming {
            writeln!(f, "  {}, {}", source, weight)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Species")
            .field("immigration_time", &self.immigration_time)
            .field("fitness", &self.fitness)
            .field("in_degree", &self.incoming.len())
            .field("out_degree", &self.outgoing.len())
            .finish()
    }
}

// ============================================================================
// Arena
// ============================================================================

/// Owner of all live species, addressed by immigration time
#[derive(Default)]
pub struct SpeciesArena {
    slots: HashMap<SpeciesId, Species>,
}

impl SpeciesArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: SpeciesId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn get(&self, id: SpeciesId) -> Option<&Species> {
        self.slots.get(&id)
    }

    pub fn insert(&mut self, species: Species) {
        let id = species.id();
        let replaced = self.slots.insert(id, species);
        assert!(replaced.is_none(), "species {} immigrated twice", id);
    }

    /// Edge `from -> to`: stored as `to.incoming[from]` plus the back-reference
    /// `from.outgoing`. Returns the weight it replaced, if the edge existed.
    pub fn connect(&mut self, from: SpeciesId, to: SpeciesId, weight: Weight) -> Option<Weight> {
        assert_ne!(from, to, "self-interaction on species {}", from);
        // both ends must be alive before either side is touched
        assert!(self.contains(from), "connect from dead species {}", from);

        let previous = self.slot_mut(to).insert_incoming(from, weight);
        self.slot_mut(from).insert_outgoing(to);
        previous
    }

    /// Unwire `id` on both sides and take it out of the arena. Every outgoing
    /// destination left extinction eligible is added to `candidates`.
    pub fn sever_all_edges(
        &mut self,
        id: SpeciesId,
        candidates: &mut BTreeSet<SpeciesId>,
    ) -> Species {
        let species = self
            .slots
            .remove(&id)
            .unwrap_or_else(|| panic!("severing dead species {}", id));

        for source in species.incoming.keys() {
            let removed = self.slot_mut(*source).remove_outgoing(id);
            assert!(removed, "{} -> {} missing its back-reference", source, id);
        }

        for target in &species.outgoing {
            let other = self.slot_mut(*target);
            if other.remove_incoming(id).is_none() {
                panic!("{} -> {} missing its weight", id, target);
            }
            if other.is_extinction_eligible() {
                candidates.insert(*target);
            }
        }

        species
    }

    /// Directed triads among the combined in/out neighbourhood of `id`,
    /// normalised by k(k-1). Zero for fewer than two neighbours.
    pub fn local_clustering_coefficient(&self, id: SpeciesId) -> f64 {
        let neighbors = self.slot(id).neighbors();
        let k = neighbors.len();
        if k <= 1 {
            return 0.0;
        }

        let triads: usize = neighbors
            .iter()
            .map(|n| sorted_intersection_count(self.slot(*n).outgoing_ids(), &neighbors))
            .sum();

        triads as f64 / (k * (k - 1)) as f64
    }

    /// Verify the edge and fitness invariants of every live species
    pub fn check_consistency(&self) -> Result<(), GraphError> {
        for (id, species) in &self.slots {
            let inconsistent = |reason: String| GraphError::Inconsistent {
                species: *id,
                reason,
            };

            for (source, _) in species.incoming() {
                match self.slots.get(&source) {
                    None => return Err(inconsistent(format!("incoming from dead {}", source))),
                    Some(s) if !s.has_outgoing(*id) => {
                        return Err(inconsistent(format!("{} lacks back-reference", source)))
                    }
                    _ => {}
                }
            }

            for target in species.outgoing() {
                match self.slots.get(&target) {
                    None => return Err(inconsistent(format!("outgoing to dead {}", target))),
                    Some(t) if t.incoming_weight(*id).is_none() => {
                        return Err(inconsistent(format!("{} lacks incoming weight", target)))
                    }
                    _ => {}
                }
            }

            if species.has_outgoing(*id) {
                return Err(inconsistent("self-interaction".to_string()));
            }

            let sum: f64 = species.incoming().map(|(_, w)| w).sum();
            let scale = species
                .incoming()
                .map(|(_, w)| w.abs())
                .sum::<f64>()
                .max(1.0);
            if (species.fitness - sum).abs() > FITNESS_TOLERANCE * scale {
                return Err(inconsistent(format!(
                    "fitness {} != incoming sum {}",
                    species.fitness, sum
                )));
            }

            let cached = species.outgoing_ids();
            if !cached.iter().copied().eq(species.outgoing()) {
                return Err(inconsistent("stale outgoing id cache".to_string()));
            }
        }
        Ok(())
    }

    fn slot(&self, id: SpeciesId) -> &Species {
        self.slots
            .get(&id)
            .unwrap_or_else(|| panic!("species {} is not alive", id))
    }

    fn slot_mut(&mut self, id: SpeciesId) -> &mut Species {
        self.slots
            .get_mut(&id)
            .unwrap_or_else(|| panic!("species {} is not alive", id))
    }
}

/// Size of the intersection of two ascending id lists
fn sorted_intersection_count(a: &[SpeciesId], b: &[SpeciesId]) -> usize {
    let (mut i, mut j, mut count) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}
