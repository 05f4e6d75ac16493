//! Randomized selection policies.
//!
//! Four independent policies drive every random decision in the simulation:
//!
//! - **eviction**: which scheduled workloads to evict
//! - **removal**: which nodes to scale down
//! - **placement**: which free node receives a pending workload
//! - **zone**: which availability zone a new node or workload lands in
//!
//! Eviction and removal draw `number` indices. By default they draw with
//! replacement, so the same candidate can come back more than once and callers
//! must deduplicate. `SamplingMode::WithoutReplacement` draws distinct
//! indices instead.
//!
//! All randomness comes from one seedable generator, so a run is reproducible
//! from its seed.

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{ClusterError, ClusterResult};

/// How multi-item selections are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// Independent uniform draws; duplicates are possible.
    #[default]
    WithReplacement,

    /// Distinct uniform draws.
    WithoutReplacement,
}

/// The selection policies, sharing one generator.
#[derive(Debug, Clone)]
pub struct Heuristics {
    rng: ChaCha8Rng,
    sampling: SamplingMode,
}

impl Heuristics {
    /// Create policies seeded deterministically.
    pub fn new(seed: u64, sampling: SamplingMode) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            sampling,
        }
    }

    /// Create policies seeded from the thread-local generator.
    pub fn from_entropy(sampling: SamplingMode) -> Self {
        Self {
            rng: ChaCha8Rng::from_rng(&mut rand::rng()),
            sampling,
        }
    }

    /// Restart the generator from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn sampling(&self) -> SamplingMode {
        self.sampling
    }

    /// Pick `number` workloads to evict.
    pub fn select_for_eviction<'a, T>(
        &mut self,
        candidates: &'a [T],
        number: usize,
    ) -> ClusterResult<Vec<&'a T>> {
        let indices = self.sample("eviction", candidates.len(), number)?;
        Ok(indices.into_iter().map(|i| &candidates[i]).collect())
    }

    /// Pick `number` nodes to remove.
    pub fn select_for_removal<'a, T>(
        &mut self,
        candidates: &'a [T],
        number: usize,
    ) -> ClusterResult<Vec<&'a T>> {
        let indices = self.sample("node removal", candidates.len(), number)?;
        Ok(indices.into_iter().map(|i| &candidates[i]).collect())
    }

    /// Pick the node a workload is placed on.
    pub fn select_placement<'a, T>(&mut self, candidates: &'a [T]) -> ClusterResult<&'a T> {
        let index = self.pick_one("placement", candidates.len())?;
        Ok(&candidates[index])
    }

    /// Pick the zone for a new node or workload.
    pub fn select_zone<'a>(&mut self, zones: &'a [String]) -> ClusterResult<&'a str> {
        let index = self.pick_one("zone", zones.len())?;
        Ok(zones[index].as_str())
    }

    fn sample(&mut self, policy: &'static str, len: usize, number: usize) -> ClusterResult<Vec<usize>> {
        ensure_candidates(policy, len)?;
        match self.sampling {
            SamplingMode::WithReplacement => Ok((0..number)
                .map(|_| self.rng.random_range(0..len))
                .collect()),
            SamplingMode::WithoutReplacement => {
                if number > len {
                    return Err(ClusterError::InvalidArgument(format!(
                        "{policy} heuristic cannot draw {number} distinct candidates from {len}"
                    )));
                }
                Ok(index::sample(&mut self.rng, len, number).into_vec())
            }
        }
    }

    fn pick_one(&mut self, policy: &'static str, len: usize) -> ClusterResult<usize> {
        ensure_candidates(policy, len)?;
        Ok(self.rng.random_range(0..len))
    }
}

fn ensure_candidates(policy: &'static str, len: usize) -> ClusterResult<()> {
    if len == 0 {
        error!(policy, "Selection heuristic received an empty candidate set");
        return Err(ClusterError::EmptyCandidateSet { policy });
    }
    Ok(())
}
