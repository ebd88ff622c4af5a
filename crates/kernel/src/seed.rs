use serde::{Deserialize, Serialize};

/// Seeds a mesh was produced from: one for geometry, one for texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MeshSeeds {
    pub geo: u64,
    pub tex: u64,
}

impl std::fmt::Display for MeshSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "geo={:#018x} tex={:#018x}", self.geo, self.tex)
    }
}

/// Deterministic stream of seed pairs.
///
/// Given the same starting state the sequence is identical on every platform.
#[derive(Debug, Clone)]
pub struct SeedSequence {
    state: u64,
}

impl SeedSequence {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        splitmix64(self.state)
    }

    pub fn next_seeds(&mut self) -> MeshSeeds {
        MeshSeeds {
            geo: self.next_u64(),
            tex: self.next_u64(),
        }
    }
}

/// Splitmix64 output function.
pub fn splitmix64(state: u64) -> u64 {
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
