//! RNG oracle for deterministic random number generation.
//!
//! Every roll in an encounter (evasion, wave size, enemy picks, coin drops)
//! is derived from the encounter seed plus a monotonically increasing roll
//! nonce, so replaying the same command sequence reproduces the encounter.

/// RNG oracle for deterministic random number generation.
///
/// Implementations must be deterministic and produce the same values
/// given the same seed.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll a d100 (1-100 inclusive).
    fn roll_d100(&self, seed: u64) -> u32 {
        (self.next_u32(seed) % 100) + 1
    }

    /// Generate a random value in range [min, max] inclusive.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let range = max - min + 1;
        min + (self.next_u32(seed) % range)
    }
}

/// PCG random number generator (PCG-XSH-RR, 64-bit state, 32-bit output).
///
/// Stateless: the caller supplies the full seed for every draw.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    /// XSH-RR output permutation.
    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Purpose of a roll, mixed into its seed so different rolls made for the
/// same actor at the same nonce stay independent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RollContext {
    Evasion = 0,
    WaveSize = 1,
    EnemyPick = 2,
    CoinDrop = 3,
    Reward = 4,
}

/// Derives a per-roll seed from the encounter seed, roll nonce, actor, and
/// roll purpose (SplitMix64-style mixing).
pub fn compute_seed(encounter_seed: u64, nonce: u64, actor_id: u32, context: u32) -> u64 {
    let mut hash = encounter_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (actor_id as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}

/// Roll source bound to one encounter's seed and nonce counter.
///
/// Each draw consumes one nonce, so the sequence of draws (not wall time)
/// determines every outcome.
pub struct Dice<'a> {
    oracle: &'a dyn RngOracle,
    seed: u64,
    nonce: &'a mut u64,
}

impl<'a> Dice<'a> {
    pub fn new(oracle: &'a dyn RngOracle, seed: u64, nonce: &'a mut u64) -> Self {
        Self {
            oracle,
            seed,
            nonce,
        }
    }

    fn next_seed(&mut self, actor: u32, context: RollContext) -> u64 {
        let seed = compute_seed(self.seed, *self.nonce, actor, context as u32);
        *self.nonce += 1;
        seed
    }

    pub fn roll_d100(&mut self, actor: u32, context: RollContext) -> u32 {
        let seed = self.next_seed(actor, context);
        self.oracle.roll_d100(seed)
    }

    pub fn range(&mut self, actor: u32, context: RollContext, min: u32, max: u32) -> u32 {
        let seed = self.next_seed(actor, context);
        self.oracle.range(seed, min, max)
    }

    /// Uniform pick from a non-empty slice.
    pub fn pick<'s, T>(&mut self, actor: u32, context: RollContext, items: &'s [T]) -> Option<&'s T> {
        if items.is_empty() {
            return None;
        }
        let index = self.range(actor, context, 0, items.len() as u32 - 1);
        items.get(index as usize)
    }
}
