//! Deterministic, hierarchical RNG streams.
//!
//! Every stream is seeded from its full key tuple
//! `(master_seed, scenario_tag, worker, stream_name, *parts)` via CRC-32,
//! never from a parent or sibling draw, so requesting streams in a
//! different order never changes any stream's sequence.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_pcg::Pcg64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Int(u64),
    Str(String),
}

impl From<u64> for KeyPart {
    fn from(v: u64) -> Self {
        KeyPart::Int(v)
    }
}

impl From<&str> for KeyPart {
    fn from(v: &str) -> Self {
        KeyPart::Str(v.to_string())
    }
}

fn fold_parts(hasher: &mut crc32fast::Hasher, parts: &[KeyPart]) {
    for part in parts {
        match part {
            KeyPart::Int(i) => hasher.update(&i.to_le_bytes()),
            KeyPart::Str(s) => hasher.update(s.as_bytes()),
        }
    }
}

/// Folds a key tuple into a 64-bit seed by combining two independent CRC-32
/// checksums of the same byte stream (one salted), giving a wider seed
/// space than a bare 32-bit checksum without pulling in a second hash crate.
fn derive_seed(master_seed: u64, scenario_tag: &str, worker: u32, stream_name: &str, parts: &[KeyPart]) -> u64 {
    let mut base = crc32fast::Hasher::new();
    base.update(&master_seed.to_le_bytes());
    base.update(scenario_tag.as_bytes());
    base.update(&worker.to_le_bytes());
    base.update(stream_name.as_bytes());
    fold_parts(&mut base, parts);

    let low = base.clone().finalize() as u64;
    let mut salted = base;
    salted.update(b"ridesim-rng-high");
    let high = salted.finalize() as u64;
    (high << 32) | low
}

pub struct RngRegistry {
    master_seed: u64,
    scenario_tag: String,
    worker: u32,
    cache: HashMap<(String, Vec<KeyPart>), Pcg64>,
}

impl RngRegistry {
    pub fn new(master_seed: u64, scenario_tag: impl Into<String>, worker: u32) -> Self {
        RngRegistry {
            master_seed,
            scenario_tag: scenario_tag.into(),
            worker,
            cache: HashMap::new(),
        }
    }

    pub fn stream(&mut self, name: &str) -> &mut Pcg64 {
        self.substream(name, &[])
    }

    pub fn substream(&mut self, name: &str, parts: &[KeyPart]) -> &mut Pcg64 {
        let key = (name.to_string(), parts.to_vec());
        self.cache.entry(key).or_insert_with(|| {
            let seed = derive_seed(self.master_seed, &self.scenario_tag, self.worker, name, parts);
            Pcg64::seed_from_u64(seed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn identical_key_tuples_draw_identically() {
        let mut a = RngRegistry::new(42, "baseline", 0);
        let mut b = RngRegistry::new(42, "baseline", 0);

        let draws_a: Vec<f64> = (0..5).map(|_| a.substream("origin", &[1.into()]).gen::<f64>()).collect();
        let draws_b: Vec<f64> = (0..5).map(|_| b.substream("origin", &[1.into()]).gen::<f64>()).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn distinct_stream_names_diverge() {
        let mut reg = RngRegistry::new(42, "baseline", 0);
        let a: f64 = reg.stream("riders").gen();
        let b: f64 = reg.stream("drivers").gen();
        assert_ne!(a, b);
    }

    #[test]
    fn repeated_calls_continue_the_same_stream_not_reseed_it() {
        let mut reg = RngRegistry::new(1, "s", 0);
        let first: f64 = reg.stream("x").gen();
        let second: f64 = reg.stream("x").gen();
        assert_ne!(first, second, "second call should continue, not reseed");
    }

    #[test]
    fn sibling_draw_order_does_not_perturb_other_streams() {
        let mut reg_a = RngRegistry::new(7, "s", 0);
        let expected: f64 = reg_a.substream("b", &[]).gen();

        let mut reg_b = RngRegistry::new(7, "s", 0);
        let _: f64 = reg_b.substream("a", &[]).gen();
        let actual: f64 = reg_b.substream("b", &[]).gen();
        assert_eq!(expected, actual);
    }
}
