//! The 64-bit hash token space that positions are placed in.

use std::fmt;

/// A position in the ring's 64-bit token space.
///
/// Produced by hashing either a virtual node's seed string (at ring build
/// time) or a key (at lookup time) with the same function, so that both
/// sides land in the same space. We use xxHash3-64: it is uniformly
/// distributed, fast, and - crucially - deterministic across processes with
/// no seed to accidentally desynchronize between nodes (`spec.md` §4.1).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Token(pub u64);

impl Token {
    /// Hashes raw bytes into a token.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Token(xxhash_rust::xxh3::xxh3_64(bytes))
    }

    /// Hashes a UTF-8 seed string (a key, or a vnode's `node#index` label).
    pub fn of_str(seed: &str) -> Self {
        Self::of_bytes(seed.as_bytes())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_is_deterministic() {
        assert_eq!(Token::of_str("alpha"), Token::of_str("alpha"));
    }

    #[test]
    fn different_inputs_usually_differ() {
        assert_ne!(Token::of_str("alpha"), Token::of_str("beta"));
    }
}
