//! Proof-of-work puzzle.
//!
//! A proof `p` is accepted for a block when
//! `sha256(decimal(p² - previous_proof² + index) ++ payload)` starts with
//! [`DIFFICULTY_PREFIX`]. `payload` is always the block payload's canonical
//! string, so both block variants hash the same way.

use tracing::debug;

use crate::constants::DIFFICULTY_PREFIX;
use crate::digest::sha256_hex;

/// Bytes hashed for one candidate `proof`.
///
/// The polynomial is evaluated in `i128` with wrapping arithmetic, so a
/// tampered proof near `u64::MAX` fails the predicate instead of panicking.
pub fn puzzle_input(proof: u64, previous_proof: u64, index: u64, payload: &str) -> Vec<u8> {
    let p = proof as i128;
    let q = previous_proof as i128;
    let value = p
        .wrapping_mul(p)
        .wrapping_sub(q.wrapping_mul(q))
        .wrapping_add(index as i128);
    format!("{value}{payload}").into_bytes()
}

pub fn puzzle_hash(proof: u64, previous_proof: u64, index: u64, payload: &str) -> String {
    sha256_hex(&puzzle_input(proof, previous_proof, index, payload))
}

pub fn is_valid_proof(previous_proof: u64, index: u64, payload: &str, proof: u64) -> bool {
    puzzle_hash(proof, previous_proof, index, payload).starts_with(DIFFICULTY_PREFIX)
}

/// Linear scan from 1 for the first proof satisfying the puzzle.
///
/// Deterministic: the same inputs always yield the same proof. There is no
/// upper bound and no cancellation.
pub fn solve(previous_proof: u64, index: u64, payload: &str) -> u64 {
    let mut proof = 1u64;
    loop {
        if is_valid_proof(previous_proof, index, payload, proof) {
            debug!(index, proof, "proof of work found");
            return proof;
        }
        proof = proof.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn puzzle_input_layout() {
        assert_eq!(puzzle_input(1, 1, 2, "hello"), b"2hello".to_vec());
        assert_eq!(puzzle_input(3, 5, 4, "x"), b"-12x".to_vec());
    }

    #[test]
    fn puzzle_input_large_proof_does_not_panic() {
        let bytes = puzzle_input(u64::MAX, 0, 1, "");
        assert!(!bytes.is_empty());
    }

    #[test]
    fn solve_known_answers() {
        assert_eq!(solve(1, 2, "hello"), 5097);
        assert_eq!(solve(1, 2, "genesis block"), 1105);
        assert_eq!(
            puzzle_hash(5097, 1, 2, "hello"),
            "00002fb2e23ba39fc6409b7d34a98c5ebf656ee80c6fb1e3cf80d0f7008adcb1"
        );
    }

    #[test]
    fn solve_is_deterministic() {
        let a = solve(1105, 3, "payload");
        let b = solve(1105, 3, "payload");
        assert_eq!(a, b);
        assert!(is_valid_proof(1105, 3, "payload", a));
    }

    #[test]
    fn solve_returns_first_match() {
        let proof = solve(1, 2, "hello");
        assert!((1..proof).all(|p| !is_valid_proof(1, 2, "hello", p)));
    }

    #[test]
    fn predicate_depends_on_every_input() {
        assert!(is_valid_proof(1, 2, "hello", 5097));
        assert!(!is_valid_proof(1, 2, "hellp", 5097));
        assert!(!is_valid_proof(2, 2, "hello", 5097));
        assert!(!is_valid_proof(1, 3, "hello", 5097));
    }
}
