//! Native Poseidon hash functions (outside circuits).

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonSponge;
use ark_crypto_primitives::sponge::CryptographicSponge;

use super::config::poseidon_config;

fn squeeze_one(sponge: &mut PoseidonSponge<Fr>) -> Fr {
    sponge.squeeze_field_elements::<Fr>(1)[0]
}

/// Hash a single field element.
pub fn poseidon_hash(input: Fr) -> Fr {
    let mut sponge = PoseidonSponge::new(poseidon_config());
    sponge.absorb(&input);
    squeeze_one(&mut sponge)
}

/// Hash two field elements. Used for Merkle nodes and nullifier hashes.
pub fn poseidon_hash_two(a: Fr, b: Fr) -> Fr {
    let mut sponge = PoseidonSponge::new(poseidon_config());
    sponge.absorb(&a);
    sponge.absorb(&b);
    squeeze_one(&mut sponge)
}

/// Hash a sequence of field elements in order.
pub fn poseidon_hash_many(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(poseidon_config());
    for input in inputs {
        sponge.absorb(input);
    }
    squeeze_one(&mut sponge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{One, Zero};

    #[test]
    fn test_hash_deterministic() {
        let a = Fr::from(42u64);
        let b = Fr::from(123u64);

        assert_eq!(poseidon_hash_two(a, b), poseidon_hash_two(a, b));
    }

    #[test]
    fn test_hash_single() {
        let h = poseidon_hash(Fr::one());
        assert_ne!(h, Fr::one());
    }

    #[test]
    fn test_two_matches_many() {
        let a = Fr::from(9u64);
        let b = Fr::from(10u64);
        assert_eq!(poseidon_hash_two(a, b), poseidon_hash_many(&[a, b]));
    }

    #[test]
    fn test_hash_of_zeros_is_not_zero() {
        assert!(!poseidon_hash_two(Fr::zero(), Fr::zero()).is_zero());
    }
}
