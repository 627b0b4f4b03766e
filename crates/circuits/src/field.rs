//! Typed field elements for the shielded pool.
//!
//! Every value that crosses the pool boundary is a BN254 scalar. The newtypes
//! below keep commitments, nullifier hashes and roots from being mixed up while
//! sharing one canonical encoding: 32 bytes, little-endian, `0x`-prefixed hex.

use std::fmt;
use std::str::FromStr;

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField, Zero};
use ark_serialize::CanonicalDeserialize;
use ark_std::UniformRand;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MalformedInputError;

/// Size of an encoded field element.
pub const FIELD_BYTES: usize = 32;

/// Parse a canonical little-endian field element.
///
/// Unlike `from_le_bytes_mod_order`, values at or above the modulus are
/// rejected instead of silently reduced, so two different byte strings can
/// never name the same commitment.
pub fn parse_field_element(bytes: &[u8]) -> Result<Fr, MalformedInputError> {
    if bytes.len() != FIELD_BYTES {
        return Err(MalformedInputError::InvalidLength(bytes.len()));
    }
    Fr::deserialize_compressed(bytes).map_err(|_| MalformedInputError::OutOfRange)
}

/// Parse a hex string (with or without `0x`) into a field element.
pub fn parse_field_hex(hex_str: &str) -> Result<Fr, MalformedInputError> {
    let bytes = hex::decode(hex_str.trim_start_matches("0x"))
        .map_err(|e| MalformedInputError::InvalidHex(e.to_string()))?;
    parse_field_element(&bytes)
}

/// Encode a field element as 32 little-endian bytes.
pub fn field_to_bytes(value: &Fr) -> [u8; FIELD_BYTES] {
    let mut out = [0u8; FIELD_BYTES];
    out.copy_from_slice(&value.into_bigint().to_bytes_le());
    out
}

/// Encode a field element as `0x`-prefixed hex.
pub fn field_to_hex(value: &Fr) -> String {
    format!("0x{}", hex::encode(field_to_bytes(value)))
}

/// Sample a uniformly random field element from the given CSPRNG.
pub fn generate_random_element<R: RngCore + CryptoRng>(rng: &mut R) -> Fr {
    Fr::rand(rng)
}

/// Sample a uniformly random field element from the operating system's entropy source.
pub fn generate_random_element_from_entropy() -> Fr {
    generate_random_element(&mut OsRng)
}

macro_rules! field_element_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub Fr);

        impl $name {
            pub fn new(value: Fr) -> Self {
                Self(value)
            }

            pub fn inner(&self) -> Fr {
                self.0
            }

            pub fn from_bytes(bytes: &[u8]) -> Result<Self, MalformedInputError> {
                parse_field_element(bytes).map(Self)
            }

            pub fn to_bytes(&self) -> [u8; FIELD_BYTES] {
                field_to_bytes(&self.0)
            }

            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }
        }

        impl From<Fr> for $name {
            fn from(value: Fr) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Fr {
            fn from(value: $name) -> Fr {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&field_to_hex(&self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), field_to_hex(&self.0))
            }
        }

        impl FromStr for $name {
            type Err = MalformedInputError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_field_hex(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&field_to_hex(&self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

field_element_type!(
    /// Hiding, binding digest of a deposit: `H(secret, nullifier, amount, asset)`.
    Commitment
);
field_element_type!(
    /// Published at spend time: `H(nullifier, leaf_index)`.
    NullifierHash
);
field_element_type!(
    /// Root of the commitment accumulator.
    Root
);
field_element_type!(
    /// Identifier of the deposited asset.
    AssetId
);
field_element_type!(
    /// Private blinding value known only to the depositor.
    Secret
);
field_element_type!(
    /// Private spend key material from which the nullifier hash is derived.
    Nullifier
);
field_element_type!(
    /// Recipient, relayer or refund account as seen by the ledger.
    Address
);

impl AssetId {
    pub fn from_u64(id: u64) -> Self {
        Self(Fr::from(id))
    }
}

impl Secret {
    /// Fresh secret from a CSPRNG.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(generate_random_element(rng))
    }
}

impl Nullifier {
    /// Fresh nullifier from a CSPRNG.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(generate_random_element(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_bytes_roundtrip_is_canonical() {
        let mut rng = StdRng::seed_from_u64(7);
        let value = generate_random_element(&mut rng);
        let bytes = field_to_bytes(&value);

        assert_eq!(parse_field_element(&bytes).unwrap(), value);
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert_eq!(
            parse_field_element(&[1u8; 31]),
            Err(MalformedInputError::InvalidLength(31))
        );
    }

    #[test]
    fn test_rejects_value_above_modulus() {
        // All ones is far above the BN254 scalar modulus.
        assert_eq!(
            parse_field_element(&[0xffu8; 32]),
            Err(MalformedInputError::OutOfRange)
        );
    }

    #[test]
    fn test_hex_parsing() {
        let commitment: Commitment = format!("0x{}", "00".repeat(32)).parse().unwrap();
        assert!(commitment.is_zero());

        assert!(matches!(
            "0xzz".parse::<Commitment>(),
            Err(MalformedInputError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_serde_uses_hex_strings() {
        let root = Root::from(Fr::from(5u64));
        let json = serde_json::to_string(&root).unwrap();

        assert!(json.starts_with("\"0x05"));
        assert_eq!(serde_json::from_str::<Root>(&json).unwrap(), root);
    }

    #[test]
    fn test_random_elements_differ() {
        let a = generate_random_element_from_entropy();
        let b = generate_random_element_from_entropy();
        assert_ne!(a, b);
    }
}
