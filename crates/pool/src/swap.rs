//! Private swap parameters and their wire encoding.
//!
//! Encoded layout (88 bytes, integers little-endian):
//!
//! | offset | size | field            |
//! |--------|------|------------------|
//! | 0      | 32   | `asset_in`       |
//! | 32     | 32   | `asset_out`      |
//! | 64     | 8    | `amount_in`      |
//! | 72     | 8    | `min_amount_out` |
//! | 80     | 8    | `deadline`       |

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use shielded_circuits::{poseidon_hash_many, AssetId, MalformedInputError, FIELD_BYTES};

use crate::error::PoolError;

/// Size of [`SwapParameters::encode`] output.
pub const ENCODED_SWAP_LEN: usize = 2 * FIELD_BYTES + 3 * 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParameters {
    pub asset_in: AssetId,
    pub asset_out: AssetId,
    pub amount_in: u64,
    /// Slippage bound enforced by the ledger.
    pub min_amount_out: u64,
    /// Ledger timestamp after which the swap must not execute.
    pub deadline: u64,
}

impl SwapParameters {
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.amount_in == 0 {
            return Err(PoolError::Validation("swap amount_in must be positive".into()));
        }
        if self.asset_in == self.asset_out {
            return Err(PoolError::Validation(
                "swap must exchange two different assets".into(),
            ));
        }
        Ok(())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENCODED_SWAP_LEN);
        out.extend_from_slice(&self.asset_in.to_bytes());
        out.extend_from_slice(&self.asset_out.to_bytes());
        out.extend_from_slice(&self.amount_in.to_le_bytes());
        out.extend_from_slice(&self.min_amount_out.to_le_bytes());
        out.extend_from_slice(&self.deadline.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MalformedInputError> {
        if bytes.len() != ENCODED_SWAP_LEN {
            return Err(MalformedInputError::InvalidLength(bytes.len()));
        }
        let (assets, amounts) = bytes.split_at(2 * FIELD_BYTES);
        let (asset_in, asset_out) = assets.split_at(FIELD_BYTES);

        let mut words = amounts.chunks_exact(8).map(|chunk| {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            u64::from_le_bytes(word)
        });
        let mut next = || words.next().ok_or(MalformedInputError::InvalidLength(bytes.len()));

        Ok(Self {
            asset_in: AssetId::from_bytes(asset_in)?,
            asset_out: AssetId::from_bytes(asset_out)?,
            amount_in: next()?,
            min_amount_out: next()?,
            deadline: next()?,
        })
    }

    /// Digest bound into the spend proof as its context input.
    pub fn context_hash(&self) -> Fr {
        poseidon_hash_many(&[
            self.asset_in.0,
            self.asset_out.0,
            Fr::from(self.amount_in),
            Fr::from(self.min_amount_out),
            Fr::from(self.deadline),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SwapParameters {
        SwapParameters {
            asset_in: AssetId::from_u64(1),
            asset_out: AssetId::from_u64(2),
            amount_in: 500,
            min_amount_out: 480,
            deadline: 1_700_000_000,
        }
    }

    #[test]
    fn test_encoding_layout() {
        let encoded = params().encode();

        assert_eq!(encoded.len(), ENCODED_SWAP_LEN);
        assert_eq!(encoded[0], 1);
        assert_eq!(encoded[32], 2);
        assert_eq!(&encoded[64..72], &500u64.to_le_bytes());
        assert_eq!(SwapParameters::decode(&encoded).unwrap(), params());
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        let encoded = params().encode();
        assert_eq!(
            SwapParameters::decode(&encoded[..87]),
            Err(MalformedInputError::InvalidLength(87))
        );
    }

    #[test]
    fn test_decode_rejects_non_canonical_asset() {
        let mut encoded = params().encode();
        encoded[..32].fill(0xff);
        assert_eq!(
            SwapParameters::decode(&encoded),
            Err(MalformedInputError::OutOfRange)
        );
    }

    #[test]
    fn test_validation() {
        assert!(params().validate().is_ok());

        let mut same_asset = params();
        same_asset.asset_out = same_asset.asset_in;
        assert!(matches!(same_asset.validate(), Err(PoolError::Validation(_))));

        let mut empty = params();
        empty.amount_in = 0;
        assert!(matches!(empty.validate(), Err(PoolError::Validation(_))));
    }

    #[test]
    fn test_context_hash_binds_slippage() {
        let mut looser = params();
        looser.min_amount_out = 0;
        assert_ne!(params().context_hash(), looser.context_hash());
    }
}
