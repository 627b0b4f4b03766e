//! Full Groth16 round trips through the pool.

use std::sync::{Arc, OnceLock};

use ark_bn254::Fr;
use ark_std::rand::{rngs::StdRng, SeedableRng};

use shielded_circuits::{Address, AssetId, Note};
use shielded_pool::{
    InMemoryLedger, PoolConfig, PoolError, PoolStateMachine, ProofBytes, Prover, PublicInputs,
    SwapParameters,
};

use crate::prove::{prove_spend, prove_swap, prove_withdraw, ProveError, WithdrawTarget};
use crate::setup::{setup_spend_circuit, SpendKeys};
use crate::verify::Groth16Verifier;

const DEPTH: usize = 4;

/// Setup is the slow part; share one key pair across tests.
fn keys() -> &'static SpendKeys {
    static KEYS: OnceLock<SpendKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(42);
        setup_spend_circuit(DEPTH, &mut rng).unwrap()
    })
}

type Pool = PoolStateMachine<InMemoryLedger, Groth16Verifier>;

fn pool() -> Pool {
    let ledger = Arc::new(InMemoryLedger::new(DEPTH).unwrap());
    let verifier = Arc::new(Groth16Verifier::new(&keys().verifying_key).unwrap());
    PoolStateMachine::new(PoolConfig::with_depth(DEPTH), ledger, verifier).unwrap()
}

fn target() -> WithdrawTarget {
    WithdrawTarget {
        recipient: Address(Fr::from(0xa11ceu64)),
        relayer: Address(Fr::from(0x7e1au64)),
        fee: 3,
        refund: 0,
    }
}

async fn deposited(pool: &Pool, rng: &mut StdRng) -> (Note, u64) {
    let note = Note::random(1_000, AssetId::from_u64(1), rng);
    let receipt = pool
        .deposit(note.commitment().unwrap(), note.amount, note.asset_id)
        .await
        .unwrap();
    (note, receipt.leaf_index)
}

#[tokio::test]
async fn test_groth16_withdraw_end_to_end() {
    let pool = pool();
    let mut rng = StdRng::seed_from_u64(1);

    deposited(&pool, &mut rng).await;
    let (note, index) = deposited(&pool, &mut rng).await;

    let path = pool.prove_membership(index).unwrap();
    let request = prove_withdraw(&keys().proving_key, &note, &path, target(), &mut rng).unwrap();

    let receipt = pool.withdraw(request.clone()).await.unwrap();
    assert_eq!(receipt.root, pool.current_root());
    assert!(matches!(
        pool.withdraw(request).await,
        Err(PoolError::DoubleSpend(_))
    ));
}

#[tokio::test]
async fn test_groth16_swap_end_to_end() {
    let pool = pool();
    let mut rng = StdRng::seed_from_u64(2);

    let (note, index) = deposited(&pool, &mut rng).await;
    let output = Note::random(990, AssetId::from_u64(2), &mut rng);
    let swap = SwapParameters {
        asset_in: note.asset_id,
        asset_out: output.asset_id,
        amount_in: note.amount,
        min_amount_out: output.amount,
        deadline: u64::MAX,
    };

    let path = pool.prove_membership(index).unwrap();
    let request = prove_swap(
        &keys().proving_key,
        &note,
        &path,
        output.commitment().unwrap(),
        Address(Fr::from(5u64)),
        swap,
        &mut rng,
    )
    .unwrap();

    let receipt = pool.private_swap(request).await.unwrap();
    assert_eq!(receipt.leaf_index, 1);
    assert_eq!(pool.anonymity_set_size(), 2);
}

#[tokio::test]
async fn test_tampered_request_rejected() {
    let pool = pool();
    let mut rng = StdRng::seed_from_u64(3);

    let (note, index) = deposited(&pool, &mut rng).await;
    let path = pool.prove_membership(index).unwrap();
    let request = prove_withdraw(&keys().proving_key, &note, &path, target(), &mut rng).unwrap();

    // Redirecting the payout invalidates the proof
    let mut redirected = request.clone();
    redirected.recipient = Address(Fr::from(0xbadu64));
    assert!(matches!(
        pool.withdraw(redirected).await,
        Err(PoolError::ProofInvalid(_))
    ));

    let mut raised_fee = request.clone();
    raised_fee.fee = 900;
    assert!(matches!(
        pool.withdraw(raised_fee).await,
        Err(PoolError::ProofInvalid(_))
    ));

    // The untouched request still goes through
    pool.withdraw(request).await.unwrap();
}

#[tokio::test]
async fn test_malformed_proof_bytes_do_not_verify() {
    let verifier = Groth16Verifier::new(&keys().verifying_key).unwrap();
    let inputs = PublicInputs {
        root: Default::default(),
        nullifier_hash: Default::default(),
        output_commitment: None,
        recipient: Default::default(),
        context_hash: Fr::from(0u64),
    };

    let verified = verifier
        .verify(&ProofBytes(vec![0xde, 0xad, 0xbe, 0xef]), &inputs)
        .await
        .unwrap();
    assert!(!verified);
}

#[tokio::test]
async fn test_prove_rejects_note_outside_tree() {
    let pool = pool();
    let mut rng = StdRng::seed_from_u64(4);

    let (_, index) = deposited(&pool, &mut rng).await;
    let stranger = Note::random(1_000, AssetId::from_u64(1), &mut rng);
    let path = pool.prove_membership(index).unwrap();

    let result = prove_withdraw(&keys().proving_key, &stranger, &path, target(), &mut rng);
    assert!(matches!(result, Err(ProveError::InvalidState(_))));
}

#[test]
fn test_proof_public_inputs_match_pool_layout() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut tree = shielded_circuits::MerkleAccumulator::new(DEPTH).unwrap();
    let note = Note::random(7, AssetId::from_u64(1), &mut rng);
    let index = tree.insert(note.commitment().unwrap()).unwrap();
    let path = tree.prove_membership(index).unwrap();

    let inputs = PublicInputs {
        root: tree.current_root(),
        nullifier_hash: note.nullifier_hash(index),
        output_commitment: None,
        recipient: Address(Fr::from(1u64)),
        context_hash: Fr::from(2u64),
    };
    let proof = prove_spend(&keys().proving_key, &note, &path, &inputs, &mut rng).unwrap();

    assert_eq!(proof.public_inputs, inputs.to_field_elements().to_vec());
}
