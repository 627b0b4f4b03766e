//! Deposit, private swap and withdraw transitions.
//!
//! All three follow the same shape: validate, do the slow external work
//! (prover, ledger) without holding the state lock, then apply the confirmed
//! result inside one short write-locked section. The ledger is authoritative;
//! whenever its answer cannot be mirrored locally the pool replays the
//! ledger's event log.

use std::sync::Arc;

use parking_lot::RwLock;
use shielded_circuits::{
    AccumulatorError, AssetId, Commitment, MembershipProof, NullifierHash, Root,
};
use tracing::{debug, info, instrument, warn};

use crate::config::{PoolConfig, RootPolicy};
use crate::error::{PoolError, Result};
use crate::ledger::{
    AssetValue, DepositSubmission, LedgerClient, SwapSubmission, WithdrawSubmission,
};
use crate::prover::{ProofBytes, Prover, PublicInputs};
use crate::request::{
    DepositReceipt, PrivateSwapRequest, SwapReceipt, WithdrawReceipt, WithdrawRequest,
};
use crate::state::{LeafApplication, PoolState};

/// Handle to one shielded pool.
///
/// Cloning is cheap and every clone drives the same state. Separate pools (per
/// asset or per chain) are separate `PoolStateMachine::new` calls and never
/// share anything.
pub struct PoolStateMachine<L, P> {
    config: Arc<PoolConfig>,
    state: Arc<RwLock<PoolState>>,
    ledger: Arc<L>,
    prover: Arc<P>,
}

impl<L, P> Clone for PoolStateMachine<L, P> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            state: Arc::clone(&self.state),
            ledger: Arc::clone(&self.ledger),
            prover: Arc::clone(&self.prover),
        }
    }
}

/// Holds a nullifier reservation for the lifetime of one spend.
///
/// Dropping it without [`Reservation::complete`] (error, or the request future
/// being dropped mid-await) releases the nullifier hash again.
struct Reservation {
    state: Arc<RwLock<PoolState>>,
    nullifier_hash: NullifierHash,
    armed: bool,
}

impl Reservation {
    fn acquire(state: &Arc<RwLock<PoolState>>, nullifier_hash: NullifierHash) -> Result<Self> {
        state.write().nullifiers_mut().reserve(nullifier_hash)?;
        Ok(Self {
            state: Arc::clone(state),
            nullifier_hash,
            armed: true,
        })
    }

    /// The spend is recorded; nothing left to release.
    fn complete(mut self) {
        self.armed = false;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.armed {
            self.state.write().nullifiers_mut().release(&self.nullifier_hash);
            debug!(nullifier_hash = %self.nullifier_hash, "released nullifier reservation");
        }
    }
}

impl<L, P> PoolStateMachine<L, P>
where
    L: LedgerClient,
    P: Prover,
{
    /// Start an empty pool mirroring `ledger`.
    pub fn new(config: PoolConfig, ledger: Arc<L>, prover: Arc<P>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| PoolError::Validation(e.to_string()))?;
        let state = PoolState::new(&config)?;

        Ok(Self {
            config: Arc::new(config),
            state: Arc::new(RwLock::new(state)),
            ledger,
            prover,
        })
    }

    /// Start a pool from the ledger's full event log (cold start).
    pub async fn from_ledger(config: PoolConfig, ledger: Arc<L>, prover: Arc<P>) -> Result<Self> {
        let pool = Self::new(config, ledger, prover)?;
        pool.resync().await?;
        Ok(pool)
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn current_root(&self) -> Root {
        self.state.read().current_root()
    }

    /// Number of leaves actually inserted.
    pub fn anonymity_set_size(&self) -> u64 {
        self.state.read().accumulator().len()
    }

    pub fn prove_membership(&self, leaf_index: u64) -> Result<MembershipProof> {
        Ok(self.state.read().accumulator().prove_membership(leaf_index)?)
    }

    /// Local cache first, then the ledger. Positive ledger answers are cached.
    pub async fn is_spent(&self, nullifier_hash: &NullifierHash) -> Result<bool> {
        let cached = self.state.read().nullifiers().is_spent(nullifier_hash);
        if cached {
            return Ok(true);
        }

        let spent = self.ledger.is_spent(nullifier_hash).await?;
        if spent {
            self.state.write().nullifiers_mut().cache_spent(*nullifier_hash);
        }
        Ok(spent)
    }

    /// Submit `commitment` to the ledger and mirror the leaf it was assigned.
    ///
    /// Ledger failures are returned unchanged; nothing is recorded locally.
    /// Once the ledger has accepted the deposit a receipt is always returned.
    #[instrument(skip(self, commitment), fields(commitment = %commitment))]
    pub async fn deposit(
        &self,
        commitment: Commitment,
        amount: u64,
        asset_id: AssetId,
    ) -> Result<DepositReceipt> {
        if commitment.is_zero() {
            return Err(PoolError::Validation("commitment must not be zero".into()));
        }
        if amount == 0 {
            return Err(PoolError::Validation("deposit amount must be positive".into()));
        }
        {
            let state = self.state.read();
            if state.accumulator().is_full() {
                return Err(PoolError::CapacityExceeded {
                    capacity: state.accumulator().capacity(),
                });
            }
        }

        let event = self
            .ledger
            .deposit(DepositSubmission {
                commitment,
                value: AssetValue { amount, asset_id },
            })
            .await?;

        let application = self.state.write().apply_leaf(commitment, event.leaf_index);
        let (root, synced) = self
            .settle_leaf(commitment, event.leaf_index, application)
            .await;
        info!(leaf_index = event.leaf_index, root = %root, synced, "deposit confirmed");

        Ok(DepositReceipt {
            leaf_index: event.leaf_index,
            root,
            synced,
        })
    }

    /// Spend a note into `request.new_commitment`.
    #[instrument(skip(self, request), fields(nullifier_hash = %request.nullifier_hash))]
    pub async fn private_swap(&self, request: PrivateSwapRequest) -> Result<SwapReceipt> {
        request.validate()?;
        let inputs = PublicInputs::for_swap(&request);
        let reservation = self.admit_spend(&inputs, &request.proof).await?;

        let confirmation = self
            .ledger
            .private_swap(SwapSubmission {
                proof: request.proof,
                encoded_swap_params: request.swap.encode(),
                nullifier_hash: request.nullifier_hash,
                new_commitment: request.new_commitment,
                recipient: request.recipient,
            })
            .await?;

        // Confirmed: local state follows the ledger and the caller gets a receipt.
        let application = self.state.write().apply_confirmed_swap(
            request.nullifier_hash,
            request.new_commitment,
            confirmation.leaf_index,
        );
        reservation.complete();

        let (root, mirrored) = self
            .settle_leaf(request.new_commitment, confirmation.leaf_index, application)
            .await;
        let synced = mirrored && self.after_spend().await;
        info!(tx = %confirmation.tx, leaf_index = confirmation.leaf_index, synced, "swap confirmed");

        Ok(SwapReceipt {
            tx: confirmation.tx,
            leaf_index: confirmation.leaf_index,
            root,
            synced,
        })
    }

    /// Spend a note out of the pool. No commitment is inserted.
    #[instrument(skip(self, request), fields(nullifier_hash = %request.nullifier_hash))]
    pub async fn withdraw(&self, request: WithdrawRequest) -> Result<WithdrawReceipt> {
        request.validate()?;
        let inputs = PublicInputs::for_withdraw(&request);
        let reservation = self.admit_spend(&inputs, &request.proof).await?;

        let confirmation = self
            .ledger
            .withdraw(WithdrawSubmission {
                proof: request.proof,
                root: request.root,
                nullifier_hash: request.nullifier_hash,
                commitment_hash: request.commitment_hash,
                recipient: request.recipient,
                relayer: request.relayer,
                fee: request.fee,
                refund: request.refund,
            })
            .await?;

        let root = {
            let mut state = self.state.write();
            state.apply_confirmed_spend(request.nullifier_hash);
            state.current_root()
        };
        reservation.complete();
        let synced = self.after_spend().await;
        info!(tx = %confirmation.tx, synced, "withdrawal confirmed");

        Ok(WithdrawReceipt {
            tx: confirmation.tx,
            root,
            synced,
        })
    }

    /// Replay the ledger's event log and adopt the result.
    ///
    /// A replay holding fewer leaves than the local tree is adopted only when
    /// the ledger's latest root matches it (the ledger rolled back). Otherwise
    /// it is an older snapshot than what this pool already mirrors and is
    /// discarded.
    #[instrument(skip(self))]
    pub async fn resync(&self) -> Result<Root> {
        let events = self.ledger.events(0).await?;
        let replayed = PoolState::replay(&self.config, &events)?;
        let remote = replayed.accumulator().len();

        let behind = remote < self.anonymity_set_size();
        let rolled_back = behind && self.ledger.latest_root().await? == replayed.current_root();

        let mut state = self.state.write();
        let local = state.accumulator().len();
        if remote < local {
            if !rolled_back {
                debug!(local, remote, "ledger snapshot is behind local state, keeping local");
                return Ok(state.current_root());
            }
            warn!(local, remote, "ledger rolled back, dropping local leaves");
        }

        state.install(replayed);
        let root = state.current_root();
        info!(leaves = remote, root = %root, "resynchronised from ledger");
        Ok(root)
    }

    /// Compare the local root with the ledger's and resync on mismatch.
    ///
    /// Returns `true` when no resync was needed.
    #[instrument(skip(self))]
    pub async fn check_sync(&self) -> Result<bool> {
        let remote = self.ledger.latest_root().await?;
        if remote == self.current_root() {
            return Ok(true);
        }

        warn!(remote = %remote, local = %self.current_root(), "root mismatch with ledger");
        let root = self.resync().await?;
        let latest = self.ledger.latest_root().await?;
        if root != latest {
            return Err(PoolError::Divergence(format!(
                "ledger root {latest} not reproduced by replay (got {root})"
            )));
        }
        Ok(false)
    }

    /// Checks shared by every spend, in order: root recency, local registry
    /// (which also reserves the hash), ledger registry, proof.
    async fn admit_spend(&self, inputs: &PublicInputs, proof: &ProofBytes) -> Result<Reservation> {
        self.check_root(&inputs.root)?;

        let reservation = Reservation::acquire(&self.state, inputs.nullifier_hash)?;
        if self.is_spent(&inputs.nullifier_hash).await? {
            return Err(PoolError::DoubleSpend(inputs.nullifier_hash));
        }

        if !self.prover.verify(proof, inputs).await? {
            return Err(PoolError::ProofInvalid(
                "proof does not verify against the public inputs".into(),
            ));
        }
        debug!("proof verified");

        Ok(reservation)
    }

    fn check_root(&self, root: &Root) -> Result<()> {
        let state = self.state.read();
        let accumulator = state.accumulator();

        let accepted = match self.config.root_policy {
            RootPolicy::CurrentOnly => *root == accumulator.current_root(),
            RootPolicy::RecentWindow => accumulator.is_known_root(root),
        };
        if accepted && !accumulator.is_empty() {
            Ok(())
        } else {
            Err(PoolError::ProofInvalid(format!(
                "root {root} is not accepted under {:?}",
                self.config.root_policy
            )))
        }
    }

    /// Finish mirroring a ledger-confirmed leaf, resyncing if the local tree
    /// could not take it at the ledger's index.
    ///
    /// Returns the local root and whether the leaf is now mirrored. Failures
    /// are logged; the ledger has already committed the leaf.
    async fn settle_leaf(
        &self,
        commitment: Commitment,
        leaf_index: u64,
        application: std::result::Result<LeafApplication, AccumulatorError>,
    ) -> (Root, bool) {
        match application {
            Ok(LeafApplication::Applied { root }) => return (root, true),
            Ok(LeafApplication::AlreadyPresent) => return (self.current_root(), true),
            Ok(LeafApplication::Gap { expected, got }) => {
                debug!(expected, got, "ledger index ahead of local tree");
            }
            Ok(LeafApplication::Conflict { index }) => {
                warn!(index, "local leaf conflicts with ledger");
            }
            Err(e) => {
                warn!(error = %e, "confirmed leaf could not be inserted locally");
            }
        }

        if let Err(e) = self.resync().await {
            warn!(error = %e, leaf_index, "resync after confirmed leaf failed");
            return (self.current_root(), false);
        }

        let state = self.state.read();
        let mirrored = state.accumulator().leaf(leaf_index) == Some(commitment);
        if !mirrored {
            warn!(leaf_index, "confirmed leaf missing after resync");
        }
        (state.current_root(), mirrored)
    }

    /// Optional root comparison after a confirmed spend. Returns whether the
    /// pool is known to match the ledger.
    async fn after_spend(&self) -> bool {
        if !self.config.verify_sync_after_spend {
            return true;
        }
        match self.check_sync().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "sync check after confirmed spend failed");
                false
            }
        }
    }
}
