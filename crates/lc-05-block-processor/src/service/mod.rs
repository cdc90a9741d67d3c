//! # Ledger
//!
//! The commit orchestrator. A single coarse mutex guards the UTXO store, the
//! nonce tracker, the mempool, the in-memory chain and the orphan pool as one
//! resource group, so nonce advancement and UTXO spends from the same
//! transaction can never interleave with another caller.
//!
//! Rollback is snapshot-before-mutate: the UTXO set is exported, the nonce
//! map and mempool copied and the chain length recorded before the first
//! write. Any failure up to and including `persist` restores all four.

use crate::domain::errors::{AdmissionError, CommitError};
use crate::domain::integrity::{verify_header_hash, verify_integrity};
use crate::domain::linkage::{check_linkage, expected_successor};
use crate::domain::mempool::{Mempool, MempoolConfig};
use crate::domain::orphans::{OrphanConfig, OrphanPool, OrphanStatus};
use crate::domain::receipt::{BlockOutcome, CommitReceipt};
use crate::domain::snapshot::ChainStateSnapshot;
use crate::ports::outbound::{PostCommitHook, StateSink};
use lc_01_nonce_tracker::{NonceSnapshot, NonceTracker};
use lc_02_utxo_store::{DynBackend, SpendCondition, UtxoBackend, UtxoError, UtxoExport, UtxoStore};
use lc_04_tx_validation::{
    RejectionReason, SystemTimeSource, TimeSource, TransactionValidator, ValidationConfig,
};
use parking_lot::Mutex;
use shared_types::{
    Address, Amount, Block, ChainTip, Hash, OutPoint, Transaction, TxKind, TxOutput,
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerConfig {
    pub validation: ValidationConfig,
    pub mempool: MempoolConfig,
    pub orphans: OrphanConfig,
}

/// Everything the coarse lock protects.
struct ChainState<B: UtxoBackend> {
    utxos: UtxoStore<B>,
    nonces: NonceTracker,
    mempool: Mempool,
    /// Blocks committed since this process started.
    chain: Vec<Block>,
    /// Tip restored from disk. The chain continues on top of it.
    base_tip: Option<ChainTip>,
    orphans: OrphanPool,
}

/// Pre-commit copy used to undo a failed commit.
struct SavedState {
    utxos: UtxoExport,
    nonces: NonceSnapshot,
    mempool: Vec<Transaction>,
    chain_len: usize,
}

impl<B: UtxoBackend> ChainState<B> {
    fn tip(&self) -> Option<ChainTip> {
        self.chain.last().map(Block::tip).or(self.base_tip)
    }

    fn snapshot(&self) -> Result<ChainStateSnapshot, UtxoError> {
        Ok(ChainStateSnapshot {
            tip: self.tip(),
            utxos: self.utxos.export()?,
            nonces: self.nonces.snapshot(),
            mempool: self.mempool.snapshot(),
        })
    }

    fn capture(&self) -> Result<SavedState, UtxoError> {
        Ok(SavedState {
            utxos: self.utxos.export()?,
            nonces: self.nonces.snapshot(),
            mempool: self.mempool.snapshot(),
            chain_len: self.chain.len(),
        })
    }

    /// Put everything back. The UTXO import goes last since it is the only
    /// step that can fail.
    fn restore(&mut self, saved: SavedState) -> Result<(), UtxoError> {
        self.chain.truncate(saved.chain_len);
        self.nonces.restore(saved.nonces);
        self.mempool.restore(saved.mempool);
        self.utxos.import(saved.utxos)
    }
}

/// Chain state plus the rules for changing it.
pub struct Ledger<S: StateSink, B: UtxoBackend = DynBackend, T: TimeSource = SystemTimeSource> {
    config: LedgerConfig,
    validator: TransactionValidator<T>,
    sink: S,
    hooks: Vec<Box<dyn PostCommitHook>>,
    state: Mutex<ChainState<B>>,
}

impl<S: StateSink, B: UtxoBackend> Ledger<S, B> {
    /// Empty ledger over `utxos`, validating against the system clock.
    pub fn new(config: LedgerConfig, utxos: UtxoStore<B>, sink: S) -> Self {
        Self::with_clock(config, SystemTimeSource, utxos, sink)
    }
}

impl<S: StateSink, B: UtxoBackend, T: TimeSource> Ledger<S, B, T> {
    pub fn with_clock(config: LedgerConfig, clock: T, utxos: UtxoStore<B>, sink: S) -> Self {
        Self {
            config,
            validator: TransactionValidator::with_clock(config.validation, clock),
            sink,
            hooks: Vec::new(),
            state: Mutex::new(ChainState {
                utxos,
                nonces: NonceTracker::new(),
                mempool: Mempool::new(config.mempool),
                chain: Vec::new(),
                base_tip: None,
                orphans: OrphanPool::new(config.orphans),
            }),
        }
    }

    /// Register a best-effort side effect run after every durable commit.
    pub fn with_hook(mut self, hook: impl PostCommitHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Replace all chain state with a persisted snapshot. The in-memory chain
    /// and orphan pool are cleared; the snapshot's tip becomes the base the
    /// next block must extend.
    pub fn restore_snapshot(&self, snapshot: ChainStateSnapshot) -> Result<(), UtxoError> {
        let mut state = self.state.lock();
        state.utxos.import(snapshot.utxos)?;
        state.nonces.restore(snapshot.nonces);
        state.mempool.restore(snapshot.mempool);
        state.chain.clear();
        state.orphans.clear();
        state.base_tip = snapshot.tip;
        tracing::info!(
            height = ?snapshot.tip.map(|t| t.height),
            unspent = state.utxos.unspent_count(),
            accounts = state.nonces.len(),
            pending = state.mempool.len(),
            "ledger restored from snapshot"
        );
        Ok(())
    }

    pub fn snapshot(&self) -> Result<ChainStateSnapshot, UtxoError> {
        self.state.lock().snapshot()
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn tip(&self) -> Option<ChainTip> {
        self.state.lock().tip()
    }

    /// Height of the tip, `None` before the first block.
    pub fn chain_height(&self) -> Option<u64> {
        self.tip().map(|tip| tip.height)
    }

    /// Blocks committed by this process.
    pub fn chain_len(&self) -> usize {
        self.state.lock().chain.len()
    }

    pub fn block_at(&self, height: u64) -> Option<Block> {
        self.state
            .lock()
            .chain
            .iter()
            .find(|b| b.height == height)
            .cloned()
    }

    pub fn balance(&self, account: &Address) -> Result<Amount, UtxoError> {
        self.state.lock().utxos.balance(account)
    }

    pub fn nonce(&self, account: &Address) -> u64 {
        self.state.lock().nonces.current(account)
    }

    pub fn nonce_snapshot(&self) -> NonceSnapshot {
        self.state.lock().nonces.snapshot()
    }

    pub fn utxo_digest(&self) -> Result<Hash, UtxoError> {
        self.state.lock().utxos.digest()
    }

    pub fn mempool(&self) -> Vec<Transaction> {
        self.state.lock().mempool.snapshot()
    }

    pub fn mempool_len(&self) -> usize {
        self.state.lock().mempool.len()
    }

    pub fn orphan_count(&self) -> usize {
        self.state.lock().orphans.len()
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    /// Read-only admissibility check against current state.
    pub fn validate_transaction(&self, tx: &Transaction) -> Result<(), RejectionReason> {
        let state = self.state.lock();
        self.validator.validate(tx, &state.utxos, &state.nonces)
    }

    /// Validate and queue `tx`. Returns its id.
    pub fn submit_transaction(&self, tx: Transaction) -> Result<Hash, AdmissionError> {
        let mut state = self.state.lock();
        self.validator.validate(&tx, &state.utxos, &state.nonces)?;
        let id = state.mempool.insert(tx)?;
        tracing::debug!(tx_id = %short(&id), pending = state.mempool.len(), "transaction admitted");
        Ok(id)
    }

    // =========================================================================
    // BLOCKS
    // =========================================================================

    /// Apply `block` on top of the tip, atomically.
    pub fn commit(&self, block: Block) -> Result<CommitReceipt, CommitError> {
        let mut state = self.state.lock();
        self.commit_locked(&mut state, block)
    }

    /// Commit `block` if it extends the tip, hold it if it is ahead, reject
    /// it otherwise. After a commit, waiting orphans are promoted and stale
    /// ones pruned.
    pub fn submit_block(&self, block: Block) -> Result<BlockOutcome, CommitError> {
        let mut state = self.state.lock();
        let (next_height, _) = expected_successor(state.tip());

        if block.height > next_height {
            verify_header_hash(&block)?;
            let height = block.height;
            let hash = block.hash;
            let status = state.orphans.insert(block);
            match status {
                OrphanStatus::Held => tracing::debug!(
                    height,
                    hash = %short(&hash),
                    held = state.orphans.len(),
                    "block held as orphan"
                ),
                OrphanStatus::AlreadyHeld => {
                    tracing::debug!(height, hash = %short(&hash), "orphan already held")
                }
                OrphanStatus::PoolFull => tracing::warn!(
                    height,
                    hash = %short(&hash),
                    capacity = self.config.orphans.max_blocks,
                    "orphan pool full, block dropped"
                ),
            }
            return Ok(BlockOutcome::Orphaned { height, status });
        }

        let receipt = self.commit_locked(&mut state, block)?;
        let promoted = self.absorb_locked(&mut state);
        let pruned = self.prune_locked(&mut state, self.config.orphans.retention);
        Ok(BlockOutcome::Committed {
            receipt,
            promoted,
            pruned,
        })
    }

    /// Commit every held orphan that now extends the tip, repeatedly, until
    /// none does. Returns the receipts in commit order.
    pub fn absorb_orphan_blocks(&self) -> Vec<CommitReceipt> {
        let mut state = self.state.lock();
        self.absorb_locked(&mut state)
    }

    /// Drop orphan buckets more than `retention` blocks behind the tip.
    pub fn prune_orphans(&self, retention: u64) -> usize {
        let mut state = self.state.lock();
        self.prune_locked(&mut state, retention)
    }

    fn commit_locked(
        &self,
        state: &mut ChainState<B>,
        block: Block,
    ) -> Result<CommitReceipt, CommitError> {
        check_linkage(state.tip(), &block)?;
        verify_integrity(&block)?;
        let stateless = self.validator.check_stateless_batch(&block.transactions);
        for (index, (tx, result)) in block.transactions.iter().zip(stateless).enumerate() {
            result.map_err(|reason| CommitError::rejected(index, &tx.id_or_compute(), reason))?;
        }

        let saved = state.capture()?;
        let (balances, snapshot, evicted) = match self.apply_and_persist(state, &block) {
            Ok(applied) => applied,
            Err(cause) => return Err(roll_back(state, saved, cause, block.height)),
        };

        // Durable from here on. Nothing below may undo the block.
        if self.sink.checkpoint_due(block.height) {
            if let Err(e) = self.sink.write_checkpoint(&snapshot) {
                tracing::warn!(height = block.height, error = %e, "checkpoint write failed");
            }
        }
        for hook in &self.hooks {
            if let Err(e) = hook.on_commit(&block) {
                tracing::warn!(
                    hook = hook.name(),
                    height = block.height,
                    error = %e,
                    "post-commit hook failed"
                );
            }
        }

        tracing::info!(
            height = block.height,
            hash = %short(&block.hash),
            txs = block.transactions.len(),
            evicted,
            "block committed"
        );
        Ok(CommitReceipt {
            height: block.height,
            hash: block.hash,
            tx_count: block.transactions.len(),
            balances,
        })
    }

    /// Mutating half of a commit. Any error leaves `state` partially
    /// modified; the caller restores it.
    fn apply_and_persist(
        &self,
        state: &mut ChainState<B>,
        block: &Block,
    ) -> Result<(BTreeMap<Address, Amount>, ChainStateSnapshot, usize), CommitError> {
        let mut touched = BTreeSet::new();
        for (index, tx) in block.transactions.iter().enumerate() {
            let tx_id = tx.id_or_compute();
            self.validator
                .check_stateful(tx, &state.utxos, &state.nonces)
                .map_err(|reason| CommitError::rejected(index, &tx_id, reason))?;
            apply_transaction(&state.utxos, &state.nonces, index, tx_id, tx)?;
            touched.insert(tx.sender);
            touched.extend(tx.outputs.iter().map(|out| out.account));
        }

        let balances = touched
            .into_iter()
            .map(|account| Ok((account, state.utxos.balance(&account)?)))
            .collect::<Result<BTreeMap<_, _>, UtxoError>>()?;

        let evicted = state.mempool.remove_committed(&block.transactions);
        state.chain.push(block.clone());
        let snapshot = state.snapshot()?;
        self.sink.persist(&snapshot)?;
        Ok((balances, snapshot, evicted))
    }

    fn absorb_locked(&self, state: &mut ChainState<B>) -> Vec<CommitReceipt> {
        let mut promoted = Vec::new();
        loop {
            let (height, parent) = expected_successor(state.tip());
            let children = state.orphans.take_children(height, &parent);
            if children.is_empty() {
                break;
            }

            let mut advanced = false;
            for child in children {
                let hash = child.hash;
                if advanced {
                    tracing::debug!(height, hash = %short(&hash), "dropping sibling of promoted orphan");
                    continue;
                }
                match self.commit_locked(state, child) {
                    Ok(receipt) => {
                        tracing::info!(height, hash = %short(&hash), "orphan promoted");
                        promoted.push(receipt);
                        advanced = true;
                    }
                    Err(e) => {
                        tracing::warn!(height, hash = %short(&hash), error = %e, "orphan rejected")
                    }
                }
            }
            if !advanced {
                break;
            }
        }
        promoted
    }

    fn prune_locked(&self, state: &mut ChainState<B>, retention: u64) -> usize {
        let Some(tip) = state.tip() else {
            return 0;
        };
        let pruned = state.orphans.prune(tip.height, retention);
        if pruned > 0 {
            tracing::warn!(
                tip = tip.height,
                retention,
                pruned,
                remaining = state.orphans.len(),
                "pruned stale orphan blocks"
            );
        }
        pruned
    }
}

fn roll_back<B: UtxoBackend>(
    state: &mut ChainState<B>,
    saved: SavedState,
    cause: CommitError,
    height: u64,
) -> CommitError {
    match state.restore(saved) {
        Ok(()) => {
            tracing::warn!(height, error = %cause, "commit failed, state rolled back");
            cause
        }
        Err(restore) => {
            tracing::error!(
                height,
                error = %cause,
                restore_error = %restore,
                "rollback failed, in-memory state is inconsistent"
            );
            CommitError::RollbackFailed {
                cause: Box::new(cause),
                restore,
            }
        }
    }
}

/// Spend inputs, create outputs at `(tx_id, position)`, advance the nonce.
fn apply_transaction<B: UtxoBackend>(
    utxos: &UtxoStore<B>,
    nonces: &NonceTracker,
    index: usize,
    tx_id: Hash,
    tx: &Transaction,
) -> Result<(), CommitError> {
    for outpoint in tx.outpoints() {
        if !utxos.mark_spent(&outpoint.tx_id, outpoint.index)? {
            return Err(CommitError::Conflict { index, outpoint });
        }
    }
    for (position, output) in (0u32..).zip(&tx.outputs) {
        let condition = spend_condition_for(tx, output);
        if !utxos.add(output.account, tx_id, position, output.amount, condition)? {
            return Err(CommitError::Conflict {
                index,
                outpoint: OutPoint::new(tx_id, position),
            });
        }
    }
    nonces.advance(&tx.sender, tx.nonce)?;
    tracing::trace!(index, tx_id = %short(&tx_id), kind = tx.kind.label(), "transaction applied");
    Ok(())
}

/// Locked transfers lock what they pay to others; change stays spendable.
fn spend_condition_for(tx: &Transaction, output: &TxOutput) -> SpendCondition {
    match &tx.kind {
        TxKind::LockedTransfer {
            lock_id,
            unlock_time,
        } if output.account != tx.sender => SpendCondition::LockedUntil {
            lock_id: lock_id.clone(),
            unlock_time: *unlock_time,
        },
        TxKind::Ordinary
        | TxKind::Coinbase
        | TxKind::LockedTransfer { .. }
        | TxKind::GovernanceVote { .. } => SpendCondition::Owner,
    }
}

fn short(hash: &Hash) -> String {
    hex::encode(&hash[..8])
}
