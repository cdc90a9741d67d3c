//! # Transaction Validator
//!
//! Stages short-circuit: the first failure is the reported reason.

use crate::adapters::time::SystemTimeSource;
use crate::domain::config::ValidationConfig;
use crate::domain::errors::RejectionReason;
use crate::domain::policy::{check_kind_policy, check_outputs};
use crate::domain::signature::{address_from_public_key, verify_prehash, SIGNATURE_LEN};
use crate::ports::outbound::{NonceView, TimeSource, UtxoView};
use rayon::prelude::*;
use shared_types::{Amount, Transaction};
use std::collections::HashSet;

/// Admissibility checks for a single transaction against live state.
#[derive(Debug, Clone)]
pub struct TransactionValidator<T: TimeSource = SystemTimeSource> {
    config: ValidationConfig,
    clock: T,
}

impl TransactionValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self::with_clock(config, SystemTimeSource)
    }
}

impl Default for TransactionValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl<T: TimeSource> TransactionValidator<T> {
    pub fn with_clock(config: ValidationConfig, clock: T) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Run all seven stages.
    pub fn validate<U, N>(
        &self,
        tx: &Transaction,
        utxos: &U,
        nonces: &N,
    ) -> Result<(), RejectionReason>
    where
        U: UtxoView + ?Sized,
        N: NonceView + ?Sized,
    {
        let result = self
            .check_stateless(tx)
            .and_then(|()| self.check_stateful(tx, utxos, nonces));
        if let Err(reason) = &result {
            tracing::debug!(
                tx_id = %short_id(tx),
                kind = tx.kind.label(),
                stage = %reason.stage(),
                code = reason.code(),
                %reason,
                "transaction rejected"
            );
        }
        result
    }

    pub fn is_admissible<U, N>(&self, tx: &Transaction, utxos: &U, nonces: &N) -> bool
    where
        U: UtxoView + ?Sized,
        N: NonceView + ?Sized,
    {
        self.validate(tx, utxos, nonces).is_ok()
    }

    /// Stages 1-4. Pure; safe to run on any thread.
    pub fn check_stateless(&self, tx: &Transaction) -> Result<(), RejectionReason> {
        self.check_structure(tx)?;
        self.check_format(tx)?;
        check_identity(tx)?;
        check_signature(tx)
    }

    /// Stages 1-4 for every transaction, in parallel. Results keep input
    /// order.
    pub fn check_stateless_batch(&self, txs: &[Transaction]) -> Vec<Result<(), RejectionReason>> {
        txs.par_iter().map(|tx| self.check_stateless(tx)).collect()
    }

    /// Stages 5-7 against `utxos` and `nonces`.
    pub fn check_stateful<U, N>(
        &self,
        tx: &Transaction,
        utxos: &U,
        nonces: &N,
    ) -> Result<(), RejectionReason>
    where
        U: UtxoView + ?Sized,
        N: NonceView + ?Sized,
    {
        if !tx.kind.is_coinbase() {
            check_funding(tx, utxos)?;
        }
        check_replay(tx, nonces)?;
        check_kind_policy(tx)
    }

    /// Validate each transaction independently against the same state.
    ///
    /// Stateless stages run in parallel first. Transactions are not applied
    /// to each other, so two entries spending the same output both pass;
    /// block commit catches that when it applies them in order.
    pub fn validate_batch<U, N>(
        &self,
        txs: &[Transaction],
        utxos: &U,
        nonces: &N,
    ) -> Vec<Result<(), RejectionReason>>
    where
        U: UtxoView + ?Sized,
        N: NonceView + ?Sized,
    {
        self.check_stateless_batch(txs)
            .into_iter()
            .zip(txs)
            .map(|(stateless, tx)| stateless.and_then(|()| self.check_stateful(tx, utxos, nonces)))
            .collect()
    }

    // =========================================================================
    // STAGES 1-2
    // =========================================================================

    fn check_structure(&self, tx: &Transaction) -> Result<(), RejectionReason> {
        if tx.id.is_none() {
            return Err(RejectionReason::MissingField("id"));
        }
        if tx.signature.is_empty() {
            return Err(RejectionReason::MissingField("signature"));
        }
        if tx.signature.len() != SIGNATURE_LEN {
            return Err(RejectionReason::MalformedField {
                field: "signature",
                detail: format!("expected {} bytes, got {}", SIGNATURE_LEN, tx.signature.len()),
            });
        }
        if tx.public_key.is_empty() {
            return Err(RejectionReason::MissingField("public_key"));
        }
        if !matches!(tx.public_key.len(), 33 | 65) {
            return Err(RejectionReason::MalformedField {
                field: "public_key",
                detail: format!("expected 33 or 65 bytes, got {}", tx.public_key.len()),
            });
        }
        if tx.kind.is_coinbase() && !tx.inputs.is_empty() {
            return Err(RejectionReason::MalformedField {
                field: "inputs",
                detail: "coinbase cannot spend inputs".to_string(),
            });
        }
        Ok(())
    }

    fn check_format(&self, tx: &Transaction) -> Result<(), RejectionReason> {
        if tx.sender.is_zero() {
            return Err(RejectionReason::ReservedAddress("sender"));
        }
        if tx.recipient.is_some_and(|r| r.is_zero()) {
            return Err(RejectionReason::ReservedAddress("recipient"));
        }
        if tx.amount == 0 {
            return Err(RejectionReason::ZeroAmount);
        }

        if tx.timestamp < self.config.min_timestamp {
            return Err(RejectionReason::TimestampTooOld {
                timestamp: tx.timestamp,
                min: self.config.min_timestamp,
            });
        }
        let max = self
            .clock
            .now()
            .saturating_add(self.config.max_clock_skew_secs);
        if tx.timestamp > max {
            return Err(RejectionReason::TimestampInFuture {
                timestamp: tx.timestamp,
                max,
            });
        }
        Ok(())
    }
}

// =============================================================================
// STAGES 3-6
// =============================================================================

fn check_identity(tx: &Transaction) -> Result<(), RejectionReason> {
    let claimed = tx.id.ok_or(RejectionReason::MissingField("id"))?;
    let computed = tx.compute_id();
    if claimed != computed {
        return Err(RejectionReason::IdMismatch { claimed, computed });
    }
    Ok(())
}

fn check_signature(tx: &Transaction) -> Result<(), RejectionReason> {
    let id = tx.id.ok_or(RejectionReason::MissingField("id"))?;
    let key = verify_prehash(&id, &tx.signature, &tx.public_key)?;

    // A coinbase is signed by the proposer on behalf of the reward account.
    if !tx.kind.is_coinbase() {
        let derived = address_from_public_key(&key);
        if derived != tx.sender {
            return Err(RejectionReason::SignerMismatch {
                sender: tx.sender,
                derived,
            });
        }
    }
    Ok(())
}

fn check_funding<U: UtxoView + ?Sized>(tx: &Transaction, utxos: &U) -> Result<(), RejectionReason> {
    if tx.inputs.is_empty() {
        return Err(RejectionReason::NoInputs);
    }

    let mut seen = HashSet::with_capacity(tx.inputs.len());
    let mut available: Amount = 0;
    for outpoint in tx.outpoints() {
        if !seen.insert(outpoint) {
            return Err(RejectionReason::DuplicateInput(outpoint));
        }
        let utxo = utxos
            .unspent(&outpoint)
            .map_err(|e| RejectionReason::StateUnavailable(e.to_string()))?
            .ok_or(RejectionReason::UnknownInput(outpoint))?;
        if utxo.owner != tx.sender {
            return Err(RejectionReason::ForeignInput {
                outpoint,
                owner: utxo.owner,
            });
        }
        if !utxo.spend_condition.is_unlocked_at(tx.timestamp) {
            return Err(RejectionReason::InputLocked {
                outpoint,
                unlock_time: utxo.spend_condition.unlock_time().unwrap_or_default(),
            });
        }
        available = available
            .checked_add(utxo.amount)
            .ok_or(RejectionReason::AmountOverflow)?;
    }

    if tx.outputs.is_empty() {
        return Err(RejectionReason::NoOutputs);
    }
    check_outputs(tx)?;

    let required = tx
        .output_total()
        .and_then(|total| total.checked_add(tx.fee))
        .ok_or(RejectionReason::AmountOverflow)?;
    if available < required {
        return Err(RejectionReason::InsufficientFunds {
            available,
            required,
        });
    }
    Ok(())
}

fn check_replay<N: NonceView + ?Sized>(tx: &Transaction, nonces: &N) -> Result<(), RejectionReason> {
    let expected = nonces
        .next_nonce(&tx.sender)
        .ok_or(RejectionReason::NonceExhausted { account: tx.sender })?;
    if tx.nonce != expected {
        return Err(RejectionReason::NonceMismatch {
            expected,
            actual: tx.nonce,
        });
    }
    Ok(())
}

fn short_id(tx: &Transaction) -> String {
    hex::encode(&tx.id_or_compute()[..4])
}
