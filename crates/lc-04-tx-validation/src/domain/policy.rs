//! # Kind-Specific Policy
//!
//! One arm per [`TxKind`] variant.

use crate::domain::errors::RejectionReason;
use shared_types::{Transaction, TxKind, VoteChoice};

/// Stage 7.
pub fn check_kind_policy(tx: &Transaction) -> Result<(), RejectionReason> {
    match &tx.kind {
        TxKind::Ordinary => Ok(()),
        TxKind::Coinbase => {
            check_outputs(tx)?;
            let outputs = tx.output_total().ok_or(RejectionReason::AmountOverflow)?;
            if tx.outputs.is_empty() || outputs != tx.amount {
                return Err(RejectionReason::CoinbaseValueMismatch {
                    amount: tx.amount,
                    outputs,
                });
            }
            Ok(())
        }
        TxKind::LockedTransfer {
            lock_id,
            unlock_time,
        } => {
            if lock_id.trim().is_empty() {
                return Err(RejectionReason::MissingLockId);
            }
            if *unlock_time <= tx.timestamp {
                return Err(RejectionReason::UnlockNotInFuture {
                    unlock_time: *unlock_time,
                    timestamp: tx.timestamp,
                });
            }
            Ok(())
        }
        TxKind::GovernanceVote {
            proposal_id,
            choice,
        } => {
            if proposal_id.trim().is_empty() {
                return Err(RejectionReason::MissingProposalId);
            }
            choice
                .parse::<VoteChoice>()
                .map(|_| ())
                .map_err(|e| RejectionReason::UnknownVoteChoice(e.0))
        }
    }
}

/// Every output pays a real account a positive amount.
pub(crate) fn check_outputs(tx: &Transaction) -> Result<(), RejectionReason> {
    for (index, output) in tx.outputs.iter().enumerate() {
        if output.amount == 0 {
            return Err(RejectionReason::InvalidOutput {
                index,
                detail: "zero amount",
            });
        }
        if output.account.is_zero() {
            return Err(RejectionReason::InvalidOutput {
                index,
                detail: "reserved zero address",
            });
        }
    }
    Ok(())
}
