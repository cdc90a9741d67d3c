use crate::ports::outbound::{NonceView, UtxoView};
use lc_01_nonce_tracker::NonceTracker;
use lc_02_utxo_store::{Utxo, UtxoBackend, UtxoError, UtxoStore};
use shared_types::{Address, OutPoint};

impl<B: UtxoBackend> UtxoView for UtxoStore<B> {
    fn unspent(&self, outpoint: &OutPoint) -> Result<Option<Utxo>, UtxoError> {
        self.get(&outpoint.tx_id, outpoint.index)
    }
}

impl NonceView for NonceTracker {
    fn next_nonce(&self, account: &Address) -> Option<u64> {
        self.checked_next(account)
    }
}
