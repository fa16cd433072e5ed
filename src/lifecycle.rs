//! Transaction lifecycle: pending -> confirming -> confirmed | failed.
//!
//! The driver task owns a [`LifecycleSender`]; callers hold a [`WriteHandle`]
//! and either poll its flags or await [`WriteHandle::settled`]. Every
//! published phase is also appended to a history so observers that attach
//! late still see the full sequence.

use alloy_primitives::TxHash;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::contract::{ContractError, TxReceipt};

#[derive(Debug, Clone)]
pub enum TxState {
    /// Waiting for the wallet to sign and broadcast
    Pending,
    /// Broadcast; waiting for the receipt
    Confirming(TxHash),
    Confirmed(TxReceipt),
    Failed(Arc<ContractError>),
}

impl TxState {
    pub fn phase(&self) -> TxPhase {
        match self {
            TxState::Pending => TxPhase::Pending,
            TxState::Confirming(_) => TxPhase::Confirming,
            TxState::Confirmed(_) => TxPhase::Confirmed,
            TxState::Failed(_) => TxPhase::Failed,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, TxState::Confirmed(_) | TxState::Failed(_))
    }

    pub fn hash(&self) -> Option<TxHash> {
        match self {
            TxState::Confirming(hash) => Some(*hash),
            TxState::Confirmed(receipt) => Some(receipt.tx_hash),
            TxState::Pending | TxState::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPhase {
    Pending,
    Confirming,
    Confirmed,
    Failed,
}

pub struct LifecycleSender {
    tx: watch::Sender<TxState>,
    history: Arc<Mutex<Vec<TxPhase>>>,
    hash: Arc<Mutex<Option<TxHash>>>,
}

impl LifecycleSender {
    pub fn publish(&self, state: TxState) {
        if let Ok(mut history) = self.history.lock() {
            history.push(state.phase());
        }
        if let Some(hash) = state.hash() {
            if let Ok(mut known) = self.hash.lock() {
                *known = Some(hash);
            }
        }
        self.tx.send_replace(state);
    }
}

#[derive(Clone)]
pub struct WriteHandle {
    rx: watch::Receiver<TxState>,
    history: Arc<Mutex<Vec<TxPhase>>>,
    hash: Arc<Mutex<Option<TxHash>>>,
}

/// New lifecycle starting in [`TxState::Pending`]
pub fn channel() -> (LifecycleSender, WriteHandle) {
    let (tx, rx) = watch::channel(TxState::Pending);
    let history = Arc::new(Mutex::new(vec![TxPhase::Pending]));
    let hash = Arc::new(Mutex::new(None));

    (
        LifecycleSender { tx, history: history.clone(), hash: hash.clone() },
        WriteHandle { rx, history, hash },
    )
}

impl WriteHandle {
    /// Handle that failed before anything was submitted
    pub fn failed(error: ContractError) -> Self {
        let (sender, handle) = channel();
        sender.publish(TxState::Failed(Arc::new(error)));
        handle
    }

    pub fn state(&self) -> TxState {
        self.rx.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.rx.borrow(), TxState::Pending)
    }

    pub fn is_confirming(&self) -> bool {
        matches!(*self.rx.borrow(), TxState::Confirming(_))
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(*self.rx.borrow(), TxState::Confirmed(_))
    }

    pub fn error(&self) -> Option<Arc<ContractError>> {
        match &*self.rx.borrow() {
            TxState::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Transaction hash once the wallet has broadcast it; kept after settlement
    pub fn hash(&self) -> Option<TxHash> {
        self.hash.lock().ok().and_then(|known| *known)
    }

    pub fn history(&self) -> Vec<TxPhase> {
        self.history.lock().map(|history| history.clone()).unwrap_or_default()
    }

    pub fn subscribe(&self) -> watch::Receiver<TxState> {
        self.rx.clone()
    }

    /// Waits for the terminal state
    pub async fn settled(&self) -> TxState {
        let mut rx = self.rx.clone();
        loop {
            let state = rx.borrow_and_update().clone();
            if state.is_settled() {
                return state;
            }
            if rx.changed().await.is_err() {
                // Driver dropped without settling
                return rx.borrow().clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn phases_are_recorded_in_order() {
        let (sender, handle) = channel();
        assert!(handle.is_pending());

        let hash = TxHash::repeat_byte(7);
        sender.publish(TxState::Confirming(hash));
        assert!(handle.is_confirming());
        assert_eq!(handle.hash(), Some(hash));

        sender.publish(TxState::Confirmed(TxReceipt { tx_hash: hash, block_number: Some(1), success: true }));
        let settled = handle.settled().await;

        assert!(matches!(settled, TxState::Confirmed(_)));
        assert!(handle.is_confirmed());
        assert_eq!(handle.history(), vec![TxPhase::Pending, TxPhase::Confirming, TxPhase::Confirmed]);
    }

    #[tokio::test]
    async fn failed_handle_exposes_error() {
        let handle = WriteHandle::failed(ContractError::MissingSender);
        assert!(handle.error().is_some());
        assert!(!handle.is_pending());
        assert!(handle.hash().is_none());
        assert!(matches!(handle.settled().await, TxState::Failed(_)));
    }
}
