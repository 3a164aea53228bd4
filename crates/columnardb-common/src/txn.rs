//! MVCC transaction context.
//!
//! A context's phase only ever moves `Active -> Committed` or
//! `Active -> RolledBack`; both are terminal and sticky (once committed or
//! rolled back a context never changes phase again). Lives in this crate
//! rather than the executor so the operators and
//! scheduler crates, which stamp and read it without owning its lifecycle,
//! do not need to depend on the executor crate that creates it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPhase {
    Active,
    Committed,
    RolledBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Shared, cheaply-cloneable handle to one transaction's phase. Every
/// operator that touches a table under MVCC holds a clone of the same
/// handle so that a rollback anywhere is visible everywhere.
#[derive(Debug, Clone)]
pub struct TransactionContext {
    id: TransactionId,
    phase: Arc<Mutex<TransactionPhase>>,
    auto_commit: bool,
}

impl TransactionContext {
    pub fn new(auto_commit: bool) -> Self {
        let id = TransactionId(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            id,
            phase: Arc::new(Mutex::new(TransactionPhase::Active)),
            auto_commit,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    pub fn phase(&self) -> TransactionPhase {
        *self.phase.lock()
    }

    pub fn is_active(&self) -> bool {
        self.phase() == TransactionPhase::Active
    }

    pub fn was_rolled_back(&self) -> bool {
        self.phase() == TransactionPhase::RolledBack
    }

    /// `Active -> Committed`. A no-op if the phase is already terminal.
    pub fn commit(&self) {
        let mut phase = self.phase.lock();
        if *phase == TransactionPhase::Active {
            *phase = TransactionPhase::Committed;
        }
    }

    /// `Active -> RolledBack`. A no-op if the phase is already terminal.
    pub fn rollback(&self) {
        let mut phase = self.phase.lock();
        if *phase == TransactionPhase::Active {
            *phase = TransactionPhase::RolledBack;
        }
    }
}
