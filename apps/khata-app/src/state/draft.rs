//! # Draft Invoice State
//!
//! The invoice currently being put together at the counter.
//!
//! ## Draft Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Draft Invoice Operations                             │
//! │                                                                         │
//! │  Dashboard Action         Command                  Draft Change         │
//! │  ────────────────         ───────                  ────────────         │
//! │                                                                         │
//! │  Open form ──────────────► load_draft() ─────────► lots reloaded        │
//! │                                                                         │
//! │  Pick lot, qty, price ───► add_draft_line() ─────► lot qty decremented  │
//! │                                                                         │
//! │  Click Remove ───────────► remove_draft_line() ──► lot qty restored     │
//! │                                                                         │
//! │  Click Clear ────────────► clear_draft() ────────► all lines returned   │
//! │                                                                         │
//! │  Click Save ─────────────► save_invoice() ───────► lines forgotten      │
//! │                                                                         │
//! │  NOTE: The lock is never held across an await.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};

use khata_core::DraftInvoice;

/// Shared draft invoice.
#[derive(Debug, Clone, Default)]
pub struct DraftInvoiceState {
    draft: Arc<Mutex<DraftInvoice>>,
}

impl DraftInvoiceState {
    pub fn new(draft: DraftInvoice) -> Self {
        DraftInvoiceState {
            draft: Arc::new(Mutex::new(draft)),
        }
    }

    /// Executes a read-only function on the draft.
    pub fn with_draft<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&DraftInvoice) -> R,
    {
        let draft = self.draft.lock().expect("Draft mutex poisoned");
        f(&draft)
    }

    /// Executes a mutating function on the draft.
    pub fn with_draft_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut DraftInvoice) -> R,
    {
        let mut draft = self.draft.lock().expect("Draft mutex poisoned");
        f(&mut draft)
    }
}
