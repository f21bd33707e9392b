//! # Application State
//!
//! State shared by the command functions.
//!
//! ## State Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Management                                     │
//! │                                                                         │
//! │          ┌──────────────────┼──────────────────┐                       │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐          │
//! │  │   DbState    │  │ DraftInvoiceState│  │   ConfigState    │          │
//! │  │              │  │                  │  │                  │          │
//! │  │  Database    │  │  Arc<Mutex<      │  │  shop_name       │          │
//! │  │  (SQLite     │  │   DraftInvoice   │  │  currency_symbol │          │
//! │  │   pool)      │  │  >>              │  │  number_locale   │          │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘          │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • DraftInvoiceState: Protected by Arc<Mutex<T>> for exclusive access  │
//! │  • ConfigState: Read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod draft;

pub use config::ConfigState;
pub use db::DbState;
pub use draft::DraftInvoiceState;
