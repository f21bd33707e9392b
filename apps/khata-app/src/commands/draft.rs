//! # Draft Invoice Commands
//!
//! Commands for the invoice being put together.
//!
//! ## Draft Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Draft Lifecycle                                      │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│  Lines   │────►│ Payment  │────►│  Saved   │       │
//! │  │  Draft   │     │          │     │  Fields  │     │ Invoice  │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │                              │
//! │                   add_draft_line    save_invoice                       │
//! │                   remove_draft_line (invoice.rs)                       │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_draft ─────────────────────►                   │
//! │                                                      (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{parse_amount, refresh_draft_stock};
use crate::commands::stock::StockLotDto;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState, DraftInvoiceState};
use khata_core::{CoreError, DraftInvoice, DraftLine, Money};

/// Draft response: lines, what is still sellable, and the running total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftResponse {
    pub lines: Vec<DraftLine>,
    pub available: Vec<StockLotDto>,
    pub total: Money,
    pub total_display: String,
}

impl DraftResponse {
    pub fn new(draft: &DraftInvoice, config: &ConfigState) -> Self {
        DraftResponse {
            lines: draft.lines().to_vec(),
            available: draft
                .available()
                .iter()
                .map(|l| StockLotDto::new(l, config))
                .collect(),
            total: draft.total(),
            total_display: config.format_currency(draft.total()),
        }
    }
}

/// Input for a new draft line. The price is typed per sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineInput {
    pub lot_id: String,
    pub quantity: i64,
    pub unit_price: String,
}

/// Loads the current stock into the draft.
///
/// Lines already on the draft keep their quantities reserved.
pub async fn load_draft(
    db: &DbState,
    draft: &DraftInvoiceState,
    config: &ConfigState,
) -> Result<DraftResponse, ApiError> {
    debug!("load_draft command");

    refresh_draft_stock(db, draft).await?;
    Ok(draft.with_draft(|d| DraftResponse::new(d, config)))
}

pub fn get_draft(draft: &DraftInvoiceState, config: &ConfigState) -> DraftResponse {
    debug!("get_draft command");
    draft.with_draft(|d| DraftResponse::new(d, config))
}

/// Adds a line, taking its quantity off the chosen lot.
///
/// ## Errors
/// - `NOT_FOUND` when the lot is not sellable
/// - `INSUFFICIENT_STOCK` when the lot holds less than the quantity
/// - `VALIDATION_ERROR` for a bad quantity or price
pub fn add_draft_line(
    draft: &DraftInvoiceState,
    config: &ConfigState,
    input: AddLineInput,
) -> Result<DraftResponse, ApiError> {
    debug!(lot_id = %input.lot_id, quantity = input.quantity, "add_draft_line command");

    let unit_price = parse_amount("unit price", &input.unit_price)?;

    let response = draft.with_draft_mut(|d| {
        d.add_line(&input.lot_id, input.quantity, unit_price)?;
        Ok::<_, CoreError>(DraftResponse::new(d, config))
    })?;

    Ok(response)
}

/// Removes a line, returning its quantity to the lot.
pub fn remove_draft_line(
    draft: &DraftInvoiceState,
    config: &ConfigState,
    index: usize,
) -> Result<DraftResponse, ApiError> {
    debug!(index, "remove_draft_line command");

    let response = draft.with_draft_mut(|d| {
        d.remove_line(index)?;
        Ok::<_, CoreError>(DraftResponse::new(d, config))
    })?;

    Ok(response)
}

pub fn clear_draft(draft: &DraftInvoiceState, config: &ConfigState) -> DraftResponse {
    debug!("clear_draft command");

    draft.with_draft_mut(|d| {
        d.clear();
        DraftResponse::new(d, config)
    })
}
