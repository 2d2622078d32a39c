//! Line-item reconciliation: the write plan that turns an invoice's stored
//! line items into the requested set.

use std::collections::HashMap;

use crate::models::{InvoiceLineItem, LineItemInput};

#[derive(Debug, Clone, PartialEq)]
pub enum LineItemOp {
    Insert {
        invoice_id: i64,
        item: LineItemInput,
    },
    /// Targets the stored row by its own id.
    Update { row_id: i64, item: LineItemInput },
    Delete { row_id: i64 },
}

/// Diff `existing` against `requested`, keyed by catalog item id.
///
/// Requested items already stored become updates, new ones become inserts,
/// and stored items no longer requested become deletes. Duplicate item ids in
/// `requested` collapse to their last occurrence. Inserts and updates follow
/// the first-seen order of `requested`; deletes follow `existing`.
pub fn plan(
    invoice_id: i64,
    existing: &[InvoiceLineItem],
    requested: &[LineItemInput],
) -> Vec<LineItemOp> {
    let stored: HashMap<i64, i64> = existing.iter().map(|row| (row.item_id, row.id)).collect();

    let mut order: Vec<i64> = Vec::with_capacity(requested.len());
    let mut wanted: HashMap<i64, &LineItemInput> = HashMap::with_capacity(requested.len());
    for item in requested {
        if wanted.insert(item.item_id, item).is_none() {
            order.push(item.item_id);
        }
    }

    let mut ops: Vec<LineItemOp> = order
        .iter()
        .filter_map(|item_id| wanted.get(item_id))
        .map(|item| match stored.get(&item.item_id) {
            Some(&row_id) => LineItemOp::Update {
                row_id,
                item: (*item).clone(),
            },
            None => LineItemOp::Insert {
                invoice_id,
                item: (*item).clone(),
            },
        })
        .collect();

    ops.extend(
        existing
            .iter()
            .filter(|row| !wanted.contains_key(&row.item_id))
            .map(|row| LineItemOp::Delete { row_id: row.id }),
    );

    ops
}
