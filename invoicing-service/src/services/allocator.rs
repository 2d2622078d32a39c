//! Invoice code allocation.
//!
//! Codes are the zero-padded count of every invoice row ever written, plus
//! one. The count is read inside the create transaction after the allocation
//! lock is taken, and soft deletes never shrink it, so a live code is never
//! handed out twice. The unique index on `invoice_code` backs this up.

/// Create attempts before a code collision is reported as a conflict.
pub const MAX_CREATE_ATTEMPTS: u32 = 3;

/// `0001` for an empty table; widens past four digits instead of wrapping.
pub fn next_code(existing_rows: i64) -> String {
    format!("{:04}", existing_rows.max(0) + 1)
}
