//! Field-order tables and canonicalization of callback parameters.
//!
//! Paymob signs a transaction callback by concatenating a fixed list of
//! transaction fields, in a fixed order, with no delimiter. The order differs
//! per callback shape only if Paymob documents it so; each shape keeps its
//! own table.

use super::params::ParameterBag;

/// An ordered list of field paths (dot-separated for nested fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOrderTable {
    name: &'static str,
    fields: &'static [&'static str],
}

impl FieldOrderTable {
    pub const fn new(name: &'static str, fields: &'static [&'static str]) -> Self {
        Self { name, fields }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains(&path)
    }
}

/// Signing order for the browser redirection (GET query string).
pub const REDIRECTION_FIELDS: FieldOrderTable = FieldOrderTable::new(
    "redirection",
    &[
        "amount_cents",
        "created_at",
        "currency",
        "error_occured",
        "has_parent_transaction",
        "id",
        "integration_id",
        "is_3d_secure",
        "is_auth",
        "is_capture",
        "is_refunded",
        "is_standalone_payment",
        "is_voided",
        "order.id",
        "owner",
        "pending",
        "source_data.pan",
        "source_data.sub_type",
        "success",
    ],
);

/// Signing order for the transaction-processed webhook (POST JSON body).
pub const PROCESSED_FIELDS: FieldOrderTable = FieldOrderTable::new(
    "processed",
    &[
        "amount_cents",
        "created_at",
        "currency",
        "error_occured",
        "has_parent_transaction",
        "id",
        "integration_id",
        "is_3d_secure",
        "is_auth",
        "is_capture",
        "is_refunded",
        "is_standalone_payment",
        "is_voided",
        "order.id",
        "owner",
        "pending",
        "source_data.pan",
        "source_data.sub_type",
        "success",
    ],
);

/// Concatenate the canonical form of every field in `table`, in order.
///
/// Missing fields contribute the empty string.
pub fn canonicalize(bag: &ParameterBag, table: &FieldOrderTable) -> String {
    table
        .fields()
        .iter()
        .map(|path| bag.lookup_str(path).unwrap_or_default())
        .collect()
}
