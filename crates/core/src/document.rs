//! Document model
//!
//! Documents, update columns, and match conditions are all the same shape: an
//! insertion-ordered map from string keys to JSON values (string, number,
//! boolean, null, nested map/array). `serde_json`'s `preserve_order` feature
//! keeps key order stable, which matters wherever positional correspondence
//! with the backend does (batch inserts).
//!
//! The identifier field is `_id` and always carries a JSON string. Helpers
//! here attach and extract it; everything else about a document is opaque to
//! this crate.

use serde_json::Value;

/// Name of the document identifier field
pub const ID_FIELD: &str = "_id";

/// A document: ordered string-keyed JSON map
pub type Document = serde_json::Map<String, Value>;

/// Columns to set or unset in an update, keyed by field name
pub type Columns = serde_json::Map<String, Value>;

/// Equality condition on document fields (or a meta-id expression key)
pub type Condition = serde_json::Map<String, Value>;

/// Remove the `_id` field from a document and return it.
///
/// Returns `None` when the field is absent or not a string; a non-string
/// `_id` is left in place untouched.
pub fn take_id(doc: &mut Document) -> Option<String> {
    if !matches!(doc.get(ID_FIELD), Some(Value::String(_))) {
        return None;
    }
    match doc.remove(ID_FIELD) {
        Some(Value::String(id)) => Some(id),
        _ => None,
    }
}

/// Set the `_id` field on a document, overwriting any existing value.
pub fn attach_id(doc: &mut Document, id: &str) {
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
}

/// Build the meta-identifier expression for a quoted bucket name.
///
/// The result is used as a condition key targeting the store's intrinsic
/// per-document id, e.g. ``META(`orders`).id``.
pub fn meta_id_expr(quoted_bucket: &str) -> String {
    format!("META({}).id", quoted_bucket)
}
