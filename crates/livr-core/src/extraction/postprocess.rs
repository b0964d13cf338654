//! Numeric conversion of declared item fields.

use indexmap::IndexMap;
use tracing::trace;

use crate::models::delivery::{FieldValue, Item};
use crate::profile::NumericKind;
use crate::text::{to_float, to_integer, to_number};

/// Convert one value. Unparseable text becomes zero.
///
/// A null integer or number field becomes zero, a null float field stays
/// null. Values that are already numeric are left as they are.
pub fn convert(value: &FieldValue, kind: NumericKind) -> FieldValue {
    match (value, kind) {
        (FieldValue::Text(raw), NumericKind::Integer) => FieldValue::Integer(to_integer(raw)),
        (FieldValue::Text(raw), NumericKind::Float) => FieldValue::Float(to_float(raw)),
        (FieldValue::Text(raw), NumericKind::Number) => FieldValue::Float(to_number(raw)),
        (FieldValue::Null, NumericKind::Integer) => FieldValue::Integer(0),
        (FieldValue::Null, NumericKind::Number) => FieldValue::Float(0.0),
        (other, _) => other.clone(),
    }
}

/// Apply the declared conversions to every item.
pub fn apply(items: &mut [Item], fields: &IndexMap<String, NumericKind>) {
    if fields.is_empty() {
        return;
    }
    for item in items {
        for (field, kind) in fields {
            if let Some(value) = item.fields.get_mut(field) {
                let converted = convert(value, *kind);
                trace!("{}: {:?} -> {:?}", field, value, converted);
                *value = converted;
            }
        }
    }
}
