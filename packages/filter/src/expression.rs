//! Property-match filter expressions for the render layer.

use serde_json::{Value, json};
use sheet_map_convert::export::typed_to_json;
use sheet_map_sheet_models::TypedValue;

/// A boolean expression over feature properties, in the shape map
/// libraries accept as layer filters.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    /// Every sub-expression holds.
    All(Vec<Self>),
    /// A property equals a value.
    Equals {
        /// Property name.
        property: String,
        /// Required value.
        value: TypedValue,
    },
}

impl FilterExpression {
    /// Encodes the expression as a JSON array, e.g.
    /// `["all", ["==", ["get", "Category"], "Park"]]`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::All(parts) => {
                let mut items = vec![json!("all")];
                items.extend(parts.iter().map(Self::to_json));
                Value::Array(items)
            }
            Self::Equals { property, value } => {
                json!(["==", ["get", property], typed_to_json(value)])
            }
        }
    }
}
