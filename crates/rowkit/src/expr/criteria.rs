//! Equality criteria over a field map.
//!
//! This is the expression form of the repository's where-criteria
//! pass-through: every entry compiles to `column = ?`, except null values,
//! which compile to `column IS NULL` (SQL equality never matches NULL).

use rusqlite::types::Value;

use crate::{fields::FieldMap, traits::Expression};

/// A conjunction of column equality conditions built from a [`FieldMap`].
///
/// An empty criteria map compiles to a tautology and matches every row. The
/// repository can produce empty criteria when the table declares no primary
/// key; this layer does not reject that.
pub struct Criteria(FieldMap);

impl Criteria {
    pub fn new(criteria: FieldMap) -> Self {
        Self(criteria)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<FieldMap> for Criteria {
    fn from(criteria: FieldMap) -> Self {
        Self(criteria)
    }
}

impl Expression for Criteria {
    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        if self.0.is_empty() {
            return "1 = 1".to_string();
        }

        let conditions = self
            .0
            .iter()
            .map(|(column, value)| match value {
                Value::Null => format!("{} IS NULL", column),
                other => {
                    params.push(other.clone());
                    format!("{} = ?", column)
                }
            })
            .collect::<Vec<_>>();

        if conditions.len() == 1 {
            conditions.into_iter().next().unwrap()
        } else {
            format!("({})", conditions.join(" AND "))
        }
    }
}
