//! Core type definitions for the graph engine

use serde::{Deserialize, Serialize};

/// Identifier of a graph element. Ids are allocated monotonically from
/// `i32::MIN` and are never reused while the engine lives.
pub type ElementId = i32;

/// Identifier of a property within one element's property set.
pub type PropertyId = u16;

/// Caller-defined label grouping edges incident to a vertex.
pub type EdgeTypeId = u16;

/// Comparison operator applied by property scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    Greater,
    GreaterOrEquals,
    Lower,
    LowerOrEquals,
}

impl ComparisonOperator {
    /// Apply the operator to a comparison outcome. `None` means the two
    /// values were not comparable (different variants); no operator matches
    /// in that case.
    pub fn evaluate(&self, ordering: Option<std::cmp::Ordering>) -> bool {
        use std::cmp::Ordering::*;
        match ordering {
            None => false,
            Some(ord) => match self {
                ComparisonOperator::Equals => ord == Equal,
                ComparisonOperator::NotEquals => ord != Equal,
                ComparisonOperator::Greater => ord == Greater,
                ComparisonOperator::GreaterOrEquals => ord != Less,
                ComparisonOperator::Lower => ord == Less,
                ComparisonOperator::LowerOrEquals => ord != Greater,
            },
        }
    }
}
