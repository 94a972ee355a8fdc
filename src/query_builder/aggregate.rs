//! Aggregate select expressions over one property of the searched class.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::{QueryBuildError, UsageError};
use crate::dialect::Dialect;
use crate::type_catalog::{DeclaredType, ScalarKind};
use crate::type_graph::TypeGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Avg,
    Count,
    Max,
    Min,
    Sum,
}

/// `FUNC(alias.column)` and the type of the value it yields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateFragment {
    pub sql: String,
    pub return_type: DeclaredType,
}

impl AggregateFunction {
    pub fn keyword(self) -> &'static str {
        match self {
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Sum => "SUM",
        }
    }

    /// Build the fragment for `property` on a named graph.
    ///
    /// SUM widens integral columns to long and floating ones to double,
    /// AVG is always double and COUNT always long.
    pub fn fragment(
        self,
        graph: &TypeGraph,
        property: &str,
        dialect: &dyn Dialect,
    ) -> Result<AggregateFragment, QueryBuildError> {
        let Some((idx, slot)) = graph.find_property(property) else {
            return Err(UsageError::UnknownProperty {
                class: graph.root().class_name.clone(),
                property: property.to_string(),
            }
            .into());
        };
        let column = format!("{}.{}", graph.node(idx).alias()?, slot.column);

        if self == AggregateFunction::Count {
            return Ok(AggregateFragment {
                sql: format!("COUNT({})", column),
                return_type: DeclaredType::long(),
            });
        }

        let Some(kind) = slot.declared.scalar_kind() else {
            return Err(UsageError::NonScalarAggregate {
                function: self.keyword().to_string(),
                property: property.to_string(),
                declared: slot.declared.to_string(),
            }
            .into());
        };

        let (sql, return_type) = match self {
            AggregateFunction::Sum | AggregateFunction::Avg if !kind.is_numeric() => {
                return Err(UsageError::NonNumericAggregate {
                    function: self.keyword().to_string(),
                    property: property.to_string(),
                    declared: slot.declared.to_string(),
                }
                .into());
            }
            AggregateFunction::Sum => {
                let widened = if kind.is_integral() {
                    ScalarKind::Long
                } else {
                    ScalarKind::Double
                };
                (format!("SUM({})", column), DeclaredType::Scalar(widened))
            }
            AggregateFunction::Avg => (
                format!("AVG({})", dialect.cast_numeric(&column, ScalarKind::Double)),
                DeclaredType::double(),
            ),
            AggregateFunction::Max | AggregateFunction::Min | AggregateFunction::Count => (
                format!("{}({})", self.keyword(), column),
                slot.declared.clone(),
            ),
        };
        Ok(AggregateFragment { sql, return_type })
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for AggregateFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "avg" => Ok(AggregateFunction::Avg),
            "count" => Ok(AggregateFunction::Count),
            "max" => Ok(AggregateFunction::Max),
            "min" => Ok(AggregateFunction::Min),
            "sum" => Ok(AggregateFunction::Sum),
            other => Err(format!("unknown aggregate function `{}`", other)),
        }
    }
}
