//! YAML query documents for the CLI and fixtures.
//!
//! ```yaml
//! search: Person
//! clauses:
//!   - or:
//!       - selector: { example: ann }
//!       - selector: { example: bob, operator: like, strict: true }
//!   - order:
//!       limit: 10
//!       sorters: [{ direction: desc, example: by_name }]
//! ```
//!
//! Example names refer to objects of a loaded fixture.

use serde::Deserialize;

use super::clause::{Clause, ConditionalClause, Conjunction, Direction, Operator, Order, Selector, Sorter};
use super::errors::DocumentError;
use crate::object_graph::fixture::LoadedFixture;

fn default_add_joins() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryDocument {
    /// Class whose ids the query returns
    pub search: String,
    #[serde(default = "default_add_joins")]
    pub add_joins: bool,
    #[serde(default)]
    pub clauses: Vec<ClauseSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectorSpec {
    pub example: String,
    #[serde(default)]
    pub selection_class: Option<String>,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SorterSpec {
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub example: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSpec {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub sorters: Vec<SorterSpec>,
}

/// Exactly one field is expected to be set
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClauseSpec {
    #[serde(default)]
    pub selector: Option<SelectorSpec>,
    #[serde(default)]
    pub and: Option<Vec<ClauseSpec>>,
    #[serde(default)]
    pub or: Option<Vec<ClauseSpec>>,
    #[serde(default)]
    pub group: Option<Vec<ClauseSpec>>,
    #[serde(default)]
    pub sort: Option<SorterSpec>,
    #[serde(default)]
    pub order: Option<OrderSpec>,
}

impl QueryDocument {
    pub fn from_yaml_str(content: &str) -> Result<Self, DocumentError> {
        serde_yaml::from_str(content).map_err(|e| DocumentError::Parse(e.to_string()))
    }

    /// Resolve example names against `fixture`
    pub fn clauses(&self, fixture: &LoadedFixture) -> Result<Vec<Clause>, DocumentError> {
        convert_all(&self.clauses, fixture)
    }
}

fn convert_all(specs: &[ClauseSpec], fixture: &LoadedFixture) -> Result<Vec<Clause>, DocumentError> {
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| spec.to_clause(index, fixture))
        .collect()
}

impl SorterSpec {
    fn to_sorter(&self, fixture: &LoadedFixture) -> Result<Sorter, DocumentError> {
        let example = match &self.example {
            Some(name) => Some(fixture.id(name)?),
            None => None,
        };
        Ok(Sorter {
            direction: self.direction,
            example,
        })
    }
}

impl ClauseSpec {
    fn to_clause(&self, index: usize, fixture: &LoadedFixture) -> Result<Clause, DocumentError> {
        let set = [
            self.selector.is_some(),
            self.and.is_some(),
            self.or.is_some(),
            self.group.is_some(),
            self.sort.is_some(),
            self.order.is_some(),
        ];
        if set.iter().filter(|s| **s).count() != 1 {
            return Err(DocumentError::MalformedClause { index });
        }

        if let Some(selector) = &self.selector {
            return Ok(Clause::Selector(Selector {
                example: fixture.id(&selector.example)?,
                selection_class: selector.selection_class.clone(),
                operator: selector.operator,
                strict: selector.strict,
            }));
        }
        let grouped = [
            (&self.and, Some(Conjunction::And)),
            (&self.or, Some(Conjunction::Or)),
            (&self.group, None),
        ];
        for (children, keyword) in grouped {
            if let Some(children) = children {
                return Ok(Clause::Conditional(ConditionalClause {
                    keyword,
                    children: convert_all(children, fixture)?,
                }));
            }
        }
        if let Some(sort) = &self.sort {
            return Ok(Clause::Sorter(sort.to_sorter(fixture)?));
        }
        match &self.order {
            Some(order) => Ok(Clause::Order(Order {
                limit: order.limit,
                offset: order.offset,
                sorters: order
                    .sorters
                    .iter()
                    .map(|s| s.to_sorter(fixture))
                    .collect::<Result<_, _>>()?,
            })),
            None => Err(DocumentError::MalformedClause { index }),
        }
    }
}
