//! Criteria and ordering trees handed to the query builder.

use serde::{Deserialize, Serialize};

use crate::object_graph::ObjectId;

/// Relational operator applied to every scalar property of an example
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Operator {
    #[default]
    #[serde(rename = "eq")]
    Equal,
    #[serde(rename = "ne")]
    NotEqual,
    #[serde(rename = "lt")]
    Less,
    #[serde(rename = "le")]
    LessOrEqual,
    #[serde(rename = "gt")]
    Greater,
    #[serde(rename = "ge")]
    GreaterOrEqual,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "is_null")]
    IsNull,
    #[serde(rename = "is_not_null")]
    IsNotNull,
}

struct OperatorSpec {
    symbol: &'static str,
    binds_value: bool,
}

// Indexed by discriminant
const OPERATORS: [OperatorSpec; 9] = [
    OperatorSpec { symbol: "=", binds_value: true },
    OperatorSpec { symbol: "<>", binds_value: true },
    OperatorSpec { symbol: "<", binds_value: true },
    OperatorSpec { symbol: "<=", binds_value: true },
    OperatorSpec { symbol: ">", binds_value: true },
    OperatorSpec { symbol: ">=", binds_value: true },
    OperatorSpec { symbol: "LIKE", binds_value: true },
    OperatorSpec { symbol: "IS NULL", binds_value: false },
    OperatorSpec { symbol: "IS NOT NULL", binds_value: false },
];

impl Operator {
    fn spec(self) -> &'static OperatorSpec {
        &OPERATORS[self as usize]
    }

    pub fn symbol(self) -> &'static str {
        self.spec().symbol
    }

    /// Null checks take no placeholder
    pub fn binds_value(self) -> bool {
        self.spec().binds_value
    }

    /// `"<column> <op> ?"`, or `"<column> IS NULL"` for null checks
    pub fn predicate(self, column: &str) -> String {
        if self.binds_value() {
            format!("{} {} ?", column, self.symbol())
        } else {
            format!("{} {}", column, self.symbol())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn keyword(self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Query-by-example leaf: every set property of `example` becomes a predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub example: ObjectId,
    /// Class the example stands for; defaults to the example's own class
    pub selection_class: Option<String>,
    pub operator: Operator,
    /// Strict: match the example's runtime class exactly.
    /// Relaxed: tables of subclasses below the selection class are ignored.
    pub strict: bool,
}

impl Selector {
    pub fn new(example: ObjectId) -> Self {
        Self {
            example,
            selection_class: None,
            operator: Operator::Equal,
            strict: false,
        }
    }

    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn selecting(mut self, class: impl Into<String>) -> Self {
        self.selection_class = Some(class.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalClause {
    /// Without a keyword the children join the enclosing group
    pub keyword: Option<Conjunction>,
    pub children: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sorter {
    pub direction: Direction,
    /// Every set property of the example becomes a sort key; `None` sorts by id
    pub example: Option<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Order {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub sorters: Vec<Sorter>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Selector(Selector),
    Conditional(ConditionalClause),
    Sorter(Sorter),
    Order(Order),
}

impl Clause {
    pub fn and(children: Vec<Clause>) -> Self {
        Clause::Conditional(ConditionalClause {
            keyword: Some(Conjunction::And),
            children,
        })
    }

    pub fn or(children: Vec<Clause>) -> Self {
        Clause::Conditional(ConditionalClause {
            keyword: Some(Conjunction::Or),
            children,
        })
    }

    pub fn group(children: Vec<Clause>) -> Self {
        Clause::Conditional(ConditionalClause {
            keyword: None,
            children,
        })
    }

    pub fn sort(direction: Direction, example: Option<ObjectId>) -> Self {
        Clause::Sorter(Sorter { direction, example })
    }

    pub fn limit(limit: u64) -> Self {
        Clause::Order(Order {
            limit: Some(limit),
            ..Order::default()
        })
    }
}

impl From<Selector> for Clause {
    fn from(value: Selector) -> Self {
        Clause::Selector(value)
    }
}
