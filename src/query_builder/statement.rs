//! The statement prototype: everything the query builder accumulated for
//! one query, before it is turned into SQL text.

use serde::Serialize;

use super::clause::{Conjunction, Direction};
use super::errors::UsageError;
use crate::dialect::Dialect;
use crate::object_graph::Value;

/// One WHERE fragment. Structural links carry no value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub fragment: String,
    pub value: Option<Value>,
}

/// AND/OR grouping over [`Predicate`]s, leaves index into the predicate list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Condition {
    Leaf(usize),
    Group {
        conjunction: Conjunction,
        children: Vec<Condition>,
    },
    /// Correlated `EXISTS` over its own tables, children ANDed
    Exists {
        joins: Vec<(String, String)>,
        children: Vec<Condition>,
    },
}

impl Condition {
    fn has_join(&self, table: &str, alias: &str) -> bool {
        match self {
            Condition::Leaf(_) => false,
            Condition::Group { children, .. } => children.iter().any(|c| c.has_join(table, alias)),
            Condition::Exists { joins, children } => {
                contains_join(joins, table, alias) || children.iter().any(|c| c.has_join(table, alias))
            }
        }
    }
}

fn contains_join(joins: &[(String, String)], table: &str, alias: &str) -> bool {
    joins.iter().any(|(t, a)| t == table && a == alias)
}

/// A group still being filled. Subquery groups carry their own FROM list.
#[derive(Debug, Clone, PartialEq)]
struct OpenGroup {
    conjunction: Conjunction,
    children: Vec<Condition>,
    joins: Option<Vec<(String, String)>>,
}

impl OpenGroup {
    fn new(conjunction: Conjunction, joins: Option<Vec<(String, String)>>) -> Self {
        Self {
            conjunction,
            children: Vec::new(),
            joins,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderFragment {
    pub expression: String,
    pub direction: Direction,
}

impl std::fmt::Display for OrderFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.expression, self.direction.keyword())
    }
}

/// SQL text plus positional parameters, in placeholder order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementPrototype {
    select: Option<String>,
    distinct: bool,
    joins: Vec<(String, String)>,
    predicates: Vec<Predicate>,
    /// Open groups, innermost last. Index 0 is the WHERE root.
    #[serde(skip)]
    groups: Vec<OpenGroup>,
    /// `<column> IN (<id statement>)`, ANDed onto the WHERE clause
    id_filter: Option<(String, Box<StatementPrototype>)>,
    order_by: Vec<OrderFragment>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Default for StatementPrototype {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementPrototype {
    pub fn new() -> Self {
        Self {
            select: None,
            distinct: true,
            joins: Vec::new(),
            predicates: Vec::new(),
            groups: vec![OpenGroup::new(Conjunction::And, None)],
            id_filter: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Column expression returned by the query (`A.DBID`)
    pub fn set_select(&mut self, expression: impl Into<String>) {
        self.select = Some(expression.into());
    }

    pub fn select(&self) -> Option<&str> {
        self.select.as_deref()
    }

    pub fn set_distinct(&mut self, distinct: bool) {
        self.distinct = distinct;
    }

    /// Add a `(table, alias)` join to the innermost open subquery, or to the
    /// outer FROM list when none is open. Repeats within one FROM list are ignored.
    pub fn add_join(&mut self, table: &str, alias: &str) {
        let scope = self.join_scope();
        if !contains_join(scope, table, alias) {
            scope.push((table.to_string(), alias.to_string()));
        }
    }

    fn join_scope(&mut self) -> &mut Vec<(String, String)> {
        match self.groups.iter_mut().rev().find_map(|g| g.joins.as_mut()) {
            Some(joins) => joins,
            None => &mut self.joins,
        }
    }

    /// Whether the pair is joined anywhere, subqueries included
    pub fn has_join(&self, table: &str, alias: &str) -> bool {
        contains_join(&self.joins, table, alias)
            || self.groups.iter().any(|g| {
                g.joins.as_deref().is_some_and(|j| contains_join(j, table, alias))
                    || g.children.iter().any(|c| c.has_join(table, alias))
            })
    }

    /// Outer FROM list
    pub fn joins(&self) -> &[(String, String)] {
        &self.joins
    }

    /// Keep only rows whose `column` is among the ids `statement` selects
    pub fn restrict_ids(&mut self, column: impl Into<String>, statement: StatementPrototype) {
        self.id_filter = Some((column.into(), Box::new(statement)));
    }

    /// Add a fragment to the innermost open group
    pub fn add_predicate(&mut self, fragment: impl Into<String>, value: Option<Value>) {
        let idx = self.predicates.len();
        self.predicates.push(Predicate {
            fragment: fragment.into(),
            value,
        });
        self.current_group().push(Condition::Leaf(idx));
    }

    /// Add a structural link to the innermost group unless the group already has it
    pub fn add_link(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        if self.group_contains_link(self.groups.len() - 1, &fragment) {
            return;
        }
        self.add_predicate(fragment, None);
    }

    /// Add a structural link to the WHERE root, whatever group is open
    pub fn add_root_link(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        if self.group_contains_link(0, &fragment) {
            return;
        }
        let idx = self.predicates.len();
        self.predicates.push(Predicate {
            fragment,
            value: None,
        });
        self.groups[0].children.push(Condition::Leaf(idx));
    }

    fn group_contains_link(&self, group: usize, fragment: &str) -> bool {
        self.groups[group].children.iter().any(|c| {
            matches!(c, Condition::Leaf(i)
                if self.predicates[*i].value.is_none() && self.predicates[*i].fragment == fragment)
        })
    }

    fn current_group(&mut self) -> &mut Vec<Condition> {
        // groups[0] is never popped
        let last = self.groups.len() - 1;
        &mut self.groups[last].children
    }

    pub fn push_group(&mut self, conjunction: Conjunction) {
        self.groups.push(OpenGroup::new(conjunction, None));
    }

    /// Open an AND group rendered as a correlated `EXISTS` subquery. Joins
    /// added until it is popped go to its own FROM list.
    pub fn push_subquery(&mut self) {
        self.groups.push(OpenGroup::new(Conjunction::And, Some(Vec::new())));
    }

    /// Close the innermost group. Empty groups vanish.
    pub fn pop_group(&mut self) {
        if self.groups.len() <= 1 {
            log::warn!("pop_group called with no open group");
            return;
        }
        let Some(group) = self.groups.pop() else {
            return;
        };
        let condition = match group.joins {
            Some(joins) if !joins.is_empty() => Condition::Exists {
                joins,
                children: group.children,
            },
            _ if group.children.is_empty() => return,
            _ => Condition::Group {
                conjunction: group.conjunction,
                children: group.children,
            },
        };
        self.current_group().push(condition);
    }

    pub fn depth(&self) -> usize {
        self.groups.len() - 1
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Bound values in predicate order
    pub fn values(&self) -> Vec<&Value> {
        self.predicates.iter().filter_map(|p| p.value.as_ref()).collect()
    }

    /// WHERE tree (root group). Open groups are not part of it yet.
    pub fn condition(&self) -> Condition {
        Condition::Group {
            conjunction: self.groups[0].conjunction,
            children: self.groups[0].children.clone(),
        }
    }

    pub fn add_order(&mut self, expression: impl Into<String>, direction: Direction) {
        self.order_by.push(OrderFragment {
            expression: expression.into(),
            direction,
        });
    }

    pub fn order_by(&self) -> &[OrderFragment] {
        &self.order_by
    }

    /// Record the limit. A second limit anywhere in the tree is an error.
    pub fn set_limit(&mut self, limit: u64) -> Result<(), UsageError> {
        if let Some(first) = self.limit {
            return Err(UsageError::DuplicateLimit {
                first,
                second: limit,
            });
        }
        self.limit = Some(limit);
        Ok(())
    }

    pub fn set_offset(&mut self, offset: u64) -> Result<(), UsageError> {
        if let Some(first) = self.offset {
            return Err(UsageError::DuplicateOffset {
                first,
                second: offset,
            });
        }
        self.offset = Some(offset);
        Ok(())
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Render `SELECT DISTINCT ... FROM ... WHERE ... ORDER BY ... LIMIT ...`.
    ///
    /// Every nested AND/OR group is parenthesised, so the grouping of the
    /// clause tree survives regardless of operator precedence. Subquery
    /// groups become `EXISTS (SELECT 1 FROM ... WHERE ...)`.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> RenderedStatement {
        let mut params = Vec::new();
        let sql = self.render(dialect, &mut params);
        RenderedStatement { sql, params }
    }

    fn render(&self, dialect: &dyn Dialect, params: &mut Vec<Value>) -> String {
        let mut select_list: Vec<String> = self.select.iter().cloned().collect();
        for order in &self.order_by {
            if !select_list.contains(&order.expression) {
                select_list.push(order.expression.clone());
            }
        }
        if select_list.is_empty() {
            select_list.push("*".to_string());
        }

        let mut sql = if self.distinct {
            format!("SELECT DISTINCT {}", select_list.join(", "))
        } else {
            format!("SELECT {}", select_list.join(", "))
        };
        if !self.joins.is_empty() {
            sql.push_str(" FROM ");
            sql.push_str(&render_from(&self.joins));
        }

        let mut filters = Vec::new();
        let root = self.condition();
        if let Some(condition) = self.render_condition(&root, params, self.id_filter.is_none()) {
            filters.push(condition);
        }
        if let Some((column, ids)) = &self.id_filter {
            let inner = ids.render(dialect, params);
            let inner = if ids.order_by.is_empty() {
                inner
            } else {
                // Sort keys widen the inner select list; keep only the id
                let id = dialect.id_column();
                format!("SELECT IDS.{} FROM ({}) IDS", id, inner)
            };
            filters.push(format!("{} IN ({})", column, inner));
        }
        if !filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filters.join(" AND "));
        }

        if !self.order_by.is_empty() {
            let order: Vec<String> = self.order_by.iter().map(ToString::to_string).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        if let Some(limit) = dialect.limit_clause(self.limit, self.offset) {
            sql.push(' ');
            sql.push_str(&limit);
        }
        sql
    }

    fn render_condition(
        &self,
        condition: &Condition,
        params: &mut Vec<Value>,
        top: bool,
    ) -> Option<String> {
        match condition {
            Condition::Leaf(idx) => {
                let predicate = &self.predicates[*idx];
                if let Some(value) = &predicate.value {
                    params.push(value.clone());
                }
                Some(predicate.fragment.clone())
            }
            Condition::Group {
                conjunction,
                children,
            } => self.render_group(*conjunction, children, params, top),
            Condition::Exists { joins, children } => {
                let mut sql = format!("EXISTS (SELECT 1 FROM {}", render_from(joins));
                if let Some(filter) = self.render_group(Conjunction::And, children, params, true) {
                    sql.push_str(" WHERE ");
                    sql.push_str(&filter);
                }
                sql.push(')');
                Some(sql)
            }
        }
    }

    fn render_group(
        &self,
        conjunction: Conjunction,
        children: &[Condition],
        params: &mut Vec<Value>,
        top: bool,
    ) -> Option<String> {
        // A lone child stands in for its group and keeps its bareness
        let bare_child = top && children.len() == 1;
        let parts: Vec<String> = children
            .iter()
            .filter_map(|c| self.render_condition(c, params, bare_child))
            .collect();
        match parts.len() {
            0 => None,
            1 => parts.into_iter().next(),
            _ => {
                let joined = parts.join(&format!(" {} ", conjunction.keyword()));
                if top {
                    Some(joined)
                } else {
                    Some(format!("({})", joined))
                }
            }
        }
    }
}

fn render_from(joins: &[(String, String)]) -> String {
    joins
        .iter()
        .map(|(table, alias)| format!("{} {}", table, alias))
        .collect::<Vec<_>>()
        .join(", ")
}
