//! Query-by-example SQL generation.
//!
//! [`QueryBuilder::generate`] turns a clause tree into a
//! [`StatementPrototype`]:
//!
//! 1. The searched class gets a type graph in [`QueryPosition::Main`]; its
//!    root alias is what the statement selects.
//! 2. Every [`Selector`] gets the type graph of its example object in its own
//!    position. The example's anchor row is linked to the main row through
//!    the shared id column and every set property becomes a predicate.
//! 3. Referenced objects are expanded recursively, each in a position named
//!    by the property path that reaches it. Objects reached twice are joined
//!    back to the alias they got the first time, so cyclic examples terminate.
//! 4. Arrays and collections are matched slot by slot through the
//!    array-membership table.
//!
//! All fragments of one selector form one correlated `EXISTS` subquery with
//! its own FROM list, placed in whatever AND/OR group encloses the selector.
//! A selector whose tables have no matching rows therefore only falsifies
//! its own branch.

pub mod aggregate;
pub mod clause;
pub mod document;
pub mod errors;
pub mod statement;

#[cfg(test)]
mod tests;

use std::collections::HashSet;

use crate::alias::{AliasAllocator, QueryPosition};
use crate::dialect::{array_columns, Dialect};
use crate::object_graph::{Instance, ObjectGraph, ObjectId, Value, VisitedSet};
use crate::type_catalog::{DeclaredType, ScalarKind, TypeCatalog};
use crate::type_graph::path_enumerator::{prune_inheritance, prune_paths, Path};
use crate::type_graph::{PathEnumerator, TypeGraph};

pub use aggregate::{AggregateFragment, AggregateFunction};
pub use clause::{
    Clause, ConditionalClause, Conjunction, Direction, Operator, Order, Selector, Sorter,
};
pub use document::{ClauseSpec, QueryDocument};
pub use errors::{DocumentError, QueryBuildError, UsageError};
pub use statement::{Condition, OrderFragment, Predicate, RenderedStatement, StatementPrototype};

/// Default bound on how deep example objects may reference each other
pub const DEFAULT_MAX_DEPTH: usize = 32;

pub struct QueryBuilder<'a> {
    catalog: &'a TypeCatalog,
    dialect: &'a dyn Dialect,
    objects: &'a ObjectGraph,
    max_depth: usize,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(catalog: &'a TypeCatalog, dialect: &'a dyn Dialect, objects: &'a ObjectGraph) -> Self {
        Self {
            catalog,
            dialect,
            objects,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Build the statement selecting ids of `class` rows matching `clauses`.
    ///
    /// With `add_joins` the main table is put in the FROM list and its id
    /// selected; without, the caller is expected to supply both.
    pub fn generate(
        &self,
        class: &str,
        clauses: &[Clause],
        add_joins: bool,
    ) -> Result<StatementPrototype, QueryBuildError> {
        let mut generation = Generation::start(self, class, add_joins)?;
        for clause in clauses {
            generation.clause(clause)?;
        }
        log::debug!(
            "generated query for `{}`: {} joins, {} predicates",
            class,
            generation.plan.joins().len(),
            generation.plan.predicates().len()
        );
        Ok(generation.plan)
    }

    /// Select `function(property)` over the `class` rows matching `clauses`.
    ///
    /// The matching ids come from the [`generate`](Self::generate) statement
    /// as an `IN` subquery, so every row is counted once however many example
    /// rows it matched.
    pub fn aggregate(
        &self,
        class: &str,
        function: AggregateFunction,
        property: &str,
        clauses: &[Clause],
    ) -> Result<(StatementPrototype, AggregateFragment), QueryBuildError> {
        let mut generation = Generation::start(self, class, true)?;
        for clause in clauses {
            generation.clause(clause)?;
        }

        let Some((idx, _)) = generation.main.find_property(property) else {
            return Err(UsageError::UnknownProperty {
                class: class.to_string(),
                property: property.to_string(),
            }
            .into());
        };
        let outer = generation.aliases.fresh();
        generation.main.node_mut(idx).alias = Some(outer.clone());
        let fragment = function.fragment(&generation.main, property, self.dialect)?;

        let mut plan = StatementPrototype::new();
        plan.set_distinct(false);
        plan.add_join(&generation.main.node(idx).table, &outer);
        plan.set_select(fragment.sql.clone());
        plan.restrict_ids(
            format!("{}.{}", outer, self.dialect.id_column()),
            generation.plan,
        );
        Ok((plan, fragment))
    }
}

/// Per-selector settings carried down into nested examples
#[derive(Debug, Clone)]
struct ExampleScope {
    operator: Operator,
    strict: bool,
    /// Class the rows at this level are selected as
    selection_class: String,
    /// Declared class of the property that reached this example
    declared: Option<String>,
    position: QueryPosition,
    /// Whether slot order matters; undetermined until the first sequence
    sorted: Option<bool>,
    depth: usize,
}

impl ExampleScope {
    fn nested(&self, declared: &DeclaredType, property: &str) -> Self {
        let label = declared.to_string();
        Self {
            operator: self.operator,
            strict: self.strict,
            selection_class: label.clone(),
            declared: declared.class_name().map(str::to_string),
            position: self.position.nested(&label, property),
            sorted: self.sorted,
            depth: self.depth + 1,
        }
    }
}

/// State of one `generate` call
struct Generation<'q, 'a> {
    builder: &'q QueryBuilder<'a>,
    aliases: AliasAllocator<'a>,
    plan: StatementPrototype,
    main: TypeGraph,
    main_alias: String,
}

impl<'q, 'a> Generation<'q, 'a> {
    fn start(
        builder: &'q QueryBuilder<'a>,
        class: &str,
        add_joins: bool,
    ) -> Result<Self, QueryBuildError> {
        let mut aliases = AliasAllocator::for_catalog(builder.dialect, builder.catalog);
        let mut main = TypeGraph::build(builder.catalog, builder.dialect, class)?;
        aliases.name(&QueryPosition::Main, &mut main);
        let main_alias = main.root().alias()?.to_string();

        let mut plan = StatementPrototype::new();
        if add_joins {
            plan.add_join(&main.root().table, &main_alias);
            plan.set_select(format!("{}.{}", main_alias, builder.dialect.id_column()));
        }
        Ok(Self {
            builder,
            aliases,
            plan,
            main,
            main_alias,
        })
    }

    fn id_column(&self) -> &'static str {
        self.builder.dialect.id_column()
    }

    fn id_link(&self, left: &str, right: &str) -> String {
        let id = self.id_column();
        format!("{}.{} = {}.{}", left, id, right, id)
    }

    fn clause(&mut self, clause: &Clause) -> Result<(), QueryBuildError> {
        match clause {
            Clause::Selector(selector) => self.selector(selector),
            Clause::Conditional(conditional) => {
                if let Some(keyword) = conditional.keyword {
                    self.plan.push_group(keyword);
                }
                for child in &conditional.children {
                    self.clause(child)?;
                }
                if conditional.keyword.is_some() {
                    self.plan.pop_group();
                }
                Ok(())
            }
            Clause::Sorter(sorter) => self.sorter(sorter),
            Clause::Order(order) => {
                if let Some(limit) = order.limit {
                    self.plan.set_limit(limit)?;
                }
                if let Some(offset) = order.offset {
                    self.plan.set_offset(offset)?;
                }
                for sorter in &order.sorters {
                    self.sorter(sorter)?;
                }
                Ok(())
            }
        }
    }

    fn sorter(&mut self, sorter: &Sorter) -> Result<(), QueryBuildError> {
        let Some(example) = sorter.example else {
            let key = format!("{}.{}", self.main_alias, self.id_column());
            self.plan.add_order(key, sorter.direction);
            return Ok(());
        };

        let main_class = self.main.root().class_name.clone();
        let instance = self.builder.objects.get(example)?;
        let compatible = instance.class_name().is_some_and(|class| {
            self.builder.catalog.is_assignable(class, &main_class)
                || self.builder.catalog.is_assignable(&main_class, class)
        });
        if !compatible {
            return Err(UsageError::ExampleNotAssignable {
                example: instance.type_label(),
                class: main_class,
            }
            .into());
        }

        // Sort keys name columns of the main rows, so they share the main aliases
        let mut graph = TypeGraph::build_for_instance(
            self.builder.catalog,
            self.builder.dialect,
            self.builder.objects,
            example,
        )?;
        self.aliases.name(&QueryPosition::Main, &mut graph);
        for node in graph.nodes() {
            let alias = node.alias()?;
            for prop in node.properties.iter().filter(|p| p.is_set()) {
                if !prop.declared.is_scalar() {
                    log::warn!("sort key `{}` is not scalar, skipped", prop.name);
                    continue;
                }
                self.plan.add_join(&node.table, alias);
                if alias != self.main_alias {
                    let link = self.id_link(&self.main_alias, alias);
                    self.plan.add_root_link(link);
                }
                self.plan
                    .add_order(format!("{}.{}", alias, prop.column), sorter.direction);
            }
        }
        Ok(())
    }

    fn selector(&mut self, selector: &Selector) -> Result<(), QueryBuildError> {
        let instance = self.builder.objects.get(selector.example)?;
        let label = instance.type_label();
        let selection_class = selector.selection_class.clone().unwrap_or_else(|| label.clone());
        if let Some(class) = instance.class_name() {
            self.builder.catalog.require(&selection_class)?;
            if !self.builder.catalog.is_assignable(class, &selection_class) {
                return Err(UsageError::ExampleNotAssignable {
                    example: class.to_string(),
                    class: selection_class,
                }
                .into());
            }
        }

        let scope = ExampleScope {
            operator: selector.operator,
            strict: selector.strict,
            selection_class: selection_class.clone(),
            declared: None,
            position: QueryPosition::example(selection_class),
            sorted: None,
            depth: 0,
        };
        let owner = format!("{}.{}", self.main_alias, self.id_column());
        let mut visited = VisitedSet::new();

        self.plan.push_subquery();
        self.example(selector.example, &owner, &scope, &mut visited)?;
        self.plan.pop_group();
        Ok(())
    }

    /// Join the example's tables, link its anchor to `owner` and constrain
    /// every set property.
    fn example(
        &mut self,
        id: ObjectId,
        owner: &str,
        scope: &ExampleScope,
        visited: &mut VisitedSet,
    ) -> Result<(), QueryBuildError> {
        if scope.depth > self.builder.max_depth {
            return Err(UsageError::NestingTooDeep {
                limit: self.builder.max_depth,
            }
            .into());
        }

        let mut graph = TypeGraph::build_for_instance(
            self.builder.catalog,
            self.builder.dialect,
            self.builder.objects,
            id,
        )?;
        self.aliases.name(&scope.position, &mut graph);
        if graph.is_sequence() {
            return self.sequence(&graph, id, owner, scope, visited);
        }

        let paths = self.paths(&graph, scope);
        let anchor_idx = paths
            .first()
            .and_then(|p| p.first())
            .copied()
            .unwrap_or(graph.root_idx());
        let anchor = graph.node(anchor_idx).alias()?.to_string();
        visited.stage(id, anchor.clone());
        self.plan
            .add_link(format!("{} = {}.{}", owner, anchor, self.id_column()));

        self.polymorphic_chain(&graph, scope)?;

        for path in &paths {
            let first = graph.node(path[0]);
            let first_alias = first.alias()?;
            self.plan.add_join(&first.table, first_alias);
            if first_alias != anchor {
                let link = self.id_link(first_alias, &anchor);
                self.plan.add_link(link);
            }
            for pair in path.windows(2) {
                let (child, parent) = (graph.node(pair[0]), graph.node(pair[1]));
                self.plan.add_join(&parent.table, parent.alias()?);
                let link = self.id_link(child.alias()?, parent.alias()?);
                self.plan.add_link(link);
            }
        }

        // Prefix clones share nodes between paths; constrain each node once
        let mut done = HashSet::new();
        for path in &paths {
            for &idx in path {
                if !done.insert(idx) {
                    continue;
                }
                let node = graph.node(idx);
                let alias = node.alias()?;
                for prop in &node.properties {
                    let Some(value) = prop.set_value() else {
                        continue;
                    };
                    let column = format!("{}.{}", alias, prop.column);
                    match value {
                        Value::Ref(target) => {
                            self.reference(&column, &prop.name, &prop.declared, *target, scope, visited)?
                        }
                        scalar => {
                            check_scalar(&prop.name, &prop.declared, scalar)?;
                            self.compare(&column, scope.operator, scalar);
                        }
                    }
                }
            }
        }
        visited.flush();
        Ok(())
    }

    fn paths(&self, graph: &TypeGraph, scope: &ExampleScope) -> Vec<Path> {
        let paths = prune_paths(graph, PathEnumerator::new(graph).generate_lists());
        if scope.strict {
            paths
        } else {
            prune_inheritance(graph, paths, &scope.selection_class)
        }
    }

    /// A value stored under a supertype is reachable through the tables
    /// between its concrete class and the declared one.
    fn polymorphic_chain(
        &mut self,
        graph: &TypeGraph,
        scope: &ExampleScope,
    ) -> Result<(), QueryBuildError> {
        let Some(declared) = scope.declared.as_deref() else {
            return Ok(());
        };
        if declared == graph.root().class_name {
            return Ok(());
        }
        let declared_concrete = self
            .builder
            .catalog
            .get(declared)
            .is_some_and(|d| d.is_concrete());
        if !(scope.strict || declared_concrete) {
            return Ok(());
        }
        let Some(target) = graph.index_of(declared) else {
            return Ok(());
        };
        let Some(chain) = graph.chain(graph.root_idx(), target) else {
            return Ok(());
        };
        for pair in chain.windows(2) {
            let (child, parent) = (graph.node(pair[0]), graph.node(pair[1]));
            self.plan.add_join(&child.table, child.alias()?);
            self.plan.add_join(&parent.table, parent.alias()?);
            let link = self.id_link(child.alias()?, parent.alias()?);
            self.plan.add_link(link);
        }
        Ok(())
    }

    /// Constrain a reference held in `owner` (a column expression)
    fn reference(
        &mut self,
        owner: &str,
        property: &str,
        declared: &DeclaredType,
        target: ObjectId,
        scope: &ExampleScope,
        visited: &mut VisitedSet,
    ) -> Result<(), QueryBuildError> {
        let objects = self.builder.objects;
        let instance = objects.get(target)?;

        if let Some(known) = visited.alias_of(target) {
            let column = if instance.is_sequence() {
                array_columns::ARRAY_ID
            } else {
                self.id_column()
            };
            let link = format!("{} = {}.{}", owner, known, column);
            self.plan.add_link(link);
            return Ok(());
        }

        match (declared, instance) {
            (DeclaredType::Class(name), Instance::Object { class, .. }) => {
                if !self.builder.catalog.is_assignable(class, name) {
                    return Err(UsageError::ExampleNotAssignable {
                        example: class.clone(),
                        class: name.clone(),
                    }
                    .into());
                }
            }
            (DeclaredType::Array(_) | DeclaredType::Collection { .. }, seq) if seq.is_sequence() => {}
            (_, other) => {
                return Err(UsageError::TypeMismatch {
                    property: property.to_string(),
                    declared: declared.to_string(),
                    actual: other.type_label(),
                }
                .into());
            }
        }

        let nested = scope.nested(declared, property);
        self.example(target, owner, &nested, visited)
    }

    /// Match an array or collection slot by slot on the membership table
    fn sequence(
        &mut self,
        graph: &TypeGraph,
        id: ObjectId,
        owner: &str,
        scope: &ExampleScope,
        visited: &mut VisitedSet,
    ) -> Result<(), QueryBuildError> {
        let objects = self.builder.objects;
        let (element, items, keys, ordered) = match objects.get(id)? {
            Instance::Array { element, items } => (element, items, &[][..], true),
            Instance::Collection {
                kind,
                element,
                items,
                keys,
            } => (element, items, keys.as_slice(), kind.is_ordered()),
            Instance::Object { class, .. } => {
                return Err(UsageError::TypeMismatch {
                    property: scope.position_label(),
                    declared: graph.root().class_name.clone(),
                    actual: class.clone(),
                }
                .into())
            }
        };
        let sorted = scope.sorted.unwrap_or(ordered);
        let table = self.builder.dialect.array_table();

        let root = graph.root().alias()?.to_string();
        visited.stage(id, root.clone());
        self.plan.add_join(table, &root);
        self.plan
            .add_link(format!("{} = {}.{}", owner, root, array_columns::ARRAY_ID));

        let mut slot_scope = scope.clone();
        slot_scope.sorted = Some(sorted);

        for (slot, item) in items.iter().enumerate() {
            if item.is_null() {
                continue;
            }
            let member = self.aliases.fresh();
            self.plan.add_join(table, &member);
            self.plan.add_link(format!(
                "{}.{} = {}.{}",
                member,
                array_columns::ARRAY_ID,
                root,
                array_columns::ARRAY_ID
            ));
            if sorted {
                self.plan.add_predicate(
                    format!("{}.{} = ?", member, array_columns::SLOT),
                    Some(Value::Long(slot as i64)),
                );
            }
            if let Some(key) = keys.get(slot) {
                self.plan.add_predicate(
                    format!("{}.{} = ?", member, array_columns::MAP_KEY),
                    Some(key.clone()),
                );
            }
            let slot_name = format!("[{}]", slot);
            match item {
                Value::Ref(target) => {
                    let column = format!("{}.{}", member, array_columns::REF_ID);
                    self.reference(&column, &slot_name, element, *target, &slot_scope, visited)?;
                }
                scalar => {
                    check_scalar(&slot_name, element, scalar)?;
                    let column = format!("{}.{}", member, array_columns::PRIM_VALUE);
                    self.compare(&column, scope.operator, scalar);
                }
            }
        }
        visited.flush();
        Ok(())
    }

    fn compare(&mut self, column: &str, operator: Operator, value: &Value) {
        let bound = operator.binds_value().then(|| value.clone());
        self.plan.add_predicate(operator.predicate(column), bound);
    }
}

impl ExampleScope {
    fn position_label(&self) -> String {
        match &self.position {
            QueryPosition::Main => String::from("$"),
            QueryPosition::Example { class, path } if path.is_empty() => class.clone(),
            QueryPosition::Example { path, .. } => path.clone(),
        }
    }
}

/// A scalar value must fit the declared scalar type. Ints widen to longs,
/// any number widens to double.
fn check_scalar(property: &str, declared: &DeclaredType, value: &Value) -> Result<(), UsageError> {
    let fits = match (declared.scalar_kind(), value.scalar_kind()) {
        (Some(want), Some(have)) => {
            want == have
                || (want == ScalarKind::Long && have == ScalarKind::Int)
                || (want == ScalarKind::Double && have.is_numeric())
        }
        _ => false,
    };
    if fits {
        Ok(())
    } else {
        Err(UsageError::TypeMismatch {
            property: property.to_string(),
            declared: declared.to_string(),
            actual: value
                .scalar_kind()
                .map(|k| DeclaredType::Scalar(k).to_string())
                .unwrap_or_else(|| String::from("reference")),
        })
    }
}
