//! Table alias allocation.
//!
//! One [`AliasAllocator`] serves one query. It owns a single
//! [`AliasGenerator`] so aliases are unique across the whole statement, and
//! one [`AliasTree`] per [`QueryPosition`] so that graphs standing for the
//! same rows (two OR-ed examples of the same type, say) share aliases while
//! unrelated positions never do.

mod generator;

use std::collections::HashMap;

use crate::dialect::Dialect;
use crate::type_catalog::TypeCatalog;
use crate::type_graph::TypeGraph;

pub use generator::AliasGenerator;

/// Where in a query a type graph sits
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryPosition {
    /// The searched class
    Main,
    /// An example object, identified by its selection class and the
    /// property path leading to it from the selector root (`""` for the root)
    Example { class: String, path: String },
}

impl QueryPosition {
    pub fn example(class: impl Into<String>) -> Self {
        QueryPosition::Example {
            class: class.into(),
            path: String::new(),
        }
    }

    /// Position of a value reached through `property` from this position
    pub fn nested(&self, class: &str, property: &str) -> Self {
        let parent = match self {
            QueryPosition::Main => String::from("$"),
            QueryPosition::Example { class, path } if path.is_empty() => class.clone(),
            QueryPosition::Example { path, .. } => path.clone(),
        };
        QueryPosition::Example {
            class: class.to_string(),
            path: format!("{}/{}", parent, property),
        }
    }
}

/// Class-to-alias assignments of the graphs already named in one position
#[derive(Debug, Default)]
pub struct AliasTree {
    registered: Vec<HashMap<String, String>>,
}

impl AliasTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an alias to every node of `graph`.
    ///
    /// Aliases are copied from the registered graph sharing the most classes;
    /// the remaining nodes get fresh aliases. The graph is registered for
    /// later matching only when it covers a class no registered graph has.
    pub fn name_stack(&mut self, graph: &mut TypeGraph, generator: &mut AliasGenerator<'_>) {
        for table in graph.tables() {
            generator.forbid(table);
        }

        let best = self
            .registered
            .iter()
            .map(|assigned| {
                let overlap = graph
                    .nodes()
                    .iter()
                    .filter(|n| assigned.contains_key(&n.class_name))
                    .count();
                (overlap, assigned)
            })
            .filter(|(overlap, _)| *overlap > 0)
            .max_by_key(|(overlap, _)| *overlap)
            .map(|(_, assigned)| assigned.clone());

        let mut assigned = HashMap::with_capacity(graph.len());
        let mut contributes = false;
        for idx in 0..graph.len() {
            let class = graph.node(idx).class_name.clone();
            let alias = match best.as_ref().and_then(|b| b.get(&class)) {
                Some(alias) => alias.clone(),
                None => generator.next_alias(),
            };
            if !self.covers(&class) {
                contributes = true;
            }
            graph.node_mut(idx).alias = Some(alias.clone());
            assigned.insert(class, alias);
        }

        if contributes {
            self.registered.push(assigned);
        }
    }

    fn covers(&self, class: &str) -> bool {
        self.registered.iter().any(|a| a.contains_key(class))
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

/// Per-query alias state. Never shared between queries.
#[derive(Debug)]
pub struct AliasAllocator<'d> {
    generator: AliasGenerator<'d>,
    trees: HashMap<QueryPosition, AliasTree>,
}

impl<'d> AliasAllocator<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            generator: AliasGenerator::new(dialect),
            trees: HashMap::new(),
        }
    }

    /// Allocator that never hands out the table name of any catalog class,
    /// whether or not a graph of that class is ever named
    pub fn for_catalog(dialect: &'d dyn Dialect, catalog: &TypeCatalog) -> Self {
        let mut allocator = Self::new(dialect);
        for descriptor in catalog.classes() {
            allocator.forbid(&descriptor.table_name(dialect));
        }
        allocator.forbid(dialect.array_table());
        allocator
    }

    /// Name every node of `graph` within `position`
    pub fn name(&mut self, position: &QueryPosition, graph: &mut TypeGraph) {
        let tree = self.trees.entry(position.clone()).or_default();
        tree.name_stack(graph, &mut self.generator);
        log::debug!(
            "named `{}` at {:?}: {:?}",
            graph.root().class_name,
            position,
            graph
                .nodes()
                .iter()
                .map(|n| n.alias.as_deref().unwrap_or("?"))
                .collect::<Vec<_>>()
        );
    }

    /// A fresh alias outside any tree (array slot joins)
    pub fn fresh(&mut self) -> String {
        self.generator.next_alias()
    }

    pub fn forbid(&mut self, name: &str) {
        self.generator.forbid(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::AnsiDialect;
    use crate::type_catalog::{ClassDescriptor, DeclaredType, TypeCatalog};

    fn catalog() -> TypeCatalog {
        TypeCatalog::from_descriptors([
            ClassDescriptor::class("Animal").property("name", DeclaredType::text()),
            ClassDescriptor::class("Dog")
                .extends("Animal")
                .property("breed", DeclaredType::text()),
            ClassDescriptor::class("Cat")
                .extends("Animal")
                .property("lives", DeclaredType::int()),
        ])
        .unwrap()
    }

    fn aliases(graph: &TypeGraph) -> Vec<(String, String)> {
        graph
            .nodes()
            .iter()
            .map(|n| (n.class_name.clone(), n.alias.clone().unwrap()))
            .collect()
    }

    #[test]
    fn test_same_position_reuses_matching_classes() {
        let catalog = catalog();
        let dialect = AnsiDialect;
        let mut allocator = AliasAllocator::new(&dialect);
        let position = QueryPosition::example("Animal");

        let mut dog = TypeGraph::build(&catalog, &dialect, "Dog").unwrap();
        allocator.name(&position, &mut dog);
        let mut cat = TypeGraph::build(&catalog, &dialect, "Cat").unwrap();
        allocator.name(&position, &mut cat);

        let dog_aliases = aliases(&dog);
        let cat_aliases = aliases(&cat);
        assert_eq!(dog_aliases[0], ("Dog".into(), "A".into()));
        assert_eq!(dog_aliases[1], ("Animal".into(), "B".into()));
        // Animal shared, Cat fresh
        assert_eq!(cat_aliases[1], ("Animal".into(), "B".into()));
        assert_eq!(cat_aliases[0], ("Cat".into(), "C".into()));
    }

    #[test]
    fn test_positions_do_not_share_aliases() {
        let catalog = catalog();
        let dialect = AnsiDialect;
        let mut allocator = AliasAllocator::new(&dialect);

        let mut main = TypeGraph::build(&catalog, &dialect, "Dog").unwrap();
        allocator.name(&QueryPosition::Main, &mut main);
        let mut example = TypeGraph::build(&catalog, &dialect, "Dog").unwrap();
        allocator.name(&QueryPosition::example("Dog"), &mut example);

        for (m, e) in main.nodes().iter().zip(example.nodes()) {
            assert_ne!(m.alias, e.alias);
        }
    }

    #[test]
    fn test_graph_without_new_class_is_not_registered() {
        let catalog = catalog();
        let dialect = AnsiDialect;
        let mut generator = AliasGenerator::new(&dialect);
        let mut tree = AliasTree::new();

        let mut dog = TypeGraph::build(&catalog, &dialect, "Dog").unwrap();
        tree.name_stack(&mut dog, &mut generator);
        let mut animal = TypeGraph::build(&catalog, &dialect, "Animal").unwrap();
        tree.name_stack(&mut animal, &mut generator);
        assert_eq!(tree.len(), 1);
        assert_eq!(animal.root().alias, dog.node(1).alias);
    }

    #[test]
    fn test_table_names_are_never_aliases() {
        let catalog = TypeCatalog::from_descriptors([ClassDescriptor::class("Thing").table("A")])
            .unwrap();
        let dialect = AnsiDialect;
        let mut allocator = AliasAllocator::new(&dialect);
        let mut graph = TypeGraph::build(&catalog, &dialect, "Thing").unwrap();
        allocator.name(&QueryPosition::Main, &mut graph);
        assert_eq!(graph.root().alias.as_deref(), Some("B"));
    }

    #[test]
    fn test_unnamed_catalog_tables_are_never_aliases() {
        let catalog = TypeCatalog::from_descriptors([
            ClassDescriptor::class("Thing").table("A"),
            ClassDescriptor::class("Other").table("B"),
        ])
        .unwrap();
        let dialect = AnsiDialect;
        let mut allocator = AliasAllocator::for_catalog(&dialect, &catalog);
        let mut graph = TypeGraph::build(&catalog, &dialect, "Thing").unwrap();
        allocator.name(&QueryPosition::Main, &mut graph);
        // OTHER is never named by a graph but still shadows alias B
        assert_eq!(graph.root().alias.as_deref(), Some("C"));
        assert_eq!(allocator.fresh(), "D");
    }

    #[test]
    fn test_nested_positions_follow_property_path() {
        let root = QueryPosition::example("Person");
        let home = root.nested("Address", "home");
        assert_eq!(
            home,
            QueryPosition::Example {
                class: "Address".into(),
                path: "Person/home".into()
            }
        );
        assert_eq!(
            home.nested("City", "city"),
            QueryPosition::Example {
                class: "City".into(),
                path: "Person/home/city".into()
            }
        );
    }
}
