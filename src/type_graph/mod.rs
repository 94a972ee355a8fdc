//! Type graphs: the table-per-class view of one class or one example instance.
//!
//! Every class and interface in the inheritance DAG of the root type becomes
//! a [`TypeNode`] on its own table, holding only the properties that class
//! declares itself. Edges point from a node to its direct parents
//! (superclass first, then interfaces). Diamonds through interfaces are
//! represented once: each class gets exactly one node.
//!
//! Arrays and collections are not classes; they get a synthetic one-node
//! graph on the dialect's array-membership table.

pub mod errors;
pub mod path_enumerator;
pub mod type_node;

use std::cell::OnceCell;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::dialect::Dialect;
use crate::object_graph::{Instance, ObjectGraph, ObjectId};
use crate::type_catalog::{ClassDescriptor, TypeCatalog};

pub use errors::TypeGraphError;
pub use path_enumerator::PathEnumerator;
pub use type_node::{PropertySlot, TypeNode};

/// Position of a node inside its graph
pub type NodeIdx = usize;

#[derive(Debug)]
pub struct TypeGraph {
    nodes: Vec<TypeNode>,
    by_class: HashMap<String, NodeIdx>,
    /// Parent class names as declared, resolved to indices on first use
    parent_names: Vec<Vec<String>>,
    supers: Vec<OnceCell<Vec<NodeIdx>>>,
    instance: Option<ObjectId>,
}

impl TypeGraph {
    /// Graph of a class with every property left as a placeholder
    pub fn build(
        catalog: &TypeCatalog,
        dialect: &dyn Dialect,
        class: &str,
    ) -> Result<Self, TypeGraphError> {
        Self::assemble(catalog, dialect, class, None)
    }

    /// Graph of an example instance, capturing the current value of every property.
    ///
    /// Arrays and collections produce the synthetic membership-table graph.
    pub fn build_for_instance(
        catalog: &TypeCatalog,
        dialect: &dyn Dialect,
        objects: &ObjectGraph,
        id: ObjectId,
    ) -> Result<Self, TypeGraphError> {
        match objects.get(id)? {
            Instance::Object { class, fields } => {
                for field in fields.keys() {
                    if catalog.find_property(class, field).is_none() {
                        return Err(TypeGraphError::UnresolvedAccessor {
                            class: class.clone(),
                            property: field.clone(),
                        });
                    }
                }
                Self::assemble(catalog, dialect, class, Some((objects, id)))
            }
            sequence => Ok(Self::sequence(dialect, &sequence.type_label(), Some(id))),
        }
    }

    /// One-node graph over the array-membership table
    pub fn sequence(dialect: &dyn Dialect, type_label: &str, id: Option<ObjectId>) -> Self {
        let mut node = TypeNode::new(type_label, dialect.array_table());
        node.is_array = true;
        node.force_include = true;
        let mut graph = Self::empty(id);
        graph.push(node, Vec::new());
        graph
    }

    fn empty(instance: Option<ObjectId>) -> Self {
        Self {
            nodes: Vec::new(),
            by_class: HashMap::new(),
            parent_names: Vec::new(),
            supers: Vec::new(),
            instance,
        }
    }

    fn push(&mut self, node: TypeNode, parents: Vec<String>) -> NodeIdx {
        let idx = self.nodes.len();
        self.by_class.insert(node.class_name.clone(), idx);
        self.nodes.push(node);
        self.parent_names.push(parents);
        self.supers.push(OnceCell::new());
        idx
    }

    fn assemble(
        catalog: &TypeCatalog,
        dialect: &dyn Dialect,
        class: &str,
        instance: Option<(&ObjectGraph, ObjectId)>,
    ) -> Result<Self, TypeGraphError> {
        let mut graph = Self::empty(instance.map(|(_, id)| id));
        let mut queue = VecDeque::from([class.to_string()]);
        let mut seen = HashSet::from([class.to_string()]);

        while let Some(name) = queue.pop_front() {
            let descriptor = catalog.require(&name)?;
            let mut node = Self::node_for(descriptor, dialect, instance)?;
            node.is_universal_root = catalog.is_universal_root(&name);
            // The root always anchors the query, even when nothing on it is set
            node.force_include = graph.nodes.is_empty();

            let parents: Vec<String> = descriptor.direct_supers().map(str::to_string).collect();
            for parent in &parents {
                if seen.insert(parent.clone()) {
                    queue.push_back(parent.clone());
                }
            }
            graph.push(node, parents);
        }

        log::debug!(
            "built type graph for `{}` with {} nodes{}",
            class,
            graph.nodes.len(),
            if instance.is_some() { " (instance)" } else { "" }
        );
        Ok(graph)
    }

    fn node_for(
        descriptor: &ClassDescriptor,
        dialect: &dyn Dialect,
        instance: Option<(&ObjectGraph, ObjectId)>,
    ) -> Result<TypeNode, TypeGraphError> {
        let mut node = TypeNode::new(descriptor.name.clone(), descriptor.table_name(dialect));
        for prop in &descriptor.properties {
            let value = match instance {
                Some((objects, id)) => Some(objects.field(id, &prop.name)?.clone()),
                None => None,
            };
            node.index_names.extend(prop.indexes.iter().cloned());
            node.properties.push(PropertySlot {
                name: prop.name.clone(),
                column: prop
                    .column
                    .clone()
                    .unwrap_or_else(|| dialect.column_name(&prop.name)),
                declared: prop.declared.clone(),
                value,
                nullable: prop.nullable,
            });
        }
        Ok(node)
    }

    pub fn root_idx(&self) -> NodeIdx {
        0
    }

    pub fn root(&self) -> &TypeNode {
        &self.nodes[0]
    }

    pub fn instance(&self) -> Option<ObjectId> {
        self.instance
    }

    pub fn is_sequence(&self) -> bool {
        self.root().is_array
    }

    pub fn node(&self, idx: NodeIdx) -> &TypeNode {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIdx) -> &mut TypeNode {
        &mut self.nodes[idx]
    }

    pub fn index_of(&self, class: &str) -> Option<NodeIdx> {
        self.by_class.get(class).copied()
    }

    pub fn node_for_class(&self, class: &str) -> Result<&TypeNode, TypeGraphError> {
        self.index_of(class)
            .map(|idx| &self.nodes[idx])
            .ok_or_else(|| TypeGraphError::UnknownNode {
                root: self.root().class_name.clone(),
                class: class.to_string(),
            })
    }

    /// Every node, root first
    pub fn nodes(&self) -> &[TypeNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct parents of a node, superclass first
    pub fn supers(&self, idx: NodeIdx) -> &[NodeIdx] {
        self.supers[idx].get_or_init(|| {
            self.parent_names[idx]
                .iter()
                .filter_map(|name| self.by_class.get(name).copied())
                .collect()
        })
    }

    /// Shortest chain of nodes from `from` up to `to`, both ends included
    pub fn chain(&self, from: NodeIdx, to: NodeIdx) -> Option<Vec<NodeIdx>> {
        let mut prev: HashMap<NodeIdx, NodeIdx> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        let mut seen = HashSet::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut chain = vec![current];
                let mut cursor = current;
                while let Some(&p) = prev.get(&cursor) {
                    chain.push(p);
                    cursor = p;
                }
                chain.reverse();
                return Some(chain);
            }
            for &parent in self.supers(current) {
                if seen.insert(parent) {
                    prev.insert(parent, current);
                    queue.push_back(parent);
                }
            }
        }
        None
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.table.as_str())
    }

    /// Property slot by name, searched on every node (root first)
    pub fn find_property(&self, name: &str) -> Option<(NodeIdx, &PropertySlot)> {
        self.nodes
            .iter()
            .enumerate()
            .find_map(|(idx, node)| node.property(name).map(|p| (idx, p)))
    }
}
