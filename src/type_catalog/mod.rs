//! Type catalog: the registry of class descriptors the mapper works from.
//!
//! Catalogs can be assembled in code (tests, derive output) or loaded from
//! YAML:
//!
//! ```yaml
//! root_class: Entity          # optional universal root
//! classes:
//!   - name: Entity
//!     kind: abstract
//!   - name: Person
//!     superclass: Entity
//!     interfaces: [Named]
//!     properties:
//!       - { name: age, type: int }
//!       - { name: address, type: Address }
//!   - name: Named
//!     kind: interface
//!     properties:
//!       - { name: name, type: text, indexes: [by_name] }
//! ```

pub mod descriptor;
pub mod errors;
pub mod schema_diff;

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use descriptor::{
    ClassDescriptor, ClassKind, CollectionKind, DeclaredType, PropertyDescriptor, ScalarKind,
};
pub use errors::{CatalogError, MetadataError};

/// On-disk catalog layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub root_class: Option<String>,
    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,
}

#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    classes: HashMap<String, ClassDescriptor>,
    /// Registration order, kept so that iteration is deterministic
    order: Vec<String>,
    root_class: Option<String>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every descriptor and validate the result as a whole
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = ClassDescriptor>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for descriptor in descriptors {
            catalog.register(descriptor)?;
        }
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_document(doc: CatalogDocument) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for descriptor in doc.classes {
            catalog.register(descriptor)?;
        }
        catalog.root_class = doc.root_class;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument =
            serde_yaml::from_str(content).map_err(|e| CatalogError::ParseError {
                error: e.to_string(),
            })?;
        Self::from_document(doc)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CatalogError::ReadError {
                error: format!("{}: {}", path.as_ref().display(), e),
            }
        })?;
        Self::from_yaml_str(&content)
    }

    /// Add one descriptor. References are checked by [`TypeCatalog::validate`].
    pub fn register(&mut self, descriptor: ClassDescriptor) -> Result<(), CatalogError> {
        if self.classes.contains_key(&descriptor.name) {
            return Err(CatalogError::DuplicateClass {
                class: descriptor.name,
            });
        }
        let mut seen = HashSet::new();
        for prop in &descriptor.properties {
            if !seen.insert(prop.name.as_str()) {
                return Err(CatalogError::DuplicateProperty {
                    class: descriptor.name.clone(),
                    property: prop.name.clone(),
                });
            }
        }
        log::debug!("registering class descriptor `{}`", descriptor.name);
        self.order.push(descriptor.name.clone());
        self.classes.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Declare the universal root class (every path reaching it is kept)
    pub fn with_root_class(mut self, name: impl Into<String>) -> Self {
        self.root_class = Some(name.into());
        self
    }

    pub fn root_class(&self) -> Option<&str> {
        self.root_class.as_deref()
    }

    pub fn is_universal_root(&self, class: &str) -> bool {
        self.root_class.as_deref() == Some(class)
    }

    pub fn get(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&ClassDescriptor, CatalogError> {
        self.classes.get(name).ok_or_else(|| CatalogError::UnknownClass {
            class: name.to_string(),
        })
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.order.iter().filter_map(|name| self.classes.get(name))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Find `property` on `class` or any ancestor. Returns the declaring class with it.
    ///
    /// Lookup is breadth-first over direct supers, so a class's own
    /// declaration wins over an inherited one.
    pub fn find_property(
        &self,
        class: &str,
        property: &str,
    ) -> Option<(&ClassDescriptor, &PropertyDescriptor)> {
        let mut queue = VecDeque::from([class]);
        let mut seen = HashSet::from([class]);
        while let Some(current) = queue.pop_front() {
            let Some(descriptor) = self.classes.get(current) else {
                continue;
            };
            if let Some(prop) = descriptor.own_property(property) {
                return Some((descriptor, prop));
            }
            for parent in descriptor.direct_supers() {
                if seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        None
    }

    /// Whether a value of class `from` can be stored where `to` is declared
    pub fn is_assignable(&self, from: &str, to: &str) -> bool {
        self.ancestry_path(from, to).is_some()
    }

    /// Shortest chain of classes from `from` up to `to`, both ends included
    pub fn ancestry_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let mut parents: HashMap<&str, &str> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        let mut seen = HashSet::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut chain = vec![current.to_string()];
                let mut cursor = current;
                while let Some(&prev) = parents.get(cursor) {
                    chain.push(prev.to_string());
                    cursor = prev;
                }
                chain.reverse();
                return Some(chain);
            }
            let Some(descriptor) = self.classes.get(current) else {
                continue;
            };
            for parent in descriptor.direct_supers() {
                if seen.insert(parent) {
                    parents.insert(parent, current);
                    queue.push_back(parent);
                }
            }
        }
        None
    }

    /// Check that every reference resolves and the hierarchy is acyclic
    pub fn validate(&self) -> Result<(), CatalogError> {
        if let Some(root) = &self.root_class {
            self.require(root)?;
        }
        for descriptor in self.classes() {
            if let Some(superclass) = &descriptor.superclass {
                if descriptor.is_interface() {
                    return Err(CatalogError::InterfaceWithSuperclass {
                        class: descriptor.name.clone(),
                    });
                }
                let parent =
                    self.get(superclass)
                        .ok_or_else(|| CatalogError::UnknownSuperclass {
                            class: descriptor.name.clone(),
                            superclass: superclass.clone(),
                        })?;
                if parent.is_interface() {
                    return Err(CatalogError::SuperclassIsInterface {
                        class: descriptor.name.clone(),
                        superclass: superclass.clone(),
                    });
                }
            }
            for interface in &descriptor.interfaces {
                let parent = self.require(interface)?;
                if !parent.is_interface() {
                    return Err(CatalogError::NotAnInterface {
                        class: descriptor.name.clone(),
                        interface: interface.clone(),
                    });
                }
            }
            for prop in &descriptor.properties {
                if let Some(target) = prop.declared.referenced_class() {
                    if !self.classes.contains_key(target) {
                        return Err(CatalogError::UnknownPropertyType {
                            class: descriptor.name.clone(),
                            property: prop.name.clone(),
                            target: target.to_string(),
                        });
                    }
                }
            }
        }
        self.check_acyclic()
    }

    fn check_acyclic(&self) -> Result<(), CatalogError> {
        // 0 = unvisited, 1 = on stack, 2 = done
        let mut state: HashMap<&str, u8> = HashMap::new();
        for start in &self.order {
            let mut stack: Vec<(&str, bool)> = vec![(start.as_str(), false)];
            while let Some((name, finished)) = stack.pop() {
                if finished {
                    state.insert(name, 2);
                    continue;
                }
                match state.get(name) {
                    Some(2) => continue,
                    Some(1) => {
                        return Err(CatalogError::InheritanceCycle {
                            class: name.to_string(),
                        })
                    }
                    _ => {}
                }
                state.insert(name, 1);
                stack.push((name, true));
                if let Some(descriptor) = self.classes.get(name) {
                    for parent in descriptor.direct_supers() {
                        match state.get(parent) {
                            Some(1) => {
                                return Err(CatalogError::InheritanceCycle {
                                    class: parent.to_string(),
                                })
                            }
                            Some(2) => {}
                            _ => stack.push((parent, false)),
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
