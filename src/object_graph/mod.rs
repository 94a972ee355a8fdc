//! In-memory example objects.
//!
//! Example graphs are arenas: every object, array and collection lives in
//! one [`ObjectGraph`] and is addressed by an [`ObjectId`] handle. Handles
//! give identity semantics (two distinct objects with equal fields stay
//! distinct) and make self-referential examples trivial to express.

pub mod errors;
pub mod fixture;
mod value;
mod visited;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::type_catalog::{CollectionKind, DeclaredType};

pub use errors::ObjectGraphError;
pub use value::Value;
pub use visited::VisitedSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instance {
    Object {
        class: String,
        fields: BTreeMap<String, Value>,
    },
    Array {
        element: DeclaredType,
        items: Vec<Value>,
    },
    /// Lists, sets and maps. Maps keep their keys parallel to `items`.
    Collection {
        kind: CollectionKind,
        element: DeclaredType,
        items: Vec<Value>,
        keys: Vec<Value>,
    },
}

impl Instance {
    /// Class name for objects, the type expression for arrays and collections
    pub fn type_label(&self) -> String {
        match self {
            Instance::Object { class, .. } => class.clone(),
            Instance::Array { element, .. } => DeclaredType::array_of(element.clone()).to_string(),
            Instance::Collection { kind, element, .. } => {
                DeclaredType::collection_of(*kind, element.clone()).to_string()
            }
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            Instance::Object { class, .. } => Some(class),
            _ => None,
        }
    }

    pub fn is_sequence(&self) -> bool {
        !matches!(self, Instance::Object { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectGraph {
    instances: Vec<Instance>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, instance: Instance) -> ObjectId {
        self.instances.push(instance);
        ObjectId(self.instances.len() - 1)
    }

    /// Add an object of `class` with the given field values
    pub fn object<K, V>(
        &mut self,
        class: impl Into<String>,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> ObjectId
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.push(Instance::Object {
            class: class.into(),
            fields,
        })
    }

    /// Add an object with no fields set
    pub fn empty_object(&mut self, class: impl Into<String>) -> ObjectId {
        self.object(class, std::iter::empty::<(String, Value)>())
    }

    pub fn array(&mut self, element: DeclaredType, items: Vec<Value>) -> ObjectId {
        self.push(Instance::Array { element, items })
    }

    pub fn collection(
        &mut self,
        kind: CollectionKind,
        element: DeclaredType,
        items: Vec<Value>,
    ) -> ObjectId {
        self.push(Instance::Collection {
            kind,
            element,
            items,
            keys: Vec::new(),
        })
    }

    /// Add a map. Keys must be scalar.
    pub fn map(
        &mut self,
        kind: CollectionKind,
        element: DeclaredType,
        entries: Vec<(Value, Value)>,
    ) -> Result<ObjectId, ObjectGraphError> {
        let next = ObjectId(self.instances.len());
        if entries.iter().any(|(k, _)| !k.is_scalar()) {
            return Err(ObjectGraphError::NonScalarMapKey(next));
        }
        let (keys, items) = entries.into_iter().unzip();
        Ok(self.push(Instance::Collection {
            kind,
            element,
            items,
            keys,
        }))
    }

    /// Set (or overwrite) one field. Used to close reference cycles.
    pub fn set_field(
        &mut self,
        id: ObjectId,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), ObjectGraphError> {
        match self.instances.get_mut(id.0) {
            Some(Instance::Object { fields, .. }) => {
                fields.insert(name.into(), value.into());
                Ok(())
            }
            Some(_) => Err(ObjectGraphError::NotAnObject(id)),
            None => Err(ObjectGraphError::UnknownObject(id)),
        }
    }

    pub fn get(&self, id: ObjectId) -> Result<&Instance, ObjectGraphError> {
        self.instances
            .get(id.0)
            .ok_or(ObjectGraphError::UnknownObject(id))
    }

    /// Value of one field, `Null` when unset
    pub fn field(&self, id: ObjectId, name: &str) -> Result<&Value, ObjectGraphError> {
        const NULL: &Value = &Value::Null;
        match self.get(id)? {
            Instance::Object { fields, .. } => Ok(fields.get(name).unwrap_or(NULL)),
            _ => Err(ObjectGraphError::NotAnObject(id)),
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
