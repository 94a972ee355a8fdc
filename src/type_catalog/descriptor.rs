//! Explicit per-type descriptors.
//!
//! A descriptor is what accessor reflection or annotation scanning would
//! produce: the class name, where it sits in the hierarchy and its declared
//! properties. The mapping core consumes descriptors only, so the discovery
//! step can be a derive macro, a code generator or a YAML file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::CatalogError;
use crate::dialect::Dialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    Int,
    Long,
    Float,
    Double,
    Text,
    Bytes,
}

impl ScalarKind {
    pub fn is_integral(self) -> bool {
        matches!(self, ScalarKind::Int | ScalarKind::Long)
    }

    pub fn is_floating(self) -> bool {
        matches!(self, ScalarKind::Float | ScalarKind::Double)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integral() || self.is_floating()
    }

    fn keyword(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Text => "text",
            ScalarKind::Bytes => "bytes",
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "bool" => ScalarKind::Bool,
            "int" => ScalarKind::Int,
            "long" => ScalarKind::Long,
            "float" => ScalarKind::Float,
            "double" => ScalarKind::Double,
            "text" => ScalarKind::Text,
            "bytes" => ScalarKind::Bytes,
            _ => return None,
        })
    }
}

/// Collection flavours. The flavour decides whether element order is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    List,
    Queue,
    LinkedSet,
    SortedSet,
    HashSet,
    LinkedMap,
    SortedMap,
    HashMap,
}

impl CollectionKind {
    const ALL: [CollectionKind; 8] = [
        CollectionKind::List,
        CollectionKind::Queue,
        CollectionKind::LinkedSet,
        CollectionKind::SortedSet,
        CollectionKind::HashSet,
        CollectionKind::LinkedMap,
        CollectionKind::SortedMap,
        CollectionKind::HashMap,
    ];

    /// Whether element order matters when comparing two collections
    pub fn is_ordered(self) -> bool {
        !matches!(self, CollectionKind::HashSet | CollectionKind::HashMap)
    }

    pub fn is_map(self) -> bool {
        matches!(
            self,
            CollectionKind::LinkedMap | CollectionKind::SortedMap | CollectionKind::HashMap
        )
    }

    fn keyword(self) -> &'static str {
        match self {
            CollectionKind::List => "list",
            CollectionKind::Queue => "queue",
            CollectionKind::LinkedSet => "linked_set",
            CollectionKind::SortedSet => "sorted_set",
            CollectionKind::HashSet => "hash_set",
            CollectionKind::LinkedMap => "linked_map",
            CollectionKind::SortedMap => "sorted_map",
            CollectionKind::HashMap => "hash_map",
        }
    }
}

/// Declared type of a property.
///
/// Serialized as a compact type expression so catalogs stay readable:
/// `text`, `long`, `Address`, `Address[]`, `list<Address>`, `hash_map<int>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeclaredType {
    Scalar(ScalarKind),
    Class(String),
    Array(Box<DeclaredType>),
    Collection {
        kind: CollectionKind,
        element: Box<DeclaredType>,
    },
}

impl DeclaredType {
    pub fn text() -> Self {
        DeclaredType::Scalar(ScalarKind::Text)
    }

    pub fn int() -> Self {
        DeclaredType::Scalar(ScalarKind::Int)
    }

    pub fn long() -> Self {
        DeclaredType::Scalar(ScalarKind::Long)
    }

    pub fn double() -> Self {
        DeclaredType::Scalar(ScalarKind::Double)
    }

    pub fn class(name: impl Into<String>) -> Self {
        DeclaredType::Class(name.into())
    }

    pub fn array_of(element: DeclaredType) -> Self {
        DeclaredType::Array(Box::new(element))
    }

    pub fn collection_of(kind: CollectionKind, element: DeclaredType) -> Self {
        DeclaredType::Collection {
            kind,
            element: Box::new(element),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, DeclaredType::Scalar(_))
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            DeclaredType::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            DeclaredType::Class(name) => Some(name),
            _ => None,
        }
    }

    /// Every class referenced by this type, innermost element included
    pub fn referenced_class(&self) -> Option<&str> {
        match self {
            DeclaredType::Scalar(_) => None,
            DeclaredType::Class(name) => Some(name),
            DeclaredType::Array(element) | DeclaredType::Collection { element, .. } => {
                element.referenced_class()
            }
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Scalar(kind) => write!(f, "{}", kind.keyword()),
            DeclaredType::Class(name) => write!(f, "{}", name),
            DeclaredType::Array(element) => write!(f, "{}[]", element),
            DeclaredType::Collection { kind, element } => {
                write!(f, "{}<{}>", kind.keyword(), element)
            }
        }
    }
}

impl FromStr for DeclaredType {
    type Err = CatalogError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(CatalogError::InvalidType(raw.to_string()));
        }
        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(DeclaredType::array_of(inner.parse()?));
        }
        if let Some(open) = s.find('<') {
            let inner = s[open + 1..]
                .strip_suffix('>')
                .ok_or_else(|| CatalogError::InvalidType(raw.to_string()))?;
            let keyword = &s[..open];
            let kind = CollectionKind::ALL
                .into_iter()
                .find(|k| k.keyword() == keyword)
                .ok_or_else(|| CatalogError::InvalidType(raw.to_string()))?;
            return Ok(DeclaredType::collection_of(kind, inner.parse()?));
        }
        if let Some(kind) = ScalarKind::from_keyword(s) {
            return Ok(DeclaredType::Scalar(kind));
        }
        if s.chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == ':')
        {
            Ok(DeclaredType::Class(s.to_string()))
        } else {
            Err(CatalogError::InvalidType(raw.to_string()))
        }
    }
}

impl TryFrom<String> for DeclaredType {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeclaredType> for String {
    fn from(value: DeclaredType) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Abstract,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    /// Explicit column name; derived through the dialect when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(rename = "type")]
    pub declared: DeclaredType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<String>,
}

fn default_nullable() -> bool {
    true
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, declared: DeclaredType) -> Self {
        Self {
            name: name.into(),
            column: None,
            declared,
            nullable: true,
            indexes: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn indexed(mut self, index: impl Into<String>) -> Self {
        self.indexes.push(index.into());
        self
    }
}

/// Descriptor of one class or interface and its own (not inherited) properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    /// Explicit table name; derived through the dialect when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

impl ClassDescriptor {
    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Class)
    }

    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Abstract)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Interface)
    }

    fn with_kind(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            table: None,
            kind,
            superclass: None,
            interfaces: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// The explicit table, or the one the dialect derives from the class name
    pub fn table_name(&self, dialect: &dyn Dialect) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| dialect.table_name(&self.name))
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, declared: DeclaredType) -> Self {
        self.properties.push(PropertyDescriptor::new(name, declared));
        self
    }

    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// Concrete classes can have instances of exactly their own type
    pub fn is_concrete(&self) -> bool {
        self.kind == ClassKind::Class
    }

    /// Direct parents: superclass first, then interfaces in declaration order
    pub fn direct_supers(&self) -> impl Iterator<Item = &str> {
        self.superclass
            .iter()
            .map(String::as_str)
            .chain(self.interfaces.iter().map(String::as_str))
    }

    pub fn own_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
}
