//! Loading example object graphs from YAML fixtures.
//!
//! ```yaml
//! objects:
//!   ann:  { class: Person, fields: { name: Ann, age: 41, home: "@oslo", pets: "@pets" } }
//!   oslo: { class: Address, fields: { city: Oslo } }
//!   pets: { collection: "hash_set<Pet>", items: ["@rex"] }
//!   rex:  { class: Dog, fields: { name: Rex } }
//!   tags: { array: text, items: [a, b] }
//! ```
//!
//! Field values are interpreted against the declared property types from the
//! catalog; `"@name"` refers to another fixture object.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_yaml::Value as YamlValue;

use super::{Instance, ObjectGraph, ObjectGraphError, ObjectId, Value};
use crate::type_catalog::{DeclaredType, ScalarKind, TypeCatalog};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureDocument {
    #[serde(default)]
    pub objects: BTreeMap<String, FixtureInstance>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureInstance {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, YamlValue>,
    /// Element type of an array
    #[serde(default)]
    pub array: Option<DeclaredType>,
    /// Full collection type, e.g. `list<Pet>`
    #[serde(default)]
    pub collection: Option<DeclaredType>,
    #[serde(default)]
    pub items: Vec<YamlValue>,
    #[serde(default)]
    pub entries: Vec<(YamlValue, YamlValue)>,
}

/// A fixture turned into an arena, with the fixture names kept for lookups
#[derive(Debug, Clone, Default)]
pub struct LoadedFixture {
    pub graph: ObjectGraph,
    pub names: HashMap<String, ObjectId>,
}

impl LoadedFixture {
    pub fn id(&self, name: &str) -> Result<ObjectId, ObjectGraphError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| ObjectGraphError::UndefinedReference(name.to_string()))
    }
}

pub fn load_fixture_str(
    catalog: &TypeCatalog,
    content: &str,
) -> Result<LoadedFixture, ObjectGraphError> {
    let doc: FixtureDocument =
        serde_yaml::from_str(content).map_err(|e| ObjectGraphError::Parse(e.to_string()))?;
    load_fixture(catalog, &doc)
}

pub fn load_fixture(
    catalog: &TypeCatalog,
    doc: &FixtureDocument,
) -> Result<LoadedFixture, ObjectGraphError> {
    let mut loaded = LoadedFixture::default();

    // First pass: allocate every instance so references can point forward.
    for (name, spec) in &doc.objects {
        let instance = match (&spec.class, &spec.array, &spec.collection) {
            (Some(class), None, None) => Instance::Object {
                class: class.clone(),
                fields: BTreeMap::new(),
            },
            (None, Some(element), None) => Instance::Array {
                element: element.clone(),
                items: Vec::new(),
            },
            (None, None, Some(DeclaredType::Collection { kind, element })) => {
                Instance::Collection {
                    kind: *kind,
                    element: (**element).clone(),
                    items: Vec::new(),
                    keys: Vec::new(),
                }
            }
            _ => return Err(ObjectGraphError::MalformedInstance(name.clone())),
        };
        let id = loaded.graph.push(instance);
        loaded.names.insert(name.clone(), id);
    }

    // Second pass: convert values now that every name resolves.
    for (name, spec) in &doc.objects {
        let id = loaded.names[name];
        let filled = match loaded.graph.get(id)? {
            Instance::Object { class, .. } => {
                let mut fields = BTreeMap::new();
                for (field, raw) in &spec.fields {
                    let (_, prop) = catalog.find_property(class, field).ok_or_else(|| {
                        ObjectGraphError::UnresolvedAccessor {
                            class: class.clone(),
                            property: field.clone(),
                        }
                    })?;
                    let value = convert(&prop.declared, raw, field, &loaded.names)?;
                    fields.insert(field.clone(), value);
                }
                Instance::Object {
                    class: class.clone(),
                    fields,
                }
            }
            Instance::Array { element, .. } => Instance::Array {
                element: element.clone(),
                items: convert_items(element, &spec.items, name, &loaded.names)?,
            },
            Instance::Collection { kind, element, .. } => {
                if kind.is_map() {
                    let mut keys = Vec::with_capacity(spec.entries.len());
                    let mut items = Vec::with_capacity(spec.entries.len());
                    for (raw_key, raw_value) in &spec.entries {
                        keys.push(convert_key(raw_key).ok_or(ObjectGraphError::NonScalarMapKey(id))?);
                        items.push(convert(element, raw_value, name, &loaded.names)?);
                    }
                    Instance::Collection {
                        kind: *kind,
                        element: element.clone(),
                        items,
                        keys,
                    }
                } else {
                    Instance::Collection {
                        kind: *kind,
                        element: element.clone(),
                        items: convert_items(element, &spec.items, name, &loaded.names)?,
                        keys: Vec::new(),
                    }
                }
            }
        };
        loaded.graph.instances[id.index()] = filled;
    }

    log::debug!("loaded fixture with {} instances", loaded.graph.len());
    Ok(loaded)
}

fn convert_items(
    element: &DeclaredType,
    raw: &[YamlValue],
    owner: &str,
    names: &HashMap<String, ObjectId>,
) -> Result<Vec<Value>, ObjectGraphError> {
    raw.iter()
        .enumerate()
        .map(|(i, item)| convert(element, item, &format!("{}[{}]", owner, i), names))
        .collect()
}

fn convert_key(raw: &YamlValue) -> Option<Value> {
    match raw {
        YamlValue::Bool(b) => Some(Value::Bool(*b)),
        YamlValue::Number(n) => n
            .as_i64()
            .map(Value::Long)
            .or_else(|| n.as_f64().map(Value::Double)),
        YamlValue::String(s) if !s.starts_with('@') => Some(Value::Text(s.clone())),
        _ => None,
    }
}

fn convert(
    declared: &DeclaredType,
    raw: &YamlValue,
    field: &str,
    names: &HashMap<String, ObjectId>,
) -> Result<Value, ObjectGraphError> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let mismatch = || ObjectGraphError::ValueMismatch {
        field: field.to_string(),
        declared: declared.to_string(),
        value: format!("{:?}", raw),
    };
    match declared {
        DeclaredType::Scalar(kind) => convert_scalar(*kind, raw).ok_or_else(mismatch),
        _ => match raw.as_str().and_then(|s| s.strip_prefix('@')) {
            Some(target) => names
                .get(target)
                .map(|id| Value::Ref(*id))
                .ok_or_else(|| ObjectGraphError::UndefinedReference(target.to_string())),
            None => Err(mismatch()),
        },
    }
}

fn convert_scalar(kind: ScalarKind, raw: &YamlValue) -> Option<Value> {
    match kind {
        ScalarKind::Bool => raw.as_bool().map(Value::Bool),
        ScalarKind::Int => raw
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Int),
        ScalarKind::Long => raw.as_i64().map(Value::Long),
        ScalarKind::Float => raw.as_f64().map(|v| Value::Float(v as f32)),
        ScalarKind::Double => raw.as_f64().map(Value::Double),
        ScalarKind::Text => raw.as_str().map(|s| Value::Text(s.to_string())),
        ScalarKind::Bytes => match raw {
            YamlValue::String(s) => Some(Value::Bytes(s.as_bytes().to_vec())),
            YamlValue::Sequence(seq) => seq
                .iter()
                .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .map(Value::Bytes),
            _ => None,
        },
    }
}
