//! Reference-typed properties: nested examples, cycles, polymorphic values
//! and array/collection slots.

use super::people_catalog;
use crate::dialect::AnsiDialect;
use crate::object_graph::{ObjectGraph, Value};
use crate::query_builder::{QueryBuildError, QueryBuilder, Selector, UsageError};
use crate::type_catalog::{CollectionKind, DeclaredType};

#[test]
fn test_nested_object_is_joined_by_reference_column() {
    let catalog = people_catalog();
    let mut objects = ObjectGraph::new();
    let oslo = objects.object("Address", [("city", "Oslo")]);
    let ann = objects.object("Person", [("name", Value::from("Ann")), ("home", Value::from(oslo))]);

    let plan = QueryBuilder::new(&catalog, &AnsiDialect, &objects)
        .generate("Person", &[Selector::new(ann).into()], true)
        .unwrap();
    let rendered = plan.to_sql(&AnsiDialect);
    assert_eq!(
        rendered.sql,
        "SELECT DISTINCT A.DBID FROM PERSON A WHERE EXISTS (SELECT 1 FROM PERSON B, ADDRESS C \
         WHERE A.DBID = B.DBID AND B.NAME = ? AND B.HOME = C.DBID AND C.CITY = ?)"
    );
    assert_eq!(rendered.params, vec![Value::from("Ann"), Value::from("Oslo")]);
}

#[test]
fn test_cyclic_example_closes_on_known_alias() {
    let catalog = people_catalog();
    let mut objects = ObjectGraph::new();
    let ann = objects.object("Person", [("name", "Ann")]);
    let bob = objects.object("Person", [("name", Value::from("Bob")), ("friend", Value::from(ann))]);
    objects.set_field(ann, "friend", bob).unwrap();

    let plan = QueryBuilder::new(&catalog, &AnsiDialect, &objects)
        .generate("Person", &[Selector::new(ann).into()], true)
        .unwrap();
    assert_eq!(
        plan.to_sql(&AnsiDialect).sql,
        "SELECT DISTINCT A.DBID FROM PERSON A WHERE EXISTS (SELECT 1 FROM PERSON B, PERSON C \
         WHERE A.DBID = B.DBID AND B.NAME = ? AND B.FRIEND = C.DBID \
         AND C.NAME = ? AND C.FRIEND = B.DBID)"
    );
}

#[test]
fn test_self_reference_links_back_to_anchor() {
    let catalog = people_catalog();
    let mut objects = ObjectGraph::new();
    let narcissus = objects.empty_object("Person");
    objects.set_field(narcissus, "friend", narcissus).unwrap();

    let plan = QueryBuilder::new(&catalog, &AnsiDialect, &objects)
        .generate("Person", &[Selector::new(narcissus).into()], true)
        .unwrap();
    assert_eq!(
        plan.to_sql(&AnsiDialect).sql,
        "SELECT DISTINCT A.DBID FROM PERSON A WHERE EXISTS (SELECT 1 FROM PERSON B \
         WHERE A.DBID = B.DBID AND B.FRIEND = B.DBID)"
    );
}

#[test]
fn test_polymorphic_value_under_abstract_declaration() {
    let catalog = people_catalog();
    let mut objects = ObjectGraph::new();
    let rex = objects.object("Dog", [("name", "Rex")]);
    let ann = objects.object("Person", [("pet", rex)]);

    // Relaxed: Pet is abstract, so only the Pet table is needed
    let relaxed = QueryBuilder::new(&catalog, &AnsiDialect, &objects)
        .generate("Person", &[Selector::new(ann).into()], true)
        .unwrap();
    assert_eq!(
        relaxed.to_sql(&AnsiDialect).sql,
        "SELECT DISTINCT A.DBID FROM PERSON A WHERE EXISTS (SELECT 1 FROM PERSON B, PET D \
         WHERE A.DBID = B.DBID AND B.PET = D.DBID AND D.NAME = ?)"
    );

    // Strict: the Dog row must exist too
    let strict = QueryBuilder::new(&catalog, &AnsiDialect, &objects)
        .generate("Person", &[Selector::new(ann).strict().into()], true)
        .unwrap();
    assert_eq!(
        strict.to_sql(&AnsiDialect).sql,
        "SELECT DISTINCT A.DBID FROM PERSON A WHERE EXISTS (SELECT 1 FROM PERSON B, DOG C, PET D \
         WHERE A.DBID = B.DBID AND B.PET = C.DBID AND C.DBID = D.DBID AND D.NAME = ?)"
    );
}

#[test]
fn test_reference_to_wrong_class_is_rejected() {
    let catalog = people_catalog();
    let mut objects = ObjectGraph::new();
    let oslo = objects.object("Address", [("city", "Oslo")]);
    let ann = objects.object("Person", [("friend", oslo)]);

    let err = QueryBuilder::new(&catalog, &AnsiDialect, &objects)
        .generate("Person", &[Selector::new(ann).into()], true)
        .unwrap_err();
    assert_eq!(
        err,
        QueryBuildError::Usage(UsageError::ExampleNotAssignable {
            example: "Address".into(),
            class: "Person".into(),
        })
    );
}

#[test]
fn test_array_slots_are_matched_in_order() {
    let catalog = people_catalog();
    let mut objects = ObjectGraph::new();
    let tags = objects.array(
        DeclaredType::text(),
        vec![Value::from("x"), Value::Null, Value::from("y")],
    );
    let ann = objects.object("Person", [("tags", tags)]);

    let plan = QueryBuilder::new(&catalog, &AnsiDialect, &objects)
        .generate("Person", &[Selector::new(ann).into()], true)
        .unwrap();
    let rendered = plan.to_sql(&AnsiDialect);
    assert_eq!(
        rendered.sql,
        "SELECT DISTINCT A.DBID FROM PERSON A WHERE EXISTS (SELECT 1 FROM PERSON B, \
         ARRAY_MEMBER C, ARRAY_MEMBER D, ARRAY_MEMBER E WHERE A.DBID = B.DBID \
         AND B.TAGS = C.ARRAY_ID AND D.ARRAY_ID = C.ARRAY_ID AND D.SLOT = ? \
         AND D.PRIM_VALUE = ? AND E.ARRAY_ID = C.ARRAY_ID AND E.SLOT = ? AND E.PRIM_VALUE = ?)"
    );
    assert_eq!(
        rendered.params,
        vec![
            Value::Long(0),
            Value::from("x"),
            Value::Long(2),
            Value::from("y")
        ]
    );
}

#[test]
fn test_unordered_collection_ignores_slots() {
    let catalog = people_catalog();
    let mut objects = ObjectGraph::new();
    let nicknames = objects.collection(
        CollectionKind::HashSet,
        DeclaredType::text(),
        vec![Value::from("Annie")],
    );
    let ann = objects.object("Person", [("nicknames", nicknames)]);

    let plan = QueryBuilder::new(&catalog, &AnsiDialect, &objects)
        .generate("Person", &[Selector::new(ann).into()], true)
        .unwrap();
    let sql = plan.to_sql(&AnsiDialect).sql;
    assert!(!sql.contains("SLOT"), "{}", sql);
    assert!(sql.ends_with("D.PRIM_VALUE = ?)"), "{}", sql);
}

#[test]
fn test_list_of_objects_recurses_through_ref_column() {
    let catalog = people_catalog();
    let mut objects = ObjectGraph::new();
    let rex = objects.object("Dog", [("breed", "Beagle")]);
    let pets = objects.collection(
        CollectionKind::List,
        DeclaredType::class("Pet"),
        vec![Value::from(rex)],
    );
    let ann = objects.object("Person", [("pets", pets)]);

    let plan = QueryBuilder::new(&catalog, &AnsiDialect, &objects)
        .generate("Person", &[Selector::new(ann).into()], true)
        .unwrap();
    let sql = plan.to_sql(&AnsiDialect).sql;
    // Breed lives on the Dog table, so the Dog row anchors the element
    assert!(sql.contains("D.SLOT = ?"), "{}", sql);
    assert!(sql.contains("D.REF_ID = E.DBID"), "{}", sql);
    assert!(sql.contains("E.BREED = ?"), "{}", sql);
    assert!(sql.contains("DOG E"), "{}", sql);
}

#[test]
fn test_map_keys_are_compared() {
    use crate::type_catalog::{ClassDescriptor, TypeCatalog};
    let catalog = TypeCatalog::from_descriptors([ClassDescriptor::class("Settings").property(
        "values",
        DeclaredType::collection_of(CollectionKind::HashMap, DeclaredType::int()),
    )])
    .unwrap();
    let mut objects = ObjectGraph::new();
    let map = objects
        .map(
            CollectionKind::HashMap,
            DeclaredType::int(),
            vec![(Value::from("volume"), Value::Int(11))],
        )
        .unwrap();
    let settings = objects.object("Settings", [("values", map)]);

    let plan = QueryBuilder::new(&catalog, &AnsiDialect, &objects)
        .generate("Settings", &[Selector::new(settings).into()], true)
        .unwrap();
    let rendered = plan.to_sql(&AnsiDialect);
    assert!(rendered.sql.contains("D.MAP_KEY = ?"), "{}", rendered.sql);
    assert_eq!(rendered.params, vec![Value::from("volume"), Value::Int(11)]);
}

#[test]
fn test_nesting_depth_is_bounded() {
    let catalog = people_catalog();
    let mut objects = ObjectGraph::new();
    let oslo = objects.object("Address", [("city", "Oslo")]);
    let ann = objects.object("Person", [("home", oslo)]);

    let err = QueryBuilder::new(&catalog, &AnsiDialect, &objects)
        .with_max_depth(0)
        .generate("Person", &[Selector::new(ann).into()], true)
        .unwrap_err();
    assert_eq!(err, QueryBuildError::Usage(UsageError::NestingTooDeep { limit: 0 }));
}
