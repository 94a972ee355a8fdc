//! Query generation tests against a small people-and-pets catalog.

mod nested_value_tests;

use crate::type_catalog::{ClassDescriptor, CollectionKind, DeclaredType, TypeCatalog};

/// Person -> Address / Person / Pet references, a text array, a list and a set.
/// Pet is abstract with concrete Dog below it.
pub(super) fn people_catalog() -> TypeCatalog {
    TypeCatalog::from_descriptors([
        ClassDescriptor::class("Address")
            .property("city", DeclaredType::text())
            .property("street", DeclaredType::text()),
        ClassDescriptor::abstract_class("Pet").property("name", DeclaredType::text()),
        ClassDescriptor::class("Dog")
            .extends("Pet")
            .property("breed", DeclaredType::text()),
        ClassDescriptor::class("Person")
            .property("name", DeclaredType::text())
            .property("age", DeclaredType::int())
            .property("home", DeclaredType::class("Address"))
            .property("friend", DeclaredType::class("Person"))
            .property("pet", DeclaredType::class("Pet"))
            .property("tags", DeclaredType::array_of(DeclaredType::text()))
            .property(
                "pets",
                DeclaredType::collection_of(CollectionKind::List, DeclaredType::class("Pet")),
            )
            .property(
                "nicknames",
                DeclaredType::collection_of(CollectionKind::HashSet, DeclaredType::text()),
            ),
    ])
    .unwrap()
}
