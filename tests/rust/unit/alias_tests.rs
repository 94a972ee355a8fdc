//! Alias allocation across dialects and query positions

#[cfg(test)]
mod alias_tests {
    use std::collections::HashSet;

    use objmap::alias::{AliasAllocator, QueryPosition};
    use objmap::dialect::{Dialect, DialectKind};
    use objmap::type_catalog::{ClassDescriptor, DeclaredType, TypeCatalog};
    use objmap::type_graph::TypeGraph;
    use test_case::test_case;

    #[test_case(DialectKind::Ansi ; "ansi")]
    #[test_case(DialectKind::Sqlite ; "sqlite")]
    fn test_ten_thousand_aliases_are_distinct_and_unreserved(kind: DialectKind) {
        let dialect = kind.dialect();
        let mut aliases = AliasAllocator::new(dialect.as_ref());
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let alias = aliases.fresh();
            assert!(alias.chars().all(|c| c.is_ascii_uppercase()), "{}", alias);
            assert!(!dialect.is_reserved(&alias), "{} is reserved", alias);
            assert!(seen.insert(alias.clone()), "{} issued twice", alias);
        }
    }

    #[test]
    fn test_forbidden_table_names_are_skipped() {
        let dialect = DialectKind::Ansi.dialect();
        let mut aliases = AliasAllocator::new(dialect.as_ref());
        aliases.forbid("a");
        aliases.forbid("C");
        assert_eq!(aliases.fresh(), "B");
        assert_eq!(aliases.fresh(), "D");
    }

    #[test]
    fn test_positions_share_or_separate_aliases() {
        let catalog = TypeCatalog::from_descriptors([
            ClassDescriptor::class("Address").property("city", DeclaredType::text()),
            ClassDescriptor::class("Person")
                .property("name", DeclaredType::text())
                .property("home", DeclaredType::class("Address")),
        ])
        .unwrap();
        let dialect = DialectKind::Ansi.dialect();
        let build = || TypeGraph::build(&catalog, dialect.as_ref(), "Person").unwrap();

        let mut aliases = AliasAllocator::new(dialect.as_ref());
        let person = QueryPosition::example("Person");
        let home = person.nested("Address", "home");

        let mut first = build();
        let mut second = build();
        let mut third = build();
        aliases.name(&person, &mut first);
        aliases.name(&person, &mut second);
        aliases.name(&home, &mut third);

        assert_eq!(first.root().alias, second.root().alias);
        assert_ne!(first.root().alias, third.root().alias);
        assert_eq!(
            home.nested("Person", "resident"),
            QueryPosition::Example {
                class: "Person".into(),
                path: "Person/home/resident".into()
            }
        );
    }
}
