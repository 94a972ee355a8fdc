//! Join path enumeration over catalogs loaded from YAML

#[cfg(test)]
mod path_enumeration_tests {
    use objmap::dialect::AnsiDialect;
    use objmap::object_graph::fixture::load_fixture_str;
    use objmap::type_catalog::TypeCatalog;
    use objmap::type_graph::path_enumerator::{prune_paths, Path};
    use objmap::type_graph::{PathEnumerator, TypeGraph};

    const CATALOG: &str = r#"
root_class: Entity
classes:
  - name: Entity
    kind: abstract
  - name: I0
    kind: interface
    properties:
      - { name: code, type: text }
  - name: I1
    kind: interface
    interfaces: [I0]
    properties:
      - { name: one, type: int }
  - name: C
    superclass: Entity
    interfaces: [I0]
    properties:
      - { name: c, type: long }
  - name: D
    superclass: C
    interfaces: [I1]
    properties:
      - { name: d, type: double }
"#;

    fn names(graph: &TypeGraph, paths: &[Path]) -> Vec<Vec<String>> {
        paths
            .iter()
            .map(|p| p.iter().map(|&i| graph.node(i).class_name.clone()).collect())
            .collect()
    }

    #[test]
    fn test_every_class_is_joined_exactly_once() {
        let catalog = TypeCatalog::from_yaml_str(CATALOG).unwrap();
        let graph = TypeGraph::build(&catalog, &AnsiDialect, "D").unwrap();
        assert_eq!(graph.len(), 5);

        let paths = PathEnumerator::new(&graph).generate_lists();
        assert_eq!(
            names(&graph, &paths),
            vec![
                vec!["D", "C", "Entity"],
                vec!["D", "C", "I0"],
                vec!["D", "I1"]
            ]
        );

        let mut covered: Vec<usize> = paths.iter().flatten().copied().collect();
        covered.sort_unstable();
        covered.dedup();
        assert_eq!(covered.len(), graph.len());
    }

    #[test]
    fn test_pruning_keeps_informative_branches_and_universal_root() {
        let catalog = TypeCatalog::from_yaml_str(CATALOG).unwrap();
        let fixture = load_fixture_str(
            &catalog,
            "objects:\n  ex: { class: D, fields: { one: 7 } }\n",
        )
        .unwrap();
        let ex = fixture.id("ex").unwrap();
        let graph =
            TypeGraph::build_for_instance(&catalog, &AnsiDialect, &fixture.graph, ex).unwrap();

        let paths = PathEnumerator::new(&graph).generate_lists();
        let pruned = prune_paths(&graph, paths);
        assert_eq!(
            names(&graph, &pruned),
            vec![vec!["D", "C", "Entity"], vec!["D", "I1"]]
        );
    }
}
