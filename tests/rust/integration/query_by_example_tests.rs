//! Query-by-example statements executed against SQLite
//!
//! Tables are created from the catalog with the SQLite dialect, populated by
//! hand, and the rendered statements are run with their bound parameters.

#[cfg(test)]
mod query_by_example_tests {
    use objmap::dialect::SqliteDialect;
    use objmap::object_graph::fixture::{load_fixture_str, LoadedFixture};
    use objmap::query_builder::{AggregateFunction, QueryDocument, RenderedStatement};
    use objmap::type_catalog::schema_diff::wanted_columns;
    use objmap::{Dialect, QueryBuilder, TypeCatalog, Value};
    use rusqlite::types::{FromSql, Value as SqlValue};
    use rusqlite::{params_from_iter, Connection};

    const CATALOG: &str = r#"
classes:
  - name: Address
    properties:
      - { name: city, type: text }
      - { name: street, type: text }
  - name: Person
    properties:
      - { name: name, type: text }
      - { name: age, type: int }
      - { name: home, type: Address }
"#;

    const FIXTURE: &str = r#"
objects:
  aged_41: { class: Person, fields: { age: 41 } }
  bob: { class: Person, fields: { name: Bob } }
  oslo: { class: Address, fields: { city: Oslo } }
  lives_in_oslo: { class: Person, fields: { home: "@oslo" } }
  by_name: { class: Person, fields: { name: "" } }
  pattern: { class: Person, fields: { name: "%a%" } }
"#;

    fn sql_value(value: &Value) -> SqlValue {
        match value {
            Value::Null | Value::Ref(_) => SqlValue::Null,
            Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
            Value::Int(i) => SqlValue::Integer(i64::from(*i)),
            Value::Long(l) => SqlValue::Integer(*l),
            Value::Float(f) => SqlValue::Real(f64::from(*f)),
            Value::Double(d) => SqlValue::Real(*d),
            Value::Text(s) => SqlValue::Text(s.clone()),
            Value::Bytes(b) => SqlValue::Blob(b.clone()),
        }
    }

    struct Fixture {
        catalog: TypeCatalog,
        loaded: LoadedFixture,
        conn: Connection,
    }

    const ROWS: &str =
        "INSERT INTO ADDRESS (DBID, CITY, STREET) VALUES (1, 'Oslo', 'Storgata'), (2, 'Bergen', 'Bryggen');
         INSERT INTO PERSON (DBID, NAME, AGE, HOME) VALUES
             (10, 'Ann', 41, 1), (11, 'Bob', 35, 2), (12, 'Cid', 41, 1), (13, 'Dag', 29, NULL);";

    const OR_BOB_OR_OSLO: &str = r#"
search: Person
clauses:
  - or:
      - selector: { example: bob }
      - selector: { example: lives_in_oslo }
"#;

    fn setup() -> Fixture {
        setup_with(ROWS)
    }

    fn setup_with(rows: &str) -> Fixture {
        let catalog = TypeCatalog::from_yaml_str(CATALOG).unwrap();
        let loaded = load_fixture_str(&catalog, FIXTURE).unwrap();
        let conn = Connection::open_in_memory().unwrap();

        for class in ["Address", "Person"] {
            let columns = wanted_columns(&catalog, class, &SqliteDialect).unwrap();
            let defs: Vec<String> = columns
                .iter()
                .map(|c| format!("{} {}", c.name, c.sql_type))
                .collect();
            let table = SqliteDialect.table_name(class);
            conn.execute(&format!("CREATE TABLE {} ({})", table, defs.join(", ")), [])
                .unwrap();
        }

        conn.execute_batch(rows).unwrap();

        Fixture {
            catalog,
            loaded,
            conn,
        }
    }

    fn ids(conn: &Connection, statement: &RenderedStatement) -> Vec<i64> {
        let params: Vec<SqlValue> = statement.params.iter().map(sql_value).collect();
        let mut stmt = conn.prepare(&statement.sql).unwrap();
        let rows = stmt
            .query_map(params_from_iter(params), |row| row.get::<_, i64>(0))
            .unwrap();
        rows.collect::<Result<Vec<_>, _>>().unwrap()
    }

    fn run(fixture: &Fixture, document: &str) -> Vec<i64> {
        let doc = QueryDocument::from_yaml_str(document).unwrap();
        let clauses = doc.clauses(&fixture.loaded).unwrap();
        let builder = QueryBuilder::new(&fixture.catalog, &SqliteDialect, &fixture.loaded.graph);
        let plan = builder.generate(&doc.search, &clauses, doc.add_joins).unwrap();
        let statement = plan.to_sql(&SqliteDialect);
        let mut found = ids(&fixture.conn, &statement);
        if !document.contains("sorters") {
            found.sort_unstable();
        }
        found
    }

    fn aggregate<T: FromSql>(
        fixture: &Fixture,
        function: AggregateFunction,
        property: &str,
        document: &str,
    ) -> T {
        let doc = QueryDocument::from_yaml_str(document).unwrap();
        let clauses = doc.clauses(&fixture.loaded).unwrap();
        let builder = QueryBuilder::new(&fixture.catalog, &SqliteDialect, &fixture.loaded.graph);
        let (plan, _) = builder
            .aggregate(&doc.search, function, property, &clauses)
            .unwrap();
        let statement = plan.to_sql(&SqliteDialect);
        let params: Vec<SqlValue> = statement.params.iter().map(sql_value).collect();
        fixture
            .conn
            .query_row(&statement.sql, params_from_iter(params), |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_scalar_example_matches_rows() {
        let fixture = setup();
        let found = run(
            &fixture,
            "search: Person\nclauses:\n  - selector: { example: aged_41 }\n",
        );
        assert_eq!(found, vec![10, 12]);
    }

    #[test]
    fn test_nested_example_follows_reference_column() {
        let fixture = setup();
        let found = run(
            &fixture,
            "search: Person\nclauses:\n  - selector: { example: lives_in_oslo }\n",
        );
        assert_eq!(found, vec![10, 12]);
    }

    #[test]
    fn test_or_group_with_sorting_and_limit() {
        let fixture = setup();
        let document = r#"
search: Person
clauses:
  - or:
      - selector: { example: bob }
      - selector: { example: lives_in_oslo }
  - order:
      limit: 2
      sorters: [{ direction: desc, example: by_name }]
"#;
        assert_eq!(run(&fixture, document), vec![12, 11]);
    }

    #[test]
    fn test_like_operator() {
        let fixture = setup();
        let found = run(
            &fixture,
            "search: Person\nclauses:\n  - selector: { example: pattern, operator: like }\n",
        );
        // SQLite LIKE is case-insensitive for ASCII
        assert_eq!(found, vec![10, 13]);
    }

    #[test]
    fn test_average_over_matching_rows() {
        let fixture = setup();
        let doc = QueryDocument::from_yaml_str(
            "search: Person\nclauses:\n  - selector: { example: lives_in_oslo }\n",
        )
        .unwrap();
        let clauses = doc.clauses(&fixture.loaded).unwrap();
        let builder = QueryBuilder::new(&fixture.catalog, &SqliteDialect, &fixture.loaded.graph);
        let (_, fragment) = builder
            .aggregate("Person", AggregateFunction::Avg, "age", &clauses)
            .unwrap();
        assert_eq!(fragment.return_type.to_string(), "double");

        let avg: f64 = aggregate(
            &fixture,
            AggregateFunction::Avg,
            "age",
            "search: Person\nclauses:\n  - selector: { example: lives_in_oslo }\n",
        );
        assert!((avg - 41.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_or_branch_over_empty_table_keeps_other_branch() {
        let fixture = setup_with("INSERT INTO PERSON (DBID, NAME, AGE, HOME) VALUES (11, 'Bob', 35, NULL);");
        assert_eq!(run(&fixture, OR_BOB_OR_OSLO), vec![11]);
    }

    #[test]
    fn test_aggregates_count_each_matching_row_once() {
        let fixture = setup_with(
            "INSERT INTO ADDRESS (DBID, CITY, STREET) VALUES
                 (1, 'Oslo', 'Storgata'), (2, 'Bergen', 'Bryggen'), (3, 'Tromso', 'Storgata');
             INSERT INTO PERSON (DBID, NAME, AGE, HOME) VALUES (11, 'Bob', 35, 2);",
        );
        let sum: i64 = aggregate(&fixture, AggregateFunction::Sum, "age", OR_BOB_OR_OSLO);
        let count: i64 = aggregate(&fixture, AggregateFunction::Count, "age", OR_BOB_OR_OSLO);
        assert_eq!(sum, 35);
        assert_eq!(count, 1);
    }
}
