//! Naming and rendering rules of the bundled dialects

#[cfg(test)]
mod dialect_tests {
    use objmap::dialect::{sanitize_identifier, Dialect, DialectKind};
    use objmap::type_catalog::ScalarKind;
    use test_case::test_case;

    #[test_case(DialectKind::Ansi, "com.acme.Person", "PERSON" ; "ansi strips package")]
    #[test_case(DialectKind::Ansi, "Order", "ORDER_T" ; "ansi reserved table")]
    #[test_case(DialectKind::Sqlite, "Pragma", "PRAGMA_T" ; "sqlite own keyword")]
    #[test_case(DialectKind::Ansi, "Pragma", "PRAGMA" ; "ansi allows sqlite keyword")]
    #[test_case(DialectKind::Sqlite, "ns::Line-Item", "LINE_ITEM" ; "sqlite sanitizes")]
    fn test_table_name(kind: DialectKind, class: &str, expected: &str) {
        assert_eq!(kind.dialect().table_name(class), expected);
    }

    #[test_case("name", "NAME" ; "plain")]
    #[test_case("key", "KEY_C" ; "reserved")]
    #[test_case("dbid", "DBID_C" ; "id column clash")]
    #[test_case("zip code", "ZIP_CODE" ; "space")]
    fn test_column_name(property: &str, expected: &str) {
        assert_eq!(DialectKind::Ansi.dialect().column_name(property), expected);
    }

    #[test]
    fn test_sanitize_leading_digit() {
        assert_eq!(sanitize_identifier("2nd"), "_2ND");
        assert_eq!(sanitize_identifier(""), "_");
    }

    #[test_case(DialectKind::Ansi, Some(5), Some(10), "LIMIT 5 OFFSET 10" ; "ansi both")]
    #[test_case(DialectKind::Ansi, None, Some(10), "OFFSET 10 ROWS" ; "ansi offset only")]
    #[test_case(DialectKind::Sqlite, None, Some(10), "LIMIT -1 OFFSET 10" ; "sqlite offset only")]
    #[test_case(DialectKind::Sqlite, Some(3), None, "LIMIT 3" ; "sqlite limit only")]
    fn test_limit_clause(kind: DialectKind, limit: Option<u64>, offset: Option<u64>, expected: &str) {
        assert_eq!(kind.dialect().limit_clause(limit, offset).as_deref(), Some(expected));
    }

    #[test]
    fn test_no_limit_clause_without_limit_or_offset() {
        assert_eq!(DialectKind::Sqlite.dialect().limit_clause(None, None), None);
    }

    #[test]
    fn test_numeric_casts() {
        assert_eq!(
            DialectKind::Ansi.dialect().cast_numeric("B.AGE", ScalarKind::Double),
            "CAST(B.AGE AS DOUBLE PRECISION)"
        );
        assert_eq!(
            DialectKind::Sqlite.dialect().cast_numeric("B.AGE", ScalarKind::Double),
            "CAST(B.AGE AS REAL)"
        );
        assert_eq!(
            DialectKind::Sqlite.dialect().cast_numeric("B.NAME", ScalarKind::Text),
            "B.NAME"
        );
    }

    #[test]
    fn test_dialect_kind_parses_case_insensitively() {
        assert_eq!("SQLite".parse::<DialectKind>().unwrap(), DialectKind::Sqlite);
        let err = "oracle".parse::<DialectKind>().unwrap_err();
        assert!(err.to_string().contains("oracle"));
    }
}
