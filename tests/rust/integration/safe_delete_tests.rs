//! Safe deletion through the SQLite edge table
//!
//! References are recorded with `ProtectionManager::flush` inside a
//! transaction, then the guard decides what a delete may take along.

#[cfg(test)]
mod safe_delete_tests {
    use objmap::protection::{
        ProtectionEntry, ProtectionManager, ProtectionStack, SqliteEdgeStore,
    };
    use rusqlite::Connection;

    fn entry(table: &str, id: i64) -> ProtectionEntry {
        ProtectionEntry::new(table, id)
    }

    fn edge_count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    /// ORDER#1 owns LINE#1 and LINE#2; INVOICE#1 also refers to LINE#2
    fn record_orders(manager: &mut ProtectionManager<SqliteEdgeStore<'_>>) {
        let mut order = ProtectionStack::new(entry("ORDER_T", 1));
        order
            .push(entry("LINE", 1), Some("Line"), Some("lines"))
            .push(entry("LINE", 2), Some("Line"), Some("lines"))
            .push(entry("LINE", 2), Some("Line"), Some("lines"));
        assert_eq!(manager.flush(order, false).unwrap(), 2);

        let mut invoice = ProtectionStack::new(entry("INVOICE", 1));
        invoice.push(entry("LINE", 2), Some("Line"), Some("billed"));
        assert_eq!(manager.flush(invoice, false).unwrap(), 1);
    }

    #[test]
    fn test_delete_takes_exclusively_owned_rows_only() {
        let mut conn = Connection::open_in_memory().unwrap();
        let tx = conn.transaction().unwrap();
        {
            let store = SqliteEdgeStore::new(&tx);
            store.create_table().unwrap();
            let mut manager = ProtectionManager::new(store);
            record_orders(&mut manager);

            let line = manager.check(entry("LINE", 2)).unwrap();
            assert!(!line.is_deletable());
            assert!(line.survivors().is_empty());

            let set = manager.delete_if_safe(entry("ORDER_T", 1)).unwrap();
            assert!(set.is_deletable());
            assert_eq!(set.closure().len(), 3);
            assert_eq!(set.survivors(), &[entry("ORDER_T", 1), entry("LINE", 1)]);
        }
        assert_eq!(edge_count(&tx, "HAS_A"), 1);
        tx.commit().unwrap();

        // Only the invoice still holds LINE#2
        let store = SqliteEdgeStore::new(&conn);
        let manager = ProtectionManager::new(store);
        assert!(manager.check(entry("INVOICE", 1)).unwrap().is_deletable());
        assert!(!manager.check(entry("LINE", 2)).unwrap().is_deletable());
    }

    #[test]
    fn test_pin_protects_until_unpinned() {
        let conn = Connection::open_in_memory().unwrap();
        let store = SqliteEdgeStore::with_table(&conn, "EDGES").unwrap();
        store.create_table().unwrap();
        let mut manager = ProtectionManager::new(store);

        let customer = entry("CUSTOMER", 5);
        assert!(manager.pin(customer.clone()).unwrap());
        assert!(!manager.pin(customer.clone()).unwrap());
        assert_eq!(edge_count(&conn, "EDGES"), 1);

        let set = manager.delete_if_safe(customer.clone()).unwrap();
        assert!(!set.is_deletable());

        assert_eq!(manager.unpin(&customer).unwrap(), 1);
        assert!(manager.delete_if_safe(customer).unwrap().is_deletable());
    }

    #[test]
    fn test_rolled_back_delete_keeps_edges() {
        let mut conn = Connection::open_in_memory().unwrap();
        SqliteEdgeStore::new(&conn).create_table().unwrap();
        {
            let mut manager = ProtectionManager::new(SqliteEdgeStore::new(&conn));
            record_orders(&mut manager);
        }

        let tx = conn.transaction().unwrap();
        {
            let mut manager = ProtectionManager::new(SqliteEdgeStore::new(&tx));
            assert!(manager.delete_if_safe(entry("ORDER_T", 1)).unwrap().is_deletable());
        }
        assert_eq!(edge_count(&tx, "HAS_A"), 1);
        tx.rollback().unwrap();

        assert_eq!(edge_count(&conn, "HAS_A"), 3);
    }

    #[test]
    fn test_reflush_of_saved_owner_adds_only_new_edges() {
        let conn = Connection::open_in_memory().unwrap();
        let store = SqliteEdgeStore::new(&conn);
        store.create_table().unwrap();
        let mut manager = ProtectionManager::new(store);
        record_orders(&mut manager);

        let mut order = ProtectionStack::new(entry("ORDER_T", 1));
        order
            .push(entry("LINE", 1), Some("Line"), Some("lines"))
            .push(entry("LINE", 3), Some("Line"), Some("lines"));
        assert_eq!(manager.flush(order, true).unwrap(), 1);
        assert_eq!(edge_count(&conn, "HAS_A"), 4);
    }

    #[test]
    fn test_invalid_edge_table_name_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(SqliteEdgeStore::with_table(&conn, "has a; drop").is_err());
    }
}
