//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::pipeline::{ingest, IngestOptions};
    use crate::store::TransactionStore;
    use crate::test_utils::{message, parsed_transaction, GPAY_PAYMENT, HDFC_DEBIT, OTP};

    const WINDOW: i64 = 300_000;

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.count_transactions().unwrap(), 0);
        assert!(!db.is_encrypted().unwrap());
    }

    #[test]
    fn test_transactions_schema_exists() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        let result: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('transactions') WHERE name IN \
                 ('id', 'amount', 'recipient', 'merchant_name', 'date_time', 'transaction_id', \
                  'payment_method', 'category', 'notes', 'is_categorized', 'sms_content', \
                  'sender', 'confidence', 'sms_hash', 'created_at', 'updated_at')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(result, 16, "transactions table should have 16 expected columns");

        let result: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('categories') WHERE name IN \
                 ('id', 'name', 'color', 'icon', 'is_default', 'created_at')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(result, 6, "categories table should have 6 expected columns");
    }

    #[test]
    fn test_insert_and_get_transaction() {
        let db = Database::in_memory().unwrap();
        let parsed = parsed_transaction(150.0, Some("ZOMATO"), None, 1_700_000_000_000);

        let id = db.insert_transaction(&NewTransaction::from(&parsed)).unwrap();
        let id = id.expect("first insert should write a row");

        let stored = db.get_transaction(id).unwrap().unwrap();
        assert!((stored.amount - 150.0).abs() < 0.01);
        assert_eq!(stored.merchant_name.as_deref(), Some("ZOMATO"));
        assert_eq!(stored.date_time, 1_700_000_000_000);
        assert_eq!(stored.payment_method, PaymentMethod::Upi);
        assert!(!stored.categorized);
        assert!(stored.category.is_none());

        assert!(db.get_transaction(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_reimport_is_ignored() {
        let db = Database::in_memory().unwrap();
        let tx = NewTransaction::from(&parsed_transaction(99.0, Some("UBER"), None, 0));

        let first = db.insert_transaction(&tx).unwrap();
        assert!(first.is_some());
        assert_eq!(db.insert_transaction(&tx).unwrap(), None);
        assert_eq!(db.count_transactions().unwrap(), 1);
        assert_eq!(db.find_by_sms_hash(&tx.sms_hash).unwrap(), first);
    }

    #[test]
    fn test_store_insert_returns_existing_id() {
        let db = Database::in_memory().unwrap();
        let parsed = parsed_transaction(99.0, Some("UBER"), None, 0);

        let id = TransactionStore::insert(&db, &parsed).unwrap();
        let again = TransactionStore::insert(&db, &parsed).unwrap();
        assert_eq!(id, again);
        assert_eq!(db.count_transactions().unwrap(), 1);
    }

    #[test]
    fn test_batch_insert_skips_invalid_and_stored() {
        let db = Database::in_memory().unwrap();
        let existing = parsed_transaction(10.0, Some("CAFE"), None, 0);
        db.insert(&existing).unwrap();

        let batch = vec![
            existing.clone(),
            parsed_transaction(20.0, Some("BAKERY"), None, 0),
            parsed_transaction(0.0, Some("NOTHING"), None, 0),
            parsed_transaction(30.0, None, None, 0),
            parsed_transaction(40.0, None, Some("a@okaxis"), 0),
        ];
        let ids = db.batch_insert(&batch).unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(db.count_transactions().unwrap(), 3);
    }

    #[test]
    fn test_find_duplicate_candidate() {
        let db = Database::in_memory().unwrap();
        db.insert(&parsed_transaction(150.0, Some("ZOMATO"), None, 1_000_000))
            .unwrap();
        db.insert(&parsed_transaction(150.0, None, Some("a@okaxis"), 1_000_000))
            .unwrap();

        // Case-insensitive merchant, inside the window
        let found = db
            .find_duplicate_candidate(150.004, None, Some("zomato"), 1_060_000, WINDOW)
            .unwrap()
            .unwrap();
        assert_eq!(found.merchant_name.as_deref(), Some("ZOMATO"));

        // Recipient match
        let found = db
            .find_duplicate_candidate(150.0, Some("A@OKAXIS"), None, 1_000_000, WINDOW)
            .unwrap()
            .unwrap();
        assert_eq!(found.recipient.as_deref(), Some("a@okaxis"));

        // Window edge is inclusive
        assert!(db
            .find_duplicate_candidate(150.0, None, Some("ZOMATO"), 1_000_000 + WINDOW, WINDOW)
            .unwrap()
            .is_some());
        assert!(db
            .find_duplicate_candidate(150.0, None, Some("ZOMATO"), 1_000_001 + WINDOW, WINDOW)
            .unwrap()
            .is_none());

        // Amount outside tolerance, unknown counterparty, no counterparty
        assert!(db
            .find_duplicate_candidate(150.02, None, Some("ZOMATO"), 1_000_000, WINDOW)
            .unwrap()
            .is_none());
        assert!(db
            .find_duplicate_candidate(150.0, None, Some("SWIGGY"), 1_000_000, WINDOW)
            .unwrap()
            .is_none());
        assert!(db
            .find_duplicate_candidate(150.0, None, None, 1_000_000, WINDOW)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_find_duplicate_candidate_prefers_closest() {
        let db = Database::in_memory().unwrap();
        db.insert(&parsed_transaction(99.0, Some("UBER"), None, 0)).unwrap();
        let near = db
            .insert(&parsed_transaction(99.0, Some("UBER"), None, 100_000))
            .unwrap();

        let found = db
            .find_duplicate_candidate(99.0, None, Some("UBER"), 90_000, WINDOW)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, near);
    }

    #[test]
    fn test_list_transactions_newest_first() {
        let db = Database::in_memory().unwrap();
        for (i, t) in [0_i64, 5_000, 2_000].iter().enumerate() {
            db.insert(&parsed_transaction(10.0 + i as f64, Some("CAFE"), None, *t))
                .unwrap();
        }

        let all = db.list_transactions(10, 0).unwrap();
        let times: Vec<i64> = all.iter().map(|t| t.date_time).collect();
        assert_eq!(times, vec![5_000, 2_000, 0]);

        let page = db.list_transactions(1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].date_time, 2_000);
    }

    #[test]
    fn test_categorize_and_uncategorize() {
        let db = Database::in_memory().unwrap();
        let id = db
            .insert(&parsed_transaction(500.0, Some("ZOMATO"), None, 0))
            .unwrap();
        assert_eq!(db.count_uncategorized().unwrap(), 1);

        db.categorize_transaction(id, "Food & Dining", Some("team lunch"))
            .unwrap();
        let tx = db.get_transaction(id).unwrap().unwrap();
        assert!(tx.categorized);
        assert_eq!(tx.category.as_deref(), Some("Food & Dining"));
        assert_eq!(tx.notes.as_deref(), Some("team lunch"));
        assert_eq!(db.count_uncategorized().unwrap(), 0);
        assert!(db.list_uncategorized(10).unwrap().is_empty());

        db.uncategorize_transaction(id).unwrap();
        let tx = db.get_transaction(id).unwrap().unwrap();
        assert!(!tx.categorized);
        assert!(tx.category.is_none());
        assert_eq!(db.list_uncategorized(10).unwrap().len(), 1);
    }

    #[test]
    fn test_categorize_not_found() {
        let db = Database::in_memory().unwrap();
        let id = db
            .insert(&parsed_transaction(500.0, Some("ZOMATO"), None, 0))
            .unwrap();

        assert!(matches!(
            db.categorize_transaction(id, "Nonexistent", None),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            db.categorize_transaction(id + 1, "Shopping", None),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            db.uncategorize_transaction(id + 1),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_spending_totals() {
        let db = Database::in_memory().unwrap();
        let food = db
            .insert(&parsed_transaction(500.0, Some("ZOMATO"), None, 1_000))
            .unwrap();
        let food2 = db
            .insert(&parsed_transaction(250.0, Some("SWIGGY"), None, 2_000))
            .unwrap();
        db.insert(&parsed_transaction(100.0, Some("UBER"), None, 3_000))
            .unwrap();
        db.insert(&parsed_transaction(999.0, Some("AMAZON"), None, 10_000))
            .unwrap();
        db.categorize_transaction(food, "Food & Dining", None).unwrap();
        db.categorize_transaction(food2, "Food & Dining", None).unwrap();

        let total = db.total_amount_between(0, 5_000).unwrap();
        assert!((total - 850.0).abs() < 0.01);
        assert!(db.total_amount_between(20_000, 30_000).unwrap().abs() < 0.01);

        let spending = db.category_spending_between(0, 5_000).unwrap();
        assert_eq!(spending.len(), 2);
        assert_eq!(spending[0].category.as_deref(), Some("Food & Dining"));
        assert!((spending[0].total - 750.0).abs() < 0.01);
        assert_eq!(spending[0].count, 2);
        assert_eq!(spending[1].category, None);
        assert_eq!(spending[1].count, 1);
    }

    #[test]
    fn test_default_categories_seeded_once() {
        let db = Database::in_memory().unwrap();
        let categories = db.list_categories().unwrap();
        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
        assert!(categories.iter().all(|c| c.is_default));

        // Opening again must not duplicate the defaults
        assert_eq!(db.seed_default_categories().unwrap(), 0);
        let reopened = Database::new_unencrypted(db.path()).unwrap();
        assert_eq!(
            reopened.list_categories().unwrap().len(),
            DEFAULT_CATEGORIES.len()
        );
    }

    #[test]
    fn test_add_category() {
        let db = Database::in_memory().unwrap();
        let id = db.add_category("Pets", "#A1B2C3", Some("🐾")).unwrap();
        assert!(id > 0);

        let pets = db.get_category_by_name("pets").unwrap().unwrap();
        assert_eq!(pets.name, "Pets");
        assert!(!pets.is_default);
        assert!(pets.can_be_deleted());

        // User categories sort after the defaults
        let categories = db.list_categories().unwrap();
        assert_eq!(categories.last().map(|c| c.name.as_str()), Some("Pets"));

        assert!(matches!(
            db.add_category("PETS", "#FFF", None),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            db.add_category("Garden", "green", None),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            db.add_category("", "#FFF", None),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            db.add_category(&"x".repeat(51), "#FFF", None),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_delete_category_rules() {
        let db = Database::in_memory().unwrap();

        assert!(matches!(
            db.delete_category("Shopping"),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            db.delete_category("Nonexistent"),
            Err(Error::NotFound(_))
        ));

        db.add_category("Pets", "#ABC", None).unwrap();
        let id = db
            .insert(&parsed_transaction(300.0, Some("PETSHOP"), None, 0))
            .unwrap();
        db.categorize_transaction(id, "Pets", None).unwrap();
        assert!(matches!(
            db.delete_category("Pets"),
            Err(Error::InvalidData(_))
        ));

        db.uncategorize_transaction(id).unwrap();
        db.delete_category("Pets").unwrap();
        assert!(db.get_category_by_name("Pets").unwrap().is_none());
    }

    #[test]
    fn test_categorize_stores_canonical_name() {
        let db = Database::in_memory().unwrap();
        db.add_category("Groceries", "#4CAF50", None).unwrap();
        let id = db
            .insert(&parsed_transaction(420.0, Some("BIGBASKET"), None, 0))
            .unwrap();

        db.categorize_transaction(id, "groceries", None).unwrap();
        let tx = db.get_transaction(id).unwrap().unwrap();
        assert_eq!(tx.category.as_deref(), Some("Groceries"));

        // Still in use, whatever case the caller types
        assert!(matches!(
            db.delete_category("GROCERIES"),
            Err(Error::InvalidData(_))
        ));
        assert!(db.get_category_by_name("Groceries").unwrap().is_some());
    }

    #[test]
    fn test_ingest_into_database() {
        let db = Database::in_memory().unwrap();
        let config = PipelineConfig::default();
        let messages = vec![
            message(1, "HDFCBK", HDFC_DEBIT, 0),
            message(2, "AMAZON", OTP, 1_000),
            message(3, "GPAY", GPAY_PAYMENT, 10_000),
        ];

        let result = ingest(&messages, &db, &config, &IngestOptions::default(), None).unwrap();
        assert_eq!(result.report.inserted, 2);
        assert_eq!(result.inserted_ids.len(), 2);
        assert_eq!(db.count_transactions().unwrap(), 2);

        let again = ingest(&messages, &db, &config, &IngestOptions::default(), None).unwrap();
        assert_eq!(again.report.store_duplicates, 2);
        assert_eq!(again.report.inserted, 0);
        assert_eq!(db.count_transactions().unwrap(), 2);
    }

    #[test]
    fn test_encryption_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encrypted.db");
        let path = path.to_string_lossy();

        let db = Database::new_with_key(&path, Some("correct horse")).unwrap();
        db.insert(&parsed_transaction(42.0, Some("CAFE"), None, 0))
            .unwrap();
        assert!(db.is_encrypted().unwrap());
        drop(db);

        let reopened = Database::new_with_key(&path, Some("correct horse")).unwrap();
        assert_eq!(reopened.count_transactions().unwrap(), 1);

        assert!(Database::new_with_key(&path, Some("wrong passphrase")).is_err());
    }
}
