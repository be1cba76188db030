#[cfg(test)]
mod tests {
    use futures::{StreamExt, TryStreamExt};
    use ladle::{
        CancelToken, Cancelled, EnumEncoding, RowsAffected, Statement, TransientTable, blocking,
        execute_statement, fetch_statement, record,
    };
    use ladle_mem::MemConnection;
    use std::pin::pin;

    record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Product {
            pub product_id: i64,
            pub name: String,
            pub units_in_stock: Option<i32>,
        }
    }

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn products() -> Vec<Product> {
        vec![
            Product {
                product_id: 1,
                name: "Chai".into(),
                units_in_stock: Some(39),
            },
            Product {
                product_id: 2,
                name: "Chang".into(),
                units_in_stock: None,
            },
            Product {
                product_id: 3,
                name: "Aniseed Syrup".into(),
                units_in_stock: Some(13),
            },
        ]
    }

    fn lookup_statement() -> Statement {
        Statement::new("SELECT * FROM \"products_lookup\"").table(TransientTable::from_records(
            "products_lookup",
            products(),
            EnumEncoding::Text,
        ))
    }

    #[tokio::test]
    async fn fetch_provisions_streams_and_tears_down() {
        init();
        let mut connection = MemConnection::open("mem://fetch");
        let rows: Vec<Product> = fetch_statement(&mut connection, lookup_statement(), CancelToken::new())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(rows, products());
        assert!(!connection.has_table("products_lookup"));
    }

    #[tokio::test]
    async fn fetch_as_tuples() {
        init();
        let mut connection = MemConnection::open("mem://tuples");
        let statement = Statement::new("SELECT * FROM \"ids\"")
            .table(TransientTable::from_scalars("ids", [5_i64, 7], EnumEncoding::Text));
        let rows: Vec<(i64,)> =
            fetch_statement::<(i64,), _>(&mut connection, statement, CancelToken::new())
                .try_collect()
                .await
                .unwrap();
        assert_eq!(rows, vec![(5,), (7,)]);
    }

    #[tokio::test]
    async fn parameters_go_through_the_prepared_path() {
        init();
        let mut connection = MemConnection::open("mem://params");
        let statement = lookup_statement().param("min_stock", 10_i32);
        let rows: Vec<Product> = fetch_statement(&mut connection, statement, CancelToken::new())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(!connection.has_table("products_lookup"));
    }

    #[tokio::test]
    async fn execute_runs_modify_statements() {
        init();
        let mut connection = MemConnection::open("mem://execute");
        let affected: RowsAffected = execute_statement(
            &mut connection,
            Statement::new("DROP TABLE IF EXISTS \"nothing\""),
            &CancelToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(affected.rows_affected, 0);
    }

    #[tokio::test]
    async fn failures_still_tear_the_tables_down() {
        init();
        let mut connection = MemConnection::open("mem://failing");
        let statement = Statement::new("SELECT * FROM \"missing\"").table(
            TransientTable::from_records("products_lookup", products(), EnumEncoding::Text),
        );
        let result: Result<Vec<Product>, _> =
            fetch_statement(&mut connection, statement, CancelToken::new())
                .try_collect()
                .await;
        let error = result.unwrap_err();
        assert!(error.to_string().contains("does not exist"));
        assert!(error.downcast_ref::<Cancelled>().is_none());
        assert!(!connection.has_table("products_lookup"));
    }

    #[tokio::test]
    async fn shape_mismatches_surface_after_teardown() {
        init();
        let mut connection = MemConnection::open("mem://mismatch");
        let statement = Statement::new("SELECT * FROM \"ids\"")
            .table(TransientTable::from_scalars("ids", [5_i64], EnumEncoding::Text));
        // Two positional fields against a single column cursor.
        let result: Result<Vec<(i64, i64)>, _> =
            fetch_statement::<(i64, i64), _>(&mut connection, statement, CancelToken::new())
                .try_collect()
                .await;
        assert!(result.is_err());
        assert!(!connection.has_table("ids"));
    }

    #[tokio::test]
    async fn cancellation_before_the_run_is_uniform() {
        init();
        let mut connection = MemConnection::open("mem://cancel-early");
        let token = CancelToken::new();
        token.cancel();
        let result: Result<Vec<Product>, _> =
            fetch_statement(&mut connection, lookup_statement(), token)
                .try_collect()
                .await;
        let error = result.unwrap_err();
        assert!(error.downcast_ref::<Cancelled>().is_some(), "got: {error:#}");
        // Nothing stays behind, whichever stage observed the abort.
        assert!(connection.table_names().is_empty());
    }

    #[tokio::test]
    async fn cancellation_mid_stream_is_uniform() {
        init();
        let mut connection = MemConnection::open("mem://cancel-mid");
        let token = CancelToken::new();
        {
            let mut rows = pin!(fetch_statement::<Product, _>(
                &mut connection,
                lookup_statement(),
                token.clone(),
            ));
            let first = rows.next().await.unwrap().unwrap();
            assert_eq!(first.product_id, 1);
            token.cancel();
            let error = rows.next().await.unwrap().unwrap_err();
            assert!(error.downcast_ref::<Cancelled>().is_some(), "got: {error:#}");
            assert!(rows.next().await.is_none());
        }
        assert!(connection.table_names().is_empty());
    }

    #[test]
    fn blocking_wrappers_drive_the_pipeline() {
        init();
        let mut connection = MemConnection::open("mem://blocking");
        let rows: Vec<Product> =
            blocking::fetch_statement(&mut connection, lookup_statement(), CancelToken::new())
                .unwrap();
        assert_eq!(rows, products());
        assert!(!connection.has_table("products_lookup"));
        let affected = blocking::execute_statement(
            &mut connection,
            Statement::new("DROP TABLE IF EXISTS \"nothing\""),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(affected.rows_affected, 0);
    }

    #[test]
    fn blocking_provision_hands_out_a_guard() {
        init();
        let mut connection = MemConnection::open("mem://blocking-provision");
        let token = CancelToken::new();
        let table = TransientTable::from_scalars("ids", [1_i64, 2], EnumEncoding::Text);
        let mut guard = blocking::provision(&mut connection, table, &token).unwrap();
        assert!(connection.has_table("ids"));
        guard.dispose_blocking(&mut connection).unwrap();
        assert!(!connection.has_table("ids"));
    }
}
