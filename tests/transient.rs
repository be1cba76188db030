#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use ladle::{
        CancelToken, EnumEncoding, Executor, SqlWriter, TransientTable, Value, record, sql_enum,
    };
    use ladle_mem::{MemConnection, MemSqlWriter};
    use rust_decimal::Decimal;
    use std::time::Duration;
    use time::{Date, Month, PrimitiveDateTime, Time, UtcOffset};
    use uuid::Uuid;

    sql_enum! {
        pub enum Category {
            Beverages = 1,
            Produce = 2,
            Seafood = 8,
        }
    }

    record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Shipment {
            pub shipment_id: i64,
            pub destination: String,
            pub category: Category,
            pub weight: Option<f64>,
        }
    }

    fn shipments() -> Vec<Shipment> {
        vec![
            Shipment {
                shipment_id: 1,
                destination: "Reykjavik".into(),
                category: Category::Seafood,
                weight: Some(412.5),
            },
            Shipment {
                shipment_id: 2,
                destination: "Oslo".into(),
                category: Category::Produce,
                weight: None,
            },
        ]
    }

    #[test]
    fn scalar_schema_inference() {
        let table = TransientTable::from_scalars("ids", [3_i64, 5, 8], EnumEncoding::Text);
        let columns = table.columns();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].name, "Value");
        assert!(columns[0].ty.same_type(&Value::Int64(None)));
        assert_eq!(columns[0].width, None);
        assert!(!columns[0].needs_collation);
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn text_columns_size_to_the_widest_payload() {
        let table = TransientTable::from_scalars(
            "names",
            ["ab".to_string(), "abcdef".into(), "a".into()],
            EnumEncoding::Text,
        );
        let columns = table.columns();
        assert!(columns[0].ty.same_type(&Value::Varchar(None)));
        assert_eq!(columns[0].width, Some(6));
        assert!(columns[0].needs_collation);
        // An empty sequence still declares a valid single character type.
        let empty = TransientTable::from_scalars("names", Vec::<String>::new(), EnumEncoding::Text);
        assert_eq!(empty.columns()[0].width, Some(1));
        assert_eq!(empty.row_count(), 0);
    }

    #[test]
    fn record_schema_follows_fields_and_encoding() {
        let text = TransientTable::from_records("shipments", shipments(), EnumEncoding::Text);
        let columns = text.columns();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].name, "shipment_id");
        assert!(columns[0].ty.same_type(&Value::Int64(None)));
        assert!(columns[1].needs_collation);
        assert_eq!(columns[1].width, Some(9));
        assert!(columns[2].ty.same_type(&Value::Varchar(None)));
        assert_eq!(columns[2].width, Some(7));
        assert!(columns[3].ty.same_type(&Value::Float64(None)));

        let integer = TransientTable::from_records("shipments", shipments(), EnumEncoding::Integer);
        let category = &integer.columns()[2];
        assert!(category.ty.same_type(&Value::Int64(None)));
        assert_eq!(category.width, None);
        assert!(!category.needs_collation);
    }

    #[test]
    fn create_table_rendition_includes_widths_and_collation() {
        let writer = MemSqlWriter::default();
        let table = TransientTable::from_records("shipments", shipments(), EnumEncoding::Text);
        let mut sql = String::new();
        writer.write_create_transient_table(&mut sql, table.name(), table.columns(), Some("NOCASE"));
        assert_eq!(
            sql,
            "CREATE TABLE \"shipments\" (\
             \"shipment_id\" BIGINT, \
             \"destination\" VARCHAR(9) COLLATE NOCASE, \
             \"category\" VARCHAR(7) COLLATE NOCASE, \
             \"weight\" DOUBLE)"
        );
        let mut drop = String::new();
        writer.write_drop_transient_table(&mut drop, table.name());
        assert_eq!(drop, "DROP TABLE IF EXISTS \"shipments\"");
    }

    #[test]
    fn oversized_text_columns_degrade_to_max() {
        let writer = MemSqlWriter::default();
        let mut sql = String::new();
        writer.write_text_type(&mut sql, 4000);
        assert_eq!(sql, "VARCHAR(4000)");
        sql.clear();
        writer.write_text_type(&mut sql, 4001);
        assert_eq!(sql, "VARCHAR(MAX)");
    }

    #[tokio::test]
    async fn provision_creates_loads_and_drops() {
        let mut connection = MemConnection::open("mem://transient");
        let token = CancelToken::new();
        let table = TransientTable::from_scalars("ids", [3_i64, 5, 8], EnumEncoding::Text);
        let mut guard = table.provision(&mut connection, &token).await.unwrap();
        assert!(connection.has_table("ids"));
        let rows: Vec<(i64,)> = connection
            .fetch_as::<(i64,)>("SELECT * FROM \"ids\"".into(), &token)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(rows, vec![(3,), (5,), (8,)]);
        guard.dispose(&mut connection).await.unwrap();
        assert!(!connection.has_table("ids"));
        assert!(guard.is_disposed());
        // A second disposal is a no-op, even though the table is long gone.
        guard.dispose(&mut connection).await.unwrap();
    }

    #[tokio::test]
    async fn provision_of_an_empty_sequence_creates_the_table() {
        let mut connection = MemConnection::open("mem://transient-empty");
        let token = CancelToken::new();
        let table = TransientTable::from_scalars("ids", Vec::<i64>::new(), EnumEncoding::Text);
        let mut guard = table.provision(&mut connection, &token).await.unwrap();
        assert!(connection.has_table("ids"));
        let first: Option<(i64,)> = connection
            .fetch_one_as::<(i64,)>("SELECT * FROM \"ids\"".into(), &token)
            .await
            .unwrap();
        assert_eq!(first, None);
        guard.dispose(&mut connection).await.unwrap();
    }

    #[tokio::test]
    async fn records_round_trip_in_both_encodings() {
        for encoding in [EnumEncoding::Text, EnumEncoding::Integer] {
            let mut connection = MemConnection::open("mem://round-trip");
            let token = CancelToken::new();
            let table = TransientTable::from_records("shipments", shipments(), encoding);
            let mut guard = table.provision(&mut connection, &token).await.unwrap();
            let rows: Vec<Shipment> = connection
                .fetch_as("SELECT * FROM \"shipments\"".into(), &token)
                .try_collect()
                .await
                .unwrap();
            assert_eq!(rows, shipments());
            guard.dispose(&mut connection).await.unwrap();
        }
    }

    #[tokio::test]
    async fn scalar_values_round_trip() {
        let date = Date::from_calendar_date(2024, Month::May, 17).unwrap();
        let timestamp = PrimitiveDateTime::new(date, Time::from_hms(8, 30, 0).unwrap());
        let id = Uuid::new_v4();
        let mut connection = MemConnection::open("mem://scalars");
        let token = CancelToken::new();

        async fn round_trip<T>(connection: &mut MemConnection, token: &CancelToken, values: Vec<T>)
        where
            T: ladle::AsValue + Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static,
        {
            let table =
                TransientTable::from_scalars("scratch", values.clone(), EnumEncoding::Text);
            let mut guard = table.provision(connection, token).await.unwrap();
            let rows: Vec<(T,)> = connection
                .fetch_as::<(T,)>("SELECT * FROM \"scratch\"".into(), token)
                .try_collect()
                .await
                .unwrap();
            assert_eq!(rows.into_iter().map(|(v,)| v).collect::<Vec<_>>(), values);
            guard.dispose(connection).await.unwrap();
        }

        round_trip(&mut connection, &token, vec![true, false]).await;
        round_trip(&mut connection, &token, vec![-7_i16, 12]).await;
        round_trip(&mut connection, &token, vec![0.5_f64, -2.25]).await;
        round_trip(&mut connection, &token, vec![Decimal::new(1999, 2)]).await;
        round_trip(&mut connection, &token, vec!['x', 'y']).await;
        round_trip(&mut connection, &token, vec![date]).await;
        round_trip(&mut connection, &token, vec![timestamp.time()]).await;
        round_trip(&mut connection, &token, vec![timestamp]).await;
        round_trip(
            &mut connection,
            &token,
            vec![timestamp.assume_offset(UtcOffset::from_hms(2, 0, 0).unwrap())],
        )
        .await;
        round_trip(&mut connection, &token, vec![Duration::from_millis(90_250)]).await;
        round_trip(&mut connection, &token, vec![id]).await;
        round_trip(&mut connection, &token, vec![Category::Seafood, Category::Produce]).await;
    }

    #[tokio::test]
    async fn provision_fails_once_cancelled() {
        let mut connection = MemConnection::open("mem://cancelled");
        let token = CancelToken::new();
        let _registration = connection.register_cancel(&token);
        token.cancel();
        let table = TransientTable::from_scalars("ids", [1_i64], EnumEncoding::Text);
        let error = table.provision(&mut connection, &token).await.unwrap_err();
        assert!(error.downcast_ref::<ladle::Cancelled>().is_some());
        assert!(!connection.has_table("ids"));
    }
}
