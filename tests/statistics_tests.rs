mod common;

use cardinal_rs::dialects::{DatabaseProduct, Dialect};
use cardinal_rs::executor::connection::render_index_info_sql;
use cardinal_rs::executor::{ExecutionContext, IndexInfoRow};
use cardinal_rs::statistics::{
    to_sentinel, IndexMetadataStatisticsProvider, SqlCountStatisticsProvider, StatisticsError,
    StatisticsProvider, TableRef, UNKNOWN_CARDINALITY,
};
use common::FakeDataSource;
use std::error::Error;

fn mysql() -> Dialect {
    Dialect::new(DatabaseProduct::MySql, "8.0.34", None)
}

#[test]
fn test_table_statistic_takes_precedence() {
    let source = FakeDataSource::new("MySQL", "8.0.34").with_rows(vec![
        IndexInfoRow::index("ix_region", "region", true, 90),
        IndexInfoRow::table_statistic(100),
        IndexInfoRow::index("ix_date", "sold_on", true, 99),
    ]);

    let estimate = IndexMetadataStatisticsProvider
        .table_cardinality(&mysql(), &source, &TableRef::new("sales"), &ExecutionContext::new())
        .unwrap();
    assert_eq!(estimate, Some(100));
}

#[test]
fn test_max_non_unique_index_approximates_row_count() {
    let source = FakeDataSource::new("MySQL", "8.0.34").with_rows(vec![
        IndexInfoRow::index("ix_a", "a", true, 5),
        IndexInfoRow::index("ix_b", "b", true, 20),
        IndexInfoRow::index("pk", "id", false, 500),
        IndexInfoRow::index("ix_c", "c", true, 12),
    ]);

    let estimate = IndexMetadataStatisticsProvider
        .table_cardinality(&mysql(), &source, &TableRef::new("sales"), &ExecutionContext::new())
        .unwrap();
    assert_eq!(estimate, Some(20));
}

#[test]
fn test_unique_indexes_only_give_no_estimate() {
    let source = FakeDataSource::new("MySQL", "8.0.34").with_rows(vec![
        IndexInfoRow::index("pk", "id", false, 500),
        IndexInfoRow::index("uq_code", "code", false, 480),
    ]);

    let estimate = IndexMetadataStatisticsProvider
        .table_cardinality(&mysql(), &source, &TableRef::new("sales"), &ExecutionContext::new())
        .unwrap();
    assert_eq!(estimate, None);
    assert_eq!(to_sentinel(estimate), UNKNOWN_CARDINALITY);
}

#[test]
fn test_zero_rows_is_an_estimate_not_unknown() {
    let source = FakeDataSource::new("MySQL", "8.0.34").with_rows(vec![IndexInfoRow::table_statistic(0)]);

    let estimate = IndexMetadataStatisticsProvider
        .table_cardinality(&mysql(), &source, &TableRef::new("empty"), &ExecutionContext::new())
        .unwrap();
    assert_eq!(estimate, Some(0));
    assert_eq!(to_sentinel(estimate), 0);
}

#[test]
fn test_column_cardinality_uses_first_table_statistic() {
    let source = FakeDataSource::new("MySQL", "8.0.34").with_rows(vec![
        IndexInfoRow::index("ix_region", "region", true, 7),
        IndexInfoRow::table_statistic(42),
        IndexInfoRow::table_statistic(43),
    ]);

    let estimate = IndexMetadataStatisticsProvider
        .column_cardinality(&mysql(), &source, &TableRef::new("sales"), "region", &ExecutionContext::new())
        .unwrap();
    assert_eq!(estimate, Some(42));

    let without = FakeDataSource::new("MySQL", "8.0.34")
        .with_rows(vec![IndexInfoRow::index("ix_region", "region", true, 7)]);
    let estimate = IndexMetadataStatisticsProvider
        .column_cardinality(&mysql(), &without, &TableRef::new("sales"), "region", &ExecutionContext::new())
        .unwrap();
    assert_eq!(estimate, None);
}

#[test]
fn test_metadata_provider_never_answers_queries() {
    let source = FakeDataSource::new("MySQL", "8.0.34").with_count(10);

    let estimate = IndexMetadataStatisticsProvider
        .query_cardinality(&mysql(), &source, "select * from sales", &ExecutionContext::new())
        .unwrap();
    assert_eq!(estimate, None);
    assert_eq!(source.counters.opened(), 0);
}

#[test]
fn test_repeated_calls_are_identical() {
    let source = FakeDataSource::new("MySQL", "8.0.34").with_rows(vec![
        IndexInfoRow::index("ix_a", "a", true, 5),
        IndexInfoRow::index("ix_b", "b", true, 20),
    ]);
    let dialect = mysql();
    let table = TableRef::new("sales");
    let ctx = ExecutionContext::new();

    let first = IndexMetadataStatisticsProvider
        .table_cardinality(&dialect, &source, &table, &ctx)
        .unwrap();
    for _ in 0..5 {
        let again = IndexMetadataStatisticsProvider
            .table_cardinality(&dialect, &source, &table, &ctx)
            .unwrap();
        assert_eq!(again, first);
    }
    assert_eq!(dialect.features(), mysql().features());
}

#[test]
fn test_failure_mid_iteration_releases_resources_once() {
    let mut source = FakeDataSource::new("MySQL", "8.0.34").with_rows(vec![
        IndexInfoRow::index("ix_a", "a", true, 5),
        IndexInfoRow::index("ix_b", "b", true, 20),
        IndexInfoRow::index("ix_c", "c", true, 12),
    ]);
    source.fail_index_at = Some(2);

    let err = IndexMetadataStatisticsProvider
        .table_cardinality(&mysql(), &source, &TableRef::new("sales"), &ExecutionContext::new())
        .unwrap_err();

    assert!(matches!(err, StatisticsError::Backend { .. }));
    assert_eq!(source.counters.opened(), 1);
    assert_eq!(source.counters.closed(), 1);
    assert_eq!(source.counters.cursors_opened(), 1);
    assert_eq!(source.counters.cursors_closed(), 1);
}

#[test]
fn test_backend_error_names_the_table() {
    let mut source = FakeDataSource::new("MySQL", "8.0.34").with_rows(vec![IndexInfoRow::table_statistic(1)]);
    source.fail_index_at = Some(0);

    let err = IndexMetadataStatisticsProvider
        .table_cardinality(
            &mysql(),
            &source,
            &TableRef::qualified(None, Some("shop"), "sales"),
            &ExecutionContext::new(),
        )
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("while computing cardinality of table [shop.sales]"), "{}", message);
    assert!(err.source().is_some());
}

#[test]
fn test_connection_failure_is_an_error() {
    let mut source = FakeDataSource::new("MySQL", "8.0.34");
    source.fail_connect = true;

    let err = SqlCountStatisticsProvider
        .table_cardinality(&mysql(), &source, &TableRef::new("sales"), &ExecutionContext::new())
        .unwrap_err();
    assert!(matches!(err, StatisticsError::Backend { .. }));
    assert!(err.to_string().contains("while counting rows of table [sales]"));
}

#[test]
fn test_cancellation_mid_scan_is_distinct_from_unknown() {
    let mut source = FakeDataSource::new("MySQL", "8.0.34").with_rows(vec![
        IndexInfoRow::index("ix_a", "a", true, 5),
        IndexInfoRow::index("ix_b", "b", true, 20),
        IndexInfoRow::index("ix_c", "c", true, 12),
    ]);
    source.cancel_after_rows = Some(1);
    let ctx = ExecutionContext::new();

    let err = IndexMetadataStatisticsProvider
        .table_cardinality(&mysql(), &source, &TableRef::new("sales"), &ctx)
        .unwrap_err();

    assert!(matches!(err, StatisticsError::Cancelled));
    assert!(ctx.is_cancelled());
    assert_eq!(source.counters.closed(), source.counters.opened());
    assert_eq!(source.counters.cursors_closed(), source.counters.cursors_opened());
}

#[test]
fn test_cancelled_context_never_reaches_the_backend() {
    let source = FakeDataSource::new("MySQL", "8.0.34").with_count(10);
    let ctx = ExecutionContext::new();
    ctx.cancel();

    let err = SqlCountStatisticsProvider
        .table_cardinality(&mysql(), &source, &TableRef::new("sales"), &ctx)
        .unwrap_err();
    assert!(matches!(err, StatisticsError::Cancelled));
    assert_eq!(source.counters.opened(), 0);
    assert!(source.counters.statements().is_empty());
}

#[test]
fn test_sql_count_provider_issues_dialect_sql() {
    let source = FakeDataSource::new("MySQL", "8.0.34").with_count(1234);
    let ctx = ExecutionContext::new();
    let table = TableRef::qualified(None, Some("shop"), "sales");

    assert_eq!(
        SqlCountStatisticsProvider
            .table_cardinality(&mysql(), &source, &table, &ctx)
            .unwrap(),
        Some(1234)
    );
    SqlCountStatisticsProvider
        .column_cardinality(&mysql(), &source, &table, "region", &ctx)
        .unwrap();
    SqlCountStatisticsProvider
        .query_cardinality(&mysql(), &source, "select 1", &ctx)
        .unwrap();

    assert_eq!(
        source.counters.statements(),
        vec![
            "select count(*) from `shop`.`sales`".to_string(),
            "select count(distinct `region`) from `shop`.`sales`".to_string(),
            "select count(*) from (select 1) as `init`".to_string(),
        ]
    );
    assert_eq!(source.counters.opened(), 3);
    assert_eq!(source.counters.closed(), 3);
}

#[test]
fn test_sql_count_without_derived_tables_gives_up() {
    let old_mysql = Dialect::new(DatabaseProduct::MySql, "3.23.58", None);
    let source = FakeDataSource::new("MySQL", "3.23.58").with_count(10);

    let estimate = SqlCountStatisticsProvider
        .query_cardinality(&old_mysql, &source, "select 1", &ExecutionContext::new())
        .unwrap();
    assert_eq!(estimate, None);
    assert_eq!(source.counters.opened(), 0);
}

#[test]
fn test_mysql_providers_resolve_the_same_database() {
    let dialect = mysql();
    let template = dialect.index_info_sql().unwrap();

    for (catalog, schema) in [(Some("warehouse"), None), (Some("warehouse"), Some("staging")), (None, Some("warehouse"))] {
        let table = TableRef::qualified(catalog, schema, "sales");
        let metadata_sql = render_index_info_sql(template, &table);
        let database = catalog.or(schema).unwrap();
        assert!(metadata_sql.contains(&format!("COALESCE('{}'", database)), "{}", metadata_sql);

        let source = FakeDataSource::new("MySQL", "8.0.34").with_count(7);
        SqlCountStatisticsProvider
            .table_cardinality(&dialect, &source, &table, &ExecutionContext::new())
            .unwrap();
        assert_eq!(
            source.counters.statements(),
            vec![format!("select count(*) from `{}`.`sales`", database)]
        );
    }
}

#[test]
fn test_postgres_count_ignores_catalog() {
    let dialect = Dialect::new(DatabaseProduct::PostgreSql, "15.1", None);
    let source = FakeDataSource::new("PostgreSQL", "15.1").with_count(7);
    let table = TableRef::qualified(Some("warehouse"), Some("public"), "sales");

    SqlCountStatisticsProvider
        .table_cardinality(&dialect, &source, &table, &ExecutionContext::new())
        .unwrap();
    assert_eq!(source.counters.statements(), vec!["select count(*) from \"public\".\"sales\"".to_string()]);
}
