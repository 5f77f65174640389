//! Tests for converting columns into dimensions.

use canopy::config::SpotlightConfig;
use canopy::model::{Column, ColumnMeta, DimensionMeta, DimensionType, StringOrVec, TimeIntervalsSpec};
use canopy::semantic::{CollisionKind, CompileError, Dimension};
use canopy::sql::{Dialect, DialectSqlBuilder, TimeFrame, WarehouseSqlBuilder};
use canopy::translation::{convert_column_dimensions, convert_dimension, TableContext};
use indexmap::IndexMap;
use rstest::rstest;

fn context<'a>(builder: &'a dyn WarehouseSqlBuilder, spotlight: &'a SpotlightConfig) -> TableContext<'a> {
    TableContext {
        name: "orders",
        label: "Orders",
        builder,
        spotlight,
    }
}

fn dimensions_of(column: &Column, dialect: Dialect) -> Result<IndexMap<String, Dimension>, CompileError> {
    let builder = DialectSqlBuilder::new(dialect);
    let spotlight = SpotlightConfig::default();
    let mut dimensions = IndexMap::new();
    convert_column_dimensions(&context(&builder, &spotlight), 0, column, &mut dimensions)?;
    Ok(dimensions)
}

fn with_meta(column: Column, meta: DimensionMeta) -> Column {
    Column {
        meta: ColumnMeta {
            dimension: Some(meta),
            ..Default::default()
        },
        ..column
    }
}

#[test]
fn test_meta_overrides_column() {
    let column = with_meta(
        Column::new("amt").with_data_type("string"),
        DimensionMeta {
            type_: Some("number".into()),
            name: Some("amount".into()),
            sql: Some("${TABLE}.amt / 100".into()),
            label: Some("Order amount".into()),
            group_label: Some("Money".into()),
            hidden: Some(true),
            ..Default::default()
        },
    );
    let dimensions = dimensions_of(&column, Dialect::Postgres).unwrap();
    let amount = &dimensions["amount"];
    assert_eq!(amount.type_, DimensionType::Number);
    assert_eq!(amount.sql, "${TABLE}.amt / 100");
    assert_eq!(amount.label, "Order amount");
    assert_eq!(amount.groups, vec!["Money"]);
    assert!(amount.hidden);
    assert!(!dimensions.contains_key("amt"));
}

#[test]
fn test_config_meta_wins_over_meta() {
    let mut column = with_meta(
        Column::new("status"),
        DimensionMeta {
            label: Some("From meta".into()),
            description: Some("kept".into()),
            ..Default::default()
        },
    );
    column.config.meta.dimension = Some(DimensionMeta {
        label: Some("From config".into()),
        ..Default::default()
    });
    let dimensions = dimensions_of(&column, Dialect::Postgres).unwrap();
    assert_eq!(dimensions["status"].label, "From config");
    assert_eq!(dimensions["status"].description.as_deref(), Some("kept"));
}

#[test]
fn test_missing_type_defaults_to_string() {
    let dimensions = dimensions_of(&Column::new("status"), Dialect::Postgres).unwrap();
    assert_eq!(dimensions["status"].type_, DimensionType::String);
}

#[rstest]
#[case::timestamp("timestamp", &["created_at", "created_at_raw", "created_at_day", "created_at_week", "created_at_month", "created_at_quarter", "created_at_year"])]
#[case::date("date", &["created_at", "created_at_day", "created_at_week", "created_at_month", "created_at_quarter", "created_at_year"])]
#[case::number("number", &["created_at"])]
fn test_default_interval_sets(#[case] data_type: &str, #[case] expected: &[&str]) {
    let column = Column::new("created_at").with_data_type(data_type);
    let dimensions = dimensions_of(&column, Dialect::Postgres).unwrap();
    let names: Vec<&str> = dimensions.keys().map(String::as_str).collect();
    assert_eq!(names, expected);
}

#[rstest]
#[case::postgres(Dialect::Postgres, "DATE_TRUNC('MONTH', ${TABLE}.created_at)")]
#[case::redshift(Dialect::Redshift, "DATE_TRUNC('MONTH', ${TABLE}.created_at)")]
#[case::snowflake(
    Dialect::Snowflake,
    "DATE_TRUNC('MONTH', TO_TIMESTAMP_NTZ(CONVERT_TIMEZONE('UTC', ${TABLE}.created_at)))"
)]
#[case::bigquery(Dialect::BigQuery, "TIMESTAMP_TRUNC(${TABLE}.created_at, MONTH)")]
#[case::databricks(Dialect::Databricks, "DATE_TRUNC('MONTH', ${TABLE}.created_at)")]
#[case::trino(Dialect::Trino, "DATE_TRUNC('MONTH', ${TABLE}.created_at)")]
fn test_month_interval_sql(#[case] dialect: Dialect, #[case] expected: &str) {
    let column = Column::new("created_at").with_data_type("timestamp");
    let dimensions = dimensions_of(&column, dialect).unwrap();
    let month = &dimensions["created_at_month"];
    assert_eq!(month.sql, expected);
    assert_eq!(month.type_, DimensionType::Date);
    assert_eq!(month.time_interval, Some(TimeFrame::Month));
    assert!(!month.is_interval_base);
}

#[test]
fn test_explicit_interval_list() {
    let column = with_meta(
        Column::new("created_at").with_data_type("date"),
        DimensionMeta {
            time_intervals: Some(TimeIntervalsSpec::List(vec![
                "month_name".into(),
                "YEAR_NUM".into(),
            ])),
            ..Default::default()
        },
    );
    let dimensions = dimensions_of(&column, Dialect::Postgres).unwrap();
    let names: Vec<&str> = dimensions.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["created_at", "created_at_month_name", "created_at_year_num"]);
    assert_eq!(dimensions["created_at_month_name"].type_, DimensionType::String);
    assert_eq!(dimensions["created_at_year_num"].type_, DimensionType::Number);
    assert_eq!(dimensions["created_at_year_num"].label, "Created at year (number)");
}

#[test]
fn test_invalid_interval_entry() {
    let column = with_meta(
        Column::new("created_at").with_data_type("date"),
        DimensionMeta {
            time_intervals: Some(TimeIntervalsSpec::List(vec!["FORTNIGHT".into()])),
            ..Default::default()
        },
    );
    let err = dimensions_of(&column, Dialect::Postgres).unwrap_err();
    assert!(matches!(err, CompileError::MetadataParse(_)));
    assert!(err.to_string().contains("\"FORTNIGHT\""));
}

#[test]
fn test_disabled_intervals_are_not_interval_base() {
    let column = with_meta(
        Column::new("created_at").with_data_type("timestamp"),
        DimensionMeta {
            time_intervals: Some(TimeIntervalsSpec::Flag(false)),
            ..Default::default()
        },
    );
    let dimensions = dimensions_of(&column, Dialect::Postgres).unwrap();
    assert_eq!(dimensions.len(), 1);
    assert!(!dimensions["created_at"].is_interval_base);
}

#[test]
fn test_interval_groups_use_base_label() {
    let column = with_meta(
        Column::new("created_at").with_data_type("date"),
        DimensionMeta {
            label: Some("Ordered".into()),
            groups: Some(StringOrVec::Many(vec!["Dates".into()])),
            time_intervals: Some(TimeIntervalsSpec::List(vec!["WEEK".into()])),
            ..Default::default()
        },
    );
    let dimensions = dimensions_of(&column, Dialect::Postgres).unwrap();
    let week = &dimensions["created_at_week"];
    assert_eq!(week.label, "Ordered week");
    assert_eq!(week.groups, vec!["Dates", "Ordered"]);
    assert_eq!(week.time_interval_base_dimension_name.as_deref(), Some("created_at"));
}

#[test]
fn test_week_respects_start_of_week() {
    let builder = DialectSqlBuilder::new(Dialect::Postgres)
        .with_start_of_week(Some(canopy::model::Weekday::Wednesday));
    let spotlight = SpotlightConfig::default();
    let column = Column::new("created_at").with_data_type("date");
    let week = convert_dimension(
        &context(&builder, &spotlight),
        0,
        &column,
        &DimensionMeta::default(),
        Some(TimeFrame::Week),
        false,
    )
    .unwrap();
    assert_eq!(
        week.sql,
        "(DATE_TRUNC('WEEK', (${TABLE}.created_at - INTERVAL '2 days')) + INTERVAL '2 days')"
    );
}

#[test]
fn test_additional_dimensions_use_own_meta() {
    let mut column = Column::new("created_at").with_data_type("timestamp");
    column.meta.dimension = Some(DimensionMeta {
        time_intervals: Some(TimeIntervalsSpec::Keyword("OFF".into())),
        ..Default::default()
    });
    column.meta.additional_dimensions.insert(
        "created_date".into(),
        DimensionMeta {
            type_: Some("date".into()),
            sql: Some("CAST(${TABLE}.created_at AS DATE)".into()),
            time_intervals: Some(TimeIntervalsSpec::List(vec!["YEAR".into()])),
            ..Default::default()
        },
    );
    let dimensions = dimensions_of(&column, Dialect::Postgres).unwrap();
    let names: Vec<&str> = dimensions.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["created_at", "created_date", "created_date_year"]);

    let additional = &dimensions["created_date"];
    assert!(additional.is_additional_dimension);
    assert_eq!(additional.label, "Created date");
    assert_eq!(
        dimensions["created_date_year"].sql,
        "DATE_TRUNC('YEAR', CAST(${TABLE}.created_at AS DATE))"
    );
}

#[test]
fn test_additional_dimension_name_collision() {
    let mut column = Column::new("status");
    column
        .meta
        .additional_dimensions
        .insert("status".into(), DimensionMeta::default());
    let err = dimensions_of(&column, Dialect::Postgres).unwrap_err();
    assert!(matches!(
        err,
        CompileError::NameCollision {
            kind: CollisionKind::Dimensions,
            ..
        }
    ));
}
