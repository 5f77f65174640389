//! Warehouse dialect rendering across all supported dialects.

use canopy::model::{DimensionType, MetricType, Weekday};
use canopy::sql::{Dialect, DialectSqlBuilder, SqlDialect, TimeFrame, WarehouseSqlBuilder};
use rstest::rstest;

#[rstest]
#[case::postgres(Dialect::Postgres, "\"orders\"")]
#[case::redshift(Dialect::Redshift, "\"orders\"")]
#[case::snowflake(Dialect::Snowflake, "\"orders\"")]
#[case::trino(Dialect::Trino, "\"orders\"")]
#[case::bigquery(Dialect::BigQuery, "`orders`")]
#[case::databricks(Dialect::Databricks, "`orders`")]
fn test_quote_identifier(#[case] dialect: Dialect, #[case] expected: &str) {
    assert_eq!(dialect.quote_identifier("orders"), expected);
}

#[rstest]
#[case::postgres(Dialect::Postgres, "'it''s'")]
#[case::snowflake(Dialect::Snowflake, "'it''s'")]
#[case::trino(Dialect::Trino, "'it''s'")]
#[case::bigquery(Dialect::BigQuery, r"'it\'s'")]
#[case::databricks(Dialect::Databricks, r"'it\'s'")]
fn test_quote_string(#[case] dialect: Dialect, #[case] expected: &str) {
    assert_eq!(dialect.quote_string("it's"), expected);
}

#[test]
fn test_comments_never_reach_literals() {
    for dialect in Dialect::ALL {
        let quoted = dialect.quote_string("card /* x */ -- drop");
        assert!(!quoted.contains("--"), "{}: {}", dialect, quoted);
        assert!(!quoted.contains("/*"), "{}: {}", dialect, quoted);
    }
}

#[rstest]
#[case::postgres(Dialect::Postgres, "AVG(x::DOUBLE PRECISION)")]
#[case::redshift(Dialect::Redshift, "AVG(x::DOUBLE PRECISION)")]
#[case::snowflake(Dialect::Snowflake, "AVG(x)")]
#[case::bigquery(Dialect::BigQuery, "AVG(x)")]
#[case::databricks(Dialect::Databricks, "AVG(x)")]
#[case::trino(Dialect::Trino, "AVG(x)")]
fn test_average(#[case] dialect: Dialect, #[case] expected: &str) {
    assert_eq!(dialect.metric_sql("x", MetricType::Average, None), expected);
}

#[rstest]
#[case::postgres(Dialect::Postgres, "PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY x)")]
#[case::redshift(Dialect::Redshift, "PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY x)")]
#[case::snowflake(Dialect::Snowflake, "PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY x)")]
#[case::bigquery(Dialect::BigQuery, "APPROX_QUANTILES(x, 100)[OFFSET(50)]")]
#[case::databricks(Dialect::Databricks, "PERCENTILE(x, 0.5)")]
#[case::trino(Dialect::Trino, "APPROX_PERCENTILE(x, 0.5)")]
fn test_median(#[case] dialect: Dialect, #[case] expected: &str) {
    assert_eq!(dialect.metric_sql("x", MetricType::Median, None), expected);
}

#[test]
fn test_percentile_defaults_to_median() {
    for dialect in Dialect::ALL {
        assert_eq!(
            dialect.metric_sql("x", MetricType::Percentile, None),
            dialect.metric_sql("x", MetricType::Median, None)
        );
    }
}

#[test]
fn test_non_aggregates_pass_through() {
    for dialect in Dialect::ALL {
        for metric_type in [
            MetricType::Number,
            MetricType::String,
            MetricType::Date,
            MetricType::Timestamp,
            MetricType::Boolean,
        ] {
            assert_eq!(dialect.metric_sql("${a} / ${b}", metric_type, None), "${a} / ${b}");
        }
    }
}

#[rstest]
#[case::postgres(Dialect::Postgres, "x")]
#[case::snowflake(Dialect::Snowflake, "TO_TIMESTAMP_NTZ(CONVERT_TIMEZONE('UTC', x))")]
#[case::bigquery(Dialect::BigQuery, "x")]
#[case::trino(Dialect::Trino, "x")]
fn test_convert_timezone(#[case] dialect: Dialect, #[case] expected: &str) {
    assert_eq!(dialect.convert_timezone("x", "UTC", "UTC"), expected);
}

#[rstest]
#[case::postgres(Dialect::Postgres, "DATE_PART('year', x)")]
#[case::snowflake(Dialect::Snowflake, "DATE_PART('YEAR', x)")]
#[case::databricks(Dialect::Databricks, "DATE_PART('YEAR', x)")]
#[case::bigquery(Dialect::BigQuery, "EXTRACT(YEAR FROM x)")]
#[case::trino(Dialect::Trino, "EXTRACT(YEAR FROM x)")]
fn test_year_number(#[case] dialect: Dialect, #[case] expected: &str) {
    let sql = dialect.time_interval_sql(TimeFrame::YearNum, "x", DimensionType::Date, None);
    assert_eq!(sql, expected);
}

#[rstest]
#[case::postgres(Dialect::Postgres, "TO_CHAR(x, 'FMDay')")]
#[case::snowflake(Dialect::Snowflake, "DAYNAME(x)")]
#[case::databricks(Dialect::Databricks, "DATE_FORMAT(x, 'EEEE')")]
#[case::bigquery(Dialect::BigQuery, "FORMAT_DATETIME('%A', x)")]
#[case::trino(Dialect::Trino, "FORMAT_DATETIME(x, 'EEEE')")]
fn test_day_of_week_name(#[case] dialect: Dialect, #[case] expected: &str) {
    let sql = dialect.time_interval_sql(TimeFrame::DayOfWeekName, "x", DimensionType::Date, None);
    assert_eq!(sql, expected);
}

#[rstest]
#[case::postgres(Dialect::Postgres)]
#[case::redshift(Dialect::Redshift)]
#[case::snowflake(Dialect::Snowflake)]
#[case::databricks(Dialect::Databricks)]
#[case::trino(Dialect::Trino)]
fn test_monday_week_is_plain_truncation(#[case] dialect: Dialect) {
    for start in [None, Some(Weekday::Monday)] {
        assert_eq!(
            dialect.time_interval_sql(TimeFrame::Week, "x", DimensionType::Date, start),
            "DATE_TRUNC('WEEK', x)"
        );
    }
}

#[test]
fn test_shifted_week_start() {
    let sunday = Some(Weekday::Sunday);
    insta::assert_snapshot!(
        Dialect::Snowflake.time_interval_sql(TimeFrame::Week, "x", DimensionType::Date, sunday),
        @"DATEADD(DAY, 6, DATE_TRUNC('WEEK', DATEADD(DAY, -6, x)))"
    );
    insta::assert_snapshot!(
        Dialect::Trino.time_interval_sql(TimeFrame::Week, "x", DimensionType::Date, sunday),
        @"DATE_ADD('day', 6, DATE_TRUNC('WEEK', DATE_ADD('day', -6, x)))"
    );
    insta::assert_snapshot!(
        Dialect::BigQuery.time_interval_sql(TimeFrame::Week, "x", DimensionType::Timestamp, sunday),
        @"TIMESTAMP_TRUNC(x, WEEK(SUNDAY))"
    );
    insta::assert_snapshot!(
        Dialect::Redshift.time_interval_sql(TimeFrame::Week, "x", DimensionType::Date, sunday),
        @"(DATE_TRUNC('WEEK', (x - INTERVAL '6 days')) + INTERVAL '6 days')"
    );
}

#[test]
fn test_builder_passes_its_week_start() {
    let builder =
        DialectSqlBuilder::new(Dialect::Databricks).with_start_of_week(Some(Weekday::Tuesday));
    let sql = builder.time_interval_sql(
        TimeFrame::Week,
        "x",
        DimensionType::Date,
        builder.start_of_week(),
    );
    assert_eq!(sql, "DATEADD(DAY, 1, DATE_TRUNC('WEEK', DATEADD(DAY, -1, x)))");
}

#[test]
fn test_dialect_names_round_trip_through_from_str() {
    for dialect in Dialect::ALL {
        assert_eq!(dialect.to_string().parse::<Dialect>(), Ok(dialect));
    }
    let err = "oracle".parse::<Dialect>().unwrap_err();
    assert!(err.contains("postgres, snowflake, bigquery, redshift, databricks, trino"));
}

#[test]
fn test_output_types() {
    let builder = DialectSqlBuilder::new(Dialect::Postgres);
    let cases = [
        (TimeFrame::Raw, DimensionType::Timestamp),
        (TimeFrame::Day, DimensionType::Date),
        (TimeFrame::Hour, DimensionType::Timestamp),
        (TimeFrame::MonthNum, DimensionType::Number),
        (TimeFrame::QuarterName, DimensionType::String),
    ];
    for (frame, expected) in cases {
        assert_eq!(
            builder.time_interval_output_type(frame, DimensionType::Timestamp),
            expected,
            "{}",
            frame
        );
    }
}
