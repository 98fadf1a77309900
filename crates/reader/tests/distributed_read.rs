use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use arrow_schema::DataType;
use chrono::DateTime;
use sqf_common::{Column, DialectId, LogicalType, ReaderConfig, SqfError};
use sqf_dialect::Literal;
use sqf_planner::{CompareOp, Comparison, FilterTree, FilterValue, ScanRequest};
use sqf_reader::{
    BackendDriver, Cell, DistributedTableReader, LocalBroadcast, Row, StaticProbe,
    TableMaterialization, WorkerContext,
};

/// Driver that serves a synthetic (id, name, ts) result set and records
/// every SQL string it receives.
struct ScriptedDriver {
    total_rows: u64,
    log: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedDriver {
    fn new(total_rows: u64) -> Self {
        Self {
            total_rows,
            log: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn queries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn row_at(i: u64) -> Row {
        let ts = DateTime::from_timestamp(i as i64, 0).unwrap().naive_utc();
        vec![
            Some(Cell::Int(i as i64)),
            Some(Cell::Str(format!("name-{i}"))),
            Some(Cell::Timestamp(ts)),
        ]
    }
}

fn parse_window(sql: &str) -> (u64, u64) {
    let grab = |keyword: &str| -> u64 {
        let at = sql.rfind(keyword).unwrap_or_else(|| panic!("{keyword} missing in {sql}"));
        sql[at + keyword.len()..]
            .split_whitespace()
            .next()
            .unwrap()
            .parse()
            .unwrap()
    };
    (grab("OFFSET "), grab("LIMIT "))
}

impl BackendDriver for ScriptedDriver {
    fn execute(&self, sql: &str) -> sqf_common::Result<Vec<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(sql.to_string());
        if sql.starts_with("SELECT COUNT(*)") {
            return Ok(vec![vec![Some(Cell::Int(self.total_rows as i64))]]);
        }
        let (offset, limit) = parse_window(sql);
        let end = (offset + limit).min(self.total_rows);
        Ok((offset..end).map(ScriptedDriver::row_at).collect())
    }
}

fn scenario_request(parallelism: u32) -> ScanRequest {
    let config = ReaderConfig {
        backend: DialectId::Generic,
        parallelism,
        row_limit: None,
    };
    let mut request = ScanRequest::with_config("SELECT * FROM people", &config);
    request.requested_columns = vec![
        Column::new("id", LogicalType::Int64, false),
        Column::new("name", LogicalType::Utf8, true),
    ];
    request.index_column = Some(Column::new("ts", LogicalType::Timestamp, false));
    request.filters = Some(FilterTree {
        groups: vec![
            vec![Comparison {
                column: Column::new("age", LogicalType::Int64, true),
                op: CompareOp::Gt,
                value: FilterValue::Literal(Literal::Int(30)),
            }],
            vec![Comparison {
                column: Column::new("vip", LogicalType::Boolean, true),
                op: CompareOp::Eq,
                value: FilterValue::Literal(Literal::Bool(true)),
            }],
        ],
    });
    request
}

fn source_schema() -> Vec<Column> {
    vec![
        Column::new("id", LogicalType::Int64, false),
        Column::new("name", LogicalType::Utf8, true),
        Column::new("age", LogicalType::Int64, true),
        Column::new("vip", LogicalType::Boolean, true),
        Column::new("ts", LogicalType::Timestamp, false),
    ]
}

fn generic_probe() -> Arc<StaticProbe> {
    Arc::new(StaticProbe::with(["generic-sql-client"]))
}

#[test]
fn four_workers_cover_the_scan_and_assemble_in_rank_order() {
    let driver = Arc::new(ScriptedDriver::new(1000));
    let probe = generic_probe();
    let bcast = Arc::new(LocalBroadcast::new());
    let request = Arc::new(scenario_request(4));
    let schema = Arc::new(source_schema());

    let mut handles = Vec::new();
    for rank in 0..4u32 {
        let driver = Arc::clone(&driver);
        let probe = probe.clone();
        let request = Arc::clone(&request);
        let schema = Arc::clone(&schema);
        let ctx = WorkerContext::new(rank, 4, bcast.clone());
        handles.push(thread::spawn(move || {
            let reader = DistributedTableReader::new(driver, probe);
            reader.read(&request, &schema, &HashMap::new(), &ctx).unwrap()
        }));
    }
    let slices: Vec<TableMaterialization> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    for slice in &slices {
        assert_eq!(slice.num_rows(), 250);
        assert_eq!(slice.columns.num_columns(), 2);
        assert_eq!(slice.columns.schema().field(0).name(), "id");
        assert_eq!(slice.columns.schema().field(1).name(), "name");
        assert_eq!(slice.index.as_ref().unwrap().len(), 250);
    }
    // name was declared Utf8, so it materializes dictionary-encoded.
    assert_eq!(
        slices[0].columns.schema().field(1).data_type(),
        &DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
    );

    let queries = driver.queries();
    let count_queries: Vec<&String> =
        queries.iter().filter(|q| q.starts_with("SELECT COUNT(*)")).collect();
    assert_eq!(count_queries.len(), 1, "row count must be computed once");
    assert!(count_queries[0].contains("WHERE ( age > 30 ) OR ( vip = true )"));

    let fetches: Vec<&String> =
        queries.iter().filter(|q| !q.starts_with("SELECT COUNT(*)")).collect();
    assert_eq!(fetches.len(), 4, "one data round-trip per worker");
    let mut windows: Vec<(u64, u64)> = fetches.iter().map(|q| parse_window(q)).collect();
    windows.sort_unstable();
    assert_eq!(windows, [(0, 250), (250, 250), (500, 250), (750, 250)]);
    for q in &fetches {
        assert!(q.contains("\"id\", \"name\", \"ts\""), "q={q}");
        assert!(q.contains("WHERE ( age > 30 ) OR ( vip = true )"), "q={q}");
    }

    let table = TableMaterialization::concat(&slices).unwrap();
    assert_eq!(table.num_rows(), 1000);
    assert_eq!(table.index.as_ref().unwrap().len(), 1000);
    let ids = table
        .columns
        .column(0)
        .as_any()
        .downcast_ref::<arrow::array::Int64Array>()
        .unwrap();
    assert_eq!(ids.value(0), 0);
    assert_eq!(ids.value(999), 999);
}

#[test]
fn missing_client_dependency_fails_before_any_network_call() {
    let driver = Arc::new(ScriptedDriver::new(10));
    let probe = Arc::new(StaticProbe::default());
    let reader = DistributedTableReader::new(driver.clone(), probe);

    let mut request = scenario_request(1);
    request.backend = DialectId::Snowflake;
    let err = reader
        .read(&request, &source_schema(), &HashMap::new(), &WorkerContext::single())
        .unwrap_err();
    assert!(matches!(err, SqfError::MissingDependency { .. }), "err={err}");
    assert_eq!(driver.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn row_limit_caps_the_fetched_range() {
    let driver = Arc::new(ScriptedDriver::new(1000));
    let reader = DistributedTableReader::new(driver.clone(), generic_probe());

    let mut request = scenario_request(1);
    request.row_limit = Some(10);
    let table = reader
        .read(&request, &source_schema(), &HashMap::new(), &WorkerContext::single())
        .unwrap();
    assert_eq!(table.num_rows(), 10);

    let fetch = driver
        .queries()
        .into_iter()
        .find(|q| !q.starts_with("SELECT COUNT(*)"))
        .unwrap();
    assert_eq!(parse_window(&fetch), (0, 10));
}

#[test]
fn trailing_limit_in_base_query_caps_the_budget_too() {
    let driver = Arc::new(ScriptedDriver::new(1000));
    let reader = DistributedTableReader::new(driver.clone(), generic_probe());

    let mut request = scenario_request(1);
    request.base_query = "SELECT * FROM people LIMIT 8".to_string();
    let table = reader
        .read(&request, &source_schema(), &HashMap::new(), &WorkerContext::single())
        .unwrap();
    assert_eq!(table.num_rows(), 8);
}

#[test]
fn backend_failure_is_surfaced_verbatim() {
    struct FailingDriver;
    impl BackendDriver for FailingDriver {
        fn execute(&self, _sql: &str) -> sqf_common::Result<Vec<Row>> {
            Err(SqfError::BackendExecution(
                "ORA-00933: SQL command not properly ended".to_string(),
            ))
        }
    }

    let reader = DistributedTableReader::new(Arc::new(FailingDriver), generic_probe());
    let err = reader
        .read(
            &scenario_request(1),
            &source_schema(),
            &HashMap::new(),
            &WorkerContext::single(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("ORA-00933"), "err={err}");
}

#[test]
fn backend_returning_more_rows_than_the_range_is_a_partition_defect() {
    // Reports 2 rows in the count query, then serves 3 on fetch.
    struct OverReturningDriver;
    impl BackendDriver for OverReturningDriver {
        fn execute(&self, sql: &str) -> sqf_common::Result<Vec<Row>> {
            if sql.starts_with("SELECT COUNT(*)") {
                return Ok(vec![vec![Some(Cell::Int(2))]]);
            }
            Ok((0..3).map(ScriptedDriver::row_at).collect())
        }
    }

    let reader = DistributedTableReader::new(Arc::new(OverReturningDriver), generic_probe());
    let err = reader
        .read(
            &scenario_request(1),
            &source_schema(),
            &HashMap::new(),
            &WorkerContext::single(),
        )
        .unwrap_err();
    assert!(
        matches!(err, SqfError::PartitionCountMismatch(_)),
        "err={err}"
    );
}

#[test]
fn world_size_must_match_request_parallelism() {
    let driver = Arc::new(ScriptedDriver::new(10));
    let reader = DistributedTableReader::new(driver, generic_probe());
    let err = reader
        .read(
            &scenario_request(4),
            &source_schema(),
            &HashMap::new(),
            &WorkerContext::single(),
        )
        .unwrap_err();
    assert!(matches!(err, SqfError::Planning(_)), "err={err}");
}

#[test]
fn pure_index_read_returns_only_the_index_array() {
    let driver = Arc::new(ScriptedDriver::new(5));

    // The scripted driver always serves (id, name, ts); serve just ts here.
    struct IndexOnlyDriver(Arc<ScriptedDriver>);
    impl BackendDriver for IndexOnlyDriver {
        fn execute(&self, sql: &str) -> sqf_common::Result<Vec<Row>> {
            let rows = self.0.execute(sql)?;
            if sql.starts_with("SELECT COUNT(*)") {
                return Ok(rows);
            }
            Ok(rows.into_iter().map(|r| vec![r[2].clone()]).collect())
        }
    }

    let reader =
        DistributedTableReader::new(Arc::new(IndexOnlyDriver(driver)), generic_probe());
    let mut request = scenario_request(1);
    request.requested_columns = vec![];
    request.filters = None;
    let table = reader
        .read(&request, &source_schema(), &HashMap::new(), &WorkerContext::single())
        .unwrap();
    assert_eq!(table.columns.num_columns(), 0);
    assert_eq!(table.num_rows(), 5);
    assert_eq!(table.index.as_ref().unwrap().len(), 5);
}
