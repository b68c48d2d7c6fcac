use partition_router::{ColumnType, RouterConfig, RouterOrchestrator};
use partition_router::testutil::build_single_level_table;
use tempfile::tempdir;

fn orchestrator_over(root: &str) -> RouterOrchestrator {
    RouterOrchestrator::new(RouterConfig {
        data_root: root.to_string(),
        ..RouterConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn pruning_ratio_matches_kept_fraction() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    build_single_level_table(
        root,
        "sales",
        "date",
        &["2024-01-01", "2024-01-02", "2024-01-03"],
        1024,
    );

    let orchestrator = orchestrator_over(root);
    let result = orchestrator
        .execute("SELECT * FROM sales WHERE date = '2024-01-02'", None, None, false)
        .await
        .unwrap();

    assert_eq!(result.total_partitions, 3);
    assert_eq!(result.partitions_scanned, 1);
}

#[tokio::test]
async fn no_where_clause_keeps_full_catalog() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    build_single_level_table(root, "sales", "date", &["2024-01-01", "2024-01-02"], 1024);

    let orchestrator = orchestrator_over(root);
    let result = orchestrator
        .execute("SELECT * FROM sales", None, None, false)
        .await
        .unwrap();

    assert_eq!(result.partitions_scanned, result.total_partitions);
}

#[tokio::test]
async fn small_scan_selects_single_columnar_engine() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    let values: Vec<String> = (0..30).map(|i| format!("2024-01-{:02}", i + 1)).collect();
    let refs: Vec<&str> = values.iter().map(|s| s.as_str()).collect();
    build_single_level_table(root, "sales", "date", &refs, 1024);

    let orchestrator = orchestrator_over(root);
    let result = orchestrator
        .execute("SELECT * FROM sales", None, None, false)
        .await
        .unwrap();

    assert_eq!(result.engine_used, "single-columnar");
}

#[tokio::test]
async fn large_scan_selects_distributed_engine() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    let values: Vec<String> = (0..365).map(|i| format!("2024-{:03}", i)).collect();
    let refs: Vec<&str> = values.iter().map(|s| s.as_str()).collect();
    // 365 partitions x ~200MB each puts the scan size well past the
    // in-process engines' memory ceilings, leaving distributed as the
    // only feasible choice (spec §8 scenario: two engines infeasible).
    build_single_level_table(root, "sales", "date", &refs, 200 * 1024 * 1024);

    let orchestrator = orchestrator_over(root);
    let result = orchestrator
        .execute("SELECT * FROM sales", None, None, false)
        .await
        .unwrap();

    assert_eq!(result.engine_used, "distributed");
}

#[tokio::test]
async fn second_identical_query_is_served_from_cache() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    build_single_level_table(root, "sales", "date", &["2024-01-01"], 1024);

    let orchestrator = orchestrator_over(root);
    let sql = "select * from sales where date = '2024-01-01'";
    let first = orchestrator.execute(sql, None, None, false).await.unwrap();
    let second = orchestrator
        .execute("SELECT * FROM sales WHERE date = '2024-01-01'", None, None, false)
        .await
        .unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
}

#[tokio::test]
async fn touching_a_source_file_invalidates_the_cache_entry() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    build_single_level_table(root, "sales", "date", &["2024-01-01"], 1024);

    let orchestrator = orchestrator_over(root);
    let sql = "SELECT * FROM sales WHERE date = '2024-01-01'";
    orchestrator.execute(sql, None, None, false).await.unwrap();

    std::thread::sleep(std::time::Duration::from_millis(50));
    let partition_dir = std::path::Path::new(root).join("sales/date=2024-01-01");
    let file = std::fs::read_dir(&partition_dir)
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    std::fs::write(&file, b"changed contents").unwrap();

    let second = orchestrator.execute(sql, None, None, false).await.unwrap();
    assert!(!second.from_cache);
}

#[tokio::test]
async fn registered_schema_is_used_for_partition_coercion() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    build_single_level_table(root, "orders", "year", &["2020", "2021", "2022", "2023"], 1024);

    let orchestrator = orchestrator_over(root);
    let mut columns = std::collections::HashMap::new();
    columns.insert("year".to_string(), ColumnType::Integer);
    orchestrator.register_schema("orders", columns);

    let result = orchestrator
        .execute("SELECT * FROM orders WHERE year >= 2022", None, None, false)
        .await
        .unwrap();

    assert_eq!(result.partitions_scanned, 2);
}
