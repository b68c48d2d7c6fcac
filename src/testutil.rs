// Test fixture helpers. Not `#[cfg(test)]`-gated: both in-crate unit
// tests and the `tests/` integration tests need them, and `#[cfg(test)]`
// items aren't visible outside the defining crate.
//
// Reimplements (in the teacher's idiom, not translated) the Hive-style
// fixture layout built by `original_source`'s `generate_test_data.py`:
// a tree of `<table>/<key>=<value>/...` directories populated with
// placeholder data files of a given size.

use std::fs;
use std::path::PathBuf;

/// Writes a single placeholder data file under
/// `<root>/<table>/<k1>=<v1>/<k2>=<v2>/.../<file_name>`, creating
/// directories as needed, and fills it with `size_bytes` zero bytes.
pub fn write_partition_file(
    root: &str,
    table: &str,
    partition_values: &[(&str, &str)],
    file_name: &str,
    size_bytes: usize,
) -> PathBuf {
    let mut dir = PathBuf::from(root).join(table);
    for (key, value) in partition_values {
        dir.push(format!("{key}={value}"));
    }
    fs::create_dir_all(&dir).expect("create partition directory");

    let file_path = dir.join(file_name);
    fs::write(&file_path, vec![0u8; size_bytes]).expect("write placeholder data file");
    file_path
}

/// Builds a table with one partition per `(key, value)` pair in
/// `partitions`, each holding a single file of `file_size_bytes`.
/// Mirrors the flat-layout fixtures `generate_test_data.py` produces
/// for the single-column partitioning scenarios in spec §8.
pub fn build_single_level_table(
    root: &str,
    table: &str,
    key: &str,
    values: &[&str],
    file_size_bytes: usize,
) {
    for value in values {
        write_partition_file(root, table, &[(key, value)], "part-0.parquet", file_size_bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn builds_expected_directory_layout() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        build_single_level_table(root, "sales", "date", &["2024-01-01", "2024-01-02"], 10);

        assert!(dir.path().join("sales/date=2024-01-01/part-0.parquet").is_file());
        assert!(dir.path().join("sales/date=2024-01-02/part-0.parquet").is_file());
    }
}
