//! Two-column `category,value` files, one row per sample per key.

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::sampler::CollectError;

pub const HEADER: [&str; 2] = ["category", "value"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row<V> {
    pub category: String,
    pub value: V,
}

/// Write the header and every row to `path`, replacing any existing file.
pub fn write_rows<'a, V, I>(path: &Path, rows: I) -> Result<(), CollectError>
where
    V: Serialize,
    I: IntoIterator<Item = (&'a str, V)>,
{
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| CollectError::from_csv(path, e))?;
    writer
        .write_record(HEADER)
        .map_err(|e| CollectError::from_csv(path, e))?;
    for (category, value) in rows {
        writer
            .serialize(Row {
                category: category.to_string(),
                value,
            })
            .map_err(|e| CollectError::from_csv(path, e))?;
    }
    writer.flush().map_err(|e| CollectError::io(path, e))
}

/// Read every row of `path` in file order.
pub fn read_rows<V>(path: &Path) -> Result<Vec<(String, V)>, CollectError>
where
    V: DeserializeOwned,
{
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| CollectError::from_csv(path, e))?;
    let headers = reader
        .headers()
        .map_err(|e| CollectError::from_csv(path, e))?;
    if !headers.iter().eq(HEADER) {
        return Err(CollectError::parse(
            path.display().to_string(),
            format!("expected header {:?}, found {:?}", HEADER.join(","), headers),
        ));
    }
    reader
        .deserialize::<Row<V>>()
        .map(|row| {
            row.map(|r| (r.category, r.value))
                .map_err(|e| CollectError::from_csv(path, e))
        })
        .collect()
}

/// Values recorded under `key`, in file order. Empty when the key never appears.
pub fn read_key(path: &Path, key: &str) -> Result<Vec<i64>, CollectError> {
    Ok(read_rows::<i64>(path)?
        .into_iter()
        .filter(|(category, _)| category == key)
        .map(|(_, value)| value)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn writes_header_and_one_row_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cpu.csv");
        write_rows(&path, [("user", 1u64), ("user", 2), ("idle", 9)]).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "category,value\nuser,1\nuser,2\nidle,9\n"
        );
    }

    #[test]
    fn empty_export_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vm.csv");
        write_rows::<u64, _>(&path, []).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "category,value\n");
        assert!(read_rows::<u64>(&path).unwrap().is_empty());
    }

    #[test]
    fn reads_rows_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vm.csv");
        fs::write(&path, "category,value\npgfault,3\nnuma_hit,8\npgfault,4\n").unwrap();
        assert_eq!(
            read_rows::<u64>(&path).unwrap(),
            vec![
                ("pgfault".to_string(), 3),
                ("numa_hit".to_string(), 8),
                ("pgfault".to_string(), 4),
            ]
        );
        assert_eq!(read_key(&path, "pgfault").unwrap(), vec![3, 4]);
        assert!(read_key(&path, "pswpin").unwrap().is_empty());
    }

    #[test]
    fn negative_values_only_read_as_signed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diff.csv");
        write_rows(&path, [("user", 0i64), ("user", -3)]).unwrap();
        assert_eq!(read_key(&path, "user").unwrap(), vec![0, -3]);
        assert!(matches!(
            read_rows::<u64>(&path),
            Err(CollectError::Parse { .. })
        ));
    }

    #[test]
    fn wrong_header_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "key,count\nuser,1\n").unwrap();
        assert!(matches!(
            read_rows::<u64>(&path),
            Err(CollectError::Parse { .. })
        ));
    }

    #[test]
    fn malformed_row_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "category,value\nuser,1,extra\n").unwrap();
        assert!(matches!(
            read_rows::<u64>(&path),
            Err(CollectError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_rows::<u64>(&dir.path().join("absent.csv")),
            Err(CollectError::Io { .. })
        ));
    }
}
