// JSONL listings log operations

use crate::record::Record;
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{info, warn};

/// Append a value to a JSONL file under an exclusive lock
pub fn append_jsonl<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open JSONL file for appending")?;

    file.lock_exclusive().context("Failed to acquire file lock")?;

    let json = serde_json::to_string(value)?;
    writeln!(file, "{}", json)?;
    file.sync_all()?; // Ensure data is flushed to disk

    // Lock is released when file is dropped
    Ok(())
}

/// Append a deletion marker for `id`
pub fn append_tombstone(path: &Path, id: &str, updated_at: i64) -> Result<()> {
    let tombstone = serde_json::json!({
        "id": id,
        "deleted": true,
        "updatedAt": updated_at,
    });
    append_jsonl(path, &tombstone)
}

enum Entry<T> {
    Live(T),
    Deleted(i64),
}

impl<T: Record> Entry<T> {
    fn updated_at(&self) -> i64 {
        match self {
            Entry::Live(record) => record.updated_at(),
            Entry::Deleted(at) => *at,
        }
    }
}

/// Read all records from a JSONL file, returning the latest version per ID
///
/// For duplicate IDs the line with the highest `updatedAt` wins (the later line
/// on a tie). Tombstones remove a record. Records come back in the order their
/// IDs first appeared in the file.
pub fn read_jsonl_latest<T: Record>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        // File doesn't exist yet, return empty list
        return Ok(Vec::new());
    }

    let file = File::open(path).context("Failed to open JSONL file")?;
    let reader = BufReader::new(file);
    let mut order: Vec<String> = Vec::new();
    let mut entries: HashMap<String, Entry<T>> = HashMap::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to read line, skipping"
                );
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let (id, entry) = match parse_line::<T>(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to parse JSON, skipping"
                );
                continue;
            }
        };

        // Later line wins on equal timestamps
        let newer = match entries.get(&id) {
            Some(existing) => entry.updated_at() >= existing.updated_at(),
            None => {
                order.push(id.clone());
                true
            }
        };
        if newer {
            entries.insert(id, entry);
        }
    }

    let records: Vec<T> = order
        .into_iter()
        .filter_map(|id| match entries.remove(&id) {
            Some(Entry::Live(record)) => Some(record),
            _ => None,
        })
        .collect();

    info!(
        file = ?path,
        count = records.len(),
        "Loaded latest records from JSONL"
    );

    Ok(records)
}

fn parse_line<T: Record>(line: &str) -> Result<(String, Entry<T>)> {
    let value: Value = serde_json::from_str(line)?;
    if value.get("deleted").and_then(Value::as_bool).unwrap_or(false) {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| eyre!("Tombstone without an id"))?
            .to_string();
        let at = value
            .get("updatedAt")
            .or_else(|| value.get("updated_at"))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        return Ok((id, Entry::Deleted(at)));
    }
    let record: T = serde_json::from_value(value)?;
    Ok((record.id().to_string(), Entry::Live(record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::Car;
    use std::fs;
    use tempfile::TempDir;

    fn listing(id: &str, brand: &str, updated_at: i64) -> Car {
        Car {
            brand: Some(brand.to_string()),
            updated_at,
            ..Car::new(id)
        }
    }

    #[test]
    fn test_append_jsonl() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("listings.jsonl");

        append_jsonl(&jsonl_path, &listing("car-1", "Tata", 1000)).unwrap();

        let content = fs::read_to_string(&jsonl_path).unwrap();
        assert!(content.contains("\"id\":\"car-1\""));
        assert!(content.contains("\"brand\":\"Tata\""));
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_read_jsonl_latest_wins() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("listings.jsonl");

        append_jsonl(&jsonl_path, &listing("car-1", "Version 1", 1000)).unwrap();
        append_jsonl(&jsonl_path, &listing("car-2", "Other", 1000)).unwrap();
        append_jsonl(&jsonl_path, &listing("car-1", "Version 2", 2000)).unwrap();
        append_jsonl(&jsonl_path, &listing("car-1", "Stale", 1500)).unwrap();

        let records: Vec<Car> = read_jsonl_latest(&jsonl_path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "car-1");
        assert_eq!(records[0].brand.as_deref(), Some("Version 2"));
        assert_eq!(records[1].id, "car-2");
    }

    #[test]
    fn test_read_jsonl_tombstone_removes_record() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("listings.jsonl");

        append_jsonl(&jsonl_path, &listing("car-1", "Tata", 1000)).unwrap();
        append_jsonl(&jsonl_path, &listing("car-2", "Kia", 1000)).unwrap();
        append_tombstone(&jsonl_path, "car-1", 2000).unwrap();

        let records: Vec<Car> = read_jsonl_latest(&jsonl_path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "car-2");

        // A newer write brings it back
        append_jsonl(&jsonl_path, &listing("car-1", "Tata", 3000)).unwrap();
        let records: Vec<Car> = read_jsonl_latest(&jsonl_path).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["car-1", "car-2"]);
    }

    #[test]
    fn test_read_jsonl_nonexistent_file() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("nonexistent.jsonl");

        let records: Vec<Car> = read_jsonl_latest(&jsonl_path).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_read_jsonl_malformed_line() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("listings.jsonl");

        // Valid record, malformed line, blank line, another valid record
        fs::write(
            &jsonl_path,
            r#"{"id":"car-1","brand":"Tata","carPrice":300000}
{malformed json}

{"brand":"Kia","carPrice":400000}
{"id":"car-3","brand":"Kia","carPrice":500000}
"#,
        )
        .unwrap();

        let records: Vec<Car> = read_jsonl_latest(&jsonl_path).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["car-1", "car-3"]);
    }

    #[test]
    fn test_read_jsonl_keeps_record_with_mistyped_field() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("listings.jsonl");

        fs::write(
            &jsonl_path,
            r#"{"id":"car-1","brand":"Tata","carPrice":300000,"fuelType":5,"address":null}
{"id":"car-2","brand":"Kia","carPrice":"not a number"}
"#,
        )
        .unwrap();

        let records: Vec<Car> = read_jsonl_latest(&jsonl_path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fuel_type, None);
        assert_eq!(records[0].price(), Some(300_000));
        assert_eq!(records[1].price(), None);
    }
}
