// Copyright 2025 cpubench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Append-only result store.
//!
//! Records are kept one JSON object per line, oldest first. Appends write a
//! single complete line; deletion rewrites the whole file through a temporary
//! sibling that is renamed into place.

use crate::error::Result;
use crate::record::ResultRecord;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// JSON Lines file holding every recorded session.
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    /// Open a store at `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every well-formed record in insertion order.
    ///
    /// A missing file is an empty store. Blank, malformed, non-UTF-8 and
    /// partially written lines are skipped.
    pub fn load_all(&self) -> Result<Vec<ResultRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (index, raw) in bytes.split(|b| *b == b'\n').enumerate() {
            let Ok(line) = std::str::from_utf8(raw) else {
                debug!(line = index + 1, "Skipping non-UTF-8 store line");
                continue;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<ResultRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => debug!(line = index + 1, error = %e, "Skipping malformed store line"),
            }
        }
        Ok(records)
    }

    /// Append `record` as one line, creating the store if needed.
    pub fn append(&self, record: &ResultRecord) -> Result<()> {
        ensure_parent_dir(&self.path)?;

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;
        // Never glue a new record onto a truncated final line.
        if !ends_with_newline(&mut file)? {
            line.insert(0, '\n');
        }
        file.write_all(line.as_bytes())?;
        file.flush()?;

        info!(label = %record.system_label, path = %self.path.display(), "Appended result record");
        Ok(())
    }

    /// Remove every record labelled exactly `label`, returning how many went.
    ///
    /// Only lines that parse as a record with that label are dropped; every
    /// other non-blank line, malformed or not, is kept byte for byte. The file
    /// is only rewritten when something matched.
    pub fn delete_by_label(&self, label: &str) -> Result<usize> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut kept = Vec::with_capacity(bytes.len());
        let mut removed = 0;
        for raw in bytes.split(|b| *b == b'\n') {
            if raw.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            if parsed_label(raw).as_deref() == Some(label) {
                removed += 1;
                continue;
            }
            kept.extend_from_slice(raw);
            kept.push(b'\n');
        }

        if removed == 0 {
            debug!(label, "No records matched, store left untouched");
            return Ok(0);
        }

        self.rewrite(&kept)?;
        info!(label, removed, "Deleted result records");
        Ok(removed)
    }

    /// Labels currently present in the store.
    pub fn labels(&self) -> Result<HashSet<String>> {
        Ok(self
            .load_all()?
            .into_iter()
            .map(|r| r.system_label)
            .collect())
    }

    /// Records labelled exactly `label`, in store order.
    pub fn find_by_label(&self, label: &str) -> Result<Vec<ResultRecord>> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|r| r.system_label == label)
            .collect())
    }

    fn rewrite(&self, contents: &[u8]) -> Result<()> {
        ensure_parent_dir(&self.path)?;

        let tmp = temp_path(&self.path);
        {
            let mut file = File::create(&tmp)?;
            file.write_all(contents)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Label of a line that parses as a record.
fn parsed_label(raw: &[u8]) -> Option<String> {
    let line = std::str::from_utf8(raw).ok()?;
    serde_json::from_str::<ResultRecord>(line.trim())
        .ok()
        .map(|r| r.system_label)
}

/// Sibling of `path` named after the whole file name, so `r.jsonl` and
/// `r.csv` never share a temporary file and `x.tmp` never writes to itself.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Environment, RecordShape};
    use crate::stats::TrialStatistics;
    use crate::workload::WorkloadKind;
    use std::collections::BTreeMap;

    fn record(label: &str, primes: f64) -> ResultRecord {
        let mut stats = BTreeMap::new();
        stats.insert(WorkloadKind::Primes, TrialStatistics::from_samples(&[primes], None));
        ResultRecord::new(label, Environment::default(), stats)
    }

    fn labels_in_order(store: &ResultStore) -> Vec<String> {
        store
            .load_all()
            .unwrap()
            .into_iter()
            .map(|r| r.system_label)
            .collect()
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.jsonl"));
        assert!(store.load_all().unwrap().is_empty());
        assert!(store.labels().unwrap().is_empty());
    }

    #[test]
    fn test_append_creates_nested_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("nested/dir/results.jsonl"));
        store.append(&record("a", 1.0)).unwrap();
        assert_eq!(labels_in_order(&store), vec!["a"]);
    }

    #[test]
    fn test_append_keeps_prior_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.jsonl"));
        let first = record("a", 1.0);
        let second = record("b", 2.0);
        let third = record("c", 3.0);
        store.append(&first).unwrap();
        store.append(&second).unwrap();
        store.append(&third).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded, vec![first, second, third]);
    }

    #[test]
    fn test_append_then_load_returns_identical_floats() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.jsonl"));
        let samples = [2.5976397732906826, 0.1, 0.7];
        let mut stats = BTreeMap::new();
        stats.insert(WorkloadKind::Primes, TrialStatistics::from_samples(&samples, None));
        stats.insert(WorkloadKind::Pi, TrialStatistics::from_samples(&[1.0 / 3.0, 0.2], None));
        let run = ResultRecord::new("f", Environment { cpu_cores: Some(4), cpu_freq_mhz: Some(2893.204) }, stats);

        store.append(&run).unwrap();
        assert_eq!(store.load_all().unwrap().last(), Some(&run));
    }

    #[test]
    fn test_delete_by_label_removes_all_matches() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.jsonl"));
        for label in ["A", "B", "A", "C"] {
            store.append(&record(label, 1.0)).unwrap();
        }

        assert_eq!(store.delete_by_label("A").unwrap(), 2);
        assert_eq!(labels_in_order(&store), vec!["B", "C"]);

        let before = fs::read(store.path()).unwrap();
        assert_eq!(store.delete_by_label("A").unwrap(), 0);
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert!(!temp_path(store.path()).exists());
    }

    #[test]
    fn test_delete_keeps_other_lines_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let other = r#"{"system_label":"B","cpu_cores":"8","primes":{"median":2.0}}"#;
        fs::write(
            &path,
            format!("{{\"system_label\":\"A\",\"primes_time\":1.0}}\n{other}\nnot json\n\n{{\"system_label\":\"A\",\"primes\":{{\"median\":\"x\"}}}}\n"),
        )
        .unwrap();

        let store = ResultStore::new(&path);
        assert_eq!(store.delete_by_label("A").unwrap(), 1);
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            format!("{other}\nnot json\n{{\"system_label\":\"A\",\"primes\":{{\"median\":\"x\"}}}}\n")
        );
        assert_eq!(labels_in_order(&store), vec!["B"]);
        assert_eq!(store.find_by_label("B").unwrap()[0].environment.cpu_cores, Some(8));
    }

    #[test]
    fn test_delete_in_store_named_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("x.tmp"));
        store.append(&record("A", 1.0)).unwrap();
        store.append(&record("B", 2.0)).unwrap();

        assert_eq!(store.delete_by_label("A").unwrap(), 1);
        assert_eq!(labels_in_order(&store), vec!["B"]);
        assert!(!dir.path().join("x.tmp.tmp").exists());
    }

    #[test]
    fn test_temp_path_keeps_full_file_name() {
        assert_eq!(temp_path(Path::new("d/r.jsonl")), PathBuf::from("d/r.jsonl.tmp"));
        assert_ne!(temp_path(Path::new("r.jsonl")), temp_path(Path::new("r.csv")));
        assert_eq!(temp_path(Path::new("x.tmp")), PathBuf::from("x.tmp.tmp"));
    }

    #[test]
    fn test_delete_on_missing_store_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.jsonl"));
        assert_eq!(store.delete_by_label("ghost").unwrap(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_malformed_and_blank_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let good = serde_json::to_string(&record("ok", 1.0)).unwrap();
        fs::write(&path, format!("{good}\nnot json\n\n{{\"system_label\":\"half\n")).unwrap();

        let store = ResultStore::new(&path);
        assert_eq!(labels_in_order(&store), vec!["ok"]);
    }

    #[test]
    fn test_append_after_truncated_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        fs::write(&path, "{\"system_label\":\"trunc").unwrap();

        let store = ResultStore::new(&path);
        store.append(&record("next", 1.0)).unwrap();
        assert_eq!(labels_in_order(&store), vec!["next"]);
    }

    #[test]
    fn test_mixed_shapes_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let legacy = r#"{"timestamp":"2024-01-01 00:00:00","system_name":"old","platform":"Linux","processor":"x86_64","primes_time":4.0,"pi_time":2.0,"hash_time":3.0}"#;
        let current = serde_json::to_string(&record("new", 2.0)).unwrap();
        fs::write(&path, format!("{legacy}\n{current}\n\n")).unwrap();

        let records = ResultStore::new(&path).load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0].shape, RecordShape::Legacy(_)));
        assert!(matches!(records[1].shape, RecordShape::Current(_)));
    }

    #[test]
    fn test_find_by_label() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.jsonl"));
        store.append(&record("x", 1.0)).unwrap();
        store.append(&record("y", 2.0)).unwrap();
        store.append(&record("x", 3.0)).unwrap();

        let found = store.find_by_label("x").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].median(WorkloadKind::Primes), Some(3.0));
    }
}
