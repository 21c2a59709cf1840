use anyhow::{Context, Result};
use pubsearch_core::Record;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// `.json` / `.jsonl` files under `input` (or `input` itself), in path order.
pub fn collect_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn push_record(value: serde_json::Value, file: &Path, out: &mut Vec<Record>) {
    match Record::from_json(value) {
        Some(record) => out.push(record),
        None => tracing::warn!(file = %file.display(), "skipping non-object record"),
    }
}

pub fn read_records(file: &Path) -> Result<Vec<Record>> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let mut records = Vec::new();

    if extension(file) == Some("jsonl") {
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let value: serde_json::Value = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}: invalid JSON", file.display(), lineno + 1))?;
            push_record(value, file, &mut records);
        }
        return Ok(records);
    }

    let json: serde_json::Value =
        serde_json::from_reader(reader).with_context(|| format!("{}: invalid JSON", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                push_record(v, file, &mut records);
            }
        }
        other => push_record(other, file, &mut records),
    }
    Ok(records)
}

/// Every record under `input`, in file order then in-file order.
pub fn read_all(input: &Path) -> Result<Vec<Record>> {
    let files = collect_files(input);
    if files.is_empty() {
        anyhow::bail!("no .json or .jsonl input found at {}", input.display());
    }
    let mut records = Vec::new();
    for file in files {
        let mut batch = read_records(&file)?;
        tracing::debug!(file = %file.display(), records = batch.len(), "read input");
        records.append(&mut batch);
    }
    Ok(records)
}
