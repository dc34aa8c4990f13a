//! JSON file inputs and outputs.

use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;
use crate::types::tags::ICP;

/// Parse records from a JSON array, a single object, or a sequence of
/// concatenated JSON values. In the last case text that fails to parse is
/// skipped up to the next line.
pub fn parse_json_records(text: &str) -> Vec<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => return items,
        Ok(Value::Object(map)) => return vec![Value::Object(map)],
        _ => {}
    }

    let mut records = Vec::new();
    let mut offset = 0;
    let mut skipped = 0usize;

    while offset < text.len() {
        let rest = &text[offset..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        offset += rest.len() - trimmed.len();

        let mut stream = serde_json::Deserializer::from_str(trimmed).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                records.push(value);
                offset += stream.byte_offset();
            }
            Some(Err(_)) => {
                skipped += 1;
                match trimmed.find('\n') {
                    Some(newline) => offset += newline + 1,
                    None => break,
                }
            }
            None => break,
        }
    }

    if skipped > 0 {
        warn!(skipped, parsed = records.len(), "Skipped unparseable input");
    }
    records
}

/// Read records from a JSON file. See [`parse_json_records`].
pub fn load_json_records(path: &Path) -> Result<Vec<Value>> {
    let text = fs::read_to_string(path)?;
    let records = parse_json_records(&text);
    info!(path = %path.display(), records = records.len(), "Loaded records");
    Ok(records)
}

/// Write `items` as a pretty-printed JSON array, creating parent directories.
pub fn write_json_array<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, items)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!(path = %path.display(), count = items.len(), "Wrote JSON array");
    Ok(())
}

/// Files written for a tagging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedOutputs {
    pub all: PathBuf,
    /// `(persona, path, entries)` for every persona with at least one entry.
    pub personas: Vec<(String, PathBuf, usize)>,
}

/// Write every tagged entry to `all_name` and each persona's entries to
/// `tagged_{persona}.json` inside `dir`. Persona matching ignores case.
pub fn write_tagged_outputs(dir: &Path, all_name: &str, entries: &[Value]) -> Result<TaggedOutputs> {
    let all = dir.join(all_name);
    write_json_array(&all, entries)?;

    let mut personas = Vec::new();
    for persona in ICP.values {
        let subset: Vec<&Value> = entries
            .iter()
            .filter(|entry| {
                entry
                    .get(ICP.key)
                    .and_then(Value::as_str)
                    .is_some_and(|tag| tag.to_lowercase() == *persona)
            })
            .collect();
        if subset.is_empty() {
            continue;
        }

        let path = dir.join(format!("tagged_{persona}.json"));
        write_json_array(&path, &subset)?;
        personas.push((persona.to_string(), path, subset.len()));
    }

    Ok(TaggedOutputs { all, personas })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_array_and_single_object() {
        assert_eq!(parse_json_records(r#"[{"a": 1}, {"a": 2}]"#).len(), 2);
        assert_eq!(parse_json_records(r#"{"a": 1}"#), vec![json!({ "a": 1 })]);
    }

    #[test]
    fn parses_concatenated_values_skipping_bad_lines() {
        let text = "{\"a\": 1}\n\n{\"a\": 2}{\"a\": 3}\nnot json at all\n{\"a\": 4}\n";
        let records = parse_json_records(text);
        assert_eq!(records, vec![json!({"a": 1}), json!({"a": 2}), json!({"a": 3}), json!({"a": 4})]);
    }

    #[test]
    fn empty_input() {
        assert!(parse_json_records("").is_empty());
        assert!(parse_json_records("   \n").is_empty());
        assert!(parse_json_records("garbage").is_empty());
    }

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("filtered.json");

        write_json_array(&path, &[json!({ "a": 1 }), json!({ "a": 2 })]).unwrap();
        assert_eq!(load_json_records(&path).unwrap().len(), 2);
    }

    #[test]
    fn partitions_by_persona() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![
            json!({ "id": 1, "icp_tag": "golfers" }),
            json!({ "id": 2, "icp_tag": "Golfers" }),
            json!({ "id": 3, "icp_tag": "moms" }),
            json!({ "id": 4, "icp_tag": "none" }),
            json!({ "id": 5 }),
        ];

        let outputs = write_tagged_outputs(dir.path(), "all_tagged.json", &entries).unwrap();
        assert_eq!(load_json_records(&outputs.all).unwrap().len(), 5);

        let names: Vec<_> = outputs.personas.iter().map(|(p, _, n)| (p.as_str(), *n)).collect();
        assert_eq!(names, [("moms", 1), ("golfers", 2)]);
        assert!(dir.path().join("tagged_golfers.json").exists());
        assert!(!dir.path().join("tagged_athletes.json").exists());
    }
}
