//! Printing the gathered candidate set.

use crate::OutputFormat;
use gather_core::SourceTaggedRecord;
use serde::Serialize;

#[derive(Serialize)]
struct JsonRecord<'a> {
    id: &'a str,
    version: String,
    source: &'a str,
    listed: bool,
    dependencies: Vec<JsonDependency<'a>>,
}

#[derive(Serialize)]
struct JsonDependency<'a> {
    id: &'a str,
    range: &'a str,
}

pub fn print(records: &[SourceTaggedRecord], format: OutputFormat) {
    match format {
        OutputFormat::Text => print_text(records),
        OutputFormat::Json => print_json(records),
    }
}

fn print_text(records: &[SourceTaggedRecord]) {
    if records.is_empty() {
        println!("(no candidates found)");
        return;
    }
    let mut sorted: Vec<&SourceTaggedRecord> = records.iter().collect();
    sorted.sort_by_key(|r| (r.record().identity().id_key(), r.source().as_str().to_string()));

    for tagged in sorted {
        let record = tagged.record();
        println!(
            "{}@{} [{}]{}",
            record.identity().id(),
            record.identity().version(),
            tagged.source(),
            if record.listed() { "" } else { " (unlisted)" }
        );
        for dep in record.dependencies() {
            println!("  depends: {} {}", dep.id(), dep.range());
        }
    }
    println!("\n{} candidate record(s)", records.len());
}

fn print_json(records: &[SourceTaggedRecord]) {
    let out: Vec<JsonRecord> = records
        .iter()
        .map(|tagged| {
            let record = tagged.record();
            JsonRecord {
                id: record.identity().id(),
                version: record.identity().version().to_string(),
                source: tagged.source().as_str(),
                listed: record.listed(),
                dependencies: record
                    .dependencies()
                    .iter()
                    .map(|d| JsonDependency {
                        id: d.id(),
                        range: d.range().as_str(),
                    })
                    .collect(),
            }
        })
        .collect();
    match serde_json::to_string_pretty(&out) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to serialize output: {e}"),
    }
}
