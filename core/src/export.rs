use serde_json::{json, Value};
use std::io::Write;

use crate::index::IndexStore;
use crate::record::{FieldValue, Record};
use crate::search::SearchHit;

/// All stored documents ordered by id, as a JSON array.
pub fn documents_json(store: &IndexStore) -> Value {
    Value::Array(store.documents().map(|(_, rec)| rec.to_json()).collect())
}

fn json_or(record: &Record, name: &str, default: Value) -> Value {
    record.get(name).map(FieldValue::to_json).unwrap_or(default)
}

pub fn hit_json(hit: &SearchHit<'_>) -> Value {
    let r = hit.record;
    json!({
        "title": json_or(r, "title", Value::Null),
        "authors": json_or(r, "authors", Value::Null),
        "year": json_or(r, "year", Value::Null),
        "relevance_score": hit.score,
        "abstract": json_or(r, "abstract", json!("")),
        "keywords": json_or(r, "keywords", json!([])),
        "publication_link": json_or(r, "publication_link", json!("")),
        "profile_link": json_or(r, "profile_link", json!("")),
    })
}

pub fn results_json(hits: &[SearchHit<'_>]) -> Value {
    Value::Array(hits.iter().map(hit_json).collect())
}

fn display_text(value: Option<&FieldValue>, sep: &str) -> String {
    match value {
        Some(FieldValue::List(items)) => items.join(sep),
        Some(v) => v.as_text().unwrap_or_default(),
        None => String::new(),
    }
}

/// Results as CSV: `Title, Authors, Year, Relevance Score, Link`.
pub fn write_results_csv<W: Write>(hits: &[SearchHit<'_>], out: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["Title", "Authors", "Year", "Relevance Score", "Link"])?;
    for hit in hits {
        let r = hit.record;
        wtr.write_record([
            display_text(r.get("title"), ", "),
            display_text(r.get("authors"), ", "),
            display_text(r.get("year"), ", "),
            format!("{:.2}", hit.score),
            display_text(r.get("publication_link"), ", "),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> IndexStore {
        let mut s = IndexStore::default();
        s.insert(
            0,
            Record::new()
                .with("title", "Graphs, Trees and Forests")
                .with("authors", vec!["Ada Lovelace", "Alan Turing"])
                .with("year", "2021")
                .with("publication_link", "https://example.org/p/0"),
        );
        s
    }

    #[test]
    fn csv_quotes_and_formats_score() {
        let s = store();
        let hits = s.search("graphs");
        let mut buf = Vec::new();
        write_results_csv(&hits, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Title,Authors,Year,Relevance Score,Link"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"Graphs, Trees and Forests\",\"Ada Lovelace, Alan Turing\",2021,"));
        assert!(row.ends_with(",https://example.org/p/0"));
        assert_eq!(row.rsplit(',').nth(1).unwrap(), format!("{:.2}", hits[0].score));
    }

    #[test]
    fn json_fills_missing_fields() {
        let mut s = IndexStore::default();
        s.insert(0, Record::new().with("title", "Graph"));
        let hits = s.search("graph");
        let v = hit_json(&hits[0]);
        assert_eq!(v["title"], "Graph");
        assert_eq!(v["keywords"], json!([]));
        assert_eq!(v["abstract"], "");
        assert_eq!(documents_json(&s), json!([{"title": "Graph"}]));
    }
}
