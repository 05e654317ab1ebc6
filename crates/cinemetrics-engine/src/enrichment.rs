//! Credit enrichment
//!
//! Joins the Clean Table back to the Raw Records on `id` and derives the
//! `cast` and `director` columns from the nested `credits` structure.

use cinemetrics_core::columns::{CAST, CREDITS, DIRECTOR, ID};
use cinemetrics_core::{RawRecord, RowRef, Table, Value};
use std::collections::HashMap;

/// Number of leading cast members kept
pub const TOP_CAST: usize = 5;

/// Crew job identifying a director
pub const DIRECTOR_JOB: &str = "Director";

/// Cast and director names derived from one record's credits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credits {
    pub cast: String,
    pub director: String,
}

impl Credits {
    /// Derive credits from a raw record; missing structure yields empty strings
    pub fn from_record(record: &RawRecord) -> Self {
        let Some(credits) = record.get(CREDITS) else {
            return Self::default();
        };

        let cast = credits
            .get("cast")
            .and_then(serde_json::Value::as_array)
            .map(|members| {
                members
                    .iter()
                    .take(TOP_CAST)
                    .filter_map(|m| m.get("name").and_then(serde_json::Value::as_str))
                    .collect::<Vec<_>>()
                    .join("|")
            })
            .unwrap_or_default();

        let director = credits
            .get("crew")
            .and_then(serde_json::Value::as_array)
            .map(|crew| {
                crew.iter()
                    .filter(|m| m.get("job").and_then(serde_json::Value::as_str) == Some(DIRECTOR_JOB))
                    .filter_map(|m| m.get("name").and_then(serde_json::Value::as_str))
                    .collect::<Vec<_>>()
                    .join("|")
            })
            .unwrap_or_default();

        Self { cast, director }
    }
}

/// Index raw records by id; the first record for an id wins
pub fn credits_by_id(records: &[RawRecord]) -> HashMap<i64, Credits> {
    let mut index = HashMap::new();
    for record in records {
        let Some(id) = record.get(ID).and_then(record_id) else {
            continue;
        };
        index.entry(id).or_insert_with(|| Credits::from_record(record));
    }
    index
}

/// Left-join credits onto the table
///
/// Every table row is kept; raw records with no matching row are ignored.
/// Re-running replaces `cast`/`director` in place.
pub fn enrich_with_credits(table: Table, records: &[RawRecord]) -> Table {
    let index = credits_by_id(records);
    let matched = table
        .rows()
        .filter(|row| row.int(ID).is_some_and(|id| index.contains_key(&id)))
        .count();

    tracing::info!(rows = table.len(), matched, "Enriching with credits");

    let lookup = |row: RowRef<'_>| row.int(ID).and_then(|id| index.get(&id));

    table
        .drop_columns(&[CREDITS])
        .with_derived(CAST, |row| {
            Value::Text(lookup(row).map(|c| c.cast.clone()).unwrap_or_default())
        })
        .with_derived(DIRECTOR, |row| {
            Value::Text(lookup(row).map(|c| c.director.clone()).unwrap_or_default())
        })
}

fn record_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinemetrics_core::raw::records_from_value;
    use serde_json::json;

    fn records() -> Vec<RawRecord> {
        records_from_value(json!([
            {
                "id": 1,
                "credits": {
                    "cast": [
                        {"name": "A"}, {"name": "B"}, {"name": "C"},
                        {"name": "D"}, {"name": "E"}, {"name": "F"}
                    ],
                    "crew": [
                        {"name": "X", "job": "Director"},
                        {"name": "Y", "job": "Producer"},
                        {"name": "Z", "job": "Director"}
                    ]
                }
            },
            {"id": 2},
            {"id": 1, "credits": {"cast": [{"name": "Later"}], "crew": []}},
            {"id": 99, "credits": {"cast": [{"name": "Unmatched"}]}}
        ]))
        .unwrap()
    }

    fn table() -> Table {
        Table::from_rows(
            vec!["id".into(), "title".into()],
            vec![
                vec![Value::Int(1), Value::from("One")],
                vec![Value::Int(2), Value::from("Two")],
                vec![Value::Int(3), Value::from("Three")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn top_five_cast_and_directors() {
        let t = enrich_with_credits(table(), &records());
        assert_eq!(t.get(0, CAST), Some(&Value::from("A|B|C|D|E")));
        assert_eq!(t.get(0, DIRECTOR), Some(&Value::from("X|Z")));
    }

    #[test]
    fn missing_credits_are_empty_strings() {
        let t = enrich_with_credits(table(), &records());
        assert_eq!(t.get(1, CAST), Some(&Value::from("")));
        assert_eq!(t.get(1, DIRECTOR), Some(&Value::from("")));
        assert_eq!(t.get(2, CAST), Some(&Value::from("")));
    }

    #[test]
    fn left_join_keeps_rows() {
        let t = enrich_with_credits(table(), &records());
        assert_eq!(t.len(), 3);
        assert_eq!(t.width(), 4);
    }

    #[test]
    fn enrichment_is_idempotent() {
        let once = enrich_with_credits(table(), &records());
        let twice = enrich_with_credits(once.clone(), &records());
        assert_eq!(once, twice);
    }

    #[test]
    fn credits_column_dropped() {
        let with_credits = table().with_derived(CREDITS, |_| Value::Null);
        let t = enrich_with_credits(with_credits, &records());
        assert!(!t.has_column(CREDITS));
    }
}
