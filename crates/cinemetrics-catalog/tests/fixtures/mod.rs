//! Test fixtures for record source integration tests
//!
//! Minimal catalog responses for a handful of well-known movie ids. They
//! carry just enough structure (credits included) to exercise the fetch
//! loop end to end.

#![allow(dead_code)]

use cinemetrics_core::RawRecord;
use serde_json::{json, Value};

/// Ids requested by the default configuration, placeholder first
pub const REQUESTED_IDS: &[u64] = &[0, 299534, 19995, 597];

fn record(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        _ => panic!("fixture must be an object"),
    }
}

/// A catalog response for a single movie
pub fn movie(id: u64, title: &str, budget: u64, revenue: u64) -> RawRecord {
    record(json!({
        "id": id,
        "title": title,
        "budget": budget,
        "revenue": revenue,
        "status": "Released",
        "genres": [{"id": 28, "name": "Action"}],
        "credits": {
            "cast": [{"name": "Lead Actor"}],
            "crew": [{"name": "Some Director", "job": "Director"}]
        }
    }))
}

pub fn endgame() -> RawRecord {
    movie(299534, "Avengers: Endgame", 356_000_000, 2_799_439_100)
}

pub fn avatar() -> RawRecord {
    movie(19995, "Avatar", 237_000_000, 2_923_706_026)
}

pub fn titanic() -> RawRecord {
    movie(597, "Titanic", 200_000_000, 2_264_162_353)
}

pub fn catalog() -> Vec<RawRecord> {
    vec![endgame(), avatar(), titanic()]
}
