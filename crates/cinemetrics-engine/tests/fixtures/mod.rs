//! Raw Record fixtures shaped like catalog responses
//!
//! Each builder returns one complete movie record. Tests tweak individual
//! fields on top of these.

#![allow(dead_code)]

use cinemetrics_core::raw::records_from_value;
use cinemetrics_core::RawRecord;
use serde_json::{json, Value};

fn record(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        _ => panic!("fixture must be an object"),
    }
}

/// A fully populated franchise movie with credits
pub fn endgame() -> RawRecord {
    record(json!({
        "adult": false,
        "belongs_to_collection": {"id": 86311, "name": "The Avengers Collection"},
        "budget": 356000000,
        "genres": [{"id": 12, "name": "Adventure"}, {"id": 878, "name": "Science Fiction"}, {"id": 28, "name": "Action"}],
        "homepage": "https://example.com/endgame",
        "id": 299534,
        "imdb_id": "tt4154796",
        "original_language": "en",
        "original_title": "Avengers: Endgame",
        "overview": "After the devastating events of Infinity War, the universe is in ruins.",
        "popularity": 95.2,
        "poster_path": "/or06FN3Dka5tukK1e9sl16pB3iy.jpg",
        "production_companies": [{"id": 420, "name": "Marvel Studios"}],
        "production_countries": [{"iso_3166_1": "US", "name": "United States of America"}],
        "release_date": "2019-04-24",
        "revenue": 2799439100u64,
        "runtime": 181,
        "spoken_languages": [{"iso_639_1": "en", "name": "English"}, {"iso_639_1": "ja", "name": "Japanese"}],
        "status": "Released",
        "tagline": "Avenge the fallen.",
        "title": "Avengers: Endgame",
        "video": false,
        "vote_average": 8.2,
        "vote_count": 24000,
        "credits": {
            "cast": [
                {"name": "Robert Downey Jr."},
                {"name": "Chris Evans"},
                {"name": "Mark Ruffalo"},
                {"name": "Chris Hemsworth"},
                {"name": "Scarlett Johansson"},
                {"name": "Jeremy Renner"}
            ],
            "crew": [
                {"name": "Anthony Russo", "job": "Director"},
                {"name": "Joe Russo", "job": "Director"},
                {"name": "Kevin Feige", "job": "Producer"}
            ]
        }
    }))
}

/// A standalone movie
pub fn titanic() -> RawRecord {
    record(json!({
        "adult": false,
        "belongs_to_collection": null,
        "budget": 200000000,
        "genres": [{"id": 18, "name": "Drama"}, {"id": 10749, "name": "Romance"}],
        "id": 597,
        "imdb_id": "tt0120338",
        "original_language": "en",
        "original_title": "Titanic",
        "overview": "101-year-old Rose DeWitt Bukater tells the story of her life aboard the Titanic.",
        "popularity": 60.1,
        "poster_path": "/9xjZS2rlVxm8SFx8kPC3aIGCOYQ.jpg",
        "production_companies": [{"id": 4, "name": "Paramount"}, {"id": 25, "name": "20th Century Fox"}],
        "production_countries": [{"iso_3166_1": "US", "name": "United States of America"}],
        "release_date": "1997-11-18",
        "revenue": 2264162353u64,
        "runtime": 194,
        "spoken_languages": [{"iso_639_1": "en", "name": "English"}],
        "status": "Released",
        "tagline": "Nothing on Earth could come between them.",
        "title": "Titanic",
        "video": false,
        "vote_average": 7.9,
        "vote_count": 23000,
        "credits": {
            "cast": [{"name": "Leonardo DiCaprio"}, {"name": "Kate Winslet"}],
            "crew": [{"name": "James Cameron", "job": "Director"}]
        }
    }))
}

/// A record that has not been released
pub fn rumored() -> RawRecord {
    let mut r = titanic();
    r.insert("id".into(), json!(424242));
    r.insert("title".into(), json!("Titanic II"));
    r.insert("status".into(), json!("Rumored"));
    r
}

/// A record with placeholders where data is unknown
pub fn sparse_unknowns() -> RawRecord {
    let mut r = titanic();
    r.insert("id".into(), json!(777));
    r.insert("title".into(), json!("Unknown Quantities"));
    r.insert("budget".into(), json!(0));
    r.insert("revenue".into(), json!(0));
    r.insert("runtime".into(), json!(0));
    r.insert("vote_count".into(), json!(0));
    r.insert("vote_average".into(), json!(0.0));
    r.insert("overview".into(), json!("No overview found."));
    r.insert("release_date".into(), json!("TBA"));
    r
}

/// The scenario record with only identity, money, genres and collection
pub fn scenario_records() -> Vec<RawRecord> {
    records_from_value(json!([{
        "id": 100,
        "title": "Test Movie",
        "budget": 1000000,
        "revenue": 2000000,
        "status": "Released",
        "genres": [{"name": "Action"}, {"name": "Sci-Fi"}],
        "belongs_to_collection": {"name": "Test Collection"}
    }]))
    .expect("scenario is record-shaped")
}

/// A small catalog batch with a duplicate and a rumored title
pub fn batch() -> Vec<RawRecord> {
    vec![endgame(), titanic(), endgame(), rumored(), sparse_unknowns()]
}
