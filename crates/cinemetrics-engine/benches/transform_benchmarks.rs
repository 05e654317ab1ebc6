//! Benchmarks for the transformation pipeline and analysis queries
//!
//! These measure how the Transformer and Analyzer scale with the number of
//! Raw Records in a batch.

use cinemetrics_core::raw::records_from_value;
use cinemetrics_core::RawRecord;
use cinemetrics_engine::{Analyzer, KpiRanking, Transformer};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Generate N catalog-shaped records, every tenth one a duplicate
fn generate_records(n: usize) -> Vec<RawRecord> {
    let items: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            let id = (if i % 10 == 9 { i - 1 } else { i }) as i64 + 1;
            serde_json::json!({
                "id": id,
                "title": format!("Movie {}", id),
                "tagline": "A tagline.",
                "overview": "An overview.",
                "adult": false,
                "budget": (i % 50) * 1_000_000,
                "revenue": (i % 70) * 3_000_000,
                "runtime": 90 + (i % 60),
                "popularity": (i % 100) as f64 / 3.0,
                "vote_average": (i % 10) as f64,
                "vote_count": i % 500,
                "status": if i % 13 == 0 { "Rumored" } else { "Released" },
                "release_date": format!("20{:02}-0{}-1{}", i % 25, 1 + i % 9, i % 10),
                "original_language": "en",
                "poster_path": format!("/poster_{}.jpg", i),
                "belongs_to_collection": if i % 4 == 0 {
                    serde_json::json!({"name": format!("Collection {}", i % 20)})
                } else {
                    serde_json::Value::Null
                },
                "genres": [{"name": "Action"}, {"name": "Drama"}],
                "production_companies": [{"name": "Studio"}],
                "production_countries": [{"name": "United States of America"}],
                "spoken_languages": [{"name": "English"}],
                "credits": {
                    "cast": [{"name": "Lead"}, {"name": "Support"}],
                    "crew": [{"name": format!("Director {}", i % 30), "job": "Director"}]
                }
            })
        })
        .collect();

    records_from_value(serde_json::Value::Array(items)).unwrap()
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");

    for size in [100, 1_000, 10_000] {
        let records = generate_records(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            let transformer = Transformer::default();
            b.iter(|| transformer.transform(black_box(records)));
        });
    }

    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let records = generate_records(10_000);
    let table = Transformer::default().transform(&records);
    let analyzer = Analyzer::new(table).enrich_with_credits(&records);

    c.bench_function("rank_highest_roi", |b| {
        b.iter(|| analyzer.kpi_ranking(black_box(KpiRanking::HighestRoi), 10).unwrap())
    });

    c.bench_function("top_directors", |b| {
        b.iter(|| analyzer.top_directors(black_box(10)).unwrap())
    });

    c.bench_function("franchise_vs_standalone", |b| {
        b.iter(|| analyzer.franchise_vs_standalone().unwrap())
    });
}

criterion_group!(benches, bench_transform, bench_analysis);
criterion_main!(benches);
