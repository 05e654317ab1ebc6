//! Plot-ready data series extracted from the analysis table
//!
//! Everything here is plain data so chart content can be tested without
//! rendering.

use chrono::Datelike;
use cinemetrics_core::columns::*;
use cinemetrics_core::{Table, Value};
use cinemetrics_engine::aggregate::{self, group_rows, numeric_values};

/// Derived column holding the release year
pub const RELEASE_YEAR: &str = "release_year";

/// Add `release_year` (from `release_date`) and `is_franchise`
pub fn prepare(table: Table) -> Table {
    let table = if table.has_column(RELEASE_DATE) {
        table.with_derived(RELEASE_YEAR, |row| {
            row.value(RELEASE_DATE)
                .as_date()
                .map(|d| Value::Int(i64::from(d.year())))
                .unwrap_or(Value::Null)
        })
    } else {
        table
    };

    if table.has_column(BELONGS_TO_COLLECTION) {
        table.with_derived(IS_FRANCHISE, |row| Value::Bool(!row.is_null(BELONGS_TO_COLLECTION)))
    } else {
        table
    }
}

/// (budget, revenue) points split into (standalone, franchise)
pub fn budget_revenue_points(table: &Table) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    let mut standalone = Vec::new();
    let mut franchise = Vec::new();

    for row in table.rows() {
        let (Some(budget), Some(revenue)) = (row.float(BUDGET_MUSD), row.float(REVENUE_MUSD)) else {
            continue;
        };
        if row.get(IS_FRANCHISE).and_then(Value::as_bool).unwrap_or(false) {
            franchise.push((budget, revenue));
        } else {
            standalone.push((budget, revenue));
        }
    }

    (standalone, franchise)
}

/// Median ROI per genre, ascending
///
/// Each movie counts once for every genre in its pipe-delimited list.
/// Genres without a single ROI value are left out.
pub fn genre_median_roi(table: &Table) -> Vec<(String, f64)> {
    let mut per_genre: std::collections::BTreeMap<String, Vec<f64>> = Default::default();

    for row in table.rows() {
        let (Some(genres), Some(roi)) = (row.text(GENRES), row.float(ROI)) else {
            continue;
        };
        for genre in genres.split('|').map(str::trim).filter(|g| !g.is_empty()) {
            per_genre.entry(genre.to_string()).or_default().push(roi);
        }
    }

    let mut medians: Vec<(String, f64)> = per_genre
        .into_iter()
        .filter_map(|(genre, rois)| aggregate::median(&rois).map(|m| (genre, m)))
        .collect();
    medians.sort_by(|a, b| a.1.total_cmp(&b.1));
    medians
}

/// Per-year aggregates
#[derive(Debug, Clone, PartialEq)]
pub struct YearStats {
    pub year: i32,
    pub movie_count: usize,
    pub revenue_mean: Option<f64>,
    pub budget_mean: Option<f64>,
    pub roi_mean: Option<f64>,
}

/// Yearly aggregates, oldest year first
pub fn yearly_trends(table: &Table) -> Vec<YearStats> {
    let groups = group_rows(table, |row| row.int(RELEASE_YEAR).and_then(|y| i32::try_from(y).ok()));

    groups
        .into_iter()
        .map(|(year, rows)| YearStats {
            year,
            movie_count: rows
                .iter()
                .filter(|&&i| table.get(i, TITLE).is_some_and(|v| !v.is_null()))
                .count(),
            revenue_mean: aggregate::mean(&numeric_values(table, &rows, REVENUE_MUSD)),
            budget_mean: aggregate::mean(&numeric_values(table, &rows, BUDGET_MUSD)),
            roi_mean: aggregate::mean(&numeric_values(table, &rows, ROI)),
        })
        .collect()
}

/// Mean of one metric for each category
#[derive(Debug, Clone, PartialEq)]
pub struct FranchiseMetric {
    pub title: &'static str,
    pub column: &'static str,
    pub standalone: Option<f64>,
    pub franchise: Option<f64>,
}

/// Metrics compared between standalone and franchise movies
pub const FRANCHISE_METRICS: [(&str, &str); 4] = [
    ("Revenue", REVENUE_MUSD),
    ("ROI", ROI),
    ("Budget", BUDGET_MUSD),
    ("Rating", VOTE_AVERAGE),
];

/// Number of distinct franchise categories present
pub fn franchise_categories(table: &Table) -> usize {
    group_rows(table, |row| row.get(IS_FRANCHISE).and_then(Value::as_bool)).len()
}

/// Category means for each compared metric
pub fn franchise_means(table: &Table) -> Vec<FranchiseMetric> {
    let groups = group_rows(table, |row| row.get(IS_FRANCHISE).and_then(Value::as_bool));
    let mean_of = |flag: bool, column: &str| {
        groups
            .get(&flag)
            .and_then(|rows| aggregate::mean(&numeric_values(table, rows, column)))
    };

    FRANCHISE_METRICS
        .iter()
        .map(|&(title, column)| FranchiseMetric {
            title,
            column,
            standalone: mean_of(false, column),
            franchise: mean_of(true, column),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn table() -> Table {
        let date = |y| Value::Date(NaiveDate::from_ymd_opt(y, 6, 1).unwrap());
        let t = Table::from_rows(
            vec![
                TITLE.into(),
                RELEASE_DATE.into(),
                BELONGS_TO_COLLECTION.into(),
                GENRES.into(),
                BUDGET_MUSD.into(),
                REVENUE_MUSD.into(),
                ROI.into(),
                VOTE_AVERAGE.into(),
            ],
            vec![
                vec![
                    Value::from("A"),
                    date(2019),
                    Value::from("Saga"),
                    Value::from("Action|Drama"),
                    Value::Float(100.0),
                    Value::Float(400.0),
                    Value::Float(4.0),
                    Value::Float(8.0),
                ],
                vec![
                    Value::from("B"),
                    date(2019),
                    Value::Null,
                    Value::from("Drama"),
                    Value::Float(10.0),
                    Value::Float(20.0),
                    Value::Float(2.0),
                    Value::Float(6.0),
                ],
                vec![
                    Value::from("C"),
                    date(2015),
                    Value::Null,
                    Value::from("Action"),
                    Value::Null,
                    Value::Float(30.0),
                    Value::Null,
                    Value::Float(7.0),
                ],
            ],
        )
        .unwrap();
        prepare(t)
    }

    #[test]
    fn prepare_adds_year_and_flag() {
        let t = table();
        assert_eq!(t.get(0, RELEASE_YEAR), Some(&Value::Int(2019)));
        assert_eq!(t.get(0, IS_FRANCHISE), Some(&Value::Bool(true)));
        assert_eq!(t.get(2, IS_FRANCHISE), Some(&Value::Bool(false)));
    }

    #[test]
    fn scatter_skips_incomplete_points() {
        let (standalone, franchise) = budget_revenue_points(&table());
        assert_eq!(standalone, vec![(10.0, 20.0)]);
        assert_eq!(franchise, vec![(100.0, 400.0)]);
    }

    #[test]
    fn genre_medians_ascending() {
        let medians = genre_median_roi(&table());
        assert_eq!(medians, vec![("Drama".to_string(), 3.0), ("Action".to_string(), 4.0)]);
    }

    #[test]
    fn yearly_groups_sorted() {
        let years = yearly_trends(&table());
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2015);
        assert_eq!(years[0].budget_mean, None);
        assert_eq!(years[1].movie_count, 2);
        assert_eq!(years[1].revenue_mean, Some(210.0));
    }

    #[test]
    fn franchise_metric_means() {
        let t = table();
        assert_eq!(franchise_categories(&t), 2);
        let metrics = franchise_means(&t);
        assert_eq!(metrics[0].title, "Revenue");
        assert_eq!(metrics[0].standalone, Some(25.0));
        assert_eq!(metrics[0].franchise, Some(400.0));
        assert_eq!(metrics[1].standalone, Some(2.0));
    }
}
