//! KPI computation, rankings and group comparisons
//!
//! The Analyzer owns its own copy of the Clean Table. KPI columns are
//! attached once at construction; every query afterwards is read-only.

use crate::aggregate::{self, group_rows, numeric_values, rounded};
use crate::enrichment;
use crate::query::{KpiRanking, RankQuery};
use cinemetrics_core::columns::*;
use cinemetrics_core::tabular::{self, TableIoError};
use cinemetrics_core::{RawRecord, Schema, Table, TableError, Value};
use std::cmp::Ordering;
use std::path::Path;

/// Label for rows without a collection
pub const STANDALONE: &str = "Standalone";

/// Label for rows belonging to a collection
pub const FRANCHISE: &str = "Franchise";

/// Errors raised by analysis queries
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Cleaned data missing: {0}. Run the transform step first.")]
    MissingInput(String),

    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    #[error(transparent)]
    Io(#[from] TableIoError),

    #[error(transparent)]
    Shape(#[from] TableError),
}

/// Analysis over an enriched Clean Table
#[derive(Debug, Clone, PartialEq)]
pub struct Analyzer {
    table: Table,
}

impl Analyzer {
    /// Take ownership of a Clean Table and attach the KPI columns
    pub fn new(table: Table) -> Self {
        let table = add_kpis(table);
        tracing::info!(rows = table.len(), "KPIs computed");
        Self { table }
    }

    /// Load the persisted Clean Table
    pub fn from_csv(path: &Path) -> Result<Self, AnalysisError> {
        if !path.exists() {
            tracing::error!("Cleaned data missing: {}", path.display());
            return Err(AnalysisError::MissingInput(path.display().to_string()));
        }

        let table = tabular::load_csv(path, &Schema::enriched_table())?;
        tracing::info!("Loaded {} rows from {}", table.len(), path.display());
        Ok(Self::new(table))
    }

    /// Join `cast` and `director` from the Raw Records
    pub fn enrich_with_credits(self, records: &[RawRecord]) -> Self {
        Self {
            table: enrichment::enrich_with_credits(self.table, records),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    /// Rank rows on one column
    ///
    /// Filters apply first. The sort is stable, so ties keep table order, and
    /// null criteria values always sort last.
    pub fn rank(&self, query: &RankQuery) -> Result<Table, AnalysisError> {
        let criteria = query.criteria();
        self.require(&query.required_columns())?;

        let mut indices: Vec<usize> = self
            .table
            .rows()
            .filter(|row| query.matches(*row))
            .map(|row| row.index())
            .collect();

        let table = &self.table;
        indices.sort_by(|&a, &b| {
            let (Some(va), Some(vb)) = (table.get(a, criteria), table.get(b, criteria)) else {
                return Ordering::Equal;
            };
            match (va.is_null(), vb.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) if query.is_ascending() => va.sort_cmp(vb),
                (false, false) => vb.sort_cmp(va),
            }
        });
        indices.truncate(query.limit());

        let projection = query.projection();
        let shown: Vec<&str> = projection
            .iter()
            .map(String::as_str)
            .filter(|c| self.table.has_column(c))
            .collect();

        Ok(self.table.select_rows(&indices).reindex(&shown))
    }

    /// One of the standard KPI rankings
    pub fn kpi_ranking(&self, kpi: KpiRanking, top: usize) -> Result<Table, AnalysisError> {
        tracing::debug!(kpi = kpi.title(), top, "Ranking");
        self.rank(&kpi.query(top))
    }

    /// Franchise vs standalone comparison
    ///
    /// Produces one row per group actually present, `Standalone` first.
    pub fn franchise_vs_standalone(&self) -> Result<Table, AnalysisError> {
        self.require(&[REVENUE_MUSD, ROI, BUDGET_MUSD, POPULARITY, VOTE_AVERAGE])?;

        let groups = group_rows(&self.table, |row| Some(!row.is_null(BELONGS_TO_COLLECTION)));

        let mut out = Table::new(
            [
                "category",
                "revenue_musd_mean",
                "roi_median",
                "budget_musd_mean",
                "popularity_mean",
                "vote_average_mean",
                "movie_count",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        );

        for (is_franchise, rows) in &groups {
            let label = if *is_franchise { FRANCHISE } else { STANDALONE };
            let values = |column: &str| numeric_values(&self.table, rows, column);

            out.push_row(vec![
                Value::from(label),
                rounded(aggregate::mean(&values(REVENUE_MUSD))),
                rounded(aggregate::median(&values(ROI))),
                rounded(aggregate::mean(&values(BUDGET_MUSD))),
                rounded(aggregate::mean(&values(POPULARITY))),
                rounded(aggregate::mean(&values(VOTE_AVERAGE))),
                Value::Int(rows.len() as i64),
            ])?;
        }

        Ok(out)
    }

    /// Collections ranked by total revenue
    pub fn top_franchises(&self, n: usize) -> Result<Table, AnalysisError> {
        self.top_groups(BELONGS_TO_COLLECTION, n)
    }

    /// Directors ranked by total revenue
    pub fn top_directors(&self, n: usize) -> Result<Table, AnalysisError> {
        self.top_groups(DIRECTOR, n)
    }

    fn top_groups(&self, key_column: &str, n: usize) -> Result<Table, AnalysisError> {
        self.require(&[key_column, BUDGET_MUSD, REVENUE_MUSD, VOTE_AVERAGE])?;

        let groups = group_rows(&self.table, |row| {
            row.text(key_column)
                .filter(|k| !k.trim().is_empty())
                .map(str::to_string)
        });

        let mut summaries: Vec<(f64, Vec<Value>)> = groups
            .iter()
            .map(|(key, rows)| {
                let budget = numeric_values(&self.table, rows, BUDGET_MUSD);
                let revenue = numeric_values(&self.table, rows, REVENUE_MUSD);
                let votes = numeric_values(&self.table, rows, VOTE_AVERAGE);
                let revenue_sum = aggregate::sum(&revenue);

                let row = vec![
                    Value::from(key.as_str()),
                    Value::Int(rows.len() as i64),
                    rounded(Some(aggregate::sum(&budget))),
                    rounded(aggregate::mean(&budget)),
                    rounded(Some(revenue_sum)),
                    rounded(aggregate::mean(&revenue)),
                    rounded(aggregate::mean(&votes)),
                ];
                (revenue_sum, row)
            })
            .collect();

        summaries.sort_by(|a, b| b.0.total_cmp(&a.0));
        summaries.truncate(n);

        let columns = vec![
            key_column.to_string(),
            "movie_count".to_string(),
            "budget_musd_sum".to_string(),
            "budget_musd_mean".to_string(),
            "revenue_musd_sum".to_string(),
            "revenue_musd_mean".to_string(),
            "vote_average_mean".to_string(),
        ];
        Ok(Table::from_rows(columns, summaries.into_iter().map(|(_, row)| row).collect())?)
    }

    fn require(&self, columns: &[&str]) -> Result<(), AnalysisError> {
        match columns.iter().find(|c| !self.table.has_column(c)) {
            Some(missing) => Err(AnalysisError::ColumnNotFound(missing.to_string())),
            None => Ok(()),
        }
    }
}

/// Attach `profit_musd`, `roi` and `is_franchise`
///
/// ROI is null unless the budget is strictly positive, so it is never
/// infinite. Recomputing on a table that already has the columns replaces
/// them in place.
pub fn add_kpis(table: Table) -> Table {
    table
        .with_derived(PROFIT_MUSD, |row| match (row.float(REVENUE_MUSD), row.float(BUDGET_MUSD)) {
            (Some(revenue), Some(budget)) => Value::float(revenue - budget),
            _ => Value::Null,
        })
        .with_derived(ROI, |row| match (row.float(REVENUE_MUSD), row.float(BUDGET_MUSD)) {
            (Some(revenue), Some(budget)) if budget > 0.0 => Value::float(revenue / budget),
            _ => Value::Null,
        })
        .with_derived(IS_FRANCHISE, |row| Value::Bool(!row.is_null(BELONGS_TO_COLLECTION)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::list_contains;
    use pretty_assertions::assert_eq;

    fn movie(title: &str, collection: Option<&str>, budget: Option<f64>, revenue: Option<f64>) -> Vec<Value> {
        vec![
            Value::from(title),
            collection.map(Value::from).unwrap_or(Value::Null),
            Value::from_opt_f64(budget),
            Value::from_opt_f64(revenue),
            Value::Float(10.0),
            Value::Float(7.0),
            Value::from("Action"),
        ]
    }

    fn table() -> Table {
        Table::from_rows(
            vec![
                TITLE.into(),
                BELONGS_TO_COLLECTION.into(),
                BUDGET_MUSD.into(),
                REVENUE_MUSD.into(),
                POPULARITY.into(),
                VOTE_AVERAGE.into(),
                GENRES.into(),
            ],
            vec![
                movie("A", Some("Saga"), Some(100.0), Some(400.0)),
                movie("B", None, Some(0.0), Some(50.0)),
                movie("C", Some("Saga"), Some(200.0), Some(300.0)),
                movie("D", None, None, Some(80.0)),
                movie("E", Some("Other"), Some(10.0), Some(900.0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn kpis_added() {
        let a = Analyzer::new(table());
        let t = a.table();
        assert_eq!(t.get(0, PROFIT_MUSD), Some(&Value::Float(300.0)));
        assert_eq!(t.get(0, ROI), Some(&Value::Float(4.0)));
        assert_eq!(t.get(0, IS_FRANCHISE), Some(&Value::Bool(true)));
        assert_eq!(t.get(1, IS_FRANCHISE), Some(&Value::Bool(false)));
    }

    #[test]
    fn roi_null_without_positive_budget() {
        let a = Analyzer::new(table());
        assert_eq!(a.table().get(1, ROI), Some(&Value::Null));
        assert_eq!(a.table().get(3, ROI), Some(&Value::Null));
        assert_eq!(a.table().get(3, PROFIT_MUSD), Some(&Value::Null));
    }

    #[test]
    fn rank_puts_nulls_last() {
        let a = Analyzer::new(table());
        let t = a.rank(&RankQuery::by(ROI).top(10)).unwrap();
        let titles: Vec<_> = t.rows().map(|r| r.value(TITLE).to_string()).collect();
        assert_eq!(titles, vec!["E", "A", "C", "B", "D"]);

        let t = a.rank(&RankQuery::by(ROI).ascending(true).top(10)).unwrap();
        let titles: Vec<_> = t.rows().map(|r| r.value(TITLE).to_string()).collect();
        assert_eq!(titles, vec!["C", "A", "E", "B", "D"]);
    }

    #[test]
    fn rank_is_stable_on_ties() {
        let a = Analyzer::new(table());
        let t = a.rank(&RankQuery::by(POPULARITY).top(3)).unwrap();
        let titles: Vec<_> = t.rows().map(|r| r.value(TITLE).to_string()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn rank_filters_and_projects() {
        let a = Analyzer::new(table());
        let q = RankQuery::by(REVENUE_MUSD)
            .filter(list_contains(BELONGS_TO_COLLECTION, "Saga"))
            .show(&[TITLE, REVENUE_MUSD, "not_a_column"]);
        let t = a.rank(&q).unwrap();
        assert_eq!(t.columns(), &[TITLE.to_string(), REVENUE_MUSD.to_string()]);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn rank_unknown_column() {
        let a = Analyzer::new(table());
        let err = a.rank(&RankQuery::by("box_office")).unwrap_err();
        assert!(matches!(err, AnalysisError::ColumnNotFound(c) if c == "box_office"));
    }

    #[test]
    fn franchise_comparison() {
        let a = Analyzer::new(table());
        let t = a.franchise_vs_standalone().unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0, "category"), Some(&Value::from(STANDALONE)));
        assert_eq!(t.get(0, "movie_count"), Some(&Value::Int(2)));
        assert_eq!(t.get(0, "revenue_musd_mean"), Some(&Value::Float(65.0)));
        assert_eq!(t.get(0, "roi_median"), Some(&Value::Null));
        assert_eq!(t.get(1, "category"), Some(&Value::from(FRANCHISE)));
        assert_eq!(t.get(1, "roi_median"), Some(&Value::Float(4.0)));
    }

    #[test]
    fn franchise_comparison_single_group() {
        let only_standalone = table().filter_rows(|r| r.is_null(BELONGS_TO_COLLECTION));
        let t = Analyzer::new(only_standalone).franchise_vs_standalone().unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(0, "category"), Some(&Value::from(STANDALONE)));
    }

    #[test]
    fn top_franchises_by_revenue_sum() {
        let t = Analyzer::new(table()).top_franchises(5).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0, BELONGS_TO_COLLECTION), Some(&Value::from("Other")));
        assert_eq!(t.get(1, BELONGS_TO_COLLECTION), Some(&Value::from("Saga")));
        assert_eq!(t.get(1, "movie_count"), Some(&Value::Int(2)));
        assert_eq!(t.get(1, "revenue_musd_sum"), Some(&Value::Float(700.0)));
        assert_eq!(t.get(1, "budget_musd_mean"), Some(&Value::Float(150.0)));

        let t = Analyzer::new(table()).top_franchises(1).unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn top_directors_needs_enrichment() {
        let err = Analyzer::new(table()).top_directors(5).unwrap_err();
        assert!(matches!(err, AnalysisError::ColumnNotFound(c) if c == DIRECTOR));
    }

    #[test]
    fn missing_csv_is_reported() {
        let err = Analyzer::from_csv(Path::new("/no/such/movies_clean.csv")).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingInput(_)));
        assert!(err.to_string().contains("Run the transform step first"));
    }
}
