//! Ranking queries and row predicates

use cinemetrics_core::columns::*;
use cinemetrics_core::RowRef;
use std::fmt;

/// Boxed row predicate
pub type RowPredicate = Box<dyn Fn(RowRef<'_>) -> bool + Send + Sync>;

/// Rows shown by default
pub const DEFAULT_TOP: usize = 5;

/// A ranking request
///
/// ```
/// use cinemetrics_engine::query::{list_contains, RankQuery};
///
/// let query = RankQuery::by("vote_average")
///     .filter(list_contains("genres", "Action"))
///     .top(3);
/// assert_eq!(query.criteria(), "vote_average");
/// ```
pub struct RankQuery {
    criteria: String,
    ascending: bool,
    top: usize,
    filters: Vec<RowPredicate>,
    required: Vec<String>,
    show: Option<Vec<String>>,
}

impl RankQuery {
    /// Rank descending on `criteria`, keeping the default number of rows
    pub fn by(criteria: impl Into<String>) -> Self {
        Self {
            criteria: criteria.into(),
            ascending: false,
            top: DEFAULT_TOP,
            filters: Vec::new(),
            required: Vec::new(),
            show: None,
        }
    }

    pub fn ascending(mut self, ascending: bool) -> Self {
        self.ascending = ascending;
        self
    }

    pub fn top(mut self, n: usize) -> Self {
        self.top = n;
        self
    }

    /// Restrict to rows matching `predicate`; repeated calls combine with AND
    pub fn filter(mut self, predicate: impl Fn(RowRef<'_>) -> bool + Send + Sync + 'static) -> Self {
        self.filters.push(Box::new(predicate));
        self
    }

    /// Columns the filters read; ranking fails if any is missing
    ///
    /// Predicates skip rows lacking their column, so without this a missing
    /// column reads as "no matches".
    pub fn requires(mut self, columns: &[&str]) -> Self {
        for column in columns {
            if !self.required.iter().any(|c| c == column) {
                self.required.push(column.to_string());
            }
        }
        self
    }

    /// Columns to project, in order
    pub fn show(mut self, columns: &[&str]) -> Self {
        self.show = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn criteria(&self) -> &str {
        &self.criteria
    }

    /// The criteria column followed by every required filter column
    pub fn required_columns(&self) -> Vec<&str> {
        std::iter::once(self.criteria.as_str())
            .chain(self.required.iter().map(String::as_str))
            .collect()
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    pub fn limit(&self) -> usize {
        self.top
    }

    /// Whether a row passes every filter
    pub fn matches(&self, row: RowRef<'_>) -> bool {
        self.filters.iter().all(|f| f(row))
    }

    /// Requested projection, or the default one built around the criteria
    pub fn projection(&self) -> Vec<String> {
        if let Some(show) = &self.show {
            return show.clone();
        }

        let mut columns: Vec<String> = Vec::new();
        for name in [TITLE, self.criteria.as_str(), GENRES, REVENUE_MUSD, PROFIT_MUSD, ROI, VOTE_AVERAGE] {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
        columns
    }
}

impl fmt::Debug for RankQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RankQuery")
            .field("criteria", &self.criteria)
            .field("ascending", &self.ascending)
            .field("top", &self.top)
            .field("filters", &self.filters.len())
            .field("required", &self.required)
            .field("show", &self.show)
            .finish()
    }
}

/// Whether a pipe-delimited cell contains `value` as one of its items
pub fn list_contains(column: &str, value: &str) -> impl Fn(RowRef<'_>) -> bool + Send + Sync + 'static {
    let column = column.to_string();
    let value = value.to_string();
    move |row| {
        row.text(&column)
            .is_some_and(|cell| cell.split('|').any(|item| item.trim() == value))
    }
}

/// Whether a pipe-delimited cell contains every one of `values`
pub fn list_contains_all(column: &str, values: &[&str]) -> impl Fn(RowRef<'_>) -> bool + Send + Sync + 'static {
    let column = column.to_string();
    let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    move |row| {
        row.text(&column).is_some_and(|cell| {
            let items: Vec<&str> = cell.split('|').map(str::trim).collect();
            values.iter().all(|v| items.contains(&v.as_str()))
        })
    }
}

/// Whether a numeric cell is at least `threshold`
pub fn at_least(column: &str, threshold: f64) -> impl Fn(RowRef<'_>) -> bool + Send + Sync + 'static {
    let column = column.to_string();
    move |row| row.float(&column).is_some_and(|v| v >= threshold)
}

/// Budget floor for ROI rankings, in millions
pub const ROI_MIN_BUDGET_MUSD: f64 = 10.0;

/// Vote floor for rating rankings
pub const RATING_MIN_VOTES: f64 = 10.0;

/// Standard KPI rankings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KpiRanking {
    HighestRevenue,
    LowestRevenue,
    HighestBudget,
    HighestProfit,
    LowestProfit,
    HighestRoi,
    LowestRoi,
    MostVoted,
    HighestRated,
    LowestRated,
    MostPopular,
}

impl KpiRanking {
    pub const ALL: [KpiRanking; 11] = [
        Self::HighestRevenue,
        Self::LowestRevenue,
        Self::HighestBudget,
        Self::HighestProfit,
        Self::LowestProfit,
        Self::HighestRoi,
        Self::LowestRoi,
        Self::MostVoted,
        Self::HighestRated,
        Self::LowestRated,
        Self::MostPopular,
    ];

    /// Human-readable heading
    pub fn title(&self) -> &'static str {
        match self {
            Self::HighestRevenue => "Highest Revenue",
            Self::LowestRevenue => "Lowest Revenue",
            Self::HighestBudget => "Highest Budget",
            Self::HighestProfit => "Highest Profit",
            Self::LowestProfit => "Lowest Profit",
            Self::HighestRoi => "Highest ROI (Budget >= 10M)",
            Self::LowestRoi => "Lowest ROI (Budget >= 10M)",
            Self::MostVoted => "Most Voted",
            Self::HighestRated => "Highest Rated (>= 10 votes)",
            Self::LowestRated => "Lowest Rated (>= 10 votes)",
            Self::MostPopular => "Most Popular",
        }
    }

    /// The ranking as a query returning `top` rows
    pub fn query(&self, top: usize) -> RankQuery {
        let query = match self {
            Self::HighestRevenue => RankQuery::by(REVENUE_MUSD),
            Self::LowestRevenue => RankQuery::by(REVENUE_MUSD).ascending(true),
            Self::HighestBudget => RankQuery::by(BUDGET_MUSD),
            Self::HighestProfit => RankQuery::by(PROFIT_MUSD),
            Self::LowestProfit => RankQuery::by(PROFIT_MUSD).ascending(true),
            Self::HighestRoi => RankQuery::by(ROI)
                .filter(at_least(BUDGET_MUSD, ROI_MIN_BUDGET_MUSD))
                .requires(&[BUDGET_MUSD]),
            Self::LowestRoi => RankQuery::by(ROI)
                .ascending(true)
                .filter(at_least(BUDGET_MUSD, ROI_MIN_BUDGET_MUSD))
                .requires(&[BUDGET_MUSD]),
            Self::MostVoted => RankQuery::by(VOTE_COUNT),
            Self::HighestRated => RankQuery::by(VOTE_AVERAGE)
                .filter(at_least(VOTE_COUNT, RATING_MIN_VOTES))
                .requires(&[VOTE_COUNT]),
            Self::LowestRated => RankQuery::by(VOTE_AVERAGE)
                .ascending(true)
                .filter(at_least(VOTE_COUNT, RATING_MIN_VOTES))
                .requires(&[VOTE_COUNT]),
            Self::MostPopular => RankQuery::by(POPULARITY),
        };
        query.top(top)
    }
}

impl fmt::Display for KpiRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Action + Science Fiction titles starring Bruce Willis, best rated first
pub fn willis_scifi_action() -> RankQuery {
    RankQuery::by(VOTE_AVERAGE)
        .filter(list_contains_all(GENRES, &["Science Fiction", "Action"]))
        .filter(list_contains(CAST, "Bruce Willis"))
        .requires(&[GENRES, CAST])
        .show(&[TITLE, GENRES, CAST, VOTE_AVERAGE])
        .top(usize::MAX)
}

/// Uma Thurman titles directed by Quentin Tarantino, shortest first
pub fn thurman_tarantino() -> RankQuery {
    RankQuery::by(RUNTIME)
        .ascending(true)
        .filter(list_contains(CAST, "Uma Thurman"))
        .filter(list_contains(DIRECTOR, "Quentin Tarantino"))
        .requires(&[CAST, DIRECTOR])
        .show(&[TITLE, DIRECTOR, CAST, RUNTIME])
        .top(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinemetrics_core::{Table, Value};

    fn table() -> Table {
        Table::from_rows(
            vec!["genres".into(), "budget_musd".into()],
            vec![
                vec![Value::from("Action|Science Fiction"), Value::Float(50.0)],
                vec![Value::from("Action Comedy"), Value::Float(5.0)],
                vec![Value::Null, Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn list_contains_matches_whole_items() {
        let t = table();
        let pred = list_contains("genres", "Action");
        let hits: Vec<bool> = t.rows().map(&pred).collect();
        assert_eq!(hits, vec![true, false, false]);
    }

    #[test]
    fn list_contains_all_requires_every_item() {
        let t = table();
        let both = list_contains_all("genres", &["Science Fiction", "Action"]);
        let missing = list_contains_all("genres", &["Action", "Drama"]);
        assert!(both(t.row(0).unwrap()));
        assert!(!missing(t.row(0).unwrap()));
    }

    #[test]
    fn thresholds_skip_nulls() {
        let t = table();
        let pred = at_least("budget_musd", 10.0);
        let hits: Vec<bool> = t.rows().map(pred).collect();
        assert_eq!(hits, vec![true, false, false]);
    }

    #[test]
    fn default_projection_has_no_duplicates() {
        let q = RankQuery::by(ROI);
        assert_eq!(
            q.projection(),
            vec!["title", "roi", "genres", "revenue_musd", "profit_musd", "vote_average"]
        );
    }

    #[test]
    fn required_columns_start_with_criteria() {
        let q = RankQuery::by(RUNTIME).requires(&[CAST, DIRECTOR, CAST]);
        assert_eq!(q.required_columns(), vec![RUNTIME, CAST, DIRECTOR]);
        assert_eq!(thurman_tarantino().required_columns(), vec![RUNTIME, CAST, DIRECTOR]);
    }

    #[test]
    fn presets_carry_floors() {
        let q = KpiRanking::HighestRoi.query(5);
        let t = table();
        assert!(q.matches(t.row(0).unwrap()));
        assert!(!q.matches(t.row(1).unwrap()));
        assert!(KpiRanking::LowestRated.query(5).is_ascending());
        assert_eq!(KpiRanking::ALL.len(), 11);
    }
}
