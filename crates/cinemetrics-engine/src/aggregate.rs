//! Null-skipping aggregates over table columns

use cinemetrics_core::{RowRef, Table, Value};
use std::collections::BTreeMap;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sum of the present values; zero when there are none
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Arithmetic mean, `None` for no values
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(sum(values) / values.len() as f64)
    }
}

/// Median, `None` for no values
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Rounded cell from an optional aggregate
pub fn rounded(value: Option<f64>) -> Value {
    Value::from_opt_f64(value.map(round2))
}

/// Numeric values of `column` across the given rows, nulls skipped
pub fn numeric_values(table: &Table, rows: &[usize], column: &str) -> Vec<f64> {
    rows.iter()
        .filter_map(|&i| table.row(i))
        .filter_map(|row| row.float(column))
        .collect()
}

/// Group row indices by a key; rows whose key is `None` are left out
///
/// Groups come back sorted by key, rows within a group in table order.
pub fn group_rows<K: Ord>(table: &Table, mut key: impl FnMut(RowRef<'_>) -> Option<K>) -> BTreeMap<K, Vec<usize>> {
    let mut groups: BTreeMap<K, Vec<usize>> = BTreeMap::new();
    for row in table.rows() {
        if let Some(k) = key(row) {
            groups.entry(k).or_default().push(row.index());
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_aggregates() {
        assert_eq!(sum(&[]), 0.0);
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn rounding() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(2.005_1), 2.01);
        assert_eq!(rounded(None), Value::Null);
    }

    #[test]
    fn grouping_skips_missing_keys() {
        let table = Table::from_rows(
            vec!["k".into()],
            vec![
                vec![Value::from("b")],
                vec![Value::Null],
                vec![Value::from("a")],
                vec![Value::from("b")],
            ],
        )
        .unwrap();

        let groups = group_rows(&table, |row| row.text("k").map(str::to_string));
        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(groups["b"], vec![0, 3]);
    }
}
