//! Descriptive statistics over query results

use crate::graph::{columns, Record};
use serde_json::{json, Map, Value};

/// Summarize every column of `records`.
///
/// Columns whose non-null values are all numbers get count, mean, sample
/// standard deviation, min, quartiles and max. Any other column gets count,
/// number of distinct values, the most frequent value and its frequency.
pub fn describe(records: &[Record]) -> Value {
    let mut summary = Map::new();

    for column in columns(records) {
        let values: Vec<&Value> = records
            .iter()
            .filter_map(|record| record.get(&column))
            .filter(|value| !value.is_null())
            .collect();

        let numbers: Option<Vec<f64>> = values.iter().map(|value| value.as_f64()).collect();
        let stats = match numbers {
            Some(numbers) if !numbers.is_empty() => numeric_summary(numbers),
            _ => categorical_summary(&values),
        };
        summary.insert(column, stats);
    }

    Value::Object(summary)
}

fn numeric_summary(mut numbers: Vec<f64>) -> Value {
    numbers.sort_by(f64::total_cmp);
    let count = numbers.len();
    let mean = numbers.iter().sum::<f64>() / count as f64;

    json!({
        "count": count,
        "mean": mean,
        "std": sample_std(&numbers, mean),
        "min": numbers[0],
        "25%": quantile_sorted(&numbers, 0.25),
        "50%": quantile_sorted(&numbers, 0.5),
        "75%": quantile_sorted(&numbers, 0.75),
        "max": numbers[count - 1],
    })
}

fn categorical_summary(values: &[&Value]) -> Value {
    // (label, frequency) in first-seen order
    let mut frequencies: Vec<(String, usize)> = Vec::new();
    for value in values {
        let label = label(value);
        match frequencies.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, frequency)) => *frequency += 1,
            None => frequencies.push((label, 1)),
        }
    }

    let top = frequencies
        .iter()
        .fold(None::<&(String, usize)>, |best, entry| match best {
            Some(best) if best.1 >= entry.1 => Some(best),
            _ => Some(entry),
        });

    json!({
        "count": values.len(),
        "unique": frequencies.len(),
        "top": top.map(|(label, _)| label.clone()),
        "freq": top.map(|(_, frequency)| *frequency),
    })
}

fn label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn sample_std(numbers: &[f64], mean: f64) -> Option<f64> {
    if numbers.len() < 2 {
        return None;
    }
    let variance = numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
        / (numbers.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Linear-interpolated quantile of an ascending, non-empty slice
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

/// Median of the values, `None` when there are none
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(quantile_sorted(&sorted, 0.5))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(rows: Value) -> Vec<Record> {
        rows.as_array()
            .unwrap()
            .iter()
            .map(|row| row.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_numeric_column() {
        let rows = records(json!([
            {"Concentration": 1.0},
            {"Concentration": 2.0},
            {"Concentration": 3.0},
            {"Concentration": 4.0},
            {"Concentration": null}
        ]));
        let summary = describe(&rows);
        let stats = &summary["Concentration"];

        assert_eq!(stats["count"], json!(4));
        assert_eq!(stats["mean"], json!(2.5));
        assert_eq!(stats["min"], json!(1.0));
        assert_eq!(stats["25%"], json!(1.75));
        assert_eq!(stats["50%"], json!(2.5));
        assert_eq!(stats["75%"], json!(3.25));
        assert_eq!(stats["max"], json!(4.0));
        let std = stats["std"].as_f64().unwrap();
        assert!((std - 1.2909944).abs() < 1e-6);
    }

    #[test]
    fn test_categorical_column() {
        let rows = records(json!([
            {"Country": "Germany", "Year": 2015},
            {"Country": "France", "Year": 2016},
            {"Country": "Germany", "Year": 2016}
        ]));
        let summary = describe(&rows);

        assert_eq!(summary["Country"]["count"], json!(3));
        assert_eq!(summary["Country"]["unique"], json!(2));
        assert_eq!(summary["Country"]["top"], json!("Germany"));
        assert_eq!(summary["Country"]["freq"], json!(2));
        // integers are numeric
        assert_eq!(summary["Year"]["max"], json!(2016.0));

        let keys: Vec<&String> = summary.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["Country", "Year"]);
    }

    #[test]
    fn test_single_value_has_no_std() {
        let rows = records(json!([{"TU": 0.5}]));
        assert_eq!(describe(&rows)["TU"]["std"], Value::Null);
    }
}
