//! Flat, column-ordered tables built from dynamic records

use lord_common::record::{id_text, is_nested, valid_id};
use lord_common::Record;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

static NULL: Value = Value::Null;

/// A named table whose columns are the union of its rows' keys.
///
/// Columns keep the order in which keys were first seen. A row lacking a
/// column holds null in that cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl FlatTable {
    pub fn from_records(name: impl Into<String>, rows: Vec<Record>) -> Self {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for key in rows.iter().flat_map(|row| row.keys()) {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }

        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Cell value, null when the row lacks the column
    pub fn cell(&self, row: usize, column: &str) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL)
    }

    /// Iterate one column, nulls included
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().map(move |r| r.get(column).unwrap_or(&NULL))
    }

    /// Drop the named columns; names not present are ignored
    pub fn drop_columns(&mut self, names: &[&str]) {
        self.columns.retain(|c| !names.contains(&c.as_str()));
        for row in &mut self.rows {
            for name in names {
                row.remove(*name);
            }
        }
    }

    /// Drop every column holding an object or array in any row.
    ///
    /// Returns the dropped column names.
    pub fn drop_nested_columns(&mut self) -> Vec<String> {
        let nested: Vec<String> = self
            .columns
            .iter()
            .filter(|c| self.column_values(c).any(is_nested))
            .cloned()
            .collect();

        let names: Vec<&str> = nested.iter().map(String::as_str).collect();
        self.drop_columns(&names);
        nested
    }

    /// Rewrite every present value of `column`
    pub fn map_column(&mut self, column: &str, f: impl Fn(&Value) -> Value) {
        for row in &mut self.rows {
            if let Some(value) = row.get_mut(column) {
                *value = f(value);
            }
        }
    }

    /// SQL-style left join on `key`.
    ///
    /// Right-hand columns whose names clash with left-hand ones get `suffix`
    /// appended; the key column is not duplicated. A left row with no match
    /// keeps null right-hand cells; a left row with N matches becomes N rows.
    /// Returns the joined table and the number of left rows that matched more
    /// than once.
    pub fn left_join(self, right: &FlatTable, key: &str, suffix: &str) -> (FlatTable, usize) {
        let mut index: HashMap<String, Vec<&Record>> = HashMap::new();
        for row in &right.rows {
            if let Some(k) = valid_id(row, key).and_then(id_text) {
                index.entry(k).or_default().push(row);
            }
        }

        let renamed: Vec<(&str, String)> = right
            .columns
            .iter()
            .filter(|c| c.as_str() != key)
            .map(|c| {
                let target = if self.has_column(c) {
                    format!("{}{}", c, suffix)
                } else {
                    c.clone()
                };
                (c.as_str(), target)
            })
            .collect();

        let mut columns = self.columns;
        for (_, target) in &renamed {
            if !columns.contains(target) {
                columns.push(target.clone());
            }
        }

        let mut multi_matched = 0;
        let mut rows = Vec::with_capacity(self.rows.len());
        for left in self.rows {
            let matches = valid_id(&left, key)
                .and_then(id_text)
                .and_then(|k| index.get(&k))
                .map(Vec::as_slice)
                .unwrap_or_default();

            if matches.len() > 1 {
                multi_matched += 1;
            }

            match matches {
                [] => rows.push(left),
                _ => {
                    for right_row in matches {
                        let mut joined = left.clone();
                        for (source, target) in &renamed {
                            if let Some(value) = right_row.get(*source) {
                                joined.insert(target.clone(), value.clone());
                            }
                        }
                        rows.push(joined);
                    }
                },
            }
        }

        (
            FlatTable {
                name: self.name,
                columns,
                rows,
            },
            multi_matched,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_columns_are_union_in_first_seen_order() {
        let table = FlatTable::from_records(
            "t",
            rows(vec![json!({"a": 1, "b": 2}), json!({"c": 3, "a": 4})]),
        );
        assert_eq!(table.columns(), ["a", "b", "c"]);
        assert_eq!(table.cell(0, "c"), &Value::Null);
        assert_eq!(table.cell(1, "c"), &json!(3));
        assert_eq!(table.cell(5, "a"), &Value::Null);
    }

    #[test]
    fn test_drop_columns_tolerates_absent_names() {
        let mut table = FlatTable::from_records("t", rows(vec![json!({"a": 1, "b": 2})]));
        table.drop_columns(&["b", "missing"]);
        assert_eq!(table.columns(), ["a"]);
        assert!(!table.rows()[0].contains_key("b"));
    }

    #[test]
    fn test_drop_nested_columns() {
        let mut table = FlatTable::from_records(
            "t",
            rows(vec![
                json!({"id": 1, "media": null, "tags": "x"}),
                json!({"id": 2, "media": [{"url": "u"}], "link": {"href": "h"}}),
            ]),
        );
        let mut dropped = table.drop_nested_columns();
        dropped.sort();
        assert_eq!(dropped, ["link", "media"]);
        assert_eq!(table.columns(), ["id", "tags"]);
    }

    #[test]
    fn test_left_join_keeps_unmatched_rows() {
        let left = FlatTable::from_records(
            "facilities",
            rows(vec![
                json!({"FacilityID": "1", "Name": "A"}),
                json!({"FacilityID": "2", "Name": "B"}),
                json!({"Name": "no id"}),
            ]),
        );
        let right = FlatTable::from_records(
            "addresses",
            rows(vec![json!({"City": "Mesa", "FacilityID": "1"})]),
        );

        let (joined, multi) = left.left_join(&right, "FacilityID", "_address");

        assert_eq!(multi, 0);
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.columns(), ["FacilityID", "Name", "City"]);
        assert_eq!(joined.cell(0, "City"), &json!("Mesa"));
        assert_eq!(joined.cell(1, "City"), &Value::Null);
        assert_eq!(joined.cell(2, "City"), &Value::Null);
    }

    #[test]
    fn test_left_join_suffixes_clashing_columns() {
        let left = FlatTable::from_records(
            "facilities",
            rows(vec![json!({"FacilityID": 3, "LastUpdatedDate": "2024-01-01"})]),
        );
        let right = FlatTable::from_records(
            "addresses",
            rows(vec![json!({"LastUpdatedDate": "2019-05-05", "FacilityID": 3})]),
        );

        let (joined, _) = left.left_join(&right, "FacilityID", "_address");

        assert_eq!(
            joined.columns(),
            ["FacilityID", "LastUpdatedDate", "LastUpdatedDate_address"]
        );
        assert_eq!(joined.cell(0, "LastUpdatedDate"), &json!("2024-01-01"));
        assert_eq!(joined.cell(0, "LastUpdatedDate_address"), &json!("2019-05-05"));
    }

    #[test]
    fn test_left_join_multiplies_rows_for_multiple_matches() {
        let left = FlatTable::from_records(
            "facilities",
            rows(vec![json!({"FacilityID": "1"}), json!({"FacilityID": "2"})]),
        );
        let right = FlatTable::from_records(
            "addresses",
            rows(vec![
                json!({"FacilityID": "1", "Type": "Mailing"}),
                json!({"FacilityID": "1", "Type": "Physical"}),
            ]),
        );

        let (joined, multi) = left.left_join(&right, "FacilityID", "_address");

        assert_eq!(multi, 1);
        assert_eq!(joined.len(), 3);
        let types: Vec<_> = joined.column_values("Type").collect();
        assert_eq!(types, [&json!("Mailing"), &json!("Physical"), &Value::Null]);
    }
}
