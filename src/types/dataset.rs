use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::BinIdentity;

/// An open record: the fields of a row or of a bin, keyed by field name.
pub type Datum = Map<String, Value>;

/// One row of the heat map.
///
/// The row's own fields carry the row label; `bins` holds the cells in
/// column order. Rows may have different bin counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Datum,
    #[serde(default)]
    pub bins: Vec<Datum>,
}

impl Row {
    pub fn new(fields: Datum, bins: Vec<Datum>) -> Self {
        Self { fields, bins }
    }
}

/// Read-only snapshot of the heat map data, supplied once per render cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    rows: Vec<Row>,
}

/// Row and column counts of a dataset.
///
/// `columns` is the bin count of the widest row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    pub rows: u32,
    pub columns: u32,
}

impl GridShape {
    pub fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    /// True when the grid has no area (no rows, or rows without bins).
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns == 0
    }

    /// Whether `id` addresses a position inside the grid rectangle.
    ///
    /// A position inside the rectangle may still be a gap in a short row;
    /// use [`Dataset::bin`] to check for a real record.
    pub fn contains(&self, id: BinIdentity) -> bool {
        id.row < self.rows && id.column < self.columns
    }
}

impl Dataset {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Parse a dataset from its JSON form (an array of rows).
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn shape(&self) -> GridShape {
        let columns = self.rows.iter().map(|r| r.bins.len()).max().unwrap_or(0);
        GridShape {
            rows: u32::try_from(self.rows.len()).unwrap_or(u32::MAX),
            columns: u32::try_from(columns).unwrap_or(u32::MAX),
        }
    }

    pub fn row(&self, row: u32) -> Option<&Row> {
        self.rows.get(usize::try_from(row).ok()?)
    }

    /// Look up the bin record at `id`, if that row has a bin in that column.
    pub fn bin(&self, id: BinIdentity) -> Option<&Datum> {
        self.row(id.row)?
            .bins
            .get(usize::try_from(id.column).ok()?)
    }

    /// Numeric measure value of a bin (`None` for missing or non-numeric fields).
    pub fn measure(bin: &Datum, measure: &str) -> Option<f64> {
        bin.get(measure).and_then(Value::as_f64)
    }

    /// Largest measure value across all bins.
    pub fn measure_max(&self, measure: &str) -> Option<f64> {
        self.rows
            .iter()
            .flat_map(|r| r.bins.iter())
            .filter_map(|b| Self::measure(b, measure))
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
    }

    /// Labels along the left axis, one per row.
    pub fn row_labels(&self, field: &str) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| label_text(&r.fields, field))
            .collect()
    }

    /// Labels along the top axis, taken from the widest row.
    pub fn column_labels(&self, field: &str) -> Vec<String> {
        self.rows
            .iter()
            .max_by_key(|r| r.bins.len())
            .map(|r| r.bins.iter().map(|b| label_text(b, field)).collect())
            .unwrap_or_default()
    }
}

/// Render a label field as display text.
///
/// Strings are used verbatim, other values as their JSON text, missing
/// fields as an empty label.
pub fn label_text(datum: &Datum, field: &str) -> String {
    match datum.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use serde_json::json;

    fn datum(v: Value) -> Datum {
        v.as_object().cloned().unwrap()
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            Row::new(
                datum(json!({"row": "Mon"})),
                vec![
                    datum(json!({"column": "00h", "count": 3})),
                    datum(json!({"column": "01h", "count": 7.5})),
                ],
            ),
            Row::new(
                datum(json!({"row": "Tue"})),
                vec![
                    datum(json!({"column": "00h", "count": 1})),
                    datum(json!({"column": "01h", "count": "n/a"})),
                    datum(json!({"column": 2, "count": 4})),
                ],
            ),
        ])
    }

    #[test]
    fn test_shape_uses_widest_row() {
        let ds = sample();
        assert_eq!(ds.shape(), GridShape::new(2, 3));
        assert_eq!(Dataset::default().shape(), GridShape::new(0, 0));
        assert!(Dataset::default().shape().is_empty());
        assert!(Dataset::new(vec![Row::default()]).shape().is_empty());
    }

    #[test]
    fn test_bin_lookup_handles_short_rows() {
        let ds = sample();
        let bin = ds.bin(BinIdentity::new(1, 2)).unwrap();
        assert_eq!(bin["count"], json!(4));
        // Row 0 only has two bins
        assert!(ds.bin(BinIdentity::new(0, 2)).is_none());
        assert!(ds.bin(BinIdentity::new(2, 0)).is_none());
        assert!(ds.shape().contains(BinIdentity::new(0, 2)));
        assert!(!ds.shape().contains(BinIdentity::new(2, 0)));
    }

    #[test]
    fn test_measure_max_skips_non_numeric() {
        let ds = sample();
        assert_eq!(ds.measure_max("count"), Some(7.5));
        assert_eq!(ds.measure_max("missing"), None);
    }

    #[test]
    fn test_labels() {
        let ds = sample();
        assert_eq!(ds.row_labels("row"), vec!["Mon", "Tue"]);
        assert_eq!(ds.column_labels("column"), vec!["00h", "01h", "2"]);
        assert_eq!(ds.row_labels("nope"), vec!["", ""]);
    }

    #[test]
    fn test_from_json() {
        let ds = Dataset::from_json(
            r#"[{"fields": {"row": "a"}, "bins": [{"count": 1}]}, {"bins": []}]"#,
        )
        .unwrap();
        assert_eq!(ds.shape(), GridShape::new(2, 1));
        assert!(Dataset::from_json("{not json").is_err());
    }
}
