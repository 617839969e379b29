//! Local-time indexed tables
//!
//! A [`TimeSeriesTable`] is an ordered local-time index plus any number of
//! labelled value columns. `None` means "no data" and is never treated as zero.
//! The label type is generic so each operation keeps the provenance it needs:
//! plain names, `(type, kind)` pairs or full per-unit labels.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::Write;

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{MarketDataError, Result};

/// One labelled value column
#[derive(Debug, Clone, PartialEq)]
pub struct Column<L> {
    pub label: L,
    pub values: Vec<Option<f64>>,
}

/// Local-time indexed table with labelled optional-value columns
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable<L> {
    index: Vec<DateTime<Tz>>,
    columns: Vec<Column<L>>,
}

impl<L> Default for TimeSeriesTable<L> {
    fn default() -> Self {
        Self {
            index: Vec::new(),
            columns: Vec::new(),
        }
    }
}

impl<L> TimeSeriesTable<L> {
    /// Table with the given index and no columns
    pub fn with_index(index: Vec<DateTime<Tz>>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    /// Single-column table from provider-ordered `(timestamp, value)` points
    pub fn from_points(label: L, points: Vec<(DateTime<Tz>, Option<f64>)>) -> Self {
        let (index, values) = points.into_iter().unzip();
        Self {
            index,
            columns: vec![Column { label, values }],
        }
    }

    pub fn index(&self) -> &[DateTime<Tz>] {
        &self.index
    }

    pub fn columns(&self) -> &[Column<L>] {
        &self.columns
    }

    pub fn labels(&self) -> impl Iterator<Item = &L> {
        self.columns.iter().map(|c| &c.label)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Apply `f` to every present value
    pub fn map_values(mut self, f: impl Fn(f64) -> f64) -> Self {
        for column in &mut self.columns {
            for value in column.values.iter_mut().flatten() {
                *value = f(*value);
            }
        }
        self
    }

    /// Rows whose timestamp lies in `[start, end]` (inclusive, by instant)
    pub fn slice<T: TimeZone>(self, start: &DateTime<T>, end: &DateTime<T>) -> Self {
        let keep: Vec<bool> = self
            .index
            .iter()
            .map(|ts| ts >= start && ts <= end)
            .collect();

        let index = filter_by(self.index, &keep);
        let columns = self
            .columns
            .into_iter()
            .map(|c| Column {
                label: c.label,
                values: filter_by(c.values, &keep),
            })
            .collect();

        Self { index, columns }
    }
}

impl<L: Display> TimeSeriesTable<L> {
    /// Append a column; its length must match the index
    pub fn push_column(&mut self, label: L, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.index.len() {
            return Err(MarketDataError::ShapeMismatch {
                label: label.to_string(),
                expected: self.index.len(),
                actual: values.len(),
            });
        }
        self.columns.push(Column { label, values });
        Ok(())
    }

    /// Write the table as CSV: a `timestamp` column (RFC 3339) then one column per label
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);

        let mut header = vec!["timestamp".to_string()];
        header.extend(self.columns.iter().map(|c| c.label.to_string()));
        out.write_record(&header)?;

        for (row, ts) in self.index.iter().enumerate() {
            let mut record = vec![ts.to_rfc3339()];
            record.extend(
                self.columns
                    .iter()
                    .map(|c| c.values[row].map(|v| v.to_string()).unwrap_or_default()),
            );
            out.write_record(&record)?;
        }

        out.flush()?;
        Ok(())
    }
}

impl<L: PartialEq> TimeSeriesTable<L> {
    /// Values of the column labelled `label`
    pub fn column(&self, label: &L) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| &c.label == label)
            .map(|c| c.values.as_slice())
    }

    /// Value at `ts` in the column labelled `label` (`None` if absent)
    pub fn value_at<T: TimeZone>(&self, ts: &DateTime<T>, label: &L) -> Option<f64> {
        let row = self.index.iter().position(|i| i == ts)?;
        self.column(label)?.get(row).copied().flatten()
    }
}

impl<L: Clone + PartialEq> TimeSeriesTable<L> {
    /// Stack tables along the time axis, in the given order
    ///
    /// Columns are matched by label; a label missing from one table is filled
    /// with `None` for that table's rows. Rows are not deduplicated.
    pub fn concat(tables: impl IntoIterator<Item = Self>) -> Self {
        let tables: Vec<Self> = tables.into_iter().collect();

        let mut labels: Vec<L> = Vec::new();
        for table in &tables {
            for label in table.labels() {
                if !labels.contains(label) {
                    labels.push(label.clone());
                }
            }
        }

        let mut index = Vec::new();
        let mut columns: Vec<Column<L>> = labels
            .into_iter()
            .map(|label| Column {
                label,
                values: Vec::new(),
            })
            .collect();

        for table in tables {
            let rows = table.len();
            for column in &mut columns {
                match table.column(&column.label) {
                    Some(values) => column.values.extend_from_slice(values),
                    None => column.values.extend(std::iter::repeat(None).take(rows)),
                }
            }
            index.extend(table.index);
        }

        Self { index, columns }
    }

    /// Outer join on the index; the result index is the sorted union
    ///
    /// Columns of `other` are appended after the columns of `self`.
    pub fn join(self, other: Self) -> Self {
        let mut union: Vec<DateTime<Tz>> = self
            .index
            .iter()
            .chain(other.index.iter())
            .cloned()
            .collect();
        union.sort();
        union.dedup();

        let positions: BTreeMap<i64, usize> = union
            .iter()
            .enumerate()
            .map(|(pos, ts)| (ts.timestamp_millis(), pos))
            .collect();

        let mut columns = Vec::with_capacity(self.columns.len() + other.columns.len());
        for table in [self, other] {
            let rows: Vec<usize> = table
                .index
                .iter()
                .filter_map(|ts| positions.get(&ts.timestamp_millis()).copied())
                .collect();

            for column in table.columns {
                let mut values = vec![None; union.len()];
                for (row, value) in rows.iter().zip(column.values) {
                    values[*row] = value;
                }
                columns.push(Column {
                    label: column.label,
                    values,
                });
            }
        }

        Self {
            index: union,
            columns,
        }
    }

    /// Merge columns sharing a key into one, summing `sign * value`
    ///
    /// A merged value is present when at least one source value is present;
    /// absent sources do not contribute. Key order follows first appearance.
    pub fn combine_columns<K: Clone + PartialEq>(
        &self,
        key: impl Fn(&L) -> (K, f64),
    ) -> TimeSeriesTable<K> {
        let mut combined: Vec<Column<K>> = Vec::new();

        for column in &self.columns {
            let (k, sign) = key(&column.label);
            let position = match combined.iter().position(|c| c.label == k) {
                Some(position) => position,
                None => {
                    combined.push(Column {
                        label: k,
                        values: vec![None; self.index.len()],
                    });
                    combined.len() - 1
                }
            };

            let target = &mut combined[position].values;
            for (acc, value) in target.iter_mut().zip(&column.values) {
                if let Some(v) = value {
                    *acc = Some(acc.unwrap_or(0.0) + sign * v);
                }
            }
        }

        TimeSeriesTable {
            index: self.index.clone(),
            columns: combined,
        }
    }
}

fn filter_by<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, keep)| keep.then_some(item))
        .collect()
}
