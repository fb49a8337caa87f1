use std::str::FromStr;

use chrono::NaiveDate;
use enum_dispatch::enum_dispatch;
use getset::{CopyGetters, Getters};
use log::{debug, log, Level};
use rust_decimal::Decimal;

use super::record::{TransactionRecord, CATEGORY_SEPARATOR};
use super::RecordError;

pub const DATE_COLUMN: &str = "Date";
pub const AMOUNT_COLUMN: &str = "Amount";
pub const MEMO_COLUMN: &str = "Memo/Description";
pub const TYPE_COLUMN: &str = "Transaction Type";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The headers above a node and the depth assigned to leaves found directly
/// under them.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    path: Vec<String>,
    depth: u32,
}

impl Scope {
    /// The top-level header names the account type and sits at depth 0. Each
    /// header nested beneath it adds one level.
    fn enter(&self, label: &str) -> Scope {
        let depth = if self.path.is_empty() { self.depth } else { self.depth + 1 };
        let mut path = self.path.clone();
        path.push(label.to_string());

        Scope { path, depth }
    }
}

#[enum_dispatch]
pub(crate) trait FlattenNode {
    fn flatten_into(&self, columns: &[String], scope: &Scope, out: &mut Flattened);
}

#[enum_dispatch(FlattenNode)]
#[derive(Debug, Clone, PartialEq)]
pub enum ReportNode {
    Header,
    Leaf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub label: String,
    pub children: Vec<ReportNode>,
}

impl Header {
    pub fn new(label: impl Into<String>, children: Vec<ReportNode>) -> Header {
        Header {
            label: label.into(),
            children,
        }
    }
}

impl FlattenNode for Header {
    fn flatten_into(&self, columns: &[String], scope: &Scope, out: &mut Flattened) {
        let scope = scope.enter(&self.label);
        for child in &self.children {
            child.flatten_into(columns, &scope, out);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub values: Vec<String>,
}

impl Leaf {
    pub fn new<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Leaf {
        Leaf {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl FlattenNode for Leaf {
    fn flatten_into(&self, columns: &[String], scope: &Scope, out: &mut Flattened) {
        if self.values.len() != columns.len() {
            out.dropped += 1;
            return;
        }

        out.rows.push(ReportRow {
            category_path: scope.path.clone(),
            category_depth: scope.depth,
            columns: columns.iter().cloned().zip(self.values.iter().cloned()).collect(),
        });
    }
}

/// A fetched report: the column titles from its header row and the top-level
/// nodes of its category tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub columns: Vec<String>,
    pub rows: Vec<ReportNode>,
}

/// A leaf row lifted out of the tree, keyed by the report's column titles.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub category_path: Vec<String>,
    pub category_depth: u32,
    pub columns: Vec<(String, String)>,
}

impl ReportRow {
    pub fn value(&self, title: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(column, _)| column == title)
            .map(|(_, value)| value.as_str())
    }

    pub fn category(&self) -> String {
        self.category_path.join(&CATEGORY_SEPARATOR.to_string())
    }
}

impl TryFrom<&ReportRow> for TransactionRecord {
    type Error = RecordError;

    fn try_from(row: &ReportRow) -> Result<Self, Self::Error> {
        let date = row.value(DATE_COLUMN).ok_or(RecordError::MissingColumn(DATE_COLUMN))?;
        let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|_| RecordError::InvalidDate(date.to_string()))?;

        let amount = row.value(AMOUNT_COLUMN).ok_or(RecordError::MissingColumn(AMOUNT_COLUMN))?;
        let amount = Decimal::from_str(amount.trim()).map_err(|_| RecordError::InvalidAmount(amount.to_string()))?;

        TransactionRecord::new(
            date,
            row.category_path.clone(),
            row.category_depth,
            row.value(MEMO_COLUMN).unwrap_or_default(),
            amount,
            row.value(TYPE_COLUMN).unwrap_or_default(),
        )
    }
}

/// Rows emitted by a flatten pass, in pre-order, plus the number of leaves
/// whose value count did not match the column schema.
#[derive(Debug, Clone, Default, PartialEq, Getters, CopyGetters)]
pub struct Flattened {
    #[getset(get = "pub")]
    rows: Vec<ReportRow>,
    #[getset(get_copy = "pub")]
    dropped: usize,
}

impl Flattened {
    pub fn into_rows(self) -> Vec<ReportRow> {
        self.rows
    }

    pub fn append(&mut self, other: Flattened) {
        self.rows.extend(other.rows);
        self.dropped += other.dropped;
    }

    /// Typed records for every row that converts cleanly. Rows that don't are
    /// logged and skipped.
    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.convert().0
    }

    /// Typed records plus the count of every row lost on the way: leaves
    /// dropped while flattening and rows that failed to convert.
    pub fn convert(&self) -> (Vec<TransactionRecord>, DropCounts) {
        let mut invalid = 0;
        let records: Vec<TransactionRecord> = self
            .rows
            .iter()
            .filter_map(|row| match TransactionRecord::try_from(row) {
                Ok(record) => Some(record),
                Err(err) => {
                    debug!("skipping report row, category={}, err={}", row.category(), err);
                    invalid += 1;
                    None
                },
            })
            .collect();

        let counts = DropCounts {
            mismatched: self.dropped,
            invalid,
        };

        (records, counts)
    }
}

/// Leaves that never became transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounts {
    /// Value count differed from the column count.
    pub mismatched: usize,
    /// Bad date, bad amount, or no category.
    pub invalid: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.mismatched + self.invalid
    }

    /// `None` when nothing was dropped.
    pub fn log_level(&self, warn_on_dropped_rows: bool) -> Option<Level> {
        match (self.total(), warn_on_dropped_rows) {
            (0, _) => None,
            (_, true) => Some(Level::Warn),
            (_, false) => Some(Level::Debug),
        }
    }

    pub fn log(&self, warn_on_dropped_rows: bool) {
        if let Some(level) = self.log_level(warn_on_dropped_rows) {
            log!(
                level,
                "dropped {} report rows, mismatched={}, invalid={}",
                self.total(),
                self.mismatched,
                self.invalid
            );
        }
    }
}

/// Flattens one node found under `category_path`. `depth` is the level
/// stamped on leaves sitting directly under that path.
pub fn flatten(node: &ReportNode, columns: &[String], category_path: &[String], depth: u32) -> Flattened {
    let scope = Scope {
        path: category_path.to_vec(),
        depth,
    };
    let mut out = Flattened::default();
    node.flatten_into(columns, &scope, &mut out);

    out
}

pub fn flatten_report(report: &Report) -> Flattened {
    let scope = Scope::default();
    let mut out = Flattened::default();
    for node in &report.rows {
        node.flatten_into(&report.columns, &scope, &mut out);
    }

    out
}
