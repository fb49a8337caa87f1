use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::reporting::aggregate::{BudgetItemTotal, ItemTotal, SubcategoryTotal};
use crate::reporting::budget::{BudgetEntry, BudgetMapping};
use crate::reporting::record::{TransactionRecord, CATEGORY_SEPARATOR};
use crate::reporting::report::{Header, Leaf, Report, ReportNode};
use crate::reporting::RecordError;

#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(rename = "Columns", default)]
    columns: RawColumns,
    #[serde(rename = "Rows", default)]
    rows: RawRows,
}

#[derive(Debug, Default, Deserialize)]
struct RawColumns {
    #[serde(rename = "Column", default)]
    column: Vec<RawColumn>,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    #[serde(rename = "ColTitle", default)]
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawRows {
    #[serde(rename = "Row")]
    row: Option<Vec<RawRow>>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Header")]
    header: Option<RawColData>,
    #[serde(rename = "Rows", default)]
    rows: RawRows,
    #[serde(rename = "ColData")]
    col_data: Option<Vec<RawValue>>,
}

#[derive(Debug, Deserialize)]
struct RawColData {
    #[serde(rename = "ColData", default)]
    col_data: Vec<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    value: String,
}

impl RawRow {
    /// A header with a blank label has no category segment of its own; its
    /// children are lifted into the enclosing header.
    fn into_nodes(self) -> Vec<ReportNode> {
        if let Some(header) = self.header {
            let label = header.col_data.into_iter().next().map(|v| v.value).unwrap_or_default();
            let children: Vec<ReportNode> = self
                .rows
                .row
                .unwrap_or_default()
                .into_iter()
                .flat_map(RawRow::into_nodes)
                .collect();
            if label.trim().is_empty() {
                debug!("lifting {} nodes out of an unlabeled header", children.len());
                return children;
            }

            return vec![ReportNode::from(Header::new(label, children))];
        }

        match self.col_data {
            Some(values) => vec![ReportNode::from(Leaf::new(values.into_iter().map(|v| v.value)))],
            None => {
                debug!("skipping report node with neither header nor column data");
                Vec::new()
            },
        }
    }
}

impl From<RawReport> for Report {
    fn from(raw: RawReport) -> Self {
        let columns = raw.columns.column.into_iter().map(|c| c.title).collect();

        let Some(sections) = raw.rows.row else {
            info!("report has no rows");
            return Report { columns, rows: Vec::new() };
        };

        // Top-level sections such as "Ordinary Income/Expenses" wrap the
        // account-type headers and are not part of any category path.
        let rows = sections
            .into_iter()
            .filter(|section| section.header.is_some())
            .flat_map(|section| section.rows.row.unwrap_or_default())
            .flat_map(RawRow::into_nodes)
            .collect();

        Report { columns, rows }
    }
}

/// One row of the persisted transaction table.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredTransaction {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Account_Type")]
    pub account_type: String,
    pub category: String,
    pub category_level: u32,
    pub item: String,
    #[serde(rename = "Memo/Description", default)]
    pub description: String,
    #[serde(rename = "Amount")]
    pub amount: Decimal,
    #[serde(rename = "Transaction Type", default)]
    pub transaction_type: String,
}

impl From<&TransactionRecord> for StoredTransaction {
    fn from(record: &TransactionRecord) -> Self {
        StoredTransaction {
            date: record.date(),
            account_type: record.account_type().clone(),
            category: record.category(),
            category_level: record.category_depth(),
            item: record.item().clone(),
            description: record.description().clone(),
            amount: record.amount(),
            transaction_type: record.transaction_type().clone(),
        }
    }
}

impl TryFrom<StoredTransaction> for TransactionRecord {
    type Error = RecordError;

    fn try_from(stored: StoredTransaction) -> Result<Self, Self::Error> {
        let category_path = stored
            .category
            .split(CATEGORY_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        TransactionRecord::new(
            stored.date,
            category_path,
            stored.category_level,
            stored.description,
            stored.amount,
            stored.transaction_type,
        )
    }
}

#[derive(Debug, Serialize)]
struct SubcategoryRecord<'a> {
    #[serde(rename = "Subcategory")]
    subcategory: &'a str,
    #[serde(rename = "Budget")]
    budget: Decimal,
    #[serde(rename = "Amount")]
    amount: Decimal,
    over_budget: bool,
}

impl<'a> From<&'a SubcategoryTotal> for SubcategoryRecord<'a> {
    fn from(total: &'a SubcategoryTotal) -> Self {
        SubcategoryRecord {
            subcategory: &total.subcategory,
            budget: total.budget_total,
            amount: total.actual_total,
            over_budget: total.over_budget(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ItemRecord<'a> {
    item: &'a str,
    #[serde(rename = "Amount")]
    amount: Decimal,
    #[serde(rename = "Transactions")]
    transactions: u64,
}

pub fn read_report<R: Read>(reader: R) -> Result<Report> {
    let raw: RawReport = serde_json::from_reader(reader)?;

    Ok(raw.into())
}

pub fn load_report(file_path: &Path) -> Result<Report> {
    let file = File::open(file_path).with_context(|| format!("could not open report {}", file_path.display()))?;

    read_report(file).with_context(|| format!("could not parse report {}", file_path.display()))
}

pub fn read_budget_mapping<R: Read>(reader: R) -> Result<BudgetMapping> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let entries = csv_reader.deserialize::<BudgetEntry>().collect::<Result<Vec<_>, _>>()?;

    Ok(BudgetMapping::new(entries)?)
}

pub fn load_budget_mapping(file_path: &Path) -> Result<BudgetMapping> {
    let file = File::open(file_path).with_context(|| format!("could not open budget {}", file_path.display()))?;

    read_budget_mapping(file).with_context(|| format!("could not load budget {}", file_path.display()))
}

/// Rows that fail to deserialize or violate the record invariants are
/// logged and skipped.
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<TransactionRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut transactions: Vec<TransactionRecord> = Vec::new();

    for record in csv_reader.deserialize::<StoredTransaction>() {
        match record {
            Ok(stored) => match TransactionRecord::try_from(stored) {
                Ok(transaction) => transactions.push(transaction),
                Err(err) => debug!("invalid transaction, err={}", err),
            },
            Err(err) => debug!("failed to deserialize record, err={}", err),
        }
    }

    Ok(transactions)
}

pub fn load_transactions(file_path: &Path) -> Result<Vec<TransactionRecord>> {
    let file =
        File::open(file_path).with_context(|| format!("could not open transactions {}", file_path.display()))?;

    read_transactions(file)
}

pub fn write_transactions<'a, I, W>(transactions: I, writer: W) -> Result<()>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
    W: Write,
{
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    for transaction in transactions {
        csv_writer.serialize(StoredTransaction::from(transaction))?;
    }

    csv_writer.flush()?;

    Ok(())
}

pub fn export_subcategories<W: Write>(totals: &[SubcategoryTotal], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    for total in totals {
        csv_writer.serialize(SubcategoryRecord::from(total))?;
    }

    csv_writer.flush()?;

    Ok(())
}

pub fn export_items<W: Write>(totals: &[ItemTotal], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    for total in totals {
        csv_writer.serialize(ItemRecord {
            item: &total.item,
            amount: total.amount_sum,
            transactions: total.transaction_count,
        })?;
    }

    csv_writer.flush()?;

    Ok(())
}

pub fn export_budget_items<W: Write>(totals: &[BudgetItemTotal], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    for total in totals {
        csv_writer.serialize(total)?;
    }

    csv_writer.flush()?;

    Ok(())
}
