use anyhow::Result;
use chrono::NaiveDate;
use log::Level;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use super::record::TransactionRecord;
use super::report::{flatten, flatten_report, DropCounts, Header, Leaf, Report, ReportNode};
use super::RecordError;

fn columns() -> Vec<String> {
    ["Date", "Transaction Type", "Memo/Description", "Amount"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn leaf(date: &str, kind: &str, memo: &str, amount: &str) -> ReportNode {
    Leaf::new([date, kind, memo, amount]).into()
}

fn header(label: &str, children: Vec<ReportNode>) -> ReportNode {
    Header::new(label, children).into()
}

fn income_report() -> Report {
    Report {
        columns: columns(),
        rows: vec![header(
            "Income",
            vec![
                header("Donations", vec![leaf("2024-01-05", "Deposit", "Leaf A", "250.00")]),
                header("Rentals", vec![leaf("2024-01-09", "Deposit", "Leaf B", "80.50")]),
            ],
        )],
    }
}

#[test]
fn test_category_path() -> Result<()> {
    let flattened = flatten_report(&income_report());
    let transactions = flattened.transactions();

    assert_eq!(transactions.len(), 2);
    let a = &transactions[0];
    assert_eq!(a.category_path(), &vec!["Income".to_string(), "Donations".to_string()]);
    assert_eq!(a.category_depth(), 1);
    assert_eq!(a.item(), "Donations");
    assert_eq!(a.account_type(), "Income");
    assert_eq!(a.description(), "Leaf A");
    assert_eq!(a.amount(), dec!(250.00));
    assert_eq!(a.date(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());

    let b = &transactions[1];
    assert_eq!(b.category(), "Income:Rentals");
    assert_eq!(b.item(), "Rentals");

    Ok(())
}

#[test]
fn test_leaf_directly_under_account_type() -> Result<()> {
    let report = Report {
        columns: columns(),
        rows: vec![header(
            "Expenses",
            vec![
                leaf("2024-02-01", "Check", "Top level", "10"),
                header("Utilities", vec![header("Water", vec![leaf("2024-02-03", "Check", "Deep", "20")])]),
            ],
        )],
    };

    let rows = flatten_report(&report).into_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].category_path, vec!["Expenses"]);
    assert_eq!(rows[0].category_depth, 0);
    assert_eq!(rows[1].category_path, vec!["Expenses", "Utilities", "Water"]);
    assert_eq!(rows[1].category_depth, 2);

    Ok(())
}

#[test]
fn test_mismatched_leaves_are_dropped_and_counted() -> Result<()> {
    let report = Report {
        columns: columns(),
        rows: vec![header(
            "Expenses",
            vec![header(
                "Supplies",
                vec![
                    leaf("2024-03-01", "Expense", "Paper", "12.00"),
                    Leaf::new(["2024-03-02", "Expense", "12.00"]).into(),
                    leaf("2024-03-04", "Check", "Toner", "60.00"),
                    Leaf::new(Vec::<String>::new()).into(),
                    Leaf::new(["2024-03-05", "Check", "Extra", "1.00", "1.00"]).into(),
                ],
            )],
        )],
    };

    let flattened = flatten_report(&report);
    assert_eq!(flattened.rows().len(), 2);
    assert_eq!(flattened.dropped(), 3);
    assert_eq!(flattened.rows()[0].value("Memo/Description"), Some("Paper"));
    assert_eq!(flattened.rows()[1].value("Memo/Description"), Some("Toner"));

    Ok(())
}

#[test]
fn test_preorder_output() -> Result<()> {
    let report = Report {
        columns: columns(),
        rows: vec![
            header(
                "Expenses",
                vec![
                    header(
                        "A",
                        vec![
                            leaf("2024-01-01", "Check", "1", "1"),
                            header("A1", vec![leaf("2024-01-01", "Check", "2", "2")]),
                        ],
                    ),
                    leaf("2024-01-01", "Check", "3", "3"),
                    header("B", vec![leaf("2024-01-01", "Check", "4", "4")]),
                ],
            ),
            header("Income", vec![leaf("2024-01-01", "Deposit", "5", "5")]),
        ],
    };

    let memos: Vec<String> = flatten_report(&report)
        .rows()
        .iter()
        .map(|row| row.value("Memo/Description").unwrap_or_default().to_string())
        .collect();
    assert_eq!(memos, vec!["1", "2", "3", "4", "5"]);

    Ok(())
}

#[test]
fn test_flatten_from_subtree() -> Result<()> {
    let node = header("Donations", vec![leaf("2024-01-05", "Deposit", "Gift", "5")]);
    let flattened = flatten(&node, &columns(), &["Income".to_string()], 0);

    assert_eq!(flattened.rows().len(), 1);
    assert_eq!(flattened.rows()[0].category_path, vec!["Income", "Donations"]);
    assert_eq!(flattened.rows()[0].category_depth, 1);

    Ok(())
}

#[test]
fn test_empty_header_yields_nothing() -> Result<()> {
    let flattened = flatten(&header("Empty", Vec::new()), &columns(), &[], 0);

    assert!(flattened.rows().is_empty());
    assert_eq!(flattened.dropped(), 0);

    Ok(())
}

#[test]
fn test_invalid_rows_are_skipped_on_conversion() -> Result<()> {
    let report = Report {
        columns: columns(),
        rows: vec![
            header(
                "Expenses",
                vec![
                    leaf("not a date", "Check", "Bad date", "1"),
                    leaf("2024-01-02", "Check", "Bad amount", "one"),
                    leaf("2024-01-03", "Check", "Good", "-3.25"),
                ],
            ),
            leaf("2024-01-04", "Check", "No category", "4"),
        ],
    };

    let flattened = flatten_report(&report);
    assert_eq!(flattened.rows().len(), 4);

    let transactions = flattened.transactions();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].amount(), dec!(-3.25));

    let rows = flattened.rows();
    assert_eq!(
        TransactionRecord::try_from(&rows[0]),
        Err(RecordError::InvalidDate("not a date".to_string()))
    );
    assert_eq!(TransactionRecord::try_from(&rows[1]), Err(RecordError::InvalidAmount("one".to_string())));
    assert_eq!(TransactionRecord::try_from(&rows[3]), Err(RecordError::EmptyCategory));

    Ok(())
}

#[test]
fn test_missing_amount_column() -> Result<()> {
    let report = Report {
        columns: vec!["Date".to_string()],
        rows: vec![header("Expenses", vec![Leaf::new(["2024-01-01"]).into()])],
    };

    let flattened = flatten_report(&report);
    assert_eq!(
        TransactionRecord::try_from(&flattened.rows()[0]),
        Err(RecordError::MissingColumn("Amount"))
    );

    Ok(())
}

#[test]
fn test_flatten_is_repeatable() -> Result<()> {
    let report = income_report();

    assert_eq!(flatten_report(&report), flatten_report(&report));

    Ok(())
}

#[test]
fn test_conversion_failures_are_counted() -> Result<()> {
    let report = Report {
        columns: columns(),
        rows: vec![header(
            "Expenses",
            vec![header(
                "Supplies",
                vec![
                    leaf("2024-03-01", "Expense", "Paper", "12.00"),
                    leaf("2024-03-02", "Expense", "Blank amount", ""),
                    Leaf::new(["2024-03-03", "Expense", "12.00"]).into(),
                ],
            )],
        )],
    };

    let flattened = flatten_report(&report);
    assert_eq!(flattened.rows().len(), 2);
    assert_eq!(flattened.dropped(), 1);

    let (transactions, drops) = flattened.convert();
    assert_eq!(transactions.len(), 1);
    assert_eq!(
        drops,
        DropCounts {
            mismatched: 1,
            invalid: 1,
        }
    );
    assert_eq!(drops.total() + transactions.len(), 3);

    Ok(())
}

#[test]
fn test_drop_log_level() -> Result<()> {
    let mismatched = DropCounts {
        mismatched: 2,
        invalid: 0,
    };
    let invalid = DropCounts {
        mismatched: 0,
        invalid: 1,
    };

    assert_eq!(mismatched.log_level(false), Some(Level::Debug));
    assert_eq!(mismatched.log_level(true), Some(Level::Warn));
    assert_eq!(invalid.log_level(true), Some(Level::Warn));
    assert_eq!(DropCounts::default().log_level(true), None);
    assert_eq!(DropCounts::default().log_level(false), None);

    Ok(())
}
