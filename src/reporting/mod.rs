use std::fmt;

use thiserror::Error;

pub mod aggregate;
pub mod budget;
pub mod checks;
pub mod projection;
pub mod record;
pub mod report;

#[cfg(test)]
mod report_tests;

/// Decimal places kept for figures handed to the presentation layer.
pub const DISPLAY_PRECISION: u32 = 2;

#[derive(Debug, PartialEq, Error)]
pub enum RecordError {
    #[error("missing column {0:?}")]
    MissingColumn(&'static str),
    #[error("invalid date {0:?}")]
    InvalidDate(String),
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),
    #[error("record has no category")]
    EmptyCategory,
}

#[derive(Debug, PartialEq, Error)]
pub enum BudgetMappingError {
    #[error("budget item {0:?} is mapped more than once")]
    DuplicateItem(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("insufficient {class} data to project {year}")]
    InsufficientData { class: AccountClass, year: i32 },
    #[error("year {0} is out of range")]
    InvalidYear(i32),
    #[error("{class} amounts for {year} exceed the decimal range")]
    Overflow { class: AccountClass, year: i32 },
    #[error("net profit for {0} exceeds the decimal range")]
    NetOverflow(i32),
}

/// The two account types the dashboards report on. Any other account type
/// is carried through the records but never projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountClass {
    Income,
    Expenses,
}

impl AccountClass {
    pub fn label(&self) -> &'static str {
        match self {
            AccountClass::Income => "Income",
            AccountClass::Expenses => "Expenses",
        }
    }

    pub fn from_account_type(account_type: &str) -> Option<AccountClass> {
        match account_type {
            "Income" => Some(AccountClass::Income),
            "Expenses" => Some(AccountClass::Expenses),
            _ => None,
        }
    }
}

impl fmt::Display for AccountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
