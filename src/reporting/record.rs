use chrono::NaiveDate;
use getset::{CopyGetters, Getters};
use rust_decimal::Decimal;

use super::{AccountClass, RecordError};

/// Separator used when a category path is stored as a single string.
pub const CATEGORY_SEPARATOR: char = ':';

/// One line of financial activity, tagged with where it sat in the report tree.
///
/// `account_type` and `item` are always the first and last segment of
/// `category_path`, so the path can never be empty.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct TransactionRecord {
    #[getset(get_copy = "pub")]
    date: NaiveDate,
    #[getset(get = "pub")]
    account_type: String,
    #[getset(get = "pub")]
    category_path: Vec<String>,
    #[getset(get_copy = "pub")]
    category_depth: u32,
    #[getset(get = "pub")]
    item: String,
    #[getset(get = "pub")]
    description: String,
    #[getset(get_copy = "pub")]
    amount: Decimal,
    #[getset(get = "pub")]
    transaction_type: String,
}

impl TransactionRecord {
    pub fn new(
        date: NaiveDate,
        category_path: Vec<String>,
        category_depth: u32,
        description: impl Into<String>,
        amount: Decimal,
        transaction_type: impl Into<String>,
    ) -> Result<TransactionRecord, RecordError> {
        let (account_type, item) = match (category_path.first(), category_path.last()) {
            (Some(first), Some(last)) => (first.clone(), last.clone()),
            _ => return Err(RecordError::EmptyCategory),
        };

        Ok(TransactionRecord {
            date,
            account_type,
            category_path,
            category_depth,
            item,
            description: description.into(),
            amount,
            transaction_type: transaction_type.into(),
        })
    }

    pub fn account_class(&self) -> Option<AccountClass> {
        AccountClass::from_account_type(&self.account_type)
    }

    pub fn is_class(&self, class: AccountClass) -> bool {
        self.account_class() == Some(class)
    }

    /// The category path joined the way the transaction table stores it.
    pub fn category(&self) -> String {
        self.category_path.join(&CATEGORY_SEPARATOR.to_string())
    }
}

/// A half-open calendar window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

impl Period {
    pub fn month(year: i32, month: u32) -> Option<Period> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };

        Some(Period { start, end })
    }

    pub fn year(year: i32) -> Option<Period> {
        Some(Period {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn select<'a, I>(&self, transactions: I) -> Vec<&'a TransactionRecord>
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        transactions.into_iter().filter(|t| self.contains(t.date())).collect()
    }
}

pub fn of_class<'a, I>(transactions: I, class: AccountClass) -> Vec<&'a TransactionRecord>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    transactions.into_iter().filter(|t| t.is_class(class)).collect()
}

/// Sum of the amounts.
///
/// # Panics
///
/// If the sum leaves the `Decimal` range. Use [`checked_total`] where that can
/// happen.
pub fn total<'a, I>(transactions: I) -> Decimal
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    transactions.into_iter().map(|t| t.amount()).sum()
}

/// `None` if the sum leaves the `Decimal` range.
pub fn checked_total<'a, I>(transactions: I) -> Option<Decimal>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    transactions
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, t| sum.checked_add(t.amount()))
}
