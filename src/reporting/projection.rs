use std::collections::BTreeSet;

use log::debug;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::record::{checked_total, of_class, Period, TransactionRecord};
use super::{AccountClass, ProjectionError, DISPLAY_PRECISION};

const PRECISION: u32 = 4;

/// Transactions left out of the daily rate. They still count in the
/// observed total.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RateExclusions {
    pub excluded_items: BTreeSet<String>,
    /// Transactions whose absolute amount is above this are outliers.
    pub outlier_threshold: Option<Decimal>,
}

impl RateExclusions {
    pub fn excludes(&self, transaction: &TransactionRecord) -> bool {
        if self.excluded_items.contains(transaction.item()) {
            return true;
        }

        match self.outlier_threshold {
            Some(threshold) => transaction.amount().abs() > threshold,
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassProjection {
    pub class: AccountClass,
    pub observed_total: Decimal,
    pub observed_days: i64,
    pub remaining_days: i64,
    pub rate_per_day: Decimal,
    pub projected_total: Decimal,
}

/// Extrapolates one account class linearly to the end of `year`.
///
/// The daily rate comes from the transactions dated in `year` that
/// `exclude` keeps; the projection is anchored on the sum of every
/// transaction of the class.
pub fn project_class<'a, I, P>(
    transactions: I,
    class: AccountClass,
    year: i32,
    exclude: P,
) -> Result<ClassProjection, ProjectionError>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
    P: Fn(&TransactionRecord) -> bool,
{
    let period = Period::year(year).ok_or(ProjectionError::InvalidYear(year))?;
    let subset = of_class(transactions, class);

    let last = subset
        .iter()
        .map(|t| t.date())
        .max()
        .ok_or(ProjectionError::InsufficientData { class, year })?;

    let observed_days = (last - period.start()).num_days();
    if observed_days <= 0 {
        return Err(ProjectionError::InsufficientData { class, year });
    }

    let overflow = || ProjectionError::Overflow { class, year };
    let rate_sum = checked_total(
        subset
            .iter()
            .copied()
            .filter(|t| t.date() >= period.start() && !exclude(*t)),
    )
    .ok_or_else(overflow)?;
    let rate_per_day = rate_sum
        .checked_div(Decimal::from(observed_days))
        .ok_or_else(overflow)?;
    let remaining_days = (period.end() - last).num_days();
    let observed_total = checked_total(subset.iter().copied()).ok_or_else(overflow)?;
    let projected_total = rate_per_day
        .checked_mul(Decimal::from(remaining_days))
        .and_then(|remaining| remaining.checked_add(observed_total))
        .ok_or_else(overflow)?
        .round_dp(PRECISION);

    debug!(
        "projected {}, class={}, observed_days={}, remaining_days={}, rate_per_day={}",
        year, class, observed_days, remaining_days, rate_per_day
    );

    Ok(ClassProjection {
        class,
        observed_total,
        observed_days,
        remaining_days,
        rate_per_day,
        projected_total,
    })
}

/// Expense and income projections for one year. Each side is computed on its
/// own, so one can lack data while the other projects normally.
#[derive(Debug, Clone, PartialEq)]
pub struct YearProjection {
    pub year: i32,
    pub expenses: Result<ClassProjection, ProjectionError>,
    pub income: Result<ClassProjection, ProjectionError>,
}

impl YearProjection {
    pub fn projected_expense_total(&self) -> Result<Decimal, ProjectionError> {
        self.expenses.as_ref().map(|p| p.projected_total).map_err(Clone::clone)
    }

    pub fn projected_income_total(&self) -> Result<Decimal, ProjectionError> {
        self.income.as_ref().map(|p| p.projected_total).map_err(Clone::clone)
    }

    pub fn projected_net_profit(&self) -> Result<Decimal, ProjectionError> {
        let income = self.projected_income_total()?;
        let expenses = self.projected_expense_total()?;
        let net = income.checked_sub(expenses).ok_or(ProjectionError::NetOverflow(self.year))?;

        Ok(net.round_dp(DISPLAY_PRECISION))
    }
}

pub fn project_year<P>(transactions: &[TransactionRecord], year: i32, exclude: P) -> YearProjection
where
    P: Fn(&TransactionRecord) -> bool,
{
    YearProjection {
        year,
        expenses: project_class(transactions, AccountClass::Expenses, year, &exclude),
        income: project_class(transactions, AccountClass::Income, year, &exclude),
    }
}
