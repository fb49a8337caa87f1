use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::budget::BudgetMapping;
use super::record::{of_class, total, Period, TransactionRecord};
use super::{AccountClass, DISPLAY_PRECISION};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemTotal {
    pub item: String,
    pub amount_sum: Decimal,
    pub transaction_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubcategoryTotal {
    pub subcategory: String,
    pub budget_total: Decimal,
    pub actual_total: Decimal,
}

impl SubcategoryTotal {
    pub fn over_budget(&self) -> bool {
        self.actual_total > self.budget_total
    }
}

/// A budget entry next to what was actually recorded against it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetItemTotal {
    pub display_name: String,
    pub budget_amount: Decimal,
    pub actual_total: Decimal,
}

/// Groups by `item` in order of first appearance.
pub fn aggregate_by_item<'a, I>(transactions: I) -> Vec<ItemTotal>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut totals: Vec<ItemTotal> = Vec::new();
    let mut positions: HashMap<&'a str, usize> = HashMap::new();

    for transaction in transactions {
        let position = *positions.entry(transaction.item().as_str()).or_insert_with(|| {
            totals.push(ItemTotal {
                item: transaction.item().clone(),
                amount_sum: Decimal::ZERO,
                transaction_count: 0,
            });
            totals.len() - 1
        });

        let total = &mut totals[position];
        total.amount_sum += transaction.amount();
        total.transaction_count += 1;
    }

    totals
}

/// Left-joins the mapping onto the item totals and sums per subcategory, in
/// the mapping's subcategory order. Items without a mapping entry don't
/// reach any subcategory.
pub fn aggregate_by_subcategory<'a, I>(mapping: &BudgetMapping, transactions: I) -> Vec<SubcategoryTotal>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let item_totals: HashMap<String, Decimal> = aggregate_by_item(transactions)
        .into_iter()
        .map(|total| (total.item, total.amount_sum))
        .collect();

    let mut totals: Vec<SubcategoryTotal> = mapping
        .subcategories()
        .into_iter()
        .map(|subcategory| SubcategoryTotal {
            subcategory: subcategory.to_string(),
            budget_total: Decimal::ZERO,
            actual_total: Decimal::ZERO,
        })
        .collect();

    for entry in mapping.entries() {
        if let Some(total) = totals.iter_mut().find(|t| t.subcategory == entry.subcategory) {
            total.budget_total += entry.budget_amount;
            total.actual_total += item_totals.get(&entry.qb_item).copied().unwrap_or(Decimal::ZERO);
        }
    }

    totals
}

/// One row per mapping entry, in mapping order, zero when nothing matched.
pub fn budget_item_totals<'a, I>(mapping: &BudgetMapping, transactions: I) -> Vec<BudgetItemTotal>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let item_totals: HashMap<String, Decimal> = aggregate_by_item(transactions)
        .into_iter()
        .map(|total| (total.item, total.amount_sum))
        .collect();

    mapping
        .entries()
        .iter()
        .map(|entry| BudgetItemTotal {
            display_name: entry.display_name.clone(),
            budget_amount: entry.budget_amount,
            actual_total: item_totals.get(&entry.qb_item).copied().unwrap_or(Decimal::ZERO),
        })
        .collect()
}

/// Removes report-excluded items from an item table. Only the displayed
/// table is affected; totals are computed before this runs.
pub fn without_excluded(totals: Vec<ItemTotal>, excluded: &BTreeSet<String>) -> Vec<ItemTotal> {
    totals.into_iter().filter(|t| !excluded.contains(&t.item)).collect()
}

/// The transaction listing shown to the operator: excluded items removed,
/// largest amount first. Ties keep input order.
pub fn displayed_transactions<'a, I>(transactions: I, excluded: &BTreeSet<String>) -> Vec<&'a TransactionRecord>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut shown: Vec<&TransactionRecord> = transactions
        .into_iter()
        .filter(|t| !excluded.contains(t.item()))
        .collect();
    shown.sort_by(|a, b| b.amount().cmp(&a.amount()));

    shown
}

/// Running total by date for one account class.
pub fn cumulative_series<'a, I>(transactions: I, class: AccountClass) -> Vec<(NaiveDate, Decimal)>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut selected = of_class(transactions, class);
    selected.sort_by_key(|t| t.date());

    let mut running = Decimal::ZERO;
    selected
        .into_iter()
        .map(|t| {
            running += t.amount();
            (t.date(), running)
        })
        .collect()
}

/// Everything the month view shows for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub period: Period,
    pub total_expenses: Decimal,
    pub total_income: Decimal,
    pub subcategories: Vec<SubcategoryTotal>,
    pub items: Vec<ItemTotal>,
    pub transaction_count: usize,
}

impl MonthSummary {
    pub fn build(
        transactions: &[TransactionRecord],
        mapping: &BudgetMapping,
        period: Period,
        report_exclusions: &BTreeSet<String>,
    ) -> MonthSummary {
        let month = period.select(transactions);
        let expenses = of_class(month.iter().copied(), AccountClass::Expenses);
        let income = of_class(month.iter().copied(), AccountClass::Income);

        MonthSummary {
            period,
            total_expenses: total(expenses.iter().copied()).round_dp(DISPLAY_PRECISION),
            total_income: total(income.iter().copied()).round_dp(DISPLAY_PRECISION),
            subcategories: aggregate_by_subcategory(mapping, expenses.iter().copied()),
            items: without_excluded(aggregate_by_item(month.iter().copied()), report_exclusions),
            transaction_count: month.len(),
        }
    }

    pub fn net_profit(&self) -> Decimal {
        (self.total_income - self.total_expenses).round_dp(DISPLAY_PRECISION)
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }
}
