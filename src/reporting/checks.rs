use std::fmt;

use log::warn;

use super::budget::BudgetMapping;
use super::record::TransactionRecord;
use super::AccountClass;

/// Advisory findings about the loaded data. None of them stop a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataWarning {
    UnrecognizedTransactionType(String),
    /// An expense item with no budget entry. It counts toward the overall
    /// totals but never shows up in a subcategory.
    UnbudgetedItem(String),
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::UnrecognizedTransactionType(kind) => {
                write!(f, "{kind:?} is not a recognized transaction type")
            },
            DataWarning::UnbudgetedItem(item) => {
                write!(f, "{item:?} is not in any budget category, consider adding it to the mapping")
            },
        }
    }
}

/// Reports each unexpected transaction type and each unbudgeted expense item
/// once, in order of first appearance.
pub fn check_fields(
    transactions: &[TransactionRecord],
    mapping: &BudgetMapping,
    expected_types: &[String],
) -> Vec<DataWarning> {
    let mut warnings = Vec::new();

    for transaction in transactions {
        let kind = transaction.transaction_type();
        let warning = DataWarning::UnrecognizedTransactionType(kind.clone());
        if !expected_types.contains(kind) && !warnings.contains(&warning) {
            warnings.push(warning);
        }
    }

    for transaction in transactions.iter().filter(|t| t.is_class(AccountClass::Expenses)) {
        let warning = DataWarning::UnbudgetedItem(transaction.item().clone());
        if !mapping.contains(transaction.item()) && !warnings.contains(&warning) {
            warnings.push(warning);
        }
    }

    for warning in &warnings {
        warn!("{}", warning);
    }

    warnings
}
