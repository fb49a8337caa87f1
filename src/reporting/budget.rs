use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::BudgetMappingError;

/// One tracked line item: which report item it matches, how to label it and
/// which subcategory it is budgeted under. Amounts are monthly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetEntry {
    #[serde(rename = "QB_Item")]
    pub qb_item: String,
    #[serde(rename = "Item")]
    pub display_name: String,
    #[serde(rename = "Subcategory")]
    pub subcategory: String,
    #[serde(rename = "Budget")]
    pub budget_amount: Decimal,
}

impl BudgetEntry {
    pub fn new(
        qb_item: impl Into<String>,
        display_name: impl Into<String>,
        subcategory: impl Into<String>,
        budget_amount: Decimal,
    ) -> BudgetEntry {
        BudgetEntry {
            qb_item: qb_item.into(),
            display_name: display_name.into(),
            subcategory: subcategory.into(),
            budget_amount,
        }
    }
}

/// Budget entries keyed by `qb_item`, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetMapping {
    entries: Vec<BudgetEntry>,
    index: HashMap<String, usize>,
}

impl BudgetMapping {
    /// Fails on the first `qb_item` that appears twice.
    pub fn new(entries: Vec<BudgetEntry>) -> Result<BudgetMapping, BudgetMappingError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.qb_item.clone(), position).is_some() {
                return Err(BudgetMappingError::DuplicateItem(entry.qb_item.clone()));
            }
        }

        Ok(BudgetMapping { entries, index })
    }

    pub fn entries(&self) -> &[BudgetEntry] {
        &self.entries
    }

    pub fn get(&self, item: &str) -> Option<&BudgetEntry> {
        self.index.get(item).map(|&position| &self.entries[position])
    }

    pub fn contains(&self, item: &str) -> bool {
        self.index.contains_key(item)
    }

    /// Distinct subcategories in order of first appearance.
    pub fn subcategories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.subcategory.as_str()) {
                seen.push(&entry.subcategory);
            }
        }

        seen
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
