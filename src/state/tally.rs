use crate::types::PercentageResult;
use std::collections::{HashMap, HashSet};

/// Answer counts for the open question
#[derive(Debug, Clone, Default)]
pub struct Tally {
    counts: HashMap<String, u32>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.counts.clear();
    }

    pub fn record(&mut self, option: &str) {
        *self.counts.entry(option.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, option: &str) -> u32 {
        self.counts.get(option).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Percentage of the total for every declared option.
    ///
    /// Dense over `options`: unvoted options are present with 0, and everything
    /// is 0 while no answer has been recorded. A repeated option appears once.
    /// The total also counts undeclared options.
    pub fn snapshot(&self, options: &[String]) -> PercentageResult {
        let total = self.total();
        let mut seen = HashSet::new();
        let entries = options
            .iter()
            .filter(|option| seen.insert(option.as_str()))
            .map(|option| {
                let pct = if total == 0 {
                    0.0
                } else {
                    100.0 * f64::from(self.count(option)) / f64::from(total)
                };
                (option.clone(), pct)
            })
            .collect();
        PercentageResult::new(entries)
    }
}
