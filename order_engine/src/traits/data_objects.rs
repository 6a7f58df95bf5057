use std::fmt::Display;

use crate::db_types::OrderId;

/// What happened to a single order during a watcher tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Funds were found and the order is now `Paid`.
    Paid(OrderId),
    /// The address holds less than the required amount.
    Unpaid(OrderId),
    /// The order has no payment address, so there is nothing to check.
    Skipped(OrderId),
    /// The balance query or the status update failed. The order will be checked again next tick.
    Failed(OrderId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub pages: usize,
    pub checked: usize,
    pub paid: usize,
    pub unpaid: usize,
    pub skipped: usize,
    pub failed: usize,
    /// True if the scan was cut short by a repository error.
    pub aborted: bool,
}

impl TickSummary {
    pub fn record(&mut self, outcome: CheckOutcome) {
        self.checked += 1;
        match outcome {
            CheckOutcome::Paid(_) => self.paid += 1,
            CheckOutcome::Unpaid(_) => self.unpaid += 1,
            CheckOutcome::Skipped(_) => self.skipped += 1,
            CheckOutcome::Failed(_) => self.failed += 1,
        }
    }
}

impl Display for TickSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} orders checked over {} pages: {} paid, {} unpaid, {} skipped, {} failed{}",
            self.checked,
            self.pages,
            self.paid,
            self.unpaid,
            self.skipped,
            self.failed,
            if self.aborted { " (scan aborted)" } else { "" }
        )
    }
}
