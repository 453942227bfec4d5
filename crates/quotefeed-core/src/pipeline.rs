//! Bounded concurrent fan-out over independent work units.
//!
//! Sources that fetch one page per ticker (or per expiry date) hand the
//! pipeline their unit list and a fetch future per unit. Units run
//! concurrently up to the worker budget, and one unit failing never
//! stops the others: its error is recorded against the unit and the
//! rest of the batch completes. Row writes into the shared table happen
//! serially on the coordinating task, so fetch futures never contend on
//! the table.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::error::SourceError;
use crate::table::{ResultTable, TableRow};

pub const DEFAULT_WORKER_BUDGET: usize = 8;

/// One unit that failed during a batch fetch, with the error that
/// stopped it.
#[derive(Debug)]
pub struct UnitFailure {
    unit: String,
    error: SourceError,
}

impl UnitFailure {
    pub fn new(unit: impl Into<String>, error: SourceError) -> Self {
        Self {
            unit: unit.into(),
            error,
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn error(&self) -> &SourceError {
        &self.error
    }
}

/// Result of a batch fetch: every row the successful units produced,
/// plus the per-unit errors of the units that failed.
#[derive(Debug)]
pub struct FetchOutcome {
    table: ResultTable,
    failures: Vec<UnitFailure>,
}

impl FetchOutcome {
    pub fn new(table: ResultTable, failures: Vec<UnitFailure>) -> Self {
        Self { table, failures }
    }

    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    pub fn failures(&self) -> &[UnitFailure] {
        &self.failures
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_parts(self) -> (ResultTable, Vec<UnitFailure>) {
        (self.table, self.failures)
    }

    /// Strict accessor for callers that treat any unit failure as fatal.
    pub fn into_table(self) -> Result<ResultTable, SourceError> {
        if self.failures.is_empty() {
            return Ok(self.table);
        }
        let units: Vec<&str> = self.failures.iter().map(UnitFailure::unit).collect();
        Err(SourceError::incomplete(format!(
            "{} units failed: {}",
            self.failures.len(),
            units.join(", ")
        )))
    }
}

/// Concurrent fetch coordinator with a fixed worker budget.
#[derive(Debug, Clone)]
pub struct FetchPipeline {
    worker_budget: usize,
}

impl Default for FetchPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_BUDGET)
    }
}

impl FetchPipeline {
    /// A budget of zero is treated as one worker.
    pub fn new(worker_budget: usize) -> Self {
        Self {
            worker_budget: worker_budget.max(1),
        }
    }

    pub fn worker_budget(&self) -> usize {
        self.worker_budget
    }

    /// Fetches every unit, merging the rows each unit yields into the
    /// given table as units complete. A unit's rows are applied
    /// all-or-nothing, so a unit that fails contributes no rows at all.
    ///
    /// Completion order is unspecified; callers that need a stable row
    /// order sort the table afterwards.
    pub async fn fetch_all<U, F, Fut>(
        &self,
        table: ResultTable,
        units: Vec<U>,
        fetch: F,
    ) -> FetchOutcome
    where
        U: Display,
        F: Fn(U) -> Fut,
        Fut: Future<Output = Result<Vec<TableRow>, SourceError>> + Send + 'static,
    {
        let mut table = table;
        let mut failures = Vec::new();
        let semaphore = Arc::new(Semaphore::new(self.worker_budget));
        let mut tasks = JoinSet::new();

        for unit in units {
            let label = unit.to_string();
            let work = fetch(unit);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (label, Err(SourceError::internal("worker pool closed"))),
                };
                let result = work.await;
                (label, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((unit, Ok(rows))) => {
                    if let Err(error) = table.upsert_all(rows) {
                        warn!(unit = %unit, error = %error, "discarding rows from unit");
                        failures.push(UnitFailure {
                            unit,
                            error: error.into(),
                        });
                    }
                }
                Ok((unit, Err(error))) => {
                    warn!(unit = %unit, error = %error, "unit fetch failed");
                    failures.push(UnitFailure { unit, error });
                }
                Err(join_error) => {
                    warn!(error = %join_error, "fetch task aborted");
                    failures.push(UnitFailure {
                        unit: String::from("<unknown>"),
                        error: SourceError::internal(format!("fetch task aborted: {join_error}")),
                    });
                }
            }
        }

        FetchOutcome { table, failures }
    }
}
