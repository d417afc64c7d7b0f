use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::database::models::{Employee, EmploymentStatus};
use crate::database::repositories::{BalanceRepository, EmployeeRepository};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccrualRunSummary {
    pub year: i32,
    pub created: usize,
    pub skipped: usize,
    pub errors: usize,
    pub total: usize,
}

/// Yearly materialization of leave-balance rows. Safe to rerun: employees who
/// already have a row for the year are skipped, and one employee's failure
/// never blocks the rest.
#[derive(Clone)]
pub struct AccrualService {
    employees: EmployeeRepository,
    balances: BalanceRepository,
}

impl AccrualService {
    pub fn new(employees: EmployeeRepository, balances: BalanceRepository) -> Self {
        Self {
            employees,
            balances,
        }
    }

    pub async fn run_yearly_accrual(&self, year: i32) -> Result<AccrualRunSummary, AppError> {
        let reference = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| AppError::validation(format!("invalid accrual year {}", year)))?;

        let employees = self.employees.list_active().await?;
        let mut summary = AccrualRunSummary {
            year,
            created: 0,
            skipped: 0,
            errors: 0,
            total: employees.len(),
        };

        for employee in &employees {
            let quota = Self::annual_quota(employee, reference);
            match self
                .balances
                .materialize_leave_balance(employee.id, year, quota)
                .await
            {
                Ok(true) => summary.created += 1,
                Ok(false) => summary.skipped += 1,
                Err(err) => {
                    log::error!(
                        "accrual failed for employee {} (year {}): {}",
                        employee.id,
                        year,
                        err
                    );
                    summary.errors += 1;
                }
            }
        }

        log::info!(
            "yearly accrual for {}: {} created, {} skipped, {} errors of {} employees",
            year,
            summary.created,
            summary.skipped,
            summary.errors,
            summary.total
        );

        Ok(summary)
    }

    /// Entitlement in days. Tenure for contract staff is measured in whole
    /// months from the join date to January 1 of the target year, not to the
    /// run date, so a rerun later in the year yields the same quota.
    fn annual_quota(employee: &Employee, reference: NaiveDate) -> f64 {
        match employee.employment_status {
            EmploymentStatus::Pkwtt => 14.0,
            EmploymentStatus::Pkwt => {
                if whole_months_between(employee.join_date, reference) >= 12 {
                    14.0
                } else {
                    10.0
                }
            }
            _ => 0.0,
        }
    }
}

fn whole_months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    if from > to {
        return 0;
    }
    let mut months =
        (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32);
    if to.day() < from.day() {
        months -= 1;
    }
    months.max(0)
}
