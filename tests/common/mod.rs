use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tempfile::TempDir;

use hris_be::database::init_database;
use hris_be::database::models::{Employee, EmployeeInput, EmploymentStatus, OvertimeEntryInput};
use hris_be::database::repositories::{BalanceRepository, EmployeeRepository, RevisionRepository};
use hris_be::{AccrualService, OvertimeWorkflow};

// A long window so scenario tests can use fixed historical dates.
const TEST_WINDOW_DAYS: i64 = 36_500;

pub struct TestContext {
    pub pool: SqlitePool,
    pub workflow: OvertimeWorkflow,
    pub balances: BalanceRepository,
    pub revisions: RevisionRepository,
    pub employees: EmployeeRepository,
    pub accrual: AccrualService,
    _temp_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        Self::with_window(TEST_WINDOW_DAYS).await
    }

    pub async fn with_window(entry_window_days: i64) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let database_url = format!("sqlite:{}/test.db", temp_dir.path().display());
        let pool = init_database(&database_url).await?;

        let balances = BalanceRepository::new(pool.clone());
        let revisions = RevisionRepository::new(pool.clone());
        let employees = EmployeeRepository::new(pool.clone());
        let workflow = OvertimeWorkflow::new(pool.clone(), entry_window_days);
        let accrual = AccrualService::new(employees.clone(), balances.clone());

        Ok(TestContext {
            pool,
            workflow,
            balances,
            revisions,
            employees,
            accrual,
            _temp_dir: temp_dir,
        })
    }

    #[allow(dead_code)]
    pub async fn seed_employee(&self, status: EmploymentStatus, join_date: NaiveDate) -> Employee {
        self.employees
            .create(EmployeeInput {
                name: "Test Employee".to_string(),
                employment_status: status,
                join_date,
                is_active: true,
            })
            .await
            .expect("failed to seed employee")
    }

    #[allow(dead_code)]
    pub async fn seed_inactive_employee(&self, status: EmploymentStatus) -> Employee {
        self.employees
            .create(EmployeeInput {
                name: "Former Employee".to_string(),
                employment_status: status,
                join_date: date(2020, 1, 1),
                is_active: false,
            })
            .await
            .expect("failed to seed employee")
    }
}

#[allow(dead_code)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// An entry dated relative to today, always inside the default window.
#[allow(dead_code)]
pub fn entry(days_ago: i64, hours: f64) -> OvertimeEntryInput {
    OvertimeEntryInput {
        work_date: Utc::now().date_naive() - chrono::Duration::days(days_ago),
        hours,
        description: "release support".to_string(),
    }
}
