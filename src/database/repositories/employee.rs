use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{Employee, EmployeeInput};

const EMPLOYEE_COLUMNS: &str = r#"
    id,
    name,
    employment_status,
    join_date,
    is_active,
    created_at
"#;

/// Minimal employee profile store. Identity and org hierarchy live elsewhere;
/// the accrual job only needs status, join date and the active flag.
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: EmployeeInput) -> Result<Employee, sqlx::Error> {
        sqlx::query_as::<_, Employee>(&format!(
            r#"
            INSERT INTO
                employees (id, name, employment_status, join_date, is_active, created_at)
            VALUES
                (?, ?, ?, ?, ?, ?)
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.name)
        .bind(input.employment_status)
        .bind(input.join_date)
        .bind(input.is_active)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Employee>, sqlx::Error> {
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_active(&self) -> Result<Vec<Employee>, sqlx::Error> {
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE is_active = 1 ORDER BY join_date ASC"
        ))
        .fetch_all(&self.pool)
        .await
    }
}
