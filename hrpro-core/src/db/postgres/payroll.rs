//! Payroll batches and entries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{ActiveEmployeeSalary, PayAmounts, PayrollBatch, PayrollEntry};
use sqlx::{Postgres, Transaction};

use super::PgStore;
use crate::db::{PayrollStore, PayrollTx, RepoError, RepoResult};

const BATCH_COLUMNS: &str = "id, month, status, created_by, created_at, approved_by, \
     approved_at, locked_at, updated_at";

const ENTRY_COLUMNS: &str = "id, batch_id, employee_id, base_salary, allowances_total, \
     deductions_total, tax_total, gross_pay, net_pay, created_at, updated_at";

const ENTRY_SELECT: &str = "SELECT p.id, p.batch_id, p.employee_id, \
     (e.first_name || ' ' || e.last_name) AS employee_name, p.base_salary, \
     p.allowances_total, p.deductions_total, p.tax_total, p.gross_pay, p.net_pay, \
     p.created_at, p.updated_at \
     FROM payroll_entries p LEFT JOIN employees e ON e.id = p.employee_id";

#[async_trait]
impl PayrollStore for PgStore {
    async fn list_payroll_batches(&self) -> RepoResult<Vec<PayrollBatch>> {
        let rows = sqlx::query_as::<_, PayrollBatch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM payroll_batches ORDER BY month DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_payroll_batch(
        &self,
        month: &str,
        created_by: Option<i64>,
    ) -> RepoResult<PayrollBatch> {
        let row = sqlx::query_as::<_, PayrollBatch>(&format!(
            "INSERT INTO payroll_batches (month, status, created_by) VALUES ($1, 'Draft', $2) \
             RETURNING {BATCH_COLUMNS}"
        ))
        .bind(month)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_payroll_batch(&self, id: i64) -> RepoResult<Option<PayrollBatch>> {
        let row = sqlx::query_as::<_, PayrollBatch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM payroll_batches WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_payroll_entries(&self, batch_id: i64) -> RepoResult<Vec<PayrollEntry>> {
        let rows = sqlx::query_as::<_, PayrollEntry>(&format!(
            "{ENTRY_SELECT} WHERE p.batch_id = $1 ORDER BY p.employee_id"
        ))
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_payroll_entry(&self, id: i64) -> RepoResult<Option<PayrollEntry>> {
        let row = sqlx::query_as::<_, PayrollEntry>(&format!("{ENTRY_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_payroll_entry_amounts(
        &self,
        id: i64,
        amounts: &PayAmounts,
    ) -> RepoResult<PayrollEntry> {
        let result = sqlx::query(
            "UPDATE payroll_entries SET base_salary = $2, allowances_total = $3, \
               deductions_total = $4, tax_total = $5, gross_pay = $6, net_pay = $7, \
               updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(amounts.base_salary)
        .bind(amounts.allowances_total)
        .bind(amounts.deductions_total)
        .bind(amounts.tax_total)
        .bind(amounts.gross_pay)
        .bind(amounts.net_pay)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("payroll entry {id}")));
        }
        self.find_payroll_entry(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("payroll entry {id}")))
    }

    async fn set_payroll_batch_approved(
        &self,
        id: i64,
        approved_by: Option<i64>,
        at: DateTime<Utc>,
    ) -> RepoResult<PayrollBatch> {
        sqlx::query_as::<_, PayrollBatch>(&format!(
            "UPDATE payroll_batches SET status = 'Approved', approved_by = $2, approved_at = $3, \
               updated_at = $3 \
             WHERE id = $1 RETURNING {BATCH_COLUMNS}"
        ))
        .bind(id)
        .bind(approved_by)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("payroll batch {id}")))
    }

    async fn set_payroll_batch_locked(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> RepoResult<PayrollBatch> {
        sqlx::query_as::<_, PayrollBatch>(&format!(
            "UPDATE payroll_batches SET status = 'Locked', locked_at = $2, updated_at = $2 \
             WHERE id = $1 RETURNING {BATCH_COLUMNS}"
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("payroll batch {id}")))
    }

    async fn begin_payroll_tx(&self) -> RepoResult<Box<dyn PayrollTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgPayrollTx { tx }))
    }
}

/// Payroll operations inside one Postgres transaction
struct PgPayrollTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PayrollTx for PgPayrollTx {
    async fn delete_entries_by_batch(&mut self, batch_id: i64) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM payroll_entries WHERE batch_id = $1")
            .bind(batch_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_active_employee_salaries(&mut self) -> RepoResult<Vec<ActiveEmployeeSalary>> {
        let rows = sqlx::query_as::<_, ActiveEmployeeSalary>(
            "SELECT id AS employee_id, base_salary FROM employees \
             WHERE lower(trim(employment_status)) = 'active' ORDER BY id",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn create_entry(
        &mut self,
        batch_id: i64,
        employee_id: i64,
        amounts: &PayAmounts,
    ) -> RepoResult<PayrollEntry> {
        let row = sqlx::query_as::<_, PayrollEntry>(&format!(
            "INSERT INTO payroll_entries (batch_id, employee_id, base_salary, allowances_total, \
               deductions_total, tax_total, gross_pay, net_pay) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(batch_id)
        .bind(employee_id)
        .bind(amounts.base_salary)
        .bind(amounts.allowances_total)
        .bind(amounts.deductions_total)
        .bind(amounts.tax_total)
        .bind(amounts.gross_pay)
        .bind(amounts.net_pay)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
