//! Payroll batches, entries and the snapshot transaction

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shared::models::{
    ActiveEmployeeSalary, PayAmounts, PayrollBatch, PayrollEntry, PayrollStatus,
};

use shared::util::parse_month;

use super::organization::is_active_employee;
use super::{MemoryStore, Tables};
use crate::db::{PayrollStore, PayrollTx, RepoError, RepoResult};

#[async_trait]
impl PayrollStore for MemoryStore {
    async fn list_payroll_batches(&self) -> RepoResult<Vec<PayrollBatch>> {
        let mut rows: Vec<PayrollBatch> =
            self.tables.lock().payroll_batches.values().cloned().collect();
        rows.sort_by(|a, b| b.month.cmp(&a.month));
        Ok(rows)
    }

    async fn create_payroll_batch(
        &self,
        month: &str,
        created_by: Option<i64>,
    ) -> RepoResult<PayrollBatch> {
        if parse_month(month).is_err() {
            return Err(RepoError::Validation(format!("invalid month '{month}'")));
        }
        let mut tables = self.tables.lock();
        if tables.payroll_batches.values().any(|b| b.month == month) {
            return Err(RepoError::Duplicate("payroll_batches_month_key".to_string()));
        }
        let now = Utc::now();
        let batch = PayrollBatch {
            id: tables.next_id("payroll_batches"),
            month: month.to_string(),
            status: PayrollStatus::Draft,
            created_by,
            created_at: now,
            approved_by: None,
            approved_at: None,
            locked_at: None,
            updated_at: now,
        };
        tables.payroll_batches.insert(batch.id, batch.clone());
        Ok(batch)
    }

    async fn find_payroll_batch(&self, id: i64) -> RepoResult<Option<PayrollBatch>> {
        Ok(self.tables.lock().payroll_batches.get(&id).cloned())
    }

    async fn list_payroll_entries(&self, batch_id: i64) -> RepoResult<Vec<PayrollEntry>> {
        let tables = self.tables.lock();
        let mut rows: Vec<PayrollEntry> = tables
            .payroll_entries
            .values()
            .filter(|e| e.batch_id == batch_id)
            .map(|e| tables.joined_entry(e))
            .collect();
        rows.sort_by_key(|e| e.employee_id);
        Ok(rows)
    }

    async fn find_payroll_entry(&self, id: i64) -> RepoResult<Option<PayrollEntry>> {
        let tables = self.tables.lock();
        Ok(tables.payroll_entries.get(&id).map(|e| tables.joined_entry(e)))
    }

    async fn update_payroll_entry_amounts(
        &self,
        id: i64,
        amounts: &PayAmounts,
    ) -> RepoResult<PayrollEntry> {
        let mut tables = self.tables.lock();
        let entry = tables
            .payroll_entries
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("payroll entry {id}")))?;
        set_amounts(entry, amounts);
        entry.updated_at = Utc::now();
        let entry = entry.clone();
        Ok(tables.joined_entry(&entry))
    }

    async fn set_payroll_batch_approved(
        &self,
        id: i64,
        approved_by: Option<i64>,
        at: DateTime<Utc>,
    ) -> RepoResult<PayrollBatch> {
        let mut tables = self.tables.lock();
        let batch = tables
            .payroll_batches
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("payroll batch {id}")))?;
        batch.status = PayrollStatus::Approved;
        batch.approved_by = approved_by;
        batch.approved_at = Some(at);
        batch.updated_at = at;
        Ok(batch.clone())
    }

    async fn set_payroll_batch_locked(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> RepoResult<PayrollBatch> {
        let mut tables = self.tables.lock();
        let batch = tables
            .payroll_batches
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("payroll batch {id}")))?;
        batch.status = PayrollStatus::Locked;
        batch.locked_at = Some(at);
        batch.updated_at = at;
        Ok(batch.clone())
    }

    async fn begin_payroll_tx(&self) -> RepoResult<Box<dyn PayrollTx>> {
        let entries = self.tables.lock().payroll_entries.clone();
        let fail_insert_at = self.faults.lock().payroll_entry_insert_at;
        Ok(Box::new(MemoryPayrollTx {
            tables: Arc::clone(&self.tables),
            entries,
            touched: BTreeSet::new(),
            inserts: 0,
            fail_insert_at,
        }))
    }
}

fn set_amounts(entry: &mut PayrollEntry, amounts: &PayAmounts) {
    entry.base_salary = amounts.base_salary;
    entry.allowances_total = amounts.allowances_total;
    entry.deductions_total = amounts.deductions_total;
    entry.tax_total = amounts.tax_total;
    entry.gross_pay = amounts.gross_pay;
    entry.net_pay = amounts.net_pay;
}

/// Works on a private copy of the entries table; commit replaces the
/// live entries of every batch the transaction touched.
struct MemoryPayrollTx {
    tables: Arc<Mutex<Tables>>,
    entries: BTreeMap<i64, PayrollEntry>,
    touched: BTreeSet<i64>,
    inserts: usize,
    fail_insert_at: Option<usize>,
}

#[async_trait]
impl PayrollTx for MemoryPayrollTx {
    async fn delete_entries_by_batch(&mut self, batch_id: i64) -> RepoResult<u64> {
        self.touched.insert(batch_id);
        let before = self.entries.len();
        self.entries.retain(|_, e| e.batch_id != batch_id);
        Ok((before - self.entries.len()) as u64)
    }

    async fn list_active_employee_salaries(&mut self) -> RepoResult<Vec<ActiveEmployeeSalary>> {
        Ok(self
            .tables
            .lock()
            .employees
            .values()
            .filter(|e| is_active_employee(e))
            .map(|e| ActiveEmployeeSalary {
                employee_id: e.id,
                base_salary: e.base_salary,
            })
            .collect())
    }

    async fn create_entry(
        &mut self,
        batch_id: i64,
        employee_id: i64,
        amounts: &PayAmounts,
    ) -> RepoResult<PayrollEntry> {
        self.inserts += 1;
        if self.fail_insert_at == Some(self.inserts) {
            return Err(RepoError::Database(format!(
                "injected failure on payroll entry insert #{}",
                self.inserts
            )));
        }
        if self
            .entries
            .values()
            .any(|e| e.batch_id == batch_id && e.employee_id == employee_id)
        {
            return Err(RepoError::Duplicate("payroll_entries_batch_id_employee_id_key".to_string()));
        }
        self.touched.insert(batch_id);
        let now = Utc::now();
        let entry = PayrollEntry {
            id: self.tables.lock().next_id("payroll_entries"),
            batch_id,
            employee_id,
            employee_name: None,
            base_salary: amounts.base_salary,
            allowances_total: amounts.allowances_total,
            deductions_total: amounts.deductions_total,
            tax_total: amounts.tax_total,
            gross_pay: amounts.gross_pay,
            net_pay: amounts.net_pay,
            created_at: now,
            updated_at: now,
        };
        self.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let MemoryPayrollTx {
            tables,
            entries,
            touched,
            ..
        } = *self;
        let mut tables = tables.lock();
        tables
            .payroll_entries
            .retain(|_, e| !touched.contains(&e.batch_id));
        tables.payroll_entries.extend(
            entries
                .into_iter()
                .filter(|(_, e)| touched.contains(&e.batch_id)),
        );
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        Ok(())
    }
}
