//! Monthly payroll batches
//!
//! Batch lifecycle is `Draft -> Approved -> Locked`. Entries can only be
//! regenerated or edited while the batch is a draft, and only approved or
//! locked batches can be exported.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    EntryAmountsInput, ExportFile, PayAmounts, PayrollBatch, PayrollBatchDetail, PayrollEntry,
    PayrollStatus,
};
use shared::util::parse_month;

use super::roles;
use crate::audit::{AuditEvent, AuditRecorder, noop_recorder};
use crate::auth::{Claims, require_role};
use crate::db::{PayrollStore, RepoError, Store, with_payroll_tx};
use crate::utils::csv::{money, write_csv};

pub const PAYROLL_CSV_HEADER: [&str; 8] = [
    "Employee ID",
    "Employee Name",
    "Base Salary",
    "Allowances",
    "Deductions",
    "Tax",
    "Gross Pay",
    "Net Pay",
];

pub struct PayrollService {
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditRecorder>,
}

impl PayrollService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            audit: noop_recorder(),
        }
    }

    pub fn set_audit_recorder(&mut self, recorder: Arc<dyn AuditRecorder>) {
        self.audit = recorder;
    }

    pub async fn list(&self, claims: &Claims) -> AppResult<Vec<PayrollBatch>> {
        require_role(claims, roles::PAYROLL)?;
        Ok(self.store.list_payroll_batches().await?)
    }

    pub async fn create(&self, claims: &Claims, month: &str) -> AppResult<PayrollBatch> {
        require_role(claims, roles::PAYROLL)?;
        let month = month.trim();
        parse_month(month)?;

        let batch = match self.store.create_payroll_batch(month, Some(claims.user_id)).await {
            Ok(batch) => batch,
            Err(RepoError::Duplicate(_)) => {
                return Err(AppError::with_message(
                    ErrorCode::DuplicateMonth,
                    format!("a payroll batch for {month} already exists"),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(batch_id = batch.id, month, "Payroll batch created");
        self.audit
            .record(
                AuditEvent::new("payroll.batch.create", "payroll_batch")
                    .actor(claims.user_id)
                    .entity(batch.id)
                    .metadata(json!({ "month": batch.month })),
            )
            .await;
        Ok(batch)
    }

    pub async fn get(&self, claims: &Claims, id: i64) -> AppResult<PayrollBatchDetail> {
        require_role(claims, roles::PAYROLL)?;
        let batch = self.load_batch(id).await?;
        let entries = self.store.list_payroll_entries(id).await?;
        Ok(PayrollBatchDetail { batch, entries })
    }

    /// Replace the draft's entries with one base-salary entry per active employee.
    /// Runs in one transaction; any failure leaves the previous entries in place.
    pub async fn generate(&self, claims: &Claims, id: i64) -> AppResult<PayrollBatchDetail> {
        require_role(claims, roles::PAYROLL)?;
        let batch = self.load_batch(id).await?;
        ensure_draft(&batch)?;

        let batch_id = batch.id;
        let generated = with_payroll_tx(self.store.as_ref(), move |tx| {
            Box::pin(async move {
                let removed = tx.delete_entries_by_batch(batch_id).await?;
                let employees = tx.list_active_employee_salaries().await?;
                for employee in &employees {
                    tx.create_entry(
                        batch_id,
                        employee.employee_id,
                        &PayAmounts::base_only(employee.base_salary),
                    )
                    .await?;
                }
                tracing::debug!(batch_id, removed, "Replaced draft payroll entries");
                Ok::<_, AppError>(employees.len())
            })
        })
        .await
        .inspect_err(|e| tracing::warn!(batch_id, error = %e, "Payroll generation rolled back"))?;

        tracing::info!(batch_id, entries = generated, "Payroll entries generated");
        self.audit
            .record(
                AuditEvent::new("payroll.batch.generate", "payroll_batch")
                    .actor(claims.user_id)
                    .entity(batch_id)
                    .metadata(json!({ "entries_generated": generated })),
            )
            .await;

        let entries = self.store.list_payroll_entries(batch_id).await?;
        Ok(PayrollBatchDetail { batch, entries })
    }

    pub async fn update_entry(
        &self,
        claims: &Claims,
        entry_id: i64,
        input: EntryAmountsInput,
    ) -> AppResult<PayrollEntry> {
        require_role(claims, roles::PAYROLL)?;
        for (field, value) in [
            ("allowances", input.allowances),
            ("deductions", input.deductions),
            ("tax", input.tax),
        ] {
            if value < Decimal::ZERO {
                return Err(AppError::validation(format!("{field} must not be negative"))
                    .with_detail("field", field));
            }
        }

        let entry = self
            .store
            .find_payroll_entry(entry_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("payroll entry {entry_id}")))?;
        let batch = self.load_batch(entry.batch_id).await?;
        ensure_draft(&batch)?;

        let amounts = PayAmounts::compute(entry.base_salary, input.allowances, input.deductions, input.tax);
        let updated = self.store.update_payroll_entry_amounts(entry_id, &amounts).await?;

        self.audit
            .record(
                AuditEvent::new("payroll.entry.update", "payroll_entry")
                    .actor(claims.user_id)
                    .entity(entry_id)
                    .metadata(json!({
                        "batch_id": batch.id,
                        "employee_id": updated.employee_id,
                        "allowances": input.allowances,
                        "deductions": input.deductions,
                        "tax": input.tax,
                        "net_pay": updated.net_pay,
                    })),
            )
            .await;
        Ok(updated)
    }

    pub async fn approve(&self, claims: &Claims, id: i64) -> AppResult<PayrollBatch> {
        require_role(claims, roles::PAYROLL)?;
        let batch = self.load_batch(id).await?;
        if batch.status != PayrollStatus::Draft {
            return Err(AppError::invalid_transition(batch.status, PayrollStatus::Approved));
        }
        let approved = self
            .store
            .set_payroll_batch_approved(id, Some(claims.user_id), Utc::now())
            .await?;
        self.record_transition(claims, &batch, &approved, "payroll.batch.approve")
            .await;
        Ok(approved)
    }

    pub async fn lock(&self, claims: &Claims, id: i64) -> AppResult<PayrollBatch> {
        require_role(claims, roles::PAYROLL)?;
        let batch = self.load_batch(id).await?;
        if batch.status != PayrollStatus::Approved {
            return Err(AppError::invalid_transition(batch.status, PayrollStatus::Locked));
        }
        let locked = self.store.set_payroll_batch_locked(id, Utc::now()).await?;
        self.record_transition(claims, &batch, &locked, "payroll.batch.lock")
            .await;
        Ok(locked)
    }

    pub async fn export_csv(&self, claims: &Claims, id: i64) -> AppResult<ExportFile> {
        require_role(claims, roles::PAYROLL)?;
        let batch = self.load_batch(id).await?;
        if !batch.status.is_exportable() {
            return Err(AppError::with_message(
                ErrorCode::ExportNotAllowed,
                format!("batch {} is {}; only approved or locked batches export", batch.id, batch.status),
            ));
        }

        let entries = self.store.list_payroll_entries(id).await?;
        let row_count = entries.len();
        let content = write_csv(
            &PAYROLL_CSV_HEADER,
            entries.into_iter().map(|e| {
                vec![
                    e.employee_id.to_string(),
                    e.employee_name.unwrap_or_default(),
                    money(e.base_salary),
                    money(e.allowances_total),
                    money(e.deductions_total),
                    money(e.tax_total),
                    money(e.gross_pay),
                    money(e.net_pay),
                ]
            }),
        )?;

        self.audit
            .record(
                AuditEvent::new("payroll.batch.export", "payroll_batch")
                    .actor(claims.user_id)
                    .entity(id)
                    .metadata(json!({ "rows": row_count })),
            )
            .await;
        Ok(ExportFile::csv(format!("payroll-{}.csv", batch.month), content))
    }

    async fn record_transition(&self, claims: &Claims, before: &PayrollBatch, after: &PayrollBatch, action: &str) {
        tracing::info!(batch_id = after.id, from = %before.status, to = %after.status, "Payroll batch status changed");
        self.audit
            .record(
                AuditEvent::new(action, "payroll_batch")
                    .actor(claims.user_id)
                    .entity(after.id)
                    .metadata(json!({
                        "month": after.month,
                        "from": before.status.as_str(),
                        "to": after.status.as_str(),
                    })),
            )
            .await;
    }

    async fn load_batch(&self, id: i64) -> AppResult<PayrollBatch> {
        self.store
            .find_payroll_batch(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("payroll batch {id}")))
    }
}

fn ensure_draft(batch: &PayrollBatch) -> AppResult<()> {
    if batch.status == PayrollStatus::Draft {
        Ok(())
    } else {
        Err(AppError::with_message(
            ErrorCode::ImmutableBatch,
            format!("batch {} is {} and can no longer change", batch.id, batch.status),
        ))
    }
}
