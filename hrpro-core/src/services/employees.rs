//! Employee records and their contract documents

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    Employee, EmployeeData, EmployeeInput, EmployeeQuery, Gender, PaginatedResponse, StoredFile,
};
use shared::util::{clean_optional, parse_iso_date, parse_optional_iso_date};

use super::roles;
use crate::audit::{AuditEvent, AuditRecorder, noop_recorder};
use crate::auth::{Claims, require_role};
use crate::db::{DepartmentStore, EmployeeStore, Store};
use crate::storage::{FileStore, contract_path, extension_of};
use crate::utils::phone::{DEFAULT_COUNTRY_CODE, normalize_phone};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, validate_email,
    validate_optional_text, validate_phone, validate_required_text,
};

/// Accepted contract document extensions
pub const CONTRACT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

pub struct EmployeeService {
    store: Arc<dyn Store>,
    files: FileStore,
    audit: Arc<dyn AuditRecorder>,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn Store>, files: FileStore) -> Self {
        Self {
            store,
            files,
            audit: noop_recorder(),
        }
    }

    pub fn set_audit_recorder(&mut self, recorder: Arc<dyn AuditRecorder>) {
        self.audit = recorder;
    }

    pub async fn list(&self, claims: &Claims, query: EmployeeQuery) -> AppResult<PaginatedResponse<Employee>> {
        require_role(claims, roles::EMPLOYEE_READERS)?;
        let (rows, total) = self.store.list_employees(&query).await?;
        Ok(PaginatedResponse::from_request(rows, total, &query.page))
    }

    pub async fn get(&self, claims: &Claims, id: i64) -> AppResult<Employee> {
        require_role(claims, roles::EMPLOYEE_READERS)?;
        self.load(id).await
    }

    pub async fn create(&self, claims: &Claims, input: EmployeeInput) -> AppResult<Employee> {
        require_role(claims, roles::EMPLOYEE_WRITERS)?;
        let data = self.validate(input).await?;
        let employee = self.store.create_employee(&data).await?;

        tracing::info!(employee_id = employee.id, "Employee created");
        self.audit
            .record(
                AuditEvent::new("employee.create", "employee")
                    .actor(claims.user_id)
                    .entity(employee.id)
                    .metadata(json!({ "name": employee.full_name(), "department_id": employee.department_id })),
            )
            .await;
        Ok(employee)
    }

    pub async fn update(&self, claims: &Claims, id: i64, input: EmployeeInput) -> AppResult<Employee> {
        require_role(claims, roles::EMPLOYEE_WRITERS)?;
        let before = self.load(id).await?;
        let data = self.validate(input).await?;
        let employee = self.store.update_employee(id, &data).await?;

        self.audit
            .record(
                AuditEvent::new("employee.update", "employee")
                    .actor(claims.user_id)
                    .entity(id)
                    .metadata(json!({
                        "name": employee.full_name(),
                        "old_status": before.employment_status,
                        "new_status": employee.employment_status,
                    })),
            )
            .await;
        Ok(employee)
    }

    /// Delete the record, then drop its contract file if one was stored
    pub async fn delete(&self, claims: &Claims, id: i64) -> AppResult<()> {
        require_role(claims, roles::EMPLOYEE_WRITERS)?;
        let employee = self.load(id).await?;
        if !self.store.delete_employee(id).await? {
            return Err(AppError::not_found(format!("employee {id}")));
        }
        if let Some(path) = &employee.contract_file_path {
            self.remove_file_best_effort(path).await;
        }

        tracing::info!(employee_id = id, "Employee deleted");
        self.audit
            .record(
                AuditEvent::new("employee.delete", "employee")
                    .actor(claims.user_id)
                    .entity(id)
                    .metadata(json!({ "name": employee.full_name() })),
            )
            .await;
        Ok(())
    }

    pub async fn upload_contract(
        &self,
        claims: &Claims,
        id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> AppResult<Employee> {
        require_role(claims, roles::EMPLOYEE_WRITERS)?;
        if bytes.is_empty() {
            return Err(AppError::new(ErrorCode::EmptyFile));
        }
        let ext = extension_of(filename)
            .filter(|ext| CONTRACT_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::UnsupportedFileFormat,
                    format!("contract must be one of {}", CONTRACT_EXTENSIONS.join(", ")),
                )
            })?;
        let before = self.load(id).await?;

        let path = contract_path(id, &ext);
        self.files.put(&path, bytes).await?;
        let employee = match self.store.set_contract_path(id, Some(&path)).await {
            Ok(employee) => employee,
            Err(e) => {
                self.remove_file_best_effort(&path).await;
                return Err(e.into());
            }
        };
        if let Some(previous) = &before.contract_file_path {
            self.remove_file_best_effort(previous).await;
        }

        self.audit
            .record(
                AuditEvent::new("employee.contract.upload", "employee")
                    .actor(claims.user_id)
                    .entity(id)
                    .metadata(json!({ "path": path, "size": bytes.len() })),
            )
            .await;
        Ok(employee)
    }

    pub async fn read_contract(&self, claims: &Claims, id: i64) -> AppResult<StoredFile> {
        require_role(claims, roles::EMPLOYEE_READERS)?;
        let employee = self.load(id).await?;
        let path = employee
            .contract_file_path
            .ok_or_else(|| AppError::not_found(format!("contract for employee {id}")))?;
        self.files.get(&path).await
    }

    /// Missing files are fine; the stored path is cleared either way
    pub async fn remove_contract(&self, claims: &Claims, id: i64) -> AppResult<Employee> {
        require_role(claims, roles::EMPLOYEE_WRITERS)?;
        let employee = self.load(id).await?;
        let Some(path) = employee.contract_file_path else {
            return Ok(employee);
        };
        let existed = self.files.delete(&path).await?;
        let employee = self.store.set_contract_path(id, None).await?;

        self.audit
            .record(
                AuditEvent::new("employee.contract.remove", "employee")
                    .actor(claims.user_id)
                    .entity(id)
                    .metadata(json!({ "path": path, "file_existed": existed })),
            )
            .await;
        Ok(employee)
    }

    async fn load(&self, id: i64) -> AppResult<Employee> {
        self.store
            .find_employee(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("employee {id}")))
    }

    async fn remove_file_best_effort(&self, path: &str) {
        if let Err(e) = self.files.delete(path).await {
            tracing::warn!(path, error = %e, "Failed to remove contract file");
        }
    }

    async fn validate(&self, input: EmployeeInput) -> AppResult<EmployeeData> {
        let first_name = input.first_name.trim().to_string();
        let last_name = input.last_name.trim().to_string();
        let position = input.position.trim().to_string();
        let employment_status = input.employment_status.trim().to_string();
        validate_required_text(&first_name, "first_name", MAX_NAME_LEN)?;
        validate_required_text(&last_name, "last_name", MAX_NAME_LEN)?;
        validate_required_text(&position, "position", MAX_SHORT_TEXT_LEN)?;
        validate_required_text(&employment_status, "employment_status", MAX_SHORT_TEXT_LEN)?;

        let date_of_hire = parse_iso_date("date_of_hire", &input.date_of_hire)?;
        let date_of_birth = parse_optional_iso_date("date_of_birth", input.date_of_birth.as_deref())?;
        if input.base_salary < Decimal::ZERO {
            return Err(AppError::validation("base_salary must not be negative").with_detail("field", "base_salary"));
        }

        let gender = clean_optional(input.gender)
            .map(|g| g.parse::<Gender>())
            .transpose()?;

        let phone = clean_optional(input.phone);
        let phone_e164 = match &phone {
            Some(phone) => {
                validate_phone(phone)?;
                // the E.164 twin is optional; short local numbers keep only the raw form
                normalize_phone(phone, DEFAULT_COUNTRY_CODE)
                    .inspect_err(|e| tracing::debug!(error = %e, "Phone kept without E.164 form"))
                    .ok()
            }
            None => None,
        };

        let email = clean_optional(input.email);
        if let Some(email) = &email {
            validate_email(email)?;
        }

        let other_name = clean_optional(input.other_name);
        let national_id = clean_optional(input.national_id);
        let address = clean_optional(input.address);
        let contract_url = clean_optional(input.contract_url);
        validate_optional_text(&other_name, "other_name", MAX_NAME_LEN)?;
        validate_optional_text(&national_id, "national_id", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&address, "address", MAX_ADDRESS_LEN)?;
        validate_optional_text(&contract_url, "contract_url", MAX_URL_LEN)?;

        if let Some(department_id) = input.department_id
            && self.store.find_department(department_id).await?.is_none()
        {
            return Err(AppError::not_found(format!("department {department_id}")));
        }

        Ok(EmployeeData {
            first_name,
            last_name,
            other_name,
            gender,
            date_of_birth,
            phone,
            phone_e164,
            email,
            national_id,
            address,
            department_id: input.department_id,
            contract_url,
            position,
            employment_status,
            date_of_hire,
            base_salary: input.base_salary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::test_support::claims;
    use rust_decimal_macros::dec;
    use shared::models::PageRequest;

    fn input() -> EmployeeInput {
        EmployeeInput {
            first_name: " Neema ".into(),
            last_name: "Said".into(),
            gender: Some("female".into()),
            phone: Some("0712 345 678".into()),
            email: Some("neema@example.org".into()),
            position: "Accountant".into(),
            employment_status: "active".into(),
            date_of_hire: "2024-03-01".into(),
            base_salary: dec!(1500000),
            ..Default::default()
        }
    }

    fn service(dir: &std::path::Path) -> EmployeeService {
        EmployeeService::new(Arc::new(MemoryStore::new()), FileStore::new(dir))
    }

    #[tokio::test]
    async fn test_create_normalizes_fields() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let employee = svc.create(&claims(1, "hr_officer"), input()).await.unwrap();
        assert_eq!(employee.first_name, "Neema");
        assert_eq!(employee.gender, Some(Gender::Female));
        assert_eq!(employee.phone_e164.as_deref(), Some("+255712345678"));
        assert_eq!(employee.phone.as_deref(), Some("0712 345 678"));
    }

    #[tokio::test]
    async fn test_short_phone_is_kept_without_e164() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let hr = claims(1, "hr_officer");
        for raw in ["555-1234", "1234567"] {
            let employee = svc
                .create(&hr, EmployeeInput { phone: Some(raw.into()), ..input() })
                .await
                .unwrap();
            assert_eq!(employee.phone.as_deref(), Some(raw));
            assert_eq!(employee.phone_e164, None);
        }

        let employee = svc
            .create(&hr, EmployeeInput { phone: Some("+1 234 5678".into()), ..input() })
            .await
            .unwrap();
        assert_eq!(employee.phone_e164.as_deref(), Some("+12345678"));
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let hr = claims(1, "hr_officer");

        let cases = [
            EmployeeInput { first_name: "  ".into(), ..input() },
            EmployeeInput { email: Some("not-an-email".into()), ..input() },
            EmployeeInput { phone: Some("12ab".into()), ..input() },
            EmployeeInput { date_of_hire: "01/03/2024".into(), ..input() },
            EmployeeInput { gender: Some("other".into()), ..input() },
            EmployeeInput { base_salary: dec!(-1), ..input() },
        ];
        for case in cases {
            let err = svc.create(&hr, case).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationFailed);
        }

        let err = svc
            .create(&hr, EmployeeInput { department_id: Some(42), ..input() })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_readers_and_writers() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let err = svc.create(&claims(2, "viewer"), input()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        svc.create(&claims(1, "hr_officer"), input()).await.unwrap();
        let page = svc
            .list(
                &claims(3, "finance_officer"),
                EmployeeQuery {
                    q: Some("neema".into()),
                    page: PageRequest::new(1, 10),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(
            svc.list(&claims(4, "staff"), EmployeeQuery::default()).await.unwrap_err().code,
            ErrorCode::Forbidden
        );
    }

    #[tokio::test]
    async fn test_contract_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let hr = claims(1, "hr_officer");
        let employee = svc.create(&hr, input()).await.unwrap();

        let err = svc
            .upload_contract(&hr, employee.id, "contract.exe", b"MZ")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedFileFormat);
        let err = svc
            .upload_contract(&hr, employee.id, "contract.pdf", b"")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyFile);

        let updated = svc
            .upload_contract(&hr, employee.id, "Contract.PDF", b"%PDF-1.7")
            .await
            .unwrap();
        let path = updated.contract_file_path.clone().unwrap();
        assert!(path.starts_with(&format!("employees/{}/contract/", employee.id)));
        assert!(path.ends_with(".pdf"));

        let file = svc.read_contract(&claims(2, "viewer"), employee.id).await.unwrap();
        assert_eq!(file.bytes, b"%PDF-1.7");
        assert_eq!(file.mime_type, "application/pdf");

        // file vanished underneath; removal still clears the path
        std::fs::remove_file(dir.path().join(&path)).unwrap();
        let cleared = svc.remove_contract(&hr, employee.id).await.unwrap();
        assert!(cleared.contract_file_path.is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_contract_file() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let hr = claims(1, "hr_officer");
        let employee = svc.create(&hr, input()).await.unwrap();
        let path = svc
            .upload_contract(&hr, employee.id, "c.docx", b"doc")
            .await
            .unwrap()
            .contract_file_path
            .unwrap();

        svc.delete(&hr, employee.id).await.unwrap();
        assert!(!dir.path().join(&path).exists());
        assert_eq!(
            svc.get(&hr, employee.id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_delete_blocked_by_payroll_entries() {
        use crate::db::PayrollStore;
        use shared::models::PayAmounts;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let svc = EmployeeService::new(store.clone(), FileStore::new(dir.path()));
        let hr = claims(1, "hr_officer");
        let employee = svc.create(&hr, input()).await.unwrap();

        let batch = store.create_payroll_batch("2026-02", Some(1)).await.unwrap();
        let mut tx = store.begin_payroll_tx().await.unwrap();
        tx.create_entry(batch.id, employee.id, &PayAmounts::base_only(employee.base_salary))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let err = svc.delete(&hr, employee.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(svc.get(&hr, employee.id).await.is_ok());
    }
}
