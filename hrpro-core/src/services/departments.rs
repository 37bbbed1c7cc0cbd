use std::sync::Arc;

use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Department, DepartmentInput, DepartmentQuery, PaginatedResponse};
use shared::util::clean_optional;

use super::roles;
use crate::audit::{AuditEvent, AuditRecorder, noop_recorder};
use crate::auth::{Claims, require_role};
use crate::db::{DepartmentStore, RepoError, Store};
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text};

pub struct DepartmentService {
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditRecorder>,
}

impl DepartmentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            audit: noop_recorder(),
        }
    }

    pub fn set_audit_recorder(&mut self, recorder: Arc<dyn AuditRecorder>) {
        self.audit = recorder;
    }

    /// Open to any authenticated caller
    pub async fn list(&self, _claims: &Claims, query: DepartmentQuery) -> AppResult<PaginatedResponse<Department>> {
        let (rows, total) = self
            .store
            .list_departments(query.q.as_deref(), &query.page)
            .await?;
        Ok(PaginatedResponse::from_request(rows, total, &query.page))
    }

    pub async fn get(&self, _claims: &Claims, id: i64) -> AppResult<Department> {
        self.load(id).await
    }

    pub async fn create(&self, claims: &Claims, input: DepartmentInput) -> AppResult<Department> {
        require_role(claims, roles::DEPARTMENT_WRITERS)?;
        let input = self.validate(input, None).await?;
        let department = self
            .store
            .create_department(&input)
            .await
            .map_err(duplicate_name)?;

        tracing::info!(department_id = department.id, name = %department.name, "Department created");
        self.audit
            .record(
                AuditEvent::new("department.create", "department")
                    .actor(claims.user_id)
                    .entity(department.id)
                    .metadata(json!({ "name": department.name })),
            )
            .await;
        Ok(department)
    }

    pub async fn update(&self, claims: &Claims, id: i64, input: DepartmentInput) -> AppResult<Department> {
        require_role(claims, roles::DEPARTMENT_WRITERS)?;
        let before = self.load(id).await?;
        let input = self.validate(input, Some(id)).await?;
        let department = self
            .store
            .update_department(id, &input)
            .await
            .map_err(duplicate_name)?;

        self.audit
            .record(
                AuditEvent::new("department.update", "department")
                    .actor(claims.user_id)
                    .entity(id)
                    .metadata(json!({ "old_name": before.name, "new_name": department.name })),
            )
            .await;
        Ok(department)
    }

    pub async fn delete(&self, claims: &Claims, id: i64) -> AppResult<()> {
        require_role(claims, roles::DEPARTMENT_WRITERS)?;
        let department = self.load(id).await?;
        let employees = self.store.count_department_employees(id).await?;
        if employees > 0 {
            return Err(AppError::new(ErrorCode::DepartmentHasEmployees).with_detail("employees", employees));
        }
        if !self.store.delete_department(id).await? {
            return Err(AppError::not_found(format!("department {id}")));
        }

        tracing::info!(department_id = id, "Department deleted");
        self.audit
            .record(
                AuditEvent::new("department.delete", "department")
                    .actor(claims.user_id)
                    .entity(id)
                    .metadata(json!({ "name": department.name })),
            )
            .await;
        Ok(())
    }

    async fn load(&self, id: i64) -> AppResult<Department> {
        self.store
            .find_department(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("department {id}")))
    }

    async fn validate(&self, input: DepartmentInput, exclude_id: Option<i64>) -> AppResult<DepartmentInput> {
        let name = input.name.trim().to_string();
        validate_required_text(&name, "name", MAX_NAME_LEN)?;
        let description = clean_optional(input.description);
        validate_optional_text(&description, "description", MAX_NOTE_LEN)?;

        if self.store.department_name_exists(&name, exclude_id).await? {
            return Err(AppError::new(ErrorCode::DuplicateName).with_detail("name", name));
        }
        Ok(DepartmentInput { name, description })
    }
}

/// A concurrent insert can still trip the unique index
fn duplicate_name(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(_) => AppError::new(ErrorCode::DuplicateName),
        other => other.into(),
    }
}
