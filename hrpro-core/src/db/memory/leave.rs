use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use shared::models::{
    EntitlementInput, LeaveEntitlement, LeaveLockedDate, LeaveRequest, LeaveRequestFilter,
    LeaveStatus, LeaveStatusChange, LeaveType, LeaveTypeInput, NewLeaveRequest,
};

use super::MemoryStore;
use crate::db::{LeaveStore, RepoError, RepoResult};

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn list_leave_types(&self, include_inactive: bool) -> RepoResult<Vec<LeaveType>> {
        let mut rows: Vec<LeaveType> = self
            .tables
            .lock()
            .leave_types
            .values()
            .filter(|t| include_inactive || t.active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(rows)
    }

    async fn find_leave_type(&self, id: i64) -> RepoResult<Option<LeaveType>> {
        Ok(self.tables.lock().leave_types.get(&id).cloned())
    }

    async fn default_leave_type(&self) -> RepoResult<Option<LeaveType>> {
        Ok(self
            .tables
            .lock()
            .leave_types
            .values()
            .find(|t| t.active)
            .cloned())
    }

    async fn create_leave_type(&self, input: &LeaveTypeInput) -> RepoResult<LeaveType> {
        let mut tables = self.tables.lock();
        let now = Utc::now();
        let leave_type = LeaveType {
            id: tables.next_id("leave_types"),
            name: input.name.clone(),
            paid: input.paid,
            counts_toward_entitlement: input.counts_toward_entitlement,
            requires_attachment: input.requires_attachment,
            requires_approval: input.requires_approval,
            active: input.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        tables.leave_types.insert(leave_type.id, leave_type.clone());
        Ok(leave_type)
    }

    async fn update_leave_type(&self, id: i64, input: &LeaveTypeInput) -> RepoResult<LeaveType> {
        let mut tables = self.tables.lock();
        let leave_type = tables
            .leave_types
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("leave type {id}")))?;
        leave_type.name = input.name.clone();
        leave_type.paid = input.paid;
        leave_type.counts_toward_entitlement = input.counts_toward_entitlement;
        leave_type.requires_attachment = input.requires_attachment;
        leave_type.requires_approval = input.requires_approval;
        if let Some(active) = input.active {
            leave_type.active = active;
        }
        leave_type.updated_at = Utc::now();
        Ok(leave_type.clone())
    }

    async fn set_leave_type_active(&self, id: i64, active: bool) -> RepoResult<LeaveType> {
        let mut tables = self.tables.lock();
        let leave_type = tables
            .leave_types
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("leave type {id}")))?;
        leave_type.active = active;
        leave_type.updated_at = Utc::now();
        Ok(leave_type.clone())
    }

    async fn list_locked_dates(&self, year: i32) -> RepoResult<Vec<LeaveLockedDate>> {
        Ok(self
            .tables
            .lock()
            .locked_dates
            .values()
            .filter(|d| d.locked_date.year() == year)
            .cloned()
            .collect())
    }

    async fn upsert_locked_date(
        &self,
        date: NaiveDate,
        reason: Option<&str>,
        created_by: Option<i64>,
    ) -> RepoResult<LeaveLockedDate> {
        let mut tables = self.tables.lock();
        if let Some(existing) = tables.locked_dates.get_mut(&date) {
            existing.reason = reason.map(str::to_string);
            return Ok(existing.clone());
        }
        let locked = LeaveLockedDate {
            id: tables.next_id("leave_locked_dates"),
            locked_date: date,
            reason: reason.map(str::to_string),
            created_by,
            created_at: Utc::now(),
        };
        tables.locked_dates.insert(date, locked.clone());
        Ok(locked)
    }

    async fn delete_locked_date(&self, date: NaiveDate) -> RepoResult<bool> {
        Ok(self.tables.lock().locked_dates.remove(&date).is_some())
    }

    async fn locked_dates_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<NaiveDate>> {
        Ok(self
            .tables
            .lock()
            .locked_dates
            .range(start..=end)
            .map(|(date, _)| *date)
            .collect())
    }

    async fn find_entitlement(
        &self,
        employee_id: i64,
        year: i32,
    ) -> RepoResult<Option<LeaveEntitlement>> {
        Ok(self
            .tables
            .lock()
            .entitlements
            .get(&(employee_id, year))
            .cloned())
    }

    async fn upsert_entitlement(&self, input: &EntitlementInput) -> RepoResult<LeaveEntitlement> {
        if input.total_days < 0 || input.reserved_days < 0 || input.reserved_days > input.total_days {
            return Err(RepoError::Validation(
                "entitlement requires 0 <= reserved <= total".to_string(),
            ));
        }
        let mut tables = self.tables.lock();
        if !tables.employees.contains_key(&input.employee_id) {
            return Err(RepoError::Validation(format!(
                "employee {} does not exist",
                input.employee_id
            )));
        }
        let now = Utc::now();
        let key = (input.employee_id, input.year);
        if let Some(existing) = tables.entitlements.get_mut(&key) {
            existing.total_days = input.total_days;
            existing.reserved_days = input.reserved_days;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let entitlement = LeaveEntitlement {
            id: tables.next_id("leave_entitlements"),
            employee_id: input.employee_id,
            year: input.year,
            total_days: input.total_days,
            reserved_days: input.reserved_days,
            created_at: now,
            updated_at: now,
        };
        tables.entitlements.insert(key, entitlement.clone());
        Ok(entitlement)
    }

    async fn sum_leave_days(
        &self,
        employee_id: i64,
        year: i32,
        status: LeaveStatus,
    ) -> RepoResult<i32> {
        let tables = self.tables.lock();
        Ok(tables
            .leave_requests
            .values()
            .filter(|r| {
                r.employee_id == employee_id
                    && r.status == status
                    && r.start_date.year() == year
                    && tables
                        .leave_types
                        .get(&r.leave_type_id)
                        .is_some_and(|t| t.counts_toward_entitlement)
            })
            .map(|r| r.working_days)
            .sum())
    }

    async fn find_overlapping_approved(
        &self,
        employee_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<i64>,
    ) -> RepoResult<Vec<LeaveRequest>> {
        let tables = self.tables.lock();
        let mut rows: Vec<LeaveRequest> = tables
            .leave_requests
            .values()
            .filter(|r| {
                r.employee_id == employee_id
                    && r.status == LeaveStatus::Approved
                    && Some(r.id) != exclude_id
                    && r.overlaps(start, end)
            })
            .map(|r| tables.joined_request(r))
            .collect();
        rows.sort_by_key(|r| r.start_date);
        Ok(rows)
    }

    async fn create_leave_request(&self, request: &NewLeaveRequest) -> RepoResult<LeaveRequest> {
        if request.end_date < request.start_date || request.working_days <= 0 {
            return Err(RepoError::Validation(
                "leave request range must contain working days".to_string(),
            ));
        }
        let mut tables = self.tables.lock();
        if !tables.employees.contains_key(&request.employee_id) {
            return Err(RepoError::Validation(format!(
                "employee {} does not exist",
                request.employee_id
            )));
        }
        if !tables.leave_types.contains_key(&request.leave_type_id) {
            return Err(RepoError::Validation(format!(
                "leave type {} does not exist",
                request.leave_type_id
            )));
        }
        let now = Utc::now();
        let row = LeaveRequest {
            id: tables.next_id("leave_requests"),
            employee_id: request.employee_id,
            leave_type_id: request.leave_type_id,
            start_date: request.start_date,
            end_date: request.end_date,
            working_days: request.working_days,
            status: LeaveStatus::Pending,
            reason: request.reason.clone(),
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
            employee_name: None,
            leave_type_name: None,
        };
        tables.leave_requests.insert(row.id, row.clone());
        Ok(tables.joined_request(&row))
    }

    async fn find_leave_request(&self, id: i64) -> RepoResult<Option<LeaveRequest>> {
        let tables = self.tables.lock();
        Ok(tables
            .leave_requests
            .get(&id)
            .map(|r| tables.joined_request(r)))
    }

    async fn update_leave_status(
        &self,
        id: i64,
        change: &LeaveStatusChange,
    ) -> RepoResult<LeaveRequest> {
        let mut tables = self.tables.lock();
        let request = tables
            .leave_requests
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("leave request {id}")))?;
        request.status = change.status;
        request.approved_by = change.approved_by;
        request.approved_at = change.approved_at;
        if change.reason.is_some() {
            request.reason = change.reason.clone();
        }
        request.updated_at = Utc::now();
        let request = request.clone();
        Ok(tables.joined_request(&request))
    }

    async fn list_leave_requests(
        &self,
        filter: &LeaveRequestFilter,
    ) -> RepoResult<Vec<LeaveRequest>> {
        let tables = self.tables.lock();
        let mut rows: Vec<LeaveRequest> = tables
            .leave_requests
            .values()
            .filter(|r| {
                filter.employee_id.is_none_or(|id| r.employee_id == id)
                    && filter.status.is_none_or(|s| r.status == s)
                    && filter.year.is_none_or(|y| r.start_date.year() == y)
            })
            .map(|r| tables.joined_request(r))
            .collect();
        rows.sort_by(|a, b| (b.start_date, b.id).cmp(&(a.start_date, a.id)));
        Ok(rows)
    }
}
