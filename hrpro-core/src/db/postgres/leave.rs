//! Leave types, locked dates, entitlements and requests

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::{
    EntitlementInput, LeaveEntitlement, LeaveLockedDate, LeaveRequest, LeaveRequestFilter,
    LeaveStatus, LeaveStatusChange, LeaveType, LeaveTypeInput, NewLeaveRequest,
};
use sqlx::{Postgres, QueryBuilder};

use super::PgStore;
use crate::db::{LeaveStore, RepoError, RepoResult};

const TYPE_COLUMNS: &str = "id, name, paid, counts_toward_entitlement, requires_attachment, \
     requires_approval, active, created_at, updated_at";

const LOCKED_COLUMNS: &str = "id, locked_date, reason, created_by, created_at";

const ENTITLEMENT_COLUMNS: &str =
    "id, employee_id, year, total_days, reserved_days, created_at, updated_at";

const REQUEST_SELECT: &str = "SELECT r.id, r.employee_id, r.leave_type_id, r.start_date, \
     r.end_date, r.working_days, r.status, r.reason, r.approved_by, r.approved_at, \
     r.created_at, r.updated_at, \
     (e.first_name || ' ' || e.last_name) AS employee_name, t.name AS leave_type_name \
     FROM leave_requests r \
     LEFT JOIN employees e ON e.id = r.employee_id \
     LEFT JOIN leave_types t ON t.id = r.leave_type_id";

#[async_trait]
impl LeaveStore for PgStore {
    async fn list_leave_types(&self, include_inactive: bool) -> RepoResult<Vec<LeaveType>> {
        let rows = sqlx::query_as::<_, LeaveType>(&format!(
            "SELECT {TYPE_COLUMNS} FROM leave_types WHERE ($1 OR active) ORDER BY name, id"
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_leave_type(&self, id: i64) -> RepoResult<Option<LeaveType>> {
        let row = sqlx::query_as::<_, LeaveType>(&format!(
            "SELECT {TYPE_COLUMNS} FROM leave_types WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn default_leave_type(&self) -> RepoResult<Option<LeaveType>> {
        let row = sqlx::query_as::<_, LeaveType>(&format!(
            "SELECT {TYPE_COLUMNS} FROM leave_types WHERE active ORDER BY id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_leave_type(&self, input: &LeaveTypeInput) -> RepoResult<LeaveType> {
        let row = sqlx::query_as::<_, LeaveType>(&format!(
            "INSERT INTO leave_types (name, paid, counts_toward_entitlement, requires_attachment, \
               requires_approval, active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {TYPE_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(input.paid)
        .bind(input.counts_toward_entitlement)
        .bind(input.requires_attachment)
        .bind(input.requires_approval)
        .bind(input.active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_leave_type(&self, id: i64, input: &LeaveTypeInput) -> RepoResult<LeaveType> {
        sqlx::query_as::<_, LeaveType>(&format!(
            "UPDATE leave_types SET name = $2, paid = $3, counts_toward_entitlement = $4, \
               requires_attachment = $5, requires_approval = $6, active = COALESCE($7, active), \
               updated_at = now() \
             WHERE id = $1 RETURNING {TYPE_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(input.paid)
        .bind(input.counts_toward_entitlement)
        .bind(input.requires_attachment)
        .bind(input.requires_approval)
        .bind(input.active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("leave type {id}")))
    }

    async fn set_leave_type_active(&self, id: i64, active: bool) -> RepoResult<LeaveType> {
        sqlx::query_as::<_, LeaveType>(&format!(
            "UPDATE leave_types SET active = $2, updated_at = now() \
             WHERE id = $1 RETURNING {TYPE_COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("leave type {id}")))
    }

    async fn list_locked_dates(&self, year: i32) -> RepoResult<Vec<LeaveLockedDate>> {
        let rows = sqlx::query_as::<_, LeaveLockedDate>(&format!(
            "SELECT {LOCKED_COLUMNS} FROM leave_locked_dates \
             WHERE EXTRACT(YEAR FROM locked_date)::INT = $1 ORDER BY locked_date"
        ))
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn upsert_locked_date(
        &self,
        date: NaiveDate,
        reason: Option<&str>,
        created_by: Option<i64>,
    ) -> RepoResult<LeaveLockedDate> {
        let row = sqlx::query_as::<_, LeaveLockedDate>(&format!(
            "INSERT INTO leave_locked_dates (locked_date, reason, created_by) VALUES ($1, $2, $3) \
             ON CONFLICT (locked_date) DO UPDATE SET reason = EXCLUDED.reason \
             RETURNING {LOCKED_COLUMNS}"
        ))
        .bind(date)
        .bind(reason)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_locked_date(&self, date: NaiveDate) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM leave_locked_dates WHERE locked_date = $1")
            .bind(date)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn locked_dates_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<NaiveDate>> {
        let dates: Vec<NaiveDate> = sqlx::query_scalar(
            "SELECT locked_date FROM leave_locked_dates \
             WHERE locked_date BETWEEN $1 AND $2 ORDER BY locked_date",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(dates)
    }

    async fn find_entitlement(
        &self,
        employee_id: i64,
        year: i32,
    ) -> RepoResult<Option<LeaveEntitlement>> {
        let row = sqlx::query_as::<_, LeaveEntitlement>(&format!(
            "SELECT {ENTITLEMENT_COLUMNS} FROM leave_entitlements \
             WHERE employee_id = $1 AND year = $2"
        ))
        .bind(employee_id)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_entitlement(&self, input: &EntitlementInput) -> RepoResult<LeaveEntitlement> {
        let row = sqlx::query_as::<_, LeaveEntitlement>(&format!(
            "INSERT INTO leave_entitlements (employee_id, year, total_days, reserved_days) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (employee_id, year) DO UPDATE SET \
               total_days = EXCLUDED.total_days, \
               reserved_days = EXCLUDED.reserved_days, \
               updated_at = now() \
             RETURNING {ENTITLEMENT_COLUMNS}"
        ))
        .bind(input.employee_id)
        .bind(input.year)
        .bind(input.total_days)
        .bind(input.reserved_days)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn sum_leave_days(
        &self,
        employee_id: i64,
        year: i32,
        status: LeaveStatus,
    ) -> RepoResult<i32> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(r.working_days), 0)::BIGINT FROM leave_requests r \
             JOIN leave_types t ON t.id = r.leave_type_id \
             WHERE r.employee_id = $1 AND r.status = $2 AND t.counts_toward_entitlement \
               AND EXTRACT(YEAR FROM r.start_date)::INT = $3",
        )
        .bind(employee_id)
        .bind(status)
        .bind(year)
        .fetch_one(&self.pool)
        .await?;
        i32::try_from(total).map_err(|_| RepoError::Database(format!("leave day sum overflow: {total}")))
    }

    async fn find_overlapping_approved(
        &self,
        employee_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<i64>,
    ) -> RepoResult<Vec<LeaveRequest>> {
        let rows = sqlx::query_as::<_, LeaveRequest>(&format!(
            "{REQUEST_SELECT} WHERE r.employee_id = $1 AND r.status = 'Approved' \
               AND r.start_date <= $3 AND r.end_date >= $2 \
               AND ($4::BIGINT IS NULL OR r.id <> $4) \
             ORDER BY r.start_date"
        ))
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .bind(exclude_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_leave_request(&self, request: &NewLeaveRequest) -> RepoResult<LeaveRequest> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO leave_requests (employee_id, leave_type_id, start_date, end_date, \
               working_days, status, reason) \
             VALUES ($1, $2, $3, $4, $5, 'Pending', $6) RETURNING id",
        )
        .bind(request.employee_id)
        .bind(request.leave_type_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.working_days)
        .bind(request.reason.as_deref())
        .fetch_one(&self.pool)
        .await?;
        self.find_leave_request(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("leave request {id}")))
    }

    async fn find_leave_request(&self, id: i64) -> RepoResult<Option<LeaveRequest>> {
        let row = sqlx::query_as::<_, LeaveRequest>(&format!("{REQUEST_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_leave_status(
        &self,
        id: i64,
        change: &LeaveStatusChange,
    ) -> RepoResult<LeaveRequest> {
        let result = sqlx::query(
            "UPDATE leave_requests SET status = $2, approved_by = $3, approved_at = $4, \
               reason = COALESCE($5, reason), updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(change.status)
        .bind(change.approved_by)
        .bind(change.approved_at)
        .bind(change.reason.as_deref())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("leave request {id}")));
        }
        self.find_leave_request(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("leave request {id}")))
    }

    async fn list_leave_requests(
        &self,
        filter: &LeaveRequestFilter,
    ) -> RepoResult<Vec<LeaveRequest>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("{REQUEST_SELECT} WHERE TRUE"));
        if let Some(employee_id) = filter.employee_id {
            qb.push(" AND r.employee_id = ").push_bind(employee_id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND r.status = ").push_bind(status);
        }
        if let Some(year) = filter.year {
            qb.push(" AND EXTRACT(YEAR FROM r.start_date)::INT = ").push_bind(year);
        }
        qb.push(" ORDER BY r.start_date DESC, r.id DESC");
        let rows = qb.build_query_as::<LeaveRequest>().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}
