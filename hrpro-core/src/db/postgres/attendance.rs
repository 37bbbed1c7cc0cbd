//! Attendance records and daily lunch

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::models::{AttendanceDayRow, AttendanceRecord, AttendanceStatus, AttendanceWrite, LunchDaily};

use super::PgStore;
use crate::db::{AttendanceStore, RepoError, RepoResult};

const RECORD_COLUMNS: &str = "id, attendance_date, employee_id, status, marked_by, marked_at, \
     is_locked, lock_reason, created_at, updated_at";

const LUNCH_COLUMNS: &str = "attendance_date, visitors_count, plate_cost_amount, \
     staff_contribution_amount, updated_by, updated_at";

#[async_trait]
impl AttendanceStore for PgStore {
    async fn list_attendance_for_day(
        &self,
        date: NaiveDate,
        employee_id: Option<i64>,
    ) -> RepoResult<Vec<AttendanceDayRow>> {
        let rows = sqlx::query_as::<_, AttendanceDayRow>(
            "SELECT e.id AS employee_id, e.first_name, e.last_name, d.name AS department_name, \
               a.id AS attendance_id, COALESCE(a.status, 'unmarked') AS status, \
               COALESCE(a.is_locked, FALSE) AS is_locked, a.lock_reason, a.marked_by, a.marked_at \
             FROM employees e \
             LEFT JOIN departments d ON d.id = e.department_id \
             LEFT JOIN attendance_records a ON a.employee_id = e.id AND a.attendance_date = $1 \
             WHERE ($2::BIGINT IS NULL OR e.id = $2) \
             ORDER BY e.first_name ASC, e.last_name ASC, e.id ASC",
        )
        .bind(date)
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_attendance(
        &self,
        date: NaiveDate,
        employee_id: i64,
    ) -> RepoResult<Option<AttendanceRecord>> {
        let row = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records \
             WHERE attendance_date = $1 AND employee_id = $2"
        ))
        .bind(date)
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_attendance(
        &self,
        write: &AttendanceWrite,
        at: DateTime<Utc>,
    ) -> RepoResult<AttendanceRecord> {
        let row = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "INSERT INTO attendance_records \
               (attendance_date, employee_id, status, marked_by, marked_at, is_locked, lock_reason) \
             VALUES ($1, $2, $3, $4, $5, TRUE, $6) RETURNING {RECORD_COLUMNS}"
        ))
        .bind(write.attendance_date)
        .bind(write.employee_id)
        .bind(write.status)
        .bind(write.marked_by)
        .bind(at)
        .bind(write.lock_reason.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_attendance(
        &self,
        write: &AttendanceWrite,
        at: DateTime<Utc>,
    ) -> RepoResult<AttendanceRecord> {
        sqlx::query_as::<_, AttendanceRecord>(&format!(
            "UPDATE attendance_records SET status = $3, marked_by = $4, marked_at = $5, \
               is_locked = TRUE, lock_reason = COALESCE($6, lock_reason), updated_at = $5 \
             WHERE attendance_date = $1 AND employee_id = $2 RETURNING {RECORD_COLUMNS}"
        ))
        .bind(write.attendance_date)
        .bind(write.employee_id)
        .bind(write.status)
        .bind(write.marked_by)
        .bind(at)
        .bind(write.lock_reason.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            RepoError::NotFound(format!(
                "attendance {} / employee {}",
                write.attendance_date, write.employee_id
            ))
        })
    }

    async fn list_attendance_range(
        &self,
        employee_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records \
             WHERE employee_id = $1 AND attendance_date BETWEEN $2 AND $3 \
             ORDER BY attendance_date ASC"
        ))
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_attendance_with_status(
        &self,
        date: NaiveDate,
        statuses: &[AttendanceStatus],
    ) -> RepoResult<i64> {
        let statuses: Vec<&'static str> = statuses.iter().map(|s| s.as_str()).collect();
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM attendance_records \
             WHERE attendance_date = $1 AND status = ANY($2)",
        )
        .bind(date)
        .bind(statuses)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn find_lunch(&self, date: NaiveDate) -> RepoResult<Option<LunchDaily>> {
        let row = sqlx::query_as::<_, LunchDaily>(&format!(
            "SELECT {LUNCH_COLUMNS} FROM lunch_daily WHERE attendance_date = $1"
        ))
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_lunch(&self, lunch: &LunchDaily) -> RepoResult<LunchDaily> {
        let row = sqlx::query_as::<_, LunchDaily>(&format!(
            "INSERT INTO lunch_daily (attendance_date, visitors_count, plate_cost_amount, \
               staff_contribution_amount, updated_by, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (attendance_date) DO UPDATE SET \
               visitors_count = EXCLUDED.visitors_count, \
               plate_cost_amount = EXCLUDED.plate_cost_amount, \
               staff_contribution_amount = EXCLUDED.staff_contribution_amount, \
               updated_by = EXCLUDED.updated_by, \
               updated_at = EXCLUDED.updated_at \
             RETURNING {LUNCH_COLUMNS}"
        ))
        .bind(lunch.attendance_date)
        .bind(lunch.visitors_count)
        .bind(lunch.plate_cost_amount)
        .bind(lunch.staff_contribution_amount)
        .bind(lunch.updated_by)
        .bind(lunch.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
