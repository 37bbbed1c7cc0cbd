use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::models::{
    AttendanceDayRow, AttendanceRecord, AttendanceStatus, AttendanceWrite, LunchDaily,
    UNMARKED_STATUS,
};

use super::MemoryStore;
use crate::db::{AttendanceStore, RepoError, RepoResult};

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn list_attendance_for_day(
        &self,
        date: NaiveDate,
        employee_id: Option<i64>,
    ) -> RepoResult<Vec<AttendanceDayRow>> {
        let tables = self.tables.lock();
        let mut rows: Vec<AttendanceDayRow> = tables
            .employees
            .values()
            .filter(|e| employee_id.is_none_or(|id| e.id == id))
            .map(|e| {
                let record = tables.attendance.get(&(date, e.id));
                AttendanceDayRow {
                    employee_id: e.id,
                    first_name: e.first_name.clone(),
                    last_name: e.last_name.clone(),
                    department_name: tables.department_name(e.department_id),
                    attendance_id: record.map(|r| r.id),
                    status: record
                        .map(|r| r.status.as_str())
                        .unwrap_or(UNMARKED_STATUS)
                        .to_string(),
                    is_locked: record.is_some_and(|r| r.is_locked),
                    lock_reason: record.and_then(|r| r.lock_reason.clone()),
                    marked_by: record.and_then(|r| r.marked_by),
                    marked_at: record.map(|r| r.marked_at),
                    can_edit: false,
                    can_post_to_leave: false,
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            (&a.first_name, &a.last_name, a.employee_id)
                .cmp(&(&b.first_name, &b.last_name, b.employee_id))
        });
        Ok(rows)
    }

    async fn find_attendance(
        &self,
        date: NaiveDate,
        employee_id: i64,
    ) -> RepoResult<Option<AttendanceRecord>> {
        Ok(self.tables.lock().attendance.get(&(date, employee_id)).cloned())
    }

    async fn insert_attendance(
        &self,
        write: &AttendanceWrite,
        at: DateTime<Utc>,
    ) -> RepoResult<AttendanceRecord> {
        let mut tables = self.tables.lock();
        let key = (write.attendance_date, write.employee_id);
        if tables.attendance.contains_key(&key) {
            return Err(RepoError::Duplicate("attendance_date, employee_id".to_string()));
        }
        if !tables.employees.contains_key(&write.employee_id) {
            return Err(RepoError::Validation(format!(
                "employee {} does not exist",
                write.employee_id
            )));
        }
        let record = AttendanceRecord {
            id: tables.next_id("attendance_records"),
            attendance_date: write.attendance_date,
            employee_id: write.employee_id,
            status: write.status,
            marked_by: write.marked_by,
            marked_at: at,
            is_locked: true,
            lock_reason: write.lock_reason.clone(),
            created_at: at,
            updated_at: at,
        };
        tables.attendance.insert(key, record.clone());
        Ok(record)
    }

    async fn update_attendance(
        &self,
        write: &AttendanceWrite,
        at: DateTime<Utc>,
    ) -> RepoResult<AttendanceRecord> {
        let mut tables = self.tables.lock();
        let record = tables
            .attendance
            .get_mut(&(write.attendance_date, write.employee_id))
            .ok_or_else(|| {
                RepoError::NotFound(format!(
                    "attendance {} / employee {}",
                    write.attendance_date, write.employee_id
                ))
            })?;
        record.status = write.status;
        record.marked_by = write.marked_by;
        record.marked_at = at;
        record.is_locked = true;
        if write.lock_reason.is_some() {
            record.lock_reason = write.lock_reason.clone();
        }
        record.updated_at = at;
        Ok(record.clone())
    }

    async fn list_attendance_range(
        &self,
        employee_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        // keys sort by date first
        Ok(self
            .tables
            .lock()
            .attendance
            .range((start, i64::MIN)..=(end, i64::MAX))
            .map(|(_, r)| r)
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn count_attendance_with_status(
        &self,
        date: NaiveDate,
        statuses: &[AttendanceStatus],
    ) -> RepoResult<i64> {
        Ok(self
            .tables
            .lock()
            .attendance
            .range((date, i64::MIN)..=(date, i64::MAX))
            .filter(|(_, r)| statuses.contains(&r.status))
            .count() as i64)
    }

    async fn find_lunch(&self, date: NaiveDate) -> RepoResult<Option<LunchDaily>> {
        Ok(self.tables.lock().lunch.get(&date).cloned())
    }

    async fn upsert_lunch(&self, lunch: &LunchDaily) -> RepoResult<LunchDaily> {
        if lunch.visitors_count < 0 || lunch.plate_cost_amount <= 0 || lunch.staff_contribution_amount < 0
        {
            return Err(RepoError::Validation("lunch amounts out of range".to_string()));
        }
        self.tables
            .lock()
            .lunch
            .insert(lunch.attendance_date, lunch.clone());
        Ok(lunch.clone())
    }
}
