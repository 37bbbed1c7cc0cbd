//! In-process store
//!
//! Keeps every table in plain maps behind one `parking_lot::Mutex` and
//! enforces the same unique keys and derived columns as the Postgres
//! schema. Used by the integration tests and for running the services
//! without a database. Faults can be injected into payroll entry inserts
//! and audit writes.

mod attendance;
mod leave;
mod organization;
mod payroll;
mod records;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use shared::models::{
    AppSetting, AttendanceRecord, AuditLog, Department, Employee, LeaveEntitlement,
    LeaveLockedDate, LeaveRequest, LeaveType, LunchDaily, PayrollBatch, PayrollEntry,
    RefreshToken, User,
};

#[derive(Debug, Default)]
struct Tables {
    sequences: HashMap<&'static str, i64>,
    users: BTreeMap<i64, User>,
    refresh_tokens: BTreeMap<i64, RefreshToken>,
    departments: BTreeMap<i64, Department>,
    employees: BTreeMap<i64, Employee>,
    attendance: BTreeMap<(NaiveDate, i64), AttendanceRecord>,
    lunch: BTreeMap<NaiveDate, LunchDaily>,
    leave_types: BTreeMap<i64, LeaveType>,
    locked_dates: BTreeMap<NaiveDate, LeaveLockedDate>,
    entitlements: BTreeMap<(i64, i32), LeaveEntitlement>,
    leave_requests: BTreeMap<i64, LeaveRequest>,
    payroll_batches: BTreeMap<i64, PayrollBatch>,
    payroll_entries: BTreeMap<i64, PayrollEntry>,
    audit_logs: Vec<AuditLog>,
    settings: BTreeMap<String, AppSetting>,
}

impl Tables {
    /// Per-table BIGSERIAL
    fn next_id(&mut self, table: &'static str) -> i64 {
        let seq = self.sequences.entry(table).or_insert(0);
        *seq += 1;
        *seq
    }

    fn employee_name(&self, employee_id: i64) -> Option<String> {
        self.employees.get(&employee_id).map(Employee::full_name)
    }

    fn department_name(&self, department_id: Option<i64>) -> Option<String> {
        department_id
            .and_then(|id| self.departments.get(&id))
            .map(|d| d.name.clone())
    }

    /// Request with joined employee and type names
    fn joined_request(&self, request: &LeaveRequest) -> LeaveRequest {
        let mut row = request.clone();
        row.employee_name = self.employee_name(request.employee_id);
        row.leave_type_name = self
            .leave_types
            .get(&request.leave_type_id)
            .map(|t| t.name.clone());
        row
    }

    fn joined_entry(&self, entry: &PayrollEntry) -> PayrollEntry {
        let mut row = entry.clone();
        row.employee_name = self.employee_name(entry.employee_id);
        row
    }
}

#[derive(Debug, Default)]
struct Faults {
    /// 1-based entry insert that fails inside each payroll transaction
    payroll_entry_insert_at: Option<usize>,
    audit_insert: bool,
}

/// In-process implementation of every repository trait
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<Mutex<Faults>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `nth` entry insert of every later payroll transaction fail
    pub fn fail_payroll_entry_insert(&self, nth: usize) {
        self.faults.lock().payroll_entry_insert_at = Some(nth);
    }

    /// Make audit inserts fail until turned off
    pub fn fail_audit_inserts(&self, fail: bool) {
        self.faults.lock().audit_insert = fail;
    }

    pub fn clear_faults(&self) {
        *self.faults.lock() = Faults::default();
    }
}

/// Case-insensitive substring match
fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Trimmed non-empty search term
fn term(q: Option<&str>) -> Option<&str> {
    q.map(str::trim).filter(|s| !s.is_empty())
}

fn page<T>(rows: Vec<T>, limit: u64, offset: u64) -> Vec<T> {
    rows.into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}
