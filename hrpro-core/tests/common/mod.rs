//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use hrpro_core::db::{EmployeeStore, MemoryStore, Store};
use hrpro_core::{AppState, Claims, StateOptions};
use rust_decimal::Decimal;
use shared::models::{Employee, EmployeeData};
use tempfile::TempDir;

pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    // keeps the file-store root alive
    _files: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let files = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn Store> = store.clone();
        let state = AppState::new(
            dyn_store,
            StateOptions {
                jwt_secret: JWT_SECRET.to_string(),
                access_token_ttl_minutes: 15,
                refresh_token_ttl_hours: 24,
                bcrypt_cost: 4,
                data_dir: files.path().to_path_buf(),
                operation_timeout: Duration::from_secs(5),
            },
        );
        Self {
            store,
            state,
            _files: files,
        }
    }

    /// Create employees `1..=n`, all active
    pub async fn seed_employees(&self, n: usize) -> Vec<Employee> {
        let mut out = Vec::with_capacity(n);
        for i in 1..=n {
            let employee = self
                .store
                .create_employee(&employee_data(&format!("Staff{i}"), "Member", Decimal::new(150_000_000, 2)))
                .await
                .unwrap();
            out.push(employee);
        }
        out
    }
}

pub fn claims(user_id: i64, role: &str) -> Claims {
    Claims::for_user(user_id, &format!("user{user_id}"), role)
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

pub fn employee_data(first: &str, last: &str, base_salary: Decimal) -> EmployeeData {
    EmployeeData {
        first_name: first.to_string(),
        last_name: last.to_string(),
        other_name: None,
        gender: None,
        date_of_birth: None,
        phone: None,
        phone_e164: None,
        email: None,
        national_id: None,
        address: None,
        department_id: None,
        contract_url: None,
        position: "Officer".to_string(),
        employment_status: "active".to_string(),
        date_of_hire: date("2024-01-15"),
        base_salary,
    }
}
