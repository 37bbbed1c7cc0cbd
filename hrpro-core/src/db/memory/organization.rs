//! Users, refresh tokens, departments and employees

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{
    Department, DepartmentInput, Employee, EmployeeData, EmployeeQuery, NewUser, PageRequest,
    RefreshToken, User, UserUpdate, is_active_status,
};

use super::{MemoryStore, Tables, contains_ci, page, term};
use crate::db::{
    DepartmentStore, EmployeeStore, RefreshTokenStore, RepoError, RepoResult, UserStore,
};

fn username_taken(tables: &Tables, username: &str, exclude_id: Option<i64>) -> bool {
    let lowered = username.to_lowercase();
    tables
        .users
        .values()
        .any(|u| Some(u.id) != exclude_id && u.username.to_lowercase() == lowered)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.tables.lock().users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let lowered = username.to_lowercase();
        Ok(self
            .tables
            .lock()
            .users
            .values()
            .find(|u| u.username.to_lowercase() == lowered)
            .cloned())
    }

    async fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        let mut tables = self.tables.lock();
        if username_taken(&tables, &user.username, None) {
            return Err(RepoError::Duplicate("username".to_string()));
        }
        let now = Utc::now();
        let created = User {
            id: tables.next_id("users"),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role.clone(),
            is_active: user.is_active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: i64, changes: &UserUpdate) -> RepoResult<User> {
        let mut tables = self.tables.lock();
        if let Some(username) = changes.username.as_deref()
            && username_taken(&tables, username, Some(id))
        {
            return Err(RepoError::Duplicate("username".to_string()));
        }
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("user {id}")))?;
        if let Some(username) = &changes.username {
            user.username = username.clone();
        }
        if let Some(role) = &changes.role {
            user.role = role.clone();
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_user_password(&self, id: i64, password_hash: &str) -> RepoResult<()> {
        let mut tables = self.tables.lock();
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("user {id}")))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> RepoResult<()> {
        if let Some(user) = self.tables.lock().users.get_mut(&id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn list_users(
        &self,
        q: Option<&str>,
        page_req: &PageRequest,
    ) -> RepoResult<(Vec<User>, u64)> {
        let tables = self.tables.lock();
        let mut rows: Vec<User> = tables
            .users
            .values()
            .filter(|u| term(q).is_none_or(|t| contains_ci(&u.username, t)))
            .cloned()
            .collect();
        rows.sort_by_key(|u| u.username.to_lowercase());
        let total = rows.len() as u64;
        Ok((
            page(rows, u64::from(page_req.limit()), page_req.offset()),
            total,
        ))
    }

    async fn count_active_users(&self) -> RepoResult<i64> {
        Ok(self.tables.lock().users.values().filter(|u| u.is_active).count() as i64)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn create_refresh_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<RefreshToken> {
        let mut tables = self.tables.lock();
        let token = RefreshToken {
            id: tables.next_id("refresh_tokens"),
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            revoked_at: None,
            created_at: Utc::now(),
        };
        tables.refresh_tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> RepoResult<Option<RefreshToken>> {
        Ok(self
            .tables
            .lock()
            .refresh_tokens
            .values()
            .rev()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn revoke_refresh_tokens(&self, token_hash: &str, at: DateTime<Utc>) -> RepoResult<u64> {
        let mut revoked = 0;
        for token in self.tables.lock().refresh_tokens.values_mut() {
            if token.token_hash == token_hash && token.revoked_at.is_none() {
                token.revoked_at = Some(at);
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}

fn department_row(tables: &Tables, department: &Department) -> Department {
    let mut row = department.clone();
    row.employee_count = tables
        .employees
        .values()
        .filter(|e| e.department_id == Some(department.id))
        .count() as i64;
    row
}

fn department_name_taken(tables: &Tables, name: &str, exclude_id: Option<i64>) -> bool {
    let lowered = name.trim().to_lowercase();
    tables
        .departments
        .values()
        .any(|d| Some(d.id) != exclude_id && d.name.to_lowercase() == lowered)
}

#[async_trait]
impl DepartmentStore for MemoryStore {
    async fn list_departments(
        &self,
        q: Option<&str>,
        page_req: &PageRequest,
    ) -> RepoResult<(Vec<Department>, u64)> {
        let tables = self.tables.lock();
        let mut rows: Vec<Department> = tables
            .departments
            .values()
            .filter(|d| {
                term(q).is_none_or(|t| {
                    contains_ci(&d.name, t)
                        || d.description.as_deref().is_some_and(|desc| contains_ci(desc, t))
                })
            })
            .map(|d| department_row(&tables, d))
            .collect();
        rows.sort_by_key(|d| d.name.to_lowercase());
        let total = rows.len() as u64;
        Ok((
            page(rows, u64::from(page_req.limit()), page_req.offset()),
            total,
        ))
    }

    async fn find_department(&self, id: i64) -> RepoResult<Option<Department>> {
        let tables = self.tables.lock();
        Ok(tables
            .departments
            .get(&id)
            .map(|d| department_row(&tables, d)))
    }

    async fn department_name_exists(&self, name: &str, exclude_id: Option<i64>) -> RepoResult<bool> {
        Ok(department_name_taken(&self.tables.lock(), name, exclude_id))
    }

    async fn create_department(&self, input: &DepartmentInput) -> RepoResult<Department> {
        let mut tables = self.tables.lock();
        if department_name_taken(&tables, &input.name, None) {
            return Err(RepoError::Duplicate("department name".to_string()));
        }
        let now = Utc::now();
        let department = Department {
            id: tables.next_id("departments"),
            name: input.name.clone(),
            description: input.description.clone(),
            employee_count: 0,
            created_at: now,
            updated_at: now,
        };
        tables.departments.insert(department.id, department.clone());
        Ok(department)
    }

    async fn update_department(&self, id: i64, input: &DepartmentInput) -> RepoResult<Department> {
        let mut tables = self.tables.lock();
        if department_name_taken(&tables, &input.name, Some(id)) {
            return Err(RepoError::Duplicate("department name".to_string()));
        }
        let department = tables
            .departments
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("department {id}")))?;
        department.name = input.name.clone();
        department.description = input.description.clone();
        department.updated_at = Utc::now();
        let department = department.clone();
        Ok(department_row(&tables, &department))
    }

    async fn delete_department(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.lock();
        if tables.employees.values().any(|e| e.department_id == Some(id)) {
            return Err(RepoError::Validation(format!(
                "department {id} is referenced by employees"
            )));
        }
        Ok(tables.departments.remove(&id).is_some())
    }

    async fn count_department_employees(&self, id: i64) -> RepoResult<i64> {
        Ok(self
            .tables
            .lock()
            .employees
            .values()
            .filter(|e| e.department_id == Some(id))
            .count() as i64)
    }
}

fn employee_row(tables: &Tables, employee: &Employee) -> Employee {
    let mut row = employee.clone();
    row.department_name = tables.department_name(employee.department_id);
    row
}

fn apply_employee_data(employee: &mut Employee, data: &EmployeeData) {
    employee.first_name = data.first_name.clone();
    employee.last_name = data.last_name.clone();
    employee.other_name = data.other_name.clone();
    employee.gender = data.gender;
    employee.date_of_birth = data.date_of_birth;
    employee.phone = data.phone.clone();
    employee.phone_e164 = data.phone_e164.clone();
    employee.email = data.email.clone();
    employee.national_id = data.national_id.clone();
    employee.address = data.address.clone();
    employee.department_id = data.department_id;
    employee.contract_url = data.contract_url.clone();
    employee.position = data.position.clone();
    employee.employment_status = data.employment_status.clone();
    employee.date_of_hire = data.date_of_hire;
    employee.base_salary = data.base_salary;
}

fn check_department_ref(tables: &Tables, department_id: Option<i64>) -> RepoResult<()> {
    match department_id {
        Some(id) if !tables.departments.contains_key(&id) => Err(RepoError::Validation(format!(
            "department {id} does not exist"
        ))),
        _ => Ok(()),
    }
}

fn employee_matches(employee: &Employee, query: &EmployeeQuery) -> bool {
    let q_ok = term(query.q.as_deref()).is_none_or(|t| {
        contains_ci(&employee.first_name, t)
            || contains_ci(&employee.last_name, t)
            || employee.email.as_deref().is_some_and(|e| contains_ci(e, t))
            || contains_ci(&employee.position, t)
    });
    let department_ok = query
        .department_id
        .is_none_or(|id| employee.department_id == Some(id));
    let status_ok = term(query.employment_status.as_deref()).is_none_or(|s| {
        employee
            .employment_status
            .trim()
            .eq_ignore_ascii_case(s)
    });
    q_ok && department_ok && status_ok
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn list_employees(&self, query: &EmployeeQuery) -> RepoResult<(Vec<Employee>, u64)> {
        let tables = self.tables.lock();
        let mut rows: Vec<Employee> = tables
            .employees
            .values()
            .filter(|e| employee_matches(e, query))
            .map(|e| employee_row(&tables, e))
            .collect();
        rows.sort_by(|a, b| {
            (&a.first_name, &a.last_name, a.id).cmp(&(&b.first_name, &b.last_name, b.id))
        });
        let total = rows.len() as u64;
        Ok((
            page(rows, u64::from(query.page.limit()), query.page.offset()),
            total,
        ))
    }

    async fn find_employee(&self, id: i64) -> RepoResult<Option<Employee>> {
        let tables = self.tables.lock();
        Ok(tables.employees.get(&id).map(|e| employee_row(&tables, e)))
    }

    async fn create_employee(&self, data: &EmployeeData) -> RepoResult<Employee> {
        let mut tables = self.tables.lock();
        check_department_ref(&tables, data.department_id)?;
        let now = Utc::now();
        let mut employee = Employee {
            id: tables.next_id("employees"),
            first_name: String::new(),
            last_name: String::new(),
            other_name: None,
            gender: None,
            date_of_birth: None,
            phone: None,
            phone_e164: None,
            email: None,
            national_id: None,
            address: None,
            department_id: None,
            department_name: None,
            contract_url: None,
            contract_file_path: None,
            position: String::new(),
            employment_status: String::new(),
            date_of_hire: data.date_of_hire,
            base_salary: data.base_salary,
            created_at: now,
            updated_at: now,
        };
        apply_employee_data(&mut employee, data);
        tables.employees.insert(employee.id, employee.clone());
        Ok(employee_row(&tables, &employee))
    }

    async fn update_employee(&self, id: i64, data: &EmployeeData) -> RepoResult<Employee> {
        let mut tables = self.tables.lock();
        check_department_ref(&tables, data.department_id)?;
        let employee = tables
            .employees
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("employee {id}")))?;
        apply_employee_data(employee, data);
        employee.updated_at = Utc::now();
        let employee = employee.clone();
        Ok(employee_row(&tables, &employee))
    }

    async fn delete_employee(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.lock();
        if tables.payroll_entries.values().any(|e| e.employee_id == id) {
            return Err(RepoError::Validation(format!(
                "employee {id} is referenced by payroll entries"
            )));
        }
        if tables.employees.remove(&id).is_none() {
            return Ok(false);
        }
        tables.attendance.retain(|_, a| a.employee_id != id);
        tables.entitlements.retain(|_, e| e.employee_id != id);
        tables.leave_requests.retain(|_, r| r.employee_id != id);
        Ok(true)
    }

    async fn set_contract_path(&self, id: i64, path: Option<&str>) -> RepoResult<Employee> {
        let mut tables = self.tables.lock();
        let employee = tables
            .employees
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("employee {id}")))?;
        employee.contract_file_path = path.map(str::to_string);
        employee.updated_at = Utc::now();
        let employee = employee.clone();
        Ok(employee_row(&tables, &employee))
    }
}

/// Active by normalized employment status
pub(super) fn is_active_employee(employee: &Employee) -> bool {
    is_active_status(&employee.employment_status)
}
