//! Employees

use async_trait::async_trait;
use shared::models::{Employee, EmployeeData, EmployeeQuery};
use sqlx::{Postgres, QueryBuilder};

use super::{PgStore, like_pattern, search_term};
use crate::db::{EmployeeStore, RepoError, RepoResult};

const EMPLOYEE_SELECT: &str = "SELECT e.id, e.first_name, e.last_name, e.other_name, e.gender, \
     e.date_of_birth, e.phone, e.phone_e164, e.email, e.national_id, e.address, \
     e.department_id, d.name AS department_name, e.contract_url, e.contract_file_path, \
     e.position, e.employment_status, e.date_of_hire, e.base_salary, e.created_at, e.updated_at \
     FROM employees e LEFT JOIN departments d ON d.id = e.department_id";

#[async_trait]
impl EmployeeStore for PgStore {
    async fn list_employees(&self, query: &EmployeeQuery) -> RepoResult<(Vec<Employee>, u64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM employees e WHERE TRUE");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut list = QueryBuilder::<Postgres>::new(format!("{EMPLOYEE_SELECT} WHERE TRUE"));
        push_filters(&mut list, query);
        list.push(" ORDER BY e.first_name, e.last_name, e.id LIMIT ")
            .push_bind(i64::from(query.page.limit()))
            .push(" OFFSET ")
            .push_bind(query.page.offset() as i64);
        let rows = list.build_query_as::<Employee>().fetch_all(&self.pool).await?;

        Ok((rows, total.max(0) as u64))
    }

    async fn find_employee(&self, id: i64) -> RepoResult<Option<Employee>> {
        let row = sqlx::query_as::<_, Employee>(&format!("{EMPLOYEE_SELECT} WHERE e.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_employee(&self, data: &EmployeeData) -> RepoResult<Employee> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO employees (first_name, last_name, other_name, gender, date_of_birth, \
               phone, phone_e164, email, national_id, address, department_id, contract_url, \
               position, employment_status, date_of_hire, base_salary) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING id",
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.other_name.as_deref())
        .bind(data.gender)
        .bind(data.date_of_birth)
        .bind(data.phone.as_deref())
        .bind(data.phone_e164.as_deref())
        .bind(data.email.as_deref())
        .bind(data.national_id.as_deref())
        .bind(data.address.as_deref())
        .bind(data.department_id)
        .bind(data.contract_url.as_deref())
        .bind(&data.position)
        .bind(&data.employment_status)
        .bind(data.date_of_hire)
        .bind(data.base_salary)
        .fetch_one(&self.pool)
        .await?;
        self.find_employee(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("employee {id}")))
    }

    async fn update_employee(&self, id: i64, data: &EmployeeData) -> RepoResult<Employee> {
        let result = sqlx::query(
            "UPDATE employees SET first_name = $2, last_name = $3, other_name = $4, gender = $5, \
               date_of_birth = $6, phone = $7, phone_e164 = $8, email = $9, national_id = $10, \
               address = $11, department_id = $12, contract_url = $13, position = $14, \
               employment_status = $15, date_of_hire = $16, base_salary = $17, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.other_name.as_deref())
        .bind(data.gender)
        .bind(data.date_of_birth)
        .bind(data.phone.as_deref())
        .bind(data.phone_e164.as_deref())
        .bind(data.email.as_deref())
        .bind(data.national_id.as_deref())
        .bind(data.address.as_deref())
        .bind(data.department_id)
        .bind(data.contract_url.as_deref())
        .bind(&data.position)
        .bind(&data.employment_status)
        .bind(data.date_of_hire)
        .bind(data.base_salary)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("employee {id}")));
        }
        self.find_employee(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("employee {id}")))
    }

    async fn delete_employee(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_contract_path(&self, id: i64, path: Option<&str>) -> RepoResult<Employee> {
        let result = sqlx::query(
            "UPDATE employees SET contract_file_path = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(path)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("employee {id}")));
        }
        self.find_employee(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("employee {id}")))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &EmployeeQuery) {
    if let Some(term) = search_term(query.q.as_deref()).map(like_pattern) {
        qb.push(" AND (e.first_name ILIKE ")
            .push_bind(term.clone())
            .push(" OR e.last_name ILIKE ")
            .push_bind(term.clone())
            .push(" OR COALESCE(e.email, '') ILIKE ")
            .push_bind(term.clone())
            .push(" OR e.position ILIKE ")
            .push_bind(term)
            .push(")");
    }
    if let Some(department_id) = query.department_id {
        qb.push(" AND e.department_id = ").push_bind(department_id);
    }
    if let Some(status) = search_term(query.employment_status.as_deref()) {
        qb.push(" AND lower(trim(e.employment_status)) = lower(")
            .push_bind(status.to_string())
            .push(")");
    }
}
