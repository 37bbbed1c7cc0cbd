//! Departments

use async_trait::async_trait;
use shared::models::{Department, DepartmentInput, PageRequest};
use sqlx::{Postgres, QueryBuilder};

use super::{PgStore, like_pattern, search_term};
use crate::db::{DepartmentStore, RepoError, RepoResult};

const DEPARTMENT_SELECT: &str = "SELECT d.id, d.name, d.description, \
     (SELECT COUNT(*) FROM employees e WHERE e.department_id = d.id) AS employee_count, \
     d.created_at, d.updated_at \
     FROM departments d";

#[async_trait]
impl DepartmentStore for PgStore {
    async fn list_departments(
        &self,
        q: Option<&str>,
        page: &PageRequest,
    ) -> RepoResult<(Vec<Department>, u64)> {
        let term = search_term(q).map(like_pattern);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM departments d WHERE TRUE");
        push_search(&mut count, term.as_deref());
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut list = QueryBuilder::<Postgres>::new(format!("{DEPARTMENT_SELECT} WHERE TRUE"));
        push_search(&mut list, term.as_deref());
        list.push(" ORDER BY lower(d.name) LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows = list.build_query_as::<Department>().fetch_all(&self.pool).await?;

        Ok((rows, total.max(0) as u64))
    }

    async fn find_department(&self, id: i64) -> RepoResult<Option<Department>> {
        let row = sqlx::query_as::<_, Department>(&format!("{DEPARTMENT_SELECT} WHERE d.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn department_name_exists(&self, name: &str, exclude_id: Option<i64>) -> RepoResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM departments \
             WHERE lower(name) = lower($1) AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(name.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_department(&self, input: &DepartmentInput) -> RepoResult<Department> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO departments (name, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(&input.name)
        .bind(input.description.as_deref())
        .fetch_one(&self.pool)
        .await?;
        self.find_department(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("department {id}")))
    }

    async fn update_department(&self, id: i64, input: &DepartmentInput) -> RepoResult<Department> {
        let result = sqlx::query(
            "UPDATE departments SET name = $2, description = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.description.as_deref())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("department {id}")));
        }
        self.find_department(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("department {id}")))
    }

    async fn delete_department(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_department_employees(&self, id: i64) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE department_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn push_search(qb: &mut QueryBuilder<'_, Postgres>, term: Option<&str>) {
    if let Some(term) = term {
        qb.push(" AND (d.name ILIKE ")
            .push_bind(term.to_string())
            .push(" OR COALESCE(d.description, '') ILIKE ")
            .push_bind(term.to_string())
            .push(")");
    }
}
