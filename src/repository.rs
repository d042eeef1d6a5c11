use crate::models::{
    AdminDashboardStats, Department, DepartmentForm, Employee, NewEmployee, Role, RoleForm,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// InsertError
///
/// Failure modes of a write that may collide with a uniqueness constraint.
/// Duplicates are detected from the store-level constraint violation, never
/// by a racy pre-check in application logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("username is already in use")]
    DuplicateUsername,
    #[error("email is already in use")]
    DuplicateEmail,
    #[error("name is already in use")]
    DuplicateName,
    #[error("storage failure")]
    Database,
}

/// Repository
///
/// Abstract contract for all persistence operations: the credential store
/// plus the organizational entities. Handlers and the auth layer only see
/// `Arc<dyn Repository>`, so tests swap in mock implementations.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Employees (Credential Store) ---
    async fn find_employee_by_email(&self, email: &str) -> Option<Employee>;
    async fn find_employee_by_username(&self, username: &str) -> Option<Employee>;
    async fn get_employee(&self, id: Uuid) -> Option<Employee>;
    /// Inserts a new identity. Unique violations surface as
    /// `DuplicateUsername` / `DuplicateEmail`.
    async fn create_employee(&self, new: NewEmployee) -> Result<Employee, InsertError>;
    async fn list_employees(&self) -> Vec<Employee>;
    /// Sets (or clears) the department/role assignment of one employee.
    async fn assign_employee(
        &self,
        id: Uuid,
        department_id: Option<Uuid>,
        role_id: Option<Uuid>,
    ) -> Option<Employee>;

    // --- Departments ---
    async fn list_departments(&self) -> Vec<Department>;
    async fn get_department(&self, id: Uuid) -> Option<Department>;
    async fn create_department(&self, form: DepartmentForm) -> Result<Department, InsertError>;
    async fn update_department(
        &self,
        id: Uuid,
        form: DepartmentForm,
    ) -> Result<Option<Department>, InsertError>;
    async fn delete_department(&self, id: Uuid) -> bool;

    // --- Roles ---
    async fn list_roles(&self) -> Vec<Role>;
    async fn get_role(&self, id: Uuid) -> Option<Role>;
    async fn create_role(&self, form: RoleForm) -> Result<Role, InsertError>;
    async fn update_role(&self, id: Uuid, form: RoleForm) -> Result<Option<Role>, InsertError>;
    async fn delete_role(&self, id: Uuid) -> bool;

    // --- Stats ---
    async fn get_stats(&self) -> AdminDashboardStats;
}

/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation, backed by the PostgreSQL pool.
pub struct PostgresRepository {
    pool: PgPool,
}

const EMPLOYEE_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, \
     is_admin, department_id, role_id, created_at";

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// The violated unique constraint, if this error is one.
fn unique_violation(e: &sqlx::Error) -> Option<&str> {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => db.constraint(),
        _ => None,
    }
}

fn employee_insert_error(e: sqlx::Error) -> InsertError {
    match unique_violation(&e) {
        Some("employees_username_key") => InsertError::DuplicateUsername,
        Some("employees_email_key") => InsertError::DuplicateEmail,
        _ => {
            tracing::error!("employee insert error: {:?}", e);
            InsertError::Database
        }
    }
}

fn name_insert_error(e: sqlx::Error) -> InsertError {
    match unique_violation(&e) {
        Some(_) => InsertError::DuplicateName,
        None => {
            tracing::error!("insert error: {:?}", e);
            InsertError::Database
        }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_employee_by_email(&self, email: &str) -> Option<Employee> {
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_employee_by_email error: {:?}", e);
            None
        })
    }

    async fn find_employee_by_username(&self, username: &str) -> Option<Employee> {
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_employee_by_username error: {:?}", e);
            None
        })
    }

    async fn get_employee(&self, id: Uuid) -> Option<Employee> {
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_employee error: {:?}", e);
            None
        })
    }

    async fn create_employee(&self, new: NewEmployee) -> Result<Employee, InsertError> {
        sqlx::query_as::<_, Employee>(&format!(
            "INSERT INTO employees \
                 (id, username, email, first_name, last_name, password_hash, is_admin, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) \
             RETURNING {EMPLOYEE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.username)
        .bind(new.email)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.password_hash)
        .bind(new.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(employee_insert_error)
    }

    async fn list_employees(&self) -> Vec<Employee> {
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY username ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_employees error: {:?}", e);
            vec![]
        })
    }

    async fn assign_employee(
        &self,
        id: Uuid,
        department_id: Option<Uuid>,
        role_id: Option<Uuid>,
    ) -> Option<Employee> {
        sqlx::query_as::<_, Employee>(&format!(
            "UPDATE employees SET department_id = $2, role_id = $3 \
             WHERE id = $1 RETURNING {EMPLOYEE_COLUMNS}"
        ))
        .bind(id)
        .bind(department_id)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("assign_employee error: {:?}", e);
            None
        })
    }

    async fn list_departments(&self) -> Vec<Department> {
        sqlx::query_as::<_, Department>(
            "SELECT id, name, description FROM departments ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_departments error: {:?}", e);
            vec![]
        })
    }

    async fn get_department(&self, id: Uuid) -> Option<Department> {
        sqlx::query_as::<_, Department>(
            "SELECT id, name, description FROM departments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_department error: {:?}", e);
            None
        })
    }

    async fn create_department(&self, form: DepartmentForm) -> Result<Department, InsertError> {
        sqlx::query_as::<_, Department>(
            "INSERT INTO departments (id, name, description) VALUES ($1, $2, $3) \
             RETURNING id, name, description",
        )
        .bind(Uuid::new_v4())
        .bind(form.name)
        .bind(form.description)
        .fetch_one(&self.pool)
        .await
        .map_err(name_insert_error)
    }

    async fn update_department(
        &self,
        id: Uuid,
        form: DepartmentForm,
    ) -> Result<Option<Department>, InsertError> {
        sqlx::query_as::<_, Department>(
            "UPDATE departments SET name = $2, description = $3 WHERE id = $1 \
             RETURNING id, name, description",
        )
        .bind(id)
        .bind(form.name)
        .bind(form.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(name_insert_error)
    }

    async fn delete_department(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_department error: {:?}", e);
                false
            }
        }
    }

    async fn list_roles(&self) -> Vec<Role> {
        sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_roles error: {:?}", e);
                vec![]
            })
    }

    async fn get_role(&self, id: Uuid) -> Option<Role> {
        sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_role error: {:?}", e);
                None
            })
    }

    async fn create_role(&self, form: RoleForm) -> Result<Role, InsertError> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO roles (id, name, description) VALUES ($1, $2, $3) \
             RETURNING id, name, description",
        )
        .bind(Uuid::new_v4())
        .bind(form.name)
        .bind(form.description)
        .fetch_one(&self.pool)
        .await
        .map_err(name_insert_error)
    }

    async fn update_role(&self, id: Uuid, form: RoleForm) -> Result<Option<Role>, InsertError> {
        sqlx::query_as::<_, Role>(
            "UPDATE roles SET name = $2, description = $3 WHERE id = $1 \
             RETURNING id, name, description",
        )
        .bind(id)
        .bind(form.name)
        .bind(form.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(name_insert_error)
    }

    async fn delete_role(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_role error: {:?}", e);
                false
            }
        }
    }

    async fn get_stats(&self) -> AdminDashboardStats {
        let total_employees = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let total_departments = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM departments")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let total_roles = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM roles")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        AdminDashboardStats {
            total_employees,
            total_departments,
            total_roles,
        }
    }
}
