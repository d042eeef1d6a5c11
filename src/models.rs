use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Employee
///
/// The canonical identity record stored in the `employees` table. Uniqueness
/// of `username` and `email` is enforced by the database constraints, not by
/// application-level pre-checks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Employee {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Salted argon2 hash in PHC string format. Never empty, never rendered.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_admin: bool,
    pub department_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Department row. `name` is unique across departments.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

/// Role row. `name` is unique across roles.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

/// Insert payload for a new employee. The password arrives here already
/// hashed; plaintext never crosses the repository boundary.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_admin: bool,
}

// --- Form Payloads (Input Schemas) ---

/// Login form fields (POST /login).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form fields (POST /register). Each field is validated
/// independently; errors are surfaced per field.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
}

/// Shared add/edit payload for departments.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DepartmentForm {
    pub name: String,
    pub description: String,
}

/// Shared add/edit payload for roles.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RoleForm {
    pub name: String,
    pub description: String,
}

/// Assignment payload (POST /admin/employees/assign/{id}). The select inputs
/// post raw strings; an unparsable or empty value clears the assignment.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AssignForm {
    pub department_id: String,
    pub role_id: String,
}

// --- Dashboard Schemas (Output) ---

/// Counters shown on the administrative dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AdminDashboardStats {
    pub total_employees: i64,
    pub total_departments: i64,
    pub total_roles: i64,
}
