use async_trait::async_trait;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Duration, Utc};
use dreamteam_portal::{
    AppState,
    auth::{AdminEmployee, CurrentEmployee, SESSION_COOKIE, password},
    config::AppConfig,
    handlers::{self, NextParam},
    models::{
        AdminDashboardStats, Department, DepartmentForm, Employee, LoginForm, NewEmployee,
        RegisterForm, Role, RoleForm,
    },
    repository::{InsertError, Repository},
    sessions::{InMemorySessionStore, SessionStore},
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// --- Mock Repository ---

/// Canned data plus a record of every attempted insert, so tests can assert
/// that invalid submissions never reach the store.
struct MockRepoControl {
    employees: Vec<Employee>,
    departments: Vec<Department>,
    roles: Vec<Role>,
    created: Arc<Mutex<Vec<NewEmployee>>>,
    stats: AdminDashboardStats,
}

impl Default for MockRepoControl {
    fn default() -> Self {
        MockRepoControl {
            employees: vec![],
            departments: vec![],
            roles: vec![],
            created: Arc::new(Mutex::new(vec![])),
            stats: AdminDashboardStats::default(),
        }
    }
}

#[async_trait]
impl Repository for MockRepoControl {
    async fn find_employee_by_email(&self, email: &str) -> Option<Employee> {
        self.employees.iter().find(|e| e.email == email).cloned()
    }
    async fn find_employee_by_username(&self, username: &str) -> Option<Employee> {
        self.employees
            .iter()
            .find(|e| e.username == username)
            .cloned()
    }
    async fn get_employee(&self, id: Uuid) -> Option<Employee> {
        self.employees.iter().find(|e| e.id == id).cloned()
    }
    async fn create_employee(&self, new: NewEmployee) -> Result<Employee, InsertError> {
        if self.employees.iter().any(|e| e.email == new.email) {
            return Err(InsertError::DuplicateEmail);
        }
        if self.employees.iter().any(|e| e.username == new.username) {
            return Err(InsertError::DuplicateUsername);
        }
        let employee = Employee {
            id: Uuid::new_v4(),
            username: new.username.clone(),
            email: new.email.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            password_hash: new.password_hash.clone(),
            is_admin: new.is_admin,
            department_id: None,
            role_id: None,
            created_at: Utc::now(),
        };
        self.created.lock().unwrap().push(new);
        Ok(employee)
    }
    async fn list_employees(&self) -> Vec<Employee> {
        self.employees.clone()
    }
    async fn assign_employee(
        &self,
        id: Uuid,
        department_id: Option<Uuid>,
        role_id: Option<Uuid>,
    ) -> Option<Employee> {
        self.employees.iter().find(|e| e.id == id).cloned().map(|mut e| {
            e.department_id = department_id;
            e.role_id = role_id;
            e
        })
    }
    async fn list_departments(&self) -> Vec<Department> {
        self.departments.clone()
    }
    async fn get_department(&self, id: Uuid) -> Option<Department> {
        self.departments.iter().find(|d| d.id == id).cloned()
    }
    async fn create_department(&self, form: DepartmentForm) -> Result<Department, InsertError> {
        if self.departments.iter().any(|d| d.name == form.name) {
            return Err(InsertError::DuplicateName);
        }
        Ok(Department {
            id: Uuid::new_v4(),
            name: form.name,
            description: form.description,
        })
    }
    async fn update_department(
        &self,
        id: Uuid,
        form: DepartmentForm,
    ) -> Result<Option<Department>, InsertError> {
        Ok(self.departments.iter().find(|d| d.id == id).map(|_| Department {
            id,
            name: form.name,
            description: form.description,
        }))
    }
    async fn delete_department(&self, id: Uuid) -> bool {
        self.departments.iter().any(|d| d.id == id)
    }
    async fn list_roles(&self) -> Vec<Role> {
        self.roles.clone()
    }
    async fn get_role(&self, id: Uuid) -> Option<Role> {
        self.roles.iter().find(|r| r.id == id).cloned()
    }
    async fn create_role(&self, form: RoleForm) -> Result<Role, InsertError> {
        if self.roles.iter().any(|r| r.name == form.name) {
            return Err(InsertError::DuplicateName);
        }
        Ok(Role {
            id: Uuid::new_v4(),
            name: form.name,
            description: form.description,
        })
    }
    async fn update_role(&self, id: Uuid, form: RoleForm) -> Result<Option<Role>, InsertError> {
        Ok(self.roles.iter().find(|r| r.id == id).map(|_| Role {
            id,
            name: form.name,
            description: form.description,
        }))
    }
    async fn delete_role(&self, id: Uuid) -> bool {
        self.roles.iter().any(|r| r.id == id)
    }
    async fn get_stats(&self) -> AdminDashboardStats {
        self.stats.clone()
    }
}

// --- Test Utilities ---

fn employee_fixture() -> Employee {
    Employee {
        id: Uuid::new_v4(),
        username: "employee1".to_string(),
        email: "employee1@email.com".to_string(),
        first_name: "Test".to_string(),
        last_name: "Employee".to_string(),
        password_hash: password::hash("1test2016").unwrap(),
        is_admin: false,
        department_id: None,
        role_id: None,
        created_at: Utc::now(),
    }
}

fn admin_fixture() -> Employee {
    Employee {
        id: Uuid::new_v4(),
        username: "admin".to_string(),
        email: "admin@email.com".to_string(),
        first_name: "Admin".to_string(),
        last_name: "User".to_string(),
        password_hash: password::hash("admin2016").unwrap(),
        is_admin: true,
        department_id: None,
        role_id: None,
        created_at: Utc::now(),
    }
}

fn create_test_state(repo: MockRepoControl) -> AppState {
    AppState {
        repo: Arc::new(repo),
        sessions: Arc::new(InMemorySessionStore::new()),
        config: AppConfig::default(),
    }
}

fn register_form(email: &str, username: &str, password: &str, confirm: &str) -> RegisterForm {
    RegisterForm {
        email: email.to_string(),
        username: username.to_string(),
        first_name: "Test".to_string(),
        last_name: "Employee".to_string(),
        password: password.to_string(),
        confirm_password: confirm.to_string(),
    }
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location_of(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .collect()
}

// --- Login handler ---

#[tokio::test]
async fn login_redirects_employee_to_dashboard_with_session_cookie() {
    let state = create_test_state(MockRepoControl {
        employees: vec![employee_fixture()],
        ..MockRepoControl::default()
    });

    let response = handlers::login(
        State(state),
        Query(NextParam::default()),
        CookieJar::new(),
        Form(LoginForm {
            email: "employee1@email.com".to_string(),
            password: "1test2016".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location_of(&response), "/dashboard");
    assert!(
        set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("session=")),
        "successful login must set the session cookie"
    );
}

#[tokio::test]
async fn login_redirects_admin_to_admin_dashboard() {
    let state = create_test_state(MockRepoControl {
        employees: vec![admin_fixture()],
        ..MockRepoControl::default()
    });

    let response = handlers::login(
        State(state),
        Query(NextParam::default()),
        CookieJar::new(),
        Form(LoginForm {
            email: "admin@email.com".to_string(),
            password: "admin2016".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location_of(&response), "/admin/dashboard");
}

#[tokio::test]
async fn login_forwards_to_next_target_when_local() {
    let state = create_test_state(MockRepoControl {
        employees: vec![admin_fixture()],
        ..MockRepoControl::default()
    });

    let response = handlers::login(
        State(state),
        Query(NextParam {
            next: Some("/logout".to_string()),
        }),
        CookieJar::new(),
        Form(LoginForm {
            email: "admin@email.com".to_string(),
            password: "admin2016".to_string(),
        }),
    )
    .await;

    assert_eq!(location_of(&response), "/logout");
}

#[tokio::test]
async fn login_ignores_offsite_next_target() {
    let state = create_test_state(MockRepoControl {
        employees: vec![employee_fixture()],
        ..MockRepoControl::default()
    });

    let response = handlers::login(
        State(state),
        Query(NextParam {
            next: Some("https://example.com/phish".to_string()),
        }),
        CookieJar::new(),
        Form(LoginForm {
            email: "employee1@email.com".to_string(),
            password: "1test2016".to_string(),
        }),
    )
    .await;

    // Falls back to the role landing page.
    assert_eq!(location_of(&response), "/dashboard");
}

#[tokio::test]
async fn login_wrong_password_shows_generic_message() {
    let state = create_test_state(MockRepoControl {
        employees: vec![employee_fixture()],
        ..MockRepoControl::default()
    });

    let response = handlers::login(
        State(state),
        Query(NextParam::default()),
        CookieJar::new(),
        Form(LoginForm {
            email: "employee1@email.com".to_string(),
            password: "invalid".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty(), "no session on failure");
    let body = body_string(response).await;
    assert!(body.contains("Invalid email or password"));
    assert!(body.contains(r#"class="alert""#));
}

#[tokio::test]
async fn login_unknown_email_shows_the_same_generic_message() {
    let state = create_test_state(MockRepoControl {
        employees: vec![employee_fixture()],
        ..MockRepoControl::default()
    });

    let response = handlers::login(
        State(state),
        Query(NextParam::default()),
        CookieJar::new(),
        Form(LoginForm {
            email: "employee2@email.com".to_string(),
            password: "1test2016".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Invalid email or password"));
}

#[tokio::test]
async fn login_invalid_email_format_shows_field_error() {
    let state = create_test_state(MockRepoControl {
        employees: vec![employee_fixture()],
        ..MockRepoControl::default()
    });

    let response = handlers::login(
        State(state),
        Query(NextParam::default()),
        CookieJar::new(),
        Form(LoginForm {
            email: "invalid".to_string(),
            password: "1test2016".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains(r#"class="help-block""#));
    assert!(body.contains("Invalid email address"));
    // A field-level problem, not an auth failure: no generic notice.
    assert!(!body.contains("Invalid email or password"));
}

// --- Registration handler ---

#[tokio::test]
async fn register_creates_employee_and_redirects_to_login() {
    let created = Arc::new(Mutex::new(vec![]));
    let state = create_test_state(MockRepoControl {
        created: created.clone(),
        ..MockRepoControl::default()
    });

    let response = handlers::register(
        State(state),
        CookieJar::new(),
        Form(register_form(
            "employee2@email.com",
            "employee2",
            "2test2016",
            "2test2016",
        )),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location_of(&response), "/login");
    assert!(
        set_cookies(&response).iter().any(|c| c.starts_with("flash=")),
        "success notice travels in the flash cookie"
    );

    let created = created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].email, "employee2@email.com");
    assert!(!created[0].is_admin, "self-service accounts are never admin");
    assert!(created[0].password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn register_mismatched_confirm_password_never_creates_identity() {
    let created = Arc::new(Mutex::new(vec![]));
    let state = create_test_state(MockRepoControl {
        created: created.clone(),
        ..MockRepoControl::default()
    });

    let response = handlers::register(
        State(state),
        CookieJar::new(),
        Form(register_form(
            "employee2@email.com",
            "employee2",
            "2test2016",
            "password-won't-match",
        )),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Field must be equal to confirm_password"));
    assert_eq!(created.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn register_invalid_email_never_creates_identity() {
    let created = Arc::new(Mutex::new(vec![]));
    let state = create_test_state(MockRepoControl {
        created: created.clone(),
        ..MockRepoControl::default()
    });

    let response = handlers::register(
        State(state),
        CookieJar::new(),
        Form(register_form(
            "invalid_email",
            "employee2",
            "2test2016",
            "2test2016",
        )),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Invalid email address"));
    assert_eq!(created.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn register_duplicate_email_reports_field_error() {
    let created = Arc::new(Mutex::new(vec![]));
    let state = create_test_state(MockRepoControl {
        employees: vec![employee_fixture()],
        created: created.clone(),
        ..MockRepoControl::default()
    });

    let response = handlers::register(
        State(state),
        CookieJar::new(),
        Form(register_form(
            "employee1@email.com",
            "someone_else",
            "2test2016",
            "2test2016",
        )),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Email is already in use."));
    assert_eq!(created.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn register_duplicate_username_reports_field_error() {
    let state = create_test_state(MockRepoControl {
        employees: vec![employee_fixture()],
        ..MockRepoControl::default()
    });

    let response = handlers::register(
        State(state),
        CookieJar::new(),
        Form(register_form(
            "fresh@email.com",
            "employee1",
            "2test2016",
            "2test2016",
        )),
    )
    .await;

    let body = body_string(response).await;
    assert!(body.contains("Username is already in use."));
}

// --- Dashboards ---

#[tokio::test]
async fn dashboard_greets_employee_by_username() {
    let Html(body) = handlers::dashboard(CurrentEmployee(employee_fixture())).await;
    assert!(body.contains("Hi, employee1!"));
    assert!(body.contains(r#"id="username_greeting""#));
}

#[tokio::test]
async fn admin_dashboard_greets_admin_and_shows_stats() {
    let state = create_test_state(MockRepoControl {
        stats: AdminDashboardStats {
            total_employees: 2,
            total_departments: 1,
            total_roles: 1,
        },
        ..MockRepoControl::default()
    });

    let Html(body) = handlers::admin_dashboard(AdminEmployee(admin_fixture()), State(state)).await;
    assert!(body.contains("Hi, admin!"));
    assert!(body.contains("Employees: 2"));
}

// --- Logout handler ---

#[tokio::test]
async fn logout_destroys_session_and_redirects_to_login() {
    let employee = employee_fixture();
    let state = create_test_state(MockRepoControl {
        employees: vec![employee.clone()],
        ..MockRepoControl::default()
    });
    let session = state
        .sessions
        .create(employee.id, Duration::seconds(3600))
        .await;
    let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, session.id.to_string()));

    let response = handlers::logout(
        CurrentEmployee(employee),
        State(state.clone()),
        jar,
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location_of(&response), "/login");
    assert!(
        state.sessions.get(session.id).await.is_none(),
        "logout must destroy the session server-side"
    );
}

// --- Admin CRUD handlers ---

#[tokio::test]
async fn department_add_redirects_to_listing() {
    let state = create_test_state(MockRepoControl::default());

    let response = handlers::department_add(
        AdminEmployee(admin_fixture()),
        State(state),
        Form(DepartmentForm {
            name: "Human Resources".to_string(),
            description: "Find and keep the best talent".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location_of(&response), "/admin/departments");
}

#[tokio::test]
async fn department_add_duplicate_name_rerenders_with_field_error() {
    let state = create_test_state(MockRepoControl {
        departments: vec![Department {
            id: Uuid::new_v4(),
            name: "Human Resources".to_string(),
            description: "Find and keep the best talent".to_string(),
        }],
        ..MockRepoControl::default()
    });

    let response = handlers::department_add(
        AdminEmployee(admin_fixture()),
        State(state),
        Form(DepartmentForm {
            name: "Human Resources".to_string(),
            description: "duplicate".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Name is already in use."));
}

#[tokio::test]
async fn department_add_blank_name_rerenders_with_required_error() {
    let state = create_test_state(MockRepoControl::default());

    let response = handlers::department_add(
        AdminEmployee(admin_fixture()),
        State(state),
        Form(DepartmentForm {
            name: "  ".to_string(),
            description: "x".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("This field is required."));
}

#[tokio::test]
async fn role_add_redirects_to_listing() {
    let state = create_test_state(MockRepoControl::default());

    let response = handlers::role_add(
        AdminEmployee(admin_fixture()),
        State(state),
        Form(RoleForm {
            name: "Head of Department".to_string(),
            description: "Lead the entire department".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location_of(&response), "/admin/roles");
}

#[tokio::test]
async fn employee_assign_updates_and_redirects() {
    let employee = employee_fixture();
    let department_id = Uuid::new_v4();
    let state = create_test_state(MockRepoControl {
        employees: vec![employee.clone()],
        ..MockRepoControl::default()
    });

    let response = handlers::employee_assign(
        AdminEmployee(admin_fixture()),
        State(state),
        Path(employee.id),
        Form(dreamteam_portal::models::AssignForm {
            department_id: department_id.to_string(),
            role_id: String::new(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location_of(&response), "/admin/employees");
}

#[tokio::test]
async fn employee_assign_unknown_employee_is_not_found() {
    let state = create_test_state(MockRepoControl::default());

    let response = handlers::employee_assign(
        AdminEmployee(admin_fixture()),
        State(state),
        Path(Uuid::new_v4()),
        Form(dreamteam_portal::models::AssignForm::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
