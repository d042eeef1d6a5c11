use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{
        self, AdminEmployee, AuthError, CurrentEmployee, RegisterError, SESSION_COOKIE,
        redirect_found,
    },
    models::{AssignForm, DepartmentForm, LoginForm, RegisterForm, RoleForm},
    pages,
    repository::{InsertError, Repository},
    sessions::SessionStore,
    validation::{self, FieldError, ValidationErrors},
};

/// Cookie carrying a one-shot notice across a redirect. Consumed (removed)
/// by the next page render.
const FLASH_COOKIE: &str = "flash";

fn set_flash(jar: CookieJar, message: &str) -> CookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, urlencoding::encode(message).into_owned()))
            .path("/")
            .build(),
    )
}

fn take_flash(jar: CookieJar) -> (CookieJar, Option<String>) {
    match jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) {
        Some(raw) => {
            let message = urlencoding::decode(&raw)
                .map(|decoded| decoded.into_owned())
                .unwrap_or(raw);
            let jar = jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/").build());
            (jar, Some(message))
        }
        None => (jar, None),
    }
}

/// Optional `?next=` carried through the login flow.
#[derive(Debug, Deserialize, Default)]
pub struct NextParam {
    pub next: Option<String>,
}

impl NextParam {
    /// The forward target, if it is a local absolute path. Anything else is
    /// discarded so login can never redirect off-site.
    fn local_target(&self) -> Option<&str> {
        self.next
            .as_deref()
            .filter(|next| next.starts_with('/') && !next.starts_with("//"))
    }
}

// --- Public pages ---

pub async fn home_page() -> Html<String> {
    Html(pages::home())
}

pub async fn login_page(
    Query(params): Query<NextParam>,
    jar: CookieJar,
) -> (CookieJar, Html<String>) {
    let (jar, flash) = take_flash(jar);
    let page = pages::login_page(
        &LoginForm::default(),
        &ValidationErrors::new(),
        flash.as_deref(),
        params.next.as_deref(),
    );
    (jar, Html(page))
}

/// POST /login
///
/// On success: session cookie plus a `302` to the `next` target or to the
/// role-based landing page. Format failures re-render with a field error;
/// bad credentials re-render with the single generic notice.
pub async fn login(
    State(state): State<AppState>,
    Query(params): Query<NextParam>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match auth::authenticate(
        &state.repo,
        &state.sessions,
        &state.config,
        &form.email,
        &form.password,
    )
    .await
    {
        Ok((session, employee)) => {
            let cookie = Cookie::build((SESSION_COOKIE, session.id.to_string()))
                .path("/")
                .http_only(true)
                .build();
            let target = params
                .local_target()
                .unwrap_or_else(|| auth::landing_for(&employee));
            (jar.add(cookie), redirect_found(target)).into_response()
        }
        Err(AuthError::InvalidFormat { field, error }) => {
            let mut errors = ValidationErrors::new();
            errors.push(field, error);
            Html(pages::login_page(
                &form,
                &errors,
                None,
                params.next.as_deref(),
            ))
            .into_response()
        }
        Err(error @ AuthError::InvalidCredentials) => Html(pages::login_page(
            &form,
            &ValidationErrors::new(),
            Some(&error.to_string()),
            params.next.as_deref(),
        ))
        .into_response(),
    }
}

pub async fn register_page() -> Html<String> {
    Html(pages::register_page(
        &RegisterForm::default(),
        &ValidationErrors::new(),
    ))
}

/// POST /register
///
/// Field errors re-render inline; success redirects to login with a
/// confirmation notice. Exactly one identity row exists afterwards.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    match auth::register(&state.repo, &form).await {
        Ok(_employee) => {
            let jar = set_flash(jar, "You have successfully registered! You may now login.");
            (jar, redirect_found("/login")).into_response()
        }
        Err(RegisterError::Invalid(errors)) => {
            Html(pages::register_page(&form, &errors)).into_response()
        }
        Err(RegisterError::Internal) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

// --- Authenticated pages ---

pub async fn dashboard(CurrentEmployee(employee): CurrentEmployee) -> Html<String> {
    Html(pages::dashboard(&employee))
}

/// GET /logout
///
/// Destroys the server-side session, clears the cookie and returns to the
/// login page. Requires a live session like any other protected route.
pub async fn logout(
    CurrentEmployee(_employee): CurrentEmployee,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Response {
    if let Some(token) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    {
        state.sessions.destroy(token).await;
    }
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    let jar = set_flash(jar, "You have successfully been logged out.");
    (jar, redirect_found("/login")).into_response()
}

// --- Admin pages ---

pub async fn admin_dashboard(
    AdminEmployee(admin): AdminEmployee,
    State(state): State<AppState>,
) -> Html<String> {
    let stats = state.repo.get_stats().await;
    Html(pages::admin_dashboard(&admin, &stats))
}

pub async fn departments_page(
    AdminEmployee(admin): AdminEmployee,
    State(state): State<AppState>,
) -> Html<String> {
    let departments = state.repo.list_departments().await;
    Html(pages::departments_page(&admin, &departments))
}

pub async fn department_add_page(AdminEmployee(admin): AdminEmployee) -> Html<String> {
    Html(pages::org_form_page(
        &admin,
        "Add Department",
        "/admin/departments/add",
        "",
        "",
        &ValidationErrors::new(),
    ))
}

pub async fn department_add(
    AdminEmployee(admin): AdminEmployee,
    State(state): State<AppState>,
    Form(form): Form<DepartmentForm>,
) -> Response {
    let mut errors =
        validation::validate_presence(&[("name", &form.name), ("description", &form.description)]);
    if errors.is_empty() {
        match state.repo.create_department(form.clone()).await {
            Ok(_) => return redirect_found("/admin/departments"),
            Err(InsertError::DuplicateName) => errors.push("name", FieldError::NameInUse),
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
    Html(pages::org_form_page(
        &admin,
        "Add Department",
        "/admin/departments/add",
        &form.name,
        &form.description,
        &errors,
    ))
    .into_response()
}

pub async fn department_edit_page(
    AdminEmployee(admin): AdminEmployee,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, StatusCode> {
    let department = state
        .repo
        .get_department(id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Html(pages::org_form_page(
        &admin,
        "Edit Department",
        &format!("/admin/departments/edit/{id}"),
        &department.name,
        &department.description,
        &ValidationErrors::new(),
    )))
}

pub async fn department_edit(
    AdminEmployee(admin): AdminEmployee,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<DepartmentForm>,
) -> Response {
    let mut errors =
        validation::validate_presence(&[("name", &form.name), ("description", &form.description)]);
    if errors.is_empty() {
        match state.repo.update_department(id, form.clone()).await {
            Ok(Some(_)) => return redirect_found("/admin/departments"),
            Ok(None) => return StatusCode::NOT_FOUND.into_response(),
            Err(InsertError::DuplicateName) => errors.push("name", FieldError::NameInUse),
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
    Html(pages::org_form_page(
        &admin,
        "Edit Department",
        &format!("/admin/departments/edit/{id}"),
        &form.name,
        &form.description,
        &errors,
    ))
    .into_response()
}

pub async fn department_delete(
    AdminEmployee(_admin): AdminEmployee,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    if state.repo.delete_department(id).await {
        redirect_found("/admin/departments")
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

pub async fn roles_page(
    AdminEmployee(admin): AdminEmployee,
    State(state): State<AppState>,
) -> Html<String> {
    let roles = state.repo.list_roles().await;
    Html(pages::roles_page(&admin, &roles))
}

pub async fn role_add_page(AdminEmployee(admin): AdminEmployee) -> Html<String> {
    Html(pages::org_form_page(
        &admin,
        "Add Role",
        "/admin/roles/add",
        "",
        "",
        &ValidationErrors::new(),
    ))
}

pub async fn role_add(
    AdminEmployee(admin): AdminEmployee,
    State(state): State<AppState>,
    Form(form): Form<RoleForm>,
) -> Response {
    let mut errors =
        validation::validate_presence(&[("name", &form.name), ("description", &form.description)]);
    if errors.is_empty() {
        match state.repo.create_role(form.clone()).await {
            Ok(_) => return redirect_found("/admin/roles"),
            Err(InsertError::DuplicateName) => errors.push("name", FieldError::NameInUse),
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
    Html(pages::org_form_page(
        &admin,
        "Add Role",
        "/admin/roles/add",
        &form.name,
        &form.description,
        &errors,
    ))
    .into_response()
}

pub async fn role_edit_page(
    AdminEmployee(admin): AdminEmployee,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, StatusCode> {
    let role = state.repo.get_role(id).await.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Html(pages::org_form_page(
        &admin,
        "Edit Role",
        &format!("/admin/roles/edit/{id}"),
        &role.name,
        &role.description,
        &ValidationErrors::new(),
    )))
}

pub async fn role_edit(
    AdminEmployee(admin): AdminEmployee,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<RoleForm>,
) -> Response {
    let mut errors =
        validation::validate_presence(&[("name", &form.name), ("description", &form.description)]);
    if errors.is_empty() {
        match state.repo.update_role(id, form.clone()).await {
            Ok(Some(_)) => return redirect_found("/admin/roles"),
            Ok(None) => return StatusCode::NOT_FOUND.into_response(),
            Err(InsertError::DuplicateName) => errors.push("name", FieldError::NameInUse),
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
    Html(pages::org_form_page(
        &admin,
        "Edit Role",
        &format!("/admin/roles/edit/{id}"),
        &form.name,
        &form.description,
        &errors,
    ))
    .into_response()
}

pub async fn role_delete(
    AdminEmployee(_admin): AdminEmployee,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    if state.repo.delete_role(id).await {
        redirect_found("/admin/roles")
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

pub async fn employees_page(
    AdminEmployee(admin): AdminEmployee,
    State(state): State<AppState>,
) -> Html<String> {
    let employees = state.repo.list_employees().await;
    let departments = state.repo.list_departments().await;
    let roles = state.repo.list_roles().await;
    Html(pages::employees_page(&admin, &employees, &departments, &roles))
}

pub async fn employee_assign_page(
    AdminEmployee(admin): AdminEmployee,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, StatusCode> {
    let employee = state
        .repo
        .get_employee(id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    let departments = state.repo.list_departments().await;
    let roles = state.repo.list_roles().await;
    Ok(Html(pages::assign_page(
        &admin,
        &employee,
        &departments,
        &roles,
    )))
}

pub async fn employee_assign(
    AdminEmployee(_admin): AdminEmployee,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<AssignForm>,
) -> Response {
    let department_id = Uuid::parse_str(form.department_id.trim()).ok();
    let role_id = Uuid::parse_str(form.role_id.trim()).ok();
    match state.repo.assign_employee(id, department_id, role_id).await {
        Some(_) => redirect_found("/admin/employees"),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
