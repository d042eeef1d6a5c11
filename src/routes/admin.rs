use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Management views nested under `/admin`. The admin guard is layered on
/// the nest, and every handler additionally takes the `AdminEmployee`
/// extractor; a signed-in non-admin is redirected to `/dashboard`, never
/// served these pages.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::admin_dashboard))
        // Department management.
        .route("/departments", get(handlers::departments_page))
        .route(
            "/departments/add",
            get(handlers::department_add_page).post(handlers::department_add),
        )
        .route(
            "/departments/edit/{id}",
            get(handlers::department_edit_page).post(handlers::department_edit),
        )
        .route("/departments/delete/{id}", post(handlers::department_delete))
        // Role management.
        .route("/roles", get(handlers::roles_page))
        .route(
            "/roles/add",
            get(handlers::role_add_page).post(handlers::role_add),
        )
        .route(
            "/roles/edit/{id}",
            get(handlers::role_edit_page).post(handlers::role_edit),
        )
        .route("/roles/delete/{id}", post(handlers::role_delete))
        // Employee oversight and assignment.
        .route("/employees", get(handlers::employees_page))
        .route(
            "/employees/assign/{id}",
            get(handlers::employee_assign_page).post(handlers::employee_assign),
        )
}
