//! Server-rendered page bodies. Every dynamic value is escaped before
//! interpolation; the `alert` / `help-block` classes and the element ids are
//! the hooks the browser-driven checks look for.

use crate::{
    models::{AdminDashboardStats, Department, Employee, LoginForm, RegisterForm, Role},
    validation::ValidationErrors,
};

/// Minimal HTML escaping for text and attribute positions.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Which navigation block the page shows.
pub enum Nav<'a> {
    Anonymous,
    SignedIn(&'a Employee),
}

fn nav_links(nav: &Nav) -> String {
    match nav {
        Nav::Anonymous => concat!(
            r#"<a href="/">Home</a> "#,
            r#"<a id="register_link" href="/register">Register</a> "#,
            r#"<a id="login_link" href="/login">Login</a>"#,
        )
        .to_string(),
        Nav::SignedIn(employee) => {
            let mut links = String::from(r#"<a href="/">Home</a> <a href="/dashboard">Dashboard</a> "#);
            if employee.is_admin {
                links.push_str(concat!(
                    r#"<a href="/admin/dashboard">Admin</a> "#,
                    r#"<a href="/admin/employees">Employees</a> "#,
                    r#"<a href="/admin/departments">Departments</a> "#,
                    r#"<a href="/admin/roles">Roles</a> "#,
                ));
            }
            links.push_str(r#"<a id="logout_link" href="/logout">Logout</a>"#);
            links
        }
    }
}

fn layout(title: &str, nav: Nav, flash: Option<&str>, body: &str) -> String {
    let flash_block = flash
        .map(|msg| format!(r#"<div class="alert">{}</div>"#, escape(msg)))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title} - Dream Team</title></head>\n\
         <body>\n<nav>{nav}</nav>\n{flash_block}\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        title = escape(title),
        nav = nav_links(&nav),
    )
}

/// One labelled input plus its field error, if any.
fn field(
    label: &str,
    name: &str,
    kind: &str,
    value: &str,
    errors: &ValidationErrors,
) -> String {
    let error = errors
        .field(name)
        .map(|e| format!(r#"<span class="help-block">{}</span>"#, escape(&e.to_string())))
        .unwrap_or_default();
    format!(
        r#"<div class="form-group"><label for="{name}">{label}</label> <input type="{kind}" id="{name}" name="{name}" value="{value}">{error}</div>"#,
        label = escape(label),
        value = escape(value),
    )
}

pub fn home() -> String {
    layout(
        "Home",
        Nav::Anonymous,
        None,
        "<h1>Project Dream Team</h1>\n<p>The employee management portal.</p>",
    )
}

pub fn login_page(
    form: &LoginForm,
    errors: &ValidationErrors,
    flash: Option<&str>,
    next: Option<&str>,
) -> String {
    let action = match next {
        Some(next) => format!("/login?next={}", urlencoding::encode(next)),
        None => "/login".to_string(),
    };
    let body = format!
    (
        "<h1>Login</h1>\n<form method=\"post\" action=\"{action}\">\n{email}\n{password}\n\
         <button type=\"submit\" id=\"submit\">Login</button>\n</form>",
        action = escape(&action),
        email = field("Email", "email", "text", &form.email, errors),
        password = field("Password", "password", "password", "", errors),
    );
    layout("Login", Nav::Anonymous, flash, &body)
}

pub fn register_page(form: &RegisterForm, errors: &ValidationErrors) -> String {
    let body = format!(
        "<h1>Register</h1>\n<form method=\"post\" action=\"/register\">\n\
         {email}\n{username}\n{first_name}\n{last_name}\n{password}\n{confirm}\n\
         <button type=\"submit\" id=\"submit\">Register</button>\n</form>",
        email = field("Email", "email", "text", &form.email, errors),
        username = field("Username", "username", "text", &form.username, errors),
        first_name = field("First Name", "first_name", "text", &form.first_name, errors),
        last_name = field("Last Name", "last_name", "text", &form.last_name, errors),
        password = field("Password", "password", "password", "", errors),
        confirm = field(
            "Confirm Password",
            "confirm_password",
            "password",
            "",
            errors
        ),
    );
    layout("Register", Nav::Anonymous, None, &body)
}

pub fn dashboard(employee: &Employee) -> String {
    let body = format!(
        r#"<h1 id="username_greeting">Hi, {}!</h1>
<p>Welcome to your dashboard.</p>"#,
        escape(&employee.username)
    );
    layout("Dashboard", Nav::SignedIn(employee), None, &body)
}

pub fn admin_dashboard(employee: &Employee, stats: &AdminDashboardStats) -> String {
    let body = format!(
        r#"<h1 id="username_greeting">Hi, {}!</h1>
<p>Admin overview.</p>
<ul>
<li>Employees: {}</li>
<li>Departments: {}</li>
<li>Roles: {}</li>
</ul>"#,
        escape(&employee.username),
        stats.total_employees,
        stats.total_departments,
        stats.total_roles,
    );
    layout("Admin Dashboard", Nav::SignedIn(employee), None, &body)
}

fn org_table(kind: &str, rows: &[(String, String, String)]) -> String {
    // (id, name, description) per row
    let mut table = String::from("<table>\n<tr><th>Name</th><th>Description</th><th></th></tr>\n");
    for (id, name, description) in rows {
        table.push_str(&format!(
            "<tr><td>{name}</td><td>{description}</td>\
             <td><a href=\"/admin/{kind}/edit/{id}\">Edit</a> \
             <form method=\"post\" action=\"/admin/{kind}/delete/{id}\" style=\"display:inline\">\
             <button type=\"submit\">Delete</button></form></td></tr>\n",
            name = escape(name),
            description = escape(description),
        ));
    }
    table.push_str("</table>");
    table
}

pub fn departments_page(admin: &Employee, departments: &[Department]) -> String {
    let rows: Vec<_> = departments
        .iter()
        .map(|d| (d.id.to_string(), d.name.clone(), d.description.clone()))
        .collect();
    let body = format!(
        "<h1>Departments</h1>\n{}\n<a href=\"/admin/departments/add\">Add Department</a>",
        org_table("departments", &rows)
    );
    layout("Departments", Nav::SignedIn(admin), None, &body)
}

pub fn roles_page(admin: &Employee, roles: &[Role]) -> String {
    let rows: Vec<_> = roles
        .iter()
        .map(|r| (r.id.to_string(), r.name.clone(), r.description.clone()))
        .collect();
    let body = format!(
        "<h1>Roles</h1>\n{}\n<a href=\"/admin/roles/add\">Add Role</a>",
        org_table("roles", &rows)
    );
    layout("Roles", Nav::SignedIn(admin), None, &body)
}

/// Add/edit form shared by departments and roles.
pub fn org_form_page(
    admin: &Employee,
    heading: &str,
    action: &str,
    name: &str,
    description: &str,
    errors: &ValidationErrors,
) -> String {
    let body = format!(
        "<h1>{heading}</h1>\n<form method=\"post\" action=\"{action}\">\n{name}\n{description}\n\
         <button type=\"submit\" id=\"submit\">Save</button>\n</form>",
        heading = escape(heading),
        action = escape(action),
        name = field("Name", "name", "text", name, errors),
        description = field("Description", "description", "text", description, errors),
    );
    layout(heading, Nav::SignedIn(admin), None, &body)
}

pub fn employees_page(
    admin: &Employee,
    employees: &[Employee],
    departments: &[Department],
    roles: &[Role],
) -> String {
    let department_name = |id: Option<uuid::Uuid>| {
        id.and_then(|id| departments.iter().find(|d| d.id == id))
            .map(|d| d.name.clone())
            .unwrap_or_else(|| "-".to_string())
    };
    let role_name = |id: Option<uuid::Uuid>| {
        id.and_then(|id| roles.iter().find(|r| r.id == id))
            .map(|r| r.name.clone())
            .unwrap_or_else(|| "-".to_string())
    };

    let mut table = String::from(
        "<table>\n<tr><th>Username</th><th>Name</th><th>Department</th><th>Role</th><th></th></tr>\n",
    );
    for employee in employees {
        table.push_str(&format!(
            "<tr><td>{username}</td><td>{first} {last}</td><td>{department}</td><td>{role}</td>\
             <td><a href=\"/admin/employees/assign/{id}\">Assign</a></td></tr>\n",
            username = escape(&employee.username),
            first = escape(&employee.first_name),
            last = escape(&employee.last_name),
            department = escape(&department_name(employee.department_id)),
            role = escape(&role_name(employee.role_id)),
            id = employee.id,
        ));
    }
    table.push_str("</table>");

    let body = format!("<h1>Employees</h1>\n{table}");
    layout("Employees", Nav::SignedIn(admin), None, &body)
}

fn select(
    name: &str,
    options: &[(String, String)],
    selected: Option<&str>,
) -> String {
    let mut select = format!(r#"<select id="{name}" name="{name}"><option value="">-</option>"#);
    for (value, label) in options {
        let marker = if selected == Some(value.as_str()) {
            " selected"
        } else {
            ""
        };
        select.push_str(&format!(
            r#"<option value="{}"{marker}>{}</option>"#,
            escape(value),
            escape(label),
        ));
    }
    select.push_str("</select>");
    select
}

pub fn assign_page(
    admin: &Employee,
    employee: &Employee,
    departments: &[Department],
    roles: &[Role],
) -> String {
    let department_options: Vec<_> = departments
        .iter()
        .map(|d| (d.id.to_string(), d.name.clone()))
        .collect();
    let role_options: Vec<_> = roles
        .iter()
        .map(|r| (r.id.to_string(), r.name.clone()))
        .collect();
    let selected_department = employee.department_id.map(|id| id.to_string());
    let selected_role = employee.role_id.map(|id| id.to_string());

    let body = format!(
        "<h1>Assign {username}</h1>\n\
         <form method=\"post\" action=\"/admin/employees/assign/{id}\">\n\
         <div class=\"form-group\"><label for=\"department_id\">Department</label> {departments}</div>\n\
         <div class=\"form-group\"><label for=\"role_id\">Role</label> {roles}</div>\n\
         <button type=\"submit\" id=\"submit\">Save</button>\n</form>",
        username = escape(&employee.username),
        id = employee.id,
        departments = select(
            "department_id",
            &department_options,
            selected_department.as_deref()
        ),
        roles = select("role_id", &role_options, selected_role.as_deref()),
    );
    layout("Assign Employee", Nav::SignedIn(admin), None, &body)
}
