use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use once_cell::sync::Lazy;
use thiserror::Error;
use uuid::Uuid;

use axum_extra::extract::cookie::CookieJar;

use crate::{
    config::AppConfig,
    models::{Employee, NewEmployee, RegisterForm},
    repository::{InsertError, Repository, RepositoryState},
    sessions::{Session, SessionState, SessionStore},
    validation::{self, FieldError, ValidationErrors},
};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Password hashing and verification.
///
/// Salted argon2 in PHC string format. Verification parses the stored PHC
/// string and runs the full argon2 comparison, which is constant-time with
/// respect to the submitted password.
pub mod password {
    use argon2::{Argon2, PasswordHasher, PasswordVerifier};
    use password_hash::{PasswordHash, SaltString};

    pub fn hash(password: &str) -> Result<String, password_hash::Error> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|_| password_hash::Error::Crypto)?;
        let salt = SaltString::encode_b64(&salt_bytes)?;
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string();
        Ok(phc)
    }

    pub fn verify(hash: &str, password: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

// Verified when a lookup misses, so unknown identifiers cost the same as a
// wrong password.
static UNKNOWN_IDENTIFIER_HASH: Lazy<String> =
    Lazy::new(|| password::hash("unknown-identifier").unwrap_or_default());

/// AuthError
///
/// Outcomes of a failed authentication attempt. An unknown email and a wrong
/// password collapse into the same `InvalidCredentials` value so the caller
/// cannot learn which accounts exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The identifier or password failed format validation. Reported per
    /// field, before any credential lookup happens.
    #[error("{error}")]
    InvalidFormat {
        field: &'static str,
        error: FieldError,
    },
    #[error("Invalid email or password")]
    InvalidCredentials,
}

/// Verifies the submitted credentials and, on success, issues a new session
/// bound to the resolved employee.
pub async fn authenticate(
    repo: &RepositoryState,
    sessions: &SessionState,
    config: &AppConfig,
    email: &str,
    password_input: &str,
) -> Result<(Session, Employee), AuthError> {
    let email = email.trim();

    if !validation::is_valid_email(email) {
        return Err(AuthError::InvalidFormat {
            field: "email",
            error: FieldError::InvalidEmail,
        });
    }
    if password_input.is_empty() {
        return Err(AuthError::InvalidFormat {
            field: "password",
            error: FieldError::Required,
        });
    }

    match repo.find_employee_by_email(email).await {
        Some(employee) if password::verify(&employee.password_hash, password_input) => {
            let session = sessions.create(employee.id, config.session_ttl()).await;
            Ok((session, employee))
        }
        Some(_) => Err(AuthError::InvalidCredentials),
        None => {
            password::verify(&UNKNOWN_IDENTIFIER_HASH, password_input);
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// RegisterError
///
/// `Invalid` carries the per-field errors for inline re-rendering;
/// `Internal` is the generic persistence failure, never retried here.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("validation failed")]
    Invalid(ValidationErrors),
    #[error("registration could not be completed")]
    Internal,
}

/// Self-service registration. Format validation first; uniqueness is
/// enforced by the store and mapped back onto the offending field.
pub async fn register(
    repo: &RepositoryState,
    form: &RegisterForm,
) -> Result<Employee, RegisterError> {
    let mut errors = validation::validate_registration(form);
    if !errors.is_empty() {
        return Err(RegisterError::Invalid(errors));
    }

    let password_hash = password::hash(&form.password).map_err(|e| {
        tracing::error!("password hashing failed: {:?}", e);
        RegisterError::Internal
    })?;

    let new = NewEmployee {
        username: form.username.trim().to_string(),
        email: form.email.trim().to_string(),
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        password_hash,
        is_admin: false,
    };

    match repo.create_employee(new).await {
        Ok(employee) => Ok(employee),
        Err(InsertError::DuplicateEmail) => {
            errors.push("email", FieldError::EmailInUse);
            Err(RegisterError::Invalid(errors))
        }
        Err(InsertError::DuplicateUsername) => {
            errors.push("username", FieldError::UsernameInUse);
            Err(RegisterError::Invalid(errors))
        }
        Err(InsertError::DuplicateName | InsertError::Database) => Err(RegisterError::Internal),
    }
}

/// Post-login destination. Pure function of the admin flag.
pub fn landing_for(employee: &Employee) -> &'static str {
    if employee.is_admin {
        "/admin/dashboard"
    } else {
        "/dashboard"
    }
}

/// A literal `302 Found` redirect, the status the browser flows rely on.
pub fn redirect_found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Rejection for unauthenticated access to a protected route: redirect to
/// the login entry point, carrying the originally requested path so the
/// login handler can forward the caller back afterwards.
#[derive(Debug)]
pub struct LoginRedirect {
    next: String,
}

impl LoginRedirect {
    pub fn new(next: &str) -> Self {
        Self {
            next: next.to_string(),
        }
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        redirect_found(&format!("/login?next={}", urlencoding::encode(&self.next)))
    }
}

/// CurrentEmployee
///
/// The resolved identity of one request/response exchange. Extracted from
/// the session cookie; the employee row is re-fetched on every request so a
/// deleted account invalidates its live sessions immediately.
///
/// Rejection: `302 Found` to `/login?next=<original path>`.
#[derive(Debug, Clone)]
pub struct CurrentEmployee(pub Employee);

impl<S> FromRequestParts<S> for CurrentEmployee
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    SessionState: FromRef<S>,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let sessions = SessionState::from_ref(state);

        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
            .ok_or_else(|| LoginRedirect::new(&next))?;

        let session = sessions
            .get(token)
            .await
            .ok_or_else(|| LoginRedirect::new(&next))?;

        let employee = repo
            .get_employee(session.employee_id)
            .await
            .ok_or_else(|| LoginRedirect::new(&next))?;

        Ok(CurrentEmployee(employee))
    }
}

/// Rejection for the admin tier: anonymous callers go to login, valid
/// non-admin identities are sent to the standard dashboard rather than
/// served a hard error.
#[derive(Debug)]
pub enum GuardRedirect {
    Login(LoginRedirect),
    Dashboard,
}

impl IntoResponse for GuardRedirect {
    fn into_response(self) -> Response {
        match self {
            GuardRedirect::Login(redirect) => redirect.into_response(),
            GuardRedirect::Dashboard => redirect_found("/dashboard"),
        }
    }
}

/// AdminEmployee
///
/// `CurrentEmployee` narrowed to identities with the admin flag set.
#[derive(Debug, Clone)]
pub struct AdminEmployee(pub Employee);

impl<S> FromRequestParts<S> for AdminEmployee
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    SessionState: FromRef<S>,
{
    type Rejection = GuardRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentEmployee(employee) = CurrentEmployee::from_request_parts(parts, state)
            .await
            .map_err(GuardRedirect::Login)?;

        if employee.is_admin {
            Ok(AdminEmployee(employee))
        } else {
            Err(GuardRedirect::Dashboard)
        }
    }
}
