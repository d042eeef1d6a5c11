/// Router Module Index
///
/// Routing is segregated by access tier so the guard layers are applied
/// per module rather than per handler. A request only reaches a handler
/// after the tier's guard has approved it.
// Routes accessible to any client, anonymous included.
pub mod public;

// Routes behind the session guard. Requires a live session cookie.
pub mod authenticated;

// Routes restricted to identities with the admin flag set.
pub mod admin;
