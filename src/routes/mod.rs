/// Router Module Index
///
/// The `/api` surface split by access level. Authentication is applied per
/// module with a `route_layer` in `create_router`, so a route's file decides
/// whether it needs a token.

/// Site content, form submission, contact requests and login. No token.
pub mod public;

/// Session endpoints for any signed-in account.
pub mod authenticated;

/// Content editing, inbox, media and settings under `/api/admin`. User
/// management inside it is further limited to `superadmin`.
pub mod admin;
