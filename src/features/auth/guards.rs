//! Role-based authorization guards.
//!
//! Each guard extracts the `AuthenticatedUser` placed by the auth middleware
//! and rejects with 403 when the role does not match. Ownership rules (the
//! assigned driver, the event's reporter) are checked in the services, since
//! they depend on stored state.

use crate::core::error::AppError;
use crate::features::auth::model::{AuthenticatedUser, Role};
use axum::{extract::FromRequestParts, http::request::Parts};

fn require_roles(
    parts: &Parts,
    roles: &[Role],
    message: &str,
) -> Result<AuthenticatedUser, AppError> {
    let user = parts
        .extensions
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

    if !roles.contains(&user.role) {
        return Err(AppError::Forbidden(message.to_string()));
    }

    Ok(user.clone())
}

/// Admin-only access (event and partner management)
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_roles(parts, &[Role::Admin], "Admin access required").map(RequireAdmin)
    }
}

/// Driver-only access; accepting a delivery is not something an admin does on a driver's behalf
pub struct RequireDriver(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireDriver
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_roles(parts, &[Role::Driver], "Only drivers can accept deliveries")
            .map(RequireDriver)
    }
}

/// Reporter-only access (self-assignment to events)
pub struct RequireReporter(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireReporter
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_roles(
            parts,
            &[Role::Reporter],
            "Only reporters can assign themselves to events",
        )
        .map(RequireReporter)
    }
}

/// Driver or admin access (delivery status updates and cancellation)
pub struct RequireDriverOrAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireDriverOrAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_roles(parts, &[Role::Driver, Role::Admin], "Insufficient permissions")
            .map(RequireDriverOrAdmin)
    }
}

/// Reporter or admin access (recovery report filing and edits)
pub struct RequireReporterOrAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireReporterOrAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_roles(parts, &[Role::Reporter, Role::Admin], "Insufficient permissions")
            .map(RequireReporterOrAdmin)
    }
}

/// Partner or admin access (need level updates)
pub struct RequirePartnerOrAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequirePartnerOrAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_roles(parts, &[Role::Partner, Role::Admin], "Insufficient permissions")
            .map(RequirePartnerOrAdmin)
    }
}
