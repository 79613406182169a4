// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::auth::{Role, Session},
};

/// A named set of roles allowed through a route.
pub trait RoleGate: Send + Sync + 'static {
    const ROLES: &'static [Role];
    /// Whether the employee's own role counts even while switched to another.
    const ACCEPTS_ACTUAL_ROLE: bool = false;
    const DENIED: &'static str;

    fn allows(session: &Session) -> bool {
        session.permits(Self::ROLES, Self::ACCEPTS_ACTUAL_ROLE)
    }
}

/// Extractor that rejects the request unless the session passes gate `T`.
pub struct RequireRole<T>(pub Session, pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleGate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AppError::InvalidToken)?;

        if !T::allows(&session) {
            return Err(AppError::Forbidden(T::DENIED.to_string()));
        }

        Ok(RequireRole(session, PhantomData))
    }
}

// ---
// Gates
// ---

pub struct ConnectGate;
impl RoleGate for ConnectGate {
    const ROLES: &'static [Role] = &[Role::Technician, Role::Employee, Role::ItSupport];
    const DENIED: &'static str = "You do not have permission to connect clients.";
}

pub struct DispatcherGate;
impl RoleGate for DispatcherGate {
    const ROLES: &'static [Role] = &[Role::Dispatcher];
    const DENIED: &'static str = "Only dispatchers can perform this action.";
}

pub struct EmployeeAdminGate;
impl RoleGate for EmployeeAdminGate {
    const ROLES: &'static [Role] = &[Role::Admin, Role::Manager];
    const DENIED: &'static str = "You do not have permission to manage employees.";
}

pub struct SettingsGate;
impl RoleGate for SettingsGate {
    const ROLES: &'static [Role] = &[Role::ItSupport, Role::Admin];
    const ACCEPTS_ACTUAL_ROLE: bool = true;
    const DENIED: &'static str = "You do not have permission to change settings.";
}

pub struct FinanceGate;
impl RoleGate for FinanceGate {
    const ROLES: &'static [Role] = &[Role::Accounts, Role::ItSupport, Role::Admin];
    const ACCEPTS_ACTUAL_ROLE: bool = true;
    const DENIED: &'static str = "You do not have permission to view finance.";
}

pub struct OversightGate;
impl RoleGate for OversightGate {
    const ROLES: &'static [Role] = &[Role::ItSupport, Role::Admin];
    const DENIED: &'static str = "You do not have permission to view this list.";
}

pub struct RouterListGate;
impl RoleGate for RouterListGate {
    const ROLES: &'static [Role] = &[Role::Dispatcher, Role::Accounts, Role::ItSupport, Role::Admin];
    const ACCEPTS_ACTUAL_ROLE: bool = true;
    const DENIED: &'static str = "You do not have permission to view this list.";
}

pub struct MyClientsGate;
impl RoleGate for MyClientsGate {
    const ROLES: &'static [Role] = &[Role::Technician, Role::Employee];
    const DENIED: &'static str = "Only technicians can view their connected clients.";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::fixtures::session;

    #[test]
    fn dispatcher_gate_uses_effective_role() {
        assert!(DispatcherGate::allows(&session(Role::Dispatcher, None)));
        assert!(!DispatcherGate::allows(&session(Role::Admin, None)));
        // IT Support acting as dispatcher passes; its own role is not enough.
        assert!(DispatcherGate::allows(&session(Role::ItSupport, Some(Role::Dispatcher))));
        assert!(!DispatcherGate::allows(&session(Role::ItSupport, None)));
    }

    #[test]
    fn settings_gate_keeps_it_support_in_while_switched() {
        assert!(SettingsGate::allows(&session(Role::ItSupport, Some(Role::Technician))));
        assert!(SettingsGate::allows(&session(Role::Admin, None)));
        assert!(!SettingsGate::allows(&session(Role::Manager, None)));
    }

    #[test]
    fn switched_role_is_ignored_for_non_it_support() {
        // Only IT Support may act under a switched role.
        assert!(!ConnectGate::allows(&session(Role::Accounts, Some(Role::Technician))));
        assert!(ConnectGate::allows(&session(Role::ItSupport, Some(Role::Technician))));
    }

    #[test]
    fn oversight_gate_follows_the_switch() {
        assert!(OversightGate::allows(&session(Role::ItSupport, None)));
        assert!(!OversightGate::allows(&session(Role::ItSupport, Some(Role::Technician))));
        assert!(RouterListGate::allows(&session(Role::ItSupport, Some(Role::Technician))));
        assert!(MyClientsGate::allows(&session(Role::Employee, None)));
        assert!(!MyClientsGate::allows(&session(Role::Dispatcher, None)));
    }
}
