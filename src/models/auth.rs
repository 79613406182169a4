// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{
    validate_email, validate_not_blank, validate_phone, validate_profile_phone,
    validate_verification_code,
};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "employee_role")]
pub enum Role {
    Admin,
    Manager,
    Dispatcher,
    Technician,
    Accounts,
    #[serde(rename = "IT Support")]
    #[sqlx(rename = "IT Support")]
    ItSupport,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Dispatcher => "Dispatcher",
            Role::Technician => "Technician",
            Role::Accounts => "Accounts",
            Role::ItSupport => "IT Support",
            Role::Employee => "Employee",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "employee_status")]
pub enum EmployeeStatus {
    Active,
    Pending,
    Suspended,
}

// --- Rows ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    #[schema(example = "jane")]
    pub username: String,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,

    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[schema(example = "jane@rushtach.com")]
    pub email: String,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub status: EmployeeStatus,
    pub role: Role,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeWithAssets {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub employee: Employee,
    #[schema(example = 3)]
    pub asset_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSearchHit {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub role: Role,
}

// --- Session ---

/// Request-scoped identity resolved by the auth guard.
#[derive(Debug, Clone)]
pub struct Session {
    pub employee: Employee,
    pub switched_role: Option<Role>,
}

impl Session {
    pub fn actual_role(&self) -> Role {
        self.employee.role
    }

    /// Only IT Support may act under a switched role.
    pub fn effective_role(&self) -> Role {
        match (self.employee.role, self.switched_role) {
            (Role::ItSupport, Some(switched)) => switched,
            (actual, _) => actual,
        }
    }

    pub fn permits(&self, allowed: &[Role], include_actual_role: bool) -> bool {
        allowed.contains(&self.effective_role())
            || (include_actual_role && allowed.contains(&self.actual_role()))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub employee: Employee,
    pub effective_role: Role,
    pub switched_role: Option<Role>,
}

impl From<Session> for SessionInfo {
    fn from(session: Session) -> Self {
        let effective_role = session.effective_role();
        Self {
            employee: session.employee,
            effective_role,
            switched_role: session.switched_role,
        }
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    #[validate(custom(function = "validate_verification_code"))]
    #[schema(example = "000000")]
    pub verification_code: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupPayload {
    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[validate(custom(function = "validate_phone"))]
    #[schema(example = "+256 700 123456")]
    pub phone_number: String,
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[validate(custom(function = "validate_verification_code"))]
    pub verification_code: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub full_name: String,
    #[validate(contains(pattern = "@", message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_profile_phone"))]
    pub phone_number: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

impl UpdateProfilePayload {
    /// A blank `newPassword` means "keep the current one".
    pub fn requested_password(&self) -> Option<&str> {
        self.new_password.as_deref().filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRolePayload {
    pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeePayload {
    pub status: EmployeeStatus,
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub employee: Employee,
    pub effective_role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub effective_role: Role,
}

// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switched_role: Option<Role>,
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn employee(role: Role) -> Employee {
        let now = Utc::now();
        Employee {
            id: Uuid::new_v4(),
            username: "jane".into(),
            password_hash: "x".into(),
            full_name: "Jane Doe".into(),
            email: "jane@rushtach.com".into(),
            phone_number: None,
            profile_picture: None,
            status: EmployeeStatus::Active,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn session(role: Role, switched_role: Option<Role>) -> Session {
        Session {
            employee: employee(role),
            switched_role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::session;
    use super::*;

    #[test]
    fn only_it_support_switches_effective_role() {
        assert_eq!(session(Role::ItSupport, Some(Role::Dispatcher)).effective_role(), Role::Dispatcher);
        assert_eq!(session(Role::ItSupport, None).effective_role(), Role::ItSupport);
        assert_eq!(session(Role::Admin, Some(Role::Dispatcher)).effective_role(), Role::Admin);
    }

    #[test]
    fn permits_can_fall_back_to_actual_role() {
        let s = session(Role::ItSupport, Some(Role::Technician));
        assert!(!s.permits(&[Role::ItSupport, Role::Admin], false));
        assert!(s.permits(&[Role::ItSupport, Role::Admin], true));
        assert!(s.permits(&[Role::Technician], false));
    }

    #[test]
    fn roles_use_display_names_on_the_wire() {
        assert_eq!(serde_json::to_string(&Role::ItSupport).unwrap(), "\"IT Support\"");
        let parsed: Role = serde_json::from_str("\"Dispatcher\"").unwrap();
        assert_eq!(parsed, Role::Dispatcher);
        assert!(serde_json::from_str::<Role>("\"Wizard\"").is_err());
    }

    #[test]
    fn signup_payload_checks_passwords_and_formats() {
        let payload = SignupPayload {
            full_name: "Jane".into(),
            phone_number: "0700 123456".into(),
            email: "jane@example.com".into(),
            verification_code: "123456".into(),
            password: "secret1".into(),
            confirm_password: "secret2".into(),
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("confirm_password"));

        let ok = SignupPayload {
            confirm_password: "secret1".into(),
            ..payload
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn profile_blank_new_password_is_ignored() {
        let payload = UpdateProfilePayload {
            full_name: "Jane".into(),
            email: "jane@x.io".into(),
            phone_number: None,
            current_password: None,
            new_password: Some(String::new()),
            confirm_password: None,
        };
        assert_eq!(payload.requested_password(), None);
    }
}
