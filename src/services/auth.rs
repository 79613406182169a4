// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{EmployeeRepository, employee_repo::NewEmployee},
    models::auth::{
        AuthResponse, Claims, Employee, EmployeeStatus, Role, Session, SignupPayload,
        TokenResponse, UpdateProfilePayload,
    },
};

const TOKEN_LIFETIME_HOURS: i64 = 24;
const MAX_USERNAME_SUFFIX: u32 = 999;

/// Usernames tried for a signup, in order: the email's local part, then `local1..=local999`.
pub fn username_candidates(email: &str) -> impl Iterator<Item = String> {
    let base = email
        .split('@')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let suffixed = {
        let base = base.clone();
        (1..=MAX_USERNAME_SUFFIX).map(move |n| format!("{base}{n}"))
    };
    std::iter::once(base).chain(suffixed)
}

pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Password hashing task failed: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))??;
    Ok(valid)
}

/// Account status is reported before the password is checked.
async fn check_login(employee: &Employee, password: &str) -> Result<(), AppError> {
    ensure_active(employee)?;
    if !verify_password(password, &employee.password_hash).await? {
        return Err(AppError::InvalidCredentials);
    }
    Ok(())
}

fn ensure_active(employee: &Employee) -> Result<(), AppError> {
    match employee.status {
        EmployeeStatus::Active => Ok(()),
        EmployeeStatus::Pending => Err(AppError::AccountPending),
        EmployeeStatus::Suspended => Err(AppError::AccountSuspended),
    }
}

#[derive(Clone)]
pub struct AuthService {
    employee_repo: EmployeeRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(employee_repo: EmployeeRepository, jwt_secret: String, pool: PgPool) -> Self {
        Self {
            employee_repo,
            jwt_secret,
            pool,
        }
    }

    pub async fn signup(&self, payload: &SignupPayload) -> Result<Employee, AppError> {
        let email = payload.email.trim();
        let password_hash = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;

        if self.employee_repo.email_taken(&mut *tx, email, None).await? {
            return Err(AppError::EmailAlreadyExists);
        }

        let mut username = None;
        for candidate in username_candidates(email) {
            if !self.employee_repo.username_exists(&mut *tx, &candidate).await? {
                username = Some(candidate);
                break;
            }
        }
        let username = username.ok_or_else(|| {
            AppError::Conflict("Could not generate a unique username for this email.".to_string())
        })?;

        let employee = self
            .employee_repo
            .create(
                &mut *tx,
                NewEmployee {
                    username: &username,
                    password_hash: &password_hash,
                    full_name: payload.full_name.trim(),
                    email,
                    phone_number: payload.phone_number.trim(),
                    verification_code: &payload.verification_code,
                },
            )
            .await?;

        tx.commit().await?;
        tracing::info!("👤 New signup pending approval: {}", employee.username);
        Ok(employee)
    }

    pub async fn login(&self, verification_code: &str, password: &str) -> Result<AuthResponse, AppError> {
        let employee = self
            .employee_repo
            .find_by_verification_code(verification_code)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        check_login(&employee, password).await?;

        let token = self.create_token(employee.id, None)?;
        let effective_role = employee.role;
        Ok(AuthResponse {
            token,
            employee,
            effective_role,
        })
    }

    /// Decodes the token and reloads the employee; only Active accounts get a session.
    pub async fn validate_token(&self, token: &str) -> Result<Session, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let employee = self
            .employee_repo
            .find_by_id(&self.pool, token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;
        ensure_active(&employee)?;

        Ok(Session {
            employee,
            switched_role: token_data.claims.switched_role,
        })
    }

    pub fn switch_role(&self, session: &Session, role: Role) -> Result<TokenResponse, AppError> {
        self.ensure_can_switch(session)?;
        let token = self.create_token(session.employee.id, Some(role))?;
        tracing::info!("🔀 {} switched to role {}", session.employee.username, role);
        Ok(TokenResponse {
            token,
            effective_role: role,
        })
    }

    pub fn clear_role_switch(&self, session: &Session) -> Result<TokenResponse, AppError> {
        self.ensure_can_switch(session)?;
        let token = self.create_token(session.employee.id, None)?;
        Ok(TokenResponse {
            token,
            effective_role: session.actual_role(),
        })
    }

    fn ensure_can_switch(&self, session: &Session) -> Result<(), AppError> {
        if session.actual_role() != Role::ItSupport {
            return Err(AppError::Forbidden(
                "Only IT Support can switch roles.".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn update_profile(
        &self,
        session: &Session,
        payload: &UpdateProfilePayload,
    ) -> Result<Employee, AppError> {
        let me = &session.employee;
        let email = payload.email.trim();

        let password_hash = match payload.requested_password() {
            None => None,
            Some(new_password) => {
                let current = payload
                    .current_password
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| {
                        AppError::BadRequest(
                            "Current password is required to set a new password.".to_string(),
                        )
                    })?;
                if !verify_password(current, &me.password_hash).await? {
                    return Err(AppError::BadRequest("Current password is incorrect.".to_string()));
                }
                if new_password.chars().count() < 6 {
                    return Err(AppError::BadRequest(
                        "New password must be at least 6 characters long.".to_string(),
                    ));
                }
                if payload.confirm_password.as_deref() != Some(new_password) {
                    return Err(AppError::BadRequest("New passwords do not match.".to_string()));
                }
                Some(hash_password(new_password).await?)
            }
        };

        let phone = payload
            .phone_number
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let mut tx = self.pool.begin().await?;

        if self.employee_repo.email_taken(&mut *tx, email, Some(me.id)).await? {
            return Err(AppError::EmailAlreadyExists);
        }

        let updated = self
            .employee_repo
            .update_profile(
                &mut *tx,
                me.id,
                payload.full_name.trim(),
                email,
                phone,
                password_hash.as_deref(),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    fn create_token(&self, employee_id: Uuid, switched_role: Option<Role>) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(TOKEN_LIFETIME_HOURS);

        let claims = Claims {
            sub: employee_id,
            switched_role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::fixtures::session;

    fn service() -> AuthService {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AuthService::new(EmployeeRepository::new(pool.clone()), "test-secret".into(), pool)
    }

    #[test]
    fn username_candidates_lowercase_and_suffix() {
        let mut candidates = username_candidates("Jane.Doe@Example.com");
        assert_eq!(candidates.next().as_deref(), Some("jane.doe"));
        assert_eq!(candidates.next().as_deref(), Some("jane.doe1"));
        assert_eq!(username_candidates("a@b.co").last().as_deref(), Some("a999"));
        assert_eq!(username_candidates("a@b.co").count(), 1000);
    }

    #[tokio::test]
    async fn login_reports_status_before_password() {
        use crate::models::auth::{EmployeeStatus, fixtures::employee};

        let mut pending = employee(Role::Employee);
        pending.status = EmployeeStatus::Pending;
        pending.password_hash = bcrypt::hash("secret1", 4).unwrap();
        assert!(matches!(
            check_login(&pending, "wrong").await,
            Err(AppError::AccountPending)
        ));

        let mut suspended = pending.clone();
        suspended.status = EmployeeStatus::Suspended;
        assert!(matches!(
            check_login(&suspended, "wrong").await,
            Err(AppError::AccountSuspended)
        ));

        let mut active = pending;
        active.status = EmployeeStatus::Active;
        assert!(matches!(
            check_login(&active, "wrong").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(check_login(&active, "secret1").await.is_ok());
    }

    #[tokio::test]
    async fn only_it_support_may_switch() {
        let svc = service();
        let admin = session(Role::Admin, None);
        assert!(matches!(
            svc.switch_role(&admin, Role::Dispatcher),
            Err(AppError::Forbidden(_))
        ));

        let it = session(Role::ItSupport, None);
        let response = svc.switch_role(&it, Role::Dispatcher).unwrap();
        assert_eq!(response.effective_role, Role::Dispatcher);

        let cleared = svc.clear_role_switch(&it).unwrap();
        assert_eq!(cleared.effective_role, Role::ItSupport);
    }

    #[tokio::test]
    async fn issued_tokens_carry_the_switched_role() {
        let svc = service();
        let id = Uuid::new_v4();
        let token = svc.create_token(id, Some(Role::Technician)).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, id);
        assert_eq!(data.claims.switched_role, Some(Role::Technician));
        assert_eq!(data.claims.exp - data.claims.iat, 24 * 3600);
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected_before_any_query() {
        let svc = service();
        assert!(matches!(
            svc.validate_token("not-a-jwt").await,
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn bcrypt_round_trip() {
        let hashed = hash_password("secret1").await.unwrap();
        assert!(verify_password("secret1", &hashed).await.unwrap());
        assert!(!verify_password("secret2", &hashed).await.unwrap());
    }
}
