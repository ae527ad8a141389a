//! PostgreSQL Repository Implementations
//!
//! Recovery codes live on the user row; registration codes live with
//! their pending registration, so no account exists before verification.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    pending_registration::PendingRegistration,
    user::User,
    verification_code::{EmailRegistration, PasswordRecovery, VerificationCode},
};
use crate::domain::repository::{UserRepository, VerificationCodeRepository};
use crate::domain::value_object::{
    email::Email, one_time_code::OneTimeCode, person_name::PersonName,
    user_password::UserPassword, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                first_name,
                paternal_surname,
                maternal_surname,
                email,
                password_hash,
                role_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.first_name.as_str())
        .bind(user.paternal_surname.as_str())
        .bind(user.maternal_surname.as_ref().map(PersonName::as_str))
        .bind(user.email.as_str())
        .bind(user.password.as_phc_string())
        .bind(user.role.id())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::EmailTaken
            } else {
                AuthError::Database(e)
            }
        })?;

        // Partners get their listing profile in the same transaction.
        if user.role == UserRole::Partner {
            sqlx::query("INSERT INTO partners (user_id, created_at) VALUES ($1, $2)")
                .bind(user.user_id.as_uuid())
                .bind(user.created_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                first_name,
                paternal_surname,
                maternal_surname,
                email,
                password_hash,
                role_id,
                created_at,
                updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                first_name,
                paternal_surname,
                maternal_surname,
                email,
                password_hash,
                role_id,
                created_at,
                updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn update_password(&self, user_id: &UserId, password: &UserPassword) -> AuthResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                password_hash = $2,
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(password.as_phc_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }

    async fn update_role(&self, user_id: &UserId, role: UserRole) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE users SET
                role_id = $2,
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role.id())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(false);
        }

        // The partner profile follows the role.
        if role == UserRole::Partner {
            sqlx::query(
                "INSERT INTO partners (user_id, created_at) VALUES ($1, now()) ON CONFLICT (user_id) DO NOTHING",
            )
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query("DELETE FROM partners WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(true)
    }
}

// ============================================================================
// Password recovery codes (on the user row)
// ============================================================================

impl VerificationCodeRepository<PasswordRecovery> for PgAuthRepository {
    async fn store(&self, code: &VerificationCode<PasswordRecovery>) -> AuthResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                recovery_code = $2,
                recovery_code_expires_at = $3,
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(code.subject.as_uuid())
        .bind(code.code.as_str())
        .bind(code.expires_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }

    async fn find(&self, owner: &Email) -> AuthResult<Option<VerificationCode<PasswordRecovery>>> {
        let row = sqlx::query_as::<_, RecoveryCodeRow>(
            r#"
            SELECT
                user_id,
                email,
                recovery_code,
                recovery_code_expires_at
            FROM users
            WHERE email = $1
              AND recovery_code IS NOT NULL
              AND recovery_code_expires_at IS NOT NULL
            "#,
        )
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RecoveryCodeRow::into_code))
    }

    async fn consume(&self, owner: &Email, code: &OneTimeCode) -> AuthResult<bool> {
        let cleared = sqlx::query(
            r#"
            UPDATE users SET
                recovery_code = NULL,
                recovery_code_expires_at = NULL,
                updated_at = now()
            WHERE email = $1 AND recovery_code = $2
            "#,
        )
        .bind(owner.as_str())
        .bind(code.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(cleared > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let cleared = sqlx::query(
            r#"
            UPDATE users SET
                recovery_code = NULL,
                recovery_code_expires_at = NULL
            WHERE recovery_code_expires_at < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(cleared)
    }
}

// ============================================================================
// Registration codes (with the pending registration)
// ============================================================================

impl VerificationCodeRepository<EmailRegistration> for PgAuthRepository {
    /// Upsert keyed by email: a new registration replaces any earlier
    /// pending one for the same address.
    async fn store(&self, code: &VerificationCode<EmailRegistration>) -> AuthResult<()> {
        let pending = &code.subject;
        sqlx::query(
            r#"
            INSERT INTO pending_registrations (
                email,
                first_name,
                paternal_surname,
                maternal_surname,
                password_hash,
                role_id,
                code,
                expires_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
            ON CONFLICT (email) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                paternal_surname = EXCLUDED.paternal_surname,
                maternal_surname = EXCLUDED.maternal_surname,
                password_hash = EXCLUDED.password_hash,
                role_id = EXCLUDED.role_id,
                code = EXCLUDED.code,
                expires_at = EXCLUDED.expires_at,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(code.owner.as_str())
        .bind(pending.first_name.as_str())
        .bind(pending.paternal_surname.as_str())
        .bind(pending.maternal_surname.as_ref().map(PersonName::as_str))
        .bind(pending.password.as_phc_string())
        .bind(pending.role.id())
        .bind(code.code.as_str())
        .bind(code.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, owner: &Email) -> AuthResult<Option<VerificationCode<EmailRegistration>>> {
        let row = sqlx::query_as::<_, PendingRegistrationRow>(
            r#"
            SELECT
                email,
                first_name,
                paternal_surname,
                maternal_surname,
                password_hash,
                role_id,
                code,
                expires_at
            FROM pending_registrations
            WHERE email = $1
            "#,
        )
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_code()).transpose()
    }

    async fn consume(&self, owner: &Email, code: &OneTimeCode) -> AuthResult<bool> {
        let deleted = sqlx::query("DELETE FROM pending_registrations WHERE email = $1 AND code = $2")
            .bind(owner.as_str())
            .bind(code.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM pending_registrations WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    first_name: String,
    paternal_surname: String,
    maternal_surname: Option<String>,
    email: String,
    password_hash: String,
    role_id: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let role = UserRole::from_id(self.role_id)
            .ok_or_else(|| AuthError::Internal(format!("Unknown role_id {}", self.role_id)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            first_name: PersonName::from_db(self.first_name),
            paternal_surname: PersonName::from_db(self.paternal_surname),
            maternal_surname: self.maternal_surname.map(PersonName::from_db),
            email: Email::from_db(self.email),
            password: UserPassword::from_phc_string(self.password_hash)?,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RecoveryCodeRow {
    user_id: Uuid,
    email: String,
    recovery_code: String,
    recovery_code_expires_at: DateTime<Utc>,
}

impl RecoveryCodeRow {
    fn into_code(self) -> VerificationCode<PasswordRecovery> {
        VerificationCode {
            owner: Email::from_db(self.email),
            subject: UserId::from_uuid(self.user_id),
            code: OneTimeCode::from_db(self.recovery_code),
            expires_at: self.recovery_code_expires_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PendingRegistrationRow {
    email: String,
    first_name: String,
    paternal_surname: String,
    maternal_surname: Option<String>,
    password_hash: String,
    role_id: i16,
    code: String,
    expires_at: DateTime<Utc>,
}

impl PendingRegistrationRow {
    fn into_code(self) -> AuthResult<VerificationCode<EmailRegistration>> {
        let role = UserRole::from_id(self.role_id)
            .ok_or_else(|| AuthError::Internal(format!("Unknown role_id {}", self.role_id)))?;
        let email = Email::from_db(self.email);

        Ok(VerificationCode {
            owner: email.clone(),
            subject: PendingRegistration {
                first_name: PersonName::from_db(self.first_name),
                paternal_surname: PersonName::from_db(self.paternal_surname),
                maternal_surname: self.maternal_surname.map(PersonName::from_db),
                email,
                password: UserPassword::from_phc_string(self.password_hash)?,
                role,
            },
            code: OneTimeCode::from_db(self.code),
            expires_at: self.expires_at,
        })
    }
}
