//! HTTP Handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use kernel::id::UserId;
use platform::token::TokenService;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::application::{
    AuthenticatedUser, ChangePasswordInput, ChangePasswordUseCase, GetProfileUseCase,
    LoginUseCase, RegisterInput, RegisterUseCase, RequestPasswordRecoveryUseCase,
    UpdatePasswordInput, UpdatePasswordUseCase, UpdateRoleUseCase, VerifyEmailUseCase,
    VerifyRecoveryCodeUseCase,
};
use crate::domain::mailer::CodeMailer;
use crate::domain::repository::AuthStore;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ChangePasswordRequest, LoginRequest, MessageResponse, ProfileResponse, RecoverPasswordRequest,
    RegisterRequest, SignedInResponse, UpdatePasswordRequest, UpdateRoleRequest,
    UpdateRoleResponse, UserSummary, VerifyCodeRequest, VerifyCodeResponse, VerifyEmailRequest,
    required,
};

/// Shared state for auth handlers
pub struct AuthAppState<R, M>
where
    R: AuthStore,
    M: CodeMailer + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<TokenService>,
}

impl<R, M> Clone for AuthAppState<R, M>
where
    R: AuthStore,
    M: CodeMailer + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            mailer: self.mailer.clone(),
            config: self.config.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

/// Malformed JSON is a validation error like any other.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AuthResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AuthError::Validation(rejection.body_text()))
}

// ============================================================================
// Password recovery
// ============================================================================

/// POST /api/usuario/recover-password
pub async fn recover_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    payload: Result<Json<RecoverPasswordRequest>, JsonRejection>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthStore,
    M: CodeMailer + Sync + 'static,
{
    let req = body(payload)?;
    let email = required(req.email, "email")?;

    let use_case = RequestPasswordRecoveryUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    use_case.execute(email).await?;

    Ok(Json(MessageResponse::new("Recovery code sent to your email")))
}

/// POST /api/usuario/verify-code
pub async fn verify_code<R, M>(
    State(state): State<AuthAppState<R, M>>,
    payload: Result<Json<VerifyCodeRequest>, JsonRejection>,
) -> AuthResult<Json<VerifyCodeResponse>>
where
    R: AuthStore,
    M: CodeMailer + Sync + 'static,
{
    let req = body(payload)?;
    let email = required(req.email, "email")?;
    let code = required(req.code, "code")?;

    let use_case = VerifyRecoveryCodeUseCase::new(state.repo.clone());
    let user_id = use_case.execute(email, code).await?;

    Ok(Json(VerifyCodeResponse {
        message: "Code is valid".to_string(),
        user_id,
    }))
}

/// POST /api/usuario/change-password
pub async fn change_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthStore,
    M: CodeMailer + Sync + 'static,
{
    let req = body(payload)?;
    let input = ChangePasswordInput {
        email: required(req.email, "email")?,
        code: required(req.code, "code")?,
        new_password: required(req.new_password, "new_password")?,
    };

    let use_case =
        ChangePasswordUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());
    use_case.execute(input).await?;

    Ok(Json(MessageResponse::new("Password updated")))
}

// ============================================================================
// Registration
// ============================================================================

/// POST /api/usuario/register
pub async fn register<R, M>(
    State(state): State<AuthAppState<R, M>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthStore,
    M: CodeMailer + Sync + 'static,
{
    let req = body(payload)?;
    let input = RegisterInput {
        first_name: required(req.first_name, "first_name")?,
        paternal_surname: required(req.paternal_surname, "paternal_surname")?,
        maternal_surname: req.maternal_surname,
        email: required(req.email, "email")?,
        password: required(req.password, "password")?,
        role_id: req
            .role_id
            .ok_or_else(|| AuthError::Validation("role_id is required".to_string()))?,
    };

    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    use_case.execute(input).await?;

    Ok(Json(MessageResponse::new(
        "Verification code sent to your email",
    )))
}

/// POST /api/usuario/verify-email
pub async fn verify_email<R, M>(
    State(state): State<AuthAppState<R, M>>,
    payload: Result<Json<VerifyEmailRequest>, JsonRejection>,
) -> AuthResult<Json<SignedInResponse>>
where
    R: AuthStore,
    M: CodeMailer + Sync + 'static,
{
    let req = body(payload)?;
    let email = required(req.email, "email")?;
    let code = required(req.code, "code")?;

    let use_case =
        VerifyEmailUseCase::new(state.repo.clone(), state.repo.clone(), state.tokens.clone());
    let signed_in = use_case.execute(email, code).await?;

    Ok(Json(SignedInResponse::new("Account verified", &signed_in)))
}

// ============================================================================
// Login & profile
// ============================================================================

/// POST /api/usuario/login
pub async fn login<R, M>(
    State(state): State<AuthAppState<R, M>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult<Json<SignedInResponse>>
where
    R: AuthStore,
    M: CodeMailer + Sync + 'static,
{
    let req = body(payload)?;
    let email = required(req.email, "email")?;
    let password = required(req.password, "password")?;

    let use_case = LoginUseCase::new(state.repo.clone(), state.tokens.clone(), state.config.clone());
    let signed_in = use_case.execute(email, password).await?;

    Ok(Json(SignedInResponse::new("Login successful", &signed_in)))
}

/// GET /api/usuario/perfil
pub async fn profile<R, M>(
    State(state): State<AuthAppState<R, M>>,
    caller: AuthenticatedUser,
) -> AuthResult<Json<ProfileResponse>>
where
    R: AuthStore,
    M: CodeMailer + Sync + 'static,
{
    let use_case = GetProfileUseCase::new(state.repo.clone());
    let user = use_case.execute(&caller.user_id).await?;

    Ok(Json(ProfileResponse::from(user)))
}

// ============================================================================
// Account maintenance
// ============================================================================

/// PUT /api/usuario/change-password
pub async fn update_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    caller: AuthenticatedUser,
    payload: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthStore,
    M: CodeMailer + Sync + 'static,
{
    let req = body(payload)?;
    let input = UpdatePasswordInput {
        current_password: required(req.current_password, "current_password")?,
        new_password: required(req.new_password, "new_password")?,
    };

    let use_case = UpdatePasswordUseCase::new(state.repo.clone(), state.config.clone());
    use_case.execute(&caller.user_id, input).await?;

    Ok(Json(MessageResponse::new("Password updated")))
}

/// PUT /api/usuario/update-role/{user_id}
pub async fn update_role<R, M>(
    State(state): State<AuthAppState<R, M>>,
    caller: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> AuthResult<Json<UpdateRoleResponse>>
where
    R: AuthStore,
    M: CodeMailer + Sync + 'static,
{
    let Path(target) =
        path.map_err(|_| AuthError::Validation("Invalid identifier in path".to_string()))?;
    let req = body(payload)?;
    let role_id = req
        .role_id
        .ok_or_else(|| AuthError::Validation("role_id is required".to_string()))?;

    let use_case = UpdateRoleUseCase::new(state.repo.clone());
    let user = use_case
        .execute(&caller, &UserId::from_uuid(target), role_id)
        .await?;

    Ok(Json(UpdateRoleResponse {
        message: "Role updated".to_string(),
        user: UserSummary::from(&user),
    }))
}
