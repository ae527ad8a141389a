//! HTTP Handlers
//!
//! Every handler sits behind the bearer gate and receives the caller as
//! [`AuthenticatedUser`].

use auth::AuthenticatedUser;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use kernel::id::{RoomId, UserId};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    CancelPromotionUseCase, GetBalanceUseCase, GetHistoryUseCase, ListPlansUseCase,
    PromoteInput, PromoteRoomUseCase, RechargeInput, RechargeUseCase, RoomHistoryUseCase,
};
use crate::domain::repository::PointsStore;
use crate::domain::services::PromotionOutcome;
use crate::error::{PointsError, PointsResult};
use crate::presentation::dto::{
    BalanceResponse, CancelPromotionRequest, CancelPromotionResponse, HistoryResponse,
    PlanResponse, PlansResponse, PromoteRequest, PromoteResponse, PromotionResponse,
    RechargeEntry, RechargeRequest, RechargeResponse, RoomHistoryResponse, required,
};

/// Shared state for points handlers
pub struct PointsAppState<S>
where
    S: PointsStore,
{
    pub store: Arc<S>,
}

impl<S> Clone for PointsAppState<S>
where
    S: PointsStore,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

/// Malformed JSON is a validation error like any other.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> PointsResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| PointsError::Validation(rejection.body_text()))
}

fn path_id(path: Result<Path<Uuid>, PathRejection>) -> PointsResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|_| PointsError::Validation("Invalid identifier in path".to_string()))
}

// ============================================================================
// Recharges & balance
// ============================================================================

/// POST /api/puntos/recargar
pub async fn recharge<S>(
    State(state): State<PointsAppState<S>>,
    caller: AuthenticatedUser,
    payload: Result<Json<RechargeRequest>, JsonRejection>,
) -> PointsResult<(StatusCode, Json<RechargeResponse>)>
where
    S: PointsStore,
{
    let req = body(payload)?;
    let input = RechargeInput {
        user_id: required(req.user_id, "user_id")?,
        amount: required(req.amount, "amount")?,
        points: required(req.points, "points")?,
    };

    let use_case = RechargeUseCase::new(state.store.clone());
    let recharge = use_case.execute(&caller, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RechargeResponse {
            message: "Recharge completed".to_string(),
            recharge_id: recharge.id,
            recharge_timestamp: recharge.recharged_at,
        }),
    ))
}

/// GET /api/puntos/saldo/{userId}
pub async fn balance<S>(
    State(state): State<PointsAppState<S>>,
    caller: AuthenticatedUser,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> PointsResult<Json<BalanceResponse>>
where
    S: PointsStore,
{
    let user_id = UserId::from_uuid(path_id(user_id)?);

    let use_case = GetBalanceUseCase::new(state.store.clone());
    let points = use_case.execute(&caller, &user_id).await?;

    Ok(Json(BalanceResponse { user_id, points }))
}

/// GET /api/puntos/historial/{userId}
pub async fn history<S>(
    State(state): State<PointsAppState<S>>,
    caller: AuthenticatedUser,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> PointsResult<Json<HistoryResponse>>
where
    S: PointsStore,
{
    let user_id = UserId::from_uuid(path_id(user_id)?);

    let use_case = GetHistoryUseCase::new(state.store.clone());
    let history = use_case.execute(&caller, &user_id).await?;

    let now = Utc::now();
    Ok(Json(HistoryResponse {
        recharges: history.recharges.into_iter().map(RechargeEntry::from).collect(),
        promotions: history
            .promotions
            .into_iter()
            .map(|record| PromotionResponse::from_record(record, now))
            .collect(),
    }))
}

// ============================================================================
// Plans & promotions
// ============================================================================

/// GET /api/puntos/planes
pub async fn plans<S>(
    State(state): State<PointsAppState<S>>,
    _caller: AuthenticatedUser,
) -> PointsResult<Json<PlansResponse>>
where
    S: PointsStore,
{
    let use_case = ListPlansUseCase::new(state.store.clone());
    let plans = use_case.execute().await?;

    Ok(Json(PlansResponse {
        plans: plans.into_iter().map(PlanResponse::from).collect(),
    }))
}

/// POST /api/puntos/promocionar
///
/// 201 when a promotion is created, 200 when the active one is renewed.
pub async fn promote<S>(
    State(state): State<PointsAppState<S>>,
    caller: AuthenticatedUser,
    payload: Result<Json<PromoteRequest>, JsonRejection>,
) -> PointsResult<(StatusCode, Json<PromoteResponse>)>
where
    S: PointsStore,
{
    let req = body(payload)?;
    let input = PromoteInput {
        user_id: required(req.user_id, "user_id")?,
        room_id: required(req.room_id, "room_id")?,
        plan_id: required(req.plan_id, "plan_id")?,
    };

    let use_case = PromoteRoomUseCase::new(state.store.clone());
    let output = use_case.execute(&caller, input).await?;

    let (status, message) = match output.outcome {
        PromotionOutcome::Created => (StatusCode::CREATED, "Room promoted"),
        PromotionOutcome::Renewed => (StatusCode::OK, "Promotion renewed"),
    };

    Ok((
        status,
        Json(PromoteResponse {
            message: message.to_string(),
            outcome: output.outcome.as_str(),
            promotion: PromotionResponse::new(output.promotion, None, Utc::now()),
        }),
    ))
}

/// POST /api/puntos/cancelar-promocion
pub async fn cancel_promotion<S>(
    State(state): State<PointsAppState<S>>,
    caller: AuthenticatedUser,
    payload: Result<Json<CancelPromotionRequest>, JsonRejection>,
) -> PointsResult<Json<CancelPromotionResponse>>
where
    S: PointsStore,
{
    let req = body(payload)?;
    let promotion_id = required(req.promotion_id, "promotion_id")?;

    let use_case = CancelPromotionUseCase::new(state.store.clone());
    let promotion = use_case.execute(&caller, &promotion_id).await?;

    Ok(Json(CancelPromotionResponse {
        message: "Promotion cancelled".to_string(),
        promotion: PromotionResponse::new(promotion, None, Utc::now()),
    }))
}

/// GET /api/puntos/historial/cuarto/{roomId}
pub async fn room_history<S>(
    State(state): State<PointsAppState<S>>,
    caller: AuthenticatedUser,
    room_id: Result<Path<Uuid>, PathRejection>,
) -> PointsResult<Json<RoomHistoryResponse>>
where
    S: PointsStore,
{
    let room_id = RoomId::from_uuid(path_id(room_id)?);

    let use_case = RoomHistoryUseCase::new(state.store.clone());
    let records = use_case.execute(&caller, &room_id).await?;

    let now = Utc::now();
    Ok(Json(RoomHistoryResponse {
        history: records
            .into_iter()
            .map(|record| PromotionResponse::from_record(record, now))
            .collect(),
    }))
}
