//! PostgreSQL Repository Implementations
//!
//! Ledger writes that depend on the balance run inside [`PgLedgerTx`]:
//! one connection, a transaction-scoped advisory lock per user and a
//! bounded `lock_timeout`.

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::{PlanId, PromotionId, RechargeId, RoomId, UserId};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::application::config::PointsConfig;
use crate::domain::entities::{Plan, Promotion, PromotionRecord, Recharge};
use crate::domain::repository::{
    LedgerRepository, LedgerTransaction, PlanRepository, PromotionLedger,
};
use crate::domain::services::compute_balance;
use crate::domain::value_objects::{PointCount, PromotionStatus, RechargeAmount};
use crate::error::{PointsError, PointsResult};

/// PostgreSQL-backed ledger repository
#[derive(Clone)]
pub struct PgPointsRepository {
    pool: PgPool,
    lock_timeout: String,
}

impl PgPointsRepository {
    pub fn new(pool: PgPool, config: &PointsConfig) -> Self {
        Self {
            pool,
            lock_timeout: config.lock_timeout_setting(),
        }
    }
}

const PROMOTION_COLUMNS: &str = r#"
    p.promotion_id,
    p.user_id,
    p.room_id,
    p.plan_id,
    p.plan_name,
    p.points_spent,
    p.start_date,
    p.end_date,
    p.status,
    p.created_at,
    p.updated_at
"#;

async fn fetch_balance<'e, E>(executor: E, user_id: &UserId) -> PointsResult<i64>
where
    E: PgExecutor<'e>,
{
    let (recharged, spent): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COALESCE(SUM(points), 0)::BIGINT
               FROM point_recharges WHERE user_id = $1),
            (SELECT COALESCE(SUM(points_spent), 0)::BIGINT
               FROM room_promotions WHERE user_id = $1)
        "#,
    )
    .bind(user_id.as_uuid())
    .fetch_one(executor)
    .await?;

    Ok(compute_balance(recharged, spent))
}

async fn fetch_room_owner<'e, E>(executor: E, room_id: &RoomId) -> PointsResult<Option<UserId>>
where
    E: PgExecutor<'e>,
{
    let owner: Option<Uuid> = sqlx::query_scalar("SELECT owner_id FROM rooms WHERE room_id = $1")
        .bind(room_id.as_uuid())
        .fetch_optional(executor)
        .await?;

    Ok(owner.map(UserId::from_uuid))
}

// ============================================================================
// Ledger Repository Implementation
// ============================================================================

impl LedgerRepository for PgPointsRepository {
    async fn balance(&self, user_id: &UserId) -> PointsResult<i64> {
        fetch_balance(&self.pool, user_id).await
    }

    async fn create_recharge(&self, recharge: &Recharge) -> PointsResult<()> {
        sqlx::query(
            r#"
            INSERT INTO point_recharges (
                recharge_id,
                user_id,
                amount,
                points,
                recharged_at
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(recharge.id.as_uuid())
        .bind(recharge.user_id.as_uuid())
        .bind(recharge.amount.value())
        .bind(recharge.points.value())
        .bind(recharge.recharged_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // `point_recharges.user_id` references `users`.
            if matches!(&e, sqlx::Error::Database(db) if db.is_foreign_key_violation()) {
                PointsError::UserNotFound
            } else {
                PointsError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn recharges_for_user(&self, user_id: &UserId) -> PointsResult<Vec<Recharge>> {
        let rows = sqlx::query_as::<_, RechargeRow>(
            r#"
            SELECT recharge_id, user_id, amount, points, recharged_at
            FROM point_recharges
            WHERE user_id = $1
            ORDER BY recharged_at DESC, recharge_id
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RechargeRow::into_recharge).collect())
    }

    async fn promotions_for_user(&self, user_id: &UserId) -> PointsResult<Vec<PromotionRecord>> {
        let sql = format!(
            r#"
            SELECT {PROMOTION_COLUMNS}, r.name AS room_name
            FROM room_promotions p
            JOIN rooms r ON r.room_id = p.room_id
            WHERE p.user_id = $1
            ORDER BY p.start_date DESC, p.created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, PromotionRecordRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(PromotionRecordRow::into_record).collect()
    }

    async fn promotions_for_room(&self, room_id: &RoomId) -> PointsResult<Vec<PromotionRecord>> {
        let sql = format!(
            r#"
            SELECT {PROMOTION_COLUMNS}, r.name AS room_name
            FROM room_promotions p
            JOIN rooms r ON r.room_id = p.room_id
            WHERE p.room_id = $1
            ORDER BY p.start_date DESC, p.created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, PromotionRecordRow>(&sql)
            .bind(room_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(PromotionRecordRow::into_record).collect()
    }

    async fn room_owner(&self, room_id: &RoomId) -> PointsResult<Option<UserId>> {
        fetch_room_owner(&self.pool, room_id).await
    }
}

// ============================================================================
// Plan Repository Implementation
// ============================================================================

impl PlanRepository for PgPointsRepository {
    async fn list_plans(&self) -> PointsResult<Vec<Plan>> {
        let rows = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT plan_id, name, cost_points, duration_days
            FROM promotion_plans
            ORDER BY cost_points ASC, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PlanRow::into_plan).collect())
    }

    async fn find_plan(&self, plan_id: &PlanId) -> PointsResult<Option<Plan>> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT plan_id, name, cost_points, duration_days
            FROM promotion_plans
            WHERE plan_id = $1
            "#,
        )
        .bind(plan_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PlanRow::into_plan))
    }
}

// ============================================================================
// Ledger Transaction
// ============================================================================

/// An open ledger transaction. Dropping it rolls back.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

impl PromotionLedger for PgPointsRepository {
    type Tx = PgLedgerTx;

    async fn begin(&self) -> PointsResult<PgLedgerTx> {
        let mut tx = self.pool.begin().await?;

        // Local to this transaction; the pooled connection keeps its default.
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(&self.lock_timeout)
            .execute(&mut *tx)
            .await?;

        Ok(PgLedgerTx { tx })
    }
}

impl LedgerTransaction for PgLedgerTx {
    async fn lock_user(&mut self, user_id: &UserId) -> PointsResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(user_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn room_owner(&mut self, room_id: &RoomId) -> PointsResult<Option<UserId>> {
        fetch_room_owner(&mut *self.tx, room_id).await
    }

    async fn balance(&mut self, user_id: &UserId) -> PointsResult<i64> {
        fetch_balance(&mut *self.tx, user_id).await
    }

    async fn active_promotions(
        &mut self,
        user_id: &UserId,
        room_id: &RoomId,
    ) -> PointsResult<Vec<Promotion>> {
        let sql = format!(
            r#"
            SELECT {PROMOTION_COLUMNS}
            FROM room_promotions p
            WHERE p.user_id = $1 AND p.room_id = $2 AND p.status = 'active'
            ORDER BY p.created_at
            FOR UPDATE
            "#
        );
        let rows = sqlx::query_as::<_, PromotionRow>(&sql)
            .bind(user_id.as_uuid())
            .bind(room_id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter().map(PromotionRow::into_promotion).collect()
    }

    async fn promotion_for_update(
        &mut self,
        promotion_id: &PromotionId,
    ) -> PointsResult<Option<Promotion>> {
        let sql = format!(
            r#"
            SELECT {PROMOTION_COLUMNS}
            FROM room_promotions p
            WHERE p.promotion_id = $1
            FOR UPDATE
            "#
        );
        let row = sqlx::query_as::<_, PromotionRow>(&sql)
            .bind(promotion_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(PromotionRow::into_promotion).transpose()
    }

    async fn insert_promotion(&mut self, promotion: &Promotion) -> PointsResult<()> {
        sqlx::query(
            r#"
            INSERT INTO room_promotions (
                promotion_id,
                user_id,
                room_id,
                plan_id,
                plan_name,
                points_spent,
                start_date,
                end_date,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(promotion.id.as_uuid())
        .bind(promotion.user_id.as_uuid())
        .bind(promotion.room_id.as_uuid())
        .bind(promotion.plan_id.as_uuid())
        .bind(&promotion.plan_name)
        .bind(promotion.points_spent)
        .bind(promotion.start_date)
        .bind(promotion.end_date)
        .bind(promotion.status.as_str())
        .bind(promotion.created_at)
        .bind(promotion.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            // The partial unique index on active (user, room) pairs.
            if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                PointsError::two_active(promotion.user_id, promotion.room_id, &[promotion.id])
            } else {
                PointsError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn update_promotion(&mut self, promotion: &Promotion) -> PointsResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE room_promotions
            SET plan_id = $2,
                plan_name = $3,
                points_spent = $4,
                end_date = $5,
                status = $6,
                updated_at = $7
            WHERE promotion_id = $1
            "#,
        )
        .bind(promotion.id.as_uuid())
        .bind(promotion.plan_id.as_uuid())
        .bind(&promotion.plan_name)
        .bind(promotion.points_spent)
        .bind(promotion.end_date)
        .bind(promotion.status.as_str())
        .bind(promotion.updated_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PointsError::PromotionNotFound);
        }
        Ok(())
    }

    async fn commit(self) -> PointsResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct PlanRow {
    plan_id: Uuid,
    name: String,
    cost_points: i64,
    duration_days: i32,
}

impl PlanRow {
    fn into_plan(self) -> Plan {
        Plan {
            id: PlanId::from_uuid(self.plan_id),
            name: self.name,
            cost_points: self.cost_points,
            duration_days: self.duration_days,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RechargeRow {
    recharge_id: Uuid,
    user_id: Uuid,
    amount: Decimal,
    points: i64,
    recharged_at: DateTime<Utc>,
}

impl RechargeRow {
    fn into_recharge(self) -> Recharge {
        Recharge {
            id: RechargeId::from_uuid(self.recharge_id),
            user_id: UserId::from_uuid(self.user_id),
            amount: RechargeAmount::from_db(self.amount),
            points: PointCount::from_db(self.points),
            recharged_at: self.recharged_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PromotionRow {
    promotion_id: Uuid,
    user_id: Uuid,
    room_id: Uuid,
    plan_id: Uuid,
    plan_name: String,
    points_spent: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PromotionRow {
    fn into_promotion(self) -> PointsResult<Promotion> {
        let status = PromotionStatus::parse(&self.status).ok_or_else(|| {
            PointsError::Internal(format!("Unknown promotion status {:?}", self.status))
        })?;

        Ok(Promotion {
            id: PromotionId::from_uuid(self.promotion_id),
            user_id: UserId::from_uuid(self.user_id),
            room_id: RoomId::from_uuid(self.room_id),
            plan_id: PlanId::from_uuid(self.plan_id),
            plan_name: self.plan_name,
            points_spent: self.points_spent,
            start_date: self.start_date,
            end_date: self.end_date,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PromotionRecordRow {
    #[sqlx(flatten)]
    promotion: PromotionRow,
    room_name: String,
}

impl PromotionRecordRow {
    fn into_record(self) -> PointsResult<PromotionRecord> {
        Ok(PromotionRecord {
            promotion: self.promotion.into_promotion()?,
            room_name: self.room_name,
        })
    }
}
