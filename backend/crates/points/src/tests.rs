//! Unit tests for points crate
//!
//! Use cases and routes run against an in-memory ledger whose
//! transactions stage their writes and publish them only on commit.

#[cfg(test)]
mod support {
    use auth::AuthenticatedUser;
    use auth::UserRole;
    use auth::domain::value_object::email::Email;
    use chrono::Utc;
    use kernel::id::{PlanId, PromotionId, RoomId, UserId};
    use rust_decimal::Decimal;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{Mutex, OwnedMutexGuard};

    use crate::domain::entities::{Plan, Promotion, PromotionRecord, Recharge};
    use crate::domain::repository::{
        LedgerRepository, LedgerTransaction, PlanRepository, PromotionLedger,
    };
    use crate::domain::services::compute_balance;
    use crate::domain::value_objects::{PointCount, RechargeAmount};
    use crate::error::{PointsError, PointsResult};

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct LedgerState {
        pub recharges: Vec<Recharge>,
        pub promotions: Vec<Promotion>,
        pub rooms: HashMap<RoomId, (UserId, String)>,
        pub plans: Vec<Plan>,
        pub users: HashSet<UserId>,
    }

    impl LedgerState {
        fn balance(&self, user_id: &UserId) -> i64 {
            let recharged = self
                .recharges
                .iter()
                .filter(|r| &r.user_id == user_id)
                .map(|r| r.points.value())
                .sum();
            let spent = self
                .promotions
                .iter()
                .filter(|p| &p.user_id == user_id)
                .map(|p| p.points_spent)
                .sum();
            compute_balance(recharged, spent)
        }

        fn records<F>(&self, keep: F) -> Vec<PromotionRecord>
        where
            F: Fn(&Promotion) -> bool,
        {
            let mut records: Vec<PromotionRecord> = self
                .promotions
                .iter()
                .filter(|p| keep(p))
                .map(|p| PromotionRecord {
                    promotion: p.clone(),
                    room_name: self
                        .rooms
                        .get(&p.room_id)
                        .map(|(_, name)| name.clone())
                        .unwrap_or_default(),
                })
                .collect();
            records.sort_by(|a, b| {
                (b.promotion.start_date, b.promotion.created_at)
                    .cmp(&(a.promotion.start_date, a.promotion.created_at))
            });
            records
        }
    }

    /// Cloning shares the same state.
    #[derive(Clone, Default)]
    pub struct MemoryLedger {
        pub state: Arc<Mutex<LedgerState>>,
        user_locks: Arc<Mutex<HashMap<UserId, Arc<Mutex<()>>>>>,
    }

    impl MemoryLedger {
        pub async fn snapshot(&self) -> LedgerState {
            self.state.lock().await.clone()
        }

        /// A user the ledger will accept recharges for.
        pub async fn add_user(&self) -> UserId {
            let user_id = UserId::new();
            self.state.lock().await.users.insert(user_id);
            user_id
        }

        pub async fn add_room(&self, owner: UserId, name: &str) -> RoomId {
            let room_id = RoomId::new();
            let mut state = self.state.lock().await;
            state.users.insert(owner);
            state.rooms.insert(room_id, (owner, name.to_string()));
            room_id
        }

        pub async fn add_plan(&self, name: &str, cost_points: i64, duration_days: i32) -> Plan {
            let plan = Plan {
                id: PlanId::new(),
                name: name.to_string(),
                cost_points,
                duration_days,
            };
            self.state.lock().await.plans.push(plan.clone());
            plan
        }

        pub async fn credit(&self, user_id: UserId, points: i64) {
            let recharge = Recharge::new(
                user_id,
                RechargeAmount::new(Decimal::new(points, 1)).unwrap(),
                PointCount::new(points).unwrap(),
                Utc::now(),
            );
            let mut state = self.state.lock().await;
            state.users.insert(user_id);
            state.recharges.push(recharge);
        }

        pub async fn insert_raw(&self, promotion: Promotion) {
            self.state.lock().await.promotions.push(promotion);
        }

        async fn user_lock(&self, user_id: &UserId) -> Arc<Mutex<()>> {
            self.user_locks
                .lock()
                .await
                .entry(*user_id)
                .or_default()
                .clone()
        }
    }

    impl LedgerRepository for MemoryLedger {
        async fn balance(&self, user_id: &UserId) -> PointsResult<i64> {
            Ok(self.state.lock().await.balance(user_id))
        }

        async fn create_recharge(&self, recharge: &Recharge) -> PointsResult<()> {
            let mut state = self.state.lock().await;
            // Mirrors the foreign key on `point_recharges.user_id`.
            if !state.users.contains(&recharge.user_id) {
                return Err(PointsError::UserNotFound);
            }
            state.recharges.push(recharge.clone());
            Ok(())
        }

        async fn recharges_for_user(&self, user_id: &UserId) -> PointsResult<Vec<Recharge>> {
            let mut recharges: Vec<Recharge> = self
                .state
                .lock()
                .await
                .recharges
                .iter()
                .filter(|r| &r.user_id == user_id)
                .cloned()
                .collect();
            recharges.sort_by(|a, b| b.recharged_at.cmp(&a.recharged_at));
            Ok(recharges)
        }

        async fn promotions_for_user(&self, user_id: &UserId) -> PointsResult<Vec<PromotionRecord>> {
            Ok(self.state.lock().await.records(|p| &p.user_id == user_id))
        }

        async fn promotions_for_room(&self, room_id: &RoomId) -> PointsResult<Vec<PromotionRecord>> {
            Ok(self.state.lock().await.records(|p| &p.room_id == room_id))
        }

        async fn room_owner(&self, room_id: &RoomId) -> PointsResult<Option<UserId>> {
            Ok(self.state.lock().await.rooms.get(room_id).map(|(owner, _)| *owner))
        }
    }

    impl PlanRepository for MemoryLedger {
        async fn list_plans(&self) -> PointsResult<Vec<Plan>> {
            let mut plans = self.state.lock().await.plans.clone();
            plans.sort_by_key(|p| p.cost_points);
            Ok(plans)
        }

        async fn find_plan(&self, plan_id: &PlanId) -> PointsResult<Option<Plan>> {
            Ok(self
                .state
                .lock()
                .await
                .plans
                .iter()
                .find(|p| &p.id == plan_id)
                .cloned())
        }
    }

    /// Reads see committed state plus this transaction's own writes, like
    /// read committed. Only [`LedgerTransaction::lock_user`] serializes
    /// transactions; the guards are released on commit or drop.
    pub struct MemoryTx {
        ledger: MemoryLedger,
        user_guards: Vec<OwnedMutexGuard<()>>,
        staged: Vec<Promotion>,
    }

    impl MemoryTx {
        /// Committed promotions with staged writes laid over them.
        async fn promotions(&self) -> Vec<Promotion> {
            let mut promotions = self.ledger.state.lock().await.promotions.clone();
            for write in &self.staged {
                match promotions.iter_mut().find(|p| p.id == write.id) {
                    Some(slot) => *slot = write.clone(),
                    None => promotions.push(write.clone()),
                }
            }
            promotions
        }

        fn stage(&mut self, promotion: &Promotion) {
            match self.staged.iter_mut().find(|p| p.id == promotion.id) {
                Some(slot) => *slot = promotion.clone(),
                None => self.staged.push(promotion.clone()),
            }
        }
    }

    impl PromotionLedger for MemoryLedger {
        type Tx = MemoryTx;

        async fn begin(&self) -> PointsResult<MemoryTx> {
            Ok(MemoryTx {
                ledger: self.clone(),
                user_guards: Vec::new(),
                staged: Vec::new(),
            })
        }
    }

    impl LedgerTransaction for MemoryTx {
        async fn lock_user(&mut self, user_id: &UserId) -> PointsResult<()> {
            let lock = self.ledger.user_lock(user_id).await;
            self.user_guards.push(lock.lock_owned().await);
            Ok(())
        }

        async fn room_owner(&mut self, room_id: &RoomId) -> PointsResult<Option<UserId>> {
            Ok(self
                .ledger
                .state
                .lock()
                .await
                .rooms
                .get(room_id)
                .map(|(owner, _)| *owner))
        }

        async fn balance(&mut self, user_id: &UserId) -> PointsResult<i64> {
            let recharged: i64 = self
                .ledger
                .state
                .lock()
                .await
                .recharges
                .iter()
                .filter(|r| &r.user_id == user_id)
                .map(|r| r.points.value())
                .sum();
            let spent: i64 = self
                .promotions()
                .await
                .iter()
                .filter(|p| &p.user_id == user_id)
                .map(|p| p.points_spent)
                .sum();
            // Widen the window between reading the balance and writing, so
            // unserialized transactions would overlap.
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(compute_balance(recharged, spent))
        }

        async fn active_promotions(
            &mut self,
            user_id: &UserId,
            room_id: &RoomId,
        ) -> PointsResult<Vec<Promotion>> {
            Ok(self
                .promotions()
                .await
                .into_iter()
                .filter(|p| &p.user_id == user_id && &p.room_id == room_id && p.status.is_active())
                .collect())
        }

        async fn promotion_for_update(
            &mut self,
            promotion_id: &PromotionId,
        ) -> PointsResult<Option<Promotion>> {
            Ok(self
                .promotions()
                .await
                .into_iter()
                .find(|p| &p.id == promotion_id))
        }

        async fn insert_promotion(&mut self, promotion: &Promotion) -> PointsResult<()> {
            self.stage(promotion);
            Ok(())
        }

        async fn update_promotion(&mut self, promotion: &Promotion) -> PointsResult<()> {
            if !self.promotions().await.iter().any(|p| p.id == promotion.id) {
                return Err(PointsError::PromotionNotFound);
            }
            self.stage(promotion);
            Ok(())
        }

        async fn commit(self) -> PointsResult<()> {
            let mut state = self.ledger.state.lock().await;
            for write in self.staged {
                match state.promotions.iter_mut().find(|p| p.id == write.id) {
                    Some(slot) => *slot = write,
                    None => state.promotions.push(write),
                }
            }
            Ok(())
        }
    }

    pub fn actor(user_id: UserId, role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id,
            email: Email::new(format!("u{}@example.com", user_id.as_uuid().simple())).unwrap(),
            role,
        }
    }

    pub fn tenant(user_id: UserId) -> AuthenticatedUser {
        actor(user_id, UserRole::Tenant)
    }

    pub fn admin() -> AuthenticatedUser {
        actor(UserId::new(), UserRole::Admin)
    }
}

#[cfg(test)]
mod use_case_tests {
    use super::support::*;
    use chrono::{Days, Utc};
    use kernel::id::{PlanId, PromotionId, RoomId, UserId};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    use crate::application::{
        CancelPromotionUseCase, GetBalanceUseCase, GetHistoryUseCase, ListPlansUseCase,
        PromoteInput, PromoteRoomUseCase, RechargeInput, RechargeUseCase, RoomHistoryUseCase,
    };
    use crate::domain::entities::{Plan, Promotion};
    use crate::domain::services::PromotionOutcome;
    use crate::domain::value_objects::PromotionStatus;
    use crate::error::PointsError;

    struct Harness {
        ledger: Arc<MemoryLedger>,
        user: UserId,
        room: RoomId,
    }

    impl Harness {
        async fn new() -> Self {
            let ledger = Arc::new(MemoryLedger::default());
            let user = UserId::new();
            let room = ledger.add_room(user, "Cuarto Miraflores").await;
            Self { ledger, user, room }
        }

        async fn balance(&self) -> i64 {
            GetBalanceUseCase::new(self.ledger.clone())
                .execute(&tenant(self.user), &self.user)
                .await
                .unwrap()
        }

        async fn promote(&self, plan: &Plan) -> Result<crate::application::PromoteOutput, PointsError> {
            self.promote_room(self.room, plan.id).await
        }

        async fn promote_room(
            &self,
            room: RoomId,
            plan_id: PlanId,
        ) -> Result<crate::application::PromoteOutput, PointsError> {
            PromoteRoomUseCase::new(self.ledger.clone())
                .execute(
                    &tenant(self.user),
                    PromoteInput {
                        user_id: self.user,
                        room_id: room,
                        plan_id,
                    },
                )
                .await
        }
    }

    #[tokio::test]
    async fn test_balance_of_unknown_user_is_zero() {
        let h = Harness::new().await;
        assert_eq!(h.balance().await, 0);
    }

    #[tokio::test]
    async fn test_recharge_validation() {
        let h = Harness::new().await;
        let use_case = RechargeUseCase::new(h.ledger.clone());
        let input = |amount: Decimal, points: i64| RechargeInput {
            user_id: h.user,
            amount,
            points,
        };

        let recharge = use_case
            .execute(&tenant(h.user), input(Decimal::new(5000, 2), 500))
            .await
            .unwrap();
        assert_eq!(recharge.points.value(), 500);
        assert_eq!(h.balance().await, 500);

        for bad in [
            input(Decimal::ZERO, 100),
            input(Decimal::new(10, 0), 0),
            input(Decimal::new(10, 0), -5),
            input(Decimal::new(1005, 3), 10),
        ] {
            assert!(matches!(
                use_case.execute(&tenant(h.user), bad).await,
                Err(PointsError::Validation(_))
            ));
        }
        assert_eq!(h.ledger.snapshot().await.recharges.len(), 1);
    }

    #[tokio::test]
    async fn test_recharge_for_someone_else_needs_admin() {
        let h = Harness::new().await;
        let use_case = RechargeUseCase::new(h.ledger.clone());
        let input = RechargeInput {
            user_id: h.user,
            amount: Decimal::new(10, 0),
            points: 100,
        };

        assert!(matches!(
            use_case.execute(&tenant(UserId::new()), input.clone()).await,
            Err(PointsError::Forbidden)
        ));
        use_case.execute(&admin(), input).await.unwrap();
        assert_eq!(h.balance().await, 100);
    }

    /// Recharge 1000, buy 400, renew with 500, then 200 is unaffordable.
    #[tokio::test]
    async fn test_recharge_promote_renew_then_run_out() {
        let h = Harness::new().await;
        let basic = h.ledger.add_plan("Básico", 400, 7).await;
        let premium = h.ledger.add_plan("Premium", 500, 30).await;
        let small = h.ledger.add_plan("Mini", 200, 3).await;
        h.ledger.credit(h.user, 1000).await;

        let first = h.promote(&basic).await.unwrap();
        assert_eq!(first.outcome, PromotionOutcome::Created);
        assert_eq!(first.promotion.points_spent, 400);
        assert_eq!(h.balance().await, 600);

        let renewed = h.promote(&premium).await.unwrap();
        assert_eq!(renewed.outcome, PromotionOutcome::Renewed);
        assert_eq!(renewed.promotion.id, first.promotion.id);
        assert_eq!(renewed.promotion.points_spent, 900);
        assert_eq!(renewed.promotion.plan_name, "Premium");
        assert_eq!(
            renewed.promotion.end_date,
            first.promotion.end_date.checked_add_days(Days::new(30)).unwrap()
        );
        assert_eq!(h.balance().await, 100);

        let before = h.ledger.snapshot().await;
        assert!(matches!(
            h.promote(&small).await,
            Err(PointsError::InsufficientPoints {
                balance: 100,
                required: 200
            })
        ));
        assert_eq!(h.ledger.snapshot().await, before);
        assert_eq!(h.balance().await, 100);
    }

    /// 1000 recharged and 400 already spent elsewhere. A 500-point, 7-day
    /// plan on a fresh room is created, leaving 100; 200 more on that room
    /// is rejected and nothing changes.
    #[tokio::test]
    async fn test_create_on_second_room_then_run_out() {
        let h = Harness::new().await;
        let earlier = h.ledger.add_plan("Estándar", 400, 15).await;
        let weekly = h.ledger.add_plan("Semanal", 500, 7).await;
        let small = h.ledger.add_plan("Mini", 200, 3).await;
        let second_room = h.ledger.add_room(h.user, "Cuarto Barranco").await;

        RechargeUseCase::new(h.ledger.clone())
            .execute(
                &tenant(h.user),
                RechargeInput {
                    user_id: h.user,
                    amount: Decimal::new(10_000, 2),
                    points: 1000,
                },
            )
            .await
            .unwrap();
        h.promote(&earlier).await.unwrap();
        assert_eq!(h.balance().await, 600);

        let created = h.promote_room(second_room, weekly.id).await.unwrap();
        assert_eq!(created.outcome, PromotionOutcome::Created);
        assert_eq!(created.promotion.room_id, second_room);
        assert_eq!(created.promotion.points_spent, 500);
        assert_eq!(
            created.promotion.end_date,
            created.promotion.start_date.checked_add_days(Days::new(7)).unwrap()
        );
        assert_eq!(h.balance().await, 100);

        let before = h.ledger.snapshot().await;
        let err = h.promote_room(second_room, small.id).await.unwrap_err();
        assert!(matches!(
            err,
            PointsError::InsufficientPoints {
                balance: 100,
                required: 200
            }
        ));
        assert_eq!(err.status_code().as_u16(), 400);
        assert_eq!(h.ledger.snapshot().await, before);
        assert_eq!(h.balance().await, 100);
    }

    #[tokio::test]
    async fn test_recharge_for_unknown_user_is_not_found() {
        let h = Harness::new().await;
        let err = RechargeUseCase::new(h.ledger.clone())
            .execute(
                &admin(),
                RechargeInput {
                    user_id: UserId::new(),
                    amount: Decimal::new(10, 0),
                    points: 100,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PointsError::UserNotFound));
        assert_eq!(err.status_code().as_u16(), 404);
        assert!(h.ledger.snapshot().await.recharges.is_empty());
    }

    #[tokio::test]
    async fn test_promote_checks_plan_room_and_owner() {
        let h = Harness::new().await;
        let plan = h.ledger.add_plan("Básico", 100, 7).await;
        h.ledger.credit(h.user, 500).await;

        assert!(matches!(
            h.promote_room(h.room, PlanId::new()).await,
            Err(PointsError::PlanNotFound)
        ));
        assert!(matches!(
            h.promote_room(RoomId::new(), plan.id).await,
            Err(PointsError::RoomNotFound)
        ));

        let foreign_room = h.ledger.add_room(UserId::new(), "Ajeno").await;
        assert!(matches!(
            h.promote_room(foreign_room, plan.id).await,
            Err(PointsError::Forbidden)
        ));
        assert_eq!(h.balance().await, 500);
    }

    #[tokio::test]
    async fn test_promote_for_someone_else_is_forbidden() {
        let h = Harness::new().await;
        let plan = h.ledger.add_plan("Básico", 100, 7).await;
        h.ledger.credit(h.user, 500).await;

        let result = PromoteRoomUseCase::new(h.ledger.clone())
            .execute(
                &tenant(UserId::new()),
                PromoteInput {
                    user_id: h.user,
                    room_id: h.room,
                    plan_id: plan.id,
                },
            )
            .await;
        assert!(matches!(result, Err(PointsError::Forbidden)));
    }

    #[tokio::test]
    async fn test_two_active_promotions_is_invariant_violation() {
        let h = Harness::new().await;
        let plan = h.ledger.add_plan("Básico", 100, 7).await;
        h.ledger.credit(h.user, 1000).await;
        let now = Utc::now();
        h.ledger.insert_raw(Promotion::activate(h.user, h.room, &plan, now)).await;
        h.ledger.insert_raw(Promotion::activate(h.user, h.room, &plan, now)).await;

        let before = h.ledger.snapshot().await;
        let err = h.promote(&plan).await.unwrap_err();
        assert!(matches!(err, PointsError::InvariantViolation { .. }));
        assert_eq!(err.status_code().as_u16(), 500);
        assert_eq!(h.ledger.snapshot().await, before);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_promotions_never_overspend() {
        let h = Harness::new().await;
        let plan = h.ledger.add_plan("Estándar", 400, 15).await;
        h.ledger.credit(h.user, 1000).await;

        let mut rooms = Vec::new();
        for i in 0..5 {
            rooms.push(h.ledger.add_room(h.user, &format!("Cuarto {i}")).await);
        }

        let use_case = Arc::new(PromoteRoomUseCase::new(h.ledger.clone()));
        let caller = tenant(h.user);
        let mut tasks = Vec::new();
        for room in rooms {
            let use_case = use_case.clone();
            let caller = caller.clone();
            let input = PromoteInput {
                user_id: h.user,
                room_id: room,
                plan_id: plan.id,
            };
            tasks.push(tokio::spawn(async move {
                use_case.execute(&caller, input).await
            }));
        }

        let mut created = 0;
        let mut rejected = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(PointsError::InsufficientPoints { .. }) => rejected += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(created, 2);
        assert_eq!(rejected, 3);
        assert_eq!(h.balance().await, 200);
    }

    #[tokio::test]
    async fn test_cancel_then_cancel_again() {
        let h = Harness::new().await;
        let plan = h.ledger.add_plan("Básico", 100, 7).await;
        h.ledger.credit(h.user, 300).await;
        let promo = h.promote(&plan).await.unwrap().promotion;

        let use_case = CancelPromotionUseCase::new(h.ledger.clone());
        let cancelled = use_case.execute(&tenant(h.user), &promo.id).await.unwrap();
        assert_eq!(cancelled.status, PromotionStatus::Finalized);
        assert_eq!(cancelled.end_date, Utc::now().date_naive());
        assert_eq!(cancelled.remaining_days(Utc::now()), 0);
        // No refund.
        assert_eq!(h.balance().await, 200);

        assert!(matches!(
            use_case.execute(&tenant(h.user), &promo.id).await,
            Err(PointsError::AlreadyFinalized)
        ));

        // A finalized promotion no longer counts as active: buying again creates.
        let again = h.promote(&plan).await.unwrap();
        assert_eq!(again.outcome, PromotionOutcome::Created);
        assert_ne!(again.promotion.id, promo.id);
    }

    #[tokio::test]
    async fn test_cancel_unknown_and_foreign() {
        let h = Harness::new().await;
        let plan = h.ledger.add_plan("Básico", 100, 7).await;
        h.ledger.credit(h.user, 300).await;
        let promo = h.promote(&plan).await.unwrap().promotion;
        let use_case = CancelPromotionUseCase::new(h.ledger.clone());

        assert!(matches!(
            use_case.execute(&tenant(h.user), &PromotionId::new()).await,
            Err(PointsError::PromotionNotFound)
        ));
        assert!(matches!(
            use_case.execute(&tenant(UserId::new()), &promo.id).await,
            Err(PointsError::Forbidden)
        ));
        let cancelled = use_case.execute(&admin(), &promo.id).await.unwrap();
        assert_eq!(cancelled.status, PromotionStatus::Finalized);
    }

    #[tokio::test]
    async fn test_history_is_newest_first_with_room_names() {
        let h = Harness::new().await;
        let plan = h.ledger.add_plan("Básico", 100, 7).await;
        let other_room = h.ledger.add_room(h.user, "Cuarto Barranco").await;
        h.ledger.credit(h.user, 100).await;
        h.ledger.credit(h.user, 200).await;

        h.promote(&plan).await.unwrap();
        h.promote_room(other_room, plan.id).await.unwrap();

        let history = GetHistoryUseCase::new(h.ledger.clone())
            .execute(&tenant(h.user), &h.user)
            .await
            .unwrap();

        assert_eq!(history.recharges.len(), 2);
        assert!(history.recharges[0].recharged_at >= history.recharges[1].recharged_at);
        assert_eq!(history.promotions.len(), 2);
        // Same start date; the later purchase comes first.
        assert_eq!(history.promotions[0].room_name, "Cuarto Barranco");
        assert_eq!(history.promotions[1].room_name, "Cuarto Miraflores");

        assert!(matches!(
            GetHistoryUseCase::new(h.ledger.clone())
                .execute(&tenant(UserId::new()), &h.user)
                .await,
            Err(PointsError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_room_history_access() {
        let h = Harness::new().await;
        let plan = h.ledger.add_plan("Básico", 100, 7).await;
        h.ledger.credit(h.user, 100).await;
        h.promote(&plan).await.unwrap();
        let use_case = RoomHistoryUseCase::new(h.ledger.clone());

        let records = use_case.execute(&tenant(h.user), &h.room).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].promotion.remaining_days(Utc::now()), 7);

        assert!(matches!(
            use_case.execute(&tenant(h.user), &RoomId::new()).await,
            Err(PointsError::RoomNotFound)
        ));
        assert!(matches!(
            use_case.execute(&tenant(UserId::new()), &h.room).await,
            Err(PointsError::Forbidden)
        ));
        assert_eq!(use_case.execute(&admin(), &h.room).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_plans_cheapest_first() {
        let h = Harness::new().await;
        h.ledger.add_plan("Premium", 450, 30).await;
        h.ledger.add_plan("Básico", 100, 7).await;
        h.ledger.add_plan("Estándar", 250, 15).await;

        let plans = ListPlansUseCase::new(h.ledger.clone()).execute().await.unwrap();
        let names: Vec<_> = plans.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Básico", "Estándar", "Premium"]);
    }
}

#[cfg(test)]
mod router_tests {
    use super::support::*;
    use auth::{BearerGate, UserRole};
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use kernel::id::{RoomId, UserId};
    use platform::token::TokenService;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::presentation::router::points_router_generic;

    struct App {
        router: Router,
        ledger: MemoryLedger,
        tokens: Arc<TokenService>,
    }

    impl App {
        fn new() -> Self {
            let tokens = Arc::new(auth::AuthConfig::development().token_service());
            let ledger = MemoryLedger::default();
            let router = points_router_generic(ledger.clone(), BearerGate::new(tokens.clone()));
            Self {
                router,
                ledger,
                tokens,
            }
        }

        fn bearer(&self, user_id: UserId, role: UserRole) -> String {
            let issued = self
                .tokens
                .issue(*user_id.as_uuid(), "socio@example.com", role.id())
                .unwrap();
            format!("Bearer {}", issued.token)
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = if bytes.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, body)
        }
    }

    fn get(uri: &str, auth: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, auth)
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, auth: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, auth)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_routes_require_a_token() {
        let app = App::new();
        let request = Request::builder().uri("/planes").body(Body::empty()).unwrap();
        let (status, _) = app.send(request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.send(get("/planes", "Bearer not-a-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_plans_listing() {
        let app = App::new();
        app.ledger.add_plan("Premium", 450, 30).await;
        app.ledger.add_plan("Básico", 100, 7).await;
        let auth = app.bearer(UserId::new(), UserRole::Tenant);

        let (status, body) = app.send(get("/planes", &auth)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plans"][0]["name"], "Básico");
        assert_eq!(body["plans"][1]["cost_points"], 450);
    }

    #[tokio::test]
    async fn test_recharge_over_http() {
        let app = App::new();
        let user = app.ledger.add_user().await;
        let auth = app.bearer(user, UserRole::Tenant);

        let (status, body) = app
            .send(post_json(
                "/recargar",
                &auth,
                serde_json::json!({ "user_id": user, "amount": 100 }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "points is required");

        let (status, body) = app
            .send(post_json(
                "/recargar",
                &auth,
                serde_json::json!({ "user_id": user, "amount": "100.00", "points": 1000 }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["recharge_timestamp"].is_string());

        let (status, body) = app.send(get(&format!("/saldo/{user}"), &auth)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["points"], 1000);
    }

    #[tokio::test]
    async fn test_admin_recharge_for_unknown_user() {
        let app = App::new();
        let auth = app.bearer(UserId::new(), UserRole::Admin);

        let (status, body) = app
            .send(post_json(
                "/recargar",
                &auth,
                serde_json::json!({ "user_id": UserId::new(), "amount": 10, "points": 100 }),
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "User not found");
    }

    #[tokio::test]
    async fn test_bad_input_is_bad_request() {
        let app = App::new();
        let auth = app.bearer(UserId::new(), UserRole::Tenant);

        let request = Request::builder()
            .method("POST")
            .uri("/recargar")
            .header(header::AUTHORIZATION, &auth)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.send(get("/saldo/not-a-uuid", &auth)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_other_users_balance_needs_admin() {
        let app = App::new();
        let owner = UserId::new();
        app.ledger.credit(owner, 50).await;

        let stranger = app.bearer(UserId::new(), UserRole::Partner);
        let (status, _) = app.send(get(&format!("/saldo/{owner}"), &stranger)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let admin = app.bearer(UserId::new(), UserRole::Admin);
        let (status, body) = app.send(get(&format!("/saldo/{owner}"), &admin)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["points"], 50);
    }

    #[tokio::test]
    async fn test_promote_renew_cancel_over_http() {
        let app = App::new();
        let user = UserId::new();
        let room = app.ledger.add_room(user, "Cuarto Surco").await;
        let plan = app.ledger.add_plan("Básico", 100, 7).await;
        app.ledger.credit(user, 250).await;
        let auth = app.bearer(user, UserRole::Partner);
        let promote = serde_json::json!({ "user_id": user, "room_id": room, "plan_id": plan.id });

        let (status, body) = app.send(post_json("/promocionar", &auth, promote.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["outcome"], "created");
        assert_eq!(body["promotion"]["status"], "active");
        assert_eq!(body["promotion"]["remaining_days"], 7);
        let promotion_id = body["promotion"]["id"].clone();

        let (status, body) = app.send(post_json("/promocionar", &auth, promote.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "renewed");
        assert_eq!(body["promotion"]["points_spent"], 200);

        let (status, body) = app.send(post_json("/promocionar", &auth, promote)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);

        let cancel = serde_json::json!({ "promotion_id": promotion_id });
        let (status, body) = app
            .send(post_json("/cancelar-promocion", &auth, cancel.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["promotion"]["status"], "finalized");
        assert_eq!(body["promotion"]["remaining_days"], 0);

        let (status, _) = app.send(post_json("/cancelar-promocion", &auth, cancel)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app.send(get(&format!("/historial/{user}"), &auth)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recharges"].as_array().unwrap().len(), 1);
        assert_eq!(body["promotions"][0]["room_name"], "Cuarto Surco");

        let (status, body) = app
            .send(get(&format!("/historial/cuarto/{room}"), &auth))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["history"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_room_history_errors() {
        let app = App::new();
        let owner = UserId::new();
        let room = app.ledger.add_room(owner, "Cuarto Lince").await;
        let stranger = app.bearer(UserId::new(), UserRole::Tenant);

        let (status, _) = app
            .send(get(&format!("/historial/cuarto/{}", RoomId::new()), &stranger))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .send(get(&format!("/historial/cuarto/{room}"), &stranger))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

#[cfg(test)]
mod error_tests {
    use crate::error::PointsError;
    use kernel::id::{RoomId, UserId};

    #[test]
    fn test_error_status_codes() {
        assert_eq!(PointsError::Validation("x".into()).status_code().as_u16(), 400);
        assert_eq!(PointsError::UserNotFound.status_code().as_u16(), 404);
        assert_eq!(PointsError::PlanNotFound.status_code().as_u16(), 404);
        assert_eq!(PointsError::RoomNotFound.status_code().as_u16(), 404);
        assert_eq!(PointsError::PromotionNotFound.status_code().as_u16(), 404);
        assert_eq!(
            PointsError::InsufficientPoints {
                balance: 1,
                required: 2
            }
            .status_code()
            .as_u16(),
            400
        );
        assert_eq!(PointsError::AlreadyFinalized.status_code().as_u16(), 400);
        assert_eq!(PointsError::Forbidden.status_code().as_u16(), 403);
        assert_eq!(PointsError::Internal("x".into()).status_code().as_u16(), 500);
    }

    #[test]
    fn test_store_errors_split_by_retriability() {
        assert_eq!(
            PointsError::Database(sqlx::Error::PoolTimedOut)
                .status_code()
                .as_u16(),
            503
        );
        assert_eq!(
            PointsError::Database(sqlx::Error::RowNotFound)
                .status_code()
                .as_u16(),
            500
        );
    }

    #[test]
    fn test_invariant_details_stay_internal() {
        let err = PointsError::two_active(UserId::new(), RoomId::new(), &[]);
        let app = err.to_app_error();
        assert_eq!(app.status_code(), 500);
        assert_eq!(app.message(), "Internal server error");
    }

    #[test]
    fn test_insufficient_points_message() {
        let app = PointsError::InsufficientPoints {
            balance: 100,
            required: 200,
        }
        .to_app_error();
        assert!(app.message().contains("100"));
        assert!(app.message().contains("200"));
        assert!(app.action().is_some());
    }
}
