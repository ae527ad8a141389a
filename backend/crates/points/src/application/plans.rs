use std::sync::Arc;

use crate::domain::entities::Plan;
use crate::domain::repository::PlanRepository;
use crate::error::PointsResult;

pub struct ListPlansUseCase<P>
where
    P: PlanRepository,
{
    plans: Arc<P>,
}

impl<P> ListPlansUseCase<P>
where
    P: PlanRepository,
{
    pub fn new(plans: Arc<P>) -> Self {
        Self { plans }
    }

    pub async fn execute(&self) -> PointsResult<Vec<Plan>> {
        self.plans.list_plans().await
    }
}
