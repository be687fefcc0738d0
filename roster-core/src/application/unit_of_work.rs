use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use crate::database::{
    infrastructure::postgres::{
        PostgresActivityRepository, PostgresAgenciesRepository,
        PostgresMembersRepository, PostgresOnboardingRepository,
        PostgresWebhookDeliveriesRepository,
    },
    ports::{
        activity::ActivityRepository, agencies::AgenciesRepository,
        members::MembersRepository, onboarding::OnboardingRepository,
        webhook_deliveries::WebhookDeliveriesRepository,
    },
    postgres::PostgresDatabase,
};

/// Aggregates the repository ports used by application services.
#[derive(Clone)]
pub struct AppUnitOfWork {
    pub agencies: Arc<dyn AgenciesRepository>,
    pub members: Arc<dyn MembersRepository>,
    pub activity: Arc<dyn ActivityRepository>,
    pub onboarding: Arc<dyn OnboardingRepository>,
    pub webhook_deliveries: Arc<dyn WebhookDeliveriesRepository>,
}

impl fmt::Debug for AppUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWork")
            .field("agencies", &type_name_of_val(self.agencies.as_ref()))
            .field("members", &type_name_of_val(self.members.as_ref()))
            .field("activity", &type_name_of_val(self.activity.as_ref()))
            .field("onboarding", &type_name_of_val(self.onboarding.as_ref()))
            .field(
                "webhook_deliveries",
                &type_name_of_val(self.webhook_deliveries.as_ref()),
            )
            .finish()
    }
}

impl AppUnitOfWork {
    /// Wire every port to its PostgreSQL adapter.
    pub fn from_postgres(db: &PostgresDatabase) -> Self {
        let pool = db.pool().clone();
        Self {
            agencies: Arc::new(PostgresAgenciesRepository::new(pool.clone())),
            members: Arc::new(PostgresMembersRepository::new(pool.clone())),
            activity: Arc::new(PostgresActivityRepository::new(pool.clone())),
            onboarding: Arc::new(PostgresOnboardingRepository::new(pool.clone())),
            webhook_deliveries: Arc::new(PostgresWebhookDeliveriesRepository::new(pool)),
        }
    }
}
