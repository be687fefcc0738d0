pub mod repositories;

pub use repositories::{
    PostgresActivityRepository, PostgresAgenciesRepository,
    PostgresMembersRepository, PostgresOnboardingRepository,
    PostgresWebhookDeliveriesRepository,
};
