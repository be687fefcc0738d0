//! Application services. Each service authorizes the caller, validates
//! input, talks to the repository ports held by [`AppUnitOfWork`] and
//! records what changed in the activity log.

pub mod activity;
pub mod admin;
pub mod agencies;
pub mod members;
pub mod onboarding;
pub mod unit_of_work;
pub mod webhooks;

pub use activity::{ActivityRecord, ActivityService, Actor};
pub use admin::AdminService;
pub use agencies::AgencyService;
pub use members::MemberService;
pub use onboarding::OnboardingService;
pub use unit_of_work::AppUnitOfWork;
pub use webhooks::{IdentityWebhookService, WebhookOutcome};
