//! Repository ports. Application services depend on these traits only;
//! the PostgreSQL adapters live under `database::infrastructure`.

pub mod activity;
pub mod agencies;
pub mod members;
pub mod onboarding;
pub mod webhook_deliveries;
