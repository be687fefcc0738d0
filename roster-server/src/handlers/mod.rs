pub mod activity;
pub mod admin;
pub mod agencies;
pub mod health;
pub mod me;
pub mod members;
pub mod webhooks;
