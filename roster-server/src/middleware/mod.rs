pub mod auth;

pub use auth::{auth_middleware, super_admin_middleware};
