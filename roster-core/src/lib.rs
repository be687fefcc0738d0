//! # Roster Core
//!
//! Core library for the Roster membership service: agencies, their
//! members and the roles that decide what each member may do.
//!
//! ## Overview
//!
//! - **Access policy**: [`domain::access::authorize`] decides every request
//!   from the caller's role, status and agency
//! - **Onboarding**: first-user promotion, email-based role recovery and
//!   agency selection for new identities
//! - **Identity integration**: session token verification and signed user
//!   webhooks from the external identity provider
//! - **Persistence**: repository ports with PostgreSQL adapters
//!
//! ## Architecture
//!
//! - [`domain`]: pure rules with no I/O
//! - [`identity`]: token and webhook verification, event payloads
//! - [`database`]: repository traits and their SQLx implementations
//! - [`application`]: services combining the two for the HTTP layer
//!
//! ```no_run
//! use roster_core::{
//!     application::{AgencyService, AppUnitOfWork},
//!     database::{PoolSettings, PostgresDatabase},
//! };
//!
//! async fn open(url: &str) -> roster_core::Result<AgencyService> {
//!     let db = PostgresDatabase::connect(url, PoolSettings::default()).await?;
//!     db.migrate().await?;
//!     Ok(AgencyService::new(AppUnitOfWork::from_postgres(&db)))
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

pub mod application;
pub mod database;
pub mod domain;
pub mod error;
pub mod identity;

pub use error::{Result, RosterError};

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
