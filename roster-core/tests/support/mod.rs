//! Shared fixtures for the roster-core integration tests.
#![allow(dead_code)]

use anyhow::Result;
use chrono::Utc;
use roster_core::{
    application::AppUnitOfWork,
    database::PostgresDatabase,
    domain::access::Principal,
};
use roster_model::{
    Agency, AgencyId, AgencyStatus, Member, MemberId, MemberStatus,
    MembershipType, Role,
};
use sqlx::PgPool;

pub struct TestHarness {
    pub pool: PgPool,
    pub uow: AppUnitOfWork,
}

impl TestHarness {
    pub fn new(pool: PgPool) -> Self {
        let db = PostgresDatabase::from_pool(pool.clone());
        Self {
            uow: AppUnitOfWork::from_postgres(&db),
            pool,
        }
    }

    pub async fn agency(&self, name: &str) -> Result<Agency> {
        self.agency_with_status(name, AgencyStatus::Active).await
    }

    pub async fn agency_with_status(
        &self,
        name: &str,
        status: AgencyStatus,
    ) -> Result<Agency> {
        let now = Utc::now();
        let agency = Agency {
            id: AgencyId::new(),
            name: name.to_string(),
            description: None,
            email: None,
            phone: None,
            website: None,
            address: None,
            status,
            created_at: now,
            updated_at: now,
        };
        self.uow.agencies.insert(&agency).await?;
        Ok(agency)
    }

    pub async fn member(&self, seed: MemberSeed<'_>) -> Result<Member> {
        let now = Utc::now();
        let member = Member {
            id: MemberId::new(),
            identity_id: seed.identity_id.map(str::to_string),
            email: seed.email.to_string(),
            first_name: None,
            last_name: None,
            phone: None,
            role: seed.role,
            membership_type: MembershipType::default(),
            status: seed.status,
            agency_id: seed.agency_id,
            created_at: now,
            updated_at: now,
        };
        self.uow.members.insert(&member).await?;
        Ok(member)
    }

    /// An active, linked super administrator and the principal acting as it.
    pub async fn super_admin(&self, email: &str) -> Result<(Member, Principal)> {
        let identity = format!("idp_{}", email.replace(['@', '.'], "_"));
        let member = self
            .member(MemberSeed {
                email,
                role: Role::SuperAdmin,
                status: MemberStatus::Active,
                agency_id: None,
                identity_id: Some(&identity),
            })
            .await?;
        let principal = principal_for(&member);
        Ok((member, principal))
    }
}

pub struct MemberSeed<'a> {
    pub email: &'a str,
    pub role: Role,
    pub status: MemberStatus,
    pub agency_id: Option<AgencyId>,
    pub identity_id: Option<&'a str>,
}

impl<'a> MemberSeed<'a> {
    pub fn active(email: &'a str, role: Role, agency_id: Option<AgencyId>) -> Self {
        Self {
            email,
            role,
            status: MemberStatus::Active,
            agency_id,
            identity_id: None,
        }
    }
}

pub fn principal_for(member: &Member) -> Principal {
    let identity = member
        .identity_id
        .clone()
        .unwrap_or_else(|| format!("idp_{}", member.id));
    Principal::from_member(identity, Some(member.email.clone()), member)
}
