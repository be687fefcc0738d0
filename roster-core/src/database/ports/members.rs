use async_trait::async_trait;

use roster_model::{AgencyId, Member, MemberId, MemberStatus, Role};

use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct MemberFilter {
    pub agency: Option<AgencyId>,
    pub status: Option<MemberStatus>,
    pub role: Option<Role>,
    /// Case-insensitive match against email, first and last name.
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberCounts {
    pub total: i64,
    pub active: i64,
    pub pending: i64,
}

/// Row counts that point at inconsistent membership data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberIntegrity {
    pub without_agency: i64,
    pub without_identity: i64,
    pub in_inactive_agencies: i64,
}

#[async_trait]
pub trait MembersRepository: Send + Sync {
    /// Insert a member. Email clashes (ignoring case) are reported as
    /// `RosterError::Conflict`.
    async fn insert(&self, member: &Member) -> Result<()>;

    async fn get(&self, id: MemberId) -> Result<Option<Member>>;

    async fn find_by_identity(&self, identity_id: &str) -> Result<Option<Member>>;

    async fn email_taken(&self, email: &str, except: Option<MemberId>) -> Result<bool>;

    async fn list(&self, filter: &MemberFilter) -> Result<(Vec<Member>, i64)>;

    /// Persist every mutable column of `member` and bump `updated_at`.
    /// Demoting or deactivating the last active super administrator is
    /// refused with `RosterError::Conflict`.
    async fn update(&self, member: &Member) -> Result<()>;

    /// Delete a member, with the same last-super-administrator guard as
    /// [`MembersRepository::update`].
    async fn delete(&self, id: MemberId) -> Result<bool>;

    async fn count_active_super_admins(&self) -> Result<i64>;

    async fn counts(&self, agency: Option<AgencyId>) -> Result<MemberCounts>;

    async fn integrity(&self) -> Result<MemberIntegrity>;

    /// Detach an identity from its member row and mark the row inactive.
    /// Returns the updated row, if any.
    async fn unlink_identity(&self, identity_id: &str) -> Result<Option<Member>>;
}
