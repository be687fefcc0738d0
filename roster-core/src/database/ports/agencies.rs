use async_trait::async_trait;

use roster_model::{Agency, AgencyId, AgencyOption, AgencyStatus, AgencySummary};

use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct AgencyFilter {
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
    pub status: Option<AgencyStatus>,
    /// Restrict the listing to one agency.
    pub agency: Option<AgencyId>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgencyCounts {
    pub total: i64,
    pub inactive: i64,
}

#[async_trait]
pub trait AgenciesRepository: Send + Sync {
    /// Insert a new agency. A case-insensitive name clash is reported as
    /// `RosterError::Conflict`.
    async fn insert(&self, agency: &Agency) -> Result<()>;

    async fn get(&self, id: AgencyId) -> Result<Option<Agency>>;

    /// Whether another agency already uses `name` (ignoring case).
    async fn name_taken(&self, name: &str, except: Option<AgencyId>) -> Result<bool>;

    /// Filtered page of agencies with member counts, plus the unpaged total.
    async fn list(&self, filter: &AgencyFilter) -> Result<(Vec<AgencySummary>, i64)>;

    async fn update(&self, agency: &Agency) -> Result<()>;

    /// Delete an agency. Agencies that still own members are refused with
    /// `RosterError::Conflict`. Returns false when no row matched.
    async fn delete(&self, id: AgencyId) -> Result<bool>;

    async fn member_count(&self, id: AgencyId) -> Result<i64>;

    /// Active agencies offered during onboarding, ordered by name.
    async fn active_options(&self) -> Result<Vec<AgencyOption>>;

    async fn counts(&self) -> Result<AgencyCounts>;
}
