use async_trait::async_trait;

use roster_model::Member;

use crate::{
    domain::onboarding::{LinkOutcome, NewIdentity},
    error::Result,
};

#[async_trait]
pub trait OnboardingRepository: Send + Sync {
    /// Attach an identity to a member row, choosing its role with
    /// [`decide_assignment`](crate::domain::onboarding::decide_assignment).
    ///
    /// Implementations must serialise concurrent calls so that two
    /// identities arriving at the same moment cannot both be treated as
    /// the first one. Identities that are already linked come back
    /// unchanged.
    async fn link_identity(&self, identity: &NewIdentity) -> Result<LinkOutcome>;

    /// Promote the identity to super administrator when no active super
    /// administrator exists. Returns `None` once one does.
    async fn bootstrap_super_admin(&self, identity: &NewIdentity) -> Result<Option<Member>>;
}
