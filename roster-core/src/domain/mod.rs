pub mod access;
pub mod onboarding;
pub mod validation;

pub use access::{
    AccessDenied, Action, AgencyScope, MemberTarget, Principal, agency_scope,
    authorize, capabilities,
};
pub use onboarding::{
    Assignment, AssignmentKind, EmailMatch, LinkKind, LinkOutcome, NewIdentity,
    decide_assignment,
};
