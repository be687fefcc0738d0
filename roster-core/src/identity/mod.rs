//! Integration with the external identity provider: session token
//! verification and signed user webhooks.

pub mod events;
pub mod token;
pub mod webhook;

pub use events::{IdentityEvent, IdentityUser};
pub use token::{IdentityClaims, IdentityVerifier, TokenError, TokenSettings};
pub use webhook::{WebhookError, WebhookHeaders, WebhookVerifier};
