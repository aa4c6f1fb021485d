//! Purpose-specific token policies.
//!
//! Each policy wraps the [`crate::token`] codec with a fixed key, purpose
//! salt and maximum age, then applies its own acceptance rules:
//!
//! - [`PasswordResetPolicy`]: the token must be newer than the user's last
//!   password change.
//! - [`InvitationPolicy`]: the payload must carry the fields required for
//!   the invitee's role.
//!
//! Both expose `decode_with_policy`, which returns the precise
//! [`crate::AuthError`] for callers that want it, and a uniform wrapper that
//! hides the reason from end users while logging it.

pub mod invitation;
pub mod password_reset;

pub use invitation::{decode_invitation_token, required_fields, InvitationPolicy};
pub use password_reset::{decode_password_reset_token, PasswordResetPolicy};
