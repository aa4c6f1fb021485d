//! Token and role constants.
//!
//! This module contains constant values used throughout the token system.

/// One day in seconds; the password-reset token lifetime.
pub const ONE_DAY_IN_SECONDS: i64 = 86_400;

/// Invitation token lifetime in seconds (seven days).
pub const INVITATION_MAX_AGE_SECONDS: i64 = 7 * ONE_DAY_IN_SECONDS;

/// How far in the future a token timestamp may lie before it is rejected.
pub const MAX_CLOCK_SKEW_SECONDS: i64 = 60;

/// Byte separating the purpose salt from the JSON payload in the plaintext.
pub const SALT_SEPARATOR: u8 = 0x00;

/// Envelope format version.
pub const TOKEN_VERSION: u8 = 0x80;

/// User role names as they appear in the API payload.
pub mod roles {
    /// Buyer accounts.
    pub const BUYER: &str = "buyer";

    /// Supplier accounts; invitations for this role carry supplier details.
    pub const SUPPLIER: &str = "supplier";

    /// Applicants who have not yet become suppliers.
    pub const APPLICANT: &str = "applicant";

    /// Marketplace administrators.
    pub const ADMIN: &str = "admin";
}

/// Payload field names used by the token policies.
pub mod fields {
    /// User id in password-reset tokens.
    pub const USER: &str = "user";

    /// Email address in password-reset and invitation tokens.
    pub const EMAIL: &str = "email";

    /// Invitee email address.
    pub const EMAIL_ADDRESS: &str = "email_address";

    /// Supplier code for supplier invitations.
    pub const SUPPLIER_CODE: &str = "supplier_code";

    /// Supplier name for supplier invitations.
    pub const SUPPLIER_NAME: &str = "supplier_name";
}
