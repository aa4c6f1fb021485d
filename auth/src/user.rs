//! User model hydrated from the data API's JSON payload.
//!
//! The API returns users wrapped as `{"users": {...}}` with camelCase keys.
//! [`User::from_json`] turns that into a typed [`User`]; [`User::serialize`]
//! produces the compact camelCase form stored in sessions.

use crate::constants::roles;
use crate::error::{AuthError, Result};
use crate::providers::UserDirectory;
use crate::utils::hash_email;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A team membership of a buyer.
///
/// Kept as the raw JSON object the API returns, so unknown attributes and
/// unexpected types survive a session round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Team(Map<String, Value>);

impl Team {
    /// Team ID, if present and an integer.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    /// Whether the user leads this team; absent or non-boolean means no.
    #[must_use]
    pub fn is_team_lead(&self) -> bool {
        self.0.get("is_team_lead").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Whether the team's `permissions` list contains `permission`.
    #[must_use]
    pub fn grants(&self, permission: &str) -> bool {
        self.0
            .get("permissions")
            .and_then(Value::as_array)
            .is_some_and(|permissions| permissions.iter().any(|p| p.as_str() == Some(permission)))
    }

    /// Any other team attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Marketplace user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// User ID.
    pub id: i64,

    /// Email address.
    pub email_address: String,

    /// Display name.
    pub name: String,

    /// Role (see [`crate::constants::roles`]).
    pub role: String,

    /// Supplier code, for supplier users.
    pub supplier_code: Option<i64>,

    /// Supplier name, for supplier users.
    pub supplier_name: Option<String>,

    /// Account locked after too many failed logins.
    pub locked: bool,

    /// Account active flag.
    pub active: bool,

    /// When the user last accepted the terms of use.
    pub terms_accepted_at: DateTime<Utc>,

    /// When the password was last changed, if ever.
    pub password_changed_at: Option<DateTime<Utc>>,

    /// Seller application ID, for applicants.
    pub application_id: Option<i64>,

    /// Unread notifications for the supplier.
    pub notification_count: Option<i64>,

    /// Buyer teams.
    pub teams: Vec<Team>,

    /// Government agency ID, for buyers.
    pub agency_id: Option<i64>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    users: ApiUser,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUser {
    id: i64,
    email_address: String,
    name: String,
    role: String,
    terms_accepted_at: DateTime<Utc>,
    #[serde(default)]
    password_changed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    locked: Option<bool>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    supplier: Option<ApiSupplier>,
    #[serde(default)]
    application: Option<ApiApplication>,
    #[serde(default)]
    teams: Option<Vec<Team>>,
    #[serde(default)]
    agency_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSupplier {
    #[serde(default)]
    supplier_code: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    notification_count: Option<i64>,
}

#[derive(Deserialize)]
struct ApiApplication {
    #[serde(default)]
    id: Option<i64>,
}

impl User {
    /// Parse a user from the data API's `{"users": {...}}` payload.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUserRecord`] if a required field is
    /// missing or has the wrong type, or a timestamp is not RFC 3339.
    pub fn from_json(user_json: &Value) -> Result<Self> {
        let UserEnvelope { users: user } = UserEnvelope::deserialize(user_json)
            .map_err(|e| AuthError::InvalidUserRecord(e.to_string()))?;

        let supplier = user.supplier;
        Ok(Self {
            id: user.id,
            email_address: user.email_address,
            name: user.name,
            role: user.role,
            supplier_code: supplier.as_ref().and_then(|s| s.supplier_code),
            supplier_name: supplier.as_ref().and_then(|s| s.name.clone()),
            notification_count: supplier.as_ref().and_then(|s| s.notification_count),
            locked: user.locked.unwrap_or(false),
            active: user.active.unwrap_or(true),
            terms_accepted_at: user.terms_accepted_at,
            password_changed_at: user.password_changed_at,
            application_id: user.application.and_then(|a| a.id),
            teams: user.teams.unwrap_or_default(),
            agency_id: user.agency_id,
        })
    }

    /// Active and not locked.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active && !self.locked
    }

    /// Same as [`User::is_active`]; inactive users cannot hold a session.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.is_active()
    }

    /// Account locked flag.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Whether the user has exactly this role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// Whether the user has any of the given roles.
    #[must_use]
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }

    /// Only buyers belong to teams.
    #[must_use]
    pub fn is_part_of_team(&self) -> bool {
        self.has_role(roles::BUYER) && !self.teams.is_empty()
    }

    /// Whether the user leads `team_id`, or every team when `None`.
    #[must_use]
    pub fn is_team_lead(&self, team_id: Option<i64>) -> bool {
        if !self.is_part_of_team() {
            return false;
        }

        match team_id {
            Some(_) => self.get_team(team_id).is_some_and(Team::is_team_lead),
            None => self.teams.iter().all(Team::is_team_lead),
        }
    }

    /// Whether the user may perform `permission`.
    ///
    /// Users outside any team and team leads may do everything; other team
    /// members need the permission on `team_id`, or on every team when `None`.
    #[must_use]
    pub fn has_permission(&self, permission: &str, team_id: Option<i64>) -> bool {
        if !self.is_part_of_team() || self.is_team_lead(team_id) {
            return true;
        }

        let grants = |team: &Team| team.grants(permission);
        match team_id {
            Some(_) => self.get_team(team_id).is_some_and(grants),
            None => self.teams.iter().all(grants),
        }
    }

    /// The team with `team_id`, or the first team when `None`.
    #[must_use]
    pub fn get_team(&self, team_id: Option<i64>) -> Option<&Team> {
        if !self.is_part_of_team() {
            return None;
        }

        match team_id {
            Some(id) => self.teams.iter().find(|t| t.id() == Some(id)),
            None => self.teams.first(),
        }
    }

    /// User ID as a string, for session storage.
    #[must_use]
    pub fn get_id(&self) -> String {
        self.id.to_string()
    }

    /// Compact camelCase representation stored in the session.
    #[must_use]
    pub fn serialize(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "emailAddress": self.email_address,
            "supplierCode": self.supplier_code,
            "supplierName": self.supplier_name,
            "locked": self.locked,
            "application_id": self.application_id,
            "notificationCount": self.notification_count,
            "teams": self.teams,
            "agencyId": self.agency_id,
        })
    }

    /// Fetch a user from the directory, returning it only if active.
    ///
    /// # Errors
    ///
    /// Returns error if the directory lookup fails.
    pub async fn load_user<D: UserDirectory>(directory: &D, user_id: i64) -> Result<Option<Self>> {
        let user = directory.get_user(user_id).await?;
        Ok(user.filter(Self::is_active))
    }
}

/// Describe a user for log lines without exposing the email address.
///
/// # Examples
///
/// ```
/// use dmutils_auth::user::user_logging_string;
///
/// assert_eq!(user_logging_string(None), "User(anonymous)");
/// ```
#[must_use]
pub fn user_logging_string(user: Option<&User>) -> String {
    match user {
        None => "User(anonymous)".to_string(),
        Some(user) => format!(
            "User(id={}, role={}, hashed_email={})",
            user.id,
            user.role,
            hash_email(&user.email_address)
        ),
    }
}

/// Check the role of a raw API user payload.
///
/// Returns `false` for anything that is not shaped like `{"users": {"role": ...}}`.
///
/// # Examples
///
/// ```
/// use dmutils_auth::user::user_has_role;
/// use serde_json::json;
///
/// assert!(user_has_role(&json!({"users": {"role": "buyer"}}), "buyer"));
/// assert!(!user_has_role(&json!({"users": {"role": "buyer"}}), "admin"));
/// assert!(!user_has_role(&json!(null), "buyer"));
/// ```
#[must_use]
pub fn user_has_role(user_json: &Value, role: &str) -> bool {
    user_json
        .get("users")
        .and_then(|u| u.get("role"))
        .and_then(Value::as_str)
        == Some(role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockUserDirectory;

    fn supplier_json() -> Value {
        json!({
            "users": {
                "id": 123,
                "emailAddress": "test@example.com",
                "name": "Test User",
                "role": "supplier",
                "termsAcceptedAt": "2016-01-01T00:00:00.000000Z",
                "passwordChangedAt": "2017-06-01T12:30:00.000000Z",
                "locked": false,
                "active": true,
                "supplier": {
                    "supplierCode": 1234,
                    "name": "Supplier Name",
                    "notificationCount": 3
                },
                "application": {"id": 9}
            }
        })
    }

    fn buyer(teams: Value) -> User {
        User::from_json(&json!({
            "users": {
                "id": 7,
                "emailAddress": "buyer@example.gov.au",
                "name": "Buyer",
                "role": "buyer",
                "termsAcceptedAt": "2016-01-01T00:00:00Z",
                "teams": teams
            }
        }))
        .expect("valid buyer")
    }

    #[test]
    fn test_from_json_supplier() {
        let user = User::from_json(&supplier_json()).expect("valid user");

        assert_eq!(user.id, 123);
        assert_eq!(user.email_address, "test@example.com");
        assert_eq!(user.supplier_code, Some(1234));
        assert_eq!(user.supplier_name.as_deref(), Some("Supplier Name"));
        assert_eq!(user.notification_count, Some(3));
        assert_eq!(user.application_id, Some(9));
        assert_eq!(user.terms_accepted_at.to_rfc3339(), "2016-01-01T00:00:00+00:00");
        assert_eq!(
            user.password_changed_at.map(|t| t.to_rfc3339()).as_deref(),
            Some("2017-06-01T12:30:00+00:00")
        );
        assert!(user.is_active());
    }

    #[test]
    fn test_from_json_defaults() {
        let user = buyer(json!(null));

        assert!(user.active);
        assert!(!user.locked);
        assert!(user.teams.is_empty());
        assert_eq!(user.supplier_code, None);
        assert_eq!(user.password_changed_at, None);
    }

    #[test]
    fn test_from_json_missing_required_field() {
        let mut payload = supplier_json();
        payload["users"]
            .as_object_mut()
            .expect("object")
            .remove("termsAcceptedAt");

        assert!(matches!(
            User::from_json(&payload),
            Err(AuthError::InvalidUserRecord(_))
        ));
    }

    #[test]
    fn test_locked_user_is_inactive() {
        let mut payload = supplier_json();
        payload["users"]["locked"] = json!(true);
        let user = User::from_json(&payload).expect("valid user");

        assert!(user.is_locked());
        assert!(!user.is_active());
        assert!(!user.is_authenticated());
    }

    #[test]
    fn test_roles() {
        let user = User::from_json(&supplier_json()).expect("valid user");

        assert!(user.has_role("supplier"));
        assert!(!user.has_role("buyer"));
        assert!(user.has_any_role(&["admin", "supplier"]));
        assert!(!user.has_any_role(&["admin", "buyer"]));
    }

    #[test]
    fn test_team_membership_only_for_buyers() {
        let mut payload = supplier_json();
        payload["users"]["teams"] = json!([{"id": 1, "is_team_lead": true}]);
        let supplier = User::from_json(&payload).expect("valid user");

        assert!(!supplier.is_part_of_team());
        assert!(supplier.get_team(None).is_none());
        assert!(!buyer(json!([])).is_part_of_team());
        assert!(buyer(json!([{"id": 1}])).is_part_of_team());
    }

    #[test]
    fn test_team_lead() {
        let user = buyer(json!([
            {"id": 1, "is_team_lead": true},
            {"id": 2, "is_team_lead": false}
        ]));

        assert!(user.is_team_lead(Some(1)));
        assert!(!user.is_team_lead(Some(2)));
        assert!(!user.is_team_lead(Some(3)));
        assert!(!user.is_team_lead(None));
    }

    #[test]
    fn test_permissions() {
        let user = buyer(json!([
            {"id": 1, "permissions": ["create_drafts", "publish_opportunities"]},
            {"id": 2, "permissions": ["create_drafts"]}
        ]));

        assert!(user.has_permission("publish_opportunities", Some(1)));
        assert!(!user.has_permission("publish_opportunities", Some(2)));
        assert!(!user.has_permission("publish_opportunities", None));
        assert!(user.has_permission("create_drafts", None));
        assert!(!user.has_permission("create_drafts", Some(3)));
    }

    #[test]
    fn test_everyone_outside_teams_has_permission() {
        let user = User::from_json(&supplier_json()).expect("valid user");

        assert!(user.has_permission("anything", None));
        assert!(buyer(json!([{"id": 1, "is_team_lead": true}])).has_permission("anything", Some(1)));
    }

    #[test]
    fn test_get_team() {
        let user = buyer(json!([
            {"id": 1, "name": "Digital"},
            {"id": 2, "name": "Procurement"}
        ]));

        assert_eq!(user.get_team(None).and_then(Team::id), Some(1));
        assert_eq!(
            user.get_team(Some(2)).and_then(|t| t.get("name")),
            Some(&json!("Procurement"))
        );
        assert!(user.get_team(Some(5)).is_none());
    }

    #[test]
    fn test_serialize() {
        let user = User::from_json(&supplier_json()).expect("valid user");

        assert_eq!(
            user.serialize(),
            json!({
                "id": 123,
                "name": "Test User",
                "emailAddress": "test@example.com",
                "supplierCode": 1234,
                "supplierName": "Supplier Name",
                "locked": false,
                "application_id": 9,
                "notificationCount": 3,
                "teams": [],
                "agencyId": null
            })
        );
        assert_eq!(user.get_id(), "123");
    }

    #[test]
    fn test_serialize_passes_teams_through() {
        let teams = json!([
            {"id": 1, "name": "Digital"},
            {"id": "legacy", "permissions": null, "is_team_lead": "yes"}
        ]);
        let user = buyer(teams.clone());

        assert_eq!(user.serialize()["teams"], teams);
    }

    #[test]
    fn test_odd_team_attributes_are_tolerated() {
        let user = buyer(json!([
            {"id": "legacy", "permissions": null, "is_team_lead": "yes"},
            {"id": 2, "permissions": ["create_drafts", 7]}
        ]));

        assert!(user.get_team(Some(2)).is_some());
        assert_eq!(user.teams[0].id(), None);
        assert!(!user.is_team_lead(None));
        assert!(!user.has_permission("create_drafts", None));
        assert!(user.has_permission("create_drafts", Some(2)));
    }

    #[tokio::test]
    async fn test_load_user_returns_only_active_users() {
        let active = User::from_json(&supplier_json()).expect("valid user");
        let mut locked = buyer(json!([]));
        locked.id = 8;
        locked.locked = true;
        let mut inactive = buyer(json!([]));
        inactive.id = 9;
        inactive.active = false;
        let directory = MockUserDirectory::with_users([active.clone(), locked, inactive]);

        assert_eq!(User::load_user(&directory, 123).await, Ok(Some(active)));
        assert_eq!(User::load_user(&directory, 8).await, Ok(None));
        assert_eq!(User::load_user(&directory, 9).await, Ok(None));
        assert_eq!(User::load_user(&directory, 404).await, Ok(None));
    }

    #[tokio::test]
    async fn test_load_user_propagates_directory_failure() {
        let directory = MockUserDirectory::new();
        directory.set_unavailable(true);

        assert!(matches!(
            User::load_user(&directory, 123).await,
            Err(AuthError::Directory(_))
        ));
    }

    #[test]
    fn test_user_logging_string_hashes_email() {
        let user = User::from_json(&supplier_json()).expect("valid user");
        let logged = user_logging_string(Some(&user));

        assert!(logged.starts_with("User(id=123, role=supplier, hashed_email="));
        assert!(!logged.contains("test@example.com"));
    }
}
