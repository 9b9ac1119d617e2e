use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::{User, UserRole};
use crate::validation::UserProfile;

/// Body for registration and for staff-created accounts.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture_url: Option<String>,
    pub linkedin_profile_url: Option<String>,
    pub github_profile_url: Option<String>,
}

impl CreateUserRequest {
    /// Raw profile as submitted; still needs validating.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            bio: self.bio.clone(),
            profile_picture_url: self.profile_picture_url.clone(),
            linkedin_profile_url: self.linkedin_profile_url.clone(),
            github_profile_url: self.github_profile_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub role: UserRole,
    pub email_verified: bool,
    pub is_professional: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            profile: user.profile(),
            role: user.role,
            email_verified: user.email_verified,
            is_professional: user.is_professional,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub items: Vec<UserResponse>,
    pub total: i64,
    pub page: i64,
    pub size: usize,
    pub links: PaginationLinks,
}

/// Navigation hrefs for one page of the user list.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct PaginationLinks {
    #[serde(rename = "self")]
    pub self_: String,
    pub first: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    pub last: String,
}

impl PaginationLinks {
    /// `limit` must be positive; callers pass values from [`Pagination::clamped`].
    pub fn new(base_url: &str, limit: i64, offset: i64, total: i64) -> Self {
        let href = |offset: i64| format!("{base_url}/api/v1/users?limit={limit}&offset={offset}");
        let last = if total > 0 { (total - 1) / limit * limit } else { 0 };
        Self {
            self_: href(offset),
            first: href(0),
            prev: (offset > 0).then(|| href((offset - limit).max(0))),
            next: (offset + limit < total).then(|| href(offset + limit)),
            last: href(last),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 { 10 }

impl Pagination {
    pub const MAX_LIMIT: i64 = 100;

    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, Self::MAX_LIMIT), self.offset.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_flattens_profile_and_hides_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            username: "jdoe".into(),
            email: "john.doe@example.com".into(),
            first_name: Some("John".into()),
            last_name: Some("Doe".into()),
            bio: None,
            profile_picture_url: None,
            linkedin_profile_url: None,
            github_profile_url: Some("https://github.com/johndoe".into()),
            password_hash: "$argon2id$secret".into(),
            role: UserRole::Authenticated,
            email_verified: true,
            verification_token: Some("tok".into()),
            failed_login_attempts: 0,
            is_locked: false,
            is_professional: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            last_login_at: None,
        };
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["username"], "jdoe");
        assert_eq!(json["email"], "john.doe@example.com");
        assert_eq!(json["role"], "AUTHENTICATED");
        assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
        assert!(json["last_login_at"].is_null());
        assert_eq!(json["is_professional"], false);
        let text = json.to_string();
        assert!(!text.contains("argon2"));
        assert!(!text.contains("verification_token"));
    }

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination { limit: 10_000, offset: -5 };
        assert_eq!(p.clamped(), (Pagination::MAX_LIMIT, 0));
        let p = Pagination { limit: 0, offset: 20 };
        assert_eq!(p.clamped(), (1, 20));
    }

    const BASE: &str = "http://localhost:8080";

    #[test]
    fn first_page_links() {
        let links = PaginationLinks::new(BASE, 10, 0, 25);
        assert_eq!(links.self_, "http://localhost:8080/api/v1/users?limit=10&offset=0");
        assert_eq!(links.first, links.self_);
        assert_eq!(links.prev, None);
        assert_eq!(
            links.next.as_deref(),
            Some("http://localhost:8080/api/v1/users?limit=10&offset=10")
        );
        assert_eq!(links.last, "http://localhost:8080/api/v1/users?limit=10&offset=20");
    }

    #[test]
    fn middle_page_links() {
        let links = PaginationLinks::new(BASE, 10, 10, 25);
        assert!(links.prev.as_deref().is_some_and(|h| h.ends_with("offset=0")));
        assert!(links.next.as_deref().is_some_and(|h| h.ends_with("offset=20")));
        assert!(links.self_.ends_with("limit=10&offset=10"));
    }

    #[test]
    fn last_page_has_no_next() {
        let links = PaginationLinks::new(BASE, 10, 20, 25);
        assert_eq!(links.next, None);
        assert_eq!(links.last, links.self_);
        // An offset that is not a multiple of the limit still steps back to zero.
        let links = PaginationLinks::new(BASE, 10, 5, 25);
        assert!(links.prev.as_deref().is_some_and(|h| h.ends_with("offset=0")));
    }

    #[test]
    fn empty_list_links_point_at_offset_zero() {
        let links = PaginationLinks::new(BASE, 10, 0, 0);
        assert_eq!(links.prev, None);
        assert_eq!(links.next, None);
        assert_eq!(links.first, links.last);
        assert!(links.last.ends_with("offset=0"));
    }

    #[test]
    fn links_serialize_under_self_key() {
        let json = serde_json::to_value(PaginationLinks::new(BASE, 10, 0, 5)).unwrap();
        assert!(json["self"].is_string());
        assert!(json.get("prev").is_none());
        assert!(json.get("next").is_none());
    }
}
