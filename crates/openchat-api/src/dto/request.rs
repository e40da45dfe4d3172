//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use openchat_entity::user::RoleKind;

/// Account registration body. Registering also signs the account in.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name, unique across the platform.
    #[validate(length(min = 3, max = 32, message = "Name must be 3-32 characters"))]
    pub name: String,
    /// Hex color hint without the leading `#`.
    #[validate(length(equal = 6, message = "Color must be a 6-digit hex value"))]
    pub color: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Display name of the account.
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

/// Update profile request. Absent fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// New display name.
    #[validate(length(min = 3, max = 32, message = "Name must be 3-32 characters"))]
    pub name: Option<String>,
    /// New hex color hint without the leading `#`.
    #[validate(length(equal = 6, message = "Color must be a 6-digit hex value"))]
    pub color: Option<String>,
}

/// Create channel request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateChannelRequest {
    /// URL slug, doubling as the key of the channel's live room.
    #[validate(length(min = 3, max = 32, message = "Slug must be 3-32 characters"))]
    pub slug: String,
    /// Human-readable channel name.
    #[validate(length(min = 1, max = 32, message = "Name must be 1-32 characters"))]
    pub name: String,
    /// Custom domain, if any.
    pub domain: Option<String>,
    /// Icon URL, if any.
    pub icon: Option<String>,
}

/// Grant a channel role to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRoleRequest {
    /// The user receiving the grant.
    pub user_id: Uuid,
    /// Which role to grant.
    pub kind: RoleKind,
}

/// Enable or disable an existing role grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRoleEnabledRequest {
    /// New enabled flag.
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            name: "mika".to_string(),
            color: Some("3366ff".to_string()),
        };
        assert!(ok.validate().is_ok());

        let short = RegisterRequest {
            name: "ab".to_string(),
            color: None,
        };
        assert!(short.validate().is_err());

        let bad_color = RegisterRequest {
            name: "mika".to_string(),
            color: Some("blue".to_string()),
        };
        assert!(bad_color.validate().is_err());
    }

    #[test]
    fn test_grant_role_kind_parses_from_json() {
        let req: GrantRoleRequest =
            serde_json::from_str(r#"{"user_id":"00000000-0000-0000-0000-000000000001","kind":"mod"}"#)
                .unwrap();
        assert_eq!(req.kind, RoleKind::Mod);
    }
}
