//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Deserializer, Serialize};

use cupcake_core::{Email, UserId};

use super::user::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user and
/// decide whether the administration panel is reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// User's email address.
    pub email: Email,
    /// Administrator flag.
    ///
    /// Older sessions may carry it as a string; see [`deserialize_admin_flag`].
    #[serde(default, deserialize_with = "deserialize_admin_flag")]
    pub is_admin: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Accept `true`, `"true"`, `"True"`, `"TRUE"`; everything else is `false`.
fn deserialize_admin_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(flag)) => flag,
        Some(Flag::Text(text)) => text.trim().eq_ignore_ascii_case("true"),
        Some(Flag::Other(_)) | None => false,
    })
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the shopping cart.
    pub const CART: &str = "carrinho";

    /// Key for pending flash messages.
    pub const FLASH: &str = "_flash";

    /// Key for the WhatsApp confirmation link of the order just placed.
    pub const WHATSAPP_URL: &str = "whatsapp_url";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(flag: &str) -> CurrentUser {
        let json = format!(
            r#"{{"id":1,"name":"Ana","email":"ana@example.com","is_admin":{flag}}}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_admin_flag_native_bool() {
        assert!(parse("true").is_admin);
        assert!(!parse("false").is_admin);
    }

    #[test]
    fn test_admin_flag_stringified() {
        assert!(parse(r#""true""#).is_admin);
        assert!(parse(r#""True""#).is_admin);
        assert!(parse(r#""TRUE""#).is_admin);
        assert!(!parse(r#""false""#).is_admin);
        assert!(!parse(r#""yes""#).is_admin);
        assert!(!parse(r#""""#).is_admin);
    }

    #[test]
    fn test_admin_flag_other_values_are_false() {
        assert!(!parse("null").is_admin);
        assert!(!parse("1").is_admin);
        assert!(!parse(r#"{"admin":true}"#).is_admin);
        assert!(!parse("[true]").is_admin);
    }

    #[test]
    fn test_admin_flag_missing_defaults_to_false() {
        let user: CurrentUser =
            serde_json::from_str(r#"{"id":2,"name":"Bia","email":"bia@example.com"}"#).unwrap();
        assert!(!user.is_admin);
    }

    #[test]
    fn test_round_trip_writes_native_bool() {
        let user = parse(r#""true""#);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["is_admin"], serde_json::Value::Bool(true));
    }
}
