use serde::{Deserialize, Serialize};

/// Locally cached profile for the logged-in user.
///
/// Built at login from the submitted email and the credential's username
/// claim. Only `name` changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
}

impl UserProfile {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_json_shape() {
        let profile = UserProfile::new("a@b.com", "alice");
        let json = serde_json::to_string(&profile).expect("serialize profile");
        assert_eq!(json, r#"{"email":"a@b.com","name":"alice"}"#);
    }
}
