use crate::error::Result;
use crate::models::{AuthResponse, User};
use crate::storage::LocalStorage;

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// Signed-in state kept across restarts
#[derive(Debug, Clone)]
pub struct Session {
    storage: LocalStorage,
}

impl Session {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn user(&self) -> Option<User> {
        self.storage.get_json(USER_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Store the token and user from a login or register response.
    pub fn save(&self, auth: &AuthResponse) -> Result<()> {
        self.storage.set(TOKEN_KEY, auth.token.clone())?;
        self.storage.set_json(USER_KEY, &auth.user)
    }

    pub fn logout(&self) -> Result<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_save_and_logout() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(LocalStorage::open(dir.path().join("s.json")).unwrap());
        assert!(!session.is_authenticated());

        let auth = AuthResponse {
            message: "Login successful".into(),
            token: "jwt-token".into(),
            user: User {
                id: Uuid::new_v4(),
                username: "alice".into(),
                email: "alice@x.com".into(),
                avatar: None,
                created_at: Utc::now(),
            },
        };
        session.save(&auth).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("jwt-token"));
        assert_eq!(session.user().unwrap().username, "alice");

        session.logout().unwrap();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }
}
