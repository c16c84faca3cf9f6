use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{self, PasswordHash, SaltString},
};
use std::collections::HashMap;

use crate::token::SubjectId;

// Looks up the subject a set of login credentials belongs to
pub trait CredentialStore: Send + Sync {
    fn authenticate(&self, email: &str, password: &str) -> Option<SubjectId>;
}

struct StoredUser {
    id: SubjectId,
    password_hash: String,
}

// Email -> (subject, argon2id PHC string), filled once at startup
#[derive(Default)]
pub struct InMemoryCredentials {
    users: HashMap<String, StoredUser>,
}

impl InMemoryCredentials {
    pub fn insert(
        &mut self,
        email: &str,
        password: &str,
        id: SubjectId,
    ) -> Result<(), password_hash::Error> {
        let password_hash = hash_password(password)?;
        self.users
            .insert(email.to_ascii_lowercase(), StoredUser { id, password_hash });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl CredentialStore for InMemoryCredentials {
    fn authenticate(&self, email: &str, password: &str) -> Option<SubjectId> {
        let user = self.users.get(&email.to_ascii_lowercase())?;
        verify_password(&user.password_hash, password).then_some(user.id)
    }
}

fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())?;
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}
