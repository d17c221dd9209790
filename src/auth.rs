//! Registration and login against the session's user table

use sha2::{Digest, Sha256};

use crate::db::Database;
use crate::error::{DashboardError, Result};
use crate::models::UserAccount;

/// Hex-encoded SHA-256 of the password
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a password against a stored hash without early exit
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let computed = hash_password(password);
    if computed.len() != stored_hash.len() {
        return false;
    }
    computed
        .bytes()
        .zip(stored_hash.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Create an account. The email must not be registered yet.
pub fn register(db: &Database, email: &str, name: &str, password: &str) -> Result<UserAccount> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(DashboardError::InvalidInput(
            "email and password are required".to_string(),
        ));
    }

    let user = UserAccount {
        email: email.to_string(),
        name: name.trim().to_string(),
        password_hash: hash_password(password),
    };
    db.insert_user(&user)?;
    log::info!("Registered {}", user.email);
    Ok(user)
}

/// Check credentials and return the matching account
pub fn login(db: &Database, email: &str, password: &str) -> Result<UserAccount> {
    match db.get_user(email.trim())? {
        Some(user) if verify_password(password, &user.password_hash) => Ok(user),
        _ => Err(DashboardError::InvalidLogin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_password("secret1"), hash_password("secret1"));
        assert_eq!(hash_password("secret1").len(), 64);
    }

    #[test]
    fn test_one_char_change_changes_hash() {
        assert_ne!(hash_password("secret1"), hash_password("secret2"));
        assert_ne!(hash_password("Secret1"), hash_password("secret1"));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_register_twice_keeps_first() {
        let db = Database::open_in_memory().unwrap();
        register(&db, "sara@example.pk", "Sara", "pw-one").unwrap();

        let err = register(&db, "sara@example.pk", "Imposter", "pw-two").unwrap_err();
        assert!(err.to_string().contains("already registered"));

        let stored = db.get_user("sara@example.pk").unwrap().unwrap();
        assert_eq!(stored.name, "Sara");
        assert_eq!(stored.password_hash, hash_password("pw-one"));
    }

    #[test]
    fn test_login_requires_matching_hash() {
        let db = Database::open_in_memory().unwrap();
        register(&db, "sara@example.pk", "Sara", "pw-one").unwrap();

        assert!(login(&db, "sara@example.pk", "pw-one").is_ok());
        assert!(matches!(
            login(&db, "sara@example.pk", "pw-onE"),
            Err(DashboardError::InvalidLogin)
        ));
        assert!(matches!(
            login(&db, "nobody@example.pk", "pw-one"),
            Err(DashboardError::InvalidLogin)
        ));
    }

    #[test]
    fn test_register_rejects_blank() {
        let db = Database::open_in_memory().unwrap();
        assert!(register(&db, "  ", "x", "pw").is_err());
        assert!(register(&db, "a@b.pk", "x", "").is_err());
    }
}
