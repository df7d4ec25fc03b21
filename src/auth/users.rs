//! Registration rules and credential lookup.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{RepoResult, RepositoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("Username must be at least 4 letters or digits")]
    UsernameInvalid,
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    #[error("Password must not equal the username")]
    PasswordIsUsername,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// First failing rule wins, checked in the order the form shows them.
pub fn validate_registration(
    username: &str,
    password: &str,
    confirmation: &str,
) -> Result<(), RegistrationError> {
    if username.chars().count() < 4 || !username.chars().all(char::is_alphanumeric) {
        return Err(RegistrationError::UsernameInvalid);
    }
    if password.chars().count() < 8 {
        return Err(RegistrationError::PasswordTooShort);
    }
    if password == username {
        return Err(RegistrationError::PasswordIsUsername);
    }
    if password != confirmation {
        return Err(RegistrationError::PasswordMismatch);
    }
    Ok(())
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Insert a user with an already hashed password. A taken username is a
/// `Conflict`.
pub fn create_user(conn: &Connection, username: &str, password_hash: &str) -> RepoResult<i64> {
    conn.execute(
        "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
        params![username, password_hash],
    )
    .map_err(|e| match RepositoryError::from(e) {
        RepositoryError::Conflict(_) => RepositoryError::Conflict("Username is taken".into()),
        other => other,
    })?;
    Ok(conn.last_insert_rowid())
}

/// Id of the user when `password` matches the stored hash.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> RepoResult<Option<i64>> {
    let stored: Option<(i64, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE username = ?1",
            params![username],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((id, hash)) = stored else {
        return Ok(None);
    };
    match bcrypt::verify(password, &hash) {
        Ok(true) => Ok(Some(id)),
        Ok(false) => Ok(None),
        Err(e) => {
            tracing::warn!("Unreadable password hash for user {}: {}", id, e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    #[test]
    fn registration_rules_in_order() {
        use RegistrationError::*;
        assert_eq!(validate_registration("abc", "longpassword", "longpassword"), Err(UsernameInvalid));
        assert_eq!(validate_registration("ab cd", "longpassword", "longpassword"), Err(UsernameInvalid));
        assert_eq!(validate_registration("alice", "short", "short"), Err(PasswordTooShort));
        assert_eq!(validate_registration("alice123", "alice123", "alice123"), Err(PasswordIsUsername));
        assert_eq!(validate_registration("alice", "longpassword", "longpassworx"), Err(PasswordMismatch));
        assert_eq!(validate_registration("alice", "longpassword", "longpassword"), Ok(()));
    }

    #[test]
    fn authenticate_checks_hash() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let hash = hash_password("longpassword", 4).unwrap();
        let id = create_user(&conn, "alice", &hash).unwrap();

        assert_eq!(authenticate(&conn, "alice", "longpassword").unwrap(), Some(id));
        assert_eq!(authenticate(&conn, "alice", "wrongpassword").unwrap(), None);
        assert_eq!(authenticate(&conn, "nobody", "longpassword").unwrap(), None);
    }

    #[test]
    fn duplicate_username_is_conflict() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        create_user(&conn, "alice", "x").unwrap();

        match create_user(&conn, "alice", "y") {
            Err(RepositoryError::Conflict(msg)) => assert_eq!(msg, "Username is taken"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn corrupt_hash_fails_closed() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        create_user(&conn, "alice", "not-a-bcrypt-hash").unwrap();
        assert_eq!(authenticate(&conn, "alice", "anything1").unwrap(), None);
    }
}
