//! Whole-file JSON user store. Every operation is a read-all or a full
//! rewrite; there is no locking and no row-level update, so concurrent
//! writers race and the last write wins.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    // Stored hashes are serialized everywhere they appear, admin listing
    // included.
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
}

pub struct FileUserStore {
    path: PathBuf,
}

impl FileUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the backing file as an empty list if it does not exist yet.
    pub async fn ensure_file(&self) -> io::Result<()> {
        if fs::try_exists(&self.path).await? {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, "[]").await
    }

    /// Read the full user list. A file that fails to parse reads as empty.
    pub async fn read_all(&self) -> io::Result<Vec<User>> {
        let raw = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw).unwrap_or_default())
    }

    pub async fn write_all(&self, users: &[User]) -> io::Result<()> {
        let json = serde_json::to_string_pretty(users).map_err(io::Error::other)?;
        fs::write(&self.path, json).await
    }

    /// Linear scan by exact, case-sensitive email match.
    pub async fn find_by_email(&self, email: &str) -> io::Result<Option<User>> {
        let users = self.read_all().await?;
        Ok(users.into_iter().find(|u| u.email == email))
    }

    pub async fn append(&self, user: User) -> io::Result<()> {
        let mut users = self.read_all().await?;
        users.push(user);
        self.write_all(&users).await
    }

    /// Overwrite the stored hash for `email` in place. Returns false when no
    /// such user exists.
    pub async fn update_password(&self, email: &str, password_hash: &str) -> io::Result<bool> {
        let mut users = self.read_all().await?;
        let Some(user) = users.iter_mut().find(|u| u.email == email) else {
            return Ok(false);
        };
        user.password_hash = password_hash.to_string();
        self.write_all(&users).await?;
        Ok(true)
    }
}
