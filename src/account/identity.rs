use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::league::{generators::IdGenerator, LeagueError};

/// External identity service that owns credentials.
///
/// The league only ever sees the subject id it hands back.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates a login for `email` and returns its subject id
    async fn create_user(&self, email: &str, credential: &str) -> Result<String, LeagueError>;
}

/// Process-local provider for development and tests.
/// Remembers which emails exist; credentials are discarded.
pub struct InMemoryIdentityProvider {
    ids: Box<dyn IdGenerator>,
    subjects: RwLock<HashMap<String, String>>,
}

impl InMemoryIdentityProvider {
    pub fn new(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            ids,
            subjects: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    #[instrument(skip(self, credential))]
    async fn create_user(&self, email: &str, credential: &str) -> Result<String, LeagueError> {
        if credential.len() < 6 {
            return Err(LeagueError::validation(
                "credential must be at least 6 characters",
            ));
        }

        let key = email.to_lowercase();
        let mut subjects = self.subjects.write().await;
        if subjects.contains_key(&key) {
            return Err(LeagueError::validation(format!(
                "an identity already exists for {email}"
            )));
        }

        let subject = self.ids.generate();
        subjects.insert(key, subject.clone());
        info!(subject = %subject, "Identity created");
        Ok(subject)
    }
}
