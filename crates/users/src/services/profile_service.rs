//! Sender profile serialization.

use mediline_config::MediaConfig;
use mediline_database::UserRepository;
use sqlx::SqlitePool;

use crate::types::{SenderProfile, UserError, UserResult};

/// Resolves a user into the profile block embedded in broadcast frames.
///
/// The avatar lookup is role-conditional: patients and doctors keep their
/// pictures on separate profile tables. The relative storage path is
/// expanded into an absolute URL using the configured media base URL.
pub struct ProfileService {
    repository: UserRepository,
    media: MediaConfig,
}

impl ProfileService {
    /// Create a new profile service instance
    pub fn new(pool: SqlitePool, media: MediaConfig) -> Self {
        Self {
            repository: UserRepository::new(pool),
            media,
        }
    }

    /// Resolve a user id into a serialized sender profile, fresh from the
    /// store.
    pub async fn sender_profile(&self, user_id: i64) -> UserResult<SenderProfile> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::UserNotFound { id: user_id })?;

        let profile_pic = self
            .repository
            .profile_pic_for(user.id, user.account_type)
            .await?
            .map(|path| self.media.absolute_url(&path));

        Ok(SenderProfile {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            account_type: user.account_type,
            profile_pic,
        })
    }
}
