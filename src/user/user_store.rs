use super::user_models::{NewPasswordCredentials, PublicUser, UserCredentials, UserRole};
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Creates a new user with its password credentials and returns the user id.
    /// Fails if the username is already taken.
    fn create_user(
        &self,
        username: &str,
        role: UserRole,
        credentials: &NewPasswordCredentials,
    ) -> Result<i64>;

    /// Returns the public projection of a user.
    /// Returns Ok(None) if the user does not exist.
    fn get_user(&self, user_id: i64) -> Result<Option<PublicUser>>;

    /// Returns the stored credentials for a username, or Ok(None) if no such
    /// user exists. Login and duplicate-registration checks both go through
    /// this.
    fn get_user_credentials(&self, username: &str) -> Result<Option<UserCredentials>>;

    /// Total number of registered identities.
    fn count_users(&self) -> Result<u64>;
}
