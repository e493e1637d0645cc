pub mod auth;
mod sqlite_user_store;
mod user_models;
mod user_store;

pub use auth::{PasswordHasher, TokenClaims, TokenService};
pub use sqlite_user_store::SqliteUserStore;
pub use user_models::{NewPasswordCredentials, PublicUser, UserCredentials, UserRole};
pub use user_store::UserStore;
