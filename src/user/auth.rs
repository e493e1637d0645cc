//! Password hashing and session token signing

use anyhow::{bail, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::user_models::UserRole;

mod password_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash<T: AsRef<str>>(plain: &[u8], b64_salt: T) -> Result<String> {
        let argon2 = Argon2::default();
        let salt = SaltString::from_b64(b64_salt.as_ref()).map_err(|err| anyhow!("{}", err))?;
        let hash_string = argon2
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash_string)
    }

    pub fn verify<T: AsRef<str>>(plain_pw: &[u8], target_hash: T) -> Result<bool> {
        let argon2 = Argon2::default();
        let password_hash =
            PasswordHash::new(target_hash.as_ref()).map_err(|err| anyhow!("{}", err))?;
        Ok(argon2.verify_password(plain_pw, &password_hash).is_ok())
    }
}

/// The hashing scheme is recorded next to each credential row so that the
/// default can change without invalidating existing passwords.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum PasswordHasher {
    Argon2,
}

impl FromStr for PasswordHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(PasswordHasher::Argon2),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl PasswordHasher {
    pub fn as_str(self) -> &'static str {
        match self {
            PasswordHasher::Argon2 => "argon2",
        }
    }

    pub fn generate_b64_salt(&self) -> String {
        match self {
            PasswordHasher::Argon2 => password_argon2::generate_b64_salt(),
        }
    }

    pub fn hash<T: AsRef<str>>(&self, plain: &[u8], b64_salt: T) -> Result<String> {
        match self {
            PasswordHasher::Argon2 => password_argon2::hash(plain, b64_salt),
        }
    }

    pub fn verify<T: AsRef<str>>(&self, plain_pw: T, target_hash: T, _salt: T) -> Result<bool> {
        match self {
            PasswordHasher::Argon2 => {
                password_argon2::verify(plain_pw.as_ref().as_bytes(), target_hash)
            }
        }
    }
}

/// The decoded payload of a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: i64,
    pub role: UserRole,
    pub iat: i64,
}

/// Issues and verifies signed session tokens. Stateless: a token is trusted
/// for as long as its signature checks out, so a deleted or demoted identity
/// keeps its access until the token is discarded client-side.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        TokenService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, user_id: i64, role: UserRole) -> Result<String> {
        let claims = TokenClaims {
            user_id,
            role,
            iat: chrono::Utc::now().timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        // Tokens carry no exp claim, so expiry is neither required nor checked.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}
