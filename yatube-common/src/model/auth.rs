//! Bearer tokens.
//!
//! On the wire a token reads `<user id>:<core>:<salt>`, both secrets in unpadded URL-safe
//! base64. Only the Argon2 hash of the core, salted with the salt, is ever persisted.

use crate::{
    model::{Id, user::UserMarker},
    util::PositiveDuration,
};
use argon2::{Argon2, Params};
use base64::{DecodeError, Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use std::{
    fmt::{Debug, Formatter},
    num::ParseIntError,
    str::FromStr,
};
use thiserror::Error;
use time::OffsetDateTime;

pub const TOKEN_CORE_LEN: usize = 24;
pub const TOKEN_SALT_LEN: usize = 18;
pub const TOKEN_HASH_LEN: usize = Params::DEFAULT_OUTPUT_LEN;

const SEPARATOR: char = ':';

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum MalformedTokenError {
    #[error("Expected three parts separated by '{SEPARATOR}'")]
    Parts,
    #[error("The user id is not a number: {0}")]
    UserId(#[from] ParseIntError),
    #[error("A secret part is not valid base64: {0}")]
    Base64(#[from] DecodeError),
    #[error("The {part} part has {actual} bytes instead of {expected}")]
    Length {
        part: &'static str,
        expected: usize,
        actual: usize,
    },
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing the token failed: {0}")]
pub struct TokenHashingError(#[from] argon2::Error);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("A stored token hash must be exactly {TOKEN_HASH_LEN} bytes")]
pub struct InvalidTokenHashError;

/// A token as presented by a client. Never stored.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct AuthToken {
    pub user_id: Id<UserMarker>,
    core: [u8; TOKEN_CORE_LEN],
    salt: [u8; TOKEN_SALT_LEN],
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct TokenHash(Box<[u8; TOKEN_HASH_LEN]>);

/// The stored counterpart of an [`AuthToken`].
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Authentication {
    pub user: Id<UserMarker>,
    pub token_hash: TokenHash,
    pub created_at: OffsetDateTime,
    pub expires_after: Option<PositiveDuration>,
}

impl AuthToken {
    #[must_use]
    pub fn generate(user_id: Id<UserMarker>) -> Self {
        Self {
            user_id,
            core: rand::random(),
            salt: rand::random(),
        }
    }

    /// The value to send after `Bearer `.
    #[must_use]
    pub fn to_bearer(&self) -> String {
        format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.user_id,
            BASE64_URL_SAFE_NO_PAD.encode(self.core),
            BASE64_URL_SAFE_NO_PAD.encode(self.salt),
        )
    }

    pub fn hash(&self) -> Result<TokenHash, TokenHashingError> {
        let mut output = [0; TOKEN_HASH_LEN];
        Argon2::default().hash_password_into(&self.core, &self.salt, &mut output)?;

        Ok(TokenHash(Box::new(output)))
    }
}

fn decode_part<const LEN: usize>(
    part: &'static str,
    encoded: &str,
) -> Result<[u8; LEN], MalformedTokenError> {
    let bytes = BASE64_URL_SAFE_NO_PAD.decode(encoded)?;
    let actual = bytes.len();

    bytes.try_into().map_err(|_| MalformedTokenError::Length {
        part,
        expected: LEN,
        actual,
    })
}

impl FromStr for AuthToken {
    type Err = MalformedTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (user_id, secrets) = s.split_once(SEPARATOR).ok_or(MalformedTokenError::Parts)?;
        let (core, salt) = secrets
            .split_once(SEPARATOR)
            .ok_or(MalformedTokenError::Parts)?;

        Ok(Self {
            user_id: Id::new(user_id.parse()?),
            core: decode_part("core", core)?,
            salt: decode_part("salt", salt)?,
        })
    }
}

impl Debug for AuthToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl TokenHash {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Debug for TokenHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenHash(..)")
    }
}

impl TryFrom<Vec<u8>> for TokenHash {
    type Error = InvalidTokenHashError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        let bytes: [u8; TOKEN_HASH_LEN] = value.try_into().map_err(|_| InvalidTokenHashError)?;
        Ok(Self(Box::new(bytes)))
    }
}

impl Authentication {
    /// Generates a token for `user` along with the record that makes it valid.
    pub fn issue(
        user: Id<UserMarker>,
        created_at: OffsetDateTime,
        expires_after: Option<PositiveDuration>,
    ) -> Result<(AuthToken, Self), TokenHashingError> {
        let token = AuthToken::generate(user);
        let authentication = Self {
            user,
            token_hash: token.hash()?,
            created_at,
            expires_after,
        };

        Ok((token, authentication))
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.expires_after
            .map(|expires_after| self.created_at + expires_after.get())
    }

    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at().is_some_and(|expires_at| expires_at <= now)
    }

    /// A token only authenticates the user it was issued to, and only until it expires.
    #[must_use]
    pub fn is_valid_for(&self, user_id: Id<UserMarker>, now: OffsetDateTime) -> bool {
        self.user == user_id && !self.is_expired_at(now)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            Id,
            auth::{AuthToken, Authentication, MalformedTokenError, TokenHash},
        },
        util::PositiveDuration,
    };
    use time::{Duration, macros::datetime};

    #[test]
    fn bearer_parses_back() {
        let token = AuthToken::generate(Id::new(12));
        let bearer = token.to_bearer();

        assert!(bearer.starts_with("12:"));
        assert!(!bearer.contains('='));
        assert_eq!(bearer.parse::<AuthToken>().unwrap(), token);
    }

    #[test]
    fn malformed_bearers() {
        assert_eq!("12".parse::<AuthToken>(), Err(MalformedTokenError::Parts));
        assert_eq!("garbage".parse::<AuthToken>(), Err(MalformedTokenError::Parts));
        assert!(matches!(
            "x:AAAA:AAAA".parse::<AuthToken>(),
            Err(MalformedTokenError::UserId(_))
        ));
        assert!(matches!(
            "1:!!!!:AAAA".parse::<AuthToken>(),
            Err(MalformedTokenError::Base64(_))
        ));
        assert_eq!(
            "1:AAAA:AAAA".parse::<AuthToken>(),
            Err(MalformedTokenError::Length {
                part: "core",
                expected: 24,
                actual: 3
            })
        );
    }

    #[test]
    fn hash_depends_on_core() {
        let token = AuthToken::generate(Id::new(1));
        let mut other = token.clone();
        other.core[0] ^= 0xFF;

        assert_eq!(token.hash().unwrap(), token.hash().unwrap());
        assert_ne!(token.hash().unwrap(), other.hash().unwrap());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let token = AuthToken::generate(Id::new(5));
        let bearer = token.to_bearer();
        let core = bearer.split(':').nth(1).unwrap();
        let debug = format!("{token:?}");

        assert!(debug.starts_with("AuthToken { user_id: "));
        assert!(debug.ends_with(", .. }"));
        assert!(!debug.contains(core));
        assert_eq!(format!("{:?}", token.hash().unwrap()), "TokenHash(..)");
    }

    #[test]
    fn stored_hash_length() {
        assert!(TokenHash::try_from(vec![0; 32]).is_ok());
        assert!(TokenHash::try_from(vec![0; 31]).is_err());
    }

    #[test]
    fn validity() {
        let created_at = datetime!(2025-01-01 00:00 UTC);
        let (token, mut authentication) =
            Authentication::issue(Id::new(1), created_at, None).unwrap();
        assert_eq!(authentication.token_hash, token.hash().unwrap());
        assert_eq!(authentication.expires_at(), None);
        assert!(authentication.is_valid_for(Id::new(1), created_at + Duration::days(10_000)));
        assert!(!authentication.is_valid_for(Id::new(2), created_at));

        authentication.expires_after = PositiveDuration::new(Duration::hours(1));
        assert_eq!(
            authentication.expires_at(),
            Some(datetime!(2025-01-01 01:00 UTC))
        );
        assert!(authentication.is_valid_for(Id::new(1), created_at + Duration::minutes(59)));
        assert!(!authentication.is_valid_for(Id::new(1), created_at + Duration::minutes(60)));
    }
}
