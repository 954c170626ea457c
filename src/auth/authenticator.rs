//! Two-stage login: password check, then one-time code
//!
//! Stage one (`begin_login`) issues a pending challenge token holding only a
//! hash of the code. Stage two (`complete_login`) trades that token plus the
//! code for a session token. No pending state is kept server-side.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::jwt::{PendingClaims, SessionClaims, TokenClaims, TokenCodec, TokenError};
use crate::auth::password::{decoy_hash, generate_mfa_code, hash_password, verify_password};
use crate::auth::{derive_role, Role};
use crate::config::GateConfig;
use crate::db::{CredentialStore, NewPrincipal, PrincipalRecord, StoreError};
use crate::types::{AuthError, Clock};

/// Out-of-band channel for the one-time code
pub trait CodeDelivery: Send + Sync {
    fn deliver(&self, principal: &PrincipalRecord, code: &str);
}

/// Writes the code to the server log only.
///
/// Stands in for email/SMS delivery. The code never reaches the client
/// through a response.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDelivery;

impl CodeDelivery for LogDelivery {
    fn deliver(&self, principal: &PrincipalRecord, code: &str) {
        info!(
            target: "workstation_gate::mfa",
            email = %principal.email,
            role = %principal.role,
            code,
            "MFA code issued"
        );
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub user_id: u64,
    pub role: Role,
    pub message: String,
}

/// Result of a successful password check
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginChallenge {
    pub mfa_required: bool,
    pub temp_token: String,
    pub expires_at: u64,
    pub message: String,
}

/// Result of a successful code check
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    pub access_token: String,
    pub id: u64,
    pub email: String,
    pub role: Role,
    pub expires_at: u64,
}

pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
    clock: Arc<dyn Clock>,
    delivery: Arc<dyn CodeDelivery>,
    config: GateConfig,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        codec: Arc<TokenCodec>,
        clock: Arc<dyn Clock>,
        delivery: Arc<dyn CodeDelivery>,
        config: GateConfig,
    ) -> Self {
        Self {
            store,
            codec,
            clock,
            delivery,
            config,
        }
    }

    /// Create a principal, deriving its role from the email
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::BadRequest(
                "Missing required fields: email, password".into(),
            ));
        }

        let role = derive_role(email);
        let password_hash = hash_password(password)?;

        let record = self
            .store
            .insert_principal(NewPrincipal {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role,
                created_at: self.clock.now_utc(),
            })
            .map_err(|e| match e {
                StoreError::Duplicate(_) => AuthError::AlreadyRegistered,
                other => AuthError::Store(other),
            })?;

        info!(id = record.id, email = %record.email, role = %role, "Registered principal");

        Ok(Registration {
            user_id: record.id,
            role,
            message: format!("Registered successfully as {role}"),
        })
    }

    /// Stage one: verify the password and issue a pending challenge
    pub fn begin_login(&self, email: &str, password: &str) -> Result<LoginChallenge, AuthError> {
        let principal = match self.store.find_by_identity(email)? {
            Some(p) => p,
            None => {
                if let Some(decoy) = decoy_hash() {
                    let _ = verify_password(password, decoy);
                }
                warn!(email = %email, "Login for unknown identity");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(password, &principal.password_hash)? {
            warn!(email = %email, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let code = generate_mfa_code();
        let now = self.clock.now_secs();
        let expires_at = expiry(now, self.config.challenge_ttl_seconds)?;

        let claims = TokenClaims::Pending(PendingClaims {
            id: principal.id,
            email: principal.email.clone(),
            role: principal.role,
            mfa_code_hash: hash_password(&code)?,
            iat: now,
            exp: expires_at,
        });
        let temp_token = self.codec.encode(&claims).map_err(signing_error)?;

        self.delivery.deliver(&principal, &code);

        Ok(LoginChallenge {
            mfa_required: true,
            temp_token,
            expires_at,
            message: "Authentication code sent".into(),
        })
    }

    /// Stage two: verify the one-time code and issue a session
    pub fn complete_login(&self, temp_token: &str, code: &str) -> Result<SessionGrant, AuthError> {
        let claims = match self.codec.decode(temp_token, self.clock.now_secs()) {
            Ok(TokenClaims::Pending(claims)) => claims,
            Ok(TokenClaims::Session(_)) => {
                warn!("Session token presented as MFA challenge");
                return Err(AuthError::InvalidToken);
            }
            Err(TokenError::Expired) => return Err(AuthError::ChallengeExpired),
            Err(e) => {
                warn!(error = %e, "Rejected MFA challenge token");
                return Err(AuthError::InvalidToken);
            }
        };

        // The hash came from a token we signed; an unparseable one means a bad token.
        let matches =
            verify_password(code, &claims.mfa_code_hash).map_err(|_| AuthError::InvalidToken)?;
        if !matches {
            warn!(email = %claims.email, "Wrong MFA code");
            return Err(AuthError::InvalidCode);
        }

        let now = self.clock.now_secs();
        let expires_at = expiry(now, self.config.session_ttl_seconds)?;
        let session = SessionClaims {
            id: claims.id,
            email: claims.email,
            role: claims.role,
            iat: now,
            exp: expires_at,
        };
        let access_token = self
            .codec
            .encode(&TokenClaims::Session(session.clone()))
            .map_err(signing_error)?;

        info!(id = session.id, email = %session.email, role = %session.role, "Session issued");

        Ok(SessionGrant {
            access_token,
            id: session.id,
            email: session.email,
            role: session.role,
            expires_at,
        })
    }
}

fn expiry(now: u64, ttl_seconds: u64) -> Result<u64, AuthError> {
    now.checked_add(ttl_seconds).ok_or_else(|| {
        AuthError::Config(format!(
            "Token lifetime of {ttl_seconds}s overflows the expiry timestamp"
        ))
    })
}

fn signing_error(err: TokenError) -> AuthError {
    AuthError::Internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::types::ManualClock;
    use std::sync::Mutex;

    const START: u64 = 1_700_000_000;

    #[derive(Default)]
    struct CapturedCodes(Mutex<Vec<String>>);

    impl CodeDelivery for CapturedCodes {
        fn deliver(&self, _principal: &PrincipalRecord, code: &str) {
            self.0.lock().unwrap().push(code.to_string());
        }
    }

    impl CapturedCodes {
        fn last(&self) -> String {
            self.0.lock().unwrap().last().cloned().unwrap()
        }
    }

    struct Harness {
        auth: Authenticator,
        clock: Arc<ManualClock>,
        codes: Arc<CapturedCodes>,
    }

    fn harness() -> Harness {
        harness_with(GateConfig::default())
    }

    fn harness_with(config: GateConfig) -> Harness {
        let clock = Arc::new(ManualClock::new(START));
        let codes = Arc::new(CapturedCodes::default());
        let auth = Authenticator::new(
            Arc::new(MemoryStore::new()),
            Arc::new(TokenCodec::new_dev()),
            clock.clone(),
            codes.clone(),
            config,
        );
        Harness { auth, clock, codes }
    }

    #[test]
    fn test_register_derives_role() {
        let h = harness();
        let reg = h.auth.register("sue", "Manager.Sue@corp.example", "pw-123456").unwrap();
        assert_eq!(reg.role, Role::Manager);
        assert_eq!(reg.message, "Registered successfully as Manager");

        let reg = h.auth.register("root", "admin-manager@corp.example", "pw-123456").unwrap();
        assert_eq!(reg.role, Role::Admin);
    }

    #[test]
    fn test_register_duplicate() {
        let h = harness();
        h.auth.register("a", "a@corp.example", "pw").unwrap();
        assert!(matches!(
            h.auth.register("a2", "a@corp.example", "pw2"),
            Err(AuthError::AlreadyRegistered)
        ));
    }

    #[test]
    fn test_register_requires_fields() {
        let h = harness();
        assert!(matches!(
            h.auth.register("a", "", "pw"),
            Err(AuthError::BadRequest(_))
        ));
        assert!(matches!(
            h.auth.register("a", "a@corp.example", ""),
            Err(AuthError::BadRequest(_))
        ));
    }

    #[test]
    fn test_invalid_credentials_same_message() {
        let h = harness();
        h.auth.register("a", "a@corp.example", "right-password").unwrap();

        let unknown = h.auth.begin_login("nobody@corp.example", "x").unwrap_err();
        let wrong = h.auth.begin_login("a@corp.example", "wrong-password").unwrap_err();
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[test]
    fn test_full_login_keeps_role() {
        let h = harness();
        h.auth.register("boss", "manager@corp.example", "pw-123456").unwrap();

        let challenge = h.auth.begin_login("manager@corp.example", "pw-123456").unwrap();
        assert!(challenge.mfa_required);
        assert_eq!(challenge.expires_at, START + 300);

        let code = h.codes.last();
        assert!(!challenge.temp_token.contains(&code));

        let grant = h.auth.complete_login(&challenge.temp_token, &code).unwrap();
        assert_eq!(grant.role, Role::Manager);
        assert_eq!(grant.email, "manager@corp.example");
        assert_eq!(grant.expires_at, START + 3600);
    }

    #[test]
    fn test_wrong_code_is_retryable() {
        let h = harness();
        h.auth.register("a", "a@corp.example", "pw").unwrap();
        let challenge = h.auth.begin_login("a@corp.example", "pw").unwrap();
        let code = h.codes.last();
        let wrong = if code == "123456" { "654321" } else { "123456" };

        let err = h.auth.complete_login(&challenge.temp_token, wrong).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCode));
        assert!(err.is_retryable());

        // The same challenge still accepts the right code
        assert!(h.auth.complete_login(&challenge.temp_token, &code).is_ok());
    }

    #[test]
    fn test_challenge_expires_after_five_minutes() {
        let h = harness();
        h.auth.register("a", "a@corp.example", "pw").unwrap();
        let challenge = h.auth.begin_login("a@corp.example", "pw").unwrap();
        let code = h.codes.last();

        h.clock.advance(300);
        let err = h.auth.complete_login(&challenge.temp_token, &code).unwrap_err();
        assert!(matches!(err, AuthError::ChallengeExpired));
        assert!(err.requires_restart());
    }

    #[test]
    fn test_session_token_is_not_a_challenge() {
        let h = harness();
        h.auth.register("a", "a@corp.example", "pw").unwrap();
        let challenge = h.auth.begin_login("a@corp.example", "pw").unwrap();
        let code = h.codes.last();
        let grant = h.auth.complete_login(&challenge.temp_token, &code).unwrap();

        assert!(matches!(
            h.auth.complete_login(&grant.access_token, &code),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_registration_time_from_clock() {
        let h = harness();
        h.clock.advance(42);
        h.auth.register("a", "a@corp.example", "pw").unwrap();

        let stored = h.auth.store.find_by_identity("a@corp.example").unwrap().unwrap();
        assert_eq!(stored.created_at.timestamp(), (START + 42) as i64);
    }

    #[test]
    fn test_oversized_session_lifetime_is_config_error() {
        let h = harness_with(GateConfig {
            challenge_ttl_seconds: 300,
            session_ttl_seconds: u64::MAX,
        });
        h.auth.register("a", "a@corp.example", "pw").unwrap();
        let challenge = h.auth.begin_login("a@corp.example", "pw").unwrap();
        let code = h.codes.last();

        let err = h.auth.complete_login(&challenge.temp_token, &code).unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
        assert_eq!(err.status_code(), hyper::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_oversized_challenge_lifetime_is_config_error() {
        let h = harness_with(GateConfig {
            challenge_ttl_seconds: u64::MAX,
            session_ttl_seconds: u64::MAX,
        });
        h.auth.register("a", "a@corp.example", "pw").unwrap();

        assert!(matches!(
            h.auth.begin_login("a@corp.example", "pw"),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn test_garbage_challenge_token() {
        let h = harness();
        assert!(matches!(
            h.auth.complete_login("garbage", "123456"),
            Err(AuthError::InvalidToken)
        ));
    }
}
