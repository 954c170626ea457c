//! Access gate: session token in, principal or rejection out
//!
//! Route-level only. Per-object checks belong to `crate::visibility`.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::jwt::{TokenClaims, TokenCodec, TokenError};
use crate::auth::permissions::get_permission_description;
use crate::auth::{Permission, PermissionMatrix, Role};
use crate::types::{AuthError, Clock};

/// Principal admitted by the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: u64,
    pub email: String,
    pub role: Role,
}

pub struct AccessGate {
    codec: Arc<TokenCodec>,
    matrix: Arc<PermissionMatrix>,
    clock: Arc<dyn Clock>,
}

impl AccessGate {
    pub fn new(codec: Arc<TokenCodec>, matrix: Arc<PermissionMatrix>, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec,
            matrix,
            clock,
        }
    }

    pub fn matrix(&self) -> &PermissionMatrix {
        &self.matrix
    }

    /// Decode a session token without checking any permission
    pub fn authenticate(&self, token: Option<&str>) -> Result<Principal, AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthenticated)?;

        match self.codec.decode(token, self.clock.now_secs()) {
            Ok(TokenClaims::Session(claims)) => Ok(Principal {
                id: claims.id,
                email: claims.email,
                role: claims.role,
            }),
            Ok(TokenClaims::Pending(claims)) => {
                warn!(email = %claims.email, "MFA challenge token presented as session");
                Err(AuthError::Forbidden("Invalid Token".into()))
            }
            Err(TokenError::Expired) => Err(AuthError::TokenExpired),
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                Err(AuthError::Forbidden("Invalid Token".into()))
            }
        }
    }

    /// Admit the bearer only if their role holds exactly `required`
    pub fn authorize(
        &self,
        token: Option<&str>,
        required: Permission,
    ) -> Result<Principal, AuthError> {
        let principal = self.authenticate(token)?;

        if !self.matrix.allows(principal.role, required) {
            warn!(
                id = principal.id,
                role = %principal.role,
                permission = %required,
                "Access denied: {}",
                get_permission_description(required)
            );
            return Err(AuthError::Forbidden(
                "Access Denied: Insufficient Permissions".into(),
            ));
        }

        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{PendingClaims, SessionClaims};
    use crate::types::ManualClock;

    const START: u64 = 1_700_000_000;

    struct Harness {
        gate: AccessGate,
        codec: Arc<TokenCodec>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let codec = Arc::new(TokenCodec::new_dev());
        let clock = Arc::new(ManualClock::new(START));
        let gate = AccessGate::new(
            codec.clone(),
            Arc::new(PermissionMatrix::standard()),
            clock.clone(),
        );
        Harness { gate, codec, clock }
    }

    fn session_token(codec: &TokenCodec, role: Role) -> String {
        codec
            .encode(&TokenClaims::Session(SessionClaims {
                id: 1,
                email: "someone@corp.example".into(),
                role,
                iat: START,
                exp: START + 3600,
            }))
            .unwrap()
    }

    #[test]
    fn test_missing_token() {
        let h = harness();
        assert!(matches!(
            h.gate.authorize(None, Permission::Files),
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            h.gate.authorize(Some(""), Permission::Files),
            Err(AuthError::Unauthenticated)
        ));
    }

    #[test]
    fn test_manage_users_admin_only() {
        let h = harness();
        let admin = session_token(&h.codec, Role::Admin);
        let principal = h.gate.authorize(Some(&admin), Permission::ManageUsers).unwrap();
        assert_eq!(principal.role, Role::Admin);

        for role in [Role::Manager, Role::Employee] {
            let token = session_token(&h.codec, role);
            assert!(matches!(
                h.gate.authorize(Some(&token), Permission::ManageUsers),
                Err(AuthError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn test_approve_requests_is_exact() {
        let h = harness();
        let admin = session_token(&h.codec, Role::Admin);
        let manager = session_token(&h.codec, Role::Manager);

        // Admin holds more permissions overall but not this one
        assert!(matches!(
            h.gate.authorize(Some(&admin), Permission::ApproveRequests),
            Err(AuthError::Forbidden(_))
        ));
        assert!(h.gate.authorize(Some(&manager), Permission::ApproveRequests).is_ok());
    }

    #[test]
    fn test_session_expires_after_an_hour() {
        let h = harness();
        let token = session_token(&h.codec, Role::Employee);

        h.clock.advance(3599);
        assert!(h.gate.authorize(Some(&token), Permission::Files).is_ok());

        h.clock.advance(1);
        assert!(matches!(
            h.gate.authorize(Some(&token), Permission::Files),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_pending_token_rejected() {
        let h = harness();
        let pending = h
            .codec
            .encode(&TokenClaims::Pending(PendingClaims {
                id: 1,
                email: "admin@corp.example".into(),
                role: Role::Admin,
                mfa_code_hash: "$argon2id$stub".into(),
                iat: START,
                exp: START + 300,
            }))
            .unwrap();

        assert!(matches!(
            h.gate.authorize(Some(&pending), Permission::Files),
            Err(AuthError::Forbidden(_))
        ));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let h = harness();
        let foreign = TokenCodec::new("some-other-deployment-secret-0123456789").unwrap();
        let token = session_token(&foreign, Role::Admin);

        let err = h.gate.authorize(Some(&token), Permission::Files).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden(_)));
        assert_eq!(err.status_code(), hyper::StatusCode::FORBIDDEN);
    }
}
