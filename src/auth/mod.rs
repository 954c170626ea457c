//! Authentication and authorization for WorkStation
//!
//! Provides:
//! - Role derivation at registration
//! - Two-stage login (password, then one-time code)
//! - JWT challenge and session tokens
//! - The role → permission matrix and the access gate
//! - Secret hashing with Argon2

pub mod authenticator;
pub mod gate;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod role;

pub use authenticator::{
    Authenticator, CodeDelivery, LogDelivery, LoginChallenge, Registration, SessionGrant,
};
pub use gate::{AccessGate, Principal};
pub use jwt::{
    extract_token_from_header, PendingClaims, SessionClaims, TokenClaims, TokenCodec, TokenError,
};
pub use password::{generate_mfa_code, hash_password, verify_password};
pub use permissions::{get_permission_description, Permission, PermissionMatrix};
pub use role::{derive_role, Role};
