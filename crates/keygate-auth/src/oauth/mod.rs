//! OAuth 2.1 protocol types: PKCE, authorization codes, and the
//! request/response shapes for the authorize and token endpoints.

pub mod authorize;
pub mod code;
pub mod pkce;
pub mod token;

pub use authorize::{AuthorizationErrorCode, AuthorizationRequest};
pub use code::{AuthorizationCode, CodeRegistry};
pub use pkce::{PkceChallenge, PkceChallengeMethod};
pub use token::{TokenPair, TokenRequest};
