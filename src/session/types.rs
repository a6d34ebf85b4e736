use serde::{Deserialize, Serialize};

/// JWT claims issued by the identity provider for a signed-in user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Identity subject; doubles as the account document id
    pub sub: String,
    pub email: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}
