use super::Claims;
use uuid::Uuid;

/// Authenticated caller context extracted from a verified session token
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Auth-provider user ID (from JWT sub claim)
    pub user_id: Uuid,

    /// User email if available
    pub email: Option<String>,

    /// JWT claims
    claims: Claims,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            claims: claims.clone(),
        })
    }

    /// Get the JWT claims
    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}
