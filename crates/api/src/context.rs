use assetflow_core::EmailAddress;

/// Authenticated caller context for a request.
///
/// Derived from the verified bearer token; must be present for all protected
/// routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    email: EmailAddress,
    name: String,
}

impl CallerContext {
    pub fn new(email: EmailAddress, name: String) -> Self {
        Self { email, name }
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
