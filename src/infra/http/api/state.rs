use std::sync::Arc;

use subtle::ConstantTimeEq;

use crate::application::admin::posts::AdminPostService;
use crate::application::listing::ListingService;
use crate::application::site::SiteProfile;
use crate::application::uploads::UploadService;

use super::rate_limit::AdminRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub listing: Arc<ListingService>,
    pub posts: Arc<AdminPostService>,
    pub uploads: Arc<UploadService>,
    pub site: Arc<SiteProfile>,
    pub admin_key: AdminKey,
    pub rate_limiter: Arc<AdminRateLimiter>,
}

/// Outcome of checking a presented `x-admin-key` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCheck {
    Granted,
    Missing,
    Invalid,
    /// No key is configured, so nobody is an admin.
    Disabled,
}

/// The configured admin key.
#[derive(Clone, Default)]
pub struct AdminKey(Option<Arc<str>>);

impl AdminKey {
    pub fn new(key: Option<String>) -> Self {
        Self(key.map(Arc::from))
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    pub fn check(&self, presented: Option<&str>) -> AdminCheck {
        let Some(expected) = self.0.as_deref() else {
            return AdminCheck::Disabled;
        };
        let Some(presented) = presented.map(str::trim).filter(|value| !value.is_empty()) else {
            return AdminCheck::Missing;
        };

        if bool::from(expected.as_bytes().ct_eq(presented.as_bytes())) {
            AdminCheck::Granted
        } else {
            AdminCheck::Invalid
        }
    }
}

impl std::fmt::Debug for AdminKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AdminKey")
            .field(&self.0.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_check_distinguishes_outcomes() {
        let key = AdminKey::new(Some("s3cret".to_string()));
        assert_eq!(key.check(Some("s3cret")), AdminCheck::Granted);
        assert_eq!(key.check(Some("s3cre")), AdminCheck::Invalid);
        assert_eq!(key.check(Some("  ")), AdminCheck::Missing);
        assert_eq!(key.check(None), AdminCheck::Missing);

        let disabled = AdminKey::default();
        assert_eq!(disabled.check(Some("s3cret")), AdminCheck::Disabled);
        assert!(!disabled.is_configured());
    }
}
