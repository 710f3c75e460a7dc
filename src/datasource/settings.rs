//! Data source instance settings

use crate::query::QueryDefaults;
use crate::store::CosmosClientOptions;

/// Everything needed to build one data source instance
#[derive(Clone, Default)]
pub struct DataSourceSettings {
    /// Account endpoint, e.g. `https://acct.documents.azure.com:443/`
    pub endpoint_uri: Option<String>,
    /// Account primary key (base64)
    pub primary_key: Option<String>,
    /// Fallbacks for fields a query leaves empty
    pub defaults: QueryDefaults,
    /// Options for the store client
    pub client: CosmosClientOptions,
    /// Queries of one batch allowed to run at once
    pub query_concurrency: usize,
}

impl std::fmt::Debug for DataSourceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSourceSettings")
            .field("endpoint_uri", &self.endpoint_uri)
            .field("primary_key", &self.primary_key.as_ref().map(|_| "<redacted>"))
            .field("defaults", &self.defaults)
            .field("client", &self.client)
            .field("query_concurrency", &self.query_concurrency)
            .finish()
    }
}

impl DataSourceSettings {
    /// Credentials, if both are present and non-blank
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let endpoint = self.endpoint_uri.as_deref().filter(|s| !s.trim().is_empty())?;
        let key = self.primary_key.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((endpoint, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_require_both() {
        let mut settings = DataSourceSettings {
            endpoint_uri: Some("https://acct.documents.azure.com".to_string()),
            ..Default::default()
        };
        assert!(settings.credentials().is_none());

        settings.primary_key = Some("   ".to_string());
        assert!(settings.credentials().is_none());

        settings.primary_key = Some("a2V5".to_string());
        assert_eq!(
            settings.credentials(),
            Some(("https://acct.documents.azure.com", "a2V5"))
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let settings = DataSourceSettings {
            primary_key: Some("super-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
