//! Build-time configuration for the hosted backend.

/// Local development backend (the hosted stack's default REST port).
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:54321";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Public (anonymous) key; row-level policies do the real gating.
    pub api_key: String,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Read `FUNDLOVE_GATEWAY_URL` and `FUNDLOVE_GATEWAY_KEY` as baked in at
    /// compile time; the bundle has no runtime environment.
    pub fn from_build_env() -> Self {
        Self::new(
            option_env!("FUNDLOVE_GATEWAY_URL").unwrap_or(DEFAULT_GATEWAY_URL),
            option_env!("FUNDLOVE_GATEWAY_KEY").unwrap_or_default(),
        )
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::from_build_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://db.example.test", "https://db.example.test/rest/v1/users")]
    #[case("https://db.example.test/", "https://db.example.test/rest/v1/users")]
    fn table_url_joins_rest_prefix(#[case] base: &str, #[case] expected: &str) {
        let config = GatewayConfig::new(base, "anon");
        assert_eq!(config.table_url("users"), expected);
    }
}
