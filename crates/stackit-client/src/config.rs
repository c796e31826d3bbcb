use std::env;

/// Process-wide client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Skip authentication entirely. For local backends and tests.
    pub no_auth: bool,
    /// Overrides the default IaaS API endpoint.
    pub iaas_endpoint: Option<String>,
    /// Overrides the default service-account token endpoint.
    pub token_endpoint: Option<String>,
}

impl ClientConfig {
    /// Read from env vars (after loading `.env` if present):
    ///
    /// - `STACKIT_NO_AUTH` (`true`/`1`/`yes` enables the bypass)
    /// - `STACKIT_IAAS_ENDPOINT` (optional)
    /// - `STACKIT_TOKEN_BASEURL` (optional)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            no_auth: get("STACKIT_NO_AUTH").is_some_and(|v| parse_flag(&v)),
            iaas_endpoint: get("STACKIT_IAAS_ENDPOINT"),
            token_endpoint: get("STACKIT_TOKEN_BASEURL"),
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
