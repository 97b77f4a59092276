//! Environment configuration. Loaded once at startup; `.env` is honored via
//! dotenvy. Credentials are wrapped in `SecretString` so they never end up in
//! debug output.

use std::env;

use secrecy::SecretString;

/// Which start point the agent is told to use for route calculation when the
/// preferred one is unavailable. The original agent instructions varied here
/// across revisions, so the order is policy, not algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteFallbackPolicy {
    /// Relevant AHJ mailing address first, then the PSAP site address.
    #[default]
    AhjMailingThenPsapSite,
    /// PSAP site address first, then the AHJ mailing address.
    PsapSiteThenAhjMailing,
    /// Skip agency geocoding entirely and use a city-centroid estimate.
    CityCentroid,
}

impl RouteFallbackPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ahj-first" => Some(Self::AhjMailingThenPsapSite),
            "psap-first" => Some(Self::PsapSiteThenAhjMailing),
            "city-centroid" => Some(Self::CityCentroid),
            _ => None,
        }
    }

    /// Instruction clause interpolated into the system prompt.
    pub fn prompt_clause(&self) -> &'static str {
        match self {
            Self::AhjMailingThenPsapSite => {
                "Use the relevant AHJ's mailing address as the route start (geocode it first). \
                 If no AHJ mailing address is available, use the PSAP siteAddress instead. \
                 If neither has coordinates, use a central location in the same city."
            }
            Self::PsapSiteThenAhjMailing => {
                "Use the PSAP siteLatitude/siteLongitude as the route start. \
                 If the PSAP site coordinates are unavailable, geocode the relevant AHJ's \
                 mailing address. If neither has coordinates, use a central location in the same city."
            }
            Self::CityCentroid => {
                "Use a central location in the incident's city as the route start estimate."
            }
        }
    }
}

/// Runtime configuration for the console.
pub struct Config {
    pub anthropic_api_key: Option<SecretString>,
    pub precisely_api_key: Option<SecretString>,
    pub precisely_api_secret: Option<SecretString>,
    /// Model identifier for the conversational agent.
    pub model: String,
    pub route_fallback: RouteFallbackPolicy,
}

const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

impl Config {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self {
            anthropic_api_key: secret_var("ANTHROPIC_API_KEY"),
            precisely_api_key: secret_var("PRECISELY_API_KEY"),
            precisely_api_secret: secret_var("PRECISELY_API_SECRET"),
            model: env::var("DISPATCH_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            route_fallback: env::var("DISPATCH_ROUTE_FALLBACK")
                .ok()
                .and_then(|v| RouteFallbackPolicy::parse(&v))
                .unwrap_or_default(),
        }
    }
}

fn secret_var(name: &str) -> Option<SecretString> {
    env::var(name).ok().filter(|v| !v.is_empty()).map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_fallback_parses_known_values() {
        assert_eq!(RouteFallbackPolicy::parse("ahj-first"), Some(RouteFallbackPolicy::AhjMailingThenPsapSite));
        assert_eq!(RouteFallbackPolicy::parse("PSAP-FIRST"), Some(RouteFallbackPolicy::PsapSiteThenAhjMailing));
        assert_eq!(RouteFallbackPolicy::parse(" city-centroid "), Some(RouteFallbackPolicy::CityCentroid));
        assert_eq!(RouteFallbackPolicy::parse("nearest-station"), None);
    }

    #[test]
    fn each_policy_has_a_prompt_clause() {
        for policy in [
            RouteFallbackPolicy::AhjMailingThenPsapSite,
            RouteFallbackPolicy::PsapSiteThenAhjMailing,
            RouteFallbackPolicy::CityCentroid,
        ] {
            assert!(!policy.prompt_clause().is_empty());
        }
    }
}
