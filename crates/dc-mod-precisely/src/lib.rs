pub mod api;
pub mod tools;
pub mod types;

use std::sync::Arc;

use dc_base::config::Config;
use dc_base::registry::{ToolLabel, ToolRegistry};
use dc_base::tools::{ParamType, ToolDefinition, ToolParam, ToolResult, ToolUse};
use secrecy::SecretString;

use api::PreciselyClient;
use tools::{
    CALCULATE_ROUTE, ENRICH_PROPERTY, GEOCODE_ADDRESS, LOOKUP_EMERGENCY_CONTACTS,
    LOOKUP_PSAP_BY_LOCATION, VERIFY_ADDRESS,
};

/// Registry for the Precisely geospatial tool catalog.
///
/// Credentials are resolved at construction; when they are missing every call
/// still resolves, to a normalized failure record that tells the operator
/// which env vars to set.
pub struct PreciselyRegistry {
    client: Option<Arc<PreciselyClient>>,
}

impl PreciselyRegistry {
    pub fn from_config(config: &Config) -> Self {
        let client = match (&config.precisely_api_key, &config.precisely_api_secret) {
            (Some(key), Some(secret)) => {
                Some(Arc::new(PreciselyClient::new(key.clone(), secret.clone())))
            }
            _ => None,
        };
        Self { client }
    }

    pub fn with_credentials(api_key: SecretString, api_secret: SecretString) -> Self {
        Self { client: Some(Arc::new(PreciselyClient::new(api_key, api_secret))) }
    }

    fn owns(&self, name: &str) -> bool {
        matches!(
            name,
            VERIFY_ADDRESS
                | GEOCODE_ADDRESS
                | LOOKUP_EMERGENCY_CONTACTS
                | LOOKUP_PSAP_BY_LOCATION
                | ENRICH_PROPERTY
                | CALCULATE_ROUTE
        )
    }
}

impl ToolRegistry for PreciselyRegistry {
    fn id(&self) -> &'static str {
        "precisely"
    }

    fn name(&self) -> &'static str {
        "Precisely"
    }

    fn description(&self) -> &'static str {
        "Address verification, emergency contacts, property enrichment, and routing via the Precisely APIs"
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let address_params = |line1_desc: &str| {
            vec![
                ToolParam::new("addressLine1", ParamType::String).desc(line1_desc).required(),
                ToolParam::new("city", ParamType::String).desc("City name").required(),
                ToolParam::new("state", ParamType::String)
                    .desc("Two-letter state abbreviation (e.g. 'NY')")
                    .required(),
                ToolParam::new("postalCode", ParamType::String).desc("ZIP code"),
            ]
        };
        vec![
            ToolDefinition {
                id: VERIFY_ADDRESS.to_string(),
                description: concat!(
                    "Verify and standardize a US street address. Returns the standardized address, ",
                    "confidence score, PreciselyID, and coordinates (lat/lon). Call this as soon as the ",
                    "caller provides an address. Coordinates are included - only use geocode_address as ",
                    "a fallback if this returns no coordinates."
                )
                .to_string(),
                params: {
                    let mut params = address_params("Street address line 1 (e.g. '350 Jordan Rd')");
                    params.insert(
                        1,
                        ToolParam::new("addressLine2", ParamType::String)
                            .desc("Street address line 2 (suite, apt, etc.)"),
                    );
                    params
                },
            },
            ToolDefinition {
                id: GEOCODE_ADDRESS.to_string(),
                description: concat!(
                    "Fallback geocoding: get precise lat/lon for a US address when verify_address did ",
                    "not return coordinates. Only call this if verify_address returned null latitude/longitude."
                )
                .to_string(),
                params: address_params("Street address line 1"),
            },
            ToolDefinition {
                id: LOOKUP_EMERGENCY_CONTACTS.to_string(),
                description: concat!(
                    "Look up PSAP and AHJ (EMS, Fire, Police) emergency contacts for a US address. ",
                    "Returns dispatch center info, agency contacts with phone numbers, and the PSAP ",
                    "site address/coordinates for route calculation."
                )
                .to_string(),
                params: address_params("Full street address line (e.g. '350 Jordan Rd Troy NY 12180, USA')"),
            },
            ToolDefinition {
                id: LOOKUP_PSAP_BY_LOCATION.to_string(),
                description: concat!(
                    "Look up PSAP emergency contacts using GPS coordinates (latitude/longitude). Use ",
                    "this when the caller provides coordinates instead of a street address, or when ",
                    "address verification fails but approximate coordinates are available."
                )
                .to_string(),
                params: vec![
                    ToolParam::new("latitude", ParamType::Number)
                        .desc("Latitude of the incident location")
                        .required(),
                    ToolParam::new("longitude", ParamType::Number)
                        .desc("Longitude of the incident location")
                        .required(),
                ],
            },
            ToolDefinition {
                id: ENRICH_PROPERTY.to_string(),
                description: concat!(
                    "Get property details, building info, business data, and hazard assessments for a ",
                    "US address via the Precisely Data Graph. Returns building type, stories, ",
                    "construction materials, heating fuel, flood/earthquake/wildfire risks, and business ",
                    "data (name, SIC/NAICS codes, employee count) for commercial properties. Critical ",
                    "for first responder pre-planning."
                )
                .to_string(),
                params: address_params("Street address line 1"),
            },
            ToolDefinition {
                id: CALCULATE_ROUTE.to_string(),
                description: concat!(
                    "Calculate driving route and ETA from a station to the incident location. Use the ",
                    "PSAP siteLatitude/siteLongitude from lookup_emergency_contacts as the start point. ",
                    "If no site coordinates are available, use a central location in the same city as a ",
                    "reasonable estimate."
                )
                .to_string(),
                params: vec![
                    ToolParam::new("startLatitude", ParamType::Number)
                        .desc("Latitude of the responding station (use PSAP siteLatitude when available)")
                        .required(),
                    ToolParam::new("startLongitude", ParamType::Number)
                        .desc("Longitude of the responding station (use PSAP siteLongitude when available)")
                        .required(),
                    ToolParam::new("endLatitude", ParamType::Number)
                        .desc("Latitude of the incident location")
                        .required(),
                    ToolParam::new("endLongitude", ParamType::Number)
                        .desc("Longitude of the incident location")
                        .required(),
                ],
            },
        ]
    }

    fn execute(&self, tool: &ToolUse) -> Option<ToolResult> {
        match &self.client {
            Some(client) => tools::execute(client, tool),
            None => self.owns(&tool.name).then(|| {
                ToolResult::failure(
                    tool,
                    "Precisely credentials not configured. Set PRECISELY_API_KEY and PRECISELY_API_SECRET.",
                )
            }),
        }
    }

    fn tool_labels(&self) -> Vec<(&'static str, ToolLabel)> {
        vec![
            (VERIFY_ADDRESS, ToolLabel { label: "Verifying address", icon: "📍" }),
            (GEOCODE_ADDRESS, ToolLabel { label: "Geocoding location", icon: "🌐" }),
            (LOOKUP_EMERGENCY_CONTACTS, ToolLabel { label: "Looking up emergency contacts", icon: "📞" }),
            (LOOKUP_PSAP_BY_LOCATION, ToolLabel { label: "Looking up PSAP by location", icon: "🛰️" }),
            (ENRICH_PROPERTY, ToolLabel { label: "Enriching property data", icon: "🏠" }),
            (CALCULATE_ROUTE, ToolLabel { label: "Calculating route", icon: "🚒" }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unconfigured() -> PreciselyRegistry {
        PreciselyRegistry { client: None }
    }

    #[test]
    fn definitions_cover_all_six_tools() {
        let defs = unconfigured().tool_definitions();
        let ids: Vec<&str> = defs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                VERIFY_ADDRESS,
                GEOCODE_ADDRESS,
                LOOKUP_EMERGENCY_CONTACTS,
                LOOKUP_PSAP_BY_LOCATION,
                ENRICH_PROPERTY,
                CALCULATE_ROUTE
            ]
        );
    }

    #[test]
    fn missing_credentials_resolve_to_failure_record() {
        let registry = unconfigured();
        let tool = ToolUse {
            id: "t1".to_string(),
            name: VERIFY_ADDRESS.to_string(),
            input: json!({"addressLine1": "350 Jordan Rd", "city": "Troy", "state": "NY"}),
        };
        let result = registry.execute(&tool).unwrap();
        assert!(result.is_error);
        assert!(result.output["error"].as_str().unwrap().contains("PRECISELY_API_KEY"));
    }

    #[test]
    fn foreign_tool_is_declined_even_without_credentials() {
        let registry = unconfigured();
        let tool = ToolUse { id: "t1".to_string(), name: "web_search".to_string(), input: json!({}) };
        assert!(registry.execute(&tool).is_none());
    }

    #[test]
    fn every_tool_has_a_label() {
        let registry = unconfigured();
        let labels = registry.tool_labels();
        for def in registry.tool_definitions() {
            assert!(labels.iter().any(|(id, _)| *id == def.id), "missing label for {}", def.id);
        }
    }
}
