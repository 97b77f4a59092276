//! Execution of the six dispatch tools against the Precisely APIs.
//!
//! Every failure mode - bad input, transport error, zero matches, malformed
//! response - comes back as a normalized `ToolResult` record so the agent can
//! keep the turn going with partial data.

use dc_base::tools::{ToolResult, ToolUse};
use serde::Serialize;
use serde_json::json;

use crate::api::PreciselyClient;
use crate::types::{
    AddressVerification, EmergencyContacts, GeocodeResult, ParseError, PropertyProfile,
    RouteEstimate,
};

pub const VERIFY_ADDRESS: &str = "verify_address";
pub const GEOCODE_ADDRESS: &str = "geocode_address";
pub const LOOKUP_EMERGENCY_CONTACTS: &str = "lookup_emergency_contacts";
pub const LOOKUP_PSAP_BY_LOCATION: &str = "lookup_psap_by_location";
pub const ENRICH_PROPERTY: &str = "enrich_property";
pub const CALCULATE_ROUTE: &str = "calculate_route";

pub fn execute(client: &PreciselyClient, tool: &ToolUse) -> Option<ToolResult> {
    let result = match tool.name.as_str() {
        VERIFY_ADDRESS => exec_verify(client, tool),
        GEOCODE_ADDRESS => exec_geocode(client, tool),
        LOOKUP_EMERGENCY_CONTACTS => exec_contacts(client, tool),
        LOOKUP_PSAP_BY_LOCATION => exec_psap_by_location(client, tool),
        ENRICH_PROPERTY => exec_enrich(client, tool),
        CALCULATE_ROUTE => exec_route(client, tool),
        _ => return None,
    };
    Some(result)
}

// ── input extraction ───────────────────────────────────────────

fn req_str<'a>(tool: &'a ToolUse, key: &str) -> Result<&'a str, String> {
    tool.input
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required parameter '{}'", key))
}

fn opt_input_str<'a>(tool: &'a ToolUse, key: &str) -> Option<&'a str> {
    tool.input.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

fn req_f64(tool: &ToolUse, key: &str) -> Result<f64, String> {
    tool.input
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| format!("Missing required parameter '{}'", key))
}

fn record<T: Serialize>(tool: &ToolUse, value: &T) -> ToolResult {
    match serde_json::to_value(value) {
        Ok(output) => ToolResult::ok(tool, output),
        Err(e) => ToolResult::failure(tool, format!("Failed to serialize result: {}", e)),
    }
}

fn parse_failure(tool: &ToolUse, err: ParseError) -> ToolResult {
    match err {
        ParseError::NoResults(msg) => ToolResult::no_results(tool, msg),
        ParseError::Malformed(msg) => ToolResult::failure(tool, msg),
    }
}

// ── tool executors ─────────────────────────────────────────────

fn exec_verify(client: &PreciselyClient, tool: &ToolUse) -> ToolResult {
    let (line1, city, state) = match (req_str(tool, "addressLine1"), req_str(tool, "city"), req_str(tool, "state")) {
        (Ok(a), Ok(c), Ok(s)) => (a, c, s),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return ToolResult::failure(tool, e),
    };
    let mut address_lines = vec![line1];
    if let Some(line2) = opt_input_str(tool, "addressLine2") {
        address_lines.push(line2);
    }
    let body = json!({
        "addresses": [{
            "addressLines": address_lines,
            "city": city,
            "admin1": state,
            "postalCode": opt_input_str(tool, "postalCode").unwrap_or(""),
            "country": "USA",
        }]
    });
    match client.post("/v1/addresses/verify", &body) {
        Ok(resp) => match AddressVerification::from_response(&resp) {
            Ok(v) => record(tool, &v),
            Err(e) => parse_failure(tool, e),
        },
        Err(e) => ToolResult::failure(tool, format!("Address verification failed: {}", e)),
    }
}

fn exec_geocode(client: &PreciselyClient, tool: &ToolUse) -> ToolResult {
    let (line1, city, state) = match (req_str(tool, "addressLine1"), req_str(tool, "city"), req_str(tool, "state")) {
        (Ok(a), Ok(c), Ok(s)) => (a, c, s),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return ToolResult::failure(tool, e),
    };
    let body = json!({
        "addresses": [{
            "addressLines": [line1],
            "city": city,
            "admin1": state,
            "postalCode": opt_input_str(tool, "postalCode").unwrap_or(""),
            "country": "USA",
        }],
        "preferences": { "maxResults": 1, "returnAllInfo": true }
    });
    match client.post("/v1/addresses/geocode", &body) {
        Ok(resp) => match GeocodeResult::from_response(&resp) {
            Ok(g) => record(tool, &g),
            Err(e) => parse_failure(tool, e),
        },
        Err(e) => ToolResult::failure(tool, format!("Geocoding failed: {}", e)),
    }
}

fn exec_contacts(client: &PreciselyClient, tool: &ToolUse) -> ToolResult {
    let (line1, city, state) = match (req_str(tool, "addressLine1"), req_str(tool, "city"), req_str(tool, "state")) {
        (Ok(a), Ok(c), Ok(s)) => (a, c, s),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return ToolResult::failure(tool, e),
    };
    let postal = opt_input_str(tool, "postalCode").unwrap_or("");
    let body = json!({
        "address": {
            "addressLines": [format!("{} {} {} {}, USA", line1, city, state, postal)],
            "city": city,
            "admin1": state,
            "admin2": "",
            "postalCode": postal,
            "postalCodeExt": "",
            "placeName": "",
            "borough": "",
            "suburb": "",
        }
    });
    match client.post("/v1/emergency-info/psap-ahj/address", &body) {
        Ok(resp) => match EmergencyContacts::from_response(&resp) {
            Ok(contacts) => record(tool, &contacts),
            Err(e) => parse_failure(tool, e),
        },
        Err(e) => ToolResult::failure(tool, format!("Emergency contacts lookup failed: {}", e)),
    }
}

fn exec_psap_by_location(client: &PreciselyClient, tool: &ToolUse) -> ToolResult {
    let (lat, lon) = match (req_f64(tool, "latitude"), req_f64(tool, "longitude")) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return ToolResult::failure(tool, e),
    };
    // GeoJSON order: longitude first
    let body = json!({ "location": { "coordinates": [lon, lat] } });
    match client.post("/v1/emergency-info/psap/location", &body) {
        Ok(resp) => match EmergencyContacts::psap_only_from_response(&resp) {
            Ok(psap) => record(tool, &json!({ "psap": psap })),
            Err(e) => parse_failure(tool, e),
        },
        Err(e) => ToolResult::failure(tool, format!("PSAP location lookup failed: {}", e)),
    }
}

fn exec_enrich(client: &PreciselyClient, tool: &ToolUse) -> ToolResult {
    let (line1, city, state) = match (req_str(tool, "addressLine1"), req_str(tool, "city"), req_str(tool, "state")) {
        (Ok(a), Ok(c), Ok(s)) => (a, c, s),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return ToolResult::failure(tool, e),
    };
    let postal = opt_input_str(tool, "postalCode").unwrap_or("");
    let query = property_query(line1, city, state, postal);
    match client.post("/v1/data-graph", &json!({ "query": query })) {
        Ok(resp) => match PropertyProfile::from_response(&resp) {
            Ok(profile) => record(tool, &profile),
            Err(e) => parse_failure(tool, e),
        },
        Err(e) => ToolResult::failure(tool, format!("Property enrichment failed: {}", e)),
    }
}

fn exec_route(client: &PreciselyClient, tool: &ToolUse) -> ToolResult {
    let coords = (
        req_f64(tool, "startLatitude"),
        req_f64(tool, "startLongitude"),
        req_f64(tool, "endLatitude"),
        req_f64(tool, "endLongitude"),
    );
    let (slat, slon, elat, elon) = match coords {
        (Ok(a), Ok(b), Ok(c), Ok(d)) => (a, b, c, d),
        (Err(e), _, _, _) | (_, Err(e), _, _) | (_, _, Err(e), _) | (_, _, _, Err(e)) => {
            return ToolResult::failure(tool, e);
        }
    };
    let params = [
        ("startPoint", format!("{},{}", slat, slon)),
        ("endPoint", format!("{},{}", elat, elon)),
        ("db", "driving".to_string()),
        ("optimizeBy", "time".to_string()),
        ("distanceUnit", "mi".to_string()),
        ("timeUnit", "min".to_string()),
        ("returnIntermediatePoints", "false".to_string()),
    ];
    match client.get("/v1/routing/route", &params) {
        Ok(resp) => match RouteEstimate::from_response(&resp) {
            Ok(route) => record(tool, &route),
            Err(e) => parse_failure(tool, e),
        },
        Err(e) => ToolResult::failure(tool, format!("Route calculation failed: {}", e)),
    }
}

/// Data-graph query for property, business, hazard, and demographic fields.
fn property_query(line1: &str, city: &str, state: &str, postal: &str) -> String {
    let q = |s: &str| s.replace('"', "\\\"");
    format!(
        "{{ address( addressLine1: \"{}\", city: \"{}\", stateProvince: \"{}\", postalCode: \"{}\", country: \"US\" ) {{ \
         preciselyId formattedAddress \
         property {{ pbKey buildingArea lotSize yearBuilt stories buildingType roofType foundationType \
         exteriorWalls heatingFuel heatingType coolingType numberOfBedrooms numberOfBathrooms \
         numberOfRooms garageType poolType }} \
         business {{ businessName sicCode naicsCode employeeCount }} \
         hazards {{ earthquake {{ riskScore }} flood {{ zone floodRisk }} wildfire {{ riskScore }} }} \
         demographics {{ population medianHouseholdIncome }} }} }}",
        q(line1),
        q(city),
        q(state),
        q(postal)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn tool(name: &str, input: Value) -> ToolUse {
        ToolUse { id: "tu_1".to_string(), name: name.to_string(), input }
    }

    fn offline_client() -> PreciselyClient {
        PreciselyClient::new("key".into(), "secret".into())
    }

    #[test]
    fn verify_missing_city_is_input_failure() {
        let client = offline_client();
        let result = execute(&client, &tool(VERIFY_ADDRESS, json!({"addressLine1": "350 Jordan Rd", "state": "NY"})))
            .unwrap();
        assert!(result.is_error);
        assert!(result.output["error"].as_str().unwrap().contains("city"));
    }

    #[test]
    fn route_missing_coordinate_is_input_failure() {
        let client = offline_client();
        let result = execute(
            &client,
            &tool(CALCULATE_ROUTE, json!({"startLatitude": 42.73, "startLongitude": -73.69, "endLatitude": 42.68})),
        )
        .unwrap();
        assert!(result.is_error);
        assert!(result.output["error"].as_str().unwrap().contains("endLongitude"));
    }

    #[test]
    fn psap_by_location_rejects_string_coordinates() {
        let client = offline_client();
        let result = execute(&client, &tool(LOOKUP_PSAP_BY_LOCATION, json!({"latitude": "42.73", "longitude": -73.69})))
            .unwrap();
        assert!(result.is_error);
        assert!(result.output["error"].as_str().unwrap().contains("latitude"));
    }

    #[test]
    fn unknown_tool_is_not_ours() {
        let client = offline_client();
        assert!(execute(&client, &tool("web_search", json!({}))).is_none());
    }

    #[test]
    fn property_query_escapes_quotes() {
        let query = property_query("1 \"A\" St", "Troy", "NY", "12180");
        assert!(query.contains("addressLine1: \"1 \\\"A\\\" St\""));
        assert!(!query.contains('\n'));
    }
}
