//! Normalized output records for each tool, plus the parsers that build them
//! from raw provider responses.
//!
//! Normalization rules:
//! - The provider's numeric "no data" sentinel (`-9999`) becomes `None`, so
//!   downstream consumers see JSON `null`, never the literal number.
//! - Missing/empty descriptive strings default to "Unknown" (or "None" for
//!   amenity fields), matching what the briefing prompt expects.
//! - A successful response with zero matches is `ParseError::NoResults`,
//!   distinct from malformed/transport failures.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Out-of-range constant the provider uses for "no data" in numeric fields.
pub const NO_DATA_SENTINEL: f64 = -9999.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Provider answered successfully but found nothing.
    NoResults(String),
    /// Response shape was not what we expect.
    Malformed(String),
}

// ── field helpers ──────────────────────────────────────────────

fn field<'a>(v: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = v;
    for key in path {
        cur = cur.get(key)?;
    }
    Some(cur)
}

/// Numeric field with sentinel conversion.
fn opt_f64(v: &Value, path: &[&str]) -> Option<f64> {
    let n = field(v, path)?.as_f64()?;
    if n == NO_DATA_SENTINEL { None } else { Some(n) }
}

fn opt_i64(v: &Value, path: &[&str]) -> Option<i64> {
    let n = field(v, path)?.as_i64()?;
    if n as f64 == NO_DATA_SENTINEL { None } else { Some(n) }
}

fn str_or<'a>(v: &Value, path: &[&str], default: &'a str) -> String {
    match field(v, path).and_then(|f| f.as_str()) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

fn opt_str(v: &Value, path: &[&str]) -> Option<String> {
    field(v, path).and_then(|f| f.as_str()).filter(|s| !s.is_empty()).map(str::to_string)
}

// ── verify_address ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressVerification {
    pub formatted_address: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub precisely_id: String,
    pub confidence: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl AddressVerification {
    pub fn from_response(resp: &Value) -> Result<Self, ParseError> {
        let result = field(resp, &["responses"])
            .and_then(|r| r.get(0))
            .ok_or_else(|| ParseError::NoResults("No address verification results returned".to_string()))?;
        Ok(Self {
            formatted_address: str_or(result, &["address", "formattedAddress"], ""),
            street_address: str_or(result, &["address", "formattedStreetAddress"], ""),
            city: str_or(result, &["address", "city"], ""),
            state: str_or(result, &["address", "admin1"], ""),
            postal_code: str_or(result, &["address", "postalCode"], ""),
            country: str_or(result, &["address", "country"], ""),
            precisely_id: str_or(result, &["address", "preciselyId"], ""),
            confidence: opt_f64(result, &["confidence"]),
            latitude: opt_f64(result, &["geocode", "latitude"]),
            longitude: opt_f64(result, &["geocode", "longitude"]),
        })
    }
}

// ── geocode_address ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub precisely_id: String,
    pub formatted_address: String,
    pub match_score: Option<f64>,
}

impl GeocodeResult {
    pub fn from_response(resp: &Value) -> Result<Self, ParseError> {
        let candidate = field(resp, &["responses"])
            .and_then(|r| r.get(0))
            .and_then(|r| r.get("candidates"))
            .and_then(|c| c.get(0))
            .ok_or_else(|| ParseError::NoResults("No geocoding results returned".to_string()))?;
        Ok(Self {
            latitude: opt_f64(candidate, &["location", "latitude"]),
            longitude: opt_f64(candidate, &["location", "longitude"]),
            precisely_id: str_or(candidate, &["preciselyId"], ""),
            formatted_address: str_or(candidate, &["address", "formattedAddress"], ""),
            match_score: opt_f64(candidate, &["matchScore"]),
        })
    }
}

// ── emergency contacts (PSAP + AHJ) ────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsapRecord {
    pub agency: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub psap_type: String,
    pub fcc_id: String,
    pub county: String,
    pub county_fips: String,
    pub site_address: String,
    pub site_latitude: Option<f64>,
    pub site_longitude: Option<f64>,
}

impl PsapRecord {
    fn from_value(psap: &Value) -> Self {
        Self {
            agency: str_or(psap, &["agency"], "Unknown"),
            phone: str_or(psap, &["phone"], "Unknown"),
            psap_type: str_or(psap, &["type"], "Unknown"),
            fcc_id: str_or(psap, &["fccId"], ""),
            county: str_or(psap, &["county", "name"], ""),
            county_fips: str_or(psap, &["county", "fips"], ""),
            site_address: str_or(psap, &["siteDetails", "address", "formattedAddress"], ""),
            site_latitude: opt_f64(psap, &["siteDetails", "geocode", "latitude"]),
            site_longitude: opt_f64(psap, &["siteDetails", "geocode", "longitude"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AhjRecord {
    #[serde(rename = "type")]
    pub ahj_type: String,
    pub agency: String,
    pub phone: String,
    pub ahj_id: String,
    pub mailing_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContacts {
    pub psap: PsapRecord,
    pub ahjs: Vec<AhjRecord>,
}

fn check_zero_results(resp: &Value, message: &str) -> Result<Value, ParseError> {
    let response = field(resp, &["response"])
        .cloned()
        .ok_or_else(|| ParseError::NoResults(message.to_string()))?;
    if response.get("status").and_then(|s| s.as_str()) == Some("ZERO_RESULTS") {
        return Err(ParseError::NoResults(message.to_string()));
    }
    Ok(response)
}

impl EmergencyContacts {
    pub fn from_response(resp: &Value) -> Result<Self, ParseError> {
        let response = check_zero_results(resp, "No emergency contact results found for this address")?;
        let psap = response
            .get("psap")
            .map(PsapRecord::from_value)
            .ok_or_else(|| ParseError::Malformed("Response missing psap record".to_string()))?;
        let ahjs = response
            .get("ahjs")
            .and_then(|a| a.as_array())
            .map(|list| {
                list.iter()
                    .map(|ahj| AhjRecord {
                        ahj_type: opt_str(ahj, &["ahjType"])
                            .or_else(|| opt_str(ahj, &["type"]))
                            .unwrap_or_else(|| "Unknown".to_string()),
                        agency: str_or(ahj, &["agency"], "Unknown"),
                        phone: str_or(ahj, &["phone"], "Unknown"),
                        ahj_id: str_or(ahj, &["ahjId"], ""),
                        mailing_address: opt_str(ahj, &["mailingAddress", "formattedAddress"])
                            .or_else(|| opt_str(ahj, &["mailingAddress"])),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self { psap, ahjs })
    }

    /// Location-based lookup returns only the PSAP record.
    pub fn psap_only_from_response(resp: &Value) -> Result<PsapRecord, ParseError> {
        let response = check_zero_results(resp, "No PSAP results found for these coordinates")?;
        response
            .get("psap")
            .map(PsapRecord::from_value)
            .ok_or_else(|| ParseError::Malformed("Response missing psap record".to_string()))
    }
}

// ── enrich_property ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAttributes {
    pub building_type: String,
    pub stories: Option<f64>,
    pub year_built: Option<i64>,
    pub building_area: Option<f64>,
    pub lot_size: Option<f64>,
    pub roof_type: String,
    pub foundation_type: String,
    pub exterior_walls: String,
    pub heating_fuel: String,
    pub heating_type: String,
    pub cooling_type: String,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub rooms: Option<f64>,
    pub garage_type: String,
    pub pool_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessOccupant {
    pub business_name: String,
    pub sic_code: Option<String>,
    pub naics_code: Option<String>,
    pub employee_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardProfile {
    pub earthquake_risk: String,
    pub flood_zone: String,
    pub flood_risk: String,
    pub wildfire_risk: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub population: Option<i64>,
    pub median_household_income: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyProfile {
    pub precisely_id: String,
    pub formatted_address: String,
    pub property: PropertyAttributes,
    pub business: Option<BusinessOccupant>,
    pub hazards: HazardProfile,
    pub demographics: Demographics,
}

impl PropertyProfile {
    pub fn from_response(resp: &Value) -> Result<Self, ParseError> {
        let addr = field(resp, &["data", "address"])
            .filter(|a| !a.is_null())
            .ok_or_else(|| ParseError::NoResults("No property data returned for this address".to_string()))?;
        let prop = addr.get("property").cloned().unwrap_or(Value::Null);
        let property = PropertyAttributes {
            building_type: str_or(&prop, &["buildingType"], "Unknown"),
            stories: opt_f64(&prop, &["stories"]),
            year_built: opt_i64(&prop, &["yearBuilt"]),
            building_area: opt_f64(&prop, &["buildingArea"]),
            lot_size: opt_f64(&prop, &["lotSize"]),
            roof_type: str_or(&prop, &["roofType"], "Unknown"),
            foundation_type: str_or(&prop, &["foundationType"], "Unknown"),
            exterior_walls: str_or(&prop, &["exteriorWalls"], "Unknown"),
            heating_fuel: str_or(&prop, &["heatingFuel"], "Unknown"),
            heating_type: str_or(&prop, &["heatingType"], "Unknown"),
            cooling_type: str_or(&prop, &["coolingType"], "Unknown"),
            bedrooms: opt_f64(&prop, &["numberOfBedrooms"]),
            bathrooms: opt_f64(&prop, &["numberOfBathrooms"]),
            rooms: opt_f64(&prop, &["numberOfRooms"]),
            garage_type: str_or(&prop, &["garageType"], "None"),
            pool_type: str_or(&prop, &["poolType"], "None"),
        };
        let business = opt_str(addr, &["business", "businessName"]).map(|business_name| BusinessOccupant {
            business_name,
            sic_code: opt_str(addr, &["business", "sicCode"]),
            naics_code: opt_str(addr, &["business", "naicsCode"]),
            employee_count: opt_i64(addr, &["business", "employeeCount"]),
        });
        let hazards = HazardProfile {
            earthquake_risk: str_or(addr, &["hazards", "earthquake", "riskScore"], "Unknown"),
            flood_zone: str_or(addr, &["hazards", "flood", "zone"], "Unknown"),
            flood_risk: str_or(addr, &["hazards", "flood", "floodRisk"], "Unknown"),
            wildfire_risk: str_or(addr, &["hazards", "wildfire", "riskScore"], "Unknown"),
        };
        let demographics = Demographics {
            population: opt_i64(addr, &["demographics", "population"]),
            median_household_income: opt_i64(addr, &["demographics", "medianHouseholdIncome"]),
        };
        Ok(Self {
            precisely_id: str_or(addr, &["preciselyId"], ""),
            formatted_address: str_or(addr, &["formattedAddress"], ""),
            property,
            business,
            hazards,
            demographics,
        })
    }
}

// ── calculate_route ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub total_distance: Option<f64>,
    pub total_time: Option<f64>,
    pub distance_unit: String,
    pub time_unit: String,
}

impl RouteEstimate {
    pub fn from_response(resp: &Value) -> Result<Self, ParseError> {
        if resp.get("totalDistance").is_none() && resp.get("totalTime").is_none() {
            return Err(ParseError::Malformed("Route response missing totals".to_string()));
        }
        Ok(Self {
            total_distance: opt_f64(resp, &["totalDistance"]),
            total_time: opt_f64(resp, &["totalTime"]),
            distance_unit: "mi".to_string(),
            time_unit: "min".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentinel_float_normalizes_to_none() {
        let resp = json!({
            "data": {"address": {"property": {"buildingArea": -9999.0, "stories": 2}}}
        });
        let profile = PropertyProfile::from_response(&resp).unwrap();
        assert_eq!(profile.property.building_area, None);
        assert_eq!(profile.property.stories, Some(2.0));
    }

    #[test]
    fn sentinel_int_normalizes_to_none() {
        let resp = json!({
            "data": {"address": {"property": {"yearBuilt": -9999}}}
        });
        let profile = PropertyProfile::from_response(&resp).unwrap();
        assert_eq!(profile.property.year_built, None);
    }

    #[test]
    fn serialized_absence_is_null_not_sentinel() {
        let resp = json!({"data": {"address": {"property": {"lotSize": -9999}}}});
        let profile = PropertyProfile::from_response(&resp).unwrap();
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["property"]["lot_size"], json!(null));
    }

    #[test]
    fn verify_parses_full_record() {
        let resp = json!({
            "responses": [{
                "address": {
                    "formattedAddress": "350 JORDAN RD, TROY, NY 12180-8352",
                    "formattedStreetAddress": "350 JORDAN RD",
                    "city": "TROY",
                    "admin1": "NY",
                    "postalCode": "12180-8352",
                    "country": "USA",
                    "preciselyId": "P0000GL41OME"
                },
                "geocode": {"latitude": 42.6812, "longitude": -73.7021},
                "confidence": 94.5
            }]
        });
        let v = AddressVerification::from_response(&resp).unwrap();
        assert_eq!(v.city, "TROY");
        assert_eq!(v.confidence, Some(94.5));
        assert_eq!(v.latitude, Some(42.6812));
    }

    #[test]
    fn verify_empty_responses_is_no_results() {
        let resp = json!({"responses": []});
        assert!(matches!(AddressVerification::from_response(&resp), Err(ParseError::NoResults(_))));
    }

    #[test]
    fn geocode_missing_candidates_is_no_results() {
        let resp = json!({"responses": [{"candidates": []}]});
        assert!(matches!(GeocodeResult::from_response(&resp), Err(ParseError::NoResults(_))));
    }

    #[test]
    fn contacts_zero_results_status() {
        let resp = json!({"response": {"status": "ZERO_RESULTS"}});
        assert!(matches!(EmergencyContacts::from_response(&resp), Err(ParseError::NoResults(_))));
    }

    #[test]
    fn contacts_parse_psap_and_ahjs() {
        let resp = json!({
            "response": {
                "psap": {
                    "agency": "Rensselaer County 911",
                    "phone": "(518) 555-0100",
                    "type": "PRIMARY",
                    "fccId": "1234",
                    "county": {"name": "Rensselaer", "fips": "36083"},
                    "siteDetails": {
                        "address": {"formattedAddress": "1600 7th Ave, Troy, NY"},
                        "geocode": {"latitude": 42.73, "longitude": -73.69}
                    }
                },
                "ahjs": [
                    {"ahjType": "FIRE", "agency": "Troy FD", "phone": "(518) 555-0111",
                     "ahjId": "F1", "mailingAddress": {"formattedAddress": "2175 5th Ave, Troy, NY"}},
                    {"type": "EMS", "agency": "Empire Ambulance", "phone": "(518) 555-0122", "ahjId": "E1"}
                ]
            }
        });
        let contacts = EmergencyContacts::from_response(&resp).unwrap();
        assert_eq!(contacts.psap.county, "Rensselaer");
        assert_eq!(contacts.psap.site_latitude, Some(42.73));
        assert_eq!(contacts.ahjs.len(), 2);
        assert_eq!(contacts.ahjs[0].ahj_type, "FIRE");
        assert_eq!(contacts.ahjs[0].mailing_address.as_deref(), Some("2175 5th Ave, Troy, NY"));
        assert_eq!(contacts.ahjs[1].mailing_address, None);
    }

    #[test]
    fn psap_missing_fields_default_to_unknown() {
        let resp = json!({"response": {"psap": {}}});
        let psap = EmergencyContacts::psap_only_from_response(&resp).unwrap();
        assert_eq!(psap.agency, "Unknown");
        assert_eq!(psap.site_latitude, None);
    }

    #[test]
    fn business_occupant_absent_when_no_name() {
        let resp = json!({
            "data": {"address": {"business": {"businessName": null, "employeeCount": 40}}}
        });
        let profile = PropertyProfile::from_response(&resp).unwrap();
        assert!(profile.business.is_none());
    }

    #[test]
    fn property_null_address_is_no_results() {
        let resp = json!({"data": {"address": null}});
        assert!(matches!(PropertyProfile::from_response(&resp), Err(ParseError::NoResults(_))));
    }

    #[test]
    fn route_parses_totals_with_units() {
        let resp = json!({"totalDistance": 3.4, "totalTime": 7.0});
        let route = RouteEstimate::from_response(&resp).unwrap();
        assert_eq!(route.total_distance, Some(3.4));
        assert_eq!(route.distance_unit, "mi");
    }

    #[test]
    fn route_missing_totals_is_malformed() {
        let resp = json!({"status": "ok"});
        assert!(matches!(RouteEstimate::from_response(&resp), Err(ParseError::Malformed(_))));
    }
}
