//! ACS 5-year demographics for a single ZIP code tabulation area.
//!
//! The Census Data API answers with a JSON array of arrays: a header row
//! of variable codes followed by one row of values per matched geography.
//!
//! ```text
//! [["NAME","B01003_001E",...,"zip code tabulation area"],
//!  ["ZCTA5 94043","33221",...,"94043"]]
//! ```

use std::collections::BTreeMap;

use zip_map_census_models::{AgeBreakdown, Demographics, ZipCode};

use crate::CensusError;

/// Column holding the ZCTA code in the response.
const ZCTA_COLUMN: &str = "zip code tabulation area";

/// An ACS variable requested for every lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcsVariable {
    /// Variable code (e.g. `"B01003_001E"`).
    pub code: &'static str,
    /// What the estimate counts.
    pub label: &'static str,
}

/// Total population.
pub const POPULATION: AcsVariable = AcsVariable {
    code: "B01003_001E",
    label: "Total population",
};
/// Median age in years.
pub const MEDIAN_AGE: AcsVariable = AcsVariable {
    code: "B01002_001E",
    label: "Median age",
};
/// Residents reporting White alone.
pub const RACE_WHITE: AcsVariable = AcsVariable {
    code: "B02001_002E",
    label: "White alone",
};
/// Residents reporting Black or African American alone.
pub const RACE_BLACK: AcsVariable = AcsVariable {
    code: "B02001_003E",
    label: "Black or African American alone",
};
/// Residents reporting American Indian and Alaska Native alone.
pub const RACE_NATIVE: AcsVariable = AcsVariable {
    code: "B02001_004E",
    label: "American Indian and Alaska Native alone",
};
/// Residents reporting Asian alone.
pub const RACE_ASIAN: AcsVariable = AcsVariable {
    code: "B02001_005E",
    label: "Asian alone",
};
/// Children under 18 in households. Used as the under-18 count.
pub const UNDER_18: AcsVariable = AcsVariable {
    code: "B09001_001E",
    label: "Population under 18 years",
};
/// Median household income in dollars.
pub const MEDIAN_INCOME: AcsVariable = AcsVariable {
    code: "B19013_001E",
    label: "Median household income",
};
/// Population 25 and over, the base for the education shares.
pub const EDUCATION_POPULATION: AcsVariable = AcsVariable {
    code: "B15003_001E",
    label: "Population 25 years and over",
};
/// Adults whose highest degree is a bachelor's.
pub const EDUCATION_BACHELORS: AcsVariable = AcsVariable {
    code: "B15003_022E",
    label: "Bachelor's degree",
};
/// Adults whose highest degree is a master's.
pub const EDUCATION_GRADUATE: AcsVariable = AcsVariable {
    code: "B15003_023E",
    label: "Master's degree",
};
/// Median value of owner-occupied homes in dollars.
pub const MEDIAN_HOME_VALUE: AcsVariable = AcsVariable {
    code: "B25077_001E",
    label: "Median home value",
};
/// Median gross rent in dollars.
pub const MEDIAN_RENT: AcsVariable = AcsVariable {
    code: "B25064_001E",
    label: "Median gross rent",
};
/// Total housing units.
pub const HOUSING_UNITS: AcsVariable = AcsVariable {
    code: "B25001_001E",
    label: "Housing units",
};
/// Occupied units lived in by their owner.
pub const OWNER_OCCUPIED: AcsVariable = AcsVariable {
    code: "B25003_002E",
    label: "Owner occupied",
};
/// Occupied units lived in by renters.
pub const RENTER_OCCUPIED: AcsVariable = AcsVariable {
    code: "B25003_003E",
    label: "Renter occupied",
};
/// Workers 16 and over, the base for the commute shares.
pub const COMMUTE_TOTAL: AcsVariable = AcsVariable {
    code: "B08301_001E",
    label: "Workers 16 years and over",
};
/// Workers commuting by car, truck, or van.
pub const COMMUTE_DRIVE: AcsVariable = AcsVariable {
    code: "B08301_002E",
    label: "Car, truck, or van",
};
/// Workers commuting by public transportation.
pub const COMMUTE_PUBLIC: AcsVariable = AcsVariable {
    code: "B08301_010E",
    label: "Public transportation",
};
/// Workers who work from home.
pub const COMMUTE_WFH: AcsVariable = AcsVariable {
    code: "B08301_021E",
    label: "Worked from home",
};

/// Every variable requested, in request order.
pub const VARIABLES: &[AcsVariable] = &[
    POPULATION,
    MEDIAN_AGE,
    RACE_WHITE,
    RACE_BLACK,
    RACE_NATIVE,
    RACE_ASIAN,
    UNDER_18,
    MEDIAN_INCOME,
    EDUCATION_POPULATION,
    EDUCATION_BACHELORS,
    EDUCATION_GRADUATE,
    MEDIAN_HOME_VALUE,
    MEDIAN_RENT,
    HOUSING_UNITS,
    OWNER_OCCUPIED,
    RENTER_OCCUPIED,
    COMMUTE_TOTAL,
    COMMUTE_DRIVE,
    COMMUTE_PUBLIC,
    COMMUTE_WFH,
];

/// Fetches ACS 5-year demographics for a ZIP code tabulation area.
///
/// `base_url` is the dataset endpoint, e.g.
/// `https://api.census.gov/data/2022/acs/acs5`.
///
/// # Errors
///
/// * [`CensusError::Status`] on a non-success HTTP status
/// * [`CensusError::NotFound`] if the response has no data row
/// * [`CensusError::Json`] / [`CensusError::Conversion`] if the body isn't
///   a table of rows
pub async fn fetch_demographics(
    client: &reqwest::Client,
    base_url: &str,
    zip: &ZipCode,
) -> Result<Demographics, CensusError> {
    let get = std::iter::once("NAME")
        .chain(VARIABLES.iter().map(|v| v.code))
        .collect::<Vec<_>>()
        .join(",");
    let geography = format!("{ZCTA_COLUMN}:{zip}");

    log::debug!("Fetching ACS demographics for ZCTA {zip}");

    let resp = client
        .get(base_url)
        .query(&[("get", get.as_str()), ("for", geography.as_str())])
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        log::warn!("ACS request for {zip} failed with {status}");
        return Err(CensusError::Status {
            service: "Census",
            status,
        });
    }

    // A ZCTA with no data is answered with an empty body, not an empty array.
    let body = resp.text().await?;
    let rows: serde_json::Value = if body.trim().is_empty() {
        serde_json::Value::Array(Vec::new())
    } else {
        serde_json::from_str(&body)?
    };

    let fields = pair_header_and_values(&rows, zip)?;
    let demographics = demographics_from_fields(&fields, zip);

    log::info!(
        "Loaded ACS demographics for {zip}: population {}",
        demographics.population
    );

    Ok(demographics)
}

/// Zips the header row with the first data row into a field map.
///
/// Cells may be strings, numbers, or null; null cells are omitted.
fn pair_header_and_values(
    rows: &serde_json::Value,
    zip: &ZipCode,
) -> Result<BTreeMap<String, String>, CensusError> {
    let rows = rows.as_array().ok_or_else(|| CensusError::Conversion {
        message: "ACS response is not an array of rows".to_string(),
    })?;

    if rows.len() < 2 {
        return Err(CensusError::NotFound {
            what: "demographic",
            zip: zip.to_string(),
        });
    }

    let as_row = |row: &serde_json::Value| {
        row.as_array()
            .cloned()
            .ok_or_else(|| CensusError::Conversion {
                message: "ACS row is not an array".to_string(),
            })
    };
    let headers = as_row(&rows[0])?;
    let values = as_row(&rows[1])?;

    Ok(headers
        .iter()
        .zip(values.iter())
        .filter_map(|(header, value)| {
            let header = header.as_str()?.to_string();
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some((header, value))
        })
        .collect())
}

/// Builds a [`Demographics`] record from a field map.
fn demographics_from_fields(fields: &BTreeMap<String, String>, zip: &ZipCode) -> Demographics {
    let count = |var: AcsVariable| parse_count(fields.get(var.code).map(String::as_str));
    let median = |var: AcsVariable| parse_median(fields.get(var.code).map(String::as_str));

    let population = count(POPULATION);
    let ages = AgeBreakdown::approximate(population, count(UNDER_18));

    Demographics {
        name: fields.get("NAME").cloned().unwrap_or_default(),
        zip_code: fields
            .get(ZCTA_COLUMN)
            .cloned()
            .unwrap_or_else(|| zip.to_string()),
        population,
        median_age: parse_median_f64(fields.get(MEDIAN_AGE.code).map(String::as_str)),
        median_income: median(MEDIAN_INCOME),
        median_home_value: median(MEDIAN_HOME_VALUE),
        median_rent: median(MEDIAN_RENT),
        race_white: count(RACE_WHITE),
        race_black: count(RACE_BLACK),
        race_native: count(RACE_NATIVE),
        race_asian: count(RACE_ASIAN),
        education_population: count(EDUCATION_POPULATION),
        education_bachelors: count(EDUCATION_BACHELORS),
        education_graduate: count(EDUCATION_GRADUATE),
        housing_units: count(HOUSING_UNITS),
        owner_occupied: count(OWNER_OCCUPIED),
        renter_occupied: count(RENTER_OCCUPIED),
        commute_total: count(COMMUTE_TOTAL),
        commute_drive: count(COMMUTE_DRIVE),
        commute_public: count(COMMUTE_PUBLIC),
        commute_wfh: count(COMMUTE_WFH),
        ages,
    }
}

/// Parses a count estimate. Missing, unparsable, and negative values
/// (ACS annotation sentinels) all become zero.
fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0)
}

/// Parses a median estimate, treating sentinels as missing.
fn parse_median(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(|n| u64::try_from(n).ok())
}

fn parse_median_f64(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite() && *n >= 0.0)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn zip(s: &str) -> ZipCode {
        ZipCode::parse(s).unwrap()
    }

    fn sample_table() -> serde_json::Value {
        let mut headers = vec![serde_json::json!("NAME")];
        let mut values = vec![serde_json::json!("ZCTA5 94043")];
        for var in VARIABLES {
            headers.push(serde_json::json!(var.code));
            let value = match var.code {
                "B01003_001E" => "1000",
                "B09001_001E" => "200",
                "B01002_001E" => "35.4",
                "B19013_001E" => "-666666666",
                "B25077_001E" => "1500000",
                "B02001_002E" => "-1",
                _ => "10",
            };
            values.push(serde_json::json!(value));
        }
        headers.push(serde_json::json!(ZCTA_COLUMN));
        values.push(serde_json::json!("94043"));
        serde_json::json!([headers, values])
    }

    #[test]
    fn pairs_fields_by_position_and_derives_ages() {
        let fields = pair_header_and_values(&sample_table(), &zip("94043")).unwrap();
        let demo = demographics_from_fields(&fields, &zip("94043"));

        assert_eq!(demo.name, "ZCTA5 94043");
        assert_eq!(demo.zip_code, "94043");
        assert_eq!(demo.population, 1000);
        assert_eq!(demo.ages.under_18, 200);
        assert_eq!(demo.ages.age_65_plus, 150);
        assert_eq!(demo.ages.age_18_to_64, 650);
        assert_eq!(demo.median_age, Some(35.4));
        assert_eq!(demo.median_home_value, Some(1_500_000));
        assert_eq!(demo.commute_wfh, 10);
    }

    #[test]
    fn suppressed_values_do_not_go_negative() {
        let fields = pair_header_and_values(&sample_table(), &zip("94043")).unwrap();
        let demo = demographics_from_fields(&fields, &zip("94043"));

        assert_eq!(demo.median_income, None);
        assert_eq!(demo.race_white, 0);
    }

    #[test]
    fn numeric_and_null_cells_are_handled() {
        let table = serde_json::json!([
            ["NAME", "B01003_001E", "B09001_001E", "B25064_001E"],
            ["ZCTA5 00001", 500, null, "1200"]
        ]);
        let fields = pair_header_and_values(&table, &zip("00001")).unwrap();
        let demo = demographics_from_fields(&fields, &zip("00001"));

        assert_eq!(demo.population, 500);
        assert_eq!(demo.ages.under_18, 0);
        assert_eq!(demo.median_rent, Some(1200));
        assert_eq!(demo.zip_code, "00001");
    }

    #[test]
    fn header_only_table_is_not_found() {
        let table = serde_json::json!([["NAME", "B01003_001E"]]);
        let err = pair_header_and_values(&table, &zip("99999")).unwrap_err();
        assert_eq!(err.to_string(), "No demographic data found for ZIP code 99999.");
    }

    #[test]
    fn variable_list_has_no_duplicates() {
        let mut codes: Vec<_> = VARIABLES.iter().map(|v| v.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), VARIABLES.len());
    }

    #[tokio::test]
    async fn fetch_demographics_requests_fixed_variables() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("for", "zip code tabulation area:94043"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_table()))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let demo = fetch_demographics(&client, &server.uri(), &zip("94043"))
            .await
            .unwrap();

        assert_eq!(demo.population, 1000);

        let requests = server.received_requests().await.unwrap();
        let get = requests[0]
            .url
            .query_pairs()
            .find(|(k, _)| k == "get")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert!(get.starts_with("NAME,B01003_001E,"));
        assert!(get.contains("B08301_021E"));
    }

    #[tokio::test]
    async fn empty_body_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = fetch_demographics(&client, &server.uri(), &zip("99999"))
            .await
            .unwrap_err();
        assert!(matches!(err, CensusError::NotFound { .. }));
    }

    #[tokio::test]
    async fn server_error_is_reported_with_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = fetch_demographics(&client, &server.uri(), &zip("94043"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Census API error: 500 Internal Server Error");
    }
}
