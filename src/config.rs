use crate::error::{ListingsError, Result};
use crate::fetcher::{join_url, BASE_URL};
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;

/// Control that exposes the list of published report years.
const YEAR_CONTROL: &str = "report_year";

/// Pull the backing API path out of the landing page. The page embeds it as
/// a `data-api` attribute on the `#market-data` element; anything else means
/// the portal markup changed underneath us.
pub fn resolve_config_endpoint(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("#market-data").unwrap();

    let element = document.select(&selector).next().ok_or_else(|| {
        ListingsError::ConfigNotFound {
            detail: "no #market-data element on the landing page".to_string(),
        }
    })?;

    let path = element
        .value()
        .attr("data-api")
        .ok_or_else(|| ListingsError::ConfigNotFound {
            detail: "#market-data element carries no data-api attribute".to_string(),
        })?;

    Ok(join_url(BASE_URL, path))
}

/// The configuration JSON served by the endpoint discovered above. Only the
/// pieces the pipeline needs are modeled; the portal ships a lot more.
#[derive(Debug, Deserialize)]
pub struct PortalConfig {
    #[serde(default)]
    input: InputSection,
    #[serde(default)]
    submit: SubmitSection,
}

#[derive(Debug, Default, Deserialize)]
struct InputSection {
    #[serde(default)]
    groups: Vec<ControlGroup>,
}

#[derive(Debug, Default, Deserialize)]
struct ControlGroup {
    #[serde(default)]
    controls: Vec<Control>,
}

#[derive(Debug, Default, Deserialize)]
struct Control {
    #[serde(default)]
    name: String,
    data: Option<ControlData>,
}

#[derive(Debug, Deserialize)]
struct ControlData {
    endpoint: Option<EndpointSet>,
}

#[derive(Debug, Default, Deserialize)]
struct SubmitSection {
    #[serde(default)]
    endpoints: Vec<SubmitEndpoint>,
}

#[derive(Debug, Deserialize)]
struct SubmitEndpoint {
    endpoint: Option<EndpointSet>,
    // Pairs of [parameter name, literal or dynamic spec].
    #[serde(default)]
    query: Vec<(String, Value)>,
}

#[derive(Debug, Deserialize)]
struct EndpointSet {
    prod: Option<String>,
}

impl PortalConfig {
    pub fn from_json(url: &str, body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| ListingsError::InvalidJson {
            url: url.to_string(),
            detail: e.to_string(),
        })
    }

    /// Endpoint listing the monthly reports of a given year.
    pub fn reports_endpoint(&self) -> Result<&str> {
        self.submit_endpoint()?
            .endpoint
            .as_ref()
            .and_then(|set| set.prod.as_deref())
            .ok_or_else(|| missing("submit endpoint has no prod URL"))
    }

    /// Endpoint listing the published report years, taken from the
    /// `report_year` control definition.
    pub fn years_endpoint(&self) -> Result<&str> {
        let control = self
            .input
            .groups
            .iter()
            .flat_map(|group| group.controls.iter())
            .find(|control| control.name == YEAR_CONTROL)
            .ok_or_else(|| missing("no report_year control in the configuration"))?;

        control
            .data
            .as_ref()
            .and_then(|data| data.endpoint.as_ref())
            .and_then(|set| set.prod.as_deref())
            .ok_or_else(|| missing("report_year control exposes no endpoint URL"))
    }

    /// Materialize the submit query mapping. Dynamic entries are resolved
    /// against `values` (e.g. `report_type`, `report_year`); everything else
    /// is passed through literally.
    pub fn query_params(&self, values: &[(&str, String)]) -> Result<Vec<(String, String)>> {
        let mut params = Vec::new();

        for (key, spec) in &self.submit_endpoint()?.query {
            let resolved = match spec {
                Value::Object(map) if is_dynamic(map) => {
                    let source = map
                        .get("value")
                        .and_then(Value::as_str)
                        .ok_or_else(|| missing("dynamic query field without a source key"))?;
                    values
                        .iter()
                        .find(|(name, _)| *name == source)
                        .map(|(_, value)| value.clone())
                        .ok_or_else(|| {
                            missing(&format!("no value defined for dynamic field '{}'", source))
                        })?
                }
                Value::String(literal) => literal.clone(),
                other => other.to_string(),
            };
            params.push((key.clone(), resolved));
        }

        Ok(params)
    }

    fn submit_endpoint(&self) -> Result<&SubmitEndpoint> {
        self.submit
            .endpoints
            .first()
            .ok_or_else(|| missing("configuration declares no submit endpoints"))
    }
}

fn is_dynamic(map: &serde_json::Map<String, Value>) -> bool {
    map.get("dynamic").and_then(Value::as_bool).unwrap_or(false)
}

fn missing(detail: &str) -> ListingsError {
    ListingsError::ConfigNotFound {
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_JSON: &str = r#"{
        "input": {
            "groups": [
                {"controls": [
                    {"name": "report_type"},
                    {"name": "report_year",
                     "data": {"endpoint": {"prod": "/api/report-years"}}}
                ]}
            ]
        },
        "submit": {
            "endpoints": [
                {"endpoint": {"prod": "/api/reports"},
                 "query": [
                    ["reportType", {"dynamic": true, "value": "report_type"}],
                    ["reportYear", {"dynamic": true, "value": "report_year"}],
                    ["format", "json"]
                 ]}
            ]
        }
    }"#;

    #[test]
    fn resolves_data_api_attribute() {
        let html = r#"<html><body>
            <div id="market-data" data-api="/api/market-data/config"></div>
        </body></html>"#;
        let url = resolve_config_endpoint(html).unwrap();
        assert_eq!(url, "https://www.theocc.com/api/market-data/config");
    }

    #[test]
    fn missing_element_is_config_not_found() {
        let err = resolve_config_endpoint("<html><body></body></html>").unwrap_err();
        assert!(matches!(err, ListingsError::ConfigNotFound { .. }));
    }

    #[test]
    fn missing_attribute_is_config_not_found() {
        let err =
            resolve_config_endpoint(r#"<div id="market-data"></div>"#).unwrap_err();
        assert!(matches!(err, ListingsError::ConfigNotFound { .. }));
    }

    #[test]
    fn exposes_both_endpoints() {
        let config = PortalConfig::from_json("test", CONFIG_JSON).unwrap();
        assert_eq!(config.reports_endpoint().unwrap(), "/api/reports");
        assert_eq!(config.years_endpoint().unwrap(), "/api/report-years");
    }

    #[test]
    fn query_params_resolve_dynamic_and_literal_entries() {
        let config = PortalConfig::from_json("test", CONFIG_JSON).unwrap();
        let params = config
            .query_params(&[
                ("report_type", "options".to_string()),
                ("report_year", "2024".to_string()),
            ])
            .unwrap();
        assert_eq!(
            params,
            vec![
                ("reportType".to_string(), "options".to_string()),
                ("reportYear".to_string(), "2024".to_string()),
                ("format".to_string(), "json".to_string()),
            ]
        );
    }

    #[test]
    fn unresolved_dynamic_field_is_an_error() {
        let config = PortalConfig::from_json("test", CONFIG_JSON).unwrap();
        let err = config
            .query_params(&[("report_type", "options".to_string())])
            .unwrap_err();
        assert!(matches!(err, ListingsError::ConfigNotFound { .. }));
    }

    #[test]
    fn invalid_json_is_reported_with_the_url() {
        let err = PortalConfig::from_json("http://x/config", "not json").unwrap_err();
        match err {
            ListingsError::InvalidJson { url, .. } => assert_eq!(url, "http://x/config"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
