use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::SecSettings;
use crate::data_source::{ConceptRequest, FilingSource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{parse_iso_date, FilingFact};

/// SEC EDGAR `companyconcept` adapter for us-gaap facts reported in USD.
#[derive(Clone)]
pub struct SecAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    user_agent: String,
}

impl SecAdapter {
    pub fn new(settings: &SecSettings) -> Self {
        Self::with_http_client(settings, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(settings: &SecSettings, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
            user_agent: settings.user_agent(),
        }
    }

    fn concept_url(&self, req: &ConceptRequest) -> String {
        format!(
            "{}/api/xbrl/companyconcept/{}/us-gaap/{}.json",
            self.base_url, req.cik, req.tag
        )
    }

    async fn fetch_concept(&self, req: ConceptRequest) -> Result<Vec<FilingFact>, SourceError> {
        let endpoint = self.concept_url(&req);
        let request = HttpRequest::get(&endpoint).with_headers([
            ("Content-Type", "application/json"),
            ("Accept-Encoding", "gzip, deflate"),
            ("User-Agent", self.user_agent.as_str()),
        ]);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| SourceError::unavailable(format!("sec transport error: {}", e.message())))?;

        // A missing concept is routine for banks that never reported the tag.
        if !response.is_success() {
            warn!(
                cik = %req.cik,
                tag = %req.tag,
                status = response.status,
                reason = response.reason(),
                "sec concept request failed"
            );
            return Ok(Vec::new());
        }

        let facts = parse_concept(&response.body)?;
        debug!(cik = %req.cik, tag = %req.tag, facts = facts.len(), "sec concept parsed");
        Ok(facts)
    }
}

impl FilingSource for SecAdapter {
    fn id(&self) -> &'static str {
        "sec"
    }

    fn concept<'a>(
        &'a self,
        req: ConceptRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FilingFact>, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_concept(req).await })
    }
}

/// Reads `units.USD` in document order. Other units are ignored.
fn parse_concept(body: &str) -> Result<Vec<FilingFact>, SourceError> {
    let concept: CompanyConcept = serde_json::from_str(body)
        .map_err(|e| SourceError::parse(format!("failed to parse sec concept: {e}")))?;

    concept
        .units
        .usd
        .into_iter()
        .map(|raw| {
            let end = parse_iso_date(&raw.end).map_err(|e| SourceError::parse(e.to_string()))?;
            let start = raw
                .start
                .as_deref()
                .map(parse_iso_date)
                .transpose()
                .map_err(|e| SourceError::parse(e.to_string()))?;
            Ok(FilingFact {
                start,
                end,
                value: raw.val,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct CompanyConcept {
    #[serde(default)]
    units: ConceptUnits,
}

#[derive(Debug, Default, Deserialize)]
struct ConceptUnits {
    #[serde(rename = "USD", default)]
    usd: Vec<ConceptFact>,
}

#[derive(Debug, Deserialize)]
struct ConceptFact {
    #[serde(default)]
    start: Option<String>,
    end: String,
    val: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_duration_and_instant_facts() {
        let body = r#"{"cik":70858,"taxonomy":"us-gaap","tag":"NetIncomeLoss","units":{"USD":[
            {"start":"2023-01-01","end":"2023-03-31","val":8161000000,"form":"10-Q"},
            {"end":"2023-03-31","val":1200,"form":"10-Q"}]}}"#;

        let facts = parse_concept(body).expect("concept parses");
        assert_eq!(
            facts,
            vec![
                FilingFact::duration(date!(2023 - 01 - 01), date!(2023 - 03 - 31), 8_161_000_000.0),
                FilingFact::instant(date!(2023 - 03 - 31), 1200.0),
            ]
        );
    }

    #[test]
    fn missing_usd_unit_yields_no_facts() {
        let body = r#"{"units":{"shares":[{"end":"2023-03-31","val":1}]}}"#;
        assert!(parse_concept(body).expect("concept parses").is_empty());
    }

    #[test]
    fn rejects_malformed_dates() {
        let body = r#"{"units":{"USD":[{"end":"03/31/2023","val":1}]}}"#;
        assert!(parse_concept(body).is_err());
    }
}
