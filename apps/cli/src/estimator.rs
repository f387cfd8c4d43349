//! HTTP weight estimation collaborator backed by the Gemini
//! `generateContent` endpoint.
//!
//! The primary model is tried first; on any failure the fallback model is
//! asked the same question. The answer text is handed to
//! [`parse_estimation_response`], so fenced JSON is tolerated.

use std::time::Duration;

use baraa_core::estimation::{
    parse_estimation_response, EstimationRequest, EstimationResponse, WeightEstimator,
};
use baraa_core::EstimationError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EstimationSettings;

const TEMPERATURE: f32 = 0.1;

pub struct GeminiEstimator {
    api_key: String,
    endpoint: String,
    models: Vec<String>,
    client: Client,
}

impl GeminiEstimator {
    /// Builds the client; fails with `Unavailable` when no API key is set.
    pub fn from_settings(settings: &EstimationSettings) -> Result<Self, EstimationError> {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                EstimationError::Unavailable(
                    "no API key (set BARAA_GEMINI_API_KEY or estimation.api_key)".to_string(),
                )
            })?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|err| EstimationError::Transport(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            api_key,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            models: settings.models(),
            client,
        })
    }

    fn ask(&self, model: &str, prompt: &str) -> Result<String, EstimationError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, model);
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: TEMPERATURE,
            },
        };

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|err| EstimationError::Transport(format!("{model}: {err}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EstimationError::Transport(format!("{model} returned {status}: {text}")));
        }

        let parsed: GenerateResponse = resp
            .json()
            .map_err(|err| EstimationError::MalformedResponse(format!("{model}: {err}")))?;
        response_text(parsed)
            .ok_or_else(|| EstimationError::MalformedResponse(format!("{model}: no candidate text")))
    }
}

impl WeightEstimator for GeminiEstimator {
    fn estimate(&self, request: &EstimationRequest) -> Result<EstimationResponse, EstimationError> {
        let prompt = build_prompt(&request.context);
        let mut last_error = EstimationError::Unavailable("no model configured".to_string());

        for model in &self.models {
            debug!(model = %model, product_id = ?request.product_id, "asking estimator");
            match self.ask(model, &prompt).and_then(|text| parse_estimation_response(&text)) {
                Ok(response) => return Ok(response),
                Err(err) => {
                    warn!(model = %model, error = %err, "estimator model failed");
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }
}

/// The instruction sent ahead of the product context.
pub fn build_prompt(context: &str) -> String {
    format!(
        "You estimate shipping weights for a warehouse-club storefront.\n\
         Work out the TOTAL shipping weight of the product below in kilograms.\n\
         \n\
         PRODUCT:\n\
         {context}\n\
         Rules:\n\
         1. Multiply pack counts: \"340g x 6\" is 0.34 * 6 = 2.04kg, \"2.83L x 2\" is 5.66kg.\n\
         2. Liquids weigh 1kg per liter. Grams and kilograms are direct weights.\n\
         3. Sizes such as \"74cm x 74cm\" or \"size 32\" are not weights.\n\
         4. Add 5% for heavy bulk or glass-bottled goods.\n\
         5. With no stated weight, use typical sizes: large detergent 5-8kg, snack box 0.5-1.5kg, vitamins 0.3-0.5kg.\n\
         6. Estimate the shipping markup (won) included in the online price: \
         0 for electronics or items over 100,000 won, 2000 for groceries, \
         3000-5000 for heavy or bulky goods, 2000 when unsure.\n\
         \n\
         Reply with JSON only:\n\
         {{\"weightKg\": number, \"reason\": \"short explanation in Mongolian\", \
         \"confidence\": \"high\" | \"medium\" | \"low\", \"isMultipack\": boolean, \
         \"estimatedMarkupKrw\": number}}\n"
    )
}

fn response_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content
        .parts
        .into_iter()
        .map(|part| part.text)
        .find(|text| !text.trim().is_empty())
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}
