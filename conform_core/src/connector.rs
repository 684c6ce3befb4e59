//! Connectors, their authentication variants, and connection-test descriptions.
//!
//! The core never performs the connection test itself. [`TestConfig::prepare`]
//! turns a validated configuration into a [`ProbeRequest`] for whatever
//! transport runs the probe, and [`ExpectedResponse::evaluate`] judges the
//! status and body that transport reports back.

use crate::error::ConformError;
use crate::fields::{
    read_back, validate_submission, validate_update, Audience, FormField, Submission,
    ValidatedConfig, ValidationErrors,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{\s*([A-Za-z0-9_.-]+)\s*\}").expect("placeholder grammar is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthMethod {
    ApiKey,
    Oauth2,
    BasicAuth,
    ServiceAccount,
    Token,
    UsernamePassword,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::ApiKey => "API key",
            AuthMethod::Oauth2 => "OAuth 2.0",
            AuthMethod::BasicAuth => "Basic auth",
            AuthMethod::ServiceAccount => "Service account",
            AuthMethod::Token => "Token",
            AuthMethod::UsernamePassword => "Username & password",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeMethod {
    HttpGet,
    HttpPost,
    Custom,
    /// Passing field validation is the whole test
    ValidateFormat,
}

impl ProbeMethod {
    pub fn is_http(&self) -> bool {
        matches!(self, ProbeMethod::HttpGet | ProbeMethod::HttpPost)
    }

    pub fn verb(&self) -> Option<&'static str> {
        match self {
            ProbeMethod::HttpGet => Some("GET"),
            ProbeMethod::HttpPost => Some("POST"),
            ProbeMethod::Custom | ProbeMethod::ValidateFormat => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedResponse {
    /// Exact status expected; any 2xx when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Regex searched for in the response body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,
    pub success_message: String,
    pub failure_message: String,
}

/// What the transport reports back, or what an offline test concludes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub duration_ms: u64,
}

impl ExpectedResponse {
    /// Judges a probe response against the expected status and body.
    pub fn evaluate(&self, status: u16, body: &str, elapsed: Duration) -> ProbeOutcome {
        let mut problems = Vec::new();

        match self.status_code {
            Some(expected) if expected != status => {
                problems.push(format!("expected status {}, got {}", expected, status));
            }
            None if !(200..300).contains(&status) => {
                problems.push(format!("expected a 2xx status, got {}", status));
            }
            _ => {}
        }

        if let Some(pattern) = &self.body_pattern {
            match Regex::new(pattern) {
                Ok(re) if re.is_match(body) => {}
                Ok(_) => problems.push(format!("response body does not match /{}/", pattern)),
                Err(err) => problems.push(format!("body pattern is invalid: {}", err)),
            }
        }

        let success = problems.is_empty();
        ProbeOutcome {
            success,
            message: if success {
                self.success_message.clone()
            } else {
                self.failure_message.clone()
            },
            details: if success {
                None
            } else {
                Some(problems.join("; "))
            },
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    pub id: String,
    pub method: ProbeMethod,
    /// URL template; `${key}` is replaced with the submitted value of `key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub expected_response: ExpectedResponse,
    pub timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_script: Option<String>,
}

/// A connection test ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRequest {
    pub test_id: String,
    pub method: ProbeMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_script: Option<String>,
}

impl ProbeRequest {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl TestConfig {
    /// Field keys referenced by `${...}` in the endpoint, in order of appearance.
    pub fn placeholders(&self) -> Vec<String> {
        let Some(endpoint) = &self.endpoint else {
            return Vec::new();
        };
        let mut keys: Vec<String> = Vec::new();
        for caps in PLACEHOLDER_RE.captures_iter(endpoint) {
            let key = caps[1].to_string();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Substitutes placeholders from `config` and checks the resulting URL.
    pub fn prepare(&self, config: &ValidatedConfig) -> Result<ProbeRequest, ConformError> {
        if self.method.is_http() && self.endpoint.is_none() {
            return Err(ConformError::InvalidEndpoint(format!(
                "test '{}' uses {:?} but has no endpoint",
                self.id, self.method
            )));
        }

        let url = match &self.endpoint {
            Some(template) => Some(substitute(template, config)?),
            None => None,
        };

        if let Some(target) = url.as_deref().filter(|_| self.method.is_http()) {
            let parsed = url::Url::parse(target)
                .map_err(|e| ConformError::InvalidEndpoint(format!("{}: {}", target, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConformError::InvalidEndpoint(format!(
                    "{}: scheme must be http or https",
                    target
                )));
            }
        }

        debug!(
            target: "conform.probe",
            test_id = %self.id,
            method = ?self.method,
            timeout_ms = self.timeout_ms,
            "probe prepared"
        );

        Ok(ProbeRequest {
            test_id: self.id.clone(),
            method: self.method,
            url,
            timeout_ms: self.timeout_ms,
            custom_script: self.custom_script.clone(),
        })
    }

    /// Result of a test that needs no transport: `VALIDATE_FORMAT` succeeds once
    /// the configuration has validated. Other methods return `None`.
    pub fn run_offline(&self) -> Option<ProbeOutcome> {
        (self.method == ProbeMethod::ValidateFormat).then(|| ProbeOutcome {
            success: true,
            message: self.expected_response.success_message.clone(),
            details: Some("configuration format validated".to_string()),
            duration_ms: 0,
        })
    }
}

fn substitute(template: &str, config: &ValidatedConfig) -> Result<String, ConformError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let key = &caps[1];
        let value = config
            .get(key)
            .map(|v| v.as_text())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConformError::UnresolvedPlaceholder(key.to_string()))?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(&value);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorVariant {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub auth_method: AuthMethod,
    #[serde(default)]
    pub recommended: bool,
    pub form_fields: Vec<FormField>,
    pub test_config: TestConfig,
    #[serde(default)]
    pub documentation_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl ConnectorVariant {
    pub fn field(&self, key: &str) -> Option<&FormField> {
        self.form_fields.iter().find(|f| f.key() == key)
    }

    /// Fields that take part in a submission (everything but display blocks).
    pub fn submittable_fields(&self) -> impl Iterator<Item = &FormField> {
        self.form_fields.iter().filter(|f| !f.is_display_only())
    }

    pub fn validate(&self, submission: &Submission) -> Result<ValidatedConfig, ValidationErrors> {
        validate_submission(&self.form_fields, submission)
    }

    pub fn validate_update(
        &self,
        previous: &ValidatedConfig,
        submission: &Submission,
    ) -> Result<ValidatedConfig, ValidationErrors> {
        validate_update(&self.form_fields, previous, submission)
    }

    pub fn read_back(
        &self,
        stored: &ValidatedConfig,
        audience: Audience,
    ) -> serde_json::Map<String, serde_json::Value> {
        read_back(&self.form_fields, stored, audience)
    }

    pub fn prepare_probe(&self, config: &ValidatedConfig) -> Result<ProbeRequest, ConformError> {
        self.test_config.prepare(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotifyRole {
    Accountable,
    Informed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotifyUser {
    pub name: String,
    pub email: String,
    pub job_title: String,
    pub role: NotifyRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub variants: Vec<ConnectorVariant>,
    #[serde(default)]
    pub documentation_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_url: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub prioritized: bool,
    /// ISO date the integration is due by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority_notify_users: Vec<NotifyUser>,
    /// ISO date of the next reminder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_nudge_date: Option<String>,
    #[serde(default)]
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_date: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Connector {
    pub fn variant(&self, id: &str) -> Option<&ConnectorVariant> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// The recommended variant, or the first one when none is flagged.
    pub fn default_variant(&self) -> Option<&ConnectorVariant> {
        self.variants
            .iter()
            .find(|v| v.recommended)
            .or_else(|| self.variants.first())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Success,
    Failed,
    Pending,
}

/// A configured connection created from one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInstance {
    pub id: String,
    pub name: String,
    pub variant_id: String,
    pub config: ValidatedConfig,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tested: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_status: Option<TestStatus>,
}

impl ConnectionInstance {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        variant: &ConnectorVariant,
        config: ValidatedConfig,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            variant_id: variant.id.clone(),
            config,
            created_at,
            last_tested: None,
            test_status: Some(TestStatus::Pending),
        }
    }

    pub fn record_test(&mut self, outcome: &ProbeOutcome, at: DateTime<Utc>) {
        self.last_tested = Some(at);
        self.test_status = Some(if outcome.success {
            TestStatus::Success
        } else {
            TestStatus::Failed
        });
    }

    /// JSON view of the instance with its config masked for `audience`.
    pub fn to_display(&self, variant: &ConnectorVariant, audience: Audience) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "variantId": self.variant_id,
            "config": variant.read_back(&self.config, audience),
            "createdAt": self.created_at.to_rfc3339(),
            "lastTested": self.last_tested.map(|t| t.to_rfc3339()),
            "testStatus": self.test_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldValue;

    fn expected(status: Option<u16>, body: Option<&str>) -> ExpectedResponse {
        ExpectedResponse {
            status_code: status,
            body_pattern: body.map(str::to_string),
            headers: None,
            success_message: "connected".to_string(),
            failure_message: "unable to connect".to_string(),
        }
    }

    fn test_config(method: ProbeMethod, endpoint: Option<&str>) -> TestConfig {
        TestConfig {
            id: "t".to_string(),
            method,
            endpoint: endpoint.map(str::to_string),
            expected_response: expected(Some(200), None),
            timeout_ms: 5000,
            custom_script: None,
        }
    }

    fn config(pairs: &[(&str, &str)]) -> ValidatedConfig {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::Text(v.to_string())))
            .collect()
    }

    #[test]
    fn test_prepare_substitutes_placeholders() {
        let test = test_config(
            ProbeMethod::HttpGet,
            Some("https://${subdomain}.salesforce.com/services/oauth2/token"),
        );
        assert_eq!(test.placeholders(), vec!["subdomain".to_string()]);

        let probe = test.prepare(&config(&[("subdomain", "mycompany")])).unwrap();
        assert_eq!(
            probe.url.as_deref(),
            Some("https://mycompany.salesforce.com/services/oauth2/token")
        );
        assert_eq!(probe.timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_prepare_reports_missing_values() {
        let test = test_config(ProbeMethod::HttpPost, Some("https://${host}/${ path }"));
        let err = test.prepare(&config(&[("host", "api.example.com")])).unwrap_err();
        assert!(matches!(err, ConformError::UnresolvedPlaceholder(k) if k == "path"));
    }

    #[test]
    fn test_prepare_requires_http_endpoint() {
        let err = test_config(ProbeMethod::HttpGet, None)
            .prepare(&ValidatedConfig::new())
            .unwrap_err();
        assert_eq!(err.code_str(), "invalid_endpoint");

        let err = test_config(ProbeMethod::HttpGet, Some("ftp://${h}"))
            .prepare(&config(&[("h", "files.example.com")]))
            .unwrap_err();
        assert_eq!(err.code_str(), "invalid_endpoint");

        assert!(test_config(ProbeMethod::ValidateFormat, None)
            .prepare(&ValidatedConfig::new())
            .is_ok());
    }

    #[test]
    fn test_evaluate() {
        let ok = expected(Some(200), Some("access_token"))
            .evaluate(200, r#"{"access_token":"x"}"#, Duration::from_millis(234));
        assert!(ok.success);
        assert_eq!(ok.message, "connected");
        assert_eq!(ok.duration_ms, 234);

        let bad = expected(Some(200), Some("access_token")).evaluate(
            401,
            "denied",
            Duration::from_millis(12),
        );
        assert!(!bad.success);
        assert_eq!(bad.message, "unable to connect");
        let details = bad.details.unwrap();
        assert!(details.contains("expected status 200, got 401"));
        assert!(details.contains("does not match"));

        assert!(expected(None, None).evaluate(204, "", Duration::ZERO).success);
        assert!(!expected(None, None).evaluate(500, "", Duration::ZERO).success);
    }

    #[test]
    fn test_offline_validate_format() {
        let outcome = test_config(ProbeMethod::ValidateFormat, None)
            .run_offline()
            .unwrap();
        assert!(outcome.success);
        assert!(test_config(ProbeMethod::HttpGet, Some("https://x"))
            .run_offline()
            .is_none());
    }
}
