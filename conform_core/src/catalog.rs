//! The connector catalog: connectors, organizations and onboarding records.
//!
//! A catalog is a YAML or JSON document with three top-level lists
//! (`plugins`, `organizations`, `onboardings`). A demo catalog is compiled in;
//! [`Catalog::load_default`] uses it unless `CONFORM_CATALOG_PATH` points
//! elsewhere.

use crate::connector::{Connector, ConnectorVariant};
use crate::error::ConformError;
use crate::org::{Onboarding, Organization};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const DEMO_CATALOG: &str = include_str!("../data/demo_catalog.yaml");

static DEMO: Lazy<Catalog> = Lazy::new(|| {
    Catalog::from_yaml_str(DEMO_CATALOG).expect("embedded demo catalog is valid YAML")
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub plugins: Vec<Connector>,
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub onboardings: Vec<Onboarding>,
}

impl Catalog {
    /// The compiled-in demo catalog.
    pub fn demo() -> &'static Catalog {
        &DEMO
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConformError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConformError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reads a catalog file; `.json` files are parsed as JSON, anything else as YAML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConformError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let catalog = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        info!(
            target: "conform.catalog",
            path = %path.display(),
            plugins = catalog.plugins.len(),
            organizations = catalog.organizations.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn load_default() -> Result<Self, ConformError> {
        if let Ok(path) = std::env::var("CONFORM_CATALOG_PATH") {
            return Self::load_from_path(path);
        }
        debug!(target: "conform.catalog", "using embedded demo catalog");
        Ok(Self::demo().clone())
    }

    pub fn to_yaml(&self) -> Result<String, ConformError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Connectors filtered by category (case-insensitive) and enabled flag.
    pub fn plugins(&self, category: Option<&str>, enabled: Option<bool>) -> Vec<&Connector> {
        self.plugins
            .iter()
            .filter(|p| match category {
                Some(wanted) => p
                    .category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(wanted)),
                None => true,
            })
            .filter(|p| enabled.map_or(true, |e| p.enabled == e))
            .collect()
    }

    pub fn plugin(&self, id: &str) -> Option<&Connector> {
        self.plugins.iter().find(|p| p.id == id)
    }

    pub fn plugin_by_slug(&self, slug: &str) -> Option<&Connector> {
        self.plugins.iter().find(|p| p.slug == slug)
    }

    /// Looks a connector up by id first, then by slug.
    pub fn resolve(&self, name: &str) -> Result<&Connector, ConformError> {
        self.plugin(name)
            .or_else(|| self.plugin_by_slug(name))
            .ok_or_else(|| ConformError::NotFound(format!("connector '{}'", name)))
    }

    /// Finds a variant by id across all connectors.
    pub fn variant(&self, id: &str) -> Option<(&Connector, &ConnectorVariant)> {
        self.plugins
            .iter()
            .find_map(|p| p.variant(id).map(|v| (p, v)))
    }

    pub fn organization(&self, id: &str) -> Option<&Organization> {
        self.organizations
            .iter()
            .find(|o| o.id == id || o.domain.eq_ignore_ascii_case(id))
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .plugins
            .iter()
            .filter_map(|p| p.category.as_deref())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// JSON Schema for catalog documents.
pub fn catalog_json_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(Catalog)).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::AuthMethod;
    use crate::fields::{FieldKind, FieldMode};
    use std::io::Write;

    #[test]
    fn test_demo_catalog_parses() {
        let catalog = Catalog::demo();
        let sf = catalog.plugin("salesforce").unwrap();
        assert_eq!(sf.variants.len(), 2);
        assert_eq!(sf.default_variant().unwrap().id, "salesforce-oauth");
        assert_eq!(sf.priority_due_date.as_deref(), Some("2025-11-02"));

        let (owner, api) = catalog.variant("salesforce-api-key").unwrap();
        assert_eq!(owner.id, "salesforce");
        assert_eq!(api.auth_method, AuthMethod::ApiKey);
        let token = api.field("apiKey").unwrap();
        assert!(token.is_secret());
        assert_eq!(token.mode(), FieldMode::WriteOnly);
    }

    #[test]
    fn test_demo_kinds_round_trip_through_yaml() {
        let hubspot = Catalog::demo().plugin_by_slug("hubspot").unwrap();
        let variant = hubspot.default_variant().unwrap();
        let kinds: Vec<&str> = variant.form_fields.iter().map(|f| f.kind.name()).collect();
        assert_eq!(
            kinds,
            vec!["markdown", "secret", "multiselect", "boolean", "date"]
        );
        match &variant.field("intro").unwrap().kind {
            FieldKind::Markdown(block) => assert!(block.content.contains("private app")),
            other => panic!("unexpected kind {:?}", other),
        }

        let yaml = Catalog::demo().to_yaml().unwrap();
        let reparsed = Catalog::from_yaml_str(&yaml).unwrap();
        assert_eq!(&reparsed, Catalog::demo());
    }

    #[test]
    fn test_plugin_filters() {
        let catalog = Catalog::demo();
        assert_eq!(catalog.plugins(None, None).len(), 2);
        assert_eq!(catalog.plugins(Some("crm"), Some(true)).len(), 2);
        assert!(catalog.plugins(Some("Storage"), None).is_empty());
        assert!(catalog.plugins(None, Some(false)).is_empty());
        assert_eq!(catalog.categories(), vec!["CRM"]);
    }

    #[test]
    fn test_resolve_missing() {
        let err = Catalog::demo().resolve("zendesk").unwrap_err();
        assert_eq!(err.code_str(), "not_found");
        assert!(Catalog::demo().organization("target.com").is_some());
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let json = serde_json::to_string(Catalog::demo()).unwrap();
        file.write_all(json.as_bytes()).unwrap();
        let loaded = Catalog::load_from_path(file.path()).unwrap();
        assert_eq!(loaded.plugins.len(), 2);
        assert_eq!(loaded.onboardings.len(), 2);
    }

    #[test]
    fn test_load_rejects_bad_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(b"plugins: [ { id: 1 ").unwrap();
        let err = Catalog::load_from_path(file.path()).unwrap_err();
        assert_eq!(err.code_str(), "parse_error");
    }

    #[test]
    fn test_schema_names_typename() {
        let schema = catalog_json_schema().to_string();
        assert!(schema.contains("__typename"));
        assert!(schema.contains("SecretField"));
    }
}
