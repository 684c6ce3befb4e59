//! Customer organizations and onboarding records shown on the dashboard.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum OrgRole {
    Sponsor,
    Integrator,
    ProjectManager,
}

impl OrgRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Sponsor => "sponsor",
            OrgRole::Integrator => "integrator",
            OrgRole::ProjectManager => "project-manager",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationUser {
    pub name: String,
    pub email: String,
    pub role: OrgRole,
    pub job_title: String,
    /// ISO timestamp of the user's last visit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PluginStatus {
    Connected,
    NotConnected,
}

/// An organization's view of one catalog connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationPlugin {
    /// Catalog connector id
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub status: PluginStatus,
    #[serde(default)]
    pub prioritized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_nudge_date: Option<String>,
}

impl OrganizationPlugin {
    pub fn is_connected(&self) -> bool {
        self.status == PluginStatus::Connected
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub users: Vec<OrganizationUser>,
    #[serde(default)]
    pub plugins: Vec<OrganizationPlugin>,
    #[serde(default)]
    pub prioritized_integrations: usize,
    #[serde(default)]
    pub connected_integrations: usize,
}

impl Organization {
    /// `(prioritized, connected)` as counted from `plugins`.
    pub fn tally(&self) -> (usize, usize) {
        let prioritized = self.plugins.iter().filter(|p| p.prioritized).count();
        let connected = self.plugins.iter().filter(|p| p.is_connected()).count();
        (prioritized, connected)
    }

    /// Whether the stored counters agree with the plugin list.
    pub fn counts_match(&self) -> bool {
        self.tally() == (self.prioritized_integrations, self.connected_integrations)
    }

    pub fn users_with_role(&self, role: OrgRole) -> impl Iterator<Item = &OrganizationUser> {
        self.users.iter().filter(move |u| u.role == role)
    }

    /// Prioritized plugins that are still waiting on a connection.
    pub fn pending_priorities(&self) -> impl Iterator<Item = &OrganizationPlugin> {
        self.plugins
            .iter()
            .filter(|p| p.prioritized && !p.is_connected())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum OnboardingStatus {
    Discovery,
    Implementation,
    Testing,
    Live,
    OnHold,
}

impl OnboardingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingStatus::Discovery => "discovery",
            OnboardingStatus::Implementation => "implementation",
            OnboardingStatus::Testing => "testing",
            OnboardingStatus::Live => "live",
            OnboardingStatus::OnHold => "on-hold",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Onboarding {
    pub id: String,
    pub company: String,
    pub domain: String,
    pub status: OnboardingStatus,
    pub cs_contact: String,
    pub sales_contact: String,
    #[serde(default)]
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin(id: &str, status: PluginStatus, prioritized: bool) -> OrganizationPlugin {
        OrganizationPlugin {
            id: id.to_string(),
            name: id.to_string(),
            icon: None,
            status,
            prioritized,
            next_nudge_date: None,
        }
    }

    #[test]
    fn test_tally_and_pending() {
        let org = Organization {
            id: "1".to_string(),
            name: "Nike".to_string(),
            domain: "nike.com".to_string(),
            users: Vec::new(),
            plugins: vec![
                plugin("salesforce", PluginStatus::NotConnected, true),
                plugin("hubspot", PluginStatus::Connected, false),
                plugin("slack", PluginStatus::Connected, true),
            ],
            prioritized_integrations: 2,
            connected_integrations: 2,
        };
        assert_eq!(org.tally(), (2, 2));
        assert!(org.counts_match());
        let pending: Vec<_> = org.pending_priorities().map(|p| p.id.as_str()).collect();
        assert_eq!(pending, vec!["salesforce"]);
    }

    #[test]
    fn test_wire_names() {
        let user: OrganizationUser = serde_json::from_value(serde_json::json!({
            "name": "Amy Taylor",
            "email": "amy@target.com",
            "role": "project-manager",
            "jobTitle": "Business Analyst"
        }))
        .unwrap();
        assert_eq!(user.role, OrgRole::ProjectManager);
        assert!(user.last_seen.is_none());

        let status: OnboardingStatus = serde_json::from_str("\"on-hold\"").unwrap();
        assert_eq!(status.as_str(), "on-hold");
        assert_eq!(
            serde_json::to_string(&PluginStatus::NotConnected).unwrap(),
            "\"not-connected\""
        );
    }
}
