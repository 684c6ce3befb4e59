//! Dashboard summaries built from catalog dates and a [`StatusFormatter`].

use crate::catalog::Catalog;
use crate::connector::Connector;
use crate::dates::StatusFormatter;
use crate::error::ConformError;
use crate::org::Organization;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueSummary {
    pub date: String,
    pub days_remaining: i64,
    pub label: String,
    pub due_soon: bool,
    pub overdue: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NudgeSummary {
    pub date: String,
    pub days_remaining: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorStatus {
    pub id: String,
    pub name: String,
    pub prioritized: bool,
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DueSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nudge: Option<NudgeSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_for: Option<String>,
}

impl ConnectorStatus {
    /// One-line label for list views.
    pub fn headline(&self) -> String {
        if let Some(connected) = &self.connected_for {
            return connected.clone();
        }
        match (&self.due, &self.nudge) {
            (Some(due), _) => due.label.clone(),
            (None, Some(nudge)) => nudge.label.clone(),
            (None, None) if self.connected => "Connected".to_string(),
            (None, None) => "Not connected".to_string(),
        }
    }
}

/// A pending reminder for one organization's plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgNudge {
    pub organization: String,
    pub plugin_id: String,
    pub plugin_name: String,
    pub date: String,
    pub days_remaining: i64,
    pub label: String,
}

pub fn due_summary(fmt: &StatusFormatter, date: &str) -> Result<DueSummary, ConformError> {
    let days = fmt.days_remaining(date)?;
    Ok(DueSummary {
        date: date.to_string(),
        days_remaining: days,
        label: crate::dates::format_due_status(days),
        due_soon: fmt.is_due_soon(date)?,
        overdue: fmt.is_overdue(date)?,
    })
}

pub fn nudge_summary(fmt: &StatusFormatter, date: &str) -> Result<NudgeSummary, ConformError> {
    let days = fmt.days_remaining(date)?;
    Ok(NudgeSummary {
        date: date.to_string(),
        days_remaining: days,
        label: crate::dates::format_nudge_status(days),
    })
}

/// Status of one connector. Due and nudge dates are only reported while the
/// connector is prioritized and not yet connected.
pub fn connector_status(
    connector: &Connector,
    fmt: &StatusFormatter,
) -> Result<ConnectorStatus, ConformError> {
    let pending = connector.prioritized && !connector.connected;
    let due = match (&connector.priority_due_date, pending) {
        (Some(date), true) => Some(due_summary(fmt, date)?),
        _ => None,
    };
    let nudge = match (&connector.next_nudge_date, pending) {
        (Some(date), true) => Some(nudge_summary(fmt, date)?),
        _ => None,
    };
    let connected_for = match (&connector.connected_date, connector.connected) {
        (Some(date), true) => Some(fmt.connected_status(date)?),
        _ => None,
    };
    Ok(ConnectorStatus {
        id: connector.id.clone(),
        name: connector.name.clone(),
        prioritized: connector.prioritized,
        connected: connector.connected,
        due,
        nudge,
        connected_for,
    })
}

pub fn catalog_status(
    catalog: &Catalog,
    fmt: &StatusFormatter,
) -> Result<Vec<ConnectorStatus>, ConformError> {
    catalog
        .plugins
        .iter()
        .map(|c| connector_status(c, fmt))
        .collect()
}

/// Upcoming nudges for not-yet-connected plugins, soonest first.
pub fn org_nudges(
    organizations: &[Organization],
    fmt: &StatusFormatter,
) -> Result<Vec<OrgNudge>, ConformError> {
    let mut out = Vec::new();
    for org in organizations {
        for plugin in org.plugins.iter().filter(|p| !p.is_connected()) {
            let Some(date) = &plugin.next_nudge_date else {
                continue;
            };
            let summary = nudge_summary(fmt, date)?;
            out.push(OrgNudge {
                organization: org.name.clone(),
                plugin_id: plugin.id.clone(),
                plugin_name: plugin.name.clone(),
                date: summary.date,
                days_remaining: summary.days_remaining,
                label: summary.label,
            });
        }
    }
    out.sort_by(|a, b| {
        a.days_remaining
            .cmp(&b.days_remaining)
            .then_with(|| a.organization.cmp(&b.organization))
    });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt() -> StatusFormatter {
        StatusFormatter::at_str("2025-10-29").unwrap()
    }

    #[test]
    fn test_demo_connector_statuses() {
        let statuses = catalog_status(Catalog::demo(), &fmt()).unwrap();
        let sf = &statuses[0];
        let due = sf.due.as_ref().unwrap();
        assert_eq!(due.days_remaining, 4);
        assert_eq!(due.label, "Due in 4 days");
        assert!(due.due_soon);
        assert!(!due.overdue);
        assert_eq!(sf.nudge.as_ref().unwrap().label, "NOTIFYING IN 2 DAYS");
        assert_eq!(sf.headline(), "Due in 4 days");

        let hs = &statuses[1];
        assert!(hs.due.is_none());
        assert_eq!(hs.connected_for.as_deref(), Some("1 day connected"));
        assert_eq!(hs.headline(), "1 day connected");
    }

    #[test]
    fn test_connected_connector_drops_due_date() {
        let mut sf = Catalog::demo().plugin("salesforce").unwrap().clone();
        sf.connected = true;
        sf.connected_date = Some("2025-10-29".to_string());
        let status = connector_status(&sf, &fmt()).unwrap();
        assert!(status.due.is_none());
        assert!(status.nudge.is_none());
        assert_eq!(status.headline(), "Connected today");
    }

    #[test]
    fn test_org_nudges_sorted() {
        let nudges = org_nudges(&Catalog::demo().organizations, &fmt()).unwrap();
        let labels: Vec<(&str, &str)> = nudges
            .iter()
            .map(|n| (n.organization.as_str(), n.label.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("Target", "NOTIFYING TOMORROW"),
                ("Target", "NOTIFYING IN 3 DAYS"),
                ("Nike", "NOTIFYING IN 4 DAYS"),
            ]
        );
    }

    #[test]
    fn test_bad_date_propagates() {
        let mut sf = Catalog::demo().plugin("salesforce").unwrap().clone();
        sf.priority_due_date = Some("someday".to_string());
        let err = connector_status(&sf, &fmt()).unwrap_err();
        assert_eq!(err.code_str(), "invalid_date");
    }

    #[test]
    fn test_due_summary_follows_threshold() {
        let fmt = fmt().with_due_soon_days(3);
        let edge = due_summary(&fmt, "2025-11-01").unwrap();
        assert_eq!(edge.days_remaining, 3);
        assert!(edge.due_soon);

        let later = due_summary(&fmt, "2025-11-02").unwrap();
        assert!(!later.due_soon);
        assert!(!later.overdue);

        let past = due_summary(&fmt, "2025-10-28").unwrap();
        assert!(past.overdue);
        assert!(!past.due_soon);
    }
}
