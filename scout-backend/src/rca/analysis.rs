use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const INCIDENT_INDICATORS: [&str; 8] = [
    "error", "down", "failed", "issue", "problem", "alert", "outage", "incident",
];
pub const RESOLUTION_INDICATORS: [&str; 7] = [
    "fixed", "resolved", "working", "restored", "deployed", "updated", "solved",
];

const TIMELINE_LIMIT: usize = 15;
const DETAIL_LIMIT: usize = 8;
const TIMELINE_TEXT_CHARS: usize = 100;

/// One chat message as returned by the Slack fetch tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
}

impl ChannelMessage {
    /// Objects are read field by field; anything else becomes the text.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                let field = |k: &str| map.get(k).and_then(|v| v.as_str()).map(String::from);
                Self {
                    timestamp: field("timestamp").or_else(|| field("ts")),
                    user: field("user"),
                    text: field("text").unwrap_or_default(),
                }
            }
            Value::String(s) => Self {
                timestamp: Some("unknown".to_string()),
                user: None,
                text: s.clone(),
            },
            other => Self {
                timestamp: Some("unknown".to_string()),
                user: None,
                text: other.to_string(),
            },
        }
    }

    fn mentions(&self, indicators: &[&str]) -> bool {
        let lowered = self.text.to_lowercase();
        indicators.iter().any(|i| lowered.contains(i))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RcaSection {
    pub title: String,
    pub content: String,
}

impl RcaSection {
    fn new(title: &str, content: String) -> Self {
        Self {
            title: format!("## {}", title),
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RcaSections {
    pub incident_overview: RcaSection,
    pub timeline: RcaSection,
    pub incident_details: RcaSection,
    pub resolution_actions: RcaSection,
    pub root_cause_analysis: RcaSection,
    pub action_items: RcaSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RcaTemplate {
    pub title: String,
    pub sections: RcaSections,
}

impl RcaTemplate {
    /// The whole document as markdown.
    pub fn to_markdown(&self) -> String {
        let s = &self.sections;
        let mut out = format!("# {}\n", self.title);
        for section in [
            &s.incident_overview,
            &s.timeline,
            &s.incident_details,
            &s.resolution_actions,
            &s.root_cause_analysis,
            &s.action_items,
        ] {
            out.push_str(&format!("\n{}\n\n{}\n", section.title, section.content));
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_messages: usize,
    pub incidents_found: usize,
    pub resolutions_found: usize,
    pub timeline_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RcaAnalysis {
    pub channel_id: String,
    pub rca_template: RcaTemplate,
    pub analysis_summary: AnalysisSummary,
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn format_timeline(messages: &[&ChannelMessage]) -> String {
    if messages.is_empty() {
        return "No timeline data available".to_string();
    }
    messages
        .iter()
        .take(TIMELINE_LIMIT)
        .map(|m| {
            format!(
                "**{}** - {}: {}",
                m.timestamp.as_deref().unwrap_or("Unknown time"),
                m.user.as_deref().unwrap_or("Unknown user"),
                truncate_chars(&m.text, TIMELINE_TEXT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_details(messages: &[&ChannelMessage], kind: &str) -> String {
    if messages.is_empty() {
        return format!("No {} messages identified in the analyzed timeframe.", kind);
    }
    messages
        .iter()
        .take(DETAIL_LIMIT)
        .map(|m| {
            format!(
                "**{}** - {}:\n{}\n",
                m.timestamp.as_deref().unwrap_or("Unknown"),
                m.user.as_deref().unwrap_or("Unknown"),
                m.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sort channel messages into incidents and resolutions and fill the
/// six-section RCA template.
pub fn analyze(channel_id: &str, messages: &[ChannelMessage], now: DateTime<Utc>) -> RcaAnalysis {
    let incidents: Vec<&ChannelMessage> = messages
        .iter()
        .filter(|m| m.mentions(&INCIDENT_INDICATORS))
        .collect();
    let resolutions: Vec<&ChannelMessage> = messages
        .iter()
        .filter(|m| m.mentions(&RESOLUTION_INDICATORS))
        .collect();
    let timeline: Vec<&ChannelMessage> = messages.iter().collect();

    let overview = format!(
        "**Channel:** {}\n**Analysis Date:** {}\n**Messages Analyzed:** {}\n**Incidents Detected:** {}\n**Resolutions Found:** {}",
        channel_id,
        now.format("%Y-%m-%d %H:%M:%S"),
        messages.len(),
        incidents.len(),
        resolutions.len()
    );

    let sections = RcaSections {
        incident_overview: RcaSection::new("Incident Overview", overview),
        timeline: RcaSection::new("Timeline", format_timeline(&timeline)),
        incident_details: RcaSection::new("Incident Details", format_details(&incidents, "incident")),
        resolution_actions: RcaSection::new(
            "Resolution Actions",
            format_details(&resolutions, "resolution"),
        ),
        root_cause_analysis: RcaSection::new(
            "Root Cause Analysis",
            "**[To be completed by incident response team]**\n\n\
             - [ ] Primary root cause identified\n\
             - [ ] Contributing factors documented\n\
             - [ ] Prevention measures defined\n\
             - [ ] Process improvements identified"
                .to_string(),
        ),
        action_items: RcaSection::new(
            "Action Items",
            "**[To be completed during review]**\n\n\
             - [ ] Immediate fixes implemented\n\
             - [ ] Long-term improvements planned\n\
             - [ ] Team training requirements\n\
             - [ ] Process updates needed"
                .to_string(),
        ),
    };

    RcaAnalysis {
        channel_id: channel_id.to_string(),
        rca_template: RcaTemplate {
            title: format!("RCA - Channel {} - {}", channel_id, now.format("%Y-%m-%d %H:%M")),
            sections,
        },
        analysis_summary: AnalysisSummary {
            total_messages: messages.len(),
            incidents_found: incidents.len(),
            resolutions_found: resolutions.len(),
            timeline_entries: timeline.len(),
        },
    }
}

/// Pull the message list out of a fetch result: either a bare array or an
/// object with a `messages` array. An object with `"status": "error"` is a failure.
pub fn messages_from_value(value: &Value) -> Result<Vec<ChannelMessage>> {
    if value.get("status").and_then(|s| s.as_str()) == Some("error") {
        let reason = value
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("unknown error");
        return Err(Error::workflow(format!("Message fetch reported an error: {}", reason)));
    }
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("messages") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(other) => {
                return Err(Error::validation(format!("'messages' is not a list: {}", other)));
            }
        },
        other => return Err(Error::validation(format!("Unexpected message payload: {}", other))),
    };
    Ok(items.iter().map(ChannelMessage::from_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    fn msg(ts: &str, user: &str, text: &str) -> ChannelMessage {
        ChannelMessage {
            timestamp: Some(ts.into()),
            user: Some(user.into()),
            text: text.into(),
        }
    }

    #[test]
    fn classifies_incidents_and_resolutions() {
        let messages = vec![
            msg("09:00", "ana", "API is DOWN, alert firing"),
            msg("09:10", "ben", "looking into it"),
            msg("09:30", "ana", "Fix deployed, service restored"),
        ];
        let analysis = analyze("C09BQEU1HCM", &messages, now());

        assert_eq!(analysis.rca_template.title, "RCA - Channel C09BQEU1HCM - 2025-03-14 09:26");
        assert_eq!(
            analysis.analysis_summary,
            AnalysisSummary {
                total_messages: 3,
                incidents_found: 1,
                resolutions_found: 1,
                timeline_entries: 3,
            }
        );
        let sections = &analysis.rca_template.sections;
        assert_eq!(sections.incident_overview.title, "## Incident Overview");
        assert!(sections.incident_overview.content.contains("**Analysis Date:** 2025-03-14 09:26:53"));
        assert_eq!(
            sections.incident_details.content,
            "**09:00** - ana:\nAPI is DOWN, alert firing\n"
        );
        assert!(sections.timeline.content.starts_with("**09:00** - ana: API is DOWN"));
    }

    #[test]
    fn limits_and_truncates() {
        let long = "x".repeat(150);
        let messages: Vec<ChannelMessage> = (0..20)
            .map(|i| msg(&format!("t{}", i), "bot", &format!("error {}", long)))
            .collect();
        let analysis = analyze("C1", &messages, now());
        let sections = &analysis.rca_template.sections;

        let lines: Vec<&str> = sections.timeline.content.lines().collect();
        assert_eq!(lines.len(), 15);
        assert!(lines[0].ends_with("..."));
        assert_eq!(lines[0].chars().count(), "**t0** - bot: ".len() + 100 + 3);

        assert_eq!(sections.incident_details.content.matches("**t").count(), 8);
        assert_eq!(analysis.analysis_summary.incidents_found, 20);
    }

    #[test]
    fn empty_channel_uses_placeholders() {
        let analysis = analyze("C1", &[], now());
        let sections = &analysis.rca_template.sections;
        assert_eq!(sections.timeline.content, "No timeline data available");
        assert_eq!(
            sections.resolution_actions.content,
            "No resolution messages identified in the analyzed timeframe."
        );
        assert!(analysis.rca_template.to_markdown().contains("## Action Items"));
    }

    #[test]
    fn reads_messages_from_fetch_payloads() {
        let messages = messages_from_value(&json!({
            "messages": [{"ts": "1", "user": "u", "text": "hi"}, "plain"]
        }))
        .unwrap();
        assert_eq!(messages[0].timestamp.as_deref(), Some("1"));
        assert_eq!(messages[1].text, "plain");
        assert_eq!(messages[1].timestamp.as_deref(), Some("unknown"));

        assert!(messages_from_value(&json!({"status": "error", "error": "no token"})).is_err());
        assert!(messages_from_value(&json!({})).unwrap().is_empty());
    }
}
