use serde::{Deserialize, Serialize};

/// A single audit log entry describing something the gateway did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: uuid::Uuid,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event_type: AuditEventType,
    pub source: AuditSource,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionRecord>,
}

impl AuditEntry {
    /// Create a new `AuditEntry` with an auto-generated UUID v4 and the current
    /// UTC timestamp. `detection` defaults to `None`.
    pub fn new(
        event_type: AuditEventType,
        source: AuditSource,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            event_type,
            source,
            details,
            detection: None,
        }
    }

    /// Attach the signature match that caused a rejection.
    pub fn with_detection(mut self, detection: DetectionRecord) -> Self {
        self.detection = Some(detection);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    GatewayStarted,
    GatewayStopped,
    RulesLoaded,
    RequestRejected,
    MalformedRequest,
}

/// The component that emitted the event plus whatever request metadata it
/// had at hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSource {
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl AuditSource {
    /// Convenience constructor that only requires the component name.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            remote_addr: None,
            method: None,
            path: None,
        }
    }
}

/// Which signature fired on which request field.
///
/// The offending value itself is not recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub category: String,
    pub rule: String,
    pub field_source: String,
    pub field_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_has_no_detection() {
        let entry = AuditEntry::new(
            AuditEventType::GatewayStarted,
            AuditSource::new("waf-gate"),
            serde_json::json!({}),
        );
        assert!(entry.detection.is_none());

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event_type"], "gateway_started");
        assert!(json.get("detection").is_none());
        assert!(json["source"].get("remote_addr").is_none());
    }

    #[test]
    fn detection_is_serialized_when_present() {
        let entry = AuditEntry::new(
            AuditEventType::RequestRejected,
            AuditSource::new("waf-middleware"),
            serde_json::json!({"status": 403}),
        )
        .with_detection(DetectionRecord {
            category: "SQLInjection".to_string(),
            rule: "union_select".to_string(),
            field_source: "query".to_string(),
            field_name: "id".to_string(),
        });

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event_type"], "request_rejected");
        assert_eq!(json["detection"]["rule"], "union_select");
        assert_eq!(json["detection"]["field_source"], "query");
    }
}
