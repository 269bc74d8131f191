//! The alert node and its handler channels.
//!
//! An alert evaluates up to three level expressions (info, warn, crit)
//! against passing data and dispatches state changes to its configured
//! handler channels. The pipeline core only models the configuration
//! surface: every channel is an optional list so an unset channel
//! serializes as `null` on the wire, and the alert node itself passes its
//! input through so further nodes can be chained below it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::chain::NodeRef;
use crate::duration::Duration;
use crate::lambda::Lambda;

/// Alerting node: level expressions plus handler channels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertNode {
    /// Topic the alert's events are published to.
    pub topic: String,
    /// Template for the alert identifier.
    pub alert_id: String,
    /// Template for the alert message.
    pub message: String,
    /// Template for the detailed body.
    pub details: String,
    /// Expression for the info level.
    pub info: Option<Lambda>,
    /// Expression for the warn level.
    pub warn: Option<Lambda>,
    /// Expression for the crit level.
    pub crit: Option<Lambda>,
    /// Expression that resets the info level.
    pub info_reset: Option<Lambda>,
    /// Expression that resets the warn level.
    pub warn_reset: Option<Lambda>,
    /// Expression that resets the crit level.
    pub crit_reset: Option<Lambda>,
    /// Number of previous states kept for flap detection.
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub history: i64,
    /// Tag written with the alert level.
    pub level_tag: String,
    /// Field written with the alert level.
    pub level_field: String,
    /// Field written with the rendered message.
    pub message_field: String,
    /// Field written with the duration of the current state.
    pub duration_field: String,
    /// Tag written with the alert identifier.
    pub id_tag: String,
    /// Field written with the alert identifier.
    pub id_field: String,
    /// Require all points in a batch to match before alerting.
    pub all: bool,
    /// Do not send recovery (OK) events.
    pub no_recoveries: bool,
    /// Only dispatch events when the level changes.
    pub state_changes_only: bool,
    /// Lower bound of the flapping ratio.
    pub flap_low: f64,
    /// Upper bound of the flapping ratio.
    pub flap_high: f64,
    /// Enable flap detection.
    pub use_flapping: bool,
    /// HTTP POST handlers.
    pub post: Option<Vec<PostHandler>>,
    /// Raw TCP handlers.
    pub tcp: Option<Vec<TcpHandler>>,
    /// Email handlers.
    pub email: Option<Vec<EmailHandler>>,
    /// Subprocess handlers.
    pub exec: Option<Vec<ExecHandler>>,
    /// File log handlers.
    pub log: Option<Vec<LogHandler>>,
    /// Slack handlers.
    pub slack: Option<Vec<SlackHandler>>,
    /// Telegram handlers.
    pub telegram: Option<Vec<TelegramHandler>>,
    /// PagerDuty handlers.
    pub pager_duty: Option<Vec<PagerDutyHandler>>,
    /// OpsGenie handlers.
    pub ops_genie: Option<Vec<OpsGenieHandler>>,
    /// MQTT handlers.
    pub mqtt: Option<Vec<MqttHandler>>,
    /// VictorOps handlers.
    pub victor_ops: Option<Vec<VictorOpsHandler>>,
    /// Alerta handlers.
    pub alerta: Option<Vec<AlertaHandler>>,
    /// HipChat handlers.
    pub hip_chat: Option<Vec<HipChatHandler>>,
    /// Talk handlers.
    pub talk: Option<Vec<TalkHandler>>,
    /// Pushover handlers.
    pub pushover: Option<Vec<PushoverHandler>>,
    /// Sensu handlers.
    pub sensu: Option<Vec<SensuHandler>>,
    /// SNMP trap handlers.
    pub snmp_trap: Option<Vec<SnmpTrapHandler>>,
    /// Kafka handlers.
    pub kafka: Option<Vec<KafkaHandler>>,
}

impl Default for AlertNode {
    fn default() -> Self {
        AlertNode {
            topic: String::new(),
            alert_id: String::new(),
            message: String::new(),
            details: String::new(),
            info: None,
            warn: None,
            crit: None,
            info_reset: None,
            warn_reset: None,
            crit_reset: None,
            history: 21,
            level_tag: String::new(),
            level_field: String::new(),
            message_field: String::new(),
            duration_field: String::new(),
            id_tag: String::new(),
            id_field: String::new(),
            all: false,
            no_recoveries: false,
            state_changes_only: false,
            flap_low: 0.0,
            flap_high: 0.0,
            use_flapping: false,
            post: None,
            tcp: None,
            email: None,
            exec: None,
            log: None,
            slack: None,
            telegram: None,
            pager_duty: None,
            ops_genie: None,
            mqtt: None,
            victor_ops: None,
            alerta: None,
            hip_chat: None,
            talk: None,
            pushover: None,
            sensu: None,
            snmp_trap: None,
            kafka: None,
        }
    }
}

impl AlertNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.history < 2 {
            return Err("history must keep at least two states".to_string());
        }
        if self.use_flapping {
            let bounded = (0.0..=1.0).contains(&self.flap_low) && (0.0..=1.0).contains(&self.flap_high);
            if !bounded || self.flap_low >= self.flap_high {
                return Err("flapping bounds must satisfy 0 <= low < high <= 1".to_string());
            }
        }
        for handler in self.post.iter().flatten() {
            handler.validate()?;
        }
        for handler in self.tcp.iter().flatten() {
            if handler.address.is_empty() {
                return Err("tcp handler requires an address".to_string());
            }
        }
        for handler in self.exec.iter().flatten() {
            if handler.command.is_empty() {
                return Err("exec handler requires a command".to_string());
            }
        }
        for handler in self.alerta.iter().flatten() {
            if handler.resource.is_empty() {
                return Err("alerta handler requires a resource".to_string());
            }
        }
        for handler in self.snmp_trap.iter().flatten() {
            if handler.trap_oid.is_empty() {
                return Err("snmpTrap handler requires a trap OID".to_string());
            }
        }
        Ok(())
    }
}

/// POST the alert data to a URL or a named endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostHandler {
    /// Target URL; exclusive with `endpoint`.
    pub url: String,
    /// Named, preconfigured endpoint; exclusive with `url`.
    pub endpoint: String,
    /// Extra headers sent with the request.
    pub headers: HashMap<String, String>,
    /// Capture the HTTP response as a point.
    pub capture_response: bool,
    /// Request timeout; zero uses the transport default.
    pub timeout: Duration,
}

impl PostHandler {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() == self.endpoint.is_empty() {
            return Err("post handler requires exactly one of url or endpoint".to_string());
        }
        if self.headers.keys().any(|h| h.eq_ignore_ascii_case("authenticate")) {
            return Err("cannot set the authenticate header".to_string());
        }
        Ok(())
    }
}

/// Write the alert data to a raw TCP address.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TcpHandler {
    /// host:port to connect to.
    pub address: String,
}

/// Send the alert by email.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailHandler {
    /// Recipient addresses; empty uses the configured defaults.
    pub to: Vec<String>,
}

/// Run a command with the alert data on stdin.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecHandler {
    /// The command and its arguments.
    pub command: Vec<String>,
}

/// Append the alert data to a file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogHandler {
    /// Absolute path of the log file.
    pub file_path: String,
    /// File mode used when creating the file.
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub mode: i64,
}

impl Default for LogHandler {
    fn default() -> Self {
        LogHandler {
            file_path: String::new(),
            mode: 0o600,
        }
    }
}

/// Post the alert to a Slack channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlackHandler {
    /// Named workspace; empty uses the default.
    pub workspace: String,
    /// Channel, overriding the workspace default.
    pub channel: String,
    /// Username the message is posted as.
    pub username: String,
    /// Emoji used as the message icon.
    pub icon_emoji: String,
}

/// Send the alert to a Telegram chat.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelegramHandler {
    /// Chat the message is sent to.
    pub chat_id: String,
    /// Message parse mode ("Markdown" or "HTML").
    pub parse_mode: String,
    /// Disable link previews.
    pub disable_web_page_preview: bool,
    /// Send silently.
    pub disable_notification: bool,
}

/// Open an incident with PagerDuty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PagerDutyHandler {
    /// Service key, overriding the configured default.
    pub service_key: String,
}

/// Open an incident with OpsGenie.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpsGenieHandler {
    /// Teams to notify.
    pub teams: Vec<String>,
    /// Individual recipients to notify.
    pub recipients: Vec<String>,
}

/// Publish the alert to an MQTT broker.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MqttHandler {
    /// Named broker; empty uses the default.
    pub broker_name: String,
    /// Topic the alert is published to.
    pub topic: String,
    /// Quality-of-service level (0, 1, or 2).
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub qos: i64,
    /// Ask the broker to retain the message.
    pub retained: bool,
}

/// Open an incident with VictorOps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VictorOpsHandler {
    /// Routing key, overriding the configured default.
    pub routing_key: String,
}

/// Raise an event with Alerta.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertaHandler {
    /// API token, overriding the configured default.
    pub token: String,
    /// Resource under alarm.
    pub resource: String,
    /// Event name.
    pub event: String,
    /// Environment the event belongs to.
    pub environment: String,
    /// Affected services.
    pub services: Vec<String>,
    /// How long the event stays open without updates.
    pub timeout: Duration,
}

/// Post the alert to a HipChat room.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HipChatHandler {
    /// Room, overriding the configured default.
    pub room: String,
    /// API token, overriding the configured default.
    pub token: String,
}

/// Post the alert to a Talk webhook.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TalkHandler {}

/// Send the alert through Pushover.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PushoverHandler {
    /// Target device; empty sends to all of the user's devices.
    pub device: String,
    /// Message title.
    pub title: String,
    /// Supplementary URL shown with the message.
    pub url: String,
    /// Title of the supplementary URL.
    pub url_title: String,
    /// Notification sound name.
    pub sound: String,
}

/// Forward the alert as a Sensu check result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensuHandler {
    /// Source name reported to Sensu.
    pub source: String,
    /// Handler list attached to the check result.
    pub handlers: Vec<String>,
}

/// Emit the alert as an SNMP trap.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnmpTrapHandler {
    /// OID of the trap to send.
    pub trap_oid: String,
    /// Data bindings attached to the trap: (OID, type, value) triples.
    pub data: Vec<SnmpData>,
}

/// One SNMP variable binding.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnmpData {
    /// OID the value is bound to.
    pub oid: String,
    /// SNMP type label.
    #[serde(rename = "type")]
    pub kind: String,
    /// Value template.
    pub value: String,
}

/// Publish the alert to a Kafka topic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KafkaHandler {
    /// Named cluster; empty uses the default.
    pub cluster: String,
    /// Topic the alert is published to.
    pub kafka_topic: String,
    /// Template for the partitioning key.
    pub template: String,
}

impl NodeRef<AlertNode> {
    /// Publish this alert's events to `topic`.
    pub fn topic(self, topic: &str) -> Self {
        self.mutate(|c| c.topic = topic.to_string())
    }

    /// Template for the alert identifier.
    pub fn alert_id(self, id: &str) -> Self {
        self.mutate(|c| c.alert_id = id.to_string())
    }

    /// Template for the alert message.
    pub fn message(self, message: &str) -> Self {
        self.mutate(|c| c.message = message.to_string())
    }

    /// Template for the detailed body.
    pub fn details(self, details: &str) -> Self {
        self.mutate(|c| c.details = details.to_string())
    }

    /// Expression for the info level.
    pub fn info(self, predicate: impl Into<Lambda>) -> Self {
        let predicate = predicate.into();
        self.mutate(|c| c.info = Some(predicate))
    }

    /// Expression for the warn level.
    pub fn warn(self, predicate: impl Into<Lambda>) -> Self {
        let predicate = predicate.into();
        self.mutate(|c| c.warn = Some(predicate))
    }

    /// Expression for the crit level.
    pub fn crit(self, predicate: impl Into<Lambda>) -> Self {
        let predicate = predicate.into();
        self.mutate(|c| c.crit = Some(predicate))
    }

    /// Expression that resets the info level.
    pub fn info_reset(self, predicate: impl Into<Lambda>) -> Self {
        let predicate = predicate.into();
        self.mutate(|c| c.info_reset = Some(predicate))
    }

    /// Expression that resets the warn level.
    pub fn warn_reset(self, predicate: impl Into<Lambda>) -> Self {
        let predicate = predicate.into();
        self.mutate(|c| c.warn_reset = Some(predicate))
    }

    /// Expression that resets the crit level.
    pub fn crit_reset(self, predicate: impl Into<Lambda>) -> Self {
        let predicate = predicate.into();
        self.mutate(|c| c.crit_reset = Some(predicate))
    }

    /// Number of previous states kept for flap detection.
    pub fn history(self, history: i64) -> Self {
        self.mutate(|c| c.history = history)
    }

    /// Write the alert level to this tag.
    pub fn level_tag(self, tag: &str) -> Self {
        self.mutate(|c| c.level_tag = tag.to_string())
    }

    /// Write the alert level to this field.
    pub fn level_field(self, field: &str) -> Self {
        self.mutate(|c| c.level_field = field.to_string())
    }

    /// Write the rendered message to this field.
    pub fn message_field(self, field: &str) -> Self {
        self.mutate(|c| c.message_field = field.to_string())
    }

    /// Write the duration of the current state to this field.
    pub fn duration_field(self, field: &str) -> Self {
        self.mutate(|c| c.duration_field = field.to_string())
    }

    /// Write the alert identifier to this tag.
    pub fn id_tag(self, tag: &str) -> Self {
        self.mutate(|c| c.id_tag = tag.to_string())
    }

    /// Write the alert identifier to this field.
    pub fn id_field(self, field: &str) -> Self {
        self.mutate(|c| c.id_field = field.to_string())
    }

    /// Require all points in a batch to match before alerting.
    pub fn all(self) -> Self {
        self.mutate(|c| c.all = true)
    }

    /// Do not send recovery events.
    pub fn no_recoveries(self) -> Self {
        self.mutate(|c| c.no_recoveries = true)
    }

    /// Only dispatch events when the level changes.
    pub fn state_changes_only(self) -> Self {
        self.mutate(|c| c.state_changes_only = true)
    }

    /// Enable flap detection with the given ratio bounds.
    pub fn flapping(self, low: f64, high: f64) -> Self {
        self.mutate(|c| {
            c.use_flapping = true;
            c.flap_low = low;
            c.flap_high = high;
        })
    }

    /// POST alert data to `url`.
    pub fn post(self, url: &str) -> Self {
        let handler = PostHandler {
            url: url.to_string(),
            ..PostHandler::default()
        };
        self.mutate(|c| c.post.get_or_insert_with(Vec::new).push(handler))
    }

    /// POST alert data to a named, preconfigured endpoint.
    pub fn post_endpoint(self, endpoint: &str) -> Self {
        let handler = PostHandler {
            endpoint: endpoint.to_string(),
            ..PostHandler::default()
        };
        self.mutate(|c| c.post.get_or_insert_with(Vec::new).push(handler))
    }

    /// Write alert data to a raw TCP address.
    pub fn tcp(self, address: &str) -> Self {
        let handler = TcpHandler {
            address: address.to_string(),
        };
        self.mutate(|c| c.tcp.get_or_insert_with(Vec::new).push(handler))
    }

    /// Send the alert by email.
    pub fn email(self, to: &[&str]) -> Self {
        let handler = EmailHandler {
            to: to.iter().map(|t| t.to_string()).collect(),
        };
        self.mutate(|c| c.email.get_or_insert_with(Vec::new).push(handler))
    }

    /// Run a command with the alert data on stdin.
    pub fn exec(self, command: &[&str]) -> Self {
        let handler = ExecHandler {
            command: command.iter().map(|a| a.to_string()).collect(),
        };
        self.mutate(|c| c.exec.get_or_insert_with(Vec::new).push(handler))
    }

    /// Append alert data to a file.
    pub fn log_file(self, path: &str) -> Self {
        let handler = LogHandler {
            file_path: path.to_string(),
            ..LogHandler::default()
        };
        self.mutate(|c| c.log.get_or_insert_with(Vec::new).push(handler))
    }

    /// Post the alert to Slack.
    pub fn slack(self) -> Self {
        self.mutate(|c| c.slack.get_or_insert_with(Vec::new).push(SlackHandler::default()))
    }

    /// Send the alert to a Telegram chat.
    pub fn telegram(self, chat_id: &str) -> Self {
        let handler = TelegramHandler {
            chat_id: chat_id.to_string(),
            ..TelegramHandler::default()
        };
        self.mutate(|c| c.telegram.get_or_insert_with(Vec::new).push(handler))
    }

    /// Open an incident with PagerDuty.
    pub fn pager_duty(self) -> Self {
        self.mutate(|c| {
            c.pager_duty
                .get_or_insert_with(Vec::new)
                .push(PagerDutyHandler::default())
        })
    }

    /// Open an incident with OpsGenie.
    pub fn ops_genie(self) -> Self {
        self.mutate(|c| {
            c.ops_genie
                .get_or_insert_with(Vec::new)
                .push(OpsGenieHandler::default())
        })
    }

    /// Publish the alert to an MQTT topic.
    pub fn mqtt(self, topic: &str) -> Self {
        let handler = MqttHandler {
            topic: topic.to_string(),
            ..MqttHandler::default()
        };
        self.mutate(|c| c.mqtt.get_or_insert_with(Vec::new).push(handler))
    }

    /// Open an incident with VictorOps.
    pub fn victor_ops(self) -> Self {
        self.mutate(|c| {
            c.victor_ops
                .get_or_insert_with(Vec::new)
                .push(VictorOpsHandler::default())
        })
    }

    /// Raise an event with Alerta for `resource`.
    pub fn alerta(self, resource: &str) -> Self {
        let handler = AlertaHandler {
            resource: resource.to_string(),
            ..AlertaHandler::default()
        };
        self.mutate(|c| c.alerta.get_or_insert_with(Vec::new).push(handler))
    }

    /// Post the alert to a HipChat room.
    pub fn hip_chat(self, room: &str) -> Self {
        let handler = HipChatHandler {
            room: room.to_string(),
            ..HipChatHandler::default()
        };
        self.mutate(|c| c.hip_chat.get_or_insert_with(Vec::new).push(handler))
    }

    /// Post the alert to the configured Talk webhook.
    pub fn talk(self) -> Self {
        self.mutate(|c| c.talk.get_or_insert_with(Vec::new).push(TalkHandler::default()))
    }

    /// Send the alert through Pushover.
    pub fn pushover(self) -> Self {
        self.mutate(|c| {
            c.pushover
                .get_or_insert_with(Vec::new)
                .push(PushoverHandler::default())
        })
    }

    /// Forward the alert as a Sensu check result.
    pub fn sensu(self) -> Self {
        self.mutate(|c| c.sensu.get_or_insert_with(Vec::new).push(SensuHandler::default()))
    }

    /// Emit the alert as an SNMP trap.
    pub fn snmp_trap(self, trap_oid: &str) -> Self {
        let handler = SnmpTrapHandler {
            trap_oid: trap_oid.to_string(),
            ..SnmpTrapHandler::default()
        };
        self.mutate(|c| c.snmp_trap.get_or_insert_with(Vec::new).push(handler))
    }

    /// Publish the alert to a Kafka topic.
    pub fn kafka(self, topic: &str) -> Self {
        let handler = KafkaHandler {
            kafka_topic: topic.to_string(),
            ..KafkaHandler::default()
        };
        self.mutate(|c| c.kafka.get_or_insert_with(Vec::new).push(handler))
    }
}
