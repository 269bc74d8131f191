//! Terminal output nodes and autoscalers.
//!
//! Everything here provides no further edge: data ends at these nodes. Only
//! the configuration surface is modelled; the clients that actually post,
//! write, or scale live in the execution layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::chain::NodeRef;
use crate::duration::Duration;
use crate::lambda::Lambda;

/// Cache the latest data and expose it on a named HTTP endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpOutNode {
    /// Endpoint name the cached data is served under.
    pub endpoint: String,
}

impl HttpOutNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("an endpoint name is required".to_string());
        }
        Ok(())
    }
}

/// POST passing data to a URL or a named endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpPostNode {
    /// Target URL; exclusive with `endpoint`.
    pub url: String,
    /// Named, preconfigured endpoint; exclusive with `url`.
    pub endpoint: String,
    /// Extra headers sent with each request.
    pub headers: HashMap<String, String>,
    /// Field written with the response status code.
    pub code_field: String,
    /// Capture the HTTP response as a point.
    pub capture_response: bool,
    /// Request timeout; zero uses the transport default.
    pub timeout: Duration,
}

impl HttpPostNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() == self.endpoint.is_empty() {
            return Err("exactly one of url or endpoint must be set".to_string());
        }
        if self.headers.keys().any(|h| h.eq_ignore_ascii_case("authenticate")) {
            return Err("cannot set the authenticate header".to_string());
        }
        Ok(())
    }
}

/// Write passing data to an InfluxDB database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InfluxdbOutNode {
    /// Named cluster to write to; empty uses the default.
    pub cluster: String,
    /// Target database.
    pub database: String,
    /// Target retention policy; empty uses the database default.
    pub retention_policy: String,
    /// Measurement name written; empty keeps each point's name.
    pub measurement: String,
    /// Write consistency level.
    pub write_consistency: String,
    /// Timestamp precision of written points.
    pub precision: String,
    /// Number of points buffered before a write.
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub buffer: i64,
    /// Flush the buffer at least this often.
    pub flush_interval: Duration,
    /// Create the target database at startup.
    pub create: bool,
    /// Extra tags added to written points.
    pub tags: HashMap<String, String>,
}

impl Default for InfluxdbOutNode {
    fn default() -> Self {
        InfluxdbOutNode {
            cluster: String::new(),
            database: String::new(),
            retention_policy: String::new(),
            measurement: String::new(),
            write_consistency: String::new(),
            precision: String::new(),
            buffer: 1000,
            flush_interval: Duration::seconds(10),
            create: false,
            tags: HashMap::new(),
        }
    }
}

impl InfluxdbOutNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.database.is_empty() {
            return Err("a database is required".to_string());
        }
        if self.buffer < 1 {
            return Err("buffer must hold at least one point".to_string());
        }
        Ok(())
    }
}

/// Feed passing data back into the engine as a new stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoopbackNode {
    /// Database the looped data is written under.
    pub database: String,
    /// Retention policy the looped data is written under.
    pub retention_policy: String,
    /// Measurement name written; empty keeps each point's name.
    pub measurement: String,
    /// Extra tags added to looped points.
    pub tags: HashMap<String, String>,
}

impl LoopbackNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.database.is_empty() {
            return Err("a database is required".to_string());
        }
        if self.retention_policy.is_empty() {
            return Err("a retention policy is required".to_string());
        }
        Ok(())
    }
}

/// Scale a Kubernetes resource from the passing data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct K8sAutoscaleNode {
    /// Named cluster configuration; empty uses the default.
    pub cluster: String,
    /// Namespace of the scaled resource.
    pub namespace: String,
    /// Resource kind; one of deployments, replicasets, or
    /// replicationcontrollers. Older pipelines may carry the two-option
    /// form without replicasets.
    pub kind: String,
    /// Fixed resource name; exclusive with `resource_name_tag`.
    pub resource_name: String,
    /// Tag carrying the resource name; exclusive with `resource_name`.
    pub resource_name_tag: String,
    /// Field holding the current replica count.
    pub current_field: String,
    /// Upper bound on replicas; zero means unbounded.
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub max: i64,
    /// Lower bound on replicas.
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub min: i64,
    /// Expression computing the desired replica count.
    pub replicas: Option<Lambda>,
    /// Wait this long between scale-ups.
    pub increase_cooldown: Duration,
    /// Wait this long between scale-downs.
    pub decrease_cooldown: Duration,
    /// Tag written with the namespace.
    pub namespace_tag: String,
    /// Tag written with the resource kind.
    pub kind_tag: String,
    /// Tag written with the resource name.
    pub resource_tag: String,
}

impl Default for K8sAutoscaleNode {
    fn default() -> Self {
        K8sAutoscaleNode {
            cluster: String::new(),
            namespace: String::new(),
            kind: "deployments".to_string(),
            resource_name: String::new(),
            resource_name_tag: String::new(),
            current_field: String::new(),
            max: 0,
            min: 1,
            replicas: None,
            increase_cooldown: Duration::ZERO,
            decrease_cooldown: Duration::ZERO,
            namespace_tag: "namespace".to_string(),
            kind_tag: "kind".to_string(),
            resource_tag: "resource".to_string(),
        }
    }
}

impl K8sAutoscaleNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        match self.kind.as_str() {
            "deployments" | "replicasets" | "replicationcontrollers" => {}
            other => return Err(format!("invalid resource kind {other:?}")),
        }
        if self.resource_name.is_empty() == self.resource_name_tag.is_empty() {
            return Err(
                "exactly one of resourceName or resourceNameTag must be set".to_string(),
            );
        }
        scaling_bounds(self.min, &self.replicas)
    }
}

/// Scale a Docker Swarm service from the passing data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwarmAutoscaleNode {
    /// Named cluster configuration; empty uses the default.
    pub cluster: String,
    /// Fixed service name; exclusive with `service_name_tag`.
    pub service_name: String,
    /// Tag carrying the service name; exclusive with `service_name`.
    pub service_name_tag: String,
    /// Tag written with the scaled service name.
    pub output_service_tag: String,
    /// Field holding the current replica count.
    pub current_field: String,
    /// Upper bound on replicas; zero means unbounded.
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub max: i64,
    /// Lower bound on replicas.
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub min: i64,
    /// Expression computing the desired replica count.
    pub replicas: Option<Lambda>,
    /// Wait this long between scale-ups.
    pub increase_cooldown: Duration,
    /// Wait this long between scale-downs.
    pub decrease_cooldown: Duration,
}

impl Default for SwarmAutoscaleNode {
    fn default() -> Self {
        SwarmAutoscaleNode {
            cluster: String::new(),
            service_name: String::new(),
            service_name_tag: String::new(),
            output_service_tag: "service".to_string(),
            current_field: String::new(),
            max: 0,
            min: 1,
            replicas: None,
            increase_cooldown: Duration::ZERO,
            decrease_cooldown: Duration::ZERO,
        }
    }
}

impl SwarmAutoscaleNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.service_name.is_empty() == self.service_name_tag.is_empty() {
            return Err("exactly one of serviceName or serviceNameTag must be set".to_string());
        }
        scaling_bounds(self.min, &self.replicas)
    }
}

/// Scale an EC2 autoscale group from the passing data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ec2AutoscaleNode {
    /// Named cluster configuration; empty uses the default.
    pub cluster: String,
    /// Fixed group name; exclusive with `group_name_tag`.
    pub group_name: String,
    /// Tag carrying the group name; exclusive with `group_name`.
    pub group_name_tag: String,
    /// Tag written with the scaled group name.
    pub output_group_tag: String,
    /// Field holding the current instance count.
    pub current_field: String,
    /// Upper bound on instances; zero means unbounded.
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub max: i64,
    /// Lower bound on instances.
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub min: i64,
    /// Expression computing the desired instance count.
    pub replicas: Option<Lambda>,
    /// Wait this long between scale-ups.
    pub increase_cooldown: Duration,
    /// Wait this long between scale-downs.
    pub decrease_cooldown: Duration,
}

impl Default for Ec2AutoscaleNode {
    fn default() -> Self {
        Ec2AutoscaleNode {
            cluster: String::new(),
            group_name: String::new(),
            group_name_tag: String::new(),
            output_group_tag: "group".to_string(),
            current_field: String::new(),
            max: 0,
            min: 1,
            replicas: None,
            increase_cooldown: Duration::ZERO,
            decrease_cooldown: Duration::ZERO,
        }
    }
}

impl Ec2AutoscaleNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.group_name.is_empty() == self.group_name_tag.is_empty() {
            return Err("exactly one of groupName or groupNameTag must be set".to_string());
        }
        scaling_bounds(self.min, &self.replicas)
    }
}

/// Forward passing data to a Telegraf socket listener.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelegrafOutNode {
    /// Listener URL the data is written to.
    pub url: String,
    /// Timestamp precision of written points.
    pub precision: String,
    /// Write timeout; zero uses the transport default.
    pub timeout: Duration,
}

impl TelegrafOutNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("a listener url is required".to_string());
        }
        Ok(())
    }
}

fn scaling_bounds(min: i64, replicas: &Option<Lambda>) -> Result<(), String> {
    if min < 1 {
        return Err("min must be at least one".to_string());
    }
    match replicas {
        Some(lambda) if !lambda.expression.is_empty() => Ok(()),
        _ => Err("a replicas expression is required".to_string()),
    }
}

impl NodeRef<HttpPostNode> {
    /// POST to a named, preconfigured endpoint instead of a URL.
    pub fn endpoint(self, endpoint: &str) -> Self {
        self.mutate(|c| c.endpoint = endpoint.to_string())
    }

    /// Send `header` with each request.
    pub fn header(self, name: &str, value: &str) -> Self {
        self.mutate(|c| {
            c.headers.insert(name.to_string(), value.to_string());
        })
    }

    /// Write the response status code to this field.
    pub fn code_field(self, field: &str) -> Self {
        self.mutate(|c| c.code_field = field.to_string())
    }

    /// Capture the HTTP response as a point.
    pub fn capture_response(self) -> Self {
        self.mutate(|c| c.capture_response = true)
    }

    /// Request timeout.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.mutate(|c| c.timeout = timeout)
    }
}

impl NodeRef<InfluxdbOutNode> {
    /// Write to a named cluster.
    pub fn cluster(self, cluster: &str) -> Self {
        self.mutate(|c| c.cluster = cluster.to_string())
    }

    /// Target database.
    pub fn database(self, database: &str) -> Self {
        self.mutate(|c| c.database = database.to_string())
    }

    /// Target retention policy.
    pub fn retention_policy(self, policy: &str) -> Self {
        self.mutate(|c| c.retention_policy = policy.to_string())
    }

    /// Measurement name written.
    pub fn measurement(self, measurement: &str) -> Self {
        self.mutate(|c| c.measurement = measurement.to_string())
    }

    /// Write consistency level.
    pub fn write_consistency(self, consistency: &str) -> Self {
        self.mutate(|c| c.write_consistency = consistency.to_string())
    }

    /// Timestamp precision of written points.
    pub fn precision(self, precision: &str) -> Self {
        self.mutate(|c| c.precision = precision.to_string())
    }

    /// Number of points buffered before a write.
    pub fn buffer(self, buffer: i64) -> Self {
        self.mutate(|c| c.buffer = buffer)
    }

    /// Flush the buffer at least this often.
    pub fn flush_interval(self, interval: Duration) -> Self {
        self.mutate(|c| c.flush_interval = interval)
    }

    /// Create the target database at startup.
    pub fn create(self) -> Self {
        self.mutate(|c| c.create = true)
    }

    /// Add `tag` to written points.
    pub fn tag(self, name: &str, value: &str) -> Self {
        self.mutate(|c| {
            c.tags.insert(name.to_string(), value.to_string());
        })
    }
}

impl NodeRef<LoopbackNode> {
    /// Database the looped data is written under.
    pub fn database(self, database: &str) -> Self {
        self.mutate(|c| c.database = database.to_string())
    }

    /// Retention policy the looped data is written under.
    pub fn retention_policy(self, policy: &str) -> Self {
        self.mutate(|c| c.retention_policy = policy.to_string())
    }

    /// Measurement name written.
    pub fn measurement(self, measurement: &str) -> Self {
        self.mutate(|c| c.measurement = measurement.to_string())
    }

    /// Add `tag` to looped points.
    pub fn tag(self, name: &str, value: &str) -> Self {
        self.mutate(|c| {
            c.tags.insert(name.to_string(), value.to_string());
        })
    }
}

impl NodeRef<K8sAutoscaleNode> {
    /// Use a named cluster configuration.
    pub fn cluster(self, cluster: &str) -> Self {
        self.mutate(|c| c.cluster = cluster.to_string())
    }

    /// Namespace of the scaled resource.
    pub fn namespace(self, namespace: &str) -> Self {
        self.mutate(|c| c.namespace = namespace.to_string())
    }

    /// Resource kind (deployments, replicasets, or replicationcontrollers).
    pub fn kind(self, kind: &str) -> Self {
        self.mutate(|c| c.kind = kind.to_string())
    }

    /// Scale a fixed resource.
    pub fn resource_name(self, name: &str) -> Self {
        self.mutate(|c| c.resource_name = name.to_string())
    }

    /// Read the resource name from this tag.
    pub fn resource_name_tag(self, tag: &str) -> Self {
        self.mutate(|c| c.resource_name_tag = tag.to_string())
    }

    /// Field holding the current replica count.
    pub fn current_field(self, field: &str) -> Self {
        self.mutate(|c| c.current_field = field.to_string())
    }

    /// Upper bound on replicas.
    pub fn max(self, max: i64) -> Self {
        self.mutate(|c| c.max = max)
    }

    /// Lower bound on replicas.
    pub fn min(self, min: i64) -> Self {
        self.mutate(|c| c.min = min)
    }

    /// Expression computing the desired replica count.
    pub fn replicas(self, replicas: impl Into<Lambda>) -> Self {
        let replicas = replicas.into();
        self.mutate(|c| c.replicas = Some(replicas))
    }

    /// Wait this long between scale-ups.
    pub fn increase_cooldown(self, cooldown: Duration) -> Self {
        self.mutate(|c| c.increase_cooldown = cooldown)
    }

    /// Wait this long between scale-downs.
    pub fn decrease_cooldown(self, cooldown: Duration) -> Self {
        self.mutate(|c| c.decrease_cooldown = cooldown)
    }
}

impl NodeRef<SwarmAutoscaleNode> {
    /// Use a named cluster configuration.
    pub fn cluster(self, cluster: &str) -> Self {
        self.mutate(|c| c.cluster = cluster.to_string())
    }

    /// Scale a fixed service.
    pub fn service_name(self, name: &str) -> Self {
        self.mutate(|c| c.service_name = name.to_string())
    }

    /// Read the service name from this tag.
    pub fn service_name_tag(self, tag: &str) -> Self {
        self.mutate(|c| c.service_name_tag = tag.to_string())
    }

    /// Field holding the current replica count.
    pub fn current_field(self, field: &str) -> Self {
        self.mutate(|c| c.current_field = field.to_string())
    }

    /// Upper bound on replicas.
    pub fn max(self, max: i64) -> Self {
        self.mutate(|c| c.max = max)
    }

    /// Lower bound on replicas.
    pub fn min(self, min: i64) -> Self {
        self.mutate(|c| c.min = min)
    }

    /// Expression computing the desired replica count.
    pub fn replicas(self, replicas: impl Into<Lambda>) -> Self {
        let replicas = replicas.into();
        self.mutate(|c| c.replicas = Some(replicas))
    }

    /// Wait this long between scale-ups.
    pub fn increase_cooldown(self, cooldown: Duration) -> Self {
        self.mutate(|c| c.increase_cooldown = cooldown)
    }

    /// Wait this long between scale-downs.
    pub fn decrease_cooldown(self, cooldown: Duration) -> Self {
        self.mutate(|c| c.decrease_cooldown = cooldown)
    }
}

impl NodeRef<Ec2AutoscaleNode> {
    /// Use a named cluster configuration.
    pub fn cluster(self, cluster: &str) -> Self {
        self.mutate(|c| c.cluster = cluster.to_string())
    }

    /// Scale a fixed autoscale group.
    pub fn group_name(self, name: &str) -> Self {
        self.mutate(|c| c.group_name = name.to_string())
    }

    /// Read the group name from this tag.
    pub fn group_name_tag(self, tag: &str) -> Self {
        self.mutate(|c| c.group_name_tag = tag.to_string())
    }

    /// Field holding the current instance count.
    pub fn current_field(self, field: &str) -> Self {
        self.mutate(|c| c.current_field = field.to_string())
    }

    /// Upper bound on instances.
    pub fn max(self, max: i64) -> Self {
        self.mutate(|c| c.max = max)
    }

    /// Lower bound on instances.
    pub fn min(self, min: i64) -> Self {
        self.mutate(|c| c.min = min)
    }

    /// Expression computing the desired instance count.
    pub fn replicas(self, replicas: impl Into<Lambda>) -> Self {
        let replicas = replicas.into();
        self.mutate(|c| c.replicas = Some(replicas))
    }

    /// Wait this long between scale-ups.
    pub fn increase_cooldown(self, cooldown: Duration) -> Self {
        self.mutate(|c| c.increase_cooldown = cooldown)
    }

    /// Wait this long between scale-downs.
    pub fn decrease_cooldown(self, cooldown: Duration) -> Self {
        self.mutate(|c| c.decrease_cooldown = cooldown)
    }
}

impl NodeRef<TelegrafOutNode> {
    /// Timestamp precision of written points.
    pub fn precision(self, precision: &str) -> Self {
        self.mutate(|c| c.precision = precision.to_string())
    }

    /// Write timeout.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.mutate(|c| c.timeout = timeout)
    }
}
