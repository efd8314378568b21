//! Parsed cluster configuration handed between the monitor and the instance.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Provider that produced a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSource {
    /// Fetched over the binary protocol from a data node.
    Cccp,
    /// Fetched from the HTTP streaming endpoint.
    Http,
    /// Loaded from a local cache file.
    File,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cccp => "cccp",
            Self::Http => "http",
            Self::File => "file",
        };
        formatter.write_str(label)
    }
}

/// Cluster topology as delivered by the configuration monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    bucket: String,
    revision: u64,
    source: ConfigSource,
    nodes: Vec<String>,
}

impl ClusterConfig {
    /// Builds a configuration without any nodes.
    #[must_use]
    pub fn new(bucket: impl Into<String>, revision: u64, source: ConfigSource) -> Self {
        Self {
            bucket: bucket.into(),
            revision,
            source,
            nodes: Vec::new(),
        }
    }

    /// Replaces the node list.
    #[must_use]
    pub fn with_nodes<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes = nodes.into_iter().map(Into::into).collect();
        self
    }

    /// Bucket the configuration describes.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.bucket.as_str()
    }

    /// Monotonic revision assigned by the cluster.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Provider that produced this configuration.
    #[must_use]
    pub const fn source(&self) -> ConfigSource {
        self.source
    }

    /// `host:port` addresses of the data nodes.
    #[must_use]
    pub fn nodes(&self) -> &[String] {
        self.nodes.as_slice()
    }
}

/// Cheaply cloneable, immutable handle to a [`ClusterConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigHandle(Arc<ClusterConfig>);

impl ConfigHandle {
    /// Wraps a parsed configuration.
    #[must_use]
    pub fn new(config: ClusterConfig) -> Self {
        Self(Arc::new(config))
    }

    /// Returns `true` when both handles point at the same allocation.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<ClusterConfig> for ConfigHandle {
    fn from(config: ClusterConfig) -> Self {
        Self::new(config)
    }
}

impl Deref for ConfigHandle {
    type Target = ClusterConfig;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
