//! Process-wide common fields and the environment probe that feeds them.

use std::fmt;
use std::sync::OnceLock;

use crate::record::{EventRecord, MeasurementMap, PropertyMap};

/// Environment variable naming the caller's DNS domain.
pub const DEFAULT_DOMAIN_VAR: &str = "USERDNSDOMAIN";

/// Environment variable read by [`EnvHostVersion::default`].
pub const DEFAULT_HOST_VERSION_VAR: &str = "BEACON_HOST_VERSION";

/// Domain suffixes treated as internal networks.
pub const DEFAULT_INTERNAL_DOMAINS: &[&str] = &[
    "redmond.corp.microsoft.com",
    "northamerica.corp.microsoft.com",
    "fareast.corp.microsoft.com",
    "ntdev.corp.microsoft.com",
    "wingroup.corp.microsoft.com",
    "southpacific.corp.microsoft.com",
    "wingroup.windeploy.ntdev.microsoft.com",
    "ddnet.microsoft.com",
    "europe.corp.microsoft.com",
];

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Guesses whether the host sits on an internal network by comparing the
/// domain environment variable against a list of known suffixes.
pub struct EnvironmentProbe {
    domain_var: String,
    internal_domains: Vec<String>,
    lookup: EnvLookup,
}

impl EnvironmentProbe {
    pub fn new() -> Self {
        Self {
            domain_var: DEFAULT_DOMAIN_VAR.to_string(),
            internal_domains: DEFAULT_INTERNAL_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
            lookup: Box::new(|var| std::env::var(var).ok()),
        }
    }

    /// Read the domain from a different variable
    pub fn with_domain_var(mut self, var: impl Into<String>) -> Self {
        self.domain_var = var.into();
        self
    }

    /// Replace the internal domain suffix list
    pub fn with_internal_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.internal_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the environment lookup (tests use this to avoid touching
    /// the real process environment)
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Box::new(lookup);
        self
    }

    pub fn is_internal_network(&self) -> bool {
        let Some(domain) = (self.lookup)(&self.domain_var) else {
            return false;
        };
        let domain = domain.trim().to_ascii_lowercase();
        if domain.is_empty() {
            return false;
        }
        self.internal_domains.iter().any(|suffix| {
            let suffix = suffix.to_ascii_lowercase();
            domain == suffix || domain.ends_with(&format!(".{suffix}"))
        })
    }
}

impl Default for EnvironmentProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnvironmentProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentProbe")
            .field("domain_var", &self.domain_var)
            .field("internal_domains", &self.internal_domains)
            .finish_non_exhaustive()
    }
}

/// Best-effort lookup of the host application's version.
pub trait HostVersionSource {
    /// `None` when the version is unknown; never fails.
    fn host_version(&self) -> Option<String>;
}

impl<F> HostVersionSource for F
where
    F: Fn() -> Option<String>,
{
    fn host_version(&self) -> Option<String> {
        self()
    }
}

/// Reads the host version from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvHostVersion {
    var: String,
}

impl EnvHostVersion {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvHostVersion {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_VERSION_VAR)
    }
}

impl HostVersionSource for EnvHostVersion {
    fn host_version(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Fields stamped onto every event a reporter builds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonFields {
    pub properties: PropertyMap,
    pub measurements: MeasurementMap,
}

impl CommonFields {
    pub const INTERNAL_KEY: &'static str = "common.isinternal";
    pub const HOST_VERSION_KEY: &'static str = "common.hostversion";

    /// No common fields at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute common fields from the environment.
    pub fn detect(probe: &EnvironmentProbe, host: &dyn HostVersionSource) -> Self {
        let mut fields = Self::empty();
        let internal = probe.is_internal_network();
        fields
            .properties
            .insert(Self::INTERNAL_KEY.to_string(), internal.to_string());
        if let Some(version) = host.host_version() {
            fields
                .properties
                .insert(Self::HOST_VERSION_KEY.to_string(), version);
        }
        tracing::debug!(
            internal,
            host_version = fields.properties.get(Self::HOST_VERSION_KEY).map(String::as_str),
            "computed common telemetry fields"
        );
        fields
    }

    /// Fields detected with the default probe, computed on first use and
    /// shared for the rest of the process.
    pub fn process_wide() -> &'static CommonFields {
        static FIELDS: OnceLock<CommonFields> = OnceLock::new();
        FIELDS.get_or_init(|| Self::detect(&EnvironmentProbe::new(), &EnvHostVersion::default()))
    }

    /// Replace the host version, whatever the probe found.
    pub fn with_host_version(mut self, version: impl Into<String>) -> Self {
        self.properties
            .insert(Self::HOST_VERSION_KEY.to_string(), version.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_measurement(mut self, key: impl Into<String>, value: f64) -> Self {
        self.measurements.insert(key.into(), value);
        self
    }

    /// Stamp these fields onto `record`, overwriting colliding keys.
    pub fn apply_to(&self, record: &mut EventRecord) {
        crate::record::merge_properties(&mut record.properties, &self.properties);
        crate::record::merge_measurements(&mut record.measurements, &self.measurements);
    }
}
