use datgen::{DuplicatePolicy, GeneratorSettings, SettingsError, ValidationPolicy};

/// Attempts per bin group before the driver gives up on it.
pub const DEFAULT_MAX_ATTEMPTS_PER_GROUP: u32 = 1 << 20;

/// Requests queued on each worker's channel at once.
pub const DEFAULT_IN_FLIGHT_PER_WORKER: usize = 8;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("at least one bin group is required")]
    NoBins,
    #[error("{0} must be positive")]
    Zero(&'static str),
    /// Two groups target the same (urgency, scale) pair and would share bins.
    #[error("bin group (urgency {urgency}, scale {scale}) is listed twice")]
    DuplicateGroup { urgency: i64, scale: f64 },
    #[error("bin group {group}: {source}")]
    Group {
        group: usize,
        source: SettingsError,
    },
}

/// Everything a [`Driver`] run needs besides the generator and metrics.
///
/// Each entry of `bins` is one bin group: the driver fills every dynamism
/// center of that entry at its urgency and scale.
///
/// [`Driver`]: crate::Driver
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "DriverConfigBuilder"))]
pub struct DriverConfig {
    pub bins: Vec<GeneratorSettings>,
    /// Instances to collect in every (center, urgency, scale) bin.
    pub quota_per_bin: usize,
    /// Root of every seed the run draws.
    pub master_seed: u64,
    pub num_workers: usize,
    /// Starvation guard per bin group.
    pub max_attempts_per_group: u32,
    pub in_flight_per_worker: usize,
    pub policy: ValidationPolicy,
    pub duplicates: DuplicatePolicy,
}

impl DriverConfig {
    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::default()
    }

    /// Requests the driver keeps outstanding across the whole pool.
    pub const fn window(&self) -> usize {
        self.num_workers.saturating_mul(self.in_flight_per_worker)
    }

    /// Checks the config, including fields edited after building.
    ///
    /// # Errors
    /// - [`ConfigError::NoBins`] without any group
    /// - [`ConfigError::Group`] if a group's settings are invalid
    /// - [`ConfigError::DuplicateGroup`] if two groups share urgency and scale
    /// - [`ConfigError::Zero`] for a zero quota, worker count, attempt limit
    ///   or in-flight limit
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bins.is_empty() {
            return Err(ConfigError::NoBins);
        }
        for (i, group) in self.bins.iter().enumerate() {
            group
                .validate()
                .map_err(|source| ConfigError::Group { group: i, source })?;
            let clash = self.bins[..i].iter().any(|other| {
                other.urgency == group.urgency && other.scale.to_bits() == group.scale.to_bits()
            });
            if clash {
                return Err(ConfigError::DuplicateGroup {
                    urgency: group.urgency,
                    scale: group.scale,
                });
            }
        }

        for (name, value) in [
            ("quota_per_bin", self.quota_per_bin),
            ("num_workers", self.num_workers),
            ("max_attempts_per_group", self.max_attempts_per_group as usize),
            ("in_flight_per_worker", self.in_flight_per_worker),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }
        Ok(())
    }
}

/// Deserializing a [`DriverConfig`] goes through this builder, so omitted
/// fields take the builder's defaults.
#[derive(Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DriverConfigBuilder {
    bins: Vec<GeneratorSettings>,
    quota_per_bin: Option<usize>,
    master_seed: u64,
    num_workers: Option<usize>,
    max_attempts_per_group: Option<u32>,
    in_flight_per_worker: Option<usize>,
    policy: ValidationPolicy,
    duplicates: DuplicatePolicy,
}

impl DriverConfigBuilder {
    /// Adds one bin group.
    #[must_use]
    pub fn group(mut self, settings: GeneratorSettings) -> Self {
        self.bins.push(settings);
        self
    }

    #[must_use]
    pub fn groups(mut self, settings: impl IntoIterator<Item = GeneratorSettings>) -> Self {
        self.bins.extend(settings);
        self
    }

    #[must_use]
    pub fn quota_per_bin(mut self, quota: usize) -> Self {
        self.quota_per_bin = Some(quota);
        self
    }

    #[must_use]
    pub fn master_seed(mut self, seed: u64) -> Self {
        self.master_seed = seed;
        self
    }

    /// Defaults to the number of logical CPUs.
    #[must_use]
    pub fn num_workers(mut self, workers: usize) -> Self {
        self.num_workers = Some(workers);
        self
    }

    /// Defaults to [`DEFAULT_MAX_ATTEMPTS_PER_GROUP`].
    #[must_use]
    pub fn max_attempts_per_group(mut self, attempts: u32) -> Self {
        self.max_attempts_per_group = Some(attempts);
        self
    }

    /// Defaults to [`DEFAULT_IN_FLIGHT_PER_WORKER`].
    #[must_use]
    pub fn in_flight_per_worker(mut self, in_flight: usize) -> Self {
        self.in_flight_per_worker = Some(in_flight);
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Validates and builds the config.
    ///
    /// # Errors
    /// See [`DriverConfig::validate`].
    pub fn build(self) -> Result<DriverConfig, ConfigError> {
        let config = DriverConfig {
            bins: self.bins,
            quota_per_bin: self.quota_per_bin.unwrap_or(0),
            master_seed: self.master_seed,
            num_workers: self.num_workers.unwrap_or_else(num_cpus::get),
            max_attempts_per_group: self
                .max_attempts_per_group
                .unwrap_or(DEFAULT_MAX_ATTEMPTS_PER_GROUP),
            in_flight_per_worker: self
                .in_flight_per_worker
                .unwrap_or(DEFAULT_IN_FLIGHT_PER_WORKER),
            policy: self.policy,
            duplicates: self.duplicates,
        };
        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<DriverConfigBuilder> for DriverConfig {
    type Error = ConfigError;

    fn try_from(builder: DriverConfigBuilder) -> Result<Self, ConfigError> {
        builder.build()
    }
}
