//! TOML-based scenario configuration and preset definitions.
//!
//! A scenario describes the horizon, the calculator to run and a flat list of
//! participant descriptors. [`ScenarioConfig::build_order`] turns the
//! descriptors into an [`Order`] with producers sorted by base cost.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::calc::{
    AveragingCalculator, Calculator, DEFAULT_CHUNK_SIZE, QuantizingCalculator, Strategy,
};
use crate::curve::{Curve, LoadProfile, POINTS};
use crate::error::MeritError;
use crate::order::Order;
use crate::participants::{
    Capacity, Dispatchable, MustRun, Producer, Storage, SupplyInterconnect, User, Volatile,
};
use crate::profile;
use crate::reserve::Decay;

/// Participant types accepted in `[[participants]]`.
pub const PARTICIPANT_TYPES: &[&str] = &[
    "must_run",
    "volatile",
    "dispatchable",
    "interconnect",
    "storage",
    "user",
];

/// Calculator kinds accepted in `[calculator]`.
pub const CALCULATOR_KINDS: &[&str] = &["exact", "quantizing", "averaging"];

/// Generated profile shapes.
pub const PROFILE_SHAPES: &[&str] = &["flat", "solar", "demand"];

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults. Load from TOML with
/// [`ScenarioConfig::from_toml_file`] or use [`ScenarioConfig::baseline`] for
/// the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Horizon length and master seed.
    #[serde(default)]
    pub horizon: HorizonConfig,
    /// Which calculator to run.
    #[serde(default)]
    pub calculator: CalculatorConfig,
    /// Producers and users, in any order.
    #[serde(default)]
    pub participants: Vec<ParticipantConfig>,
}

/// Horizon length and master seed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HorizonConfig {
    /// Number of points to calculate (must be > 0).
    pub points: usize,
    /// Master random seed for generated profiles.
    pub seed: u64,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            points: POINTS,
            seed: 42,
        }
    }
}

/// Calculator selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculatorConfig {
    /// `"exact"`, `"quantizing"` or `"averaging"`.
    pub kind: String,
    /// Points per chunk for the approximate calculators (must be > 1).
    pub chunk_size: usize,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            kind: "exact".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// One participant descriptor.
///
/// Which fields are required depends on `type`; absent required fields are
/// reported by [`ScenarioConfig::build_order`] as
/// [`MeritError::MissingAttribute`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParticipantConfig {
    /// Unique participant key.
    pub key: Option<String>,
    /// One of [`PARTICIPANT_TYPES`].
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Marginal cost per MWh.
    pub marginal_costs: Option<f64>,
    /// Number of installed units.
    pub number_of_units: f64,
    /// Output capacity of one unit (MW).
    pub output_capacity_per_unit: Option<f64>,
    /// Available share of installed capacity (0.0-1.0).
    pub availability: f64,
    /// Relative cost spread of a dispatchable with a cost curve.
    pub cost_spread: Option<f64>,
    /// Interconnect price per point, repeated over the horizon.
    pub cost_curve: Option<Vec<f64>>,
    /// Storage volume of one unit (MWh).
    pub volume_per_unit: Option<f64>,
    /// Storage charging efficiency (0.0-1.0].
    pub input_efficiency: f64,
    /// Storage discharging efficiency (0.0-1.0].
    pub output_efficiency: f64,
    /// Share of stored energy lost every point.
    pub decay_rate: Option<f64>,
    /// User consumption over the horizon (MWh), distributed by `profile`.
    pub total_consumption: Option<f64>,
    /// Explicit user demand per point, instead of a profile.
    pub demand: Option<Vec<f64>>,
    /// Capacity factors for must-run and volatile producers, or demand shares
    /// for users.
    pub profile: Option<ProfileConfig>,
}

impl Default for ParticipantConfig {
    fn default() -> Self {
        Self {
            key: None,
            kind: None,
            marginal_costs: None,
            number_of_units: 1.0,
            output_capacity_per_unit: None,
            availability: 1.0,
            cost_spread: None,
            cost_curve: None,
            volume_per_unit: None,
            input_efficiency: 1.0,
            output_efficiency: 1.0,
            decay_rate: None,
            total_consumption: None,
            demand: None,
            profile: None,
        }
    }
}

/// A profile given as explicit values or generated from a shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// Explicit values, repeated over the horizon. Takes precedence over `shape`.
    pub values: Option<Vec<f64>>,
    /// One of [`PROFILE_SHAPES`].
    pub shape: String,
    /// Sunrise hour for the solar shape (inclusive).
    pub sunrise: usize,
    /// Sunset hour for the solar shape (exclusive).
    pub sunset: usize,
    /// Relative daily swing of the demand shape.
    pub amplitude: f64,
    /// Phase offset of the demand shape (radians).
    pub phase_rad: f64,
    /// Gaussian noise standard deviation.
    pub noise_std: f64,
    /// Seed override; defaults to the horizon seed plus the participant index.
    pub seed: Option<u64>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            values: None,
            shape: "flat".to_string(),
            sunrise: 6,
            sunset: 18,
            amplitude: 0.3,
            phase_rad: 3.67,
            noise_std: 0.0,
            seed: None,
        }
    }
}

impl ProfileConfig {
    fn solar(sunrise: usize, sunset: usize, noise_std: f64) -> Self {
        Self {
            shape: "solar".to_string(),
            sunrise,
            sunset,
            noise_std,
            ..Self::default()
        }
    }

    fn demand(amplitude: f64, noise_std: f64) -> Self {
        Self {
            shape: "demand".to_string(),
            amplitude,
            noise_std,
            ..Self::default()
        }
    }

    fn explicit(values: Vec<f64>) -> Self {
        Self {
            values: Some(values),
            ..Self::default()
        }
    }

    /// Builds the profile for a horizon of `points`.
    ///
    /// With `as_shares` the values are normalised to sum to 1.0 over the
    /// horizon (user demand); otherwise they are capacity factors capped at
    /// 1.0. Explicit values are used as given in both cases.
    fn build(&self, points: usize, seed: u64, as_shares: bool) -> LoadProfile {
        if let Some(values) = &self.values {
            return LoadProfile::new(values.clone());
        }

        let points = points.max(1);
        let seed = self.seed.unwrap_or(seed);
        let values = match self.shape.as_str() {
            "solar" => profile::solar(points, self.sunrise, self.sunset, self.noise_std, seed),
            "demand" => profile::demand(points, self.amplitude, self.phase_rad, self.noise_std, seed),
            _ => vec![1.0; points],
        };

        if as_shares {
            LoadProfile::new(profile::normalized(values))
        } else {
            LoadProfile::new(values.into_iter().map(|v| v.min(1.0)).collect())
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"horizon.points"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ParticipantConfig {
    fn new(key: &str, kind: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            kind: Some(kind.to_string()),
            ..Self::default()
        }
    }

    fn key_or_placeholder(&self) -> String {
        self.key.clone().unwrap_or_else(|| "?".to_string())
    }

    fn require<T: Clone>(&self, value: &Option<T>, attribute: &'static str) -> Result<T, MeritError> {
        value.clone().ok_or_else(|| MeritError::MissingAttribute {
            key: self.key_or_placeholder(),
            attribute,
        })
    }

    fn capacity(&self) -> Result<Capacity, MeritError> {
        Ok(Capacity::new(
            self.number_of_units,
            self.require(&self.output_capacity_per_unit, "output_capacity_per_unit")?,
            self.availability,
        ))
    }
}

/// A participant built from its descriptor.
enum Built {
    Producer(Producer),
    User(User),
}

impl ScenarioConfig {
    /// Returns the baseline scenario: a year of hourly points served by a
    /// mixed fleet with pumped storage and an import interconnect.
    pub fn baseline() -> Self {
        Self {
            horizon: HorizonConfig::default(),
            calculator: CalculatorConfig::default(),
            participants: vec![
                ParticipantConfig {
                    marginal_costs: Some(6.0),
                    output_capacity_per_unit: Some(1500.0),
                    availability: 0.9,
                    profile: Some(ProfileConfig::default()),
                    ..ParticipantConfig::new("nuclear", "must_run")
                },
                ParticipantConfig {
                    marginal_costs: Some(12.0),
                    number_of_units: 5.0,
                    output_capacity_per_unit: Some(100.0),
                    profile: Some(ProfileConfig::default()),
                    ..ParticipantConfig::new("chp", "must_run")
                },
                ParticipantConfig {
                    marginal_costs: Some(0.0),
                    number_of_units: 400.0,
                    output_capacity_per_unit: Some(3.0),
                    profile: Some(ProfileConfig::explicit(vec![0.35])),
                    ..ParticipantConfig::new("wind", "volatile")
                },
                ParticipantConfig {
                    marginal_costs: Some(0.0),
                    number_of_units: 3000.0,
                    output_capacity_per_unit: Some(1.0),
                    profile: Some(ProfileConfig::solar(6, 18, 0.1)),
                    ..ParticipantConfig::new("solar", "volatile")
                },
                ParticipantConfig {
                    marginal_costs: Some(20.0),
                    output_capacity_per_unit: Some(1000.0),
                    volume_per_unit: Some(8000.0),
                    input_efficiency: 0.85,
                    output_efficiency: 0.9,
                    ..ParticipantConfig::new("pumped_hydro", "storage")
                },
                ParticipantConfig {
                    marginal_costs: Some(30.0),
                    number_of_units: 4.0,
                    output_capacity_per_unit: Some(800.0),
                    availability: 0.95,
                    ..ParticipantConfig::new("coal", "dispatchable")
                },
                ParticipantConfig {
                    marginal_costs: Some(45.0),
                    number_of_units: 10.0,
                    output_capacity_per_unit: Some(400.0),
                    cost_spread: Some(0.2),
                    ..ParticipantConfig::new("ccgt", "dispatchable")
                },
                ParticipantConfig {
                    output_capacity_per_unit: Some(1000.0),
                    cost_curve: Some(vec![
                        40.0, 38.0, 37.0, 36.0, 36.0, 38.0, 45.0, 55.0, 60.0, 58.0, 55.0, 52.0,
                        50.0, 50.0, 52.0, 56.0, 62.0, 70.0, 72.0, 68.0, 60.0, 52.0, 46.0, 42.0,
                    ]),
                    ..ParticipantConfig::new("import", "interconnect")
                },
                ParticipantConfig {
                    marginal_costs: Some(80.0),
                    number_of_units: 20.0,
                    output_capacity_per_unit: Some(100.0),
                    ..ParticipantConfig::new("peakers", "dispatchable")
                },
                ParticipantConfig {
                    total_consumption: Some(8000.0 * POINTS as f64),
                    profile: Some(ProfileConfig::demand(0.3, 0.02)),
                    ..ParticipantConfig::new("households", "user")
                },
            ],
        }
    }

    /// Returns the high-solar preset: a large PV fleet with extra storage,
    /// calculated with the quantizing calculator.
    pub fn high_solar() -> Self {
        let mut cfg = Self::baseline();
        cfg.calculator.kind = "quantizing".to_string();
        for participant in &mut cfg.participants {
            match participant.key.as_deref() {
                Some("solar") => {
                    participant.number_of_units = 8000.0;
                    participant.profile = Some(ProfileConfig::solar(5, 19, 0.1));
                }
                Some("pumped_hydro") => {
                    participant.number_of_units = 3.0;
                    participant.volume_per_unit = Some(10_000.0);
                }
                _ => {}
            }
        }
        cfg
    }

    /// Returns the peak-demand preset: higher and peakier demand than the
    /// fleet can always serve, calculated with the averaging calculator.
    pub fn peak_demand() -> Self {
        let mut cfg = Self::baseline();
        cfg.calculator.kind = "averaging".to_string();
        cfg.calculator.chunk_size = 4;
        for participant in &mut cfg.participants {
            if participant.key.as_deref() == Some("households") {
                participant.total_consumption = Some(11_000.0 * POINTS as f64);
                participant.profile = Some(ProfileConfig::demand(0.35, 0.03));
            }
        }
        cfg
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "high_solar", "peak_demand"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "high_solar" => Ok(Self::high_solar()),
            "peak_demand" => Ok(Self::peak_demand()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. Missing
    /// type-specific attributes are left to [`Self::build_order`].
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.horizon.points == 0 {
            errors.push(ConfigError {
                field: "horizon.points".into(),
                message: "must be > 0".into(),
            });
        }

        let c = &self.calculator;
        if !CALCULATOR_KINDS.contains(&c.kind.as_str()) {
            errors.push(ConfigError {
                field: "calculator.kind".into(),
                message: format!(
                    "must be one of {}, got \"{}\"",
                    CALCULATOR_KINDS.join(", "),
                    c.kind
                ),
            });
        }
        if c.kind != "exact" && c.chunk_size <= 1 {
            errors.push(ConfigError {
                field: "calculator.chunk_size".into(),
                message: "must be > 1".into(),
            });
        }

        let mut seen = HashSet::new();
        for (i, p) in self.participants.iter().enumerate() {
            let field = |name: &str| format!("participants[{i}].{name}");

            match &p.key {
                Some(key) if !seen.insert(key.as_str()) => errors.push(ConfigError {
                    field: field("key"),
                    message: format!("duplicate key \"{key}\""),
                }),
                Some(_) => {}
                None => errors.push(ConfigError {
                    field: field("key"),
                    message: "is required".into(),
                }),
            }
            if let Some(kind) = &p.kind {
                if !PARTICIPANT_TYPES.contains(&kind.as_str()) {
                    errors.push(ConfigError {
                        field: field("type"),
                        message: format!(
                            "must be one of {}, got \"{kind}\"",
                            PARTICIPANT_TYPES.join(", ")
                        ),
                    });
                }
            }
            if p.number_of_units < 0.0 {
                errors.push(ConfigError {
                    field: field("number_of_units"),
                    message: "must be >= 0".into(),
                });
            }
            if !(0.0..=1.0).contains(&p.availability) {
                errors.push(ConfigError {
                    field: field("availability"),
                    message: "must be in [0.0, 1.0]".into(),
                });
            }
            for (name, eff) in [
                ("input_efficiency", p.input_efficiency),
                ("output_efficiency", p.output_efficiency),
            ] {
                if eff <= 0.0 || eff > 1.0 {
                    errors.push(ConfigError {
                        field: field(name),
                        message: "must be in (0.0, 1.0]".into(),
                    });
                }
            }
            if p.decay_rate.is_some_and(|r| !(0.0..=1.0).contains(&r)) {
                errors.push(ConfigError {
                    field: field("decay_rate"),
                    message: "must be in [0.0, 1.0]".into(),
                });
            }
            if p.cost_spread.is_some_and(|s| s < 0.0) {
                errors.push(ConfigError {
                    field: field("cost_spread"),
                    message: "must be >= 0".into(),
                });
            }
            if p.cost_curve.as_ref().is_some_and(Vec::is_empty) {
                errors.push(ConfigError {
                    field: field("cost_curve"),
                    message: "must not be empty".into(),
                });
            }
            if let Some(profile) = &p.profile {
                validate_profile(profile, &field("profile"), &mut errors);
            }
        }

        errors
    }

    /// Builds the calculator named in `[calculator]`.
    ///
    /// # Errors
    ///
    /// Returns [`MeritError::InvalidChunkSize`] for an approximate calculator
    /// with `chunk_size <= 1`. Unknown kinds fall back to the exact calculator;
    /// [`Self::validate`] reports them.
    pub fn build_calculator(&self) -> Result<Strategy, MeritError> {
        let size = self.calculator.chunk_size;
        Ok(match self.calculator.kind.as_str() {
            "quantizing" => Strategy::Quantizing(QuantizingCalculator::new(size)?),
            "averaging" => Strategy::Averaging(AveragingCalculator::new(size)?),
            _ => Strategy::Exact(Calculator::new()),
        })
    }

    /// Builds an [`Order`] from the participant descriptors.
    ///
    /// Producers are sorted by base cost, keeping descriptor order among
    /// equal costs, so the result always passes the calculators' order check.
    ///
    /// # Errors
    ///
    /// Returns [`MeritError::MissingAttribute`] when a descriptor lacks a
    /// field its type requires and [`MeritError::UnknownParticipantType`] for
    /// an unrecognised type.
    pub fn build_order(&self) -> Result<Order, MeritError> {
        let points = self.horizon.points;
        let mut order = Order::with_points(points);

        for (i, descriptor) in self.participants.iter().enumerate() {
            let seed = self.horizon.seed.wrapping_add(i as u64);
            match build_participant(descriptor, points, seed)? {
                Built::Producer(producer) => {
                    order.add_producer(producer);
                }
                Built::User(user) => {
                    order.add_user(user);
                }
            }
        }

        order.sort_producers();
        Ok(order)
    }
}

fn validate_profile(profile: &ProfileConfig, field: &str, errors: &mut Vec<ConfigError>) {
    if let Some(values) = &profile.values {
        if values.is_empty() {
            errors.push(ConfigError {
                field: format!("{field}.values"),
                message: "must not be empty".into(),
            });
        }
        if values.iter().any(|v| *v < 0.0) {
            errors.push(ConfigError {
                field: format!("{field}.values"),
                message: "must be >= 0".into(),
            });
        }
        return;
    }

    if !PROFILE_SHAPES.contains(&profile.shape.as_str()) {
        errors.push(ConfigError {
            field: format!("{field}.shape"),
            message: format!(
                "must be one of {}, got \"{}\"",
                PROFILE_SHAPES.join(", "),
                profile.shape
            ),
        });
    }
    if profile.shape == "solar"
        && (profile.sunrise >= profile.sunset || profile.sunset > profile::STEPS_PER_DAY)
    {
        errors.push(ConfigError {
            field: format!("{field}.sunrise"),
            message: format!(
                "must be < {field}.sunset, and sunset <= {}",
                profile::STEPS_PER_DAY
            ),
        });
    }
}

fn build_participant(p: &ParticipantConfig, points: usize, seed: u64) -> Result<Built, MeritError> {
    let key = p.require(&p.key, "key")?;
    let kind = p.require(&p.kind, "type")?;

    let profile = |as_shares: bool| -> Result<LoadProfile, MeritError> {
        let cfg = p.require(&p.profile, "profile")?;
        if cfg.values.as_ref().is_some_and(Vec::is_empty) {
            return Err(MeritError::MissingAttribute {
                key: key.clone(),
                attribute: "profile.values",
            });
        }
        Ok(cfg.build(points, seed, as_shares))
    };

    let built = match kind.as_str() {
        "must_run" => Built::Producer(
            MustRun::new(
                key.as_str(),
                p.capacity()?,
                p.require(&p.marginal_costs, "marginal_costs")?,
                profile(false)?,
            )
            .into(),
        ),
        "volatile" => Built::Producer(
            Volatile::new(
                key.as_str(),
                p.capacity()?,
                p.require(&p.marginal_costs, "marginal_costs")?,
                profile(false)?,
            )
            .into(),
        ),
        "dispatchable" => {
            let capacity = p.capacity()?;
            let cost = p.require(&p.marginal_costs, "marginal_costs")?;
            let producer = match p.cost_spread {
                Some(spread) => Dispatchable::with_cost_spread(key.as_str(), capacity, cost, spread),
                None => Dispatchable::new(key.as_str(), capacity, cost),
            };
            Built::Producer(producer.into())
        }
        "interconnect" => {
            let prices = p.require(&p.cost_curve, "cost_curve")?;
            if prices.is_empty() {
                return Err(MeritError::MissingAttribute {
                    key: key.clone(),
                    attribute: "cost_curve",
                });
            }
            let curve = Curve::new((0..points).map(|t| prices[t % prices.len()]).collect());
            Built::Producer(SupplyInterconnect::new(key.as_str(), p.capacity()?, curve).into())
        }
        "storage" => {
            let mut storage = Storage::new(
                key.as_str(),
                p.capacity()?,
                p.require(&p.marginal_costs, "marginal_costs")?,
                p.require(&p.volume_per_unit, "volume_per_unit")?,
            )
            .with_efficiencies(p.input_efficiency, p.output_efficiency);
            if let Some(rate) = p.decay_rate {
                storage = storage.with_decay(Decay::proportional(rate));
            }
            Built::Producer(storage.into())
        }
        "user" => match &p.demand {
            Some(values) => Built::User(User::with_curve(key.as_str(), Curve::new(values.clone()))),
            None => Built::User(User::with_profile(
                key.as_str(),
                p.require(&p.total_consumption, "total_consumption")?,
                profile(true)?,
            )),
        },
        _ => {
            return Err(MeritError::UnknownParticipantType {
                key: key.clone(),
                kind: kind.clone(),
            });
        }
    };
    Ok(built)
}
