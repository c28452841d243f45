use crate::error::ConfigError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Foreground color used for wind particles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindColor {
    #[default]
    Cyan,
    Blue,
    White,
    Magenta,
    Green,
    Yellow,
    Red,
}

impl WindColor {
    pub const ALL: [WindColor; 7] = [
        WindColor::Cyan,
        WindColor::Blue,
        WindColor::White,
        WindColor::Magenta,
        WindColor::Green,
        WindColor::Yellow,
        WindColor::Red,
    ];

    pub fn name(&self) -> &str {
        match self {
            WindColor::Cyan => "cyan",
            WindColor::Blue => "blue",
            WindColor::White => "white",
            WindColor::Magenta => "magenta",
            WindColor::Green => "green",
            WindColor::Yellow => "yellow",
            WindColor::Red => "red",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            WindColor::Cyan => WindColor::Blue,
            WindColor::Blue => WindColor::White,
            WindColor::White => WindColor::Magenta,
            WindColor::Magenta => WindColor::Green,
            WindColor::Green => WindColor::Yellow,
            WindColor::Yellow => WindColor::Red,
            WindColor::Red => WindColor::Cyan,
        }
    }
}

impl FromStr for WindColor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        WindColor::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownColor(s.to_string()))
    }
}

/// Particle population tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum DensityTier {
    Normal,
    #[default]
    High,
}

impl DensityTier {
    pub fn name(&self) -> &str {
        match self {
            DensityTier::Normal => "Normal",
            DensityTier::High => "HIGH DENSITY",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            DensityTier::Normal => DensityTier::High,
            DensityTier::High => DensityTier::Normal,
        }
    }
}

impl FromStr for DensityTier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(DensityTier::Normal),
            "high" => Ok(DensityTier::High),
            _ => Err(ConfigError::UnknownTier(s.to_string())),
        }
    }
}

impl TryFrom<String> for DensityTier {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Depth band of a particle, farthest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Far,
    Mid,
    Near,
}

impl Layer {
    /// Back-to-front drawing order
    pub const ALL: [Layer; 3] = [Layer::Far, Layer::Mid, Layer::Near];

    pub fn index(&self) -> usize {
        match self {
            Layer::Far => 0,
            Layer::Mid => 1,
            Layer::Near => 2,
        }
    }

    /// Nearer layers drift faster for the parallax effect
    pub fn speed_factor(&self) -> f32 {
        match self {
            Layer::Far => 1.0,
            Layer::Mid => 1.3,
            Layer::Near => 1.6,
        }
    }

    /// Contribution of one particle to a density cell
    pub fn density_weight(&self) -> f32 {
        match self {
            Layer::Far => 0.5,
            Layer::Mid => 0.75,
            Layer::Near => 1.0,
        }
    }
}

/// Horizontal wind direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Left,
    #[default]
    Right,
}

impl Direction {
    pub fn sign(&self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn arrow(&self) -> &str {
        match self {
            Direction::Left => "←",
            Direction::Right => "→",
        }
    }
}

/// Closed interval a random parameter is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Uniform draw; a degenerate range yields `min`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }

    fn check(&self, name: &str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ConfigError::InvalidTuning(format!(
                "{name} must be a finite range with min <= max (got {}..{})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// One row of the density glyph table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityLevel {
    /// Minimum cell intensity for this glyph
    pub threshold: f32,
    pub glyph: char,
}

/// Longest accepted fixed step in seconds
pub const MAX_UPDATE_INTERVAL_SECS: f32 = 1.0;
/// Upper limit for `max_particles`
pub const PARTICLE_LIMIT: usize = 100_000;

/// Every tunable constant of the wind model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindTuning {
    // === Timing ===
    /// Fixed simulation step in seconds
    pub update_interval_secs: f32,
    /// Maximum fixed steps run by a single `step` call
    pub max_catch_up_steps: u32,

    // === Strength ===
    /// Hard bounds for the effective wind strength
    pub strength_min: f32,
    pub strength_max: f32,
    /// Bounds for the user-adjustable baseline
    pub baseline_min: f32,
    pub baseline_max: f32,
    /// Baseline at startup
    pub baseline_default: f32,
    /// Baseline change per +/- key press
    pub strength_step: f32,
    /// Exponential approach rate toward the target strength (1/s)
    pub approach_rate: f32,
    /// Cap on strength change per second
    pub max_rate: f32,

    // === Gusts and direction ===
    /// Per-update probability of a gust starting
    pub gust_chance_normal: f32,
    pub gust_chance_high: f32,
    /// Gust length in seconds
    pub gust_duration: ValueRange,
    /// Strength added at the top of a gust
    pub gust_peak: ValueRange,
    /// Per-update probability of an automatic direction flip
    pub direction_change_normal: f32,
    pub direction_change_high: f32,

    // === Particles ===
    pub speed: ValueRange,
    pub amplitude: ValueRange,
    pub frequency: ValueRange,
    /// Lifetime in seconds
    pub lifetime: ValueRange,
    /// Phase advance per second per unit of frequency
    pub wave_rate: f32,
    /// Density-mode particles sway less and live longer
    pub density_amplitude_scale: f32,
    pub density_lifetime_scale: f32,
    /// Relative spawn weights for Far, Mid, Near
    pub layer_weights: [f32; 3],
    /// Width in columns of the upwind spawn band
    pub spawn_band: f32,

    // === Population ===
    /// Fraction of terminal cells populated per tier
    pub coverage_normal: f32,
    pub coverage_high: f32,
    pub max_particles: usize,

    // === Density view ===
    /// Terminal cells per density cell
    pub density_cell_cols: u16,
    pub density_cell_rows: u16,
    /// Ascending thresholds mapping intensity to glyphs
    pub density_levels: Vec<DensityLevel>,
}

impl Default for WindTuning {
    fn default() -> Self {
        Self {
            update_interval_secs: 0.03,
            max_catch_up_steps: 5,

            strength_min: 0.1,
            strength_max: 10.0,
            baseline_min: 0.1,
            baseline_max: 8.0,
            baseline_default: 1.2,
            strength_step: 0.3,
            approach_rate: 12.0,
            max_rate: 40.0,

            gust_chance_normal: 0.005,
            gust_chance_high: 0.01,
            gust_duration: ValueRange::new(0.3, 1.2),
            gust_peak: ValueRange::new(2.5, 5.0),
            direction_change_normal: 0.001,
            direction_change_high: 0.003,

            speed: ValueRange::new(0.5, 1.5),
            amplitude: ValueRange::new(0.8, 3.0),
            frequency: ValueRange::new(0.2, 0.5),
            lifetime: ValueRange::new(2.0, 6.0),
            wave_rate: 8.0,
            density_amplitude_scale: 0.5,
            density_lifetime_scale: 1.5,
            layer_weights: [0.2, 0.35, 0.45],
            spawn_band: 2.0,

            coverage_normal: 0.03,
            coverage_high: 0.15,
            max_particles: 2000,

            density_cell_cols: 1,
            density_cell_rows: 1,
            density_levels: vec![
                DensityLevel { threshold: 0.25, glyph: '░' },
                DensityLevel { threshold: 1.0, glyph: '▒' },
                DensityLevel { threshold: 2.0, glyph: '▓' },
                DensityLevel { threshold: 3.0, glyph: '█' },
            ],
        }
    }
}

impl WindTuning {
    pub fn gust_chance(&self, tier: DensityTier) -> f32 {
        match tier {
            DensityTier::Normal => self.gust_chance_normal,
            DensityTier::High => self.gust_chance_high,
        }
    }

    pub fn direction_change_chance(&self, tier: DensityTier) -> f32 {
        match tier {
            DensityTier::Normal => self.direction_change_normal,
            DensityTier::High => self.direction_change_high,
        }
    }

    pub fn coverage(&self, tier: DensityTier) -> f32 {
        match tier {
            DensityTier::Normal => self.coverage_normal,
            DensityTier::High => self.coverage_high,
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidTuning(format!("{name} must be positive (got {v})")))
            }
        };
        let non_negative = |name: &str, v: f32| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidTuning(format!("{name} must be non-negative (got {v})")))
            }
        };
        let probability = |name: &str, v: f32| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::InvalidTuning(format!("{name} must be within 0..=1 (got {v})")))
            }
        };

        positive("update_interval_secs", self.update_interval_secs)?;
        if self.update_interval_secs > MAX_UPDATE_INTERVAL_SECS {
            return Err(ConfigError::InvalidTuning(format!(
                "update_interval_secs must be at most {MAX_UPDATE_INTERVAL_SECS} (got {})",
                self.update_interval_secs
            )));
        }
        if self.max_catch_up_steps == 0 {
            return Err(ConfigError::InvalidTuning("max_catch_up_steps must be at least 1".into()));
        }
        ValueRange::new(self.strength_min, self.strength_max).check("strength range")?;
        ValueRange::new(self.baseline_min, self.baseline_max).check("baseline range")?;
        if !(self.baseline_min..=self.baseline_max).contains(&self.baseline_default) {
            return Err(ConfigError::InvalidTuning(format!(
                "baseline_default {} lies outside {}..={}",
                self.baseline_default, self.baseline_min, self.baseline_max
            )));
        }
        positive("strength_step", self.strength_step)?;
        positive("approach_rate", self.approach_rate)?;
        positive("max_rate", self.max_rate)?;
        probability("gust_chance_normal", self.gust_chance_normal)?;
        probability("gust_chance_high", self.gust_chance_high)?;
        probability("direction_change_normal", self.direction_change_normal)?;
        probability("direction_change_high", self.direction_change_high)?;

        self.gust_duration.check("gust_duration")?;
        positive("gust_duration.min", self.gust_duration.min)?;
        self.gust_peak.check("gust_peak")?;
        self.speed.check("speed")?;
        self.amplitude.check("amplitude")?;
        self.frequency.check("frequency")?;
        self.lifetime.check("lifetime")?;
        positive("lifetime.min", self.lifetime.min)?;
        positive("wave_rate", self.wave_rate)?;
        non_negative("density_amplitude_scale", self.density_amplitude_scale)?;
        positive("density_lifetime_scale", self.density_lifetime_scale)?;

        if self.layer_weights.iter().any(|w| !w.is_finite() || *w < 0.0)
            || self.layer_weights.iter().sum::<f32>() <= 0.0
        {
            return Err(ConfigError::InvalidTuning(
                "layer_weights must be non-negative with a positive sum".into(),
            ));
        }
        probability("coverage_normal", self.coverage_normal)?;
        probability("coverage_high", self.coverage_high)?;
        positive("spawn_band", self.spawn_band)?;
        if self.max_particles > PARTICLE_LIMIT {
            return Err(ConfigError::InvalidTuning(format!(
                "max_particles must be at most {PARTICLE_LIMIT} (got {})",
                self.max_particles
            )));
        }

        if self.density_cell_cols == 0 || self.density_cell_rows == 0 {
            return Err(ConfigError::InvalidTuning("density cell size must be non-zero".into()));
        }
        if self.density_levels.iter().any(|level| !level.threshold.is_finite()) {
            return Err(ConfigError::InvalidTuning("density_levels thresholds must be finite".into()));
        }
        if self
            .density_levels
            .windows(2)
            .any(|pair| pair[0].threshold >= pair[1].threshold)
        {
            return Err(ConfigError::InvalidTuning(
                "density_levels thresholds must be strictly ascending".into(),
            ));
        }
        Ok(())
    }
}
