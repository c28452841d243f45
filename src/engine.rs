use crate::clock::{SimulationClock, StepResult};
use crate::density::{DensityField, DensityGrid, DensityLevels, GridDims};
use crate::error::ConfigError;
use crate::particle::Bounds;
use crate::pool::ParticlePool;
use crate::settings::{DensityTier, Direction, WindColor, WindTuning};
use crate::wind::{WindPatternGenerator, WindState};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

/// User-facing configuration owned by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    pub color: WindColor,
    pub density_mode: bool,
    pub tier: DensityTier,
    pub bounds: Bounds,
}

impl SimulationConfig {
    /// Validate a color name and assemble the startup configuration
    pub fn new(
        color: &str,
        density_mode: bool,
        high_tier: bool,
        bounds: Bounds,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            color: color.parse()?,
            density_mode,
            tier: if high_tier { DensityTier::High } else { DensityTier::Normal },
            bounds,
        })
    }
}

/// What the renderer should paint this frame
#[derive(Debug, Clone, Copy)]
pub enum View<'a> {
    /// Discrete glyphs; use `ParticlePool::snapshot` for back-to-front order
    Particles(&'a ParticlePool),
    Density {
        grid: &'a DensityGrid,
        levels: &'a DensityLevels,
    },
}

/// Status values shown alongside the field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hud {
    pub color: WindColor,
    pub strength: f32,
    pub baseline: f32,
    pub direction: Direction,
    pub gust: bool,
    pub particles: usize,
    pub density_mode: bool,
    pub tier: DensityTier,
    pub paused: bool,
}

/// Read-only view of the engine handed to a `RenderAdapter`
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub bounds: Bounds,
    pub view: View<'a>,
    pub hud: Hud,
}

/// Drawing surface the engine renders into
pub trait RenderAdapter {
    type Error;

    fn draw(&mut self, scene: &Scene<'_>) -> Result<(), Self::Error>;
}

/// Owns the wind, particles and clock and advances them in fixed steps
pub struct Engine {
    config: SimulationConfig,
    tuning: WindTuning,
    wind: WindPatternGenerator,
    pool: ParticlePool,
    density: DensityField,
    clock: SimulationClock,
    rng: StdRng,
    /// Bounds or tier changed; rebalance the pool at the next tick
    population_dirty: bool,
}

impl Engine {
    pub fn new(
        config: SimulationConfig,
        tuning: WindTuning,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        tuning.validate()?;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let interval = Duration::try_from_secs_f32(tuning.update_interval_secs)
            .map_err(|e| ConfigError::InvalidTuning(format!("update_interval_secs: {e}")))?;
        let clock = SimulationClock::new(interval, tuning.max_catch_up_steps);

        let mut pool = ParticlePool::new();
        let target = ParticlePool::target_count(config.bounds, config.tier, &tuning);
        pool.resize(target, config.bounds, config.density_mode, &tuning, &mut rng);

        let mut engine = Self {
            config,
            wind: WindPatternGenerator::new(tuning.clone()),
            density: DensityField::new(&tuning),
            tuning,
            pool,
            clock,
            rng,
            population_dirty: false,
        };
        if engine.config.density_mode {
            engine.refresh_density();
        }

        info!(
            "engine started: {}x{}, {} particles, tier {}, color {}",
            config.bounds.cols,
            config.bounds.rows,
            engine.pool.len(),
            config.tier.name(),
            config.color.name()
        );
        Ok(engine)
    }

    /// Run every fixed step that is due at `now`
    pub fn step(&mut self, now: Instant) -> StepResult {
        let result = self.clock.advance(now);
        if result.dropped > Duration::ZERO {
            warn!(
                "simulation fell behind; dropped {:.0}ms after {} catch-up steps",
                result.dropped.as_secs_f32() * 1000.0,
                result.steps
            );
        }

        for _ in 0..result.steps {
            self.tick();
        }
        if result.stepped() && self.config.density_mode {
            self.refresh_density();
        }
        result
    }

    /// One wind update followed by one pool tick
    fn tick(&mut self) {
        if self.population_dirty {
            self.rebalance();
        }
        let dt = self.tuning.update_interval_secs;
        self.wind.update(dt, self.config.tier, &mut self.rng);
        self.pool.tick(
            self.wind.state(),
            self.config.bounds,
            self.config.density_mode,
            &self.tuning,
            &mut self.rng,
        );
    }

    fn rebalance(&mut self) {
        let target = ParticlePool::target_count(self.config.bounds, self.config.tier, &self.tuning);
        let before = self.pool.len();
        self.pool.resize(
            target,
            self.config.bounds,
            self.config.density_mode,
            &self.tuning,
            &mut self.rng,
        );
        if target != before {
            debug!(
                "population {} -> {} (far/mid/near {:?})",
                before,
                target,
                self.pool.layer_counts()
            );
        }
        self.population_dirty = false;
    }

    fn refresh_density(&mut self) {
        let dims = GridDims::for_bounds(self.config.bounds, &self.tuning);
        self.density.refresh(self.pool.snapshot(), dims);
    }

    pub fn scene(&self) -> Scene<'_> {
        let view = if self.config.density_mode {
            View::Density {
                grid: self.density.grid(),
                levels: self.density.levels(),
            }
        } else {
            View::Particles(&self.pool)
        };
        let wind = self.wind.state();
        Scene {
            bounds: self.config.bounds,
            view,
            hud: Hud {
                color: self.config.color,
                strength: wind.strength,
                baseline: self.baseline(),
                direction: wind.direction,
                gust: wind.gust_active(),
                particles: self.pool.len(),
                density_mode: self.config.density_mode,
                tier: self.config.tier,
                paused: self.is_paused(),
            },
        }
    }

    /// Paint the current state; a failed draw leaves the simulation untouched
    pub fn render<A: RenderAdapter>(&self, adapter: &mut A) -> Result<(), A::Error> {
        adapter.draw(&self.scene())
    }

    /// Record new terminal bounds; particles are rebalanced on the next tick
    pub fn handle_resize(&mut self, cols: u16, rows: u16) {
        let bounds = Bounds::new(cols, rows);
        if bounds != self.config.bounds {
            debug!("resize to {}x{}", cols, rows);
            self.config.bounds = bounds;
            self.population_dirty = true;
        }
    }

    pub fn toggle_density_mode(&mut self) {
        self.config.density_mode = !self.config.density_mode;
        debug!("density mode {}", if self.config.density_mode { "on" } else { "off" });
        if self.config.density_mode {
            self.refresh_density();
        }
    }

    pub fn toggle_density_tier(&mut self) {
        self.config.tier = self.config.tier.toggled();
        debug!("density tier {}", self.config.tier.name());
        self.population_dirty = true;
    }

    pub fn increase_strength(&mut self) {
        self.wind.adjust_strength(self.tuning.strength_step);
    }

    pub fn decrease_strength(&mut self) {
        self.wind.adjust_strength(-self.tuning.strength_step);
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.wind.set_direction(direction);
    }

    pub fn cycle_color(&mut self) {
        self.config.color = self.config.color.next();
    }

    pub fn toggle_pause(&mut self) {
        self.clock.toggle_pause();
    }

    pub fn stop(&mut self) {
        self.clock.stop();
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[cfg(test)]
    pub fn tuning(&self) -> &WindTuning {
        &self.tuning
    }

    pub fn wind_state(&self) -> &WindState {
        self.wind.state()
    }

    pub fn baseline(&self) -> f32 {
        self.wind.baseline()
    }

    #[cfg(test)]
    pub fn particles(&self) -> impl Iterator<Item = &crate::particle::Particle> + '_ {
        self.pool.snapshot()
    }

    pub fn particle_count(&self) -> usize {
        self.pool.len()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }
}
