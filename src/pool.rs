use crate::particle::{Bounds, Particle};
use crate::settings::{DensityTier, Layer, WindTuning};
use crate::wind::WindState;
use rand::Rng;

/// Fixed-capacity arena of particle slots
///
/// Slots are recycled in place; the vector only changes length when the
/// population target changes.
#[derive(Debug, Clone, Default)]
pub struct ParticlePool {
    particles: Vec<Particle>,
}

impl ParticlePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Population for a terminal area at the given tier
    pub fn target_count(bounds: Bounds, tier: DensityTier, tuning: &WindTuning) -> usize {
        if bounds.is_empty() {
            return 0;
        }
        let wanted = (bounds.area() as f32 * tuning.coverage(tier)) as usize;
        wanted.min(tuning.max_particles)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Grow or shrink to `target` slots, keeping existing particles where they are
    pub fn resize<R: Rng + ?Sized>(
        &mut self,
        target: usize,
        bounds: Bounds,
        density_mode: bool,
        tuning: &WindTuning,
        rng: &mut R,
    ) {
        if target <= self.particles.len() {
            self.particles.truncate(target);
            return;
        }
        self.particles.reserve(target - self.particles.len());
        while self.particles.len() < target {
            self.particles
                .push(Particle::scattered(bounds, density_mode, tuning, rng));
        }
    }

    /// Advance every particle one step, recycling expired and escaped ones
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        wind: &WindState,
        bounds: Bounds,
        density_mode: bool,
        tuning: &WindTuning,
        rng: &mut R,
    ) {
        if self.is_empty() || bounds.is_empty() {
            return;
        }
        let dt = tuning.update_interval_secs;
        for particle in &mut self.particles {
            // Stale positions from before a resize are respawned, not bounced
            if !bounds.contains(particle.x, particle.y) {
                particle.reset(bounds, wind.direction, density_mode, tuning, rng);
                continue;
            }

            particle.update(wind, dt, tuning.wave_rate);

            if particle.is_expired() || !bounds.contains_x(particle.x) {
                particle.reset(bounds, wind.direction, density_mode, tuning, rng);
            } else {
                particle.bounce_vertical(bounds.rows);
            }
        }
    }

    /// Read-only view ordered far to near, insertion order within a layer
    pub fn snapshot(&self) -> impl Iterator<Item = &Particle> + '_ {
        Layer::ALL.into_iter().flat_map(move |layer| {
            self.particles.iter().filter(move |p| p.layer == layer)
        })
    }

    #[cfg(test)]
    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    /// Count of particles per layer, indexed by `Layer::index`
    pub fn layer_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for particle in &self.particles {
            counts[particle.layer.index()] += 1;
        }
        counts
    }
}
