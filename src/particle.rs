use crate::settings::{Direction, Layer, WindTuning};
use crate::wind::WindState;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Glyphs used for discrete wind particles
pub const WIND_CHARS: [char; 18] = [
    '·', '°', '~', '∴', '∵', '⋮', '⋯', '⁞', '⡀', '⡄', '⡆', '⡇', '⣀', '⣤', '⣦', '⣶', '⣷', '⣿',
];

/// Terminal area particles live in, in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub cols: u16,
    pub rows: u16,
}

impl Bounds {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.cols == 0 || self.rows == 0
    }

    pub fn area(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn contains_x(&self, x: f32) -> bool {
        x >= 0.0 && x < self.cols as f32
    }

    pub fn contains_y(&self, y: f32) -> bool {
        y >= 0.0 && y < self.rows as f32
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.contains_x(x) && self.contains_y(y)
    }
}

/// A single wind particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Fractional column
    pub x: f32,
    /// Fractional row
    pub y: f32,
    pub speed: f32,
    pub amplitude: f32,
    pub frequency: f32,
    /// Accumulated wave phase
    pub phase: f32,
    /// Fixed offset of the secondary wave
    pub phase_offset: f32,
    pub layer: Layer,
    /// Seconds left before the particle is recycled
    pub remaining: f32,
    /// Seconds since the last reset
    pub age: f32,
    pub glyph: char,
    pub density_mode: bool,
}

impl Particle {
    /// Create a particle at a random position anywhere inside `bounds`
    pub fn scattered<R: Rng + ?Sized>(
        bounds: Bounds,
        density_mode: bool,
        tuning: &WindTuning,
        rng: &mut R,
    ) -> Self {
        let mut particle = Self {
            x: 0.0,
            y: 0.0,
            speed: 0.0,
            amplitude: 0.0,
            frequency: 0.0,
            phase: 0.0,
            phase_offset: 0.0,
            layer: Layer::Near,
            remaining: 0.0,
            age: 0.0,
            glyph: WIND_CHARS[0],
            density_mode,
        };
        particle.reroll(density_mode, tuning, rng);
        particle.x = random_coord(bounds.cols, rng);
        particle.y = random_coord(bounds.rows, rng);
        particle
    }

    /// Advance one fixed step under the current wind
    pub fn update(&mut self, wind: &WindState, dt: f32, wave_rate: f32) {
        self.x += self.speed * self.layer.speed_factor() * wind.strength * wind.direction.sign();

        let before = self.wave_offset();
        self.phase += self.frequency * wave_rate * dt;
        self.y += self.wave_offset() - before;

        self.age += dt;
        self.remaining -= dt;
    }

    /// Combined vertical displacement of the primary and secondary waves
    fn wave_offset(&self) -> f32 {
        let primary = self.phase.sin() * self.amplitude;
        let secondary = (self.phase * 0.5 + self.phase_offset).cos() * self.amplitude * 0.3;
        primary + secondary
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Respawn on the upwind edge with fresh parameters
    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        bounds: Bounds,
        direction: Direction,
        density_mode: bool,
        tuning: &WindTuning,
        rng: &mut R,
    ) {
        self.reroll(density_mode, tuning, rng);

        let cols = bounds.cols as f32;
        let band = tuning.spawn_band.min(cols);
        self.x = match direction {
            Direction::Right => random_in(0.0, band, rng),
            Direction::Left => random_in(cols - band, cols, rng),
        };
        self.y = random_coord(bounds.rows, rng);
    }

    /// Keep the particle inside the rows, reversing its sway on contact
    pub fn bounce_vertical(&mut self, rows: u16) {
        let max_y = rows.saturating_sub(1) as f32;
        if self.y > max_y {
            self.y = max_y;
            self.phase += PI;
        } else if self.y < 0.0 {
            self.y = 0.0;
            self.phase += PI;
        }
    }

    /// Grid cell the particle currently occupies
    pub fn cell(&self) -> (u16, u16) {
        (self.x.max(0.0) as u16, self.y.max(0.0) as u16)
    }

    fn reroll<R: Rng + ?Sized>(&mut self, density_mode: bool, tuning: &WindTuning, rng: &mut R) {
        let (amplitude_scale, lifetime_scale) = if density_mode {
            (tuning.density_amplitude_scale, tuning.density_lifetime_scale)
        } else {
            (1.0, 1.0)
        };

        self.speed = tuning.speed.sample(rng);
        self.amplitude = tuning.amplitude.sample(rng) * amplitude_scale;
        self.frequency = tuning.frequency.sample(rng);
        self.phase = rng.gen_range(0.0..TAU);
        self.phase_offset = rng.gen_range(0.0..TAU);
        self.remaining = tuning.lifetime.sample(rng) * lifetime_scale;
        self.age = 0.0;
        self.layer = pick_layer(&tuning.layer_weights, rng);
        self.glyph = WIND_CHARS[rng.gen_range(0..WIND_CHARS.len())];
        self.density_mode = density_mode;
    }
}

/// Weighted layer choice; invalid weights fall back to the near layer
fn pick_layer<R: Rng + ?Sized>(weights: &[f32; 3], rng: &mut R) -> Layer {
    match WeightedIndex::new(weights) {
        Ok(dist) => Layer::ALL[dist.sample(rng)],
        Err(_) => Layer::Near,
    }
}

fn random_coord<R: Rng + ?Sized>(extent: u16, rng: &mut R) -> f32 {
    random_in(0.0, extent as f32, rng)
}

fn random_in<R: Rng + ?Sized>(lo: f32, hi: f32, rng: &mut R) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ValueRange;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn calm_wind(direction: Direction) -> WindState {
        WindState {
            strength: 1.0,
            target_strength: 1.0,
            direction,
            phase: 0.0,
            gust: None,
        }
    }

    #[test]
    fn test_update_drifts_with_wind_and_layer() {
        let tuning = WindTuning::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Particle::scattered(Bounds::new(80, 24), false, &tuning, &mut rng);
        p.layer = Layer::Mid;
        p.speed = 1.0;
        let x0 = p.x;

        p.update(&calm_wind(Direction::Right), 0.03, tuning.wave_rate);
        assert!((p.x - (x0 + 1.3)).abs() < 1e-4);

        p.update(&calm_wind(Direction::Left), 0.03, tuning.wave_rate);
        assert!((p.x - x0).abs() < 1e-4);
    }

    #[test]
    fn test_lifetime_strictly_decreases() {
        let tuning = WindTuning::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut p = Particle::scattered(Bounds::new(80, 24), false, &tuning, &mut rng);
        let wind = calm_wind(Direction::Right);
        let mut last = p.remaining;
        for _ in 0..10 {
            p.update(&wind, 0.03, tuning.wave_rate);
            assert!(p.remaining < last);
            last = p.remaining;
        }
    }

    #[test]
    fn test_vertical_sway_is_bounded_by_amplitude() {
        let tuning = WindTuning::default();
        let mut rng = StdRng::seed_from_u64(4);
        let mut p = Particle::scattered(Bounds::new(80, 24), false, &tuning, &mut rng);
        p.remaining = 1000.0;
        let y0 = p.y;
        let reach = p.amplitude * 1.3 * 2.0 + 1e-3;
        let wind = calm_wind(Direction::Right);
        for _ in 0..500 {
            p.update(&wind, 0.03, tuning.wave_rate);
            assert!((p.y - y0).abs() <= reach, "sway {} exceeds {}", p.y - y0, reach);
        }
    }

    #[test]
    fn test_reset_spawns_on_upwind_edge() {
        let tuning = WindTuning::default();
        let bounds = Bounds::new(80, 24);
        let mut rng = StdRng::seed_from_u64(5);
        let mut p = Particle::scattered(bounds, false, &tuning, &mut rng);

        for _ in 0..200 {
            p.reset(bounds, Direction::Right, false, &tuning, &mut rng);
            assert!(p.x >= 0.0 && p.x < tuning.spawn_band);
            assert!(bounds.contains(p.x, p.y));

            p.reset(bounds, Direction::Left, false, &tuning, &mut rng);
            assert!(p.x >= 80.0 - tuning.spawn_band && p.x < 80.0);
            assert!(bounds.contains(p.x, p.y));
        }
    }

    #[test]
    fn test_reset_in_single_column_bounds() {
        let tuning = WindTuning::default();
        let bounds = Bounds::new(1, 1);
        let mut rng = StdRng::seed_from_u64(6);
        let mut p = Particle::scattered(bounds, false, &tuning, &mut rng);
        p.reset(bounds, Direction::Left, false, &tuning, &mut rng);
        assert!(bounds.contains(p.x, p.y));
    }

    #[test]
    fn test_density_mode_alters_parameters() {
        let tuning = WindTuning {
            amplitude: ValueRange::new(2.0, 2.0),
            lifetime: ValueRange::new(4.0, 4.0),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let p = Particle::scattered(Bounds::new(10, 10), true, &tuning, &mut rng);
        assert!(p.density_mode);
        assert_eq!(p.amplitude, 2.0 * tuning.density_amplitude_scale);
        assert_eq!(p.remaining, 4.0 * tuning.density_lifetime_scale);
    }

    #[test]
    fn test_layer_weights_favor_near() {
        let tuning = WindTuning::default();
        let mut rng = StdRng::seed_from_u64(8);
        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            counts[pick_layer(&tuning.layer_weights, &mut rng).index()] += 1;
        }
        assert!(counts[2] > counts[1] && counts[1] > counts[0], "{counts:?}");
    }

    #[test]
    fn test_bounce_clamps_and_flips_phase() {
        let tuning = WindTuning::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut p = Particle::scattered(Bounds::new(10, 10), false, &tuning, &mut rng);
        p.y = 12.5;
        let phase = p.phase;
        p.bounce_vertical(10);
        assert_eq!(p.y, 9.0);
        assert!((p.phase - (phase + PI)).abs() < 1e-5);

        p.y = -0.5;
        p.bounce_vertical(10);
        assert_eq!(p.y, 0.0);
    }
}
