use crate::settings::{DensityTier, Direction, WindTuning};
use log::debug;
use rand::Rng;

/// Strength is considered settled once it is this close to its target
const SETTLE_EPSILON: f32 = 0.05;

/// An in-progress gust
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gust {
    pub elapsed: f32,
    pub duration: f32,
    /// Strength added at full envelope
    pub peak: f32,
}

impl Gust {
    /// Trapezoid envelope: ramp up over the first 20%, hold, ramp down over the last 20%
    pub fn envelope(&self) -> f32 {
        let progress = (self.elapsed / self.duration).clamp(0.0, 1.0);
        if progress < 0.2 {
            progress / 0.2
        } else if progress < 0.8 {
            1.0
        } else {
            (1.0 - (progress - 0.8) / 0.2).max(0.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Global wind read by every particle each step
#[derive(Debug, Clone, PartialEq)]
pub struct WindState {
    pub strength: f32,
    /// Level `strength` is interpolating toward
    pub target_strength: f32,
    pub direction: Direction,
    /// Seconds of simulated time, drives the calm oscillation
    pub phase: f32,
    pub gust: Option<Gust>,
}

impl WindState {
    pub fn gust_active(&self) -> bool {
        self.gust.is_some()
    }
}

/// Produces time-varying wind strength, gusts and direction changes
#[derive(Debug, Clone)]
pub struct WindPatternGenerator {
    state: WindState,
    /// User-adjustable level the calm oscillation is centered on
    baseline: f32,
    tuning: WindTuning,
}

impl WindPatternGenerator {
    pub fn new(tuning: WindTuning) -> Self {
        let baseline = tuning.baseline_default;
        let strength = baseline.clamp(tuning.strength_min, tuning.strength_max);
        Self {
            state: WindState {
                strength,
                target_strength: strength,
                direction: Direction::Right,
                phase: 0.0,
                gust: None,
            },
            baseline,
            tuning,
        }
    }

    pub fn state(&self) -> &WindState {
        &self.state
    }

    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    /// Advance the wind pattern by `dt` seconds
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, tier: DensityTier, rng: &mut R) {
        let tuning = &self.tuning;
        let state = &mut self.state;
        state.phase += dt;

        let t = state.phase;
        let variation = (t * 0.8).sin() * 0.4 + (t * 0.3).cos() * 0.2;
        let calm = (self.baseline + variation).max(self.baseline * 0.5);

        if state.gust.is_none() && rng.gen::<f32>() < tuning.gust_chance(tier) {
            let gust = Gust {
                elapsed: 0.0,
                duration: tuning.gust_duration.sample(rng),
                peak: tuning.gust_peak.sample(rng),
            };
            debug!("gust: peak {:.2} over {:.2}s", gust.peak, gust.duration);
            state.gust = Some(gust);
        }

        let mut boost = 0.0;
        if let Some(gust) = state.gust.as_mut() {
            gust.elapsed += dt;
            if gust.is_finished() {
                state.gust = None;
            } else {
                boost = gust.peak * gust.envelope();
            }
        }

        state.target_strength = (calm + boost).clamp(tuning.strength_min, tuning.strength_max);

        // Exponential approach, rate-limited so gusts never pop
        let gap = state.target_strength - state.strength;
        let approach = gap * (1.0 - (-tuning.approach_rate * dt).exp());
        let max_change = tuning.max_rate * dt;
        state.strength = (state.strength + approach.clamp(-max_change, max_change))
            .clamp(tuning.strength_min, tuning.strength_max);

        if self.is_settled() && rng.gen::<f32>() < tuning.direction_change_chance(tier) {
            self.flip_direction();
        }
    }

    /// No gust running and strength has caught up with its target
    pub fn is_settled(&self) -> bool {
        self.state.gust.is_none()
            && (self.state.target_strength - self.state.strength).abs() < SETTLE_EPSILON
    }

    /// Explicit direction override, effective for the next particle update
    pub fn set_direction(&mut self, direction: Direction) {
        self.state.direction = direction;
    }

    pub fn flip_direction(&mut self) {
        self.state.direction = self.state.direction.flipped();
        debug!("wind direction flipped to {:?}", self.state.direction);
    }

    /// Shift the calm baseline by `delta`, clamped to the configured range
    pub fn adjust_strength(&mut self, delta: f32) {
        self.baseline = (self.baseline + delta).clamp(self.tuning.baseline_min, self.tuning.baseline_max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 0.03;

    fn quiet_tuning() -> WindTuning {
        WindTuning {
            gust_chance_normal: 0.0,
            gust_chance_high: 0.0,
            direction_change_normal: 0.0,
            direction_change_high: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_gust_envelope_shape() {
        let mut gust = Gust { elapsed: 0.0, duration: 1.0, peak: 3.0 };
        assert_eq!(gust.envelope(), 0.0);
        gust.elapsed = 0.1;
        assert!((gust.envelope() - 0.5).abs() < 1e-5);
        gust.elapsed = 0.5;
        assert_eq!(gust.envelope(), 1.0);
        gust.elapsed = 0.9;
        assert!((gust.envelope() - 0.5).abs() < 1e-5);
        gust.elapsed = 1.0;
        assert!(gust.is_finished());
    }

    #[test]
    fn test_strength_follows_baseline_without_gusts() {
        let mut wind = WindPatternGenerator::new(quiet_tuning());
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            wind.update(DT, DensityTier::High, &mut rng);
            let s = wind.state().strength;
            assert!(s > 0.4 && s < 2.0, "calm strength drifted to {s}");
            assert!(!wind.state().gust_active());
        }
        assert_eq!(wind.state().direction, Direction::Right);
    }

    #[test]
    fn test_strength_change_is_rate_limited() {
        let tuning = WindTuning {
            gust_chance_high: 1.0,
            direction_change_high: 0.0,
            gust_peak: crate::settings::ValueRange::new(5.0, 5.0),
            ..Default::default()
        };
        let max_step = tuning.max_rate * DT + 1e-4;
        let mut wind = WindPatternGenerator::new(tuning);
        let mut rng = StdRng::seed_from_u64(2);
        let mut last = wind.state().strength;
        let mut saw_gust = false;
        for _ in 0..300 {
            wind.update(DT, DensityTier::High, &mut rng);
            let s = wind.state().strength;
            assert!((s - last).abs() <= max_step, "jumped {last} -> {s}");
            saw_gust |= wind.state().gust_active();
            last = s;
        }
        assert!(saw_gust);
    }

    #[test]
    fn test_gust_raises_strength_above_calm() {
        let tuning = WindTuning {
            gust_chance_high: 1.0,
            direction_change_high: 0.0,
            gust_duration: crate::settings::ValueRange::new(1.0, 1.0),
            gust_peak: crate::settings::ValueRange::new(4.0, 4.0),
            ..Default::default()
        };
        let mut wind = WindPatternGenerator::new(tuning);
        let mut rng = StdRng::seed_from_u64(3);
        let mut peak = 0.0f32;
        for _ in 0..20 {
            wind.update(DT, DensityTier::High, &mut rng);
            peak = peak.max(wind.state().strength);
        }
        assert!(peak > 3.5, "gust never developed, peak {peak}");
    }

    #[test]
    fn test_adjust_strength_clamps_baseline() {
        let tuning = quiet_tuning();
        let (lo, hi) = (tuning.baseline_min, tuning.baseline_max);
        let mut wind = WindPatternGenerator::new(tuning);
        for _ in 0..100 {
            wind.adjust_strength(0.3);
        }
        assert_eq!(wind.baseline(), hi);
        for _ in 0..100 {
            wind.adjust_strength(-0.3);
        }
        assert_eq!(wind.baseline(), lo);
    }

    #[test]
    fn test_set_direction_is_immediate() {
        let mut wind = WindPatternGenerator::new(quiet_tuning());
        wind.set_direction(Direction::Left);
        assert_eq!(wind.state().direction, Direction::Left);
        assert_eq!(wind.state().direction.sign(), -1.0);
    }

    #[test]
    fn test_automatic_flip_waits_for_settled_strength() {
        let tuning = WindTuning {
            gust_chance_high: 0.0,
            direction_change_high: 1.0,
            ..Default::default()
        };
        let mut wind = WindPatternGenerator::new(tuning);
        let mut rng = StdRng::seed_from_u64(4);
        let mut flips = 0;
        for _ in 0..100 {
            let before = wind.state().direction;
            wind.update(DT, DensityTier::High, &mut rng);
            if wind.state().direction != before {
                assert!(wind.is_settled());
                flips += 1;
            }
        }
        assert!(flips > 0);
    }

    proptest! {
        #[test]
        fn strength_stays_within_bounds(
            seed: u64,
            ops in prop::collection::vec(-3i8..=3, 1..200),
            gust_chance in 0.0f32..=1.0,
        ) {
            let tuning = WindTuning {
                gust_chance_normal: gust_chance,
                gust_chance_high: gust_chance,
                ..Default::default()
            };
            let (lo, hi) = (tuning.strength_min, tuning.strength_max);
            let (blo, bhi) = (tuning.baseline_min, tuning.baseline_max);
            let mut wind = WindPatternGenerator::new(tuning);
            let mut rng = StdRng::seed_from_u64(seed);
            for op in ops {
                match op {
                    3 => wind.adjust_strength(0.3),
                    -3 => wind.adjust_strength(-0.3),
                    _ => {
                        for _ in 0..op.unsigned_abs() as usize + 1 {
                            wind.update(DT, DensityTier::High, &mut rng);
                        }
                    }
                }
                let s = wind.state().strength;
                prop_assert!(s >= lo && s <= hi, "strength {} outside {}..={}", s, lo, hi);
                prop_assert!(wind.baseline() >= blo && wind.baseline() <= bhi);
            }
        }
    }
}
