//! Game constants, resolved from the optional `[tuning]` config section.

use std::time::Duration;

use crate::{DecorationType, Interval, TuningSection};

/// Interpolation parameter at which a thrown strand counts as arrived.
pub const STRAND_LANDING_THRESHOLD: f32 = 0.95;
/// Drops land at the very end of their arc.
pub const DROP_LANDING_THRESHOLD: f32 = 1.0;
/// Spawn candidates tried before the last sample is accepted as-is.
pub const SPAWN_RETRY_BUDGET: usize = 30;
pub const BOB_AMPLITUDE: f32 = 0.08;
pub const TEMP_SEGMENT_MAX_POINTS: usize = 48;
pub const DROP_DISTANCE: f32 = 2.4;
pub const DROP_ARC_HEIGHT: f32 = 1.2;
/// Upper bound for every configured duration so timestamps never overflow.
pub const MAX_CONFIGURED_INTERVAL: Duration = Duration::from_secs(3600);

/// Fully resolved game tuning. Built once per game from config.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuning {
    pub strand_capacity: usize,
    pub pickup_count: usize,
    pub collect_radius: f32,
    pub hover_offset: f32,
    pub drop_gravity: f32,
    pub bulb_spacing: f32,
    pub full_warning_interval: Duration,
    pub full_charge: Duration,
    pub min_charge: Duration,
    pub throw_duration: Duration,
    pub drop_duration: Duration,
    pub drop_immunity: Duration,
    pub frame_rate: u32,
    pub seed: Option<u64>,
    pub decor_type: DecorationType,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            strand_capacity: 8,
            pickup_count: 24,
            collect_radius: 1.6,
            hover_offset: 0.6,
            drop_gravity: 9.8,
            bulb_spacing: 0.45,
            full_warning_interval: Duration::from_millis(1600),
            full_charge: Duration::from_millis(1200),
            min_charge: Duration::from_millis(450),
            throw_duration: Duration::from_millis(780),
            drop_duration: Duration::from_millis(520),
            drop_immunity: Duration::from_millis(350),
            frame_rate: 60,
            seed: None,
            decor_type: DecorationType::Wreath,
        }
    }
}

impl Tuning {
    /// Overlay a config section on the defaults.
    pub fn from_section(section: &TuningSection) -> Self {
        let d = Self::default();
        let dur = |v: Option<Interval>, fallback: Duration| {
            v.map(Interval::as_duration)
                .unwrap_or(fallback)
                .min(MAX_CONFIGURED_INTERVAL)
        };
        Self {
            strand_capacity: section.strand_capacity.unwrap_or(d.strand_capacity).max(1),
            pickup_count: section.pickup_count.unwrap_or(d.pickup_count),
            collect_radius: section.collect_radius.unwrap_or(d.collect_radius),
            hover_offset: section.hover_offset.unwrap_or(d.hover_offset),
            drop_gravity: section.drop_gravity.unwrap_or(d.drop_gravity),
            bulb_spacing: section.bulb_spacing.unwrap_or(d.bulb_spacing),
            full_warning_interval: dur(section.full_warning_interval, d.full_warning_interval),
            full_charge: dur(section.full_charge, d.full_charge),
            min_charge: dur(section.min_charge, d.min_charge),
            throw_duration: dur(section.throw_duration, d.throw_duration),
            drop_duration: dur(section.drop_duration, d.drop_duration),
            drop_immunity: dur(section.drop_immunity, d.drop_immunity),
            frame_rate: section.frame_rate.unwrap_or(d.frame_rate).clamp(1, 240),
            seed: section.seed,
            decor_type: section.decor_type.unwrap_or(d.decor_type),
        }
    }

    /// Fixed frame step for hosts that drive the game on a timer.
    pub fn frame_step(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_overrides_only_named_fields() {
        let section = TuningSection {
            strand_capacity: Some(5),
            min_charge: Some(Interval::Millis(300.0)),
            ..Default::default()
        };
        let tuning = Tuning::from_section(&section);
        assert_eq!(tuning.strand_capacity, 5);
        assert_eq!(tuning.min_charge, Duration::from_millis(300));
        assert_eq!(tuning.full_charge, Duration::from_millis(1200));
        assert_eq!(tuning.collect_radius, 1.6);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let section = TuningSection {
            strand_capacity: Some(0),
            frame_rate: Some(0),
            ..Default::default()
        };
        let tuning = Tuning::from_section(&section);
        assert_eq!(tuning.strand_capacity, 1);
        assert_eq!(tuning.frame_rate, 1);
    }

    #[test]
    fn huge_intervals_are_capped() {
        let section = TuningSection {
            full_charge: Some(Interval::Seconds(1e300)),
            drop_immunity: Some(Interval::Seconds(1e12)),
            ..Default::default()
        };
        let tuning = Tuning::from_section(&section);
        assert_eq!(tuning.full_charge, MAX_CONFIGURED_INTERVAL);
        assert_eq!(tuning.drop_immunity, MAX_CONFIGURED_INTERVAL);
        assert!(tuning.full_charge.checked_add(Duration::from_secs(1)).is_some());
    }
}
