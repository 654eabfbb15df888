//! Press-and-hold throw charging.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::attachment::Stage;
use super::effect::Notice;
use super::strand::Strand;
use crate::AnchorZone;

/// Why a charge could not start.
#[derive(Debug, Clone, PartialEq)]
pub enum ChargeRejection {
    /// A charge is already in progress. Not user-visible.
    AlreadyCharging,
    Notify(Notice),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseOutcome {
    NotCharging,
    /// Released before the minimum hold. The attempt is abandoned.
    TooShort,
    Throw { zone: AnchorZone },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeMeter {
    pub progress: f32,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct ThrowCharge {
    full: Duration,
    min: Duration,
    zone: Option<AnchorZone>,
    started_at: Duration,
    progress: f32,
}

impl ThrowCharge {
    pub fn new(full: Duration, min: Duration) -> Self {
        Self {
            full,
            min,
            zone: None,
            started_at: Duration::ZERO,
            progress: 0.0,
        }
    }

    pub fn is_charging(&self) -> bool {
        self.zone.is_some()
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn zone(&self) -> Option<&AnchorZone> {
        self.zone.as_ref()
    }

    fn min_fraction(&self) -> f32 {
        if self.full.is_zero() {
            return 0.0;
        }
        (self.min.as_secs_f32() / self.full.as_secs_f32()).min(1.0)
    }

    /// Start charging a throw at `zone`. Checks run in a fixed order and the
    /// first failing one wins.
    pub fn begin(
        &mut self,
        zone: Option<AnchorZone>,
        strand: &Strand,
        stage: &Stage,
        now: Duration,
    ) -> Result<(), ChargeRejection> {
        if self.is_charging() {
            return Err(ChargeRejection::AlreadyCharging);
        }
        // A string already in progress carries its own pattern.
        if !stage.has_pattern() {
            if strand.is_empty() {
                return Err(ChargeRejection::Notify(Notice::CollectBulbsFirst));
            }
            if !strand.is_full() {
                return Err(ChargeRejection::Notify(Notice::CollectFullStrand));
            }
        }
        let Some(zone) = zone else {
            return Err(ChargeRejection::Notify(Notice::NoTarget));
        };
        if stage.is_busy() {
            return Err(ChargeRejection::Notify(Notice::FinishCurrentString));
        }
        tracing::debug!("charge: begin at {}", zone.id);
        self.zone = Some(zone);
        self.started_at = now;
        self.progress = 0.0;
        Ok(())
    }

    /// Recompute progress from the hold time.
    pub fn tick(&mut self, now: Duration) {
        if !self.is_charging() {
            return;
        }
        if self.full.is_zero() {
            self.progress = 1.0;
            return;
        }
        let held = now.saturating_sub(self.started_at);
        self.progress = (held.as_secs_f32() / self.full.as_secs_f32()).min(1.0);
    }

    pub fn release(&mut self, now: Duration) -> ReleaseOutcome {
        if !self.is_charging() {
            return ReleaseOutcome::NotCharging;
        }
        self.tick(now);
        let progress = self.progress;
        let zone = self.zone.take();
        self.progress = 0.0;
        match zone {
            Some(zone) if progress >= self.min_fraction() => ReleaseOutcome::Throw { zone },
            _ => ReleaseOutcome::TooShort,
        }
    }

    /// Abort silently.
    pub fn cancel(&mut self) {
        self.zone = None;
        self.progress = 0.0;
    }

    pub fn label(&self) -> &'static str {
        if self.progress >= 1.0 {
            "Release to place lights!"
        } else if self.progress >= self.min_fraction() {
            "Almost ready…"
        } else {
            "Charging lights…"
        }
    }

    pub fn meter(&self) -> Option<ChargeMeter> {
        self.is_charging().then(|| ChargeMeter {
            progress: self.progress,
            label: self.label().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;
    use glam::Vec3;

    fn zone(id: &str) -> AnchorZone {
        AnchorZone {
            id: id.into(),
            structure_id: "cabin-1".into(),
            position: Vec3::new(0.0, 3.0, 0.0),
            normal: Vec3::Z,
        }
    }

    fn full_strand() -> Strand {
        let mut strand = Strand::new(2);
        strand.add_bulb(Color::neutral());
        strand.add_bulb(Color::neutral());
        strand
    }

    fn charge() -> ThrowCharge {
        ThrowCharge::new(Duration::from_millis(1200), Duration::from_millis(450))
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn rejections_follow_check_order() {
        let mut c = charge();
        let empty = Strand::new(2);
        let mut partial = Strand::new(2);
        partial.add_bulb(Color::neutral());

        assert_eq!(
            c.begin(None, &empty, &Stage::Idle, ms(0)),
            Err(ChargeRejection::Notify(Notice::CollectBulbsFirst))
        );
        assert_eq!(
            c.begin(Some(zone("a")), &partial, &Stage::Idle, ms(0)),
            Err(ChargeRejection::Notify(Notice::CollectFullStrand))
        );
        assert_eq!(
            c.begin(None, &full_strand(), &Stage::Idle, ms(0)),
            Err(ChargeRejection::Notify(Notice::NoTarget))
        );
        assert!(!c.is_charging());
    }

    #[test]
    fn second_anchor_needs_no_bulbs() {
        let mut c = charge();
        let stage = Stage::FirstAttached { first: zone("a") };
        assert!(c.begin(Some(zone("b")), &Strand::new(2), &stage, ms(0)).is_ok());
        assert_eq!(
            c.begin(Some(zone("b")), &Strand::new(2), &stage, ms(10)),
            Err(ChargeRejection::AlreadyCharging)
        );
    }

    #[test]
    fn busy_stages_reject_new_throws() {
        let mut c = charge();
        let stage = Stage::ThrowingSecond {
            first: zone("a"),
            second: zone("b"),
            flight: 1,
        };
        assert_eq!(
            c.begin(Some(zone("c")), &Strand::new(2), &stage, ms(0)),
            Err(ChargeRejection::Notify(Notice::FinishCurrentString))
        );
        let stage = Stage::ThrowingFirst { flight: 1 };
        assert_eq!(
            c.begin(Some(zone("c")), &Strand::new(2), &stage, ms(0)),
            Err(ChargeRejection::Notify(Notice::FinishCurrentString))
        );
    }

    #[test]
    fn progress_and_labels_track_hold_time() {
        let mut c = charge();
        c.begin(Some(zone("a")), &full_strand(), &Stage::Idle, ms(1000))
            .unwrap();
        c.tick(ms(1300));
        assert_eq!(c.label(), "Charging lights…");
        c.tick(ms(1600));
        assert!((c.progress() - 0.5).abs() < 1e-4);
        assert_eq!(c.label(), "Almost ready…");
        c.tick(ms(5000));
        assert_eq!(c.progress(), 1.0);
        assert_eq!(c.meter().unwrap().label, "Release to place lights!");
    }

    #[test]
    fn short_release_is_rejected() {
        let mut c = charge();
        c.begin(Some(zone("a")), &full_strand(), &Stage::Idle, ms(0))
            .unwrap();
        assert_eq!(c.release(ms(300)), ReleaseOutcome::TooShort);
        assert!(!c.is_charging());
        assert_eq!(c.release(ms(400)), ReleaseOutcome::NotCharging);
    }

    #[test]
    fn long_release_throws_at_the_zone() {
        let mut c = charge();
        c.begin(Some(zone("a")), &full_strand(), &Stage::Idle, ms(0))
            .unwrap();
        match c.release(ms(450)) {
            ReleaseOutcome::Throw { zone } => assert_eq!(zone.id, "a"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cancel_is_silent() {
        let mut c = charge();
        c.begin(Some(zone("a")), &full_strand(), &Stage::Idle, ms(0))
            .unwrap();
        c.cancel();
        assert!(c.meter().is_none());
        assert_eq!(c.release(ms(2000)), ReleaseOutcome::NotCharging);
    }
}
