//! Wheel selector: maps a server-generated rotation to a ring sector, and
//! keeps each ring from repeating a value before its whole domain has come
//! up once.

use std::collections::HashSet;
use std::hash::Hash;

use basta_protocol::{Ring, Section, WheelSelection};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Goal;

/// Sectors on the outer (section) ring.
pub const OUTER_SECTORS: usize = 8;

/// Sectors on the inner (goal) ring.
pub const INNER_SECTORS: usize = 17;

/// Orientation of the wheel relative to the rotation values it is given.
///
/// Must agree with how clients animate `WheelSpinning { rotation }` so the
/// pointer visibly lands on the sector the server resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelConfig {
    /// Positive rotation turns the wheel clockwise.
    pub clockwise: bool,
    /// Angle between the wheel's 0° and the pointer.
    pub pointer_offset_deg: f64,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            clockwise: true,
            pointer_offset_deg: 0.0,
        }
    }
}

/// Resolves a rotation (in degrees, any magnitude) to a sector index.
///
/// The angle is normalised into `[0, 360)`, negated for counter-clockwise
/// wheels, shifted by the pointer offset, normalised again and divided by
/// the sector width.
pub fn resolve_sector(
    rotation_deg: f64,
    sectors: usize,
    clockwise: bool,
    pointer_offset_deg: f64,
) -> usize {
    if sectors == 0 {
        return 0;
    }
    let mut angle = rotation_deg.rem_euclid(360.0);
    if !clockwise {
        angle = -angle;
    }
    let angle = (angle + pointer_offset_deg).rem_euclid(360.0);
    let width = 360.0 / sectors as f64;
    (angle / width).floor() as usize % sectors
}

/// A spin: five to eight full turns plus a whole-degree remainder.
pub fn spin_rotation<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    let turns: u32 = rng.random_range(5..=8);
    let extra: u32 = rng.random_range(0..360);
    360 * turns + extra
}

/// 1–4 picks the inner ring, 5–6 the outer ring.
pub fn ring_for_roll(value: u8) -> Ring {
    if value <= 4 { Ring::Inner } else { Ring::Outer }
}

pub fn sector_count(ring: Ring) -> usize {
    match ring {
        Ring::Inner => INNER_SECTORS,
        Ring::Outer => OUTER_SECTORS,
    }
}

/// Maps a resolved sector index to what it selects.
pub fn selection_for(ring: Ring, index: usize) -> WheelSelection {
    match ring {
        Ring::Outer => {
            let index = index % OUTER_SECTORS;
            WheelSelection::Outer {
                index,
                section: Section::ALL[index],
            }
        }
        Ring::Inner => WheelSelection::Inner {
            number: (index % INNER_SECTORS) as Goal + 1,
        },
    }
}

/// Title of one of the 17 goals. Out-of-range numbers get a generic label.
pub fn goal_name(number: Goal) -> &'static str {
    match number {
        1 => "No poverty",
        2 => "Zero hunger",
        3 => "Good health and well-being",
        4 => "Quality education",
        5 => "Gender equality",
        6 => "Clean water and sanitation",
        7 => "Affordable and clean energy",
        8 => "Decent work and economic growth",
        9 => "Industry, innovation and infrastructure",
        10 => "Reduced inequalities",
        11 => "Sustainable cities and communities",
        12 => "Responsible consumption and production",
        13 => "Climate action",
        14 => "Life below water",
        15 => "Life on land",
        16 => "Peace, justice and strong institutions",
        17 => "Partnerships for the goals",
        _ => "Unknown goal",
    }
}

pub fn display_name(selection: &WheelSelection) -> String {
    match selection {
        WheelSelection::Outer { section, .. } => section.display_name().to_string(),
        WheelSelection::Inner { number } => {
            format!("Goal {number}: {}", goal_name(*number))
        }
    }
}

// ---------------------------------------------------------------------------
// UsageCycle
// ---------------------------------------------------------------------------

/// Values already selected on one ring during the current cycle.
///
/// Cleared the moment it covers the whole domain, so it never holds more
/// than `domain - 1` values between calls.
#[derive(Debug, Clone)]
pub struct UsageCycle<T> {
    used: HashSet<T>,
    domain: usize,
}

impl<T: Eq + Hash + Copy> UsageCycle<T> {
    pub fn new(domain: usize) -> Self {
        Self {
            used: HashSet::with_capacity(domain),
            domain,
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.used.contains(value)
    }

    /// Records `value`. Returns `false` (and changes nothing) when it was
    /// already used this cycle.
    pub fn record(&mut self, value: T) -> bool {
        if !self.used.insert(value) {
            return false;
        }
        if self.used.len() >= self.domain {
            tracing::debug!(domain = self.domain, "usage cycle complete, resetting");
            self.used.clear();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn clear(&mut self) {
        self.used.clear();
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    // =====================================================================
    // resolve_sector
    // =====================================================================

    #[test]
    fn test_resolve_sector_clockwise_no_offset_uses_rotation_mod_360() {
        // 45° per outer sector.
        assert_eq!(resolve_sector(0.0, 8, true, 0.0), 0);
        assert_eq!(resolve_sector(44.0, 8, true, 0.0), 0);
        assert_eq!(resolve_sector(45.0, 8, true, 0.0), 1);
        assert_eq!(resolve_sector(359.0, 8, true, 0.0), 7);
        assert_eq!(resolve_sector(360.0 * 6.0 + 100.0, 8, true, 0.0), 2);
    }

    #[test]
    fn test_resolve_sector_inner_ring_width() {
        // 360 / 17 ≈ 21.18° per sector.
        assert_eq!(resolve_sector(21.0, 17, true, 0.0), 0);
        assert_eq!(resolve_sector(22.0, 17, true, 0.0), 1);
        assert_eq!(resolve_sector(359.0, 17, true, 0.0), 16);
    }

    #[test]
    fn test_resolve_sector_applies_pointer_offset() {
        assert_eq!(resolve_sector(0.0, 8, true, 90.0), 2);
        assert_eq!(resolve_sector(300.0, 8, true, 90.0), 0);
    }

    #[test]
    fn test_resolve_sector_counter_clockwise_negates() {
        // -10° ≡ 350° → last sector.
        assert_eq!(resolve_sector(10.0, 8, false, 0.0), 7);
        assert_eq!(resolve_sector(0.0, 8, false, 0.0), 0);
    }

    #[test]
    fn test_resolve_sector_negative_rotation_normalises() {
        assert_eq!(resolve_sector(-50.0, 8, true, 0.0), 6);
    }

    #[test]
    fn test_resolve_sector_always_in_range() {
        for deg in 0..(360 * 9) {
            for sectors in [8, 17] {
                let idx = resolve_sector(deg as f64, sectors, true, 90.0);
                assert!(idx < sectors);
            }
        }
    }

    // =====================================================================
    // Spins and selections
    // =====================================================================

    #[test]
    fn test_spin_rotation_within_five_to_eight_turns() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let r = spin_rotation(&mut rng);
            assert!((1800..3240).contains(&r), "rotation {r} out of range");
        }
    }

    #[test]
    fn test_ring_for_roll_boundaries() {
        assert_eq!(ring_for_roll(1), Ring::Inner);
        assert_eq!(ring_for_roll(4), Ring::Inner);
        assert_eq!(ring_for_roll(5), Ring::Outer);
        assert_eq!(ring_for_roll(6), Ring::Outer);
    }

    #[test]
    fn test_selection_for_maps_index_to_section_and_number() {
        assert_eq!(
            selection_for(Ring::Outer, 5),
            WheelSelection::Outer {
                index: 5,
                section: Section::Environment
            }
        );
        assert_eq!(
            selection_for(Ring::Inner, 0),
            WheelSelection::Inner { number: 1 }
        );
        assert_eq!(
            selection_for(Ring::Inner, 16),
            WheelSelection::Inner { number: 17 }
        );
    }

    #[test]
    fn test_display_name_inner_includes_number() {
        let name = display_name(&WheelSelection::Inner { number: 13 });
        assert_eq!(name, "Goal 13: Climate action");
    }

    // =====================================================================
    // UsageCycle
    // =====================================================================

    #[test]
    fn test_usage_cycle_rejects_repeat_within_cycle() {
        let mut cycle = UsageCycle::new(8);
        assert!(cycle.record(Section::Health));
        assert!(!cycle.record(Section::Health));
        assert_eq!(cycle.len(), 1);
    }

    #[test]
    fn test_usage_cycle_clears_at_full_coverage() {
        let mut cycle = UsageCycle::new(INNER_SECTORS);
        for n in 1..=16u8 {
            assert!(cycle.record(n));
        }
        assert_eq!(cycle.len(), 16);
        assert!(cycle.record(17));
        assert!(cycle.is_empty());
        // Next cycle: earlier values are accepted again.
        assert!(cycle.record(1));
    }

    #[test]
    fn test_usage_cycle_never_repeats_before_domain_covered() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut cycle = UsageCycle::new(OUTER_SECTORS);
        let mut accepted = Vec::new();
        while accepted.len() < OUTER_SECTORS {
            let idx = resolve_sector(spin_rotation(&mut rng) as f64, OUTER_SECTORS, true, 0.0);
            if cycle.record(Section::ALL[idx]) {
                assert!(!accepted.contains(&idx));
                accepted.push(idx);
            }
        }
        assert!(cycle.is_empty());
    }
}
