//! Overlap detection and repulsion between bubbles
//!
//! Bubbles are discs in cartesian space. Overlapping pairs are pushed apart
//! along the line joining their centers, then mapped back to polar
//! (orbit radius, angle) around the shared center.

use glam::Vec2;

use super::bubble::Bubble;
use crate::settings::EngineSettings;
use crate::{cartesian_to_polar, wrap_angle};

/// Result of an overlap check between two discs
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the discs overlap (and have a defined push direction)
    pub hit: bool,
    /// Unit vector from the first disc toward the second
    pub normal: Vec2,
    /// `min_dist - distance` (positive when hit)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between two discs given by center and diameter
///
/// Coincident centers are reported as a miss: there is no direction to push.
pub fn disc_overlap(a: Vec2, size_a: f32, b: Vec2, size_b: f32) -> CollisionResult {
    let min_dist = (size_a + size_b) / 2.0;
    let delta = b - a;
    let distance = delta.length();

    if !distance.is_finite() || distance <= f32::EPSILON || distance >= min_dist {
        return CollisionResult::miss();
    }

    CollisionResult {
        hit: true,
        normal: delta / distance,
        penetration: min_dist - distance,
    }
}

/// One repulsion pass over all pairs. Returns the number of pairs pushed.
///
/// Displacements are computed from the positions at the start of the pass
/// and applied together, so the result does not depend on iteration order.
/// Each bubble in an overlapping pair moves by half of
/// `penetration * damping`. Orbit radii are floored at `min_orbit_radius`.
/// Any pushed pair that would end up closer together (from the floor, or
/// from pushes netted across several neighbours) is left where it was, and
/// the check repeats until it holds for every pushed pair.
pub fn resolve_collisions(bubbles: &mut [Bubble], settings: &EngineSettings) -> usize {
    let n = bubbles.len();
    if n < 2 {
        return 0;
    }

    let center = settings.center;
    let positions: Vec<Vec2> = bubbles.iter().map(|b| b.position(center)).collect();
    let sizes: Vec<f32> = bubbles.iter().map(|b| b.size(settings)).collect();

    let mut displacement = vec![Vec2::ZERO; n];
    let mut pushed = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            let result = disc_overlap(positions[i], sizes[i], positions[j], sizes[j]);
            if !result.hit {
                continue;
            }
            let push = result.normal * (result.penetration * settings.damping * 0.5);
            displacement[i] -= push;
            displacement[j] += push;
            pushed.push((i, j));
        }
    }

    if pushed.is_empty() {
        return 0;
    }

    let mut moved: Vec<(f32, f32)> = bubbles.iter().map(|b| (b.orbit_radius, b.angle)).collect();
    for i in 0..n {
        if displacement[i] == Vec2::ZERO {
            continue;
        }
        let (r, theta) = cartesian_to_polar(positions[i] + displacement[i] - center);
        if r.is_finite() && theta.is_finite() {
            moved[i] = (r.max(settings.min_orbit_radius), wrap_angle(theta));
        }
    }

    // A frozen bubble stays put, which changes the outcome for every other
    // pair it belongs to, so re-check until no new bubble freezes.
    let at = |(r, theta): (f32, f32)| center + crate::polar_to_cartesian(r, theta);
    let mut frozen = vec![false; n];
    loop {
        let mut changed = false;
        for &(i, j) in &pushed {
            if frozen[i] && frozen[j] {
                continue;
            }
            let final_i = if frozen[i] { positions[i] } else { at(moved[i]) };
            let final_j = if frozen[j] { positions[j] } else { at(moved[j]) };
            if final_i.distance(final_j) < positions[i].distance(positions[j]) {
                frozen[i] = true;
                frozen[j] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut count = 0;
    for &(i, j) in &pushed {
        if !frozen[i] && !frozen[j] {
            count += 1;
        }
    }
    for (i, bubble) in bubbles.iter_mut().enumerate() {
        if !frozen[i] {
            (bubble.orbit_radius, bubble.angle) = moved[i];
        }
    }

    log::trace!("Repulsion pass pushed {} pairs", count);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polar_to_cartesian;
    use crate::sim::bubble::BubbleStatus;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    fn placed(id: &str, radius: f32, angle: f32) -> Bubble {
        let mut b = Bubble::new(id.into(), id.into(), 0, 0, BubbleStatus::Confirmed);
        b.orbit_radius = radius;
        b.angle = angle;
        b
    }

    #[test]
    fn test_disc_overlap() {
        let result = disc_overlap(Vec2::ZERO, 40.0, Vec2::new(30.0, 0.0), 40.0);
        assert!(result.hit);
        assert!((result.penetration - 10.0).abs() < 1e-5);
        assert_eq!(result.normal, Vec2::X);

        assert!(!disc_overlap(Vec2::ZERO, 40.0, Vec2::new(40.0, 0.0), 40.0).hit);
        assert!(!disc_overlap(Vec2::ONE, 40.0, Vec2::ONE, 40.0).hit);
    }

    #[test]
    fn test_overlapping_pair_separates() {
        let settings = EngineSettings::default();
        // Same radius, close angles: ~10 px apart, min distance 40
        let mut bubbles = vec![placed("a", 100.0, 0.0), placed("b", 100.0, 0.1)];
        let before = bubbles[0].position(settings.center).distance(bubbles[1].position(settings.center));

        assert_eq!(resolve_collisions(&mut bubbles, &settings), 1);
        let after = bubbles[0].position(settings.center).distance(bubbles[1].position(settings.center));
        assert!(after > before);
        // Damped: never overshoots the contact distance
        assert!(after <= 40.0 + 1e-3);
    }

    #[test]
    fn test_separated_pair_untouched() {
        let settings = EngineSettings::default();
        let mut bubbles = vec![placed("a", 100.0, 0.0), placed("b", 100.0, PI)];
        let snapshot = bubbles.clone();
        assert_eq!(resolve_collisions(&mut bubbles, &settings), 0);
        assert_eq!(bubbles, snapshot);
    }

    #[test]
    fn test_coincident_pair_untouched() {
        let settings = EngineSettings::default();
        let mut bubbles = vec![placed("a", 100.0, 1.0), placed("b", 100.0, 1.0)];
        let snapshot = bubbles.clone();
        assert_eq!(resolve_collisions(&mut bubbles, &settings), 0);
        assert_eq!(bubbles, snapshot);
        assert!(bubbles.iter().all(|b| b.orbit_radius.is_finite() && b.angle.is_finite()));
    }

    #[test]
    fn test_radius_respects_floor() {
        let settings = EngineSettings::default();
        // Radial overlap right at the floor: inner bubble would be pushed inward
        let mut bubbles = vec![placed("a", 40.0, 0.5), placed("b", 60.0, 0.5)];
        resolve_collisions(&mut bubbles, &settings);
        assert!(bubbles.iter().all(|b| b.orbit_radius >= settings.min_orbit_radius));
    }

    #[test]
    fn test_order_independent() {
        let settings = EngineSettings::default();
        let mut forward = vec![
            placed("a", 100.0, 0.0),
            placed("b", 100.0, 0.15),
            placed("c", 110.0, 0.3),
        ];
        let mut reversed: Vec<Bubble> = forward.iter().rev().cloned().collect();
        resolve_collisions(&mut forward, &settings);
        resolve_collisions(&mut reversed, &settings);
        for b in &forward {
            let other = reversed.iter().find(|o| o.id == b.id).unwrap();
            assert!((b.orbit_radius - other.orbit_radius).abs() < 1e-3);
            assert!((b.angle - other.angle).abs() < 1e-4);
        }
    }

    proptest! {
        #[test]
        fn prop_pair_separation_never_decreases(
            r1 in 40.0f32..300.0,
            r2 in 40.0f32..300.0,
            a1 in 0.0f32..6.28,
            a2 in 0.0f32..6.28,
        ) {
            let settings = EngineSettings::default();
            let mut bubbles = vec![placed("a", r1, a1), placed("b", r2, a2)];
            let p1 = polar_to_cartesian(r1, a1);
            let p2 = polar_to_cartesian(r2, a2);
            let before = p1.distance(p2);

            resolve_collisions(&mut bubbles, &settings);
            let after = bubbles[0].position(settings.center).distance(bubbles[1].position(settings.center));

            prop_assert!(after >= before - 1e-3);
            if before >= 40.0 {
                prop_assert!((after - before).abs() < 1e-3);
            }
            prop_assert!(bubbles.iter().all(|b| b.orbit_radius >= settings.min_orbit_radius));
        }

        #[test]
        fn prop_crowded_overlaps_never_close_in(
            placements in prop::collection::vec((40.0f32..90.0, 0.0f32..1.2), 3..=6),
        ) {
            let settings = EngineSettings::default();
            let mut bubbles: Vec<Bubble> = placements
                .iter()
                .enumerate()
                .map(|(k, &(r, a))| placed(&format!("b{k}"), r, a))
                .collect();
            let before: Vec<Vec2> = bubbles.iter().map(|b| b.position(settings.center)).collect();
            let sizes: Vec<f32> = bubbles.iter().map(|b| b.size(&settings)).collect();

            resolve_collisions(&mut bubbles, &settings);
            let after: Vec<Vec2> = bubbles.iter().map(|b| b.position(settings.center)).collect();

            for i in 0..bubbles.len() {
                for j in (i + 1)..bubbles.len() {
                    let was = before[i].distance(before[j]);
                    if was < (sizes[i] + sizes[j]) / 2.0 {
                        let now = after[i].distance(after[j]);
                        prop_assert!(now >= was - 1e-3, "pair ({i},{j}) {was} -> {now}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_crowded_cluster_keeps_overlapping_pairs_apart() {
        let settings = EngineSettings::default();
        let radii = [78.96, 70.09, 73.68, 42.96, 45.23];
        let angles = [0.126, 0.543, 1.108, 0.978, 0.856];
        let mut bubbles: Vec<Bubble> = radii
            .iter()
            .zip(angles)
            .enumerate()
            .map(|(k, (&r, a))| placed(&format!("b{k}"), r, a))
            .collect();
        let before: Vec<Vec2> = bubbles.iter().map(|b| b.position(settings.center)).collect();

        resolve_collisions(&mut bubbles, &settings);

        for i in 0..bubbles.len() {
            for j in (i + 1)..bubbles.len() {
                let was = before[i].distance(before[j]);
                if was < 40.0 {
                    let now = bubbles[i].position(settings.center).distance(bubbles[j].position(settings.center));
                    assert!(now >= was - 1e-3, "pair ({i},{j}) {was} -> {now}");
                }
            }
        }
        assert!(bubbles.iter().all(|b| b.orbit_radius >= settings.min_orbit_radius));
    }
}
