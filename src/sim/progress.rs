//! Race progress: where each racer is along the track, laps and rank
//!
//! Per-frame tracking searches a small window around the racer's previous
//! `t`. That is only valid while per-frame displacement stays well inside the
//! window (about ±0.03 of a lap); any teleport (respawn, restart) must re-seed
//! `t` with the full scan in `nearest_global`.

use glam::Vec3;

use super::state::Racer;
use super::track::TrackSpline;
use crate::consts::{LAP_WRAP_HIGH, LAP_WRAP_LOW, PROGRESS_WINDOW_SAMPLES, PROGRESS_WINDOW_STEP};
use crate::{wrap_unit, yaw_from_direction};

#[inline]
fn horizontal_distance_sq(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

/// Closest track parameter to `pos` within the local window around `prev_t`
pub fn nearest_local(track: &TrackSpline, pos: Vec3, prev_t: f32) -> f32 {
    let half = (PROGRESS_WINDOW_SAMPLES / 2) as f32;
    let mut best_t = wrap_unit(prev_t);
    let mut best_d = f32::INFINITY;
    for i in 0..PROGRESS_WINDOW_SAMPLES {
        let t = wrap_unit(prev_t + (i as f32 - half) * PROGRESS_WINDOW_STEP);
        let d = horizontal_distance_sq(pos, track.point_at(t));
        if d < best_d {
            best_d = d;
            best_t = t;
        }
    }
    best_t
}

/// Closest coarse-table parameter to `pos` over the whole track
pub fn nearest_global(track: &TrackSpline, pos: Vec3) -> f32 {
    let samples = track.coarse_samples();
    let (best, _) = samples
        .iter()
        .enumerate()
        .map(|(i, p)| (i, horizontal_distance_sq(pos, *p)))
        .fold((0, f32::INFINITY), |acc, cur| if cur.1 < acc.1 { cur } else { acc });
    best as f32 / samples.len() as f32
}

/// Forward crossing of the start/finish line, with hysteresis so jitter
/// anywhere else on the course can never register a lap
#[inline]
pub fn crossed_start_line(prev_t: f32, new_t: f32) -> bool {
    prev_t > LAP_WRAP_HIGH && new_t < LAP_WRAP_LOW
}

/// Re-locate a racer along the track and count a lap on a forward wrap.
/// Returns true when a lap was completed this call.
pub fn advance(racer: &mut Racer, track: &TrackSpline) -> bool {
    let new_t = nearest_local(track, racer.pos, racer.t);
    let lapped = crossed_start_line(racer.t, new_t);
    if lapped {
        racer.lap += 1;
    }
    racer.t = new_t;
    lapped
}

/// Rank of `racer` among `others` (1 = leading). A finished racer is always
/// ahead of an unfinished one; otherwise (lap, t) decides.
pub fn rank_of<'a>(racer: &Racer, others: impl IntoIterator<Item = &'a Racer>) -> usize {
    1 + others
        .into_iter()
        .filter(|other| other.id != racer.id)
        .filter(|other| is_ahead(other, racer))
        .count()
}

/// Whether `a` is ahead of `b` in the race
pub fn is_ahead(a: &Racer, b: &Racer) -> bool {
    match (a.finished, b.finished) {
        (true, false) => true,
        (false, true) => false,
        _ => a.progress() > b.progress(),
    }
}

/// Respawn placement: nearest track point (full scan refined by the local
/// window), facing along the track
pub fn respawn_pose(track: &TrackSpline, pos: Vec3, height: f32) -> (f32, Vec3, f32) {
    let t = nearest_local(track, pos, nearest_global(track, pos));
    let mut spawn = track.point_at(t);
    spawn.y = height;
    let yaw = yaw_from_direction(track.tangent_at(t));
    (t, spawn, yaw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn track() -> TrackSpline {
        TrackSpline::default_circuit().unwrap()
    }

    #[test]
    fn test_local_search_follows_motion() {
        let track = track();
        let truth = 0.31;
        let found = nearest_local(&track, track.point_at(truth), 0.3);
        assert!((found - truth).abs() <= PROGRESS_WINDOW_STEP / 2.0 + 1e-5);
    }

    #[test]
    fn test_local_search_wraps_backwards() {
        let track = track();
        let found = nearest_local(&track, track.point_at(0.995), 0.001);
        assert!(found > 0.99, "found {found}");
    }

    #[test]
    fn test_global_search_finds_far_point() {
        let track = track();
        let pos = track.point_at(0.6) + Vec3::new(0.0, 40.0, 0.0);
        let t = nearest_global(&track, pos);
        assert!((t - 0.6).abs() < 0.006, "t = {t}");
    }

    #[test]
    fn test_crossed_start_line() {
        assert!(crossed_start_line(0.95, 0.02));
        assert!(!crossed_start_line(0.85, 0.02));
        assert!(!crossed_start_line(0.95, 0.15));
        assert!(!crossed_start_line(0.02, 0.95)); // driving backwards
        assert!(!crossed_start_line(0.49, 0.51));
    }

    #[test]
    fn test_rank_ordering() {
        let mut player = Racer::player(1, 100.0);
        let mut a = Racer::ai(2, 0, 0.4, 100.0);
        let mut b = Racer::ai(3, 1, 0.4, 100.0);
        player.lap = 2;
        player.t = 0.5;
        a.lap = 2;
        a.t = 0.6;
        b.lap = 1;
        b.t = 0.9;
        assert_eq!(rank_of(&player, [&a, &b]), 2);

        // A finished racer beats any progress
        b.finished = true;
        assert_eq!(rank_of(&player, [&a, &b]), 3);

        // Rank ignores the racer itself when it is in the list
        let all = [player.clone(), a.clone(), b.clone()];
        assert_eq!(rank_of(&player, all.iter()), 3);
    }

    #[test]
    fn test_respawn_pose() {
        let track = track();
        let crash = track.point_at(0.42) + Vec3::new(10.0, -20.0, 0.0);
        let (t, pos, yaw) = respawn_pose(&track, crash, 30.0);
        assert!((t - 0.42).abs() < 0.01);
        assert_eq!(pos.y, 30.0);
        let facing = crate::forward_from_yaw(yaw);
        assert!(facing.dot(track.tangent_at(t)) > 0.99);
    }

    fn sweep(track: &TrackSpline, racer: &mut Racer, steps: &[f32]) -> u32 {
        let mut laps = 0;
        let mut truth = racer.t;
        for &step in steps {
            truth = wrap_unit(truth + step);
            racer.pos = track.point_at(truth);
            if advance(racer, track) {
                laps += 1;
            }
        }
        laps
    }

    #[test]
    fn test_oscillation_mid_track_never_counts() {
        let track = track();
        let mut racer = Racer::player(1, 100.0);
        racer.t = 0.5;
        let steps: Vec<f32> = (0..2000)
            .map(|i| if i % 2 == 0 { 0.02 } else { -0.02 })
            .collect();
        assert_eq!(sweep(&track, &mut racer, &steps), 0);
        assert_eq!(racer.lap, 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_one_increment_per_loop(step in 0.0005f32..0.025, loops in 1u32..3) {
            let track = track();
            let mut racer = Racer::player(1, 100.0);
            // Stop a little past the line so the final crossing is settled
            let n = ((loops as f32 + 0.05) / step).ceil() as usize;
            let steps = vec![step; n];
            let laps = sweep(&track, &mut racer, &steps);
            prop_assert_eq!(laps, loops);
            prop_assert_eq!(racer.lap, 1 + loops);
        }
    }
}
