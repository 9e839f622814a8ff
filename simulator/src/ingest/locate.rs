use shotcore::model::EstimatedLocation;

use crate::ingest::store::MicReport;

/// Acoustic propagation speed, meters per second.
pub const SPEED_OF_SOUND_MPS: f64 = 343.0;

const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Flat-earth distance between two positions, meters. Adequate at the
/// scale of one sensor deployment.
pub fn meters_between(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat_diff = (lat2 - lat1) * METERS_PER_DEG_LAT;
    let lon_diff = (lon2 - lon1) * (METERS_PER_DEG_LAT * lat1.to_radians().cos());
    (lat_diff * lat_diff + lon_diff * lon_diff).sqrt()
}

/// Estimate the shot position and time from at least three mic reports by
/// minimizing the sum of squared arrival-time residuals over
/// (lat, lon, t0). Starts from the component-wise median and refines with
/// shrinking coordinate steps.
pub fn estimate_location(reports: &[MicReport]) -> Option<EstimatedLocation> {
    if reports.len() < 3 {
        return None;
    }

    // Normalize arrival times to seconds relative to the earliest report.
    let t_base = reports.iter().map(|report| report.timestamp).min()?;
    let points: Vec<(f64, f64, f64)> = reports
        .iter()
        .map(|report| {
            (
                report.lat,
                report.lon,
                (report.timestamp - t_base) as f64 / 1e6,
            )
        })
        .collect();

    let mut lat = median(points.iter().map(|p| p.0));
    let mut lon = median(points.iter().map(|p| p.1));
    let mut t0 = median(points.iter().map(|p| p.2));

    let mut step_deg = 0.000_5;
    let mut step_secs = 0.05;
    let mut best = residual(&points, lat, lon, t0);

    for _ in 0..200 {
        let mut improved = false;
        let candidates = [
            (lat + step_deg, lon, t0),
            (lat - step_deg, lon, t0),
            (lat, lon + step_deg, t0),
            (lat, lon - step_deg, t0),
            (lat, lon, t0 + step_secs),
            (lat, lon, t0 - step_secs),
        ];
        for (c_lat, c_lon, c_t0) in candidates {
            let error = residual(&points, c_lat, c_lon, c_t0);
            if error < best {
                best = error;
                lat = c_lat;
                lon = c_lon;
                t0 = c_t0;
                improved = true;
            }
        }
        if !improved {
            step_deg *= 0.5;
            step_secs *= 0.5;
            if step_deg < 1e-9 {
                break;
            }
        }
    }

    Some(EstimatedLocation {
        lat,
        lon,
        time: t_base + (t0 * 1e6) as i64,
    })
}

fn residual(points: &[(f64, f64, f64)], lat: f64, lon: f64, t0: f64) -> f64 {
    points
        .iter()
        .map(|&(p_lat, p_lon, arrival)| {
            let expected = t0 + meters_between(p_lat, p_lon, lat, lon) / SPEED_OF_SOUND_MPS;
            (arrival - expected) * (arrival - expected)
        })
        .sum()
}

fn median(values: impl Iterator<Item = f64>) -> f64 {
    let mut sorted: Vec<f64> = values.collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if sorted.is_empty() {
        return 0.0;
    }
    sorted[sorted.len() / 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meters_between_is_symmetric_enough() {
        let d1 = meters_between(42.28, -83.74, 42.281, -83.74);
        // One millidegree of latitude is roughly 111 m.
        assert!((d1 - 111.32).abs() < 1.0);
    }

    #[test]
    fn too_few_reports_yield_no_estimate() {
        let reports = vec![
            MicReport::new(1, 42.28, -83.74, 1_000_000),
            MicReport::new(2, 42.281, -83.74, 1_010_000),
        ];
        assert!(estimate_location(&reports).is_none());
    }

    #[test]
    fn estimate_recovers_a_synthetic_shot() {
        let shot_lat = 42.2805;
        let shot_lon = -83.7435;
        let shot_time: i64 = 1_700_000_000_000_000;

        let mics = [
            (1u32, 42.2800, -83.7430),
            (2, 42.2810, -83.7428),
            (3, 42.2803, -83.7442),
            (4, 42.2812, -83.7438),
        ];
        let reports: Vec<MicReport> = mics
            .iter()
            .map(|&(mic_id, lat, lon)| {
                let delay = meters_between(lat, lon, shot_lat, shot_lon) / SPEED_OF_SOUND_MPS;
                MicReport::new(mic_id, lat, lon, shot_time + (delay * 1e6) as i64)
            })
            .collect();

        let estimate = estimate_location(&reports).unwrap();
        let position_error = meters_between(estimate.lat, estimate.lon, shot_lat, shot_lon);
        assert!(position_error < 30.0, "position error {position_error} m");
        assert!((estimate.time - shot_time).abs() < 100_000);
    }
}
