use nalgebra::{Matrix3, Point3, Vector3};

fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}

/// Root-mean-square deviation of two coordinate sets without any overlay.
pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// Computes the rotation that best superimposes `mobile` onto `target` after
/// both are centered (Kabsch algorithm, proper rotations only).
pub fn optimal_rotation(target: &[Point3<f64>], mobile: &[Point3<f64>]) -> Option<Matrix3<f64>> {
    if target.len() != mobile.len() || target.is_empty() {
        return None;
    }
    let ct = centroid(target);
    let cm = centroid(mobile);

    let mut h: Matrix3<f64> = Matrix3::zeros();
    for (t, m) in target.iter().zip(mobile) {
        h += (m - cm) * (t - ct).transpose();
    }

    let svd = h.svd(true, true);
    let smallest = svd.singular_values.imin();
    let (u, v_t) = (svd.u?, svd.v_t?);
    let mut rotation = v_t.transpose() * u.transpose();
    if rotation.determinant() < 0.0 {
        // Flip the axis of the smallest singular value to stay a proper rotation.
        let mut v_t_adj = v_t;
        v_t_adj.row_mut(smallest).neg_mut();
        rotation = v_t_adj.transpose() * u.transpose();
    }
    Some(rotation)
}

/// Rigid-body transform that carries a mobile coordinate set onto a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Superposition {
    rotation: Matrix3<f64>,
    target_centroid: Point3<f64>,
    mobile_centroid: Point3<f64>,
}

impl Superposition {
    /// Fits the optimal overlay of `mobile` onto `target`.
    pub fn fit(target: &[Point3<f64>], mobile: &[Point3<f64>]) -> Option<Self> {
        let rotation = optimal_rotation(target, mobile)?;
        Some(Self {
            rotation,
            target_centroid: centroid(target),
            mobile_centroid: centroid(mobile),
        })
    }

    /// Moves a point of the mobile frame into the target frame.
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.target_centroid + self.rotation * (point - self.mobile_centroid)
    }
}

/// RMSD between `target` and `mobile` after the optimal rigid-body overlay.
pub fn superposed_rmsd(target: &[Point3<f64>], mobile: &[Point3<f64>]) -> Option<f64> {
    let overlay = Superposition::fit(target, mobile)?;
    let moved: Vec<Point3<f64>> = mobile.iter().map(|p| overlay.apply(p)).collect();
    calculate_rmsd(target, &moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Unit};

    const TOLERANCE: f64 = 1e-9;

    fn sample_points() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(1.9, 1.4, 0.0),
            Point3::new(3.3, 1.6, 0.7),
            Point3::new(-0.4, -0.9, 0.5),
        ]
    }

    #[test]
    fn calculate_rmsd_handles_length_mismatch_and_empty() {
        let points = sample_points();
        assert!(calculate_rmsd(&points, &points[..2]).is_none());
        assert!(calculate_rmsd(&[], &[]).is_none());
        assert_eq!(calculate_rmsd(&points, &points), Some(0.0));
    }

    #[test]
    fn calculate_rmsd_of_uniform_shift_equals_shift_length() {
        let points = sample_points();
        let shifted: Vec<_> = points
            .iter()
            .map(|p| p + Vector3::new(0.0, 2.0, 0.0))
            .collect();
        let rmsd = calculate_rmsd(&points, &shifted).unwrap();
        assert!((rmsd - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn superposed_rmsd_of_rigidly_moved_copy_is_zero() {
        let points = sample_points();
        let rotation = Rotation3::from_axis_angle(
            &Unit::new_normalize(Vector3::new(0.3, -1.0, 0.6)),
            1.1,
        );
        let moved: Vec<_> = points
            .iter()
            .map(|p| rotation * p + Vector3::new(4.0, -2.0, 7.5))
            .collect();

        let rmsd = superposed_rmsd(&points, &moved).unwrap();
        assert!(rmsd < 1e-6, "rmsd was {}", rmsd);
        assert!(calculate_rmsd(&points, &moved).unwrap() > 1.0);
    }

    #[test]
    fn superposed_rmsd_does_not_use_reflections() {
        let points = sample_points();
        let mirrored: Vec<_> = points.iter().map(|p| Point3::new(p.x, p.y, -p.z)).collect();
        let rmsd = superposed_rmsd(&points, &mirrored).unwrap();
        assert!(rmsd > 1e-3);
    }

    #[test]
    fn superposed_rmsd_is_never_larger_than_raw_rmsd() {
        let points = sample_points();
        let distorted: Vec<_> = points
            .iter()
            .enumerate()
            .map(|(i, p)| p + Vector3::new(0.1 * i as f64, 0.0, -0.05))
            .collect();
        let raw = calculate_rmsd(&points, &distorted).unwrap();
        let fitted = superposed_rmsd(&points, &distorted).unwrap();
        assert!(fitted <= raw + TOLERANCE);
    }

    #[test]
    fn fitted_overlay_maps_points_onto_target() {
        let points = sample_points();
        let rotation = Rotation3::from_axis_angle(&Vector3::x_axis(), -0.7);
        let moved: Vec<_> = points
            .iter()
            .map(|p| rotation * p + Vector3::new(-1.0, 3.0, 0.5))
            .collect();
        let overlay = Superposition::fit(&points, &moved).unwrap();
        for (target, mobile) in points.iter().zip(&moved) {
            assert!((overlay.apply(mobile) - target).norm() < 1e-6);
        }
    }

    #[test]
    fn optimal_rotation_rejects_mismatched_inputs() {
        let points = sample_points();
        assert!(optimal_rotation(&points, &points[1..]).is_none());
    }
}
