//! Image-plane → ground-plane mapping.
//!
//! The camera looks at a flat road patch, so a single 3×3 projective transform
//! relates pixels to metric ground coordinates. It is computed once at startup
//! from four correspondences (an image quadrilateral and the rectangle it
//! covers on the road) and then applied per detection.
use crate::error::{Error, Result};
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-9;

/// Four image ↔ ground correspondences, in matching order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Image-plane corners in pixels.
    pub image: [[f64; 2]; 4],
    /// Ground-plane corners in metres.
    pub ground: [[f64; 2]; 4],
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            image: [[200.0, 540.0], [860.0, 540.0], [620.0, 200.0], [380.0, 200.0]],
            ground: [[0.0, 0.0], [15.0, 0.0], [15.0, 100.0], [0.0, 100.0]],
        }
    }
}

/// Fixed projective transform from image pixels to ground metres.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundMapper {
    hmtx: Matrix3<f64>,
}

impl GroundMapper {
    pub fn from_calibration(calib: &Calibration) -> Result<Self> {
        Self::from_correspondences(&calib.image, &calib.ground)
    }

    /// Solve the transform taking each `image[i]` onto `ground[i]`.
    pub fn from_correspondences(image: &[[f64; 2]; 4], ground: &[[f64; 2]; 4]) -> Result<Self> {
        check_quad(image, "image")?;
        check_quad(ground, "ground")?;
        let hmtx = perspective_from_quads(image, ground)
            .ok_or_else(|| Error::config("calibration correspondences are degenerate"))?;
        Ok(Self { hmtx })
    }

    pub fn from_matrix(hmtx: Matrix3<f64>) -> Self {
        Self { hmtx }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.hmtx
    }

    /// Map one pixel onto the ground. Points on or beyond the horizon line
    /// have no finite ground position and yield `None`.
    pub fn to_ground(&self, point: [f64; 2]) -> Option<[f64; 2]> {
        project(&self.hmtx, point)
    }
}

/// Direct linear solve of the 8-parameter transform (h33 fixed to 1).
pub fn perspective_from_quads(src: &[[f64; 2]; 4], dst: &[[f64; 2]; 4]) -> Option<Matrix3<f64>> {
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for i in 0..4 {
        let [x, y] = src[i];
        let [u, v] = dst[i];
        let r = 2 * i;
        a[(r, 0)] = x;
        a[(r, 1)] = y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -x * u;
        a[(r, 7)] = -y * u;
        b[r] = u;
        a[(r + 1, 3)] = x;
        a[(r + 1, 4)] = y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -x * v;
        a[(r + 1, 7)] = -y * v;
        b[r + 1] = v;
    }
    let h = a.lu().solve(&b)?;
    if h.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let hmtx = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
    if hmtx.determinant().abs() <= EPS {
        return None;
    }
    Some(hmtx)
}

pub fn apply_homography_points(h: &Matrix3<f64>, pts: &[[f64; 2]]) -> Option<Vec<[f64; 2]>> {
    pts.iter().map(|&p| project(h, p)).collect()
}

fn project(h: &Matrix3<f64>, p: [f64; 2]) -> Option<[f64; 2]> {
    let v = h * Vector3::new(p[0], p[1], 1.0);
    let w = v[2];
    if !w.is_finite() || w.abs() <= EPS || !v[0].is_finite() || !v[1].is_finite() {
        return None;
    }
    Some([v[0] / w, v[1] / w])
}

fn check_quad(pts: &[[f64; 2]; 4], label: &str) -> Result<()> {
    if pts.iter().flatten().any(|v| !v.is_finite()) {
        return Err(Error::config(format!(
            "{label} calibration points must be finite"
        )));
    }
    let scale = pts
        .iter()
        .flatten()
        .fold(1.0f64, |acc, v| acc.max(v.abs()));
    // Any three collinear corners make the four-point solve ill-posed.
    for skip in 0..4 {
        let tri: Vec<[f64; 2]> = (0..4).filter(|&i| i != skip).map(|i| pts[i]).collect();
        let area = (tri[1][0] - tri[0][0]) * (tri[2][1] - tri[0][1])
            - (tri[1][1] - tri[0][1]) * (tri[2][0] - tri[0][0]);
        if area.abs() <= 1e-9 * scale * scale {
            return Err(Error::config(format!(
                "{label} calibration points contain three collinear corners"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn default_calibration_maps_corners() {
        let calib = Calibration::default();
        let mapper = GroundMapper::from_calibration(&calib).expect("valid calibration");
        for (img, gnd) in calib.image.iter().zip(calib.ground.iter()) {
            let out = mapper.to_ground(*img).expect("finite");
            assert!(
                approx_eq(out[0], gnd[0]) && approx_eq(out[1], gnd[1]),
                "{img:?} -> {out:?}, expected {gnd:?}"
            );
        }
    }

    #[test]
    fn far_pixels_map_further_down_the_road() {
        let mapper = GroundMapper::from_calibration(&Calibration::default()).unwrap();
        let near = mapper.to_ground([530.0, 500.0]).unwrap();
        let far = mapper.to_ground([530.0, 250.0]).unwrap();
        assert!(far[1] > near[1], "near={near:?} far={far:?}");
    }

    #[test]
    fn affine_square_is_recovered_exactly() {
        let src = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        let dst = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];
        let mapper = GroundMapper::from_correspondences(&src, &dst).unwrap();
        let mid = mapper.to_ground([5.0, 5.0]).unwrap();
        assert!(approx_eq(mid[0], 1.0) && approx_eq(mid[1], 1.0));
        let pts = apply_homography_points(mapper.matrix(), &[[10.0, 5.0]]).unwrap();
        assert!(approx_eq(pts[0][0], 2.0) && approx_eq(pts[0][1], 1.0));
    }

    #[test]
    fn collinear_corners_are_rejected() {
        let src = [[0.0, 0.0], [5.0, 0.0], [10.0, 0.0], [0.0, 10.0]];
        let dst = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let err = GroundMapper::from_correspondences(&src, &dst).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "{err}");
    }

    #[test]
    fn non_finite_corners_are_rejected() {
        let mut calib = Calibration::default();
        calib.ground[2][0] = f64::NAN;
        assert!(GroundMapper::from_calibration(&calib).is_err());
    }

    #[test]
    fn horizon_points_have_no_ground_position() {
        let h = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, -5.0);
        let mapper = GroundMapper::from_matrix(h);
        assert!(mapper.to_ground([3.0, 5.0]).is_none());
        assert!(mapper.to_ground([3.0, 6.0]).is_some());
    }
}
