use nalgebra::{Point3, Rotation3, Translation3, Vector3};
use std::fmt;
use std::str::FromStr;

use crate::core::models::error::ModelError;

/// One of the three principal axes a structure can be rotated about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn unit(&self) -> nalgebra::Unit<Vector3<f64>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

impl FromStr for Axis {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            _ => Err(ModelError::invalid_value(
                "axis",
                s,
                "rotation axis must be 'x', 'y' or 'z'",
            )),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Axis::X => "x",
                Axis::Y => "y",
                Axis::Z => "z",
            }
        )
    }
}

/// Translates every point by the same offset, returning the new points in input order.
pub fn translate_points(points: &[Point3<f64>], dx: f64, dy: f64, dz: f64) -> Vec<Point3<f64>> {
    let translation = Translation3::new(dx, dy, dz);
    points.iter().map(|p| translation.transform_point(p)).collect()
}

/// Rotates every point about a principal axis through the origin.
///
/// The rotation is right-handed and `angle_degrees` is in degrees. Points are returned
/// in input order.
pub fn rotate_points(points: &[Point3<f64>], axis: Axis, angle_degrees: f64) -> Vec<Point3<f64>> {
    let rotation = Rotation3::from_axis_angle(&axis.unit(), angle_degrees.to_radians());
    points.iter().map(|p| rotation.transform_point(p)).collect()
}
