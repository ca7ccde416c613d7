//! Region size/position handling.
//!
//! Litematica stores a region as the position of its first corner plus the
//! signed distance to the opposite corner, so any size component may be
//! negative. Decoded regions always use positive sizes and the minimum
//! corner as position.

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};

/// Size and position exactly as read from a region tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionGeometry {
    pub size: (i32, i32, i32),
    pub position: (i32, i32, i32),
}

/// Positive size and minimum-corner position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedGeometry {
    pub size: (i32, i32, i32),
    pub position: (i32, i32, i32),
}

/// Moves a first-corner coordinate to the minimum corner along one axis.
pub fn normalize_position(pos: i32, size: i32) -> i64 {
    if size < 0 {
        pos as i64 + size as i64 + 1
    } else {
        pos as i64
    }
}

impl RegionGeometry {
    pub fn new(size: (i32, i32, i32), position: (i32, i32, i32)) -> Self {
        RegionGeometry { size, position }
    }

    /// Normalizes the pair. Fails for zero-volume regions and for regions
    /// whose normalized corners no longer fit in `i32`.
    pub fn normalize(&self) -> Result<NormalizedGeometry> {
        let (sx, sy, sz) = self.size;
        if sx == 0 || sy == 0 || sz == 0 {
            return Err(DecodeError::EmptyRegion { size: self.size });
        }

        let overflow = || DecodeError::CoordinateOverflow {
            position: self.position,
            size: self.size,
        };
        let axis = |pos: i32, size: i32| -> Result<(i32, i32)> {
            let size_abs = i32::try_from(size.unsigned_abs()).map_err(|_| overflow())?;
            let min = i32::try_from(normalize_position(pos, size)).map_err(|_| overflow())?;
            // the far corner has to be addressable as well
            i32::try_from(min as i64 + size_abs as i64 - 1).map_err(|_| overflow())?;
            Ok((size_abs, min))
        };

        let (wx, px) = axis(self.position.0, sx)?;
        let (wy, py) = axis(self.position.1, sy)?;
        let (wz, pz) = axis(self.position.2, sz)?;

        Ok(NormalizedGeometry {
            size: (wx, wy, wz),
            position: (px, py, pz),
        })
    }
}

impl NormalizedGeometry {
    pub fn volume(&self) -> u64 {
        self.size.0 as u64 * self.size.1 as u64 * self.size.2 as u64
    }

    /// Inclusive maximum corner.
    pub fn max_corner(&self) -> (i32, i32, i32) {
        (
            self.position.0 + self.size.0 - 1,
            self.position.1 + self.size.1 - 1,
            self.position.2 + self.size.2 - 1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_size_unchanged() {
        let geometry = RegionGeometry::new((5, 5, 5), (10, 10, 10))
            .normalize()
            .unwrap();
        assert_eq!(geometry.size, (5, 5, 5));
        assert_eq!(geometry.position, (10, 10, 10));
        assert_eq!(geometry.volume(), 125);
        assert_eq!(geometry.max_corner(), (14, 14, 14));
    }

    #[test]
    fn test_negative_size_moves_to_min_corner() {
        let geometry = RegionGeometry::new((-5, 3, 2), (10, 10, 10))
            .normalize()
            .unwrap();
        assert_eq!(geometry.size, (5, 3, 2));
        assert_eq!(geometry.position, (6, 10, 10));
        assert_eq!(geometry.max_corner(), (10, 12, 11));
    }

    #[test]
    fn test_all_axes_negative() {
        let geometry = RegionGeometry::new((-1, -2, -3), (0, 0, 0))
            .normalize()
            .unwrap();
        assert_eq!(geometry.size, (1, 2, 3));
        assert_eq!(geometry.position, (0, -1, -2));
    }

    #[test]
    fn test_normalize_is_pure() {
        let raw = RegionGeometry::new((-4, 7, -2), (-3, 64, 9));
        assert_eq!(raw.normalize().unwrap(), raw.normalize().unwrap());
        assert_eq!(normalize_position(10, -5), 6);
        assert_eq!(normalize_position(10, 5), 10);
    }

    #[test]
    fn test_zero_volume_rejected() {
        assert!(matches!(
            RegionGeometry::new((0, 3, 3), (0, 0, 0)).normalize(),
            Err(DecodeError::EmptyRegion { size: (0, 3, 3) })
        ));
    }

    #[test]
    fn test_overflow_rejected() {
        assert!(matches!(
            RegionGeometry::new((i32::MIN, 1, 1), (0, 0, 0)).normalize(),
            Err(DecodeError::CoordinateOverflow { .. })
        ));
        assert!(matches!(
            RegionGeometry::new((2, 1, 1), (i32::MAX, 0, 0)).normalize(),
            Err(DecodeError::CoordinateOverflow { .. })
        ));
    }
}
