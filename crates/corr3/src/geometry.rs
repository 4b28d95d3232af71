//! Geometric machinery that requires the standard library (for `sqrt`)

use corr3_nostd_internal::{MeanRadii, Offset, RadiusBin, TriangleSet};

/// Computes the Euclidean length of a lattice offset.
pub trait EuclideanMagnitude {
    fn magnitude(&self) -> f64;

    /// Euclidean distance between the lattice sites reached by `self` and
    /// `other`
    fn distance(&self, other: &Self) -> f64;
}

impl EuclideanMagnitude for Offset {
    #[inline]
    fn magnitude(&self) -> f64 {
        (self.magnitude_squared() as f64).sqrt()
    }

    #[inline]
    fn distance(&self, other: &Offset) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }
}

/// Running sums used to compute the mean edge lengths of a bin's triangles.
///
/// Every edge is weighted by triangle, so the origin-primary edge of a set
/// counts once per secondary offset in that set.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct MeanRadiiSums {
    r1_sum: f64,
    r2_sum: f64,
    r3_sum: f64,
    count: u64,
}

impl MeanRadiiSums {
    pub(crate) fn add_triangle(&mut self, primary: &Offset, secondary: &Offset) {
        self.r1_sum += primary.magnitude();
        self.r2_sum += secondary.magnitude();
        self.r3_sum += primary.distance(secondary);
        self.count += 1;
    }

    /// convert the sums to means in physical units. Without any triangles,
    /// each mean is NaN.
    pub(crate) fn finalize(&self, cell_size: f64) -> MeanRadii {
        let count = self.count as f64;
        MeanRadii {
            r1: (self.r1_sum / count) * cell_size,
            r2: (self.r2_sum / count) * cell_size,
            r3: (self.r3_sum / count) * cell_size,
        }
    }
}

/// Assemble a [`RadiusBin`] from its triangle sets, computing the mean edge
/// lengths (in units of `cell_size`).
pub fn bin_from_sets(rmin: f32, rmax: f32, sets: Vec<TriangleSet>, cell_size: f64) -> RadiusBin {
    let mut sums = MeanRadiiSums::default();
    for set in sets.iter() {
        for secondary in set.secondaries() {
            sums.add_triangle(set.primary(), secondary);
        }
    }
    RadiusBin::new(rmin, rmax, sums.finalize(cell_size), sets)
}
