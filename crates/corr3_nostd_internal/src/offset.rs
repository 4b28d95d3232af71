//! Integer displacements between lattice sites

/// Describes the displacement between 2 lattice sites, in units of cells.
///
/// The components are ordered `[dx, dy, dz]`, which matches the slow-to-fast
/// axis order of the flattened fields (see [`crate::Lattice`]).
///
/// Triangle catalogs are expressed entirely in terms of these offsets: a
/// triangle anchored at site `P` has its other vertices at `P + primary` and
/// `P + secondary`.
///
/// # Note
/// The Euclidean magnitude requires `sqrt`, which isn't available in a
/// `no_std` crate. The public `corr3` crate provides it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Offset([i32; 3]);

impl Offset {
    pub const fn new(dx: i32, dy: i32, dz: i32) -> Self {
        Offset([dx, dy, dz])
    }

    /// returns the underlying value (the signed offset along each axis)
    #[inline]
    pub const fn value(&self) -> &[i32; 3] {
        &self.0
    }

    /// the squared length of the offset
    ///
    /// This is exact: we widen to `i64` before squaring.
    pub fn magnitude_squared(&self) -> i64 {
        let mut sum = 0_i64;
        for comp in self.0 {
            let comp = comp as i64;
            sum += comp * comp; // NOTE: .powi can't be used in no_std crates
        }
        sum
    }

    /// the squared distance between the sites that `self` and `other` point
    /// to (when both are measured from the same origin)
    pub fn distance_squared(&self, other: &Offset) -> i64 {
        let mut sum = 0_i64;
        for i in 0..3 {
            let diff = (self.0[i] as i64) - (other.0[i] as i64);
            sum += diff * diff;
        }
        sum
    }
}

impl From<[i32; 3]> for Offset {
    fn from(value: [i32; 3]) -> Self {
        Offset(value)
    }
}
