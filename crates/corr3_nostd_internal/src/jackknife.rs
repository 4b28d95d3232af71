//! Assignment of lattice sites to jackknife resampling groups
//!
//! The flattened index range `[0, n_points)` is cut into `n_groups`
//! contiguous runs of `floor(n_points / n_groups)` sites. Because the
//! flattened order is raster order (z fastest), the groups are slabs of the
//! flattened array rather than geometric sub-volumes (e.g. 8 groups do
//! **NOT** correspond to octants).
//!
//! When `n_points` isn't divisible by `n_groups`, the leftover sites at the
//! end of the range belong to the last group.

use core::cmp;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JackknifePartition {
    n_groups: usize,
    group_len: usize,
}

impl JackknifePartition {
    pub fn new(n_points: usize, n_groups: usize) -> Result<JackknifePartition, &'static str> {
        if n_groups == 0 {
            Err("the number of jackknife groups must be positive")
        } else if n_groups > n_points {
            Err("there can't be more jackknife groups than lattice sites")
        } else {
            Ok(JackknifePartition {
                n_groups,
                group_len: n_points / n_groups,
            })
        }
    }

    pub fn n_groups(&self) -> usize {
        self.n_groups
    }

    /// the nominal number of sites per group
    pub fn group_len(&self) -> usize {
        self.group_len
    }

    /// the group that the site with flattened index `idx` belongs to
    #[inline]
    pub fn group_of(&self, idx: usize) -> usize {
        cmp::min(idx / self.group_len, self.n_groups - 1)
    }
}
