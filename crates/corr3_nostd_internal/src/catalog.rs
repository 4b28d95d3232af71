//! Implements the in-memory triangle catalog.
//!
//! A [`Catalog`] is an ordered collection of [`RadiusBin`]s. The position of
//! a bin within the catalog is the bin index used by every statepack and
//! report. Each bin holds [`TriangleSet`]s: a primary offset together with
//! every secondary offset that closes a valid triangle for that bin.
//!
//! Everything here is immutable once constructed, so a catalog can be shared
//! by reference between any number of worker threads.

use crate::offset::Offset;
use alloc::vec::Vec;

/// The triangles of a single radius bin that share a primary offset
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleSet {
    primary: Offset,
    secondaries: Vec<Offset>,
}

impl TriangleSet {
    pub fn new(primary: Offset, secondaries: Vec<Offset>) -> Self {
        TriangleSet {
            primary,
            secondaries,
        }
    }

    pub fn primary(&self) -> &Offset {
        &self.primary
    }

    pub fn secondaries(&self) -> &[Offset] {
        &self.secondaries
    }

    /// the number of triangles in the set
    pub fn len(&self) -> usize {
        self.secondaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secondaries.is_empty()
    }
}

/// The mean edge lengths of every triangle in a bin, in physical units.
///
/// - `r1`: origin to primary vertex
/// - `r2`: origin to secondary vertex
/// - `r3`: primary vertex to secondary vertex
///
/// A bin without triangles has NaN means.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeanRadii {
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RadiusBin {
    rmin: f32,
    rmax: f32,
    mean_radii: MeanRadii,
    sets: Vec<TriangleSet>,
}

impl RadiusBin {
    /// `mean_radii` must describe `sets`. The public crate computes them
    /// while loading (computing them requires `sqrt`).
    pub fn new(rmin: f32, rmax: f32, mean_radii: MeanRadii, sets: Vec<TriangleSet>) -> Self {
        RadiusBin {
            rmin,
            rmax,
            mean_radii,
            sets,
        }
    }

    /// lower edge of the requested radius range
    pub fn rmin(&self) -> f32 {
        self.rmin
    }

    /// upper edge of the requested radius range
    pub fn rmax(&self) -> f32 {
        self.rmax
    }

    pub fn mean_radii(&self) -> &MeanRadii {
        &self.mean_radii
    }

    pub fn sets(&self) -> &[TriangleSet] {
        &self.sets
    }

    /// total number of triangles across every set
    pub fn n_triangles(&self) -> usize {
        self.sets.iter().map(TriangleSet::len).sum()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    bins: Vec<RadiusBin>,
}

impl Catalog {
    pub fn new(bins: Vec<RadiusBin>) -> Self {
        Catalog { bins }
    }

    pub fn bins(&self) -> &[RadiusBin] {
        &self.bins
    }

    pub fn bin(&self, index: usize) -> Option<&RadiusBin> {
        self.bins.get(index)
    }

    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// number of triangles anchored at each lattice site (summed over bins)
    pub fn n_triangles(&self) -> usize {
        self.bins.iter().map(RadiusBin::n_triangles).sum()
    }
}
