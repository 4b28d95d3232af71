//! The triangle walk: the innermost part of the correlation calculation.
//!
//! For a lattice site `P1` (the "anchor"), every triangle set of every bin is
//! applied: the primary offset locates `P2` and each secondary offset
//! locates a `P3`. Both offsets are measured from `P1` (the secondary offset
//! is **NOT** relative to `P2`).
//!
//! # Jackknife attribution
//! Every triangle is attributed to each distinct jackknife group among its
//! vertices, so that subtracting a group's contribution later removes every
//! triangle touching that group exactly once:
//! - group `g1` (of `P1`) always receives the anchor's full contribution
//!   for the bin
//! - group `g2` (of `P2`) receives the contribution of the triangle set,
//!   unless `g2 == g1`
//! - group `g3` (of `P3`) receives the single triangle, unless it matches
//!   either `g1` or `g2`

use crate::catalog::Catalog;
use crate::jackknife::JackknifePartition;
use crate::lattice::Lattice;
use crate::state::StatePack;
use crate::stats::StatTuple;

/// The fields sampled at the 3 vertices of each triangle.
///
/// Auto-correlations use the same field for all 3 vertices.
#[derive(Clone, Copy)]
pub struct FieldTriple<'a> {
    first: &'a [f32],
    second: &'a [f32],
    third: &'a [f32],
    lattice: Lattice,
}

impl<'a> FieldTriple<'a> {
    /// create a new instance for a cross-correlation
    pub fn new(
        first: &'a [f32],
        second: &'a [f32],
        third: &'a [f32],
        lattice: Lattice,
    ) -> Result<FieldTriple<'a>, &'static str> {
        let n_points = lattice.n_points();
        if first.len() != n_points {
            Err("the length of the first field is inconsistent with the lattice")
        } else if second.len() != n_points {
            Err("the length of the second field is inconsistent with the lattice")
        } else if third.len() != n_points {
            Err("the length of the third field is inconsistent with the lattice")
        } else {
            Ok(Self {
                first,
                second,
                third,
                lattice,
            })
        }
    }

    /// create a new instance for an auto-correlation
    pub fn auto(field: &'a [f32], lattice: Lattice) -> Result<FieldTriple<'a>, &'static str> {
        Self::new(field, field, field, lattice)
    }

    /// the field sampled at the anchor vertex
    pub fn first(&self) -> &'a [f32] {
        self.first
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }
}

/// Walks the triangles of a catalog around individual lattice sites
#[derive(Clone, Copy)]
pub struct TriangleWalk<'a> {
    fields: FieldTriple<'a>,
    catalog: &'a Catalog,
    partition: JackknifePartition,
}

impl<'a> TriangleWalk<'a> {
    pub fn new(
        fields: FieldTriple<'a>,
        catalog: &'a Catalog,
        partition: JackknifePartition,
    ) -> Self {
        TriangleWalk {
            fields,
            catalog,
            partition,
        }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.fields.lattice
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn partition(&self) -> &JackknifePartition {
        &self.partition
    }

    /// a zero-initialized statepack with the appropriate shape
    pub fn new_statepack(&self) -> StatePack {
        StatePack::new(self.catalog.n_bins(), self.partition.n_groups())
    }

    /// add the contribution of every triangle anchored at the site with
    /// flattened index `idx` to `statepack`
    pub fn accumulate_point(&self, statepack: &mut StatePack, idx: usize) {
        let lattice = &self.fields.lattice;
        let site = lattice.reverse_map_idx(idx);
        let data1 = self.fields.first[idx] as f64;
        let g1 = self.partition.group_of(idx);

        for (bin_index, bin) in self.catalog.bins().iter().enumerate() {
            // the anchor's contribution to this bin
            let mut ddd_from_anchor = 0.0;
            let mut ddr_from_anchor = 0.0;
            let mut n_from_anchor = 0_usize;

            for set in bin.sets() {
                let idx2 = lattice.shifted_idx(&site, set.primary());
                let data2 = self.fields.second[idx2] as f64;
                let g2 = self.partition.group_of(idx2);
                let mult12 = data1 * data2;

                let mut ddd_from_set = 0.0;
                for secondary in set.secondaries() {
                    let idx3 = lattice.shifted_idx(&site, secondary);
                    let data3 = self.fields.third[idx3] as f64;
                    let g3 = self.partition.group_of(idx3);
                    let mult123 = mult12 * data3;
                    ddd_from_set += mult123;

                    if g3 != g1 && g3 != g2 {
                        *statepack.group_contrib_mut(g3, bin_index) +=
                            StatTuple::new(mult123, mult12, data1, 1.0);
                    }
                }

                let n_set = set.len();
                if g2 != g1 {
                    let n = n_set as f64;
                    *statepack.group_contrib_mut(g2, bin_index) +=
                        StatTuple::new(ddd_from_set, n * mult12, n * data1, n);
                }

                ddd_from_anchor += ddd_from_set;
                ddr_from_anchor += (n_set as f64) * mult12;
                n_from_anchor += n_set;
            }

            let n = n_from_anchor as f64;
            let contrib = StatTuple::new(ddd_from_anchor, ddr_from_anchor, n * data1, n);
            *statepack.total_mut(bin_index) += contrib;
            *statepack.group_contrib_mut(g1, bin_index) += contrib;
        }
    }
}
