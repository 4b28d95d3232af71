use crate::stats::StatTuple;
use alloc::vec;
use alloc::vec::Vec;
use ndarray::Array2;

/// Represents the accumulator states that a reduction fills.
///
/// For every radius bin there is:
/// - the total over every triangle, and
/// - for every jackknife group, the contribution attributed to that group.
///   A triangle is attributed to each *distinct* group among its vertices.
///
/// The group contributions are stored with the group on axis 0 and the bin
/// on axis 1.
///
/// # Note
/// There is some benefit to wrapping the ndarray type since it helps contain
/// all references to the ndarray package to a single file.
#[derive(Clone, Debug, PartialEq)]
pub struct StatePack {
    totals: Vec<StatTuple>,
    group_contribs: Array2<StatTuple>,
}

impl StatePack {
    pub fn new(n_bins: usize, n_groups: usize) -> Self {
        StatePack {
            totals: vec![StatTuple::ZERO; n_bins],
            group_contribs: Array2::from_elem((n_groups, n_bins), StatTuple::ZERO),
        }
    }

    pub fn n_bins(&self) -> usize {
        self.totals.len()
    }

    pub fn n_groups(&self) -> usize {
        self.group_contribs.nrows()
    }

    /// returns `[n_groups, n_bins]`
    pub fn shape(&self) -> [usize; 2] {
        [self.n_groups(), self.n_bins()]
    }

    pub fn total(&self, bin: usize) -> &StatTuple {
        &self.totals[bin]
    }

    pub fn total_mut(&mut self, bin: usize) -> &mut StatTuple {
        &mut self.totals[bin]
    }

    pub fn group_contrib(&self, group: usize, bin: usize) -> &StatTuple {
        &self.group_contribs[[group, bin]]
    }

    pub fn group_contrib_mut(&mut self, group: usize, bin: usize) -> &mut StatTuple {
        &mut self.group_contribs[[group, bin]]
    }

    /// zero out every accumulator state
    pub fn reset(&mut self) {
        self.totals.fill(StatTuple::ZERO);
        self.group_contribs.fill(StatTuple::ZERO);
    }

    /// add the states tracked by `other` to `self`
    pub fn merge(&mut self, other: &StatePack) {
        assert_eq!(self.shape(), other.shape());
        for (total, other_total) in self.totals.iter_mut().zip(other.totals.iter()) {
            *total += *other_total;
        }
        self.group_contribs
            .zip_mut_with(&other.group_contribs, |contrib, other_contrib| {
                *contrib += *other_contrib
            });
    }

    /// convert every group contribution into the leave-one-group-out state
    /// (the total minus that group's contribution)
    pub fn into_jackknife_result(self) -> JackknifeResult {
        let StatePack {
            totals,
            mut group_contribs,
        } = self;
        for ((_, bin), contrib) in group_contribs.indexed_iter_mut() {
            *contrib = totals[bin] - *contrib;
        }
        JackknifeResult {
            totals,
            leave_one_out: group_contribs,
        }
    }
}

/// The output of a correlation run: per-bin totals and per-bin, per-group
/// leave-one-group-out states.
#[derive(Clone, Debug, PartialEq)]
pub struct JackknifeResult {
    totals: Vec<StatTuple>,
    // shape: [n_groups, n_bins]
    leave_one_out: Array2<StatTuple>,
}

impl JackknifeResult {
    /// a result where every state is zero (used for degenerate inputs)
    pub fn zeroed(n_bins: usize, n_groups: usize) -> Self {
        StatePack::new(n_bins, n_groups).into_jackknife_result()
    }

    pub fn n_bins(&self) -> usize {
        self.totals.len()
    }

    pub fn n_groups(&self) -> usize {
        self.leave_one_out.nrows()
    }

    pub fn total(&self, bin: usize) -> &StatTuple {
        &self.totals[bin]
    }

    pub fn totals(&self) -> &[StatTuple] {
        &self.totals
    }

    pub fn leave_one_out(&self, bin: usize, group: usize) -> &StatTuple {
        &self.leave_one_out[[group, bin]]
    }

    /// iterate over the leave-one-group-out states of `bin`, in group order
    pub fn leave_one_out_for_bin(&self, bin: usize) -> impl Iterator<Item = &StatTuple> + '_ {
        self.leave_one_out.column(bin).into_iter()
    }

    /// true when every state (totals and leave-one-out) is zero
    pub fn is_zero(&self) -> bool {
        self.totals.iter().all(|s| *s == StatTuple::ZERO)
            && self.leave_one_out.iter().all(|s| *s == StatTuple::ZERO)
    }
}
