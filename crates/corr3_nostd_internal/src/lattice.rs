use crate::offset::Offset;

/// Check if a lattice resolution is valid
fn check_resolution(nres: usize) -> Result<(), &'static str> {
    if nres == 0 {
        Err("the lattice resolution must not be 0")
    } else if nres > (i32::MAX as usize) {
        // catalog offsets are i32, so coordinates must fit in that range too
        Err("the lattice resolution can't exceed i32::MAX")
    } else if nres.checked_pow(3).is_none() {
        Err("the number of lattice sites (nres^3) overflows usize")
    } else {
        Ok(())
    }
}

/// Lattice specifies how a periodic cube of `nres^3` sites is laid out in a
/// flat array. Axis 0 (`x`) is the slowest axis and axis 2 (`z`) is the
/// fastest, so the site `(x, y, z)` lives at `(x*nres^2) + (y*nres) + z`.
///
/// Every coordinate is interpreted modulo `nres` (periodic boundaries).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lattice {
    nres: usize,
}

impl Lattice {
    /// Create a lattice with `nres` sites along each axis
    pub fn new(nres: usize) -> Result<Lattice, &'static str> {
        check_resolution(nres)?;
        Ok(Lattice { nres })
    }

    /// the number of sites along each axis
    pub fn resolution(&self) -> usize {
        self.nres
    }

    /// the number of sites in a single x-plane (`nres^2`)
    pub fn plane_len(&self) -> usize {
        self.nres * self.nres
    }

    /// returns the number of elements that a slice must have to be described
    /// by self
    pub fn n_points(&self) -> usize {
        self.nres * self.nres * self.nres
    }

    /// map a 3D index to 1D
    #[inline]
    pub fn map_idx(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.nres + y) * self.nres + z
    }

    /// map a 1D index back to `[x, y, z]`
    #[inline]
    pub fn reverse_map_idx(&self, idx: usize) -> [usize; 3] {
        let plane_len = self.plane_len();
        let x = idx / plane_len;
        let y = (idx % plane_len) / self.nres;
        let z = idx % self.nres;
        [x, y, z]
    }

    /// apply the periodic boundary to a (possibly negative) coordinate
    ///
    /// This is a true modulo: the result always lies in `[0, nres)`.
    #[inline]
    pub fn wrap(&self, coord: i64) -> usize {
        coord.rem_euclid(self.nres as i64) as usize
    }

    /// the 1D index of the site reached by displacing `site` by `offset`
    #[inline]
    pub fn shifted_idx(&self, site: &[usize; 3], offset: &Offset) -> usize {
        let d = offset.value();
        let x = self.wrap(site[0] as i64 + d[0] as i64);
        let y = self.wrap(site[1] as i64 + d[1] as i64);
        let z = self.wrap(site[2] as i64 + d[2] as i64);
        self.map_idx(x, y, z)
    }
}
