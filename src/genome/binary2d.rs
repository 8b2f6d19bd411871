//! # BinaryString2D
//!
//! A two-dimensional bit string stored row-major: bit `(x, y)` lives at `x + width * y`.
//! Width and height carry independent resize bounds.
//!
//! Default strategies: random-bit initializer (random extent within the bounds), flip
//! mutator, bit comparator and the 2D one-point crossover, which picks one cut per axis and
//! assembles each child from four quadrants. Geometries that do not match are clipped,
//! never padded.

use std::sync::Arc;

use crate::error::{GeneticError, Result};
use crate::rng::RandomNumberGenerator;

use super::operators::{mutate_at_rate, sexual};
use super::{
    Chromosome, Comparator, Genome, Initializer, Mutator, Operators, SexualCrossover, SizeBounds,
};

/// One of the two axes of a 2D genome.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryString2D {
    bits: Vec<bool>,
    width: usize,
    height: usize,
    x_bounds: SizeBounds,
    y_bounds: SizeBounds,
}

impl BinaryString2D {
    /// A fixed-size grid of cleared bits.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            bits: vec![false; width * height],
            width,
            height,
            x_bounds: SizeBounds::fixed(width),
            y_bounds: SizeBounds::fixed(height),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of bits.
    pub fn size(&self) -> usize {
        self.bits.len()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn bit(&self, x: usize, y: usize) -> bool {
        self.bits[x + self.width * y]
    }

    pub fn set_bit(&mut self, x: usize, y: usize, value: bool) {
        self.bits[x + self.width * y] = value;
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn bounds(&self, axis: Axis) -> SizeBounds {
        match axis {
            Axis::Width => self.x_bounds,
            Axis::Height => self.y_bounds,
        }
    }

    pub fn is_fixed(&self, axis: Axis) -> bool {
        self.bounds(axis).is_fixed()
    }

    /// Resizes to `width x height` under the per-axis resize rule and returns the new size.
    ///
    /// Existing bits keep their coordinates; new columns and rows are filled at random.
    pub fn resize(&mut self, width: usize, height: usize, rng: &mut RandomNumberGenerator) -> usize {
        if width == self.width && height == self.height {
            return self.size();
        }
        let w = self.x_bounds.settle(width);
        let h = self.y_bounds.settle(height);
        self.reshape(w, h, rng)
    }

    /// Resizes to a uniformly random extent within the bounds of each axis.
    pub fn resize_any(&mut self, rng: &mut RandomNumberGenerator) -> usize {
        let w = rng.random_int(self.x_bounds.min, self.x_bounds.max);
        let h = rng.random_int(self.y_bounds.min, self.y_bounds.max);
        if w == self.width && h == self.height {
            return self.size();
        }
        self.reshape(w, h, rng)
    }

    fn reshape(&mut self, w: usize, h: usize, rng: &mut RandomNumberGenerator) -> usize {
        let (nx, ny) = (self.width, self.height);
        let kept_rows = ny.min(h);
        let kept_cols = nx.min(w);

        let mut bits = vec![false; w * h];
        for j in 0..kept_rows {
            bits[j * w..j * w + kept_cols]
                .copy_from_slice(&self.bits[j * nx..j * nx + kept_cols]);
        }
        if w > nx {
            for j in (0..kept_rows).rev() {
                for bit in &mut bits[j * w + nx..j * w + w] {
                    *bit = rng.random_bit();
                }
            }
        }
        if h > ny {
            for bit in &mut bits[w * ny..] {
                *bit = rng.random_bit();
            }
        }

        self.bits = bits;
        self.width = w;
        self.height = h;
        self.size()
    }

    /// Sets new bounds for one axis and pulls that axis into them.
    ///
    /// # Errors
    ///
    /// Returns a configuration error and keeps the old bounds when `upper < lower`.
    pub fn set_resize_behaviour(
        &mut self,
        axis: Axis,
        lower: usize,
        upper: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<()> {
        let bounds = SizeBounds::validate(lower, upper)?;
        let (w, h) = (self.width, self.height);
        match axis {
            Axis::Width => {
                self.x_bounds = bounds;
                if w > upper {
                    self.resize(upper, h, rng);
                }
                if w < lower {
                    self.resize(lower, h, rng);
                }
            }
            Axis::Height => {
                self.y_bounds = bounds;
                if h > upper {
                    self.resize(w, upper, rng);
                }
                if h < lower {
                    self.resize(w, lower, rng);
                }
            }
        }
        Ok(())
    }

    /// Copies the `w x h` block of `orig` at `(x, y)` to `(r, s)`, clipped to both grids.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_block(
        &mut self,
        orig: &Self,
        r: usize,
        s: usize,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
    ) {
        if w == 0 || x >= orig.width || r >= self.width || h == 0 || y >= orig.height || s >= self.height
        {
            return;
        }
        let w = w.min(orig.width - x).min(self.width - r);
        let h = h.min(orig.height - y).min(self.height - s);
        for j in 0..h {
            let dest = (s + j) * self.width + r;
            let src = (y + j) * orig.width + x;
            self.bits[dest..dest + w].copy_from_slice(&orig.bits[src..src + w]);
        }
    }

    fn fill_block<F: FnMut() -> bool>(&mut self, x: usize, y: usize, w: usize, h: usize, mut value: F) {
        if x >= self.width || y >= self.height {
            return;
        }
        let w = w.min(self.width - x);
        let h = h.min(self.height - y);
        for j in 0..h {
            let row = (y + j) * self.width + x;
            for bit in &mut self.bits[row..row + w] {
                *bit = value();
            }
        }
    }

    /// Sets the `w x h` block at `(x, y)`, clipped to the grid.
    pub fn set_block(&mut self, x: usize, y: usize, w: usize, h: usize) {
        self.fill_block(x, y, w, h, || true);
    }

    /// Clears the `w x h` block at `(x, y)`, clipped to the grid.
    pub fn unset_block(&mut self, x: usize, y: usize, w: usize, h: usize) {
        self.fill_block(x, y, w, h, || false);
    }

    /// Randomizes the `w x h` block at `(x, y)`, clipped to the grid.
    pub fn randomize_block(
        &mut self,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        rng: &mut RandomNumberGenerator,
    ) {
        self.fill_block(x, y, w, h, || rng.random_bit());
    }
}

impl Chromosome for BinaryString2D {
    fn clone_attributes(&self) -> Self {
        Self {
            bits: vec![false; self.bits.len()],
            width: self.width,
            height: self.height,
            x_bounds: self.x_bounds,
            y_bounds: self.y_bounds,
        }
    }

    fn default_operators() -> Operators<Self> {
        Operators {
            initializer: Some(uniform_initializer()),
            mutator: Some(flip_mutator()),
            comparator: Some(bit_comparator()),
            sexual: Some(one_point_crossover()),
            asexual: None,
        }
    }
}

/// Cut of one axis: where each parent is cut and the region every child receives.
#[derive(Debug, Clone, Copy)]
struct Cut {
    mom: usize,
    dad: usize,
    site: usize,
    len: usize,
}

impl Cut {
    fn swapped(self) -> Self {
        Self {
            mom: self.dad,
            dad: self.mom,
            ..self
        }
    }
}

fn extent(c: &BinaryString2D, axis: Axis) -> usize {
    match axis {
        Axis::Width => c.width,
        Axis::Height => c.height,
    }
}

fn axis_cut(
    axis: Axis,
    mom: &BinaryString2D,
    dad: &BinaryString2D,
    children: &[&BinaryString2D],
    rng: &mut RandomNumberGenerator,
) -> Result<Cut> {
    let fixed = children.iter().filter(|c| c.is_fixed(axis)).count();
    let (momlen, dadlen) = (extent(mom, axis), extent(dad, axis));
    if fixed == children.len() {
        if momlen != dadlen || children.iter().any(|c| extent(c, axis) != momlen) {
            return Err(GeneticError::IncompatibleParents(format!(
                "2D one-point crossover: {:?} must match across parents and children",
                axis
            )));
        }
        let site = rng.random_int(0, momlen);
        Ok(Cut {
            mom: site,
            dad: site,
            site,
            len: momlen - site,
        })
    } else if fixed > 0 {
        Err(GeneticError::IncompatibleParents(format!(
            "2D one-point crossover: children must share one {:?} resize behaviour",
            axis
        )))
    } else {
        let momsite = rng.random_int(0, momlen);
        let dadsite = rng.random_int(0, dadlen);
        Ok(Cut {
            mom: momsite,
            dad: dadsite,
            site: momsite.min(dadsite),
            len: (momlen - momsite).min(dadlen - dadsite),
        })
    }
}

/// Assembles `child` with `first` in the top-left and bottom-right quadrants and `second`
/// in the other two.
fn quadrants(
    child: &mut BinaryString2D,
    first: &BinaryString2D,
    second: &BinaryString2D,
    cx: Cut,
    cy: Cut,
) {
    child.copy_block(first, 0, 0, cx.mom - cx.site, cy.mom - cy.site, cx.site, cy.site);
    child.copy_block(second, cx.site, 0, cx.dad, cy.dad - cy.site, cx.len, cy.site);
    child.copy_block(second, 0, cy.site, cx.dad - cx.site, cy.dad, cx.site, cy.len);
    child.copy_block(first, cx.site, cy.site, cx.mom, cy.mom, cx.len, cy.len);
}

/// One-point crossover over both axes.
pub fn one_point(
    mom: &BinaryString2D,
    dad: &BinaryString2D,
    sis: Option<&mut BinaryString2D>,
    bro: Option<&mut BinaryString2D>,
    rng: &mut RandomNumberGenerator,
) -> Result<usize> {
    match (sis, bro) {
        (Some(sis), Some(bro)) => {
            let cx = axis_cut(Axis::Width, mom, dad, &[&*sis, &*bro], rng)?;
            let cy = axis_cut(Axis::Height, mom, dad, &[&*sis, &*bro], rng)?;
            sis.resize(cx.site + cx.len, cy.site + cy.len, rng);
            bro.resize(cx.site + cx.len, cy.site + cy.len, rng);
            quadrants(sis, mom, dad, cx, cy);
            quadrants(bro, dad, mom, cx.swapped(), cy.swapped());
            Ok(2)
        }
        (Some(sis), None) | (None, Some(sis)) => {
            let cx = axis_cut(Axis::Width, mom, dad, &[&*sis], rng)?;
            let cy = axis_cut(Axis::Height, mom, dad, &[&*sis], rng)?;
            sis.resize(cx.site + cx.len, cy.site + cy.len, rng);
            if rng.random_bit() {
                quadrants(sis, mom, dad, cx, cy);
            } else {
                quadrants(sis, dad, mom, cx.swapped(), cy.swapped());
            }
            Ok(1)
        }
        (None, None) => Ok(0),
    }
}

fn same_shape(a: &BinaryString2D, b: &BinaryString2D) -> bool {
    a.width == b.width && a.height == b.height
}

fn common_region(children: &[&BinaryString2D], mom: &BinaryString2D, dad: &BinaryString2D) -> (usize, usize) {
    let w = children.iter().map(|c| c.width).chain([mom.width, dad.width]).min().unwrap_or(0);
    let h = children.iter().map(|c| c.height).chain([mom.height, dad.height]).min().unwrap_or(0);
    (w, h)
}

/// Uniform crossover on grids. Matching shapes take every bit from a random parent;
/// otherwise only the region all participants share is written.
pub fn uniform(
    mom: &BinaryString2D,
    dad: &BinaryString2D,
    sis: Option<&mut BinaryString2D>,
    bro: Option<&mut BinaryString2D>,
    rng: &mut RandomNumberGenerator,
) -> Result<usize> {
    match (sis, bro) {
        (Some(sis), Some(bro)) => {
            if same_shape(sis, bro) && same_shape(mom, dad) && same_shape(sis, mom) {
                for i in (0..sis.bits.len()).rev() {
                    let take_mom = rng.random_bit();
                    sis.bits[i] = if take_mom { mom.bits[i] } else { dad.bits[i] };
                    bro.bits[i] = if take_mom { dad.bits[i] } else { mom.bits[i] };
                }
            } else {
                let (w, h) = common_region(&[&*sis, &*bro], mom, dad);
                for y in 0..h {
                    for x in 0..w {
                        let take_mom = rng.random_bit();
                        let (m, d) = (mom.bit(x, y), dad.bit(x, y));
                        sis.set_bit(x, y, if take_mom { m } else { d });
                        bro.set_bit(x, y, if take_mom { d } else { m });
                    }
                }
            }
            Ok(2)
        }
        (Some(sis), None) | (None, Some(sis)) => {
            let (w, h) = common_region(&[&*sis], mom, dad);
            for y in 0..h {
                for x in 0..w {
                    let v = if rng.random_bit() { mom.bit(x, y) } else { dad.bit(x, y) };
                    sis.set_bit(x, y, v);
                }
            }
            Ok(1)
        }
        (None, None) => Ok(0),
    }
}

/// Even/odd crossover on grids. Matching shapes alternate on the row-major index;
/// otherwise the shared region is filled as a checkerboard.
pub fn even_odd(
    mom: &BinaryString2D,
    dad: &BinaryString2D,
    sis: Option<&mut BinaryString2D>,
    bro: Option<&mut BinaryString2D>,
    _rng: &mut RandomNumberGenerator,
) -> Result<usize> {
    let fill = |child: &mut BinaryString2D, first: &BinaryString2D, second: &BinaryString2D| {
        if same_shape(child, first) && same_shape(first, second) {
            for i in 0..child.bits.len() {
                child.bits[i] = if i % 2 == 0 { first.bits[i] } else { second.bits[i] };
            }
        } else {
            let (w, h) = common_region(&[&*child], first, second);
            for y in 0..h {
                for x in 0..w {
                    let v = if (x + y) % 2 == 0 {
                        first.bit(x, y)
                    } else {
                        second.bit(x, y)
                    };
                    child.set_bit(x, y, v);
                }
            }
        }
    };
    match (sis, bro) {
        (Some(sis), Some(bro)) => {
            fill(sis, mom, dad);
            fill(bro, dad, mom);
            Ok(2)
        }
        (Some(sis), None) | (None, Some(sis)) => {
            fill(sis, mom, dad);
            Ok(1)
        }
        (None, None) => Ok(0),
    }
}

pub fn one_point_crossover() -> SexualCrossover<BinaryString2D> {
    sexual(one_point)
}

pub fn uniform_crossover() -> SexualCrossover<BinaryString2D> {
    sexual(uniform)
}

pub fn even_odd_crossover() -> SexualCrossover<BinaryString2D> {
    sexual(even_odd)
}

/// Picks a random extent within the bounds and fills every bit at random.
pub fn uniform_initializer() -> Initializer<BinaryString2D> {
    Arc::new(|genome: &mut Genome<BinaryString2D>, rng: &mut RandomNumberGenerator| {
        let grid = genome.chromosome_mut();
        grid.resize_any(rng);
        for bit in grid.bits.iter_mut().rev() {
            *bit = rng.random_bit();
        }
    })
}

pub fn flip_mutator() -> Mutator<BinaryString2D> {
    Arc::new(|genome: &mut Genome<BinaryString2D>, p: f32, rng: &mut RandomNumberGenerator| {
        genome.modify(|grid| {
            let size = grid.size();
            mutate_at_rate(grid, size, p, rng, |grid, i, _| {
                grid.bits[i] = !grid.bits[i];
            })
        })
    })
}

/// Fraction of differing bits; `-1` when the shapes differ.
pub fn bit_comparator() -> Comparator<BinaryString2D> {
    Arc::new(|a: &Genome<BinaryString2D>, b: &Genome<BinaryString2D>| {
        let (a, b) = (a.chromosome(), b.chromosome());
        if !same_shape(a, b) {
            return -1.0;
        }
        if a.bits.is_empty() {
            return 0.0;
        }
        let differing = a.bits.iter().zip(&b.bits).filter(|(x, y)| x != y).count();
        differing as f32 / a.bits.len() as f32
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(width: usize, height: usize, value: bool) -> BinaryString2D {
        let mut grid = BinaryString2D::new(width, height);
        if value {
            grid.set_block(0, 0, width, height);
        }
        grid
    }

    fn resizable(width: usize, height: usize) -> BinaryString2D {
        let mut rng = RandomNumberGenerator::from_seed(1);
        let mut grid = BinaryString2D::new(width, height);
        grid.set_resize_behaviour(Axis::Width, 0, 64, &mut rng).unwrap();
        grid.set_resize_behaviour(Axis::Height, 0, 64, &mut rng).unwrap();
        grid
    }

    #[test]
    fn test_row_major_layout() {
        let mut grid = BinaryString2D::new(3, 2);
        grid.set_bit(2, 1, true);
        assert!(grid.bits()[2 + 3]);
        assert!(grid.bit(2, 1));
    }

    #[test]
    fn test_resize_keeps_coordinates() {
        let mut rng = RandomNumberGenerator::from_seed(4);
        let mut grid = BinaryString2D::new(3, 3);
        grid.set_bit(1, 1, true);
        grid.set_bit(2, 0, true);
        grid.resize(2, 4, &mut rng);
        assert_eq!((grid.width(), grid.height()), (2, 4));
        assert!(grid.bit(1, 1));
        assert!(!grid.bit(0, 0));
        grid.resize(5, 2, &mut rng);
        assert!(grid.bit(1, 1));
        assert!(!grid.bit(0, 1));
        assert_eq!(grid.size(), 10);
    }

    #[test]
    fn test_resize_behaviour_per_axis() {
        let mut rng = RandomNumberGenerator::from_seed(4);
        let mut grid = BinaryString2D::new(8, 8);
        grid.set_resize_behaviour(Axis::Width, 2, 5, &mut rng).unwrap();
        assert_eq!(grid.width(), 5);
        assert!(grid.is_fixed(Axis::Height));
        assert!(grid
            .set_resize_behaviour(Axis::Height, 9, 3, &mut rng)
            .is_err());
        assert_eq!(grid.bounds(Axis::Height), SizeBounds::fixed(8));
        for _ in 0..20 {
            grid.resize_any(&mut rng);
            assert!((2..=5).contains(&grid.width()));
            assert_eq!(grid.height(), 8);
        }
    }

    #[test]
    fn test_copy_block_clips() {
        let mut dest = BinaryString2D::new(4, 4);
        let src = filled(3, 3, true);
        dest.copy_block(&src, 2, 2, 1, 1, 5, 5);
        assert_eq!(dest.count_ones(), 4);
        assert!(dest.bit(3, 3));
        dest.copy_block(&src, 0, 0, 3, 0, 1, 1);
        assert_eq!(dest.count_ones(), 4);
    }

    #[test]
    fn test_blocks_clip() {
        let mut rng = RandomNumberGenerator::from_seed(3);
        let mut grid = BinaryString2D::new(4, 3);
        grid.set_block(2, 1, 10, 10);
        assert_eq!(grid.count_ones(), 4);
        grid.unset_block(3, 0, 1, 3);
        assert_eq!(grid.count_ones(), 2);
        grid.randomize_block(9, 9, 2, 2, &mut rng);
        assert_eq!(grid.count_ones(), 2);
    }

    #[test]
    fn test_one_point_fixed_quadrants() {
        let mut rng = RandomNumberGenerator::from_seed(10);
        let mom = filled(5, 4, true);
        let dad = filled(5, 4, false);
        for _ in 0..30 {
            let mut sis = BinaryString2D::new(5, 4);
            let mut bro = BinaryString2D::new(5, 4);
            let n = one_point(&mom, &dad, Some(&mut sis), Some(&mut bro), &mut rng).unwrap();
            assert_eq!(n, 2);
            for y in 0..4 {
                for x in 0..5 {
                    assert_ne!(sis.bit(x, y), bro.bit(x, y));
                }
            }
            // every row and column switches parent at most once
            for y in 0..4 {
                let switches = (1..5).filter(|&x| sis.bit(x, y) != sis.bit(x - 1, y)).count();
                assert!(switches <= 1);
            }
            for x in 0..5 {
                let switches = (1..4).filter(|&y| sis.bit(x, y) != sis.bit(x, y - 1)).count();
                assert!(switches <= 1);
            }
        }
    }

    #[test]
    fn test_one_point_resizable_children_share_extent() {
        let mut rng = RandomNumberGenerator::from_seed(10);
        let mom = filled(6, 3, true);
        let dad = filled(4, 5, false);
        for _ in 0..30 {
            let mut sis = resizable(2, 2);
            let mut bro = resizable(2, 2);
            one_point(&mom, &dad, Some(&mut sis), Some(&mut bro), &mut rng).unwrap();
            assert_eq!((sis.width(), sis.height()), (bro.width(), bro.height()));
            assert!(sis.width() <= 4 && sis.height() <= 3);
        }
    }

    #[test]
    fn test_one_point_rejects_mixed_behaviour() {
        let mut rng = RandomNumberGenerator::from_seed(10);
        let mom = filled(4, 4, true);
        let dad = filled(4, 4, false);
        let mut sis = BinaryString2D::new(4, 4);
        let mut bro = resizable(4, 4);
        assert!(one_point(&mom, &dad, Some(&mut sis), Some(&mut bro), &mut rng).is_err());
    }

    #[test]
    fn test_uniform_and_even_odd() {
        let mut rng = RandomNumberGenerator::from_seed(6);
        let mom = filled(3, 3, true);
        let dad = filled(3, 3, false);
        let mut sis = BinaryString2D::new(3, 3);
        let mut bro = BinaryString2D::new(3, 3);
        uniform(&mom, &dad, Some(&mut sis), Some(&mut bro), &mut rng).unwrap();
        assert_eq!(sis.count_ones() + bro.count_ones(), 9);

        even_odd(&mom, &dad, Some(&mut sis), Some(&mut bro), &mut rng).unwrap();
        assert_eq!(sis.count_ones(), 5);
        assert_eq!(bro.count_ones(), 4);

        let mut small = BinaryString2D::new(2, 2);
        even_odd(&mom, &dad, Some(&mut small), None, &mut rng).unwrap();
        assert!(small.bit(0, 0) && small.bit(1, 1));
        assert!(!small.bit(1, 0) && !small.bit(0, 1));
    }

    #[test]
    fn test_comparator_and_mutator() {
        let mut rng = RandomNumberGenerator::from_seed(6);
        let compare = bit_comparator();
        let a = Genome::new(filled(2, 2, true));
        let b = Genome::new(filled(2, 2, false));
        let c = Genome::new(filled(4, 1, false));
        assert_eq!(compare(&a, &b), 1.0);
        assert_eq!(compare(&a, &c), -1.0);

        let mut g = Genome::new(BinaryString2D::new(4, 4));
        assert_eq!(g.mutate(0.5, &mut rng), 8);
        assert_eq!(g.chromosome().count_ones() % 2, 0);
    }
}
