//! # Operators
//!
//! Crossovers, mutators, initializers and comparators that work on any
//! [`LinearChromosome`].
//!
//! Crossovers come in two layers. The chromosome-level functions (`one_point`,
//! `two_point`, ...) take the parents' payloads and optional children and return how many
//! children they wrote, or an error when the parents cannot be mated. The factory functions
//! (`one_point_crossover`, ...) wrap them into [`SexualCrossover`] strategy values that can
//! be installed on a [`Genome`]: errors are reported and count as zero children, and every
//! child that was written is marked as needing evaluation.
//!
//! Every mutator shares one rate policy, [`mutate_at_rate`]: with `n = p * len` expected
//! mutations, `n < 1` tests each position with probability `p` and returns the realized
//! count, otherwise `ceil(n)` random positions are changed and `n` truncated is returned.

use std::sync::Arc;

use crate::error::{report, GeneticError, Result};
use crate::rng::RandomNumberGenerator;

use super::array::AsGeneArray;
use super::{
    AsexualCrossover, Chromosome, Comparator, Genome, Initializer, LinearChromosome, Mutator,
    SexualCrossover,
};

/// Wraps a chromosome-level crossover into a genome strategy.
pub fn sexual<C, F>(op: F) -> SexualCrossover<C>
where
    C: Chromosome,
    F: Fn(&C, &C, Option<&mut C>, Option<&mut C>, &mut RandomNumberGenerator) -> Result<usize>
        + Send
        + Sync
        + 'static,
{
    Arc::new(
        move |mom: &Genome<C>,
              dad: &Genome<C>,
              mut sis: Option<&mut Genome<C>>,
              mut bro: Option<&mut Genome<C>>,
              rng: &mut RandomNumberGenerator| {
            let produced = op(
                &mom.chromosome,
                &dad.chromosome,
                sis.as_deref_mut().map(|g| &mut g.chromosome),
                bro.as_deref_mut().map(|g| &mut g.chromosome),
                rng,
            );
            match produced {
                Ok(0) => 0,
                Ok(n) => {
                    for child in [sis, bro].into_iter().flatten() {
                        child.touch();
                    }
                    n
                }
                Err(err) => {
                    report(&err);
                    0
                }
            }
        },
    )
}

/// Wraps a chromosome-level single-parent operator into a genome strategy.
pub fn asexual<C, F>(op: F) -> AsexualCrossover<C>
where
    C: Chromosome,
    F: Fn(&C, &mut C, &mut RandomNumberGenerator) -> Result<usize> + Send + Sync + 'static,
{
    Arc::new(
        move |parent: &Genome<C>, child: &mut Genome<C>, rng: &mut RandomNumberGenerator| {
            match op(&parent.chromosome, &mut child.chromosome, rng) {
                Ok(0) => 0,
                Ok(n) => {
                    child.touch();
                    n
                }
                Err(err) => {
                    report(&err);
                    0
                }
            }
        },
    )
}

fn same_length_required(what: &str) -> GeneticError {
    GeneticError::IncompatibleParents(format!("{}: parents and children must share one length", what))
}

fn same_behaviour_required(what: &str) -> GeneticError {
    GeneticError::IncompatibleParents(format!(
        "{}: children must both be fixed or both be resizable",
        what
    ))
}

fn sorted_sites(len: usize, rng: &mut RandomNumberGenerator) -> [usize; 2] {
    let a = rng.random_int(0, len);
    let b = rng.random_int(0, len);
    if a > b {
        [b, a]
    } else {
        [a, b]
    }
}

/// One-point crossover.
///
/// Fixed-length children need parents of their own length and share one cut site.
/// Resizable children take an independent cut in each parent and are resized to the sum
/// of the fragments they receive. With a single child a random bit decides which parent
/// supplies the head.
pub fn one_point<C: LinearChromosome>(
    mom: &C,
    dad: &C,
    sis: Option<&mut C>,
    bro: Option<&mut C>,
    rng: &mut RandomNumberGenerator,
) -> Result<usize> {
    match (sis, bro) {
        (Some(sis), Some(bro)) => {
            let (momsite, dadsite);
            if sis.is_fixed() && bro.is_fixed() {
                if mom.len() != dad.len() || sis.len() != bro.len() || sis.len() != mom.len() {
                    return Err(same_length_required("one-point crossover"));
                }
                momsite = rng.random_int(0, mom.len());
                dadsite = momsite;
            } else if sis.is_fixed() || bro.is_fixed() {
                return Err(same_behaviour_required("one-point crossover"));
            } else {
                momsite = rng.random_int(0, mom.len());
                dadsite = rng.random_int(0, dad.len());
                sis.resize(momsite + dad.len() - dadsite, rng);
                bro.resize(dadsite + mom.len() - momsite, rng);
            }
            let momlen = mom.len() - momsite;
            let dadlen = dad.len() - dadsite;

            sis.copy_segment(mom, 0, 0, momsite);
            sis.copy_segment(dad, momsite, dadsite, dadlen);
            bro.copy_segment(dad, 0, 0, dadsite);
            bro.copy_segment(mom, dadsite, momsite, momlen);
            Ok(2)
        }
        (Some(sis), None) | (None, Some(sis)) => {
            let (momsite, dadsite);
            if sis.is_fixed() {
                if mom.len() != dad.len() || sis.len() != mom.len() {
                    return Err(same_length_required("one-point crossover"));
                }
                momsite = rng.random_int(0, mom.len());
                dadsite = momsite;
            } else {
                momsite = rng.random_int(0, mom.len());
                dadsite = rng.random_int(0, dad.len());
                sis.resize(momsite + dad.len() - dadsite, rng);
            }
            let momlen = mom.len() - momsite;
            let dadlen = dad.len() - dadsite;

            if rng.random_bit() {
                sis.copy_segment(mom, 0, 0, momsite);
                sis.copy_segment(dad, momsite, dadsite, dadlen);
            } else {
                sis.copy_segment(dad, 0, 0, dadsite);
                sis.copy_segment(mom, dadsite, momsite, momlen);
            }
            Ok(1)
        }
        (None, None) => Ok(0),
    }
}

/// Two-point crossover: `A[0, s0) + B[s0, s1) + A[s1, end)`, with the roles swapped for the
/// second child.
pub fn two_point<C: LinearChromosome>(
    mom: &C,
    dad: &C,
    sis: Option<&mut C>,
    bro: Option<&mut C>,
    rng: &mut RandomNumberGenerator,
) -> Result<usize> {
    match (sis, bro) {
        (Some(sis), Some(bro)) => {
            let (momsite, dadsite);
            if sis.is_fixed() && bro.is_fixed() {
                if mom.len() != dad.len() || sis.len() != bro.len() || sis.len() != mom.len() {
                    return Err(same_length_required("two-point crossover"));
                }
                momsite = sorted_sites(mom.len(), rng);
                dadsite = momsite;
            } else if sis.is_fixed() || bro.is_fixed() {
                return Err(same_behaviour_required("two-point crossover"));
            } else {
                momsite = sorted_sites(mom.len(), rng);
                dadsite = sorted_sites(dad.len(), rng);
                let momlen = [momsite[1] - momsite[0], mom.len() - momsite[1]];
                let dadlen = [dadsite[1] - dadsite[0], dad.len() - dadsite[1]];
                sis.resize(momsite[0] + dadlen[0] + momlen[1], rng);
                bro.resize(dadsite[0] + momlen[0] + dadlen[1], rng);
            }
            let momlen = [momsite[1] - momsite[0], mom.len() - momsite[1]];
            let dadlen = [dadsite[1] - dadsite[0], dad.len() - dadsite[1]];

            sis.copy_segment(mom, 0, 0, momsite[0]);
            sis.copy_segment(dad, momsite[0], dadsite[0], dadlen[0]);
            sis.copy_segment(mom, momsite[0] + dadlen[0], momsite[1], momlen[1]);
            bro.copy_segment(dad, 0, 0, dadsite[0]);
            bro.copy_segment(mom, dadsite[0], momsite[0], momlen[0]);
            bro.copy_segment(dad, dadsite[0] + momlen[0], dadsite[1], dadlen[1]);
            Ok(2)
        }
        (Some(sis), None) | (None, Some(sis)) => {
            let (momsite, dadsite);
            if sis.is_fixed() {
                if mom.len() != dad.len() || sis.len() != mom.len() {
                    return Err(same_length_required("two-point crossover"));
                }
                momsite = sorted_sites(mom.len(), rng);
                dadsite = momsite;
            } else {
                momsite = sorted_sites(mom.len(), rng);
                dadsite = sorted_sites(dad.len(), rng);
                let dadlen0 = dadsite[1] - dadsite[0];
                sis.resize(momsite[0] + dadlen0 + mom.len() - momsite[1], rng);
            }
            let momlen = [momsite[1] - momsite[0], mom.len() - momsite[1]];
            let dadlen = [dadsite[1] - dadsite[0], dad.len() - dadsite[1]];

            if rng.random_bit() {
                sis.copy_segment(mom, 0, 0, momsite[0]);
                sis.copy_segment(dad, momsite[0], dadsite[0], dadlen[0]);
                sis.copy_segment(mom, momsite[0] + dadlen[0], momsite[1], momlen[1]);
            } else {
                sis.copy_segment(dad, 0, 0, dadsite[0]);
                sis.copy_segment(mom, dadsite[0], momsite[0], momlen[0]);
                sis.copy_segment(dad, dadsite[0] + momlen[0], dadsite[1], dadlen[1]);
            }
            Ok(1)
        }
        (None, None) => Ok(0),
    }
}

/// Uniform crossover: every position comes from either parent with equal probability.
///
/// When lengths differ a shared mask sized to the longer child decides each position, and
/// only the positions every participant has are written.
pub fn uniform<C: LinearChromosome>(
    mom: &C,
    dad: &C,
    sis: Option<&mut C>,
    bro: Option<&mut C>,
    rng: &mut RandomNumberGenerator,
) -> Result<usize> {
    let (m, d) = (mom.genes(), dad.genes());
    match (sis, bro) {
        (Some(sis), Some(bro)) => {
            if sis.len() == bro.len() && m.len() == d.len() && sis.len() == m.len() {
                let (s, b) = (sis.genes_mut(), bro.genes_mut());
                for i in (0..s.len()).rev() {
                    if rng.random_bit() {
                        s[i] = m[i].clone();
                        b[i] = d[i].clone();
                    } else {
                        s[i] = d[i].clone();
                        b[i] = m[i].clone();
                    }
                }
            } else {
                let mask: Vec<bool> = (0..sis.len().max(bro.len()))
                    .map(|_| rng.random_bit())
                    .collect();
                let shortest = m.len().min(d.len());
                let s = sis.genes_mut();
                for i in (0..s.len().min(shortest)).rev() {
                    s[i] = if mask[i] { m[i].clone() } else { d[i].clone() };
                }
                let b = bro.genes_mut();
                for i in (0..b.len().min(shortest)).rev() {
                    b[i] = if mask[i] { d[i].clone() } else { m[i].clone() };
                }
            }
            Ok(2)
        }
        (Some(sis), None) | (None, Some(sis)) => {
            let s = sis.genes_mut();
            let upto = s.len().min(m.len()).min(d.len());
            for i in (0..upto).rev() {
                s[i] = if rng.random_bit() { m[i].clone() } else { d[i].clone() };
            }
            Ok(1)
        }
        (None, None) => Ok(0),
    }
}

/// Even/odd crossover: alternate positions come from alternate parents.
///
/// With equal lengths the alternation is anchored at the last position, which always comes
/// from the first parent for the first child. With unequal lengths even indices come from
/// the first parent.
pub fn even_odd<C: LinearChromosome>(
    mom: &C,
    dad: &C,
    sis: Option<&mut C>,
    bro: Option<&mut C>,
    _rng: &mut RandomNumberGenerator,
) -> Result<usize> {
    let (m, d) = (mom.genes(), dad.genes());
    match (sis, bro) {
        (Some(sis), Some(bro)) => {
            if sis.len() == bro.len() && m.len() == d.len() && sis.len() == m.len() {
                let len = sis.len();
                let (s, b) = (sis.genes_mut(), bro.genes_mut());
                for i in 0..len {
                    if (len - 1 - i) % 2 == 0 {
                        s[i] = m[i].clone();
                        b[i] = d[i].clone();
                    } else {
                        s[i] = d[i].clone();
                        b[i] = m[i].clone();
                    }
                }
            } else {
                let shortest = m.len().min(d.len());
                let s = sis.genes_mut();
                for i in 0..s.len().min(shortest) {
                    s[i] = if i % 2 == 0 { m[i].clone() } else { d[i].clone() };
                }
                let b = bro.genes_mut();
                for i in 0..b.len().min(shortest) {
                    b[i] = if i % 2 == 0 { d[i].clone() } else { m[i].clone() };
                }
            }
            Ok(2)
        }
        (Some(sis), None) | (None, Some(sis)) => {
            if m.len() == d.len() && sis.len() == m.len() {
                let len = sis.len();
                let s = sis.genes_mut();
                for i in 0..len {
                    s[i] = if (len - 1 - i) % 2 == 0 {
                        m[i].clone()
                    } else {
                        d[i].clone()
                    };
                }
            } else {
                let s = sis.genes_mut();
                let upto = s.len().min(m.len()).min(d.len());
                for i in 0..upto {
                    s[i] = if i % 2 == 0 { m[i].clone() } else { d[i].clone() };
                }
            }
            Ok(1)
        }
        (None, None) => Ok(0),
    }
}

fn partial_match_into<C: LinearChromosome>(child: &mut C, source: &C, guide: &C, window: [usize; 2]) {
    child.clone_from(source);
    let last = child.len().saturating_sub(1);
    for i in window[0]..window[1] {
        let target = &guide.genes()[i];
        let j = child.genes()[..last]
            .iter()
            .position(|g| g == target)
            .unwrap_or(last);
        child.swap(i, j);
    }
}

/// Partial-match crossover for array genomes.
///
/// Each child starts as a copy of one parent; for every position of a random window the
/// gene the other parent holds there is located and swapped into place. Children of
/// permutation parents stay permutations.
pub fn partial_match<C: AsGeneArray>(
    mom: &C,
    dad: &C,
    sis: Option<&mut C>,
    bro: Option<&mut C>,
    rng: &mut RandomNumberGenerator,
) -> Result<usize> {
    let window = {
        let a = rng.random_int(0, mom.len());
        let b = rng.random_int(0, dad.len());
        if b < a {
            [b, a]
        } else {
            [a, b]
        }
    };
    if mom.len() != dad.len() {
        return Err(GeneticError::IncompatibleParents(
            "partial-match crossover: parents must have the same length".to_string(),
        ));
    }
    match (sis, bro) {
        (Some(sis), Some(bro)) => {
            partial_match_into(sis, mom, dad, window);
            partial_match_into(bro, dad, mom, window);
            Ok(2)
        }
        (Some(sis), None) | (None, Some(sis)) => {
            if rng.random_bit() {
                partial_match_into(sis, mom, dad, window);
            } else {
                partial_match_into(sis, dad, mom, window);
            }
            Ok(1)
        }
        (None, None) => Ok(0),
    }
}

pub fn one_point_crossover<C: LinearChromosome>() -> SexualCrossover<C> {
    sexual(one_point::<C>)
}

pub fn two_point_crossover<C: LinearChromosome>() -> SexualCrossover<C> {
    sexual(two_point::<C>)
}

pub fn uniform_crossover<C: LinearChromosome>() -> SexualCrossover<C> {
    sexual(uniform::<C>)
}

pub fn even_odd_crossover<C: LinearChromosome>() -> SexualCrossover<C> {
    sexual(even_odd::<C>)
}

pub fn partial_match_crossover<C: AsGeneArray>() -> SexualCrossover<C> {
    sexual(partial_match::<C>)
}

/// Applies `change` to positions of `target` under the shared rate policy.
///
/// `len` is the number of mutable positions; `change` receives the position to mutate.
pub fn mutate_at_rate<T, F>(
    target: &mut T,
    len: usize,
    probability: f32,
    rng: &mut RandomNumberGenerator,
    mut change: F,
) -> usize
where
    T: ?Sized,
    F: FnMut(&mut T, usize, &mut RandomNumberGenerator),
{
    if probability <= 0.0 {
        return 0;
    }
    let expected = probability * len as f32;
    if expected < 1.0 {
        let mut count = 0;
        for i in (0..len).rev() {
            if rng.flip_coin(probability) {
                change(target, i, rng);
                count += 1;
            }
        }
        count
    } else {
        for _ in 0..expected.ceil() as usize {
            let i = rng.random_index(len);
            change(target, i, rng);
        }
        expected as usize
    }
}

/// Swaps a mutated position with a random position.
pub fn swap_mutator<C: LinearChromosome>() -> Mutator<C> {
    Arc::new(|genome: &mut Genome<C>, p: f32, rng: &mut RandomNumberGenerator| {
        genome.modify(|c| {
            let len = c.len();
            mutate_at_rate(c, len, p, rng, |c, i, rng| {
                let j = rng.random_index(len);
                c.swap(i, j);
            })
        })
    })
}

/// Toggles mutated bits.
pub fn flip_mutator<C: LinearChromosome<Gene = bool>>() -> Mutator<C> {
    Arc::new(|genome: &mut Genome<C>, p: f32, rng: &mut RandomNumberGenerator| {
        genome.modify(|c| {
            let len = c.len();
            mutate_at_rate(c, len, p, rng, |c, i, _| {
                let bit = &mut c.genes_mut()[i];
                *bit = !*bit;
            })
        })
    })
}

/// Fraction of positions at which two genomes differ; `-1` for different lengths.
pub fn element_comparator<C: LinearChromosome>() -> Comparator<C> {
    Arc::new(|a: &Genome<C>, b: &Genome<C>| {
        let (a, b) = (a.chromosome().genes(), b.chromosome().genes());
        if a.len() != b.len() {
            return -1.0;
        }
        if a.is_empty() {
            return 0.0;
        }
        let differing = a.iter().zip(b).filter(|(x, y)| x != y).count();
        differing as f32 / a.len() as f32
    })
}

/// Picks a random length within the bounds and fills every bit at random.
pub fn uniform_bits_initializer<C: LinearChromosome<Gene = bool>>() -> Initializer<C> {
    Arc::new(|genome: &mut Genome<C>, rng: &mut RandomNumberGenerator| {
        let c = genome.chromosome_mut();
        c.resize_any(rng);
        for bit in c.genes_mut().iter_mut().rev() {
            *bit = rng.random_bit();
        }
    })
}

/// Picks a random length within the bounds and sets every bit.
pub fn set_bits_initializer<C: LinearChromosome<Gene = bool>>() -> Initializer<C> {
    Arc::new(|genome: &mut Genome<C>, rng: &mut RandomNumberGenerator| {
        let c = genome.chromosome_mut();
        c.resize_any(rng);
        c.genes_mut().fill(true);
    })
}

/// Picks a random length within the bounds and clears every bit.
pub fn unset_bits_initializer<C: LinearChromosome<Gene = bool>>() -> Initializer<C> {
    Arc::new(|genome: &mut Genome<C>, rng: &mut RandomNumberGenerator| {
        let c = genome.chromosome_mut();
        c.resize_any(rng);
        c.genes_mut().fill(false);
    })
}
