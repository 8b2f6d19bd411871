use std::f32::consts::PI;
use std::sync::Arc;

use gaforge::{
    allele::{AlleleSet, BoundType},
    evolution::{Evolution, EvolutionBuilder, EvolutionOptions, Objective},
    genome::{
        array::{gaussian_mutator, ordered_allele_initializer},
        operators::{partial_match_crossover, swap_mutator},
        AlleleArray, Genome, LinearChromosome,
    },
    rng::RandomNumberGenerator,
    selection::SortBasis,
};

const CITIES: usize = 8;

fn is_permutation(genes: &[usize]) -> bool {
    let mut seen = [false; CITIES];
    genes.len() == CITIES
        && genes.iter().all(|&g| g < CITIES && !std::mem::replace(&mut seen[g], true))
}

/// Length of the closed tour through cities evenly spaced on the unit circle.
fn tour_length(genome: &Genome<AlleleArray<usize>>) -> gaforge::Result<f32> {
    let genes = genome.chromosome().genes();
    let point = |c: usize| {
        let angle = 2.0 * PI * c as f32 / CITIES as f32;
        (angle.cos(), angle.sin())
    };
    let mut length = 0.0;
    for i in 0..genes.len() {
        let (a, b) = (point(genes[i]), point(genes[(i + 1) % genes.len()]));
        length += ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
    }
    Ok(length)
}

#[test]
fn test_enumerated_alleles_are_uniform() {
    let set = AlleleSet::enumerated((1..=15).collect::<Vec<i32>>());
    let mut rng = RandomNumberGenerator::from_seed(2024);
    let mut counts = [0usize; 15];
    let draws = 10_000;
    for _ in 0..draws {
        let value = set.allele(&mut rng);
        assert!((1..=15).contains(&value));
        counts[(value - 1) as usize] += 1;
    }
    let expected = draws as f64 / 15.0;
    let chi_square: f64 = counts
        .iter()
        .map(|&c| (c as f64 - expected).powi(2) / expected)
        .sum();
    // 14 degrees of freedom, p = 0.01
    assert!(chi_square < 29.14, "chi-square {}", chi_square);
}

#[test]
fn test_tours_stay_permutations() {
    let cities = AlleleSet::enumerated((0..CITIES).collect::<Vec<usize>>());
    let prototype = Genome::new(AlleleArray::new(CITIES, cities))
        .with_initializer(ordered_allele_initializer())
        .with_mutator(swap_mutator())
        .with_crossover(partial_match_crossover());
    let options = EvolutionOptions::builder()
        .num_generations(40)
        .population_size(24)
        .mutation_probability(0.1)
        .objective(Objective::Minimize)
        .build()
        .unwrap();
    let mut ga = EvolutionBuilder::new()
        .with_prototype(prototype)
        .with_evaluator(Arc::new(tour_length))
        .with_options(options)
        .build_simple()
        .unwrap();
    ga.evolve(4).unwrap();

    for genome in ga.population().iter() {
        assert!(is_permutation(genome.chromosome().genes()));
    }
    let initial = ga.statistics().initial().min;
    let best = ga.best().unwrap();
    assert!(is_permutation(best.chromosome().genes()));
    assert!(best.cached_score() <= initial);
    assert!(ga.statistics().crossovers() > 0);
}

#[test]
fn test_gaussian_mutation_stays_in_bounds() {
    let set = AlleleSet::bounded(-1.0f64, 1.0, BoundType::Inclusive, BoundType::Inclusive);
    let mut genome =
        Genome::new(AlleleArray::new(20, set)).with_mutator(gaussian_mutator(0.5));
    let mut rng = RandomNumberGenerator::from_seed(6);
    genome.initialize(&mut rng);
    for _ in 0..50 {
        assert!(genome.mutate(1.0, &mut rng) > 0);
        assert!(genome.chromosome().genes().iter().all(|g| (-1.0..=1.0).contains(g)));
    }
}

#[test]
fn test_population_views_share_members() {
    let cities = AlleleSet::enumerated((0..CITIES).collect::<Vec<usize>>());
    let prototype = Genome::new(AlleleArray::new(CITIES, cities))
        .with_initializer(ordered_allele_initializer())
        .with_evaluator(Arc::new(tour_length));
    let mut population = gaforge::Population::with_size(&prototype, 10);
    let mut rng = RandomNumberGenerator::from_seed(15);
    population.initialize(&mut rng);
    population.evaluate(false).unwrap();
    population.scale(false).unwrap();
    population.sort(false, SortBasis::Scaled).unwrap();
    population.sort(false, SortBasis::Raw).unwrap();

    let mut raw: Vec<u64> = (0..10)
        .map(|i| population.individual(i, SortBasis::Raw).identity())
        .collect();
    let mut scaled: Vec<u64> = (0..10)
        .map(|i| population.individual(i, SortBasis::Scaled).identity())
        .collect();
    raw.sort_unstable();
    scaled.sort_unstable();
    assert_eq!(raw, scaled);
}
