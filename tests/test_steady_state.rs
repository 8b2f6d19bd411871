use std::sync::Arc;

use gaforge::{
    evolution::{Evolution, EvolutionBuilder, EvolutionOptions, LogLevel, ParameterValue},
    genome::{Bin2Dec, BinaryString, Genome},
    phenotype::PhenotypeMap,
    scaling::SigmaTruncationScaling,
    selection::TournamentSelection,
};

/// A paraboloid peaking at 10 over (1, -2).
fn peak(genome: &Genome<Bin2Dec>) -> gaforge::Result<f32> {
    let p = genome.chromosome().phenotypes();
    let (x, y) = (p[0], p[1]);
    Ok(10.0 - (x - 1.0).powi(2) - (y + 2.0).powi(2))
}

fn plane() -> Bin2Dec {
    let mut map = PhenotypeMap::new();
    map.add(16, -5.0, 5.0);
    map.add(16, -5.0, 5.0);
    Bin2Dec::new(map)
}

#[test]
fn test_bin2dec_with_sigma_scaling() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let options = EvolutionOptions::builder()
        .num_generations(200)
        .population_size(40)
        .mutation_probability(0.01)
        .log_level(LogLevel::Minimal)
        .build()
        .unwrap();
    let mut ga = EvolutionBuilder::new()
        .with_prototype(Genome::new(plane()))
        .with_evaluator(Arc::new(peak))
        .with_scaling(Box::new(SigmaTruncationScaling::default()))
        .with_options(options)
        .build_steady_state()
        .unwrap();
    ga.evolve(31).unwrap();

    assert_eq!(ga.generation(), 200);
    assert_eq!(ga.population().len(), 40);
    let initial = ga.statistics().initial().max;
    let best = ga.best().unwrap();
    let score = best.cached_score();
    let p = best.chromosome().phenotypes();
    assert!(score >= initial);
    assert!(score >= 9.0, "best {} at {:?}", score, p);
    assert!((p[0] - 1.0).abs() <= 1.0);
    assert!((p[1] + 2.0).abs() <= 1.0);
}

#[test]
fn test_population_best_never_drops() {
    let options = EvolutionOptions::builder()
        .num_generations(50)
        .population_size(16)
        .replacement_number(4)
        .build()
        .unwrap();
    let mut ga = EvolutionBuilder::new()
        .with_prototype(Genome::new(BinaryString::new(32)))
        .with_evaluator(Arc::new(|g: &Genome<BinaryString>| {
            Ok(g.chromosome().count_ones() as f32)
        }))
        .with_selector(Box::new(TournamentSelection::new()))
        .with_options(options)
        .build_steady_state()
        .unwrap();
    ga.initialize(8).unwrap();
    let mut previous = ga.statistics().current().max;
    while !ga.done() {
        ga.step().unwrap();
        let current = ga.statistics().current().max;
        assert!(current >= previous);
        previous = current;
    }
    assert_eq!(ga.statistics().replacements(), 200);
    assert_eq!(ga.statistics().selections(), 50 * 4);
}

#[test]
fn test_replacement_parameters() {
    let mut ga = EvolutionBuilder::new()
        .with_prototype(Genome::new(BinaryString::new(8)))
        .build_steady_state()
        .unwrap();
    assert_eq!(ga.replacement_number(), 25);

    ga.set_parameter("nrepl", &ParameterValue::Int(10)).unwrap();
    assert_eq!(ga.replacement_number(), 10);
    assert_eq!(ga.replacement_percentage(), 0.2);

    ga.set_parameter("prepl", &ParameterValue::Float(0.1)).unwrap();
    assert_eq!(ga.replacement_number(), 5);

    assert!(ga.set_parameter("nrepl", &ParameterValue::Int(0)).is_err());
    assert!(ga.set_parameter("nrepl", &ParameterValue::Int(-3)).is_err());
    assert_eq!(ga.replacement_number(), 5);

    let parameters = ga.parameters();
    assert_eq!(parameters.get("nrepl"), Some(&ParameterValue::Int(5)));
    assert!(parameters.get("elitism").is_none());
    assert!(ga.set_parameter("elitism", &ParameterValue::Bool(true)).is_err());
}
