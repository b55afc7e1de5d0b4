//! Implements the generation loop: repopulate, evaluate, rank, report.
extern crate float_ord;
extern crate rand;
extern crate rand_xorshift;
extern crate rayon;

use std::cmp::Reverse;

use self::float_ord::FloatOrd;
use self::rand::{Rng, SeedableRng};
use self::rand_xorshift::XorShiftRng;
use self::rayon::prelude::*;

use tracing::{debug, info, warn};

use crate::error::{ConfigError, EvolutionError, GenomeError};
use crate::genome::{Environment, Genome};
use crate::model::sampler::Mutation;
use crate::model::{Initializer, WeightUpdater};
use crate::snapshot::{Export, Snapshot, SnapshotSource};

use super::config::{EvolutionConfig, FailurePolicy};

/// Mutation bound for a generation: `base * factor ^ generation`.  Generations
/// before zero use the base rate.
pub fn learning_rate(base: f32, factor: f32, generation: i64) -> f32 {
    let exponent = generation.max(0).min(i64::from(i32::max_value())) as i32;
    base * factor.powi(exponent)
}

#[derive(Debug, Clone, PartialEq)]
/// Summary of one ranked generation
pub struct GenerationReport {
    /// Generation that was evaluated
    pub generation: i64,
    /// Score of the best genome
    pub highscore: f32,
    /// Mean of the finite scores
    pub mean: f32,
    /// Score of the worst genome
    pub lowest: f32,
    /// Mutation bound used to breed this generation
    pub learning_rate: f32,
    /// Genomes whose evaluation failed and were penalized
    pub failures: usize,
}

/// Population based, gradient free optimizer.
///
/// Each call to [`advance_generation`](NeuroEvolution::advance_generation) increments
/// the generation counter, rebuilds the population from the previous ranking (except
/// on generation zero, whose population is evaluated as it is), evaluates every genome
/// and stably sorts the population by descending score.
pub struct NeuroEvolution<B, E>
where
    B: Initializer,
    E: Environment<B::Model>,
{
    config: EvolutionConfig,
    builder: B,
    environment: E,
    generation: i64,
    population: Vec<Genome<B::Model, E::Handle>>,
    populated: bool,
    rng: XorShiftRng,
}

impl<B, E> NeuroEvolution<B, E>
where
    B: Initializer,
    B::Model: WeightUpdater,
    E: Environment<B::Model>,
{
    /// Returns a new, empty engine.  One of the setup methods must run before the
    /// first generation.
    pub fn new(config: EvolutionConfig, builder: B, environment: E) -> Self {
        let seed = match config.seed {
            Some(seed) => seed,
            None => self::rand::thread_rng().gen(),
        };
        NeuroEvolution {
            config: config,
            builder: builder,
            environment: environment,
            generation: -1,
            population: Vec::new(),
            populated: false,
            rng: XorShiftRng::seed_from_u64(seed),
        }
    }

    /// Current settings
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Settings, for changes between generations
    pub fn config_mut(&mut self) -> &mut EvolutionConfig {
        &mut self.config
    }

    /// Last generation that was advanced to; -1 before the first one
    pub fn generation(&self) -> i64 {
        self.generation
    }

    /// The population, best first once a generation has been ranked
    pub fn population(&self) -> &[Genome<B::Model, E::Handle>] {
        &self.population
    }

    /// Best genome of the last ranking
    pub fn best(&self) -> Option<&Genome<B::Model, E::Handle>> {
        self.population.first()
    }

    /// Whether a setup path has run
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// The evaluation environment
    pub fn environment(&self) -> &E {
        &self.environment
    }

    /// Mutation bound for the current generation
    pub fn learning_rate(&self) -> f32 {
        learning_rate(
            self.config.learning_rate_base,
            self.config.learning_rate_factor,
            self.generation,
        )
    }

    fn fresh_genome(&mut self) -> Genome<B::Model, E::Handle> {
        let model = self.builder.build(&mut self.rng);
        Genome::with_environment(model, &self.environment)
    }

    fn check_unpopulated(&self) -> Result<(), EvolutionError> {
        if self.populated {
            Err(ConfigError::AlreadyPopulated.into())
        } else if self.config.population_size == 0 {
            Err(ConfigError::EmptyPopulation.into())
        } else {
            Ok(())
        }
    }

    /// Fills the population with freshly built models.  The generation counter is
    /// left alone, so the first advance evaluates generation zero.
    pub fn setup_from_scratch(&mut self) -> Result<(), EvolutionError> {
        self.check_unpopulated()?;
        let size = self.config.population_size;
        let population: Vec<_> = (0..size).map(|_| self.fresh_genome()).collect();
        self.population = population;
        self.populated = true;
        info!(population = size, "population built from scratch");
        Ok(())
    }

    /// Restores a population.  Snapshots larger than the population size are
    /// truncated; smaller ones are padded with freshly built models.
    pub fn setup_from_snapshot(
        &mut self,
        snapshot: Snapshot<B::Model>,
    ) -> Result<(), EvolutionError> {
        self.check_unpopulated()?;
        let size = self.config.population_size;
        let restored = snapshot.networks.len().min(size);
        let mut population = Vec::with_capacity(size);
        for model in snapshot.networks.into_iter().take(size) {
            population.push(Genome::with_environment(model, &self.environment));
        }
        while population.len() < size {
            let genome = self.fresh_genome();
            population.push(genome);
        }

        self.population = population;
        self.generation = snapshot.generation;
        self.populated = true;
        info!(
            generation = self.generation,
            restored = restored,
            padded = size - restored,
            "population restored from snapshot"
        );
        Ok(())
    }

    /// Restores from `source`, loading `handle` or the latest snapshot
    pub fn setup_from_source<S>(
        &mut self,
        source: &S,
        handle: Option<&str>,
    ) -> Result<(), EvolutionError>
    where
        S: SnapshotSource<B::Model>,
    {
        self.check_unpopulated()?;
        let snapshot = source
            .load_snapshot(handle)
            .map_err(|e| EvolutionError::Snapshot(Box::new(e)))?;
        self.setup_from_snapshot(snapshot)
    }

    /// Restores the latest snapshot from `source`, falling back to a fresh
    /// population when none can be loaded
    pub fn setup_auto<S>(&mut self, source: &S) -> Result<(), EvolutionError>
    where
        S: SnapshotSource<B::Model>,
    {
        match self.setup_from_source(source, None) {
            Err(EvolutionError::Snapshot(e)) => {
                info!(reason = %e, "no snapshot restored");
                self.setup_from_scratch()
            }
            other => other,
        }
    }

    /// Advances one generation and returns its report
    pub fn advance_generation(&mut self) -> Result<GenerationReport, EvolutionError> {
        if !self.populated {
            return Err(EvolutionError::NotPopulated);
        }
        // Validate before touching any state
        let rest = self.config.validate()?;

        let generation = self
            .generation
            .checked_add(1)
            .ok_or(EvolutionError::GenerationOverflow(self.generation))?;
        self.generation = generation;
        let learning_rate = self.learning_rate();

        if self.generation > 0 {
            let mutation = Mutation::new(learning_rate, self.config.mutation_chance);
            debug!(
                generation = self.generation,
                random_add = self.config.random_add,
                keep = self.config.keep,
                random_mutate = self.config.random_mutate,
                rest = rest,
                "repopulating"
            );
            let next = repopulate(
                &self.population,
                &self.builder,
                &self.environment,
                &self.config,
                &mutation,
                &mut self.rng,
            );
            self.population = next;
        } else {
            // The population size may have changed since setup
            let size = self.config.population_size;
            self.population.truncate(size);
            while self.population.len() < size {
                let genome = self.fresh_genome();
                self.population.push(genome);
            }
        }

        let failures = self.evaluate()?;
        let scores = self.rank()?;

        let finite: Vec<f32> = scores.iter().cloned().filter(|s| s.is_finite()).collect();
        let mean = if finite.is_empty() {
            std::f32::NEG_INFINITY
        } else {
            finite.iter().sum::<f32>() / finite.len() as f32
        };
        let report = GenerationReport {
            generation: self.generation,
            highscore: scores[0],
            mean: mean,
            lowest: scores[scores.len() - 1],
            learning_rate: learning_rate,
            failures: failures,
        };
        info!(
            generation = report.generation,
            highscore = report.highscore,
            mean = report.mean,
            learning_rate = report.learning_rate,
            failures = report.failures,
            "generation ranked"
        );
        Ok(report)
    }

    /// Advances up to `generations` times.  `after_each` runs between generations and
    /// may persist the population; returning `Ok(false)` stops the loop.
    pub fn run<F, Err>(
        &mut self,
        generations: usize,
        mut after_each: F,
    ) -> Result<Vec<GenerationReport>, Err>
    where
        F: FnMut(&Self, &GenerationReport) -> Result<bool, Err>,
        Err: From<EvolutionError>,
    {
        let mut reports = Vec::with_capacity(generations);
        for _ in 0..generations {
            let report = self.advance_generation()?;
            let proceed = after_each(&*self, &report)?;
            reports.push(report);
            if !proceed {
                break;
            }
        }
        Ok(reports)
    }

    /// Copies the current population, in its current order
    pub fn snapshot(&self) -> Snapshot<B::Model> {
        Snapshot {
            generation: self.generation,
            networks: self.population.iter().map(|g| g.network().clone()).collect(),
        }
    }

    /// Copies the first genome's model
    pub fn export_best(&self) -> Option<Export<B::Model>> {
        self.best().map(|g| Export {
            generation: self.generation,
            network: g.network().clone(),
        })
    }

    // Runs every evaluation to completion before any result is inspected
    fn evaluate(&mut self) -> Result<usize, EvolutionError> {
        let generation = self.generation;
        let results: Vec<Result<(), GenomeError>> = if self.config.parallel {
            self.population
                .par_iter_mut()
                .map(|g| g.run_evaluation(generation))
                .collect()
        } else {
            self.population
                .iter_mut()
                .map(|g| g.run_evaluation(generation))
                .collect()
        };

        let mut failures = 0;
        for (index, result) in results.into_iter().enumerate() {
            if let Err(source) = result {
                match self.config.on_failure {
                    FailurePolicy::Abort => {
                        return Err(EvolutionError::Genome {
                            index: index,
                            source: source,
                        })
                    }
                    FailurePolicy::Penalize => {
                        warn!(index = index, error = %source, "evaluation failed, genome penalized");
                        self.population[index].mark_failed();
                        failures += 1;
                    }
                }
            }
        }
        Ok(failures)
    }

    // Stable sort by descending score; returns the sorted scores
    fn rank(&mut self) -> Result<Vec<f32>, EvolutionError> {
        let mut scores = Vec::with_capacity(self.population.len());
        for (index, genome) in self.population.iter().enumerate() {
            let score = genome.score().map_err(|source| EvolutionError::Genome {
                index: index,
                source: source,
            })?;
            if score.is_nan() {
                return Err(EvolutionError::InvalidScore {
                    index: index,
                    score: score,
                });
            }
            scores.push(score);
        }

        let mut ranked: Vec<_> = scores.into_iter().zip(self.population.drain(..)).collect();
        ranked.sort_by_key(|(score, _)| Reverse(FloatOrd(*score)));

        let (scores, population): (Vec<f32>, Vec<_>) = ranked.into_iter().unzip();
        self.population = population;
        Ok(scores)
    }
}

/// Builds the next population from the previous ranking, in order: brand new
/// genomes, unmutated copies of the leaders, mutants of any member, then mutants of
/// the elite until the population is full.  `previous` must not be empty.
fn repopulate<B, E, R>(
    previous: &[Genome<B::Model, E::Handle>],
    builder: &B,
    environment: &E,
    config: &EvolutionConfig,
    mutation: &Mutation,
    rng: &mut R,
) -> Vec<Genome<B::Model, E::Handle>>
where
    B: Initializer,
    B::Model: WeightUpdater,
    E: Environment<B::Model>,
    R: Rng,
{
    let mut next = Vec::with_capacity(config.population_size);

    for _ in 0..config.random_add {
        next.push(Genome::with_environment(builder.build(rng), environment));
    }

    for genome in previous.iter().take(config.keep) {
        next.push(genome.clone_with(environment));
    }

    for _ in 0..config.random_mutate {
        let parent = &previous[rng.gen_range(0, previous.len())];
        next.push(parent.mutated_with(environment, mutation, rng));
    }

    // best_n may exceed the previous population; sample only what exists
    let elite = config.best_n.min(previous.len()).max(1);
    while next.len() < config.population_size {
        let parent = &previous[rng.gen_range(0, elite)];
        next.push(parent.mutated_with(environment, mutation, rng));
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Evaluation, Scoreable};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use thiserror::Error;

    #[derive(Clone, Debug, PartialEq)]
    struct Pair(f32, f32);

    impl WeightUpdater for Pair {
        fn num_weights(&self) -> usize {
            2
        }

        fn update_weights<F>(&mut self, f: &mut F)
        where
            F: FnMut(f32) -> f32,
        {
            self.0 = f(self.0);
            self.1 = f(self.1);
        }
    }

    struct PairBuilder;

    impl Initializer for PairBuilder {
        type Model = Pair;

        fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Pair {
            Pair(rng.gen_range(-1.0, 1.0), rng.gen_range(-1.0, 1.0))
        }
    }

    #[derive(Debug, Error)]
    #[error("refused to evaluate {0}")]
    struct Refused(f32);

    struct Sphere {
        score: Option<f32>,
        refuse_positive: bool,
        evaluations: Arc<AtomicUsize>,
    }

    impl Scoreable for Sphere {
        fn score(&self) -> Option<f32> {
            self.score
        }
    }

    impl Evaluation<Pair> for Sphere {
        type Error = Refused;

        fn run_evaluation(&mut self, model: &Pair, _generation: i64) -> Result<(), Refused> {
            self.evaluations.fetch_add(1, Ordering::SeqCst);
            if self.refuse_positive && model.0 > 0.0 {
                return Err(Refused(model.0));
            }
            self.score = Some(-(model.0.powi(2) + model.1.powi(2)));
            Ok(())
        }
    }

    // Maximizing the negated sphere function drives both genes to zero
    struct SphereEnv {
        refuse_positive: bool,
        evaluations: Arc<AtomicUsize>,
    }

    impl SphereEnv {
        fn new() -> Self {
            SphereEnv {
                refuse_positive: false,
                evaluations: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Environment<Pair> for SphereEnv {
        type Handle = Sphere;

        fn setup(&self) -> Sphere {
            Sphere {
                score: None,
                refuse_positive: self.refuse_positive,
                evaluations: self.evaluations.clone(),
            }
        }
    }

    struct MissingSource;

    #[derive(Debug, Error)]
    #[error("no snapshot found")]
    struct NotFound;

    impl SnapshotSource<Pair> for MissingSource {
        type Error = NotFound;

        fn load_snapshot(&self, _handle: Option<&str>) -> Result<Snapshot<Pair>, NotFound> {
            Err(NotFound)
        }
    }

    struct FixedSource(Snapshot<Pair>);

    impl SnapshotSource<Pair> for FixedSource {
        type Error = NotFound;

        fn load_snapshot(&self, handle: Option<&str>) -> Result<Snapshot<Pair>, NotFound> {
            match handle {
                None | Some("fixed") => Ok(self.0.clone()),
                Some(_) => Err(NotFound),
            }
        }
    }

    fn config() -> EvolutionConfig {
        let mut config = EvolutionConfig::default();
        config
            .set_population_size(10)
            .set_keep(2)
            .set_random_add(1)
            .set_random_mutate(1)
            .set_best_n(3)
            .set_seed(Some(1234));
        config
    }

    fn engine(config: EvolutionConfig) -> NeuroEvolution<PairBuilder, SphereEnv> {
        NeuroEvolution::new(config, PairBuilder, SphereEnv::new())
    }

    fn assert_descending(engine: &NeuroEvolution<PairBuilder, SphereEnv>) {
        let scores: Vec<f32> = engine
            .population()
            .iter()
            .map(|g| g.score().unwrap())
            .collect();
        for w in scores.windows(2) {
            assert!(w[0] >= w[1], "not sorted: {:?}", scores);
        }
    }

    #[test]
    fn test_learning_rate() {
        assert_eq!(learning_rate(0.5, 0.5, -1), 0.5);
        assert_eq!(learning_rate(0.5, 0.5, 0), 0.5);
        assert_eq!(learning_rate(0.5, 0.5, 2), 0.125);
    }

    #[test]
    fn test_first_advance_only_evaluates() {
        let mut engine = engine(config());
        engine.setup_from_scratch().unwrap();
        assert_eq!(engine.generation(), -1);
        let before = engine.snapshot().networks;

        let report = engine.advance_generation().unwrap();
        assert_eq!(report.generation, 0);
        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.population().len(), 10);
        assert_eq!(engine.environment().evaluations.load(Ordering::SeqCst), 10);

        // Same models, only reordered
        for genome in engine.population() {
            assert!(before.contains(genome.network()));
        }
        assert_descending(&engine);
        assert_eq!(report.highscore, engine.best().unwrap().score().unwrap());
    }

    #[test]
    fn test_generations_stay_sized_and_sorted() {
        let mut engine = engine(config());
        engine.setup_from_scratch().unwrap();
        let mut last_best = std::f32::NEG_INFINITY;
        for gen in 0..20 {
            let report = engine.advance_generation().unwrap();
            assert_eq!(report.generation, gen);
            assert_eq!(engine.population().len(), 10);
            assert_descending(&engine);
            assert!(report.highscore >= report.mean && report.mean >= report.lowest);
            // Kept leaders are re-evaluated deterministically, so the best never regresses
            assert!(report.highscore >= last_best);
            last_best = report.highscore;
        }
    }

    #[test]
    fn test_repopulation_layout() {
        let mut config = config();
        config.set_mutation_chance(1.0);
        let mut engine = engine(config);
        engine.setup_from_scratch().unwrap();
        engine.advance_generation().unwrap();
        assert_eq!(engine.config().rest().unwrap(), 6);

        let leaders: Vec<Pair> = engine
            .population()
            .iter()
            .take(2)
            .map(|g| g.network().clone())
            .collect();
        let mutation = Mutation::new(0.1, 1.0);
        let next = repopulate(
            &engine.population,
            &engine.builder,
            &engine.environment,
            &engine.config,
            &mutation,
            &mut engine.rng,
        );
        assert_eq!(next.len(), 10);
        // random_add comes first, then the unmutated leaders with fresh handles
        assert_eq!(next[1].network(), &leaders[0]);
        assert_eq!(next[2].network(), &leaders[1]);
        assert!(next[1].handle().unwrap().score().is_none());
        // Everything after the leaders is a mutant
        for genome in &next[3..] {
            assert!(!leaders.contains(genome.network()));
        }
    }

    #[test]
    fn test_elite_larger_than_population() {
        let mut config = config();
        config.set_best_n(100);
        let mut engine = engine(config);
        engine.setup_from_scratch().unwrap();
        for _ in 0..3 {
            engine.advance_generation().unwrap();
        }
        assert_eq!(engine.population().len(), 10);
    }

    #[test]
    fn test_quotas_fail_without_advancing() {
        let mut engine = engine(config());
        engine.setup_from_scratch().unwrap();
        engine.advance_generation().unwrap();
        let before = engine.snapshot();

        engine.config_mut().set_keep(5).set_random_add(5);
        match engine.advance_generation() {
            Err(EvolutionError::Config(ConfigError::QuotasExceedPopulation { .. })) => (),
            other => panic!("unexpected {:?}", other.map(|r| r.generation)),
        }
        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_setup_twice_fails() {
        let mut engine = engine(config());
        assert!(matches!(
            engine.advance_generation(),
            Err(EvolutionError::NotPopulated)
        ));
        engine.setup_from_scratch().unwrap();
        assert!(matches!(
            engine.setup_from_scratch(),
            Err(EvolutionError::Config(ConfigError::AlreadyPopulated))
        ));
        let snapshot = Snapshot {
            generation: 0,
            networks: vec![Pair(0., 0.)],
        };
        assert!(matches!(
            engine.setup_from_snapshot(snapshot),
            Err(EvolutionError::Config(ConfigError::AlreadyPopulated))
        ));
    }

    #[test]
    fn test_snapshot_is_padded_and_resumed() {
        let mut engine = engine(config());
        let snapshot = Snapshot {
            generation: 4,
            networks: vec![Pair(0.1, 0.1), Pair(0.2, 0.2), Pair(0.3, 0.3)],
        };
        engine.setup_from_snapshot(snapshot).unwrap();
        assert_eq!(engine.generation(), 4);
        assert_eq!(engine.population().len(), 10);
        assert_eq!(engine.population()[0].network(), &Pair(0.1, 0.1));

        let report = engine.advance_generation().unwrap();
        assert_eq!(report.generation, 5);
        assert_eq!(engine.population().len(), 10);
        assert_eq!(report.learning_rate, learning_rate(0.5, 0.99, 5));
    }

    #[test]
    fn test_snapshot_is_truncated() {
        let mut engine = engine(config());
        let snapshot = Snapshot {
            generation: 1,
            networks: vec![Pair(0.5, 0.5); 25],
        };
        engine.setup_from_snapshot(snapshot).unwrap();
        assert_eq!(engine.population().len(), 10);
    }

    #[test]
    fn test_first_generation_follows_resized_config() {
        let mut engine = engine(config());
        engine.setup_from_scratch().unwrap();
        engine.config_mut().set_population_size(20);
        engine.advance_generation().unwrap();
        assert_eq!(engine.population().len(), 20);
        assert_eq!(engine.environment().evaluations.load(Ordering::SeqCst), 20);
        assert_descending(&engine);

        let mut engine = self::engine(config());
        engine.setup_from_scratch().unwrap();
        engine.config_mut().set_population_size(6);
        engine.advance_generation().unwrap();
        assert_eq!(engine.population().len(), 6);
        assert_eq!(engine.environment().evaluations.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_generation_overflow() {
        let mut engine = engine(config());
        let snapshot = Snapshot {
            generation: i64::max_value(),
            networks: vec![Pair(0.5, 0.5); 10],
        };
        engine.setup_from_snapshot(snapshot).unwrap();
        let before = engine.snapshot();
        match engine.advance_generation() {
            Err(EvolutionError::GenerationOverflow(g)) => assert_eq!(g, i64::max_value()),
            other => panic!("unexpected {:?}", other.map(|r| r.generation)),
        }
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_setup_auto() {
        let mut engine = engine(config());
        engine.setup_auto(&MissingSource).unwrap();
        assert!(engine.is_populated());
        assert_eq!(engine.generation(), -1);
        assert_eq!(engine.population().len(), 10);

        let source = FixedSource(Snapshot {
            generation: 7,
            networks: vec![Pair(0., 0.); 10],
        });
        let mut engine = self::engine(config());
        engine.setup_auto(&source).unwrap();
        assert_eq!(engine.generation(), 7);

        let mut engine = self::engine(config());
        assert!(matches!(
            engine.setup_from_source(&source, Some("other")),
            Err(EvolutionError::Snapshot(_))
        ));
        assert!(!engine.is_populated());
        engine.setup_from_source(&source, Some("fixed")).unwrap();
        assert_eq!(engine.generation(), 7);
    }

    fn refusing_engine(policy: FailurePolicy) -> NeuroEvolution<PairBuilder, SphereEnv> {
        let mut config = config();
        config.set_on_failure(policy);
        let env = SphereEnv {
            refuse_positive: true,
            evaluations: Arc::new(AtomicUsize::new(0)),
        };
        let mut engine = NeuroEvolution::new(config, PairBuilder, env);
        let networks = (0..10)
            .map(|i| Pair(i as f32 - 4.5, 0.))
            .collect::<Vec<_>>();
        engine
            .setup_from_snapshot(Snapshot {
                generation: -1,
                networks: networks,
            })
            .unwrap();
        engine
    }

    #[test]
    fn test_failure_aborts() {
        let mut engine = refusing_engine(FailurePolicy::Abort);
        match engine.advance_generation() {
            Err(EvolutionError::Genome {
                index: 5,
                source: GenomeError::Evaluation(_),
            }) => (),
            other => panic!("unexpected {:?}", other.map(|r| r.generation)),
        }
    }

    #[test]
    fn test_failure_penalized() {
        let mut engine = refusing_engine(FailurePolicy::Penalize);
        let report = engine.advance_generation().unwrap();
        assert_eq!(report.failures, 5);
        assert_eq!(report.lowest, std::f32::NEG_INFINITY);
        assert!(report.mean.is_finite());
        for genome in &engine.population()[..5] {
            assert!(!genome.failed());
            assert!(genome.network().0 < 0.0);
        }
        for genome in &engine.population()[5..] {
            assert!(genome.failed());
        }
        // Stable: penalized genomes keep their relative order
        let tail: Vec<f32> = engine.population()[5..]
            .iter()
            .map(|g| g.network().0)
            .collect();
        assert_eq!(tail, vec![0.5, 1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let mut a = config();
        a.set_parallel(false);
        let mut b = config();
        b.set_parallel(true);
        let mut sequential = engine(a);
        let mut parallel = engine(b);
        sequential.setup_from_scratch().unwrap();
        parallel.setup_from_scratch().unwrap();
        for _ in 0..5 {
            let ra = sequential.advance_generation().unwrap();
            let rb = parallel.advance_generation().unwrap();
            assert_eq!(ra, rb);
        }
        assert_eq!(sequential.snapshot(), parallel.snapshot());
    }

    #[test]
    fn test_run_stops_when_asked() {
        let mut engine = engine(config());
        engine.setup_from_scratch().unwrap();
        let mut seen = Vec::new();
        let reports = engine
            .run::<_, EvolutionError>(10, |e, report| {
                seen.push(e.generation());
                Ok(report.generation < 2)
            })
            .unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(seen, vec![0, 1, 2]);

        let export = engine.export_best().unwrap();
        assert_eq!(export.generation, 2);
        assert_eq!(&export.network, engine.best().unwrap().network());
    }
}
