//! Engine hyperparameters.  Nothing here is recomputed by the engine; a control
//! surface may change any field between generations.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::ConfigError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
/// What to do when a single genome's evaluation fails
pub enum FailurePolicy {
    /// Abort the generation with the genome's error
    Abort,

    /// Log the failure and rank the genome last with a score of negative infinity
    Penalize,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Abort
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
/// Settings for the evolution engine
pub struct EvolutionConfig {
    /// Mutation bound at generation zero
    pub learning_rate_base: f32,

    /// Geometric decay applied to the mutation bound each generation
    pub learning_rate_factor: f32,

    /// Probability that a single bias or weight is perturbed
    pub mutation_chance: f32,

    /// Number of genomes after each repopulation
    pub population_size: usize,

    /// Top genomes carried over unmutated
    pub keep: usize,

    /// Brand new genomes injected each generation
    pub random_add: usize,

    /// Mutants of genomes drawn from the whole previous population
    pub random_mutate: usize,

    /// Size of the elite the remaining mutants are drawn from
    pub best_n: usize,

    /// Seed for the engine's random stream.  Unseeded engines draw one from the OS.
    pub seed: Option<u64>,

    /// Evaluate genomes on the rayon pool
    pub parallel: bool,

    /// Handling of failed evaluations
    pub on_failure: FailurePolicy,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        EvolutionConfig {
            learning_rate_base: 0.5,
            learning_rate_factor: 0.99,
            mutation_chance: 0.2,
            population_size: 50,
            keep: 5,
            random_add: 5,
            random_mutate: 10,
            best_n: 10,
            seed: None,
            parallel: true,
            on_failure: FailurePolicy::Abort,
        }
    }
}

impl EvolutionConfig {
    /// Reads a JSON config.  Missing fields take their default values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let f = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(f))?)
    }

    /// Number of genomes bred from the elite:
    /// `population_size - keep - random_add - random_mutate`
    pub fn rest(&self) -> Result<usize, ConfigError> {
        let fixed = self
            .keep
            .saturating_add(self.random_add)
            .saturating_add(self.random_mutate);
        self.population_size
            .checked_sub(fixed)
            .ok_or(ConfigError::QuotasExceedPopulation {
                keep: self.keep,
                random_add: self.random_add,
                random_mutate: self.random_mutate,
                population_size: self.population_size,
            })
    }

    /// Checks the whole config, returning `rest` on success
    pub fn validate(&self) -> Result<usize, ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }

        let base = self.learning_rate_base;
        let factor = self.learning_rate_factor;
        if !(base.is_finite() && base >= 0.0 && factor.is_finite() && factor > 0.0) {
            return Err(ConfigError::InvalidLearningRate {
                base: base,
                factor: factor,
            });
        }

        if !(self.mutation_chance >= 0.0 && self.mutation_chance <= 1.0) {
            return Err(ConfigError::InvalidMutationChance(self.mutation_chance));
        }

        let rest = self.rest()?;
        if rest > 0 && self.best_n == 0 {
            return Err(ConfigError::EmptyElite { rest: rest });
        }
        Ok(rest)
    }

    /// Sets the mutation bound at generation zero
    pub fn set_learning_rate_base(&mut self, value: f32) -> &mut Self {
        self.learning_rate_base = value;
        self
    }

    /// Sets the per generation decay of the mutation bound
    pub fn set_learning_rate_factor(&mut self, value: f32) -> &mut Self {
        self.learning_rate_factor = value;
        self
    }

    /// Sets the per parameter mutation probability
    pub fn set_mutation_chance(&mut self, value: f32) -> &mut Self {
        self.mutation_chance = value;
        self
    }

    /// Sets the population size
    pub fn set_population_size(&mut self, value: usize) -> &mut Self {
        self.population_size = value;
        self
    }

    /// Sets the number of unmutated carry-overs
    pub fn set_keep(&mut self, value: usize) -> &mut Self {
        self.keep = value;
        self
    }

    /// Sets the number of brand new genomes per generation
    pub fn set_random_add(&mut self, value: usize) -> &mut Self {
        self.random_add = value;
        self
    }

    /// Sets the number of mutants drawn from the whole population
    pub fn set_random_mutate(&mut self, value: usize) -> &mut Self {
        self.random_mutate = value;
        self
    }

    /// Sets the elite size
    pub fn set_best_n(&mut self, value: usize) -> &mut Self {
        self.best_n = value;
        self
    }

    /// Sets or clears the seed.  Only read when an engine is created.
    pub fn set_seed(&mut self, value: Option<u64>) -> &mut Self {
        self.seed = value;
        self
    }

    /// Enables or disables parallel evaluation
    pub fn set_parallel(&mut self, value: bool) -> &mut Self {
        self.parallel = value;
        self
    }

    /// Sets the failure policy
    pub fn set_on_failure(&mut self, value: FailurePolicy) -> &mut Self {
        self.on_failure = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_rest() {
        let mut config = EvolutionConfig::default();
        config
            .set_population_size(10)
            .set_keep(2)
            .set_random_add(1)
            .set_random_mutate(1)
            .set_best_n(3);
        assert_eq!(config.rest().unwrap(), 6);
        assert_eq!(config.validate().unwrap(), 6);
        assert_eq!(
            config.keep + config.random_add + config.random_mutate + config.rest().unwrap(),
            config.population_size
        );
    }

    #[test]
    fn test_quotas_exceeding_population() {
        let mut config = EvolutionConfig::default();
        config.set_population_size(10).set_keep(4).set_random_add(4).set_random_mutate(3);
        match config.validate() {
            Err(ConfigError::QuotasExceedPopulation {
                population_size: 10,
                ..
            }) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_values() {
        let mut config = EvolutionConfig::default();
        config.set_mutation_chance(1.5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMutationChance(_))
        ));

        let mut config = EvolutionConfig::default();
        config.set_learning_rate_factor(0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLearningRate { .. })
        ));

        let mut config = EvolutionConfig::default();
        config.set_best_n(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyElite { rest: 30 })
        ));

        // An empty elite is fine when nothing is bred from it
        config.set_population_size(20);
        assert_eq!(config.validate().unwrap(), 0);

        config.set_population_size(0);
        assert!(matches!(config.validate(), Err(ConfigError::EmptyPopulation)));
    }

    #[test]
    fn test_partial_json() {
        let config: EvolutionConfig = serde_json::from_str(
            r#"{"population_size": 20, "keep": 1, "on_failure": "Penalize", "seed": 5}"#,
        )
        .unwrap();
        assert_eq!(config.population_size, 20);
        assert_eq!(config.keep, 1);
        assert_eq!(config.on_failure, FailurePolicy::Penalize);
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.best_n, EvolutionConfig::default().best_n);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut f = File::create(&path).unwrap();
        write!(f, r#"{{"mutation_chance": 0.05, "parallel": false}}"#).unwrap();
        drop(f);

        let config = EvolutionConfig::from_json_file(&path).unwrap();
        assert_eq!(config.mutation_chance, 0.05);
        assert!(!config.parallel);

        assert!(matches!(
            EvolutionConfig::from_json_file(dir.path().join("missing.json")),
            Err(ConfigError::Read(_))
        ));
    }
}
