//! # Statistics
//!
//! Running statistics of an evolution: per-generation score aggregates, online and offline
//! performance, the all-time extremes, a convergence ratio over a sliding window of best
//! scores, and an archive of the best genomes ever seen.
//!
//! Snapshots of the population's scores are taken every `score_frequency` generations
//! and buffered. Once `flush_frequency` snapshots are buffered they are handed to the
//! [`ScoreLog`] sink; with a flush frequency of `0` nothing is buffered.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gaforge::genome::{BinaryString, Genome};
//! use gaforge::population::Population;
//! use gaforge::rng::RandomNumberGenerator;
//! use gaforge::statistics::Statistics;
//!
//! let prototype = Genome::new(BinaryString::new(8))
//!     .with_evaluator(Arc::new(|g: &Genome<BinaryString>| {
//!         Ok(g.chromosome().count_ones() as f32)
//!     }));
//! let mut rng = RandomNumberGenerator::from_seed(4);
//! let mut population = Population::with_size(&prototype, 6);
//! population.initialize(&mut rng);
//! population.evaluate(true).unwrap();
//!
//! let mut stats = Statistics::new();
//! stats.set_best_genomes(&prototype, 2, &mut rng).unwrap();
//! stats.reset(&mut population).unwrap();
//! stats.update(&mut population).unwrap();
//!
//! assert_eq!(stats.generation(), 1);
//! assert_eq!(stats.best_individual(0).unwrap().cached_score(), stats.max_ever());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::BitOr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::{absorb, report, GeneticError, Result, ResultExt};
use crate::genome::{Chromosome, Genome};
use crate::population::Population;
use crate::rng::RandomNumberGenerator;
use crate::selection::{SortBasis, SortOrder};

pub const DEFAULT_SCORE_FREQUENCY: usize = 1;
pub const DEFAULT_STEADY_STATE_SCORE_FREQUENCY: usize = 100;
pub const DEFAULT_FLUSH_FREQUENCY: usize = 0;
pub const DEFAULT_SCORE_FILENAME: &str = "generations.dat";
pub const DEFAULT_CONVERGENCE_WINDOW: usize = 10;

/// The columns of a score record written to the score log.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScoreFlags(u8);

impl ScoreFlags {
    pub const NONE: ScoreFlags = ScoreFlags(0x00);
    pub const MEAN: ScoreFlags = ScoreFlags(0x01);
    pub const MAXIMUM: ScoreFlags = ScoreFlags(0x02);
    pub const MINIMUM: ScoreFlags = ScoreFlags(0x04);
    pub const DEVIATION: ScoreFlags = ScoreFlags(0x08);
    pub const DIVERSITY: ScoreFlags = ScoreFlags(0x10);
    pub const ALL: ScoreFlags = ScoreFlags(0xff);

    pub fn from_bits(bits: u8) -> Self {
        ScoreFlags(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: ScoreFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for ScoreFlags {
    fn default() -> Self {
        ScoreFlags::MAXIMUM
    }
}

impl BitOr for ScoreFlags {
    type Output = ScoreFlags;

    fn bitor(self, rhs: ScoreFlags) -> ScoreFlags {
        ScoreFlags(self.0 | rhs.0)
    }
}

/// Score aggregates of one generation. `diversity` is `-1` when it was not recorded.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRecord {
    pub generation: usize,
    pub mean: f32,
    pub max: f32,
    pub min: f32,
    pub deviation: f32,
    pub diversity: f32,
}

impl Default for ScoreRecord {
    fn default() -> Self {
        Self {
            generation: 0,
            mean: 0.0,
            max: 0.0,
            min: 0.0,
            deviation: 0.0,
            diversity: -1.0,
        }
    }
}

impl ScoreRecord {
    /// The generation followed by the selected columns, tab separated.
    pub fn format(&self, columns: ScoreFlags) -> String {
        let mut line = self.generation.to_string();
        let fields = [
            (ScoreFlags::MEAN, self.mean),
            (ScoreFlags::MAXIMUM, self.max),
            (ScoreFlags::MINIMUM, self.min),
            (ScoreFlags::DEVIATION, self.deviation),
            (ScoreFlags::DIVERSITY, self.diversity),
        ];
        for (flag, value) in fields {
            if columns.contains(flag) {
                line.push('\t');
                line.push_str(&value.to_string());
            }
        }
        line
    }
}

/// Destination of flushed score records.
pub trait ScoreLog: fmt::Debug + Send {
    fn write(&mut self, records: &[ScoreRecord], columns: ScoreFlags) -> Result<()>;
}

/// Emits one `info` event per record under the `gaforge::scores` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingScoreLog;

impl ScoreLog for TracingScoreLog {
    fn write(&mut self, records: &[ScoreRecord], columns: ScoreFlags) -> Result<()> {
        for record in records {
            tracing::info!(target: "gaforge::scores", "{}", record.format(columns));
        }
        Ok(())
    }
}

/// Keeps every record in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreLog {
    records: Arc<Mutex<Vec<ScoreRecord>>>,
}

impl MemoryScoreLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ScoreRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ScoreLog for MemoryScoreLog {
    fn write(&mut self, records: &[ScoreRecord], _columns: ScoreFlags) -> Result<()> {
        let mut buffer = self
            .records
            .lock()
            .map_err(|_| GeneticError::Other("score buffer lock poisoned".to_string()))?;
        buffer.extend_from_slice(records);
        Ok(())
    }
}

/// Writes one formatted line per record.
pub struct WriterScoreLog<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> WriterScoreLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterScoreLog<BufWriter<File>> {
    /// A log writing to a newly created file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).context(format!("creating {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> fmt::Debug for WriterScoreLog<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterScoreLog").finish_non_exhaustive()
    }
}

impl<W: Write + Send> ScoreLog for WriterScoreLog<W> {
    fn write(&mut self, records: &[ScoreRecord], columns: ScoreFlags) -> Result<()> {
        for record in records {
            writeln!(self.writer, "{}", record.format(columns))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Statistics of an evolution run.
pub struct Statistics<C: Chromosome> {
    generation: usize,
    pub(crate) selections: usize,
    pub(crate) crossovers: usize,
    pub(crate) mutations: usize,
    pub(crate) replacements: usize,
    pub(crate) evaluations: usize,
    pop_evaluations: usize,

    score_frequency: usize,
    flush_frequency: usize,
    columns: ScoreFlags,
    record_diversity: bool,
    score_filename: String,

    max_ever: f32,
    min_ever: f32,
    online: f32,
    offline_max: f32,
    offline_min: f32,
    initial: ScoreRecord,
    current: ScoreRecord,

    window: usize,
    best_scores: VecDeque<f32>,
    buffer: Vec<ScoreRecord>,
    archive: Option<Population<C>>,
    log: Box<dyn ScoreLog>,
}

impl<C: Chromosome> Statistics<C> {
    pub fn new() -> Self {
        Self {
            generation: 0,
            selections: 0,
            crossovers: 0,
            mutations: 0,
            replacements: 0,
            evaluations: 0,
            pop_evaluations: 0,
            score_frequency: DEFAULT_SCORE_FREQUENCY,
            flush_frequency: DEFAULT_FLUSH_FREQUENCY,
            columns: ScoreFlags::default(),
            record_diversity: false,
            score_filename: DEFAULT_SCORE_FILENAME.to_string(),
            max_ever: 0.0,
            min_ever: 0.0,
            online: 0.0,
            offline_max: 0.0,
            offline_min: 0.0,
            initial: ScoreRecord::default(),
            current: ScoreRecord::default(),
            window: DEFAULT_CONVERGENCE_WINDOW,
            best_scores: VecDeque::with_capacity(DEFAULT_CONVERGENCE_WINDOW),
            buffer: Vec::new(),
            archive: None,
            log: Box::new(TracingScoreLog),
        }
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn selections(&self) -> usize {
        self.selections
    }

    pub fn crossovers(&self) -> usize {
        self.crossovers
    }

    pub fn mutations(&self) -> usize {
        self.mutations
    }

    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// Individual evaluations since the last reset.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Population evaluations since the last reset.
    pub fn population_evaluations(&self) -> usize {
        self.pop_evaluations
    }

    /// Average of the mean score over all generations.
    pub fn online(&self) -> f32 {
        self.online
    }

    /// Average of the best score over all generations.
    pub fn offline_max(&self) -> f32 {
        self.offline_max
    }

    /// Average of the worst score over all generations.
    pub fn offline_min(&self) -> f32 {
        self.offline_min
    }

    pub fn max_ever(&self) -> f32 {
        self.max_ever
    }

    pub fn min_ever(&self) -> f32 {
        self.min_ever
    }

    /// Aggregates of the population passed to the last [`reset`](Statistics::reset).
    pub fn initial(&self) -> ScoreRecord {
        self.initial
    }

    /// Aggregates of the population passed to the last update.
    pub fn current(&self) -> ScoreRecord {
        self.current
    }

    /// Ratio of the oldest to the newest best score in the window, once the window is
    /// full. `0` before that, and when the newest best score is `0`.
    pub fn convergence(&self) -> f32 {
        if self.best_scores.len() < self.window {
            return 0.0;
        }
        match (self.best_scores.front(), self.best_scores.back()) {
            (Some(&oldest), Some(&newest)) if newest != 0.0 => {
                (oldest as f64 / newest as f64) as f32
            }
            _ => 0.0,
        }
    }

    pub fn convergence_window(&self) -> usize {
        self.window
    }

    /// Resizes the window of best scores, keeping the newest ones. `0` counts as `1`.
    pub fn set_convergence_window(&mut self, window: usize) {
        let window = window.max(1);
        while self.best_scores.len() > window {
            self.best_scores.pop_front();
        }
        self.window = window;
    }

    fn push_best_score(&mut self, score: f32) {
        if self.best_scores.len() == self.window {
            self.best_scores.pop_front();
        }
        self.best_scores.push_back(score);
    }

    pub fn score_frequency(&self) -> usize {
        self.score_frequency
    }

    /// Record a snapshot every `frequency` generations; `0` never records.
    pub fn set_score_frequency(&mut self, frequency: usize) {
        self.score_frequency = frequency;
    }

    pub fn flush_frequency(&self) -> usize {
        self.flush_frequency
    }

    /// Buffer up to `frequency` snapshots before writing them out. Shrinking below the
    /// number already buffered writes them first.
    pub fn set_flush_frequency(&mut self, frequency: usize) -> Result<()> {
        if self.buffer.len() > frequency {
            self.flush_scores()?;
        }
        self.flush_frequency = frequency;
        Ok(())
    }

    pub fn score_columns(&self) -> ScoreFlags {
        self.columns
    }

    pub fn set_score_columns(&mut self, columns: ScoreFlags) {
        self.columns = columns;
    }

    pub fn records_diversity(&self) -> bool {
        self.record_diversity
    }

    pub fn set_record_diversity(&mut self, record: bool) {
        self.record_diversity = record;
    }

    pub fn score_filename(&self) -> &str {
        &self.score_filename
    }

    pub fn set_score_filename(&mut self, name: impl Into<String>) {
        self.score_filename = name.into();
    }

    pub fn set_score_log(&mut self, log: Box<dyn ScoreLog>) {
        self.log = log;
    }

    /// Snapshots waiting to be written.
    pub fn buffered(&self) -> &[ScoreRecord] {
        &self.buffer
    }

    /// Writes the buffered snapshots to the score log.
    pub fn flush_scores(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let result = self.log.write(&self.buffer, self.columns);
        self.buffer.clear();
        result
    }

    /// Sizes the archive of best genomes. `0` drops it; a new archive is shaped like
    /// `prototype`.
    pub fn set_best_genomes(
        &mut self,
        prototype: &Genome<C>,
        n: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<()> {
        if n == 0 {
            self.archive = None;
            return Ok(());
        }
        match &mut self.archive {
            Some(archive) => {
                archive.set_size(n, rng)?;
            }
            None => self.archive = Some(Population::with_size(prototype, n)),
        }
        Ok(())
    }

    pub fn n_best_genomes(&self) -> usize {
        self.archive.as_ref().map_or(0, |a| a.len())
    }

    pub fn best_population(&self) -> Option<&Population<C>> {
        self.archive.as_ref()
    }

    /// The `rank`-th best genome seen so far. An out-of-range rank is reported and the
    /// best genome returned instead.
    pub fn best_individual(&mut self, rank: usize) -> Result<&Genome<C>> {
        let archive = self
            .archive
            .as_mut()
            .ok_or(GeneticError::EmptyPopulation)?;
        let rank = if rank >= archive.len() {
            report(&GeneticError::OutOfBounds(format!(
                "archive rank {} of {}",
                rank,
                archive.len()
            )));
            0
        } else {
            rank
        };
        archive.best(rank, SortBasis::Raw)
    }

    fn snapshot(&self, population: &mut Population<C>) -> Result<ScoreRecord> {
        let stats = population.raw_stats()?;
        let diversity = if self.record_diversity {
            population.diversity()
        } else {
            -1.0
        };
        Ok(ScoreRecord {
            generation: self.generation,
            mean: stats.ave,
            max: stats.max,
            min: stats.min,
            deviation: stats.dev,
            diversity,
        })
    }

    fn leading_score(population: &mut Population<C>) -> Result<f32> {
        let stats = population.raw_stats()?;
        Ok(match population.order() {
            SortOrder::HighIsBest => stats.max,
            SortOrder::LowIsBest => stats.min,
        })
    }

    /// Starts a run: counters are zeroed, the initial snapshot is taken, and the archive
    /// is seeded with the population's best genomes.
    pub fn reset(&mut self, population: &mut Population<C>) -> Result<()> {
        self.generation = 0;
        self.selections = 0;
        self.crossovers = 0;
        self.mutations = 0;
        self.replacements = 0;
        self.evaluations = 0;
        self.buffer.clear();

        let record = self.snapshot(population)?;
        self.current = record;
        self.initial = record;
        if self.flush_frequency > 0 {
            self.buffer.push(record);
            absorb(self.flush_scores())?;
        }

        self.best_scores.clear();
        self.push_best_score(Self::leading_score(population)?);
        self.seed_archive(population)?;

        self.max_ever = record.max;
        self.min_ever = record.min;
        self.online = record.mean;
        self.offline_max = record.max;
        self.offline_min = record.min;
        self.pop_evaluations = population.nevals();
        self.evaluations = population.iter().map(|g| g.nevals()).sum();
        Ok(())
    }

    /// Accounts for one more generation of `population`.
    pub fn update(&mut self, population: &mut Population<C>) -> Result<()> {
        self.generation += 1;
        let record = self.snapshot(population)?;
        self.current = record;
        if self.score_frequency > 0
            && self.generation % self.score_frequency == 0
            && self.flush_frequency > 0
        {
            self.buffer.push(record);
        }
        if self.flush_frequency > 0 && self.buffer.len() >= self.flush_frequency {
            absorb(self.flush_scores())?;
        }

        self.max_ever = self.max_ever.max(record.max);
        self.min_ever = self.min_ever.min(record.min);
        let g = self.generation as f32;
        self.online = (self.online * (g - 1.0) + record.mean) / g;
        self.offline_max = (self.offline_max * (g - 1.0) + record.max) / g;
        self.offline_min = (self.offline_min * (g - 1.0) + record.min) / g;

        self.push_best_score(Self::leading_score(population)?);
        self.update_archive(population)?;
        self.pop_evaluations = population.nevals();
        Ok(())
    }

    fn seed_archive(&mut self, population: &mut Population<C>) -> Result<()> {
        let Some(archive) = self.archive.as_mut() else {
            return Ok(());
        };
        if population.is_empty() {
            return Ok(());
        }
        archive.set_order(population.order());
        let last = population.len() - 1;
        for i in 0..archive.len() {
            let source = population.best(i.min(last), SortBasis::Raw)?;
            if let Some(slot) = archive.individual_mut(i, SortBasis::Raw) {
                slot.copy_from(source);
            }
        }
        archive.sort(true, SortBasis::Raw)
    }

    fn update_archive(&mut self, population: &mut Population<C>) -> Result<()> {
        let Some(archive) = self.archive.as_mut() else {
            return Ok(());
        };
        if archive.is_empty() || population.is_empty() {
            return Ok(());
        }
        let order = population.order();
        archive.set_order(order);

        if archive.len() == 1 {
            let best = population.best(0, SortBasis::Raw)?;
            if order.is_better(best.cached_score(), archive.best(0, SortBasis::Raw)?.cached_score())
            {
                if let Some(slot) = archive.individual_mut(0, SortBasis::Raw) {
                    slot.copy_from(best);
                }
            }
            return Ok(());
        }

        let size = archive.len();
        for i in 0..population.len() {
            let candidate = population.best(i, SortBasis::Raw)?;
            let score = candidate.cached_score();
            if !order.is_better(score, archive.worst(0, SortBasis::Raw)?.cached_score()) {
                break;
            }
            let mut k = 0;
            while k < size && order.is_better(archive.best(k, SortBasis::Raw)?.cached_score(), score)
            {
                k += 1;
            }
            for j in k..size {
                let member = archive.best(j, SortBasis::Raw)?;
                if member.identity() == candidate.identity() {
                    break;
                }
                if order.is_better(score, member.cached_score()) {
                    if let Some(slot) = archive.individual_mut(size - 1, SortBasis::Raw) {
                        slot.copy_from(candidate);
                    }
                    archive.sort(true, SortBasis::Raw)?;
                    break;
                }
            }
        }
        Ok(())
    }
}

impl<C: Chromosome> Default for Statistics<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Chromosome> fmt::Debug for Statistics<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statistics")
            .field("generation", &self.generation)
            .field("current", &self.current)
            .field("max_ever", &self.max_ever)
            .field("min_ever", &self.min_ever)
            .field("convergence", &self.convergence())
            .field("archive", &self.n_best_genomes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::BinaryString;

    fn scored(scores: &[f32]) -> Population<BinaryString> {
        Population::from_genomes(
            scores
                .iter()
                .map(|&s| {
                    let mut g = Genome::new(BinaryString::new(4));
                    g.set_score(s);
                    g
                })
                .collect(),
        )
    }

    fn set_scores(population: &mut Population<BinaryString>, scores: &[f32]) {
        for (i, &s) in scores.iter().enumerate() {
            let genome = population.individual_mut(i, SortBasis::Raw).unwrap();
            genome.chromosome_mut();
            genome.set_score(s);
        }
    }

    #[test]
    fn test_score_flags() {
        let flags = ScoreFlags::MEAN | ScoreFlags::MINIMUM;
        assert!(flags.contains(ScoreFlags::MEAN));
        assert!(!flags.contains(ScoreFlags::MAXIMUM));
        assert!(ScoreFlags::ALL.contains(flags));
        assert_eq!(ScoreFlags::default(), ScoreFlags::MAXIMUM);
    }

    #[test]
    fn test_record_format() {
        let record = ScoreRecord {
            generation: 3,
            mean: 1.5,
            max: 2.0,
            min: 1.0,
            deviation: 0.5,
            diversity: -1.0,
        };
        assert_eq!(record.format(ScoreFlags::MAXIMUM), "3\t2");
        assert_eq!(
            record.format(ScoreFlags::MEAN | ScoreFlags::DEVIATION),
            "3\t1.5\t0.5"
        );
    }

    #[test]
    fn test_reset_and_running_averages() {
        let mut population = scored(&[1.0, 3.0]);
        let mut stats = Statistics::new();
        stats.reset(&mut population).unwrap();
        assert_eq!(stats.initial().max, 3.0);
        assert_eq!(stats.online(), 2.0);

        set_scores(&mut population, &[5.0, 7.0]);
        stats.update(&mut population).unwrap();
        assert_eq!(stats.generation(), 1);
        assert_eq!(stats.max_ever(), 7.0);
        assert_eq!(stats.min_ever(), 1.0);
        assert_eq!(stats.online(), 6.0);
        assert_eq!(stats.offline_max(), 7.0);
        assert_eq!(stats.current().mean, 6.0);
    }

    #[test]
    fn test_convergence_needs_full_window() {
        let mut population = scored(&[2.0]);
        let mut stats = Statistics::new();
        stats.set_convergence_window(3);
        stats.reset(&mut population).unwrap();
        assert_eq!(stats.convergence(), 0.0);

        set_scores(&mut population, &[3.0]);
        stats.update(&mut population).unwrap();
        assert_eq!(stats.convergence(), 0.0);

        set_scores(&mut population, &[4.0]);
        stats.update(&mut population).unwrap();
        assert_eq!(stats.convergence(), 0.5);

        set_scores(&mut population, &[0.0]);
        stats.update(&mut population).unwrap();
        assert_eq!(stats.convergence(), 0.0);
    }

    #[test]
    fn test_buffer_flushes_when_full() {
        let log = MemoryScoreLog::new();
        let mut population = scored(&[1.0, 2.0]);
        let mut stats = Statistics::new();
        stats.set_score_log(Box::new(log.clone()));
        stats.set_flush_frequency(2).unwrap();
        stats.reset(&mut population).unwrap();
        assert_eq!(log.records().len(), 1);

        stats.update(&mut population).unwrap();
        assert_eq!(stats.buffered().len(), 1);
        stats.update(&mut population).unwrap();
        assert!(stats.buffered().is_empty());
        let generations: Vec<usize> = log.records().iter().map(|r| r.generation).collect();
        assert_eq!(generations, vec![0, 1, 2]);
    }

    #[test]
    fn test_no_buffering_without_flush_frequency() {
        let log = MemoryScoreLog::new();
        let mut population = scored(&[1.0]);
        let mut stats = Statistics::new();
        stats.set_score_log(Box::new(log.clone()));
        stats.reset(&mut population).unwrap();
        stats.update(&mut population).unwrap();
        stats.flush_scores().unwrap();
        assert!(log.records().is_empty());
    }

    #[test]
    fn test_archive_keeps_best_without_duplicates() {
        let mut rng = RandomNumberGenerator::from_seed(1);
        let mut population = scored(&[1.0, 4.0, 2.0]);
        let mut stats = Statistics::new();
        let prototype = Genome::new(BinaryString::new(4));
        stats.set_best_genomes(&prototype, 2, &mut rng).unwrap();
        stats.reset(&mut population).unwrap();
        assert_eq!(stats.best_individual(0).unwrap().cached_score(), 4.0);
        assert_eq!(stats.best_individual(1).unwrap().cached_score(), 2.0);

        // unchanged population: nothing new enters
        stats.update(&mut population).unwrap();
        assert_eq!(stats.best_individual(1).unwrap().cached_score(), 2.0);

        let mut next = scored(&[9.0, 0.0, 3.0]);
        stats.update(&mut next).unwrap();
        assert_eq!(stats.best_individual(0).unwrap().cached_score(), 9.0);
        assert_eq!(stats.best_individual(1).unwrap().cached_score(), 4.0);
        // out of range falls back to the best
        assert_eq!(stats.best_individual(7).unwrap().cached_score(), 9.0);
    }

    #[test]
    fn test_single_archive_follows_order() {
        let mut rng = RandomNumberGenerator::from_seed(1);
        let mut population = scored(&[5.0, 3.0]);
        population.set_order(SortOrder::LowIsBest);
        let mut stats = Statistics::new();
        stats.set_best_genomes(&Genome::new(BinaryString::new(4)), 1, &mut rng)
            .unwrap();
        stats.reset(&mut population).unwrap();
        assert_eq!(stats.best_individual(0).unwrap().cached_score(), 3.0);

        set_scores(&mut population, &[4.0, 2.5]);
        stats.update(&mut population).unwrap();
        assert_eq!(stats.best_individual(0).unwrap().cached_score(), 2.5);
    }

    #[test]
    fn test_writer_log() {
        let mut log = WriterScoreLog::new(Vec::new());
        let record = ScoreRecord {
            generation: 1,
            max: 4.0,
            ..ScoreRecord::default()
        };
        log.write(&[record], ScoreFlags::MAXIMUM).unwrap();
        assert_eq!(String::from_utf8(log.into_inner()).unwrap(), "1\t4\n");
    }
}
