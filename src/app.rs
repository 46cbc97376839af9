//! The per-tick control loop.
//!
//! Single-threaded and synchronous: the loop blocks on the next report
//! block, then runs parse → scheduler update → rank → enrich → render to
//! completion before blocking again. Cancellation is operator-issued and
//! observed at the read boundary; a tick always completes.

use crate::jstack::JstackEnricher;
use crate::parse;
use crate::pidstat::ColumnLayout;
use crate::rank::{self, SortField};
use crate::render::ThreadView;
use crate::schedstat::SchedstatReader;
use crate::stats::{ThreadId, ThreadRegistry};

/// Runtime configuration handed to the control loop.
#[derive(Debug, Clone)]
pub struct Config {
    pub pid: u32,
    /// Threads to show per tick; negative shows all.
    pub top: i32,
    /// Stack frames kept per thread when enrichment is active.
    pub max_stack_depth: usize,
    pub sort: SortField,
    pub layout: ColumnLayout,
}

/// The sampling pipeline: one registry, one scheduler reader, one
/// enricher, one view, driven by the block stream.
pub struct App<V> {
    config: Config,
    registry: ThreadRegistry,
    reader: SchedstatReader,
    enricher: JstackEnricher,
    view: V,
    tick: u64,
}

impl<V: ThreadView> App<V> {
    #[must_use]
    pub fn new(config: Config, enricher: JstackEnricher, view: V) -> Self {
        let reader = SchedstatReader::new(config.pid);
        Self::with_reader(config, enricher, view, reader)
    }

    /// Constructor with an injectable scheduler reader, for tests driving
    /// the pipeline against a scratch proc root.
    #[must_use]
    pub fn with_reader(
        config: Config,
        enricher: JstackEnricher,
        view: V,
        reader: SchedstatReader,
    ) -> Self {
        Self {
            config,
            registry: ThreadRegistry::new(),
            reader,
            enricher,
            view,
            tick: 0,
        }
    }

    /// Consumes report blocks until the source ends.
    pub fn run(&mut self, blocks: impl Iterator<Item = Vec<String>>) {
        for block in blocks {
            self.process_block(&block);
        }
    }

    /// One tick: fold the block into the registry, refresh scheduler
    /// deltas for every known thread, rank, enrich the selected set and
    /// render it.
    pub fn process_block(&mut self, lines: &[String]) {
        self.tick += 1;
        parse::apply_block(&mut self.registry, lines, self.config.layout);
        self.registry.update_scheduler_stats(&self.reader);
        let selected = rank::top_threads(&self.registry, self.config.sort, self.config.top);
        self.apply_stack_info(&selected);
        self.view.display(&self.registry, &selected, self.tick);
    }

    /// Folds the enrichment result into the registry. A thread without a
    /// fresh dump keeps its previously-known name and snippet.
    fn apply_stack_info(&mut self, selected: &[ThreadId]) {
        let dumps = self
            .enricher
            .collect(selected, self.config.max_stack_depth);
        for (tid, dump) in dumps {
            let record = self.registry.get_or_create(tid);
            record.name = dump.name;
            record.stack = dump.snippet;
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ThreadRegistry {
        &self.registry
    }

    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }
}
