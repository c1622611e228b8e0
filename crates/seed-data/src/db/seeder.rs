//! Database seeding: wipe every table, then reload it from the data source.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;

use board::{EntityKey, EntityKind, Store};
use futures::{StreamExt, TryStreamExt, stream};
use tracing::{Instrument, debug, info, info_span};

use super::run::{RunPhase, SeedReport, SeedRun};
use crate::config::SeedConfig;
use crate::errors::{Phase, SeedError};
use crate::records::{Batch, RecordSet};
use crate::sources::DataSource;

/// Every batch of a run, in dependency order, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedPlan {
    batches: Vec<Batch>,
}

impl SeedPlan {
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Total number of insert requests across all batches.
    pub fn total(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }
}

/// Keys created so far in a run, per kind.
#[derive(Debug, Default)]
struct LoadedKeys {
    keys: HashMap<EntityKind, HashSet<EntityKey>>,
}

impl LoadedKeys {
    /// Fails on the first connection in `batch` whose target has not been loaded.
    fn check(&self, batch: &Batch) -> Result<(), SeedError> {
        for request in &batch.requests {
            for connection in request.connections() {
                let target = connection.relation.target;
                let loaded = self
                    .keys
                    .get(&target)
                    .is_some_and(|keys| keys.contains(&connection.key));

                if !loaded {
                    return Err(SeedError::DanglingReference {
                        kind: batch.kind,
                        relation: connection.relation.name,
                        target,
                        key: connection.key,
                    });
                }
            }
        }
        Ok(())
    }

    fn extend(&mut self, kind: EntityKind, keys: impl IntoIterator<Item = EntityKey>) {
        self.keys.entry(kind).or_default().extend(keys);
    }
}

/// Drives a full reset-and-reload of the board schema.
///
/// The store is passed to each operation rather than held, so the caller
/// decides its lifetime; [`Seeder::run_to_completion`] releases it on every
/// exit path.
pub struct Seeder<D> {
    source: D,
    concurrency: usize,
    batch_timeout: Option<Duration>,
}

impl<D: DataSource> Seeder<D> {
    /// Creates a new seeder reading from `source`.
    pub fn new(source: D) -> Self {
        let defaults = SeedConfig::default();
        Self {
            source,
            concurrency: defaults.concurrency,
            batch_timeout: defaults.batch_timeout,
        }
    }

    /// Creates a seeder with the concurrency and deadline from `config`.
    pub fn from_config(source: D, config: &SeedConfig) -> Self {
        Self::new(source)
            .with_concurrency(config.concurrency)
            .with_batch_timeout(config.batch_timeout)
    }

    /// Sets how many inserts of one batch may be in flight at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the per-batch deadline. `None` waits indefinitely.
    pub fn with_batch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.batch_timeout = timeout;
        self
    }

    /// Fetches and parses the record set for `kind`.
    pub async fn load_entity_set(&self, kind: EntityKind) -> Result<RecordSet, SeedError> {
        let data = self
            .source
            .fetch(kind)
            .await
            .map_err(|source| SeedError::SourceUnavailable { kind, source })?;

        RecordSet::parse(kind, &data).map_err(|e| SeedError::MalformedRecord {
            kind,
            index: e.index,
            reason: e.reason,
        })
    }

    /// Loads and transforms every record set without touching the store.
    pub async fn plan(&self) -> Result<SeedPlan, SeedError> {
        let mut batches = Vec::with_capacity(EntityKind::ORDER.len());

        for kind in EntityKind::ORDER {
            let set = self.load_entity_set(kind).await?;
            let batch = set.to_batch().map_err(|e| SeedError::MalformedRecord {
                kind,
                index: e.index,
                reason: e.reason,
            })?;
            debug!("Loaded {} {} records", batch.len(), kind);
            batches.push(batch);
        }

        Ok(SeedPlan { batches })
    }

    /// Deletes every row of every kind, children before parents.
    pub async fn reset<S: Store + ?Sized>(
        &self,
        store: &S,
        run: &mut SeedRun,
    ) -> Result<(), SeedError> {
        run.advance(RunPhase::Resetting).map_err(|e| run.fail(e))?;
        info!("Clearing all seeded data...");

        for kind in EntityKind::reverse_order() {
            let delete = async {
                store
                    .delete_all(kind)
                    .await
                    .map_err(|source| SeedError::Store {
                        phase: Phase::Reset,
                        kind,
                        source,
                    })
            };
            let deleted = self
                .with_deadline(Phase::Reset, kind, delete)
                .await
                .map_err(|e| run.fail(e))?;
            debug!("Deleted {} {} rows", deleted, kind);
        }

        info!("All data cleared");
        Ok(())
    }

    /// Inserts every batch of `plan` in dependency order.
    ///
    /// Inserts within one batch run concurrently; the next batch starts only
    /// after every insert of the current one has finished. The first failure
    /// stops the run. Batches already inserted stay in the store.
    pub async fn populate<S: Store + ?Sized>(
        &self,
        store: &S,
        plan: &SeedPlan,
        run: &mut SeedRun,
    ) -> Result<Vec<(EntityKind, usize)>, SeedError> {
        let mut loaded = LoadedKeys::default();
        let mut counts = Vec::with_capacity(plan.batches.len());

        for batch in &plan.batches {
            run.advance(RunPhase::Populating(batch.kind)).map_err(|e| run.fail(e))?;
            let inserted = self
                .insert_batch(store, batch, &mut loaded)
                .await
                .map_err(|e| run.fail(e))?;
            counts.push((batch.kind, inserted));
        }

        Ok(counts)
    }

    /// Inserts one batch and records the created keys.
    async fn insert_batch<S: Store + ?Sized>(
        &self,
        store: &S,
        batch: &Batch,
        loaded: &mut LoadedKeys,
    ) -> Result<usize, SeedError> {
        info!("Seeding {} {} records...", batch.len(), batch.kind);
        loaded.check(batch)?;

        let inserts = stream::iter(batch.requests.iter().map(|request| async move {
            debug!(key = request.key(), "Creating {}", request.kind());
            store
                .create(request)
                .await
                .map_err(|source| SeedError::Store {
                    phase: Phase::Populate,
                    kind: request.kind(),
                    source,
                })
        }))
        .buffer_unordered(self.concurrency)
        .try_collect::<Vec<EntityKey>>();

        let keys = self
            .with_deadline(Phase::Populate, batch.kind, inserts)
            .await?;
        let inserted = keys.len();
        loaded.extend(batch.kind, keys);

        info!("Seeded {} {} records", inserted, batch.kind);
        Ok(inserted)
    }

    /// Applies the batch deadline, if one is configured.
    async fn with_deadline<T, F>(
        &self,
        phase: Phase,
        kind: EntityKind,
        work: F,
    ) -> Result<T, SeedError>
    where
        F: Future<Output = Result<T, SeedError>>,
    {
        match self.batch_timeout {
            Some(after) => tokio::time::timeout(after, work)
                .await
                .map_err(|_| SeedError::Timeout { phase, kind, after })?,
            None => work.await,
        }
    }

    /// Runs a full reset and reload against `store`, tracking progress in `run`.
    ///
    /// Every record set is loaded and transformed before the reset, so bad
    /// source data never costs the existing rows.
    pub async fn execute<S: Store + ?Sized>(
        &self,
        store: &S,
        run: &mut SeedRun,
    ) -> Result<SeedReport, SeedError> {
        info!("Loading seed data...");
        let plan = self.plan().await.map_err(|e| run.fail(e))?;
        info!("Loaded {} records", plan.total());

        self.reset(store, run).await?;
        let counts = self.populate(store, &plan, run).await?;
        run.advance(RunPhase::Done).map_err(|e| run.fail(e))?;

        Ok(SeedReport::new(run, counts))
    }

    /// Runs a fresh seeding run against `store`.
    pub async fn run<S: Store + ?Sized>(&self, store: &S) -> Result<SeedReport, SeedError> {
        let mut run = SeedRun::new();
        let span = info_span!("seed_run", run_id = %run.id());
        self.execute(store, &mut run).instrument(span).await
    }

    /// Runs a fresh seeding run and closes `store` afterwards, whether the run
    /// succeeded or not.
    pub async fn run_to_completion<S: Store + ?Sized>(
        &self,
        store: &S,
    ) -> Result<SeedReport, SeedError> {
        let result = self.run(store).await;
        store.close().await;
        info!("Store connection released");
        result
    }
}
