use std::{marker::PhantomData, time::Instant};

use anyhow::Context;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::{ObjectProvider, ObjectRecord, error::StreamResult as Result};

/// Per-record callback.
///
/// An `Err` from `handle` is logged and counted; it never stops the walk.
pub trait ObjectHandler {
    fn handle(&mut self, record: &ObjectRecord) -> anyhow::Result<()>;
}

impl<F> ObjectHandler for F
where
    F: FnMut(&ObjectRecord) -> anyhow::Result<()>,
{
    #[inline]
    fn handle(&mut self, record: &ObjectRecord) -> anyhow::Result<()> {
        self(record)
    }
}

/// Parses each payload as JSON before passing it on.
///
/// A payload that fails to parse is a handler failure for that record only.
pub struct JsonHandler<T, F> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> JsonHandler<T, F>
where
    T: DeserializeOwned,
    F: FnMut(T, &ObjectRecord) -> anyhow::Result<()>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<T, F> ObjectHandler for JsonHandler<T, F>
where
    T: DeserializeOwned,
    F: FnMut(T, &ObjectRecord) -> anyhow::Result<()>,
{
    fn handle(&mut self, record: &ObjectRecord) -> anyhow::Result<()> {
        let value: T = serde_json::from_str(&record.payload).context("parse object json")?;
        (self.f)(value, record)
    }
}

/// Outcome of one drive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DriveSummary {
    /// Records handed to the handler.
    pub delivered: u64,
    /// Of those, how many the handler rejected.
    pub failed: u64,
}

/// Pulls records from a provider and feeds them to a handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct Driver {
    progress_every: u64,
    limit: Option<u64>,
}

impl Driver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a progress line every `n` records (0 disables).
    pub fn progress_every(mut self, n: u64) -> Self {
        self.progress_every = n;
        self
    }

    /// Stop pulling after `n` records.
    pub fn limit(mut self, n: Option<u64>) -> Self {
        self.limit = n;
        self
    }

    /// Run until the provider reports end of stream.
    ///
    /// Handler failures are isolated per record. Provider errors end the
    /// run and are returned.
    pub fn run<P, H>(&self, provider: &mut P, handler: &mut H) -> Result<DriveSummary>
    where
        P: ObjectProvider + ?Sized,
        H: ObjectHandler + ?Sized,
    {
        let start = Instant::now();
        let mut summary = DriveSummary::default();

        loop {
            if let Some(max) = self.limit {
                if summary.delivered >= max {
                    break;
                }
            }

            let Some(record) = provider.next_object()? else {
                break;
            };
            summary.delivered += 1;

            if let Err(e) = handler.handle(&record) {
                summary.failed += 1;
                warn!(
                    "Failed to process object {}#{}: {:#}",
                    record.source, record.offset, e
                );
            }

            if self.progress_every != 0 && summary.delivered.is_multiple_of(self.progress_every) {
                let secs = start.elapsed().as_secs_f64().max(1e-9);
                info!(
                    "{} objects ({} failed) | {:.0} obj/s",
                    summary.delivered,
                    summary.failed,
                    summary.delivered as f64 / secs
                );
            }
        }

        Ok(summary)
    }
}

/// Drive `provider` to exhaustion with default settings.
pub fn drive<P, H>(provider: &mut P, handler: &mut H) -> Result<DriveSummary>
where
    P: ObjectProvider + ?Sized,
    H: ObjectHandler + ?Sized,
{
    Driver::new().run(provider, handler)
}
