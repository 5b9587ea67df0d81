//! Generic worker pool shared by every bulk operation.
//!
//! A call moves through `Validating -> (FailFast | Dispatching) -> Draining ->
//! Completed`. Validation lives in the callers in [`super`]; this module
//! covers dispatch and draining.
//!
//! Every slot of the pre-sized result vector is lent to exactly one job as a
//! `&mut`, so workers write their outcomes without any lock and the result
//! order is fixed by slot index, never by completion order.

use crossbeam::channel::{self, SendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::result::{BulkError, Outcome};
use crate::crypto::CipherError;

/// Worker count used when a caller passes a limit of zero.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10;

/// Map a caller-supplied limit to a usable worker count. Zero workers would
/// never drain the queue.
pub fn normalize_limit(limit: usize) -> usize {
    if limit == 0 {
        DEFAULT_CONCURRENCY_LIMIT
    } else {
        limit
    }
}

/// One queued item and the slot its outcome belongs in.
struct BulkJob<'a> {
    index: usize,
    item: &'a str,
    slot: &'a mut Outcome,
}

impl BulkJob<'_> {
    fn run<F>(self, op: &F, cancel: Option<&CancellationToken>)
    where
        F: Fn(&str) -> Result<String, CipherError>,
    {
        *self.slot = if cancel.is_some_and(CancellationToken::is_cancelled) {
            trace!(index = self.index, "skipping job after cancellation");
            Err(BulkError::Cancelled)
        } else {
            op(self.item).map_err(BulkError::from)
        };
    }
}

/// Fill every slot with the same error without running any work.
pub fn fail_fast(len: usize, err: &CipherError) -> Vec<Outcome> {
    vec![Err(BulkError::Cipher(err.clone())); len]
}

/// Run `op` over every item with at most `workers` threads.
///
/// The queue is filled with one job per item and closed before any worker
/// starts, so each worker exits as soon as the queue reports disconnection.
/// Returns only after every worker has joined. Jobs a worker picks up after
/// `cancel` fires are recorded as [`BulkError::Cancelled`].
///
/// A panic inside `op` is re-raised on the calling thread once all workers
/// have stopped.
pub fn run_bulk<S, F>(
    items: &[S],
    workers: usize,
    cancel: Option<&CancellationToken>,
    op: F,
) -> Vec<Outcome>
where
    S: AsRef<str> + Sync,
    F: Fn(&str) -> Result<String, CipherError> + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }
    let workers = workers.clamp(1, items.len());

    // Placeholder only: every slot is overwritten by its job before return.
    let mut slots: Vec<Outcome> = vec![Err(BulkError::Cancelled); items.len()];

    {
        let (tx, rx) = channel::bounded::<BulkJob<'_>>(items.len());
        for (index, (item, slot)) in items.iter().zip(slots.iter_mut()).enumerate() {
            let job = BulkJob {
                index,
                item: item.as_ref(),
                slot,
            };
            // Capacity equals the job count and `rx` is alive, so this only
            // fails if the channel is somehow disconnected; run inline then.
            if let Err(SendError(job)) = tx.send(job) {
                job.run(&op, cancel);
            }
        }
        drop(tx);

        debug!(items = items.len(), workers, "dispatching bulk jobs");

        std::thread::scope(|scope| {
            for worker in 0..workers {
                let rx = rx.clone();
                let op = &op;
                scope.spawn(move || {
                    let mut processed = 0usize;
                    while let Ok(job) = rx.recv() {
                        job.run(op, cancel);
                        processed += 1;
                    }
                    trace!(worker, processed, "worker drained queue");
                });
            }
        });
    }

    slots
}
