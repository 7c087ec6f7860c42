//! Parallel, failure-isolated processing of a batch of recordings.
//!
//! ```text
//!  feeder ──(rendezvous)──▶ worker × N ──(results)──▶ collector
//! ```
//!
//! * The job channel has zero capacity: a recording is handed over only when
//!   a worker is idle, so at most `workers` recordings are in flight and the
//!   feeder blocks until a slot frees.
//! * Each worker runs [`process_recording`] for one recording at a time. An
//!   error or panic is confined to that recording: its stored windows are
//!   discarded, the failure is recorded, and the worker takes the next job.
//! * The collector is the only writer of the aggregated report and appends
//!   each recording's rows as one block, in completion order.
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

use crossbeam_channel::{bounded, unbounded};
use log::{info, warn};

use crate::config::WindowConfig;
use crate::error::{FailureKind, PipelineError};
use crate::manifest::ManifestRow;
use crate::pipeline::process_recording;
use crate::recording::RecordingOpener;
use crate::select::RecordingRef;
use crate::store::WindowStore;

/// A recording that was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub recording: RecordingRef,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of a dispatch run.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// Rows of every successful recording. Recordings appear in completion
    /// order; rows of one recording stay in window order.
    pub rows: Vec<ManifestRow>,
    /// Number of recordings processed successfully.
    pub processed: usize,
    pub failures: Vec<Failure>,
}

impl DispatchReport {
    pub fn windows(&self) -> usize {
        self.rows.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Number of positive windows.
    pub fn positives(&self) -> usize {
        self.rows.iter().filter(|r| r.label == 1).count()
    }
}

type Outcome = Result<Vec<ManifestRow>, (FailureKind, String)>;

/// Run the pipeline over `recordings` with `cfg.workers` threads.
pub fn dispatch(
    recordings: Vec<RecordingRef>,
    opener: &dyn RecordingOpener,
    store: &dyn WindowStore,
    cfg: &WindowConfig,
) -> DispatchReport {
    let total = recordings.len();
    let n_workers = cfg.workers.max(1).min(total.max(1));
    let (job_tx, job_rx) = bounded::<RecordingRef>(0);
    let (res_tx, res_rx) = unbounded::<(RecordingRef, Outcome)>();

    thread::scope(|s| {
        for _ in 0..n_workers {
            let job_rx = job_rx.clone();
            let res_tx = res_tx.clone();
            s.spawn(move || {
                for rec in job_rx.iter() {
                    let outcome = run_isolated(&rec, opener, store, cfg);
                    if res_tx.send((rec, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(res_tx);

        s.spawn(move || {
            for rec in recordings {
                if job_tx.send(rec).is_err() {
                    break;
                }
            }
        });

        let mut report = DispatchReport::default();
        for (done, (rec, outcome)) in res_rx.iter().enumerate() {
            match outcome {
                Ok(rows) => {
                    info!("[{}/{total}] {}: {} windows", done + 1, rec.id, rows.len());
                    report.processed += 1;
                    report.rows.extend(rows);
                }
                Err((kind, message)) => {
                    warn!("[{}/{total}] {}: skipped ({kind}): {message}", done + 1, rec.id);
                    report.failures.push(Failure { recording: rec, kind, message });
                }
            }
        }
        report
    })
}

/// Run one recording, turning errors and panics into a failure and
/// discarding anything it already stored.
fn run_isolated(
    rec: &RecordingRef,
    opener: &dyn RecordingOpener,
    store: &dyn WindowStore,
    cfg: &WindowConfig,
) -> Outcome {
    let result = catch_unwind(AssertUnwindSafe(|| process_recording(rec, opener, store, cfg)));
    let failure = match result {
        Ok(Ok(rows)) => return Ok(rows),
        Ok(Err(e)) => failure_of(&e),
        Err(payload) => (FailureKind::Panic, panic_message(payload.as_ref())),
    };
    if let Err(e) = store.discard(&rec.id) {
        warn!("{}: could not discard partial output: {e}", rec.id);
    }
    Err(failure)
}

fn failure_of(e: &PipelineError) -> (FailureKind, String) {
    (e.kind(), e.to_string())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
