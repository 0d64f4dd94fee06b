use crossbeam_channel::Receiver;
use datgen::{ScenarioGenerator, ScenarioMetrics};

use crate::pool::{Completion, WorkRequest};

/// Thread body for one pool worker.
///
/// Runs each [`WorkRequest::Generate`] to completion and sends the result
/// back on the request's own channel. The loop ends on
/// [`WorkRequest::Shutdown`] after acknowledging it, or when every sender
/// for `rx` is gone.
pub fn worker_loop<G, M>(worker_id: usize, rx: Receiver<WorkRequest<G, M>>)
where
    G: ScenarioGenerator,
    M: ScenarioMetrics<G::Scenario>,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    while let Ok(work) = rx.recv() {
        match work {
            WorkRequest::Generate { task, response } => {
                let id = task.id();
                let result = task.run();
                if response.send(Completion { id, result }).is_err() {
                    // The driver stopped listening; nothing left to report to.
                    #[cfg(feature = "tracing")]
                    tracing::trace!("Worker {worker_id} dropped result for task {id}");
                }
            }
            WorkRequest::Shutdown { response } => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {worker_id} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} stopped");
    #[cfg(not(feature = "tracing"))]
    let _ = worker_id;
}
