use crossbeam_channel::Sender;
use datgen::{GenerationTask, ScenarioGenerator, TaskError, TaskStatus};

/// A message sent from the driver to a worker thread.
pub enum WorkRequest<G: ScenarioGenerator, M> {
    /// Run `task` and send its [`Completion`] back on `response`.
    Generate {
        task: GenerationTask<G, M>,
        response: Sender<Completion<G::Scenario>>,
    },
    /// Stop the worker once it has acknowledged on `response`.
    Shutdown { response: Sender<()> },
}

/// The result of one [`WorkRequest::Generate`], tagged with the task id so
/// the driver can restore dispatch order.
pub struct Completion<S> {
    pub id: u64,
    pub result: Result<TaskStatus<S>, TaskError>,
}
