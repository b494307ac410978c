use std::fmt;

/// Identifies a task supervised by the pipeline's cancellation group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerType {
    /// The single task listing the collection and filling the work queue.
    Producer,
    /// One of the tasks draining the work queue and applying the mutation.
    Mutation { worker_id: u16 },
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerType::Producer => write!(f, "producer"),
            WorkerType::Mutation { worker_id } => write!(f, "mutation_worker_{worker_id}"),
        }
    }
}
