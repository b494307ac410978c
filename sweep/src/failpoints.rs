use fail::fail_point;

use crate::bail;
use crate::error::{ErrorKind, SweepResult};

pub const PRODUCER_BEFORE_ENQUEUE: &str = "producer.before_enqueue";
pub const WORKER_BEFORE_MUTATE: &str = "worker.before_mutate";

/// Evaluates the fail point `name`, returning an error when it is configured to fail.
///
/// The optional parameter of the `return` action is used as the error detail.
pub fn sweep_fail_point(name: &str) -> SweepResult<()> {
    fail_point!(name, |parameter| {
        let detail = match parameter {
            Some(parameter) => format!("The failpoint '{name}' returned an error: {parameter}"),
            None => format!("The failpoint '{name}' returned an error"),
        };

        bail!(
            ErrorKind::FailpointTriggered,
            "An error occurred in a fail point",
            detail = detail
        );
    });

    Ok(())
}
