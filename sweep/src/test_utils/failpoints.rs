use fail::FailScenario;

/// Configures fail points for the duration of a test and turns them off when dropped.
pub struct SweepFailScenario<'a> {
    _scenario: FailScenario<'a>,
    failpoints: Vec<String>,
}

impl<'a> SweepFailScenario<'a> {
    /// Sets up the scenario with `(fail point, action)` pairs, e.g. `("worker.before_mutate", "return")`.
    pub fn setup(failpoints: &[(&str, &str)]) -> SweepFailScenario<'a> {
        let scenario = FailScenario::setup();

        for (failpoint, action) in failpoints.iter() {
            fail::cfg(*failpoint, action).unwrap();
        }

        Self {
            _scenario: scenario,
            failpoints: failpoints
                .iter()
                .map(|(failpoint, _)| failpoint.to_string())
                .collect(),
        }
    }
}

impl Drop for SweepFailScenario<'_> {
    fn drop(&mut self) {
        for failpoint in self.failpoints.iter() {
            fail::remove(failpoint);
        }
    }
}
