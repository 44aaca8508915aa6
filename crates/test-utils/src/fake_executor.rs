use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use dirwatch::exec::{ExecError, ExecutorBackend};
use dirwatch::job::Job;
use tokio::sync::Semaphore;

/// A fake executor that:
/// - records every (job, command) it is asked to run
/// - optionally holds a job's calls until the test releases them
/// - never spawns anything.
#[derive(Default, Clone)]
pub struct FakeExecutor {
    started: Arc<Mutex<Vec<(String, String)>>>,
    finished: Arc<Mutex<Vec<(String, String)>>>,
    gates: Arc<Mutex<HashMap<String, Arc<Semaphore>>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every call for `job` until [`FakeExecutor::release`].
    pub fn block_job(&self, job: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(job.to_string(), Arc::new(Semaphore::new(0)));
    }

    /// Let one held call of `job` finish.
    pub fn release(&self, job: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(job) {
            gate.add_permits(1);
        }
    }

    /// Calls that reached the executor, in order.
    pub fn started(&self) -> Vec<(String, String)> {
        self.started.lock().unwrap().clone()
    }

    /// Calls that returned, in order.
    pub fn finished(&self) -> Vec<(String, String)> {
        self.finished.lock().unwrap().clone()
    }

    /// Commands that returned for `job`.
    pub fn commands_for(&self, job: &str) -> Vec<String> {
        self.finished()
            .into_iter()
            .filter(|(j, _)| j == job)
            .map(|(_, c)| c)
            .collect()
    }
}

impl ExecutorBackend for FakeExecutor {
    fn execute<'a>(
        &'a self,
        job: &'a Arc<Job>,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ExecError>> + Send + 'a>> {
        Box::pin(async move {
            let entry = (job.name.clone(), command.to_string());
            self.started.lock().unwrap().push(entry.clone());

            let gate = self.gates.lock().unwrap().get(&job.name).cloned();
            if let Some(gate) = gate {
                gate.acquire()
                    .await
                    .expect("gate semaphore closed")
                    .forget();
            }

            self.finished.lock().unwrap().push(entry);
            Ok(())
        })
    }
}
