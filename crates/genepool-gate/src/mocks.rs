//! Mock collaborators for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use genepool_types::{BundleFormat, ParsedBundle};

use crate::error::GateError;
use crate::traits::{BundleDecoder, CiAdapter, CiError, CiTaskInput, CiTaskOutput};

/// Scriptable CI adapter.
///
/// Answers `check_status` from a queue of prepared outputs; once the queue
/// is drained it keeps answering with the configured fallback. Records
/// every trigger and cancellation for assertions.
pub struct MockCiAdapter {
    script: Mutex<VecDeque<CiTaskOutput>>,
    fallback: CiTaskOutput,
    triggered: Mutex<Vec<CiTaskInput>>,
    cancelled: Mutex<Vec<String>>,
}

impl MockCiAdapter {
    /// Answers with the given outputs in order, then repeats the last one.
    pub fn with_outputs(outputs: Vec<CiTaskOutput>) -> Self {
        let fallback = outputs.last().cloned().unwrap_or_else(CiTaskOutput::pass);
        Self {
            script: Mutex::new(outputs.into()),
            fallback,
            triggered: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
        }
    }

    /// Passes on the first status check.
    pub fn passing() -> Self {
        Self::with_outputs(vec![CiTaskOutput::pass()])
    }

    /// Fails on the first status check.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_outputs(vec![CiTaskOutput::fail(message)])
    }

    /// Reports `running` forever. Pairs with cancellation and poll-budget
    /// tests.
    pub fn always_running() -> Self {
        Self::with_outputs(vec![CiTaskOutput::running()])
    }

    /// Inputs passed to `trigger_task`, in order.
    pub fn triggered(&self) -> Vec<CiTaskInput> {
        self.triggered.lock().expect("mock lock poisoned").clone()
    }

    /// External ids passed to `cancel_task`, in order.
    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl CiAdapter for MockCiAdapter {
    async fn trigger_task(&self, input: CiTaskInput) -> Result<String, CiError> {
        let mut triggered = self.triggered.lock().expect("mock lock poisoned");
        triggered.push(input);
        Ok(format!("mock_ci_{}", triggered.len()))
    }

    async fn check_status(&self, _external_id: &str) -> Result<CiTaskOutput, CiError> {
        let mut script = self.script.lock().expect("mock lock poisoned");
        if script.len() > 1 {
            Ok(script.pop_front().expect("non-empty script"))
        } else {
            Ok(script.front().cloned().unwrap_or_else(|| self.fallback.clone()))
        }
    }

    async fn cancel_task(&self, external_id: &str) -> Result<(), CiError> {
        self.cancelled
            .lock()
            .expect("mock lock poisoned")
            .push(external_id.to_string());
        Ok(())
    }
}

/// Decoder that ignores the bytes and returns a preset bundle.
pub struct MockBundleDecoder {
    bundle: ParsedBundle,
}

impl MockBundleDecoder {
    pub fn returning(bundle: ParsedBundle) -> Self {
        Self { bundle }
    }
}

impl BundleDecoder for MockBundleDecoder {
    fn decode(&self, _bytes: &[u8], _format: BundleFormat) -> Result<ParsedBundle, GateError> {
        Ok(self.bundle.clone())
    }
}
