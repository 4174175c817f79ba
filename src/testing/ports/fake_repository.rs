use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::domain::AppError;
use crate::ports::{Credential, FileRequest, RemoteRepository};

/// Scripted remote repository keyed by `owner/repo@ref:path`.
///
/// Locations without a scripted response fail like a 404.
#[derive(Debug, Clone, Default)]
pub struct FakeRepository {
    responses: Arc<Mutex<HashMap<String, Result<String, String>>>>,
    gates: Arc<Mutex<HashMap<String, FetchGate>>>,
    calls: Arc<Mutex<Vec<String>>>,
    tokens: Arc<Mutex<Vec<String>>>,
}

impl FakeRepository {
    pub fn serve(&self, location: &str, text: &str) {
        self.responses.lock().insert(location.to_string(), Ok(text.to_string()));
    }

    pub fn fail(&self, location: &str, details: &str) {
        self.responses.lock().insert(location.to_string(), Err(details.to_string()));
    }

    /// Make fetches of `location` wait until the returned gate is opened.
    pub fn hold(&self, location: &str) -> FetchGate {
        let gate = FetchGate::default();
        self.gates.lock().insert(location.to_string(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens.lock().clone()
    }
}

impl RemoteRepository for FakeRepository {
    fn read_file(
        &self,
        request: &FileRequest<'_>,
        credential: &Credential,
    ) -> Result<String, AppError> {
        let location = request.to_string();
        self.calls.lock().push(location.clone());
        self.tokens.lock().push(credential.token.clone());

        let gate = self.gates.lock().get(&location).cloned();
        if let Some(gate) = gate {
            gate.pass();
        }

        match self.responses.lock().get(&location).cloned() {
            Some(Ok(text)) => Ok(text),
            Some(Err(details)) => Err(AppError::FetchFailed { location, details }),
            None => Err(AppError::FetchFailed { location, details: "404 Not Found".to_string() }),
        }
    }
}

#[derive(Debug, Default)]
struct GateState {
    entered: bool,
    open: bool,
}

/// Blocks a fake fetch until opened; lets tests observe the blocked window.
#[derive(Debug, Clone, Default)]
pub struct FetchGate {
    state: Arc<(Mutex<GateState>, Condvar)>,
}

impl FetchGate {
    fn pass(&self) {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock();
        state.entered = true;
        cvar.notify_all();
        while !state.open {
            cvar.wait(&mut state);
        }
    }

    /// Wait (bounded) until a fetch is parked on this gate.
    pub fn wait_entered(&self) -> bool {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !state.entered {
            if cvar.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.entered
    }

    pub fn open(&self) {
        let (lock, cvar) = &*self.state;
        lock.lock().open = true;
        cvar.notify_all();
    }
}
