//! Shared helpers for hub integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use parley_hub::{ClientId, Endpoint, Session};

/// Endpoint that records delivered lines and can be killed on demand.
pub struct TestEndpoint {
    alive: AtomicBool,
    lines: Mutex<Vec<String>>,
}

impl TestEndpoint {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            alive: AtomicBool::new(true),
            lines: Mutex::new(Vec::new()),
        })
    }

    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Endpoint for TestEndpoint {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn send_line(&self, line: &str) {
        if self.is_alive() {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    fn origin(&self) -> String {
        "192.0.2.1:1108".to_string()
    }

    fn close(&self) {
        self.kill();
    }
}

pub fn id(name: &str) -> ClientId {
    ClientId::new(name).unwrap()
}

pub fn session(name: &str) -> (Session, Arc<TestEndpoint>) {
    let endpoint = TestEndpoint::new();
    (Session::new(id(name), endpoint.clone()), endpoint)
}
