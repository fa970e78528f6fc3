use crate::lock_or_recover;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Shared line-oriented JSON sink; one `emit` writes one whole line.
#[derive(Clone)]
pub struct JsonLines {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl JsonLines {
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn emit<T: Serialize>(&self, value: &T) {
        let line = match serde_json::to_string(value) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(%err, "failed to serialize output line");
                return;
            }
        };
        let mut out = lock_or_recover(&self.out, "json_lines");
        if let Err(err) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            tracing::warn!(%err, "failed to write output line");
        }
    }
}
