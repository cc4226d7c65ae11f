//! Scripted harness over the buffer operations.
//!
//! A script is a JSON array of operations applied in order to a set of named
//! handles.  Byte content travels as hex strings.  Running a script yields a
//! [`Report`]: one [`Event`] per operation capturing the acting handle's
//! share count, storage identity, and content afterwards.
//!
//! An out-of-bounds `update` is a failed *event*, not a script error — the
//! script keeps running, mirroring the recoverable nature of the condition.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::buffer::CowBuffer;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("unknown handle '{0}'")]
    UnknownHandle(String),
    #[error("handle '{0}' already exists")]
    DuplicateHandle(String),
    #[error("invalid hex content: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid script: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// One scripted operation.  `bytes` fields are hex-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Construct { handle: String, bytes: String },
    Clone { from: String, to: String },
    Update { handle: String, index: isize, value: u8 },
    Close { handle: String },
    Read { handle: String },
}

/// State of the acting handle after one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub op: String,
    pub handle: String,
    /// False only for a rejected update (out-of-range index).
    pub ok: bool,
    pub share_count: usize,
    /// Backing-allocation address, hex.  Equal values mean shared storage.
    pub storage_id: String,
    /// Hex of the handle's bytes after the operation.
    pub bytes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub events: Vec<Event>,
}

/// Applies operations to a set of named handles.
#[derive(Default)]
pub struct ScriptEngine {
    handles: HashMap<String, CowBuffer>,
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, name: &str) -> Option<&CowBuffer> {
        self.handles.get(name)
    }

    pub fn apply(&mut self, op: &Op) -> Result<Event, ScriptError> {
        match op {
            Op::Construct { handle, bytes } => {
                if self.handles.contains_key(handle) {
                    return Err(ScriptError::DuplicateHandle(handle.clone()));
                }
                let buf = CowBuffer::new(hex::decode(bytes)?);
                let event = snapshot("construct", handle, &buf, None);
                self.handles.insert(handle.clone(), buf);
                Ok(event)
            }
            Op::Clone { from, to } => {
                if self.handles.contains_key(to) {
                    return Err(ScriptError::DuplicateHandle(to.clone()));
                }
                let clone = self
                    .handles
                    .get(from)
                    .ok_or_else(|| ScriptError::UnknownHandle(from.clone()))?
                    .clone();
                let event = snapshot("clone", to, &clone, None);
                self.handles.insert(to.clone(), clone);
                Ok(event)
            }
            Op::Update { handle, index, value } => {
                let buf = self
                    .handles
                    .get_mut(handle)
                    .ok_or_else(|| ScriptError::UnknownHandle(handle.clone()))?;
                let error = buf.update(*index, *value).err().map(|e| e.to_string());
                Ok(snapshot("update", handle, buf, error))
            }
            Op::Close { handle } => {
                let buf = self
                    .handles
                    .get_mut(handle)
                    .ok_or_else(|| ScriptError::UnknownHandle(handle.clone()))?;
                buf.close();
                Ok(snapshot("close", handle, buf, None))
            }
            Op::Read { handle } => {
                let buf = self
                    .handles
                    .get(handle)
                    .ok_or_else(|| ScriptError::UnknownHandle(handle.clone()))?;
                Ok(snapshot("read", handle, buf, None))
            }
        }
    }
}

fn snapshot(op: &str, handle: &str, buf: &CowBuffer, error: Option<String>) -> Event {
    Event {
        op: op.to_string(),
        handle: handle.to_string(),
        ok: error.is_none(),
        share_count: buf.share_count(),
        storage_id: format!("{:x}", buf.storage_id()),
        bytes: hex::encode(buf.as_bytes()),
        error,
    }
}

/// Parse and run a JSON script (an array of [`Op`]).
pub fn run_script(json: &str) -> Result<Report, ScriptError> {
    let ops: Vec<Op> = serde_json::from_str(json)?;
    let mut engine = ScriptEngine::new();
    let mut events = Vec::with_capacity(ops.len());
    for op in &ops {
        events.push(engine.apply(op)?);
    }
    Ok(Report { events })
}

/// Read a script from `path` and run it.
pub fn run_script_file<P: AsRef<Path>>(path: P) -> Result<Report, ScriptError> {
    let json = std::fs::read_to_string(path)?;
    run_script(&json)
}
