/*!
 * File Dump Sink
 * Appends dump batches to a file as JSON stanzas
 *
 * Layout per batch: a START stanza with process facts, one stanza per
 * collection, and an END stanza carrying the batch's elapsed time.
 */

use super::{DumpCollection, DumpSink};
use crate::core::errors::{DumpError, DumpResult};
use crate::core::types::{now_usec, UsecTimestamp};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub struct FileDumpSink {
    name: String,
    path: PathBuf,
    state: Mutex<Option<OpenState>>,
}

struct OpenState {
    writer: BufWriter<File>,
    opened_usec: UsecTimestamp,
}

impl FileDumpSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            path,
            state: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_stanza(writer: &mut BufWriter<File>, stanza: &Value) -> DumpResult<()> {
        let text = serde_json::to_string_pretty(stanza)
            .map_err(|e| DumpError::WriteFailed(e.to_string()))?;
        writer.write_all(text.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl DumpSink for FileDumpSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> DumpResult<()> {
        let mut state = self.state.lock();
        if state.is_some() {
            return Ok(());
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| DumpError::SinkOpenFailed(format!("{}: {e}", self.name)))?;
        let mut writer = BufWriter::new(file);
        let opened_usec = now_usec();

        let stanza = json!({
            "dump.status": "START",
            "process.pid": std::process::id(),
            "process.exe": current_exe_name(),
            "dump.sink": self.name,
            "dump.time.string": time_string(opened_usec),
        });
        Self::write_stanza(&mut writer, &stanza)?;

        *state = Some(OpenState {
            writer,
            opened_usec,
        });
        Ok(())
    }

    fn close(&self) -> DumpResult<()> {
        let mut state = self.state.lock();
        let Some(mut open) = state.take() else {
            return Ok(());
        };
        let elapsed_ms = now_usec().saturating_sub(open.opened_usec) / 1_000;
        let stanza = json!({
            "dump.status": "END",
            "process.pid": std::process::id(),
            "dump.sink": self.name,
            "dump.time.string": time_string(now_usec()),
            "dump.elapsed.ms": elapsed_ms,
        });
        Self::write_stanza(&mut open.writer, &stanza)?;
        open.writer
            .flush()
            .map_err(|e| DumpError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.lock().is_some()
    }

    fn write(&self, dump: &DumpCollection) -> DumpResult<()> {
        let mut state = self.state.lock();
        let Some(open) = state.as_mut() else {
            return Err(DumpError::SinkClosed);
        };

        let mut stanza = Map::new();
        if let Some(reason) = dump.reason() {
            stanza.insert("dump.reason".into(), reason.into());
        }
        stanza.insert("dump.name".into(), dump.name().into());
        stanza.insert("dump.category".into(), dump.category().into());
        stanza.insert("dump.provider".into(), dump.provider_name().into());
        stanza.insert(
            "dump.provider.category".into(),
            dump.provider_category().into(),
        );
        stanza.insert(
            "dump.time.string".into(),
            time_string(dump.timestamp_usec()).into(),
        );
        stanza.insert("dump.time.stamp".into(), dump.timestamp_usec().into());

        let mut collection = Map::new();
        for (key, value) in dump.properties() {
            collection.insert(key.to_string(), value.clone());
        }
        stanza.insert("dump.collection".into(), Value::Object(collection));

        Self::write_stanza(&mut open.writer, &Value::Object(stanza))
    }
}

fn current_exe_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unknown".into())
}

fn time_string(usec: UsecTimestamp) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(usec) * 1_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| usec.to_string())
}
