/*!
 * Built-in Dump Providers
 * Always-available process and runtime snapshots
 */

use super::{DumpCollection, DumpProvider};
use crate::core::errors::DumpResult;
use std::time::Instant;

/// Static process facts: pid, executable, working directory, platform
pub struct ProcessInfoProvider {
    name: String,
}

impl ProcessInfoProvider {
    pub fn new() -> Self {
        Self {
            name: "process-info".into(),
        }
    }
}

impl Default for ProcessInfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DumpProvider for ProcessInfoProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        "runtime"
    }

    fn collect(&self) -> DumpResult<DumpCollection> {
        let mut dump = DumpCollection::new("process.info", "runtime", self.name(), self.category());
        dump.add_property("process.pid", std::process::id());
        dump.add_property(
            "process.exe",
            std::env::current_exe()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "unknown".into()),
        );
        dump.add_property(
            "process.cwd",
            std::env::current_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "unknown".into()),
        );
        dump.add_property("os.name", std::env::consts::OS);
        dump.add_property("os.arch", std::env::consts::ARCH);
        Ok(dump)
    }
}

/// Live runtime facts: uptime since registration, parallelism, environment
/// size
pub struct RuntimePropsProvider {
    name: String,
    started: Instant,
}

impl RuntimePropsProvider {
    pub fn new() -> Self {
        Self {
            name: "runtime-props".into(),
            started: Instant::now(),
        }
    }
}

impl Default for RuntimePropsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DumpProvider for RuntimePropsProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        "runtime"
    }

    fn collect(&self) -> DumpResult<DumpCollection> {
        let mut dump =
            DumpCollection::new("runtime.props", "runtime", self.name(), self.category());
        dump.add_property("uptime.secs", self.started.elapsed().as_secs());
        dump.add_property(
            "threads.available",
            std::thread::available_parallelism()
                .map(|n| n.get() as u64)
                .unwrap_or(0),
        );
        dump.add_property("env.count", std::env::vars_os().count() as u64);
        Ok(dump)
    }
}
