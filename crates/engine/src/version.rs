// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Installed tool version resolution.
//!
//! Detection runs once per (tool, target) and is shared by concurrent
//! callers. Failed detections (the backend could not run the probe at all)
//! are not remembered, so the next call tries again.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use cmdx_adapters::{BackendError, ExecutionBackend};
use cmdx_core::{CommandContext, Invocation, SessionConfig, ToolSettings, Version, VersionInfo};
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::tool::Tool;

/// Output markers that identify a tool's implementation family, checked in
/// order.
const FLAVOR_MARKERS: &[(&str, &str)] =
    &[("BusyBox", "busybox"), ("procps", "procps"), ("GNU", "gnu")];

/// Shell exit codes meaning the program is not there to ask.
const NOT_INSTALLED: [i32; 2] = [126, 127];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Detected {
    version: Option<Version>,
    flavor: Option<String>,
}

type DetectKey = (String, String);

#[derive(Default)]
pub struct VersionService {
    tools: BTreeMap<String, ToolSettings>,
    detected: Mutex<HashMap<DetectKey, Arc<OnceCell<Detected>>>>,
}

impl VersionService {
    pub fn new(tools: BTreeMap<String, ToolSettings>) -> Self {
        Self { tools, detected: Mutex::new(HashMap::new()) }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.tools.clone())
    }

    /// Resolve `tool` on the context's target and select its adapter.
    ///
    /// Plain tools are never probed.
    pub async fn resolve(
        &self,
        tool: &Tool,
        ctx: &CommandContext,
        backend: &dyn ExecutionBackend,
    ) -> VersionInfo {
        if tool.is_plain() {
            return VersionInfo::unknown(tool.name());
        }

        let cell = {
            let mut detected = self.detected.lock();
            Arc::clone(detected.entry((tool.name().to_string(), ctx.target())).or_default())
        };
        let detected = match cell.get_or_try_init(|| self.detect(tool, ctx, backend)).await {
            Ok(detected) => detected.clone(),
            Err(e) => {
                tracing::warn!(tool = tool.name(), target_host = %ctx.target(), error = %e,
                    "version detection failed");
                Detected { version: None, flavor: self.pinned_flavor(tool) }
            }
        };

        let adapter = tool
            .select(detected.version.as_ref(), detected.flavor.as_deref())
            .map(|a| a.id().to_string());
        VersionInfo {
            tool: tool.name().to_string(),
            version: detected.version,
            flavor: detected.flavor,
            adapter,
        }
    }

    /// Forget what was detected for `tool` on `target`.
    pub fn invalidate(&self, tool: &str, target: &str) {
        self.detected.lock().remove(&(tool.to_string(), target.to_string()));
    }

    pub fn invalidate_all(&self) {
        self.detected.lock().clear();
    }

    /// Detect again, ignoring any remembered answer.
    pub async fn refresh(
        &self,
        tool: &Tool,
        ctx: &CommandContext,
        backend: &dyn ExecutionBackend,
    ) -> VersionInfo {
        self.invalidate(tool.name(), &ctx.target());
        self.resolve(tool, ctx, backend).await
    }

    fn pinned_flavor(&self, tool: &Tool) -> Option<String> {
        self.tools.get(tool.name()).and_then(|s| s.flavor.clone())
    }

    async fn detect(
        &self,
        tool: &Tool,
        ctx: &CommandContext,
        backend: &dyn ExecutionBackend,
    ) -> Result<Detected, BackendError> {
        let pinned_flavor = self.pinned_flavor(tool);
        if let Some(version) = self.tools.get(tool.name()).and_then(ToolSettings::pinned_version) {
            let flavor = pinned_flavor.or_else(|| tool.default_flavor().map(String::from));
            tracing::debug!(tool = tool.name(), %version, "using pinned version");
            return Ok(Detected { version: Some(version), flavor });
        }

        let args = tool.detect_args().to_vec();
        let rendered = cmdx_shell::render(tool.name(), &args);
        let probe = Invocation::new(tool.name(), args, rendered);
        let out = backend.execute(&probe, &ctx.with_privileged(false)).await?;

        let text = format!("{}\n{}", out.stdout, out.stderr);
        let version = Version::find_in(&text);
        let flavor = pinned_flavor.or_else(|| flavor_marker(&text)).or_else(|| {
            let exists = !NOT_INSTALLED.contains(&out.exit_code);
            match version {
                None if exists => tool.default_flavor().map(String::from),
                _ => None,
            }
        });
        tracing::debug!(
            tool = tool.name(),
            target_host = %ctx.target(),
            version = ?version,
            flavor = ?flavor,
            "detected tool version"
        );
        Ok(Detected { version, flavor })
    }
}

fn flavor_marker(text: &str) -> Option<String> {
    FLAVOR_MARKERS.iter().find(|(marker, _)| text.contains(marker)).map(|(_, f)| f.to_string())
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
