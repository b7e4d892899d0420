// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OpenSSH connector.
//!
//! Each pooled session is an ssh master connection with its own control
//! socket; commands run over it as short-lived `ControlMaster=no` clients.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use cmdx_core::{RemoteAuth, RemoteHost, RemoteSettings};
use cmdx_shell::{ProcessError, ProcessSpec};

use super::session::{Connector, RemoteSession, SessionError};
use crate::backend::RawOutput;

/// ssh reserves exit status 255 for its own errors.
const SSH_ERROR_EXIT: i32 = 255;

#[derive(Debug, Clone)]
pub struct SshConnector {
    control_dir: PathBuf,
    connect_timeout: Duration,
    control_persist_secs: u64,
}

impl SshConnector {
    pub fn new(settings: &RemoteSettings) -> Self {
        Self {
            control_dir: std::env::temp_dir(),
            connect_timeout: settings.connect_timeout(),
            control_persist_secs: settings.control_persist_secs,
        }
    }

    /// Where control sockets are created. Socket paths must stay short.
    #[must_use]
    pub fn control_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.control_dir = dir.into();
        self
    }

    fn control_path(&self) -> PathBuf {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.control_dir.join(format!("cmdx-{}.sock", &id[..12]))
    }
}

/// Arguments shared by every ssh invocation against `host`.
fn base_args(host: &RemoteHost, control_path: &Path) -> Vec<String> {
    let mut args = vec![
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-o".to_string(),
        format!("ControlPath={}", control_path.display()),
        "-p".to_string(),
        host.port.to_string(),
    ];
    if let RemoteAuth::IdentityFile(path) = &host.auth {
        args.push("-i".to_string());
        args.push(path.display().to_string());
    }
    args
}

fn destination(host: &RemoteHost) -> String {
    format!("{}@{}", host.user, host.host)
}

/// Arguments that start a backgrounded master connection.
pub fn master_args(
    host: &RemoteHost,
    control_path: &Path,
    persist_secs: u64,
    connect_secs: u64,
) -> Vec<String> {
    let mut args = base_args(host, control_path);
    args.extend([
        "-o".to_string(),
        "ControlMaster=yes".to_string(),
        "-o".to_string(),
        format!("ControlPersist={persist_secs}"),
        "-o".to_string(),
        format!("ConnectTimeout={}", connect_secs.max(1)),
        "-f".to_string(),
        "-N".to_string(),
        destination(host),
    ]);
    args
}

/// Arguments that run `script` over an existing master connection.
pub fn exec_args(host: &RemoteHost, control_path: &Path, script: &str) -> Vec<String> {
    let mut args = base_args(host, control_path);
    args.extend([
        "-o".to_string(),
        "ControlMaster=no".to_string(),
        destination(host),
        "--".to_string(),
        script.to_string(),
    ]);
    args
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(&self, host: &RemoteHost) -> Result<Box<dyn RemoteSession>, SessionError> {
        if let RemoteAuth::Password(_) = host.auth {
            return Err(SessionError::Rejected(
                "password authentication is not supported in batch mode".to_string(),
            ));
        }
        let control_path = self.control_path();
        let spec = ProcessSpec::new("ssh", &self.control_dir)
            .args(master_args(
                host,
                &control_path,
                self.control_persist_secs,
                self.connect_timeout.as_secs(),
            ))
            .timeout(self.connect_timeout);

        let out = cmdx_shell::run(&spec).await.map_err(|e| SessionError::Connect(e.to_string()))?;
        if out.exit_code != 0 {
            return Err(SessionError::Connect(out.stderr.trim().to_string()));
        }
        tracing::info!(
            target_host = %host.key(),
            control = %control_path.display(),
            "ssh master connected"
        );
        Ok(Box::new(SshSession { host: host.clone(), control_path, cwd: self.control_dir.clone() }))
    }
}

struct SshSession {
    host: RemoteHost,
    control_path: PathBuf,
    cwd: PathBuf,
}

impl SshSession {
    fn control_command(&self, op: &str) -> ProcessSpec {
        ProcessSpec::new("ssh", &self.cwd)
            .args(base_args(&self.host, &self.control_path))
            .args(["-O".to_string(), op.to_string(), destination(&self.host)])
            .timeout(Duration::from_secs(5))
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn exec(
        &mut self,
        script: &str,
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<RawOutput, SessionError> {
        let mut spec = ProcessSpec::new("ssh", &self.cwd)
            .args(exec_args(&self.host, &self.control_path, script))
            .timeout(timeout);
        if let Some(stdin) = stdin {
            spec = spec.stdin(stdin);
        }
        match cmdx_shell::run(&spec).await {
            Ok(out) if out.exit_code == SSH_ERROR_EXIT => {
                Err(SessionError::Broken(out.stderr.trim().to_string()))
            }
            Ok(out) => Ok(RawOutput::from(out)),
            Err(ProcessError::Timeout { after, .. }) => Err(SessionError::Timeout(after)),
            Err(e) => Err(SessionError::Broken(e.to_string())),
        }
    }

    async fn probe(&mut self) -> bool {
        let check = cmdx_shell::run(&self.control_command("check")).await;
        matches!(check, Ok(out) if out.exit_code == 0)
    }

    async fn close(&mut self) {
        if let Err(e) = cmdx_shell::run(&self.control_command("exit")).await {
            tracing::debug!(error = %e, "ssh master exit failed");
        }
        if let Err(e) = std::fs::remove_file(&self.control_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(error = %e, "failed to remove control socket");
            }
        }
    }
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
