// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which backend executed (or will execute) an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    Remote,
}

crate::simple_display! {
    BackendKind {
        Local => "local",
        Remote => "remote",
    }
}

/// Authentication material for a remote host.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum RemoteAuth {
    /// Whatever the ssh agent / default identities provide.
    #[default]
    Agent,
    /// An explicit private key file.
    IdentityFile(PathBuf),
    /// A password. Only usable by connectors that support interactive auth.
    Password(String),
}

impl fmt::Debug for RemoteAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteAuth::Agent => f.write_str("Agent"),
            RemoteAuth::IdentityFile(path) => f.debug_tuple("IdentityFile").field(path).finish(),
            RemoteAuth::Password(_) => f.write_str("Password(<redacted>)"),
        }
    }
}

/// Descriptor of the remote host a context targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHost {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub auth: RemoteAuth,
}

impl RemoteHost {
    pub const DEFAULT_PORT: u16 = 22;

    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            user: user.into(),
            auth: RemoteAuth::Agent,
        }
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn auth(mut self, auth: RemoteAuth) -> Self {
        self.auth = auth;
        self
    }

    /// The pool key for this host. Auth material is not part of the key.
    pub fn key(&self) -> SessionKey {
        SessionKey { host: self.host.clone(), port: self.port, user: self.user.clone() }
    }
}

/// Identity of a pooled remote session: `(host, port, user)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub host: String,
    pub port: u16,
    pub user: String,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

/// Parses `user@host` or `user@host:port`.
impl FromStr for RemoteHost {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (user, rest) = s.split_once('@').ok_or_else(|| format!("missing user in {s:?}"))?;
        if user.is_empty() {
            return Err(format!("missing user in {s:?}"));
        }
        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| format!("invalid port in {s:?}"))?;
                (host, port)
            }
            None => (rest, Self::DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(format!("missing host in {s:?}"));
        }
        Ok(RemoteHost::new(host, user).port(port))
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
