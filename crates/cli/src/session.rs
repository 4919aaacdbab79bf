// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session state shared by the API client and the sync machinery.
//!
//! The credential is opaque: whatever cookie string the service handed out at
//! login. It is held in memory only and observable through a watch channel so
//! a UI can react when a forced logout clears it.

use std::fmt;

use tokio::sync::watch;

/// Opaque session credential attached to every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Credential(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Process-wide session holder.
pub struct Session {
    credential: watch::Sender<Option<Credential>>,
}

impl Session {
    /// Create a logged-out session.
    pub fn new() -> Self {
        let (credential, _) = watch::channel(None);
        Session { credential }
    }

    /// Create a session that is already logged in.
    pub fn with_credential(credential: Credential) -> Self {
        let session = Self::new();
        session.set(credential);
        session
    }

    pub fn credential(&self) -> Option<Credential> {
        self.credential.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.borrow().is_some()
    }

    pub fn set(&self, credential: Credential) {
        self.credential.send_replace(Some(credential));
    }

    /// Drop the credential. Returns true if one was held.
    pub fn clear(&self) -> bool {
        self.credential.send_replace(None).is_some()
    }

    /// Watch for login/logout changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Credential>> {
        self.credential.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
