//! Credentials and deadline handling for network operations.

use git2::{Cred, CredentialType, RemoteCallbacks};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;

/// libgit2 re-invokes the credentials callback after every rejection.
const MAX_CREDENTIAL_ATTEMPTS: usize = 5;

/// Login/password pair used for HTTP(S) transports
#[derive(Clone, PartialEq, Eq)]
pub struct GitCredentials {
    pub login: String,
    password: String,
}

impl GitCredentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        GitCredentials {
            login: login.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for GitCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitCredentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Wall-clock budget for a single network operation
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    pub(crate) fn start(limit: Option<Duration>) -> Self {
        Deadline {
            started: Instant::now(),
            limit,
        }
    }

    pub(crate) fn expired(&self) -> bool {
        self.limit
            .map(|limit| self.started.elapsed() >= limit)
            .unwrap_or(false)
    }

    pub(crate) fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Error handed back to libgit2 from a callback once the budget is spent
    fn check(&self) -> Result<(), git2::Error> {
        if self.expired() {
            Err(git2::Error::from_str(&self.describe()))
        } else {
            Ok(())
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self.limit {
            Some(limit) => format!("timed out after {}s", limit.as_secs()),
            None => "timed out".to_string(),
        }
    }
}

/// SSH private keys tried in order when no login/password is supplied
fn ssh_key_candidates() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    ["id_ed25519", "id_rsa", "id_ecdsa"]
        .iter()
        .map(|name| home.join(".ssh").join(name))
        .filter(|path| path.exists())
        .collect()
}

/// Builds callbacks that authenticate and abort once the deadline passes.
///
/// The deadline is checked on every credentials request, on progress
/// reports (fetch) and before the pack is sent (push). Supplied credentials win for user/password transports. Otherwise SSH keys
/// from `~/.ssh/` are tried one per attempt, then the SSH agent, then the
/// default credential helper.
pub(crate) fn remote_callbacks<'a>(
    credentials: Option<&'a GitCredentials>,
    deadline: Deadline,
) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0usize;
    let mut ssh_attempts = 0usize;

    callbacks.credentials(move |url, username_from_url, allowed_types| {
        deadline.check()?;
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str(
                "authentication failed: all available credentials were rejected",
            ));
        }
        debug!(url, attempt = attempts, ?allowed_types, "credentials requested");

        if let Some(credentials) = credentials {
            if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
                return Cred::userpass_plaintext(&credentials.login, credentials.password());
            }
        }

        let user = username_from_url
            .or(credentials.map(|c| c.login.as_str()))
            .unwrap_or("git");

        if allowed_types.contains(CredentialType::SSH_KEY) {
            let keys = ssh_key_candidates();
            let index = ssh_attempts;
            ssh_attempts += 1;

            if let Some(key) = keys.get(index) {
                debug!(key = %key.display(), "trying ssh key");
                return Cred::ssh_key(user, None, key, None);
            }
            if index == keys.len() {
                debug!("trying ssh agent");
                return Cred::ssh_key_from_agent(user);
            }
        }

        if allowed_types.contains(CredentialType::USERNAME) {
            return Cred::username(user);
        }

        Cred::default()
    });

    callbacks.transfer_progress(move |_progress| !deadline.expired());
    callbacks.sideband_progress(move |_data| !deadline.expired());
    callbacks.push_negotiation(move |_updates| deadline.check());

    callbacks
}
