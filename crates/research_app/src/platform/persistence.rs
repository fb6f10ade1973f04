use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use research_core::{Identity, Session};
use research_engine::{AtomicFileWriter, AuthSession, PersistError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSession {
    token: String,
    email: String,
    first_name: String,
    last_name: String,
}

/// Keeps the signed-in session between invocations as a RON file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable files mean "signed out".
    pub fn load(&self) -> Option<Session> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                engine_warn!("Failed to read session from {:?}: {}", self.path, err);
                return None;
            }
        };

        let persisted: PersistedSession = match ron::from_str(&content) {
            Ok(session) => session,
            Err(err) => {
                engine_warn!("Failed to parse session from {:?}: {}", self.path, err);
                return None;
            }
        };
        if persisted.token.is_empty() {
            return None;
        }

        Some(Session {
            credential: persisted.token,
            identity: Identity {
                email: persisted.email,
                first_name: persisted.first_name,
                last_name: persisted.last_name,
            },
        })
    }

    pub fn save(&self, session: &Session) -> Result<(), PersistError> {
        let persisted = PersistedSession {
            token: session.credential.clone(),
            email: session.identity.email.clone(),
            first_name: session.identity.first_name.clone(),
            last_name: session.identity.last_name.clone(),
        };
        let content = ron::ser::to_string_pretty(&persisted, ron::ser::PrettyConfig::new())
            .map_err(|err| PersistError::Io(std::io::Error::other(err.to_string())))?;

        let (dir, filename) = self.split_path()?;
        AtomicFileWriter::new(dir).write(&filename, &content)?;
        engine_info!("Saved session to {:?}", self.path);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), PersistError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                engine_info!("Removed session file {:?}", self.path);
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PersistError::Io(err)),
        }
    }

    fn split_path(&self) -> Result<(PathBuf, String), PersistError> {
        let filename = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                PersistError::OutputDir(format!("invalid session path {}", self.path.display()))
            })?
            .to_string();
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok((dir, filename))
    }
}

pub fn session_from_auth(auth: AuthSession) -> Session {
    Session {
        credential: auth.token,
        identity: Identity {
            email: auth.email,
            first_name: auth.first_name,
            last_name: auth.last_name,
        },
    }
}
