use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed `uses:` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActionRef {
    /// An action in a remote repository: `owner/repo[/path][@ref]`.
    Remote {
        repository: String,
        path: String,
        git_ref: String,
    },
    /// An action in the calling repository: `./path/to/action`.
    Local { path: String },
    /// A container image: `docker://image:tag`.
    Docker { image: String },
}

impl ActionRef {
    /// `owner/name` for remote actions, empty otherwise.
    pub fn repository(&self) -> &str {
        match self {
            ActionRef::Remote { repository, .. } => repository,
            _ => "",
        }
    }

    /// Sub-path inside the repository. Local actions report their full reference.
    pub fn path(&self) -> &str {
        match self {
            ActionRef::Remote { path, .. } | ActionRef::Local { path } => path,
            ActionRef::Docker { .. } => "",
        }
    }

    /// Pinned commitish, empty when the reference omits one.
    pub fn git_ref(&self) -> &str {
        match self {
            ActionRef::Remote { git_ref, .. } => git_ref,
            _ => "",
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ActionRef::Remote { .. })
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionRef::Remote {
                repository,
                path,
                git_ref,
            } => f.write_str(&format_label(repository, path, git_ref)),
            ActionRef::Local { path } => f.write_str(path),
            ActionRef::Docker { image } => write!(f, "docker://{}", image),
        }
    }
}

/// Render `repository[/path]@ref` the way reports and graphs show an action.
pub fn format_label(repository: &str, path: &str, git_ref: &str) -> String {
    let mut label = repository.to_string();
    if !path.is_empty() {
        label.push('/');
        label.push_str(path);
    }
    if !git_ref.is_empty() {
        label.push('@');
        label.push_str(git_ref);
    }
    label
}

/// Parse a step's `uses:` string.
///
/// The ref is everything after the last `@`. Of the remainder, the first two
/// `/`-separated segments name the repository and the rest form the sub-path.
/// Any other `@` left in the location makes the reference invalid.
/// A blank input yields [`AuditError::BlankReference`], which callers treat as
/// an inline step rather than a failure.
pub fn parse_reference(uses: &str) -> Result<ActionRef> {
    let uses = uses.trim();
    if uses.is_empty() {
        return Err(AuditError::BlankReference);
    }

    if uses.starts_with("./") {
        return Ok(ActionRef::Local {
            path: uses.to_string(),
        });
    }

    if let Some(image) = uses.strip_prefix("docker://") {
        return Ok(ActionRef::Docker {
            image: image.to_string(),
        });
    }

    let (location, git_ref) = match uses.rsplit_once('@') {
        Some((location, git_ref)) => (location, git_ref),
        None => (uses, ""),
    };

    let segments: Vec<&str> = location.split('/').collect();
    if segments.len() < 2
        || segments[0].is_empty()
        || segments[1].is_empty()
        || location.contains('@')
    {
        return Err(AuditError::InvalidReference(uses.to_string()));
    }

    let path = segments[2..]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");

    Ok(ActionRef::Remote {
        repository: format!("{}/{}", segments[0], segments[1]),
        path,
        git_ref: git_ref.to_string(),
    })
}
