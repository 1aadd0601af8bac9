use thiserror::Error;

/// Errors raised while resolving and auditing workflow actions.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("uses statement is null or blank, nothing to parse")]
    BlankReference,

    #[error("invalid action reference '{0}': expected owner/repo[/path][@ref]")]
    InvalidReference(String),

    #[error("unable to find {path} in github repo@ref {repository}@{git_ref}")]
    NotFound {
        repository: String,
        path: String,
        git_ref: String,
    },

    #[error(
        "unable to find action at either {primary} or {secondary} in repo {repository} at ref {git_ref}: {primary_cause}; {secondary_cause}"
    )]
    ManifestMissing {
        repository: String,
        git_ref: String,
        primary: String,
        secondary: String,
        primary_cause: Box<AuditError>,
        secondary_cause: Box<AuditError>,
    },

    #[error("received unexpected http status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("GitHub token contains characters not allowed in an HTTP header")]
    InvalidToken,

    #[error("unrecognised node runtime '{0}'")]
    InvalidRuntime(String),

    #[error("dependency cycle detected: {}", .chain.join(" -> "))]
    CycleDetected { chain: Vec<String> },

    #[error("failed to decode action manifest from {source_url}: {source}")]
    Manifest {
        source_url: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AuditError {
    /// True when a manifest location simply does not exist at the requested ref.
    pub fn is_not_found(&self) -> bool {
        match self {
            AuditError::NotFound { .. } => true,
            AuditError::ManifestMissing {
                primary_cause,
                secondary_cause,
                ..
            } => primary_cause.is_not_found() && secondary_cause.is_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
