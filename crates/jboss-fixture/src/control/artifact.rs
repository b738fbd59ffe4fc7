//! Deployable artifact locations.

use std::fmt;
use std::io;
use std::path::{self, Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// A location the deployer can fetch: a URL, or a local path expressed as a
/// `file:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    url: Url,
}

impl Artifact {
    /// Uses `url` as given; the deployer fetches it itself.
    #[must_use]
    pub const fn from_url(url: Url) -> Self {
        Self { url }
    }

    /// Converts a filesystem path, resolving it against the working directory
    /// when relative.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let absolute = path::absolute(path).map_err(|source| ArtifactError::Resolve {
            path: path.to_path_buf(),
            source,
        })?;
        Url::from_file_path(&absolute)
            .map(Self::from_url)
            .map_err(|()| ArtifactError::NotAbsolute { path: absolute })
    }

    /// Location passed to the deployer.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Last non-empty path segment, e.g. `app.war`.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.url
            .path_segments()
            .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
            .unwrap_or_else(|| self.url.as_str())
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.url, formatter)
    }
}

impl FromStr for Artifact {
    type Err = ArtifactError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ArtifactError::Empty);
        }
        match Url::parse(trimmed) {
            // Single-letter schemes are Windows drive letters, not URLs.
            Ok(url) if url.scheme().len() > 1 => Ok(Self::from_url(url)),
            Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => Self::from_path(trimmed),
            Err(source) => Err(ArtifactError::InvalidUrl {
                input: trimmed.to_string(),
                source,
            }),
        }
    }
}

/// Errors raised while interpreting an artifact location.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact location must not be empty")]
    Empty,
    #[error("invalid artifact URL '{input}': {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to resolve artifact path {path:?}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("artifact path {path:?} cannot be expressed as a file URL")]
    NotAbsolute { path: PathBuf },
}
