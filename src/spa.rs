//! Static file serving with a single-page-app fallback.
//!
//! Request paths are decoded and normalized before they touch the
//! filesystem, so `..` can never climb out of the static root. Paths with no
//! matching file get the app's entry file, which lets the client-side router
//! handle them.

use axum::{
    extract::Request,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};
use percent_encoding::percent_decode_str;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, warn};

pub const INDEX_FILE: &str = "index.html";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid request path {0:?}")]
    BadPath(String),

    #[error("{0}")]
    Stat(io::Error),
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        let status = match self {
            ResolveError::BadPath(_) => StatusCode::BAD_REQUEST,
            ResolveError::Stat(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// A decoded request path with every `.`, `..` and empty segment folded away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPath {
    segments: Vec<String>,
}

impl CanonicalPath {
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let decoded = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|_| ResolveError::BadPath(raw.to_string()))?;
        if decoded.contains('\0') {
            return Err(ResolveError::BadPath(raw.to_string()));
        }

        let mut segments: Vec<String> = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                name => segments.push(name.to_string()),
            }
        }

        Ok(Self { segments })
    }

    pub fn relative(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A file under the static root. Directories resolve to their own index.
    Asset(PathBuf),
    /// Nothing matched; the entry file stands in.
    Fallback(PathBuf),
}

/// Resolves `request_path` against `root`, falling back to `root/index`.
pub fn resolve(root: &Path, index: &str, request_path: &str) -> Result<Resolved, ResolveError> {
    let canonical = CanonicalPath::parse(request_path)?;
    let candidate = root.join(canonical.relative());
    let fallback = || Resolved::Fallback(root.join(index));

    match std::fs::metadata(&candidate) {
        Ok(meta) if meta.is_dir() => {
            let dir_index = candidate.join(index);
            match std::fs::metadata(&dir_index) {
                Ok(meta) if meta.is_file() => Ok(Resolved::Asset(dir_index)),
                Ok(_) => Ok(fallback()),
                Err(e) if is_missing(&e) => Ok(fallback()),
                Err(e) => Err(ResolveError::Stat(e)),
            }
        }
        Ok(_) => Ok(Resolved::Asset(candidate)),
        Err(e) if is_missing(&e) => Ok(fallback()),
        Err(e) => Err(ResolveError::Stat(e)),
    }
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

#[derive(Debug, Clone)]
pub struct Spa {
    root: PathBuf,
    index: String,
}

impl Spa {
    pub fn new(root: impl Into<PathBuf>, index: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index: index.into(),
        }
    }

    pub fn resolve(&self, request_path: &str) -> Result<Resolved, ResolveError> {
        resolve(&self.root, &self.index, request_path)
    }

    /// Serves the resolved file through `ServeFile`, which handles content
    /// type, conditional and range requests. Only GET and HEAD are accepted,
    /// whether or not the path matched an asset.
    pub async fn serve(&self, req: Request) -> Response {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, "GET, HEAD")],
            )
                .into_response();
        }

        let raw = req.uri().path().to_string();
        let file = match self.resolve(&raw) {
            Ok(Resolved::Asset(file)) => {
                debug!("serving {:?} for {}", file, raw);
                file
            }
            Ok(Resolved::Fallback(index)) => {
                debug!("no asset for {}, serving {:?}", raw, index);
                index
            }
            Err(e) => {
                warn!("⚠️ cannot serve {}: {}", raw, e);
                return e.into_response();
            }
        };

        match ServeFile::new(file).oneshot(req).await {
            Ok(res) => res.into_response(),
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn static_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INDEX_FILE), "<html>app</html>").unwrap();
        fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        fs::create_dir(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/logo.svg"), "<svg/>").unwrap();
        dir
    }

    #[test]
    fn test_canonical_folds_dot_segments() {
        let path = CanonicalPath::parse("/a/./b/../c//d").unwrap();
        assert_eq!(path.relative(), PathBuf::from("a/c/d"));
    }

    #[test]
    fn test_canonical_never_climbs_above_root() {
        let path = CanonicalPath::parse("/../../etc/passwd").unwrap();
        assert_eq!(path.relative(), PathBuf::from("etc/passwd"));

        let encoded = CanonicalPath::parse("/%2e%2e/%2e%2e/etc/passwd").unwrap();
        assert_eq!(encoded.relative(), PathBuf::from("etc/passwd"));
    }

    #[test]
    fn test_canonical_decodes_percent_escapes() {
        let path = CanonicalPath::parse("/my%20file.txt").unwrap();
        assert_eq!(path.relative(), PathBuf::from("my file.txt"));
        assert_eq!(CanonicalPath::parse("/").unwrap().relative(), PathBuf::new());
    }

    #[test]
    fn test_canonical_rejects_bad_encoding() {
        assert!(matches!(
            CanonicalPath::parse("/%ff%fe"),
            Err(ResolveError::BadPath(_))
        ));
        assert!(matches!(
            CanonicalPath::parse("/a%00b"),
            Err(ResolveError::BadPath(_))
        ));
    }

    #[test]
    fn test_resolve_existing_asset() {
        let root = static_root();
        let resolved = resolve(root.path(), INDEX_FILE, "/img/./logo.svg").unwrap();
        assert_eq!(resolved, Resolved::Asset(root.path().join("img/logo.svg")));
    }

    #[test]
    fn test_resolve_traversal_stays_inside_root() {
        let root = static_root();
        let resolved = resolve(root.path(), INDEX_FILE, "/../../etc/passwd").unwrap();
        assert_eq!(resolved, Resolved::Fallback(root.path().join(INDEX_FILE)));

        fs::create_dir(root.path().join("etc")).unwrap();
        fs::write(root.path().join("etc/passwd"), "decoy").unwrap();
        let resolved = resolve(root.path(), INDEX_FILE, "/../../etc/passwd").unwrap();
        assert_eq!(resolved, Resolved::Asset(root.path().join("etc/passwd")));
    }

    #[test]
    fn test_resolve_missing_paths_fall_back() {
        let root = static_root();
        let fallback = Resolved::Fallback(root.path().join(INDEX_FILE));

        for path in [
            "/settings",
            "/camera/live/view",
            "/a/b/c/d/e/f/g/h",
            "/app.js/not-a-dir",
            "/img/missing.png",
        ] {
            assert_eq!(resolve(root.path(), INDEX_FILE, path).unwrap(), fallback, "{}", path);
        }
    }

    #[test]
    fn test_resolve_root_serves_its_index() {
        let root = static_root();
        let spa = Spa::new(root.path(), INDEX_FILE);
        let resolved = spa.resolve("/").unwrap();
        assert_eq!(resolved, Resolved::Asset(root.path().join(INDEX_FILE)));
    }

    #[test]
    fn test_resolve_directory_without_index_falls_back() {
        let root = static_root();
        let fallback = Resolved::Fallback(root.path().join(INDEX_FILE));
        assert_eq!(resolve(root.path(), INDEX_FILE, "/img").unwrap(), fallback);
        assert_eq!(resolve(root.path(), INDEX_FILE, "/img/").unwrap(), fallback);
    }

    #[test]
    fn test_resolve_directory_with_index() {
        let root = static_root();
        fs::create_dir(root.path().join("docs")).unwrap();
        fs::write(root.path().join("docs").join(INDEX_FILE), "docs").unwrap();

        let resolved = resolve(root.path(), INDEX_FILE, "/docs").unwrap();
        assert_eq!(resolved, Resolved::Asset(root.path().join("docs").join(INDEX_FILE)));
    }
}
