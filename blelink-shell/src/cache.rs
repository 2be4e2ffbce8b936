/// name of the cache, bump it when the shell changes
pub const CACHE_NAME: &str = "pwa-bt-v1";

/// what gets precached when no `--asset` is given
pub const DEFAULT_ASSETS: &[&str] = &["/", "/index.html", "/manifest.webmanifest"];

/// Static files of the page shell, read once at install time and served
/// from memory after that.
#[derive(Debug)]
pub struct ShellCache {
    name: String,
    root: std::path::PathBuf,
    entries: std::collections::HashMap<String, Asset>,
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub content_type: &'static str,
    pub bytes: hyper::body::Bytes,
}

#[derive(thiserror::Error, Debug)]
pub enum InstallError {
    #[error("invalid asset path: {0}")]
    InvalidPath(String),
    #[error("failed to cache {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Where it came from, for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Disk,
}

impl ShellCache {
    /// Precache every asset under `root`. Either all of them make it into the
    /// cache or install fails.
    pub async fn install<S: AsRef<str>>(
        root: impl Into<std::path::PathBuf>,
        assets: &[S],
    ) -> Result<ShellCache, InstallError> {
        let root = root.into();
        let mut entries = std::collections::HashMap::new();

        for asset in assets {
            let asset = asset.as_ref();
            let file = file_path(asset).ok_or_else(|| InstallError::InvalidPath(asset.to_string()))?;
            let bytes = tokio::fs::read(root.join(&file))
                .await
                .map_err(|source| InstallError::Io {
                    path: asset.to_string(),
                    source,
                })?;
            entries.insert(
                cache_key(asset),
                Asset {
                    content_type: content_type(&file),
                    bytes: bytes.into(),
                },
            );
        }

        Ok(ShellCache {
            name: CACHE_NAME.to_string(),
            root,
            entries,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached copy if we have one, otherwise straight from disk. Disk reads
    /// are not added to the cache.
    pub async fn fetch(&self, path: &str) -> Result<(Asset, Source), FetchError> {
        if let Some(asset) = self.entries.get(&cache_key(path)) {
            return Ok((asset.clone(), Source::Cache));
        }

        let file = file_path(path).ok_or_else(|| FetchError::InvalidPath(path.to_string()))?;
        match tokio::fs::read(self.root.join(&file)).await {
            Ok(bytes) => Ok((
                Asset {
                    content_type: content_type(&file),
                    bytes: bytes.into(),
                },
                Source::Disk,
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(path.to_string()))
            }
            // a directory without index.html
            Err(e) if e.kind() == std::io::ErrorKind::IsADirectory => {
                Err(FetchError::NotFound(path.to_string()))
            }
            Err(source) => Err(FetchError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }
}

/// `./index.html`, `index.html` and `/index.html` are the same entry
fn cache_key(path: &str) -> String {
    let path = path.trim_start_matches('.').trim_start_matches('/');
    format!("/{path}")
}

/// relative file for a request path, `None` if it tries to leave the root
fn file_path(path: &str) -> Option<std::path::PathBuf> {
    let key = cache_key(path);
    let mut file = std::path::PathBuf::new();
    for part in key.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            p if p.contains('\\') => return None,
            p => file.push(p),
        }
    }
    if key.ends_with('/') {
        file.push("index.html");
    }
    Some(file)
}

fn content_type(file: &std::path::Path) -> &'static str {
    match file.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("webmanifest") => "application/manifest+json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("blelink-shell-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<h1>shell</h1>").unwrap();
        std::fs::write(dir.join("manifest.webmanifest"), "{}").unwrap();
        dir
    }

    #[test]
    fn paths() {
        assert_eq!(cache_key("./"), "/");
        assert_eq!(cache_key("./index.html"), "/index.html");
        assert_eq!(cache_key("index.html"), "/index.html");
        assert_eq!(file_path("/"), Some("index.html".into()));
        assert_eq!(file_path("/a/b.js"), Some("a/b.js".into()));
        assert_eq!(file_path("/a/"), Some("a/index.html".into()));
        assert_eq!(file_path("/../secret"), None);
        assert_eq!(file_path("/a/../../secret"), None);
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type("index.html".as_ref()), "text/html; charset=utf-8");
        assert_eq!(
            content_type("manifest.webmanifest".as_ref()),
            "application/manifest+json"
        );
        assert_eq!(content_type("blob".as_ref()), "application/octet-stream");
    }

    #[tokio::test]
    async fn install_and_fetch() {
        let root = temp_root("fetch");
        let cache = ShellCache::install(&root, DEFAULT_ASSETS).await.unwrap();
        assert_eq!(cache.name(), CACHE_NAME);
        assert_eq!(cache.len(), 3);

        // cached copy survives the file going away
        std::fs::remove_file(root.join("manifest.webmanifest")).unwrap();
        let (asset, source) = cache.fetch("/manifest.webmanifest").await.unwrap();
        assert_eq!(source, Source::Cache);
        assert_eq!(&asset.bytes[..], b"{}");

        let (asset, source) = cache.fetch("/").await.unwrap();
        assert_eq!(source, Source::Cache);
        assert_eq!(&asset.bytes[..], b"<h1>shell</h1>");
        assert_eq!(asset.content_type, "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn falls_through_to_disk() {
        let root = temp_root("disk");
        let cache = ShellCache::install(&root, &["/"]).await.unwrap();
        std::fs::write(root.join("late.js"), "1").unwrap();

        let (asset, source) = cache.fetch("/late.js").await.unwrap();
        assert_eq!(source, Source::Disk);
        assert_eq!(asset.content_type, "text/javascript; charset=utf-8");

        assert!(matches!(
            cache.fetch("/missing.css").await,
            Err(FetchError::NotFound(_))
        ));
        assert!(matches!(
            cache.fetch("/../etc/passwd").await,
            Err(FetchError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn install_is_all_or_nothing() {
        let root = temp_root("partial");
        let e = ShellCache::install(&root, &["/", "/app.js"]).await.unwrap_err();
        assert!(matches!(e, InstallError::Io { ref path, .. } if path == "/app.js"), "{e}");
    }
}
