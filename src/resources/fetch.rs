//! Byte sources for archives and textures.
//!
//! Loading never blocks: every fetch is a future the resolver polls together
//! with its siblings on the caller's task.

use std::path::PathBuf;

use futures::future::{FutureExt, LocalBoxFuture};

/// Fetches the raw bytes behind an asset key such as `"pine.pba"`.
pub trait Fetch {
    fn fetch<'a>(&'a self, key: &'a str) -> LocalBoxFuture<'a, anyhow::Result<Vec<u8>>>;
}

/// Fetches assets below a root directory (native) or the page's `assets/` url (wasm).
#[derive(Clone, Debug)]
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for AssetDir {
    fn default() -> Self {
        Self::new(std::path::Path::new("./").join("assets"))
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(root: &std::path::Path, key: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("no location origin"))?;
    let base = reqwest::Url::parse(&format!("{}/{}/", origin, root.display()))?;
    Ok(base.join(key)?)
}

impl Fetch for AssetDir {
    fn fetch<'a>(&'a self, key: &'a str) -> LocalBoxFuture<'a, anyhow::Result<Vec<u8>>> {
        async move {
            #[cfg(target_arch = "wasm32")]
            let data = {
                let url = format_url(&self.root, key)?;
                reqwest::get(url).await?.error_for_status()?.bytes().await?.to_vec()
            };
            #[cfg(not(target_arch = "wasm32"))]
            let data = tokio::fs::read(self.root.join(key)).await?;

            log::debug!("fetched {key} ({} bytes)", data.len());
            Ok(data)
        }
        .boxed_local()
    }
}
