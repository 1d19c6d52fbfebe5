// ============================================================
// Layer 6 — Model Hub
// ============================================================
// Fetches the three files a pretrained model is built from:
//
//   config.json        → architecture hyper-parameters
//   tokenizer.json     → vocabulary + normalisation rules
//   model.safetensors  → weights
//
// Files come from https://huggingface.co/<repo>/resolve/main/<file>
// and are cached under <cache_dir>/<repo with '/' → '--'>/.
// A cached file is reused as-is; a download is streamed to
// "<file>.part" and renamed when complete, so an interrupted
// download never looks cached. A failed download removes its
// ".part" file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use futures_util::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;

const HF_BASE_URL: &str = "https://huggingface.co";

const CONFIG_FILE:    &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE:   &str = "model.safetensors";

/// Local paths of everything needed to build one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub config:    PathBuf,
    pub tokenizer: PathBuf,
    pub weights:   PathBuf,
}

pub struct ModelHub {
    cache_dir: PathBuf,
    client:    reqwest::Client,
}

impl ModelHub {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            client:    reqwest::Client::new(),
        }
    }

    pub fn resolve_url(repo_id: &str, file: &str) -> String {
        format!("{HF_BASE_URL}/{repo_id}/resolve/main/{file}")
    }

    pub fn repo_dir(&self, repo_id: &str) -> PathBuf {
        self.cache_dir.join(repo_id.replace('/', "--"))
    }

    /// Make sure all three files of `repo_id` are on disk.
    pub async fn fetch(&self, repo_id: &str) -> Result<ModelFiles> {
        let dir = self.repo_dir(repo_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Cannot create cache directory '{}'", dir.display()))?;

        Ok(ModelFiles {
            config:    self.fetch_file(repo_id, &dir, CONFIG_FILE).await?,
            tokenizer: self.fetch_file(repo_id, &dir, TOKENIZER_FILE).await?,
            weights:   self.fetch_file(repo_id, &dir, WEIGHTS_FILE).await?,
        })
    }

    async fn fetch_file(&self, repo_id: &str, dir: &Path, file: &str) -> Result<PathBuf> {
        let out_path = dir.join(file);
        if tokio::fs::try_exists(&out_path).await.unwrap_or(false) {
            tracing::debug!("Using cached '{}'", out_path.display());
            return Ok(out_path);
        }

        let url = Self::resolve_url(repo_id, file);
        tracing::info!("Downloading {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;
        if !response.status().is_success() {
            bail!(
                "HTTP {}: {} ({url})",
                response.status(),
                response.status().canonical_reason().unwrap_or("")
            );
        }

        save_stream(response.bytes_stream(), &out_path, &url).await?;
        Ok(out_path)
    }
}

/// Writes `stream` to `<out_path>.part`, then renames it to `out_path`.
/// On failure the partial file is deleted.
async fn save_stream<S, C, E>(stream: S, out_path: &Path, source: &str) -> Result<u64>
where
    S: Stream<Item = std::result::Result<C, E>>,
    C: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut part_name = out_path.as_os_str().to_owned();
    part_name.push(".part");
    let part_path = PathBuf::from(part_name);

    let result = write_part(stream, &part_path, out_path, source).await;
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&part_path).await {
            tracing::debug!("Cannot remove '{}': {e}", part_path.display());
        }
    }
    result
}

async fn write_part<S, C, E>(stream: S, part_path: &Path, out_path: &Path, source: &str) -> Result<u64>
where
    S: Stream<Item = std::result::Result<C, E>>,
    C: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut out = tokio::fs::File::create(part_path)
        .await
        .with_context(|| format!("Cannot create '{}'", part_path.display()))?;

    let mut stream = std::pin::pin!(stream);
    let mut bytes_done: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("Download of {source} interrupted"))?;
        out.write_all(chunk.as_ref()).await?;
        bytes_done += chunk.as_ref().len() as u64;
    }
    out.flush().await?;
    drop(out);

    tokio::fs::rename(part_path, out_path)
        .await
        .with_context(|| format!("Cannot move '{}' into place", part_path.display()))?;
    tracing::debug!("Saved {bytes_done} bytes to '{}'", out_path.display());
    Ok(bytes_done)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("qa_explainer_hub_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            ModelHub::resolve_url("distilgpt2", "config.json"),
            "https://huggingface.co/distilgpt2/resolve/main/config.json"
        );
        assert_eq!(
            ModelHub::resolve_url("openai-community/gpt2", "tokenizer.json"),
            "https://huggingface.co/openai-community/gpt2/resolve/main/tokenizer.json"
        );
    }

    #[test]
    fn test_repo_dir_flattens_namespaces() {
        let hub = ModelHub::new("model_cache");
        assert_eq!(hub.repo_dir("openai-community/gpt2"), PathBuf::from("model_cache/openai-community--gpt2"));
        assert_eq!(hub.repo_dir("distilgpt2"), PathBuf::from("model_cache/distilgpt2"));
    }

    #[tokio::test]
    async fn test_cached_files_are_reused_without_network() {
        let cache = temp_cache("cached");
        let hub   = ModelHub::new(&cache);
        let dir   = hub.repo_dir("some/model");
        std::fs::create_dir_all(&dir).unwrap();
        for file in [CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE] {
            std::fs::write(dir.join(file), b"{}").unwrap();
        }

        let files = hub.fetch("some/model").await.unwrap();
        assert_eq!(files.config, dir.join("config.json"));
        assert_eq!(files.tokenizer, dir.join("tokenizer.json"));
        assert_eq!(files.weights, dir.join("model.safetensors"));

        let _ = std::fs::remove_dir_all(&cache);
    }

    #[tokio::test]
    async fn test_interrupted_download_leaves_nothing_behind() {
        let cache = temp_cache("interrupted");
        std::fs::create_dir_all(&cache).unwrap();
        let out_path = cache.join(WEIGHTS_FILE);

        let chunks: Vec<std::result::Result<Vec<u8>, std::io::Error>> = vec![
            Ok(b"partial".to_vec()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let result = save_stream(futures_util::stream::iter(chunks), &out_path, "test").await;

        assert!(result.is_err());
        assert!(!out_path.exists());
        assert!(!cache.join("model.safetensors.part").exists());

        let _ = std::fs::remove_dir_all(&cache);
    }

    #[tokio::test]
    async fn test_complete_download_is_moved_into_place() {
        let cache = temp_cache("complete");
        std::fs::create_dir_all(&cache).unwrap();
        let out_path = cache.join(CONFIG_FILE);

        let chunks: Vec<std::result::Result<Vec<u8>, std::io::Error>> = vec![Ok(b"{\"a\":".to_vec()), Ok(b"1}".to_vec())];
        let written = save_stream(futures_util::stream::iter(chunks), &out_path, "test").await.unwrap();

        assert_eq!(written, 7);
        assert_eq!(std::fs::read_to_string(&out_path).unwrap(), "{\"a\":1}");
        assert!(!cache.join("config.json.part").exists());

        let _ = std::fs::remove_dir_all(&cache);
    }
}
