use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use blockshot_core::{ResourceFilter, ResourceRef};
use blockshot_logging::blockshot_debug;
use scraper::{Html, Selector};
use thiserror::Error;

use crate::decode::{decode_html, DecodeError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("resource {0} not found")]
    Missing(u64),
    #[error("render failed: {0}")]
    Render(String),
}

/// Source of resources and their rendered markup.
pub trait ResourceStore: Send + Sync {
    /// Non-deleted resources matching `filter`, ascending by id.
    fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<ResourceRef>, StoreError>;

    /// Fully rendered HTML of one resource. Each call is independent.
    fn render_to_html(&self, resource: &ResourceRef) -> Result<String, StoreError>;
}

/// Resources stored as `{root}/{id}.html`, one file per resource.
///
/// Full documents contribute their `<title>` and the inner HTML of `<body>`;
/// plain fragments are titled `resource {id}`.
///
/// Listing already parses each file for its title, so the body markup is kept
/// until the first `render_to_html` of that resource takes it. Later renders
/// read the file again.
#[derive(Debug)]
pub struct FsResourceStore {
    root: PathBuf,
    listed: Mutex<HashMap<u64, String>>,
}

struct LoadedResource {
    title: Option<String>,
    body: String,
}

impl FsResourceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            listed: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: u64) -> PathBuf {
        self.root.join(format!("{id}.html"))
    }

    fn load(&self, id: u64) -> Result<LoadedResource, StoreError> {
        let document = self.read_document(id)?;
        let body = Selector::parse("body").map_err(|err| StoreError::Render(err.to_string()))?;
        let body = document
            .select(&body)
            .next()
            .map(|node| node.inner_html())
            .unwrap_or_else(|| document.root_element().html());
        Ok(LoadedResource {
            title: document_title(&document),
            body,
        })
    }

    fn take_listed(&self, id: u64) -> Option<String> {
        self.listed.lock().ok()?.remove(&id)
    }

    fn read_document(&self, id: u64) -> Result<Html, StoreError> {
        let path = self.path_for(id);
        let bytes = fs::read(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => StoreError::Missing(id),
            _ => StoreError::Io(err),
        })?;
        let decoded = decode_html(&bytes)?;
        blockshot_debug!(
            "Decoded resource {} from {:?} as {}",
            id,
            path,
            decoded.encoding_label
        );
        Ok(Html::parse_document(&decoded.html))
    }

    fn stored_ids(&self) -> Result<Vec<u64>, StoreError> {
        let mut ids: Vec<u64> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .filter_map(|entry| parse_resource_file_name(&entry.file_name().to_string_lossy()))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}

impl ResourceStore for FsResourceStore {
    fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<ResourceRef>, StoreError> {
        let stored = self.stored_ids()?;
        let selected = stored.into_iter().filter(|id| match filter {
            ResourceFilter::All => true,
            ResourceFilter::Ids(wanted) => wanted.binary_search(id).is_ok(),
        });

        let resources = selected
            .map(|id| {
                // A broken file still gets listed; its render reports the error.
                let title = match self.load(id) {
                    Ok(loaded) => {
                        if let Ok(mut listed) = self.listed.lock() {
                            listed.insert(id, loaded.body);
                        }
                        loaded.title
                    }
                    Err(err) => {
                        blockshot_debug!("Resource {} listed without title: {}", id, err);
                        None
                    }
                };
                let title = title.unwrap_or_else(|| format!("resource {id}"));
                ResourceRef::new(id, title)
            })
            .collect();
        Ok(resources)
    }

    fn render_to_html(&self, resource: &ResourceRef) -> Result<String, StoreError> {
        if let Some(body) = self.take_listed(resource.id) {
            return Ok(body);
        }
        self.load(resource.id).map(|loaded| loaded.body)
    }
}

/// `"42.html"` -> `Some(42)`. Zero and anything else is ignored.
fn parse_resource_file_name(name: &str) -> Option<u64> {
    let stem = name.strip_suffix(".html")?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse::<u64>().ok().filter(|id| *id > 0)
}

fn document_title(doc: &Html) -> Option<String> {
    let title_sel = Selector::parse("title").ok()?;
    doc.select(&title_sel)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}
