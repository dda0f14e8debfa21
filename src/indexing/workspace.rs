//! The async front door: indexing and queries over one [`IndexEngine`].
//!
//! Every operation that writes or reads the rows of a document holds that
//! document's [`UriLocks`] entry for its whole duration. Documents opened in
//! an editor are kept parsed in memory and never written to the store; an
//! [`OpenOverlay`] serves them in place of their stored rows.

use super::file_info::{file_mtime, get_utc_timestamp, path_to_uri, uri_to_path};
use super::lock::UriLocks;
use super::overlay::{OpenDocuments, OpenOverlay};
use super::progress::IndexStats;
use super::walker::FileWalker;
use crate::config::Settings;
use crate::document::SourceDocument;
use crate::error::{IndexError, IndexResult};
use crate::parsing::PhpParser;
use crate::resolve::{self, DocumentContext, Hover, SignatureHelp};
use crate::storage::IndexEngine;
use crate::symbol::{Reference, Symbol};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// What [`Workspace::sync_file_system`] did with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Indexed { symbols: usize },
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct Workspace {
    engine: Arc<IndexEngine>,
    settings: Arc<Settings>,
    locks: UriLocks,
    open: Arc<OpenDocuments>,
}

impl Workspace {
    pub fn new(engine: IndexEngine, settings: Settings) -> Self {
        Self {
            engine: Arc::new(engine),
            settings: Arc::new(settings),
            locks: UriLocks::new(),
            open: Arc::new(OpenDocuments::new()),
        }
    }

    /// Engine persisted under the configured index directory, or a
    /// volatile one when persistence is off.
    pub fn open(settings: Settings) -> IndexResult<Self> {
        let engine = if settings.index.persist {
            IndexEngine::open(settings.index_dir())?
        } else {
            IndexEngine::in_memory()
        };
        Ok(Self::new(engine, settings))
    }

    pub fn in_memory() -> Self {
        let mut settings = Settings::default();
        settings.index.persist = false;
        Self::new(IndexEngine::in_memory(), settings)
    }

    pub fn engine(&self) -> &IndexEngine {
        &self.engine
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn locks(&self) -> &UriLocks {
        &self.locks
    }

    fn provider(&self) -> OpenOverlay<'_> {
        OpenOverlay::new(&self.engine, &self.open)
    }

    // Indexing

    /// Replaces the stored rows of `doc.uri` with `doc`'s contents. For a
    /// document open in an editor the resident buffer is replaced instead.
    pub async fn index_file(&self, doc: &SourceDocument) -> IndexResult<()> {
        let _guard = self.locks.lock(&doc.uri).await;
        if let Some(mut open) = self.open.get_mut(&doc.uri) {
            *open = Arc::new(doc.clone());
            return Ok(());
        }
        self.store(doc)
    }

    fn store(&self, doc: &SourceDocument) -> IndexResult<()> {
        self.engine
            .replace_document(&doc.record(), &doc.symbols, &doc.references, &doc.scopes)?;
        debug!(uri = %doc.uri, symbols = doc.symbols.len(), "indexed document");
        Ok(())
    }

    pub async fn remove_document(&self, uri: &str) -> IndexResult<bool> {
        let _guard = self.locks.lock(uri).await;
        Ok(self.engine.remove_document(uri)?)
    }

    /// Re-indexes the file behind `uri` when `mtime` differs from the
    /// indexed copy's. Documents open in an editor are left alone.
    pub async fn sync_file_system(&self, uri: &str, mtime: i64) -> IndexResult<SyncOutcome> {
        if self.open.contains_key(uri) || self.is_current(uri, mtime)? {
            return Ok(SyncOutcome::Unchanged);
        }
        self.index_from_disk(uri, mtime, false).await
    }

    fn is_current(&self, uri: &str, mtime: i64) -> IndexResult<bool> {
        Ok(self
            .engine
            .document(uri)?
            .is_some_and(|record| record.mtime == mtime))
    }

    /// [`Self::sync_file_system`] for a path, using its current mtime.
    pub async fn index_path(&self, path: &Path) -> IndexResult<SyncOutcome> {
        let mtime = file_mtime(path).map_err(|source| IndexError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.sync_file_system(&path_to_uri(path), mtime).await
    }

    /// Reads and parses unlocked, then stores under the lock unless the
    /// document was opened in the meantime, or (without `force`) brought up
    /// to date.
    async fn index_from_disk(&self, uri: &str, mtime: i64, force: bool) -> IndexResult<SyncOutcome> {
        let path = uri_to_path(uri)
            .ok_or_else(|| IndexError::General(format!("'{uri}' is not a file uri")))?;
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| IndexError::FileRead { path, source })?;

        let doc = parse(uri, text, mtime).await?;
        let _guard = self.locks.lock(uri).await;
        if self.open.contains_key(uri) || (!force && self.is_current(uri, mtime)?) {
            return Ok(SyncOutcome::Unchanged);
        }
        self.store(&doc)?;
        Ok(SyncOutcome::Indexed {
            symbols: doc.symbols.len(),
        })
    }

    /// Indexes every PHP file under `root` and drops indexed documents under
    /// `root` whose file is gone. One task per file; a failing file is
    /// reported in the stats without stopping the others.
    pub async fn index_workspace(&self, root: &Path) -> IndexResult<IndexStats> {
        let mut stats = IndexStats::new();

        let walker = FileWalker::new(self.settings.clone());
        let walk_root = root.to_path_buf();
        let files: Vec<PathBuf> = tokio::task::spawn_blocking(move || walker.walk(&walk_root).collect::<Vec<_>>())
            .await
            .map_err(|e| IndexError::TaskFailed {
                uri: path_to_uri(root),
                reason: e.to_string(),
            })?;
        info!(root = %root.display(), files = files.len(), "indexing workspace");

        let permits = Arc::new(Semaphore::new(self.settings.indexing.max_concurrent_files.max(1)));
        let mut tasks = JoinSet::new();
        let mut task_uris = HashMap::new();
        let mut seen = HashSet::new();

        for path in files {
            let uri = path_to_uri(&path);
            seen.insert(uri.clone());

            let workspace = self.clone();
            let permits = permits.clone();
            let handle = tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                workspace.index_path(&path).await
            });
            task_uris.insert(handle.id(), uri);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, Ok(outcome))) => {
                    task_uris.remove(&id);
                    match outcome {
                        SyncOutcome::Indexed { symbols } => {
                            stats.files_indexed += 1;
                            stats.symbols_found += symbols;
                        }
                        SyncOutcome::Unchanged => stats.files_unchanged += 1,
                    }
                }
                Ok((id, Err(e))) => {
                    let uri = task_uris.remove(&id).unwrap_or_default();
                    warn!(uri = %uri, error = %e, "failed to index file");
                    stats.add_error(uri, e.to_string());
                }
                Err(e) => {
                    let uri = task_uris.remove(&e.id()).unwrap_or_default();
                    warn!(uri = %uri, error = %e, "indexing task did not complete");
                    stats.add_error(uri, e.to_string());
                }
            }
        }

        stats.files_removed = self.remove_missing(root, &seen).await?;
        self.flush().await?;

        stats.stop_timing();
        info!(
            indexed = stats.files_indexed,
            unchanged = stats.files_unchanged,
            removed = stats.files_removed,
            failed = stats.files_failed,
            "workspace indexed"
        );
        Ok(stats)
    }

    async fn remove_missing(&self, root: &Path, seen: &HashSet<String>) -> IndexResult<usize> {
        let prefix = format!("{}/", path_to_uri(root).trim_end_matches('/'));
        let mut removed = 0;
        for uri in self.engine.document_uris()? {
            if uri.starts_with(&prefix)
                && !seen.contains(&uri)
                && !self.open.contains_key(&uri)
                && self.remove_document(&uri).await?
            {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Writes the store to disk when persistence is on.
    pub async fn flush(&self) -> IndexResult<()> {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.flush())
            .await
            .map_err(|e| IndexError::TaskFailed {
                uri: String::new(),
                reason: e.to_string(),
            })??;
        Ok(())
    }

    // Editor documents

    /// Parses an editor buffer and keeps it in memory; queries on `uri`
    /// and lookups from other documents use it instead of the store.
    pub async fn open_document(&self, uri: &str, text: String) -> IndexResult<Arc<SourceDocument>> {
        let doc = Arc::new(parse(uri, text, get_utc_timestamp() as i64).await?);
        let _guard = self.locks.lock(uri).await;
        self.open.insert(uri.to_string(), doc.clone());
        debug!(uri, symbols = doc.symbols.len(), "opened document");
        Ok(doc)
    }

    pub async fn update_document(&self, uri: &str, text: String) -> IndexResult<Arc<SourceDocument>> {
        self.open_document(uri, text).await
    }

    /// Forgets the editor buffer and re-indexes what is on disk, or drops
    /// the document when the file is gone.
    pub async fn close_document(&self, uri: &str) -> IndexResult<()> {
        {
            let _guard = self.locks.lock(uri).await;
            self.open.remove(uri);
        }
        let on_disk = uri_to_path(uri).and_then(|path| file_mtime(&path).ok());
        match on_disk {
            Some(mtime) => {
                self.index_from_disk(uri, mtime, true).await?;
            }
            None => {
                self.remove_document(uri).await?;
            }
        }
        Ok(())
    }

    pub fn open_document_for(&self, uri: &str) -> Option<Arc<SourceDocument>> {
        self.open.get(uri).map(|doc| doc.clone())
    }

    // Queries

    fn context(&self, uri: &str) -> IndexResult<DocumentContext> {
        if let Some(doc) = self.open.get(uri) {
            return Ok(doc.context());
        }
        match self.engine.document(uri)? {
            Some(record) => Ok(DocumentContext::from_record(record, self.engine.scopes_of(uri)?)),
            None => Ok(DocumentContext {
                uri: uri.to_string(),
                ..Default::default()
            }),
        }
    }

    fn reference_at(&self, uri: &str, offset: u32) -> IndexResult<Option<Reference>> {
        if let Some(doc) = self.open.get(uri) {
            return Ok(doc.reference_at(offset).cloned());
        }
        Ok(self.engine.find_at(uri, offset)?)
    }

    fn call_at(&self, uri: &str, offset: u32) -> IndexResult<Option<Reference>> {
        if let Some(doc) = self.open.get(uri) {
            return Ok(doc.enclosing_call(offset).cloned());
        }
        Ok(self.engine.find_enclosing_call(uri, offset)?)
    }

    /// Innermost reference of `uri` containing `offset`.
    pub async fn find_at(&self, uri: &str, offset: u32) -> IndexResult<Option<Reference>> {
        let _guard = self.locks.lock(uri).await;
        self.reference_at(uri, offset)
    }

    /// Declarations `reference`, found in `uri`, refers to.
    pub async fn get_symbols_by_reference(
        &self,
        uri: &str,
        reference: &Reference,
    ) -> IndexResult<Vec<Symbol>> {
        let _guard = self.locks.lock(uri).await;
        let ctx = self.context(uri)?;
        Ok(resolve::get_symbols_by_reference(&self.provider(), &ctx, reference)?)
    }

    /// Completion candidates for `reference` with the cursor at `offset`.
    pub async fn search_symbols_for_reference(
        &self,
        uri: &str,
        reference: &Reference,
        offset: u32,
    ) -> IndexResult<Vec<Symbol>> {
        let _guard = self.locks.lock(uri).await;
        let ctx = self.context(uri)?;
        Ok(resolve::search_symbols_for_reference(
            &self.provider(),
            &ctx,
            reference,
            offset,
            self.settings.completion.limit,
        )?)
    }

    pub async fn get_signature_help(&self, uri: &str, offset: u32) -> IndexResult<Option<SignatureHelp>> {
        let _guard = self.locks.lock(uri).await;
        let Some(call) = self.call_at(uri, offset)? else {
            return Ok(None);
        };
        let ctx = self.context(uri)?;
        Ok(resolve::get_signature_help(&self.provider(), &ctx, &call, offset)?)
    }

    /// Locate and resolve in one step.
    pub async fn definition(&self, uri: &str, offset: u32) -> IndexResult<Vec<Symbol>> {
        let _guard = self.locks.lock(uri).await;
        let Some(reference) = self.reference_at(uri, offset)? else {
            return Ok(Vec::new());
        };
        let ctx = self.context(uri)?;
        Ok(resolve::get_symbols_by_reference(&self.provider(), &ctx, &reference)?)
    }

    pub async fn completion(&self, uri: &str, offset: u32) -> IndexResult<Vec<Symbol>> {
        let _guard = self.locks.lock(uri).await;
        let Some(reference) = self.reference_at(uri, offset)? else {
            return Ok(Vec::new());
        };
        let ctx = self.context(uri)?;
        Ok(resolve::search_symbols_for_reference(
            &self.provider(),
            &ctx,
            &reference,
            offset,
            self.settings.completion.limit,
        )?)
    }

    pub async fn hover(&self, uri: &str, offset: u32) -> IndexResult<Option<Hover>> {
        let _guard = self.locks.lock(uri).await;
        let Some(reference) = self.reference_at(uri, offset)? else {
            return Ok(None);
        };
        let ctx = self.context(uri)?;
        Ok(resolve::hover(&self.provider(), &ctx, &reference)?)
    }

    /// Declarations of `uri` in source order.
    pub async fn document_symbols(&self, uri: &str) -> IndexResult<Vec<Symbol>> {
        let _guard = self.locks.lock(uri).await;
        if let Some(doc) = self.open.get(uri) {
            return Ok(doc.symbols_in_source_order());
        }
        Ok(self.engine.document_symbols(uri)?)
    }

    pub async fn workspace_symbols(&self, query: &str) -> IndexResult<Vec<Symbol>> {
        Ok(resolve::workspace_symbols(
            &self.provider(),
            query,
            self.settings.completion.limit,
        )?)
    }
}

/// Parses on the blocking pool.
async fn parse(uri: &str, text: String, mtime: i64) -> IndexResult<SourceDocument> {
    let task_uri = uri.to_string();
    tokio::task::spawn_blocking(move || -> IndexResult<SourceDocument> {
        let mut parser = PhpParser::new()?;
        Ok(SourceDocument::parse(&mut parser, task_uri, text, mtime)?)
    })
    .await
    .map_err(|e| IndexError::TaskFailed {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?
}
