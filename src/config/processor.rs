//! The configuration processor.
//!
//! Fragments are queued with [`ConfigProcessor::add`] or
//! [`ConfigProcessor::extend`] and combined on [`ConfigProcessor::export`].
//! Each pending fragment is preprocessed, expanded against everything merged
//! so far, and then deep merged, in registration order. A fragment can
//! therefore reference values from any fragment registered before it, but
//! never from one registered after it.

use super::expand::{Expander, PropertyExpander};
use super::loader::ConfigSource;
use super::merge::merge_owned;
use super::preprocess::{Identity, Preprocessor};
use super::tree::{Tree, empty_tree, get_path};
use crate::error::{ConfigError, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

/// A fragment waiting to be processed.
#[derive(Debug, Clone)]
struct PendingFragment {
    /// `None` for anonymous fragments.
    source: Option<String>,
    tree: Tree,
}

/// Combines configuration fragments into one tree.
///
/// Named fragments occupy a slot keyed by their source identifier:
/// registering the same identifier again before the next export replaces the
/// pending tree in place. Anonymous fragments are always appended.
pub struct ConfigProcessor {
    /// Merged result of every exported fragment.
    processed: Tree,
    /// Fragments registered since the last export, in slot order.
    pending: Vec<PendingFragment>,
    preprocessor: Box<dyn Preprocessor>,
    expander: Box<dyn Expander>,
}

impl std::fmt::Debug for ConfigProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigProcessor")
            .field("processed", &self.processed)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigProcessor {
    /// Create a processor with no preprocessing and strict `${...}` expansion.
    pub fn new() -> Self {
        Self {
            processed: empty_tree(),
            pending: Vec::new(),
            preprocessor: Box::new(Identity),
            expander: Box::new(PropertyExpander::new()),
        }
    }

    /// Set the hook applied to each fragment before expansion.
    pub fn with_preprocessor(mut self, preprocessor: impl Preprocessor + 'static) -> Self {
        self.preprocessor = Box::new(preprocessor);
        self
    }

    /// Set the collaborator that resolves property references.
    pub fn with_expander(mut self, expander: impl Expander + 'static) -> Self {
        self.expander = Box::new(expander);
        self
    }

    /// Queue the tree exported by `source` under its source name.
    pub fn extend(&mut self, source: &dyn ConfigSource) -> &mut Self {
        self.add(source.export(), source.source_name())
    }

    /// Queue a fragment.
    ///
    /// An empty `source` registers the fragment anonymously.
    pub fn add(&mut self, tree: Tree, source: &str) -> &mut Self {
        if source.is_empty() {
            debug!("Queued anonymous config fragment");
            self.pending.push(PendingFragment { source: None, tree });
            return self;
        }

        let existing = self
            .pending
            .iter_mut()
            .find(|f| f.source.as_deref() == Some(source));
        match existing {
            Some(fragment) => {
                debug!(source = %source, "Replaced pending config fragment");
                fragment.tree = tree;
            }
            None => {
                debug!(source = %source, "Queued config fragment");
                self.pending.push(PendingFragment {
                    source: Some(source.to_string()),
                    tree,
                });
            }
        }
        self
    }

    /// Process pending fragments and return the merged tree.
    ///
    /// With nothing pending this returns the previous result unchanged.
    ///
    /// If a fragment fails to expand, fragments before it stay merged, the
    /// failing fragment contributes nothing, and the rest of the batch is
    /// discarded along with the queue.
    pub fn export(&mut self) -> Result<&Tree> {
        if !self.pending.is_empty() {
            let batch = self.fetch_pending();
            self.process(batch)?;
        }
        Ok(&self.processed)
    }

    /// Export and deserialize the merged tree into `T`.
    pub fn export_as<T: DeserializeOwned>(&mut self) -> Result<T> {
        let tree = self.export()?.clone();
        Ok(serde_json::from_value(tree)?)
    }

    /// Export and look up a dotted path in the merged tree.
    pub fn get(&mut self, path: &str) -> Result<Option<&Tree>> {
        let tree = self.export()?;
        Ok(get_path(tree, path))
    }

    /// Whether fragments are waiting for the next export.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Source identifiers of pending fragments, `None` for anonymous ones.
    pub fn pending_sources(&self) -> Vec<Option<&str>> {
        self.pending.iter().map(|f| f.source.as_deref()).collect()
    }

    /// Take the pending queue, leaving it empty.
    fn fetch_pending(&mut self) -> Vec<PendingFragment> {
        std::mem::take(&mut self.pending)
    }

    /// Preprocess every fragment, then fold them into the processed tree.
    fn process(&mut self, batch: Vec<PendingFragment>) -> Result<()> {
        let batch: Vec<PendingFragment> = batch
            .into_iter()
            .map(|f| PendingFragment {
                source: f.source,
                tree: self.preprocessor.preprocess(f.tree),
            })
            .collect();

        debug!(fragments = batch.len(), "Processing config fragments");
        for fragment in batch {
            self.reduce_one(fragment)?;
        }
        Ok(())
    }

    /// Expand one fragment against the carry and merge it in.
    fn reduce_one(&mut self, fragment: PendingFragment) -> Result<()> {
        let evaluated = self
            .expander
            .expand(&fragment.tree, &self.processed)
            .map_err(|e| ConfigError::expansion(fragment.source.as_deref(), e))?;

        let carry = std::mem::take(&mut self.processed);
        self.processed = merge_owned(carry, &evaluated);
        debug!(
            source = fragment.source.as_deref().unwrap_or("<anonymous>"),
            "Merged config fragment"
        );
        Ok(())
    }
}
