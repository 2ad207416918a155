//! Tracks which retrieved articles the operator marked relevant.
//!
//! Selection is keyed by position, so it is scoped to exactly one retrieval
//! batch: loading a new article list creates a new batch id and an empty
//! selection. Toggles addressed to an older batch, or to an index outside the
//! current list, are ignored.

use std::collections::BTreeMap;

use tracing::debug;
use uuid::Uuid;

use crate::contract::Article;

#[derive(Debug, Clone)]
pub struct SelectionStore {
    batch_id: Uuid,
    articles: Vec<Article>,
    selected: BTreeMap<usize, bool>,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::load(Vec::new())
    }
}

impl SelectionStore {
    /// Starts a fresh batch with nothing selected.
    pub fn load(articles: Vec<Article>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            articles,
            selected: BTreeMap::new(),
        }
    }

    /// Drops the article list and every selection.
    pub fn clear(&mut self) {
        *self = Self::load(Vec::new());
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Sets or clears the flag for `index`. Returns `false` (and changes
    /// nothing) when the index is not in the current list.
    pub fn toggle(&mut self, index: usize, selected: bool) -> bool {
        if index >= self.articles.len() {
            debug!(index, len = self.articles.len(), "Ignoring toggle for unknown article index");
            return false;
        }
        if selected {
            self.selected.insert(index, true);
        } else {
            self.selected.remove(&index);
        }
        true
    }

    /// Like [`toggle`](Self::toggle), but only if `batch_id` is still current.
    pub fn toggle_in_batch(&mut self, batch_id: Uuid, index: usize, selected: bool) -> bool {
        if batch_id != self.batch_id {
            debug!(%batch_id, current = %self.batch_id, "Ignoring toggle for superseded batch");
            return false;
        }
        self.toggle(index, selected)
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(&index).copied().unwrap_or(false)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.values().filter(|s| **s).count()
    }

    /// Selected articles in retrieval order.
    pub fn selected_articles(&self) -> Vec<Article> {
        self.articles
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.is_selected(*idx))
            .map(|(_, a)| a.clone())
            .collect()
    }
}
