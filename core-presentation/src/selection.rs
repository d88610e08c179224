//! Selection scoping
//!
//! Raw record identifiers coming out of a seed query are too literal to drive
//! content directly: depending on the caller's intent, picking a child element
//! may mean "this element", "its assembly", or "the whole top assembly".
//! [`SelectionScope`] names that intent and [`SelectionKeySet`] is the
//! normalized result — an order-independent, deduplicated set, so two
//! identifier sequences that denote the same units compare equal.

use crate::error::{PresentationError, Result};
use core_snapshot::{LocalSnapshot, RecordId};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::debug;

/// How raw identifiers are widened into selected units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionScope {
    /// The element itself.
    Element,
    /// The direct parent when one exists, else the element itself.
    Assembly,
    /// The root ancestor of the element's parent chain.
    TopAssembly,
}

impl SelectionScope {
    /// Resolve a scope from its string id.
    pub fn parse(id: &str) -> Result<Self> {
        match id {
            "element" => Ok(Self::Element),
            "assembly" => Ok(Self::Assembly),
            "top-assembly" => Ok(Self::TopAssembly),
            other => Err(PresentationError::UnknownScope(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::Assembly => "assembly",
            Self::TopAssembly => "top-assembly",
        }
    }
}

impl fmt::Display for SelectionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single selected unit: the record plus the class it instantiates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SelectionKey {
    pub class_name: String,
    pub id: RecordId,
}

impl SelectionKey {
    pub fn new(class_name: impl Into<String>, id: impl Into<RecordId>) -> Self {
        Self {
            class_name: class_name.into(),
            id: id.into(),
        }
    }
}

/// Deduplicated, order-independent selection.
pub type SelectionKeySet = BTreeSet<SelectionKey>;

/// A row of the element hierarchy, as much of it as scoping needs.
struct ElementRow {
    id: String,
    parent_id: Option<String>,
    class_name: String,
}

async fn fetch_element(snapshot: &LocalSnapshot, id: &str) -> Result<Option<ElementRow>> {
    let row = sqlx::query("SELECT id, parent_id, class_name FROM elements WHERE id = ?")
        .bind(id)
        .fetch_optional(snapshot.pool()?)
        .await?;

    Ok(row.map(|row| ElementRow {
        id: row.get("id"),
        parent_id: row.get("parent_id"),
        class_name: row.get("class_name"),
    }))
}

/// Walk the parent chain from `element` to its root ancestor.
///
/// The snapshot is remote-sourced data, so a cyclic parent chain is
/// reachable input; a revisited id fails with `HierarchyCycle` instead of
/// looping.
async fn root_ancestor(snapshot: &LocalSnapshot, mut element: ElementRow) -> Result<ElementRow> {
    let mut visited = HashSet::new();
    visited.insert(element.id.clone());

    while let Some(parent_id) = element.parent_id.as_deref() {
        if !visited.insert(parent_id.to_string()) {
            return Err(PresentationError::HierarchyCycle(parent_id.to_string()));
        }
        match fetch_element(snapshot, parent_id).await? {
            Some(parent) => element = parent,
            // Dangling parent reference: treat the current element as the root.
            None => break,
        }
    }
    Ok(element)
}

/// Widen raw identifiers into a [`SelectionKeySet`] under `scope`.
///
/// Identifiers not present in the snapshot are skipped rather than failing
/// the whole selection.
pub(crate) async fn resolve_selection(
    snapshot: &LocalSnapshot,
    ids: &[RecordId],
    scope: SelectionScope,
) -> Result<SelectionKeySet> {
    let mut keys = SelectionKeySet::new();

    for id in ids {
        let Some(element) = fetch_element(snapshot, id.as_str()).await? else {
            debug!(id = %id, "Skipping identifier not present in snapshot");
            continue;
        };

        let unit = match scope {
            SelectionScope::Element => element,
            SelectionScope::Assembly => match element.parent_id.as_deref() {
                Some(parent_id) => fetch_element(snapshot, parent_id)
                    .await?
                    .unwrap_or(element),
                None => element,
            },
            SelectionScope::TopAssembly => root_ancestor(snapshot, element).await?,
        };

        keys.insert(SelectionKey::new(unit.class_name, unit.id));
    }

    debug!(scope = %scope, count = keys.len(), "Computed selection");
    Ok(keys)
}
