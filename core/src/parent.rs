//! Non-owning parent back-references and the attach protocol.
//!
//! Containers own their children through `Arc`; children point back through
//! `Weak`, so the parent-to-child edge is the only owning edge. Dropping a
//! container leaves its children with no parent.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::warn;

use crate::{DatasetSpec, GroupSpec};

/// Live handle to the container that holds a node.
#[derive(Debug, Clone)]
pub enum Parent {
    /// Enclosing group.
    Group(Arc<GroupSpec>),
    /// Enclosing dataset (only attributes live in datasets).
    Dataset(Arc<DatasetSpec>),
}

impl Parent {
    /// Whether this parent is exactly `group`.
    pub fn is_group(&self, group: &Arc<GroupSpec>) -> bool {
        matches!(self, Parent::Group(g) if Arc::ptr_eq(g, group))
    }

    /// Whether this parent is exactly `dataset`.
    pub fn is_dataset(&self, dataset: &Arc<DatasetSpec>) -> bool {
        matches!(self, Parent::Dataset(d) if Arc::ptr_eq(d, dataset))
    }

    /// Returns the group if the parent is one.
    pub fn as_group(&self) -> Option<&Arc<GroupSpec>> {
        match self {
            Parent::Group(g) => Some(g),
            Parent::Dataset(_) => None,
        }
    }

    /// Returns the dataset if the parent is one.
    pub fn as_dataset(&self) -> Option<&Arc<DatasetSpec>> {
        match self {
            Parent::Dataset(d) => Some(d),
            Parent::Group(_) => None,
        }
    }

    /// Path of the parent itself.
    pub fn path(&self) -> String {
        match self {
            Parent::Group(g) => g.path(),
            Parent::Dataset(d) => d.path(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum WeakParent {
    Group(Weak<GroupSpec>),
    Dataset(Weak<DatasetSpec>),
}

impl WeakParent {
    fn upgrade(&self) -> Option<Parent> {
        match self {
            WeakParent::Group(g) => g.upgrade().map(Parent::Group),
            WeakParent::Dataset(d) => d.upgrade().map(Parent::Dataset),
        }
    }

    fn ptr_eq(&self, other: &WeakParent) -> bool {
        match (self, other) {
            (WeakParent::Group(a), WeakParent::Group(b)) => Weak::ptr_eq(a, b),
            (WeakParent::Dataset(a), WeakParent::Dataset(b)) => Weak::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Back-reference slot held by every child node.
#[derive(Debug, Default)]
pub(crate) struct ParentLink(Mutex<Option<WeakParent>>);

impl ParentLink {
    pub(crate) fn get(&self) -> Option<Parent> {
        self.0.lock().as_ref().and_then(WeakParent::upgrade)
    }

    fn replace(&self, parent: WeakParent) -> Option<WeakParent> {
        self.0.lock().replace(parent)
    }
}

/// A node that can be owned by a container.
pub(crate) trait Child: Sized {
    fn parent_link(&self) -> &ParentLink;

    /// Label used in log events.
    fn label(&self) -> String;

    /// Removes `child` from the matching sequence of `parent`.
    fn detach_from(child: &Arc<Self>, parent: &Parent);
}

/// Appends `child` to `siblings` and points its back-reference at `parent`.
///
/// A child still held by another live container is removed from it first; a
/// child already in `siblings` moves to the end. Either way it appears exactly
/// once afterwards.
pub(crate) fn adopt<T: Child>(siblings: &mut Vec<Arc<T>>, child: Arc<T>, parent: WeakParent) {
    if let Some(previous) = child.parent_link().replace(parent.clone()) {
        if previous.ptr_eq(&parent) {
            siblings.retain(|c| !Arc::ptr_eq(c, &child));
        } else if let Some(old) = previous.upgrade() {
            warn!(
                child = %child.label(),
                from = %old.path(),
                "moving spec to a new parent"
            );
            T::detach_from(&child, &old);
        }
    }
    siblings.push(child);
}

pub(crate) fn weak_group(group: &Weak<GroupSpec>) -> WeakParent {
    WeakParent::Group(group.clone())
}

pub(crate) fn weak_dataset(dataset: &Weak<DatasetSpec>) -> WeakParent {
    WeakParent::Dataset(dataset.clone())
}

/// Joins `segment` under the path of `parent`.
pub(crate) fn join_path(parent: Option<Parent>, segment: &str) -> String {
    match parent {
        Some(parent) => format!("{}/{}", parent.path(), segment),
        None => segment.to_string(),
    }
}

/// Whether `group` is `candidate` or one of its ancestors.
pub(crate) fn is_self_or_ancestor(group: &Arc<GroupSpec>, candidate: &Arc<GroupSpec>) -> bool {
    let mut current = Some(Parent::Group(Arc::clone(group)));
    while let Some(node) = current {
        if let Parent::Group(g) = &node {
            if Arc::ptr_eq(g, candidate) {
                return true;
            }
        }
        current = match &node {
            Parent::Group(g) => g.parent(),
            Parent::Dataset(d) => d.parent(),
        };
    }
    false
}
