use std::collections::HashMap;
use std::sync::Arc;

use crate::TreeKey;

/// Extracts the identity of an item.
pub type KeyFn<T, K> = Arc<dyn Fn(&T) -> K + Send + Sync>;

/// Misuse of a [`TreeData`] mutation. The tree is left unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeDataError {
    #[error("the item is not in the tree")]
    UnknownItem,
    #[error("the parent item is not in the tree")]
    UnknownParent,
    #[error("the item is already in the tree")]
    DuplicateItem,
    #[error("an item cannot be placed under itself or one of its descendants")]
    Cycle,
    #[error("the sibling does not share the item's parent")]
    NotASibling,
}

struct Entry<T, K> {
    item: T,
    parent: Option<K>,
    children: Vec<K>,
}

/// An in-memory hierarchy of items, keyed by identity.
///
/// Children keep their insertion order unless moved with [`Self::move_after_sibling`].
pub struct TreeData<T, K> {
    key_of: KeyFn<T, K>,
    entries: HashMap<K, Entry<T, K>>,
    roots: Vec<K>,
}

impl<T, K: TreeKey> TreeData<T, K> {
    pub fn new(key_of: impl Fn(&T) -> K + Send + Sync + 'static) -> Self {
        Self {
            key_of: Arc::new(key_of),
            entries: HashMap::new(),
            roots: Vec::new(),
        }
    }

    pub fn key_of(&self, item: &T) -> K {
        (self.key_of)(item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.entries.contains_key(&self.key_of(item))
    }

    pub fn get(&self, key: &K) -> Option<&T> {
        self.entries.get(key).map(|e| &e.item)
    }

    /// Adds `item` as the last child of `parent` (`None` = root level).
    pub fn add_item(&mut self, parent: Option<&T>, item: T) -> Result<(), TreeDataError> {
        let parent = match parent {
            Some(p) => {
                let key = self.key_of(p);
                if !self.entries.contains_key(&key) {
                    return Err(TreeDataError::UnknownParent);
                }
                Some(key)
            }
            None => None,
        };
        let key = self.key_of(&item);
        if self.entries.contains_key(&key) {
            return Err(TreeDataError::DuplicateItem);
        }

        self.siblings_mut(parent.as_ref()).push(key.clone());
        self.entries.insert(
            key,
            Entry {
                item,
                parent,
                children: Vec::new(),
            },
        );
        Ok(())
    }

    /// Adds every item in order. Stops at the first error; items added before it stay.
    pub fn add_items(
        &mut self,
        parent: Option<&T>,
        items: impl IntoIterator<Item = T>,
    ) -> Result<(), TreeDataError> {
        for item in items {
            self.add_item(parent, item)?;
        }
        Ok(())
    }

    /// Removes `item` and all of its descendants, returning the item.
    pub fn remove_item(&mut self, item: &T) -> Option<T> {
        let key = self.key_of(item);
        let parent = self.entries.get(&key)?.parent.clone();
        self.siblings_mut(parent.as_ref()).retain(|k| *k != key);

        let removed = self.entries.remove(&key)?;
        let mut stack = removed.children;
        while let Some(child) = stack.pop() {
            if let Some(entry) = self.entries.remove(&child) {
                stack.extend(entry.children);
            }
        }
        Some(removed.item)
    }

    /// Moves `item` (with its subtree) to the end of `parent`'s children.
    pub fn set_parent(&mut self, item: &T, parent: Option<&T>) -> Result<(), TreeDataError> {
        let key = self.key_of(item);
        let Some(old_parent) = self.entries.get(&key).map(|e| e.parent.clone()) else {
            return Err(TreeDataError::UnknownItem);
        };
        let new_parent = match parent {
            Some(p) => {
                let p = self.key_of(p);
                if !self.entries.contains_key(&p) {
                    return Err(TreeDataError::UnknownParent);
                }
                if self.is_self_or_descendant(&p, &key) {
                    return Err(TreeDataError::Cycle);
                }
                Some(p)
            }
            None => None,
        };

        self.siblings_mut(old_parent.as_ref()).retain(|k| *k != key);
        self.siblings_mut(new_parent.as_ref()).push(key.clone());
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.parent = new_parent;
        }
        Ok(())
    }

    /// Moves `item` right after `sibling` among its current siblings, or to the front when
    /// `sibling` is `None`.
    pub fn move_after_sibling(
        &mut self,
        item: &T,
        sibling: Option<&T>,
    ) -> Result<(), TreeDataError> {
        let key = self.key_of(item);
        let Some(parent) = self.entries.get(&key).map(|e| e.parent.clone()) else {
            return Err(TreeDataError::UnknownItem);
        };
        let sibling = match sibling {
            Some(s) => {
                let s = self.key_of(s);
                let Some(entry) = self.entries.get(&s) else {
                    return Err(TreeDataError::UnknownItem);
                };
                if entry.parent != parent {
                    return Err(TreeDataError::NotASibling);
                }
                Some(s)
            }
            None => None,
        };
        if sibling.as_ref() == Some(&key) {
            return Ok(());
        }

        let siblings = self.siblings_mut(parent.as_ref());
        siblings.retain(|k| *k != key);
        let at = match sibling {
            Some(s) => siblings
                .iter()
                .position(|k| *k == s)
                .map_or(siblings.len(), |i| i + 1),
            None => 0,
        };
        siblings.insert(at, key);
        Ok(())
    }

    pub fn root_items(&self) -> Vec<&T> {
        self.children(None)
    }

    /// Direct children of `parent` in order. Empty for unknown items.
    pub fn children(&self, parent: Option<&T>) -> Vec<&T> {
        let key = parent.map(|p| self.key_of(p));
        self.child_keys(key.as_ref())
            .iter()
            .filter_map(|k| self.get(k))
            .collect()
    }

    pub fn parent(&self, item: &T) -> Option<&T> {
        let parent = self.entries.get(&self.key_of(item))?.parent.as_ref()?;
        self.get(parent)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.roots.clear();
    }

    pub(crate) fn child_keys(&self, parent: Option<&K>) -> &[K] {
        match parent {
            None => &self.roots,
            Some(key) => self.entries.get(key).map_or(&[][..], |e| e.children.as_slice()),
        }
    }

    fn siblings_mut(&mut self, parent: Option<&K>) -> &mut Vec<K> {
        match parent.and_then(|key| self.entries.get_mut(key)) {
            Some(entry) => &mut entry.children,
            None => &mut self.roots,
        }
    }

    fn is_self_or_descendant(&self, candidate: &K, ancestor: &K) -> bool {
        let mut cur = Some(candidate);
        while let Some(key) = cur {
            if key == ancestor {
                return true;
            }
            cur = self.entries.get(key).and_then(|e| e.parent.as_ref());
        }
        false
    }
}

impl<T, K: core::fmt::Debug> core::fmt::Debug for TreeData<T, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TreeData")
            .field("len", &self.entries.len())
            .field("roots", &self.roots)
            .finish()
    }
}
