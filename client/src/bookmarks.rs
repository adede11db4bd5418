use crate::error::Result;
use crate::storage::LocalStorage;
use uuid::Uuid;

const BOOKMARKS_KEY: &str = "bookmarks";

/// Device-local bookmarks: an insertion-ordered set of post ids, persisted
/// after every change. Not tied to the signed-in account.
#[derive(Debug)]
pub struct BookmarkStore {
    storage: LocalStorage,
    ids: Vec<Uuid>,
}

impl BookmarkStore {
    pub fn load(storage: LocalStorage) -> Self {
        let mut ids: Vec<Uuid> = storage.get_json(BOOKMARKS_KEY).unwrap_or_default();
        let mut seen = std::collections::HashSet::new();
        ids.retain(|id| seen.insert(*id));
        Self { storage, ids }
    }

    /// Add or remove `post_id`; returns whether it is now bookmarked.
    ///
    /// The in-memory set only changes once the new set has been persisted.
    pub fn toggle(&mut self, post_id: Uuid) -> Result<bool> {
        let mut next = self.ids.clone();
        let bookmarked = match next.iter().position(|id| *id == post_id) {
            Some(index) => {
                next.remove(index);
                false
            }
            None => {
                next.push(post_id);
                true
            }
        };
        self.storage.set_json(BOOKMARKS_KEY, &next)?;
        self.ids = next;
        Ok(bookmarked)
    }

    pub fn contains(&self, post_id: Uuid) -> bool {
        self.ids.contains(&post_id)
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
