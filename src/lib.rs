pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod server;
pub mod validate;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{DateKey, NewPhoto, Photo};

struct Entry {
    /// Insertion sequence, breaks ties between equal dates
    seq: u64,
    sort_key: DateKey,
    photo: Photo,
}

/// In-memory photo collection. Every record lives here and nowhere else.
pub struct PhotoStore {
    photos: RwLock<HashMap<Uuid, Entry>>,
    next_seq: AtomicU64,
}

impl fmt::Debug for PhotoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoStore")
        .field("photo_count", &self.len().unwrap_or(0))
        .finish()
    }
}

impl Default for PhotoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotoStore {
    pub fn new() -> Self {
        Self {
            photos: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn get_photo(&self, id: Uuid) -> Result<Option<Photo>, StoreError> {
        let photos = self.photos.read().map_err(|_| StoreError::Poisoned("photos"))?;
        Ok(photos.get(&id).map(|entry| entry.photo.clone()))
    }

    /// Snapshot of every photo, newest `date` first.
    pub fn get_all_photos(&self) -> Result<Vec<Photo>, StoreError> {
        let photos = self.photos.read().map_err(|_| StoreError::Poisoned("photos"))?;

        let mut entries: Vec<&Entry> = photos.values().collect();
        entries.sort_by(|a, b| b.sort_key.cmp(&a.sort_key).then(a.seq.cmp(&b.seq)));

        Ok(entries.into_iter().map(|entry| entry.photo.clone()).collect())
    }

    pub fn create_photo(&self, new_photo: NewPhoto) -> Result<Photo, StoreError> {
        let mut photos = self.photos.write().map_err(|_| StoreError::Poisoned("photos"))?;

        let mut id = Uuid::new_v4();
        while photos.contains_key(&id) {
            id = Uuid::new_v4();
        }

        let photo = new_photo.into_photo(id, Utc::now());
        let entry = Entry {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            sort_key: DateKey::from_date(&photo.date),
            photo: photo.clone(),
        };
        photos.insert(id, entry);

        debug!(%id, count = photos.len(), "photo stored");
        Ok(photo)
    }

    /// Returns whether a record was actually removed.
    pub fn delete_photo(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut photos = self.photos.write().map_err(|_| StoreError::Poisoned("photos"))?;
        let removed = photos.remove(&id).is_some();

        if removed {
            debug!(%id, count = photos.len(), "photo removed");
        }
        Ok(removed)
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let photos = self.photos.read().map_err(|_| StoreError::Poisoned("photos"))?;
        Ok(photos.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn photo(date: &str) -> NewPhoto {
        NewPhoto::new("https://example.com/a.jpg", "Beach Day", date)
    }

    #[test]
    fn ids_are_unique() {
        let store = PhotoStore::new();
        let ids: HashSet<Uuid> = (0..200)
            .map(|_| store.create_photo(photo("2024-01-01")).unwrap().id)
            .collect();

        assert_eq!(ids.len(), 200);
        assert_eq!(store.len().unwrap(), 200);
    }

    #[test]
    fn get_all_orders_by_date_desc() {
        let store = PhotoStore::new();
        let a = store.create_photo(photo("2024-01-01")).unwrap();
        let b = store.create_photo(photo("2024-06-01")).unwrap();
        let c = store.create_photo(photo("2023-12-31")).unwrap();

        let ids: Vec<Uuid> = store.get_all_photos().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b.id, a.id, c.id]);
    }

    #[test]
    fn equal_dates_keep_insertion_order() {
        let store = PhotoStore::new();
        let first = store.create_photo(photo("2024-03-03")).unwrap();
        let second = store.create_photo(photo("2024-03-03")).unwrap();
        let undated = store.create_photo(photo("sometime")).unwrap();
        let newest = store.create_photo(photo("2025-01-01")).unwrap();

        let ids: Vec<Uuid> = store.get_all_photos().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![newest.id, first.id, second.id, undated.id]);
    }

    #[test]
    fn get_all_is_a_snapshot() {
        let store = PhotoStore::new();
        store.create_photo(photo("2024-01-01")).unwrap();

        let snapshot = store.get_all_photos().unwrap();
        store.create_photo(photo("2024-02-01")).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.get_all_photos().unwrap().len(), 2);
    }

    #[test]
    fn get_absent_before_create_and_after_delete() {
        let store = PhotoStore::new();
        assert_eq!(store.get_photo(Uuid::new_v4()).unwrap(), None);

        let created = store.create_photo(photo("2024-07-01")).unwrap();
        assert_eq!(store.get_photo(created.id).unwrap(), Some(created.clone()));

        assert!(store.delete_photo(created.id).unwrap());
        assert_eq!(store.get_photo(created.id).unwrap(), None);
    }

    #[test]
    fn delete_succeeds_once() {
        let store = PhotoStore::new();
        let created = store.create_photo(photo("2024-07-01")).unwrap();

        assert!(store.delete_photo(created.id).unwrap());
        assert!(!store.delete_photo(created.id).unwrap());
        assert!(!store.delete_photo(created.id).unwrap());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn create_normalizes_optionals() {
        let store = PhotoStore::new();
        let created = store
            .create_photo(photo("2024-07-01").with_description("").with_location("Porto"))
            .unwrap();

        assert_eq!(created.description, None);
        assert_eq!(created.location.as_deref(), Some("Porto"));
        assert_eq!(store.get_photo(created.id).unwrap().unwrap().description, None);
    }

    #[test]
    fn concurrent_creates_all_land() {
        let store = Arc::new(PhotoStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for day in 1..=25 {
                        store.create_photo(photo(&format!("2024-{:02}-{:02}", i + 1, day))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let all = store.get_all_photos().unwrap();
        assert_eq!(all.len(), 200);
        assert!(all.windows(2).all(|w| DateKey::from_date(&w[0].date) >= DateKey::from_date(&w[1].date)));
    }
}
