use web_sys::{Storage, Window};

use crate::settings::{KeyValueStore, StoreError};

/// `window.localStorage`. Private browsing modes may deny it; every write
/// then fails with [`StoreError::Unavailable`] and reads return nothing.
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    pub fn open(win: &Window) -> Self {
        let storage = win.local_storage().ok().flatten();
        if storage.is_none() {
            log::warn!("localStorage unavailable; settings will not persist");
        }
        Self { storage }
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let storage = self.storage.as_ref().ok_or(StoreError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|err| StoreError::Write {
                key: key.to_string(),
                reason: format!("{err:?}"),
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let storage = self.storage.as_ref().ok_or(StoreError::Unavailable)?;
        storage.remove_item(key).map_err(|err| StoreError::Write {
            key: key.to_string(),
            reason: format!("{err:?}"),
        })
    }
}
