//! `localStorage` backend.

use theme::store::{PreferenceStorage, StorageError};

use super::describe;

/// `window.localStorage`. Private browsing modes may refuse access or
/// reject writes; both surface as [`StorageError`].
pub struct LocalStorage;

impl LocalStorage {
    fn handle() -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window().ok_or(StorageError::Unavailable)?;
        match window.local_storage() {
            Ok(Some(storage)) => Ok(storage),
            Ok(None) => Err(StorageError::Unavailable),
            Err(err) => {
                log::debug!("theme: localStorage refused: {}", describe(&err));
                Err(StorageError::Unavailable)
            }
        }
    }
}

impl PreferenceStorage for LocalStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::handle()?.get_item(key).map_err(|err| {
            log::debug!("theme: localStorage read failed: {}", describe(&err));
            StorageError::Unavailable
        })
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::handle()?
            .set_item(key, value)
            .map_err(|err| StorageError::WriteRejected(describe(&err)))
    }
}
