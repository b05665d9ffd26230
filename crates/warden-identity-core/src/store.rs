//! Identity record store over the generic column-family storage.
//!
//! Records live in `CF_USERS` under `(owner, name)`. Email and phone are
//! indexed in their own column families under `(owner, value, name)` so a
//! prefix scan on `(owner, value)` finds every holder of a value.

use crate::{
    errors::{IdentityCoreError, Result},
    fields::UserField,
    integrity,
    types::{LookupField, User},
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use warden_storage::{
    Batch, BatchExt, Storage, CF_USERS, CF_USERS_BY_EMAIL, CF_USERS_BY_PHONE,
};

/// Keyed CRUD and field-scoped updates for [`User`] records
///
/// Every write stages the record, its index entries and its fingerprint in a
/// single batch. Read-modify-write sequences hold `write_lock` so two
/// updates of the same record cannot interleave.
pub struct UserRepository<S: Storage> {
    storage: Arc<S>,
    write_lock: Mutex<()>,
}

fn index_cf(field: LookupField) -> Option<&'static str> {
    match field {
        LookupField::Name => None,
        LookupField::Email => Some(CF_USERS_BY_EMAIL),
        LookupField::Phone => Some(CF_USERS_BY_PHONE),
    }
}

const INDEXED: [LookupField; 2] = [LookupField::Email, LookupField::Phone];

fn stage_indexes(batch: &mut dyn Batch, user: &User) -> Result<()> {
    for field in INDEXED {
        let value = user.lookup_value(field);
        if let (Some(cf), false) = (index_cf(field), value.is_empty()) {
            batch.put(cf, &(&user.owner, value, &user.name), &user.name)?;
        }
    }
    Ok(())
}

fn unstage_indexes(batch: &mut dyn Batch, user: &User) -> Result<()> {
    for field in INDEXED {
        let value = user.lookup_value(field);
        if let (Some(cf), false) = (index_cf(field), value.is_empty()) {
            batch.delete(cf, &(&user.owner, value, &user.name))?;
        }
    }
    Ok(())
}

fn newest_first(mut users: Vec<User>) -> Vec<User> {
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    users
}

impl<S: Storage> UserRepository<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Get a record by its key
    pub async fn get(&self, owner: &str, name: &str) -> Result<Option<User>> {
        Ok(self.storage.get(CF_USERS, &(owner, name)).await?)
    }

    /// Get the first record in a tenant whose `field` equals `value`
    ///
    /// Empty values never match.
    pub async fn get_by_field(
        &self,
        owner: &str,
        field: LookupField,
        value: &str,
    ) -> Result<Option<User>> {
        if value.is_empty() {
            return Ok(None);
        }
        let Some(cf) = index_cf(field) else {
            return self.get(owner, value).await;
        };

        let holders: Vec<(Vec<u8>, String)> =
            self.storage.get_by_prefix(cf, &(owner, value)).await?;
        for (_, name) in holders {
            // Confirm against the record itself
            if let Some(user) = self.get(owner, &name).await? {
                if user.lookup_value(field) == value {
                    return Ok(Some(user));
                }
            }
        }
        Ok(None)
    }

    /// True if some record in the tenant has `field` equal to `value`
    pub async fn exists_by_field(
        &self,
        owner: &str,
        field: LookupField,
        value: &str,
    ) -> Result<bool> {
        Ok(self.get_by_field(owner, field, value).await?.is_some())
    }

    /// Insert one record. Fails if the key is taken.
    pub async fn insert(&self, user: &User) -> Result<usize> {
        self.insert_many(std::slice::from_ref(user)).await
    }

    /// Insert records in one atomic batch
    ///
    /// Either every record is written or none is. A key that already exists,
    /// in the store or twice in `users`, rejects the whole batch.
    pub async fn insert_many(&self, users: &[User]) -> Result<usize> {
        if users.is_empty() {
            return Ok(0);
        }
        let _guard = self.write_lock.lock().await;

        let mut seen = HashSet::with_capacity(users.len());
        for user in users {
            let taken = !seen.insert((user.owner.as_str(), user.name.as_str()))
                || self.storage.exists(CF_USERS, &(&user.owner, &user.name)).await?;
            if taken {
                return Err(IdentityCoreError::Validation(format!(
                    "user already exists: {}",
                    user.user_id()
                )));
            }
        }

        let mut batch = self.storage.batch();
        for user in users {
            batch.put(CF_USERS, &(&user.owner, &user.name), user)?;
            stage_indexes(batch.as_mut(), user)?;
        }
        batch.commit().await?;

        debug!(count = users.len(), "Inserted user records");
        Ok(users.len())
    }

    /// Apply field changes to a stored record
    ///
    /// Returns the number of records changed (0 if the key is unknown).
    pub async fn update_fields(
        &self,
        owner: &str,
        name: &str,
        fields: Vec<UserField>,
    ) -> Result<usize> {
        self.update_fields_checked(owner, name, fields, |_| Ok(()))
            .await
    }

    /// Apply field changes after `check` accepts the stored record
    ///
    /// `check` runs under the write lock against the record as persisted, so
    /// a precondition verified there still holds when the batch commits.
    /// When any change is security-relevant the stored record must already
    /// be consistent, and `current_fingerprint` is recomputed in the same
    /// batch. An inconsistent record yields [`IdentityCoreError::Integrity`]
    /// and is left untouched.
    pub async fn update_fields_checked<F>(
        &self,
        owner: &str,
        name: &str,
        fields: Vec<UserField>,
        check: F,
    ) -> Result<usize>
    where
        F: FnOnce(&User) -> Result<()> + Send,
    {
        let _guard = self.write_lock.lock().await;

        let Some(stored) = self.get(owner, name).await? else {
            return Ok(0);
        };
        check(&stored)?;

        let reseal = fields.iter().any(UserField::is_security_relevant);
        if reseal {
            if let Some(violation) = integrity::check(&stored) {
                return Err(IdentityCoreError::Integrity(violation));
            }
        }

        let mut updated = stored.clone();
        for field in fields {
            field.apply(&mut updated);
        }
        if reseal {
            integrity::reseal(&mut updated);
        }

        let mut batch = self.storage.batch();
        unstage_indexes(batch.as_mut(), &stored)?;
        stage_indexes(batch.as_mut(), &updated)?;
        batch.put(CF_USERS, &(owner, name), &updated)?;
        batch.commit().await?;

        debug!(user = %updated.user_id(), resealed = reseal, "Updated user record");
        Ok(1)
    }

    /// Delete a record and its index entries
    pub async fn delete(&self, owner: &str, name: &str) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let Some(stored) = self.get(owner, name).await? else {
            return Ok(0);
        };

        let mut batch = self.storage.batch();
        unstage_indexes(batch.as_mut(), &stored)?;
        batch.delete(CF_USERS, &(owner, name))?;
        batch.commit().await?;

        debug!(user = %stored.user_id(), "Deleted user record");
        Ok(1)
    }

    /// Every record in a tenant, newest first
    pub async fn list_by_tenant(&self, owner: &str) -> Result<Vec<User>> {
        let rows: Vec<(Vec<u8>, User)> = self.storage.get_by_prefix(CF_USERS, &owner).await?;
        Ok(newest_first(rows.into_iter().map(|(_, u)| u).collect()))
    }

    /// Every record in the store, newest first
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let rows: Vec<(Vec<u8>, User)> = self.storage.scan_all(CF_USERS).await?;
        Ok(newest_first(rows.into_iter().map(|(_, u)| u).collect()))
    }
}
