//! Contact directory seam and the bundled in-memory directory.

// The contact list lock is held for the whole mutate-then-persist step.
#![allow(clippy::significant_drop_tightening)]

use std::sync::{Arc, Mutex};

use super::error::{ContactError, Result};
use super::types::{EmergencyContact, NewContact};
use crate::storage::{load_json, save_json, Persistence, StorageError, KEY_EMERGENCY_CONTACTS};

/// Read access to the ordered emergency contact list.
pub trait ContactDirectory: Send + Sync {
    /// Returns the contacts in priority order; the first one is primary.
    fn list_contacts(&self) -> Vec<EmergencyContact>;
}

/// Validated, persisted contact list.
///
/// Every mutation re-marks the first contact as primary and writes the whole
/// list back under `emergencyContacts`.
pub struct MemoryContactDirectory {
    contacts: Mutex<Vec<EmergencyContact>>,
    persistence: Arc<dyn Persistence>,
}

impl std::fmt::Debug for MemoryContactDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryContactDirectory")
            .field("contacts", &self.list_contacts().len())
            .finish_non_exhaustive()
    }
}

impl MemoryContactDirectory {
    /// Creates a directory, restoring any persisted contacts.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted list cannot be read.
    pub fn load(persistence: Arc<dyn Persistence>) -> Result<Self> {
        let contacts: Vec<EmergencyContact> =
            load_json(persistence.as_ref(), KEY_EMERGENCY_CONTACTS)?.unwrap_or_default();
        log::info!("Loaded emergency contacts: {}", contacts.len());
        Ok(Self {
            contacts: Mutex::new(contacts),
            persistence,
        })
    }

    /// Appends a contact.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input or a storage error if the
    /// list cannot be persisted.
    pub fn add(&self, contact: NewContact) -> Result<EmergencyContact> {
        let contact = contact.validated()?;
        let mut contacts = self.lock()?;
        let created = EmergencyContact {
            id: new_contact_id(),
            name: contact.name,
            phone: contact.phone,
            relation: contact.relation,
            is_primary: contacts.is_empty(),
        };
        contacts.push(created.clone());
        self.persist(&mut contacts)?;
        Ok(created)
    }

    /// Replaces a contact's details in place, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::NotFound`] for an unknown id, or a validation
    /// or storage error.
    pub fn update(&self, id: &str, contact: NewContact) -> Result<EmergencyContact> {
        let contact = contact.validated()?;
        let mut contacts = self.lock()?;
        let existing = contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ContactError::NotFound(id.to_string()))?;
        existing.name = contact.name;
        existing.phone = contact.phone;
        existing.relation = contact.relation;
        let updated = existing.clone();
        self.persist(&mut contacts)?;
        Ok(updated)
    }

    /// Removes a contact. The next contact in line becomes primary.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::NotFound`] for an unknown id, or a storage error.
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut contacts = self.lock()?;
        let index = contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ContactError::NotFound(id.to_string()))?;
        contacts.remove(index);
        self.persist(&mut contacts)
    }

    /// Replaces the whole list. Nothing changes if any entry is invalid.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or a storage error.
    pub fn replace_all(&self, new_contacts: Vec<NewContact>) -> Result<Vec<EmergencyContact>> {
        let validated = new_contacts
            .into_iter()
            .map(NewContact::validated)
            .collect::<Result<Vec<_>>>()?;

        let mut contacts = self.lock()?;
        *contacts = validated
            .into_iter()
            .map(|c| EmergencyContact {
                id: new_contact_id(),
                name: c.name,
                phone: c.phone,
                relation: c.relation,
                is_primary: false,
            })
            .collect();
        self.persist(&mut contacts)?;
        log::info!("{} emergency contacts have been saved", contacts.len());
        Ok(contacts.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<EmergencyContact>>> {
        self.contacts.lock().map_err(|e| {
            ContactError::Storage(StorageError::Lock(format!(
                "Failed to acquire contacts lock: {e}"
            )))
        })
    }

    fn persist(&self, contacts: &mut [EmergencyContact]) -> Result<()> {
        for (index, contact) in contacts.iter_mut().enumerate() {
            contact.is_primary = index == 0;
        }
        save_json(self.persistence.as_ref(), KEY_EMERGENCY_CONTACTS, &*contacts)?;
        Ok(())
    }
}

impl ContactDirectory for MemoryContactDirectory {
    fn list_contacts(&self) -> Vec<EmergencyContact> {
        self.contacts
            .lock()
            .map(|contacts| contacts.clone())
            .unwrap_or_default()
    }
}

fn new_contact_id() -> String {
    format!("contact-{}", hex::encode(rand::random::<[u8; 6]>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Relation;
    use crate::storage::MemoryPersistence;

    fn directory() -> (MemoryContactDirectory, Arc<dyn Persistence>) {
        let persistence: Arc<dyn Persistence> = Arc::new(MemoryPersistence::new());
        (
            MemoryContactDirectory::load(persistence.clone()).unwrap(),
            persistence,
        )
    }

    fn asha() -> NewContact {
        NewContact::new("Asha", "+91 9876543210", Relation::Family)
    }

    fn ravi() -> NewContact {
        NewContact::new("Ravi", "+91 9123456780", Relation::Friend)
    }

    #[test]
    fn first_contact_is_primary() {
        let (directory, _) = directory();
        let first = directory.add(asha()).unwrap();
        let second = directory.add(ravi()).unwrap();

        assert!(first.is_primary);
        assert!(!second.is_primary);
        assert_eq!(directory.list_contacts().len(), 2);
    }

    #[test]
    fn removing_primary_promotes_next() {
        let (directory, _) = directory();
        let first = directory.add(asha()).unwrap();
        directory.add(ravi()).unwrap();

        directory.remove(&first.id).unwrap();

        let contacts = directory.list_contacts();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Ravi");
        assert!(contacts[0].is_primary);
    }

    #[test]
    fn remove_unknown_id_fails() {
        let (directory, _) = directory();
        assert!(matches!(
            directory.remove("contact-missing"),
            Err(ContactError::NotFound(_))
        ));
    }

    #[test]
    fn update_keeps_position() {
        let (directory, _) = directory();
        let first = directory.add(asha()).unwrap();
        directory.add(ravi()).unwrap();

        let updated = directory
            .update(
                &first.id,
                NewContact::new("Asha K", "+91 9000000000", Relation::Family),
            )
            .unwrap();

        assert_eq!(updated.name, "Asha K");
        assert!(updated.is_primary);
        assert_eq!(directory.list_contacts()[0].name, "Asha K");
    }

    #[test]
    fn replace_all_is_atomic_on_invalid_input() {
        let (directory, _) = directory();
        directory.add(asha()).unwrap();

        let result =
            directory.replace_all(vec![ravi(), NewContact::new("Bad", "123", Relation::Other)]);

        assert!(matches!(result, Err(ContactError::InvalidPhone(_))));
        assert_eq!(directory.list_contacts()[0].name, "Asha");
    }

    #[test]
    fn contacts_survive_reload() {
        let (directory, persistence) = directory();
        directory.replace_all(vec![asha(), ravi()]).unwrap();

        let reloaded = MemoryContactDirectory::load(persistence).unwrap();
        let names: Vec<String> = reloaded
            .list_contacts()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Asha", "Ravi"]);
    }
}
