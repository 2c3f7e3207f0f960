use std::collections::BTreeMap;

use super::controller::{FieldKey, FormResult, FormStore, read_lock};
use super::validation::{FieldLens, FormModel};

/// Handlers bound to one field, for wiring an input element to the store.
pub struct FieldBinding<T>
where
    T: FormModel,
{
    store: FormStore<T>,
    key: FieldKey,
}

impl<T> Clone for FieldBinding<T>
where
    T: FormModel,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key,
        }
    }
}

impl<T> FieldBinding<T>
where
    T: FormModel,
{
    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn on_blur(&self) -> FormResult<()> {
        self.store.on_blur(self.key)
    }

    pub fn on_change(&self, value: impl Into<String>) -> FormResult<()> {
        let value: String = value.into();
        self.store.on_change([(self.key, value)])
    }

    /// Reads the live value; never a copy taken at bind time.
    pub fn value(&self) -> FormResult<String> {
        Ok(read_lock(&self.store.state, "reading bound field value")?
            .values
            .value(self.key)
            .unwrap_or_default()
            .to_owned())
    }

    pub fn error(&self) -> FormResult<Option<String>> {
        self.store.error(self.key)
    }

    pub fn is_valid(&self) -> FormResult<bool> {
        self.store.is_field_valid(self.key)
    }

    pub fn is_required(&self) -> bool {
        self.store
            .definition
            .get(self.key)
            .is_some_and(|definition| definition.is_required())
    }
}

impl<T> FormStore<T>
where
    T: FormModel,
{
    pub fn bind<L>(&self, lens: L) -> FieldBinding<T>
    where
        L: FieldLens<T>,
    {
        FieldBinding {
            store: self.clone(),
            key: lens.key(),
        }
    }

    /// Binding for a key looked up at runtime; `None` if the model lacks it.
    pub fn binding(&self, key: FieldKey) -> Option<FieldBinding<T>> {
        T::field_keys().contains(&key).then(|| FieldBinding {
            store: self.clone(),
            key,
        })
    }

    pub fn bindings(&self) -> BTreeMap<FieldKey, FieldBinding<T>> {
        T::field_keys()
            .iter()
            .map(|key| {
                (
                    *key,
                    FieldBinding {
                        store: self.clone(),
                        key: *key,
                    },
                )
            })
            .collect()
    }
}
