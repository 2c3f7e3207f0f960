use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::controller::FieldKey;
use super::validation::{
    FieldLens, FormModel, ValidationContext, ValidationResult, Validator, required_validator,
};

/// Declarative description of one form field.
pub struct FieldDefinition<T> {
    required: bool,
    rules: Vec<Validator<T>>,
    initial_value: String,
}

impl<T> Default for FieldDefinition<T> {
    fn default() -> Self {
        Self {
            required: false,
            rules: Vec::new(),
            initial_value: String::new(),
        }
    }
}

impl<T> Clone for FieldDefinition<T> {
    fn clone(&self) -> Self {
        Self {
            required: self.required,
            rules: self.rules.clone(),
            initial_value: self.initial_value.clone(),
        }
    }
}

impl<T> FieldDefinition<T> {
    pub fn optional() -> Self {
        Self::default()
    }

    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    /// Appends a rule. Rules run after the required check, in the order added.
    pub fn rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&str, &ValidationContext<'_, T>) -> ValidationResult + Send + Sync + 'static,
    {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn initial_value(mut self, value: impl Into<String>) -> Self {
        self.initial_value = value.into();
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn initial(&self) -> &str {
        &self.initial_value
    }

    pub fn has_validators(&self) -> bool {
        self.required || !self.rules.is_empty()
    }

    /// Runs the required check and then every rule, stopping at the first failure.
    pub fn check(&self, value: &str, cx: &ValidationContext<'_, T>) -> ValidationResult {
        if self.required {
            required_validator(value, cx)?;
        }
        for rule in &self.rules {
            rule(value, cx)?;
        }
        Ok(())
    }
}

/// Field definitions for every field of `T`, plus revalidation dependencies.
pub struct FormDefinition<T> {
    fields: BTreeMap<FieldKey, FieldDefinition<T>>,
    dependencies: BTreeMap<FieldKey, BTreeSet<FieldKey>>,
}

impl<T> Default for FormDefinition<T> {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
            dependencies: BTreeMap::new(),
        }
    }
}

impl<T> Clone for FormDefinition<T> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            dependencies: self.dependencies.clone(),
        }
    }
}

impl<T> FormDefinition<T>
where
    T: FormModel,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the definition of one field, replacing any earlier one.
    pub fn field<L>(mut self, lens: L, definition: FieldDefinition<T>) -> Self
    where
        L: FieldLens<T>,
    {
        self.fields.insert(lens.key(), definition);
        self
    }

    /// Revalidates `dependent` whenever `source` changes.
    pub fn dependency<S, D>(mut self, source: S, dependent: D) -> Self
    where
        S: FieldLens<T>,
        D: FieldLens<T>,
    {
        self.dependencies
            .entry(source.key())
            .or_default()
            .insert(dependent.key());
        self
    }

    pub fn get(&self, key: FieldKey) -> Option<&FieldDefinition<T>> {
        self.fields.get(&key)
    }

    pub fn has_validators(&self, key: FieldKey) -> bool {
        self.fields
            .get(&key)
            .is_some_and(FieldDefinition::has_validators)
    }

    pub(super) fn complete(&mut self) {
        for key in T::field_keys() {
            self.fields.entry(*key).or_default();
        }
    }

    pub(super) fn initial_values(&self) -> T {
        let mut model = T::blank();
        for (key, definition) in &self.fields {
            if let Some(slot) = model.value_mut(*key) {
                slot.clone_from(&definition.initial_value);
            }
        }
        model
    }

    /// `sources` followed by their dependents, without duplicates.
    pub(super) fn with_dependents(&self, sources: &[FieldKey]) -> Vec<FieldKey> {
        let mut keys = sources.to_vec();
        for source in sources {
            let Some(dependents) = self.dependencies.get(source) else {
                continue;
            };
            for dependent in dependents {
                if !keys.contains(dependent) {
                    keys.push(*dependent);
                }
            }
        }
        keys
    }
}
