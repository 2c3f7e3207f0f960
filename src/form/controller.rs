use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::definition::FormDefinition;
use super::validation::FormModel;
use crate::i18n::Locale;

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

impl Display for FormId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "form-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// When `on_change` runs validation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ValidationMode {
    /// Silently revalidate changed fields on every change, surface on blur.
    #[default]
    OnChange,
    /// Only blur (and explicit calls) validate.
    OnBlur,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormSettings {
    /// Requested working locale. An unsupported tag falls back to the catalog
    /// default without consulting the host.
    pub locale: Option<String>,
    pub detect_host_locale: bool,
    pub validation_mode: ValidationMode,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            locale: None,
            detect_host_locale: true,
            validation_mode: ValidationMode::OnChange,
        }
    }
}

impl FormSettings {
    pub fn locale(mut self, tag: impl Into<String>) -> Self {
        self.locale = Some(tag.into());
        self
    }

    pub fn validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = mode;
        self
    }

    pub fn detect_host_locale(mut self, detect: bool) -> Self {
        self.detect_host_locale = detect;
        self
    }

    pub(super) fn resolve_locale(&self) -> Locale {
        if let Some(tag) = self.locale.as_deref() {
            return Locale::resolve(tag);
        }
        if self.detect_host_locale {
            if let Some(locale) = Locale::host() {
                return locale;
            }
        }
        Locale::fallback()
    }
}

#[derive(Clone, Debug)]
pub struct FormSnapshot<T> {
    pub id: FormId,
    pub locale: Locale,
    pub values: T,
    pub initial_values: T,
    pub errors: BTreeMap<FieldKey, Option<String>>,
    pub valid: BTreeMap<FieldKey, bool>,
    pub is_valid: bool,
    pub is_modified: bool,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    StatePoisoned(&'static str),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

pub(super) struct FormState<T> {
    pub(super) locale: Locale,
    pub(super) values: T,
    pub(super) initial_values: T,
    pub(super) errors: BTreeMap<FieldKey, Option<String>>,
    pub(super) valid: BTreeMap<FieldKey, bool>,
}

impl<T: FormModel> FormState<T> {
    pub(super) fn is_valid(&self) -> bool {
        T::field_keys()
            .iter()
            .all(|key| self.valid.get(key).copied().unwrap_or(false))
    }

    pub(super) fn modified_fields(&self) -> Vec<FieldKey> {
        T::field_keys()
            .iter()
            .copied()
            .filter(|key| self.values.value(*key) != self.initial_values.value(*key))
            .collect()
    }

    pub(super) fn clear_errors(&mut self) {
        for error in self.errors.values_mut() {
            *error = None;
        }
    }
}

/// Form state container built by [`create_form`].
///
/// Clones share the same state. Each public operation holds the state lock for
/// its whole duration, so values, errors and validity flags are always
/// published together.
pub struct FormStore<T>
where
    T: FormModel,
{
    pub(super) id: FormId,
    pub(super) validation_mode: ValidationMode,
    pub(super) definition: Arc<FormDefinition<T>>,
    pub(super) state: Arc<RwLock<FormState<T>>>,
}

impl<T> Clone for FormStore<T>
where
    T: FormModel,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            validation_mode: self.validation_mode,
            definition: self.definition.clone(),
            state: self.state.clone(),
        }
    }
}

/// Builds a store with fresh state from field definitions and settings.
pub fn create_form<T>(definition: FormDefinition<T>, settings: FormSettings) -> FormStore<T>
where
    T: FormModel,
{
    FormStore::new(definition, settings)
}

impl<T> FormStore<T>
where
    T: FormModel,
{
    pub fn new(mut definition: FormDefinition<T>, settings: FormSettings) -> Self {
        definition.complete();
        let id = FormId::next();
        let locale = settings.resolve_locale();
        let initial_values = definition.initial_values();

        let mut errors = BTreeMap::new();
        let mut valid = BTreeMap::new();
        for key in T::field_keys() {
            errors.insert(*key, None);
            valid.insert(*key, !definition.has_validators(*key));
        }

        tracing::debug!(
            form = %id,
            locale = locale.code(),
            fields = T::field_keys().len(),
            "form created"
        );

        Self {
            id,
            validation_mode: settings.validation_mode,
            definition: Arc::new(definition),
            state: Arc::new(RwLock::new(FormState {
                locale,
                values: initial_values.clone(),
                initial_values,
                errors,
                valid,
            })),
        }
    }

    pub fn id(&self) -> FormId {
        self.id
    }

    pub fn definition(&self) -> &FormDefinition<T> {
        &self.definition
    }

    pub fn locale(&self) -> FormResult<Locale> {
        Ok(read_lock(&self.state, "reading form locale")?.locale)
    }

    /// Changes the locale used for subsequent validation messages. Messages
    /// already surfaced keep their language until the field is revalidated.
    pub fn set_locale(&self, locale: Locale) -> FormResult<()> {
        write_lock(&self.state, "setting form locale")?.locale = locale;
        Ok(())
    }

    pub fn is_valid(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "checking form validity")?.is_valid())
    }

    pub fn values(&self) -> FormResult<T> {
        Ok(read_lock(&self.state, "reading form values")?.values.clone())
    }

    /// Current value of `field`, or `None` for keys outside the model.
    pub fn value(&self, field: impl Into<FieldKey>) -> FormResult<Option<String>> {
        let key = field.into();
        Ok(read_lock(&self.state, "reading field value")?
            .values
            .value(key)
            .map(str::to_owned))
    }

    pub fn initial_values(&self) -> FormResult<T> {
        Ok(read_lock(&self.state, "reading initial values")?
            .initial_values
            .clone())
    }

    pub fn errors(&self) -> FormResult<BTreeMap<FieldKey, Option<String>>> {
        Ok(read_lock(&self.state, "reading form errors")?.errors.clone())
    }

    pub fn error(&self, field: impl Into<FieldKey>) -> FormResult<Option<String>> {
        let key = field.into();
        Ok(read_lock(&self.state, "reading field error")?
            .errors
            .get(&key)
            .cloned()
            .flatten())
    }

    pub fn valid(&self) -> FormResult<BTreeMap<FieldKey, bool>> {
        Ok(read_lock(&self.state, "reading validity flags")?.valid.clone())
    }

    pub fn is_field_valid(&self, field: impl Into<FieldKey>) -> FormResult<bool> {
        let key = field.into();
        Ok(read_lock(&self.state, "reading field validity")?
            .valid
            .get(&key)
            .copied()
            .unwrap_or(false))
    }

    pub fn has_modified(&self) -> FormResult<bool> {
        Ok(!read_lock(&self.state, "checking modification")?
            .modified_fields()
            .is_empty())
    }

    pub fn modified_fields(&self) -> FormResult<Vec<FieldKey>> {
        Ok(read_lock(&self.state, "listing modified fields")?.modified_fields())
    }

    /// Merges `values` and silently revalidates the changed fields and their
    /// dependents. In [`ValidationMode::OnBlur`] only the merge happens.
    pub fn on_change<I, K, V>(&self, values: I) -> FormResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FieldKey>,
        V: Into<String>,
    {
        let pairs = collect_pairs(values);
        let mut state = write_lock(&self.state, "applying field change")?;
        let affected = self.merge(&mut state.values, pairs);
        if self.validation_mode == ValidationMode::OnChange {
            self.revalidate_affected(&mut state, &affected);
        }
        Ok(())
    }

    pub fn on_blur(&self, field: impl Into<FieldKey>) -> FormResult<()> {
        let key = field.into();
        let mut state = write_lock(&self.state, "validating blurred field")?;
        self.run_validation(&mut state, false, &[key]);
        Ok(())
    }

    /// Merges `values` and silently revalidates every changed field.
    pub fn set_values<I, K, V>(&self, values: I) -> FormResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FieldKey>,
        V: Into<String>,
    {
        let pairs = collect_pairs(values);
        let mut state = write_lock(&self.state, "setting form values")?;
        let affected = self.merge(&mut state.values, pairs);
        self.revalidate_affected(&mut state, &affected);
        Ok(())
    }

    /// Merges into the baseline only; values, errors and flags are untouched.
    pub fn set_initial_values<I, K, V>(&self, values: I) -> FormResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FieldKey>,
        V: Into<String>,
    {
        let pairs = collect_pairs(values);
        let mut state = write_lock(&self.state, "setting initial values")?;
        self.merge(&mut state.initial_values, pairs);
        Ok(())
    }

    pub fn reset(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form")?;
        state.values = state.initial_values.clone();
        state.clear_errors();
        self.run_validation(&mut state, true, &[]);
        tracing::debug!(form = %self.id, "form reset");
        Ok(())
    }

    pub fn reset_field(&self, field: impl Into<FieldKey>) -> FormResult<()> {
        let key = field.into();
        let mut state = write_lock(&self.state, "resetting field")?;
        let Some(initial) = state.initial_values.value(key).map(str::to_owned) else {
            tracing::debug!(form = %self.id, field = key.as_str(), "ignoring unknown form field");
            return Ok(());
        };
        if let Some(slot) = state.values.value_mut(key) {
            *slot = initial;
        }
        state.errors.insert(key, None);
        self.run_validation(&mut state, true, &[key]);
        Ok(())
    }

    /// Withdraws every surfaced message. Validity flags are kept.
    pub fn clear_errors(&self) -> FormResult<()> {
        write_lock(&self.state, "clearing form errors")?.clear_errors();
        Ok(())
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot<T>> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormSnapshot {
            id: self.id,
            locale: state.locale,
            values: state.values.clone(),
            initial_values: state.initial_values.clone(),
            errors: state.errors.clone(),
            valid: state.valid.clone(),
            is_valid: state.is_valid(),
            is_modified: !state.modified_fields().is_empty(),
        })
    }

    /// Writes known keys into `target` and returns them in first-seen order.
    fn merge(&self, target: &mut T, pairs: Vec<(FieldKey, String)>) -> Vec<FieldKey> {
        let mut affected = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let Some(slot) = target.value_mut(key) else {
                tracing::debug!(form = %self.id, field = key.as_str(), "ignoring unknown form field");
                continue;
            };
            tracing::trace!(form = %self.id, field = key.as_str(), "field value merged");
            *slot = value;
            if !affected.contains(&key) {
                affected.push(key);
            }
        }
        affected
    }

    fn revalidate_affected(&self, state: &mut FormState<T>, affected: &[FieldKey]) {
        if affected.is_empty() {
            return;
        }
        let include = self.definition.with_dependents(affected);
        self.run_validation(state, true, &include);
    }
}

fn collect_pairs<I, K, V>(values: I) -> Vec<(FieldKey, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<FieldKey>,
    V: Into<String>,
{
    values
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
