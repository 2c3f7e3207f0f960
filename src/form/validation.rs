use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::controller::{FieldKey, FormResult, FormState, FormStore, write_lock};
use crate::i18n::{self, DefaultLocale, Locale, MessageKey};

/// `Ok(())` on success, otherwise the localized message to surface.
pub type ValidationResult = Result<(), String>;

pub type Validator<T> =
    Arc<dyn Fn(&str, &ValidationContext<'_, T>) -> ValidationResult + Send + Sync>;

/// Typed accessor for one `String` field of a form model.
pub trait FieldLens<T>: Copy + Into<FieldKey> + Send + Sync + 'static {
    fn key(self) -> FieldKey;
    fn get<'a>(self, model: &'a T) -> &'a str;
    fn set(self, model: &mut T, value: String);
}

/// A fixed set of named string fields. Usually derived with `#[derive(FormModel)]`.
pub trait FormModel: Clone + Send + Sync + 'static {
    type Fields;

    fn fields() -> Self::Fields;

    /// Field keys in declaration order.
    fn field_keys() -> &'static [FieldKey];

    /// A model with every field empty.
    fn blank() -> Self;

    fn value(&self, key: FieldKey) -> Option<&str>;

    fn value_mut(&mut self, key: FieldKey) -> Option<&mut String>;
}

/// What a validator sees: the current values and the locale for messages.
pub struct ValidationContext<'a, T> {
    model: &'a T,
    locale: Locale,
}

impl<'a, T> ValidationContext<'a, T> {
    pub fn new(model: &'a T, locale: Locale) -> Self {
        Self { model, locale }
    }

    /// Context for a validator run outside any store; messages use the
    /// process-wide default locale.
    pub fn detached(model: &'a T) -> Self {
        Self::with_default_locale(model, &i18n::global_default_locale())
    }

    pub fn with_default_locale(model: &'a T, default_locale: &DefaultLocale) -> Self {
        Self::new(model, default_locale.get())
    }

    pub fn model(&self) -> &'a T {
        self.model
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn message(&self, key: MessageKey) -> String {
        i18n::translate(key, self.locale).to_string()
    }
}

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\n\r\x{2028}\x{2029}]+@[^\n\r\x{2028}\x{2029}]+\.[^\n\r\x{2028}\x{2029}]+$")
        .expect("valid email regex literal")
});

/// Fails on the empty string. Whitespace counts as a value.
pub fn required_validator<T>(value: &str, cx: &ValidationContext<'_, T>) -> ValidationResult {
    if value.is_empty() {
        Err(cx.message(MessageKey::FieldRequired))
    } else {
        Ok(())
    }
}

/// Accepts anything shaped like `local@domain.tld`; not an RFC 5322 check.
pub fn email_validator<T>(value: &str, cx: &ValidationContext<'_, T>) -> ValidationResult {
    if EMAIL_SHAPE.is_match(value) {
        Ok(())
    } else {
        Err(cx.message(MessageKey::InvalidEmail))
    }
}

impl<T> FormStore<T>
where
    T: FormModel,
{
    /// Validates every field, or only the fields in `include` when it is not
    /// empty. Keys outside the model are ignored. Silent runs update validity
    /// but leave no message in `errors`.
    pub fn validate(&self, silent: bool, include: &[FieldKey]) -> FormResult<()> {
        let mut state = write_lock(&self.state, "validating form")?;
        self.run_validation(&mut state, silent, include);
        Ok(())
    }

    pub(super) fn run_validation(
        &self,
        state: &mut FormState<T>,
        silent: bool,
        include: &[FieldKey],
    ) {
        let outcomes = {
            let cx = ValidationContext::new(&state.values, state.locale);
            let mut outcomes = Vec::new();
            for key in T::field_keys() {
                if !include.is_empty() && !include.contains(key) {
                    continue;
                }
                let Some(definition) = self.definition.get(*key) else {
                    continue;
                };
                if !definition.has_validators() {
                    continue;
                }
                let value = state.values.value(*key).unwrap_or_default();
                outcomes.push((*key, definition.check(value, &cx)));
            }
            outcomes
        };

        for (key, outcome) in outcomes {
            tracing::debug!(
                form = %self.id,
                field = key.as_str(),
                silent,
                valid = outcome.is_ok(),
                "field validated"
            );
            match outcome {
                Ok(()) => {
                    state.valid.insert(key, true);
                    state.errors.insert(key, None);
                }
                Err(message) => {
                    state.valid.insert(key, false);
                    state.errors.insert(key, (!silent).then_some(message));
                }
            }
        }
    }
}
