use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::sync::{Arc, LazyLock, RwLock};

mod generated {
    include!(concat!(env!("OUT_DIR"), "/calmform_i18n_generated.rs"));
}

static CATALOG: LazyLock<I18nCatalog> = LazyLock::new(I18nCatalog::load);

static GLOBAL_DEFAULT_LOCALE: LazyLock<DefaultLocale> = LazyLock::new(DefaultLocale::new);

/// A locale the message catalog ships with.
///
/// Values can only be obtained through catalog resolution, so every `Locale`
/// has a complete message table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Locale(&'static str);

impl Locale {
    /// Looks up a locale tag such as `ru`, `ru-RU` or `ru_RU.UTF-8`.
    pub fn parse(tag: &str) -> Option<Self> {
        CATALOG.find_locale(tag).map(Self)
    }

    /// Like [`Locale::parse`], but unsupported tags collapse to the fallback locale.
    pub fn resolve(tag: &str) -> Self {
        Self::parse(tag).unwrap_or_else(|| {
            tracing::debug!(tag, fallback = CATALOG.default_locale, "unsupported locale");
            Self::fallback()
        })
    }

    pub fn fallback() -> Self {
        Self(CATALOG.default_locale)
    }

    /// The operating system's preferred locale, if the catalog supports it.
    pub fn host() -> Option<Self> {
        #[cfg(feature = "host-locale")]
        {
            sys_locale::get_locale().and_then(|tag| Self::parse(&tag))
        }
        #[cfg(not(feature = "host-locale"))]
        {
            None
        }
    }

    pub const fn code(self) -> &'static str {
        self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::fallback()
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum MessageKey {
    FieldRequired,
    InvalidEmail,
}

impl MessageKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            MessageKey::FieldRequired => "field_required_error",
            MessageKey::InvalidEmail => "invalid_email_error",
        }
    }
}

impl Display for MessageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves a message for an already-resolved locale.
pub fn translate(key: MessageKey, locale: Locale) -> &'static str {
    CATALOG
        .lookup(locale.0, key.as_str())
        .unwrap_or(key.as_str())
}

/// Locales the catalog ships with, in code order.
pub fn available_locales() -> Vec<Locale> {
    let mut locales = CATALOG.locales.keys().copied().map(Locale).collect::<Vec<_>>();
    locales.sort();
    locales
}

/// Fallback locale for validators running without a store-bound locale.
///
/// Handles are cheap to clone and clones share the slot, so one provider can
/// be injected into several call sites. The process-wide instance is
/// [`global_default_locale`].
#[derive(Clone, Debug)]
pub struct DefaultLocale {
    slot: Arc<RwLock<Locale>>,
}

impl Default for DefaultLocale {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultLocale {
    pub fn new() -> Self {
        Self::with_locale(Locale::fallback())
    }

    pub fn with_locale(locale: Locale) -> Self {
        Self {
            slot: Arc::new(RwLock::new(locale)),
        }
    }

    pub fn get(&self) -> Locale {
        match self.slot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Stores the resolved form of `tag` and returns it.
    pub fn set(&self, tag: &str) -> Locale {
        let locale = Locale::resolve(tag);
        let mut slot = match self.slot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = locale;
        locale
    }
}

/// The process-wide default locale slot, initialised to the catalog default.
pub fn global_default_locale() -> DefaultLocale {
    GLOBAL_DEFAULT_LOCALE.clone()
}

/// Overwrites the process-wide default locale and returns the stored value.
pub fn set_default_locale(tag: &str) -> Locale {
    let locale = GLOBAL_DEFAULT_LOCALE.set(tag);
    tracing::debug!(tag, locale = locale.code(), "process default locale changed");
    locale
}

struct I18nCatalog {
    default_locale: &'static str,
    locales: HashMap<&'static str, HashMap<&'static str, &'static str>>,
    normalized_locale_lookup: HashMap<String, &'static str>,
    language_lookup: HashMap<String, &'static str>,
}

impl I18nCatalog {
    fn load() -> Self {
        let mut locales = HashMap::new();
        let mut normalized_locale_lookup = HashMap::new();
        let mut language_lookup = HashMap::new();
        let mut ambiguous_languages = HashSet::new();

        for (locale, entries) in generated::LOCALES.iter().copied() {
            let normalized = normalize_locale_tag(locale);
            normalized_locale_lookup.insert(normalized.clone(), locale);

            let language = primary_language(&normalized).to_string();
            if let Some(existing) = language_lookup.get(&language) {
                if *existing != locale {
                    ambiguous_languages.insert(language.clone());
                }
            } else {
                language_lookup.insert(language, locale);
            }

            locales.insert(locale, entries.iter().copied().collect::<HashMap<_, _>>());
        }

        for language in ambiguous_languages {
            language_lookup.remove(&language);
        }

        Self {
            default_locale: generated::DEFAULT_LOCALE,
            locales,
            normalized_locale_lookup,
            language_lookup,
        }
    }

    fn find_locale(&self, requested: &str) -> Option<&'static str> {
        let normalized = normalize_locale_tag(requested);
        if let Some(locale) = self.normalized_locale_lookup.get(&normalized) {
            return Some(*locale);
        }

        self.language_lookup
            .get(primary_language(&normalized))
            .copied()
    }

    fn lookup(&self, locale: &'static str, key: &str) -> Option<&'static str> {
        self.locales
            .get(locale)
            .and_then(|entries| entries.get(key).copied())
    }
}

fn primary_language(normalized: &str) -> &str {
    normalized.split('-').next().unwrap_or_default()
}

fn normalize_locale_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    let without_encoding = trimmed.split('.').next().unwrap_or(trimmed);
    let without_variant = without_encoding
        .split('@')
        .next()
        .unwrap_or(without_encoding);
    without_variant
        .replace('_', "-")
        .split('-')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
