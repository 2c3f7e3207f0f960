extern crate self as calmform;

pub mod form;
pub mod i18n;

pub use form::{FormDefinition, FormSettings, FormStore, create_form};
pub use i18n::{Locale, set_default_locale};
