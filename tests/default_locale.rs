//! The process-wide default locale is global state, so it is exercised in its
//! own test binary and from a single test.

use calmform::form::{ValidationContext, email_validator, required_validator};
use calmform::i18n::{self, Locale, MessageKey, translate};

#[derive(Clone)]
struct Detached;

#[test]
fn process_default_locale_drives_detached_validators() {
    let cx = ValidationContext::detached(&Detached);
    assert_eq!(cx.locale().code(), "en");
    assert_eq!(
        required_validator("", &cx),
        Err("This field is required".to_string())
    );

    let ru = calmform::set_default_locale("ru_RU.UTF-8");
    assert_eq!(ru.code(), "ru");
    assert_eq!(i18n::global_default_locale().get(), ru);

    let cx = ValidationContext::detached(&Detached);
    assert_eq!(
        required_validator("", &cx),
        Err(translate(MessageKey::FieldRequired, ru).to_string())
    );
    assert_eq!(
        email_validator("a@b", &cx),
        Err(translate(MessageKey::InvalidEmail, ru).to_string())
    );
    assert_eq!(required_validator("x", &cx), Ok(()));

    assert_eq!(calmform::set_default_locale("tlh"), Locale::fallback());
    let cx = ValidationContext::detached(&Detached);
    assert_eq!(
        email_validator("a@b", &cx),
        Err("Invalid email address".to_string())
    );
}
