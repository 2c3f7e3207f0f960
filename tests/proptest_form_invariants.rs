//! Property-based invariant tests for the form store.
//!
//! 1. The required check fails exactly on the empty string
//! 2. The email check agrees with a hand-written shape predicate
//! 3. Key sets of values, errors and validity never change under any operation sequence
//! 4. Silent validation is idempotent
//! 5. `has_modified` agrees with a field-by-field comparison
//! 6. Silent operations never surface a message

use calmform::form::{
    FieldDefinition, FieldKey, FormDefinition, FormModel, FormSettings, FormStore,
    ValidationContext, create_form, email_validator, required_validator,
};
use calmform::i18n::Locale;
use proptest::prelude::*;

#[derive(Clone, Debug, PartialEq, calmform::form::FormModel)]
struct AccountForm {
    login: String,
    email: String,
    bio: String,
}

#[derive(Clone, Debug)]
enum Op {
    Change(usize, String),
    Blur(usize),
    SetValues(Vec<(usize, String)>),
    SetInitial(usize, String),
    Validate(bool),
    Reset,
    ResetField(usize),
    ClearErrors,
}

// ── Helpers ──────────────────────────────────────────────────────────

fn store() -> FormStore<AccountForm> {
    let fields = AccountForm::fields();
    create_form(
        FormDefinition::<AccountForm>::new()
            .field(fields.login(), FieldDefinition::required())
            .field(
                fields.email(),
                FieldDefinition::required().rule(email_validator),
            ),
        FormSettings::default().locale("en"),
    )
}

fn key(index: usize) -> FieldKey {
    let keys = AccountForm::field_keys();
    keys[index % keys.len()]
}

fn email_shape(value: &str) -> bool {
    if value.contains(['\n', '\r', '\u{2028}', '\u{2029}']) {
        return false;
    }
    value.char_indices().any(|(at, c)| {
        if c != '@' || at == 0 {
            return false;
        }
        let domain = &value[at + 1..];
        domain
            .char_indices()
            .any(|(dot, d)| d == '.' && dot > 0 && dot + 1 < domain.len())
    })
}

fn value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-z]{1,6}",
        "[a-z]{1,4}@[a-z]{1,4}\\.[a-z]{1,3}",
        ".{0,12}",
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, value_strategy()).prop_map(|(i, v)| Op::Change(i, v)),
        (0..3usize).prop_map(Op::Blur),
        prop::collection::vec((0..3usize, value_strategy()), 0..4).prop_map(Op::SetValues),
        (0..3usize, value_strategy()).prop_map(|(i, v)| Op::SetInitial(i, v)),
        any::<bool>().prop_map(Op::Validate),
        Just(Op::Reset),
        (0..3usize).prop_map(Op::ResetField),
        Just(Op::ClearErrors),
    ]
}

fn apply(store: &FormStore<AccountForm>, op: &Op) {
    let result = match op {
        Op::Change(i, v) => store.on_change([(key(*i), v.clone())]),
        Op::Blur(i) => store.on_blur(key(*i)),
        Op::SetValues(pairs) => store.set_values(pairs.iter().map(|(i, v)| (key(*i), v.clone()))),
        Op::SetInitial(i, v) => store.set_initial_values([(key(*i), v.clone())]),
        Op::Validate(silent) => store.validate(*silent, &[]),
        Op::Reset => store.reset(),
        Op::ResetField(i) => store.reset_field(key(*i)),
        Op::ClearErrors => store.clear_errors(),
    };
    result.expect("store operation");
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Built-in validators
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn required_fails_exactly_on_empty(value in ".{0,16}") {
        let model = AccountForm::blank();
        let cx = ValidationContext::new(&model, Locale::fallback());
        prop_assert_eq!(required_validator(&value, &cx).is_ok(), !value.is_empty());
    }

    #[test]
    fn email_matches_shape_predicate(value in "[a@.\n ]{0,10}") {
        let model = AccountForm::blank();
        let cx = ValidationContext::new(&model, Locale::fallback());
        prop_assert_eq!(email_validator(&value, &cx).is_ok(), email_shape(&value));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3-6. Store invariants under arbitrary operation sequences
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn key_sets_are_stable(ops in prop::collection::vec(op_strategy(), 0..24)) {
        let store = store();
        for op in &ops {
            apply(&store, op);
            let snapshot = store.snapshot().expect("snapshot");
            let keys = AccountForm::field_keys();
            prop_assert_eq!(snapshot.errors.len(), keys.len());
            prop_assert_eq!(snapshot.valid.len(), keys.len());
            for key in keys {
                prop_assert!(snapshot.errors.contains_key(key));
                prop_assert!(snapshot.valid.contains_key(key));
            }
        }
    }

    #[test]
    fn silent_validation_is_idempotent(ops in prop::collection::vec(op_strategy(), 0..16)) {
        let store = store();
        for op in &ops {
            apply(&store, op);
        }
        store.validate(true, &[]).expect("first pass");
        let first = store.snapshot().expect("first");
        store.validate(true, &[]).expect("second pass");
        let second = store.snapshot().expect("second");
        prop_assert_eq!(first.errors, second.errors);
        prop_assert_eq!(first.valid, second.valid);
    }

    #[test]
    fn has_modified_matches_field_comparison(ops in prop::collection::vec(op_strategy(), 0..16)) {
        let store = store();
        for op in &ops {
            apply(&store, op);
        }
        let snapshot = store.snapshot().expect("snapshot");
        let differs = AccountForm::field_keys()
            .iter()
            .any(|key| snapshot.values.value(*key) != snapshot.initial_values.value(*key));
        prop_assert_eq!(store.has_modified().expect("has modified"), differs);
        prop_assert_eq!(snapshot.is_modified, differs);
    }

    #[test]
    fn silent_operations_never_surface_messages(values in prop::collection::vec(value_strategy(), 3)) {
        let store = store();
        store
            .set_values(values.iter().enumerate().map(|(i, v)| (key(i), v.clone())))
            .expect("set values");
        store.on_change([(key(0), values[0].clone())]).expect("change");
        store.reset().expect("reset");
        store.validate(true, &[]).expect("silent validate");
        prop_assert!(store.errors().expect("errors").values().all(Option::is_none));
    }
}
