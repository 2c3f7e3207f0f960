use calmform::form::{FieldKey, FieldLens, FormModel};

#[derive(Clone, calmform::form::FormModel)]
struct DemoForm {
    email: String,
    display_name: String,
}

fn main() {
    let fields = DemoForm::fields();
    let lens = fields.email();
    let mut model = DemoForm::blank();
    lens.set(&mut model, "b@calm.ui".to_string());
    assert_eq!(lens.key().as_str(), "email");
    assert_eq!(lens.get(&model), "b@calm.ui");
    assert_eq!(
        DemoForm::field_keys(),
        &[FieldKey::new("email"), FieldKey::new("display_name")]
    );
    assert_eq!(model.value(fields.display_name().into()), Some(""));
}
