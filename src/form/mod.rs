mod binding;
mod controller;
mod definition;
mod validation;


pub use binding::FieldBinding;
pub use calmform_derive::FormModel;
pub use controller::{
    FieldKey, FormError, FormId, FormResult, FormSettings, FormSnapshot, FormStore,
    ValidationMode, create_form,
};
pub use definition::{FieldDefinition, FormDefinition};
pub use validation::{
    FieldLens, FormModel, ValidationContext, ValidationResult, Validator, email_validator,
    required_validator,
};
