use serde_derive::{Deserialize, Serialize};
use serde_valid::Validate;

#[derive(Default, Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PreferenceForm {
    #[validate(min_length = 1)]
    pub model: String,
}
