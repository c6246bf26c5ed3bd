use serde_derive::{Deserialize, Serialize};
use serde_valid::Validate;

#[derive(Default, Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(min_length = 1)]
    pub username: String,
    #[validate(min_length = 1)]
    pub password: String,
}

#[derive(Default, Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(pattern = r"^[a-zA-Z0-9_]{3,30}$")]
    pub username: String,
    #[validate(min_length = 1)]
    #[validate(max_length = 100)]
    pub name: String,
    #[validate(pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$")]
    pub email: String,
    #[validate(min_length = 8)]
    #[validate(max_length = 72)]
    pub password: String,
}

#[derive(Default, Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordForm {
    #[validate(min_length = 1)]
    pub current_password: String,
    #[validate(min_length = 8)]
    #[validate(max_length = 72)]
    pub new_password: String,
}
