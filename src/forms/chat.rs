use serde_derive::{Deserialize, Serialize};
use serde_valid::Validate;

/// Create / rename payload. The 50-char cap matches the sidebar width.
#[derive(Default, Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatForm {
    #[validate(min_length = 1)]
    #[validate(max_length = 50)]
    pub title: String,
}

#[derive(Default, Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MessageForm {
    #[validate(min_length = 1)]
    pub content: String,
    /// Overrides the user's preferred model for this one exchange.
    #[validate(min_length = 1)]
    pub model: Option<String>,
}
