mod builder;
mod style;
mod types;

pub use builder::MessageBuilder;
pub use style::{SeverityStyle, color_for, icon_for, style_for, style_for_name};
pub use types::{ChatAttachment, ChatMessage};
