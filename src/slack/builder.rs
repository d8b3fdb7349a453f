use crate::config::DispatchConfig;
use crate::event::LogEvent;
use crate::layout::Layout;
use crate::slack::style::style_for;
use crate::slack::types::{ChatAttachment, ChatMessage};

/// Assembles webhook messages from log events.
pub struct MessageBuilder<'a> {
    config: &'a DispatchConfig,
    layout: &'a dyn Layout,
}

impl<'a> MessageBuilder<'a> {
    pub fn new(config: &'a DispatchConfig, layout: &'a dyn Layout) -> Self {
        Self { config, layout }
    }

    /// Build the message for `event`, or `None` if the event has no message.
    pub fn build(&self, event: &LogEvent, profile: &str) -> Option<ChatMessage> {
        let fallback = event.formatted_message()?;
        let style = style_for(event.severity);

        Some(ChatMessage {
            channel: self.config.channel.clone(),
            text: format!("[{}] {}", profile, event.logger),
            attachments: vec![ChatAttachment::new(
                fallback,
                self.layout.render(event),
                style.color,
            )],
            icon_emoji: style.icon.to_string(),
            username: self.config.username.clone(),
        })
    }
}
