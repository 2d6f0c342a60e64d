use serde::Deserialize;

/// Inbound slash-command payload as Slack delivers it, form-encoded.
///
/// Every field defaults to empty so a malformed or truncated body degrades to
/// an empty command instead of rejecting the request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SlashCommandPayload {
    pub command: String,
    pub text: String,
    pub response_url: String,
    pub user_id: String,
    pub channel_id: String,
}

/// Dispatch decision derived from the command text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Image { prompt: String },
    Complete { prompt: String },
    Code { prompt: String },
    Unknown { raw: String },
}

/// Case-sensitive prefix match against `dalle`, `gpt`, `code`, checked in
/// that fixed order; first match wins. The prompt is the remainder after the
/// prefix, trimmed of surrounding whitespace.
pub fn parse_command(text: &str) -> BotCommand {
    if let Some(rest) = text.strip_prefix("dalle") {
        return BotCommand::Image { prompt: rest.trim().to_owned() };
    }
    if let Some(rest) = text.strip_prefix("gpt") {
        return BotCommand::Complete { prompt: rest.trim().to_owned() };
    }
    if let Some(rest) = text.strip_prefix("code") {
        return BotCommand::Code { prompt: rest.trim().to_owned() };
    }
    BotCommand::Unknown { raw: text.to_owned() }
}
