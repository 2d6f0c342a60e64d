use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    PlainText { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        text: TextObject,
    },
    Image {
        image_url: String,
        alt_text: String,
        // Image block titles must be plain_text on the wire.
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<TextObject>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    InChannel,
}

/// Body posted to a slash command's response callback URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    pub response_type: ResponseType,
    pub blocks: Vec<Block>,
}

/// In-channel message embedding a generated image by its public URL, titled
/// with the prompt that produced it.
pub fn image_message(prompt: &str, public_url: &str) -> WebhookMessage {
    WebhookMessage {
        response_type: ResponseType::InChannel,
        blocks: vec![Block::Image {
            image_url: public_url.to_owned(),
            alt_text: prompt.to_owned(),
            title: Some(TextObject::plain(prompt)),
        }],
    }
}

/// In-channel markdown message quoting the prompt followed by the completion.
pub fn completion_message(prompt: &str, completion: &str) -> WebhookMessage {
    WebhookMessage {
        response_type: ResponseType::InChannel,
        blocks: vec![Block::Section { text: TextObject::mrkdwn(format!(">{prompt}\n{completion}")) }],
    }
}
