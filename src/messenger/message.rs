//! Outbound Send API and handover payloads.
//!
//! The client serializes any `Serialize` value; these types cover the shapes
//! the convenience wrappers on [`super::MessengerClient`] send.

use serde::{Deserialize, Serialize};

/// Send API path for messages and sender actions.
pub const MESSAGES_PATH: &str = "/me/messages";

/// Handover protocol path: hand the thread to another app.
pub const PASS_THREAD_CONTROL_PATH: &str = "/me/pass_thread_control";

/// Handover protocol path: primary receiver takes the thread back.
pub const TAKE_THREAD_CONTROL_PATH: &str = "/me/take_thread_control";

/// Handover protocol path: secondary receiver asks for the thread.
pub const REQUEST_THREAD_CONTROL_PATH: &str = "/me/request_thread_control";

/// Page-scoped recipient reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Page-scoped user id (PSID).
    pub id: String,
}

impl Recipient {
    /// Reference a user by PSID.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Why a message is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessagingType {
    /// Reply to a received message.
    Response,
    /// Proactive update inside the messaging window.
    Update,
    /// Tagged message outside the messaging window.
    MessageTag,
}

/// Typing and read indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    /// Show the typing bubble.
    TypingOn,
    /// Hide the typing bubble.
    TypingOff,
    /// Mark the last message as seen.
    MarkSeen,
}

/// Message content. Attachments and quick replies are passed through as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    /// Plain text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Attachment object (template, image, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<serde_json::Value>,
    /// Quick reply buttons.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<serde_json::Value>,
    /// Developer-defined metadata echoed back on `message_echoes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

/// A Send API request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Who receives the message.
    pub recipient: Recipient,
    /// Messaging type; required by the platform for content messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messaging_type: Option<MessagingType>,
    /// Message content. Mutually exclusive with `sender_action`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageBody>,
    /// Sender action. Mutually exclusive with `message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_action: Option<SenderAction>,
    /// Push notification type (`REGULAR`, `SILENT_PUSH`, `NO_PUSH`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<String>,
    /// Message tag for `MESSAGE_TAG` sends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl OutboundMessage {
    /// A text reply to `recipient_id`.
    pub fn text(recipient_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            recipient: Recipient::new(recipient_id),
            messaging_type: Some(MessagingType::Response),
            message: Some(MessageBody {
                text: Some(text.into()),
                ..MessageBody::default()
            }),
            sender_action: None,
            notification_type: None,
            tag: None,
        }
    }

    /// A sender action for `recipient_id`.
    pub fn sender_action(recipient_id: impl Into<String>, action: SenderAction) -> Self {
        Self {
            recipient: Recipient::new(recipient_id),
            messaging_type: None,
            message: None,
            sender_action: Some(action),
            notification_type: None,
            tag: None,
        }
    }
}

/// Handover protocol request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadControl {
    /// The user whose thread changes hands.
    pub recipient: Recipient,
    /// Receiving app; only used by `pass_thread_control`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_app_id: Option<String>,
    /// Free-form metadata delivered to the other app.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}
