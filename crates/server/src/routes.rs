use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Form, Router};
use genie_slack::commands::{parse_command, BotCommand, SlashCommandPayload};
use tracing::{info, warn};

use crate::handlers::CommandHandlers;

pub fn router(handlers: CommandHandlers) -> Router {
    Router::new().route("/slack_command", post(slack_command)).with_state(handlers)
}

/// Single inbound route. Matched commands are dispatched as detached tasks so
/// this handler returns before any external call starts; only the unknown
/// command path replies synchronously.
pub async fn slack_command(
    State(handlers): State<CommandHandlers>,
    form: Result<Form<SlashCommandPayload>, FormRejection>,
) -> String {
    let payload = match form {
        Ok(Form(payload)) => payload,
        Err(rejection) => {
            // Malformed bodies degrade to an empty command rather than a 4xx.
            warn!(error = %rejection, "failed to parse slash command payload");
            SlashCommandPayload::default()
        }
    };

    info!(command = %payload.text, "received slack command");

    match parse_command(&payload.text) {
        BotCommand::Image { prompt } => {
            let handlers = handlers.clone();
            let response_url = payload.response_url;
            tokio::spawn(async move { handlers.generate_image(prompt, response_url).await });
            String::new()
        }
        BotCommand::Complete { prompt } => {
            let handlers = handlers.clone();
            let response_url = payload.response_url;
            tokio::spawn(async move { handlers.complete_text(prompt, response_url).await });
            String::new()
        }
        BotCommand::Code { prompt } => {
            let handlers = handlers.clone();
            let response_url = payload.response_url;
            tokio::spawn(async move { handlers.complete_code(prompt, response_url).await });
            String::new()
        }
        BotCommand::Unknown { raw } => {
            warn!(command = %raw, "unknown command");
            if handlers.notifications_enabled() {
                format!("Unknown command: '{raw}'")
            } else {
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::State;
    use axum::Form;
    use genie_slack::commands::SlashCommandPayload;

    use super::slack_command;
    use crate::handlers::tests::{
        handlers, RecordingNotifier, RecordingStore, StubCompletions, StubImages,
    };

    fn payload(text: &str) -> SlashCommandPayload {
        SlashCommandPayload {
            command: "/genie".to_owned(),
            text: text.to_owned(),
            response_url: "https://hooks.slack.test/r1".to_owned(),
            user_id: "U1".to_owned(),
            channel_id: "C1".to_owned(),
        }
    }

    fn test_handlers(
        store: Arc<RecordingStore>,
        notifier: Arc<RecordingNotifier>,
        send_to_slack: bool,
    ) -> crate::handlers::CommandHandlers {
        handlers(
            StubImages { fail: false },
            Arc::new(StubCompletions {
                result: Ok("done"),
                seen_models: std::sync::Mutex::new(Vec::new()),
            }),
            store,
            notifier,
            send_to_slack,
        )
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("background task did not complete in time");
    }

    #[tokio::test]
    async fn unknown_command_replies_synchronously_when_notifications_enabled() {
        let store = Arc::new(RecordingStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let handlers = test_handlers(store, notifier, true);

        let body =
            slack_command(State(handlers), Ok(Form(payload("unknown foo")))).await;

        assert_eq!(body, "Unknown command: 'unknown foo'");
    }

    #[tokio::test]
    async fn unknown_command_replies_with_empty_body_when_notifications_disabled() {
        let store = Arc::new(RecordingStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let handlers = test_handlers(store, notifier, false);

        let body = slack_command(State(handlers), Ok(Form(payload("unknown foo")))).await;

        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn dalle_command_returns_immediately_and_runs_in_background() {
        let store = Arc::new(RecordingStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let handlers = test_handlers(store.clone(), notifier.clone(), true);

        let body = slack_command(State(handlers), Ok(Form(payload("dalle a red fox")))).await;
        assert!(body.is_empty());

        wait_for(|| notifier.posts.lock().expect("lock").len() == 1).await;
        assert_eq!(store.events.lock().expect("lock").len(), 2);
    }

    #[tokio::test]
    async fn gpt_command_dispatches_completion_in_background() {
        let store = Arc::new(RecordingStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let handlers = test_handlers(store, notifier.clone(), true);

        let body =
            slack_command(State(handlers), Ok(Form(payload("gpt explain recursion")))).await;
        assert!(body.is_empty());

        wait_for(|| notifier.posts.lock().expect("lock").len() == 1).await;
    }

    #[tokio::test]
    async fn router_replies_to_unknown_command_over_http() {
        use axum::body::Body;
        use axum::http::{header, Request, StatusCode};
        use tower::ServiceExt;

        let store = Arc::new(RecordingStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let app = super::router(test_handlers(store, notifier, true));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/slack_command")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(
                        "command=%2Fgenie&text=unknown+foo&response_url=https%3A%2F%2Fhooks.slack.test%2Fr1",
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.expect("body");
        assert_eq!(&body[..], b"Unknown command: 'unknown foo'");
    }

    #[tokio::test]
    async fn router_degrades_malformed_body_to_empty_command() {
        use axum::body::Body;
        use axum::http::{header, Request, StatusCode};
        use tower::ServiceExt;

        let store = Arc::new(RecordingStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let app = super::router(test_handlers(store.clone(), notifier.clone(), true));

        // Wrong content type rejects form extraction; the handler falls back
        // to an all-empty payload instead of a 4xx.
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/slack_command")
                    .header(header::CONTENT_TYPE, "text/plain")
                    .body(Body::from("dalle a red fox"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.expect("body");
        assert_eq!(&body[..], b"Unknown command: ''");
        assert!(store.events.lock().expect("lock").is_empty());
        assert!(notifier.posts.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn empty_payload_yields_unknown_command_reply() {
        let store = Arc::new(RecordingStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let handlers = test_handlers(store, notifier, true);

        // The fallback payload for a malformed body is all-empty fields.
        let body =
            slack_command(State(handlers), Ok(Form(SlashCommandPayload::default()))).await;

        assert_eq!(body, "Unknown command: ''");
    }
}
