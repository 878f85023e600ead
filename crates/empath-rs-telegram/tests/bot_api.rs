//! Bot API client and poller against a local HTTP stub.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use empath_rs_config::TelegramConfig;
use empath_rs_core::prompts::WELCOME_MESSAGE;
use empath_rs_core::{
    CompletionError, EditOutcome, FragmentStream, LlmCompletionClient, MessageHandle, Relay,
    RelayOptions, StreamRenderer, Transport,
};
use empath_rs_history::{HistoryManager, RetentionPolicy};
use empath_rs_telegram::{Poller, TelegramClient};
use empath_rs_test_utils::{MemoryStorage, StreamingLLM};
use futures_util::stream;
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

const TOKEN: &str = "123-test";
const NOT_MODIFIED: &str = "Bad Request: message is not modified: specified new message content and reply markup are exactly the same as a current content and reply markup of the message";

#[derive(Clone, Default)]
struct Stub {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
    update_batches: Arc<Mutex<VecDeque<Value>>>,
    edit_reply: Arc<Mutex<Option<(StatusCode, Value)>>>,
    next_message_id: Arc<Mutex<i64>>,
}

impl Stub {
    fn requests_for(&self, method: &str) -> Vec<Value> {
        self.requests
            .lock()
            .iter()
            .filter(|(name, _)| name == method)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn reject_edits(&self, description: &str) {
        *self.edit_reply.lock() = Some((
            StatusCode::BAD_REQUEST,
            json!({"ok": false, "error_code": 400, "description": description}),
        ));
    }

    fn message(&self, chat_id: &Value, text: &Value) -> Value {
        let mut next = self.next_message_id.lock();
        *next += 1;
        json!({
            "message_id": *next,
            "date": 1700000000,
            "chat": {"id": chat_id, "type": "private"},
            "text": text,
        })
    }
}

async fn bot_api(
    State(stub): State<Stub>,
    Path(method): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.requests.lock().push((method.clone(), body.clone()));
    match method.as_str() {
        "getMe" => (
            StatusCode::OK,
            Json(json!({"ok": true, "result": {"id": 1, "is_bot": true, "username": "EmpathBot"}})),
        ),
        "getUpdates" => {
            let batch = stub.update_batches.lock().pop_front();
            let updates = match batch {
                Some(batch) => batch,
                None => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    json!([])
                }
            };
            (StatusCode::OK, Json(json!({"ok": true, "result": updates})))
        }
        "sendMessage" => {
            let message = stub.message(&body["chat_id"], &body["text"]);
            (StatusCode::OK, Json(json!({"ok": true, "result": message})))
        }
        "editMessageText" => {
            let scripted = stub.edit_reply.lock().clone();
            match scripted {
                Some((status, reply)) => (status, Json(reply)),
                None => {
                    let message = stub.message(&body["chat_id"], &body["text"]);
                    (StatusCode::OK, Json(json!({"ok": true, "result": message})))
                }
            }
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"ok": false, "error_code": 404, "description": "Not Found"})),
        ),
    }
}

async fn serve(stub: Stub) -> TelegramClient {
    let app = Router::new()
        .route(&format!("/bot{TOKEN}/{{method}}"), post(bot_api))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    let config = TelegramConfig {
        api_base: format!("http://{addr}"),
        poll_timeout_secs: 1,
    };
    TelegramClient::new(&config, TOKEN).expect("client")
}

struct CapturingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.records
            .lock()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

fn logger() -> &'static CapturingLogger {
    static LOGGER: OnceLock<&'static CapturingLogger> = OnceLock::new();
    LOGGER.get_or_init(|| {
        let logger: &'static CapturingLogger = Box::leak(Box::new(CapturingLogger {
            records: Mutex::new(Vec::new()),
        }));
        if log::set_logger(logger).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
        logger
    })
}

#[tokio::test]
async fn unchanged_edit_reports_not_modified() {
    let stub = Stub::default();
    stub.reject_edits(NOT_MODIFIED);
    let client = serve(stub.clone()).await;

    let handle = MessageHandle {
        chat_id: 5,
        message_id: 10,
    };
    let outcome = client.edit_text(handle, "same text").await;

    assert_eq!(outcome, EditOutcome::NotModified);
    let edits = stub.requests_for("editMessageText");
    assert_eq!(
        edits,
        vec![json!({"chat_id": 5, "message_id": 10, "text": "same text"})]
    );
}

#[tokio::test]
async fn other_rejected_edits_fail() {
    let stub = Stub::default();
    stub.reject_edits("Bad Request: message to edit not found");
    let client = serve(stub).await;

    let outcome = client
        .edit_text(
            MessageHandle {
                chat_id: 5,
                message_id: 99,
            },
            "hello",
        )
        .await;

    assert!(matches!(outcome, EditOutcome::Failed(reason) if reason.contains("message to edit not found")));
}

#[tokio::test]
async fn send_text_returns_sent_message_handle() {
    let stub = Stub::default();
    let client = serve(stub.clone()).await;

    let first = client.send_text(5, "...").await.expect("send");
    let second = client.send_text(5, "again").await.expect("send");

    assert_eq!(first.chat_id, 5);
    assert_eq!(second.message_id, first.message_id + 1);
    assert_eq!(stub.requests_for("sendMessage")[0]["text"], json!("..."));
}

#[tokio::test]
async fn get_me_reads_username() {
    let client = serve(Stub::default()).await;
    let me = client.get_me().await.expect("getMe");
    assert_eq!(me.username.as_deref(), Some("EmpathBot"));
}

#[tokio::test]
async fn streamed_render_over_http_never_warns_on_unchanged_edits() {
    let logger = logger();
    let stub = Stub::default();
    stub.reject_edits(NOT_MODIFIED);
    let client = serve(stub.clone()).await;
    let renderer = StreamRenderer::new(3, "...");
    let fragments: FragmentStream = Box::pin(stream::iter(vec![
        Ok::<_, CompletionError>("abc".to_string()),
        Ok("def".to_string()),
    ]));

    let outcome = renderer
        .render(&client, 31337, fragments)
        .await
        .expect("render");

    assert_eq!(outcome.text, "abcdef");
    assert_eq!(outcome.edits, 3);
    let problems: Vec<String> = logger
        .records
        .lock()
        .iter()
        .filter(|(level, message)| *level <= Level::Warn && message.contains("chat_id=31337"))
        .map(|(_, message)| message.clone())
        .collect();
    assert!(problems.is_empty(), "unexpected warnings: {problems:?}");
}

#[tokio::test]
async fn poller_dispatches_text_updates_and_drains_on_shutdown() {
    let stub = Stub::default();
    stub.update_batches.lock().push_back(json!([
        {
            "update_id": 40,
            "message": {"message_id": 1, "chat": {"id": 5}, "from": {"id": 9}, "photo": []}
        },
        {
            "update_id": 41,
            "message": {"message_id": 2, "chat": {"id": 5}, "from": {"id": 9}, "text": "/start"}
        }
    ]));
    let client = Arc::new(serve(stub.clone()).await);
    let history = Arc::new(HistoryManager::load(
        Arc::new(MemoryStorage::new()),
        RetentionPolicy::unbounded(),
    ));
    let relay = Arc::new(Relay::new(
        Arc::clone(&history),
        Arc::new(LlmCompletionClient::new(Arc::new(StreamingLLM::new([
            "unused",
        ])))),
        StreamRenderer::new(10, "..."),
        RelayOptions::default(),
    ));

    let watcher = stub.clone();
    let shutdown = async move {
        loop {
            let sent = !watcher.requests_for("sendMessage").is_empty();
            let acknowledged = watcher
                .requests_for("getUpdates")
                .iter()
                .any(|body| body["offset"] == json!(42));
            if sent && acknowledged {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(
        Duration::from_secs(10),
        Poller::new(client, relay).run(shutdown),
    )
    .await
    .expect("poller stopped")
    .expect("poll loop");

    let sends = stub.requests_for("sendMessage");
    assert_eq!(sends, vec![json!({"chat_id": 5, "text": WELCOME_MESSAGE})]);
    let polls = stub.requests_for("getUpdates");
    assert_eq!(polls[0]["offset"], Value::Null);
    assert_eq!(polls[0]["allowed_updates"], json!(["message"]));
    assert!(history.snapshot().contains("9"));
}
