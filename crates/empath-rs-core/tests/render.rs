//! Stream renderer behavior against a recording transport.

use empath_rs_core::prompts::STREAM_APOLOGY;
use empath_rs_core::{
    CompletionError, EditOutcome, FragmentStream, RenderState, StreamRenderer,
};
use empath_rs_test_utils::RecordingTransport;
use futures_util::stream;
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::OnceLock;

fn fragments(items: Vec<Result<&str, &str>>) -> FragmentStream {
    let items = items
        .into_iter()
        .map(|item| {
            item.map(str::to_string)
                .map_err(|reason| CompletionError::Interrupted(reason.to_string()))
        })
        .collect::<Vec<_>>();
    Box::pin(stream::iter(items))
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

/// Warn/error records mentioning the given chat.
fn problems_for_chat(chat_id: i64) -> Vec<String> {
    let needle = format!("chat_id={chat_id}");
    logger()
        .records
        .lock()
        .iter()
        .filter(|(level, message)| *level <= Level::Warn && message.contains(&needle))
        .map(|(_, message)| message.clone())
        .collect()
}

#[tokio::test]
async fn threshold_batches_fragments_into_one_edit_plus_final_flush() {
    let transport = RecordingTransport::new();
    let renderer = StreamRenderer::new(10, "...");
    let outcome = renderer
        .render(
            &transport,
            1,
            fragments(vec![Ok("Hel"), Ok("lo wo"), Ok("rld!")]),
        )
        .await
        .expect("render");

    assert_eq!(outcome.text, "Hello world!");
    assert_eq!(outcome.state, RenderState::Done);
    assert_eq!(outcome.edits, 2);
    let edits = transport.edits();
    assert_eq!(edits.len(), 2);
    assert_eq!(edits[0].text, "Hello world!");
    assert_eq!(edits[0].outcome, EditOutcome::Applied);
    assert_eq!(edits[1].outcome, EditOutcome::NotModified);
    assert_eq!(transport.sent_texts(), vec!["...".to_string()]);
    assert_eq!(
        transport.current_text(outcome.handle).as_deref(),
        Some("Hello world!")
    );
}

#[tokio::test]
async fn error_before_any_text_shows_apology() {
    let transport = RecordingTransport::new();
    let renderer = StreamRenderer::new(10, "...");
    let outcome = renderer
        .render(&transport, 2, fragments(vec![Err("connection reset")]))
        .await
        .expect("render");

    assert_eq!(outcome.text, STREAM_APOLOGY);
    assert_eq!(outcome.state, RenderState::Error);
    assert_eq!(
        transport.current_text(outcome.handle).as_deref(),
        Some(STREAM_APOLOGY)
    );
}

#[tokio::test]
async fn partial_text_survives_mid_stream_failure() {
    let transport = RecordingTransport::new();
    let renderer = StreamRenderer::new(10, "...");
    let outcome = renderer
        .render(
            &transport,
            3,
            fragments(vec![Ok("Hello there, "), Ok("fri"), Err("eof")]),
        )
        .await
        .expect("render");

    assert_eq!(outcome.text, "Hello there, fri");
    assert_eq!(outcome.state, RenderState::Done);
    let texts: Vec<String> = transport.edits().into_iter().map(|edit| edit.text).collect();
    assert_eq!(
        texts,
        vec!["Hello there, ".to_string(), "Hello there, fri".to_string()]
    );
}

#[tokio::test]
async fn failed_edits_do_not_abort_the_stream() {
    let transport = RecordingTransport::new();
    transport.script_edits([EditOutcome::Failed("Too Many Requests".to_string())]);
    let renderer = StreamRenderer::new(4, "...");
    let outcome = renderer
        .render(
            &transport,
            4,
            fragments(vec![Ok("abcd"), Ok("efgh"), Ok("ij")]),
        )
        .await
        .expect("render");

    assert_eq!(outcome.text, "abcdefghij");
    assert_eq!(outcome.edits, 3);
    assert_eq!(
        transport.current_text(outcome.handle).as_deref(),
        Some("abcdefghij")
    );
}

#[tokio::test]
async fn empty_stream_leaves_placeholder() {
    let transport = RecordingTransport::new();
    let renderer = StreamRenderer::new(10, "...");
    let outcome = renderer
        .render(&transport, 5, fragments(vec![Ok(""), Ok("")]))
        .await
        .expect("render");

    assert_eq!(outcome.text, "");
    assert_eq!(outcome.edits, 0);
    assert_eq!(outcome.state, RenderState::Done);
    assert_eq!(transport.current_text(outcome.handle).as_deref(), Some("..."));
}

#[tokio::test]
async fn threshold_counts_characters_not_bytes() {
    let transport = RecordingTransport::new();
    let renderer = StreamRenderer::new(10, "...");
    let outcome = renderer
        .render(&transport, 6, fragments(vec![Ok("éééééé"), Ok("abc")]))
        .await
        .expect("render");

    let texts: Vec<String> = transport.edits().into_iter().map(|edit| edit.text).collect();
    assert_eq!(texts, vec!["ééééééabc".to_string()]);
    assert_eq!(outcome.text, "ééééééabc");
}

#[tokio::test]
async fn placeholder_send_failure_is_returned() {
    let transport = RecordingTransport::failing_sends();
    let renderer = StreamRenderer::new(10, "...");
    let result = renderer
        .render(&transport, 7, fragments(vec![Ok("never shown")]))
        .await;
    assert!(result.is_err());
    assert!(transport.edits().is_empty());
}

#[tokio::test]
async fn not_modified_edits_are_not_logged_as_problems() {
    logger();
    let transport = RecordingTransport::new();
    transport.script_edits([EditOutcome::NotModified, EditOutcome::NotModified]);
    let renderer = StreamRenderer::new(5, "...");
    renderer
        .render(&transport, 777, fragments(vec![Ok("12345"), Ok("678")]))
        .await
        .expect("render");
    assert_eq!(transport.edits().len(), 2);
    assert!(problems_for_chat(777).is_empty());

    transport.script_edits([EditOutcome::Failed("Bad Request: chat not found".to_string())]);
    renderer
        .render(&transport, 778, fragments(vec![Ok("12345")]))
        .await
        .expect("render");
    assert_eq!(problems_for_chat(778).len(), 1);
}
