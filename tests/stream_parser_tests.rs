use botpane::api::stream::{into_events, StreamParser};
use botpane::api::ClientError;
use botpane::types::StreamEvent;
use bytes::Bytes;
use futures::{stream, StreamExt};

const HELLO_STREAM: &str = "event:start\n\ndata: Hello\n\ndata:  World\n\nevent:end\n\n";

fn data(text: &str) -> StreamEvent {
    StreamEvent::Data(text.to_string())
}

#[test]
fn test_whole_stream_in_one_chunk() {
    let mut parser = StreamParser::new();
    let events = parser.process(HELLO_STREAM.as_bytes());

    assert_eq!(
        events,
        vec![StreamEvent::Start, data("Hello"), data(" World"), StreamEvent::End]
    );
    assert!(parser.finish().is_empty());
}

#[test]
fn test_delimiter_split_across_chunks() {
    let mut parser = StreamParser::new();

    assert!(parser.process(b"data: Hel").is_empty());
    assert!(parser.process(b"lo\n").is_empty());
    let events = parser.process(b"\ndata: next\n\n");

    assert_eq!(events, vec![data("Hello"), data("next")]);
}

#[test]
fn test_byte_at_a_time_matches_single_chunk() {
    let mut whole = StreamParser::new();
    let expected = whole.process(HELLO_STREAM.as_bytes());

    let mut parser = StreamParser::new();
    let mut events = Vec::new();
    for byte in HELLO_STREAM.as_bytes() {
        events.extend(parser.process(std::slice::from_ref(byte)));
    }
    events.extend(parser.finish());

    assert_eq!(events, expected);
}

#[test]
fn test_multibyte_char_split_across_chunks() {
    let payload = "data: héllo ☃\n\n".as_bytes();
    let split = payload
        .iter()
        .position(|b| *b == 0xE2)
        .expect("snowman lead byte");

    let mut parser = StreamParser::new();
    assert!(parser.process(&payload[..split + 1]).is_empty());
    let events = parser.process(&payload[split + 1..]);

    assert_eq!(events, vec![data("héllo ☃")]);
}

#[test]
fn test_escaped_newlines_are_unescaped() {
    let mut parser = StreamParser::new();
    let events = parser.process(b"data: line one\\nline two\\n\\n\n\n");
    assert_eq!(events, vec![data("line one\nline two\n\n")]);
}

#[test]
fn test_unrecognized_records_are_dropped() {
    let mut parser = StreamParser::new();
    let events = parser.process(b"id: 7\n\n: comment\n\ndata: kept\n\nevent:ping\n\n");
    assert_eq!(events, vec![data("kept")]);
}

#[tokio::test]
async fn test_event_stream_over_synthetic_chunks() {
    let chunks: Vec<Result<Bytes, ClientError>> = HELLO_STREAM
        .as_bytes()
        .chunks(5)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();

    let events: Vec<StreamEvent> = into_events(Box::pin(stream::iter(chunks)))
        .map(|item| item.expect("no transport error"))
        .collect()
        .await;

    assert_eq!(
        events,
        vec![StreamEvent::Start, data("Hello"), data(" World"), StreamEvent::End]
    );
}

#[tokio::test]
async fn test_event_stream_flushes_tail_without_delimiter() {
    let chunks: Vec<Result<Bytes, ClientError>> = vec![
        Ok(Bytes::from_static(b"data: first\n\n")),
        Ok(Bytes::from_static(b"data: last")),
    ];

    let events: Vec<StreamEvent> = into_events(Box::pin(stream::iter(chunks)))
        .filter_map(|item| async move { item.ok() })
        .collect()
        .await;

    assert_eq!(events, vec![data("first"), data("last")]);
}
