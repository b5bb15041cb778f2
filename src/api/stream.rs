use super::client::ByteStream;
use super::error::ClientError;
use crate::types::StreamEvent;
use futures::{stream, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

pub const RECORD_DELIMITER: &str = "\n\n";
const START_MARKER: &str = "event:start";
const END_MARKER: &str = "event:end";
const DATA_MARKER: &str = "data: ";

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ClientError>> + Send>>;

/// Incremental UTF-8 decoder. A multi-byte sequence cut by a chunk boundary is
/// held back until the rest of it arrives.
#[derive(Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();
        let mut consumed = 0;

        loop {
            match std::str::from_utf8(&self.pending[consumed..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    consumed = self.pending.len();
                    break;
                }
                Err(error) => {
                    let valid_end = consumed + error.valid_up_to();
                    // valid_up_to() guarantees this range is well-formed
                    out.push_str(&String::from_utf8_lossy(&self.pending[consumed..valid_end]));
                    match error.error_len() {
                        Some(invalid_len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            consumed = valid_end + invalid_len;
                        }
                        None => {
                            consumed = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
        out
    }

    /// End of input: a dangling partial sequence becomes a replacement character.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}

/// Splits the reply stream into records and classifies them.
///
/// Text after the last delimiter stays buffered until the next chunk, so a
/// delimiter split across two chunks is still recognised.
#[derive(Default)]
pub struct StreamParser {
    decoder: Utf8StreamDecoder,
    buffer: String,
    /// Bytes of `buffer` already searched for a delimiter.
    scanned: usize,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let text = self.decoder.decode(chunk);
        self.buffer.push_str(&text);

        let mut events = Vec::new();
        let mut start = 0;
        let mut from = self.resume_offset();
        while let Some(end) = self.buffer[from..].find(RECORD_DELIMITER) {
            let record_end = from + end;
            if let Some(event) = parse_record(&self.buffer[start..record_end]) {
                events.push(event);
            }
            start = record_end + RECORD_DELIMITER.len();
            from = start;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
        self.scanned = self.buffer.len();
        events
    }

    /// Where the next delimiter search begins. Backs up far enough to catch a
    /// delimiter whose first half ended the previous chunk.
    fn resume_offset(&self) -> usize {
        let mut offset = self
            .scanned
            .saturating_sub(RECORD_DELIMITER.len() - 1)
            .min(self.buffer.len());
        while !self.buffer.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }

    /// Flush whatever is left once the transport reports completion.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let tail = self.decoder.finish();
        self.buffer.push_str(&tail);
        self.scanned = 0;
        let rest = std::mem::take(&mut self.buffer);
        rest.split(RECORD_DELIMITER).filter_map(parse_record).collect()
    }
}

/// Classify one delimiter-separated record. Unrecognised shapes yield `None`.
pub fn parse_record(record: &str) -> Option<StreamEvent> {
    if record.is_empty() {
        return None;
    }
    if record.starts_with(START_MARKER) {
        return Some(StreamEvent::Start);
    }
    if record.starts_with(END_MARKER) {
        return Some(StreamEvent::End);
    }
    if let Some(payload) = record.strip_prefix(DATA_MARKER) {
        return Some(StreamEvent::Data(payload.replace("\\n", "\n")));
    }

    tracing::debug!(record_len = record.len(), "dropping unrecognised stream record");
    None
}

struct EventState {
    bytes: Option<ByteStream>,
    parser: StreamParser,
    ready: VecDeque<StreamEvent>,
}

/// Turn a raw byte stream into an ordered stream of events. A transport error
/// is yielded once and ends the sequence.
pub fn into_events(bytes: ByteStream) -> EventStream {
    let state = EventState {
        bytes: Some(bytes),
        parser: StreamParser::new(),
        ready: VecDeque::new(),
    };

    let events = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.ready.pop_front() {
                return Some((Ok(event), state));
            }
            let bytes = state.bytes.as_mut()?;
            match bytes.next().await {
                Some(Ok(chunk)) => {
                    let parsed = state.parser.process(&chunk);
                    state.ready.extend(parsed);
                }
                Some(Err(error)) => {
                    state.bytes = None;
                    return Some((Err(error), state));
                }
                None => {
                    state.bytes = None;
                    let parsed = state.parser.finish();
                    state.ready.extend(parsed);
                }
            }
        }
    });
    Box::pin(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn decoder_holds_split_multibyte_sequence() {
        let mut decoder = Utf8StreamDecoder::new();
        let snowman = "☃".as_bytes();
        assert_eq!(decoder.decode(&snowman[..1]), "");
        assert_eq!(decoder.decode(&snowman[1..2]), "");
        assert_eq!(decoder.decode(&snowman[2..]), "☃");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn decoder_replaces_invalid_bytes_and_keeps_going() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"ok\xffok"), "ok\u{fffd}ok");
    }

    #[test]
    fn decoder_finish_replaces_dangling_sequence() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&"é".as_bytes()[..1]), "");
        assert_eq!(decoder.finish(), "\u{fffd}");
    }

    #[test]
    fn records_are_classified() {
        assert_eq!(parse_record("event:start\ndata: {}"), Some(StreamEvent::Start));
        assert_eq!(parse_record("event:end\ndata: {}"), Some(StreamEvent::End));
        assert_eq!(
            parse_record("data: one\\ntwo"),
            Some(StreamEvent::Data("one\ntwo".to_string()))
        );
        assert_eq!(parse_record("data:nospace"), None);
        assert_eq!(parse_record("retry: 100"), None);
        assert_eq!(parse_record(""), None);
    }

    #[test]
    fn finish_flushes_undelimited_tail() {
        let mut parser = StreamParser::new();
        assert!(parser.process(b"data: tail").is_empty());
        assert_eq!(parser.finish(), vec![StreamEvent::Data("tail".to_string())]);
        assert!(parser.finish().is_empty());
    }

    #[test]
    fn delimiter_after_multibyte_tail_is_found() {
        let mut parser = StreamParser::new();
        assert!(parser.process("data: café".as_bytes()).is_empty());
        assert!(parser.process(b"\n").is_empty());
        assert_eq!(
            parser.process(b"\ndata: ok\n\n"),
            vec![
                StreamEvent::Data("café".to_string()),
                StreamEvent::Data("ok".to_string())
            ]
        );
    }

    #[test]
    fn long_undelimited_record_is_not_rescanned() {
        let mut parser = StreamParser::new();
        assert!(parser.process(b"data: ").is_empty());
        let chunk = [b'x'; 1024];
        for _ in 0..4096 {
            assert!(parser.process(&chunk).is_empty());
        }
        assert_eq!(parser.scanned, parser.buffer.len());

        let events = parser.process(b"\n\n");
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], StreamEvent::Data(text) if text.len() == 4096 * 1024));
        assert_eq!(parser.scanned, 0);
    }

    #[tokio::test]
    async fn into_events_stops_after_transport_error() {
        let chunks: Vec<Result<Bytes, ClientError>> = vec![
            Ok(Bytes::from_static(b"data: partial\n\n")),
            Err(ClientError::Interrupted("reset".to_string())),
            Ok(Bytes::from_static(b"data: never\n\n")),
        ];
        let mut events = into_events(Box::pin(stream::iter(chunks)));

        assert!(matches!(
            events.next().await,
            Some(Ok(StreamEvent::Data(ref text))) if text == "partial"
        ));
        assert!(matches!(events.next().await, Some(Err(_))));
        assert!(events.next().await.is_none());
    }
}
