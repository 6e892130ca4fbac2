//! Incremental server-sent-event frame parsing
//!
//! The provider streams completions as SSE blocks over a chunked response
//! body. Network reads split that text at arbitrary byte boundaries, so the
//! parser is written as a pure function over "everything buffered so far":
//! it emits every complete frame and hands back the unterminated tail to be
//! re-fed with the next read. No I/O happens here.

/// One decoded SSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Value of the `event:` field, if the block carried one
    pub event: Option<String>,
    /// Concatenated `data:` payloads, joined with `\n`
    pub data: String,
}

/// Parse every complete frame out of `buffer`
///
/// A frame is a block of lines terminated by a blank line (`\n\n` or
/// `\r\n\r\n`). Within a block, `data:` lines accumulate and `event:` sets
/// the event name; comments (lines starting `:`) and unrecognized fields are
/// dropped. Blocks containing no `data:` line produce no frame.
///
/// Returns the frames in order plus the trailing text that has not yet seen
/// a terminator. Feeding the same text in any number of pieces through the
/// remainder yields the same frames as feeding it all at once.
#[must_use]
pub fn parse(buffer: &str) -> (Vec<Frame>, String) {
    let mut frames = Vec::new();
    let mut rest = buffer;

    while let Some((block, tail)) = split_block(rest) {
        rest = tail;
        if let Some(frame) = parse_block(block) {
            frames.push(frame);
        }
    }

    (frames, rest.to_owned())
}

/// Split off the first terminator-delimited block, if any
fn split_block(text: &str) -> Option<(&str, &str)> {
    let lf = text.find("\n\n").map(|pos| (pos, 2));
    let crlf = text.find("\r\n\r\n").map(|pos| (pos, 4));

    let (pos, len) = match (lf, crlf) {
        (Some(a), Some(b)) => std::cmp::min(a, b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };

    Some((&text[..pos], &text[pos + len..]))
}

/// Parse the lines of one block into a frame
fn parse_block(block: &str) -> Option<Frame> {
    let mut event = None;
    let mut data: Option<String> = None;

    for line in block.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with(':') {
            continue;
        }

        if let Some(payload) = field_value(line, "data") {
            match data.as_mut() {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(payload);
                }
                None => data = Some(payload.to_owned()),
            }
        } else if let Some(name) = field_value(line, "event") {
            event = Some(name.to_owned());
        }
        // id:, retry:, and unknown fields are ignored
    }

    data.map(|data| Frame { event, data })
}

/// Extract the value of `field: value`, stripping the optional leading space
fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let value = line.strip_prefix(field)?.strip_prefix(':')?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

/// Stateful wrapper carrying the remainder between reads
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
}

impl FrameDecoder {
    /// Create an empty decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed newly received bytes, returning every frame they complete
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let (frames, remainder) = parse(&self.buffer);
        self.buffer = remainder;
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_frames(frames: &[Frame]) -> Vec<&str> {
        frames.iter().map(|f| f.data.as_str()).collect()
    }

    #[test]
    fn single_frame() {
        let (frames, rest) = parse("data: hello\n\n");
        assert_eq!(data_frames(&frames), ["hello"]);
        assert!(rest.is_empty());
    }

    #[test]
    fn crlf_terminators() {
        let (frames, rest) = parse("data: a\r\n\r\ndata: b\r\n\r\n");
        assert_eq!(data_frames(&frames), ["a", "b"]);
        assert!(rest.is_empty());
    }

    #[test]
    fn multiple_data_lines_join_with_newline() {
        let (frames, _) = parse("data: line1\ndata: line2\n\n");
        assert_eq!(frames[0].data, "line1\nline2");
    }

    #[test]
    fn event_field_is_captured() {
        let (frames, _) = parse("event: message\ndata: x\n\n");
        assert_eq!(frames[0].event.as_deref(), Some("message"));
    }

    #[test]
    fn comments_and_unknown_fields_are_dropped() {
        let (frames, _) = parse(": keep-alive\nid: 7\nretry: 100\nbogus line\ndata: x\n\n");
        assert_eq!(data_frames(&frames), ["x"]);
    }

    #[test]
    fn block_without_data_yields_no_frame() {
        let (frames, rest) = parse(": ping\n\ndata: real\n\n");
        assert_eq!(data_frames(&frames), ["real"]);
        assert!(rest.is_empty());
    }

    #[test]
    fn incomplete_frame_comes_back_as_remainder() {
        let (frames, rest) = parse("data: partial");
        assert!(frames.is_empty());
        assert_eq!(rest, "data: partial");
    }

    #[test]
    fn value_without_leading_space_is_accepted() {
        let (frames, _) = parse("data:tight\n\n");
        assert_eq!(frames[0].data, "tight");
    }

    // Decoding a stream split at every possible byte boundary must produce
    // the same frames as decoding it whole.
    #[test]
    fn split_points_never_change_the_result() {
        let input = "event: delta\ndata: {\"a\":1}\n\ndata: two\ndata: lines\n\r\n\r\ndata: last\n\n";
        let (whole, rest) = parse(input);
        assert!(rest.is_empty());

        for split in 0..=input.len() {
            if !input.is_char_boundary(split) {
                continue;
            }
            let mut decoder = FrameDecoder::new();
            let mut collected = decoder.feed(input[..split].as_bytes());
            collected.extend(decoder.feed(input[split..].as_bytes()));
            assert_eq!(collected, whole, "split at byte {split}");
        }
    }

    #[test]
    fn no_frame_is_emitted_twice_across_feeds() {
        let mut decoder = FrameDecoder::new();
        let first = decoder.feed(b"data: one\n\ndata: tw");
        assert_eq!(data_frames(&first), ["one"]);
        let second = decoder.feed(b"o\n\n");
        assert_eq!(data_frames(&second), ["two"]);
        let third = decoder.feed(b"");
        assert!(third.is_empty());
    }
}
