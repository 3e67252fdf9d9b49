use bytes::Bytes;

pub const DONE_MARKER: &str = "[DONE]";
pub const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

/// A complete record recovered from an SSE byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseRecord {
    Data(String),
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseState {
    /// Between records. Blank and non-data lines are skipped.
    AwaitingRecord,
    /// At least one `data:` line of the current record has been seen.
    InData,
    /// `[DONE]` has been seen; everything after it is ignored.
    Terminal,
}

enum Line<'a> {
    Blank,
    Data(&'a str),
    Other,
}

fn classify(line: &str) -> Line<'_> {
    if line.is_empty() {
        return Line::Blank;
    }
    if let Some(value) = line.strip_prefix("data:") {
        return Line::Data(value.strip_prefix(' ').unwrap_or(value));
    }
    if line == "data" {
        return Line::Data("");
    }
    Line::Other
}

/// Line-oriented SSE decoder.
///
/// Input is buffered as raw bytes and only decoded once a full line is
/// available, so a multi-byte character or a line split across chunks is
/// reassembled before it is interpreted.
///
/// | state          | blank line                      | `data:` line        | other line     |
/// |----------------|---------------------------------|---------------------|----------------|
/// | AwaitingRecord | AwaitingRecord                  | InData (start)      | AwaitingRecord |
/// | InData         | emit; AwaitingRecord / Terminal | InData (append `\n`) | InData         |
/// | Terminal       | Terminal                        | Terminal            | Terminal       |
#[derive(Debug)]
pub struct SseStateMachine {
    state: SseState,
    buffer: Vec<u8>,
    data: String,
}

impl Default for SseStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SseStateMachine {
    pub fn new() -> Self {
        Self {
            state: SseState::AwaitingRecord,
            buffer: Vec::new(),
            data: String::new(),
        }
    }

    pub fn state(&self) -> SseState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state == SseState::Terminal
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseRecord> {
        let mut records = Vec::new();
        if self.is_terminal() {
            return records;
        }
        self.buffer.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let mut line_end = end;
            if line_end > start && self.buffer[line_end - 1] == b'\r' {
                line_end -= 1;
            }
            let line = String::from_utf8_lossy(&self.buffer[start..line_end]).into_owned();
            start = end + 1;
            self.step(&line, &mut records);
            if self.is_terminal() {
                self.buffer.clear();
                return records;
            }
        }
        self.buffer.drain(..start);
        records
    }

    /// Flushes a trailing line without newline and any record still open.
    pub fn finish(&mut self) -> Vec<SseRecord> {
        let mut records = Vec::new();
        if self.is_terminal() {
            return records;
        }
        if !self.buffer.is_empty() {
            let mut tail = std::mem::take(&mut self.buffer);
            if tail.last() == Some(&b'\r') {
                tail.pop();
            }
            let line = String::from_utf8_lossy(&tail).into_owned();
            self.step(&line, &mut records);
        }
        if self.state == SseState::InData {
            self.step("", &mut records);
        }
        records
    }

    fn step(&mut self, line: &str, records: &mut Vec<SseRecord>) {
        self.state = match (self.state, classify(line)) {
            (SseState::Terminal, _) => SseState::Terminal,
            (SseState::AwaitingRecord, Line::Data(value)) => {
                self.data.clear();
                self.data.push_str(value);
                SseState::InData
            }
            (SseState::AwaitingRecord, Line::Blank | Line::Other) => SseState::AwaitingRecord,
            (SseState::InData, Line::Data(value)) => {
                self.data.push('\n');
                self.data.push_str(value);
                SseState::InData
            }
            (SseState::InData, Line::Other) => SseState::InData,
            (SseState::InData, Line::Blank) => {
                let data = std::mem::take(&mut self.data);
                if data.trim() == DONE_MARKER {
                    records.push(SseRecord::Done);
                    SseState::Terminal
                } else {
                    records.push(SseRecord::Data(data));
                    SseState::AwaitingRecord
                }
            }
        };
    }
}

/// Renders one `data:` frame.
pub fn data_frame(payload: &str) -> Bytes {
    let mut out = String::with_capacity(payload.len() + 8);
    out.push_str("data: ");
    out.push_str(payload);
    out.push_str("\n\n");
    Bytes::from(out)
}
