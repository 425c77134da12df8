//! Character source for the lexer
//!
//! A [`Page`] retains the raw bytes of a document and decodes them lazily into characters with
//! the active charset. Offsets handed out by the page always refer to the decoded buffer, so a
//! charset change invalidates every offset produced before it.

use crate::types::{Error, Result};
use encoding_rs::{CoderResult, Decoder, Encoding};
use log::{debug, warn};
use std::fmt::{self, Debug, Formatter};
use std::io::Read;
use std::path::Path;

pub const CHAR_LF: char = '\u{000A}';
pub const CHAR_CR: char = '\u{000D}';

/// Identifier used for pages that are not read from a URL or a file
pub const STRING_SOURCE: &str = "string";

/// Maximum number of bytes inspected when guessing the charset of a byte source
const MAX_SNIFF_SIZE: usize = 64 * 1024;

/// Defines a single character in the page. The end of the page is denoted as a separate element
/// so it never has to be treated as an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Character {
    /// Standard UTF character
    Ch(char),
    /// No more characters in the page
    StreamEnd,
}

use Character::*;

impl From<Character> for char {
    fn from(c: Character) -> Self {
        match c {
            Ch(c) => c,
            StreamEnd => 0x0000 as char,
        }
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Ch(ch) => write!(f, "{ch}"),
            StreamEnd => write!(f, "StreamEnd"),
        }
    }
}

impl Character {
    /// Returns true when the character is a whitespace
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Ch(c) if c.is_whitespace())
    }

    /// Returns true when the character is a letter
    pub fn is_alphabetic(&self) -> bool {
        matches!(self, Ch(c) if c.is_alphabetic())
    }
}

/// How sure we are that the page is decoded with the right charset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confidence {
    /// Guessed or defaulted; a document may still announce another charset
    Tentative,
    /// Given by the caller or a byte order mark
    Certain,
}

/// Configuration structure for a page.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Charset used when a byte source does not announce one
    pub default_charset: &'static Encoding,
    /// Guess the charset of byte sources without a byte order mark
    pub detect_charset: bool,
    /// Number of raw bytes that are decoded in one go
    pub decode_chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // ISO-8859-1 is decoded as windows-1252
            default_charset: encoding_rs::WINDOWS_1252,
            detect_charset: true,
            decode_chunk_size: 8 * 1024,
        }
    }
}

/// Location holds the position of an offset in the page
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Line number, starting with 1
    pub line: usize,
    /// Column number, starting with 1
    pub column: usize,
    /// Character offset, starting with 0
    pub offset: usize,
}

impl Default for Location {
    /// Default to line 1, column 1
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl Location {
    /// Create a new Location
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl Debug for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.line, self.column)
    }
}

/// A position in a page. Cursors are plain values; the page is always passed next to them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    position: usize,
}

impl Cursor {
    pub fn new(position: usize) -> Self {
        Self { position }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    pub fn advance(&mut self) {
        self.position += 1;
    }

    /// Steps back one character. Retreating at the start of the page is a no-op.
    pub fn retreat(&mut self) {
        self.position = self.position.saturating_sub(1);
    }
}

#[derive(Debug)]
pub struct Page {
    /// URL, file URL or other identifier of the source
    source: String,
    /// Undecoded bytes, kept so the page can be decoded again with another charset
    raw: Vec<u8>,
    /// Current charset
    encoding: &'static Encoding,
    confidence: Confidence,
    config: Config,
    decoder: Decoder,
    /// Number of raw bytes fed to the decoder
    fed: usize,
    /// True when all raw bytes have been decoded and the decoder is flushed
    finished: bool,
    /// Decoded characters
    chars: Vec<char>,
    /// Offsets at which each line starts, always starting with 0
    line_starts: Vec<usize>,
}

impl Page {
    fn new(
        source: String,
        raw: Vec<u8>,
        encoding: &'static Encoding,
        confidence: Confidence,
        config: Config,
    ) -> Self {
        Self {
            source,
            raw,
            encoding,
            confidence,
            config,
            decoder: encoding.new_decoder_without_bom_handling(),
            fed: 0,
            finished: false,
            chars: Vec::new(),
            line_starts: vec![0],
        }
    }

    /// Creates a page from text that is already decoded. The charset of such a page is certain
    /// and will not be changed by the document.
    pub fn from_str(html: &str, source: Option<&str>) -> Self {
        Self::new(
            source.unwrap_or(STRING_SOURCE).to_string(),
            html.as_bytes().to_vec(),
            encoding_rs::UTF_8,
            Confidence::Certain,
            Config::default(),
        )
    }

    /// Creates a page from raw bytes. The charset comes from a byte order mark when present,
    /// and is guessed or defaulted otherwise.
    pub fn from_bytes(mut bytes: Vec<u8>, source: Option<&str>, config: Config) -> Self {
        let (encoding, confidence) = sniff_encoding(&bytes, &config);
        debug!("page charset {} ({:?})", encoding.name(), confidence);

        if let Some((_, bom_length)) = Encoding::for_bom(&bytes) {
            bytes.drain(..bom_length);
        }

        Self::new(
            source.unwrap_or(STRING_SOURCE).to_string(),
            bytes,
            encoding,
            confidence,
            config,
        )
    }

    /// Reads all bytes from the given reader into a new page
    pub fn from_reader<R: Read>(mut reader: R, source: Option<&str>, config: Config) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        Ok(Self::from_bytes(bytes, source, config))
    }

    /// Reads a file into a new page. The source identifier of the page is the file URL.
    pub fn from_file<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;

        let absolute = std::path::absolute(path)?;
        let source = url::Url::from_file_path(&absolute)
            .map(|url| url.to_string())
            .unwrap_or_else(|()| absolute.display().to_string());

        Ok(Self::from_bytes(bytes, Some(&source), config))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Name of the current charset
    pub fn charset(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn default_encoding(&self) -> &'static Encoding {
        self.config.default_charset
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn set_confidence(&mut self, confidence: Confidence) {
        self.confidence = confidence;
    }

    /// Reads the character at the cursor and moves the cursor past it. The cursor does not
    /// move at the end of the page.
    pub fn character(&mut self, cursor: &mut Cursor) -> Character {
        let ch = self.character_at(cursor.position());
        if ch != StreamEnd {
            cursor.advance();
        }

        ch
    }

    /// Returns the character at the given offset without moving anything
    pub fn character_at(&mut self, offset: usize) -> Character {
        while self.chars.len() <= offset && self.decode_next_chunk() {}

        self.chars.get(offset).map_or(StreamEnd, |c| Ch(*c))
    }

    /// Moves the cursor back one character
    pub fn unget(&self, cursor: &mut Cursor) {
        cursor.retreat();
    }

    /// Returns true when there are no characters at or after the offset
    pub fn at_end(&mut self, offset: usize) -> bool {
        self.character_at(offset) == StreamEnd
    }

    /// Returns the decoded text between start (inclusive) and end (exclusive)
    pub fn text(&mut self, start: usize, end: usize) -> String {
        if end > 0 {
            self.character_at(end - 1);
        }

        let end = end.min(self.chars.len());
        let start = start.min(end);
        self.chars[start..end].iter().collect()
    }

    /// Switches to the charset with the given label and decodes the page again from the start
    pub fn set_encoding(&mut self, label: &str) -> Result<()> {
        let encoding = lookup_charset(label)?;
        self.set_encoding_to(encoding);

        Ok(())
    }

    /// Switches to the given charset and decodes the page again from the start. Switching to
    /// the current charset keeps the decoded characters.
    pub fn set_encoding_to(&mut self, encoding: &'static Encoding) {
        if self.encoding == encoding {
            return;
        }

        warn!(
            "switching charset of {} from {} to {}",
            self.source,
            self.encoding.name(),
            encoding.name()
        );

        self.encoding = encoding;
        self.decoder = encoding.new_decoder_without_bom_handling();
        self.fed = 0;
        self.finished = false;
        self.chars.clear();
        self.line_starts = vec![0];
    }

    /// Returns the charset announced by a `type/subtype; charset=name` content value, or the
    /// default charset of the page when there is none or it is not supported.
    pub fn charset_from(&self, content: &str) -> &'static Encoding {
        charset_from_content(content).unwrap_or(self.config.default_charset)
    }

    /// Line number of the offset, starting with 1
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// Column of the offset, starting with 1
    pub fn column_of(&self, offset: usize) -> usize {
        let line = self.line_of(offset);
        offset - self.line_starts[line - 1] + 1
    }

    pub fn location(&self, offset: usize) -> Location {
        Location::new(self.line_of(offset), self.column_of(offset), offset)
    }

    /// Text of the line the offset is on, without its line ending
    pub fn line_text(&mut self, offset: usize) -> String {
        let start = self.line_starts[self.line_of(offset) - 1];

        let mut end = start;
        while let Ch(c) = self.character_at(end) {
            if c == CHAR_LF || c == CHAR_CR {
                break;
            }
            end += 1;
        }

        self.chars[start..end].iter().collect()
    }

    /// Number of characters decoded so far
    pub fn decoded_len(&self) -> usize {
        self.chars.len()
    }

    /// Feeds the next chunk of raw bytes to the decoder. Returns false when everything has been
    /// decoded already.
    fn decode_next_chunk(&mut self) -> bool {
        if self.finished {
            return false;
        }

        let end = (self.fed + self.config.decode_chunk_size.max(1)).min(self.raw.len());
        let last = end == self.raw.len();

        let mut src = &self.raw[self.fed..end];
        let mut decoded = String::with_capacity(decode_capacity(&self.decoder, src.len()));
        loop {
            let (result, read, _) = self.decoder.decode_to_string(src, &mut decoded, last);
            src = &src[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => {
                    decoded.reserve(decode_capacity(&self.decoder, src.len()));
                }
            }
        }

        self.fed = end;
        self.finished = last;

        for c in decoded.chars() {
            self.chars.push(c);
            if c == CHAR_LF {
                self.line_starts.push(self.chars.len());
            }
        }

        true
    }
}

fn decode_capacity(decoder: &Decoder, len: usize) -> usize {
    decoder
        .max_utf8_buffer_length(len)
        .unwrap_or(len * 3)
        .max(4)
}

/// Picks the initial charset of a byte source
fn sniff_encoding(bytes: &[u8], config: &Config) -> (&'static Encoding, Confidence) {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return (encoding, Confidence::Certain);
    }

    if config.detect_charset {
        let (buf, complete) = if bytes.len() > MAX_SNIFF_SIZE {
            (&bytes[..MAX_SNIFF_SIZE], false)
        } else {
            (bytes, true)
        };

        let mut encoding_detector = chardetng::EncodingDetector::new();
        encoding_detector.feed(buf, complete);

        return (encoding_detector.guess(None, true), Confidence::Tentative);
    }

    (config.default_charset, Confidence::Tentative)
}

/// Looks up a charset by one of its labels
pub fn lookup_charset(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| Error::Charset(label.to_string()))
}

/// Extracts the charset from a `type/subtype; charset=name` content value. Returns None when
/// the value has no charset or names an unsupported one.
pub fn charset_from_content(content: &str) -> Option<&'static Encoding> {
    let lower = content.to_ascii_lowercase();
    let idx = lower.find("charset")?;

    let rest = content[idx + "charset".len()..].trim_start();
    let value = rest.strip_prefix('=')?.trim_start();
    let value = value.trim_start_matches(['"', '\'']);
    let end = value
        .find(|c: char| c == ';' || c == '"' || c == '\'' || c.is_whitespace())
        .unwrap_or(value.len());
    let label = &value[..end];
    if label.is_empty() {
        return None;
    }

    match lookup_charset(label) {
        Ok(encoding) => Some(encoding),
        Err(_) => {
            warn!("unsupported charset {label:?} in {content:?}, using the default");
            None
        }
    }
}
