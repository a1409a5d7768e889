//! This lexer tokenizes ASA-style configuration text.
use std::io::{BufReader, Read};
use std::{io, str};

/// The unit produced by the lexer. An `Atom` is a maximal run of
/// alphanumeric or punctuation runes. `LineStart` marks the boundary
/// before a new top-level line. `Error` carries the diagnostic for a
/// failed read and is always the last token produced.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    Atom(String),
    LineStart,
    Error(String),
}

impl Token {
    /// The literal text of the token.
    pub fn text(&self) -> &str {
        match self {
            Token::Atom(value) => value,
            Token::LineStart => "LINE-START",
            Token::Error(message) => message,
        }
    }
}

/// The outcome of one lexer step. Crossing a line boundary into an
/// indented line produces no token at all - `Continuation` keeps that
/// case distinct from a real token, and the end of the stream is the
/// iterator running out.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Scan {
    Token(Token),
    Continuation,
}

/// Incremental UTF-8 decoder with a single rune of look-ahead.
struct RuneReader<R: Read> {
    inner: BufReader<R>,
    peeked: Option<char>,
}

impl<R: Read> RuneReader<R> {
    fn new(reader: R) -> Self {
        RuneReader {
            inner: BufReader::new(reader),
            peeked: None,
        }
    }

    /// Consumes and returns the next rune. `Ok(None)` is end of stream.
    fn read(&mut self) -> io::Result<Option<char>> {
        match self.peeked.take() {
            Some(c) => Ok(Some(c)),
            None => self.decode(),
        }
    }

    /// Returns the next rune without consuming it.
    fn peek(&mut self) -> io::Result<Option<char>> {
        if self.peeked.is_none() {
            self.peeked = self.decode()?;
        }
        Ok(self.peeked)
    }

    /// Discards the rune returned by the last `peek`.
    fn consume(&mut self) {
        self.peeked = None;
    }

    fn decode(&mut self) -> io::Result<Option<char>> {
        let first = match self.read_byte()? {
            Some(byte) => byte,
            None => return Ok(None),
        };

        // Sequence length from the leading byte. Continuation bytes and
        // out-of-range values are invalid in the leading position.
        let len = match first {
            0x00..=0x7F => return Ok(Some(first as char)),
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid utf-8 lead byte 0x{:02X}", first),
                ))
            }
        };

        let mut buf = [first, 0, 0, 0];
        self.inner.read_exact(&mut buf[1..len])?;
        match str::from_utf8(&buf[..len]) {
            Ok(s) => Ok(s.chars().next()),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid utf-8 sequence",
            )),
        }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Streams `Scan` outcomes over a reader. Single-pass: the stream ends
/// at end of input, after the first `Error` token, or at the first rune
/// that fits no token class. Restarting means opening a fresh lexer.
pub struct Lexer<R: Read> {
    runes: RuneReader<R>,
    started: bool,
    done: bool,
}

impl<R: Read> Lexer<R> {
    /// Wraps a reader. No input is consumed until iteration begins.
    pub fn open(reader: R) -> Self {
        Lexer {
            runes: RuneReader::new(reader),
            started: false,
            done: false,
        }
    }

    /// Emits the terminal error token for a failed read.
    fn fail(&mut self, err: io::Error) -> Option<Scan> {
        self.done = true;
        Some(Scan::Token(Token::Error(format!(
            "error while reading: {}",
            err
        ))))
    }

    /// Consumes non-newline whitespace, leaving the first rune that
    /// could begin a token unread.
    fn eat_whitespace(&mut self) -> io::Result<()> {
        while let Some(c) = self.runes.peek()? {
            if !c.is_whitespace() || c == '\n' {
                break;
            }
            self.runes.consume();
        }
        Ok(())
    }

    /// Consumes a comment through its terminating newline.
    fn eat_comment(&mut self) -> io::Result<()> {
        while let Some(c) = self.runes.read()? {
            if c == '\n' {
                break;
            }
        }
        Ok(())
    }

    /// Crosses a line boundary. An indented following line continues
    /// the open command block, so no token is produced for it.
    fn line_start(&mut self) -> Option<Scan> {
        match self.runes.read() {
            Ok(Some('\n')) => {}
            Ok(Some(c)) => {
                self.done = true;
                return Some(Scan::Token(Token::Error(format!(
                    "unexpected rune while scanning for newline: {}",
                    c
                ))));
            }
            Ok(None) => {
                self.done = true;
                return Some(Scan::Token(Token::Error(
                    "unexpected end of input while scanning for newline".to_owned(),
                )));
            }
            Err(e) => return self.fail(e),
        }

        match self.runes.peek() {
            Ok(Some(c)) if c.is_whitespace() => Some(Scan::Continuation),
            Ok(_) => Some(Scan::Token(Token::LineStart)),
            Err(e) => self.fail(e),
        }
    }

    /// Accumulates a maximal run of atom runes. Whitespace, end of
    /// input, or an unclassifiable rune ends the atom and stays unread.
    fn read_atom(&mut self) -> Option<Scan> {
        let mut atom = String::new();
        loop {
            match self.runes.peek() {
                Ok(Some(c)) if is_atom_rune(c) => {
                    atom.push(c);
                    self.runes.consume();
                }
                Ok(_) => break,
                Err(e) => return self.fail(e),
            }
        }
        Some(Scan::Token(Token::Atom(atom)))
    }
}

/// Atom runes are Unicode alphanumerics and ASCII punctuation, which
/// covers names like `GigabitEthernet0/0` and dotted-quad addresses.
fn is_atom_rune(c: char) -> bool {
    c.is_alphanumeric() || c.is_ascii_punctuation()
}

impl<R: Read> Iterator for Lexer<R> {
    type Item = Scan;

    fn next(&mut self) -> Option<Scan> {
        if self.done {
            return None;
        }

        // The first line of the file has no preceding newline; the
        // consumer still needs a well-defined starting boundary.
        if !self.started {
            self.started = true;
            return Some(Scan::Token(Token::LineStart));
        }

        loop {
            if let Err(e) = self.eat_whitespace() {
                return self.fail(e);
            }

            let c = match self.runes.peek() {
                Ok(Some(c)) => c,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => return self.fail(e),
            };

            match c {
                '!' => {
                    if let Err(e) = self.eat_comment() {
                        return self.fail(e);
                    }
                }
                '\n' => return self.line_start(),
                c if is_atom_rune(c) => return self.read_atom(),
                _ => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}
