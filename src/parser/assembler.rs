//! The Assembler module takes the lexer's scan stream, groups atoms
//! into command blocks, and hands each completed block to the handler
//! registered for its leading keyword.
use std::collections::HashMap;

use super::config::Config;
use super::lexer::{Scan, Token};

/// A keyword handler. Receives every atom of one command block: the
/// keyword first, then the rest of its line and the atoms of all of its
/// continuation lines, flattened in original order.
pub type Handler = Box<dyn FnMut(&[Token], &mut Config) -> Result<(), String>>;

/// Registry mapping a command keyword to its handler. Built at startup
/// and passed in explicitly; keywords without an entry are skipped.
pub type Handlers = HashMap<String, Handler>;

pub struct Assembler<S> {
    scans: S,
    handlers: Handlers,
    config: Config,
    error_count: usize,
}

impl<S: Iterator<Item = Scan>> Assembler<S> {
    pub fn new(scans: S, handlers: Handlers) -> Self {
        Assembler {
            scans,
            handlers,
            config: Config::default(),
            error_count: 0,
        }
    }

    /// Run the assembler, consuming itself and returning the
    /// accumulated configuration. A lexer error token fails the whole
    /// parse; a handler error drops that block and processing moves on
    /// to the next one.
    pub fn run(mut self) -> Result<Config, String> {
        let mut command: Vec<Token> = Vec::new();

        while let Some(scan) = self.scans.next() {
            let token = match scan {
                // An indented line continues the open block.
                Scan::Continuation => continue,
                Scan::Token(token) => token,
            };

            match token {
                Token::Error(message) => return Err(message),
                Token::LineStart => self.dispatch(&mut command),
                Token::Atom(_) => command.push(token),
            }
        }

        // A file without a trailing newline still ends its last block.
        self.dispatch(&mut command);

        if self.error_count > 0 {
            error!("dropped {} malformed command block(s)", self.error_count);
        }

        Ok(self.config)
    }

    /// Hands a completed block to its keyword's handler, if one is
    /// registered. Empty blocks (the start of file, blank lines) are
    /// not commands.
    fn dispatch(&mut self, command: &mut Vec<Token>) {
        if command.is_empty() {
            return;
        }

        let keyword = command[0].text().to_owned();
        match self.handlers.get_mut(&keyword) {
            Some(handle) => {
                if let Err(message) = handle(command, &mut self.config) {
                    self.error_count += 1;
                    error!("error in `{}` block: {}", keyword, message);
                }
            }
            None => debug!("no handler for `{}`, skipping", keyword),
        }

        command.clear();
    }
}
