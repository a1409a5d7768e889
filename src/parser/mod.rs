//! The parser module is in charge of taking an ASA-style
//! configuration file and producing a Config from the
//! config submodule.
//!
//! It does this by implementing a streaming tokenizer with one
//! rune of look-ahead and an assembler that groups the token
//! stream into command blocks by indentation.

pub mod assembler;
pub mod config;
pub mod lexer;

use std::io::Read;

use self::assembler::{Assembler, Handlers};
use self::config::Config;
use self::lexer::Lexer;

/// Parses a configuration stream with the given handler registry.
pub fn parse<R: Read>(reader: R, handlers: Handlers) -> Result<Config, String> {
    Assembler::new(Lexer::open(reader), handlers).run()
}
