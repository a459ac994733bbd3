//! Text form of cool programs.
//!
//! ```text
//! # comment
//! start:  pushc 5      # one instruction per line
//!         call  square # operands are integers or labels
//!         halt
//! data:   .word 7      # raw word
//! ```

use std::collections::HashMap;

use thiserror::Error;

use crate::instructions::{Opcode, Operand};

const COMMENT_CHAR: char = '#';
const LABEL_SUFFIX: char = ':';
const WORD_DIRECTIVE: &str = ".word";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct AssembleError {
    pub line: usize,
    pub message: String,
}

enum Item<'a> {
    Instruction(Opcode, Option<&'a str>),
    Word(&'a str),
}

struct Line<'a> {
    number: usize,
    item: Item<'a>,
}

fn error(line: usize, message: impl Into<String>) -> AssembleError {
    AssembleError {
        line,
        message: message.into(),
    }
}

/// Assembles `source` into a program image loaded at address 0.
pub fn assemble(source: &str) -> Result<Vec<u16>, AssembleError> {
    let mut labels = HashMap::new();
    let mut lines = Vec::new();
    let mut address: usize = 0;

    // First pass: addresses of every label
    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;
        let mut text = raw.split(COMMENT_CHAR).next().unwrap_or("").trim();

        if let Some((label, rest)) = text.split_once(LABEL_SUFFIX) {
            let label = label.trim();
            if label.is_empty() || label.contains(char::is_whitespace) {
                return Err(error(number, format!("invalid label '{}'", label)));
            }
            if labels.insert(label, address).is_some() {
                return Err(error(number, format!("label '{}' defined twice", label)));
            }
            text = rest.trim();
        }

        let mut tokens = text.split_whitespace();
        let Some(head) = tokens.next() else {
            continue;
        };
        let arg = tokens.next();
        if tokens.next().is_some() {
            return Err(error(number, "too many operands"));
        }

        let item = if head == WORD_DIRECTIVE {
            Item::Word(arg.ok_or_else(|| error(number, ".word needs a value"))?)
        } else {
            let opcode: Opcode = head.parse().map_err(|e| error(number, format!("{}", e)))?;
            match (opcode.operand(), arg) {
                (Operand::None, Some(_)) => {
                    return Err(error(number, format!("{} takes no operand", opcode.name())));
                }
                (Operand::None, None) => {}
                (_, None) => {
                    return Err(error(number, format!("{} needs an operand", opcode.name())));
                }
                (_, Some(_)) => {}
            }
            Item::Instruction(opcode, arg)
        };

        address += match item {
            Item::Instruction(opcode, _) => opcode.size() as usize,
            Item::Word(_) => 1,
        };
        lines.push(Line { number, item });
    }

    // Second pass: emit words
    let mut image = Vec::with_capacity(address);
    for line in lines {
        match line.item {
            Item::Instruction(opcode, arg) => {
                image.push(opcode as u16);
                if let Some(arg) = arg {
                    image.push(value(line.number, arg, &labels)?);
                }
            }
            Item::Word(arg) => image.push(value(line.number, arg, &labels)?),
        }
    }

    Ok(image)
}

fn value(line: usize, token: &str, labels: &HashMap<&str, usize>) -> Result<u16, AssembleError> {
    if let Some(&address) = labels.get(token) {
        return u16::try_from(address)
            .map_err(|_| error(line, format!("label '{}' is past the end of memory", token)));
    }
    let value: i32 = token
        .parse()
        .map_err(|_| error(line, format!("unknown label or bad number '{}'", token)))?;
    if !(i16::MIN as i32..=u16::MAX as i32).contains(&value) {
        return Err(error(line, format!("{} does not fit in a word", value)));
    }
    Ok(value as u16)
}
