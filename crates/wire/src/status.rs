// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status vectors: the server's stacked failure reports.
//!
//! A vector is decoded into an ordered [`StatusChain`] of fragments and only
//! rendered to text at the boundary. Rendering emits every fragment followed
//! by a newline, in received order.

use std::fmt;

use crate::messages;
use crate::xdr::{XdrReader, XdrWriter};
use crate::ProtocolError;

mod arg_type {
    pub const END: i32 = 0;
    pub const GDS: i32 = 1;
    pub const STRING: i32 = 2;
    pub const CSTRING: i32 = 3;
    pub const NUMBER: i32 = 4;
    pub const INTERPRETED: i32 = 5;
    pub const WARNING: i32 = 18;
    pub const SQL_STATE: i32 = 19;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Number(i32),
    Text(String),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i32> for Arg {
    fn from(n: i32) -> Self {
        Self::Number(n)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A status code with its arguments, rendered through the template table
    Coded { code: u32, args: Vec<Arg> },
    /// Text the server already interpreted
    Text(String),
}

impl Message {
    pub fn coded(code: u32, args: impl IntoIterator<Item = Arg>) -> Self {
        Self::Coded { code, args: args.into_iter().collect() }
    }

    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Coded { code, .. } => Some(*code),
            Self::Text(_) => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Coded { code, args } => {
                let args: Vec<String> = args.iter().map(Arg::to_string).collect();
                match messages::template(*code) {
                    Some(t) => messages::substitute(t, &args),
                    None if args.is_empty() => format!("unknown server error {code}"),
                    None => format!("unknown server error {code} ({})", args.join(", ")),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Primary(Message),
    Cause(Message),
}

impl Fragment {
    pub fn message(&self) -> &Message {
        match self {
            Self::Primary(m) | Self::Cause(m) => m,
        }
    }

    fn message_mut(&mut self) -> &mut Message {
        match self {
            Self::Primary(m) | Self::Cause(m) => m,
        }
    }
}

/// Ordered failure report. Empty fragments means success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusChain {
    fragments: Vec<Fragment>,
    /// always `Message::Coded`; the vector has no slot for a bare text warning
    warnings: Vec<Message>,
    sql_state: Option<String>,
}

/// Where trailing string/number arguments attach while decoding.
enum ArgTarget {
    None,
    Fragment,
    Warning,
}

impl StatusChain {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn new(primary: Message) -> Self {
        Self { fragments: vec![Fragment::Primary(primary)], ..Self::default() }
    }

    pub fn with_cause(mut self, cause: Message) -> Self {
        self.push(cause);
        self
    }

    pub fn with_warning(mut self, code: u32, args: impl IntoIterator<Item = Arg>) -> Self {
        self.warnings.push(Message::coded(code, args));
        self
    }

    pub fn with_sql_state(mut self, state: impl Into<String>) -> Self {
        self.sql_state = Some(state.into());
        self
    }

    fn push(&mut self, message: Message) {
        if self.fragments.is_empty() {
            self.fragments.push(Fragment::Primary(message));
        } else {
            self.fragments.push(Fragment::Cause(message));
        }
    }

    pub fn is_error(&self) -> bool {
        !self.fragments.is_empty()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn warnings(&self) -> &[Message] {
        &self.warnings
    }

    pub fn sql_state(&self) -> Option<&str> {
        self.sql_state.as_deref()
    }

    /// Codes of the coded fragments, in order.
    pub fn codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.fragments.iter().filter_map(|f| f.message().code())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            out.push_str(&fragment.message().render());
            out.push('\n');
        }
        out
    }

    pub fn read(r: &mut XdrReader<'_>) -> Result<Self, ProtocolError> {
        let mut chain = Self::default();
        let mut target = ArgTarget::None;
        loop {
            match r.get_i32()? {
                arg_type::END => break,
                arg_type::GDS => {
                    let code = r.get_i32()? as u32;
                    if code == 0 {
                        target = ArgTarget::None;
                        continue;
                    }
                    chain.push(Message::coded(code, []));
                    target = ArgTarget::Fragment;
                }
                arg_type::WARNING => {
                    let code = r.get_i32()? as u32;
                    chain.warnings.push(Message::coded(code, []));
                    target = ArgTarget::Warning;
                }
                arg_type::STRING | arg_type::CSTRING => {
                    let s = r.get_string()?;
                    chain.attach_arg(&target, Arg::Text(s));
                }
                arg_type::NUMBER => {
                    let n = r.get_i32()?;
                    chain.attach_arg(&target, Arg::Number(n));
                }
                arg_type::INTERPRETED => {
                    let s = r.get_string()?;
                    chain.push(Message::Text(s));
                    target = ArgTarget::None;
                }
                arg_type::SQL_STATE => {
                    chain.sql_state = Some(r.get_string()?);
                }
                other => return Err(ProtocolError::UnknownStatusArg(other)),
            }
        }
        Ok(chain)
    }

    fn attach_arg(&mut self, target: &ArgTarget, arg: Arg) {
        let message = match target {
            ArgTarget::Fragment => self.fragments.last_mut().map(Fragment::message_mut),
            ArgTarget::Warning => self.warnings.last_mut(),
            ArgTarget::None => None,
        };
        match message {
            Some(Message::Coded { args, .. }) => args.push(arg),
            // an argument with nothing to qualify still surfaces
            _ => self.push(Message::Text(arg.to_string())),
        }
    }

    pub fn write(&self, w: &mut XdrWriter) {
        if self.fragments.is_empty() {
            w.put_i32(arg_type::GDS).put_i32(0);
        }
        for fragment in &self.fragments {
            match fragment.message() {
                Message::Coded { code, args } => {
                    w.put_i32(arg_type::GDS).put_i32(*code as i32);
                    write_args(w, args);
                }
                Message::Text(s) => {
                    w.put_i32(arg_type::INTERPRETED).put_str(s);
                }
            }
        }
        for warning in &self.warnings {
            let (code, args) = match warning {
                Message::Coded { code, args } => (*code, args.as_slice()),
                Message::Text(_) => continue,
            };
            w.put_i32(arg_type::WARNING).put_i32(code as i32);
            write_args(w, args);
        }
        if let Some(state) = &self.sql_state {
            w.put_i32(arg_type::SQL_STATE).put_str(state);
        }
        w.put_i32(arg_type::END);
    }
}

fn write_args(w: &mut XdrWriter, args: &[Arg]) {
    for arg in args {
        match arg {
            Arg::Number(n) => w.put_i32(arg_type::NUMBER).put_i32(*n),
            Arg::Text(s) => w.put_i32(arg_type::STRING).put_str(s),
        };
    }
}

impl fmt::Display for StatusChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
