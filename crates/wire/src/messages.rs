// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message templates for the status codes this client renders.
//!
//! Codes pack a facility and a message number into one `u32`. Templates use
//! `@1`, `@2`, .. for positional arguments.

/// Pack a facility/number pair into a status code.
pub const fn isc_code(facility: u32, number: u32) -> u32 {
    0x1400_0000 | ((facility & 0x1F) << 16) | (number & 0x3FFF)
}

const JRD: u32 = 0;
const GFIX: u32 = 3;

pub mod codes {
    use super::{isc_code, GFIX, JRD};

    pub const BAD_DPB_CONTENT: u32 = isc_code(JRD, 6);
    pub const NO_RECON: u32 = isc_code(JRD, 15);
    pub const IO_ERROR: u32 = isc_code(JRD, 24);
    pub const UNAVAILABLE: u32 = isc_code(JRD, 55);
    pub const TRA_STATE: u32 = isc_code(JRD, 148);
    pub const LOGIN: u32 = isc_code(JRD, 152);
    pub const SHUTDOWN: u32 = isc_code(JRD, 208);
    pub const INV_DIALECT_SPECIFIED: u32 = isc_code(JRD, 304);
    pub const NETWORK_ERROR: u32 = isc_code(JRD, 401);
    pub const IO_OPEN_ERR: u32 = isc_code(JRD, 414);
    pub const CANCELLED: u32 = isc_code(JRD, 474);
    pub const BUF_INVALID: u32 = isc_code(JRD, 938);
    pub const RECONNECT_FAILED: u32 = isc_code(GFIX, 33);
}

const TEMPLATES: &[(u32, &str)] = &[
    (codes::BAD_DPB_CONTENT, "bad parameters on attach or create database"),
    (codes::NO_RECON, "transaction is not in limbo"),
    (codes::IO_ERROR, "I/O error during \"@1\" operation for file \"@2\""),
    (codes::UNAVAILABLE, "unavailable database"),
    (codes::TRA_STATE, "transaction @1 is @2"),
    (
        codes::LOGIN,
        "Your user name and password are not defined. Ask your database administrator to set up a login.",
    ),
    (codes::SHUTDOWN, "database @1 shutdown"),
    (codes::INV_DIALECT_SPECIFIED, "Database dialect @1 is not a valid dialect."),
    (codes::NETWORK_ERROR, "Unable to complete network request to host \"@1\"."),
    (codes::IO_OPEN_ERR, "Error while trying to open file"),
    (codes::CANCELLED, "operation was cancelled"),
    (
        codes::BUF_INVALID,
        "Attempt to set in database number of buffers which is out of acceptable range [@1:@2]",
    ),
    (codes::RECONNECT_FAILED, "failed to reconnect to a transaction in database @1"),
];

pub fn template(code: u32) -> Option<&'static str> {
    TEMPLATES.iter().find(|(c, _)| *c == code).map(|(_, t)| *t)
}

/// Replace `@N` with the N-th (1-based) argument. Placeholders without a
/// matching argument are left as written.
pub fn substitute(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(at) = rest.find('@') {
        out.push_str(&rest[..at]);
        let after = &rest[at + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        let arg = after[..digits]
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| args.get(i));
        match arg {
            Some(arg) => out.push_str(arg),
            None => {
                out.push('@');
                out.push_str(&after[..digits]);
            }
        }
        rest = &after[digits..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_keep_their_facility() {
        assert_eq!(codes::NO_RECON, 335_544_335);
        assert_eq!(codes::TRA_STATE, 335_544_468);
        assert_eq!(codes::RECONNECT_FAILED, 335_740_961);
    }

    #[test]
    fn every_code_has_a_template() {
        for (code, _) in TEMPLATES {
            assert!(template(*code).is_some());
        }
        assert_eq!(template(1), None);
    }

    #[yare::parameterized(
        in_order      = { "transaction @1 is @2", &["1", "committed"], "transaction 1 is committed" },
        repeated      = { "@1/@1", &["x"], "x/x" },
        missing_arg   = { "range [@1:@2]", &["50"], "range [50:@2]" },
        lone_at       = { "mail @ host", &[], "mail @ host" },
        no_args       = { "plain text", &[], "plain text" },
    )]
    fn substitutes_positional_args(template: &str, args: &[&str], expected: &str) {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        assert_eq!(substitute(template, &args), expected);
    }
}
