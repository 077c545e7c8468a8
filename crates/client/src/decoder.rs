// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns parsed information items into typed results or structured errors.

use fbsvc_wire::{InfoItem, InfoTag, Message, ProtocolError, StatusChain};

use crate::{Error, LimboAdvise, LimboState, LimboTransaction};

/// Judge the items of a status check. A non-empty `line` or an `error`
/// sentinel is a failure.
pub(crate) fn check_status(items: &[InfoItem]) -> Result<(), Error> {
    for item in items {
        match item.tag {
            InfoTag::Line => {
                let text = item.as_text().unwrap_or_default().trim_end();
                if !text.is_empty() {
                    return Err(Error::Service(StatusChain::new(Message::Text(text.to_string()))));
                }
            }
            InfoTag::Error => return Err(sentinel(item)),
            _ => {}
        }
    }
    Ok(())
}

/// The failure an `error` item stands for.
pub(crate) fn sentinel(item: &InfoItem) -> Error {
    let code = item.as_int().unwrap_or_default() as u32;
    Error::Service(StatusChain::new(Message::coded(code, [])))
}

pub(crate) fn find_text(items: &[InfoItem], tag: InfoTag) -> Option<&str> {
    items.iter().find(|i| i.tag == tag).and_then(InfoItem::as_text)
}

pub(crate) fn has(items: &[InfoItem], tag: InfoTag) -> bool {
    items.iter().any(|i| i.tag == tag)
}

/// Collect limbo transactions from every `limbo_trans` cluster, in order.
/// An id tag opens a transaction; the tags after it describe that
/// transaction, even across cluster boundaries.
pub(crate) fn decode_limbo(items: &[InfoItem]) -> Result<Vec<LimboTransaction>, Error> {
    let mut out = Vec::new();
    for item in items.iter().filter(|i| i.tag == InfoTag::LimboTrans) {
        for field in item.as_record().unwrap_or_default() {
            apply_field(&mut out, field)?;
        }
    }
    Ok(out)
}

fn malformed(detail: String) -> ProtocolError {
    ProtocolError::Malformed { what: "limbo record", detail }
}

fn apply_field(out: &mut Vec<LimboTransaction>, field: &InfoItem) -> Result<(), ProtocolError> {
    let int = || field.as_int().ok_or_else(|| malformed(format!("{:?} is not numeric", field.tag)));
    let text = || field.as_text().map(str::to_string);

    match field.tag {
        InfoTag::SingleTraId | InfoTag::SingleTraId64 => {
            out.push(LimboTransaction::new(transaction_id(int()?)?));
        }
        InfoTag::MultiTraId | InfoTag::MultiTraId64 => {
            let mut tra = LimboTransaction::new(transaction_id(int()?)?);
            tra.multi_database = true;
            out.push(tra);
        }
        tag => {
            let current = out
                .last_mut()
                .ok_or_else(|| malformed(format!("{tag:?} before a transaction id")))?;
            match tag {
                InfoTag::TraState => {
                    let code = int()?;
                    current.state = u8::try_from(code)
                        .ok()
                        .and_then(LimboState::from_code)
                        .ok_or_else(|| malformed(format!("unknown state {code}")))?;
                }
                InfoTag::TraAdvise => {
                    let code = int()?;
                    current.advise = Some(
                        u8::try_from(code)
                            .ok()
                            .and_then(LimboAdvise::from_code)
                            .ok_or_else(|| malformed(format!("unknown advise {code}")))?,
                    );
                }
                InfoTag::TraHostSite => current.host_site = text(),
                InfoTag::TraRemoteSite => current.remote_site = text(),
                InfoTag::TraDbPath => current.db_path = text(),
                other => return Err(malformed(format!("unexpected {other:?}"))),
            }
        }
    }
    Ok(())
}

fn transaction_id(raw: i64) -> Result<u64, ProtocolError> {
    u64::try_from(raw).map_err(|_| malformed(format!("negative transaction id {raw}")))
}

#[cfg(test)]
#[path = "decoder_tests.rs"]
mod tests;
