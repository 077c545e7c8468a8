// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory service endpoint for tests.
//!
//! [`FakeService`] is a [`Transport`] that answers packets the way a server's
//! service manager does: it keeps per-database state, runs maintenance jobs
//! synchronously, streams their output in small chunks, and reports failures
//! through status vectors at the next status check. Faults (dropped
//! connections, stalls, undersized buffers) can be injected.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use fbsvc_wire::info::InfoBuilder;
use fbsvc_wire::messages::codes;
use fbsvc_wire::packet::PROTOCOL_VERSION;
use fbsvc_wire::spb::{options, values};
use fbsvc_wire::{
    Arg, BufferKind, DecodedBuffer, GenericResponse, InfoItem, InfoPayload, InfoTag, Message,
    ParameterBuffer, ProtocolError, Reply, Request, ServiceAction, SpbTag, StatusChain,
};
use parking_lot::Mutex;

use crate::{LimboTransaction, OperationMode, Transport};

/// Server-side state of one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeDatabase {
    pub read_only: bool,
    pub dialect: u32,
    /// 0 means the server default
    pub page_buffers: u32,
    pub sync_writes: bool,
    pub reserve_space: bool,
    pub mode: OperationMode,
    pub sweep_interval: u32,
    pub linger: bool,
    pub limbo: Vec<LimboTransaction>,
    pub next_transaction: u64,
}

impl Default for FakeDatabase {
    fn default() -> Self {
        Self {
            read_only: false,
            dialect: 3,
            page_buffers: 0,
            sync_writes: true,
            reserve_space: true,
            mode: OperationMode::Normal,
            sweep_interval: 20_000,
            linger: true,
            limbo: Vec::new(),
            next_transaction: 10,
        }
    }
}

/// Work started by `op_service_start` and drained by info queries.
enum Job {
    Idle,
    Output { pending: String, not_ready: usize },
    Limbo { pending: VecDeque<LimboTransaction> },
}

struct FakeState {
    user: String,
    password: String,
    databases: HashMap<String, FakeDatabase>,
    home_dir: String,
    server_version: String,
    chunk_size: usize,
    limbo_per_poll: usize,
    not_ready_polls: usize,
    dummy_replies: bool,
    reject_protocol: bool,
    min_info_buffer: u32,

    handle: Option<i32>,
    next_handle: i32,
    replies: VecDeque<Reply>,
    job: Job,
    pending_error: Option<StatusChain>,
    line_failure: Option<String>,
    sentinel_failure: Option<u32>,
    pending_warning: Option<(u32, Vec<Arg>)>,

    requests: Vec<Request>,
    info_calls: usize,
    drop_after_info: Option<usize>,
    stall_after_info: Option<usize>,
    stalled: bool,
    closed: bool,
}

/// Scripted service endpoint.
#[derive(Clone)]
pub struct FakeService {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeService {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                user: Self::USER.to_string(),
                password: Self::PASSWORD.to_string(),
                databases: HashMap::new(),
                home_dir: "/opt/firebird".to_string(),
                server_version: "LI-V5.0.1.1469 Fake".to_string(),
                chunk_size: 64,
                limbo_per_poll: 2,
                not_ready_polls: 0,
                dummy_replies: false,
                reject_protocol: false,
                min_info_buffer: 0,
                handle: None,
                next_handle: 1,
                replies: VecDeque::new(),
                job: Job::Idle,
                pending_error: None,
                line_failure: None,
                sentinel_failure: None,
                pending_warning: None,
                requests: Vec::new(),
                info_calls: 0,
                drop_after_info: None,
                stall_after_info: None,
                stalled: false,
                closed: false,
            })),
        }
    }
}

impl FakeService {
    pub const USER: &'static str = "SYSDBA";
    pub const PASSWORD: &'static str = "masterkey";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(self, user: &str, password: &str) -> Self {
        {
            let mut state = self.inner.lock();
            state.user = user.to_string();
            state.password = password.to_string();
        }
        self
    }

    pub fn with_database(self, path: &str) -> Self {
        self.with_database_state(path, FakeDatabase::default())
    }

    pub fn with_database_state(self, path: &str, db: FakeDatabase) -> Self {
        self.inner.lock().databases.insert(path.to_string(), db);
        self
    }

    pub fn with_home_dir(self, dir: &str) -> Self {
        self.inner.lock().home_dir = dir.to_string();
        self
    }

    pub fn with_server_version(self, version: &str) -> Self {
        self.inner.lock().server_version = version.to_string();
        self
    }

    /// Bytes of output per `to_eof` poll.
    pub fn with_chunk_size(self, size: usize) -> Self {
        self.inner.lock().chunk_size = size.max(1);
        self
    }

    /// `data_not_ready` answers before each job's first output chunk.
    pub fn with_not_ready_polls(self, polls: usize) -> Self {
        self.inner.lock().not_ready_polls = polls;
        self
    }

    /// Precede every reply with an `op_dummy` keep-alive.
    pub fn with_dummy_replies(self) -> Self {
        self.inner.lock().dummy_replies = true;
        self
    }

    pub fn rejecting_protocol(self) -> Self {
        self.inner.lock().reject_protocol = true;
        self
    }

    /// Answer `truncated` to text queries with a smaller buffer.
    pub fn with_min_info_buffer(self, size: u32) -> Self {
        self.inner.lock().min_info_buffer = size;
        self
    }

    /// Drop the connection on the `n`-th info request.
    pub fn drop_after_info_calls(self, n: usize) -> Self {
        self.inner.lock().drop_after_info = Some(n);
        self
    }

    /// Never answer the `n`-th info request.
    pub fn stall_after_info_calls(self, n: usize) -> Self {
        self.inner.lock().stall_after_info = Some(n);
        self
    }

    /// The next status check reports `text` on its `line` item.
    pub fn fail_next_status_with_line(&self, text: &str) {
        self.inner.lock().line_failure = Some(text.to_string());
    }

    /// The next status check answers with an `error` sentinel.
    pub fn fail_next_status_with_code(&self, code: u32) {
        self.inner.lock().sentinel_failure = Some(code);
    }

    /// Attach a coded warning to the next successful response.
    pub fn warn_next_response(&self, code: u32, args: impl IntoIterator<Item = Arg>) {
        self.inner.lock().pending_warning = Some((code, args.into_iter().collect()));
    }

    pub fn add_limbo(&self, db: &str, tx: LimboTransaction) {
        if let Some(state) = self.inner.lock().databases.get_mut(db) {
            state.limbo.push(tx);
        }
    }

    pub fn database(&self, path: &str) -> Option<FakeDatabase> {
        self.inner.lock().databases.get(path).cloned()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.inner.lock().requests.clone()
    }

    /// Decoded parameter buffers of every `op_service_start`.
    pub fn started(&self) -> Vec<DecodedBuffer> {
        self.requests()
            .iter()
            .filter_map(|r| match r {
                Request::ServiceStart { spb, .. } => ParameterBuffer::decode(spb).ok(),
                _ => None,
            })
            .collect()
    }

    pub fn info_calls(&self) -> usize {
        self.inner.lock().info_calls
    }

    pub fn is_attached(&self) -> bool {
        self.inner.lock().handle.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}

#[async_trait]
impl Transport for FakeService {
    async fn send(&mut self, packet: &[u8]) -> Result<(), ProtocolError> {
        let mut state = self.inner.lock();
        if state.closed {
            return Err(ProtocolError::ConnectionClosed);
        }
        let request = Request::decode(packet)?;
        state.requests.push(request.clone());
        if let Some(mut reply) = state.answer(request) {
            if let Reply::Response(response) = &mut reply {
                if !response.status.is_error() {
                    if let Some((code, args)) = state.pending_warning.take() {
                        response.status = StatusChain::success().with_warning(code, args);
                    }
                }
            }
            if state.dummy_replies {
                state.replies.push_back(Reply::Dummy);
            }
            state.replies.push_back(reply);
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let next = {
            let mut state = self.inner.lock();
            if state.closed {
                return Err(ProtocolError::ConnectionClosed);
            }
            if state.stalled {
                None
            } else {
                Some(state.replies.pop_front().ok_or(ProtocolError::ConnectionClosed)?)
            }
        };
        match next {
            Some(reply) => Ok(reply.encode()),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), ProtocolError> {
        self.inner.lock().closed = true;
        Ok(())
    }
}

fn ok_response(handle: i32, data: Vec<u8>) -> Reply {
    Reply::Response(GenericResponse { handle, data, ..GenericResponse::default() })
}

fn error_response(status: StatusChain) -> Reply {
    Reply::Response(GenericResponse { status, ..GenericResponse::default() })
}

fn text_arg(s: &str) -> Arg {
    Arg::Text(s.to_string())
}

fn bad_parameters() -> StatusChain {
    StatusChain::new(Message::coded(codes::BAD_DPB_CONTENT, []))
}

fn is(value: i128, byte: u8) -> bool {
    value == i128::from(byte)
}

fn open_failure(db: &str) -> StatusChain {
    StatusChain::new(Message::coded(codes::IO_ERROR, [text_arg("open"), text_arg(db)]))
        .with_cause(Message::coded(codes::IO_OPEN_ERR, []))
}

impl FakeState {
    fn answer(&mut self, request: Request) -> Option<Reply> {
        match request {
            Request::Connect { .. } if self.reject_protocol => Some(Reply::Reject),
            Request::Connect { .. } => Some(Reply::Accept { version: PROTOCOL_VERSION }),
            Request::ServiceAttach { spb, .. } => Some(self.attach(&spb)),
            Request::ServiceDetach { handle } => {
                self.handle = None;
                Some(ok_response(handle, Vec::new()))
            }
            Request::ServiceStart { handle, spb } => Some(self.start(handle, &spb)),
            Request::ServiceInfo { handle, receive_items, buffer_length, .. } => {
                self.info_calls += 1;
                if self.drop_after_info == Some(self.info_calls) {
                    self.closed = true;
                    return None;
                }
                if self.stall_after_info == Some(self.info_calls) {
                    self.stalled = true;
                    return None;
                }
                Some(self.info(handle, &receive_items, buffer_length))
            }
        }
    }

    fn attach(&mut self, spb: &[u8]) -> Reply {
        let decoded = match ParameterBuffer::decode(spb) {
            Ok(d) if d.kind == BufferKind::Attach => d,
            _ => return error_response(bad_parameters()),
        };
        let user_ok = decoded.text(SpbTag::UserName) == Some(self.user.as_str());
        let password_ok = decoded.text(SpbTag::Password) == Some(self.password.as_str());
        if !user_ok || !password_ok {
            return error_response(StatusChain::new(Message::coded(codes::LOGIN, [])));
        }
        let handle = self.next_handle;
        self.next_handle += 1;
        self.handle = Some(handle);
        ok_response(handle, Vec::new())
    }

    fn start(&mut self, handle: i32, spb: &[u8]) -> Reply {
        if self.handle != Some(handle) {
            return error_response(StatusChain::new(Message::coded(codes::UNAVAILABLE, [])));
        }
        let decoded = match ParameterBuffer::decode(spb) {
            Ok(d) => d,
            Err(_) => {
                return error_response(bad_parameters())
            }
        };
        let Some(name) = decoded.text(SpbTag::DbName).map(str::to_string) else {
            return error_response(bad_parameters());
        };
        let Some(db) = self.databases.get(&name).cloned() else {
            return error_response(open_failure(&name));
        };

        let result = match decoded.kind {
            BufferKind::Action(ServiceAction::Repair) => self.repair(&name, db, &decoded),
            BufferKind::Action(ServiceAction::Properties) => self.properties(&name, db, &decoded),
            BufferKind::Attach => Err(bad_parameters()),
        };
        match result {
            Ok(()) => ok_response(handle, Vec::new()),
            Err(status) => error_response(status),
        }
    }

    fn repair(
        &mut self,
        name: &str,
        mut db: FakeDatabase,
        spb: &DecodedBuffer,
    ) -> Result<(), StatusChain> {
        let opts = spb.int(SpbTag::Options).unwrap_or_default() as u32;
        let resolution = [
            SpbTag::CommitTrans,
            SpbTag::CommitTrans64,
            SpbTag::RollbackTrans,
            SpbTag::RollbackTrans64,
        ]
        .into_iter()
        .find_map(|tag| spb.int(tag).map(|id| id as u64));

        if let Some(id) = resolution {
            match db.limbo.iter().position(|t| t.id == id) {
                Some(pos) => {
                    db.limbo.remove(pos);
                    self.databases.insert(name.to_string(), db);
                }
                None => {
                    self.pending_error = Some(
                        StatusChain::new(Message::coded(codes::RECONNECT_FAILED, [text_arg(name)]))
                            .with_cause(Message::coded(codes::NO_RECON, []))
                            .with_cause(Message::coded(
                                codes::TRA_STATE,
                                [Arg::Number(id as i32), text_arg("committed")],
                            )),
                    );
                }
            }
            return Ok(());
        }

        if db.mode != OperationMode::Normal {
            return Err(StatusChain::new(Message::coded(codes::SHUTDOWN, [text_arg(name)])));
        }

        if opts & options::LIST_LIMBO_TRANS != 0 {
            self.job = Job::Limbo { pending: db.limbo.iter().cloned().collect() };
            return Ok(());
        }

        let lines = if opts & options::SWEEP_DB != 0 {
            let oit = db.next_transaction;
            db.next_transaction += 2;
            let lines = vec![
                format!("Sweep is started by {}", self.user),
                format!("\tDatabase {name}"),
                format!("\tOIT {oit}, OAT {}, OST {}, Next {}", oit + 1, oit + 1, oit + 2),
                "Sweep is finished".to_string(),
                format!("\tDatabase {name}"),
                format!(
                    "\tOIT {}, OAT {}, OST {}, Next {}",
                    oit + 2,
                    oit + 3,
                    oit + 3,
                    db.next_transaction + 1
                ),
            ];
            self.databases.insert(name.to_string(), db);
            lines
        } else if opts & (options::VALIDATE_DB | options::MEND_DB) != 0 {
            vec![
                format!("Database {name}"),
                "\tValidation started".to_string(),
                format!("Database {name}"),
                "\tValidation finished: 0 errors, 0 warnings, 0 fixed".to_string(),
            ]
        } else {
            return Err(bad_parameters());
        };

        let mut pending = String::new();
        for line in lines {
            pending.push_str(&line);
            pending.push('\n');
        }
        self.job = Job::Output { pending, not_ready: self.not_ready_polls };
        Ok(())
    }

    fn properties(
        &mut self,
        name: &str,
        mut db: FakeDatabase,
        spb: &DecodedBuffer,
    ) -> Result<(), StatusChain> {
        let bad = |cause: Message| bad_parameters().with_cause(cause);

        for (tag, value) in &spb.items {
            let int = value.as_int().unwrap_or_default();
            match tag {
                SpbTag::AccessMode => db.read_only = is(int, values::ACCESS_MODE_READ_ONLY),
                SpbTag::WriteMode => db.sync_writes = is(int, values::WRITE_MODE_SYNC),
                SpbTag::ReserveSpace => db.reserve_space = is(int, values::RESERVE_SPACE),
                SpbTag::SqlDialect => {
                    if !(1..=3).contains(&int) {
                        self.pending_error = Some(bad(Message::coded(
                            codes::INV_DIALECT_SPECIFIED,
                            [Arg::Number(int as i32)],
                        )));
                        return Ok(());
                    }
                    db.dialect = int as u32;
                }
                SpbTag::PageBuffers => {
                    if int != 0 && int < 50 {
                        self.pending_error = Some(bad(Message::coded(
                            codes::BUF_INVALID,
                            [Arg::Number(50), Arg::Number(i32::MAX - 1)],
                        )));
                        return Ok(());
                    }
                    db.page_buffers = int as u32;
                }
                SpbTag::SweepInterval => db.sweep_interval = int as u32,
                SpbTag::ShutdownDb | SpbTag::DenyNewAttachments | SpbTag::DenyNewTransactions => {
                    db.mode = OperationMode::Multi;
                }
                SpbTag::ShutdownMode | SpbTag::OnlineMode => db.mode = operation_mode(int),
                SpbTag::Options => {
                    let opts = int as u32;
                    if opts & options::DB_ONLINE != 0 {
                        db.mode = OperationMode::Normal;
                    }
                    if opts & options::NO_LINGER != 0 {
                        db.linger = false;
                    }
                }
                _ => {}
            }
        }
        self.databases.insert(name.to_string(), db);
        Ok(())
    }

    fn info(&mut self, handle: i32, items: &[u8], buffer_length: u32) -> Reply {
        if self.handle != Some(handle) {
            return error_response(StatusChain::new(Message::coded(codes::UNAVAILABLE, [])));
        }
        let mut out = InfoBuilder::new();
        for &code in items {
            match code {
                c if c == InfoTag::Line.code() => {
                    if let Some(status) = self.pending_error.take() {
                        self.job = Job::Idle;
                        return error_response(status);
                    }
                    if let Some(code) = self.sentinel_failure.take() {
                        out.int(InfoTag::Error, i64::from(code));
                    } else {
                        let line = self.line_failure.take().unwrap_or_default();
                        out.text(InfoTag::Line, &line);
                    }
                    self.job = Job::Idle;
                }
                c if c == InfoTag::ToEof.code() => self.drain_output(&mut out, buffer_length),
                c if c == InfoTag::LimboTrans.code() => self.drain_limbo(&mut out),
                c if c == InfoTag::GetEnv.code() => {
                    let text = self.home_dir.clone();
                    self.text_item(&mut out, InfoTag::GetEnv, &text, buffer_length);
                }
                c if c == InfoTag::ServerVersion.code() => {
                    let text = self.server_version.clone();
                    self.text_item(&mut out, InfoTag::ServerVersion, &text, buffer_length);
                }
                _ => {
                    out.marker(InfoTag::Truncated);
                }
            }
        }
        out.marker(InfoTag::End);
        ok_response(handle, out.build())
    }

    fn text_item(&self, out: &mut InfoBuilder, tag: InfoTag, text: &str, buffer_length: u32) {
        let needed = 1 + 2 + text.len() + 1;
        if buffer_length < self.min_info_buffer || (buffer_length as usize) < needed {
            out.marker(InfoTag::Truncated);
        } else {
            out.text(tag, text);
        }
    }

    fn drain_output(&mut self, out: &mut InfoBuilder, buffer_length: u32) {
        let limit = self.chunk_size.min((buffer_length as usize).saturating_sub(8)).max(1);
        match &mut self.job {
            Job::Output { not_ready, .. } if *not_ready > 0 => {
                *not_ready -= 1;
                out.marker(InfoTag::DataNotReady);
            }
            Job::Output { pending, .. } => {
                let mut cut = limit.min(pending.len());
                while !pending.is_char_boundary(cut) {
                    cut -= 1;
                }
                let chunk: String = pending.drain(..cut).collect();
                out.text(InfoTag::ToEof, &chunk);
                if !pending.is_empty() {
                    out.marker(InfoTag::Truncated);
                }
            }
            _ => {
                out.text(InfoTag::ToEof, "");
            }
        }
    }

    fn drain_limbo(&mut self, out: &mut InfoBuilder) {
        let Job::Limbo { pending } = &mut self.job else {
            return;
        };
        for _ in 0..self.limbo_per_poll {
            let Some(tx) = pending.pop_front() else {
                break;
            };
            out.record(InfoTag::LimboTrans, &limbo_record(&tx));
        }
    }
}

fn operation_mode(value: i128) -> OperationMode {
    match u8::try_from(value).unwrap_or_default() {
        values::OPERATION_MODE_MULTI => OperationMode::Multi,
        values::OPERATION_MODE_SINGLE => OperationMode::Single,
        values::OPERATION_MODE_FULL => OperationMode::Full,
        _ => OperationMode::Normal,
    }
}

fn limbo_record(tx: &LimboTransaction) -> Vec<InfoItem> {
    let int = |tag, v: i64| InfoItem::new(tag, InfoPayload::Int(v));
    let text = |tag, s: &str| InfoItem::new(tag, InfoPayload::Text(s.to_string()));

    let wide = tx.id > u64::from(u32::MAX);
    let id_tag = match (tx.multi_database, wide) {
        (false, false) => InfoTag::SingleTraId,
        (false, true) => InfoTag::SingleTraId64,
        (true, false) => InfoTag::MultiTraId,
        (true, true) => InfoTag::MultiTraId64,
    };
    let mut items =
        vec![int(id_tag, tx.id as i64), int(InfoTag::TraState, i64::from(tx.state.code()))];
    if let Some(advise) = tx.advise {
        items.push(int(InfoTag::TraAdvise, i64::from(advise.code())));
    }
    for (tag, value) in [
        (InfoTag::TraHostSite, &tx.host_site),
        (InfoTag::TraRemoteSite, &tx.remote_site),
        (InfoTag::TraDbPath, &tx.db_path),
    ] {
        if let Some(value) = value {
            items.push(text(tag, value));
        }
    }
    items
}
