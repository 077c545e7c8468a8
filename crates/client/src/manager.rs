// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public maintenance operations.
//!
//! Each operation checks the arguments it owns, builds its action buffer and
//! hands it to the executor. Domain checks (dialect values, page buffer
//! ranges) are left to the server.

use fbsvc_wire::spb::options;
use fbsvc_wire::{Action, InfoTag, ParameterBuffer, SpbTag};
use tokio_util::sync::CancellationToken;

use crate::executor::ActionExecutor;
use crate::{
    AccessMode, Error, LimboTransaction, OperationMode, PageFill, Resolution, ServiceAttachment,
    ServiceManagerOptions, ShutdownMode, ShutdownModeEx, Transcript, TranscriptSink, Transport,
    ValidationMode, WriteMode,
};

/// Maintenance client owning one service attachment.
///
/// Not for concurrent use; open one manager per parallel caller.
pub struct MaintenanceManager {
    executor: ActionExecutor,
}

impl MaintenanceManager {
    /// Connect over TCP and attach to the service manager.
    pub async fn connect(
        address: &str,
        user: &str,
        password: &str,
        options: &ServiceManagerOptions,
    ) -> Result<Self, Error> {
        let attachment = ServiceAttachment::connect(address, user, password, options).await?;
        Ok(Self::from_attachment(attachment, options))
    }

    /// Attach over a caller-supplied transport.
    pub async fn with_transport(
        transport: Box<dyn Transport>,
        user: &str,
        password: &str,
        options: &ServiceManagerOptions,
    ) -> Result<Self, Error> {
        let attachment = ServiceAttachment::attach(transport, user, password, options).await?;
        Ok(Self::from_attachment(attachment, options))
    }

    pub fn from_attachment(attachment: ServiceAttachment, options: &ServiceManagerOptions) -> Self {
        Self { executor: ActionExecutor::new(attachment, options.info_buffer_size) }
    }

    /// Stream transcript lines to `sink` instead of returning them.
    pub fn set_transcript_sink(&mut self, sink: TranscriptSink) {
        self.executor.set_sink(Some(sink));
    }

    pub fn clear_transcript_sink(&mut self) {
        self.executor.set_sink(None);
    }

    /// Cancelling the token unblocks an in-flight call with `ConnectionLost`
    /// and closes the attachment.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.executor.attachment().cancellation_token()
    }

    pub fn is_closed(&self) -> bool {
        self.executor.attachment().is_closed()
    }

    pub async fn close(&mut self) -> Result<(), Error> {
        self.executor.attachment_mut().close().await
    }

    fn buffer(action: Action, db: &str) -> Result<ParameterBuffer, Error> {
        let mut spb = ParameterBuffer::action(action);
        spb.put(SpbTag::DbName, db)?;
        Ok(spb)
    }

    async fn immediate(&mut self, spb: ParameterBuffer) -> Result<(), Error> {
        self.executor.run(spb).await.map(|_| ())
    }

    async fn streaming(&mut self, spb: ParameterBuffer) -> Result<Transcript, Error> {
        Ok(self.executor.run(spb).await?.into_transcript())
    }

    /// Garbage-collect old record versions and advance the transaction
    /// watermarks.
    pub async fn sweep(&mut self, db: &str) -> Result<Transcript, Error> {
        let mut spb = Self::buffer(Action::Sweep, db)?;
        spb.put(SpbTag::Options, options::SWEEP_DB)?;
        self.streaming(spb).await
    }

    pub async fn validate(&mut self, db: &str, mode: ValidationMode) -> Result<Transcript, Error> {
        let mut spb = Self::buffer(Action::Validate, db)?;
        spb.put(SpbTag::Options, mode.options())?;
        self.streaming(spb).await
    }

    /// Full validation that also repairs what it finds.
    pub async fn mend(&mut self, db: &str) -> Result<Transcript, Error> {
        let mut spb = Self::buffer(Action::Mend, db)?;
        spb.put(
            SpbTag::Options,
            ValidationMode::Full.options() | options::MEND_DB | options::IGNORE_CHECKSUM,
        )?;
        self.streaming(spb).await
    }

    pub async fn set_access_mode(&mut self, db: &str, mode: AccessMode) -> Result<(), Error> {
        let mut spb = Self::buffer(Action::SetAccessMode, db)?;
        spb.put(SpbTag::AccessMode, mode.value())?;
        self.immediate(spb).await
    }

    pub async fn set_access_mode_read_only(&mut self, db: &str) -> Result<(), Error> {
        self.set_access_mode(db, AccessMode::ReadOnly).await
    }

    pub async fn set_access_mode_read_write(&mut self, db: &str) -> Result<(), Error> {
        self.set_access_mode(db, AccessMode::ReadWrite).await
    }

    /// Change the SQL dialect. The server rejects values other than 1 and 3.
    pub async fn set_dialect(&mut self, db: &str, dialect: u32) -> Result<(), Error> {
        let mut spb = Self::buffer(Action::SetDialect, db)?;
        spb.put(SpbTag::SqlDialect, dialect)?;
        self.immediate(spb).await
    }

    /// Set the page cache size; 0 restores the server default.
    pub async fn set_page_buffers(&mut self, db: &str, buffers: u32) -> Result<(), Error> {
        let mut spb = Self::buffer(Action::SetPageBuffers, db)?;
        spb.put(SpbTag::PageBuffers, buffers)?;
        self.immediate(spb).await
    }

    pub async fn set_write_mode(&mut self, db: &str, mode: WriteMode) -> Result<(), Error> {
        let mut spb = Self::buffer(Action::SetWriteMode, db)?;
        spb.put(SpbTag::WriteMode, mode.value())?;
        self.immediate(spb).await
    }

    pub async fn set_write_mode_sync(&mut self, db: &str) -> Result<(), Error> {
        self.set_write_mode(db, WriteMode::Sync).await
    }

    pub async fn set_write_mode_async(&mut self, db: &str) -> Result<(), Error> {
        self.set_write_mode(db, WriteMode::Async).await
    }

    pub async fn set_page_fill(&mut self, db: &str, fill: PageFill) -> Result<(), Error> {
        let mut spb = Self::buffer(Action::SetPageFill, db)?;
        spb.put(SpbTag::ReserveSpace, fill.value())?;
        self.immediate(spb).await
    }

    pub async fn set_page_fill_reserve(&mut self, db: &str) -> Result<(), Error> {
        self.set_page_fill(db, PageFill::Reserve).await
    }

    pub async fn set_page_fill_no_reserve(&mut self, db: &str) -> Result<(), Error> {
        self.set_page_fill(db, PageFill::NoReserve).await
    }

    /// Shut the database down after `timeout_secs`.
    pub async fn shutdown(
        &mut self,
        db: &str,
        mode: ShutdownMode,
        timeout_secs: i32,
    ) -> Result<(), Error> {
        let timeout = shutdown_timeout(timeout_secs)?;
        let mut spb = Self::buffer(Action::Shutdown, db)?;
        spb.put(mode.tag(), timeout)?;
        self.immediate(spb).await
    }

    /// Move the database to `operation_mode` after `timeout_secs`.
    pub async fn shutdown_ex(
        &mut self,
        db: &str,
        operation_mode: OperationMode,
        mode: ShutdownModeEx,
        timeout_secs: i32,
    ) -> Result<(), Error> {
        let timeout = shutdown_timeout(timeout_secs)?;
        let mut spb = Self::buffer(Action::ShutdownEx, db)?;
        spb.put(SpbTag::ShutdownMode, operation_mode.value())?.put(mode.tag(), timeout)?;
        self.immediate(spb).await
    }

    pub async fn online(&mut self, db: &str) -> Result<(), Error> {
        let mut spb = Self::buffer(Action::Online, db)?;
        spb.put(SpbTag::Options, options::DB_ONLINE)?;
        self.immediate(spb).await
    }

    pub async fn online_ex(
        &mut self,
        db: &str,
        operation_mode: OperationMode,
    ) -> Result<(), Error> {
        let mut spb = Self::buffer(Action::OnlineEx, db)?;
        spb.put(SpbTag::OnlineMode, operation_mode.value())?;
        self.immediate(spb).await
    }

    /// Transactions between automatic sweeps; 0 disables them.
    pub async fn set_sweep_interval(&mut self, db: &str, interval: u32) -> Result<(), Error> {
        let mut spb = Self::buffer(Action::SetSweepInterval, db)?;
        spb.put(SpbTag::SweepInterval, interval)?;
        self.immediate(spb).await
    }

    /// Release the database as soon as its last attachment detaches.
    pub async fn disable_linger(&mut self, db: &str) -> Result<(), Error> {
        let mut spb = Self::buffer(Action::DisableLinger, db)?;
        spb.put(SpbTag::Options, options::NO_LINGER)?;
        self.immediate(spb).await
    }

    pub async fn list_limbo_transactions(
        &mut self,
        db: &str,
    ) -> Result<Vec<LimboTransaction>, Error> {
        let mut spb = Self::buffer(Action::ListLimboTransactions, db)?;
        spb.put(SpbTag::Options, options::LIST_LIMBO_TRANS)?;
        Ok(self.executor.run(spb).await?.into_limbo())
    }

    pub async fn resolve_limbo_transaction(
        &mut self,
        db: &str,
        id: u64,
        resolution: Resolution,
    ) -> Result<(), Error> {
        let mut spb = Self::buffer(Action::ResolveLimboTransaction, db)?;
        spb.put(resolution.tag(id), id)?;
        self.immediate(spb).await
    }

    pub async fn commit_transaction(&mut self, db: &str, id: u64) -> Result<(), Error> {
        self.resolve_limbo_transaction(db, id, Resolution::Commit).await
    }

    pub async fn rollback_transaction(&mut self, db: &str, id: u64) -> Result<(), Error> {
        self.resolve_limbo_transaction(db, id, Resolution::Rollback).await
    }

    /// Server installation directory.
    pub async fn home_dir(&mut self) -> Result<String, Error> {
        self.executor.query_text(InfoTag::GetEnv).await
    }

    pub async fn server_version(&mut self) -> Result<String, Error> {
        self.executor.query_text(InfoTag::ServerVersion).await
    }
}

fn shutdown_timeout(secs: i32) -> Result<u32, Error> {
    u32::try_from(secs).map_err(|_| {
        Error::InvalidArgument(format!("shutdown timeout must be non-negative, got {secs}"))
    })
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
