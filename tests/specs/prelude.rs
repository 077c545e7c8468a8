//! Shared setup for the specs.

pub use fbsvc_client::fake::{FakeDatabase, FakeService};
pub use fbsvc_client::{
    AccessMode, Error, LimboAdvise, LimboState, LimboTransaction, MaintenanceManager,
    OperationMode, ServiceManagerOptions, ShutdownMode, ShutdownModeEx, Transcript,
    TranscriptSink, ValidationMode,
};

pub const DB: &str = "/db/employee.fdb";

/// A fake server hosting [`DB`] plus a manager attached to it.
pub struct Server {
    pub fake: FakeService,
    pub manager: MaintenanceManager,
}

impl Server {
    pub async fn start() -> Self {
        Self::with(FakeService::new().with_database(DB)).await
    }

    pub async fn with(fake: FakeService) -> Self {
        let manager = connect(&fake).await;
        Self { fake, manager }
    }

    pub fn db(&self) -> FakeDatabase {
        self.fake.database(DB).expect("database should exist")
    }
}

pub async fn connect(fake: &FakeService) -> MaintenanceManager {
    MaintenanceManager::with_transport(
        Box::new(fake.clone()),
        FakeService::USER,
        FakeService::PASSWORD,
        &ServiceManagerOptions::default(),
    )
    .await
    .expect("attach should succeed")
}

/// Index of the first line containing `needle`, panicking with the transcript.
pub fn position(transcript: &Transcript, needle: &str) -> usize {
    transcript
        .lines()
        .iter()
        .position(|l| l.contains(needle))
        .unwrap_or_else(|| panic!("no line containing '{needle}' in:\n{}", transcript.text()))
}

/// Run an async scenario from a parameterized (synchronous) test.
pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime should build")
        .block_on(future)
}
