//! Behavioural specs for the maintenance client.
//!
//! Every scenario drives the public `MaintenanceManager` against the
//! in-memory service endpoint from `fbsvc-client`'s `test-support` feature.

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/maintenance"]
mod maintenance {
    mod limbo;
    mod shutdown;
    mod sweep;
    mod tuning;
    mod validate;
}

#[path = "specs/attachment"]
mod attachment {
    mod cancel;
    mod handshake;
}
