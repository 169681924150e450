pub mod config;
pub mod round;
pub mod session;
pub mod stats;

/// Runtime for commands that talk to the collaborator server.
pub(crate) fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
