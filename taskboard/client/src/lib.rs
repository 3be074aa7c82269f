pub mod api;
pub mod cli;
pub mod render;
pub mod state;

/// Errors surfaced to the user by client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a usable response.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with an error status.
    #[error("server responded {status}: {message}")]
    Api { status: u16, message: String },
    /// Task text was empty after trimming.
    #[error("task text must not be empty")]
    EmptyText,
    /// The task is not part of the list currently held by the client.
    #[error("task {0} is not in the current list")]
    TaskNotLoaded(String),
    /// No row with this position is visible.
    #[error("there is no task at row {0}")]
    NoSuchRow(usize),
}
