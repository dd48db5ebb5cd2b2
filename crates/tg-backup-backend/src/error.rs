use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("chat-service backend support was not compiled in (rebuild with `--features tdjson`)")]
    NotCompiled,
}
