use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Store Error - {0}")]
    Store(String),

    #[error("Offset Table Error - {0}")]
    OffsetTable(String),

    #[error("Protocol Error - {0}")]
    Protocol(String),

    #[error("Engine Error - {0}")]
    Engine(String),

    #[error("Receiver Error - {0}")]
    Receiver(String),

    #[error("OneShot Receiver Error - {0}")]
    ActorPatternRecv(String),
}
