pub mod config;
pub mod link;
pub mod mifare;
pub mod picc;
pub mod pn532_link;
pub mod poll;
pub mod sweep;

#[cfg(test)]
mod mock;

pub use link::{CardTypes, FirmwareVersion, KeySlot, ReaderLink};
pub use picc::{AuthKey, BlockData, CardFamily, CardUid, PageData, ReadPlan};
pub use poll::{PollLoop, PollOutcome, Settings};
pub use sweep::{CurrentRange, ThresholdReport, ThresholdResult, ThresholdSweeper};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No reader answered the firmware handshake
    #[error("didn't find PN53x board: {0}")]
    Init(String),
    #[error("reader transport error: {0}")]
    Transport(String),
    #[error("malformed reader response: {0}")]
    MalformedResponse(&'static str),
    #[error("unrecognized UID length {len}")]
    UnrecognizedUid { len: usize },
    /// Wrong key, card removed or timeout; the reader does not tell them apart.
    #[error("authentication of block {block} failed")]
    Auth { block: u8 },
    #[error("unable to read block {block}")]
    Read { block: u8 },
    #[error("unable to read page {page}")]
    ReadPage { page: u8 },
}

pub type Result<T> = core::result::Result<T, Error>;
