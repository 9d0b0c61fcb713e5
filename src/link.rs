use crate::picc::{AuthKey, CardUid};
use crate::Result;

/// CIU_TxControl, bits 0..1 drive TX1/TX2.
pub const REG_TX_CONTROL: u16 = 0x6304;
/// CIU test register for the antenna driver current limits.
pub const REG_CURRENT_TEST: u16 = 0x610C;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub ic: u8,
    pub version: u8,
    pub revision: u8,
    pub support: u8,
}

impl FirmwareVersion {
    pub fn from_response(r: &[u8]) -> Result<Self> {
        match r {
            [ic, version, revision, support, ..] => Ok(Self {
                ic: *ic,
                version: *version,
                revision: *revision,
                support: *support,
            }),
            _ => Err(crate::Error::MalformedResponse("firmware version")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySlot {
    A = 0x60, // MIFARE authentication with Key A
    B = 0x61, // MIFARE authentication with Key B
}

/// Accepted target types for a passive poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardTypes(pub u8);

impl CardTypes {
    pub const ISO14443A_106: CardTypes = CardTypes(0x01);

    pub fn contains(self, other: CardTypes) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Capability set of a PN53x reader as seen by the polling core.
///
/// Calls block until the reader answers or its own timeout elapses. There is
/// at most one outstanding request.
pub trait ReaderLink {
    /// Firmware handshake. Failing here means there is no usable reader.
    fn init(&mut self) -> Result<FirmwareVersion>;
    /// Passive activation retries; 0 waits for the reader's timeout once.
    fn configure(&mut self, retry_count: u8) -> Result<()>;
    fn sam_config(&mut self) -> Result<()>;
    /// `Ok(None)` when no card answered in time.
    fn poll(&mut self, types: CardTypes, max_targets: u8) -> Result<Option<CardUid>>;
    fn authenticate_block(
        &mut self,
        uid: &CardUid,
        block: u8,
        slot: KeySlot,
        key: &AuthKey,
    ) -> Result<bool>;
    fn read_data_block(&mut self, block: u8) -> Result<Option<[u8; 16]>>;
    fn read_page(&mut self, page: u8) -> Result<Option<[u8; 4]>>;
    fn write_register(&mut self, addr: u16, value: u8) -> Result<()>;
    fn read_register(&mut self, addr: u16) -> Result<u8>;
}
