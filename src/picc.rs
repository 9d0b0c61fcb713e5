use core::fmt;

use crate::link::KeySlot;

pub type BlockData = [u8; 16];
pub type PageData = [u8; 4];

/// UID of a selected PICC. 4, 7 or 10 bytes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardUid {
    bytes: Vec<u8>,
}

impl CardUid {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex(&self.bytes))
    }
}

/// Six byte Crypto1 key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AuthKey(pub [u8; 6]);

impl AuthKey {
    /// Factory transport key.
    pub const DEFAULT: AuthKey = AuthKey([0xFF; 6]);
}

// keys stay out of logs
impl fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthKey(..)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFamily {
    MifareClassic,    // 4 byte UID
    MifareUltralight, // 7 byte UID
    Unrecognized,
}

impl CardFamily {
    /// Decided by UID length alone. 10 byte UIDs are not handled.
    pub fn classify(uid: &CardUid) -> Self {
        match uid.len() {
            4 => CardFamily::MifareClassic,
            7 => CardFamily::MifareUltralight,
            _ => CardFamily::Unrecognized,
        }
    }
}

/// What to read once a card family is known.
///
/// The default targets the first user block/page with the factory key. That is
/// a demonstration credential; deployments should pass their own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPlan {
    pub classic_block: u8,
    pub classic_slot: KeySlot,
    pub classic_key: AuthKey,
    pub ultralight_page: u8,
}

impl Default for ReadPlan {
    fn default() -> Self {
        Self {
            classic_block: 4,
            classic_slot: KeySlot::A,
            classic_key: AuthKey::DEFAULT,
            ultralight_page: 4,
        }
    }
}

/// Sector of a block for the 4-block sectors 0..31.
pub fn sector_of(block: u8) -> u8 {
    block / 4
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
