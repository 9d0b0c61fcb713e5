//! Scripted reader for unit tests.

use std::collections::{HashMap, VecDeque};

use embedded_hal::blocking::delay::DelayMs;

use crate::link::{CardTypes, FirmwareVersion, KeySlot, ReaderLink};
use crate::picc::{AuthKey, CardUid};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Init,
    Configure(u8),
    SamConfig,
    Poll(CardTypes, u8),
    Authenticate(Vec<u8>, u8, KeySlot),
    ReadBlock(u8),
    ReadPage(u8),
    WriteRegister(u16, u8),
    ReadRegister(u16),
}

#[derive(Default)]
pub struct MockReader {
    pub calls: Vec<Call>,
    pub firmware: Option<FirmwareVersion>,
    pub polls: VecDeque<Option<CardUid>>,
    pub auth_ok: bool,
    pub blocks: HashMap<u8, [u8; 16]>,
    pub pages: HashMap<u8, [u8; 4]>,
    /// Read-back for the test register, `None` echoes the written value.
    pub register_readback: Option<u8>,
    pub registers: HashMap<u16, u8>,
    /// Number of upcoming polls that fail with a transport error.
    pub fail_polls: usize,
    pub fail_auth: bool,
    pub fail_read: bool,
    /// Reads of the test register (0 based) that fail with a transport error.
    pub fail_test_reads: Vec<usize>,
    test_reads: usize,
}

fn glitch() -> Error {
    Error::Transport("glitch".to_string())
}

impl MockReader {
    pub fn new() -> Self {
        Self {
            firmware: Some(FirmwareVersion {
                ic: 0x32,
                version: 1,
                revision: 6,
                support: 7,
            }),
            ..Default::default()
        }
    }

    pub fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| f(c)).count()
    }
}

impl ReaderLink for MockReader {
    fn init(&mut self) -> Result<FirmwareVersion> {
        self.calls.push(Call::Init);
        self.firmware
            .ok_or_else(|| Error::Init("no response".to_string()))
    }

    fn configure(&mut self, retry_count: u8) -> Result<()> {
        self.calls.push(Call::Configure(retry_count));
        Ok(())
    }

    fn sam_config(&mut self) -> Result<()> {
        self.calls.push(Call::SamConfig);
        Ok(())
    }

    fn poll(&mut self, types: CardTypes, max_targets: u8) -> Result<Option<CardUid>> {
        self.calls.push(Call::Poll(types, max_targets));
        if self.fail_polls > 0 {
            self.fail_polls -= 1;
            return Err(glitch());
        }
        Ok(self.polls.pop_front().flatten())
    }

    fn authenticate_block(
        &mut self,
        uid: &CardUid,
        block: u8,
        slot: KeySlot,
        _key: &AuthKey,
    ) -> Result<bool> {
        self.calls
            .push(Call::Authenticate(uid.as_bytes().to_vec(), block, slot));
        if self.fail_auth {
            return Err(glitch());
        }
        Ok(self.auth_ok)
    }

    fn read_data_block(&mut self, block: u8) -> Result<Option<[u8; 16]>> {
        self.calls.push(Call::ReadBlock(block));
        if self.fail_read {
            return Err(glitch());
        }
        Ok(self.blocks.get(&block).copied())
    }

    fn read_page(&mut self, page: u8) -> Result<Option<[u8; 4]>> {
        self.calls.push(Call::ReadPage(page));
        if self.fail_read {
            return Err(glitch());
        }
        Ok(self.pages.get(&page).copied())
    }

    fn write_register(&mut self, addr: u16, value: u8) -> Result<()> {
        self.calls.push(Call::WriteRegister(addr, value));
        self.registers.insert(addr, value);
        Ok(())
    }

    fn read_register(&mut self, addr: u16) -> Result<u8> {
        self.calls.push(Call::ReadRegister(addr));
        let written = self.registers.get(&addr).copied().unwrap_or(0);
        if addr == crate::link::REG_CURRENT_TEST {
            let n = self.test_reads;
            self.test_reads += 1;
            if self.fail_test_reads.contains(&n) {
                return Err(glitch());
            }
            Ok(self.register_readback.unwrap_or(written))
        } else {
            Ok(written)
        }
    }
}

/// Records requested pauses instead of sleeping.
#[derive(Default)]
pub struct NoDelay {
    pub waited_ms: Vec<u32>,
}

impl DelayMs<u32> for NoDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.waited_ms.push(ms);
    }
}
