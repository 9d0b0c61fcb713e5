//! `ReaderLink` on top of the `pn532` crate.
//!
//! Frame encoding, checksums and the bus handshake live in `pn532`; this module
//! only picks the requests and interprets the response payloads.

use std::time::Duration;

use linux_embedded_hal::I2cdev;
use log::debug;
use pn532::i2c::I2CInterface;
use pn532::requests::{Command, SAMMode};
use pn532::serialport::{SerialPortInterface, SysTimer};
use pn532::{Interface, Pn532, Request};

use crate::link::{CardTypes, FirmwareVersion, KeySlot, ReaderLink};
use crate::picc::{hex, AuthKey, CardUid};
use crate::{Error, Result};

/// Frame buffer, large enough for a 16 byte block plus ATS.
const BUF_LEN: usize = 64;

const TARGET: u8 = 0x01; // logical number of the single listed target
const MF_READ: u8 = 0x30;
const BRTY_ISO14443A_106: u8 = 0x00;
/// RFConfiguration item: MxRtyATR, MxRtyPSL, MxRtyPassiveActivation
const CFG_MAX_RETRIES: u8 = 0x05;

fn transport<E: core::fmt::Debug>(e: E) -> Error {
    Error::Transport(format!("{:?}", e))
}

pub struct Pn532Link<I> {
    pn532: Pn532<I, SysTimer, BUF_LEN>,
    timeout: Duration,
}

impl<I: Interface> Pn532Link<I> {
    pub fn new(interface: I, timeout: Duration) -> Self {
        Self {
            pn532: Pn532::new(interface, SysTimer::new()),
            timeout,
        }
    }

    fn exchange<const N: usize>(
        &mut self,
        request: Request<N>,
        response_len: usize,
    ) -> Result<Vec<u8>> {
        match self.pn532.process(&request, response_len, self.timeout) {
            Ok(r) => {
                debug!("<- {}", hex(r));
                Ok(r.to_vec())
            }
            Err(pn532::Error::TimeoutResponse) => {
                Err(Error::Transport("response timeout".to_string()))
            }
            Err(e) => Err(transport(e)),
        }
    }
}

impl Pn532Link<SerialPortInterface> {
    /// High speed UART. The chip sleeps until it sees the wakeup preamble.
    pub fn open_hsu(device: &str, baud: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(device, baud)
            .timeout(Duration::from_millis(500))
            .open()
            .map_err(|e| Error::Transport(format!("{}: {}", device, e)))?;
        let mut link = Self::new(SerialPortInterface { port }, timeout);
        link.pn532
            .interface
            .send_wakeup_message()
            .map_err(transport)?;
        Ok(link)
    }
}

impl Pn532Link<I2CInterface<I2cdev>> {
    pub fn open_i2c(device: &str, timeout: Duration) -> Result<Self> {
        let i2c = I2cdev::new(device)
            .map_err(|e| Error::Transport(format!("{}: {}", device, e)))?;
        Ok(Self::new(I2CInterface { i2c }, timeout))
    }
}

impl<I: Interface> ReaderLink for Pn532Link<I> {
    fn init(&mut self) -> Result<FirmwareVersion> {
        let r = self
            .exchange(Request::GET_FIRMWARE_VERSION, 4)
            .map_err(|e| Error::Init(e.to_string()))?;
        FirmwareVersion::from_response(&r)
    }

    fn configure(&mut self, retry_count: u8) -> Result<()> {
        self.exchange(
            Request::new(
                Command::RFConfiguration,
                [CFG_MAX_RETRIES, 0xFF, 0x01, retry_count],
            ),
            0,
        )?;
        Ok(())
    }

    fn sam_config(&mut self) -> Result<()> {
        self.exchange(Request::sam_configuration(SAMMode::Normal, false), 0)?;
        Ok(())
    }

    fn poll(&mut self, types: CardTypes, max_targets: u8) -> Result<Option<CardUid>> {
        if !types.contains(CardTypes::ISO14443A_106) {
            return Err(Error::Transport(format!(
                "unsupported target types {:#04x}",
                types.0
            )));
        }
        let request = Request::new(
            Command::InListPassiveTarget,
            [max_targets, BRTY_ISO14443A_106],
        );
        let r = match self.pn532.process(&request, 32, self.timeout) {
            Ok(r) => r.to_vec(),
            Err(pn532::Error::TimeoutResponse) => return Ok(None),
            Err(e) => return Err(transport(e)),
        };
        parse_target(&r)
    }

    fn authenticate_block(
        &mut self,
        uid: &CardUid,
        block: u8,
        slot: KeySlot,
        key: &AuthKey,
    ) -> Result<bool> {
        // double size UIDs authenticate with their last four bytes
        let uid = uid.as_bytes();
        if uid.len() < 4 {
            return Ok(false);
        }
        let tail = &uid[uid.len() - 4..];
        let mut data = [0u8; 13];
        data[0] = TARGET;
        data[1] = slot as u8;
        data[2] = block;
        data[3..9].copy_from_slice(&key.0);
        data[9..13].copy_from_slice(tail);

        let r = self.exchange(Request::new(Command::InDataExchange, data), 1)?;
        Ok(r.first() == Some(&0x00))
    }

    fn read_data_block(&mut self, block: u8) -> Result<Option<[u8; 16]>> {
        let request = Request::new(Command::InDataExchange, [TARGET, MF_READ, block]);
        let r = self.exchange(request, 17)?;
        match r.split_first() {
            Some((&0x00, data)) if data.len() >= 16 => {
                let mut out = [0u8; 16];
                out.copy_from_slice(&data[..16]);
                Ok(Some(out))
            }
            _ => Ok(None),
        }
    }

    fn read_page(&mut self, page: u8) -> Result<Option<[u8; 4]>> {
        // READ returns four pages, only the first one is wanted
        let r = self.exchange(Request::ntag_read(page), 17)?;
        match r.split_first() {
            Some((&0x00, data)) if data.len() >= 4 => {
                let mut out = [0u8; 4];
                out.copy_from_slice(&data[..4]);
                Ok(Some(out))
            }
            _ => Ok(None),
        }
    }

    fn write_register(&mut self, addr: u16, value: u8) -> Result<()> {
        let [hi, lo] = addr.to_be_bytes();
        debug!("write {:#06x} = {:#04x}", addr, value);
        self.exchange(Request::new(Command::WriteRegister, [hi, lo, value]), 0)?;
        Ok(())
    }

    fn read_register(&mut self, addr: u16) -> Result<u8> {
        let [hi, lo] = addr.to_be_bytes();
        let r = self.exchange(Request::new(Command::ReadRegister, [hi, lo]), 1)?;
        r.first()
            .copied()
            .ok_or(Error::MalformedResponse("read register"))
    }
}

/// InListPassiveTarget payload for type A:
/// NbTg, Tg, SENS_RES(2), SEL_RES, NFCIDLength, NFCID1...
fn parse_target(r: &[u8]) -> Result<Option<CardUid>> {
    match r {
        [] | [0, ..] => Ok(None),
        [_, _tg, _, _, _sel_res, len, rest @ ..] => {
            let len = *len as usize;
            if len == 0 || len > 10 || rest.len() < len {
                return Err(Error::MalformedResponse("target uid"));
            }
            Ok(Some(CardUid::new(&rest[..len])))
        }
        _ => Err(Error::MalformedResponse("target")),
    }
}
