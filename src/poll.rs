use embedded_hal::blocking::delay::DelayMs;
use log::{info, warn};

use crate::link::{CardTypes, ReaderLink};
use crate::mifare;
use crate::picc::{BlockData, CardFamily, CardUid, PageData, ReadPlan};
use crate::sweep::ThresholdSweeper;
use crate::{Error, Result};

/// Passive activation retries handed to the reader: wait once, never retry.
const POLL_RETRIES: u8 = 0;
const POLL_TYPES: CardTypes = CardTypes::ISO14443A_106;
const POLL_MAX_TARGETS: u8 = 1;

/// Pauses used by the driver, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub card_settle_ms: u32,
    pub retry_delay_ms: u32,
    pub pair_delay_ms: u32,
    pub field_settle_ms: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            card_settle_ms: 1000,
            retry_delay_ms: 100,
            pair_delay_ms: 100,
            field_settle_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    NoCard,
    /// Card seen but nothing read from it.
    CardFound(CardUid),
    ClassicBlock {
        uid: CardUid,
        block: u8,
        data: BlockData,
    },
    UltralightPage {
        uid: CardUid,
        page: u8,
        data: PageData,
    },
}

impl PollOutcome {
    /// Whether the driver loop can stop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollOutcome::NoCard)
    }

    pub fn uid(&self) -> Option<&CardUid> {
        match self {
            PollOutcome::NoCard => None,
            PollOutcome::CardFound(uid)
            | PollOutcome::ClassicBlock { uid, .. }
            | PollOutcome::UltralightPage { uid, .. } => Some(uid),
        }
    }
}

/// Run the read sequence that fits the card family.
pub fn process_card<R: ReaderLink + ?Sized>(
    reader: &mut R,
    uid: CardUid,
    plan: &ReadPlan,
) -> PollOutcome {
    match CardFamily::classify(&uid) {
        CardFamily::MifareClassic => {
            info!("Seems to be a Mifare Classic card (4 byte UID)");
            let block = plan.classic_block;
            match mifare::authenticate_and_read(
                reader,
                &uid,
                block,
                plan.classic_slot,
                &plan.classic_key,
            ) {
                Ok(data) => PollOutcome::ClassicBlock { uid, block, data },
                Err(_) => PollOutcome::CardFound(uid),
            }
        }
        CardFamily::MifareUltralight => {
            info!("Seems to be a Mifare Ultralight tag (7 byte UID)");
            let page = plan.ultralight_page;
            match mifare::read_page(reader, page) {
                Ok(data) => PollOutcome::UltralightPage { uid, page, data },
                Err(_) => PollOutcome::CardFound(uid),
            }
        }
        CardFamily::Unrecognized => {
            warn!("{}", Error::UnrecognizedUid { len: uid.len() });
            PollOutcome::CardFound(uid)
        }
    }
}

/// Owns the reader for the lifetime of the process.
pub struct PollLoop<R, D> {
    reader: R,
    delay: D,
    settings: Settings,
    plan: ReadPlan,
    configured: bool,
}

impl<R: ReaderLink, D: DelayMs<u32>> PollLoop<R, D> {
    pub fn new(reader: R, delay: D, settings: Settings) -> Self {
        Self {
            reader,
            delay,
            settings,
            plan: ReadPlan::default(),
            configured: false,
        }
    }

    pub fn with_plan(mut self, plan: ReadPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn reader(&mut self) -> &mut R {
        &mut self.reader
    }

    /// One-time reader setup. A missing reader is `Error::Init`.
    pub fn setup(&mut self) -> Result<()> {
        if self.configured {
            return Ok(());
        }
        let fw = self.reader.init().map_err(|e| match e {
            Error::Init(_) => e,
            other => Error::Init(other.to_string()),
        })?;
        info!(
            "Found chip PN5{:x} Firmware ver. {}.{}",
            fw.ic, fw.version, fw.revision
        );
        self.reader.configure(POLL_RETRIES)?;
        self.reader.sam_config()?;
        self.configured = true;
        info!("Waiting for an ISO14443A card");
        Ok(())
    }

    /// Exactly one poll attempt, followed by the family specific read.
    pub fn poll_once(&mut self) -> PollOutcome {
        let uid = match self.reader.poll(POLL_TYPES, POLL_MAX_TARGETS) {
            Ok(Some(uid)) => uid,
            Ok(None) => {
                info!("Timed out waiting for a card");
                return PollOutcome::NoCard;
            }
            Err(e) => {
                warn!("Timed out waiting for a card: {}", e);
                return PollOutcome::NoCard;
            }
        };
        info!("Found a card!");
        info!("UID Length: {}", uid.len());
        info!("UID Value: {}", uid);
        process_card(&mut self.reader, uid, &self.plan)
    }

    /// Poll until a card has been processed, however the read went.
    pub fn run_until_card(&mut self) -> Result<PollOutcome> {
        self.setup()?;
        loop {
            let outcome = self.poll_once();
            match outcome {
                PollOutcome::NoCard => {}
                // give the holder time to move an unreadable card
                PollOutcome::CardFound(_) => {
                    self.delay.delay_ms(self.settings.card_settle_ms);
                    return Ok(outcome);
                }
                _ => return Ok(outcome),
            }
        }
    }

    /// Threshold sweeps with the field off and on. `None` never stops.
    ///
    /// Only a failed setup is returned; a sweep that cannot switch the field is
    /// reported and the next one runs.
    pub fn run_diagnostics(&mut self, rounds: Option<u32>) -> Result<()> {
        self.setup()?;
        let mut round = 0u32;
        while rounds.is_none_or(|n| round < n) {
            let mut sweeper = ThresholdSweeper::new(
                &mut self.reader,
                &mut self.delay,
                self.settings.pair_delay_ms,
                self.settings.field_settle_ms,
            );
            for field_on in [false, true] {
                if let Err(e) = sweeper.sweep(field_on) {
                    let field = if field_on { "on" } else { "off" };
                    warn!("Sweep with field {} aborted: {}", field, e);
                }
            }
            round += 1;
            self.delay.delay_ms(self.settings.retry_delay_ms);
        }
        Ok(())
    }
}
