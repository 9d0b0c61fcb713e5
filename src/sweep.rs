//! RF field driver current diagnostic.
//!
//! The PN532 CIU can compare the antenna driver current against a low and a
//! high limit. A test mode value written to the test register selects the
//! limits, and bits 7/6 of the read-back flag a failure against either one.

use core::fmt;

use embedded_hal::blocking::delay::DelayMs;
use log::{info, warn};

use crate::link::{ReaderLink, REG_CURRENT_TEST, REG_TX_CONTROL};
use crate::Result;

pub const LOW_LABELS: [&str; 4] = ["illegal", "illegal", "25mA", "35mA"];
pub const HIGH_LABELS: [&str; 8] = [
    "45mA", "60mA", "75mA", "90mA", "105mA", "120mA", "130mA", "150mA",
];

const BELOW_LOW_FAILED: u8 = 0x80;
const ABOVE_HIGH_FAILED: u8 = 0x40;
const TEST_ENABLE: u8 = 0x01;

const TX_ON: u8 = 0x03;
const TX_OFF: u8 = 0x00;

/// A (low, high) limit pair. Low limits 0 and 1 are illegal on the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentRange {
    low: u8,
    high: u8,
}

impl CurrentRange {
    pub fn new(low: u8, high: u8) -> Option<Self> {
        if (low == 2 || low == 3) && high < 8 {
            Some(Self { low, high })
        } else {
            None
        }
    }

    /// Every testable pair, low ascending then high ascending.
    pub fn all() -> impl Iterator<Item = CurrentRange> {
        (2..4u8).flat_map(|low| (0..8u8).map(move |high| CurrentRange { low, high }))
    }

    pub fn low(&self) -> u8 {
        self.low
    }

    pub fn high(&self) -> u8 {
        self.high
    }

    pub fn test_mode(&self) -> u8 {
        (self.low << 4) | (self.high << 1) | TEST_ENABLE
    }

    pub fn low_label(&self) -> &'static str {
        LOW_LABELS[self.low as usize]
    }

    pub fn high_label(&self) -> &'static str {
        HIGH_LABELS[self.high as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdResult {
    pub below_low_failed: bool,
    pub above_high_failed: bool,
}

impl ThresholdResult {
    pub fn decode(value: u8) -> Self {
        Self {
            below_low_failed: value & BELOW_LOW_FAILED != 0,
            above_high_failed: value & ABOVE_HIGH_FAILED != 0,
        }
    }

    pub fn passed(&self) -> bool {
        !self.below_low_failed && !self.above_high_failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdReport {
    pub range: CurrentRange,
    pub readback: u8,
    pub result: ThresholdResult,
}

impl fmt::Display for ThresholdReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let below = if self.result.below_low_failed {
            "FAIL CURRENT UNDER LOW THRESHOLD"
        } else {
            "pass current above low threshold"
        };
        let above = if self.result.above_high_failed {
            "FAIL CURRENT OVER HIGH THRESHOLD"
        } else {
            "pass current under high threshold"
        };
        write!(
            f,
            "Test limits {} to {} : {} / {} : {}",
            self.range.low_label(),
            self.range.high_label(),
            below,
            above,
            if self.result.passed() { "PASS" } else { "FAIL" }
        )
    }
}

pub struct ThresholdSweeper<'a, R: ?Sized, D> {
    reader: &'a mut R,
    delay: &'a mut D,
    pair_delay_ms: u32,
    field_settle_ms: u32,
}

impl<'a, R, D> ThresholdSweeper<'a, R, D>
where
    R: ReaderLink + ?Sized,
    D: DelayMs<u32>,
{
    pub fn new(
        reader: &'a mut R,
        delay: &'a mut D,
        pair_delay_ms: u32,
        field_settle_ms: u32,
    ) -> Self {
        Self {
            reader,
            delay,
            pair_delay_ms,
            field_settle_ms,
        }
    }

    /// Switch both antenna drivers and wait for the field to settle.
    pub fn set_field(&mut self, on: bool) -> Result<u8> {
        self.reader
            .write_register(REG_TX_CONTROL, if on { TX_ON } else { TX_OFF })?;
        let value = self.reader.read_register(REG_TX_CONTROL)?;
        info!("tx: {} {:#x}", if on { "ON" } else { "OFF" }, value);
        self.delay.delay_ms(self.field_settle_ms);
        Ok(value)
    }

    pub fn test_pair(&mut self, range: CurrentRange) -> Result<ThresholdReport> {
        self.reader.write_register(REG_CURRENT_TEST, range.test_mode())?;
        let readback = self.reader.read_register(REG_CURRENT_TEST)?;
        let report = ThresholdReport {
            range,
            readback,
            result: ThresholdResult::decode(readback),
        };
        info!("{}", report);
        Ok(report)
    }

    /// Test every pair. A pair whose register access fails is reported and
    /// left out; the remaining pairs still run.
    pub fn sweep(&mut self, field_on: bool) -> Result<Vec<ThresholdReport>> {
        self.set_field(field_on)?;
        let mut reports = Vec::with_capacity(16);
        for range in CurrentRange::all() {
            match self.test_pair(range) {
                Ok(report) => reports.push(report),
                Err(e) => warn!(
                    "Test limits {} to {} : not tested: {}",
                    range.low_label(),
                    range.high_label(),
                    e
                ),
            }
            self.delay.delay_ms(self.pair_delay_ms);
        }
        Ok(reports)
    }
}
