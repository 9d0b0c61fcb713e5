use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::poll::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// PN532 high speed UART
    Hsu,
    /// Linux I2C character device
    I2c,
}

/// Bus binding chosen once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Hsu { device: String, baud: u32 },
    I2c { device: String },
}

#[derive(Debug, Parser)]
#[command(version, about = "Wait for an ISO14443A card on a PN532 and read it")]
pub struct Args {
    /// Bus the reader is attached to
    #[arg(short, long, value_enum, default_value_t = TransportKind::Hsu)]
    pub transport: TransportKind,
    /// Serial port or I2C device node
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    pub device: String,
    /// HSU baud rate
    #[arg(short, long, default_value_t = 115_200)]
    pub baud: u32,
    /// Run the RF field current threshold sweep instead of polling
    #[arg(long)]
    pub diagnose: bool,
    /// Number of sweep rounds, unlimited when omitted
    #[arg(long)]
    pub rounds: Option<u32>,
    #[arg(long, default_value_t = 100)]
    pub pair_delay_ms: u32,
    #[arg(long, default_value_t = 5000)]
    pub field_settle_ms: u32,
    #[arg(long, default_value_t = 1000)]
    pub card_settle_ms: u32,
    #[arg(long, default_value_t = 100)]
    pub retry_delay_ms: u32,
    /// How long to wait for a reader response
    #[arg(long, default_value_t = 1000)]
    pub response_timeout_ms: u64,
}

impl Args {
    pub fn transport(&self) -> Transport {
        match self.transport {
            TransportKind::Hsu => Transport::Hsu {
                device: self.device.clone(),
                baud: self.baud,
            },
            TransportKind::I2c => Transport::I2c {
                device: self.device.clone(),
            },
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            card_settle_ms: self.card_settle_ms,
            retry_delay_ms: self.retry_delay_ms,
            pair_delay_ms: self.pair_delay_ms,
            field_settle_ms: self.field_settle_ms,
        }
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}
