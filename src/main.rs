use anyhow::Context;
use clap::Parser;
use linux_embedded_hal::Delay;
use log::info;

use iso14443a_probe::config::{Args, Transport};
use iso14443a_probe::pn532_link::Pn532Link;
use iso14443a_probe::{PollLoop, PollOutcome, ReaderLink};

fn run<R: ReaderLink>(reader: R, args: &Args) -> anyhow::Result<()> {
    let mut poll_loop = PollLoop::new(reader, Delay, args.settings());

    if args.diagnose {
        return poll_loop
            .run_diagnostics(args.rounds)
            .context("threshold sweep failed");
    }

    match poll_loop.run_until_card().context("card polling failed")? {
        PollOutcome::ClassicBlock { uid, block, .. } => {
            info!("Read block {} of card {}", block, uid)
        }
        PollOutcome::UltralightPage { uid, page, .. } => {
            info!("Read page {} of tag {}", page, uid)
        }
        outcome => {
            if let Some(uid) = outcome.uid() {
                info!("Card {} processed without data", uid);
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let timeout = args.response_timeout();
    match args.transport() {
        Transport::Hsu { device, baud } => {
            let link = Pn532Link::open_hsu(&device, baud, timeout)
                .with_context(|| format!("opening PN532 on {}", device))?;
            run(link, &args)
        }
        Transport::I2c { device } => {
            let link = Pn532Link::open_i2c(&device, timeout)
                .with_context(|| format!("opening PN532 on {}", device))?;
            run(link, &args)
        }
    }
}
