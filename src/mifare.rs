use log::{info, warn};

use crate::link::{KeySlot, ReaderLink};
use crate::picc::{hex, sector_of, AuthKey, BlockData, CardUid, PageData};
use crate::{Error, Result};

/// Authenticate the sector holding `block`, then read that block.
///
/// The read is only issued when the authentication right before it succeeded.
pub fn authenticate_and_read<R: ReaderLink + ?Sized>(
    reader: &mut R,
    uid: &CardUid,
    block: u8,
    slot: KeySlot,
    key: &AuthKey,
) -> Result<BlockData> {
    info!("Trying to authenticate block {} with key {:?}", block, slot);
    match reader.authenticate_block(uid, block, slot, key) {
        Ok(true) => {}
        Ok(false) => {
            warn!("Ooops ... authentication failed: Try another key?");
            return Err(Error::Auth { block });
        }
        Err(e) => {
            warn!("Ooops ... authentication failed ({}): Try another key?", e);
            return Err(Error::Auth { block });
        }
    }

    let sector = sector_of(block);
    info!(
        "Sector {} (Blocks {}..{}) has been authenticated",
        sector,
        sector * 4,
        sector * 4 + 3
    );

    match reader.read_data_block(block) {
        Ok(Some(data)) => {
            info!("Reading Block {}: {}", block, hex(&data));
            Ok(data)
        }
        Ok(None) | Err(_) => {
            warn!("Ooops ... unable to read the requested block. Try another key?");
            Err(Error::Read { block })
        }
    }
}

/// Read one Ultralight page, no authentication involved.
pub fn read_page<R: ReaderLink + ?Sized>(reader: &mut R, page: u8) -> Result<PageData> {
    info!("Reading page {}", page);
    match reader.read_page(page) {
        Ok(Some(data)) => {
            info!("Reading page {}: {}", page, hex(&data));
            Ok(data)
        }
        Ok(None) | Err(_) => {
            warn!("Ooops ... unable to read the requested page!?");
            Err(Error::ReadPage { page })
        }
    }
}
