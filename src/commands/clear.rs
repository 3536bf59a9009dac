//! Clear command: remove the saved alarm.
//!
//! Only the saved record is removed. A running instance keeps its alarm until it is
//! sent SIGUSR2.

use anyhow::Result;

use crate::state::AlarmStore;

/// Handle `sunrise-alarm clear`.
pub fn handle_clear_command(debug_enabled: bool) -> Result<()> {
    let store = AlarmStore::open_default()?;
    clear_store(&store, debug_enabled)
}

pub fn clear_store(store: &AlarmStore, debug_enabled: bool) -> Result<()> {
    log_version!();
    match store.load()? {
        Some(saved) => {
            store.clear()?;
            log_block_start!(
                "Removed alarm for {}",
                saved.target_time.format("%a %H:%M")
            );
            log_indented!("A running sunrise-alarm keeps its alarm until sent SIGUSR2");
        }
        None => {
            log_block_start!("No alarm set");
        }
    }
    if debug_enabled {
        log_debug!("State file: {}", crate::common::utils::private_path(store.path()));
    }
    log_end!();
    Ok(())
}
