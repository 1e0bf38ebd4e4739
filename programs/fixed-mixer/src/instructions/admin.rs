//! Pause / unpause
//!
//! Emergency stop: while paused, deposits, withdrawals and forwards fail
//! with `PoolPaused`. Read accessors keep working.

use tracing::warn;

use crate::crypto::FieldHash;
use crate::error::Result;
use crate::events::PoolStatusEvent;
use crate::state::PoolState;

pub fn pause<H: FieldHash>(pool: &mut PoolState<H>) -> Result<PoolStatusEvent> {
    set_paused(pool, true)
}

pub fn unpause<H: FieldHash>(pool: &mut PoolState<H>) -> Result<PoolStatusEvent> {
    set_paused(pool, false)
}

fn set_paused<H: FieldHash>(pool: &mut PoolState<H>, paused: bool) -> Result<PoolStatusEvent> {
    let sequence = pool.next_sequence()?;
    pool.is_paused = paused;
    pool.sequence = sequence;

    warn!(paused, sequence, "pool status changed");

    Ok(PoolStatusEvent { paused, sequence })
}
