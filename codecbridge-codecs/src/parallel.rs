//! Parallel processing of independent streams.
//!
//! The contract keeps one processing call in flight per session, but
//! distinct streams own disjoint state and may run fully in parallel. The
//! shared pools behind a [`crate::PooledHost`] are the only cross-stream
//! resource and are safe for concurrent acquisition.

use crate::session::VideoSession;
use codecbridge_core::{BufferRef, OwnedBlock, Picture, Result};
use rayon::prelude::*;

/// Decode one batch of input per session, all sessions in parallel.
///
/// `inputs[i]` is fed, in order, to `sessions[i]`; the result vector lines
/// up with the sessions. A session that errors stops consuming its own
/// inputs only.
///
/// # Panics
///
/// Panics if `inputs` and `sessions` differ in length.
pub fn decode_streams(
    sessions: &mut [VideoSession],
    inputs: Vec<Vec<OwnedBlock>>,
) -> Vec<Result<Vec<BufferRef<Picture>>>> {
    assert_eq!(
        sessions.len(),
        inputs.len(),
        "one input batch per session required"
    );

    sessions
        .par_iter_mut()
        .zip(inputs.into_par_iter())
        .map(|(session, batch)| {
            let mut produced = Vec::new();
            for block in batch {
                produced.extend(session.decode(block)?);
            }
            Ok(produced)
        })
        .collect()
}
