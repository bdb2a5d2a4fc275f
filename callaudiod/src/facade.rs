//! Intent Facade (C7): the three public entry points a control surface
//! would call. None is wired up (§1, §9 "singleton session" — out of
//! scope), but the validate-then-dispatch shape is exactly what one would
//! call into.
//!
//! Each entry point validates its argument, constructs an [`Operation`],
//! and hands off to the engine (C6) against the session's shared topology.
//! Invalid input or absent resources fail synchronously: the engine is
//! never even invoked.

use crate::{engine, session::Session};

/// Selects `Default` (`value == 0`) or `Call` (`value == 1`) routing mode.
/// Returns whether the operation completed successfully.
pub async fn select_mode(session: &Session, value: i32) -> bool {
    let Some(op) = engine::Operation::select_mode(value) else {
        log::warn!("facade: select_mode rejected invalid value {value}");
        return false;
    };
    dispatch(session, op).await
}

/// Forces the loudspeaker on (`value == 1`) or off (`value == 0`).
pub async fn enable_speaker(session: &Session, value: i32) -> bool {
    let Some(op) = engine::Operation::enable_speaker(value) else {
        log::warn!("facade: enable_speaker rejected invalid value {value}");
        return false;
    };
    dispatch(session, op).await
}

/// Mutes (`value == 1`) or unmutes (`value == 0`) the microphone.
pub async fn mute_mic(session: &Session, value: i32) -> bool {
    let Some(op) = engine::Operation::mute_mic(value) else {
        log::warn!("facade: mute_mic rejected invalid value {value}");
        return false;
    };
    dispatch(session, op).await
}

async fn dispatch(session: &Session, op: engine::Operation) -> bool {
    // §4.5 step 1: the implicit pre-step unmute runs ahead of any SelectMode
    // that isn't entering Call, against its own auxiliary Operation, and its
    // outcome never gates the main chain below.
    if let engine::OperationKind::SelectMode(mode) = op.kind {
        if mode != crate::topology::Mode::Call {
            let source_index = session.topology.borrow().source.as_ref().map(|s| s.index);
            if let Some(index) = source_index {
                if let Err(err) = engine::implicit_unmute(&session.client, index).await {
                    log::warn!("facade: implicit unmute failed: {err}");
                }
            }
        }
    }

    let mut topology = session.topology.borrow_mut();
    match engine::run(&session.client, &mut topology, op).await {
        Ok(()) => true,
        Err(err) => {
            log::warn!("facade: operation failed: {err}");
            false
        }
    }
}

#[cfg(all(test, feature = "_integration-tests"))]
mod tests {
    use super::*;
    use anyhow::Context as _;
    use futures::executor::block_on;

    fn connected_session() -> anyhow::Result<Session> {
        let (session, _stream) = block_on(Session::connect()).context("connecting to PulseAudio server")?;
        Ok(session)
    }

    #[test_log::test]
    fn invalid_select_mode_value_fails_without_touching_the_server() -> anyhow::Result<()> {
        let session = connected_session()?;
        assert!(!block_on(select_mode(&session, 7)));
        Ok(())
    }

    #[test_log::test]
    fn mute_mic_round_trips_through_a_live_server() -> anyhow::Result<()> {
        let session = connected_session()?;
        assert!(block_on(mute_mic(&session, 1)));
        assert!(block_on(mute_mic(&session, 0)));
        Ok(())
    }
}
