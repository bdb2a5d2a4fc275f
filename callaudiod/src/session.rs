//! Server Session (C1): owns the connection to the audio server and the
//! topology it populates, reconnecting on failure.
//!
//! There is no libpulse-style state-change callback here: the teacher's
//! client surfaces connection failure as an `Err` from `Client::from_env`
//! (the `Unconnected`/`Connecting`/`Authorizing`/`Failed` states of §4.1
//! collapse into that single blocking call) or as the subscription stream
//! ending (a lost connection). Both are handled the same way: tear down and
//! reconnect.

use std::{cell::RefCell, ffi::CString, rc::Rc};

use futures::StreamExt as _;

use crate::{config, discovery, error::Result, reactor, topology::Topology};

/// A connected session: the client handle plus the topology it has
/// populated. Cheap to clone — `pulseaudio::Client` is itself a cheap
/// handle to the background reactor thread, and the topology is shared via
/// `Rc<RefCell<_>>` so the facade (C7) can observe and mutate the same
/// state this session's event loop is reconciling.
#[derive(Clone)]
pub struct Session {
    pub(crate) client: pulseaudio::Client,
    pub(crate) topology: Rc<RefCell<Topology>>,
}

impl Session {
    /// Connects, subscribes, and runs discovery once. Corresponds to §4.1's
    /// *Terminated/Ready* transition: install the subscription callback,
    /// then trigger Discovery.
    pub(crate) async fn connect() -> Result<(Self, pulseaudio::client::SubscriptionStream)> {
        log::debug!(
            "session: connecting as {} ({})",
            config::APPLICATION_NAME,
            config::APPLICATION_ID
        );
        let client = pulseaudio::Client::from_env(
            CString::new(config::APPLICATION_NAME).expect("application name has no interior NUL"),
        )?;

        let mut topology = Topology::new();
        discovery::run(&client, &mut topology).await?;

        let stream = client.subscribe(config::SUBSCRIPTION_MASK).await?;

        let session = Self {
            client,
            topology: Rc::new(RefCell::new(topology)),
        };
        Ok((session, stream))
    }

    /// Runs forever: connect, reconcile against subscription events until
    /// the connection is lost, then reconnect after [`config::RECONNECT_DELAY`].
    /// This is the program's only task; the out-of-scope control surface
    /// (§1) would otherwise drive the facade (C7) concurrently over the
    /// same `Session`.
    pub async fn run() {
        loop {
            match Self::connect().await {
                Ok((session, stream)) => {
                    log::info!("session: connected and discovery complete");
                    session.reactor_loop(stream).await;
                    log::warn!("session: connection lost, reconnecting");
                }
                Err(err) => {
                    log::warn!("session: connect failed: {err}");
                }
            }
            std::thread::sleep(config::RECONNECT_DELAY);
        }
    }

    async fn reactor_loop(&self, mut stream: pulseaudio::client::SubscriptionStream) {
        while let Some(event) = stream.next().await {
            let mut topology = self.topology.borrow_mut();
            if let Err(err) = reactor::handle_event(&self.client, &mut topology, event).await {
                log::warn!("reactor: failed to handle event {event:?}: {err}");
            }
        }
    }
}

#[cfg(all(test, feature = "_integration-tests"))]
mod tests {
    use super::*;
    use anyhow::Context as _;
    use futures::executor::block_on;

    #[test_log::test]
    fn connect_runs_discovery_against_a_live_server() -> anyhow::Result<()> {
        let (session, _stream) = block_on(Session::connect()).context("connecting to PulseAudio server")?;
        // The internal card filter may or may not match on any given test
        // rig; this only asserts that discovery ran without error and left
        // the topology in a self-consistent state.
        let topology = session.topology.borrow();
        if let Some(sink) = topology.sink.as_ref() {
            assert_eq!(sink.card_index, topology.card.as_ref().map(|c| c.index));
        }
        Ok(())
    }
}
