//! Event Reactor (C4): reconciles the topology against subscription
//! notifications and re-runs the Port Selector (C5) on availability changes.
//!
//! Dispatch is by facility (§4.4): sink/source `New`/`Removed` drive
//! tracking, card `Changed` drives port reconciliation. Everything else is
//! ignored — in particular, sink/source availability is only ever learned
//! from card-change events, never from sink/source events directly.

use std::ffi::CString;

use pulseaudio::protocol::{SubscriptionEvent, SubscriptionEventFacility, SubscriptionEventType};

use crate::{
    discovery,
    error::Result,
    selector,
    topology::{BackendFlavor, Topology},
    transport::Transport,
};

/// Handles one subscription event, mutating `topology` and issuing whatever
/// corrective server requests the event implies.
pub async fn handle_event<T: Transport>(
    client: &T,
    topology: &mut Topology,
    event: SubscriptionEvent,
) -> Result<()> {
    match event.event_facility {
        SubscriptionEventFacility::Sink => handle_sink_event(client, topology, event).await,
        SubscriptionEventFacility::Source => handle_source_event(client, topology, event).await,
        SubscriptionEventFacility::Card => handle_card_event(client, topology, event).await,
        _ => Ok(()),
    }
}

async fn handle_sink_event<T: Transport>(
    client: &T,
    topology: &mut Topology,
    event: SubscriptionEvent,
) -> Result<()> {
    let Some(index) = event.index else {
        return Ok(());
    };

    match event.event_type {
        SubscriptionEventType::Removed => {
            if topology.drop_sink(index) {
                log::info!("reactor: sink {index} removed");
            }
            Ok(())
        }
        SubscriptionEventType::New => {
            if topology.sink.is_some() {
                return Ok(());
            }
            let info = client.sink_info(index).await?;
            let tracked_card_index = topology.card.as_ref().map(|c| c.index);
            if discovery::accept_device(&info.props, info.card_index, tracked_card_index) {
                log::info!("reactor: tracking new sink {} ({:?})", info.index, info.name);
                topology.install_sink(discovery::build_tracked_sink(&info));
                discovery::select_initial_output_port(client, topology).await?;
            }
            Ok(())
        }
        SubscriptionEventType::Changed => Ok(()),
    }
}

async fn handle_source_event<T: Transport>(
    client: &T,
    topology: &mut Topology,
    event: SubscriptionEvent,
) -> Result<()> {
    let Some(index) = event.index else {
        return Ok(());
    };

    match event.event_type {
        SubscriptionEventType::Removed => {
            if topology.drop_source(index) {
                log::info!("reactor: source {index} removed");
            }
            Ok(())
        }
        SubscriptionEventType::New => {
            if topology.source.is_some() {
                return Ok(());
            }
            let info = client.source_info(index).await?;
            let tracked_card_index = topology.card.as_ref().map(|c| c.index);
            if discovery::accept_device(&info.props, info.card_index, tracked_card_index) {
                log::info!("reactor: tracking new source {} ({:?})", info.index, info.name);
                topology.install_source(discovery::build_tracked_source(&info));
                discovery::select_initial_input_port(client, topology).await?;
            }
            Ok(())
        }
        SubscriptionEventType::Changed => Ok(()),
    }
}

async fn handle_card_event<T: Transport>(
    client: &T,
    topology: &mut Topology,
    event: SubscriptionEvent,
) -> Result<()> {
    if event.event_type != SubscriptionEventType::Changed {
        return Ok(());
    }
    let Some(index) = event.index else {
        return Ok(());
    };
    if topology.card.as_ref().map(|c| c.index) != Some(index) {
        return Ok(());
    }

    reconcile_sink_ports(client, topology).await?;
    reconcile_source_ports(client, topology).await?;
    Ok(())
}

/// Droid back-ends never reconcile ports off a card change: routing there
/// is driven exclusively by explicit mode transitions (§4.4).
async fn reconcile_sink_ports<T: Transport>(client: &T, topology: &mut Topology) -> Result<()> {
    let sink_index = match &topology.sink {
        Some(sink) if sink.flavor == BackendFlavor::Native => sink.index,
        _ => return Ok(()),
    };

    let info = client.sink_info(sink_index).await?;
    let card_index = topology.card.as_ref().map(|c| c.index);
    if info.card_index != card_index {
        return Ok(());
    }

    let mut changed = false;
    {
        let sink = topology.sink.as_mut().expect("checked above");
        for port in &info.ports {
            if sink.ports.update_availability(&port.name, port.available) {
                changed = true;
            }
        }
    }
    if !changed {
        return Ok(());
    }

    let (index, target) = {
        let sink = topology.sink.as_ref().expect("checked above");
        (sink.index, selector::select_output_port(&sink.ports, None, sink.flavor))
    };

    if let Some(name) = target {
        let target_name = CString::new(name).expect("selected port name has no interior NUL");
        log::debug!("reactor: reconciling sink {index} port to {target_name:?}");
        client.set_sink_port(index, target_name.clone()).await?;
        topology.sink.as_mut().expect("checked above").active_port = Some(target_name);
    }

    Ok(())
}

async fn reconcile_source_ports<T: Transport>(client: &T, topology: &mut Topology) -> Result<()> {
    let source_index = match &topology.source {
        Some(source) if source.flavor == BackendFlavor::Native => source.index,
        _ => return Ok(()),
    };

    let info = client.source_info(source_index).await?;
    let card_index = topology.card.as_ref().map(|c| c.index);
    if info.card_index != card_index {
        return Ok(());
    }

    let mut changed = false;
    {
        let source = topology.source.as_mut().expect("checked above");
        for port in &info.ports {
            if source.ports.update_availability(&port.name, port.available) {
                changed = true;
            }
        }
    }
    if !changed {
        return Ok(());
    }

    let (index, target) = {
        let source = topology.source.as_ref().expect("checked above");
        (source.index, selector::select_input_port(&source.ports, None, source.flavor))
    };

    if let Some(name) = target {
        let target_name = CString::new(name).expect("selected port name has no interior NUL");
        log::debug!("reactor: reconciling source {index} port to {target_name:?}");
        client.set_source_port(index, target_name.clone()).await?;
        topology.source.as_mut().expect("checked above").active_port = Some(target_name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use pulseaudio::protocol::{CardInfo, ModuleInfo, PortAvailable, PortInfo, SinkInfo, SourceInfo};

    use super::*;
    use crate::topology::{Ports, TrackedSink};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Recorded {
        SinkInfo(u32),
        SourceInfo(u32),
        SetSinkPort(u32, String),
        SetSourcePort(u32, String),
    }

    #[derive(Default)]
    struct MockTransport {
        calls: RefCell<Vec<Recorded>>,
        sink: RefCell<Option<SinkInfo>>,
        source: RefCell<Option<SourceInfo>>,
    }

    impl MockTransport {
        fn calls(&self) -> Vec<Recorded> {
            self.calls.borrow().clone()
        }
    }

    #[async_trait(?Send)]
    impl Transport for MockTransport {
        async fn list_cards(&self) -> pulseaudio::client::Result<Vec<CardInfo>> {
            Ok(vec![])
        }
        async fn list_modules(&self) -> pulseaudio::client::Result<Vec<ModuleInfo>> {
            Ok(vec![])
        }
        async fn list_sinks(&self) -> pulseaudio::client::Result<Vec<SinkInfo>> {
            Ok(self.sink.borrow().clone().into_iter().collect())
        }
        async fn list_sources(&self) -> pulseaudio::client::Result<Vec<SourceInfo>> {
            Ok(self.source.borrow().clone().into_iter().collect())
        }
        async fn card_info(&self, _index: u32) -> pulseaudio::client::Result<CardInfo> {
            unimplemented!("not exercised by reactor tests")
        }
        async fn sink_info(&self, index: u32) -> pulseaudio::client::Result<SinkInfo> {
            self.calls.borrow_mut().push(Recorded::SinkInfo(index));
            Ok(self.sink.borrow().clone().unwrap())
        }
        async fn source_info(&self, index: u32) -> pulseaudio::client::Result<SourceInfo> {
            self.calls.borrow_mut().push(Recorded::SourceInfo(index));
            Ok(self.source.borrow().clone().unwrap())
        }
        async fn unload_module(&self, _index: u32) -> pulseaudio::client::Result<()> {
            Ok(())
        }
        async fn set_card_profile(
            &self,
            _card_index: u32,
            _profile_name: CString,
        ) -> pulseaudio::client::Result<()> {
            unimplemented!("not exercised by reactor tests")
        }
        async fn set_sink_port(
            &self,
            sink_index: u32,
            port_name: CString,
        ) -> pulseaudio::client::Result<()> {
            self.calls.borrow_mut().push(Recorded::SetSinkPort(
                sink_index,
                port_name.to_string_lossy().into_owned(),
            ));
            if let Some(sink) = self.sink.borrow_mut().as_mut() {
                sink.active_port = sink
                    .ports
                    .iter()
                    .position(|p| p.name == port_name)
                    .unwrap_or(sink.active_port);
            }
            Ok(())
        }
        async fn set_source_port(
            &self,
            source_index: u32,
            port_name: CString,
        ) -> pulseaudio::client::Result<()> {
            self.calls.borrow_mut().push(Recorded::SetSourcePort(
                source_index,
                port_name.to_string_lossy().into_owned(),
            ));
            if let Some(source) = self.source.borrow_mut().as_mut() {
                source.active_port = source
                    .ports
                    .iter()
                    .position(|p| p.name == port_name)
                    .unwrap_or(source.active_port);
            }
            Ok(())
        }
        async fn set_source_mute(&self, _source_index: u32, _mute: bool) -> pulseaudio::client::Result<()> {
            unimplemented!("not exercised by reactor tests")
        }
    }

    fn port(name: &str, priority: u32, available: PortAvailable) -> PortInfo {
        PortInfo {
            name: CString::new(name).unwrap(),
            port_type: Default::default(),
            description: None,
            dir: pulseaudio::protocol::port_info::PortDirection::Output,
            priority,
            available,
            availability_group: None,
        }
    }

    fn event(facility: SubscriptionEventFacility, kind: SubscriptionEventType, index: u32) -> SubscriptionEvent {
        SubscriptionEvent {
            event_facility: facility,
            event_type: kind,
            index: Some(index),
        }
    }

    fn run_sync<F: std::future::Future>(fut: F) -> F::Output {
        futures::executor::block_on(fut)
    }

    #[test]
    fn sink_removed_event_drops_matching_tracked_sink() {
        let mock = MockTransport::default();
        let mut topology = Topology::new();
        topology.install_sink(TrackedSink {
            index: 1,
            card_index: Some(0),
            name: CString::new("sink").unwrap(),
            active_port: None,
            ports: Ports::default(),
            flavor: BackendFlavor::Native,
            speaker_port: None,
        });

        let ev = event(SubscriptionEventFacility::Sink, SubscriptionEventType::Removed, 1);
        run_sync(handle_event(&mock, &mut topology, ev)).unwrap();

        assert!(topology.sink.is_none());
    }

    #[test]
    fn card_change_reconciles_native_sink_on_availability_change() {
        let mock = MockTransport::default();
        let initial_ports = vec![
            port("earpiece", 50, PortAvailable::Yes),
            port("headphones", 80, PortAvailable::No),
        ];
        let mut topology = Topology::new();
        topology.install_card(crate::topology::TrackedCard {
            index: 0,
            name: CString::new("card0").unwrap(),
            active_profile: None,
            profiles: vec![],
            has_voice_profile: false,
        });
        topology.install_sink(crate::discovery::build_tracked_sink(&SinkInfo {
            index: 1,
            name: CString::new("sink").unwrap(),
            card_index: Some(0),
            ports: initial_ports,
            active_port: 0,
            ..Default::default()
        }));

        let refreshed_ports = vec![
            port("earpiece", 50, PortAvailable::Yes),
            port("headphones", 80, PortAvailable::Yes),
        ];
        *mock.sink.borrow_mut() = Some(SinkInfo {
            index: 1,
            name: CString::new("sink").unwrap(),
            card_index: Some(0),
            ports: refreshed_ports,
            active_port: 0,
            ..Default::default()
        });

        let ev = event(SubscriptionEventFacility::Card, SubscriptionEventType::Changed, 0);
        run_sync(handle_event(&mock, &mut topology, ev)).unwrap();

        assert_eq!(
            mock.calls(),
            vec![Recorded::SinkInfo(1), Recorded::SetSinkPort(1, "headphones".into())]
        );
    }

    #[test]
    fn card_change_does_not_touch_droid_sink_ports() {
        let mock = MockTransport::default();
        let mut topology = Topology::new();
        topology.install_card(crate::topology::TrackedCard {
            index: 0,
            name: CString::new("card0").unwrap(),
            active_profile: None,
            profiles: vec![],
            has_voice_profile: false,
        });
        topology.install_sink(TrackedSink {
            index: 1,
            card_index: Some(0),
            name: CString::new("sink").unwrap(),
            active_port: Some(CString::new("output-speaker").unwrap()),
            ports: Ports::default(),
            flavor: BackendFlavor::Droid,
            speaker_port: Some(CString::new("output-speaker").unwrap()),
        });

        let ev = event(SubscriptionEventFacility::Card, SubscriptionEventType::Changed, 0);
        run_sync(handle_event(&mock, &mut topology, ev)).unwrap();

        assert!(mock.calls().is_empty());
    }

    #[test]
    fn source_new_event_ignored_when_card_does_not_match() {
        let mock = MockTransport::default();
        *mock.source.borrow_mut() = Some(SourceInfo {
            index: 2,
            name: CString::new("source").unwrap(),
            card_index: Some(9),
            ..Default::default()
        });

        let mut topology = Topology::new();
        topology.install_card(crate::topology::TrackedCard {
            index: 0,
            name: CString::new("card0").unwrap(),
            active_profile: None,
            profiles: vec![],
            has_voice_profile: false,
        });

        let ev = event(SubscriptionEventFacility::Source, SubscriptionEventType::New, 2);
        run_sync(handle_event(&mock, &mut topology, ev)).unwrap();

        assert!(topology.source.is_none());
    }
}
