//! On (re)connect, enumerates cards, modules, sinks and sources, identifies
//! the single internal card and its tracked sink/source, and records
//! back-end flavor and voice-profile presence (C3).

use std::ffi::{CStr, CString};

use pulseaudio::protocol::{CardInfo, Prop, Props, SinkInfo, SourceInfo};

use crate::{
    config,
    error::Result,
    selector,
    topology::{BackendFlavor, Ports, TrackedCard, TrackedSink, TrackedSource},
    transport::Transport,
};

/// Runs discovery against `client`, populating `topology` from scratch.
///
/// Enumerates cards, then modules, then sinks, then sources, in that order.
/// The module unload decision is deferred until after sinks and sources are
/// discovered, since back-end flavor (native vs. droid) is only known once
/// a sink or source has been installed; see `DESIGN.md` for why this
/// doesn't change the observable effect of the unload.
pub async fn run<T: Transport>(client: &T, topology: &mut crate::topology::Topology) -> Result<()> {
    *topology = crate::topology::Topology::new();

    let cards = client.list_cards().await?;
    match cards.iter().find(|c| accept_card(c)) {
        Some(card) => {
            log::info!("discovery: tracking card {} ({:?})", card.index, card.name);
            topology.install_card(build_tracked_card(card));
        }
        None => log::warn!("discovery: no card matched the internal-card filter"),
    }
    let tracked_card_index = topology.card.as_ref().map(|c| c.index);

    let modules = client.list_modules().await?;
    let switch_module_index = modules
        .iter()
        .find(|m| m.name.as_bytes() == config::MODULE_SWITCH_ON_PORT_AVAILABLE.as_bytes())
        .map(|m| m.index);

    let sinks = client.list_sinks().await?;
    if sinks.is_empty() {
        log::error!("discovery: empty sink list payload");
    }
    if let Some(sink) = sinks
        .iter()
        .find(|s| accept_device(&s.props, s.card_index, tracked_card_index))
    {
        log::info!("discovery: tracking sink {} ({:?})", sink.index, sink.name);
        topology.install_sink(build_tracked_sink(sink));
        select_initial_output_port(client, topology).await?;
    }

    let sources = client.list_sources().await?;
    if sources.is_empty() {
        log::error!("discovery: empty source list payload");
    }
    if let Some(source) = sources
        .iter()
        .find(|s| accept_device(&s.props, s.card_index, tracked_card_index))
    {
        log::info!("discovery: tracking source {} ({:?})", source.index, source.name);
        topology.install_source(build_tracked_source(source));
        select_initial_input_port(client, topology).await?;
    }

    let native_backend = topology
        .sink
        .as_ref()
        .map(|s| s.flavor == BackendFlavor::Native)
        .or_else(|| topology.source.as_ref().map(|s| s.flavor == BackendFlavor::Native))
        .unwrap_or(true);

    if let Some(index) = switch_module_index {
        if native_backend {
            log::debug!(
                "discovery: unloading {} (index {index})",
                config::MODULE_SWITCH_ON_PORT_AVAILABLE
            );
            client.unload_module(index).await?;
        } else {
            log::debug!(
                "discovery: droid back-end, leaving {} untouched",
                config::MODULE_SWITCH_ON_PORT_AVAILABLE
            );
        }
    }

    Ok(())
}

/// Selects an initial port on a freshly discovered sink. Also used by the
/// reactor when a sink is (re)tracked after a `New` notification.
pub(crate) async fn select_initial_output_port<T: Transport>(
    client: &T,
    topology: &mut crate::topology::Topology,
) -> Result<()> {
    let (index, target) = {
        let sink = topology.sink.as_ref().expect("just installed");
        (sink.index, selector::select_output_port(&sink.ports, None, sink.flavor))
    };

    if let Some(name) = target {
        let target_name = CString::new(name).expect("selected port name has no interior NUL");
        log::debug!("discovery: selecting initial sink port {target_name:?}");
        client.set_sink_port(index, target_name.clone()).await?;
        topology.sink.as_mut().expect("just installed").active_port = Some(target_name);
    }

    Ok(())
}

/// Selects an initial port on a freshly discovered source. Symmetric with
/// [`select_initial_output_port`].
pub(crate) async fn select_initial_input_port<T: Transport>(
    client: &T,
    topology: &mut crate::topology::Topology,
) -> Result<()> {
    let (index, target) = {
        let source = topology.source.as_ref().expect("just installed");
        (source.index, selector::select_input_port(&source.ports, None, source.flavor))
    };

    if let Some(name) = target {
        let target_name = CString::new(name).expect("selected port name has no interior NUL");
        log::debug!("discovery: selecting initial source port {target_name:?}");
        client.set_source_port(index, target_name.clone()).await?;
        topology.source.as_mut().expect("just installed").active_port = Some(target_name);
    }

    Ok(())
}

fn accept_card(card: &CardInfo) -> bool {
    let bus_path_ok = card
        .props
        .get(Prop::DeviceBusPath)
        .map(|v| v.starts_with(config::CARD_BUS_PATH_PREFIX.as_bytes()))
        .unwrap_or(false);
    let form_factor_ok = prop_eq(&card.props, Prop::DeviceFormFactor, config::CARD_FORM_FACTOR);
    let class_ok = !prop_eq(&card.props, Prop::DeviceClass, config::CARD_CLASS_MODEM);

    bus_path_ok && form_factor_ok && class_ok
}

pub(crate) fn accept_device(props: &Props, card_index: Option<u32>, tracked_card_index: Option<u32>) -> bool {
    prop_eq(props, Prop::DeviceClass, config::DEVICE_CLASS_SOUND)
        && tracked_card_index.is_some()
        && card_index == tracked_card_index
}

/// Compares a property's value, stripping the trailing NUL that property
/// values are conventionally stored with.
fn prop_eq(props: &Props, prop: Prop, expected: &str) -> bool {
    props
        .get(prop)
        .map(|v| v.strip_suffix(&[0]).unwrap_or(v) == expected.as_bytes())
        .unwrap_or(false)
}

pub(crate) fn build_tracked_card(card: &CardInfo) -> TrackedCard {
    let profiles: Vec<CString> = card.profiles.iter().map(|p| p.name.clone()).collect();
    TrackedCard {
        index: card.index,
        name: card.name.clone(),
        active_profile: card.active_profile.clone(),
        has_voice_profile: TrackedCard::detect_has_voice_profile(&profiles),
        profiles,
    }
}

pub(crate) fn build_tracked_sink(sink: &SinkInfo) -> TrackedSink {
    let ports = Ports::from_infos(&sink.ports);
    let flavor = BackendFlavor::from_device_api(device_api(&sink.props));
    let speaker_port = TrackedSink::detect_speaker_port(flavor, &ports);

    TrackedSink {
        index: sink.index,
        card_index: sink.card_index,
        name: sink.name.clone(),
        active_port: sink.ports.get(sink.active_port).map(|p| p.name.clone()),
        ports,
        flavor,
        speaker_port,
    }
}

pub(crate) fn build_tracked_source(source: &SourceInfo) -> TrackedSource {
    let ports = Ports::from_infos(&source.ports);
    let flavor = BackendFlavor::from_device_api(device_api(&source.props));

    TrackedSource {
        index: source.index,
        card_index: source.card_index,
        name: source.name.clone(),
        active_port: source.ports.get(source.active_port).map(|p| p.name.clone()),
        ports,
        flavor,
        muted: source.muted,
    }
}

fn device_api(props: &Props) -> Option<&CStr> {
    props
        .get(Prop::DeviceApi)
        .and_then(|v| CStr::from_bytes_with_nul(v).ok())
}
