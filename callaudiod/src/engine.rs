//! Operation Engine (C6): the mode-transition state machine. Each public
//! entry point is a single async function whose `.await` points are exactly
//! the suspension points between a server request and its reply — control
//! returns to the executor until the reply arrives, and step N+1 is issued
//! from step N's reply, so steps are serialized by construction. Returning
//! `Result<()>` exactly once from these functions means the completion is
//! invoked exactly once by construction: an async function cannot return
//! twice, so the compiler enforces it rather than discipline.

use std::ffi::CString;

use pulseaudio::protocol::CardInfo;

use crate::{
    config,
    error::{OperationError, Result},
    selector,
    topology::{BackendFlavor, Mode, Topology, TrackedSink},
    transport::Transport,
};

/// A live user request, as delivered by the (out-of-scope) control surface:
/// a kind plus the integer auxiliary value it was constructed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Enter or leave call routing.
    SelectMode(Mode),
    /// Force the loudspeaker on or off.
    EnableSpeaker(bool),
    /// Mute or unmute the microphone.
    MuteMic(bool),
}

/// A parsed user intent, ready to hand off to the engine.
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    /// What to do.
    pub kind: OperationKind,
    /// The raw integer value the intent interface carried; kept alongside
    /// `kind` for logging, since the wire interface is integer-valued even
    /// though the engine only ever matches on `kind`.
    pub value: i32,
}

impl Operation {
    /// Parses a `SelectMode` intent. `value` must be `0` (Default) or `1`
    /// (Call); anything else is a validation failure.
    pub fn select_mode(value: i32) -> Option<Self> {
        let mode = match value {
            0 => Mode::Default,
            1 => Mode::Call,
            _ => return None,
        };
        Some(Self {
            kind: OperationKind::SelectMode(mode),
            value,
        })
    }

    /// Parses an `EnableSpeaker` intent. `value` must be `0` or `1`.
    pub fn enable_speaker(value: i32) -> Option<Self> {
        let enable = match value {
            0 => false,
            1 => true,
            _ => return None,
        };
        Some(Self {
            kind: OperationKind::EnableSpeaker(enable),
            value,
        })
    }

    /// Parses a `MuteMic` intent. `value` must be `0` or `1`.
    pub fn mute_mic(value: i32) -> Option<Self> {
        let mute = match value {
            0 => false,
            1 => true,
            _ => return None,
        };
        Some(Self {
            kind: OperationKind::MuteMic(mute),
            value,
        })
    }
}

/// Runs `op` to completion against `client`, mutating `topology` as steps
/// succeed. This is the engine's single entry point; whoever calls it is
/// the one place a completion handle gets invoked.
pub async fn run<T: Transport>(client: &T, topology: &mut Topology, op: Operation) -> Result<()> {
    log::debug!("engine: running {:?} (value={})", op.kind, op.value);
    match op.kind {
        OperationKind::SelectMode(target) => select_mode(client, topology, target).await,
        OperationKind::EnableSpeaker(enable) => enable_speaker(client, topology, enable).await,
        OperationKind::MuteMic(mute) => mute_mic(client, topology, mute).await,
    }
}

/// The implicit pre-step unmute issued before any `SelectMode` that isn't
/// entering `Call`. Fire-and-forget by construction: it takes a bare index
/// rather than `&Topology`/`&mut Topology`, so a caller can run it without
/// borrowing the topology the main chain is using. `u32` indices can't
/// represent "no source tracked," so callers are expected to skip calling
/// this when no source is tracked rather than issuing it against a sentinel
/// index. See `DESIGN.md` for the full rationale.
pub async fn implicit_unmute<T: Transport>(client: &T, source_index: u32) -> Result<()> {
    let info = client.source_info(source_index).await?;
    if info.muted {
        client.set_source_mute(source_index, false).await?;
    }
    Ok(())
}

async fn select_mode<T: Transport>(client: &T, topology: &mut Topology, target: Mode) -> Result<()> {
    let (card_index, has_voice_profile) = {
        let card = topology.card.as_ref().ok_or(OperationError::NoCard)?;
        (card.index, card.has_voice_profile)
    };

    if has_voice_profile {
        let card = client.card_info(card_index).await?;
        if card.index != card_index {
            return Err(OperationError::NoCard);
        }
        profile_branch(client, topology, &card, target).await
    } else {
        if topology.sink.is_none() {
            return Err(OperationError::NoSink);
        }
        port_only_branch(client, topology, target).await
    }
}

async fn profile_branch<T: Transport>(
    client: &T,
    topology: &mut Topology,
    card: &CardInfo,
    target: Mode,
) -> Result<()> {
    let flavor = topology.backend_flavor();
    let default_profile = profile_name(flavor, Mode::Default);
    let voicecall_profile = profile_name(flavor, Mode::Call);

    let active_is = |name: &str| {
        card.active_profile
            .as_deref()
            .map(|active| active.to_bytes() == name.as_bytes())
            .unwrap_or(false)
    };

    let switch_to = if active_is(voicecall_profile) && target == Mode::Default {
        Some(default_profile)
    } else if active_is(default_profile) && target == Mode::Call {
        Some(voicecall_profile)
    } else {
        None
    };

    let Some(profile) = switch_to else {
        log::debug!("engine: profile already matches target mode, nothing to do");
        return Ok(());
    };

    log::debug!("engine: switching card {} to profile {profile}", card.index);
    client
        .set_card_profile(
            card.index,
            CString::new(profile).expect("profile name has no interior NUL"),
        )
        .await?;

    if let Some(tracked) = topology.card.as_mut() {
        tracked.active_profile = Some(CString::new(profile).expect("profile name has no interior NUL"));
    }

    match flavor {
        BackendFlavor::Native => {
            topology.mode = target;
            Ok(())
        }
        BackendFlavor::Droid => {
            parking_dance(client, topology, target).await?;
            topology.mode = target;
            Ok(())
        }
    }
}

fn profile_name(flavor: BackendFlavor, mode: Mode) -> &'static str {
    match (flavor, mode) {
        (BackendFlavor::Native, Mode::Default) => config::tokens::native::HIFI_VERB,
        (BackendFlavor::Native, Mode::Call) => config::tokens::native::VOICECALL_VERB,
        (BackendFlavor::Droid, Mode::Default) => config::tokens::droid::DEFAULT_PROFILE,
        (BackendFlavor::Droid, Mode::Call) => config::tokens::droid::VOICECALL_PROFILE,
    }
}

async fn port_only_branch<T: Transport>(client: &T, topology: &mut Topology, target: Mode) -> Result<()> {
    let sink_index = topology.sink.as_ref().ok_or(OperationError::NoSink)?.index;
    fetch_sink(client, topology, sink_index).await?;
    output_port_step(client, topology, OutputIntent::SelectMode(target)).await
}

async fn parking_dance<T: Transport>(client: &T, topology: &mut Topology, target: Mode) -> Result<()> {
    let sink_index = topology.sink.as_ref().ok_or(OperationError::NoSink)?.index;
    log::debug!("engine: parking sink {sink_index}");
    client
        .set_sink_port(sink_index, CString::new(config::tokens::droid::OUTPUT_PARKING).unwrap())
        .await?;
    if let Some(sink) = topology.sink.as_mut() {
        sink.active_port = Some(CString::new(config::tokens::droid::OUTPUT_PARKING).unwrap());
    }

    let source_index = topology.source.as_ref().ok_or(OperationError::NoSource)?.index;
    log::debug!("engine: parking source {source_index}");
    client
        .set_source_port(source_index, CString::new(config::tokens::droid::INPUT_PARKING).unwrap())
        .await?;
    if let Some(source) = topology.source.as_mut() {
        source.active_port = Some(CString::new(config::tokens::droid::INPUT_PARKING).unwrap());
    }

    fetch_sink(client, topology, sink_index).await?;
    output_port_step(client, topology, OutputIntent::SelectMode(target)).await
}

/// Which target the output step should compute, one variant per call site
/// that needs one.
#[derive(Debug, Clone, Copy)]
enum OutputIntent {
    SelectMode(Mode),
    EnableSpeakerOn,
    EnableSpeakerOff,
}

fn output_target(sink: &TrackedSink, intent: OutputIntent) -> Option<String> {
    match intent {
        OutputIntent::SelectMode(Mode::Call) => {
            selector::select_output_port(&sink.ports, sink.speaker_port.as_deref(), sink.flavor)
        }
        OutputIntent::SelectMode(Mode::Default) => {
            selector::select_output_port(&sink.ports, None, sink.flavor)
        }
        OutputIntent::EnableSpeakerOn => sink
            .speaker_port
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
        OutputIntent::EnableSpeakerOff => {
            selector::select_output_port(&sink.ports, sink.speaker_port.as_deref(), sink.flavor)
        }
    }
}

/// On droid, chains into [`input_port_step`]; on native, finalizes. This is
/// unconditional on `OutputIntent`: every call site (profile-branch parking,
/// port-only branch, `EnableSpeaker`) goes through the same continuation
/// rule rather than re-deriving it per caller.
async fn output_port_step<T: Transport>(
    client: &T,
    topology: &mut Topology,
    intent: OutputIntent,
) -> Result<()> {
    let (sink_index, flavor, target, active) = {
        let sink = topology.sink.as_ref().ok_or(OperationError::NoSink)?;
        (sink.index, sink.flavor, output_target(sink, intent), sink.active_port.clone())
    };

    let needs_request = port_change_needed(target.as_deref(), active.as_deref());

    if needs_request {
        match target {
            Some(name) => {
                let target_name =
                    CString::new(name).expect("selected port name has no interior NUL");
                log::debug!("engine: setting sink {sink_index} port to {target_name:?}");
                client.set_sink_port(sink_index, target_name.clone()).await?;
                if let Some(sink) = topology.sink.as_mut() {
                    sink.active_port = Some(target_name);
                }
            }
            None => {
                // The selector already logged a warning; there's nothing to request.
            }
        }
    }

    match flavor {
        BackendFlavor::Native => Ok(()),
        BackendFlavor::Droid => input_port_step(client, topology).await,
    }
}

async fn input_port_step<T: Transport>(client: &T, topology: &mut Topology) -> Result<()> {
    let (source_index, target, active) = {
        let source = topology.source.as_ref().ok_or(OperationError::NoSource)?;
        let target = selector::select_input_port(&source.ports, None, source.flavor);
        (source.index, target, source.active_port.clone())
    };

    let needs_request = port_change_needed(target.as_deref(), active.as_deref());

    if needs_request {
        if let Some(name) = target {
            let target_name = CString::new(name).expect("selected port name has no interior NUL");
            log::debug!("engine: setting source {source_index} port to {target_name:?}");
            client.set_source_port(source_index, target_name.clone()).await?;
            if let Some(source) = topology.source.as_mut() {
                source.active_port = Some(target_name);
            }
        }
    }

    Ok(())
}

fn port_change_needed(target: Option<&str>, active: Option<&std::ffi::CStr>) -> bool {
    match (target, active) {
        (Some(t), Some(a)) => t.as_bytes() != a.to_bytes(),
        (Some(_), None) => true,
        (None, _) => false,
    }
}

async fn enable_speaker<T: Transport>(client: &T, topology: &mut Topology, enable: bool) -> Result<()> {
    let sink_index = topology.sink.as_ref().ok_or(OperationError::NoSink)?.index;
    fetch_sink(client, topology, sink_index).await?;
    let intent = if enable {
        OutputIntent::EnableSpeakerOn
    } else {
        OutputIntent::EnableSpeakerOff
    };
    output_port_step(client, topology, intent).await
}

async fn mute_mic<T: Transport>(client: &T, topology: &mut Topology, mute: bool) -> Result<()> {
    let source_index = topology.source.as_ref().ok_or(OperationError::NoSource)?.index;
    let info = client.source_info(source_index).await?;

    if info.muted != mute {
        log::debug!("engine: setting source {source_index} mute to {mute}");
        client.set_source_mute(source_index, mute).await?;
    }

    if let Some(source) = topology.source.as_mut() {
        source.muted = mute;
    }

    Ok(())
}

/// Fetches sink `index` fresh and reconciles it into `topology`, guarding
/// that it still belongs to the tracked card when one is tracked.
/// `EnableSpeaker` only requires a tracked sink (§4.5), so this guard is a
/// no-op rather than a rejection when no card is tracked at all.
async fn fetch_sink<T: Transport>(client: &T, topology: &mut Topology, index: u32) -> Result<()> {
    let info = client.sink_info(index).await?;
    if let Some(card) = topology.card.as_ref() {
        if info.card_index != Some(card.index) {
            return Err(OperationError::NoSink);
        }
    }
    topology.sink = Some(crate::discovery::build_tracked_sink(&info));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, ffi::CString};

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use pulseaudio::protocol::{CardInfo, PortAvailable, SinkInfo, SourceInfo};

    use super::*;
    use crate::topology::{Ports, TrackedCard, TrackedSource};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Recorded {
        CardInfo(u32),
        SinkInfo(u32),
        SourceInfo(u32),
        SetCardProfile(u32, String),
        SetSinkPort(u32, String),
        SetSourcePort(u32, String),
        SetSourceMute(u32, bool),
    }

    #[derive(Default)]
    struct MockTransport {
        calls: RefCell<Vec<Recorded>>,
        card: RefCell<Option<CardInfo>>,
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
            Ok(self.card.borrow().clone().into_iter().collect())
        }

        async fn list_modules(&self) -> pulseaudio::client::Result<Vec<pulseaudio::protocol::ModuleInfo>> {
            Ok(vec![])
        }

        async fn list_sinks(&self) -> pulseaudio::client::Result<Vec<SinkInfo>> {
            Ok(self.sink.borrow().clone().into_iter().collect())
        }

        async fn list_sources(&self) -> pulseaudio::client::Result<Vec<SourceInfo>> {
            Ok(self.source.borrow().clone().into_iter().collect())
        }

        async fn unload_module(&self, _index: u32) -> pulseaudio::client::Result<()> {
            Ok(())
        }

        async fn card_info(&self, index: u32) -> pulseaudio::client::Result<CardInfo> {
            self.calls.borrow_mut().push(Recorded::CardInfo(index));
            Ok(self.card.borrow().clone().unwrap())
        }

        async fn sink_info(&self, index: u32) -> pulseaudio::client::Result<SinkInfo> {
            self.calls.borrow_mut().push(Recorded::SinkInfo(index));
            Ok(self.sink.borrow().clone().unwrap())
        }

        async fn source_info(&self, index: u32) -> pulseaudio::client::Result<SourceInfo> {
            self.calls.borrow_mut().push(Recorded::SourceInfo(index));
            Ok(self.source.borrow().clone().unwrap())
        }

        async fn set_card_profile(
            &self,
            card_index: u32,
            profile_name: CString,
        ) -> pulseaudio::client::Result<()> {
            self.calls.borrow_mut().push(Recorded::SetCardProfile(
                card_index,
                profile_name.to_string_lossy().into_owned(),
            ));
            if let Some(card) = self.card.borrow_mut().as_mut() {
                card.active_profile = Some(profile_name);
            }
            Ok(())
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

        async fn set_source_mute(
            &self,
            source_index: u32,
            mute: bool,
        ) -> pulseaudio::client::Result<()> {
            self.calls
                .borrow_mut()
                .push(Recorded::SetSourceMute(source_index, mute));
            if let Some(source) = self.source.borrow_mut().as_mut() {
                source.muted = mute;
            }
            Ok(())
        }
    }

    fn port_info(
        name: &str,
        priority: u32,
        available: PortAvailable,
    ) -> pulseaudio::protocol::PortInfo {
        pulseaudio::protocol::PortInfo {
            name: CString::new(name).unwrap(),
            port_type: Default::default(),
            description: None,
            dir: pulseaudio::protocol::port_info::PortDirection::Output,
            priority,
            available,
            availability_group: None,
        }
    }

    fn card_profile(name: &str, num_sinks: u32, num_sources: u32) -> pulseaudio::protocol::CardProfileInfo {
        pulseaudio::protocol::CardProfileInfo {
            name: CString::new(name).unwrap(),
            description: None,
            priority: 0,
            available: 1,
            num_sinks,
            num_sources,
        }
    }

    fn native_card(active_profile: &str) -> CardInfo {
        CardInfo {
            index: 0,
            name: CString::new("card0").unwrap(),
            props: Default::default(),
            owner_module_index: None,
            driver: None,
            ports: vec![],
            profiles: vec![card_profile("HiFi", 1, 0), card_profile("Voicecall", 1, 1)],
            active_profile: Some(CString::new(active_profile).unwrap()),
        }
    }

    fn native_sink(ports: Vec<pulseaudio::protocol::PortInfo>, active_port: usize) -> SinkInfo {
        SinkInfo {
            index: 1,
            name: CString::new("sink").unwrap(),
            card_index: Some(0),
            ports,
            active_port,
            ..Default::default()
        }
    }

    fn native_source(muted: bool) -> SourceInfo {
        SourceInfo {
            index: 2,
            name: CString::new("source").unwrap(),
            card_index: Some(0),
            muted,
            ..Default::default()
        }
    }

    fn tracked_card(has_voice_profile: bool, active_profile: &str) -> TrackedCard {
        TrackedCard {
            index: 0,
            name: CString::new("card0").unwrap(),
            active_profile: Some(CString::new(active_profile).unwrap()),
            profiles: vec![CString::new("HiFi").unwrap(), CString::new("Voicecall").unwrap()],
            has_voice_profile,
        }
    }

    fn run_sync<F: std::future::Future>(fut: F) -> F::Output {
        futures::executor::block_on(fut)
    }

    /// Scenario 1: native card, voice profile present, HiFi → Call.
    #[test]
    fn scenario_native_voice_profile_select_call() {
        let mock = MockTransport::default();
        *mock.card.borrow_mut() = Some(native_card("HiFi"));

        let mut topology = Topology::new();
        topology.install_card(tracked_card(true, "HiFi"));

        let result = run_sync(select_mode(&mock, &mut topology, Mode::Call));

        assert!(result.is_ok());
        assert_eq!(
            mock.calls(),
            vec![
                Recorded::CardInfo(0),
                Recorded::SetCardProfile(0, "Voicecall".into()),
            ]
        );
        assert_eq!(topology.mode, Mode::Call);
    }

    /// Scenario 2: native card, no voice profile, highest-priority port
    /// excluding speaker wins.
    #[test]
    fn scenario_native_no_voice_profile_picks_highest_priority_excluding_speaker() {
        let mock = MockTransport::default();
        let ports = vec![
            port_info("earpiece", 50, PortAvailable::Yes),
            port_info("speaker", 60, PortAvailable::Yes),
            port_info("headphones", 80, PortAvailable::Yes),
        ];
        *mock.sink.borrow_mut() = Some(native_sink(ports.clone(), 0));

        let mut topology = Topology::new();
        topology.install_card(tracked_card(false, "HiFi"));
        topology.install_sink(crate::discovery::build_tracked_sink(&native_sink(ports, 0)));

        let result = run_sync(select_mode(&mock, &mut topology, Mode::Call));

        assert!(result.is_ok());
        assert_eq!(
            mock.calls(),
            vec![Recorded::SinkInfo(1), Recorded::SetSinkPort(1, "headphones".into())]
        );
    }

    /// Scenario 3: EnableSpeaker(true) selects the speaker verbatim, then
    /// EnableSpeaker(false) falls back to the highest-priority non-speaker port.
    #[test]
    fn scenario_enable_speaker_toggle() {
        let mock = MockTransport::default();
        let ports = vec![
            port_info("earpiece", 50, PortAvailable::Yes),
            port_info("speaker", 60, PortAvailable::Yes),
            port_info("headphones", 80, PortAvailable::Yes),
        ];
        *mock.sink.borrow_mut() = Some(native_sink(ports.clone(), 0));

        let mut topology = Topology::new();
        topology.install_sink(crate::discovery::build_tracked_sink(&native_sink(ports, 0)));

        run_sync(enable_speaker(&mock, &mut topology, true)).unwrap();
        assert_eq!(
            mock.calls().last(),
            Some(&Recorded::SetSinkPort(1, "speaker".into()))
        );

        run_sync(enable_speaker(&mock, &mut topology, false)).unwrap();
        assert_eq!(
            mock.calls().last(),
            Some(&Recorded::SetSinkPort(1, "headphones".into()))
        );
    }

    /// Scenario 4: droid card, default → call runs the full parking dance.
    #[test]
    fn scenario_droid_parking_dance() {
        let mock = MockTransport::default();
        mock.card.borrow_mut().replace(CardInfo {
            index: 0,
            name: CString::new("card0").unwrap(),
            props: Default::default(),
            owner_module_index: None,
            driver: None,
            ports: vec![],
            profiles: vec![card_profile("default", 1, 0), card_profile("voicecall", 1, 1)],
            active_profile: Some(CString::new("default").unwrap()),
        });

        let sink_ports = vec![
            port_info("output-speaker", 0, PortAvailable::Yes),
            port_info("output-earpiece", 0, PortAvailable::Yes),
            port_info("output-wired_headset", 0, PortAvailable::Yes),
        ];
        *mock.sink.borrow_mut() = Some(native_sink(sink_ports, 0));

        let mut source = native_source(false);
        source.ports = vec![port_info("input-builtin_mic", 0, PortAvailable::Yes)];
        *mock.source.borrow_mut() = Some(source.clone());

        let mut topology = Topology::new();
        topology.install_card(TrackedCard {
            index: 0,
            name: CString::new("card0").unwrap(),
            active_profile: Some(CString::new("default").unwrap()),
            profiles: vec![CString::new("default").unwrap(), CString::new("voicecall").unwrap()],
            has_voice_profile: true,
        });
        topology.install_sink(crate::discovery::build_tracked_sink(
            mock.sink.borrow().as_ref().unwrap(),
        ));
        topology.install_source(crate::discovery::build_tracked_source(&source));

        let result = run_sync(select_mode(&mock, &mut topology, Mode::Call));

        assert!(result.is_ok());
        let calls = mock.calls();
        assert_eq!(calls[0], Recorded::CardInfo(0));
        assert_eq!(calls[1], Recorded::SetCardProfile(0, "voicecall".into()));
        assert_eq!(calls[2], Recorded::SetSinkPort(1, "output-parking".into()));
        assert_eq!(calls[3], Recorded::SetSourcePort(2, "input-parking".into()));
        assert_eq!(calls[4], Recorded::SinkInfo(1));
        assert_eq!(calls[5], Recorded::SetSinkPort(1, "output-wired_headset".into()));
        assert_eq!(calls[6], Recorded::SetSourcePort(2, "input-builtin_mic".into()));
        assert_eq!(topology.mode, Mode::Call);
    }

    /// Scenario 5: MuteMic idempotence — the second call is a no-op.
    #[test]
    fn scenario_mute_mic_idempotent() {
        let mock = MockTransport::default();
        *mock.source.borrow_mut() = Some(native_source(false));

        let mut topology = Topology::new();
        topology.install_source(TrackedSource {
            index: 2,
            card_index: Some(0),
            name: CString::new("source").unwrap(),
            active_port: None,
            ports: Ports::default(),
            flavor: BackendFlavor::Native,
            muted: false,
        });

        run_sync(mute_mic(&mock, &mut topology, true)).unwrap();
        assert_eq!(
            mock.calls(),
            vec![Recorded::SourceInfo(2), Recorded::SetSourceMute(2, true)]
        );

        run_sync(mute_mic(&mock, &mut topology, true)).unwrap();
        assert_eq!(
            mock.calls(),
            vec![
                Recorded::SourceInfo(2),
                Recorded::SetSourceMute(2, true),
                Recorded::SourceInfo(2),
            ]
        );
    }

    #[test]
    fn select_mode_without_card_fails_synchronously() {
        let mock = MockTransport::default();
        let mut topology = Topology::new();
        let result = run_sync(select_mode(&mock, &mut topology, Mode::Call));
        assert_matches!(result, Err(OperationError::NoCard));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn enable_speaker_without_sink_fails_synchronously() {
        let mock = MockTransport::default();
        let mut topology = Topology::new();
        let result = run_sync(enable_speaker(&mock, &mut topology, true));
        assert_matches!(result, Err(OperationError::NoSink));
    }

    #[test]
    fn port_change_needed_matches_active_target() {
        let name = CString::new("headphones").unwrap();
        assert!(!port_change_needed(Some("headphones"), Some(&name)));
        assert!(port_change_needed(Some("speaker"), Some(&name)));
        assert!(port_change_needed(Some("speaker"), None));
        assert!(!port_change_needed(None, Some(&name)));
    }
}
