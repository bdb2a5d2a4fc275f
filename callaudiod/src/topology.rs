//! In-memory view of the tracked card, its sink and its source. Pure data
//! holder: nothing in this module performs I/O.

use std::{
    collections::BTreeMap,
    ffi::{CStr, CString},
};

use pulseaudio::protocol::{PortAvailable, PortInfo};

use crate::config;

/// Which hardware back-end a sink or source is routed through, derived from
/// its `device.api` property.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BackendFlavor {
    /// A conventional ALSA/UCM-driven back-end.
    Native,
    /// The Android HAL back-end, which requires the parking-port dance.
    Droid,
}

impl BackendFlavor {
    /// Classifies a `device.api` property value.
    pub fn from_device_api(device_api: Option<&CStr>) -> Self {
        match device_api.map(|s| s.to_bytes()) {
            Some(api) if api == config::DEVICE_API_DROID_HAL.as_bytes() => BackendFlavor::Droid,
            _ => BackendFlavor::Native,
        }
    }
}

/// The last successfully completed [`crate::engine::Operation::SelectMode`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// The non-call routing mode.
    #[default]
    Default,
    /// The voice-call routing mode.
    Call,
}

/// A port known on a sink or source, with its fixed (server-reported) priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    /// The port's name, as reported by the server.
    pub name: CString,
    /// Higher is preferred, used by the native tie-breaking rule.
    pub priority: u32,
}

/// The set of ports on a sink or source, plus the subset whose availability
/// is known (never `Unknown`), used to detect transitions on reconciliation.
#[derive(Debug, Default, Clone)]
pub struct Ports {
    /// All ports, in server-reported order.
    pub all: Vec<Port>,
    known_availability: BTreeMap<CString, bool>,
}

impl Ports {
    /// Builds a port set from a server-reported port list, seeding the
    /// known-availability map from any port not reporting `Unknown`.
    pub fn from_infos(infos: &[PortInfo]) -> Self {
        let mut known_availability = BTreeMap::new();
        let all = infos
            .iter()
            .map(|info| {
                if info.available != PortAvailable::Unknown {
                    known_availability.insert(info.name.clone(), info.available == PortAvailable::Yes);
                }
                Port {
                    name: info.name.clone(),
                    priority: info.priority,
                }
            })
            .collect();

        Self {
            all,
            known_availability,
        }
    }

    /// The last-seen availability of `name`, if known.
    pub fn is_available(&self, name: &CStr) -> Option<bool> {
        self.known_availability.get(name).copied()
    }

    /// Records a fresh availability reading for `name`. Returns `true` if
    /// the known value actually changed (a fresh `Unknown` reading is
    /// ignored and never stored, matching the invariant that the map only
    /// ever holds `Yes`/`No`).
    pub fn update_availability(&mut self, name: &CStr, available: PortAvailable) -> bool {
        match available {
            PortAvailable::Unknown => false,
            PortAvailable::Yes | PortAvailable::No => {
                let value = available == PortAvailable::Yes;
                self.known_availability.get(name) != Some(&value) && {
                    self.known_availability.insert(name.to_owned(), value);
                    true
                }
            }
        }
    }
}

/// The tracked card.
#[derive(Debug, Clone)]
pub struct TrackedCard {
    /// Server-internal card index.
    pub index: u32,
    /// The card's opaque name.
    pub name: CString,
    /// The name of the currently active profile, if any.
    pub active_profile: Option<CString>,
    /// The names of all profiles the card supports.
    pub profiles: Vec<CString>,
    /// Whether any profile name matches the voice-call marker.
    pub has_voice_profile: bool,
}

impl TrackedCard {
    /// Scans `profiles` for the UCM voice-call verb or the droid module's
    /// literal `voicecall` profile name.
    pub fn detect_has_voice_profile(profiles: &[CString]) -> bool {
        profiles.iter().any(|name| {
            let name = name.to_string_lossy();
            name.contains(config::tokens::native::VOICECALL_VERB)
                || name.contains(config::DROID_VOICECALL_MARKER)
        })
    }
}

/// The tracked sink.
#[derive(Debug, Clone)]
pub struct TrackedSink {
    /// Server-internal sink index.
    pub index: u32,
    /// The owning card's index, expected to equal the tracked card.
    pub card_index: Option<u32>,
    /// The sink's name.
    pub name: CString,
    /// The name of the currently active port, if any.
    pub active_port: Option<CString>,
    /// The sink's ports and their known availability.
    pub ports: Ports,
    /// The back-end this sink is routed through.
    pub flavor: BackendFlavor,
    /// The cached name of the port representing the loudspeaker.
    pub speaker_port: Option<CString>,
}

impl TrackedSink {
    /// Computes the loudspeaker port name for a freshly (re)discovered sink:
    /// for droid, the literal `output-speaker`; for native, the first port
    /// whose name contains the UCM speaker device token.
    pub fn detect_speaker_port(flavor: BackendFlavor, ports: &Ports) -> Option<CString> {
        match flavor {
            BackendFlavor::Droid => ports
                .all
                .iter()
                .find(|p| p.name.as_c_str().to_bytes() == config::tokens::droid::OUTPUT_SPEAKER.as_bytes())
                .map(|p| p.name.clone()),
            BackendFlavor::Native => ports
                .all
                .iter()
                .find(|p| {
                    p.name
                        .to_string_lossy()
                        .contains(config::tokens::native::SPEAKER_DEVICE_TOKEN)
                })
                .map(|p| p.name.clone()),
        }
    }
}

/// The tracked source.
#[derive(Debug, Clone)]
pub struct TrackedSource {
    /// Server-internal source index.
    pub index: u32,
    /// The owning card's index, expected to equal the tracked card.
    pub card_index: Option<u32>,
    /// The source's name.
    pub name: CString,
    /// The name of the currently active port, if any.
    pub active_port: Option<CString>,
    /// The source's ports and their known availability.
    pub ports: Ports,
    /// The back-end this source is routed through.
    pub flavor: BackendFlavor,
    /// Whether the source currently reports itself as muted.
    pub muted: bool,
}

/// The in-memory routing topology: at most one card, one sink, and one
/// source tracked at a time, plus the last successfully selected mode.
#[derive(Debug, Default)]
pub struct Topology {
    /// The tracked card, if the internal-card filter has matched one.
    pub card: Option<TrackedCard>,
    /// The tracked sink, if the sink filter has matched one.
    pub sink: Option<TrackedSink>,
    /// The tracked source, if the source filter has matched one.
    pub source: Option<TrackedSource>,
    /// The last successfully completed mode selection.
    pub mode: Mode,
}

impl Topology {
    /// Creates an empty topology, as after a fresh connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs or replaces the tracked card.
    pub fn install_card(&mut self, card: TrackedCard) {
        self.card = Some(card);
    }

    /// Installs the tracked sink. Callers are responsible for only calling
    /// this when no sink is yet tracked, per the sink filter in discovery.
    pub fn install_sink(&mut self, sink: TrackedSink) {
        self.sink = Some(sink);
    }

    /// Installs the tracked source. See [`Topology::install_sink`].
    pub fn install_source(&mut self, source: TrackedSource) {
        self.source = Some(source);
    }

    /// Drops the tracked sink if `index` matches it. Returns whether it was
    /// dropped.
    pub fn drop_sink(&mut self, index: u32) -> bool {
        if self.sink.as_ref().is_some_and(|s| s.index == index) {
            self.sink = None;
            true
        } else {
            false
        }
    }

    /// Drops the tracked source if `index` matches it. Returns whether it
    /// was dropped.
    pub fn drop_source(&mut self, index: u32) -> bool {
        if self.source.as_ref().is_some_and(|s| s.index == index) {
            self.source = None;
            true
        } else {
            false
        }
    }

    /// The back-end flavor governing profile-name and parking-dance choices
    /// for the tracked card, taken from whichever of the sink/source is
    /// currently tracked (they are tagged independently but in practice
    /// share one physical back-end). Defaults to `Native` if neither is
    /// tracked, since the profile branch only runs when a card is tracked
    /// and native is the common case.
    pub fn backend_flavor(&self) -> BackendFlavor {
        self.sink
            .as_ref()
            .map(|s| s.flavor)
            .or_else(|| self.source.as_ref().map(|s| s.flavor))
            .unwrap_or(BackendFlavor::Native)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn ports_seed_known_availability_skips_unknown() {
        let infos = vec![
            port("output-speaker", 10, PortAvailable::Yes),
            port("output-earpiece", 20, PortAvailable::Unknown),
        ];
        let ports = Ports::from_infos(&infos);

        assert_eq!(
            ports.is_available(CStr::from_bytes_with_nul(b"output-speaker\0").unwrap()),
            Some(true)
        );
        assert_eq!(
            ports.is_available(CStr::from_bytes_with_nul(b"output-earpiece\0").unwrap()),
            None
        );
    }

    #[test]
    fn update_availability_reports_change_only_once() {
        let mut ports = Ports::from_infos(&[port("output-speaker", 10, PortAvailable::Yes)]);
        let name = CString::new("output-speaker").unwrap();

        assert!(!ports.update_availability(&name, PortAvailable::Yes));
        assert!(ports.update_availability(&name, PortAvailable::No));
        assert!(!ports.update_availability(&name, PortAvailable::No));
    }

    #[test]
    fn update_availability_ignores_unknown() {
        let mut ports = Ports::from_infos(&[port("output-speaker", 10, PortAvailable::Yes)]);
        let name = CString::new("output-speaker").unwrap();

        assert!(!ports.update_availability(&name, PortAvailable::Unknown));
        assert_eq!(ports.is_available(&name), Some(true));
    }

    #[test]
    fn detect_speaker_port_droid_is_literal() {
        let ports = Ports::from_infos(&[port("output-speaker", 10, PortAvailable::Yes)]);
        let detected = TrackedSink::detect_speaker_port(BackendFlavor::Droid, &ports);
        assert_eq!(detected, Some(CString::new("output-speaker").unwrap()));
    }

    #[test]
    fn detect_speaker_port_native_matches_substring() {
        let ports = Ports::from_infos(&[port("Speaker+LO", 10, PortAvailable::Yes)]);
        let detected = TrackedSink::detect_speaker_port(BackendFlavor::Native, &ports);
        assert_eq!(detected, Some(CString::new("Speaker+LO").unwrap()));
    }

    #[test]
    fn detect_has_voice_profile_matches_either_token() {
        let profiles = vec![CString::new("HiFi").unwrap(), CString::new("Voicecall").unwrap()];
        assert!(TrackedCard::detect_has_voice_profile(&profiles));

        let profiles = vec![CString::new("default").unwrap(), CString::new("voicecall").unwrap()];
        assert!(TrackedCard::detect_has_voice_profile(&profiles));

        let profiles = vec![CString::new("HiFi").unwrap()];
        assert!(!TrackedCard::detect_has_voice_profile(&profiles));
    }

    #[test]
    fn drop_sink_only_matches_tracked_index() {
        let mut topology = Topology::new();
        topology.install_sink(TrackedSink {
            index: 5,
            card_index: Some(0),
            name: CString::new("sink").unwrap(),
            active_port: None,
            ports: Ports::default(),
            flavor: BackendFlavor::Native,
            speaker_port: None,
        });

        assert!(!topology.drop_sink(6));
        assert!(topology.sink.is_some());
        assert!(topology.drop_sink(5));
        assert!(topology.sink.is_none());
    }
}
