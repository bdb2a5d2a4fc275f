//! Pure port-selection functions (C5). Given a port set, a back-end flavor
//! and an optional exclusion, return the best port. Identical inputs always
//! yield identical outputs, and the result (if any) is always available and
//! distinct from the excluded name.

use std::ffi::CStr;

use crate::{
    config,
    topology::{BackendFlavor, Port, Ports},
};

fn candidates<'a>(ports: &'a Ports, exclude: Option<&CStr>) -> Vec<&'a Port> {
    ports
        .all
        .iter()
        .filter(|p| ports.is_available(&p.name) != Some(false))
        .filter(|p| match exclude {
            Some(excluded) => p.name.as_c_str() != excluded,
            None => true,
        })
        .collect()
}

fn find_named<'a>(candidates: &[&'a Port], name: &str) -> Option<&'a Port> {
    candidates
        .iter()
        .find(|p| p.name.to_bytes() == name.as_bytes())
        .copied()
}

fn highest_priority(candidates: &[&Port]) -> Option<String> {
    candidates
        .iter()
        .max_by_key(|p| p.priority)
        .map(|p| p.name.to_string_lossy().into_owned())
}

/// Returns the best output (sink) port, or `None` if no candidate remains.
pub fn select_output_port(ports: &Ports, exclude: Option<&CStr>, flavor: BackendFlavor) -> Option<String> {
    let candidates = candidates(ports, exclude);

    let selected = match flavor {
        BackendFlavor::Droid => {
            find_named(&candidates, config::tokens::droid::OUTPUT_WIRED_HEADSET)
                .or_else(|| find_named(&candidates, config::tokens::droid::OUTPUT_SPEAKER))
                .or_else(|| find_named(&candidates, config::tokens::droid::OUTPUT_EARPIECE))
                .map(|p| p.name.to_string_lossy().into_owned())
        }
        BackendFlavor::Native => highest_priority(&candidates),
    };

    if selected.is_none() {
        log::warn!("selector: no available output port candidate remains");
    }
    selected
}

/// Returns the best input (source) port, or `None` if no candidate remains.
pub fn select_input_port(ports: &Ports, exclude: Option<&CStr>, flavor: BackendFlavor) -> Option<String> {
    let candidates = candidates(ports, exclude);

    let selected = match flavor {
        BackendFlavor::Droid => {
            find_named(&candidates, config::tokens::droid::INPUT_WIRED_HEADSET)
                .or_else(|| find_named(&candidates, config::tokens::droid::INPUT_BUILTIN_MIC))
                .map(|p| p.name.to_string_lossy().into_owned())
        }
        BackendFlavor::Native => highest_priority(&candidates),
    };

    if selected.is_none() {
        log::warn!("selector: no available input port candidate remains");
    }
    selected
}
