//! Constants describing the server-facing identity of this daemon and the
//! string tokens used to recognize profiles, ports and back-ends. None of
//! these are read from a file; the upstream source treats them as
//! compile-time constants, not user configuration.

/// Application name sent as `application.name` when connecting to the server.
pub const APPLICATION_NAME: &str = "CallAudio";

/// Application id sent as `application.id` when connecting to the server.
pub const APPLICATION_ID: &str = "org.mobian-project.CallAudio";

/// Prefix identifying the internal card by its `device.bus_path` property.
pub const CARD_BUS_PATH_PREFIX: &str = "platform-";

/// Required `device.form_factor` value for the internal card.
pub const CARD_FORM_FACTOR: &str = "internal";

/// `device.class` value that disqualifies a card (modems are not audio cards).
pub const CARD_CLASS_MODEM: &str = "modem";

/// Required `device.class` value for a trackable sink or source.
pub const DEVICE_CLASS_SOUND: &str = "sound";

/// `device.api` value that marks a sink/source as belonging to the droid back-end.
pub const DEVICE_API_DROID_HAL: &str = "droid-hal";

/// Substring that marks a profile as covering the droid module's voice call use case.
pub const DROID_VOICECALL_MARKER: &str = "voicecall";

/// Name of the module unloaded at discovery time on native back-ends.
pub const MODULE_SWITCH_ON_PORT_AVAILABLE: &str = "module-switch-on-port-available";

/// Delay between a failed or lost connection and the next connect attempt.
pub const RECONNECT_DELAY: std::time::Duration = std::time::Duration::from_secs(1);

/// Facilities the reactor subscribes to once the session is ready.
pub const SUBSCRIPTION_MASK: pulseaudio::protocol::SubscriptionMask =
    pulseaudio::protocol::SubscriptionMask::SINK
        .union(pulseaudio::protocol::SubscriptionMask::SOURCE)
        .union(pulseaudio::protocol::SubscriptionMask::CARD);

/// ALSA UCM and droid module string tokens, grouped per back-end flavor.
pub mod tokens {
    /// Tokens used when the back-end is [`crate::topology::BackendFlavor::Native`].
    pub mod native {
        /// Substring identifying the UCM "voice call" verb.
        pub const VOICECALL_VERB: &str = "Voicecall";

        /// Substring identifying the UCM "HiFi" verb, the default non-call profile.
        pub const HIFI_VERB: &str = "HiFi";

        /// Substring identifying the loudspeaker device in a UCM port name.
        pub const SPEAKER_DEVICE_TOKEN: &str = "Speaker";
    }

    /// Literal profile and port names used by the droid (Android HAL) module.
    pub mod droid {
        /// Default (non-call) profile name.
        pub const DEFAULT_PROFILE: &str = "default";

        /// Voice-call profile name.
        pub const VOICECALL_PROFILE: &str = "voicecall";

        /// Output parking port, set transiently to flush the HAL before the real target.
        pub const OUTPUT_PARKING: &str = "output-parking";

        /// Output port corresponding to the built-in loudspeaker.
        pub const OUTPUT_SPEAKER: &str = "output-speaker";

        /// Output port corresponding to the earpiece.
        pub const OUTPUT_EARPIECE: &str = "output-earpiece";

        /// Output port corresponding to a wired headset, highest output preference.
        pub const OUTPUT_WIRED_HEADSET: &str = "output-wired_headset";

        /// Input parking port, set transiently to flush the HAL before the real target.
        pub const INPUT_PARKING: &str = "input-parking";

        /// Input port corresponding to the built-in microphone.
        pub const INPUT_BUILTIN_MIC: &str = "input-builtin_mic";

        /// Input port corresponding to a wired headset, highest input preference.
        pub const INPUT_WIRED_HEADSET: &str = "input-wired_headset";
    }
}
