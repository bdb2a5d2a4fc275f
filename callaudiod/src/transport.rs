//! Abstraction over the [`pulseaudio::Client`] round-trips Discovery (C3),
//! the Event Reactor (C4) and the Operation Engine (C6) drive. Exists so
//! those modules can be exercised against a scripted mock instead of a live
//! server: the six end-to-end scenarios of spec §8 run as synchronous,
//! in-process tests recording the exact sequence of requests issued,
//! patterned after the teacher's own scripted request/reply integration
//! tests in `client.rs`.
//!
//! Subscribing isn't part of this trait: only [`crate::session::Session`]
//! ever calls it, and it returns a stream rather than a single reply, so it
//! stays a direct `pulseaudio::Client` call instead of a mockable method.

use std::ffi::CString;

use async_trait::async_trait;
use pulseaudio::protocol::{CardInfo, ModuleInfo, SinkInfo, SourceInfo};

/// The server round-trips Discovery, the reactor and the engine need, one
/// method per distinct request kind named in spec §6.
#[async_trait(?Send)]
pub trait Transport {
    /// Fetches all cards.
    async fn list_cards(&self) -> pulseaudio::client::Result<Vec<CardInfo>>;
    /// Fetches all loaded modules.
    async fn list_modules(&self) -> pulseaudio::client::Result<Vec<ModuleInfo>>;
    /// Fetches all sinks.
    async fn list_sinks(&self) -> pulseaudio::client::Result<Vec<SinkInfo>>;
    /// Fetches all sources.
    async fn list_sources(&self) -> pulseaudio::client::Result<Vec<SourceInfo>>;
    /// Fetches a card by index.
    async fn card_info(&self, index: u32) -> pulseaudio::client::Result<CardInfo>;
    /// Fetches a sink by index.
    async fn sink_info(&self, index: u32) -> pulseaudio::client::Result<SinkInfo>;
    /// Fetches a source by index.
    async fn source_info(&self, index: u32) -> pulseaudio::client::Result<SourceInfo>;
    /// Unloads a previously loaded module, by index.
    async fn unload_module(&self, index: u32) -> pulseaudio::client::Result<()>;
    /// Switches a card to a different profile.
    async fn set_card_profile(
        &self,
        card_index: u32,
        profile_name: CString,
    ) -> pulseaudio::client::Result<()>;
    /// Changes the active port of a sink.
    async fn set_sink_port(
        &self,
        sink_index: u32,
        port_name: CString,
    ) -> pulseaudio::client::Result<()>;
    /// Changes the active port of a source.
    async fn set_source_port(
        &self,
        source_index: u32,
        port_name: CString,
    ) -> pulseaudio::client::Result<()>;
    /// Mutes or unmutes a source.
    async fn set_source_mute(&self, source_index: u32, mute: bool) -> pulseaudio::client::Result<()>;
}

#[async_trait(?Send)]
impl Transport for pulseaudio::Client {
    async fn list_cards(&self) -> pulseaudio::client::Result<Vec<CardInfo>> {
        self.list_cards().await
    }

    async fn list_modules(&self) -> pulseaudio::client::Result<Vec<ModuleInfo>> {
        self.list_modules().await
    }

    async fn list_sinks(&self) -> pulseaudio::client::Result<Vec<SinkInfo>> {
        self.list_sinks().await
    }

    async fn list_sources(&self) -> pulseaudio::client::Result<Vec<SourceInfo>> {
        self.list_sources().await
    }

    async fn card_info(&self, index: u32) -> pulseaudio::client::Result<CardInfo> {
        self.card_info(index).await
    }

    async fn sink_info(&self, index: u32) -> pulseaudio::client::Result<SinkInfo> {
        self.sink_info(index).await
    }

    async fn source_info(&self, index: u32) -> pulseaudio::client::Result<SourceInfo> {
        self.source_info(index).await
    }

    async fn unload_module(&self, index: u32) -> pulseaudio::client::Result<()> {
        self.unload_module(index).await
    }

    async fn set_card_profile(
        &self,
        card_index: u32,
        profile_name: CString,
    ) -> pulseaudio::client::Result<()> {
        self.set_card_profile(card_index, profile_name).await
    }

    async fn set_sink_port(
        &self,
        sink_index: u32,
        port_name: CString,
    ) -> pulseaudio::client::Result<()> {
        self.set_sink_port(sink_index, port_name).await
    }

    async fn set_source_port(
        &self,
        source_index: u32,
        port_name: CString,
    ) -> pulseaudio::client::Result<()> {
        self.set_source_port(source_index, port_name).await
    }

    async fn set_source_mute(&self, source_index: u32, mute: bool) -> pulseaudio::client::Result<()> {
        self.set_source_mute(source_index, mute).await
    }
}
