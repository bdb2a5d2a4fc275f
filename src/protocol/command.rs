//! Commands are the top-level IPC structure used in the protocol.

use std::io::{BufRead, Write};

mod auth;
mod card_info;
mod module_info;
mod set_card_profile;
mod set_client_name;
mod set_mute;
mod set_port;
mod sink_info;
mod source_info;
mod subscribe;
mod unload_module;

pub use auth::{AuthParams, AuthReply};
pub use card_info::*;
pub use module_info::*;
pub use set_card_profile::*;
pub use set_client_name::*;
pub use set_mute::*;
pub use set_port::*;
pub use sink_info::*;
pub use source_info::*;
pub use subscribe::*;
pub use unload_module::*;

use super::{serde::*, ProtocolError, PulseError};

use enum_primitive_derive::Primitive;
use num_traits::FromPrimitive as _;

/// The wire values of each command, matching the real PulseAudio protocol numbering. Only a
/// subset is implemented; everything else is read far enough to report
/// [`ProtocolError::Unimplemented`] rather than desyncing the stream.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Primitive)]
pub enum CommandTag {
    /* Generic commands */
    Error = 0,
    Timeout = 1, /* pseudo command */
    Reply = 2,   /* actually used for command replies */

    /* CLIENT->SERVER */
    CreatePlaybackStream = 3,
    DeletePlaybackStream = 4,
    CreateRecordStream = 5,
    DeleteRecordStream = 6,
    Exit = 7,
    Auth = 8,
    SetClientName = 9,
    LookupSink = 10,
    LookupSource = 11,
    DrainPlaybackStream = 12,
    Stat = 13,
    GetPlaybackLatency = 14,
    CreateUploadStream = 15,
    DeleteUploadStream = 16,
    FinishUploadStream = 17,
    PlaySample = 18,
    RemoveSample = 19,

    GetServerInfo = 20,
    GetSinkInfo = 21,
    GetSinkInfoList = 22,
    GetSourceInfo = 23,
    GetSourceInfoList = 24,
    GetModuleInfo = 25,
    GetModuleInfoList = 26,
    GetClientInfo = 27,
    GetClientInfoList = 28,
    GetSinkInputInfo = 29,
    GetSinkInputInfoList = 30,
    GetSourceOutputInfo = 31,
    GetSourceOutputInfoList = 32,
    GetSampleInfo = 33,
    GetSampleInfoList = 34,
    Subscribe = 35,

    SetSinkVolume = 36,
    SetSinkInputVolume = 37,
    SetSourceVolume = 38,

    SetSinkMute = 39,
    SetSourceMute = 40,

    CorkPlaybackStream = 41,
    FlushPlaybackStream = 42,
    TriggerPlaybackStream = 43,

    SetDefaultSink = 44,
    SetDefaultSource = 45,

    SetPlaybackStreamName = 46,
    SetRecordStreamName = 47,

    KillClient = 48,
    KillSinkInput = 49,
    KillSourceOutput = 50,

    LoadModule = 51,
    UnloadModule = 52,

    /* Obsolete */
    AddAutoloadObsolete = 53,
    RemoveAutoloadObsolete = 54,
    GetAutoloadInfoObsolete = 55,
    GetAutoloadInfoListObsolete = 56,

    GetRecordLatency = 57,
    CorkRecordStream = 58,
    FlushRecordStream = 59,
    PrebufPlaybackStream = 60,

    /* SERVER->CLIENT */
    Request = 61,
    Overflow = 62,
    Underflow = 63,
    PlaybackStreamKilled = 64,
    RecordStreamKilled = 65,
    SubscribeEvent = 66,

    MoveSinkInput = 67,
    MoveSourceOutput = 68,
    SetSinkInputMute = 69,

    SuspendSink = 70,
    SuspendSource = 71,

    SetPlaybackStreamBufferAttr = 72,
    SetRecordStreamBufferAttr = 73,

    UpdatePlaybackStreamSampleRate = 74,
    UpdateRecordStreamSampleRate = 75,

    /* SERVER->CLIENT */
    PlaybackStreamSuspended = 76,
    RecordStreamSuspended = 77,
    PlaybackStreamMoved = 78,
    RecordStreamMoved = 79,

    UpdateRecordStreamProplist = 80,
    UpdatePlaybackStreamProplist = 81,
    UpdateClientProplist = 82,
    RemoveRecordStreamProplist = 83,
    RemovePlaybackStreamProplist = 84,
    RemoveClientProplist = 85,

    /* SERVER->CLIENT */
    Started = 86,

    Extension = 87,

    GetCardInfo = 88,
    GetCardInfoList = 89,
    SetCardProfile = 90,

    ClientEvent = 91,
    PlaybackStreamEvent = 92,
    RecordStreamEvent = 93,

    /* SERVER->CLIENT */
    PlaybackBufferAttrChanged = 94,
    RecordBufferAttrChanged = 95,

    SetSinkPort = 96,
    SetSourcePort = 97,

    SetSourceOutputVolume = 98,
    SetSourceOutputMute = 99,

    SetPortLatencyOffset = 100,

    EnableSrbchannel = 101,
    DisableSrbchannel = 102,

    RegisterMemfdShmid = 103,
}

impl TagStructRead for CommandTag {
    fn read(r: &mut TagStructReader, _protocol_version: u16) -> Result<Self, ProtocolError> {
        let v = r.read_u32()?;

        CommandTag::from_u32(v)
            .ok_or_else(|| ProtocolError::Invalid(format!("invalid command tag: {}", v)))
    }
}

impl TagStructWrite for CommandTag {
    fn write(&self, w: &mut TagStructWriter, _protocol_version: u16) -> Result<(), ProtocolError> {
        w.write_u32(*self as u32)?;

        Ok(())
    }
}

/// A marker trait for reply data.
pub trait CommandReply: TagStructRead + TagStructWrite {}

/// Commands this library can send to, or receive from, the server. Anything outside this set
/// (audio transport, sample cache, client/stream introspection, volume control) is reported as
/// [`ProtocolError::Unimplemented`] rather than modeled, since nothing here uses it.
#[derive(Debug)]
pub enum Command {
    /// A reply to some other command. If this is returned by read_tag_prefixed, the payload has
    /// yet to be read.
    Reply,

    /// Authentication request (and protocol handshake).
    Auth(AuthParams),

    /// Updates client properties (not just the name).
    SetClientName(Props),

    /// So-called introspection commands, to read back the state of the server.
    GetSinkInfo(GetSinkInfo),
    GetSinkInfoList,
    GetSourceInfo(GetSourceInfo),
    GetSourceInfoList,
    GetCardInfo(GetCardInfo),
    GetCardInfoList,
    GetModuleInfo(u32),
    GetModuleInfoList,

    /// Subscribe to a set of event facilities. The server will reply with an ack, then push
    /// [`Command::SubscribeEvent`] messages (tagged with a pseudo sequence number) as things
    /// change.
    Subscribe(SubscriptionMask),
    SubscribeEvent(SubscriptionEvent),

    /// Change the active port of a sink or source.
    SetSinkPort(SetPortParams),
    SetSourcePort(SetPortParams),

    /// Mute or unmute a sink or source.
    SetSinkMute(SetMuteParams),
    SetSourceMute(SetMuteParams),

    /// Switch a card to a different profile.
    SetCardProfile(SetCardProfileParams),

    /// Unload a previously loaded module, by index.
    UnloadModule(u32),
}

impl Command {
    pub fn read_tag_prefixed<R: BufRead>(
        r: &mut R,
        protocol_version: u16,
    ) -> Result<(u32, Self), ProtocolError> {
        let mut ts = TagStructReader::new(r, protocol_version);
        let (command, seq) = (ts.read_enum()?, ts.read_u32()?);

        let cmd = match command {
            CommandTag::Error => Err(ProtocolError::ServerError(ts.read_enum()?)),
            CommandTag::Timeout => Err(ProtocolError::Timeout),
            CommandTag::Reply => Ok(Command::Reply),

            CommandTag::Auth => Ok(Command::Auth(ts.read()?)),
            CommandTag::SetClientName => Ok(Command::SetClientName(ts.read()?)),

            CommandTag::GetSinkInfo => Ok(Command::GetSinkInfo(ts.read()?)),
            CommandTag::GetSinkInfoList => Ok(Command::GetSinkInfoList),
            CommandTag::GetSourceInfo => Ok(Command::GetSourceInfo(ts.read()?)),
            CommandTag::GetSourceInfoList => Ok(Command::GetSourceInfoList),
            CommandTag::GetCardInfo => Ok(Command::GetCardInfo(ts.read()?)),
            CommandTag::GetCardInfoList => Ok(Command::GetCardInfoList),
            CommandTag::GetModuleInfo => Ok(Command::GetModuleInfo(ts.read_u32()?)),
            CommandTag::GetModuleInfoList => Ok(Command::GetModuleInfoList),

            CommandTag::Subscribe => Ok(Command::Subscribe(ts.read()?)),
            CommandTag::SubscribeEvent => Ok(Command::SubscribeEvent(ts.read()?)),

            CommandTag::SetSinkPort => Ok(Command::SetSinkPort(ts.read()?)),
            CommandTag::SetSourcePort => Ok(Command::SetSourcePort(ts.read()?)),
            CommandTag::SetSinkMute => Ok(Command::SetSinkMute(ts.read()?)),
            CommandTag::SetSourceMute => Ok(Command::SetSourceMute(ts.read()?)),
            CommandTag::SetCardProfile => Ok(Command::SetCardProfile(ts.read()?)),
            CommandTag::UnloadModule => Ok(Command::UnloadModule(ts.read_u32()?)),

            other => Err(ProtocolError::Unimplemented(other)),
        }?;

        Ok((seq, cmd))
    }

    pub fn write_tag_prefixed<W: Write>(
        &self,
        seq: u32,
        w: &mut W,
        protocol_version: u16,
    ) -> Result<(), ProtocolError> {
        let mut ts = TagStructWriter::new(w, protocol_version);

        ts.write_u32(self.tag() as u32)?;
        ts.write_u32(seq)?;
        ts.write(self)?;

        Ok(())
    }

    pub fn tag(&self) -> CommandTag {
        match self {
            Command::Reply => CommandTag::Reply,

            Command::Auth(_) => CommandTag::Auth,
            Command::SetClientName(_) => CommandTag::SetClientName,

            Command::GetSinkInfo(_) => CommandTag::GetSinkInfo,
            Command::GetSinkInfoList => CommandTag::GetSinkInfoList,
            Command::GetSourceInfo(_) => CommandTag::GetSourceInfo,
            Command::GetSourceInfoList => CommandTag::GetSourceInfoList,
            Command::GetCardInfo(_) => CommandTag::GetCardInfo,
            Command::GetCardInfoList => CommandTag::GetCardInfoList,
            Command::GetModuleInfo(_) => CommandTag::GetModuleInfo,
            Command::GetModuleInfoList => CommandTag::GetModuleInfoList,

            Command::Subscribe(_) => CommandTag::Subscribe,
            Command::SubscribeEvent(_) => CommandTag::SubscribeEvent,

            Command::SetSinkPort(_) => CommandTag::SetSinkPort,
            Command::SetSourcePort(_) => CommandTag::SetSourcePort,
            Command::SetSinkMute(_) => CommandTag::SetSinkMute,
            Command::SetSourceMute(_) => CommandTag::SetSourceMute,
            Command::SetCardProfile(_) => CommandTag::SetCardProfile,
            Command::UnloadModule(_) => CommandTag::UnloadModule,
        }
    }
}

impl TagStructWrite for Command {
    fn write(
        &self,
        w: &mut crate::protocol::serde::TagStructWriter,
        _protocol_version: u16,
    ) -> Result<(), crate::protocol::ProtocolError> {
        match self {
            Command::Reply => Ok(()),

            Command::Auth(ref p) => w.write(p),
            Command::SetClientName(ref p) => w.write(p),

            Command::GetSinkInfo(ref p) => w.write(p),
            Command::GetSourceInfo(ref p) => w.write(p),
            Command::GetCardInfo(ref p) => w.write(p),
            Command::GetModuleInfo(id) => w.write_u32(*id),

            Command::Subscribe(mask) => w.write(mask),
            Command::SubscribeEvent(ref p) => w.write(p),

            Command::SetSinkPort(ref p) => w.write(p),
            Command::SetSourcePort(ref p) => w.write(p),
            Command::SetSinkMute(ref p) => w.write(p),
            Command::SetSourceMute(ref p) => w.write(p),
            Command::SetCardProfile(ref p) => w.write(p),
            Command::UnloadModule(id) => w.write_u32(*id),

            Command::GetSinkInfoList
            | Command::GetSourceInfoList
            | Command::GetCardInfoList
            | Command::GetModuleInfoList => Ok(()),
        }
    }
}
