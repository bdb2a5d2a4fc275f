use super::*;

/// Parameters for [`super::Command::SetSinkMute`] and [`super::Command::SetSourceMute`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SetMuteParams {
    /// The index of the sink or source.
    pub index: Option<u32>,

    /// The name of the sink or source.
    pub name: Option<std::ffi::CString>,

    /// Whether to mute (`true`) or unmute (`false`).
    pub mute: bool,
}

impl TagStructRead for SetMuteParams {
    fn read(ts: &mut TagStructReader<'_>, _protocol_version: u16) -> Result<Self, ProtocolError> {
        Ok(Self {
            index: ts.read_index()?,
            name: ts.read_string()?,
            mute: ts.read_bool()?,
        })
    }
}

impl TagStructWrite for SetMuteParams {
    fn write(
        &self,
        ts: &mut TagStructWriter<'_>,
        _protocol_version: u16,
    ) -> Result<(), ProtocolError> {
        ts.write_index(self.index)?;
        ts.write_string(self.name.as_ref())?;
        ts.write_bool(self.mute)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::test_util::test_serde;

    #[test]
    fn test_set_mute_params_serde() -> anyhow::Result<()> {
        let params = SetMuteParams {
            index: Some(0),
            name: None,
            mute: true,
        };

        test_serde(&params)
    }
}
