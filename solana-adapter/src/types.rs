/// Byte-level match applied server-side to `getProgramAccounts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFilter {
    pub offset: usize,
    pub value: Vec<u8>,
}

impl AccountFilter {
    pub fn new(offset: usize, value: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            value: value.into(),
        }
    }
}

/// Transaction submission knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Skip the preflight simulation before broadcasting.
    pub skip_preflight: bool,
}
