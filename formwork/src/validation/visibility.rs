/// When a field's validation message should be shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageVisibility {
    /// Show once the field is touched or dirty (default).
    #[default]
    WhenInteracted,
    /// Show whenever the field has errors.
    Always,
    /// Never show a message; callers only use the validity flags.
    Never,
}

impl MessageVisibility {
    /// Returns `true` if a message may be shown for a field in this state.
    pub fn allows(self, touched: bool, dirty: bool) -> bool {
        match self {
            MessageVisibility::WhenInteracted => touched || dirty,
            MessageVisibility::Always => true,
            MessageVisibility::Never => false,
        }
    }
}
