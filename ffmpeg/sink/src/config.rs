/*!
    Output file configuration.
*/

/**
    How format options that fail before the resource is open are handled.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptionPolicy {
    /// Any failure defers the option until wrapping begins.
    #[default]
    Lenient,
    /// Only options that need an open resource are deferred. Unknown options
    /// and rejected values fail `setup_wrapping`.
    Strict,
}

/**
    Settings of an [`OutputFile`](crate::OutputFile) that are not part of a
    format profile.
*/
#[derive(Clone, Debug, Default)]
pub struct OutputConfig {
    /// Handling of options that can't be set at setup time.
    pub option_policy: OptionPolicy,
    /// MIME type hint used to pick the output format.
    pub mime_type: Option<String>,
}

impl OutputConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Fail setup on unknown options instead of deferring them.
    */
    pub fn strict_options(mut self) -> Self {
        self.option_policy = OptionPolicy::Strict;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}
