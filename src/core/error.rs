pub type StudioResult<T> = Result<T, StudioError>;

/// Shown verbatim when the form is submitted with nothing to work from.
pub const EMPTY_INPUT_MESSAGE: &str = "请输入内容或上传图片。";
/// Every backend failure collapses to this message for the user.
pub const GENERIC_FAILURE_MESSAGE: &str = "生成失败，请重试。";

#[derive(thiserror::Error, Debug)]
pub enum StudioError {
    #[error("empty input: no prompt text and no image supplied")]
    EmptyInput,

    #[error("generation schema error: {0}")]
    GenerationSchema(String),

    #[error("image generation error: {0}")]
    ImageGeneration(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("config error: {0}")]
    Config(String),
}

impl StudioError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::GenerationSchema(msg.into())
    }

    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageGeneration(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Errors raised by (or about) the generative backend.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::GenerationSchema(_) | Self::ImageGeneration(_) | Self::Transport(_)
        )
    }

    /// The message safe to put in front of the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyInput => EMPTY_INPUT_MESSAGE.to_string(),
            Self::Config(msg) => format!("配置错误：{}", msg),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for StudioError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(StudioError::schema("x").to_string().contains("generation schema error:"));
        assert!(StudioError::image("x").to_string().contains("image generation error:"));
        assert!(StudioError::transport("x").to_string().contains("transport error:"));
        assert!(StudioError::capture("x").to_string().contains("capture error:"));
    }

    #[test]
    fn backend_errors_collapse_to_generic_message() {
        for err in [
            StudioError::schema("missing cards"),
            StudioError::image("no inline data"),
            StudioError::transport("HTTP 500: internal detail"),
        ] {
            assert!(err.is_backend());
            assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
            assert!(!err.user_message().contains("internal"));
        }
    }

    #[test]
    fn empty_input_is_shown_verbatim() {
        let err = StudioError::EmptyInput;
        assert!(!err.is_backend());
        assert_eq!(err.user_message(), EMPTY_INPUT_MESSAGE);
    }

    #[test]
    fn capture_is_not_a_backend_error() {
        assert!(!StudioError::capture("tainted").is_backend());
    }
}
