//! Channel name extraction.
//!
//! Channels are addressed on the command line either by name (`wildfusionai`,
//! `@wildfusionai`) or by their TikTok URL; every stage keys its directories
//! by the bare name.

use thiserror::Error;
use url::Url;

/// Errors that can occur during channel name extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelNameError {
    #[error("Channel name is empty")]
    Empty,

    #[error("URL is not a TikTok URL: {0}")]
    NotTikTok(String),

    #[error("No @handle found in URL: {0}")]
    HandleNotFound(String),

    #[error("Channel name has invalid characters: {0}")]
    InvalidName(String),
}

/// Extract the bare channel name from a name, `@handle` or channel URL.
///
/// ```
/// use fusion_models::channel_name;
/// assert_eq!(channel_name("https://www.tiktok.com/@wildfusionai?lang=en").unwrap(), "wildfusionai");
/// assert_eq!(channel_name("@wildfusionai").unwrap(), "wildfusionai");
/// ```
pub fn channel_name(input: &str) -> Result<String, ChannelNameError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ChannelNameError::Empty);
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        return extract_from_url(input);
    }

    validate_name(input.trim_start_matches('@'))
}

fn extract_from_url(input: &str) -> Result<String, ChannelNameError> {
    let url = Url::parse(input).map_err(|_| ChannelNameError::NotTikTok(input.to_string()))?;

    let is_tiktok = url
        .host_str()
        .map(|h| h == "tiktok.com" || h.ends_with(".tiktok.com"))
        .unwrap_or(false);
    if !is_tiktok {
        return Err(ChannelNameError::NotTikTok(input.to_string()));
    }

    let handle = url
        .path_segments()
        .and_then(|mut segments| segments.find(|s| s.starts_with('@')))
        .ok_or_else(|| ChannelNameError::HandleNotFound(input.to_string()))?;

    validate_name(handle.trim_start_matches('@'))
}

fn validate_name(name: &str) -> Result<String, ChannelNameError> {
    if name.is_empty() {
        return Err(ChannelNameError::Empty);
    }
    let allowed = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if !allowed || name.chars().all(|c| c == '.') {
        return Err(ChannelNameError::InvalidName(name.to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_from_url() {
        assert_eq!(
            channel_name("https://www.tiktok.com/@wildfusionai?lang=en").unwrap(),
            "wildfusionai"
        );
        assert_eq!(
            channel_name("https://tiktok.com/@fuse.lab/video/7301").unwrap(),
            "fuse.lab"
        );
    }

    #[test]
    fn test_channel_from_name() {
        assert_eq!(channel_name("wildfusionai").unwrap(), "wildfusionai");
        assert_eq!(channel_name(" @wild_fusion ").unwrap(), "wild_fusion");
    }

    #[test]
    fn test_channel_errors() {
        assert_eq!(channel_name("  "), Err(ChannelNameError::Empty));
        assert_eq!(channel_name("@"), Err(ChannelNameError::Empty));
        assert!(matches!(
            channel_name("https://youtube.com/@someone"),
            Err(ChannelNameError::NotTikTok(_))
        ));
        assert!(matches!(
            channel_name("https://www.tiktok.com/explore"),
            Err(ChannelNameError::HandleNotFound(_))
        ));
        assert!(matches!(
            channel_name("../etc"),
            Err(ChannelNameError::InvalidName(_))
        ));
    }
}
