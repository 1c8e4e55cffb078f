pub mod id;
pub mod live_session;
pub mod marathon;
pub mod stream;

pub use id::{generate_id, StreamId};
pub use live_session::{LiveSession, LiveStreamView, Region};
pub use marathon::{CreateMarathonRequest, Marathon};
pub use stream::{
    CreateStreamRequest, NewStream, Stream, StreamKey, StreamState, UpdateStreamRequest,
};

use crate::{Error, Result};

/// Longest accepted stream or marathon name
pub const MAX_NAME_LEN: usize = 64;

/// Validate a stream or marathon name: 1 to 64 characters of `[A-Za-z0-9_-]`.
///
/// `kind` only feeds the error message.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput(format!("{kind} name must not be empty")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::InvalidInput(format!(
            "{kind} name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(Error::InvalidInput(format!(
            "{kind} name contains invalid character {c:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Stream", "alice").is_ok());
        assert!(validate_name("Stream", "Team_Red-2").is_ok());
        assert!(validate_name("Stream", &"a".repeat(MAX_NAME_LEN)).is_ok());

        assert!(validate_name("Stream", "").is_err());
        assert!(validate_name("Stream", &"a".repeat(MAX_NAME_LEN + 1)).is_err());
        assert!(validate_name("Stream", "a/b").is_err());
        assert!(validate_name("Marathon", "with space").is_err());
    }
}
