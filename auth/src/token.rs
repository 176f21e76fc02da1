use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Generate an opaque session token.
///
/// 256 bits from the thread-local CSPRNG, base64url encoded (43 characters).
pub fn generate_session_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_url_safe_and_unique() {
        let first = generate_session_token();
        let second = generate_session_token();

        assert_eq!(first.len(), 43);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(first, second);
    }
}
