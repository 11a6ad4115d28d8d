//! Display masking for sensitive values and placeholder detection.

/// Character used to hide sensitive values.
pub const MASK_CHAR: char = '*';

/// Number of trailing characters left visible on long tokens.
pub const VISIBLE_SUFFIX: usize = 6;

/// Tokens at or below this length are masked completely.
const FULL_MASK_MAX_LEN: usize = 10;

/// Mask a token for display: short tokens become all `*`, longer ones keep
/// their last six characters.
pub fn mask_token(token: &str) -> String {
    let len = token.chars().count();
    if len == 0 {
        return String::new();
    }
    if len <= FULL_MASK_MAX_LEN {
        return MASK_CHAR.to_string().repeat(len);
    }

    let hidden = len - VISIBLE_SUFFIX;
    let suffix: String = token.chars().skip(hidden).collect();
    let mut masked = MASK_CHAR.to_string().repeat(hidden);
    masked.push_str(&suffix);
    masked
}

/// Whether `value` looks masked rather than like a real token.
///
/// Any `*` counts, whatever the shape, so a client that masks differently
/// from [`mask_token`] still cannot overwrite the stored token. Tokens that
/// genuinely contain `*` cannot be set through the API.
pub fn is_masked_placeholder(value: &str) -> bool {
    value.contains(MASK_CHAR)
}
