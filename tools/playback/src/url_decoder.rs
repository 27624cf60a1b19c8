//! Form-style URL decoding (`+` is a space, `%XX` is a byte).

use crate::errors::PlaybackError;
use encoding_rs::{Encoding, UTF_8};
use percent_encoding::percent_decode_str;

pub fn decode(input: &str) -> Result<String, PlaybackError> {
    Ok(decode_with(input, UTF_8))
}

pub fn decode_with_charset(input: &str, charset: &str) -> Result<String, PlaybackError> {
    let encoding = Encoding::for_label(charset.trim().as_bytes()).ok_or_else(|| {
        PlaybackError::InvalidInput(format!("unsupported charset `{charset}`"))
    })?;
    Ok(decode_with(input, encoding))
}

/// Splits a raw query string into decoded `(name, value)` pairs in order.
pub fn query_pairs(raw_query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw_query.as_bytes())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

fn decode_with(input: &str, encoding: &'static Encoding) -> String {
    let spaced = input.replace('+', " ");
    let bytes = percent_decode_str(&spaced).collect::<Vec<u8>>();
    let (text, _) = encoding.decode_without_bom_handling(&bytes);
    text.into_owned()
}
