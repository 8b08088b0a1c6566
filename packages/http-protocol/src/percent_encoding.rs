//! Decoding of percent-escaped query values.
//!
//! Clients send binary values, like the info-hash and the peer id, escaped as
//! `%XX`. Unlike a strict URL decoder, [`hex_decode`] never fails: bytes that
//! are not part of an escape pass through unchanged and invalid or missing
//! digits of an escape count as `0`.

/// Decodes the `%XX` escapes of a query value.
///
/// ```rust
/// use bittorrent_http_protocol::percent_encoding::hex_decode;
///
/// assert_eq!(hex_decode(b"%3B%24U"), vec![0x3b, 0x24, b'U']);
/// assert_eq!(hex_decode(b"%4"), vec![0x40]);
/// ```
#[must_use]
pub fn hex_decode(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());

    let mut position = 0;
    while position < input.len() {
        if input[position] == b'%' {
            let high = input.get(position + 1).map_or(0, |digit| hex_value(*digit));
            let low = input.get(position + 2).map_or(0, |digit| hex_value(*digit));
            output.push((high << 4) | low);
            position += 3;
        } else {
            output.push(input[position]);
            position += 1;
        }
    }

    output
}

/// Escapes every byte as `%xx`. It's the inverse of [`hex_decode`].
#[must_use]
pub fn hex_encode(input: &[u8]) -> String {
    input.iter().map(|byte| format!("%{byte:02x}")).collect()
}

/// Lowercase hex representation of the bytes, for logs and the store.
#[must_use]
pub fn bintohex(input: &[u8]) -> String {
    input.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use percent_encoding::{percent_encode, NON_ALPHANUMERIC};

    use super::{bintohex, hex_decode, hex_encode};

    #[test]
    fn it_should_decode_escapes_in_both_cases() {
        assert_eq!(hex_decode(b"%ff%FF%0a"), vec![0xff, 0xff, 0x0a]);
    }

    #[test]
    fn it_should_pass_through_bytes_that_are_not_escaped() {
        assert_eq!(hex_decode(b"-qB00000000000000001"), b"-qB00000000000000001".to_vec());
    }

    #[test]
    fn it_should_treat_missing_digits_of_a_trailing_escape_as_zero() {
        assert_eq!(hex_decode(b"a%"), vec![b'a', 0x00]);
        assert_eq!(hex_decode(b"a%f"), vec![b'a', 0xf0]);
    }

    #[test]
    fn it_should_treat_invalid_digits_as_zero() {
        assert_eq!(hex_decode(b"%zz"), vec![0x00]);
    }

    #[test]
    fn it_should_decode_values_escaped_by_a_standard_url_encoder() {
        let info_hash = [0x3b, 0x24, 0x55, 0x04, 0xcf, 0x5f, 0x11, 0xbb, 0xdb, 0xe1];

        let escaped = percent_encode(&info_hash, NON_ALPHANUMERIC).to_string();

        assert_eq!(hex_decode(escaped.as_bytes()), info_hash.to_vec());
    }

    #[test]
    fn it_should_recover_any_byte_string_from_its_escaped_form() {
        for length in 0..=64u8 {
            let bytes: Vec<u8> = (0..length).map(|i| i.wrapping_mul(37).wrapping_add(length)).collect();

            assert_eq!(hex_decode(hex_encode(&bytes).as_bytes()), bytes);
        }
    }

    #[test]
    fn it_should_render_bytes_as_lowercase_hex() {
        assert_eq!(bintohex(&[0x3b, 0xAB, 0x00]), "3bab00");
    }
}
