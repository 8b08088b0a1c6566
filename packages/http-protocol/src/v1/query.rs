//! The query string of a tracker request.
//!
//! Values are kept as raw bytes, still percent-escaped. Binary values like
//! `info_hash` are decoded by the code that uses them.
use multimap::MultiMap;

/// The params of the query string.
///
/// A param may be repeated. That is how a scrape asks for several torrents:
///
/// ```text
/// info_hash=%3B%24...&info_hash=%99%C8...
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Query {
    params: MultiMap<String, Vec<u8>>,
}

impl Query {
    /// Parses `name=value&name=value`. Pairs with an empty name are ignored
    /// and a pair without `=` gets an empty value.
    #[must_use]
    pub fn from_bytes(raw_query: &[u8]) -> Self {
        let mut query = Self::default();

        for pair in raw_query.split(|byte| *byte == b'&') {
            let (name, value) = match pair.iter().position(|byte| *byte == b'=') {
                Some(separator) => (&pair[..separator], &pair[separator + 1..]),
                None => (pair, &pair[pair.len()..]),
            };

            if name.is_empty() {
                continue;
            }

            query.insert(String::from_utf8_lossy(name).into_owned(), value.to_vec());
        }

        query
    }

    pub fn insert(&mut self, name: String, value: Vec<u8>) {
        self.params.insert(name, value);
    }

    /// The value of a param. When the param is repeated the last value wins.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&[u8]> {
        self.params
            .get_vec(name)
            .and_then(|values| values.last())
            .map(Vec::as_slice)
    }

    /// The value of a param as text.
    #[must_use]
    pub fn get_param_str(&self, name: &str) -> Option<String> {
        self.get_param(name).map(|value| String::from_utf8_lossy(value).into_owned())
    }

    /// The value of a param parsed as an integer, see [`parse_integer`].
    #[must_use]
    pub fn get_param_integer(&self, name: &str) -> Option<i64> {
        self.get_param(name).map(parse_integer)
    }

    /// All the values of a param, in the order they were sent.
    #[must_use]
    pub fn get_param_vec(&self, name: &str) -> Vec<&[u8]> {
        self.params
            .get_vec(name)
            .map(|values| values.iter().map(Vec::as_slice).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }
}

/// Lenient integer parsing.
///
/// It skips leading whitespace, accepts a sign and reads digits until the
/// first non-digit. Text without digits is `0` and out of range values
/// saturate. Clients send all sorts of garbage and a malformed counter must
/// not reject the announce.
#[must_use]
pub fn parse_integer(value: &[u8]) -> i64 {
    let mut digits = value.iter().skip_while(|byte| byte.is_ascii_whitespace()).peekable();

    let negative = match digits.peek() {
        Some(b'-') => {
            digits.next();
            true
        }
        Some(b'+') => {
            digits.next();
            false
        }
        _ => false,
    };

    let mut number: i64 = 0;
    for digit in digits.take_while(|byte| byte.is_ascii_digit()) {
        let digit = i64::from(digit - b'0');
        number = if negative {
            number.saturating_mul(10).saturating_sub(digit)
        } else {
            number.saturating_mul(10).saturating_add(digit)
        };
    }

    number
}

#[cfg(test)]
mod tests {

    mod the_query {
        use crate::v1::query::Query;

        #[test]
        fn it_should_parse_name_value_pairs() {
            let query = Query::from_bytes(b"port=6881&compact=1");

            assert_eq!(query.get_param("port"), Some(b"6881".as_slice()));
            assert_eq!(query.get_param_str("compact"), Some("1".to_string()));
        }

        #[test]
        fn it_should_keep_the_values_still_escaped() {
            let query = Query::from_bytes(b"info_hash=%3B%24U");

            assert_eq!(query.get_param("info_hash"), Some(b"%3B%24U".as_slice()));
        }

        #[test]
        fn it_should_return_the_last_value_of_a_repeated_param() {
            let query = Query::from_bytes(b"numwant=10&numwant=20");

            assert_eq!(query.get_param_integer("numwant"), Some(20));
        }

        #[test]
        fn it_should_return_all_the_values_of_a_repeated_param_in_order() {
            let query = Query::from_bytes(b"info_hash=a&port=1&info_hash=b");

            assert_eq!(query.get_param_vec("info_hash"), vec![b"a".as_slice(), b"b".as_slice()]);
            assert!(query.get_param_vec("missing").is_empty());
        }

        #[test]
        fn it_should_ignore_pairs_without_a_name() {
            let query = Query::from_bytes(b"=1&&event=started");

            assert!(!query.contains(""));
            assert!(query.contains("event"));
        }

        #[test]
        fn it_should_give_an_empty_value_to_a_param_without_equal_sign() {
            let query = Query::from_bytes(b"no_peer_id&compact=1");

            assert_eq!(query.get_param("no_peer_id"), Some(b"".as_slice()));
        }
    }

    mod integer_parsing {
        use rstest::rstest;

        use crate::v1::query::parse_integer;

        #[rstest]
        #[case("42", 42)]
        #[case("  42", 42)]
        #[case("+7", 7)]
        #[case("-7", -7)]
        #[case("12abc", 12)]
        #[case("abc", 0)]
        #[case("", 0)]
        #[case("99999999999999999999999", i64::MAX)]
        #[case("-99999999999999999999999", i64::MIN)]
        fn it_should_parse_leniently(#[case] value: &str, #[case] expected: i64) {
            assert_eq!(parse_integer(value.as_bytes()), expected);
        }
    }
}
