//! Length-prefixed packet framing used by the polling transport.
//!
//! A body is `<len>:<payload>` repeated with no delimiter. Lengths count
//! characters, so multi-byte payloads never get split mid code point.

/// Packet type prefix of an open packet
pub const OPEN: &str = "0";
/// Engine ping / pong packets
pub const PING: &str = "2";
pub const PONG: &str = "3";
/// Namespace connect packet sent to confirm the session
pub const CONNECT: &str = "40";
/// Event packet envelope: `42["name", payload]`
pub const EVENT: &str = "42";

/// Split a polling response body into packets.
///
/// Decoding stops at the first malformed frame; whatever is left becomes the
/// final packet verbatim.
pub fn decode_packets(body: &str) -> Vec<String> {
    let mut packets = Vec::new();
    let mut rest = body;

    while !rest.is_empty() {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let declared = if digits > 0 && rest.as_bytes().get(digits) == Some(&b':') {
            rest[..digits].parse::<usize>().ok()
        } else {
            None
        };

        let Some(len) = declared else {
            packets.push(rest.to_string());
            break;
        };

        let payload = &rest[digits + 1..];
        let end = payload
            .char_indices()
            .nth(len)
            .map(|(idx, _)| idx)
            .unwrap_or(payload.len());
        packets.push(payload[..end].to_string());
        rest = &payload[end..];
    }

    packets
}

/// Frame packets the same way the server does
pub fn encode_packets<S: AsRef<str>>(packets: &[S]) -> String {
    packets
        .iter()
        .map(|p| format!("{}:{}", p.as_ref().chars().count(), p.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_framed_segments() {
        for texts in [
            vec![],
            vec!["0{\"sid\":\"abc\"}"],
            vec!["40", "42[\"update_all\",{}]", "2"],
            vec!["", "3"],
        ] {
            let body = encode_packets(&texts);
            assert_eq!(decode_packets(&body), texts, "body {:?}", body);
        }
    }

    #[test]
    fn test_decode_counts_characters() {
        let texts = vec!["42[\"state\",\"صعودی\"]", "Δ"];
        assert_eq!(decode_packets(&encode_packets(&texts)), texts);
    }

    #[test]
    fn test_decode_unframed_body() {
        assert_eq!(decode_packets("0{\"sid\":\"abc\"}"), vec!["0{\"sid\":\"abc\"}"]);
        assert_eq!(decode_packets("40"), vec!["40"]);
    }

    #[test]
    fn test_decode_malformed_remainder() {
        assert_eq!(decode_packets("2:40garbage"), vec!["40", "garbage"]);
        assert_eq!(decode_packets("2:4012x:oops"), vec!["40", "12x:oops"]);
        // declared length longer than the buffer keeps what is there
        assert_eq!(decode_packets("10:42"), vec!["42"]);
    }
}
