//! IPFS gateway URL resolution.

/// Resolve a token or image URI against `gateway`.
///
/// http(s) URLs pass through untouched; `ipfs://` is stripped and the rest is appended
/// to the gateway. An empty input stays empty.
pub fn gateway_url(gateway: &str, uri: &str) -> String {
    let uri = uri.trim();
    if uri.is_empty() {
        return String::new();
    }
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return uri.to_string();
    }
    let path = uri.strip_prefix("ipfs://").unwrap_or(uri);
    if gateway.ends_with('/') {
        format!("{}{}", gateway, path)
    } else {
        format!("{}/{}", gateway, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const GATEWAY: &str = "https://gateway.pinata.cloud/ipfs/";

    #[test_case("ipfs://QmHash", "https://gateway.pinata.cloud/ipfs/QmHash" ; "ipfs scheme")]
    #[test_case("QmHash/1.json", "https://gateway.pinata.cloud/ipfs/QmHash/1.json" ; "bare cid")]
    #[test_case("https://example.com/1.json", "https://example.com/1.json" ; "https passthrough")]
    #[test_case("http://localhost/1.json", "http://localhost/1.json" ; "http passthrough")]
    #[test_case("", "" ; "empty")]
    fn test_gateway_url(input: &str, expected: &str) {
        assert_eq!(gateway_url(GATEWAY, input), expected);
    }

    #[test]
    fn test_gateway_without_trailing_slash() {
        assert_eq!(gateway_url("https://ipfs.io/ipfs", "ipfs://Qm"), "https://ipfs.io/ipfs/Qm");
    }
}
