// RTMP address parsing

use url::Url;

use crate::rtmp::RTMP_DEFAULT_PORT;

use super::ClientError;

/// Target of a client session:
/// `scheme://host[:port]/app[/.../stream][?key=value&...]`
#[derive(Clone, Debug, PartialEq)]
pub struct RtmpAddress {
    /// Address as provided, sent as tcUrl and swfUrl
    pub url: String,

    /// Host
    pub host: String,

    /// Port
    pub port: u16,

    /// Application name (first path segment)
    pub app: String,

    /// Stream name (last path segment)
    pub stream_name: String,

    /// Query parameters, in order
    pub query: Vec<(String, String)>,
}

impl RtmpAddress {
    /// Parses an address
    pub fn parse(address: &str) -> Result<RtmpAddress, ClientError> {
        let u = Url::parse(address)
            .map_err(|e| ClientError::Address(format!("{}: {}", address, e)))?;

        let host = match u.host_str() {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => return Err(ClientError::Address(format!("{}: missing host", address))),
        };

        let segments: Vec<&str> = u.path().split('/').filter(|s| !s.is_empty()).collect();

        let (app, stream_name) = match (segments.first(), segments.last()) {
            (Some(first), Some(last)) => (first.to_string(), last.to_string()),
            _ => {
                return Err(ClientError::Address(format!(
                    "{}: missing application name",
                    address
                )))
            }
        };

        let query = u
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(RtmpAddress {
            url: address.to_string(),
            host,
            port: u.port().unwrap_or(RTMP_DEFAULT_PORT),
            app,
            stream_name,
            query,
        })
    }
}

impl std::fmt::Display for RtmpAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_address() {
        let a = RtmpAddress::parse("rtmp://media.example.com:1936/live/cam1?token=abc&x=1").unwrap();

        assert_eq!(a.host, "media.example.com");
        assert_eq!(a.port, 1936);
        assert_eq!(a.app, "live");
        assert_eq!(a.stream_name, "cam1");
        assert_eq!(
            a.query,
            vec![
                ("token".to_string(), "abc".to_string()),
                ("x".to_string(), "1".to_string())
            ]
        );
        assert_eq!(a.to_string(), "rtmp://media.example.com:1936/live/cam1?token=abc&x=1");
    }

    #[test]
    fn test_parse_defaults() {
        let a = RtmpAddress::parse("rtmp://127.0.0.1/live/nested/cam2").unwrap();

        assert_eq!(a.port, 1935);
        assert_eq!(a.app, "live");
        assert_eq!(a.stream_name, "cam2");
        assert!(a.query.is_empty());

        // An application alone also names the stream
        let a = RtmpAddress::parse("rtmp://127.0.0.1/live").unwrap();
        assert_eq!(a.stream_name, "live");
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["not an address", "rtmp://host", "rtmp://host/", "rtmp:///live/cam1"] {
            assert!(
                matches!(RtmpAddress::parse(bad), Err(ClientError::Address(_))),
                "{}",
                bad
            );
        }
    }
}
