//! Parsing of proxy lines
//!
//! Used both for crawled proxy lists and for seed proxies in the config.

use crate::proxy::models::{Proxy, ProxyType};
use once_cell::sync::Lazy;
use regex::Regex;

static URL_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?|socks[45])://(?:([^:]+):([^@]+)@)?([^:/]+):(\d+)/?$")
        .expect("Invalid proxy URL regex")
});

static AUTH_AT_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^:]+):([^@]+)@([^:]+):(\d+)$").expect("Invalid user:pass@host regex")
});

/// Proxy parser for various formats
pub struct ProxyParser;

impl ProxyParser {
    /// Parse a single proxy line
    ///
    /// Supports formats:
    /// - IP:PORT
    /// - IP:PORT:USER:PASS
    /// - USER:PASS@IP:PORT
    /// - scheme://IP:PORT
    /// - scheme://USER:PASS@IP:PORT
    pub fn parse_line(line: &str, default_type: ProxyType) -> Option<Proxy> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        Self::parse_url_format(line)
            .or_else(|| Self::parse_auth_at_format(line, default_type))
            .or_else(|| Self::parse_colon_format(line, default_type))
    }

    fn parse_url_format(line: &str) -> Option<Proxy> {
        let caps = URL_FORMAT.captures(line)?;

        let proxy_type = match &caps[1] {
            "http" => ProxyType::Http,
            "https" => ProxyType::Https,
            "socks4" => ProxyType::Socks4,
            "socks5" => ProxyType::Socks5,
            _ => return None,
        };
        let host = &caps[4];
        let port = Self::port(&caps[5])?;

        match (caps.get(2), caps.get(3)) {
            (Some(user), Some(pass)) => {
                let (user, pass) = (user.as_str(), pass.as_str());
                Some(Proxy::with_auth(host, port, proxy_type, user, pass))
            }
            _ => Some(Proxy::new(host, port, proxy_type)),
        }
    }

    fn parse_auth_at_format(line: &str, default_type: ProxyType) -> Option<Proxy> {
        let caps = AUTH_AT_FORMAT.captures(line)?;
        let port = Self::port(&caps[4])?;
        let (user, pass) = (&caps[1], &caps[2]);
        Some(Proxy::with_auth(&caps[3], port, default_type, user, pass))
    }

    fn parse_colon_format(line: &str, default_type: ProxyType) -> Option<Proxy> {
        let parts: Vec<&str> = line.split(':').collect();

        match parts.as_slice() {
            [host, port] => Some(Proxy::new(*host, Self::port(port)?, default_type)),
            [host, port, user, pass] => {
                let port = Self::port(port)?;
                Some(Proxy::with_auth(*host, port, default_type, *user, *pass))
            }
            _ => None,
        }
    }

    /// Port 0 is never a usable proxy
    fn port(text: &str) -> Option<u16> {
        text.parse::<u16>().ok().filter(|port| *port != 0)
    }

    /// Parse every recognisable line of a block of text
    pub fn parse_string(content: &str, default_type: ProxyType) -> Vec<Proxy> {
        content
            .lines()
            .filter_map(|line| Self::parse_line(line, default_type))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_format() {
        let proxy = ProxyParser::parse_line("192.168.1.1:8080", ProxyType::Http).unwrap();
        assert_eq!(proxy.host, "192.168.1.1");
        assert_eq!(proxy.port, 8080);
        assert!(proxy.auth.is_none());
    }

    #[test]
    fn test_parse_with_auth_colon_format() {
        let line = "192.168.1.1:8080:user:pass";
        let proxy = ProxyParser::parse_line(line, ProxyType::Http).unwrap();
        let auth = proxy.auth.unwrap();
        assert_eq!(auth.username, "user");
        assert_eq!(auth.password, "pass");
    }

    #[test]
    fn test_parse_auth_at_format() {
        let line = "user:pass@192.168.1.1:8080";
        let proxy = ProxyParser::parse_line(line, ProxyType::Https).unwrap();
        assert_eq!(proxy.host, "192.168.1.1");
        assert_eq!(proxy.proxy_type, ProxyType::Https);
        assert!(proxy.auth.is_some());
    }

    #[test]
    fn test_parse_url_format_overrides_default_type() {
        let line = "socks5://192.168.1.1:1080";
        let proxy = ProxyParser::parse_line(line, ProxyType::Http).unwrap();
        assert_eq!(proxy.port, 1080);
        assert_eq!(proxy.proxy_type, ProxyType::Socks5);

        let line = "https://10.1.1.1:443/";
        let proxy = ProxyParser::parse_line(line, ProxyType::Http).unwrap();
        assert_eq!(proxy.proxy_type, ProxyType::Https);
    }

    #[test]
    fn test_parse_blank_and_comment_lines() {
        assert!(ProxyParser::parse_line("", ProxyType::Http).is_none());
        assert!(ProxyParser::parse_line("   # http proxies", ProxyType::Http).is_none());
    }

    #[test]
    fn test_parse_string() {
        let content = r#"
192.168.1.1:8080
192.168.1.2:8080:user:pass
# comment
http://192.168.1.3:8080
garbage
"#;
        assert_eq!(ProxyParser::parse_string(content, ProxyType::Http).len(), 3);
    }

    #[test]
    fn test_parse_invalid_format() {
        assert!(ProxyParser::parse_line("invalid", ProxyType::Http).is_none());
        assert!(ProxyParser::parse_line("192.168.1.1", ProxyType::Http).is_none());
        assert!(ProxyParser::parse_line("192.168.1.1:abc", ProxyType::Http).is_none());
        assert!(ProxyParser::parse_line("192.168.1.1:0", ProxyType::Http).is_none());
    }
}
