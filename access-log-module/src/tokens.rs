// Copyright 2024 Wladimir Palant
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Token registry and the built-in tokens
//!
//! The following tokens are supported out of the box:
//!
//! * `:url`: request path
//! * `:method`: request method
//! * `:response-time[digits]`: milliseconds between request start and response, with `digits`
//!   decimal places (default 3)
//! * `:total-time[digits]`: milliseconds between request start and the moment the line is
//!   written
//! * `:date[format]`: current date and time, `format` being one of `clf`
//!   (`10/Oct/2000:13:55:36 -0700`), `iso` (`2000-10-10T20:55:36.000Z`) or `web` (default,
//!   `Tue, 10 Oct 2000 20:55:36 GMT`)
//! * `:status`: response status code, colored when the `dev` format is used
//! * `:referrer`: value of the `Referer` request header
//! * `:http-version`: HTTP version, always `1.1`
//! * `:user-agent`: value of the `User-Agent` request header
//! * `:req[header]`: value of an arbitrary request header
//! * `:res[header]`: value of an arbitrary response header
//! * `:content-length`: value of the `Content-Length` response header, `0` if missing
//! * `:remote-addr`: client’s IP address as reported by proxy headers like `X-Forwarded-For`
//! * `:remote-user`: user name from Basic authentication

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use http::{header, HeaderMap, StatusCode};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::context::LogContext;
use crate::error::{Error, Result};
use crate::template::Template;

/// A function computing a token value from the request context and the token arguments
pub type Extractor = Arc<dyn Fn(&LogContext, &[String]) -> Option<String> + Send + Sync>;

/// Maps token names to their extractors
#[derive(Clone)]
pub struct TokenRegistry {
    extractors: HashMap<String, Extractor>,
}

impl fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("TokenRegistry")
            .field("tokens", &names)
            .finish()
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

static BUILTIN: Lazy<TokenRegistry> = Lazy::new(|| {
    let mut registry = TokenRegistry::empty();
    registry.register("url", url);
    registry.register("method", method);
    registry.register("response-time", response_time);
    registry.register("total-time", total_time);
    registry.register("date", date);
    registry.register("status", status);
    registry.register("referrer", referrer);
    registry.register("http-version", |_, _| Some("1.1".to_owned()));
    registry.register("user-agent", |ctx, _| {
        header_value(&ctx.request().headers, header::USER_AGENT)
    });
    registry.register("req", |ctx, args| {
        header_value(&ctx.request().headers, first_arg(args)?)
    });
    registry.register("res", |ctx, args| {
        header_value(&ctx.response().headers, first_arg(args)?)
    });
    registry.register("content-length", |ctx, _| {
        Some(
            header_value(&ctx.response().headers, header::CONTENT_LENGTH)
                .unwrap_or_else(|| "0".to_owned()),
        )
    });
    registry.register("remote-addr", |ctx, _| client_ip(&ctx.request().headers));
    registry.register("remote-user", |ctx, _| {
        basic_auth_user(&ctx.request().headers)
    });
    registry
});

impl TokenRegistry {
    /// Creates a registry without any tokens
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Creates a registry containing the built-in tokens
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Adds a token, replacing any existing token with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, extractor: F)
    where
        F: Fn(&LogContext, &[String]) -> Option<String> + Send + Sync + 'static,
    {
        self.extractors.insert(name.into(), Arc::new(extractor));
    }

    /// Checks whether a token with the given name exists
    pub fn contains(&self, name: &str) -> bool {
        self.extractors.contains_key(name)
    }

    /// Names of all registered tokens
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.extractors.keys().map(String::as_str)
    }

    /// Computes a token value, `None` if the token is unknown or has no value for this request
    pub fn resolve(&self, name: &str, ctx: &LogContext, args: &[String]) -> Option<String> {
        self.extractors.get(name).and_then(|extractor| extractor(ctx, args))
    }

    /// Makes sure that all tokens used by the template are known
    pub(crate) fn validate(&self, template: &Template) -> Result<()> {
        match template.tokens().iter().find(|token| !self.contains(&token.name)) {
            Some(token) => Err(Error::UnknownToken {
                name: token.name.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Returns the first token argument, `None` if there is none or it is empty
pub fn first_arg(args: &[String]) -> Option<&str> {
    args.first().map(String::as_str).filter(|arg| !arg.is_empty())
}

fn header_value(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .filter(|value| !value.is_empty())
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

fn url(ctx: &LogContext, _args: &[String]) -> Option<String> {
    let uri = &ctx.request().uri;
    let path = uri.path();
    Some(if path.is_empty() {
        uri.to_string()
    } else {
        path.to_owned()
    })
}

fn method(ctx: &LogContext, _args: &[String]) -> Option<String> {
    Some(ctx.request().method.as_str().to_owned())
}

/// Largest number of decimal places accepted by the time tokens
pub const MAX_DIGITS: usize = 100;

fn digits(args: &[String]) -> Option<usize> {
    match first_arg(args) {
        Some(digits) => digits.parse().ok().filter(|digits| *digits <= MAX_DIGITS),
        None => Some(3),
    }
}

/// Formats a duration as milliseconds with the given number of decimal places, at most
/// [`MAX_DIGITS`]
pub fn format_millis(duration: Duration, digits: usize) -> String {
    format!(
        "{:.*}",
        digits.min(MAX_DIGITS),
        duration.as_nanos() as f64 / 1e6
    )
}

fn response_time(ctx: &LogContext, args: &[String]) -> Option<String> {
    let digits = digits(args)?;
    let elapsed = ctx.end()?.saturating_duration_since(ctx.start()?);
    Some(format_millis(elapsed, digits))
}

fn total_time(ctx: &LogContext, args: &[String]) -> Option<String> {
    let digits = digits(args)?;
    Some(format_millis(ctx.start()?.elapsed(), digits))
}

/// Formats a time in the Common Log Format, e.g. `10/Oct/2000:13:55:36 -0700`
pub fn format_clf(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%d/%b/%Y:%H:%M:%S %z")
        .to_string()
}

/// Formats a time as ISO 8601 in UTC, e.g. `2000-10-10T20:55:36.000Z`
pub fn format_iso(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Formats a time like HTTP dates, e.g. `Tue, 10 Oct 2000 20:55:36 GMT`
pub fn format_web(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

fn date(_ctx: &LogContext, args: &[String]) -> Option<String> {
    let now = SystemTime::now();
    match first_arg(args).unwrap_or("web") {
        "clf" => Some(format_clf(now)),
        "iso" => Some(format_iso(now)),
        "web" => Some(format_web(now)),
        _ => None,
    }
}

const COLOR_RED: &str = "\x1b[31m";
const COLOR_YELLOW: &str = "\x1b[33m";
const COLOR_CYAN: &str = "\x1b[36m";
const COLOR_GREEN: &str = "\x1b[32m";
const COLOR_RESET: &str = "\x1b[0m";

/// Wraps a status code into the ANSI color escape matching its class
pub fn colored_status(status: u16) -> String {
    let color = if status >= 500 {
        COLOR_RED
    } else if status >= 400 {
        COLOR_YELLOW
    } else if status >= 300 {
        COLOR_CYAN
    } else if status >= 200 {
        COLOR_GREEN
    } else {
        COLOR_RESET
    };
    format!("{color}{status}{COLOR_RESET}")
}

fn status(ctx: &LogContext, _args: &[String]) -> Option<String> {
    let status = ctx.response().status.unwrap_or(StatusCode::OK).as_u16();
    Some(if ctx.options().is_dev() {
        colored_status(status)
    } else {
        status.to_string()
    })
}

fn referrer(ctx: &LogContext, _args: &[String]) -> Option<String> {
    let headers = &ctx.request().headers;
    header_value(headers, header::REFERER).or_else(|| header_value(headers, "referrer"))
}

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

const FALLBACK_IP_HEADERS: [&str; 13] = [
    "forwarded-for",
    "forwarded",
    "x-real-ip",
    "remote-addr",
    "cf-connecting-ip",
    "fastly-ip",
    "akamai-requestip",
    "true-client-ip",
    "x-client-ip",
    "x-remote-ip",
    "http_x_forwarded_for",
    "http_x_real_ip",
    "http_remote_addr",
];

/// Determines the client’s IP address from proxy headers.
///
/// The first entry of `X-Forwarded-For` wins. Without that header, a number of other headers
/// set by proxies and CDNs are checked in order.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(list) = header_value(headers, FORWARDED_FOR_HEADER) {
        return list
            .split(',')
            .next()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_owned);
    }

    FALLBACK_IP_HEADERS
        .iter()
        .find_map(|name| header_value(headers, *name))
}

/// Extracts the user name from a Basic `Authorization` header
pub fn basic_auth_user(headers: &HeaderMap) -> Option<String> {
    const SCHEME: &str = "basic ";

    let auth = header_value(headers, header::AUTHORIZATION)?;
    if !auth.get(..SCHEME.len())?.eq_ignore_ascii_case(SCHEME) {
        return None;
    }

    let credentials = BASE64_STANDARD.decode(auth[SCHEME.len()..].trim()).ok()?;

    // slice::split_once() is unstable
    let user = match credentials.iter().position(|b| *b == b':') {
        Some(index) => &credentials[..index],
        None => &credentials[..],
    };
    Some(String::from_utf8_lossy(user).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    use http::HeaderValue;
    use std::time::Instant;
    use test_log::test;

    use crate::context::{RequestInfo, ResponseInfo};
    use crate::handler::AccessLogger;

    fn make_ctx(format: &str, request: RequestInfo) -> LogContext {
        AccessLogger::new(format).unwrap().on_request(request)
    }

    fn headers(list: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in list {
            headers.append(*name, HeaderValue::from_static(*value));
        }
        headers
    }

    fn resolve(ctx: &LogContext, name: &str, args: &[&str]) -> Option<String> {
        let args: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
        TokenRegistry::builtin().resolve(name, ctx, &args)
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| (*arg).to_owned()).collect()
    }

    #[test]
    fn registry() {
        let mut registry = TokenRegistry::empty();
        assert!(!registry.contains("url"));
        assert!(registry.validate(&Template::from(":url")).is_err());
        assert!(registry.validate(&Template::from("url")).is_ok());

        registry.register("url", |_, _| Some("custom".to_owned()));
        assert!(registry.contains("url"));
        assert!(registry.validate(&Template::from(":url")).is_ok());

        let ctx = make_ctx("tiny", RequestInfo::default());
        assert_eq!(registry.resolve("url", &ctx, &[]), Some("custom".to_owned()));
        assert_eq!(registry.resolve("method", &ctx, &[]), None);

        let builtin = TokenRegistry::builtin();
        let mut names: Vec<_> = builtin.names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "content-length",
                "date",
                "http-version",
                "method",
                "referrer",
                "remote-addr",
                "remote-user",
                "req",
                "res",
                "response-time",
                "status",
                "total-time",
                "url",
                "user-agent",
            ]
        );

        match builtin.validate(&Template::from(":method :bogus-token")) {
            Err(Error::UnknownToken { name }) => assert_eq!(name, "bogus-token"),
            other => panic!("Unexpected validation result {other:?}"),
        }
    }

    #[test]
    fn request_tokens() {
        let ctx = make_ctx(
            "tiny",
            RequestInfo {
                method: http::Method::PUT,
                uri: "http://example.com/a/b?c=d".parse().unwrap(),
                headers: headers(&[
                    ("user-agent", "Mozilla/5.0"),
                    ("referer", "https://example.com/"),
                    ("x-custom", "custom value"),
                    ("x-empty", ""),
                ]),
            },
        );

        assert_eq!(resolve(&ctx, "method", &[""]), Some("PUT".to_owned()));
        assert_eq!(resolve(&ctx, "url", &[""]), Some("/a/b".to_owned()));
        assert_eq!(
            resolve(&ctx, "user-agent", &[""]),
            Some("Mozilla/5.0".to_owned())
        );
        assert_eq!(
            resolve(&ctx, "referrer", &[""]),
            Some("https://example.com/".to_owned())
        );
        assert_eq!(
            resolve(&ctx, "req", &["X-Custom"]),
            Some("custom value".to_owned())
        );
        assert_eq!(resolve(&ctx, "req", &["x-empty"]), None);
        assert_eq!(resolve(&ctx, "req", &["x-missing"]), None);
        assert_eq!(resolve(&ctx, "req", &[""]), None);
        assert_eq!(resolve(&ctx, "req", &["invalid header"]), None);
        assert_eq!(resolve(&ctx, "http-version", &[""]), Some("1.1".to_owned()));

        let ctx = make_ctx(
            "tiny",
            RequestInfo {
                headers: headers(&[("referrer", "https://example.net/")]),
                ..Default::default()
            },
        );
        assert_eq!(
            resolve(&ctx, "referrer", &[""]),
            Some("https://example.net/".to_owned())
        );
        assert_eq!(resolve(&ctx, "user-agent", &[""]), None);
        assert_eq!(resolve(&ctx, "url", &[""]), Some("/".to_owned()));

        // Non-ASCII header values are kept, invalid UTF-8 is replaced
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_bytes("Müller-Bot/1.0".as_bytes()).unwrap(),
        );
        headers.insert("x-latin1", HeaderValue::from_bytes(b"caf\xe9").unwrap());
        let ctx = make_ctx(
            "tiny",
            RequestInfo {
                headers,
                ..Default::default()
            },
        );
        assert_eq!(
            resolve(&ctx, "user-agent", &[""]),
            Some("Müller-Bot/1.0".to_owned())
        );
        assert_eq!(
            resolve(&ctx, "req", &["x-latin1"]),
            Some("caf\u{fffd}".to_owned())
        );
    }

    #[test]
    fn response_tokens() {
        let mut ctx = make_ctx("tiny", RequestInfo::default());
        assert_eq!(resolve(&ctx, "status", &[""]), Some("200".to_owned()));
        assert_eq!(resolve(&ctx, "content-length", &[""]), Some("0".to_owned()));
        assert_eq!(resolve(&ctx, "res", &["content-length"]), None);

        ctx.set_response(ResponseInfo {
            status: Some(StatusCode::NOT_FOUND),
            headers: headers(&[("content-length", "42"), ("content-type", "text/plain")]),
        });
        assert_eq!(resolve(&ctx, "status", &[""]), Some("404".to_owned()));
        assert_eq!(resolve(&ctx, "content-length", &[""]), Some("42".to_owned()));
        assert_eq!(
            resolve(&ctx, "res", &["Content-Type"]),
            Some("text/plain".to_owned())
        );
        assert_eq!(resolve(&ctx, "res", &[]), None);
    }

    #[test]
    fn status_colors() {
        assert_eq!(colored_status(199), "\x1b[0m199\x1b[0m");
        assert_eq!(colored_status(200), "\x1b[32m200\x1b[0m");
        assert_eq!(colored_status(299), "\x1b[32m299\x1b[0m");
        assert_eq!(colored_status(300), "\x1b[36m300\x1b[0m");
        assert_eq!(colored_status(399), "\x1b[36m399\x1b[0m");
        assert_eq!(colored_status(400), "\x1b[33m400\x1b[0m");
        assert_eq!(colored_status(499), "\x1b[33m499\x1b[0m");
        assert_eq!(colored_status(500), "\x1b[31m500\x1b[0m");
        assert_eq!(colored_status(599), "\x1b[31m599\x1b[0m");

        let mut ctx = make_ctx("dev", RequestInfo::default());
        assert_eq!(resolve(&ctx, "status", &[""]), Some(colored_status(200)));
        ctx.set_response(ResponseInfo {
            status: Some(StatusCode::SERVICE_UNAVAILABLE),
            headers: HeaderMap::new(),
        });
        assert_eq!(
            resolve(&ctx, "status", &[""]),
            Some("\x1b[31m503\x1b[0m".to_owned())
        );

        // Only the dev preset is colored, not its expanded format string
        let ctx = make_ctx(
            ":method :url :status :response-time ms - :res[content-length]",
            RequestInfo::default(),
        );
        assert_eq!(resolve(&ctx, "status", &[""]), Some("200".to_owned()));
    }

    #[test]
    fn timing() {
        let mut ctx = make_ctx("tiny", RequestInfo::default());
        assert_eq!(resolve(&ctx, "response-time", &[""]), None);

        let start = Instant::now();
        ctx.set_start(start, SystemTime::now());
        ctx.set_end(start + Duration::from_micros(12345), SystemTime::now());
        assert_eq!(
            resolve(&ctx, "response-time", &[""]),
            Some("12.345".to_owned())
        );
        assert_eq!(
            resolve(&ctx, "response-time", &["1"]),
            Some("12.3".to_owned())
        );
        assert_eq!(resolve(&ctx, "response-time", &["0"]), Some("12".to_owned()));
        assert_eq!(resolve(&ctx, "response-time", &["many"]), None);
        assert_eq!(
            resolve(&ctx, "response-time", &["100"]).map(|value| value.len()),
            Some(3 + MAX_DIGITS)
        );
        assert_eq!(resolve(&ctx, "response-time", &["101"]), None);
        assert_eq!(resolve(&ctx, "response-time", &["50000000"]), None);
        assert_eq!(resolve(&ctx, "total-time", &["50000000"]), None);

        // Response time is fixed once the end has been recorded, total time keeps growing
        let first = resolve(&ctx, "total-time", &["6"]).unwrap();
        std::thread::sleep(Duration::from_millis(2));
        let second = resolve(&ctx, "total-time", &["6"]).unwrap();
        assert!(first.parse::<f64>().unwrap() >= 0.0);
        assert!(second.parse::<f64>().unwrap() > first.parse::<f64>().unwrap());
        assert_eq!(
            resolve(&ctx, "response-time", &[""]),
            Some("12.345".to_owned())
        );
    }

    #[test]
    fn millis() {
        assert_eq!(format_millis(Duration::ZERO, 3), "0.000");
        assert_eq!(format_millis(Duration::from_nanos(1234567), 3), "1.235");
        assert_eq!(format_millis(Duration::from_secs(2), 0), "2000");
        assert_eq!(format_millis(Duration::from_micros(1500), 1), "1.5");

        let longest = format_millis(Duration::from_millis(1), MAX_DIGITS);
        assert_eq!(longest.len(), 2 + MAX_DIGITS);
        assert!(longest.starts_with("1.000"));
        assert_eq!(format_millis(Duration::from_millis(1), 50_000_000), longest);
    }

    #[test]
    fn dates() {
        std::env::set_var("TZ", "UTC+1");

        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1716979999); // 2024-05-29 10:53:19 UTC
        assert_eq!(format_clf(time), "29/May/2024:09:53:19 -0100");
        assert_eq!(format_iso(time), "2024-05-29T10:53:19.000Z");
        assert_eq!(format_web(time), "Wed, 29 May 2024 10:53:19 GMT");

        let ctx = make_ctx("tiny", RequestInfo::default());
        assert!(resolve(&ctx, "date", &[""]).unwrap().ends_with(" GMT"));
        assert!(resolve(&ctx, "date", &["web"]).unwrap().ends_with(" GMT"));
        assert!(resolve(&ctx, "date", &["iso"]).unwrap().ends_with('Z'));
        assert_eq!(resolve(&ctx, "date", &["clf"]).unwrap().len(), 26);
        assert_eq!(resolve(&ctx, "date", &["rfc2822"]), None);
    }

    #[test]
    fn remote_addr() {
        assert_eq!(
            client_ip(&headers(&[
                ("x-real-ip", "9.9.9.9"),
                ("x-forwarded-for", "1.2.3.4, 5.6.7.6"),
            ])),
            Some("1.2.3.4".to_owned())
        );
        assert_eq!(
            client_ip(&headers(&[("x-forwarded-for", " 1.2.3.4 ")])),
            Some("1.2.3.4".to_owned())
        );
        assert_eq!(
            client_ip(&headers(&[("x-real-ip", "9.9.9.9")])),
            Some("9.9.9.9".to_owned())
        );
        assert_eq!(
            client_ip(&headers(&[
                ("true-client-ip", "2.2.2.2"),
                ("cf-connecting-ip", "3.3.3.3"),
            ])),
            Some("3.3.3.3".to_owned())
        );
        assert_eq!(
            client_ip(&headers(&[("http_remote_addr", "4.4.4.4")])),
            Some("4.4.4.4".to_owned())
        );
        assert_eq!(client_ip(&headers(&[("host", "example.com")])), None);
        assert_eq!(client_ip(&HeaderMap::new()), None);

        let ctx = make_ctx(
            "tiny",
            RequestInfo {
                headers: headers(&[("x-client-ip", "8.8.8.8")]),
                ..Default::default()
            },
        );
        assert_eq!(resolve(&ctx, "remote-addr", &[""]), Some("8.8.8.8".to_owned()));
    }

    #[test]
    fn remote_user() {
        let credentials = BASE64_STANDARD.encode("alice:secret");
        let auth = format!("Basic {credentials}");
        let mut map = HeaderMap::new();
        map.insert(header::AUTHORIZATION, auth.parse().unwrap());
        assert_eq!(basic_auth_user(&map), Some("alice".to_owned()));

        let auth = format!("bAsIc {credentials}");
        map.insert(header::AUTHORIZATION, auth.parse().unwrap());
        assert_eq!(basic_auth_user(&map), Some("alice".to_owned()));

        let credentials = BASE64_STANDARD.encode("bob");
        let auth = format!("Basic {credentials}");
        map.insert(header::AUTHORIZATION, auth.parse().unwrap());
        assert_eq!(basic_auth_user(&map), Some("bob".to_owned()));

        map.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abcdef"),
        );
        assert_eq!(basic_auth_user(&map), None);

        map.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic %%%"),
        );
        assert_eq!(basic_auth_user(&map), None);

        map.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic"));
        assert_eq!(basic_auth_user(&map), None);

        assert_eq!(basic_auth_user(&HeaderMap::new()), None);

        let ctx = make_ctx(
            "tiny",
            RequestInfo {
                headers: headers(&[("authorization", "Basic YWxpY2U6c2VjcmV0")]),
                ..Default::default()
            },
        );
        assert_eq!(resolve(&ctx, "remote-user", &[""]), Some("alice".to_owned()));
        assert_eq!(
            TokenRegistry::builtin().resolve("remote-user", &ctx, &args(&[])),
            Some("alice".to_owned())
        );
    }
}
