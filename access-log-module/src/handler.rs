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

//! The access logger and the request lifecycle hooks it is driven by

use http::StatusCode;
use log::{error, trace};
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::configuration::AccessLogConf;
use crate::context::{LogContext, RequestError, RequestInfo, ResponseInfo};
use crate::error::{Error, Result};
use crate::preset::{expand_format, Preset};
use crate::template::Template;
use crate::tokens::TokenRegistry;
use crate::writer::{open_writer, LogSink, WriterSink};

/// Predicate deciding whether a request should be left out of the log
pub type SkipFn = Arc<dyn Fn(&LogContext) -> bool + Send + Sync>;

/// Settings of an access logger, shared by all requests it handles
pub struct LoggerOptions {
    format: String,
    immediate: bool,
    sink: Option<Arc<dyn LogSink>>,
    skip: Option<SkipFn>,
}

impl fmt::Debug for LoggerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerOptions")
            .field("format", &self.format)
            .field("immediate", &self.immediate)
            .field("sink", &self.sink)
            .field("skip", &self.skip.is_some())
            .finish()
    }
}

impl LoggerOptions {
    /// The format as configured, either a preset name or a format string
    pub fn format(&self) -> &str {
        &self.format
    }

    /// If `true`, requests are logged when they arrive rather than when they end
    pub fn immediate(&self) -> bool {
        self.immediate
    }

    /// Checks whether the `dev` preset is used
    pub fn is_dev(&self) -> bool {
        self.format == Preset::Dev.name()
    }

    /// The sink log lines are written to, `None` if logging is disabled
    pub fn sink(&self) -> Option<&Arc<dyn LogSink>> {
        self.sink.as_ref()
    }
}

/// Builder for [`AccessLogger`]
pub struct AccessLoggerBuilder {
    format: String,
    immediate: bool,
    sink: Option<Arc<dyn LogSink>>,
    skip: Option<SkipFn>,
    registry: TokenRegistry,
}

impl fmt::Debug for AccessLoggerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessLoggerBuilder")
            .field("format", &self.format)
            .field("immediate", &self.immediate)
            .field("sink", &self.sink)
            .field("skip", &self.skip.is_some())
            .field("registry", &self.registry)
            .finish()
    }
}

impl AccessLoggerBuilder {
    /// Makes the logger write lines when requests arrive rather than when they end
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Sets the destination of log lines, standard output by default
    pub fn sink(self, sink: impl LogSink + 'static) -> Self {
        self.shared_sink(Arc::new(sink))
    }

    /// Sets a destination of log lines that is shared with other code
    pub fn shared_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets a predicate, requests it returns `true` for won’t be logged
    pub fn skip<F>(mut self, skip: F) -> Self
    where
        F: Fn(&LogContext) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(skip));
        self
    }

    /// Adds a custom token or replaces a built-in one
    pub fn token<F>(mut self, name: impl Into<String>, extractor: F) -> Self
    where
        F: Fn(&LogContext, &[String]) -> Option<String> + Send + Sync + 'static,
    {
        self.registry.register(name, extractor);
        self
    }

    /// Compiles the format and creates the logger. This fails if the format is empty or
    /// references unknown tokens.
    pub fn build(self) -> Result<AccessLogger> {
        if self.format.is_empty() {
            return Err(Error::MissingFormat);
        }

        let format = expand_format(&self.format);
        let template = Template::from(format);
        self.registry.validate(&template)?;
        trace!(
            "Compiled log format {format:?}, tokens: {:?}",
            template.tokens()
        );

        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(WriterSink::stdout()));
        Ok(AccessLogger {
            inner: Arc::new(Inner {
                options: Arc::new(LoggerOptions {
                    format: self.format,
                    immediate: self.immediate,
                    sink: Some(sink),
                    skip: self.skip,
                }),
                registry: self.registry,
                template,
            }),
        })
    }
}

#[derive(Debug)]
struct Inner {
    options: Arc<LoggerOptions>,
    registry: TokenRegistry,
    template: Template,
}

/// Produces an access log line for each request
///
/// The host server calls the logger’s hooks at the respective stages of request processing:
///
/// 1. [`on_request`](Self::on_request) when a request arrives, this creates the request’s
///    [`LogContext`]
/// 2. [`on_after_handle`](Self::on_after_handle) once the handler produced a response
/// 3. either [`on_response`](Self::on_response) after the response has been sent or
///    [`on_error`](Self::on_error) if the request failed
///
/// Cloning the logger is cheap, all clones share the same configuration and sink.
#[derive(Debug, Clone)]
pub struct AccessLogger {
    inner: Arc<Inner>,
}

impl AccessLogger {
    /// Creates a logger writing lines in the given format to standard output
    pub fn new(format: impl Into<String>) -> Result<Self> {
        Self::builder(format).build()
    }

    /// Starts configuring a logger with the given format, either a format string like
    /// `:method :url :status` or a preset name like `combined`
    pub fn builder(format: impl Into<String>) -> AccessLoggerBuilder {
        AccessLoggerBuilder {
            format: format.into(),
            immediate: false,
            sink: None,
            skip: None,
            registry: TokenRegistry::builtin(),
        }
    }

    /// Creates a logger that never writes anything
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(Inner {
                options: Arc::new(LoggerOptions {
                    format: String::new(),
                    immediate: false,
                    sink: None,
                    skip: None,
                }),
                registry: TokenRegistry::empty(),
                template: Template::from(""),
            }),
        }
    }

    /// Creates a logger from configuration, using `make_sink` to wrap the configured log file.
    /// An empty log file path produces a disabled logger.
    pub fn from_conf<S, F>(conf: AccessLogConf, make_sink: F) -> Result<Self>
    where
        S: LogSink + 'static,
        F: FnOnce(Box<dyn Write + Send>) -> S,
    {
        if conf.log_file.as_os_str().is_empty() {
            // Logging disabled
            return Ok(Self::disabled());
        }

        // Same check as in build(), done here so that no log file is created for a broken
        // configuration
        let builder = Self::builder(conf.log_format).immediate(conf.log_immediate);
        if builder.format.is_empty() {
            return Err(Error::MissingFormat);
        }
        builder
            .sink(make_sink(open_writer(&conf.log_file)))
            .build()
    }

    /// Options this logger has been created with
    pub fn options(&self) -> &LoggerOptions {
        &self.inner.options
    }

    /// Checks whether this logger writes anything at all
    pub fn is_enabled(&self) -> bool {
        self.inner.options.sink.is_some()
    }

    /// Hook for the arrival of a request, creates the request’s logging context. In immediate
    /// mode the request is logged right away.
    pub fn on_request(&self, request: impl Into<RequestInfo>) -> LogContext {
        let mut ctx = LogContext::new(request.into(), self.inner.options.clone());
        ctx.mark_start();

        if self.inner.options.immediate {
            self.log(&ctx);
        }
        ctx
    }

    /// Hook for the point where the handler produced a response, records the end time
    pub fn on_after_handle(&self, ctx: &mut LogContext) {
        ctx.mark_end();
    }

    /// Hook for a response that has been sent, logs the request unless in immediate mode
    pub fn on_response(&self, mut ctx: LogContext, response: &ResponseInfo) {
        if self.inner.options.immediate {
            return;
        }

        ctx.mark_end();
        ctx.set_response(response.clone());
        self.log(&ctx);
    }

    /// Hook for a request that failed, logs the request unless in immediate mode
    ///
    /// For [`RequestError::NotFound`], the response status is set to 404. The host should send
    /// the response with the status as adjusted here.
    pub fn on_error(&self, mut ctx: LogContext, error: &RequestError, response: &mut ResponseInfo) {
        if *error == RequestError::NotFound {
            response.status = Some(StatusCode::NOT_FOUND);
        }

        if self.inner.options.immediate {
            return;
        }

        ctx.mark_end();
        ctx.set_response(response.clone());
        self.log(&ctx);
    }

    /// Renders the log line for a request without writing it. Returns `None` if the request
    /// should be skipped.
    pub fn format_line(&self, ctx: &LogContext) -> Option<String> {
        let inner = &self.inner;
        if let Some(skip) = &inner.options.skip {
            if skip(ctx) {
                trace!(
                    "Not logging request {} {}, skipped",
                    ctx.request().method,
                    ctx.request().uri
                );
                return None;
            }
        }

        let values: Vec<_> = inner
            .template
            .tokens()
            .iter()
            .map(|token| inner.registry.resolve(&token.name, ctx, &token.args))
            .collect();
        Some(inner.template.render(&values))
    }

    fn log(&self, ctx: &LogContext) {
        let Some(sink) = &self.inner.options.sink else {
            // Logging disabled
            return;
        };

        if let Some(line) = self.format_line(ctx) {
            if let Err(err) = sink.write_line(&line) {
                error!("Failed writing access log line: {err}");
            }
        }
    }
}

impl TryFrom<AccessLogConf> for AccessLogger {
    type Error = Error;

    fn try_from(conf: AccessLogConf) -> Result<Self> {
        Self::from_conf(conf, WriterSink::new)
    }
}
