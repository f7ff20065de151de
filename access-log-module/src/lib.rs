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

//! # Access Log Module
//!
//! This crate produces one access log line per HTTP request. The line layout is defined by a
//! format string mixing literal text with tokens like `:method` or `:res[content-length]`, or
//! by the name of a predefined format. A configuration could look like this:
//!
//! ```yaml
//! log_file: access.log
//! log_format: ':remote-addr - :remote-user ":method :url" :status :res[content-length]'
//! log_immediate: false
//! ```
//!
//! The `log_file`, `log_format` and `log_immediate` fields are also available as
//! `--log-file`, `--log-format` and `--log-immediate` command line options. A log file will be
//! created if necessary, data in already existing files will be kept. `-` as log file name
//! means standard output, an empty log file name disables logging.
//!
//! The predefined formats are:
//!
//! * `combined`: Standard Apache combined log output
//! * `common`: Standard Apache common log output
//! * `default`: Same as `combined` but with the date in the `web` format
//! * `short`: Shorter than default, also including response time
//! * `tiny`: The minimal output
//! * `dev`: Concise output colored by response status for development use
//!
//! See [`tokens`] for the list of supported tokens. Additional tokens can be registered via
//! [`AccessLoggerBuilder::token`]. Tokens without a value for a particular request are
//! rendered as `-`.
//!
//! ## Code example
//!
//! The host server calls [`AccessLogger`] hooks as the request progresses. Usually, the line is
//! written once the response has been sent:
//!
//! ```rust
//! use access_log_module::{AccessLogger, ResponseInfo, WriterSink};
//! use http::{Request, Response};
//!
//! let logger = AccessLogger::builder("tiny")
//!     .sink(WriterSink::new(std::io::stderr()))
//!     .build()
//!     .unwrap();
//!
//! let request = Request::get("/hello").body(()).unwrap();
//! let mut ctx = logger.on_request(&request);
//!
//! // Handle the request here
//! let response = Response::builder()
//!     .header("Content-Length", "2")
//!     .body("hi")
//!     .unwrap();
//! logger.on_after_handle(&mut ctx);
//!
//! // Send the response here
//! logger.on_response(ctx, &ResponseInfo::from(&response));
//! ```
//!
//! For a complete server see the `access-log-server` crate in the repository.

pub mod configuration;
mod context;
mod error;
mod handler;
mod preset;
pub mod template;
pub mod tokens;
mod writer;


pub use configuration::{AccessLogConf, AccessLogOpt, FromYaml};
pub use context::{LogContext, RequestError, RequestInfo, ResponseInfo};
pub use error::{Error, Result};
pub use handler::{AccessLogger, AccessLoggerBuilder, LoggerOptions, SkipFn};
pub use preset::{expand_format, Preset};
pub use template::{parse, FormatSegment, Template, TokenRef, ABSENT_VALUE};
pub use tokens::{Extractor, TokenRegistry};
pub use writer::{open_writer, LogSink, QueueSink, WriterSink};
