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

//! Per-request state the log tokens are resolved against

use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::handler::LoggerOptions;

/// Request data relevant for logging
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    /// Request method
    pub method: Method,
    /// Request URI as received
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
}

impl From<&http::request::Parts> for RequestInfo {
    fn from(parts: &http::request::Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
        }
    }
}

impl<B> From<&Request<B>> for RequestInfo {
    fn from(request: &Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
        }
    }
}

/// Response data relevant for logging
#[derive(Debug, Clone, Default)]
pub struct ResponseInfo {
    /// Response status, `None` if the host didn’t set one
    pub status: Option<StatusCode>,
    /// Response headers
    pub headers: HeaderMap,
}

impl From<&http::response::Parts> for ResponseInfo {
    fn from(parts: &http::response::Parts) -> Self {
        Self {
            status: Some(parts.status),
            headers: parts.headers.clone(),
        }
    }
}

impl<B> From<&Response<B>> for ResponseInfo {
    fn from(response: &Response<B>) -> Self {
        Self {
            status: Some(response.status()),
            headers: response.headers().clone(),
        }
    }
}

/// The reason a request ended through the error path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// No handler matched the request, logged with status 404
    NotFound,
    /// Any other failure, logged with the response status supplied
    Other,
}

/// Logging state of a single request
///
/// The context is created when the request arrives and owned by that request until it is
/// logged. Terminal logging hooks take it by value, so a context is logged at most once and
/// never changes while its line is being rendered.
#[derive(Debug)]
pub struct LogContext {
    options: Arc<LoggerOptions>,
    start: Option<Instant>,
    start_time: Option<SystemTime>,
    end: Option<Instant>,
    end_time: Option<SystemTime>,
    request: RequestInfo,
    response: ResponseInfo,
}

impl LogContext {
    pub(crate) fn new(request: RequestInfo, options: Arc<LoggerOptions>) -> Self {
        Self {
            options,
            start: None,
            start_time: None,
            end: None,
            end_time: None,
            request,
            response: ResponseInfo::default(),
        }
    }

    /// Options of the logger that created this context
    pub fn options(&self) -> &LoggerOptions {
        &self.options
    }

    /// The request being logged
    pub fn request(&self) -> &RequestInfo {
        &self.request
    }

    /// The response, empty until the request ended
    pub fn response(&self) -> &ResponseInfo {
        &self.response
    }

    /// Monotonic time the request arrived at
    pub fn start(&self) -> Option<Instant> {
        self.start
    }

    /// Wall-clock time the request arrived at
    pub fn start_time(&self) -> Option<SystemTime> {
        self.start_time
    }

    /// Monotonic time the request ended at, `None` while it is still being handled
    pub fn end(&self) -> Option<Instant> {
        self.end
    }

    /// Wall-clock time the request ended at, `None` while it is still being handled
    pub fn end_time(&self) -> Option<SystemTime> {
        self.end_time
    }

    pub(crate) fn set_start(&mut self, start: Instant, start_time: SystemTime) {
        self.start = Some(start);
        self.start_time = Some(start_time);
    }

    /// Records the end of the request. Only the first call has an effect.
    pub(crate) fn set_end(&mut self, end: Instant, end_time: SystemTime) {
        if self.end.is_none() {
            self.end = Some(end);
            self.end_time = Some(end_time);
        }
    }

    pub(crate) fn mark_start(&mut self) {
        self.set_start(Instant::now(), SystemTime::now());
    }

    pub(crate) fn mark_end(&mut self) {
        self.set_end(Instant::now(), SystemTime::now());
    }

    pub(crate) fn set_response(&mut self, response: ResponseInfo) {
        self.response = response;
    }
}
