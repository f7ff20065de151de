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

#![doc = include_str!("../README.md")]

use access_log_module::{
    AccessLogConf, AccessLogOpt, AccessLogger, FromYaml, Preset, QueueSink, RequestError,
    ResponseInfo,
};
use clap::Parser;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use log::{debug, error, info};
use serde::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

/// Run a demo web server writing an access log
#[derive(Debug, Parser)]
struct Opt {
    /// Address to listen on, e.g. 127.0.0.1:3000
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Configuration file to load. This option can be specified multiple times, settings in
    /// later files override the ones in earlier files.
    #[arg(short, long)]
    conf: Vec<PathBuf>,

    #[command(flatten)]
    log: AccessLogOpt,
}

/// The configuration of the demo server
#[derive(Debug, Deserialize)]
#[serde(default)]
struct Conf {
    listen: SocketAddr,
    #[serde(flatten)]
    log: AccessLogConf,
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log: AccessLogConf::default(),
        }
    }
}

fn text_response(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(text.as_bytes())));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(text.len()));
    response
}

async fn handle(
    logger: AccessLogger,
    request: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let mut ctx = logger.on_request(&request);

    if *request.method() == Method::GET && request.uri().path() == "/" {
        let response = text_response(StatusCode::OK, "A");
        logger.on_after_handle(&mut ctx);
        logger.on_response(ctx, &ResponseInfo::from(&response));
        Ok(response)
    } else {
        let mut info = ResponseInfo::default();
        logger.on_error(ctx, &RequestError::NotFound, &mut info);
        Ok(text_response(
            info.status.unwrap_or(StatusCode::NOT_FOUND),
            "Not Found",
        ))
    }
}

async fn serve(listener: TcpListener, logger: AccessLogger) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(connection) => connection,
            Err(err) => {
                error!("Failed accepting connection: {err}");
                continue;
            }
        };

        let logger = logger.clone();
        tokio::spawn(async move {
            let service = service_fn(move |request| handle(logger.clone(), request));
            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!("Connection with {addr} failed: {err}");
            }
        });
    }
}

async fn run(conf: Conf) {
    let logger = match AccessLogger::from_conf(conf.log, QueueSink::spawn) {
        Ok(logger) => logger,
        Err(err) => {
            error!("{err}");
            return;
        }
    };

    let listener = match TcpListener::bind(conf.listen).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed listening on {}: {err}", conf.listen);
            return;
        }
    };
    info!("Listening on http://{}", conf.listen);

    serve(listener, logger).await;
}

fn main() {
    env_logger::init();

    let opt = Opt::parse();

    let mut conf = match Conf::load_from_files(&opt.conf) {
        Ok(conf) => conf,
        Err(err) => {
            error!("{err}");
            Conf::default()
        }
    };
    if let Some(listen) = opt.listen {
        conf.listen = listen;
    }
    conf.log.merge_with_opt(opt.log);
    if conf.log.log_format.is_empty() {
        conf.log.log_format = Preset::Dev.name().to_owned();
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Failed starting runtime: {err}");
            return;
        }
    };
    runtime.block_on(run(conf));
}
