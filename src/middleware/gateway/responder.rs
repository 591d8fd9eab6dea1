//! Error envelope rendering and writing for short-circuited requests.
//!
//! Envelope (byte-exact):
//! `{"code": <code>,"msg": "<message>","data": ""}`
//!
//! Status and content type are set on the sink before the first body byte.
//! The body is written through [`BodyWriter`], which closes the sink exactly
//! once on every exit path.
use std::io;

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub const JSON_UTF8: &str = "application/json;charset=UTF-8";

#[derive(Debug, Error)]
#[error("failed to write response body: {0}")]
pub struct ResponseWriteFailure(#[from] io::Error);

/// Where a short-circuit response is written to.
pub trait ResponseSink {
    fn set_status(&mut self, status: StatusCode);
    fn set_content_type(&mut self, content_type: &'static str);
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
    /// Flush and release the channel. Writes after close must fail.
    fn close(&mut self) -> io::Result<()>;
}

/// Scoped body writer: the sink is closed when this is finished or dropped,
/// whichever comes first, and never twice.
pub struct BodyWriter<'a, S: ResponseSink + ?Sized> {
    sink: &'a mut S,
    closed: bool,
}

impl<'a, S: ResponseSink + ?Sized> BodyWriter<'a, S> {
    pub fn open(sink: &'a mut S) -> Self {
        Self {
            sink,
            closed: false,
        }
    }

    pub fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.sink.write(bytes)
    }

    pub fn finish(mut self) -> io::Result<()> {
        self.closed = true;
        self.sink.close()
    }
}

impl<S: ResponseSink + ?Sized> Drop for BodyWriter<'_, S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.sink.close() {
            tracing::warn!(error = %e, "failed to close response sink");
        }
    }
}

pub fn render(code: u16, msg: &str) -> Vec<u8> {
    // Value's Display gives a quoted, escaped JSON string
    let msg = serde_json::Value::from(msg);
    format!("{{\"code\": {code},\"msg\": {msg},\"data\": \"\"}}").into_bytes()
}

pub fn write_envelope<S: ResponseSink + ?Sized>(
    sink: &mut S,
    status: StatusCode,
    code: u16,
    msg: &str,
) -> Result<(), ResponseWriteFailure> {
    sink.set_status(status);
    sink.set_content_type(JSON_UTF8);

    let body = render(code, msg);
    let mut writer = BodyWriter::open(sink);
    writer.write(&body)?;
    writer.finish()?;
    Ok(())
}

/// In-memory sink, converted into an axum `Response` once the chain is done.
#[derive(Debug)]
pub struct ResponseBuffer {
    status: StatusCode,
    content_type: Option<&'static str>,
    body: Vec<u8>,
    closed: bool,
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            content_type: None,
            body: Vec::new(),
            closed: false,
        }
    }
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl ResponseSink for ResponseBuffer {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn set_content_type(&mut self, content_type: &'static str) {
        self.content_type = Some(content_type);
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "response already closed",
            ));
        }
        self.body.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

impl IntoResponse for ResponseBuffer {
    fn into_response(self) -> Response {
        let mut res = Response::new(Body::from(self.body));
        *res.status_mut() = self.status;
        if let Some(ct) = self.content_type {
            res.headers_mut()
                .insert(header::CONTENT_TYPE, header::HeaderValue::from_static(ct));
        }
        res
    }
}
