use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

use dabgw_codec::error::CodecError;
use dabgw_codec::frame::{decode_frame_header, encode_frame, FRAME_HEADER_LEN};
use dabgw_node::store::SharedStore;

use crate::request::{
    build_response, error_response, parse_request, test_information, Request,
};

#[derive(Debug, Error)]
pub enum OnboardError {
    /// Client closed the connection before a full frame arrived.
    #[error("client closed the connection mid-frame")]
    ClientClosedConnection,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// TCP interface serving onboard-systems queries against the message
/// store. One request/reply exchange per connection.
pub struct OnboardServer {
    store: SharedStore,
}

impl OnboardServer {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Serves clients on `listener` until the task is dropped.
    pub async fn serve(self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    debug!("onboard client connected from {peer}");
                    let store = self.store.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_client(store, stream).await {
                            warn!("onboard client {peer} failed: {err}");
                        }
                    });
                }
                Err(err) => warn!("onboard accept failed: {err}"),
            }
        }
    }
}

async fn handle_client(store: SharedStore, mut stream: TcpStream) -> Result<(), OnboardError> {
    let body = read_frame(&mut stream).await?;
    let reply = match parse_request(&body) {
        Ok(request) => {
            let information = execute(&store, &request);
            build_response(&request, information)
        }
        Err(err) => error_response(err),
    };
    write_frame(&mut stream, &serde_json::to_vec(&reply).map_err(CodecError::from)?).await
}

fn execute(store: &SharedStore, request: &Request) -> Value {
    match request {
        Request::Latest { valid } => served_lines(store.take_undelivered(*valid)),
        Request::Category { category, valid } => {
            served_lines(store.take_by_category(*category, *valid))
        }
        Request::Test => test_information(),
    }
}

fn served_lines(lines: Vec<Vec<String>>) -> Value {
    Value::from(
        lines
            .into_iter()
            .map(Value::from)
            .collect::<Vec<Value>>(),
    )
}

async fn read_frame(stream: &mut TcpStream) -> Result<Vec<u8>, OnboardError> {
    let mut header = [0_u8; FRAME_HEADER_LEN];
    read_fully(stream, &mut header).await?;
    let len = decode_frame_header(&header)?;
    let mut body = vec![0_u8; len];
    read_fully(stream, &mut body).await?;
    Ok(body)
}

async fn read_fully(stream: &mut TcpStream, buf: &mut [u8]) -> Result<(), OnboardError> {
    stream.read_exact(buf).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            OnboardError::ClientClosedConnection
        } else {
            OnboardError::Io(err)
        }
    })?;
    Ok(())
}

async fn write_frame(stream: &mut TcpStream, body: &[u8]) -> Result<(), OnboardError> {
    stream.write_all(&encode_frame(body)?).await?;
    Ok(())
}
