use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument, warn};

use crate::codec::FrameCodec;
use crate::commands;
use crate::config::Config;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let store = Store::new();

    serve(listener, store, config.max_frame_size).await
}

/// Accepts connections on `listener` forever, each one handled by its own task. `store` is the
/// only state they share.
pub async fn serve(
    listener: TcpListener,
    store: Store,
    max_frame_size: usize,
) -> Result<(), Error> {
    info!("Server listening on {}", listener.local_addr()?);

    loop {
        let (socket, client_address) = listener.accept().await?;
        let store = store.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            let codec = FrameCodec::new(max_frame_size);
            if let Err(e) = handle_connection(socket, client_address, store, codec).await {
                error!("Connection failed: {}", e);
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip(stream, client_address, store, codec),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Store,
    codec: FrameCodec,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream, codec);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    while let Some(request) = conn.read_request().await? {
        let res = match request {
            Ok(args) => {
                debug!("Received command from client: {:?}", args);
                match commands::execute(args, &store) {
                    Some(res) => res,
                    None => continue,
                }
            }
            // The offending bytes are already dropped by the codec, the connection stays usable.
            Err(e) => {
                warn!("Protocol error: {}", e);
                Frame::Error(format!("ERR Protocol error: {}", e))
            }
        };

        debug!("Sending response to client: {}", res);
        conn.write_frame(res).await?;
    }

    info!("Connection closed");
    Ok(())
}
