use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use minidis::codec::FrameCodec;
use minidis::connection::Connection;
use minidis::frame::{Error, Frame};

/// Returns the server side of a loopback connection wrapped in a `Connection`, and the client
/// side as a raw stream.
async fn create_tcp_connection() -> Result<(Connection, TcpStream), std::io::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let local_addr = listener.local_addr()?;

    let client = TcpStream::connect(local_addr).await?;
    let (server, _) = listener.accept().await?;

    Ok((Connection::new(server, FrameCodec::default()), client))
}

fn bulk_args(args: &[&str]) -> Vec<Bytes> {
    args.iter().map(|arg| Bytes::from(arg.to_string())).collect()
}

#[tokio::test]
async fn test_read_command() {
    let (mut connection, mut client) = create_tcp_connection().await.unwrap();

    client
        .write_all(b"*3\r\n$3\r\nSET\r\n$5\r\nmykey\r\n$7\r\nmyvalue\r\n")
        .await
        .unwrap();

    let actual = connection.read_request().await.unwrap();
    let expected = Some(Ok(bulk_args(&["SET", "mykey", "myvalue"])));

    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_read_multiple_commands_sequentially() {
    let (mut connection, mut client) = create_tcp_connection().await.unwrap();

    let array_1 = b"*3\r\n$3\r\nSET\r\n$7\r\nmykey_1\r\n$9\r\nmyvalue_1\r\n";
    let array_2 = b"*2\r\n$3\r\nGET\r\n$7\r\nmykey_1\r\n";
    let array_3 = b"*0\r\n";

    // All three commands in a single write.
    let mut pipelined = Vec::new();
    pipelined.extend_from_slice(array_1);
    pipelined.extend_from_slice(array_2);
    pipelined.extend_from_slice(array_3);
    client.write_all(&pipelined).await.unwrap();

    let actual = connection.read_request().await.unwrap();
    let expected = Some(Ok(bulk_args(&["SET", "mykey_1", "myvalue_1"])));
    assert_eq!(actual, expected);

    let actual = connection.read_request().await.unwrap();
    let expected = Some(Ok(bulk_args(&["GET", "mykey_1"])));
    assert_eq!(actual, expected);

    let actual = connection.read_request().await.unwrap();
    assert_eq!(actual, Some(Ok(vec![])));
}

#[tokio::test]
async fn test_read_incomplete_frame() {
    let (mut connection, mut client) = create_tcp_connection().await.unwrap();

    // Command split into three parts to simulate partial/incomplete data sending.
    // "*3\r\n$3\r\nSET\r\n$5\r\nmykey\r\n$7\r\nmyvalue\r\n";
    let part1 = b"*3\r\n$3\r\nSE";
    let part2 = b"T\r\n$5\r\nmyke";
    let part3 = b"y\r\n$7\r\nmyvalue\r\n";

    tokio::spawn(async move {
        for part in [&part1[..], &part2[..], &part3[..]] {
            client.write_all(part).await.unwrap();
            // Simulate a delay in sending/receiving the data.
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    });

    let actual = connection.read_request().await.unwrap();
    let expected = Some(Ok(bulk_args(&["SET", "mykey", "myvalue"])));
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_usable() {
    let (mut connection, mut client) = create_tcp_connection().await.unwrap();

    client.write_all(b"+PING\r\n").await.unwrap();

    let actual = connection.read_request().await.unwrap();
    assert_eq!(actual, Some(Err(Error::UnsupportedFrameType(b'+'))));

    client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();

    let actual = connection.read_request().await.unwrap();
    assert_eq!(actual, Some(Ok(bulk_args(&["PING"]))));
}

#[tokio::test]
async fn test_malformed_frame_keeps_pipelined_requests() {
    let (mut connection, mut client) = create_tcp_connection().await.unwrap();

    client
        .write_all(b"+PING\r\n*1\r\n$4\r\nPING\r\n")
        .await
        .unwrap();

    let actual = connection.read_request().await.unwrap();
    assert_eq!(actual, Some(Err(Error::UnsupportedFrameType(b'+'))));

    let actual = connection.read_request().await.unwrap();
    assert_eq!(actual, Some(Ok(bulk_args(&["PING"]))));
}

#[tokio::test]
async fn test_peer_close_mid_frame() {
    let (mut connection, mut client) = create_tcp_connection().await.unwrap();

    client.write_all(b"*2\r\n$3\r\nGET").await.unwrap();
    drop(client);

    let actual = connection.read_request().await.unwrap();
    assert_eq!(actual, None);
}

#[tokio::test]
async fn test_write_frames() {
    let (mut connection, mut client) = create_tcp_connection().await.unwrap();

    connection
        .write_frame(Frame::Simple("PONG".to_string()))
        .await
        .unwrap();
    connection
        .write_frame(Frame::Array(vec![
            Frame::Bulk(Bytes::from("two")),
            Frame::Bulk(Bytes::from("one")),
        ]))
        .await
        .unwrap();
    connection.write_frame(Frame::Null).await.unwrap();
    drop(connection);

    let mut received = Vec::new();
    client.read_to_end(&mut received).await.unwrap();

    assert_eq!(
        received,
        b"+PONG\r\n*2\r\n$3\r\ntwo\r\n$3\r\none\r\n$-1\r\n".to_vec()
    );
}
