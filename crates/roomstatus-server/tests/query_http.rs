//! The query endpoint over a real socket.

use roomstatus_core::{RoomId, StatusRecord};
use roomstatus_server::AvailabilityStore;
use tokio::net::TcpListener;

#[tokio::test]
async fn serves_room_status_as_plain_text() {
    let store = AvailabilityStore::new();
    store
        .set(
            RoomId::new("aa:bb:cc"),
            StatusRecord::error("Board Room", "HTTP 404"),
        )
        .await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(roomstatus_server::serve(
        listener,
        store.clone(),
        async {
            let _ = stop_rx.await;
        },
    ));

    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{addr}/rooms/aa:bb:cc"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert_eq!(
        response.text().await.unwrap(),
        "Board Room\nerror\nHTTP 404\n"
    );

    let upper = client
        .get(format!("http://{addr}/rooms/AA:BB:CC"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(upper, "Board Room\nerror\nHTTP 404\n");

    let unknown = client
        .get(format!("http://{addr}/rooms/00:00:00"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(unknown, "Unknown Room\nfree\nNo data available\n");

    let missing_route = client
        .get(format!("http://{addr}/status"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_route.status(), reqwest::StatusCode::NOT_FOUND);

    drop(client);
    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
