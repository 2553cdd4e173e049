use axum::{
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use sideline_app::{
    domain::GameId, ports::notification::ListenerMessage, workflow::LiveGameView,
};
use tokio::{select, sync::broadcast};
use tokio_util::sync::CancellationToken;

use crate::{
    AppState,
    auth::Auth,
    dto::{JsonLiveGame, ServerMessage},
    error::ServiceError,
};

/// Streams a snapshot of the game followed by every listener message for it.
pub async fn live_handler(
    ws: WebSocketUpgrade,
    Auth(account): Auth,
    State(app): State<AppState>,
    Path(game_id): Path<i64>,
) -> Result<Response, ServiceError> {
    let game_id = GameId(game_id);
    // subscribe before the snapshot so nothing falls between the two
    let receiver = app.broadcast.subscribe(game_id);
    let snapshot = app
        .app
        .get_live_game_use_case
        .get_game(account, game_id)
        .await?;

    Ok(ws.on_upgrade(move |socket| async move {
        log::info!("Account {} is watching game {}", account, game_id);
        let (ws_sender, ws_receiver) = socket.split();
        let cancellation_token = CancellationToken::new();

        let send_task = tokio::spawn(send_ws(
            ws_sender,
            snapshot,
            receiver,
            cancellation_token.clone(),
        ));
        let receive_task = tokio::spawn(receive_ws(ws_receiver, cancellation_token.clone()));

        let (receive_res, send_res) = tokio::join!(receive_task, send_task);
        if let Err(e) = receive_res {
            log::error!("WebSocket receive task failed: {}", e);
        }
        match send_res {
            Ok(Err(e)) => log::warn!("WebSocket for game {} ended: {}", game_id, e),
            Err(e) => log::error!("WebSocket send task failed: {}", e),
            Ok(Ok(())) => {}
        }
        log::info!("Account {} stopped watching game {}", account, game_id);
    }))
}

async fn receive_ws(mut ws_receiver: SplitStream<WebSocket>, cancellation_token: CancellationToken) {
    while let Some(msg) = select! {
        _ = cancellation_token.cancelled() => None,
        msg = ws_receiver.next() => msg,
    } {
        match msg {
            Ok(Message::Close(frame)) => {
                log::debug!("WS connection closed: {:?}", frame);
                break;
            }
            Err(e) => {
                log::debug!("WS error: {}", e);
                break;
            }
            // the live feed is push only
            Ok(_) => {}
        }
    }
    cancellation_token.cancel();
}

async fn send_ws(
    mut ws_sender: SplitSink<WebSocket, Message>,
    snapshot: LiveGameView,
    receiver: broadcast::Receiver<ListenerMessage>,
    cancellation_token: CancellationToken,
) -> Result<(), ServiceError> {
    let result = forward(&mut ws_sender, snapshot, receiver, &cancellation_token).await;
    cancellation_token.cancel();
    let _ = ws_sender.close().await;
    result
}

async fn forward(
    ws_sender: &mut SplitSink<WebSocket, Message>,
    snapshot: LiveGameView,
    mut receiver: broadcast::Receiver<ListenerMessage>,
    cancellation_token: &CancellationToken,
) -> Result<(), ServiceError> {
    send_message(
        ws_sender,
        &ServerMessage::Snapshot {
            game: Box::new(JsonLiveGame::from(&snapshot)),
        },
    )
    .await?;

    loop {
        let received = select! {
            _ = cancellation_token.cancelled() => return Ok(()),
            received = receiver.recv() => received,
        };
        match received {
            Ok(message) => {
                send_message(ws_sender, &ServerMessage::from(&message)).await?;
                if matches!(message, ListenerMessage::SessionClosed { .. }) {
                    return Ok(());
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!("Live feed fell behind, skipped {} messages", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}

async fn send_message(
    ws_sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), ServiceError> {
    let text = serde_json::to_string(message)
        .map_err(|e| ServiceError::Internal(format!("Failed to encode WS message: {}", e)))?;
    ws_sender
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| ServiceError::Internal(format!("Failed to send WS message: {}", e)))
}
