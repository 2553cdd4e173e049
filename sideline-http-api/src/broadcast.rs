use dashmap::DashMap;
use sideline_app::{
    domain::GameId,
    ports::notification::{ListenerMessage, ListenerNotificationPort},
};
use tokio::sync::broadcast;

/// Fans listener messages out to every WebSocket watching a game.
pub struct GameBroadcastService {
    channels: DashMap<GameId, broadcast::Sender<ListenerMessage>>,
    capacity: usize,
}

impl GameBroadcastService {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    pub fn subscribe(&self, game_id: GameId) -> broadcast::Receiver<ListenerMessage> {
        self.channels
            .entry(game_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub fn listener_count(&self, game_id: GameId) -> usize {
        self.channels
            .get(&game_id)
            .map_or(0, |sender| sender.receiver_count())
    }
}

impl ListenerNotificationPort for GameBroadcastService {
    fn notify_game_listeners(&self, game_id: GameId, message: ListenerMessage) {
        let closing = matches!(message, ListenerMessage::SessionClosed { .. });
        if let Some(sender) = self.channels.get(&game_id)
            && sender.send(message).is_err()
        {
            log::debug!("No listeners left for game {}", game_id);
        }
        if closing {
            self.channels.remove(&game_id);
        } else {
            self.channels
                .remove_if(&game_id, |_, sender| sender.receiver_count() == 0);
        }
    }
}
