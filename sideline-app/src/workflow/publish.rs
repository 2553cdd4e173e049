use std::sync::Arc;

use sideline_core::GameEvent;

use crate::{
    domain::GameId,
    ports::notification::{ListenerMessage, ListenerNotificationPort},
    processes::event_writer::{EventQueue, PendingWrite},
};

/// Hands events from a committed mutation to storage and to listeners.
pub trait PublishGameEventsWorkflow {
    fn publish(&self, game_id: GameId, events: &[GameEvent]);
    fn publish_write(&self, game_id: GameId, write: PendingWrite, message: ListenerMessage);
}

pub struct PublishGameEventsWorkflowImpl<Q: EventQueue, L: ListenerNotificationPort> {
    event_queue: Arc<Q>,
    listener_notification_port: Arc<L>,
}

impl<Q: EventQueue, L: ListenerNotificationPort> PublishGameEventsWorkflowImpl<Q, L> {
    pub fn new(event_queue: Arc<Q>, listener_notification_port: Arc<L>) -> Self {
        Self {
            event_queue,
            listener_notification_port,
        }
    }
}

impl<Q: EventQueue, L: ListenerNotificationPort> PublishGameEventsWorkflow
    for PublishGameEventsWorkflowImpl<Q, L>
{
    fn publish(&self, game_id: GameId, events: &[GameEvent]) {
        for event in events {
            log::debug!(
                "Game {} event {} at {}s",
                game_id,
                event.kind.name(),
                event.game_time
            );
            self.event_queue
                .enqueue(game_id, PendingWrite::Event(event.clone()));
            self.listener_notification_port.notify_game_listeners(
                game_id,
                ListenerMessage::GameEvent {
                    game_id,
                    event: event.clone(),
                },
            );
        }
    }

    fn publish_write(&self, game_id: GameId, write: PendingWrite, message: ListenerMessage) {
        self.event_queue.enqueue(game_id, write);
        self.listener_notification_port
            .notify_game_listeners(game_id, message);
    }
}
