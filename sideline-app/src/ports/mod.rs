pub mod authorization;
pub mod event;
pub mod game_repository;
pub mod notification;
