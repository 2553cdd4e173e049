pub mod clock_broadcast_runner;
pub mod event_writer;
