pub mod access_guard;
