pub mod board;
pub mod client_msg;
pub mod color;
pub mod dequeue;
pub mod server_msg;
pub mod tile;
