pub mod audio;
pub mod console;
pub mod feed;
pub mod overlay;
pub mod push;
pub mod render;
pub mod screen;
pub mod state;
pub mod sync;
pub mod transport;
