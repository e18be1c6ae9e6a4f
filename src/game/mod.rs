pub mod autoplay;
pub mod gameplay;
pub mod judgment;
pub mod run_state;
pub mod scores;
pub mod song;
pub mod spawn;
pub mod timing;
pub mod world;
