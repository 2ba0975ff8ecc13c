pub mod audio_graph;
pub mod capture;
pub mod playback;
pub mod render_queue;
