pub mod audio;
pub mod duration;
pub mod pipeline;
pub mod script;
pub mod tts;
