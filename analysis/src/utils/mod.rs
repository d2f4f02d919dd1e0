pub mod audio_description;
pub mod audio_metadata_reader;
pub mod computing_device;
pub mod features;
pub mod hanning_window;
pub mod measure_time_utils;
pub mod media_source;
