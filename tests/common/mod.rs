use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Write a 16 kHz mono WAV holding `frames` 30 ms frames at a constant level
#[allow(dead_code)]
pub fn write_wav(path: &Path, level: f32, frames: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("failed to create wav");
    for _ in 0..frames * 480 {
        writer
            .write_sample((level * 32767.0) as i16)
            .expect("failed to write sample");
    }
    writer.finalize().expect("failed to finalize wav");
}

/// Body shaped like a `translate_a/single` response
#[allow(dead_code)]
pub fn translate_body(text: &str) -> serde_json::Value {
    serde_json::json!([[[text, "source", null, null, 1]], null, "auto"])
}
