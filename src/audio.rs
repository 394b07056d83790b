use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::error::{AppError, Result};

/// Keeps the output stream alive for as long as the track should play.
pub struct BackgroundMusic {
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
}

impl BackgroundMusic {
    /// Opens the default output device and loops `path` forever.
    pub fn start(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| AppError::Audio(format!("{}: {}", path.display(), e)))?;

        let (stream, handle) =
            OutputStream::try_default().map_err(|e| AppError::Audio(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| AppError::Audio(e.to_string()))?;
        sink.append(source.repeat_infinite());

        tracing::info!("Playing background track {}", path.display());
        Ok(BackgroundMusic {
            _stream: stream,
            _handle: handle,
            sink,
        })
    }
}

impl Drop for BackgroundMusic {
    fn drop(&mut self) {
        self.sink.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_track_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BackgroundMusic::start(&dir.path().join("missing.mp3")).err().unwrap();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn undecodable_track_is_audio_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not audio").unwrap();
        let err = BackgroundMusic::start(file.path()).err().unwrap();
        assert!(matches!(err, AppError::Audio(_)));
    }
}
