use mediacore::AdapterError;
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// True for raw 16-bit samples (`audio/L16;...` or `audio/pcm`)
pub fn is_raw_pcm(content_type: &str) -> bool {
    content_type.contains("L16") || content_type.trim().eq_ignore_ascii_case("audio/pcm")
}

/// Sample rate from a `rate=NNNN` content-type parameter
pub fn sample_rate(content_type: &str) -> u32 {
    content_type
        .split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.trim().parse().ok())
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

/// Convert signed 16-bit little-endian mono PCM into a WAV file with ffmpeg.
///
/// When the encoder cannot be run or fails, the samples are wrapped in a
/// plain RIFF header instead so the output is still playable.
pub async fn convert_to_wav(
    ffmpeg: &str,
    pcm: &[u8],
    output: &Path,
    content_type: &str,
) -> Result<PathBuf, AdapterError> {
    let dir = output.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir).await?;

    let rate = sample_rate(content_type);
    // Removed when dropped, after ffmpeg has exited
    let scratch = tempfile::Builder::new()
        .prefix("temp_")
        .suffix(".pcm")
        .tempfile_in(dir)?;
    let pcm_path = scratch.path().to_path_buf();
    tokio::fs::write(&pcm_path, pcm).await?;

    tracing::debug!("Running {} on {} ({} Hz)", ffmpeg, pcm_path.display(), rate);
    let status = Command::new(ffmpeg)
        .arg("-y")
        .args(["-f", "s16le"])
        .arg("-ar")
        .arg(rate.to_string())
        .args(["-ac", "1"])
        .arg("-i")
        .arg(&pcm_path)
        .arg(output)
        .output()
        .await;

    if let Err(e) = scratch.close() {
        tracing::warn!("Could not remove {}: {}", pcm_path.display(), e);
    }

    let converted = match status {
        Ok(out) if out.status.success() => tokio::fs::metadata(output).await.is_ok(),
        Ok(out) => {
            tracing::warn!(
                "ffmpeg exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
            false
        }
        Err(e) => {
            tracing::warn!("Could not run {}: {}", ffmpeg, e);
            false
        }
    };

    if !converted {
        tracing::warn!("Writing WAV header in-process for {}", output.display());
        tokio::fs::write(output, wav_from_pcm(pcm, rate)).await?;
    }

    Ok(output.to_path_buf())
}

/// Wrap mono 16-bit PCM samples in a canonical 44-byte RIFF/WAVE header
pub fn wav_from_pcm(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    const CHANNELS: u16 = 1;
    const BITS_PER_SAMPLE: u16 = 16;
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = sample_rate * block_align as u32;
    let data_len = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&CHANNELS.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_raw_sample_formats() {
        assert!(is_raw_pcm("audio/L16;codec=pcm;rate=24000"));
        assert!(is_raw_pcm("audio/pcm"));
        assert!(!is_raw_pcm("audio/mpeg"));
        assert!(!is_raw_pcm("audio/wav"));
    }

    #[test]
    fn parses_rate_parameter() {
        assert_eq!(sample_rate("audio/L16;codec=pcm;rate=16000"), 16000);
        assert_eq!(sample_rate("audio/L16; rate=44100"), 44100);
        assert_eq!(sample_rate("audio/pcm"), DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn header_describes_samples() {
        let wav = wav_from_pcm(&[0u8; 8], 24_000);
        assert_eq!(wav.len(), 52);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 24_000);
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 8);
    }

    #[tokio::test]
    async fn falls_back_when_encoder_is_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("audio").join("tts_1.wav");

        let path = convert_to_wav("mediaflow-no-such-ffmpeg", &[1, 0, 2, 0], &out, "audio/L16;rate=8000")
            .await
            .unwrap();

        let bytes = tokio::fs::read(&path).await.unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(bytes.len(), 48);

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path().join("audio"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".pcm"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn concurrent_conversions_keep_their_own_samples() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("audio");
        let (a, b) = (dir.join("a.wav"), dir.join("b.wav"));

        let (ra, rb) = tokio::join!(
            convert_to_wav("mediaflow-no-such-ffmpeg", &[1, 0], &a, "audio/L16;rate=8000"),
            convert_to_wav("mediaflow-no-such-ffmpeg", &[2, 0, 3, 0], &b, "audio/L16;rate=8000"),
        );
        ra.unwrap();
        rb.unwrap();

        assert_eq!(&tokio::fs::read(&a).await.unwrap()[44..], &[1, 0]);
        assert_eq!(&tokio::fs::read(&b).await.unwrap()[44..], &[2, 0, 3, 0]);
    }
}
