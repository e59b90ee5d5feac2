/// Pieces of a voice-note data-URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioPayload<'a> {
    pub mime: &'a str,
    pub base64: &'a str,
}

/// Split a voice-note data-URL. Only base64 `audio/*` payloads with a
/// parameter-free mime type and a non-empty body count.
pub fn parse_data_url(data_url: &str) -> Option<AudioPayload<'_>> {
    let rest = data_url.strip_prefix("data:")?;
    let (mime, base64) = rest.split_once(";base64,")?;
    if !mime.starts_with("audio/") || mime.len() == "audio/".len() || mime.contains(';') {
        return None;
    }
    if base64.is_empty() {
        return None;
    }
    Some(AudioPayload { mime, base64 })
}

pub fn clamp_volume(volume: f32) -> f32 {
    volume.clamp(0.0, 1.0)
}

pub fn clamp_playback_rate(rate: f32) -> f32 {
    rate.clamp(0.5, 2.0)
}

/// m:ss readout for player scrubbers. Non-finite or negative
/// durations render as 0:00.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_owned();
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}
