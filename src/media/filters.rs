//! Filter expressions for the fade and scale stages

/// Fade-out start: `duration - length`, never negative
#[must_use]
pub fn fade_out_start(duration: f64, length: f64) -> f64 {
    (duration - length).max(0.0)
}

fn fade_chain(filter: &str, fade_in: f64, fade_out: f64, duration: f64) -> Option<String> {
    let mut parts = Vec::with_capacity(2);
    if fade_in > 0.0 {
        parts.push(format!("{filter}=t=in:st=0:d={fade_in}"));
    }
    if fade_out > 0.0 {
        let start = fade_out_start(duration, fade_out);
        parts.push(format!("{filter}=t=out:st={start}:d={fade_out}"));
    }
    (!parts.is_empty()).then(|| parts.join(","))
}

/// `-vf` value for the video fades, `None` when both lengths are zero
#[must_use]
pub fn video_fade(fade_in: f64, fade_out: f64, duration: f64) -> Option<String> {
    fade_chain("fade", fade_in, fade_out, duration)
}

/// `-af` value for the audio fades
#[must_use]
pub fn audio_fade(fade_in: f64, fade_out: f64, duration: f64) -> Option<String> {
    fade_chain("afade", fade_in, fade_out, duration)
}

/// Scale both axes by `factor`, rounded down to even for yuv420p
#[must_use]
pub fn scale(factor: f64) -> String {
    format!("scale=trunc(iw*{factor}/2)*2:trunc(ih*{factor}/2)*2")
}
