/// The native playback properties of a `<video>` or `<audio>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProps {
    pub playback_rate: f64,
    pub volume: f64,
    pub muted: bool,
    pub paused: bool,
    pub current_time: f64,

    /// `NaN` or infinite while metadata is unavailable or the stream is live.
    pub duration: f64,
}

impl MediaProps {
    pub fn known_duration(&self) -> Option<f64> {
        self.duration.is_finite().then_some(self.duration)
    }
}

impl Default for MediaProps {
    fn default() -> Self {
        Self {
            playback_rate: 1.0,
            volume: 1.0,
            muted: false,
            paused: true,
            current_time: 0.0,
            duration: f64::NAN,
        }
    }
}
