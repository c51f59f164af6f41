/// Upper bound of the raw temperature accepted from the UI slider.
pub const MAX_RAW_TEMPERATURE: f64 = 1.0;

/// Factor applied to the clamped raw temperature.
///
/// A temperature of 1.0 makes the solver ignore its search guidance entirely, so the usable
/// range is halved.
pub const TEMPERATURE_SCALE: f64 = 0.5;

/// A cleaned job request, ready to be sent to a computation unit.
///
/// Only constructible through [`JobRequest::from_raw`] (or [`JobRequest::new`], which applies
/// the same rules), so `letters` is never empty and holds only `a`-`z`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    letters: String,
    temperature: f64,
}

impl JobRequest {
    /// Clean user input into a request. Returns `None` when no usable letters remain.
    pub fn from_raw(raw_letters: &str, raw_temperature: f64) -> Option<Self> {
        let letters = clean_letters(raw_letters);
        if letters.is_empty() {
            return None;
        }

        Some(Self {
            letters,
            temperature: map_temperature(raw_temperature),
        })
    }

    /// Rebuild a request from values received over the wire.
    ///
    /// The same cleaning applies, but the temperature is only clamped to the final range
    /// since it has already been scaled by the sender.
    pub fn new(letters: &str, temperature: f64) -> Option<Self> {
        let letters = clean_letters(letters);
        if letters.is_empty() {
            return None;
        }

        let temperature = if temperature.is_nan() {
            0.0
        } else {
            temperature.clamp(0.0, MAX_RAW_TEMPERATURE * TEMPERATURE_SCALE)
        };

        Some(Self {
            letters,
            temperature,
        })
    }

    pub fn letters(&self) -> &str {
        &self.letters
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

/// Lowercase the input and keep only `a`-`z`.
///
/// Whitespace, digits, punctuation and non-ASCII characters are dropped. Idempotent.
pub fn clean_letters(raw: &str) -> String {
    raw.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_lowercase)
        .collect()
}

/// Clamp a raw slider value to `[0, 1]` and scale it into `[0, 0.5]`.
///
/// NaN maps to 0.
pub fn map_temperature(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, MAX_RAW_TEMPERATURE) * TEMPERATURE_SCALE
}
