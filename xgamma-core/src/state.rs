//! Gamma values and the per-channel state.

use std::fmt;

/// Lowest gamma accepted by the tool.
pub const MIN_GAMMA: f64 = 0.01;
/// Highest gamma accepted by the tool.
pub const MAX_GAMMA: f64 = 5.0;
/// Quantization step for every stored value.
pub const GAMMA_STEP: f64 = 0.01;
/// Identity gamma.
pub const DEFAULT_GAMMA: f64 = 1.0;

const MIN_HUNDREDTHS: u16 = 1;
const MAX_HUNDREDTHS: u16 = 500;
const DEFAULT_HUNDREDTHS: u16 = 100;

/// A display channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Red channel.
    Red,
    /// Green channel.
    Green,
    /// Blue channel.
    Blue,
}

impl Channel {
    /// All channels in command-line order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// The per-channel flag understood by `xgamma`.
    pub fn flag(self) -> &'static str {
        match self {
            Channel::Red => "-rgamma",
            Channel::Green => "-ggamma",
            Channel::Blue => "-bgamma",
        }
    }

    /// Human-readable channel name.
    pub fn label(self) -> &'static str {
        match self {
            Channel::Red => "Red",
            Channel::Green => "Green",
            Channel::Blue => "Blue",
        }
    }

    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// A gamma correction factor in `[0.01, 5.0]`, quantized to `0.01`.
///
/// Stored as hundredths so equality and formatting are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GammaValue(u16);

impl GammaValue {
    /// The smallest representable value, `0.01`.
    pub const MIN: GammaValue = GammaValue(MIN_HUNDREDTHS);
    /// The largest representable value, `5.00`.
    pub const MAX: GammaValue = GammaValue(MAX_HUNDREDTHS);
    /// Identity gamma, `1.00`.
    pub const DEFAULT: GammaValue = GammaValue(DEFAULT_HUNDREDTHS);

    /// Clamp `value` into range, then round half away from zero to two decimals.
    ///
    /// NaN has no nearest valid value and maps to [`GammaValue::DEFAULT`].
    /// Rounding works on the shortest decimal form of `value`, so `1.005`
    /// becomes `1.01` even though the nearest float is slightly below it.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::DEFAULT;
        }
        let clamped = value.clamp(MIN_GAMMA, MAX_GAMMA);
        Self::from_decimal(&format!("{clamped:.9}")).unwrap_or(Self::DEFAULT)
    }

    /// Parse user-typed text. Returns `None` when the text is not a number.
    ///
    /// Plain decimals such as `0.285` are rounded digit by digit. Other float
    /// syntax (`1e0`, `inf`) goes through [`GammaValue::new`]. `nan` is
    /// rejected like any other non-numeric text.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::from_decimal(text).or_else(|| {
            text.parse::<f64>()
                .ok()
                .filter(|value| !value.is_nan())
                .map(Self::new)
        })
    }

    /// Clamp and round an optionally signed `digits[.digits]` string.
    fn from_decimal(text: &str) -> Option<Self> {
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }

        // Bounds sit on the 0.01 grid, so rounding before clamping is the same
        // as clamping first.
        if negative {
            return Some(Self::MIN);
        }
        let whole = whole.trim_start_matches('0');
        if whole.len() > 3 {
            return Some(Self::MAX);
        }
        let whole: u32 = if whole.is_empty() { 0 } else { whole.parse().ok()? };

        let mut fraction = fraction.bytes().map(|b| u32::from(b - b'0'));
        let tenths = fraction.next().unwrap_or(0);
        let hundredths = fraction.next().unwrap_or(0);
        let round_up = fraction.next().is_some_and(|digit| digit >= 5);

        let total = whole * 100 + tenths * 10 + hundredths + u32::from(round_up);
        let clamped = total.clamp(u32::from(MIN_HUNDREDTHS), u32::from(MAX_HUNDREDTHS));
        u16::try_from(clamped).ok().map(Self)
    }

    /// The value as a float.
    pub fn get(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// The value in hundredths (`1..=500`).
    pub fn hundredths(self) -> u16 {
        self.0
    }
}

impl Default for GammaValue {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Always two decimal digits, e.g. `1.00`.
impl fmt::Display for GammaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl From<f64> for GammaValue {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

/// A snapshot of the three channel values, in Red, Green, Blue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GammaSnapshot {
    /// Red channel gamma.
    pub red: GammaValue,
    /// Green channel gamma.
    pub green: GammaValue,
    /// Blue channel gamma.
    pub blue: GammaValue,
}

impl GammaSnapshot {
    /// The same value on every channel.
    pub fn uniform(value: GammaValue) -> Self {
        Self {
            red: value,
            green: value,
            blue: value,
        }
    }

    /// Values as `[red, green, blue]`.
    pub fn to_array(self) -> [GammaValue; 3] {
        [self.red, self.green, self.blue]
    }
}

/// The current gamma of each channel.
///
/// "All" is not stored: [`GammaState::set_all`] writes the same value to
/// every channel, and [`GammaState::all`] only reports a value while the
/// channels agree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GammaState {
    channels: [GammaValue; 3],
}

impl GammaState {
    /// Create a state with identity gamma on every channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one channel, returning the stored (clamped and rounded) value.
    pub fn set_channel(&mut self, channel: Channel, value: f64) -> GammaValue {
        let stored = GammaValue::new(value);
        self.channels[channel.index()] = stored;
        stored
    }

    /// Set one channel from text. Unparseable text keeps the current value.
    pub fn set_channel_text(&mut self, channel: Channel, text: &str) -> GammaValue {
        match GammaValue::parse(text) {
            Some(value) => {
                self.channels[channel.index()] = value;
                value
            }
            None => self.channel(channel),
        }
    }

    /// Set every channel to the same value, returning it.
    pub fn set_all(&mut self, value: f64) -> GammaValue {
        let stored = GammaValue::new(value);
        self.channels = [stored; 3];
        stored
    }

    /// Set every channel from text. Unparseable text leaves the state untouched
    /// and returns `None`.
    pub fn set_all_text(&mut self, text: &str) -> Option<GammaValue> {
        let value = GammaValue::parse(text)?;
        self.channels = [value; 3];
        Some(value)
    }

    /// Current value of one channel.
    pub fn channel(&self, channel: Channel) -> GammaValue {
        self.channels[channel.index()]
    }

    /// The common value when all channels agree.
    pub fn all(&self) -> Option<GammaValue> {
        let [red, green, blue] = self.channels;
        (red == green && green == blue).then_some(red)
    }

    /// Mean of the three channels, for positioning an "All" control while
    /// the channels diverge. Not a stored value.
    pub fn average(&self) -> GammaValue {
        let sum: u32 = self.channels.iter().map(|v| u32::from(v.hundredths())).sum();
        GammaValue::new(f64::from(sum) / 300.0)
    }

    /// Replace all channels with a snapshot.
    pub fn load(&mut self, snapshot: GammaSnapshot) {
        self.channels = snapshot.to_array();
    }

    /// Current values in Red, Green, Blue order.
    pub fn snapshot(&self) -> GammaSnapshot {
        let [red, green, blue] = self.channels;
        GammaSnapshot { red, green, blue }
    }

    /// Restore identity gamma on every channel.
    pub fn reset(&mut self) {
        self.channels = [GammaValue::DEFAULT; 3];
    }

    /// Whether every channel is at identity gamma.
    pub fn is_default(&self) -> bool {
        self.all() == Some(GammaValue::DEFAULT)
    }

    /// Per-channel arguments for the tool: `-rgamma R -ggamma G -bgamma B`.
    pub fn to_command_arguments(&self) -> Vec<String> {
        Channel::ALL
            .iter()
            .flat_map(|&channel| [channel.flag().to_string(), self.channel(channel).to_string()])
            .collect()
    }

    /// Single-flag arguments (`-gamma V`) when the channels agree.
    pub fn overall_arguments(&self) -> Option<Vec<String>> {
        self.all()
            .map(|value| vec!["-gamma".to_string(), value.to_string()])
    }
}
