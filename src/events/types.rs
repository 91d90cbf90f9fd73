// Gait event types
// Defines gait markers, trigger codes, laterality, and label derivation

use serde::{Deserialize, Serialize};

/// Digit value marking an untracked or ambiguous locomotion mode
pub const INVALID_MODE_DIGIT: u8 = 6;

/// Number of valid locomotion modes (digits 0-5)
pub const MODE_COUNT: u8 = 6;

/// Body side an event or channel belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Laterality {
    Left,
    Right,
}

impl Laterality {
    pub fn opposite(&self) -> Self {
        match self {
            Laterality::Left => Laterality::Right,
            Laterality::Right => Laterality::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Laterality::Left => "Left",
            Laterality::Right => "Right",
        }
    }
}

/// The four sparse event-marker columns of a trial table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GaitMarker {
    RightHeelContact,
    RightToeOff,
    LeftHeelContact,
    LeftToeOff,
}

impl GaitMarker {
    /// Scan order used by the extractor
    pub const ALL: [GaitMarker; 4] = [
        GaitMarker::RightHeelContact,
        GaitMarker::RightToeOff,
        GaitMarker::LeftHeelContact,
        GaitMarker::LeftToeOff,
    ];

    /// Marker column header; cells hold the row index of the event
    pub fn column_name(&self) -> &'static str {
        match self {
            GaitMarker::RightHeelContact => "Right_Heel_Contact",
            GaitMarker::RightToeOff => "Right_Toe_Off",
            GaitMarker::LeftHeelContact => "Left_Heel_Contact",
            GaitMarker::LeftToeOff => "Left_Toe_Off",
        }
    }

    /// Paired trigger-code column header
    pub fn trigger_column(&self) -> String {
        format!("{}_Trigger", self.column_name())
    }

    pub fn laterality(&self) -> Laterality {
        match self {
            GaitMarker::RightHeelContact | GaitMarker::RightToeOff => Laterality::Right,
            GaitMarker::LeftHeelContact | GaitMarker::LeftToeOff => Laterality::Left,
        }
    }
}

/// How a trigger code maps to a class label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelScheme {
    /// Terminal mode only, 6 classes
    #[default]
    Terminal,

    /// `prior * 6 + terminal`, 36 classes
    PriorTerminal,
}

impl LabelScheme {
    pub fn num_classes(&self) -> usize {
        match self {
            LabelScheme::Terminal => MODE_COUNT as usize,
            LabelScheme::PriorTerminal => (MODE_COUNT as usize) * (MODE_COUNT as usize),
        }
    }

    /// Accepts the scheme names plus the class counts "6" / "36"
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "terminal" | "6" => Some(LabelScheme::Terminal),
            "prior_terminal" | "prior-terminal" | "36" => Some(LabelScheme::PriorTerminal),
            _ => None,
        }
    }
}

/// Whether an example observes a steady locomotion mode or a change of mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleType {
    SteadyState,
    Transitional,
}

impl SampleType {
    pub fn is_steady_state(&self) -> bool {
        matches!(self, SampleType::SteadyState)
    }
}

/// Three-digit trigger code: (prior mode, transition flag, terminal mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCode {
    pub prior: u8,
    pub flag: u8,
    pub terminal: u8,
}

impl TriggerCode {
    pub fn from_digits(prior: u8, flag: u8, terminal: u8) -> Self {
        TriggerCode {
            prior,
            flag,
            terminal,
        }
    }

    /// Parse a numeric trigger cell
    /// The value is truncated to an integer and read as a zero-padded
    /// three digit string; anything outside 0..=999 is rejected
    pub fn parse(raw: f64) -> Option<Self> {
        if !raw.is_finite() {
            return None;
        }

        let code = raw.trunc();
        if !(0.0..=999.0).contains(&code) {
            return None;
        }

        let digits = format!("{:03}", code as u32);
        Self::parse_str(&digits)
    }

    /// Parse an exact three-digit string such as "203"
    pub fn parse_str(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(TriggerCode {
            prior: bytes[0] - b'0',
            flag: bytes[1] - b'0',
            terminal: bytes[2] - b'0',
        })
    }

    /// False when prior or terminal carries the invalid-mode sentinel
    pub fn is_valid(&self) -> bool {
        self.prior != INVALID_MODE_DIGIT && self.terminal != INVALID_MODE_DIGIT
    }

    pub fn sample_type(&self) -> SampleType {
        if self.prior == self.terminal {
            SampleType::SteadyState
        } else {
            SampleType::Transitional
        }
    }

    pub fn label(&self, scheme: LabelScheme) -> u8 {
        match scheme {
            LabelScheme::Terminal => self.terminal,
            LabelScheme::PriorTerminal => self.prior * MODE_COUNT + self.terminal,
        }
    }
}

/// A gait event occurrence extracted from one trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaitEvent {
    /// Row index of the event in the trial table
    pub timestep: usize,

    pub trigger: TriggerCode,

    pub laterality: Laterality,
}

impl GaitEvent {
    pub fn label(&self, scheme: LabelScheme) -> u8 {
        self.trigger.label(scheme)
    }

    pub fn sample_type(&self) -> SampleType {
        self.trigger.sample_type()
    }
}
