use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::Error;

/// Operating mode of an indoor unit.
///
/// The bridge reports modes capitalised (`Cool`) in status lines and
/// accepts them lowercase as commands. `FromStr` is case-insensitive for
/// reading status lines; [`Mode::parse_arg`] only takes the lowercase names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    Auto,
    Cool,
    Dry,
    Fan,
    Heat,
}

impl Mode {
    /// Parse a caller supplied mode, reporting the valid set on failure.
    ///
    /// Names are matched exactly: `"dry"` is accepted, `"DRY"` is not.
    pub fn parse_arg(value: &str) -> Result<Self, Error> {
        Mode::iter().find(|mode| mode.as_ref() == value).ok_or_else(|| {
            let valid: Vec<_> = Mode::iter().map(|mode| mode.to_string()).collect();
            Error::Validation(format!("Unrecognized mode {value}. Valid values: {}", valid.join(" ")))
        })
    }
}

/// Louver sweep behaviour of an indoor unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
pub enum SwingMode {
    #[strum(serialize = "auto")]
    Auto,
    #[strum(serialize = "horizontal")]
    Horizontal,
    #[strum(serialize = "30")]
    Angle30,
    #[strum(serialize = "45")]
    Angle45,
    #[strum(serialize = "60")]
    Angle60,
    #[strum(serialize = "vertical")]
    Vertical,
    #[strum(serialize = "stop")]
    Stop,
}

impl SwingMode {
    /// Single character used on the wire (`swing` command and `query {id} s` reply).
    pub fn code(self) -> char {
        match self {
            SwingMode::Auto => 'a',
            SwingMode::Horizontal => 'h',
            SwingMode::Angle30 => '3',
            SwingMode::Angle45 => '4',
            SwingMode::Angle60 => '6',
            SwingMode::Vertical => 'v',
            SwingMode::Stop => 'x',
        }
    }

    /// Decode a raw swing query reply. Anything other than a single known code is `None`.
    pub fn from_code(raw: &str) -> Option<Self> {
        let mut chars = raw.chars();
        let code = chars.next()?;
        if chars.next().is_some() {
            return None;
        }

        SwingMode::iter().find(|mode| mode.code() == code)
    }

    /// Parse a caller supplied swing mode name, reporting the valid set on failure.
    pub fn parse_arg(value: &str) -> Result<Self, Error> {
        value.parse().map_err(|_| {
            let valid: Vec<_> = SwingMode::iter().map(|mode| mode.to_string()).collect();
            Error::Validation(format!("Unrecognized swing mode {value}. Valid values: {}", valid.join(", ")))
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemperatureUnit {
    Celsius,
    Imperial,
}

impl TemperatureUnit {
    pub fn suffix(self) -> char {
        match self {
            TemperatureUnit::Celsius => 'C',
            TemperatureUnit::Imperial => 'F',
        }
    }

    pub fn from_suffix(suffix: char) -> Option<Self> {
        match suffix {
            'C' => Some(TemperatureUnit::Celsius),
            'F' => Some(TemperatureUnit::Imperial),
            _ => None,
        }
    }

    /// Render a temperature the way the bridge prints it in status lines (`021.5C`).
    pub fn format(self, value: f64) -> String {
        format!("{value:05.1}{}", self.suffix())
    }
}

/// Which control a `lock` command applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockTarget {
    /// On/off button.
    Power,
    Thermostat,
    Mode,
}

impl LockTarget {
    pub fn code(self) -> char {
        match self {
            LockTarget::Power => 'o',
            LockTarget::Thermostat => 't',
            LockTarget::Mode => 'm',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'o' => Some(LockTarget::Power),
            't' => Some(LockTarget::Thermostat),
            'm' => Some(LockTarget::Mode),
            _ => None,
        }
    }
}
