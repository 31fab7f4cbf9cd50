use std::str::FromStr;

use super::iu::{Mode, TemperatureUnit};
use crate::error::Error;

/// Number of whitespace separated fields in an `ls2` status line.
pub const STATUS_FIELDS: usize = 9;

/// Length of a unit identifier (`L1.100`).
pub const UNIT_ID_LEN: usize = 6;

/// Error field value meaning "no error".
const NO_ERROR: &str = "OK";

/// Parsed `ls2` status line:
///
/// `id ON|OFF <thermostat><C|F> <temperature><C|F> <fan> <mode> <error>|OK #|- 0|1`
///
/// Parsing is strict: a temperature suffix other than `C` or `F` and a mode
/// outside [`Mode`] are both [`Error::Protocol`]. In a bulk `ls2` listing
/// either one fails the whole listing.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitStatus {
    pub is_on: bool,

    /// Unit of both temperatures, taken from the thermostat suffix.
    pub temperature_unit: TemperatureUnit,

    /// Setpoint temperature
    pub thermostat: f64,

    /// Room temperature
    pub temperature: f64,

    /// Lowercased as reported (`low`, `med`, `high`, `auto`, ...)
    pub fan_speed: String,

    pub mode: Mode,

    /// `None` when the bridge reports `OK`
    pub error_code: Option<String>,

    /// Filter needs cleaning (`#`)
    pub clean_filter: bool,

    /// Unit is demanding compressor ON (`1`)
    pub demand: bool,
}

impl UnitStatus {
    pub fn parse(line: &str) -> Result<Self, Error> {
        let fields: Vec<&str> = line.split_whitespace().collect();

        let [_id, power, thermostat, temperature, fan_speed, mode, error_code, filter, demand] = fields[..] else {
            return Err(Error::Protocol(format!(
                "unexpected status line format, expected {STATUS_FIELDS} fields: {fields:?}"
            )));
        };

        let (thermostat, temperature_unit) = parse_temperature(thermostat)?;
        let (temperature, _) = parse_temperature(temperature)?;

        let mode = mode.parse::<Mode>()
            .map_err(|_| Error::Protocol(format!("unknown mode {mode:?} in status line {line:?}")))?;

        Ok(Self {
            is_on: power == "ON",
            temperature_unit,
            thermostat,
            temperature,
            fan_speed: fan_speed.to_lowercase(),
            mode,
            error_code: (error_code != NO_ERROR).then(|| error_code.to_string()),
            clean_filter: filter == "#",
            demand: demand == "1",
        })
    }
}

impl FromStr for UnitStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnitStatus::parse(s)
    }
}

/// Split a temperature token (`023.5C`) into its value and unit.
fn parse_temperature(token: &str) -> Result<(f64, TemperatureUnit), Error> {
    let mut chars = token.chars();

    let unit = chars.next_back()
        .and_then(TemperatureUnit::from_suffix)
        .ok_or_else(|| Error::Protocol(format!("temperature {token:?} has no C/F suffix")))?;

    let value = chars.as_str().parse::<f64>()
        .map_err(|_| Error::Protocol(format!("invalid temperature {token:?}")))?;

    Ok((value, unit))
}
