use std::fmt::{self, Display};

use super::iu::{LockTarget, Mode, SwingMode};

/// A single command line sent to the bridge.
///
/// `Display` renders the exact text written on the wire (without the
/// trailing newline, which the codec appends).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Request<'a> {
    /// `set` -- general bridge information.
    Info,

    /// `ls2` -- status lines for every unit.
    ListUnits,

    /// `ls2 {id}`
    ListUnit(&'a str),

    /// `query {id} s` -- current swing code.
    QuerySwing(&'a str),

    TurnOn(&'a str),
    TurnOff(&'a str),

    SetFanSpeed {
        unit: &'a str,
        speed: &'a str,
    },

    SetMode {
        unit: &'a str,
        mode: Mode,
    },

    /// Sent as given, no rounding. Whole numbers keep one decimal
    /// (`22.0`, not `22`).
    SetThermostat {
        unit: &'a str,
        value: f64,
    },

    SetSwing {
        unit: &'a str,
        swing: SwingMode,
    },

    /// `filt {id}` -- acknowledge a cleaned filter.
    ResetFilter(&'a str),

    Lock {
        unit: &'a str,
        target: LockTarget,
        locked: bool,
    },

    /// Ambient temperature hint, rounded to one decimal.
    Feed {
        unit: &'a str,
        value: f64,
    },

    /// Arbitrary command text.
    Raw(&'a str),
}

impl Display for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Request::Info => write!(f, "set"),
            Request::ListUnits => write!(f, "ls2"),
            Request::ListUnit(unit) => write!(f, "ls2 {unit}"),
            Request::QuerySwing(unit) => write!(f, "query {unit} s"),
            Request::TurnOn(unit) => write!(f, "on {unit}"),
            Request::TurnOff(unit) => write!(f, "off {unit}"),
            Request::SetFanSpeed { unit, speed } => write!(f, "fspeed {unit} {speed}"),
            Request::SetMode { unit, mode } => write!(f, "{mode} {unit}"),
            Request::SetThermostat { unit, value } if value.fract() == 0.0 => write!(f, "temp {unit} {value:.1}"),
            Request::SetThermostat { unit, value } => write!(f, "temp {unit} {value}"),
            Request::SetSwing { unit, swing } => write!(f, "swing {unit} {}", swing.code()),
            Request::ResetFilter(unit) => write!(f, "filt {unit}"),
            Request::Lock { unit, target, locked } => {
                let sign = if locked { '+' } else { '-' };
                write!(f, "lock {unit} {sign}{}", target.code())
            }
            Request::Feed { unit, value } => write!(f, "feed {unit} {value:.1}"),
            Request::Raw(text) => f.write_str(text),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_text() {
        let unit = "L1.100";

        let cases = [
            (Request::Info, "set"),
            (Request::ListUnits, "ls2"),
            (Request::ListUnit(unit), "ls2 L1.100"),
            (Request::QuerySwing(unit), "query L1.100 s"),
            (Request::TurnOn(unit), "on L1.100"),
            (Request::TurnOff(unit), "off L1.100"),
            (Request::SetFanSpeed { unit, speed: "high" }, "fspeed L1.100 high"),
            (Request::SetMode { unit, mode: Mode::Heat }, "heat L1.100"),
            (Request::SetThermostat { unit, value: 22.5 }, "temp L1.100 22.5"),
            (Request::SetSwing { unit, swing: SwingMode::Angle45 }, "swing L1.100 4"),
            (Request::ResetFilter(unit), "filt L1.100"),
            (Request::Lock { unit, target: LockTarget::Power, locked: true }, "lock L1.100 +o"),
            (Request::Lock { unit, target: LockTarget::Thermostat, locked: false }, "lock L1.100 -t"),
            (Request::Lock { unit, target: LockTarget::Mode, locked: true }, "lock L1.100 +m"),
            (Request::Raw("props L1.100"), "props L1.100"),
        ];

        for (request, expected) in cases {
            assert_eq!(request.to_string(), expected);
        }
    }

    #[test]
    fn test_feed_is_rounded() {
        let request = Request::Feed { unit: "L1.100", value: 23.456 };
        assert_eq!(request.to_string(), "feed L1.100 23.5");

        let request = Request::Feed { unit: "L1.100", value: 20.0 };
        assert_eq!(request.to_string(), "feed L1.100 20.0");
    }

    #[test]
    fn test_thermostat_sent_as_given() {
        let request = Request::SetThermostat { unit: "L1.100", value: 21.25 };
        assert_eq!(request.to_string(), "temp L1.100 21.25");

        let request = Request::SetThermostat { unit: "L1.100", value: 22.0 };
        assert_eq!(request.to_string(), "temp L1.100 22.0");
    }
}
