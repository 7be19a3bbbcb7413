//! Message identifiers.
//!
//! Inbound telemetry ids and outbound command ids are independent id spaces
//! that happen to overlap numerically.

/// Inbound: filament diameter.
pub const DIAMETER: u8 = 0x01;
/// Inbound: heater temperature.
pub const TEMPERATURE: u8 = 0x02;
/// Inbound: spooler speed.
pub const SPOOLER_RPM_READING: u8 = 0x03;
/// Inbound: screw speed.
pub const SCREW_RPM_READING: u8 = 0x04;
/// Inbound: heater duty cycle.
pub const HEATER_PWM_READING: u8 = 0x05;
/// Inbound: contact switch state.
pub const CONTACT_SWITCH: u8 = 0x06;

/// Outbound: manual/automatic mode switch.
pub const MODE_SWITCH: u8 = 0x01;
/// Outbound: start the automatic run.
pub const AUTO_START: u8 = 0x02;
/// Outbound: spooler speed setpoint.
pub const SPOOLER_RPM: u8 = 0x03;
/// Outbound: screw speed setpoint.
pub const SCREW_RPM: u8 = 0x04;
/// Outbound: heater duty cycle setpoint.
pub const HEATER_PWM: u8 = 0x05;
/// Outbound: emergency stop.
pub const EMERGENCY_STOP: u8 = 0x06;

/// Returns a human-readable name for an inbound telemetry id.
pub fn telemetry_name(id: u8) -> &'static str {
    match id {
        DIAMETER => "diameter",
        TEMPERATURE => "temperature",
        SPOOLER_RPM_READING => "spoolerRpm",
        SCREW_RPM_READING => "screwRpm",
        HEATER_PWM_READING => "heaterPwm",
        CONTACT_SWITCH => "contactSwitch",
        _ => "unknown",
    }
}

/// An operator command sent to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    ModeSwitch,
    AutoStart,
    SpoolerRpm,
    ScrewRpm,
    HeaterPwm,
    EmergencyStop,
}

impl ControlCommand {
    pub const ALL: [ControlCommand; 6] = [
        ControlCommand::ModeSwitch,
        ControlCommand::AutoStart,
        ControlCommand::SpoolerRpm,
        ControlCommand::ScrewRpm,
        ControlCommand::HeaterPwm,
        ControlCommand::EmergencyStop,
    ];

    /// Wire identifier of this command.
    pub fn id(self) -> u8 {
        match self {
            ControlCommand::ModeSwitch => MODE_SWITCH,
            ControlCommand::AutoStart => AUTO_START,
            ControlCommand::SpoolerRpm => SPOOLER_RPM,
            ControlCommand::ScrewRpm => SCREW_RPM,
            ControlCommand::HeaterPwm => HEATER_PWM,
            ControlCommand::EmergencyStop => EMERGENCY_STOP,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ControlCommand::ModeSwitch => "mode-switch",
            ControlCommand::AutoStart => "auto-start",
            ControlCommand::SpoolerRpm => "spooler-rpm",
            ControlCommand::ScrewRpm => "screw-rpm",
            ControlCommand::HeaterPwm => "heater-pwm",
            ControlCommand::EmergencyStop => "emergency-stop",
        }
    }

    /// Value sent when the operator gives none. Start and stop are buttons.
    pub fn default_value(self) -> Option<u32> {
        match self {
            ControlCommand::AutoStart | ControlCommand::EmergencyStop => Some(1),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_ids_are_distinct() {
        let mut ids: Vec<u8> = ControlCommand::ALL.iter().map(|cmd| cmd.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ControlCommand::ALL.len());
    }

    #[test]
    fn only_buttons_have_default_values() {
        assert_eq!(ControlCommand::AutoStart.default_value(), Some(1));
        assert_eq!(ControlCommand::EmergencyStop.default_value(), Some(1));
        assert_eq!(ControlCommand::HeaterPwm.default_value(), None);
    }

    #[test]
    fn telemetry_names() {
        assert_eq!(telemetry_name(DIAMETER), "diameter");
        assert_eq!(telemetry_name(CONTACT_SWITCH), "contactSwitch");
        assert_eq!(telemetry_name(0x42), "unknown");
    }
}
