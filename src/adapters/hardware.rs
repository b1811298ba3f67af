//! Hardware adapter: binds the sensor and actuator ports to the board.
//!
//! Owns the LM35 sensor and the motor driver and presents them to the
//! supervisor as one object satisfying both [`SensorPort`] and
//! [`ActuatorPort`] (the cycle takes them as a single generic).

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::motor::{MotorDriver, MotorState};
use crate::fsm::context::MotorCommand;
use crate::pins;
use crate::sensors::temperature::Lm35Sensor;

pub struct HardwareAdapter {
    sensor: Lm35Sensor,
    motor: MotorDriver,
}

impl HardwareAdapter {
    pub fn new() -> Self {
        Self {
            sensor: Lm35Sensor::new(pins::TEMP_ADC_GPIO),
            motor: MotorDriver::new(),
        }
    }

    /// Current motor state, for telemetry logging.
    pub fn motor_state(&self) -> MotorState {
        self.motor.state()
    }
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for HardwareAdapter {
    fn read_temperature(&mut self) -> u8 {
        self.sensor.read().celsius
    }
}

impl ActuatorPort for HardwareAdapter {
    fn set_motor(&mut self, cmd: MotorCommand) {
        self.motor.set_motor(cmd);
    }
}
