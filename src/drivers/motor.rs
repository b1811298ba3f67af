//! Cooling motor driver (DRV8871 H-bridge).
//!
//! Variable-speed control via LEDC PWM (ch0) and a digital direction
//! pin. The supervisory control loop only ever commands clockwise
//! rotation; reverse exists for bench diagnostics.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM and GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::app::ports::ActuatorPort;
use crate::drivers::hw_init;
use crate::fsm::context::MotorCommand;
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Stopped,
    Running { duty: u8, dir: Direction },
}

pub struct MotorDriver {
    state: MotorState,
    hw_duty: u8,
}

impl MotorDriver {
    pub fn new() -> Self {
        Self {
            state: MotorState::Stopped,
            hw_duty: 0,
        }
    }

    pub fn set(&mut self, duty: u8, direction: Direction) {
        let duty = duty.min(100);
        if duty == 0 {
            self.stop();
            return;
        }

        self.set_direction_hw(direction);
        self.set_duty_hw(duty);

        self.hw_duty = duty;
        self.state = MotorState::Running {
            duty,
            dir: direction,
        };
    }

    pub fn stop(&mut self) {
        self.set_duty_hw(0);
        self.set_direction_hw(Direction::Clockwise);
        self.hw_duty = 0;
        self.state = MotorState::Stopped;
    }

    fn set_direction_hw(&self, dir: Direction) {
        let high = matches!(dir, Direction::Clockwise);
        hw_init::gpio_write(pins::MOTOR_DIR_GPIO, high);
    }

    fn set_duty_hw(&self, duty: u8) {
        let duty_8bit = ((duty as u16) * 255 / 100) as u8;
        hw_init::ledc_set(hw_init::LEDC_CH_MOTOR, duty_8bit);
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.state, MotorState::Stopped)
    }

    pub fn current_duty(&self) -> u8 {
        self.hw_duty
    }
}

impl Default for MotorDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for MotorDriver {
    fn set_motor(&mut self, cmd: MotorCommand) {
        match cmd {
            MotorCommand::Stop => self.stop(),
            MotorCommand::Clockwise { duty } => self.set(duty, Direction::Clockwise),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_command_zeroes_duty() {
        let mut motor = MotorDriver::new();
        motor.set_motor(MotorCommand::Clockwise { duty: 75 });
        assert!(motor.is_running());

        motor.set_motor(MotorCommand::Stop);
        assert_eq!(motor.state(), MotorState::Stopped);
        assert_eq!(motor.current_duty(), 0);
    }

    #[test]
    fn duty_is_tracked_and_clamped() {
        let mut motor = MotorDriver::new();
        motor.set(50, Direction::Clockwise);
        assert_eq!(motor.current_duty(), 50);

        motor.set(250, Direction::Clockwise);
        assert_eq!(motor.current_duty(), 100);
    }

    #[test]
    fn zero_duty_set_is_a_stop() {
        let mut motor = MotorDriver::new();
        motor.set(60, Direction::Clockwise);
        motor.set(0, Direction::Clockwise);
        assert_eq!(motor.state(), MotorState::Stopped);
    }
}
