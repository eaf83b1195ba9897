//! H-bridge motor outputs.
//!
//! Each wired port is one PWM channel for speed plus one GPIO for direction.
//! Ports 1, 5 and 10 are not populated on this board.

use auton_core::drive::PortWrite;
use embassy_stm32::gpio::Output;
use embassy_stm32::peripherals::{TIM2, TIM3};
use embassy_stm32::timer::Channel;
use embassy_stm32::timer::simple_pwm::SimplePwm;

use super::{Direction, duty_for};
use auton_core::devices::MOTOR_LIMIT;

#[derive(Clone, Copy)]
enum Bank {
    Drive,
    Mechanism,
}

/// Port number, PWM bank, channel, and direction pin slot.
const WIRING: [(u8, Bank, Channel, usize); 7] = [
    (6, Bank::Drive, Channel::Ch1, 0),
    (7, Bank::Drive, Channel::Ch2, 1),
    (8, Bank::Drive, Channel::Ch3, 2),
    (9, Bank::Drive, Channel::Ch4, 3),
    (2, Bank::Mechanism, Channel::Ch1, 4),
    (3, Bank::Mechanism, Channel::Ch2, 5),
    (4, Bank::Mechanism, Channel::Ch3, 6),
];

pub struct MotorBank<'d> {
    drive: SimplePwm<'d, TIM3>,
    mechanism: SimplePwm<'d, TIM2>,
    directions: [Output<'d>; 7],
}

impl<'d> MotorBank<'d> {
    pub fn new(
        mut drive: SimplePwm<'d, TIM3>,
        mut mechanism: SimplePwm<'d, TIM2>,
        directions: [Output<'d>; 7],
    ) -> Self {
        for (_, bank, channel, _) in WIRING {
            match bank {
                Bank::Drive => drive.channel(channel).enable(),
                Bank::Mechanism => mechanism.channel(channel).enable(),
            }
        }
        let mut bank = Self {
            drive,
            mechanism,
            directions,
        };
        bank.stop();
        bank
    }

    pub fn apply(&mut self, writes: &[PortWrite]) {
        for write in writes {
            self.set(write.port.number(), write.value);
        }
    }

    pub fn stop(&mut self) {
        for (port, ..) in WIRING {
            self.set(port, 0);
        }
    }

    fn set(&mut self, port: u8, value: i16) {
        let Some(&(_, bank, channel, slot)) = WIRING.iter().find(|wiring| wiring.0 == port) else {
            return;
        };
        let (duty, direction) = duty_for(value);
        let limit = MOTOR_LIMIT.unsigned_abs();
        match bank {
            Bank::Drive => self.drive.channel(channel).set_duty_cycle_fraction(duty, limit),
            Bank::Mechanism => self
                .mechanism
                .channel(channel)
                .set_duty_cycle_fraction(duty, limit),
        }
        match direction {
            Direction::Forward => self.directions[slot].set_low(),
            Direction::Reverse => self.directions[slot].set_high(),
        }
    }
}
