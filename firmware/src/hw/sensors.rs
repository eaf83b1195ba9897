//! Analog and encoder sensor reads.

use auton_core::devices::SensorId;
use embassy_stm32::adc::{Adc, AnyAdcChannel, SampleTime};
use embassy_stm32::peripherals::ADC1;
use portable_atomic::Ordering;

use super::encoders::{LEFT_COUNT, RIGHT_COUNT};
use super::sonar_centimeters;

pub struct AnalogChannels {
    pub lift: AnyAdcChannel<ADC1>,
    pub arm: AnyAdcChannel<ADC1>,
    pub claw: AnyAdcChannel<ADC1>,
    pub sonar: AnyAdcChannel<ADC1>,
}

pub struct SensorBank<'d> {
    adc: Adc<'d, ADC1>,
    channels: AnalogChannels,
}

impl<'d> SensorBank<'d> {
    pub fn new(mut adc: Adc<'d, ADC1>, channels: AnalogChannels) -> Self {
        adc.set_sample_time(SampleTime::CYCLES160_5);
        Self { adc, channels }
    }

    /// `None` when the sensor cannot produce a reading.
    pub fn read(&mut self, sensor: SensorId) -> Option<i32> {
        match sensor {
            SensorId::LeftEncoder => Some(LEFT_COUNT.load(Ordering::Relaxed)),
            SensorId::RightEncoder => Some(RIGHT_COUNT.load(Ordering::Relaxed)),
            SensorId::LiftPot => Some(self.adc.blocking_read(&mut self.channels.lift).into()),
            SensorId::ArmPot => Some(self.adc.blocking_read(&mut self.channels.arm).into()),
            SensorId::ClawPot => Some(self.adc.blocking_read(&mut self.channels.claw).into()),
            SensorId::Sonar => sonar_centimeters(self.adc.blocking_read(&mut self.channels.sonar)),
        }
    }

    /// Only the encoders hold state worth zeroing.
    pub fn reset(&mut self, sensor: SensorId) {
        match sensor {
            SensorId::LeftEncoder => LEFT_COUNT.store(0, Ordering::Relaxed),
            SensorId::RightEncoder => RIGHT_COUNT.store(0, Ordering::Relaxed),
            _ => {}
        }
    }
}
