use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, AdcChannel};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, Output, OutputType, Pull, Speed};
use embassy_stm32::time::khz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::signal::Signal;
use static_cell::StaticCell;

use crate::competition::CompetitionMode;
use crate::hw::encoders::{self, LEFT_COUNT, RIGHT_COUNT};
use crate::hw::motors::MotorBank;
use crate::hw::sensors::{AnalogChannels, SensorBank};
use crate::hw::RobotHardware;
use auton_core::orchestrator::AutonomousSession;
use auton_core::routines::register_default_routines;

mod auton_task;
mod field_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// Raised by the field task whenever the competition mode changes.
pub(super) static MODE_CHANGED: Signal<ThreadModeRawMutex, CompetitionMode> = Signal::new();

static SESSION: StaticCell<AutonomousSession> = StaticCell::new();

const PWM_FREQUENCY_KHZ: u32 = 20;

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA4,
        PA5,
        PA8,
        PA9,
        PA10,
        PA15,
        PB3,
        PB4,
        PB5,
        PB6,
        PB7,
        PB8,
        PB9,
        PB10,
        PB11,
        PB12,
        PB13,
        PB14,
        PB15,
        PC6,
        PC7,
        PC8,
        PC9,
        EXTI8,
        EXTI10,
        ADC1,
        TIM2,
        TIM3,
        ..
    } = hal::init(config);

    let drive_pwm = SimplePwm::new(
        TIM3,
        Some(PwmPin::new(PC6, OutputType::PushPull)),
        Some(PwmPin::new(PC7, OutputType::PushPull)),
        Some(PwmPin::new(PC8, OutputType::PushPull)),
        Some(PwmPin::new(PC9, OutputType::PushPull)),
        khz(PWM_FREQUENCY_KHZ),
        CountingMode::EdgeAlignedUp,
    );
    let mechanism_pwm = SimplePwm::new(
        TIM2,
        Some(PwmPin::new(PA15, OutputType::PushPull)),
        Some(PwmPin::new(PB3, OutputType::PushPull)),
        Some(PwmPin::new(PB10, OutputType::PushPull)),
        None,
        khz(PWM_FREQUENCY_KHZ),
        CountingMode::EdgeAlignedUp,
    );
    let directions = [
        Output::new(PB4, Level::Low, Speed::Low),
        Output::new(PB5, Level::Low, Speed::Low),
        Output::new(PB6, Level::Low, Speed::Low),
        Output::new(PB7, Level::Low, Speed::Low),
        Output::new(PB8, Level::Low, Speed::Low),
        Output::new(PB9, Level::Low, Speed::Low),
        Output::new(PB11, Level::Low, Speed::Low),
    ];
    let motors = MotorBank::new(drive_pwm, mechanism_pwm, directions);

    let sensors = SensorBank::new(
        Adc::new(ADC1),
        AnalogChannels {
            lift: PA0.degrade_adc(),
            arm: PA1.degrade_adc(),
            claw: PA4.degrade_adc(),
            sonar: PA5.degrade_adc(),
        },
    );
    let led = Output::new(PB13, Level::Low, Speed::Low);
    let hardware = RobotHardware::new(motors, sensors, led);

    let session = SESSION.init(AutonomousSession::new());
    register_default_routines(session.routines_mut()).expect("routine registration");

    spawner
        .spawn(encoders::run(
            ExtiInput::new(PA8, EXTI8, Pull::Up),
            Input::new(PA9, Pull::Up),
            &LEFT_COUNT,
        ))
        .expect("failed to spawn left encoder task");
    spawner
        .spawn(encoders::run(
            ExtiInput::new(PA10, EXTI10, Pull::Up),
            Input::new(PB15, Pull::Up),
            &RIGHT_COUNT,
        ))
        .expect("failed to spawn right encoder task");

    spawner
        .spawn(field_task::run(
            Input::new(PB12, Pull::Down),
            Input::new(PB14, Pull::Down),
        ))
        .expect("failed to spawn field task");

    spawner
        .spawn(auton_task::run(session, hardware))
        .expect("failed to spawn auton task");

    core::future::pending::<()>().await;
}
