use embassy_stm32::gpio::Input;
use embassy_time::{Duration, Ticker};

use super::MODE_CHANGED;
use crate::competition::{self, FieldDebouncer};

const POLL_PERIOD: Duration = Duration::from_millis(5);

#[embassy_executor::task]
pub async fn run(enabled: Input<'static>, autonomous: Input<'static>) -> ! {
    let mut debouncer = FieldDebouncer::new();
    let mut ticker = Ticker::every(POLL_PERIOD);

    loop {
        ticker.next().await;
        let Some(mode) = debouncer.sample(enabled.is_high(), autonomous.is_high()) else {
            continue;
        };
        let previous = competition::set_mode(mode);
        if previous != mode {
            defmt::info!("field: {} -> {}", previous, mode);
            MODE_CHANGED.signal(mode);
        }
    }
}
