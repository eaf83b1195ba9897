//! Interrupt-driven quadrature encoder counting.
//!
//! Each encoder gets its own task that waits on edges of channel A. The
//! running count lives in an atomic so the auton task can read and reset it
//! without locking.

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Input;
use portable_atomic::{AtomicI32, Ordering};

use super::quadrature_step;

pub static LEFT_COUNT: AtomicI32 = AtomicI32::new(0);
pub static RIGHT_COUNT: AtomicI32 = AtomicI32::new(0);

#[embassy_executor::task(pool_size = 2)]
pub async fn run(mut a: ExtiInput<'static>, b: Input<'static>, count: &'static AtomicI32) -> ! {
    loop {
        a.wait_for_any_edge().await;
        let step = quadrature_step(a.is_high(), b.is_high());
        count.fetch_add(step, Ordering::Relaxed);
    }
}
