//! One-shot visual acknowledgment of a forwarded packet.

use embassy_time::{Duration, Timer};
use embedded_hal::digital::OutputPin;

/// Something that can flash once to acknowledge a received packet.
#[allow(async_fn_in_trait)]
pub trait Indicator {
    /// Emits one acknowledgment.
    async fn acknowledge(&mut self);
}

/// No acknowledgment at all.
impl Indicator for () {
    async fn acknowledge(&mut self) {}
}

/// An active-low LED that is lit for a fixed time per acknowledgment.
#[derive(Debug)]
pub struct BlinkLed<P> {
    led: P,
    on_time: Duration,
}

impl<P: OutputPin> BlinkLed<P> {
    /// Wraps `led` with a 50 ms blink.
    pub fn new(led: P) -> Self {
        Self::with_on_time(led, Duration::from_millis(50))
    }

    /// Wraps `led` with a custom blink length.
    pub fn with_on_time(led: P, on_time: Duration) -> Self {
        Self { led, on_time }
    }

    /// Gives back the pin.
    pub fn release(self) -> P {
        self.led
    }
}

impl<P: OutputPin> Indicator for BlinkLed<P> {
    async fn acknowledge(&mut self) {
        // pin errors only cost us the blink
        let _ = self.led.set_low();
        Timer::after(self.on_time).await;
        let _ = self.led.set_high();
    }
}
