//! Pulse-width actuator outputs.
//!
//! The controller commands two actuators by pulse width in microseconds.
//! [`PulseOutput`] is the seam; [`ServoPwm`] implements it on any
//! `embedded_hal::pwm::SetDutyCycle` channel running a standard 50 Hz servo
//! frame.

use embedded_hal::pwm::SetDutyCycle;

/// Length of one servo frame (50 Hz).
pub const FRAME_MICROS: u16 = 20_000;

/// An output whose high time per frame encodes a commanded position.
pub trait PulseOutput {
    /// Error reported by the underlying hardware.
    type Error;

    /// Sets the high time of each frame, in microseconds.
    fn set_pulse_width(&mut self, micros: u16) -> Result<(), Self::Error>;
}

/// A servo on one PWM channel whose period is [`FRAME_MICROS`].
#[derive(Debug)]
pub struct ServoPwm<P> {
    pwm: P,
}

impl<P: SetDutyCycle> ServoPwm<P> {
    /// Wraps a PWM channel already configured for a 20 ms period.
    pub fn new(pwm: P) -> Self {
        Self { pwm }
    }

    /// Gives back the PWM channel.
    pub fn release(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> PulseOutput for ServoPwm<P> {
    type Error = P::Error;

    fn set_pulse_width(&mut self, micros: u16) -> Result<(), Self::Error> {
        self.pwm
            .set_duty_cycle_fraction(micros.min(FRAME_MICROS), FRAME_MICROS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::pwm::ErrorType;

    struct FakePwm {
        max: u16,
        duty: Option<u16>,
    }

    impl ErrorType for FakePwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for FakePwm {
        fn max_duty_cycle(&self) -> u16 {
            self.max
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.duty = Some(duty);
            Ok(())
        }
    }

    #[test]
    fn test_pulse_maps_onto_duty_range() {
        let mut servo = ServoPwm::new(FakePwm {
            max: 20_000,
            duty: None,
        });
        servo.set_pulse_width(1500).unwrap();
        assert_eq!(servo.pwm.duty, Some(1500));

        let mut servo = ServoPwm::new(FakePwm {
            max: 1000,
            duty: None,
        });
        servo.set_pulse_width(2000).unwrap();
        assert_eq!(servo.release().duty, Some(100));
    }

    #[test]
    fn test_pulse_longer_than_frame_saturates() {
        let mut servo = ServoPwm::new(FakePwm {
            max: 20_000,
            duty: None,
        });
        servo.set_pulse_width(u16::MAX).unwrap();
        assert_eq!(servo.release().duty, Some(20_000));
    }
}
