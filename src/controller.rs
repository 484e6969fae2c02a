//! Mode decoding: turns each [`RadioPacket`] into actuator pulses and
//! display commands.
//!
//! The controller keeps no state between packets. It waits on the radio
//! queue without a timeout and pushes to the display queue with a waiting
//! send, so a slow display stalls the controller rather than losing a
//! command.

use core::fmt::{self, Write};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Receiver, Sender};

use crate::config::ControllerConfig;
use crate::consts::{DISPLAY_QUEUE_DEPTH, RADIO_QUEUE_DEPTH};
use crate::packet::{DisplayCommand, Mode, RadioPacket, Text};
use crate::servo::PulseOutput;

/// Shortest pulse ever commanded, in microseconds.
pub const PULSE_MIN: u16 = 500;
/// Longest pulse ever commanded, in microseconds.
pub const PULSE_MAX: u16 = 2500;
/// Pulse for an axis sample of 0.
pub const PULSE_BASE: u16 = 1000;
/// Pulse increase across the full axis range 0..=255.
pub const PULSE_SPAN: u16 = 1000;

/// Maps an axis sample onto a pulse width: `1000 + v * 1000 / 255`.
///
/// The result lies in `1000..=2000`, well inside the clamp range.
pub const fn axis_to_pulse(value: u8) -> u16 {
    trimmed_pulse(value, 0)
}

/// Like [`axis_to_pulse`] with `trim` microseconds added, then clamped to
/// `PULSE_MIN..=PULSE_MAX`.
pub const fn trimmed_pulse(value: u8, trim: i16) -> u16 {
    let pulse = PULSE_BASE as i32 + value as i32 * PULSE_SPAN as i32 / 255 + trim as i32;
    if pulse < PULSE_MIN as i32 {
        PULSE_MIN
    } else if pulse > PULSE_MAX as i32 {
        PULSE_MAX
    } else {
        pulse as u16
    }
}

/// The control stage of the pipeline.
pub struct Controller<'a, M, X, Y>
where
    M: RawMutex,
{
    packets: Receiver<'a, M, RadioPacket, RADIO_QUEUE_DEPTH>,
    display: Sender<'a, M, DisplayCommand, DISPLAY_QUEUE_DEPTH>,
    x: X,
    y: Y,
    config: ControllerConfig,
}

impl<'a, M, X, Y> Controller<'a, M, X, Y>
where
    M: RawMutex,
    X: PulseOutput,
    Y: PulseOutput,
{
    /// Creates a controller driving actuator `x` from payload byte 0 and `y`
    /// from payload byte 1.
    pub fn new(
        packets: Receiver<'a, M, RadioPacket, RADIO_QUEUE_DEPTH>,
        display: Sender<'a, M, DisplayCommand, DISPLAY_QUEUE_DEPTH>,
        x: X,
        y: Y,
        config: ControllerConfig,
    ) -> Self {
        Self {
            packets,
            display,
            x,
            y,
            config,
        }
    }

    /// Gives back the two actuator outputs.
    pub fn release(self) -> (X, Y) {
        (self.x, self.y)
    }

    /// Announces itself on the status line, then dispatches packets forever.
    pub async fn run(&mut self) {
        self.show(DisplayCommand::SetStatus(Text::from("Logic Ready")))
            .await;
        loop {
            self.step().await;
        }
    }

    /// Waits for one packet and dispatches it.
    pub async fn step(&mut self) {
        let packet = self.packets.receive().await;
        self.dispatch(&packet).await;
    }

    /// Applies one packet.
    pub async fn dispatch(&mut self, packet: &RadioPacket) {
        let payload = packet.payload();
        match packet.mode() {
            Mode::Keypad => {
                self.show(DisplayCommand::SetStatus(Text::from("RX: Mode Keypad")))
                    .await;
                self.show(DisplayCommand::SetMainText(Text::new())).await;
                if payload[0] != 0 {
                    self.show(DisplayCommand::ShowKey(payload[0])).await;
                }
            }
            Mode::Servo => self.drive(payload[0], payload[1]).await,
            Mode::Auto => {
                self.show(DisplayCommand::SetStatus(Text::from("RX: Auto Text")))
                    .await;
                self.show(DisplayCommand::SetMainText(Text::from_bytes(payload)))
                    .await;
            }
            Mode::Unknown(tag) => {
                debug!("controller: unknown mode tag {}", tag);
                self.show(DisplayCommand::Clear).await;
                self.show(DisplayCommand::SetStatus(Text::from("Unknown Data")))
                    .await;
                self.show(DisplayCommand::SetMainText(Text::from("Error")))
                    .await;
            }
        }
    }

    async fn drive(&mut self, x: u8, y: u8) {
        let [trim_x, trim_y] = self.config.trim;
        if self.x.set_pulse_width(trimmed_pulse(x, trim_x)).is_err() {
            warn!("controller: X actuator write failed");
        }
        if self.y.set_pulse_width(trimmed_pulse(y, trim_y)).is_err() {
            warn!("controller: Y actuator write failed");
        }

        // raw samples, not the clamped pulses
        let mut telemetry = Text::new();
        let _ = write!(telemetry, "X:{:3} Y:{:3}", x, y);
        self.show(DisplayCommand::SetStatus(Text::from("RX: Servo Ctrl")))
            .await;
        self.show(DisplayCommand::SetMainText(telemetry)).await;
    }

    async fn show(&self, command: DisplayCommand) {
        self.display.send(command).await;
    }
}

impl<M, X, Y> fmt::Debug for Controller<'_, M, X, Y>
where
    M: RawMutex,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embassy_futures::block_on;
    use embassy_futures::select::select;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_sync::channel::Channel;

    #[derive(Default)]
    struct Recorder {
        pulses: Vec<u16>,
    }

    impl PulseOutput for Recorder {
        type Error = Infallible;

        fn set_pulse_width(&mut self, micros: u16) -> Result<(), Self::Error> {
            self.pulses.push(micros);
            Ok(())
        }
    }

    type Packets = Channel<NoopRawMutex, RadioPacket, RADIO_QUEUE_DEPTH>;
    type Commands = Channel<NoopRawMutex, DisplayCommand, DISPLAY_QUEUE_DEPTH>;

    fn drain(commands: &Commands) -> Vec<DisplayCommand> {
        let mut seen = Vec::new();
        while let Ok(command) = commands.try_receive() {
            seen.push(command);
        }
        seen
    }

    fn status(text: &str) -> DisplayCommand {
        DisplayCommand::SetStatus(Text::from(text))
    }

    fn main_text(text: &str) -> DisplayCommand {
        DisplayCommand::SetMainText(Text::from(text))
    }

    #[test]
    fn test_pulse_boundaries() {
        assert_eq!(axis_to_pulse(0), 1000);
        assert_eq!(axis_to_pulse(128), 1501);
        assert_eq!(axis_to_pulse(255), 2000);
        for v in 0..=255u8 {
            let pulse = axis_to_pulse(v);
            assert!((1000..=2000).contains(&pulse));
            assert_eq!(u32::from(pulse), 1000 + u32::from(v) * 1000 / 255);
        }
    }

    #[test]
    fn test_clamp_only_engages_with_trim() {
        assert_eq!(trimmed_pulse(0, -600), PULSE_MIN);
        assert_eq!(trimmed_pulse(255, 600), PULSE_MAX);
        assert_eq!(trimmed_pulse(255, 500), 2500);
        assert_eq!(trimmed_pulse(10, -20), 1019);
        assert_eq!(trimmed_pulse(0, i16::MIN), PULSE_MIN);
        assert_eq!(trimmed_pulse(255, i16::MAX), PULSE_MAX);
    }

    #[test]
    fn test_keypad_shows_key() {
        let packets = Packets::new();
        let commands = Commands::new();
        let mut controller = Controller::new(
            packets.receiver(),
            commands.sender(),
            Recorder::default(),
            Recorder::default(),
            ControllerConfig::default(),
        );

        let packet = RadioPacket::with_payload(Mode::Keypad, b"A");
        block_on(controller.dispatch(&packet));
        assert_eq!(
            drain(&commands),
            [
                status("RX: Mode Keypad"),
                main_text(""),
                DisplayCommand::ShowKey(b'A'),
            ]
        );
    }

    #[test]
    fn test_keypad_without_key_only_clears_text() {
        let packets = Packets::new();
        let commands = Commands::new();
        let mut controller = Controller::new(
            packets.receiver(),
            commands.sender(),
            Recorder::default(),
            Recorder::default(),
            ControllerConfig::default(),
        );

        block_on(controller.dispatch(&RadioPacket::with_payload(Mode::Keypad, &[])));
        assert_eq!(drain(&commands), [status("RX: Mode Keypad"), main_text("")]);
    }

    #[test]
    fn test_servo_drives_both_axes() {
        let packets = Packets::new();
        let commands = Commands::new();
        let mut controller = Controller::new(
            packets.receiver(),
            commands.sender(),
            Recorder::default(),
            Recorder::default(),
            ControllerConfig::default(),
        );

        block_on(controller.dispatch(&RadioPacket::with_payload(Mode::Servo, &[0, 255])));
        assert_eq!(
            drain(&commands),
            [status("RX: Servo Ctrl"), main_text("X:  0 Y:255")]
        );
        let (x, y) = controller.release();
        assert_eq!(x.pulses, [1000]);
        assert_eq!(y.pulses, [2000]);
    }

    #[test]
    fn test_servo_telemetry_shows_raw_samples() {
        let packets = Packets::new();
        let commands = Commands::new();
        let mut controller = Controller::new(
            packets.receiver(),
            commands.sender(),
            Recorder::default(),
            Recorder::default(),
            ControllerConfig { trim: [-700, 700] },
        );

        block_on(controller.dispatch(&RadioPacket::with_payload(Mode::Servo, &[0, 255])));
        assert_eq!(drain(&commands)[1], main_text("X:  0 Y:255"));
        let (x, y) = controller.release();
        assert_eq!(x.pulses, [PULSE_MIN]);
        assert_eq!(y.pulses, [PULSE_MAX]);
    }

    #[test]
    fn test_auto_text_is_terminated_and_cut() {
        let packets = Packets::new();
        let commands = Commands::new();
        let mut controller = Controller::new(
            packets.receiver(),
            commands.sender(),
            Recorder::default(),
            Recorder::default(),
            ControllerConfig::default(),
        );

        block_on(controller.dispatch(&RadioPacket::with_payload(Mode::Auto, b"hi\0junk")));
        block_on(controller.dispatch(&RadioPacket::with_payload(Mode::Auto, &[b'w'; 31])));
        let seen = drain(&commands);
        assert_eq!(seen[0], status("RX: Auto Text"));
        assert_eq!(seen[1], main_text("hi"));
        assert_eq!(
            seen[3],
            DisplayCommand::SetMainText(Text::from_bytes(&[b'w'; 31]))
        );
    }

    #[test]
    fn test_unknown_mode_reports_error() {
        let packets = Packets::new();
        let commands = Commands::new();
        let mut controller = Controller::new(
            packets.receiver(),
            commands.sender(),
            Recorder::default(),
            Recorder::default(),
            ControllerConfig::default(),
        );

        block_on(controller.dispatch(&RadioPacket::with_payload(Mode::from_tag(99), b"x")));
        assert_eq!(
            drain(&commands),
            [
                DisplayCommand::Clear,
                status("Unknown Data"),
                main_text("Error"),
            ]
        );
        let (x, y) = controller.release();
        assert!(x.pulses.is_empty() && y.pulses.is_empty());
    }

    #[test]
    fn test_run_announces_then_dispatches() {
        let packets = Packets::new();
        let commands = Commands::new();
        packets
            .try_send(RadioPacket::with_payload(Mode::Keypad, b"7"))
            .unwrap();

        let mut controller = Controller::new(
            packets.receiver(),
            commands.sender(),
            Recorder::default(),
            Recorder::default(),
            ControllerConfig::default(),
        );
        // `run` parks on the empty radio queue once the packet is handled
        block_on(select(controller.run(), core::future::ready(())));

        assert_eq!(
            drain(&commands),
            [
                status("Logic Ready"),
                status("RX: Mode Keypad"),
                main_text(""),
                DisplayCommand::ShowKey(b'7'),
            ]
        );
    }
}
