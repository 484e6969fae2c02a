//! Interrupt-to-task signaling.
//!
//! The radio IRQ pin and the display transfer-complete interrupt are the only
//! asynchronous boundaries in the system. An interrupt handler does exactly
//! one thing: post a signal. It never touches a queue, a buffer or the
//! driver.
//!
//! - [`IrqLine`]: counting, edge-triggered event with a single consumer
//! - [`declare_link!`](crate::declare_link): declares the static
//!   [`Link`](crate::link::Link) shared by tasks and handlers
//! - [`radio_irq!`](crate::radio_irq) and
//!   [`frame_done_irq!`](crate::frame_done_irq): interrupt handler bodies

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

mod macros;

/// A counting wake-up fed from interrupt context.
///
/// [`notify`](IrqLine::notify) may be called from an interrupt handler;
/// [`wait`](IrqLine::wait) is awaited by exactly one task. Each `notify`
/// releases one `wait`, so edges that arrive while the task is busy are not
/// lost (up to `u16::MAX` outstanding).
pub struct IrqLine<M: RawMutex> {
    pending: Mutex<Cell<u16>>,
    wake: Signal<M, ()>,
}

impl<M: RawMutex> IrqLine<M> {
    /// Creates a line with nothing pending.
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(0)),
            wake: Signal::new(),
        }
    }

    /// Records one edge and wakes the waiting task.
    pub fn notify(&self) {
        critical_section::with(|cs| {
            let pending = self.pending.borrow(cs);
            pending.set(pending.get().saturating_add(1));
        });
        self.wake.signal(());
    }

    /// Waits for the next edge, consuming it.
    pub async fn wait(&self) {
        loop {
            if self.try_take() {
                return;
            }
            self.wake.wait().await;
        }
    }

    /// Consumes one pending edge without waiting.
    pub fn try_take(&self) -> bool {
        critical_section::with(|cs| {
            let pending = self.pending.borrow(cs);
            match pending.get() {
                0 => false,
                n => {
                    pending.set(n - 1);
                    true
                }
            }
        })
    }

    /// Number of edges not yet consumed.
    pub fn pending(&self) -> u16 {
        critical_section::with(|cs| self.pending.borrow(cs).get())
    }
}

impl<M: RawMutex> Default for IrqLine<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> fmt::Debug for IrqLine<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqLine")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_edges_are_counted() {
        let line: IrqLine<NoopRawMutex> = IrqLine::new();
        line.notify();
        line.notify();
        assert_eq!(line.pending(), 2);

        block_on(line.wait());
        block_on(line.wait());
        assert_eq!(line.pending(), 0);
        assert!(!line.try_take());
    }

    #[test]
    fn test_try_take_consumes_one() {
        let line: IrqLine<NoopRawMutex> = IrqLine::default();
        assert!(!line.try_take());
        line.notify();
        assert!(line.try_take());
        assert!(!line.try_take());
    }

    crate::declare_link!(TEST_LINK);

    #[test]
    fn test_interrupt_macros_only_post_signals() {
        crate::radio_irq!(TEST_LINK);
        assert_eq!(TEST_LINK.irq().pending(), 1);
        assert!(TEST_LINK.irq().try_take());

        crate::frame_done_irq!(TEST_LINK);
        assert!(TEST_LINK.frame_done().signaled());
        TEST_LINK.frame_done().reset();
    }
}
