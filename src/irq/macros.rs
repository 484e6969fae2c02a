/// Declares a static [`Link`](crate::link::Link) guarded by a
/// `critical_section` mutex.
///
/// The static is shared by the three tasks and by the interrupt handlers,
/// which reach it through [`radio_irq!`](crate::radio_irq) and
/// [`frame_done_irq!`](crate::frame_done_irq).
///
/// # Example
/// ```rust
/// rc24rx::declare_link!(LINK);
///
/// fn main() {
///     let irq = LINK.irq();
///     assert_eq!(irq.pending(), 0);
/// }
/// ```
#[macro_export]
macro_rules! declare_link {
    ( $name:ident ) => {
        pub static $name: $crate::link::Link<
            $crate::embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex,
        > = $crate::link::Link::new();
    };
}

/// Body of the radio IRQ pin handler: posts one edge to the receive loop.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn EXTI4() {
///     rc24rx::radio_irq!(LINK);
/// }
/// ```
///
/// # Notes
/// - Clear the pending bit of the external interrupt controller before or
///   after this call; the chip's own IRQ flags are cleared by the task.
#[macro_export]
macro_rules! radio_irq {
    ( $link:path ) => {
        $link.irq().notify()
    };
}

/// Body of the display transfer-complete handler: releases the renderer's
/// frame pacing wait.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn DMA1_CHANNEL6() {
///     rc24rx::frame_done_irq!(LINK);
/// }
/// ```
#[macro_export]
macro_rules! frame_done_irq {
    ( $link:path ) => {
        $link.frame_done().signal(())
    };
}
