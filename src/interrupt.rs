//! Completion interrupts and callbacks
//!
//! Each channel has a callback record in the [`Dma`] object. The record
//! lives as long as the `Dma`, which lives in a `static`, so the interrupt
//! handler can always reach it. Channels update the record in critical
//! sections; the interrupt handler reads it the same way, then runs the
//! callback outside of the critical section.

use core::cell::Cell;

use critical_section::Mutex;

use crate::channel::{Channel, Slot};
use crate::transfer::Transfer;
use crate::Dma;

/// Runs when one of a channel's descriptors completes.
///
/// Closures and functions with a matching signature implement `Callback`:
///
/// ```
/// use efm32_dma::channel::Channel;
/// use efm32_dma::interrupt::{Callback, Completion};
///
/// fn restart(completion: &mut Completion<'_>) {
///     completion.software_request();
/// }
///
/// fn install(channel: &mut Channel) {
///     channel.set_callback(&restart);
/// }
/// ```
///
/// Callbacks run in interrupt context. Keep them short.
pub trait Callback: Sync {
    /// The descriptor in `completion.slot()` finished.
    fn complete(&self, completion: &mut Completion<'_>);
}

impl<F> Callback for F
where
    F: Fn(&mut Completion<'_>) + Sync,
{
    fn complete(&self, completion: &mut Completion<'_>) {
        self(completion)
    }
}

/// How the channel was armed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Mode {
    /// One descriptor; the channel stops after it.
    Basic,
    /// Primary and alternate descriptors take turns.
    PingPong,
    /// One descriptor linked to itself.
    #[cfg(feature = "ldma")]
    Looped,
}

/// A channel's callback, and what the channel will complete next.
#[derive(Clone, Copy)]
pub(crate) struct Record {
    handler: Option<&'static dyn Callback>,
    next: Slot,
    mode: Mode,
}

impl Record {
    const EMPTY: Self = Record {
        handler: None,
        next: Slot::Primary,
        mode: Mode::Basic,
    };

    pub(crate) fn with_handler(self, handler: Option<&'static dyn Callback>) -> Self {
        Record { handler, ..self }
    }

    pub(crate) fn armed(self, next: Slot, mode: Mode) -> Self {
        Record { next, mode, ..self }
    }

    /// The record after `next` completes.
    fn advanced(self) -> Self {
        match self.mode {
            Mode::PingPong => Record {
                next: self.next.other(),
                ..self
            },
            _ => self,
        }
    }
}

pub(crate) type SharedCallback = Mutex<Cell<Record>>;
pub(crate) const NO_CALLBACK: SharedCallback = Mutex::new(Cell::new(Record::EMPTY));

/// Context for a [`Callback`].
///
/// Names the channel and the slot that completed, and lets the callback
/// re-arm that slot.
pub struct Completion<'a> {
    channel: &'a mut Channel,
    slot: Slot,
    mode: Mode,
}

impl<'a> Completion<'a> {
    /// The channel number.
    pub fn channel(&self) -> usize {
        self.channel.channel()
    }

    /// The slot whose descriptor completed.
    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Returns `true` if the channel runs in ping-pong mode.
    pub fn is_ping_pong(&self) -> bool {
        self.mode == Mode::PingPong
    }

    /// Re-arm the completed slot with `transfer`.
    ///
    /// In basic mode, this rewrites the descriptor and re-enables the
    /// channel. In ping-pong mode, it rewrites the descriptor while the other
    /// slot runs. Either way, the transfer keeps going as if it never
    /// stopped.
    ///
    /// # Safety
    ///
    /// `transfer`'s memory must stay valid while the channel may run.
    pub unsafe fn refresh(&mut self, transfer: &Transfer) {
        match self.mode {
            Mode::Basic => {
                self.channel.set_descriptor(self.slot, transfer);
                self.channel.activate_basic(self.slot);
            }
            _ => self.channel.refresh(self.slot, transfer, false),
        }
    }

    /// Re-arm the completed slot as the final descriptor.
    ///
    /// The channel stops after this descriptor completes.
    ///
    /// # Safety
    ///
    /// See [`refresh`](Self::refresh).
    pub unsafe fn refresh_last(&mut self, transfer: &Transfer) {
        match self.mode {
            Mode::Basic => self.refresh(transfer),
            _ => self.channel.refresh(self.slot, transfer, true),
        }
    }

    /// Trigger the channel from software.
    pub fn software_request(&self) {
        self.channel.software_request();
    }

    /// Access the channel for anything else.
    pub fn channel_mut(&mut self) -> &mut Channel {
        self.channel
    }
}

impl<const CHANNELS: usize> Dma<CHANNELS> {
    /// Handle the DMA interrupt.
    ///
    /// Call this from the DMA interrupt handler. It clears every pending
    /// flag at once, then, for every enabled channel whose completion flag
    /// was set, runs the channel's callback with the slot that completed.
    ///
    /// A bus error doesn't stop the other channels' callbacks from running.
    /// It's cleared, then returned; you decide whether to reset, retry, or
    /// halt.
    ///
    /// # Safety
    ///
    /// Callbacks receive a channel handle that aliases the channel you
    /// allocated. Only call this from the DMA interrupt handler, so that it
    /// can't preempt code that uses a channel.
    pub unsafe fn on_interrupt(&'static self) -> crate::Result<()> {
        let pending = self.take_pending_impl();

        for index in (0..CHANNELS).filter(|&index| pending & (1u32 << index) != 0) {
            let mut channel = self.channel(index);

            let record = critical_section::with(|cs| {
                let record = self.callbacks[index].borrow(cs);
                let current = record.get();
                record.set(current.advanced());
                current
            });

            #[cfg(feature = "defmt")]
            defmt::trace!("DMA{=usize} completed {}", index, record.next);

            if let Some(handler) = record.handler {
                handler.complete(&mut Completion {
                    channel: &mut channel,
                    slot: record.next,
                    mode: record.mode,
                });
            }
        }

        match self.take_error_impl(pending) {
            Some(error) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}", error);
                Err(error)
            }
            None => Ok(()),
        }
    }
}
