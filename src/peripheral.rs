//! Supporting traits for defining peripheral DMA sources and destinations
//!
//! A peripheral that works with DMA names a request signal, and the data
//! register that the channel reads or writes. Implement [`Source`] and
//! [`Destination`] for your peripherals, or describe a bare data register
//! with [`Register`].

use crate::channel::{Channel, Configuration};
use crate::element::Element;
use crate::transfer::Transfer;

/// Describes a peripheral that can be the source of DMA data
///
/// By 'source,' we mean that it provides data for a DMA transfer.
/// A 'source,' would be a hardware device sending data into our
/// memory.
///
/// # Safety
///
/// `source` must return a pointer to a register that the DMA channel can
/// read for as long as the peripheral exists. The signal must be the
/// peripheral's receive request.
pub unsafe trait Source<E: Element> {
    /// Peripheral request signal, as packed by [`signal`](crate::channel::signal)
    ///
    /// A source probably has something like 'RXDATAV' in the signal name.
    fn source_signal(&self) -> u32;
    /// Returns a pointer to the register from which the DMA channel
    /// reads data
    fn source(&self) -> *const E;
    /// Perform any actions necessary to enable DMA transfers
    fn enable_source(&mut self);
    /// Perform any actions necessary to disable or cancel DMA transfers
    fn disable_source(&mut self);
}

/// Describes a peripheral that can be the destination for DMA data
///
/// By 'destination,' we mean that it receives data from a DMA transfer.
/// Software is sending data from memory to a device using DMA.
///
/// # Safety
///
/// `destination` must return a pointer to a register that the DMA channel
/// can write for as long as the peripheral exists. The signal must be the
/// peripheral's transmit request.
pub unsafe trait Destination<E: Element> {
    /// Peripheral request signal, as packed by [`signal`](crate::channel::signal)
    ///
    /// A destination probably has something like 'TXBL' in the signal name.
    fn destination_signal(&self) -> u32;
    /// Returns a pointer to the register into which the DMA channel
    /// writes data
    fn destination(&self) -> *mut E;
    /// Perform any actions necessary to enable DMA transfers
    fn enable_destination(&mut self);
    /// Perform any actions necessary to disable or cancel DMA transfers
    fn disable_destination(&mut self);
}

/// A peripheral data register and its request signal.
///
/// Use this for peripherals that need no setup beyond their own driver,
/// like a DAC channel data register paced by a timer.
#[derive(Debug)]
pub struct Register<E> {
    address: *mut E,
    signal: u32,
}

impl<E: Element> Register<E> {
    /// Describe the register at `address`, requested by `signal`.
    ///
    /// # Safety
    ///
    /// `address` must point at a register that the DMA channel may access
    /// for the rest of the program.
    pub const unsafe fn new(address: *mut E, signal: u32) -> Self {
        Register { address, signal }
    }
}

unsafe impl<E: Element> Source<E> for Register<E> {
    fn source_signal(&self) -> u32 {
        self.signal
    }
    fn source(&self) -> *const E {
        self.address
    }
    fn enable_source(&mut self) {}
    fn disable_source(&mut self) {}
}

unsafe impl<E: Element> Destination<E> for Register<E> {
    fn destination_signal(&self) -> u32 {
        self.signal
    }
    fn destination(&self) -> *mut E {
        self.address
    }
    fn enable_destination(&mut self) {}
    fn disable_destination(&mut self) {}
}

/// Trigger `channel` from `source`, and describe a transfer of `count`
/// elements from the source into `buffer`.
///
/// The source is enabled. Describe the returned transfer in a slot, or hand
/// it to a [`SelfRefresh`](crate::refresh::SelfRefresh), then activate the
/// channel.
///
/// # Panics
///
/// Panics if `count` is out of range. See [`Transfer`].
pub fn receive<S, E>(
    channel: &mut Channel,
    source: &mut S,
    buffer: *mut E,
    count: usize,
) -> Transfer
where
    S: Source<E>,
    E: Element,
{
    channel.set_channel_configuration(Configuration::Enable {
        source: source.source_signal(),
    });
    source.enable_source();
    Transfer::peripheral_to_memory(source.source(), buffer, count)
}

/// Trigger `channel` from `destination`, and describe a transfer of `count`
/// elements from `buffer` into the destination.
///
/// See [`receive`] for what to do with the transfer.
pub fn transmit<D, E>(
    channel: &mut Channel,
    destination: &mut D,
    buffer: *const E,
    count: usize,
) -> Transfer
where
    D: Destination<E>,
    E: Element,
{
    channel.set_channel_configuration(Configuration::Enable {
        source: destination.destination_signal(),
    });
    destination.enable_destination();
    Transfer::memory_to_peripheral(buffer, destination.destination(), count)
}
