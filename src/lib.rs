//! Self-refreshing DMA transfers for EFM32 / EFR32 processors.
//!
//! `efm32-dma` provides
//!
//! - an unsafe API for describing transfers and arming DMA `Channel`s in
//!   basic or ping-pong mode.
//! - completion callbacks that run from the DMA interrupt, and re-arm the
//!   descriptor that just finished.
//! - [`SelfRefresh`](crate::refresh::SelfRefresh), a callback that keeps a
//!   transfer running forever without the CPU touching the data.
//!
//! The default build drives the uDMA controller of Series 0 parts. Enable
//! the `ldma` feature to drive the LDMA controller of Series 1 parts. The
//! channel API is the same for both.
//!
//! # Getting started
//!
//! To allocate a [`Dma`] driver, you'll need
//!
//! 1. the location of the DMA controller registers.
//! 2. a [`ControlBlock`] for the channel descriptors.
//! 3. the number of DMA channels supported by your chip.
//!
//! Assign a `Dma` to a static. Then, use that object to create DMA
//! [`Channel`](crate::channel::Channel)s.
//!
//! ```no_run
//! use efm32_dma::{ControlBlock, Dma};
//! # const DMA_PTR: *const () = 0x400C_2000 as _;
//!
//! static CONTROL_BLOCK: ControlBlock = ControlBlock::new();
//!
//! // Safety: addresses and channel count are valid for this target.
//! static DMA: Dma<8> = unsafe {
//!     Dma::new(DMA_PTR, core::ptr::addr_of!(CONTROL_BLOCK).cast())
//! };
//!
//! // Safety: DMA clock is on.
//! unsafe { DMA.init() };
//!
//! // Safety: we only allocate one DMA channel 0 object.
//! let mut channel = unsafe { DMA.channel(0) };
//! ```
//!
//! Then describe a [`Transfer`], and arm the channel. Call
//! [`Dma::on_interrupt`] from your DMA interrupt handler so that completion
//! callbacks run.
//!
//! Peripheral transfers depend on a peripheral's DMA support. These are
//! signaled through the [`peripheral`] traits.
//!
//! The crate also carries a few small drivers the DMA examples lean on:
//! [`msc`] for the user-data flash page, [`i2c`] for an I2C follower
//! register file, and [`emu`] for sleeping between interrupts.
//!
//! ### License
//!
//! Licensed under either of
//!
//! - [Apache License, Version 2.0](http://www.apache.org/licenses/LICENSE-2.0) ([LICENSE-APACHE](./LICENSE-APACHE))
//! - [MIT License](http://opensource.org/licenses/MIT) ([LICENSE-MIT](./LICENSE-MIT))
//!
//! at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted
//! for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
//! dual licensed as above, without any additional terms or conditions.

#![no_std]

pub mod channel;
mod element;
pub mod emu;
mod error;
pub mod i2c;
pub mod interrupt;
pub mod list;
pub mod msc;
pub mod peripheral;
mod ral;
pub mod refresh;
mod transfer;

#[cfg(test)]
mod test_utils;

pub use element::{Element, ElementSize};
pub use error::Error;
pub use list::DescriptorList;
pub use transfer::{Arbitration, Increment, Transfer, MAX_TRANSFER_COUNT};

use core::cell::UnsafeCell;

/// A DMA result
pub type Result<T> = core::result::Result<T, Error>;

cfg_if::cfg_if! {
    if #[cfg(feature = "ldma")] {
        const CONTROL_BLOCK_WORDS: usize = core::mem::size_of::<ral::descriptor::ldma::Table>() / 4;
        type DescriptorTable = ral::descriptor::ldma::Table;
    } else {
        const CONTROL_BLOCK_WORDS: usize = core::mem::size_of::<ral::descriptor::udma::Table>() / 4;
        type DescriptorTable = ral::descriptor::udma::Table;
    }
}

/// Memory for the channel descriptors.
///
/// The controller reads descriptors from here. Place one in a `static`, and
/// give its address to [`Dma::new`]. The uDMA requires the control block to
/// be aligned to its size; the type takes care of that.
#[cfg_attr(not(feature = "ldma"), repr(C, align(512)))]
#[cfg_attr(feature = "ldma", repr(C, align(16)))]
pub struct ControlBlock(UnsafeCell<[u32; CONTROL_BLOCK_WORDS]>);

// Safety: only the DMA driver and the controller touch the control block,
// through the pointer handed to Dma::new.
unsafe impl Sync for ControlBlock {}

impl ControlBlock {
    /// An all-zero control block. Every descriptor is invalid.
    pub const fn new() -> Self {
        ControlBlock(UnsafeCell::new([0; CONTROL_BLOCK_WORDS]))
    }
}

impl Default for ControlBlock {
    fn default() -> Self {
        Self::new()
    }
}

const _: () =
    assert!(core::mem::size_of::<ControlBlock>() == core::mem::size_of::<DescriptorTable>());

/// A DMA driver.
///
/// This DMA driver manages the DMA controller and the channel descriptors.
/// It's configured with pointers to both.
///
/// `Dma` allocates [`Channel`](channel::Channel)s. `Channel` provides
/// the interface for scheduling transfers. `Dma` also holds each channel's
/// completion callback, so it must outlive every running transfer; put it
/// in a `static`.
pub struct Dma<const CHANNELS: usize> {
    controller: ral::Static<ral::Controller>,
    descriptors: ral::Static<DescriptorTable>,
    callbacks: [SharedCallback; CHANNELS],
}

// Safety: OK to allocate a DMA driver in a static context.
unsafe impl<const CHANNELS: usize> Sync for Dma<CHANNELS> {}

impl<const CHANNELS: usize> Dma<CHANNELS> {
    /// Create the DMA driver.
    ///
    /// Note that this can evaluate at compile time. Consider using this to
    /// expose a `Dma` through your higher-level API that you can use to
    /// allocate DMA channels.
    ///
    /// `CHANNELS` specifies the total number of channels supported by the DMA
    /// controller. It's referenced when allocating channels.
    ///
    /// # Safety
    ///
    /// Caller must make sure that `controller` is a pointer to the start of the
    /// DMA controller register block, and that `control_block` points to a
    /// [`ControlBlock`] that lives for the rest of the program, and isn't
    /// shared with another `Dma`.
    ///
    /// An incorrect `CHANNELS` value prevents proper bounds checking when
    /// allocating channels. This may result in DMA channels that point to
    /// invalid memory.
    pub const unsafe fn new(controller: *const (), control_block: *const ()) -> Self {
        Self {
            controller: ral::Static(controller.cast()),
            descriptors: ral::Static(control_block.cast()),
            callbacks: [NO_CALLBACK; CHANNELS],
        }
    }

    /// Enable the controller.
    ///
    /// This installs the control block, enables the bus error interrupt, and
    /// leaves every channel disabled. You still need to unmask the DMA
    /// interrupt in the NVIC.
    ///
    /// # Safety
    ///
    /// The DMA clock must be enabled. Calling this while channels run
    /// disables them.
    pub unsafe fn init(&self) {
        self.init_impl();
    }
}

use interrupt::{SharedCallback, NO_CALLBACK};
