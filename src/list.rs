//! Descriptor lists
//!
//! A channel's own descriptors hold one or two transfers. For longer
//! chains, give the channel a [`DescriptorList`] that you own, and activate
//! it with [`Channel::activate_list`](crate::channel::Channel::activate_list).
//!
//! - On LDMA, every entry is a descriptor that links to the next one. The
//!   channel walks the chain, and can loop back to the first entry.
//! - On the uDMA, the entries are scatter-gather tasks. The primary
//!   descriptor copies each task into the alternate descriptor, which then
//!   runs it.
//!
//! Either way, each entry is a [`Transfer`](crate::Transfer), and the
//! channel signals completion once, after the last entry.

use core::cell::UnsafeCell;

/// Memory for up to `N` descriptors.
///
/// Both controllers use 16 byte descriptors. Place the list in a `static`;
/// the controller reads it for as long as the channel runs.
#[repr(C, align(16))]
pub struct DescriptorList<const N: usize>(UnsafeCell<[[u32; 4]; N]>);

// Safety: only a channel and the controller touch the list, through the
// reference handed to activate_list.
unsafe impl<const N: usize> Sync for DescriptorList<N> {}

impl<const N: usize> DescriptorList<N> {
    /// An all-zero list.
    pub const fn new() -> Self {
        DescriptorList(UnsafeCell::new([[0; 4]; N]))
    }

    /// The number of entries the list can hold.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// The address of entry zero.
    pub(crate) fn as_ptr(&self) -> *const () {
        self.0.get().cast_const().cast()
    }
}

impl<const N: usize> Default for DescriptorList<N> {
    fn default() -> Self {
        Self::new()
    }
}
