//! LDMA controller registers, as found on Series 1 parts.

use super::{RORegister, RWRegister, WORegister};

/// LDMA registers.
#[repr(C)]
pub struct RegisterBlock {
    /// DMA Control Register
    pub CTRL: RWRegister<u32>,
    /// DMA Status Register
    pub STATUS: RORegister<u32>,
    /// DMA Synchronization Trigger Register (Single-Cycle RMW)
    pub SYNC: RWRegister<u32>,
    _reserved0: [u32; 5],
    /// DMA Channel Enable Register (Single-Cycle RMW)
    pub CHEN: RWRegister<u32>,
    /// DMA Channel Busy Register
    pub CHBUSY: RORegister<u32>,
    /// DMA Channel Linking Done Register (Single-Cycle RMW)
    pub CHDONE: RWRegister<u32>,
    /// DMA Channel Debug Halt Register
    pub DBGHALT: RWRegister<u32>,
    /// DMA Channel Software Transfer Request Register
    pub SWREQ: WORegister<u32>,
    /// DMA Channel Request Disable Register
    pub REQDIS: RWRegister<u32>,
    /// DMA Channel Requests Pending Register
    pub REQPEND: RORegister<u32>,
    /// DMA Channel Link Load Register
    pub LINKLOAD: WORegister<u32>,
    /// DMA Channel Request Clear Register
    pub REQCLEAR: WORegister<u32>,
    _reserved1: [u32; 7],
    /// Interrupt Flag Register
    pub IF: RORegister<u32>,
    /// Interrupt Flag Set Register
    pub IFS: WORegister<u32>,
    /// Interrupt Flag Clear Register
    pub IFC: WORegister<u32>,
    /// Interrupt Enable register
    pub IEN: RWRegister<u32>,
    _reserved2: [u32; 4],
    /// Per-channel registers
    pub CH: [ChannelRegisters; CHANNELS],
}

/// The most channels an LDMA controller implements.
pub const CHANNELS: usize = 8;

/// Channel registers.
///
/// `CTRL`, `SRC`, `DST` and `LINK` hold the descriptor that the channel
/// loaded most recently. They change as the transfer progresses.
#[repr(C)]
pub struct ChannelRegisters {
    /// Channel Peripheral Request Select Register
    pub REQSEL: RWRegister<u32>,
    /// Channel Configuration Register
    pub CFG: RWRegister<u32>,
    /// Channel Loop Counter Register
    pub LOOP: RWRegister<u32>,
    /// Channel Descriptor Control Word Register
    pub CTRL: RWRegister<u32>,
    /// Channel Descriptor Source Data Address Register
    pub SRC: RWRegister<u32>,
    /// Channel Descriptor Destination Data Address Register
    pub DST: RWRegister<u32>,
    /// Channel Descriptor Link Structure Address Register
    pub LINK: RWRegister<u32>,
    _reserved: [u32; 5],
}

const _: () = assert!(core::mem::offset_of!(RegisterBlock, CHEN) == 0x020);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, IF) == 0x060);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, CH) == 0x080);
const _: () = assert!(core::mem::size_of::<ChannelRegisters>() == 0x30);

pub mod CTRL {
    field!(NUMFIXED, 24, 3);
}

pub mod STATUS {
    field!(ANYBUSY, 0, 1);
    field!(CHERROR, 8, 5);
}

pub mod IF {
    field!(DONE, 0, 8);
    field!(ERROR, 31, 1);
}

pub mod IEN {
    field!(DONE, 0, 8);
    field!(ERROR, 31, 1);
}

pub mod REQSEL {
    field!(SIGSEL, 0, 4);
    field!(SOURCESEL, 16, 6);
}

pub mod CFG {
    field!(ARBSLOTS, 16, 2, ONE = 0, TWO = 1, FOUR = 2, EIGHT = 3);
    field!(SRCINCSIGN, 20, 1);
    field!(DSTINCSIGN, 21, 1);
}

pub mod LOOP {
    field!(LOOPCNT, 0, 8);
}
