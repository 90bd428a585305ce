//! Transfer descriptors, as the DMA controllers read them from RAM.
//!
//! Descriptors aren't peripheral memory, but the controller reads and writes
//! them behind our back. Volatile register types keep the compiler honest.

/// uDMA channel descriptor.
pub mod udma {
    use crate::ral::RWRegister;

    /// One primary or alternate descriptor.
    #[repr(C)]
    pub struct Descriptor {
        /// Address of the last source element
        pub SRCEND: RWRegister<u32>,
        /// Address of the last destination element
        pub DSTEND: RWRegister<u32>,
        /// Control data configuration
        pub CTRL: RWRegister<u32>,
        /// Unused by the controller. The driver keeps the auto-start flag
        /// in bit 0.
        pub USER: RWRegister<u32>,
    }

    /// The control block, viewed as the controller sees it.
    ///
    /// The alternate descriptors start at a fixed offset from the primary
    /// descriptors. The offset depends on the number of channels the
    /// controller implements, rounded up to a power of two.
    #[repr(C)]
    pub struct Table {
        pub primary: [Descriptor; 16],
        pub alternate: [Descriptor; 16],
    }

    const _: () = assert!(core::mem::size_of::<Descriptor>() == 16);
    const _: () = assert!(core::mem::offset_of!(Table, alternate) == 0x100);

    pub mod CTRL {
        field!(
            CYCLE_CTRL,
            0,
            3,
            INVALID = 0,
            BASIC = 1,
            AUTO = 2,
            PINGPONG = 3,
            MEM_SG = 4,
            ALT_MEM_SG = 5,
            PER_SG = 6,
            ALT_PER_SG = 7
        );
        field!(NEXT_USEBURST, 3, 1);
        field!(N_MINUS_1, 4, 10);
        field!(R_POWER, 14, 4);
        field!(SRC_PROT_CTRL, 18, 3);
        field!(DST_PROT_CTRL, 21, 3);
        field!(SRC_SIZE, 24, 2, BYTE = 0, HALFWORD = 1, WORD = 2);
        field!(SRC_INC, 26, 2, BYTE = 0, HALFWORD = 1, WORD = 2, NONE = 3);
        field!(DST_SIZE, 28, 2, BYTE = 0, HALFWORD = 1, WORD = 2);
        field!(DST_INC, 30, 2, BYTE = 0, HALFWORD = 1, WORD = 2, NONE = 3);
    }
}

/// LDMA linked descriptor.
pub mod ldma {
    use crate::ral::RWRegister;

    /// A transfer descriptor.
    ///
    /// The layout matches the channel's `CTRL`, `SRC`, `DST` and `LINK`
    /// registers; loading a descriptor copies these words into them.
    #[repr(C)]
    pub struct Descriptor {
        pub CTRL: RWRegister<u32>,
        pub SRC: RWRegister<u32>,
        pub DST: RWRegister<u32>,
        pub LINK: RWRegister<u32>,
    }

    /// Each channel owns a pair of adjacent descriptors, so that relative
    /// links of one descriptor forwards or backwards select the other slot.
    #[repr(C)]
    pub struct Table {
        pub pairs: [[Descriptor; 2]; crate::ral::ldma::CHANNELS],
    }

    const _: () = assert!(core::mem::size_of::<Descriptor>() == 16);

    pub mod CTRL {
        field!(STRUCTTYPE, 0, 2, TRANSFER = 0, SYNCHRONIZE = 1, WRITE = 2);
        field!(STRUCTREQ, 3, 1);
        field!(XFERCNT, 4, 11);
        field!(BYTESWAP, 15, 1);
        field!(BLOCKSIZE, 16, 4, ALL = 15);
        field!(DONEIFSEN, 20, 1);
        field!(REQMODE, 21, 1, BLOCK = 0, ALL = 1);
        field!(DECLOOPCNT, 22, 1);
        field!(IGNORESREQ, 23, 1);
        field!(SRCINC, 24, 2, ONE = 0, TWO = 1, FOUR = 2, NONE = 3);
        field!(SIZE, 26, 2, BYTE = 0, HALFWORD = 1, WORD = 2);
        field!(DSTINC, 28, 2, ONE = 0, TWO = 1, FOUR = 2, NONE = 3);
        field!(SRCMODE, 30, 1);
        field!(DSTMODE, 31, 1);
    }

    pub mod LINK {
        field!(LINKMODE, 0, 1, ABSOLUTE = 0, RELATIVE = 1);
        field!(LINK, 1, 1);
        field!(LINKADDR, 2, 30);
    }
}
