//! Flash programming through the Memory System Controller
//!
//! [`Msc`] erases flash pages and writes flash words. It's enough to keep
//! a few settings in the user-data page, which survives reset and EM4.
//! [`UserData`] is a word-indexed view of that page, over anything that
//! implements [`Flash`].
//!
//! Flash programming runs from flash on these parts, and the core stalls
//! while the controller is busy. Don't call these from a time-critical
//! interrupt.

use core::fmt;

use crate::ral::{self, msc, Static};

/// Base address of the user-data page.
pub const USERDATA_BASE: u32 = 0x0FE0_0000;

/// Number of `BUSY` / `WDATAREADY` polls before giving up.
pub const DEFAULT_TIMEOUT: u32 = 10_000_000;

/// Flash programming errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The page is locked.
    Locked,
    /// The address is outside of flash, or not word aligned.
    InvalidAddress,
    /// The controller stayed busy, or a word write timed out.
    Timeout,
    /// A page erase was aborted.
    EraseAborted,
    /// The controller was busy with an earlier operation.
    Busy,
}

impl Error {
    /// A short description of the error.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Error::Locked => "flash page is locked",
            Error::InvalidAddress => "invalid flash address",
            Error::Timeout => "flash operation timed out",
            Error::EraseAborted => "flash erase aborted",
            Error::Busy => "flash controller busy",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flash result.
pub type Result<T> = core::result::Result<T, Error>;

/// Erase, write, and read flash words.
pub trait Flash {
    /// Erase the page that holds `address`. Every word of the page reads
    /// `0xFFFF_FFFF` afterwards.
    fn erase_page(&mut self, address: u32) -> Result<()>;
    /// Program the word at `address`.
    ///
    /// Programming only clears bits. Erase the page first.
    fn write_word(&mut self, address: u32, value: u32) -> Result<()>;
    /// Read the word at `address`.
    fn read_word(&self, address: u32) -> Result<u32>;
}

/// The Memory System Controller.
pub struct Msc {
    registers: Static<msc::RegisterBlock>,
    timeout: u32,
}

impl Msc {
    /// Create the flash driver.
    ///
    /// # Safety
    ///
    /// `registers` must point at the MSC register block, and there may only
    /// be one `Msc` at a time. The driver reads flash through the addresses
    /// you give it; they must be flash addresses.
    pub const unsafe fn new(registers: *const ()) -> Self {
        Msc {
            registers: Static(registers.cast()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Poll the controller at most `polls` times per wait.
    pub const fn with_timeout(mut self, polls: u32) -> Self {
        self.timeout = polls;
        self
    }

    /// Unlock the MSC configuration registers.
    ///
    /// They're unlocked after reset. Call this if something locked them.
    pub fn unlock(&mut self) {
        ral::write_reg!(msc, self.registers, LOCK, LOCKKEY: UNLOCK);
    }

    /// Lock the MSC configuration registers.
    pub fn lock(&mut self) {
        ral::write_reg!(msc, self.registers, LOCK, LOCKKEY: LOCK);
    }

    /// Erase the page that holds `address`.
    pub fn erase_page(&mut self, address: u32) -> Result<()> {
        self.program(address, |this| {
            ral::write_reg!(msc, this.registers, WRITECMD, ERASEPAGE: 1);
            this.wait_idle()?;
            if ral::read_reg!(msc, this.registers, STATUS, ERASEABORTED == 1) {
                return Err(Error::EraseAborted);
            }
            Ok(())
        })
    }

    /// Program the word at `address`.
    pub fn write_word(&mut self, address: u32, value: u32) -> Result<()> {
        if address % 4 != 0 {
            return Err(Error::InvalidAddress);
        }
        self.program(address, |this| {
            this.wait(|status| status & msc::STATUS::WDATAREADY::mask != 0)?;
            this.registers.WDATA.write(value);
            ral::write_reg!(msc, this.registers, WRITECMD, WRITEONCE: 1);
            this.wait_idle()?;
            if ral::read_reg!(msc, this.registers, STATUS, WORDTIMEOUT == 1) {
                return Err(Error::Timeout);
            }
            Ok(())
        })
    }

    /// Enable writes, load `address`, and run `command`. Writes are disabled
    /// again whatever the outcome.
    fn program(
        &mut self,
        address: u32,
        command: impl FnOnce(&Self) -> Result<()>,
    ) -> Result<()> {
        if ral::read_reg!(msc, self.registers, STATUS, BUSY == 1) {
            return Err(Error::Busy);
        }
        ral::modify_reg!(msc, self.registers, WRITECTRL, WREN: 1);
        let result = self.load_address(address).and_then(|()| command(self));
        ral::modify_reg!(msc, self.registers, WRITECTRL, WREN: 0);

        #[cfg(feature = "defmt")]
        if let Err(error) = result {
            defmt::warn!("MSC {=u32:#010X}: {}", address, error);
        }
        result
    }

    fn load_address(&self, address: u32) -> Result<()> {
        self.registers.ADDRB.write(address);
        ral::write_reg!(msc, self.registers, WRITECMD, LADDRIM: 1);
        let status = self.registers.STATUS.read();
        if status & msc::STATUS::INVADDR::mask != 0 {
            Err(Error::InvalidAddress)
        } else if status & msc::STATUS::LOCKED::mask != 0 {
            Err(Error::Locked)
        } else {
            Ok(())
        }
    }

    fn wait_idle(&self) -> Result<()> {
        self.wait(|status| status & msc::STATUS::BUSY::mask == 0)
    }

    fn wait(&self, ready: impl Fn(u32) -> bool) -> Result<()> {
        for _ in 0..self.timeout {
            if ready(self.registers.STATUS.read()) {
                return Ok(());
            }
        }
        Err(Error::Timeout)
    }
}

impl Flash for Msc {
    fn erase_page(&mut self, address: u32) -> Result<()> {
        Msc::erase_page(self, address)
    }

    fn write_word(&mut self, address: u32, value: u32) -> Result<()> {
        Msc::write_word(self, address, value)
    }

    fn read_word(&self, address: u32) -> Result<u32> {
        if address % 4 != 0 {
            return Err(Error::InvalidAddress);
        }
        // Safety: flash is always readable. See Msc::new.
        Ok(unsafe { core::ptr::read_volatile(address as usize as *const u32) })
    }
}

/// The user-data page, as an array of words.
///
/// Indexes are words from the start of the page. Out-of-range indexes are
/// an [`Error::InvalidAddress`].
pub struct UserData<F> {
    flash: F,
    base: u32,
    words: usize,
}

impl<F: Flash> UserData<F> {
    /// The user-data page at [`USERDATA_BASE`], `page_size` bytes long.
    pub fn new(flash: F, page_size: usize) -> Self {
        Self::at(flash, USERDATA_BASE, page_size)
    }

    /// A page of `page_size` bytes at `base`.
    pub fn at(flash: F, base: u32, page_size: usize) -> Self {
        UserData {
            flash,
            base,
            words: page_size / 4,
        }
    }

    /// The number of words in the page.
    pub fn len(&self) -> usize {
        self.words
    }

    /// Returns `true` for a page without words.
    pub fn is_empty(&self) -> bool {
        self.words == 0
    }

    fn address(&self, index: usize) -> Result<u32> {
        if index < self.words {
            Ok(self.base + 4 * index as u32)
        } else {
            Err(Error::InvalidAddress)
        }
    }

    /// Erase the page.
    pub fn clear(&mut self) -> Result<()> {
        self.flash.erase_page(self.base)
    }

    /// Program word `index`.
    pub fn write(&mut self, index: usize, value: u32) -> Result<()> {
        let address = self.address(index)?;
        self.flash.write_word(address, value)
    }

    /// Read word `index`.
    pub fn read(&self, index: usize) -> Result<u32> {
        self.flash.read_word(self.address(index)?)
    }

    /// Release the flash driver.
    pub fn release(self) -> F {
        self.flash
    }
}
