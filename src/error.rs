//! DMA error status

use core::fmt;

/// A DMA controller error.
///
/// The controller reports bus errors (a descriptor pointed at memory that
/// doesn't respond, or at a region the channel may not access). Once an
/// error is flagged the affected channel stops; the descriptor state is
/// undefined until it's reconfigured.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Error {
    status: u32,
    channel: Option<u8>,
}

impl Error {
    pub(crate) const fn new(status: u32, channel: Option<u8>) -> Self {
        Error { status, channel }
    }

    /// The raw controller status captured when the error was observed.
    pub const fn raw(&self) -> u32 {
        self.status
    }

    /// The channel that caused the error, if the controller reports it.
    ///
    /// The uDMA doesn't track the faulting channel, so this is always
    /// `None` there. LDMA records the channel number.
    pub const fn channel(&self) -> Option<usize> {
        match self.channel {
            Some(channel) => Some(channel as usize),
            None => None,
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.channel {
            Some(channel) => write!(f, "DMA_ERR(CH{}, {:#010X})", channel, self.status),
            None => write!(f, "DMA_ERR({:#010X})", self.status),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DMA bus error")?;
        if let Some(channel) = self.channel {
            write!(f, " on channel {}", channel)?;
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "DMA_ERR({=u32:#010X}, {})", self.status, self.channel)
    }
}
