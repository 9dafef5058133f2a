use std::fmt;

/// Isochronous transmission channel assigned to one device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IsoChannel(u32);

impl IsoChannel {
    pub fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for IsoChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "iso{}", self.0)
    }
}

/// Shared state for all devices on one bus.
///
/// Hands out a distinct channel to every device constructed with it, so two
/// cameras on the same bus never transmit on the same channel.
#[derive(Debug, Default)]
pub struct DeviceContext {
    next_channel: u32,
}

impl DeviceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(first_channel: u32) -> Self {
        Self {
            next_channel: first_channel,
        }
    }

    /// Hands out the next channel number. The counter wraps to 0 after
    /// `u32::MAX`.
    pub fn allocate_channel(&mut self) -> IsoChannel {
        let channel = IsoChannel(self.next_channel);
        self.next_channel = self.next_channel.wrapping_add(1);
        channel
    }

    pub fn next_channel(&self) -> u32 {
        self.next_channel
    }
}
