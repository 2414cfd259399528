/// A unit carried from the receive interrupt to the blocked reader.
///
/// `Abort` travels through the same FIFO as data, so it cancels exactly one
/// future pop and never overtakes bytes that were queued before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SioEvent {
    Data(u8),
    Abort,
}

