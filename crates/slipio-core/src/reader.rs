use crate::event::SioEvent;
use crate::queue::QueueError;

/// Fill `buf` one event at a time from `pop`.
///
/// Returns `buf.len()` once every position is filled. An `Abort` or a pop
/// failure stops immediately and returns 0, even if some positions were
/// already written: callers get all of the bytes or none of them.
pub fn read_events<F>(buf: &mut [u8], mut pop: F) -> usize
where
    F: FnMut() -> Result<SioEvent, QueueError>,
{
    for (idx, slot) in buf.iter_mut().enumerate() {
        match pop() {
            Ok(SioEvent::Data(b)) => *slot = b,
            Ok(SioEvent::Abort) => {
                log::debug!("read aborted after {idx} bytes");
                return 0;
            }
            Err(e) => {
                log::debug!("read stopped after {idx} bytes: {e}");
                return 0;
            }
        }
    }
    buf.len()
}
