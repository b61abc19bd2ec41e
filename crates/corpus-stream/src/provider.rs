use crate::{ObjectRecord, error::StreamResult as Result};

/// Anything that hands out records one at a time.
///
/// `Ok(None)` is end of stream. Once a provider has returned it, every later
/// call returns it too.
pub trait ObjectProvider {
    fn next_object(&mut self) -> Result<Option<ObjectRecord>>;
}

impl<P: ObjectProvider + ?Sized> ObjectProvider for &mut P {
    #[inline]
    fn next_object(&mut self) -> Result<Option<ObjectRecord>> {
        (**self).next_object()
    }
}
