//! The count-then-fill protocol used by every collection-returning call.
//!
//! Native enumerations are called twice: once with a null array to learn
//! the element count, then again with a buffer of that size. If the set
//! grew in between, the second call fills what fits and returns
//! `VK_INCOMPLETE`, and the whole exchange starts over.

use ash::vk;

use crate::{
    config::EnumerationPolicy,
    error::{Error, Result},
    result,
};

/// Run the two-call protocol until the driver reports a complete fill.
///
/// `call` receives the in/out count and either a null pointer (count
/// query) or a buffer of exactly `*count` default-initialised elements.
/// Error codes from either call are returned as-is. `VK_INCOMPLETE` from
/// the fill call restarts the exchange, at most `policy.max_attempts` times
/// in total.
pub fn enumerate<T: Default>(
    policy: EnumerationPolicy,
    mut call: impl FnMut(&mut u32, *mut T) -> vk::Result,
) -> Result<Vec<T>> {
    let max_attempts = policy.max_attempts.get();
    for attempt in 1..=max_attempts {
        let mut count = 0;
        result::check(call(&mut count, std::ptr::null_mut()))?;

        let mut data = Vec::new();
        data.resize_with(count as usize, T::default);
        let status = result::check(call(&mut count, data.as_mut_ptr()))?;
        if status.is_incomplete() {
            tracing::trace!(
                "Enumeration returned VK_INCOMPLETE with {count} element(s) \
                 on attempt {attempt}/{max_attempts}"
            );
            continue;
        }

        data.truncate(count as usize);
        return Ok(data);
    }

    Err(Error::EnumerationDidNotConverge {
        attempts: max_attempts,
    })
}

/// Two-call protocol for native enumerations that return nothing.
///
/// These cannot report growth, so exactly one count call and one fill call
/// are made and the result is cut to whatever count the fill reported.
pub fn enumerate_unchecked<T: Default>(
    mut call: impl FnMut(&mut u32, *mut T),
) -> Vec<T> {
    let mut count = 0;
    call(&mut count, std::ptr::null_mut());

    let mut data = Vec::new();
    data.resize_with(count as usize, T::default);
    call(&mut count, data.as_mut_ptr());
    data.truncate(count as usize);
    data
}
