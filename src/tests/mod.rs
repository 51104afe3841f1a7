//! Test helpers shared by the in-crate flow tests.

#[cfg(test)]
mod events;

/// Id generator yielding `n1`, `n2`, ... for deterministic assertions.
pub fn sequential_ids() -> impl FnMut() -> String + Send + 'static {
    let mut next = 0u32;
    move || {
        next += 1;
        format!("n{next}")
    }
}
