/// A locally applied change that is still waiting for the server.
///
/// `previous` is the snapshot taken when the user acted, a failed request
/// restores it regardless of what the server originally sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Optimistic<T> {
    pub previous: T,
    pub requested: T,
}

impl<T> Optimistic<T> {
    pub fn new(previous: T, requested: T) -> Self {
        Self {
            previous,
            requested,
        }
    }
}
