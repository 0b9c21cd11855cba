//! Core traits for the link layer.

/// An opaque resource (a game board, typically) bound to one connection.
///
/// The link never looks inside it. It only owns it and calls
/// [`release`](GameResource::release) exactly once when the resource is
/// detached, either explicitly or because another one replaced it.
///
/// # Example
///
/// ```
/// use pnp_net::core::GameResource;
///
/// struct Board {
///     open: bool,
/// }
///
/// impl GameResource for Board {
///     fn release(&mut self) {
///         self.open = false;
///     }
/// }
/// ```
pub trait GameResource: Send {
    /// Release whatever the resource holds.
    fn release(&mut self);
}
