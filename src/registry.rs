//! Controller registry.
//!
//! Append-only list of every controller in registration order. Controllers
//! mirror physical wiring fixed at boot, so nothing is ever removed or
//! reordered; indices handed out by [`ControllerRegistry::register`] stay
//! valid for the registry's lifetime.

use heapless::Vec;

use crate::controller::Controller;
use crate::error::{Error, Result};

/// Ordered, fixed capacity set of controllers.
///
/// N is the maximum number of controllers.
#[derive(Debug)]
pub struct ControllerRegistry<'a, P, const N: usize> {
    controllers: Vec<Controller<'a, P>, N>,
}

impl<'a, P, const N: usize> ControllerRegistry<'a, P, N> {
    pub const fn new() -> Self {
        Self {
            controllers: Vec::new(),
        }
    }

    /// Append a controller and return its index.
    pub fn register(&mut self, controller: Controller<'a, P>) -> Result<usize> {
        let index = self.controllers.len();
        self.controllers
            .push(controller)
            .map_err(|_| Error::RegistryFull)?;
        Ok(index)
    }

    /// Visit every controller in registration order.
    pub fn for_each(&self, f: impl FnMut(&Controller<'a, P>)) {
        self.controllers.iter().for_each(f);
    }

    /// Visit every controller mutably in registration order.
    pub fn for_each_mut(&mut self, f: impl FnMut(&mut Controller<'a, P>)) {
        self.controllers.iter_mut().for_each(f);
    }

    /// Controller at `index`, falling back to the first one when out of range.
    ///
    /// Returns `None` only while the registry is empty.
    pub fn nth(&self, index: usize) -> Option<&Controller<'a, P>> {
        self.controllers
            .get(index)
            .or_else(|| self.controllers.first())
    }

    /// Mutable variant of [`Self::nth`].
    pub fn nth_mut(&mut self, index: usize) -> Option<&mut Controller<'a, P>> {
        let index = if index < self.controllers.len() { index } else { 0 };
        self.controllers.get_mut(index)
    }

    /// Number of registered controllers.
    pub fn count(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Controller<'a, P>> {
        self.controllers.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, Controller<'a, P>> {
        self.controllers.iter_mut()
    }

    pub fn as_mut_slice(&mut self) -> &mut [Controller<'a, P>] {
        &mut self.controllers
    }
}

impl<P, const N: usize> Default for ControllerRegistry<'_, P, N> {
    fn default() -> Self {
        Self::new()
    }
}
