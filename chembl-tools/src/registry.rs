//! Registry that maps operation names to descriptors, handlers and deadlines.

use std::collections::HashMap;
use std::fmt;
use std::iter::FusedIterator;
use std::slice;
use std::sync::Arc;
use std::time::Duration;

use crate::descriptor::OperationDescriptor;
use crate::error::{InvocationError, RegistryError, RegistryResult};
use crate::executor::{DeadlinePolicy, validate_deadline};
use crate::handler::Operation;

struct Entry {
    descriptor: OperationDescriptor,
    handler: Arc<dyn Operation>,
    deadline: Duration,
}

/// Mutable registration phase. [`RegistryBuilder::build`] freezes it.
pub struct RegistryBuilder {
    deadlines: DeadlinePolicy,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("deadlines", &self.deadlines)
            .field("registered", &names(&self.entries))
            .finish()
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new(DeadlinePolicy::default())
    }
}

impl RegistryBuilder {
    /// Creates an empty builder using the supplied category deadlines.
    #[must_use]
    pub fn new(deadlines: DeadlinePolicy) -> Self {
        Self {
            deadlines,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registers a handler under the descriptor's name, using the category
    /// default deadline.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateOperation`] if the name is taken.
    pub fn register<T>(&mut self, descriptor: OperationDescriptor, handler: T) -> RegistryResult<()>
    where
        T: Operation + 'static,
    {
        let deadline = self.deadlines.for_category(descriptor.category());
        self.insert(descriptor, Arc::new(handler), deadline)
    }

    /// Registers a handler with an explicit deadline.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Configuration`] if `deadline` is zero, or
    /// [`RegistryError::DuplicateOperation`] if the name is taken.
    pub fn register_with_deadline<T>(
        &mut self,
        descriptor: OperationDescriptor,
        deadline: Duration,
        handler: T,
    ) -> RegistryResult<()>
    where
        T: Operation + 'static,
    {
        self.register_shared(descriptor, Some(deadline), Arc::new(handler))
    }

    /// Registers an already shared handler.
    ///
    /// `None` selects the category default deadline.
    ///
    /// # Errors
    ///
    /// Same conditions as [`RegistryBuilder::register_with_deadline`].
    pub fn register_shared(
        &mut self,
        descriptor: OperationDescriptor,
        deadline: Option<Duration>,
        handler: Arc<dyn Operation>,
    ) -> RegistryResult<()> {
        let deadline = match deadline {
            Some(deadline) => validate_deadline(descriptor.name().as_str(), deadline)?,
            None => self.deadlines.for_category(descriptor.category()),
        };
        self.insert(descriptor, handler, deadline)
    }

    fn insert(
        &mut self,
        descriptor: OperationDescriptor,
        handler: Arc<dyn Operation>,
        deadline: Duration,
    ) -> RegistryResult<()> {
        let name = descriptor.name().as_str().to_owned();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateOperation { name });
        }

        self.index.insert(name, self.entries.len());
        self.entries.push(Entry {
            descriptor,
            handler,
            deadline,
        });
        Ok(())
    }

    /// Returns the number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freezes the registrations into an immutable registry.
    #[must_use]
    pub fn build(self) -> OperationRegistry {
        OperationRegistry {
            entries: self.entries,
            index: self.index,
        }
    }
}

/// Immutable operation registry shared by every invocation.
pub struct OperationRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("registered", &names(&self.entries))
            .finish()
    }
}

impl OperationRegistry {
    /// Starts a registration phase.
    #[must_use]
    pub fn builder(deadlines: DeadlinePolicy) -> RegistryBuilder {
        RegistryBuilder::new(deadlines)
    }

    /// Resolves an operation by name.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::UnknownOperation`] if no such operation is
    /// registered.
    pub fn resolve(&self, name: &str) -> Result<ResolvedOperation<'_>, InvocationError> {
        let entry = self
            .index
            .get(name)
            .map(|&position| &self.entries[position])
            .ok_or_else(|| InvocationError::UnknownOperation {
                name: name.to_owned(),
            })?;

        Ok(ResolvedOperation {
            descriptor: &entry.descriptor,
            handler: &entry.handler,
            deadline: entry.deadline,
        })
    }

    /// Returns `true` if the name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates descriptors in registration order.
    ///
    /// The iterator is cheap to clone, so discovery can be restarted freely.
    #[must_use]
    pub fn list(&self) -> Descriptors<'_> {
        Descriptors {
            inner: self.entries.iter(),
        }
    }

    /// Returns the number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Borrowed view of a resolved operation.
#[derive(Clone, Copy)]
pub struct ResolvedOperation<'a> {
    descriptor: &'a OperationDescriptor,
    handler: &'a Arc<dyn Operation>,
    deadline: Duration,
}

impl<'a> ResolvedOperation<'a> {
    /// Returns the descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &'a OperationDescriptor {
        self.descriptor
    }

    /// Returns the shared handler.
    #[must_use]
    pub fn handler(&self) -> &'a Arc<dyn Operation> {
        self.handler
    }

    /// Returns the deadline this operation runs under.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl fmt::Debug for ResolvedOperation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedOperation")
            .field("name", self.descriptor.name())
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Iterator over registered descriptors, in registration order.
#[derive(Clone)]
pub struct Descriptors<'a> {
    inner: slice::Iter<'a, Entry>,
}

impl<'a> Iterator for Descriptors<'a> {
    type Item = &'a OperationDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| &entry.descriptor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Descriptors<'_> {}

impl FusedIterator for Descriptors<'_> {}

impl<'a> Descriptors<'a> {
    /// Pairs each descriptor with its deadline.
    pub fn with_deadlines(self) -> impl Iterator<Item = (&'a OperationDescriptor, Duration)> + 'a {
        self.inner.map(|entry| (&entry.descriptor, entry.deadline))
    }
}

fn names(entries: &[Entry]) -> Vec<&str> {
    entries
        .iter()
        .map(|entry| entry.descriptor.name().as_str())
        .collect()
}
