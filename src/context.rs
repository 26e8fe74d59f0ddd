//! Session-scoped collaborators of a [`Transcoder`](crate::Transcoder).

use std::{
    any::{Any, TypeId},
    cell::RefCell,
    collections::HashMap,
    rc::Rc,
};

use crate::{encoding::CharEncodingHandler, error::ContextError, stack::EncodingStack};

/// The encoding stack as shared between a session and its transcoders.
pub type SharedEncodingStack = Rc<RefCell<EncodingStack>>;

/// Read access to the charset that is current when a decode runs.
///
/// This is what a transcoder is injected with. The session keeps the right to
/// push and pop; implementors only answer what is on top right now.
pub trait EncodingContext {
    fn current_encoding(&self) -> Result<CharEncodingHandler, ContextError>;
}

impl EncodingContext for RefCell<EncodingStack> {
    fn current_encoding(&self) -> Result<CharEncodingHandler, ContextError> {
        let stack = self
            .try_borrow()
            .map_err(|_| ContextError::EncodingStackBorrowed)?;
        stack
            .current()
            .cloned()
            .ok_or(ContextError::EmptyEncodingStack)
    }
}

impl EncodingContext for SerializationContext {
    fn current_encoding(&self) -> Result<CharEncodingHandler, ContextError> {
        self.encoding_stack.current_encoding()
    }
}

/// One serialization session.
///
/// Owns the encoding stack and a type-keyed map of other session services. The stack is
/// stored in the map as well, under `RefCell<EncodingStack>`.
pub struct SerializationContext {
    encoding_stack: SharedEncodingStack,
    services: HashMap<TypeId, Rc<dyn Any>>,
}

impl SerializationContext {
    pub fn new() -> Self {
        Self::with_encoding_stack(EncodingStack::new())
    }

    pub fn with_encoding_stack(stack: EncodingStack) -> Self {
        let encoding_stack = Rc::new(RefCell::new(stack));
        let mut services: HashMap<TypeId, Rc<dyn Any>> = HashMap::new();
        services.insert(
            TypeId::of::<RefCell<EncodingStack>>(),
            encoding_stack.clone(),
        );
        Self {
            encoding_stack,
            services,
        }
    }

    pub fn encoding_stack(&self) -> SharedEncodingStack {
        self.encoding_stack.clone()
    }

    /// Register `service` under its type, returning the service it replaces.
    ///
    /// Registering a `RefCell<EncodingStack>` swaps the session's encoding stack.
    /// Transcoders built before the swap keep reading the old one.
    pub fn set_service<T: Any>(&mut self, service: Rc<T>) -> Option<Rc<T>> {
        let service: Rc<dyn Any> = service;
        if let Ok(stack) = service.clone().downcast::<RefCell<EncodingStack>>() {
            self.encoding_stack = stack;
        }
        self.services
            .insert(TypeId::of::<T>(), service)
            .and_then(|old| old.downcast::<T>().ok())
    }

    pub fn get_service<T: Any>(&self) -> Option<Rc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|service| service.downcast::<T>().ok())
    }

    /// Remove the service registered under `T`. The encoding stack cannot be removed.
    pub fn remove_service<T: Any>(&mut self) -> Option<Rc<T>> {
        if TypeId::of::<T>() == TypeId::of::<RefCell<EncodingStack>>() {
            return None;
        }
        self.services
            .remove(&TypeId::of::<T>())
            .and_then(|service| service.downcast::<T>().ok())
    }
}

impl Default for SerializationContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Indent(usize);

    #[test]
    fn test_stack_is_a_service() {
        let ctx = SerializationContext::new();
        let stack = ctx.get_service::<RefCell<EncodingStack>>().unwrap();
        assert!(Rc::ptr_eq(&stack, &ctx.encoding_stack()));
        stack.borrow_mut().push_by_name("utf-16be").unwrap();
        assert_eq!(ctx.current_encoding().unwrap().name(), "UTF-16BE");
    }

    #[test]
    fn test_typed_services() {
        let mut ctx = SerializationContext::new();
        assert!(ctx.get_service::<Indent>().is_none());
        assert!(ctx.set_service(Rc::new(Indent(2))).is_none());
        assert_eq!(*ctx.get_service::<Indent>().unwrap(), Indent(2));
        assert_eq!(*ctx.set_service(Rc::new(Indent(4))).unwrap(), Indent(2));
        assert_eq!(*ctx.remove_service::<Indent>().unwrap(), Indent(4));
        assert!(ctx.get_service::<Indent>().is_none());
        assert!(ctx.remove_service::<RefCell<EncodingStack>>().is_none());
    }

    #[test]
    fn test_replace_encoding_stack() {
        let mut ctx = SerializationContext::new();
        let old = ctx.encoding_stack();
        ctx.set_service(Rc::new(RefCell::new(EncodingStack::empty())));
        assert!(!Rc::ptr_eq(&old, &ctx.encoding_stack()));
        assert_eq!(
            ctx.current_encoding().unwrap_err(),
            ContextError::EmptyEncodingStack
        );
    }

    #[test]
    fn test_borrowed_stack() {
        let ctx = SerializationContext::new();
        let stack = ctx.encoding_stack();
        let _guard = stack.borrow_mut();
        assert_eq!(
            ctx.current_encoding().unwrap_err(),
            ContextError::EncodingStackBorrowed
        );
    }
}
