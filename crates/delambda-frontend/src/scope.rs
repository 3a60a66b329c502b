//! Lexical scope tracking for the document walk.
//!
//! The builder pushes a scope per module, function, and block, declares
//! bindings as it encounters them, and resolves identifier reads innermost
//! first. The scope index of a hit decides whether a read inside a closure
//! is a capture (bound inside some enclosing function) or still visible at
//! module level where the holder classes are emitted.

use delambda_diagnostics::Span;
use delambda_transform::TypeRef;
use std::collections::HashMap;

/// One declared binding.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    /// Formal parameter of a function, as opposed to a local variable.
    pub is_param: bool,
    pub ty: TypeRef,
    /// For function declarations and named function expressions: the span
    /// identifying the function this name binds. Lets the walker recognize
    /// a closure reading its own name.
    pub fn_span: Option<Span>,
}

impl Binding {
    pub fn local(ty: TypeRef) -> Self {
        Self {
            is_param: false,
            ty,
            fn_span: None,
        }
    }

    pub fn param(ty: TypeRef) -> Self {
        Self {
            is_param: true,
            ty,
            fn_span: None,
        }
    }

    pub fn function(ty: TypeRef, fn_span: Span) -> Self {
        Self {
            is_param: false,
            ty,
            fn_span: Some(fn_span),
        }
    }
}

#[derive(Debug, Default)]
struct Scope {
    bindings: HashMap<String, Binding>,
}

/// Stack of lexical scopes. Index 0 is always the module's top scope.
#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Declare a binding in the innermost scope. A redeclaration of the same
    /// name shadows the earlier one.
    pub fn declare(&mut self, name: &str, binding: Binding) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(name.to_string(), binding);
        }
    }

    /// Resolve a name, innermost scope first. Returns the scope index of the
    /// hit; index 0 means module scope.
    pub fn lookup(&self, name: &str) -> Option<(usize, &Binding)> {
        for (idx, scope) in self.scopes.iter().enumerate().rev() {
            if let Some(binding) = scope.bindings.get(name) {
                return Some((idx, binding));
            }
        }
        None
    }
}
