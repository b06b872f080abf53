//! Name resolution across nested lexical scopes.
//!
//! Two parallel stacks: the scope stack (one name-set per module, clause, or
//! function body) and the closure stack (one open frame per function whose
//! body is being compiled). Resolution walks both to classify every name
//! reference as global, local, non-local, or closed-over, recording capture
//! requirements on each function the reference crosses.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::debug;

/// How a name reference resolves at its point of use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Not defined in any enclosing scope.
    Global,
    /// Defined in the innermost scope.
    Local,
    /// Defined `depth` scopes out, with no open function in between.
    Nonlocal(usize),
    /// Defined outside at least one open function; the capture has been
    /// recorded on every function frame the reference crosses.
    Closure,
}

/// An open function context: the absolute scope level of its body and the
/// names it captures, in capture order.
#[derive(Debug)]
struct ClosureFrame {
    level: usize,
    names: IndexMap<Arc<str>, i32>,
}

#[derive(Debug, Default)]
pub(crate) struct NameResolver {
    /// Innermost scope last.
    scopes: Vec<FxHashSet<Arc<str>>>,
    /// Outermost open function first.
    closures: Vec<ClosureFrame>,
}

impl NameResolver {
    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashSet::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Open a function context. Must be called after the function's body
    /// scope has been pushed.
    pub fn push_closure(&mut self) {
        let level = self.scopes.len().saturating_sub(1);
        self.closures.push(ClosureFrame { level, names: IndexMap::new() });
    }

    /// Close the innermost function context, yielding its capture tuple.
    pub fn pop_closure(&mut self) -> Vec<(Arc<str>, i32)> {
        match self.closures.pop() {
            Some(frame) => frame.names.into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Declare a name in the innermost scope.
    pub fn declare(&mut self, name: &Arc<str>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.clone());
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.scopes.is_empty() && self.closures.is_empty()
    }

    /// Classify a reference to `name`, recording closure captures as a side
    /// effect.
    pub fn resolve(&mut self, name: &str) -> Resolution {
        match self.name_depth(name) {
            None => Resolution::Global,
            Some(0) => Resolution::Local,
            Some(depth) => {
                if self.capture(name, depth) {
                    Resolution::Closure
                } else {
                    Resolution::Nonlocal(depth)
                }
            }
        }
    }

    /// Depth of the innermost scope defining `name`: 0 is the current
    /// scope.
    fn name_depth(&self, name: &str) -> Option<usize> {
        self.scopes
            .iter()
            .rev()
            .position(|scope| scope.contains(name))
    }

    /// Decide whether a reference at `depth` crosses an open function, and
    /// if so record `name` on every frame between the reference and the
    /// definition.
    ///
    /// The first (outermost) crossed frame records the positive relative
    /// depth from its own scope down to the definition; every further frame
    /// records its depth negated, marking a capture that arrives via the
    /// lexical parent's closure rather than a live frame.
    fn capture(&mut self, name: &str, depth: usize) -> bool {
        if self.closures.is_empty() {
            return false;
        }
        if self
            .closures
            .last()
            .is_some_and(|frame| frame.names.contains_key(name))
        {
            return true;
        }

        let name_level = self.scopes.len() - depth - 1;
        let relative = |level: usize| level as i64 - name_level as i64 - 1;
        let Some(start) = self
            .closures
            .iter()
            .position(|frame| relative(frame.level) >= 0)
        else {
            return false;
        };

        for (index, frame) in self.closures[start..].iter_mut().enumerate() {
            let rel = frame.level as i64 - name_level as i64 - 1;
            let recorded = if index > 0 { -rel } else { rel } as i32;
            debug!(name, level = frame.level, depth = recorded, "closure capture");
            frame.names.insert(name.into(), recorded);
        }
        true
    }
}
