//! Lexical scope stack shared by both model builders.
//!
//! A builder enters a frame when it starts a declaration and exits it when
//! the declaration's subtree has been walked. Children reach their owner
//! either at the top of the stack or, when intermediate frames do not own
//! the target collection, by searching downward with [`ScopeStack::nearest_mut`].

#[derive(Debug)]
pub struct ScopeStack<F> {
    frames: Vec<F>,
}

impl<F> Default for ScopeStack<F> {
    fn default() -> Self {
        ScopeStack { frames: Vec::new() }
    }
}

impl<F> ScopeStack<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, frame: F) {
        self.frames.push(frame);
    }

    /// Pops the frame pushed by the matching `enter`.
    pub fn exit(&mut self) -> Option<F> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&F> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut F> {
        self.frames.last_mut()
    }

    /// Frame `depth` levels below the top; `peek(0)` is the top.
    pub fn peek(&self, depth: usize) -> Option<&F> {
        self.frames.iter().rev().nth(depth)
    }

    /// The first projection that succeeds, searching from the top down.
    pub fn nearest_mut<'s, T: ?Sized>(
        &'s mut self,
        project: impl FnMut(&'s mut F) -> Option<&'s mut T>,
    ) -> Option<&'s mut T> {
        self.frames.iter_mut().rev().find_map(project)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
