//! The scope chain the normalizer threads through an entity: a stack of
//! frames for the global object, enclosing functions, catch handlers, and
//! live `with` objects. Frames hold `AstPtr`s into the input tree so binding
//! declarations can be marked in place.

use crate::ast::*;
use crate::hoist::HoistedDecl;
use crate::normalize::is_tmp;

/// The declaration node a name resolves to.
pub enum BindingNode {
    Param(AstPtr<Identifier>),
    CatchParam(AstPtr<Identifier>),
    Var(AstPtr<VariableDeclarator>),
    Func(AstPtr<Function>),
}

impl BindingNode {
    pub fn set_exposed(&self) {
        match self {
            BindingNode::Param(id) | BindingNode::CatchParam(id) => {
                id.as_ref().exposed.set(true)
            }
            BindingNode::Var(decl) => decl.as_ref().id.exposed.set(true),
            BindingNode::Func(func) => func.as_ref().exposed.set(true),
        }
    }
}

enum Frame {
    Global { decls: Vec<HoistedDecl> },
    Function { func: AstPtr<Function>, decls: Vec<HoistedDecl> },
    Catch { param: AstPtr<Identifier> },
    With { object_tmp: String },
}

impl Frame {
    fn binds(&self, name: &str) -> bool {
        match self {
            Frame::Global { decls } => decls.iter().any(|decl| decl.name() == name),
            Frame::Function { func, decls } => {
                let func = func.as_ref();
                func.params.iter().any(|param| param.name == name)
                    || decls.iter().any(|decl| decl.name() == name)
                    // A named function expression binds its own name in its body
                    || func.id.as_deref().is_some_and(|id| id.name == name)
            }
            Frame::Catch { param } => param.as_ref().name == name,
            Frame::With { .. } => false,
        }
    }
}

pub struct ScopeChain {
    frames: Vec<Frame>,
}

impl ScopeChain {
    pub fn new() -> ScopeChain {
        ScopeChain { frames: vec![] }
    }

    pub fn push_global(&mut self, decls: Vec<HoistedDecl>) {
        self.frames.push(Frame::Global { decls });
    }

    pub fn push_function(&mut self, func: &Function, decls: Vec<HoistedDecl>) {
        self.frames
            .push(Frame::Function { func: AstPtr::from_ref(func), decls });
    }

    pub fn push_catch(&mut self, param: &Identifier) {
        self.frames.push(Frame::Catch { param: AstPtr::from_ref(param) });
    }

    pub fn push_with(&mut self, object_tmp: String) {
        self.frames.push(Frame::With { object_tmp });
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Whether a reference to `name` resolves to the global object: no
    /// enclosing function, catch, or named function expression binds it.
    pub fn is_global(&self, name: &str) -> bool {
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::Global { .. } => return true,
                Frame::With { .. } => {}
                _ => {
                    if frame.binds(name) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Whether `name` is declared at program toplevel.
    pub fn is_declared_global(&self, name: &str) -> bool {
        match self.frames.first() {
            Some(Frame::Global { decls }) => decls.iter().any(|decl| decl.name() == name),
            _ => false,
        }
    }

    /// Whether `name` is bound within the innermost function or program
    /// entity (including parameters and catch parameters).
    pub fn is_local(&self, name: &str) -> bool {
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::With { .. } => {}
                Frame::Catch { param } => {
                    if param.as_ref().name == name {
                        return true;
                    }
                }
                Frame::Function { .. } | Frame::Global { .. } => return frame.binds(name),
            }
        }
        false
    }

    /// The declaration node `name` statically resolves to, if any.
    pub fn lookup(&self, name: &str) -> Option<BindingNode> {
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::With { .. } => {}
                Frame::Catch { param } => {
                    if param.as_ref().name == name {
                        return Some(BindingNode::CatchParam(*param));
                    }
                }
                Frame::Function { func, decls } => {
                    let func_ref = func.as_ref();
                    if let Some(param) = func_ref.params.iter().find(|param| param.name == name) {
                        return Some(BindingNode::Param(AstPtr::from_ref(param)));
                    }
                    if let Some(decl) = decls.iter().find(|decl| decl.name() == name) {
                        return Some(match decl {
                            HoistedDecl::Var(decl) => BindingNode::Var(*decl),
                            HoistedDecl::Func(func) => BindingNode::Func(*func),
                        });
                    }
                    if func_ref.id.as_deref().is_some_and(|id| id.name == name) {
                        return Some(BindingNode::Func(*func));
                    }
                }
                Frame::Global { decls } => {
                    return decls.iter().find(|decl| decl.name() == name).map(|decl| match decl {
                        HoistedDecl::Var(decl) => BindingNode::Var(*decl),
                        HoistedDecl::Func(func) => BindingNode::Func(*func),
                    });
                }
            }
        }
        None
    }

    /// Temps of the `with` objects that may dynamically bind `name`,
    /// innermost last. Walks outward until a frame statically binds the
    /// name. Generated temps are never with-routed.
    pub fn possible_with_bindings(&self, name: &str) -> Vec<String> {
        if is_tmp(name) {
            return vec![];
        }

        let mut bindings = vec![];
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::With { object_tmp } => bindings.push(object_tmp.clone()),
                _ => {
                    if frame.binds(name) || matches!(frame, Frame::Global { .. }) {
                        break;
                    }
                }
            }
        }
        bindings.reverse();
        bindings
    }

    /// Hoisted declarations of the innermost function or program entity.
    pub fn entity_decls(&self) -> &[HoistedDecl] {
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::Global { decls } | Frame::Function { decls, .. } => return decls,
                _ => {}
            }
        }
        &[]
    }

    pub fn in_function(&self) -> bool {
        self.frames
            .iter()
            .any(|frame| matches!(frame, Frame::Function { .. }))
    }

    /// Whether the innermost entity is the program itself (`this` rewrites
    /// to the global object there).
    pub fn in_global_entity(&self) -> bool {
        !self.in_function()
    }
}
