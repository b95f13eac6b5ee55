use std::{ops::Range, rc::Rc};

use serde_json::Value;

use crate::operators::{AddOrSubtractOp, ComparisonOp, EqualityOp, MultiplyOrDivideOp, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    /// The span of source this expression was parsed from.
    pub range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Literal(Value),
    Variable(Rc<str>),
    Array(Vec<Expression>),
    Object(Vec<(Rc<str>, Expression)>),
    Field(Box<Expression>, Rc<str>),
    Index(Box<Expression>, Box<Expression>),
    Call(Rc<str>, Vec<Expression>),
    Unary(UnaryOp, Box<Expression>),
    MultiplyOrDivide(MultiplyOrDivideOp, Box<Expression>, Box<Expression>),
    AddOrSubtract(AddOrSubtractOp, Box<Expression>, Box<Expression>),
    Comparison(ComparisonOp, Box<Expression>, Box<Expression>),
    Equality(EqualityOp, Box<Expression>, Box<Expression>),
    LogicalAnd(Box<Expression>, Box<Expression>),
    LogicalOr(Box<Expression>, Box<Expression>),
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),
    Assign(Place, AssignOp, Box<Expression>),
    Sequence(Vec<Expression>),
    /// `apply NAME { ... }`, which rebinds `NAME` to the value of its body
    /// unless the body assigned to `NAME` itself.
    Apply(Rc<str>, Vec<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignOp {
    Set,
    Add,
    Subtract,
}

/// The target of an assignment: a variable, optionally followed by a
/// chain of field and index accesses.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub root: Rc<str>,
    pub path: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Field(Rc<str>),
    Index(Expression),
}

impl Expression {
    pub fn new(kind: ExpressionKind, range: Range<usize>) -> Self {
        Expression { kind, range }
    }

    /// Converts this expression into an assignable place, if it is one.
    pub fn into_place(self) -> Option<Place> {
        let mut path = vec![];
        let mut current = self;
        loop {
            match current.kind {
                ExpressionKind::Variable(root) => {
                    path.reverse();
                    return Some(Place { root, path });
                }
                ExpressionKind::Field(base, name) => {
                    path.push(PathSegment::Field(name));
                    current = *base;
                }
                ExpressionKind::Index(base, index) => {
                    path.push(PathSegment::Index(*index));
                    current = *base;
                }
                _ => return None,
            }
        }
    }

    /// Like `into_place`, but borrows, for reading a path without
    /// cloning the value at its root.
    pub fn as_path(&self) -> Option<(&Rc<str>, Vec<PathSegmentRef<'_>>)> {
        let mut path = vec![];
        let mut current = self;
        loop {
            match &current.kind {
                ExpressionKind::Variable(root) => {
                    path.reverse();
                    return Some((root, path));
                }
                ExpressionKind::Field(base, name) => {
                    path.push(PathSegmentRef::Field(name));
                    current = &**base;
                }
                ExpressionKind::Index(base, index) => {
                    path.push(PathSegmentRef::Index(index));
                    current = &**base;
                }
                _ => return None,
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PathSegmentRef<'a> {
    Field(&'a Rc<str>),
    Index(&'a Expression),
}

impl PathSegment {
    pub fn borrowed(&self) -> PathSegmentRef<'_> {
        match self {
            PathSegment::Field(name) => PathSegmentRef::Field(name),
            PathSegment::Index(index) => PathSegmentRef::Index(index),
        }
    }
}
